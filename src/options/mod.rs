//! Runtime tunables with TOML preset support.
//!
//! The small set of booleans and numbers the console/config layer feeds
//! this core, read each frame: visibility locking, the wireframe override,
//! shadow settings, array capacities. All sub-structs use
//! `#[serde(default)]` so partial TOML files (e.g. only overriding
//! `[shadows]`) work correctly.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::KeelError;

/// Visibility/draw-list toggles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VisibilityOptions {
    /// Freeze draw lists: skip rebuilds and reuse the last frame's lists.
    pub lock_visibility: bool,
}

impl Default for VisibilityOptions {
    fn default() -> Self {
        Self {
            lock_visibility: false,
        }
    }
}

/// Shadow-map settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ShadowOptions {
    /// Master shadow toggle.
    pub enabled: bool,
    /// Square shadow-map resolution in texels.
    pub map_resolution: u32,
}

impl Default for ShadowOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            map_resolution: 1024,
        }
    }
}

/// Fixed capacities for the shader-visible arrays, applied at core
/// construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LimitOptions {
    /// Viewport array capacity.
    pub viewport_slots: u32,
    /// Per-type light array capacity.
    pub light_slots_per_type: u32,
    /// Initial material-set capacity per shader (grows on demand).
    pub material_slots_per_shader: u32,
}

impl Default for LimitOptions {
    fn default() -> Self {
        Self {
            viewport_slots: 64,
            light_slots_per_type: 256,
            material_slots_per_shader: 16,
        }
    }
}

/// Debug toggles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct DebugOptions {
    /// Force every non-exempt shader to the registered wireframe shader.
    pub wireframe: bool,
    /// Show the per-frame draw statistics overlay (stats are always
    /// collected; this only gates display by the host).
    pub draw_stats: bool,
}

/// Top-level options container.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default,
)]
#[serde(default)]
pub struct RenderOptions {
    /// Visibility/draw-list toggles.
    pub visibility: VisibilityOptions,
    /// Shadow-map settings.
    pub shadows: ShadowOptions,
    /// Shader-visible array capacities.
    pub limits: LimitOptions,
    /// Debug toggles.
    pub debug: DebugOptions,
}

impl RenderOptions {
    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`KeelError::Io`] on read failure or
    /// [`KeelError::OptionsParse`] on malformed TOML.
    pub fn load(path: &Path) -> Result<Self, KeelError> {
        let content = std::fs::read_to_string(path).map_err(KeelError::Io)?;
        toml::from_str(&content)
            .map_err(|e| KeelError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// Returns [`KeelError::Io`] on write failure or
    /// [`KeelError::OptionsParse`] on serialization failure.
    pub fn save(&self, path: &Path) -> Result<(), KeelError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| KeelError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(KeelError::Io)?;
        }
        std::fs::write(path, content).map_err(KeelError::Io)
    }

    /// List available preset names (TOML file stems) in a directory.
    #[must_use]
    pub fn list_presets(dir: &Path) -> Vec<String> {
        let mut names = Vec::new();
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) =
                        path.file_stem().and_then(|s| s.to_str())
                    {
                        names.push(stem.to_owned());
                    }
                }
            }
        }
        names.sort();
        names
    }
}
