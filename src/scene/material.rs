//! Named materials with dynamically-typed variable bags.
//!
//! A material stores an ordered, append-or-update list of named typed
//! values. Once per frame the dirty set drains: each dirty material is
//! resolved against its shader's declared variable descriptors — values
//! from the bag where present and type-correct, declared defaults
//! otherwise — and the resolved snapshot is serialized into the shader's
//! material buffer at descriptor offsets.

use glam::{Vec2, Vec3, Vec4};

use crate::arena::Handle;
use crate::gpu::backend::{RenderBackend, TextureId};
use crate::scene::shader::Shader;

/// Kind tag for a material variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialValueKind {
    /// A texture reference.
    Texture,
    /// A single float.
    Float,
    /// A signed integer.
    Int,
    /// A boolean (serialized as u32).
    Bool,
    /// Two floats.
    Vec2,
    /// Three floats.
    Vec3,
    /// Four floats.
    Vec4,
}

/// One typed material value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaterialValue {
    /// A texture reference.
    Texture(TextureId),
    /// A single float.
    Float(f32),
    /// A signed integer.
    Int(i32),
    /// A boolean (serialized as u32).
    Bool(bool),
    /// Two floats.
    Vec2(Vec2),
    /// Three floats.
    Vec3(Vec3),
    /// Four floats.
    Vec4(Vec4),
}

impl MaterialValue {
    /// The value's kind tag.
    #[must_use]
    pub const fn kind(&self) -> MaterialValueKind {
        match self {
            Self::Texture(_) => MaterialValueKind::Texture,
            Self::Float(_) => MaterialValueKind::Float,
            Self::Int(_) => MaterialValueKind::Int,
            Self::Bool(_) => MaterialValueKind::Bool,
            Self::Vec2(_) => MaterialValueKind::Vec2,
            Self::Vec3(_) => MaterialValueKind::Vec3,
            Self::Vec4(_) => MaterialValueKind::Vec4,
        }
    }

    /// The referenced texture, if this is a texture value.
    #[must_use]
    pub const fn as_texture(&self) -> Option<TextureId> {
        match self {
            Self::Texture(id) => Some(*id),
            _ => None,
        }
    }

    /// Serialize into `out` (little-endian, bools as u32 0/1, textures as
    /// their shader-visible index). Writes at most `out.len()` bytes.
    pub(crate) fn write_packed(
        &self,
        backend: &dyn RenderBackend,
        out: &mut [u8],
    ) {
        let mut scratch = [0_u8; 16];
        let encoded: &[u8] = match self {
            Self::Texture(id) => {
                let index =
                    backend.texture_shader_index(*id).unwrap_or_else(|| {
                        log::warn!(
                            "material texture {id:?} has no shader index"
                        );
                        0
                    });
                scratch[..4].copy_from_slice(&index.to_le_bytes());
                &scratch[..4]
            }
            Self::Float(v) => {
                scratch[..4].copy_from_slice(&v.to_le_bytes());
                &scratch[..4]
            }
            Self::Int(v) => {
                scratch[..4].copy_from_slice(&v.to_le_bytes());
                &scratch[..4]
            }
            Self::Bool(v) => {
                scratch[..4].copy_from_slice(&u32::from(*v).to_le_bytes());
                &scratch[..4]
            }
            Self::Vec2(v) => {
                scratch[..8]
                    .copy_from_slice(bytemuck::bytes_of(&v.to_array()));
                &scratch[..8]
            }
            Self::Vec3(v) => {
                scratch[..12]
                    .copy_from_slice(bytemuck::bytes_of(&v.to_array()));
                &scratch[..12]
            }
            Self::Vec4(v) => {
                scratch[..16]
                    .copy_from_slice(bytemuck::bytes_of(&v.to_array()));
                &scratch[..16]
            }
        };
        let len = encoded.len().min(out.len());
        out[..len].copy_from_slice(&encoded[..len]);
    }
}

/// One variable of a resolved snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedVariable {
    /// The descriptor's variable name.
    pub name: String,
    /// Byte offset within the shader's material-buffer layout.
    pub offset: u32,
    /// Byte size within the layout.
    pub size: u32,
    /// The value after descriptor-driven fallback.
    pub value: MaterialValue,
}

/// Per-(shader, material) resolved snapshot.
///
/// Produced by draining the dirty set; consumed either by material-buffer
/// serialization or as the source of push-constant-style per-draw data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedMaterial {
    /// Variables in shader descriptor order.
    pub variables: Vec<ResolvedVariable>,
}

impl ResolvedMaterial {
    /// The resolved value for a variable name.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&MaterialValue> {
        self.variables
            .iter()
            .find(|v| v.name == name)
            .map(|v| &v.value)
    }

    /// Serialize every variable at its descriptor offset into `out`.
    pub(crate) fn pack_into(
        &self,
        backend: &dyn RenderBackend,
        out: &mut [u8],
    ) {
        for variable in &self.variables {
            let start = variable.offset as usize;
            let end = (variable.offset + variable.size) as usize;
            let Some(slot) = out.get_mut(start..end.min(out.len())) else {
                log::warn!(
                    "material variable '{}' overruns the buffer layout",
                    variable.name
                );
                continue;
            };
            variable.value.write_packed(backend, slot);
        }
    }
}

/// A named material: shader reference, variable bag, ref count.
pub struct Material {
    pub(crate) name: String,
    pub(crate) shader: Handle<Shader>,
    /// Ordered append-or-update list keyed by name.
    pub(crate) variables: Vec<(String, MaterialValue)>,
    pub(crate) ref_count: u32,
    pub(crate) resolved: Option<ResolvedMaterial>,
}

impl Material {
    pub(crate) fn new(name: &str, shader: Handle<Shader>) -> Self {
        Self {
            name: name.to_owned(),
            shader,
            variables: Vec::new(),
            ref_count: 1,
            resolved: None,
        }
    }

    /// The deduplication name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The shader this material draws with.
    #[must_use]
    pub const fn shader(&self) -> Handle<Shader> {
        self.shader
    }

    /// Active owner count.
    #[must_use]
    pub const fn ref_count(&self) -> u32 {
        self.ref_count
    }

    /// The explicitly-set value for `name`, if any.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&MaterialValue> {
        self.variables
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// The snapshot from the last dirty-set drain.
    #[must_use]
    pub const fn resolved(&self) -> Option<&ResolvedMaterial> {
        self.resolved.as_ref()
    }

    /// Append-or-update a variable; returns the replaced value.
    pub(crate) fn upsert(
        &mut self,
        name: &str,
        value: MaterialValue,
    ) -> Option<MaterialValue> {
        if let Some((_, existing)) =
            self.variables.iter_mut().find(|(n, _)| n == name)
        {
            Some(std::mem::replace(existing, value))
        } else {
            self.variables.push((name.to_owned(), value));
            None
        }
    }

    /// Build the resolved snapshot against `shader`'s descriptors.
    ///
    /// A bag value with the wrong kind is a logged warning and falls back
    /// to the descriptor default, exactly like an absent value.
    pub(crate) fn resolve(&self, shader: &Shader) -> ResolvedMaterial {
        let variables = shader
            .variables
            .iter()
            .map(|desc| {
                let value = match self.variable(&desc.name) {
                    Some(v) if v.kind() == desc.default.kind() => *v,
                    Some(v) => {
                        log::warn!(
                            "material '{}': variable '{}' has kind {:?}, \
                             shader declares {:?}; using default",
                            self.name,
                            desc.name,
                            v.kind(),
                            desc.default.kind()
                        );
                        desc.default
                    }
                    None => desc.default,
                };
                ResolvedVariable {
                    name: desc.name.clone(),
                    offset: desc.offset,
                    size: desc.size,
                    value,
                }
            })
            .collect();
        ResolvedMaterial { variables }
    }
}
