//! Typed lights with per-type shader arrays and shadow resources.
//!
//! Each light holds a slot in its type's fixed-capacity shader array; the
//! slot's used-list position is the index shaders read. Shadow-casting
//! lights own a dedicated viewport, depth texture, and framebuffer.

use glam::{Mat4, Vec3};

use crate::arena::Handle;
use crate::gpu::backend::{FramebufferId, RenderBackend, TextureId};
use crate::gpu::slots::SlotToken;
use crate::scene::LifecycleState;
use crate::view::frustum::Aabb;
use crate::view::viewport::Viewport;

/// Light type, selecting the shader array the light lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightKind {
    /// Infinite directional light.
    Directional,
    /// Omnidirectional point light with a radius.
    Point,
    /// Spot light with a cone angle.
    Cone,
    /// Capsule light — declared but absent from the current array set;
    /// creation is rejected as unsupported.
    Capsule,
}

/// Parameters for light creation.
#[derive(Debug, Clone, Copy)]
pub struct LightDesc {
    /// Light type.
    pub kind: LightKind,
    /// Linear RGB color.
    pub color: Vec3,
    /// Scalar intensity.
    pub intensity: f32,
    /// World position (ignored for directional).
    pub position: Vec3,
    /// World direction (ignored for point).
    pub direction: Vec3,
    /// Influence radius / shadow range.
    pub radius: f32,
    /// Cone full angle in radians (cone lights only).
    pub fov: f32,
    /// Whether the light renders a shadow map.
    pub cast_shadow: bool,
}

impl Default for LightDesc {
    fn default() -> Self {
        Self {
            kind: LightKind::Point,
            color: Vec3::ONE,
            intensity: 1.0,
            position: Vec3::ZERO,
            direction: Vec3::NEG_Z,
            radius: 10.0,
            fov: std::f32::consts::FRAC_PI_3,
            cast_shadow: false,
        }
    }
}

/// Shadow-map resources owned by one light.
#[derive(Debug, Clone, Copy)]
pub struct ShadowMap {
    /// The light's own shadow-pass viewport.
    pub viewport: Handle<Viewport>,
    /// Depth texture rendered into.
    pub depth: TextureId,
    /// Framebuffer bundling the depth attachment.
    pub framebuffer: FramebufferId,
    /// Square resolution in texels.
    pub resolution: u32,
}

/// Shader-visible light record, one per slot of a type array.
///
/// NOTE: Must match the shader-side struct layout exactly (64 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightRecord {
    /// World position.
    pub position: [f32; 3],
    /// Influence radius.
    pub radius: f32,
    /// World direction (normalized).
    pub direction: [f32; 3],
    /// Cone full angle in radians.
    pub fov: f32,
    /// Linear RGB color.
    pub color: [f32; 3],
    /// Scalar intensity.
    pub intensity: f32,
    /// Shader-visible shadow texture index, or [`Self::NO_SHADOW`].
    pub shadow_texture: u32,
    /// 1 when the light contributes, 0 when disabled.
    pub enabled: u32,
    /// Padding to a 16-byte boundary.
    pub _pad: [u32; 2],
}

impl LightRecord {
    /// Sentinel shadow texture index for lights without a shadow map.
    pub const NO_SHADOW: u32 = u32::MAX;
}

/// One live light.
pub struct Light {
    pub(crate) kind: LightKind,
    pub(crate) slot: SlotToken,
    pub(crate) enabled: bool,
    pub(crate) color: Vec3,
    pub(crate) intensity: f32,
    pub(crate) position: Vec3,
    pub(crate) direction: Vec3,
    pub(crate) radius: f32,
    pub(crate) fov: f32,
    pub(crate) shadow: Option<ShadowMap>,
    pub(crate) state: LifecycleState,
}

impl Light {
    /// Light type.
    #[must_use]
    pub const fn kind(&self) -> LightKind {
        self.kind
    }

    /// Whether the light currently contributes.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Shadow resources, if the light casts shadows.
    #[must_use]
    pub const fn shadow(&self) -> Option<&ShadowMap> {
        self.shadow.as_ref()
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// Whether this light reaches `aabb`. Directional lights reach
    /// everything; the rest test their influence sphere.
    #[must_use]
    pub fn affects(&self, aabb: &Aabb) -> bool {
        match self.kind {
            LightKind::Directional => true,
            _ => aabb.intersects_sphere(self.position, self.radius),
        }
    }

    /// The shader-visible record for this light's array slot.
    pub(crate) fn record(&self, backend: &dyn RenderBackend) -> LightRecord {
        let shadow_texture = self
            .shadow
            .as_ref()
            .and_then(|s| backend.texture_shader_index(s.depth))
            .unwrap_or(LightRecord::NO_SHADOW);
        LightRecord {
            position: self.position.to_array(),
            radius: self.radius,
            direction: self.direction.to_array(),
            fov: self.fov,
            color: self.color.to_array(),
            intensity: self.intensity,
            shadow_texture,
            enabled: u32::from(self.enabled),
            _pad: [0; 2],
        }
    }
}

/// Projection and view matrices for a light's shadow pass.
pub(crate) fn shadow_matrices(desc: &LightDesc) -> (Mat4, Mat4) {
    let direction =
        desc.direction.try_normalize().unwrap_or(Vec3::NEG_Z);
    let up = if direction.dot(Vec3::Y).abs() > 0.99 {
        Vec3::X
    } else {
        Vec3::Y
    };
    let view = Mat4::look_at_rh(
        desc.position,
        desc.position + direction,
        up,
    );
    let range = desc.radius.max(0.2);
    let projection = match desc.kind {
        LightKind::Cone => Mat4::perspective_rh(
            desc.fov.clamp(0.05, std::f32::consts::PI - 0.05),
            1.0,
            0.1,
            range,
        ),
        _ => Mat4::orthographic_rh(
            -range, range, -range, range, 0.1, 2.0 * range,
        ),
    };
    (projection, view)
}
