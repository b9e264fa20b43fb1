//! Drawable instances with world AABBs and optional blend-shape buffers.
//!
//! A renderable pairs a model with per-surface materials, a model-to-world
//! matrix, and visibility flags. Instances with active blend shapes own a
//! private vertex buffer (a device-side copy of the model's base data that
//! skinning mutates) plus a host-visible blend-weight buffer; rigid
//! instances share the model's buffers.

use glam::Mat4;

use crate::arena::Handle;
use crate::gpu::backend::BufferId;
use crate::gpu::registry::BufferKey;
use crate::scene::material::Material;
use crate::scene::model::Model;
use crate::scene::LifecycleState;
use crate::view::frustum::Aabb;

/// Private geometry of a blend-shape instance, registered in the shader
/// buffer registry alongside the shared model buffers.
#[derive(Debug, Clone, Copy)]
pub struct BlendShapeBuffers {
    /// Private copy of the model's vertex data.
    pub vertex_buffer: BufferId,
    /// Registry key of the private vertex buffer.
    pub vertex_key: BufferKey,
    /// Host-visible blend-weight buffer.
    pub weight_buffer: BufferId,
    /// Registry key of the weight buffer.
    pub weight_key: BufferKey,
}

/// Shader-visible per-renderable record.
///
/// Zeroed the moment the renderable is queued for destruction so no stale
/// draw references a freed instance for even one frame.
/// NOTE: Must match the shader-side struct layout exactly (16 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RenderableRecord {
    /// Position of the vertex buffer in the bindless array.
    pub vertex_buffer_index: u32,
    /// Position of the index buffer in the bindless array.
    pub index_buffer_index: u32,
    /// Position of the model matrix in the matrix array.
    pub matrix_index: u32,
    /// Number of lights affecting this instance.
    pub light_count: u32,
}

/// One drawable instance.
pub struct Renderable {
    pub(crate) model: Handle<Model>,
    /// Per-surface materials, one ref held each.
    pub(crate) materials: Vec<Handle<Material>>,
    pub(crate) transform: Mat4,
    /// Model AABB transformed into world space; cached per transform set.
    pub(crate) world_aabb: Aabb,
    pub(crate) visible: bool,
    pub(crate) cast_shadow: bool,
    /// When false the instance skips frustum testing and always draws.
    pub(crate) test_visibility: bool,
    pub(crate) blend: Option<BlendShapeBuffers>,
    pub(crate) state: LifecycleState,
}

impl Renderable {
    /// The instanced model.
    #[must_use]
    pub const fn model(&self) -> Handle<Model> {
        self.model
    }

    /// Per-surface materials.
    #[must_use]
    pub fn materials(&self) -> &[Handle<Material>] {
        &self.materials
    }

    /// Model-to-world matrix.
    #[must_use]
    pub const fn transform(&self) -> Mat4 {
        self.transform
    }

    /// World-space bounds.
    #[must_use]
    pub const fn world_aabb(&self) -> Aabb {
        self.world_aabb
    }

    /// Whether the instance participates in draw lists.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether the instance renders into shadow passes.
    #[must_use]
    pub const fn casts_shadow(&self) -> bool {
        self.cast_shadow
    }

    /// Private blend-shape buffers, if the model has blend shapes.
    #[must_use]
    pub const fn blend_buffers(&self) -> Option<&BlendShapeBuffers> {
        self.blend.as_ref()
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// The vertex buffer draws bind: the private copy when blend shapes
    /// are active, the model's otherwise.
    #[must_use]
    pub fn draw_vertex_buffer(&self, model: &Model) -> BufferId {
        self.blend
            .as_ref()
            .map_or(model.vertex_buffer, |b| b.vertex_buffer)
    }

    /// Registry key of the bound vertex buffer.
    #[must_use]
    pub fn draw_vertex_key(&self, model: &Model) -> BufferKey {
        self.blend
            .as_ref()
            .map_or(model.vertex_key, |b| b.vertex_key)
    }
}
