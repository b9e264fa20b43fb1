//! Immutable-after-load geometry with ref counting.
//!
//! A model arrives from the external asset loader as raw vertex/index
//! bytes plus surface ranges; the core owns the device buffers, registers
//! them in the shader buffer registry, and deduplicates loads by path.
//! Destruction happens only when the ref count reaches zero.

use crate::arena::Handle;
use crate::gpu::backend::BufferId;
use crate::gpu::registry::BufferKey;
use crate::scene::material::Material;
use crate::view::frustum::Aabb;

/// One drawable range of a model: an index span plus its material.
#[derive(Debug, Clone, Copy)]
pub struct ModelSurface {
    /// First index in the index buffer.
    pub first_index: u32,
    /// Number of indices.
    pub index_count: u32,
    /// Value added to each index before vertex lookup.
    pub base_vertex: i32,
    /// Material drawn with (a ref is held per referencing surface).
    pub material: Handle<Material>,
}

/// What the external asset loader hands over. Parsing is out of scope;
/// this is the finished geometry.
#[derive(Debug, Clone)]
pub struct ModelSource<'a> {
    /// Deduplication path.
    pub path: &'a str,
    /// Raw vertex bytes.
    pub vertex_data: &'a [u8],
    /// Raw index bytes (u32 indices).
    pub index_data: &'a [u8],
    /// Vertex count.
    pub vertex_count: u32,
    /// Bytes per vertex.
    pub vertex_stride: u32,
    /// Drawable ranges; must be non-empty.
    pub surfaces: &'a [ModelSurface],
    /// Object-space bounds, computed by the loader.
    pub aabb: Aabb,
    /// Number of blend shapes baked into the vertex data (0 = rigid).
    pub blend_shape_count: u32,
}

/// Loaded geometry: device buffers, registry keys, surfaces, ref count.
pub struct Model {
    pub(crate) path: String,
    pub(crate) surfaces: Vec<ModelSurface>,
    pub(crate) vertex_buffer: BufferId,
    pub(crate) index_buffer: BufferId,
    pub(crate) vertex_key: BufferKey,
    pub(crate) index_key: BufferKey,
    pub(crate) vertex_bytes: u64,
    pub(crate) vertex_count: u32,
    pub(crate) vertex_stride: u32,
    pub(crate) aabb: Aabb,
    pub(crate) blend_shape_count: u32,
    pub(crate) ref_count: u32,
}

impl Model {
    /// Deduplication path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Drawable ranges.
    #[must_use]
    pub fn surfaces(&self) -> &[ModelSurface] {
        &self.surfaces
    }

    /// Object-space bounds.
    #[must_use]
    pub const fn aabb(&self) -> Aabb {
        self.aabb
    }

    /// Active owner count.
    #[must_use]
    pub const fn ref_count(&self) -> u32 {
        self.ref_count
    }

    /// Whether the vertex data carries blend shapes.
    #[must_use]
    pub const fn has_blend_shapes(&self) -> bool {
        self.blend_shape_count > 0
    }

    /// The shared vertex buffer.
    #[must_use]
    pub const fn vertex_buffer(&self) -> BufferId {
        self.vertex_buffer
    }

    /// The shared index buffer.
    #[must_use]
    pub const fn index_buffer(&self) -> BufferId {
        self.index_buffer
    }
}
