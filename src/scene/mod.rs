//! Resource lifecycles: shaders, materials, models, renderables, lights.
//!
//! Every resource lives in a generational arena owned by
//! [`crate::renderer::RendererCore`]; handles are the only references that
//! cross the API boundary. Destruction of anything backed by device memory
//! is deferred through the fence-keyed retire queue.

/// Typed lights with per-type shader arrays and shadow resources.
pub mod light;
/// Named materials with dynamically-typed variable bags.
pub mod material;
/// Immutable-after-load geometry with ref counting.
pub mod model;
/// Drawable instances with world AABBs and optional blend-shape buffers.
pub mod renderable;
/// Shader descriptors, material sets, and material-buffer layouts.
pub mod shader;

pub use light::{Light, LightDesc, LightKind, LightRecord, ShadowMap};
pub use material::{
    Material, MaterialValue, MaterialValueKind, ResolvedMaterial,
    ResolvedVariable,
};
pub use model::{Model, ModelSource, ModelSurface};
pub use renderable::{BlendShapeBuffers, Renderable, RenderableRecord};
pub use shader::{Shader, ShaderDesc, ShaderVariableDesc};

/// Lifecycle state shared by renderables and lights.
///
/// `PendingDestroy` exists because destruction may require waiting for
/// in-flight GPU work; the resource stays structurally present (so
/// iteration needs no mid-frame null checks) but is excluded from draw
/// lists and array rewrites until the fence completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Visible and updatable.
    Active,
    /// Queued for destruction; reclaimed once the fence completes.
    PendingDestroy {
        /// Frame fence that must complete before reclamation.
        fence: u64,
    },
}

impl LifecycleState {
    /// Whether the resource still participates in frames.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}
