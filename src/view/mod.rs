//! Cameras and per-frame draw lists.
//!
//! A viewport is a slot-allocated camera with a derived frustum and an
//! owned render list; the draw-list builder in the renderer fills the
//! lists once per frame from the live renderable set.

/// Shader-bucketed per-viewport render lists.
pub mod draw_list;
/// Frustum planes/corners, AABBs, and intersection tests.
pub mod frustum;
/// Slot-allocated cameras with shader overrides.
pub mod viewport;

pub use draw_list::{DrawEntry, ViewRenderList};
pub use frustum::{Aabb, Frustum, Plane};
pub use viewport::{Viewport, ViewportDesc, ViewportRecord};
