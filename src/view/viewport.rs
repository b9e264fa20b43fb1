//! Slot-allocated cameras with shader overrides.

use glam::{Mat4, Vec3};

use crate::arena::Handle;
use crate::gpu::slots::SlotToken;
use crate::scene::shader::Shader;
use crate::view::draw_list::ViewRenderList;
use crate::view::frustum::Frustum;

/// Parameters for viewport creation.
#[derive(Debug, Clone, Copy)]
pub struct ViewportDesc {
    /// Render width in pixels.
    pub width: u32,
    /// Render height in pixels.
    pub height: u32,
    /// Projection matrix ([0,1] depth range).
    pub projection: Mat4,
    /// View matrix.
    pub view: Mat4,
    /// Shader forced onto every draw in this viewport (shadow-map and
    /// selection passes). `None` for primary viewports.
    pub shader_override: Option<Handle<Shader>>,
}

/// Shader-visible camera record.
///
/// NOTE: Must match the shader-side struct layout exactly (80 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ViewportRecord {
    /// Column-major view-projection matrix.
    pub view_proj: [f32; 16],
    /// World-space eye position.
    pub eye: [f32; 3],
    /// Padding to a 16-byte boundary.
    pub _pad: f32,
}

/// A slot-allocated camera with a derived frustum and an owned draw list.
pub struct Viewport {
    pub(crate) slot: SlotToken,
    pub(crate) projection: Mat4,
    pub(crate) view: Mat4,
    pub(crate) frustum: Frustum,
    pub(crate) active: bool,
    pub(crate) shader_override: Option<Handle<Shader>>,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) draw_list: ViewRenderList,
    /// Owned by a shadow-casting light; draws only shadow casters.
    pub(crate) shadow_pass: bool,
    /// Set per frame for shadow viewports whose light frustum is not
    /// visible from any active primary viewport.
    pub(crate) shadow_culled: bool,
}

impl Viewport {
    pub(crate) fn new(slot: SlotToken, desc: &ViewportDesc) -> Self {
        Self {
            slot,
            projection: desc.projection,
            view: desc.view,
            frustum: Frustum::from_view_projection(
                desc.projection * desc.view,
            ),
            active: true,
            shader_override: desc.shader_override,
            width: desc.width,
            height: desc.height,
            draw_list: ViewRenderList::new(),
            shadow_pass: false,
            shadow_culled: false,
        }
    }

    /// Whether this viewport belongs to a shadow-casting light.
    #[must_use]
    pub const fn is_shadow_pass(&self) -> bool {
        self.shadow_pass
    }

    /// Combined view-projection matrix.
    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// Re-derive the frustum from the current matrices.
    pub(crate) fn refresh_frustum(&mut self) {
        self.frustum =
            Frustum::from_view_projection(self.view_projection());
    }

    /// The derived frustum (valid as of the last prepare step).
    #[must_use]
    pub const fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    /// Whether the viewport participates in draw-list building.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// The forced shader, if this is an override pass.
    #[must_use]
    pub const fn shader_override(&self) -> Option<Handle<Shader>> {
        self.shader_override
    }

    /// Render size in pixels.
    #[must_use]
    pub const fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The prebuilt draw list for this viewport.
    #[must_use]
    pub const fn draw_list(&self) -> &ViewRenderList {
        &self.draw_list
    }

    pub(crate) fn record(&self) -> ViewportRecord {
        let eye: Vec3 = self.view.inverse().w_axis.truncate();
        ViewportRecord {
            view_proj: self.view_projection().to_cols_array(),
            eye: eye.to_array(),
            _pad: 0.0,
        }
    }
}
