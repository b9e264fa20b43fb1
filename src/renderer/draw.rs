//! The draw pass: walk prebuilt buckets, emit commands.
//!
//! `render` iterates each requested viewport's shader buckets in the
//! order `prepare_draw_data` left them and emits pipeline binds, buffer
//! binds, push constants, and indexed draws through the recorder. No
//! culling or resolution happens here; the lists are final.

use crate::arena::Handle;
use crate::gpu::backend::{CommandRecorder, RenderBackend};
use crate::renderer::RendererCore;
use crate::view::viewport::Viewport;

/// Per-draw push-constant block.
///
/// NOTE: Must match the shader-side struct layout exactly (8 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawConstants {
    /// Position of the renderable's record in the renderable array.
    pub record_index: u32,
    /// The draw's slot in the viewport's list (locates per-draw data).
    pub draw_slot: u32,
}

impl<B: RenderBackend> RendererCore<B> {
    /// Emit draw commands for `viewports` through `recorder`.
    ///
    /// Inactive viewports and shadow passes culled this frame are
    /// skipped; unknown handles are a logged warning.
    pub fn render(
        &mut self,
        recorder: &mut dyn CommandRecorder,
        viewports: &[Handle<Viewport>],
    ) {
        for &handle in viewports {
            let Some(viewport) = self.viewports.get(handle) else {
                log::warn!("render with stale viewport handle {handle:?}");
                continue;
            };
            if !viewport.active
                || (viewport.shadow_pass && viewport.shadow_culled)
            {
                continue;
            }
            let (width, height) = viewport.size();
            recorder.set_viewport(0.0, 0.0, width as f32, height as f32);
            recorder.set_scissor(0, 0, width, height);

            let mut draws = 0_u32;
            for (shader_handle, entries) in viewport.draw_list.buckets() {
                let Some(shader) = self.shaders.get(shader_handle) else {
                    continue;
                };
                recorder.bind_pipeline(shader.pipeline);
                for entry in entries {
                    let Some(renderable) =
                        self.renderables.get(entry.renderable)
                    else {
                        continue;
                    };
                    let Some(model) = self.models.get(renderable.model)
                    else {
                        continue;
                    };
                    let Some(surface) =
                        model.surfaces.get(entry.surface as usize)
                    else {
                        continue;
                    };
                    recorder.bind_vertex_buffer(
                        renderable.draw_vertex_buffer(model),
                    );
                    recorder.bind_index_buffer(model.index_buffer);
                    let constants = DrawConstants {
                        record_index: entry.record_index,
                        draw_slot: entry.draw_slot,
                    };
                    recorder.push_constants(bytemuck::bytes_of(&constants));
                    recorder.draw_indexed(
                        surface.index_count,
                        surface.first_index,
                        surface.base_vertex,
                    );
                    draws += 1;
                }
            }
            self.stats.draws_emitted += draws;
        }
    }
}
