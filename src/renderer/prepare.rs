//! The once-per-frame prepare pipeline.
//!
//! Ordering matters and is fixed: retire sweep and pending-destroy
//! finalization, arena consolidation, dirty-material resolution, light
//! array rewrites, registry-position recomputation, draw-list builds,
//! staging flushes, copy submission. Consumers call
//! [`RendererCore::prepare_draw_data`] once per frame before `render`.

use bytemuck::Zeroable;

use crate::arena::Handle;
use crate::gpu::backend::RenderBackend;
use crate::renderer::{CoreRecord, FrameStats, RendererCore};
use crate::scene::light::{LightKind, LightRecord};
use crate::scene::renderable::RenderableRecord;
use crate::scene::LifecycleState;
use crate::view::frustum::Frustum;
use crate::view::viewport::ViewportRecord;

impl<B: RenderBackend> RendererCore<B> {
    /// Run the per-frame resource-prep pipeline.
    pub fn prepare_draw_data(&mut self) {
        self.frame += 1;
        self.stats = FrameStats {
            frame: self.frame,
            ..FrameStats::default()
        };

        self.stats.retired =
            self.retire.drain_completed(&mut self.backend) as u32;
        self.finalize_destroyed();
        self.consolidate_arenas();

        self.resolve_dirty_materials();
        self.update_light_arrays();

        // The hard-to-skip step: a mutated registry invalidates every
        // record-embedded buffer position, so the record array must be
        // rewritten (positions are re-derived during the rewrite) and the
        // grown/shrunk bindless array needs a descriptor rewrite.
        if self.registry.take_dirty() {
            self.records_dirty = true;
            self.descriptor_rebuild = true;
        }

        self.build_draw_lists();
        self.flush_arrays();
        self.backend.submit_queued_copies();
    }

    fn consolidate_arenas(&mut self) {
        self.shaders.consolidate();
        self.materials.consolidate();
        self.models.consolidate();
        self.renderables.consolidate();
        self.lights.consolidate();
        self.viewports.consolidate();
    }

    /// Reclaim pending-destroy renderables and lights whose fence the GPU
    /// has completed.
    fn finalize_destroyed(&mut self) {
        let completed = self.backend.completed_frame();

        let pending: Vec<Handle<_>> = self
            .renderables
            .iter()
            .filter_map(|(handle, renderable)| match renderable.state {
                LifecycleState::PendingDestroy { fence }
                    if fence <= completed =>
                {
                    Some(handle)
                }
                _ => None,
            })
            .collect();
        for handle in pending {
            let Some(renderable) = self.renderables.remove(handle) else {
                continue;
            };
            self.release_model(renderable.model);
            for material in renderable.materials {
                self.release_material(material);
            }
            if let Some(blend) = renderable.blend {
                let _ = self.registry.remove(blend.vertex_key);
                let _ = self.registry.remove(blend.weight_key);
                // The fence proved these idle; no need to re-queue them.
                self.backend.destroy_buffer(blend.vertex_buffer);
                self.backend.destroy_buffer(blend.weight_buffer);
            }
            self.records_dirty = true;
            self.matrices_dirty = true;
        }

        let pending: Vec<Handle<_>> = self
            .lights
            .iter()
            .filter_map(|(handle, light)| match light.state {
                LifecycleState::PendingDestroy { fence }
                    if fence <= completed =>
                {
                    Some(handle)
                }
                _ => None,
            })
            .collect();
        for handle in pending {
            let Some(light) = self.lights.remove(handle) else {
                continue;
            };
            let _ = self.light_allocator(light.kind).free(light.slot);
            if let Some(shadow) = light.shadow {
                self.destroy_viewport(shadow.viewport);
                self.backend.destroy_framebuffer(shadow.framebuffer);
                self.backend.release_texture(shadow.depth);
            }
            let _ = self.dirty_lights.remove(&handle);
            self.core_dirty = true;
        }
    }

    /// Drain the dirty-material set: resolve each against its shader's
    /// descriptors and serialize into the shader's material-data slot.
    fn resolve_dirty_materials(&mut self) {
        if self.dirty_materials.is_empty() {
            return;
        }
        let dirty: Vec<_> = self.dirty_materials.drain().collect();
        for handle in dirty {
            let Some(material) = self.materials.get(handle) else {
                continue;
            };
            let shader_handle = material.shader;
            let Some(shader) = self.shaders.get(shader_handle) else {
                log::warn!(
                    "material '{}' references a missing shader",
                    material.name
                );
                continue;
            };
            let resolved = material.resolve(shader);
            let packed = shader.material_buffer_stride.and_then(|stride| {
                shader.material_slot_of(handle).map(|slot| {
                    let mut bytes = vec![0_u8; stride as usize];
                    resolved.pack_into(&self.backend, &mut bytes);
                    (slot, bytes)
                })
            });
            if let Some(material) = self.materials.get_mut(handle) {
                material.resolved = Some(resolved);
            }
            if let Some((slot, bytes)) = packed {
                if let Some(shader) = self.shaders.get_mut(shader_handle) {
                    shader.write_material_slot(slot, &bytes);
                }
            }
        }
    }

    /// Rewrite any light type array whose membership or members changed.
    ///
    /// Whole-array policy: positions come from the allocator's used list,
    /// so one freed slot shifts everything after it.
    fn update_light_arrays(&mut self) {
        let members_dirty = !self.dirty_lights.is_empty();
        self.dirty_lights.clear();
        if members_dirty {
            // Per-renderable light counts embed light reach; refresh them.
            self.records_dirty = true;
        }

        for kind in [LightKind::Directional, LightKind::Point, LightKind::Cone]
        {
            let (allocator, pair) = match kind {
                LightKind::Directional => {
                    (&mut self.directional_slots, &mut self.directional_pair)
                }
                LightKind::Point => {
                    (&mut self.point_slots, &mut self.point_pair)
                }
                LightKind::Cone | LightKind::Capsule => {
                    (&mut self.cone_slots, &mut self.cone_pair)
                }
            };
            let membership_dirty = allocator.take_dirty();
            if !membership_dirty && !members_dirty {
                continue;
            }
            if membership_dirty {
                self.core_dirty = true;
                self.records_dirty = true;
            }

            let mut records =
                vec![LightRecord::zeroed(); allocator.used_len()];
            for (_, light) in self.lights.iter() {
                if light.kind != kind || !light.state.is_active() {
                    continue;
                }
                if let Some(position) = allocator.position_of(light.slot) {
                    records[position] = light.record(&self.backend);
                }
            }
            if let Err(e) = pair.write(
                &mut self.backend,
                &mut self.retire,
                self.frame,
                bytemuck::cast_slice(&records),
            ) {
                log::error!("{kind:?} light array staging write failed: {e}");
            }
        }
    }

    /// Rebuild every active viewport's shader-bucketed draw list.
    fn build_draw_lists(&mut self) {
        if self.options.visibility.lock_visibility {
            return;
        }
        for (_, viewport) in self.viewports.iter_mut() {
            if viewport.active {
                viewport.refresh_frustum();
                viewport.shadow_culled = false;
            }
        }
        self.schedule_shadow_passes();

        for handle in self.viewports.handles() {
            self.build_viewport_list(handle);
        }
    }

    /// Skip shadow maps whose light frustum no active primary viewport
    /// can see this frame.
    fn schedule_shadow_passes(&mut self) {
        let primary: Vec<Frustum> = self
            .viewports
            .iter()
            .filter(|(_, v)| v.active && !v.shadow_pass)
            .map(|(_, v)| v.frustum.clone())
            .collect();

        let culled: Vec<_> = self
            .lights
            .iter()
            .filter_map(|(_, light)| {
                let shadow = light.shadow.as_ref()?;
                if !light.state.is_active() || !light.enabled {
                    return Some(shadow.viewport);
                }
                let viewport = self.viewports.get(shadow.viewport)?;
                if primary.iter().any(|f| f.overlaps(&viewport.frustum)) {
                    None
                } else {
                    Some(shadow.viewport)
                }
            })
            .collect();
        for handle in culled {
            if let Some(viewport) = self.viewports.get_mut(handle) {
                viewport.shadow_culled = true;
            }
        }
    }

    fn build_viewport_list(
        &mut self,
        handle: Handle<crate::view::viewport::Viewport>,
    ) {
        let wireframe = self.options.debug.wireframe;
        let wireframe_shader = self.wireframe_shader;

        let Some(viewport) = self.viewports.get_mut(handle) else {
            return;
        };
        if !viewport.active
            || (viewport.shadow_pass && viewport.shadow_culled)
        {
            return;
        }
        let shadow_pass =
            viewport.shadow_pass || viewport.shader_override.is_some();
        let override_shader = viewport.shader_override;
        let frustum = viewport.frustum.clone();
        viewport.draw_list.clear();
        let list = &mut viewport.draw_list;
        self.stats.viewports_built += 1;

        for position in 0..self.renderables.position_count() {
            let Some(renderable_handle) = self.renderables.handle_at(position)
            else {
                continue;
            };
            let Some(renderable) = self.renderables.get_by_index(position)
            else {
                continue;
            };
            if !renderable.state.is_active() || !renderable.visible {
                continue;
            }
            if shadow_pass && !renderable.cast_shadow {
                continue;
            }
            if renderable.test_visibility
                && !frustum.intersects_aabb(&renderable.world_aabb)
            {
                self.stats.renderables_culled += 1;
                continue;
            }
            let Some(model) = self.models.get(renderable.model) else {
                log::warn!(
                    "renderable {renderable_handle:?} references a missing \
                     model"
                );
                continue;
            };
            for (surface_index, surface) in model.surfaces.iter().enumerate()
            {
                let material_handle = renderable
                    .materials
                    .get(surface_index)
                    .copied()
                    .unwrap_or(surface.material);
                let shader_handle = if let Some(forced) = override_shader {
                    forced
                } else {
                    let Some(material) = self.materials.get(material_handle)
                    else {
                        log::warn!(
                            "surface {surface_index} references a missing \
                             material"
                        );
                        continue;
                    };
                    let base = material.shader;
                    match (wireframe, wireframe_shader) {
                        (true, Some(wf))
                            if !self
                                .shaders
                                .get(base)
                                .is_some_and(|s| s.wireframe_exempt) =>
                        {
                            wf
                        }
                        _ => base,
                    }
                };
                if !self.shaders.contains(shader_handle) {
                    continue;
                }
                list.push(
                    shader_handle,
                    renderable_handle,
                    surface_index as u32,
                    position as u32,
                );
            }
        }
    }

    /// Rewrite and flush every dirty GPU-visible array.
    fn flush_arrays(&mut self) {
        let fence = self.frame;

        if self.core_dirty {
            let record = CoreRecord {
                directional_count: self.directional_slots.used_len() as u32,
                point_count: self.point_slots.used_len() as u32,
                cone_count: self.cone_slots.used_len() as u32,
                viewport_count: self.viewport_slots.used_len() as u32,
            };
            if let Err(e) = self.core_pair.write(
                &mut self.backend,
                &mut self.retire,
                fence,
                bytemuck::bytes_of(&record),
            ) {
                log::error!("core array staging write failed: {e}");
            }
            self.core_dirty = false;
        }

        if self.viewport_slots.take_dirty() {
            self.viewports_dirty = true;
        }
        if self.viewports_dirty {
            let mut records =
                vec![ViewportRecord::zeroed(); self.viewport_slots.used_len()];
            for (_, viewport) in self.viewports.iter() {
                if let Some(position) =
                    self.viewport_slots.position_of(viewport.slot)
                {
                    records[position] = viewport.record();
                }
            }
            if let Err(e) = self.viewport_pair.write(
                &mut self.backend,
                &mut self.retire,
                fence,
                bytemuck::cast_slice(&records),
            ) {
                log::error!("viewport array staging write failed: {e}");
            }
            self.viewports_dirty = false;
        }

        if self.records_dirty {
            let records = self.renderable_records();
            match self.renderable_pair.write(
                &mut self.backend,
                &mut self.retire,
                fence,
                bytemuck::cast_slice(&records),
            ) {
                Ok(reallocated) => {
                    if reallocated {
                        self.descriptor_rebuild = true;
                    }
                }
                Err(e) => {
                    log::error!(
                        "renderable array staging write failed: {e}"
                    );
                }
            }
            self.records_dirty = false;
        }

        if self.matrices_dirty {
            let matrices = self.model_matrices();
            match self.matrix_pair.write(
                &mut self.backend,
                &mut self.retire,
                fence,
                bytemuck::cast_slice(&matrices),
            ) {
                Ok(reallocated) => {
                    if reallocated {
                        self.descriptor_rebuild = true;
                    }
                }
                Err(e) => {
                    log::error!("matrix array staging write failed: {e}");
                }
            }
            self.matrices_dirty = false;
        }

        for (_, shader) in self.shaders.iter_mut() {
            if std::mem::take(&mut shader.material_data_dirty) {
                if let Some(pair) = shader.material_pair.as_mut() {
                    match pair.write(
                        &mut self.backend,
                        &mut self.retire,
                        fence,
                        &shader.material_bytes,
                    ) {
                        Ok(reallocated) => {
                            if reallocated {
                                self.descriptor_rebuild = true;
                            }
                        }
                        Err(e) => {
                            log::error!(
                                "material buffer staging write failed: {e}"
                            );
                        }
                    }
                }
            }
            if shader.take_bindings_dirty() {
                self.descriptor_rebuild = true;
            }
            if let Some(pair) = shader.material_pair.as_mut() {
                if pair.flush(&mut self.backend) {
                    self.stats.copies_queued += 1;
                }
            }
        }

        let backend = &mut self.backend;
        for pair in [
            &mut self.core_pair,
            &mut self.viewport_pair,
            &mut self.renderable_pair,
            &mut self.matrix_pair,
            &mut self.directional_pair,
            &mut self.point_pair,
            &mut self.cone_pair,
        ] {
            if pair.flush(backend) {
                self.stats.copies_queued += 1;
            }
        }
    }

    /// One record per dense renderable position; dead and pending-destroy
    /// positions stay zeroed so no stale draw references them.
    fn renderable_records(&self) -> Vec<RenderableRecord> {
        let count = self.renderables.position_count();
        let mut records = vec![RenderableRecord::zeroed(); count];
        for (position, record) in records.iter_mut().enumerate() {
            let Some(renderable) = self.renderables.get_by_index(position)
            else {
                continue;
            };
            if !renderable.state.is_active() {
                continue;
            }
            let Some(model) = self.models.get(renderable.model) else {
                continue;
            };
            let vertex_index =
                self.registry.index_of(renderable.draw_vertex_key(model));
            let index_index = self.registry.index_of(model.index_key);
            let (Some(vertex), Some(index)) = (vertex_index, index_index)
            else {
                log::warn!(
                    "model '{}' buffers missing from the registry",
                    model.path
                );
                continue;
            };
            let light_count = self
                .lights
                .iter()
                .filter(|(_, light)| {
                    light.state.is_active()
                        && light.enabled
                        && light.affects(&renderable.world_aabb)
                })
                .count() as u32;
            *record = RenderableRecord {
                vertex_buffer_index: vertex.position,
                index_buffer_index: index.position,
                matrix_index: position as u32,
                light_count,
            };
        }
        records
    }

    /// One model matrix per dense renderable position.
    fn model_matrices(&self) -> Vec<[f32; 16]> {
        let count = self.renderables.position_count();
        let mut matrices = vec![[0.0_f32; 16]; count];
        for (position, matrix) in matrices.iter_mut().enumerate() {
            if let Some(renderable) = self.renderables.get_by_index(position)
            {
                *matrix = renderable.transform.to_cols_array();
            }
        }
        matrices
    }
}
