//! Resource creation, mutation, and destruction operations.
//!
//! All lifecycle entry points live here: shaders, materials (deduplicated
//! by name), models (deduplicated by path), renderables, lights, and
//! viewports. Anything backed by device memory defers its teardown
//! through the retire queue or the pending-destroy state.

use glam::Mat4;

use crate::arena::Handle;
use crate::error::KeelError;
use crate::gpu::backend::{
    BufferUsage, CopyRegion, MemoryClass, RenderBackend, TextureDesc,
    TextureFormat,
};
use crate::gpu::retire::RetiredResource;
use crate::gpu::staging::StagingBufferPair;
use crate::renderer::RendererCore;
use crate::scene::light::{
    shadow_matrices, Light, LightDesc, LightKind, ShadowMap,
};
use crate::scene::material::{Material, MaterialValue};
use crate::scene::model::{Model, ModelSource};
use crate::scene::renderable::{BlendShapeBuffers, Renderable};
use crate::scene::shader::{Shader, ShaderDesc};
use crate::scene::LifecycleState;
use crate::view::viewport::{Viewport, ViewportDesc};

impl<B: RenderBackend> RendererCore<B> {
    // -- Shaders --

    /// Register a shader. Creates the staged material-data buffer when the
    /// descriptor declares a stride, and takes a reference on every
    /// declared default texture.
    ///
    /// # Errors
    ///
    /// Propagates backend buffer-creation failure.
    pub fn create_shader(
        &mut self,
        desc: &ShaderDesc,
    ) -> Result<Handle<Shader>, KeelError> {
        let material_pair = match desc.material_buffer_stride {
            Some(stride) => Some(StagingBufferPair::new(
                &mut self.backend,
                &format!("{}-materials", desc.name),
                u64::from(stride)
                    * u64::from(self.options.limits.material_slots_per_shader),
                BufferUsage::Storage,
            )?),
            None => None,
        };
        for variable in &desc.variables {
            if let Some(texture) = variable.default.as_texture() {
                self.backend.retain_texture(texture);
            }
        }
        log::debug!("shader '{}' registered", desc.name);
        Ok(self.shaders.add(Shader::new(desc, material_pair)))
    }

    /// Unregister a shader, retiring its material buffer and default
    /// texture references. Materials still using it keep their handle and
    /// resolve to nothing (logged) until reassigned.
    pub fn destroy_shader(&mut self, handle: Handle<Shader>) {
        let Some(shader) = self.shaders.remove(handle) else {
            return;
        };
        if !shader.materials.is_empty() {
            log::warn!(
                "shader '{}' destroyed with {} materials attached",
                shader.name,
                shader.materials.len()
            );
        }
        for variable in &shader.variables {
            if let Some(texture) = variable.default.as_texture() {
                self.retire
                    .push(self.frame, RetiredResource::Texture(texture));
            }
        }
        if let Some(pair) = shader.material_pair {
            pair.retire(&mut self.retire, self.frame);
        }
        self.descriptor_rebuild = true;
    }

    /// Look up a shader handle by name.
    #[must_use]
    pub fn shader_by_name(&self, name: &str) -> Option<Handle<Shader>> {
        self.shaders
            .iter()
            .find(|(_, shader)| shader.name == name)
            .map(|(handle, _)| handle)
    }

    // -- Materials --

    /// Create a material or return the existing one with that name.
    ///
    /// Lookups are deduplicated by name: a rehit bumps the ref count and
    /// returns the same handle without touching the shader set.
    ///
    /// # Errors
    ///
    /// Returns [`KeelError::StaleHandle`] when `shader` is unknown.
    pub fn create_material(
        &mut self,
        name: &str,
        shader: Handle<Shader>,
    ) -> Result<Handle<Material>, KeelError> {
        if let Some(&existing) = self.material_names.get(name) {
            if let Some(material) = self.materials.get_mut(existing) {
                material.ref_count += 1;
                return Ok(existing);
            }
        }
        if !self.shaders.contains(shader) {
            log::error!("material '{name}' references an unknown shader");
            return Err(KeelError::StaleHandle("shader"));
        }
        let handle = self.materials.add(Material::new(name, shader));
        let _ = self.material_names.insert(name.to_owned(), handle);
        if let Some(shader_data) = self.shaders.get_mut(shader) {
            let _ = shader_data.attach_material(handle);
        }
        let _ = self.dirty_materials.insert(handle);
        Ok(handle)
    }

    /// Look up a material handle by name.
    #[must_use]
    pub fn material_by_name(&self, name: &str) -> Option<Handle<Material>> {
        self.material_names.get(name).copied()
    }

    /// Take an additional reference on a material.
    pub fn add_material_ref(&mut self, handle: Handle<Material>) {
        if let Some(material) = self.materials.get_mut(handle) {
            material.ref_count += 1;
        } else {
            log::warn!("add_material_ref with stale handle {handle:?}");
        }
    }

    /// Drop one reference; the material is destroyed at zero (textures
    /// released, shader set detached, name unregistered).
    pub fn release_material(&mut self, handle: Handle<Material>) {
        let Some(material) = self.materials.get_mut(handle) else {
            log::warn!("release_material with stale handle {handle:?}");
            return;
        };
        material.ref_count -= 1;
        if material.ref_count > 0 {
            return;
        }
        let Some(material) = self.materials.remove(handle) else {
            return;
        };
        for (_, value) in &material.variables {
            if let Some(texture) = value.as_texture() {
                self.retire
                    .push(self.frame, RetiredResource::Texture(texture));
            }
        }
        let _ = self.material_names.remove(&material.name);
        let _ = self.dirty_materials.remove(&handle);
        if let Some(shader) = self.shaders.get_mut(material.shader) {
            if shader.detach_material(handle) {
                // Ordinals shifted: every remaining set member needs its
                // slot re-serialized.
                for &member in &shader.materials {
                    let _ = self.dirty_materials.insert(member);
                }
            }
        }
        log::debug!("material '{}' destroyed", material.name);
    }

    /// Reassign a material to another shader.
    ///
    /// Detaches from the old shader's set and appends to the new one;
    /// both sets' bindings go dirty and every member whose ordinal
    /// shifted gets re-serialized at the next prepare.
    pub fn set_material_shader(
        &mut self,
        handle: Handle<Material>,
        shader: Handle<Shader>,
    ) {
        if !self.shaders.contains(shader) {
            log::error!("set_material_shader with unknown shader");
            return;
        }
        let Some(old_shader) =
            self.materials.get(handle).map(Material::shader)
        else {
            log::warn!("set_material_shader with stale handle {handle:?}");
            return;
        };
        if old_shader == shader {
            return;
        }
        if let Some(old) = self.shaders.get_mut(old_shader) {
            if old.detach_material(handle) {
                for &member in &old.materials {
                    let _ = self.dirty_materials.insert(member);
                }
            }
        }
        if let Some(new) = self.shaders.get_mut(shader) {
            let _ = new.attach_material(handle);
        }
        if let Some(material) = self.materials.get_mut(handle) {
            material.shader = shader;
            material.resolved = None;
        }
        let _ = self.dirty_materials.insert(handle);
    }

    /// Append-or-update a named variable and mark the material dirty.
    ///
    /// Texture values are reference-counted through the backend; a
    /// replaced texture reference is retired, not freed in place.
    pub fn set_material_variable(
        &mut self,
        handle: Handle<Material>,
        name: &str,
        value: MaterialValue,
    ) {
        if !self.materials.contains(handle) {
            log::warn!("set_material_variable with stale handle {handle:?}");
            return;
        }
        if let Some(texture) = value.as_texture() {
            self.backend.retain_texture(texture);
        }
        let replaced = match self.materials.get_mut(handle) {
            Some(material) => material.upsert(name, value),
            None => None,
        };
        if let Some(old) = replaced.as_ref().and_then(MaterialValue::as_texture)
        {
            self.retire.push(self.frame, RetiredResource::Texture(old));
        }
        let _ = self.dirty_materials.insert(handle);
    }

    // -- Models --

    /// Load a model or return the existing one for that path.
    ///
    /// A path rehit bumps the ref count and performs zero backend work.
    /// First load uploads both buffers and registers them in the shader
    /// buffer registry.
    ///
    /// # Errors
    ///
    /// Returns [`KeelError::EmptyModel`] for a source with no surfaces,
    /// [`KeelError::StaleHandle`] for an unknown surface material, and
    /// propagates backend failure.
    pub fn load_model(
        &mut self,
        source: &ModelSource<'_>,
    ) -> Result<Handle<Model>, KeelError> {
        if let Some(&existing) = self.model_paths.get(source.path) {
            if let Some(model) = self.models.get_mut(existing) {
                model.ref_count += 1;
                return Ok(existing);
            }
        }
        if source.surfaces.is_empty() {
            log::error!("model '{}' has no surfaces", source.path);
            return Err(KeelError::EmptyModel(source.path.to_owned()));
        }
        for surface in source.surfaces {
            if !self.materials.contains(surface.material) {
                log::error!(
                    "model '{}' references an unknown material",
                    source.path
                );
                return Err(KeelError::StaleHandle("material"));
            }
        }

        let vertex_buffer = self.backend.create_buffer(
            &format!("{}-vertices", source.path),
            source.vertex_data.len() as u64,
            BufferUsage::Vertex,
            MemoryClass::DeviceLocal,
        )?;
        let index_buffer = match self.backend.create_buffer(
            &format!("{}-indices", source.path),
            source.index_data.len() as u64,
            BufferUsage::Index,
            MemoryClass::DeviceLocal,
        ) {
            Ok(buffer) => buffer,
            Err(e) => {
                self.backend.destroy_buffer(vertex_buffer);
                return Err(e.into());
            }
        };
        self.backend.write_buffer(vertex_buffer, 0, source.vertex_data);
        self.backend.write_buffer(index_buffer, 0, source.index_data);

        let vertex_key = self.registry.add(vertex_buffer);
        let index_key = self.registry.add(index_buffer);

        for surface in source.surfaces {
            self.add_material_ref(surface.material);
        }

        let handle = self.models.add(Model {
            path: source.path.to_owned(),
            surfaces: source.surfaces.to_vec(),
            vertex_buffer,
            index_buffer,
            vertex_key,
            index_key,
            vertex_bytes: source.vertex_data.len() as u64,
            vertex_count: source.vertex_count,
            vertex_stride: source.vertex_stride,
            aabb: source.aabb,
            blend_shape_count: source.blend_shape_count,
            ref_count: 1,
        });
        let _ = self.model_paths.insert(source.path.to_owned(), handle);
        log::debug!(
            "model '{}' loaded ({} surfaces)",
            source.path,
            source.surfaces.len()
        );
        Ok(handle)
    }

    /// Drop one reference; at zero the model's buffers leave the registry
    /// and retire, and its surface material references release.
    pub fn release_model(&mut self, handle: Handle<Model>) {
        let Some(model) = self.models.get_mut(handle) else {
            log::warn!("release_model with stale handle {handle:?}");
            return;
        };
        model.ref_count -= 1;
        if model.ref_count > 0 {
            return;
        }
        let Some(model) = self.models.remove(handle) else {
            return;
        };
        let _ = self.registry.remove(model.vertex_key);
        let _ = self.registry.remove(model.index_key);
        self.retire
            .push(self.frame, RetiredResource::Buffer(model.vertex_buffer));
        self.retire
            .push(self.frame, RetiredResource::Buffer(model.index_buffer));
        let _ = self.model_paths.remove(&model.path);
        for surface in &model.surfaces {
            self.release_material(surface.material);
        }
        self.records_dirty = true;
        log::debug!("model '{}' destroyed", model.path);
    }

    // -- Renderables --

    /// Create a drawable instance of `model`.
    ///
    /// Takes a model reference and one reference per surface material.
    /// Models with blend shapes get a private vertex buffer (device-side
    /// copy of the base data) plus a host-visible weight buffer, both
    /// registered in the buffer registry.
    ///
    /// # Errors
    ///
    /// Returns [`KeelError::StaleHandle`] for an unknown model and
    /// propagates backend failure for the private buffers.
    pub fn create_renderable(
        &mut self,
        model: Handle<Model>,
        transform: Mat4,
    ) -> Result<Handle<Renderable>, KeelError> {
        let Some(model_data) = self.models.get_mut(model) else {
            log::error!("create_renderable with unknown model {model:?}");
            return Err(KeelError::StaleHandle("model"));
        };
        model_data.ref_count += 1;
        let materials: Vec<Handle<Material>> = model_data
            .surfaces
            .iter()
            .map(|surface| surface.material)
            .collect();
        let model_aabb = model_data.aabb;
        let model_vertex_buffer = model_data.vertex_buffer;
        let vertex_bytes = model_data.vertex_bytes;
        let blend_shape_count = model_data.blend_shape_count;
        let model_path = model_data.path.clone();

        for &material in &materials {
            self.add_material_ref(material);
        }

        let blend = if blend_shape_count > 0 {
            Some(self.create_blend_buffers(
                &model_path,
                model_vertex_buffer,
                vertex_bytes,
                blend_shape_count,
            )?)
        } else {
            None
        };

        let handle = self.renderables.add(Renderable {
            model,
            materials,
            transform,
            world_aabb: model_aabb.transform(&transform),
            visible: true,
            cast_shadow: true,
            test_visibility: true,
            blend,
            state: LifecycleState::Active,
        });
        self.records_dirty = true;
        self.matrices_dirty = true;
        Ok(handle)
    }

    fn create_blend_buffers(
        &mut self,
        model_path: &str,
        model_vertex_buffer: crate::gpu::BufferId,
        vertex_bytes: u64,
        blend_shape_count: u32,
    ) -> Result<BlendShapeBuffers, KeelError> {
        let vertex_buffer = self.backend.create_buffer(
            &format!("{model_path}-blend-vertices"),
            vertex_bytes,
            BufferUsage::Vertex,
            MemoryClass::DeviceLocal,
        )?;
        let weight_buffer = match self.backend.create_buffer(
            &format!("{model_path}-blend-weights"),
            u64::from(blend_shape_count) * 4,
            BufferUsage::Storage,
            MemoryClass::HostVisible,
        ) {
            Ok(buffer) => buffer,
            Err(e) => {
                self.backend.destroy_buffer(vertex_buffer);
                return Err(e.into());
            }
        };
        // Seed the private copy from the base vertex data so per-frame
        // skinning mutates only this instance.
        self.backend.queue_copy(
            model_vertex_buffer,
            vertex_buffer,
            &[CopyRegion {
                src_offset: 0,
                dst_offset: 0,
                size: vertex_bytes,
            }],
        );
        let vertex_key = self.registry.add(vertex_buffer);
        let weight_key = self.registry.add(weight_buffer);
        Ok(BlendShapeBuffers {
            vertex_buffer,
            vertex_key,
            weight_buffer,
            weight_key,
        })
    }

    /// Queue a renderable for destruction.
    ///
    /// The instance goes invisible and its GPU record zeroes immediately;
    /// refs and private buffers release once the current frame's fence
    /// completes.
    pub fn destroy_renderable(&mut self, handle: Handle<Renderable>) {
        let fence = self.frame;
        let Some(renderable) = self.renderables.get_mut(handle) else {
            log::warn!("destroy_renderable with stale handle {handle:?}");
            return;
        };
        if !renderable.state.is_active() {
            return;
        }
        renderable.state = LifecycleState::PendingDestroy { fence };
        renderable.visible = false;
        self.records_dirty = true;
    }

    /// Set the model-to-world matrix, recomputing the world AABB.
    pub fn set_renderable_transform(
        &mut self,
        handle: Handle<Renderable>,
        transform: Mat4,
    ) {
        let Some(model) =
            self.renderables.get(handle).map(Renderable::model)
        else {
            log::warn!("set_renderable_transform with stale handle");
            return;
        };
        let model_aabb = self.models.get(model).map(Model::aabb);
        if let Some(renderable) = self.renderables.get_mut(handle) {
            renderable.transform = transform;
            if let Some(aabb) = model_aabb {
                renderable.world_aabb = aabb.transform(&transform);
            }
            self.matrices_dirty = true;
        }
    }

    /// Toggle draw-list participation.
    pub fn set_renderable_visible(
        &mut self,
        handle: Handle<Renderable>,
        visible: bool,
    ) {
        if let Some(renderable) = self.renderables.get_mut(handle) {
            renderable.visible = visible;
        }
    }

    /// Toggle shadow-pass participation.
    pub fn set_renderable_cast_shadow(
        &mut self,
        handle: Handle<Renderable>,
        cast_shadow: bool,
    ) {
        if let Some(renderable) = self.renderables.get_mut(handle) {
            renderable.cast_shadow = cast_shadow;
        }
    }

    /// Toggle frustum testing; a non-testing instance always draws.
    pub fn set_renderable_test_visibility(
        &mut self,
        handle: Handle<Renderable>,
        test_visibility: bool,
    ) {
        if let Some(renderable) = self.renderables.get_mut(handle) {
            renderable.test_visibility = test_visibility;
        }
    }

    /// Write blend-shape weights into the instance's weight buffer.
    ///
    /// A no-op (logged) for rigid instances.
    pub fn set_blend_weights(
        &mut self,
        handle: Handle<Renderable>,
        weights: &[f32],
    ) {
        let Some(renderable) = self.renderables.get(handle) else {
            log::warn!("set_blend_weights with stale handle {handle:?}");
            return;
        };
        let Some(blend) = renderable.blend else {
            log::warn!("set_blend_weights on a rigid renderable");
            return;
        };
        self.backend.write_buffer(
            blend.weight_buffer,
            0,
            bytemuck::cast_slice(weights),
        );
    }

    // -- Lights --

    /// Create a light of `desc.kind`, allocating its array slot and — for
    /// shadow-casting directional/cone lights — its shadow resources.
    ///
    /// # Errors
    ///
    /// Returns [`KeelError::UnsupportedLightKind`] for capsule lights,
    /// [`KeelError::SlotsExhausted`] when the type array is full (callers
    /// degrade by skipping the light), and propagates backend failure for
    /// shadow resources.
    pub fn create_light(
        &mut self,
        desc: &LightDesc,
    ) -> Result<Handle<Light>, KeelError> {
        let label = match desc.kind {
            LightKind::Directional => "directional-lights",
            LightKind::Point => "point-lights",
            LightKind::Cone => "cone-lights",
            LightKind::Capsule => {
                log::error!("capsule lights have no shader array");
                return Err(KeelError::UnsupportedLightKind);
            }
        };
        let Some(slot) = self.light_allocator(desc.kind).allocate() else {
            return Err(KeelError::SlotsExhausted(label));
        };

        let wants_shadow = desc.cast_shadow && self.options.shadows.enabled;
        let shadow = if wants_shadow
            && matches!(desc.kind, LightKind::Directional | LightKind::Cone)
        {
            match self.create_shadow_map(desc) {
                Ok(shadow) => Some(shadow),
                Err(e) => {
                    let _ = self.light_allocator(desc.kind).free(slot);
                    return Err(e);
                }
            }
        } else {
            if wants_shadow {
                log::warn!(
                    "{:?} lights do not support shadow maps",
                    desc.kind
                );
            }
            None
        };

        let handle = self.lights.add(Light {
            kind: desc.kind,
            slot,
            enabled: true,
            color: desc.color,
            intensity: desc.intensity,
            position: desc.position,
            direction: desc.direction,
            radius: desc.radius,
            fov: desc.fov,
            shadow,
            state: LifecycleState::Active,
        });
        let _ = self.dirty_lights.insert(handle);
        self.core_dirty = true;
        Ok(handle)
    }

    pub(crate) fn light_allocator(
        &mut self,
        kind: LightKind,
    ) -> &mut crate::gpu::ShaderSlotAllocator {
        match kind {
            LightKind::Point => &mut self.point_slots,
            LightKind::Cone => &mut self.cone_slots,
            // Capsule is rejected at creation; map it to the directional
            // allocator so the match stays exhaustive.
            LightKind::Directional | LightKind::Capsule => {
                &mut self.directional_slots
            }
        }
    }

    fn create_shadow_map(
        &mut self,
        desc: &LightDesc,
    ) -> Result<ShadowMap, KeelError> {
        let resolution = self.options.shadows.map_resolution;
        let depth = self.backend.create_texture(
            "shadow-depth",
            &TextureDesc {
                width: resolution,
                height: resolution,
                format: TextureFormat::Depth32,
                render_target: true,
            },
        )?;
        let framebuffer = match self.backend.create_framebuffer(
            "shadow-framebuffer",
            None,
            Some(depth),
        ) {
            Ok(framebuffer) => framebuffer,
            Err(e) => {
                self.backend.release_texture(depth);
                return Err(e.into());
            }
        };
        let (projection, view) = shadow_matrices(desc);
        let viewport = match self.create_viewport(&ViewportDesc {
            width: resolution,
            height: resolution,
            projection,
            view,
            shader_override: self.shadow_shader,
        }) {
            Ok(viewport) => viewport,
            Err(e) => {
                self.backend.destroy_framebuffer(framebuffer);
                self.backend.release_texture(depth);
                return Err(e);
            }
        };
        if let Some(viewport_data) = self.viewports.get_mut(viewport) {
            viewport_data.shadow_pass = true;
        }
        Ok(ShadowMap {
            viewport,
            depth,
            framebuffer,
            resolution,
        })
    }

    /// Queue a light for destruction; slot and shadow resources free once
    /// the current frame's fence completes.
    pub fn destroy_light(&mut self, handle: Handle<Light>) {
        let fence = self.frame;
        let Some(light) = self.lights.get_mut(handle) else {
            log::warn!("destroy_light with stale handle {handle:?}");
            return;
        };
        if !light.state.is_active() {
            return;
        }
        light.state = LifecycleState::PendingDestroy { fence };
        light.enabled = false;
        let _ = self.dirty_lights.insert(handle);
    }

    /// Toggle the light's contribution.
    pub fn set_light_enabled(&mut self, handle: Handle<Light>, enabled: bool) {
        if let Some(light) = self.lights.get_mut(handle) {
            light.enabled = enabled;
            let _ = self.dirty_lights.insert(handle);
        }
    }

    /// Set color and intensity.
    pub fn set_light_color(
        &mut self,
        handle: Handle<Light>,
        color: glam::Vec3,
        intensity: f32,
    ) {
        if let Some(light) = self.lights.get_mut(handle) {
            light.color = color;
            light.intensity = intensity;
            let _ = self.dirty_lights.insert(handle);
        }
    }

    /// Move the light (and its shadow viewport, if any).
    pub fn set_light_transform(
        &mut self,
        handle: Handle<Light>,
        position: glam::Vec3,
        direction: glam::Vec3,
    ) {
        let Some(light) = self.lights.get_mut(handle) else {
            return;
        };
        light.position = position;
        light.direction = direction;
        let shadow_viewport = light.shadow.as_ref().map(|s| s.viewport);
        let matrices = shadow_viewport.map(|_| {
            shadow_matrices(&LightDesc {
                kind: light.kind,
                color: light.color,
                intensity: light.intensity,
                position,
                direction,
                radius: light.radius,
                fov: light.fov,
                cast_shadow: true,
            })
        });
        let _ = self.dirty_lights.insert(handle);
        if let (Some(viewport), Some((projection, view))) =
            (shadow_viewport, matrices)
        {
            self.set_viewport_matrices(viewport, projection, view);
        }
    }

    /// Set the influence radius (and cone angle for cone lights).
    pub fn set_light_shape(
        &mut self,
        handle: Handle<Light>,
        radius: f32,
        fov: f32,
    ) {
        if let Some(light) = self.lights.get_mut(handle) {
            light.radius = radius;
            light.fov = fov;
            let _ = self.dirty_lights.insert(handle);
        }
    }

    // -- Viewports --

    /// Create a viewport, allocating its array slot.
    ///
    /// # Errors
    ///
    /// Returns [`KeelError::SlotsExhausted`] when the viewport array is
    /// full.
    pub fn create_viewport(
        &mut self,
        desc: &ViewportDesc,
    ) -> Result<Handle<Viewport>, KeelError> {
        let Some(slot) = self.viewport_slots.allocate() else {
            return Err(KeelError::SlotsExhausted("viewports"));
        };
        let handle = self.viewports.add(Viewport::new(slot, desc));
        self.viewports_dirty = true;
        self.core_dirty = true;
        Ok(handle)
    }

    /// Destroy a viewport and free its slot.
    pub fn destroy_viewport(&mut self, handle: Handle<Viewport>) {
        if let Some(viewport) = self.viewports.remove(handle) {
            let _ = self.viewport_slots.free(viewport.slot);
            self.viewports_dirty = true;
            self.core_dirty = true;
        }
    }

    /// Update camera matrices; the frustum re-derives at the next prepare.
    pub fn set_viewport_matrices(
        &mut self,
        handle: Handle<Viewport>,
        projection: Mat4,
        view: Mat4,
    ) {
        if let Some(viewport) = self.viewports.get_mut(handle) {
            viewport.projection = projection;
            viewport.view = view;
            self.viewports_dirty = true;
        }
    }

    /// Toggle draw-list building and rendering for a viewport.
    pub fn set_viewport_active(
        &mut self,
        handle: Handle<Viewport>,
        active: bool,
    ) {
        if let Some(viewport) = self.viewports.get_mut(handle) {
            viewport.active = active;
            self.viewports_dirty = true;
        }
    }

    /// Force every draw in the viewport to one shader (selection passes).
    pub fn set_viewport_shader_override(
        &mut self,
        handle: Handle<Viewport>,
        shader: Option<Handle<Shader>>,
    ) {
        if let Some(viewport) = self.viewports.get_mut(handle) {
            viewport.shader_override = shader;
        }
    }
}
