//! The owning context object for all resource state.
//!
//! [`RendererCore`] replaces the process-wide singletons of classic engine
//! cores with one explicitly-owned context: constructed at renderer init
//! with an injected backend, torn down by [`RendererCore::shutdown`],
//! never lazily constructed mid-frame. All mutation happens through it on
//! the render thread; there is no internal locking by design.

mod draw;
mod prepare;
mod resources;
#[cfg(test)]
mod tests;

pub use draw::DrawConstants;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::arena::{Arena, Handle};
use crate::error::KeelError;
use crate::gpu::backend::{BufferUsage, RenderBackend};
use crate::gpu::registry::ShaderBufferRegistry;
use crate::gpu::retire::RetireQueue;
use crate::gpu::slots::ShaderSlotAllocator;
use crate::gpu::staging::StagingBufferPair;
use crate::options::RenderOptions;
use crate::scene::light::{Light, LightRecord};
use crate::scene::material::Material;
use crate::scene::model::Model;
use crate::scene::renderable::{Renderable, RenderableRecord};
use crate::scene::shader::Shader;
use crate::view::viewport::{Viewport, ViewportRecord};

/// Shared shader-visible counts, one record per frame.
///
/// NOTE: Must match the shader-side struct layout exactly (16 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CoreRecord {
    /// Live directional-light count.
    pub directional_count: u32,
    /// Live point-light count.
    pub point_count: u32,
    /// Live cone-light count.
    pub cone_count: u32,
    /// Live viewport count.
    pub viewport_count: u32,
}

/// Per-frame counters for the debug overlay.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameStats {
    /// Frame index these counters belong to.
    pub frame: u64,
    /// Viewports whose draw lists were rebuilt.
    pub viewports_built: u32,
    /// Draw calls emitted by `render`.
    pub draws_emitted: u32,
    /// Renderables rejected by frustum tests.
    pub renderables_culled: u32,
    /// Staging copies queued by the flush step.
    pub copies_queued: u32,
    /// Resources freed by the retire queue this frame.
    pub retired: u32,
}

/// The resource-and-draw-list core.
///
/// Generic over the backend so consumers inject the real device layer and
/// tests inject a recording mock.
pub struct RendererCore<B: RenderBackend> {
    pub(crate) backend: B,
    pub(crate) options: RenderOptions,

    pub(crate) shaders: Arena<Shader>,
    pub(crate) materials: Arena<Material>,
    pub(crate) models: Arena<Model>,
    pub(crate) renderables: Arena<Renderable>,
    pub(crate) lights: Arena<Light>,
    pub(crate) viewports: Arena<Viewport>,

    /// Name → handle map deduplicating material loads.
    pub(crate) material_names: FxHashMap<String, Handle<Material>>,
    /// Path → handle map deduplicating model loads.
    pub(crate) model_paths: FxHashMap<String, Handle<Model>>,
    pub(crate) dirty_materials: FxHashSet<Handle<Material>>,
    pub(crate) dirty_lights: FxHashSet<Handle<Light>>,

    pub(crate) registry: ShaderBufferRegistry,
    pub(crate) viewport_slots: ShaderSlotAllocator,
    pub(crate) directional_slots: ShaderSlotAllocator,
    pub(crate) point_slots: ShaderSlotAllocator,
    pub(crate) cone_slots: ShaderSlotAllocator,

    pub(crate) core_pair: StagingBufferPair,
    pub(crate) viewport_pair: StagingBufferPair,
    pub(crate) renderable_pair: StagingBufferPair,
    pub(crate) matrix_pair: StagingBufferPair,
    pub(crate) directional_pair: StagingBufferPair,
    pub(crate) point_pair: StagingBufferPair,
    pub(crate) cone_pair: StagingBufferPair,

    pub(crate) retire: RetireQueue,
    pub(crate) frame: u64,

    pub(crate) records_dirty: bool,
    pub(crate) matrices_dirty: bool,
    pub(crate) viewports_dirty: bool,
    pub(crate) core_dirty: bool,
    pub(crate) descriptor_rebuild: bool,

    pub(crate) wireframe_shader: Option<Handle<Shader>>,
    pub(crate) shadow_shader: Option<Handle<Shader>>,

    pub(crate) stats: FrameStats,
}

impl<B: RenderBackend> RendererCore<B> {
    /// Construct the core and its foundational staging pairs.
    ///
    /// # Errors
    ///
    /// Propagates backend buffer-creation failure — foundational arrays
    /// are essential, so callers treat this as fatal.
    pub fn new(backend: B, options: RenderOptions) -> Result<Self, KeelError> {
        let mut backend = backend;
        let limits = &options.limits;
        let light_bytes = u64::from(limits.light_slots_per_type)
            * size_of::<LightRecord>() as u64;

        let core_pair = StagingBufferPair::new(
            &mut backend,
            "core-data",
            size_of::<CoreRecord>() as u64,
            BufferUsage::Uniform,
        )?;
        let viewport_pair = StagingBufferPair::new(
            &mut backend,
            "viewport-array",
            u64::from(limits.viewport_slots)
                * size_of::<ViewportRecord>() as u64,
            BufferUsage::Storage,
        )?;
        let renderable_pair = StagingBufferPair::new(
            &mut backend,
            "renderable-array",
            64 * size_of::<RenderableRecord>() as u64,
            BufferUsage::Storage,
        )?;
        let matrix_pair = StagingBufferPair::new(
            &mut backend,
            "matrix-array",
            64 * 64,
            BufferUsage::Storage,
        )?;
        let directional_pair = StagingBufferPair::new(
            &mut backend,
            "directional-lights",
            light_bytes,
            BufferUsage::Storage,
        )?;
        let point_pair = StagingBufferPair::new(
            &mut backend,
            "point-lights",
            light_bytes,
            BufferUsage::Storage,
        )?;
        let cone_pair = StagingBufferPair::new(
            &mut backend,
            "cone-lights",
            light_bytes,
            BufferUsage::Storage,
        )?;

        let viewport_slots =
            ShaderSlotAllocator::new("viewports", limits.viewport_slots);
        let directional_slots = ShaderSlotAllocator::new(
            "directional-lights",
            limits.light_slots_per_type,
        );
        let point_slots = ShaderSlotAllocator::new(
            "point-lights",
            limits.light_slots_per_type,
        );
        let cone_slots = ShaderSlotAllocator::new(
            "cone-lights",
            limits.light_slots_per_type,
        );

        Ok(Self {
            backend,
            options,
            shaders: Arena::new(),
            materials: Arena::new(),
            models: Arena::new(),
            renderables: Arena::new(),
            lights: Arena::new(),
            viewports: Arena::new(),
            material_names: FxHashMap::default(),
            model_paths: FxHashMap::default(),
            dirty_materials: FxHashSet::default(),
            dirty_lights: FxHashSet::default(),
            registry: ShaderBufferRegistry::new(),
            viewport_slots,
            directional_slots,
            point_slots,
            cone_slots,
            core_pair,
            viewport_pair,
            renderable_pair,
            matrix_pair,
            directional_pair,
            point_pair,
            cone_pair,
            retire: RetireQueue::new(),
            frame: 0,
            records_dirty: false,
            matrices_dirty: false,
            viewports_dirty: false,
            core_dirty: true,
            descriptor_rebuild: true,
            wireframe_shader: None,
            shadow_shader: None,
            stats: FrameStats::default(),
        })
    }

    /// Current options.
    #[must_use]
    pub const fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Mutable options (read each frame; capacities only apply at init).
    pub fn options_mut(&mut self) -> &mut RenderOptions {
        &mut self.options
    }

    /// The injected backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable backend access.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// The bindless buffer registry.
    #[must_use]
    pub const fn registry(&self) -> &ShaderBufferRegistry {
        &self.registry
    }

    /// Counters from the current frame.
    #[must_use]
    pub const fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Frame index of the prepare step in flight.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Whether any shader-visible array changed element count this frame,
    /// requiring a descriptor-set rewrite by the consumer. Consuming
    /// resets the flag. Content-only changes never set it.
    pub fn take_descriptor_rebuild(&mut self) -> bool {
        std::mem::take(&mut self.descriptor_rebuild)
    }

    /// Register the global wireframe-override shader.
    pub fn set_wireframe_shader(&mut self, shader: Option<Handle<Shader>>) {
        self.wireframe_shader = shader;
    }

    /// Register the depth-only shader forced onto shadow passes.
    pub fn set_shadow_shader(&mut self, shader: Option<Handle<Shader>>) {
        self.shadow_shader = shader;
    }

    /// Advance the backend frame fence. Call once per frame after
    /// submitting draw work.
    pub fn end_frame(&mut self) -> u64 {
        self.backend.end_frame()
    }

    /// Generation-checked shader read.
    #[must_use]
    pub fn shader(&self, handle: Handle<Shader>) -> Option<&Shader> {
        self.shaders.get(handle)
    }

    /// Generation-checked material read.
    #[must_use]
    pub fn material(&self, handle: Handle<Material>) -> Option<&Material> {
        self.materials.get(handle)
    }

    /// Generation-checked model read.
    #[must_use]
    pub fn model(&self, handle: Handle<Model>) -> Option<&Model> {
        self.models.get(handle)
    }

    /// Generation-checked renderable read.
    #[must_use]
    pub fn renderable(
        &self,
        handle: Handle<Renderable>,
    ) -> Option<&Renderable> {
        self.renderables.get(handle)
    }

    /// Generation-checked light read.
    #[must_use]
    pub fn light(&self, handle: Handle<Light>) -> Option<&Light> {
        self.lights.get(handle)
    }

    /// Generation-checked viewport read.
    #[must_use]
    pub fn viewport(&self, handle: Handle<Viewport>) -> Option<&Viewport> {
        self.viewports.get(handle)
    }

    /// Blocking teardown: waits for the queue, frees everything the core
    /// owns, and hands the injected backend back to the caller.
    pub fn shutdown(self) -> B {
        let Self {
            mut backend,
            mut shaders,
            materials,
            models,
            renderables,
            lights,
            mut retire,
            core_pair,
            viewport_pair,
            renderable_pair,
            matrix_pair,
            directional_pair,
            point_pair,
            cone_pair,
            ..
        } = self;

        backend.wait_idle();
        retire.drain_all(&mut backend);

        for (_, renderable) in renderables.iter() {
            if let Some(blend) = renderable.blend {
                backend.destroy_buffer(blend.vertex_buffer);
                backend.destroy_buffer(blend.weight_buffer);
            }
        }
        for (_, model) in models.iter() {
            backend.destroy_buffer(model.vertex_buffer);
            backend.destroy_buffer(model.index_buffer);
        }
        for (_, material) in materials.iter() {
            for (_, value) in &material.variables {
                if let Some(texture) = value.as_texture() {
                    backend.release_texture(texture);
                }
            }
        }
        for (_, light) in lights.iter() {
            if let Some(shadow) = light.shadow {
                backend.destroy_framebuffer(shadow.framebuffer);
                backend.release_texture(shadow.depth);
            }
        }
        for (_, shader) in shaders.iter_mut() {
            for variable in &shader.variables {
                if let Some(texture) = variable.default.as_texture() {
                    backend.release_texture(texture);
                }
            }
            if let Some(pair) = shader.material_pair.take() {
                backend.destroy_buffer(pair.staging());
                backend.destroy_buffer(pair.target());
            }
        }
        for pair in [
            core_pair,
            viewport_pair,
            renderable_pair,
            matrix_pair,
            directional_pair,
            point_pair,
            cone_pair,
        ] {
            backend.destroy_buffer(pair.staging());
            backend.destroy_buffer(pair.target());
        }
        log::debug!("renderer core shut down");
        backend
    }
}
