//! Reference [`RenderBackend`] implementation over wgpu.
//!
//! Owns the device/queue pair plus id tables for every resource the core
//! hands out. Copy queueing batches into one command encoder per
//! submission; frame completion is tracked through
//! `Queue::on_submitted_work_done` callbacks. Texture decoding is an
//! injected collaborator (asset parsing stays outside the core), so a
//! backend without a decoder reports `TextureDecode` for disk loads.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::gpu::backend::{
    BackendError, BufferId, BufferUsage, CommandRecorder, CopyRegion,
    FramebufferId, MemoryClass, PipelineId, RenderBackend, TextureDesc,
    TextureFormat, TextureId,
};

/// A decoded RGBA8 image, as produced by the injected decoder.
pub struct DecodedImage {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Tightly-packed RGBA8 pixels (`width * height * 4` bytes).
    pub pixels: Vec<u8>,
    /// Whether the data is sRGB-encoded.
    pub srgb: bool,
}

/// Injected texture decoder: path in, decoded RGBA8 out.
pub type TextureDecoder =
    Box<dyn Fn(&Path) -> Result<DecodedImage, String>>;

struct TextureEntry {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    refs: u32,
    shader_index: u32,
}

/// Attachments of a framebuffer bundle.
#[derive(Debug, Clone, Copy)]
pub struct FramebufferAttachments {
    /// Color attachment, if any.
    pub color: Option<TextureId>,
    /// Depth attachment, if any.
    pub depth: Option<TextureId>,
}

/// [`RenderBackend`] over a wgpu device/queue pair.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    buffers: FxHashMap<u64, wgpu::Buffer>,
    textures: FxHashMap<u64, TextureEntry>,
    framebuffers: FxHashMap<u64, FramebufferAttachments>,
    pipelines: FxHashMap<u64, wgpu::RenderPipeline>,
    pending_copies: Vec<(BufferId, BufferId, CopyRegion)>,
    decoder: Option<TextureDecoder>,
    next_id: u64,
    next_texture_index: u32,
    submitted_frame: u64,
    completed_frame: Arc<AtomicU64>,
}

impl WgpuBackend {
    /// Backend over an existing device and queue.
    #[must_use]
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            buffers: FxHashMap::default(),
            textures: FxHashMap::default(),
            framebuffers: FxHashMap::default(),
            pipelines: FxHashMap::default(),
            pending_copies: Vec::new(),
            decoder: None,
            next_id: 1,
            next_texture_index: 0,
            submitted_frame: 0,
            completed_frame: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Inject the texture decoder used by [`RenderBackend::load_texture`].
    #[must_use]
    pub fn with_texture_decoder(mut self, decoder: TextureDecoder) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// The wgpu device.
    #[must_use]
    pub const fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// The wgpu queue.
    #[must_use]
    pub const fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    fn next(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Register an externally-built pipeline and mint its id.
    pub fn register_render_pipeline(
        &mut self,
        pipeline: wgpu::RenderPipeline,
    ) -> PipelineId {
        let id = self.next();
        let _ = self.pipelines.insert(id, pipeline);
        PipelineId::from_raw(id)
    }

    /// The view of a registered texture.
    #[must_use]
    pub fn texture_view(
        &self,
        texture: TextureId,
    ) -> Option<&wgpu::TextureView> {
        self.textures.get(&texture.raw()).map(|t| &t.view)
    }

    /// A framebuffer's attachment ids.
    #[must_use]
    pub fn framebuffer(
        &self,
        framebuffer: FramebufferId,
    ) -> Option<FramebufferAttachments> {
        self.framebuffers.get(&framebuffer.raw()).copied()
    }

    fn insert_texture(&mut self, texture: wgpu::Texture) -> TextureId {
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let id = self.next();
        let shader_index = self.next_texture_index;
        self.next_texture_index += 1;
        let _ = self.textures.insert(
            id,
            TextureEntry {
                texture,
                view,
                refs: 1,
                shader_index,
            },
        );
        TextureId::from_raw(id)
    }
}

const fn buffer_usages(usage: BufferUsage) -> wgpu::BufferUsages {
    match usage {
        BufferUsage::Vertex => wgpu::BufferUsages::VERTEX,
        BufferUsage::Index => wgpu::BufferUsages::INDEX,
        BufferUsage::Uniform => wgpu::BufferUsages::UNIFORM,
        BufferUsage::Storage => wgpu::BufferUsages::STORAGE,
    }
}

const fn texture_format(format: TextureFormat) -> wgpu::TextureFormat {
    match format {
        TextureFormat::Rgba8Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        TextureFormat::Rgba8Linear => wgpu::TextureFormat::Rgba8Unorm,
        TextureFormat::Depth32 => wgpu::TextureFormat::Depth32Float,
    }
}

impl RenderBackend for WgpuBackend {
    fn create_buffer(
        &mut self,
        label: &str,
        size: u64,
        usage: BufferUsage,
        _memory: MemoryClass,
    ) -> Result<BufferId, BackendError> {
        // wgpu abstracts memory classes; both sides of a staging pair are
        // plain buffers with transfer usage.
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: size.max(4),
            usage: buffer_usages(usage)
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let id = self.next();
        let _ = self.buffers.insert(id, buffer);
        Ok(BufferId::from_raw(id))
    }

    fn destroy_buffer(&mut self, buffer: BufferId) {
        if self.buffers.remove(&buffer.raw()).is_none() {
            log::warn!("destroy of unknown buffer {buffer:?}");
        }
    }

    fn write_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]) {
        if let Some(target) = self.buffers.get(&buffer.raw()) {
            self.queue.write_buffer(target, offset, data);
        } else {
            log::warn!("write to unknown buffer {buffer:?}");
        }
    }

    fn queue_copy(
        &mut self,
        src: BufferId,
        dst: BufferId,
        regions: &[CopyRegion],
    ) {
        for &region in regions {
            self.pending_copies.push((src, dst, region));
        }
    }

    fn submit_queued_copies(&mut self) {
        if self.pending_copies.is_empty() {
            return;
        }
        let mut encoder = self.device.create_command_encoder(
            &wgpu::CommandEncoderDescriptor {
                label: Some("staging-copies"),
            },
        );
        for (src, dst, region) in self.pending_copies.drain(..) {
            let (Some(src), Some(dst)) = (
                self.buffers.get(&src.raw()),
                self.buffers.get(&dst.raw()),
            ) else {
                log::warn!("queued copy references a destroyed buffer");
                continue;
            };
            encoder.copy_buffer_to_buffer(
                src,
                region.src_offset,
                dst,
                region.dst_offset,
                region.size,
            );
        }
        let _ = self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_texture(
        &mut self,
        label: &str,
        desc: &TextureDesc,
    ) -> Result<TextureId, BackendError> {
        let mut usage = wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_DST;
        if desc.render_target {
            usage |= wgpu::TextureUsages::RENDER_ATTACHMENT;
        }
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: desc.width.max(1),
                height: desc.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: texture_format(desc.format),
            usage,
            view_formats: &[],
        });
        Ok(self.insert_texture(texture))
    }

    fn load_texture(
        &mut self,
        path: &Path,
    ) -> Result<TextureId, BackendError> {
        let Some(decoder) = self.decoder.as_ref() else {
            return Err(BackendError::TextureDecode(
                "no texture decoder injected".to_owned(),
            ));
        };
        let image = decoder(path).map_err(BackendError::TextureDecode)?;
        let format = if image.srgb {
            TextureFormat::Rgba8Srgb
        } else {
            TextureFormat::Rgba8Linear
        };
        let label = path.to_string_lossy().into_owned();
        let id = self.create_texture(
            &label,
            &TextureDesc {
                width: image.width,
                height: image.height,
                format,
                render_target: false,
            },
        )?;
        if let Some(entry) = self.textures.get(&id.raw()) {
            self.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &entry.texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &image.pixels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * image.width),
                    rows_per_image: Some(image.height),
                },
                wgpu::Extent3d {
                    width: image.width,
                    height: image.height,
                    depth_or_array_layers: 1,
                },
            );
        }
        Ok(id)
    }

    fn retain_texture(&mut self, texture: TextureId) {
        if let Some(entry) = self.textures.get_mut(&texture.raw()) {
            entry.refs += 1;
        } else {
            log::warn!("retain of unknown texture {texture:?}");
        }
    }

    fn release_texture(&mut self, texture: TextureId) {
        let Some(entry) = self.textures.get_mut(&texture.raw()) else {
            log::warn!("release of unknown texture {texture:?}");
            return;
        };
        entry.refs -= 1;
        if entry.refs == 0 {
            let _ = self.textures.remove(&texture.raw());
        }
    }

    fn texture_shader_index(&self, texture: TextureId) -> Option<u32> {
        self.textures.get(&texture.raw()).map(|t| t.shader_index)
    }

    fn create_framebuffer(
        &mut self,
        _label: &str,
        color: Option<TextureId>,
        depth: Option<TextureId>,
    ) -> Result<FramebufferId, BackendError> {
        if color.is_none() && depth.is_none() {
            return Err(BackendError::FramebufferCreation(
                "framebuffer needs at least one attachment".to_owned(),
            ));
        }
        for attachment in [color, depth].into_iter().flatten() {
            if !self.textures.contains_key(&attachment.raw()) {
                return Err(BackendError::FramebufferCreation(format!(
                    "unknown attachment {attachment:?}"
                )));
            }
        }
        let id = self.next();
        let _ = self
            .framebuffers
            .insert(id, FramebufferAttachments { color, depth });
        Ok(FramebufferId::from_raw(id))
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferId) {
        if self.framebuffers.remove(&framebuffer.raw()).is_none() {
            log::warn!("destroy of unknown framebuffer {framebuffer:?}");
        }
    }

    fn wait_idle(&mut self) {
        let _ = self.device.poll(wgpu::PollType::Wait);
        let _ = self
            .completed_frame
            .fetch_max(self.submitted_frame, Ordering::AcqRel);
    }

    fn end_frame(&mut self) -> u64 {
        self.submitted_frame += 1;
        let frame = self.submitted_frame;
        let completed = Arc::clone(&self.completed_frame);
        self.queue.on_submitted_work_done(move || {
            let _ = completed.fetch_max(frame, Ordering::AcqRel);
        });
        frame
    }

    fn completed_frame(&self) -> u64 {
        // Callbacks only run when the device is maintained.
        let _ = self.device.poll(wgpu::PollType::Poll);
        self.completed_frame.load(Ordering::Acquire)
    }
}

/// [`CommandRecorder`] over one wgpu render pass.
pub struct WgpuRecorder<'a> {
    backend: &'a WgpuBackend,
    pass: wgpu::RenderPass<'a>,
    /// Stages push constants target; pipelines must declare a matching
    /// range.
    push_constant_stages: wgpu::ShaderStages,
}

impl<'a> WgpuRecorder<'a> {
    /// Wrap a render pass begun by the caller.
    #[must_use]
    pub const fn new(
        backend: &'a WgpuBackend,
        pass: wgpu::RenderPass<'a>,
    ) -> Self {
        Self {
            backend,
            pass,
            push_constant_stages: wgpu::ShaderStages::VERTEX_FRAGMENT,
        }
    }
}

impl CommandRecorder for WgpuRecorder<'_> {
    fn set_viewport(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.pass.set_viewport(x, y, width, height, 0.0, 1.0);
    }

    fn set_scissor(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.pass.set_scissor_rect(x, y, width, height);
    }

    fn bind_pipeline(&mut self, pipeline: PipelineId) {
        if let Some(p) = self.backend.pipelines.get(&pipeline.raw()) {
            self.pass.set_pipeline(p);
        } else {
            log::warn!("bind of unknown pipeline {pipeline:?}");
        }
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferId) {
        if let Some(b) = self.backend.buffers.get(&buffer.raw()) {
            self.pass.set_vertex_buffer(0, b.slice(..));
        }
    }

    fn bind_index_buffer(&mut self, buffer: BufferId) {
        if let Some(b) = self.backend.buffers.get(&buffer.raw()) {
            self.pass
                .set_index_buffer(b.slice(..), wgpu::IndexFormat::Uint32);
        }
    }

    fn push_constants(&mut self, data: &[u8]) {
        self.pass
            .set_push_constants(self.push_constant_stages, 0, data);
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) {
        self.pass
            .draw(first_vertex..first_vertex + vertex_count, 0..1);
    }

    fn draw_indexed(
        &mut self,
        index_count: u32,
        first_index: u32,
        base_vertex: i32,
    ) {
        self.pass.draw_indexed(
            first_index..first_index + index_count,
            base_vertex,
            0..1,
        );
    }
}
