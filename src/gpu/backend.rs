//! Device-layer contracts.
//!
//! The core consumes the graphics backend as an opaque service: create and
//! destroy buffers and textures, write and copy bytes, record draw
//! commands, wait for the queue. Pipelines are minted by the backend layer
//! and cross this boundary only as opaque [`PipelineId`]s — pipeline and
//! descriptor-set mechanics stay on the far side.

use std::fmt;
use std::path::Path;

/// Opaque device buffer id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(u64);

/// Opaque device texture id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(u64);

/// Opaque framebuffer (attachment bundle) id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferId(u64);

/// Opaque pipeline id, minted by the backend layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineId(u64);

macro_rules! raw_id {
    ($ty:ident) => {
        impl $ty {
            /// Wrap a backend-assigned raw id.
            #[must_use]
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            /// The backend-assigned raw id.
            #[must_use]
            pub const fn raw(self) -> u64 {
                self.0
            }
        }
    };
}

raw_id!(BufferId);
raw_id!(TextureId);
raw_id!(FramebufferId);
raw_id!(PipelineId);

/// Primary role of a device buffer.
///
/// Backends add whatever transfer bits their API needs on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Vertex data.
    Vertex,
    /// Index data.
    Index,
    /// Shader-visible uniform data.
    Uniform,
    /// Shader-visible storage data.
    Storage,
}

/// Where a buffer lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryClass {
    /// GPU-only memory; written via queued copies.
    DeviceLocal,
    /// CPU-writable memory; the staging side of a pair.
    HostVisible,
}

/// One region of a queued buffer-to-buffer copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyRegion {
    /// Byte offset into the source buffer.
    pub src_offset: u64,
    /// Byte offset into the destination buffer.
    pub dst_offset: u64,
    /// Bytes to copy.
    pub size: u64,
}

/// Texel format of a created texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// 8-bit RGBA, sRGB sampling.
    Rgba8Srgb,
    /// 8-bit RGBA, linear sampling.
    Rgba8Linear,
    /// 32-bit float depth.
    Depth32,
}

/// Parameters for [`RenderBackend::create_texture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Texel format.
    pub format: TextureFormat,
    /// Whether the texture will be rendered to.
    pub render_target: bool,
}

/// Errors surfaced by a [`RenderBackend`].
#[derive(Debug)]
pub enum BackendError {
    /// Device buffer creation failed.
    BufferCreation(String),
    /// Device texture creation failed.
    TextureCreation(String),
    /// A texture file could not be read or decoded.
    TextureDecode(String),
    /// Framebuffer creation failed (missing or mismatched attachments).
    FramebufferCreation(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferCreation(msg) => {
                write!(f, "buffer creation failed: {msg}")
            }
            Self::TextureCreation(msg) => {
                write!(f, "texture creation failed: {msg}")
            }
            Self::TextureDecode(msg) => {
                write!(f, "texture decode failed: {msg}")
            }
            Self::FramebufferCreation(msg) => {
                write!(f, "framebuffer creation failed: {msg}")
            }
        }
    }
}

impl std::error::Error for BackendError {}

/// The device contract the core drives.
///
/// All methods take `&mut self`: the core is single-threaded and
/// frame-synchronous, so backends need no interior locking on this path.
pub trait RenderBackend {
    /// Create a device buffer.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::BufferCreation`] if the device rejects the
    /// allocation. Callers treat failure for foundational buffers as fatal.
    fn create_buffer(
        &mut self,
        label: &str,
        size: u64,
        usage: BufferUsage,
        memory: MemoryClass,
    ) -> Result<BufferId, BackendError>;

    /// Destroy a device buffer.
    ///
    /// The caller guarantees no in-flight GPU work references it (see
    /// [`crate::gpu::RetireQueue`]).
    fn destroy_buffer(&mut self, buffer: BufferId);

    /// Write bytes into a buffer through the transfer queue.
    fn write_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]);

    /// Queue buffer-to-buffer copy regions for the next submission.
    fn queue_copy(
        &mut self,
        src: BufferId,
        dst: BufferId,
        regions: &[CopyRegion],
    );

    /// Submit all copies queued since the last submission.
    fn submit_queued_copies(&mut self);

    /// Create a device texture.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::TextureCreation`] on device failure.
    fn create_texture(
        &mut self,
        label: &str,
        desc: &TextureDesc,
    ) -> Result<TextureId, BackendError>;

    /// Load a texture from disk. Decoding is the backend's collaborator.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::TextureDecode`] if the file cannot be read
    /// or decoded; callers downgrade this to a missing texture.
    fn load_texture(&mut self, path: &Path)
        -> Result<TextureId, BackendError>;

    /// Increment a texture's reference count.
    fn retain_texture(&mut self, texture: TextureId);

    /// Decrement a texture's reference count, freeing it at zero.
    fn release_texture(&mut self, texture: TextureId);

    /// Shader-visible index of a texture in the backend's texture table,
    /// or `None` if the texture is unknown.
    fn texture_shader_index(&self, texture: TextureId) -> Option<u32>;

    /// Create a framebuffer from color/depth attachments.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::FramebufferCreation`] if no attachment is
    /// given or an attachment id is unknown.
    fn create_framebuffer(
        &mut self,
        label: &str,
        color: Option<TextureId>,
        depth: Option<TextureId>,
    ) -> Result<FramebufferId, BackendError>;

    /// Destroy a framebuffer (attachments are not destroyed).
    fn destroy_framebuffer(&mut self, framebuffer: FramebufferId);

    /// Block until the graphics queue is idle.
    ///
    /// No timeout semantics: a wait that never returns is a fatal hang,
    /// not a recoverable error.
    fn wait_idle(&mut self);

    /// Mark everything submitted so far as belonging to the next frame
    /// fence value and return that value.
    fn end_frame(&mut self) -> u64;

    /// Highest frame fence value the GPU has fully completed.
    fn completed_frame(&self) -> u64;
}

/// The command-recording contract used by the draw pass.
///
/// A recorder wraps one backend render pass; the core emits state binds
/// and draws in bucket order and never records raw API commands.
pub trait CommandRecorder {
    /// Set the viewport rectangle.
    fn set_viewport(&mut self, x: f32, y: f32, width: f32, height: f32);

    /// Set the scissor rectangle.
    fn set_scissor(&mut self, x: u32, y: u32, width: u32, height: u32);

    /// Bind a pipeline.
    fn bind_pipeline(&mut self, pipeline: PipelineId);

    /// Bind the vertex buffer for subsequent draws.
    fn bind_vertex_buffer(&mut self, buffer: BufferId);

    /// Bind the index buffer for subsequent draws.
    fn bind_index_buffer(&mut self, buffer: BufferId);

    /// Push per-draw constant bytes.
    fn push_constants(&mut self, data: &[u8]);

    /// Non-indexed draw.
    fn draw(&mut self, vertex_count: u32, first_vertex: u32);

    /// Indexed draw.
    fn draw_indexed(
        &mut self,
        index_count: u32,
        first_index: u32,
        base_vertex: i32,
    );
}
