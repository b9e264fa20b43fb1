//! GPU resource management and device contracts.
//!
//! Everything the core needs from the device layer is expressed as the
//! [`RenderBackend`] and [`CommandRecorder`] traits; the core never issues
//! raw GPU API calls itself. The rest of this module is the machinery that
//! keeps shader-visible arrays consistent with what the GPU reads: slot
//! allocation, the bindless buffer registry, staging/target buffer pairs,
//! and fence-keyed deferred destruction.

/// Device-layer traits, opaque resource ids, and descriptor types.
pub mod backend;
/// Dynamic registry deriving compacted GPU array indices for buffers.
pub mod registry;
/// Fence-keyed deferred-destruction queue for device resources.
pub mod retire;
/// Fixed-capacity allocator for shader-visible array positions.
pub mod slots;
/// Host-writable staging buffers paired with device-local targets.
pub mod staging;
/// Reference [`RenderBackend`] implementation over wgpu.
pub mod wgpu_backend;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{
    BackendError, BufferId, BufferUsage, CommandRecorder, CopyRegion,
    FramebufferId, MemoryClass, PipelineId, RenderBackend, TextureDesc,
    TextureFormat, TextureId,
};
pub use registry::{BufferIndex, BufferKey, ShaderBufferRegistry};
pub use retire::{RetireQueue, RetiredResource};
pub use slots::{ShaderSlotAllocator, SlotToken};
pub use staging::StagingBufferPair;
pub use wgpu_backend::{
    DecodedImage, TextureDecoder, WgpuBackend, WgpuRecorder,
};
