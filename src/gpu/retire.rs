//! Fence-keyed deferred-destruction queue for device resources.
//!
//! A resource queued here stays alive until the backend reports that the
//! frame fence recorded at queue time has completed, proving no in-flight
//! command buffer still references it. This replaces blocking full-queue
//! idle waits on every destruction with one deferred sweep per frame.

use crate::gpu::backend::{BufferId, FramebufferId, RenderBackend, TextureId};

/// A device resource awaiting safe destruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetiredResource {
    /// A device buffer to destroy.
    Buffer(BufferId),
    /// A texture reference to release.
    Texture(TextureId),
    /// A framebuffer to destroy.
    Framebuffer(FramebufferId),
}

/// FIFO of `(fence, resource)` pairs.
pub struct RetireQueue {
    pending: Vec<(u64, RetiredResource)>,
}

impl RetireQueue {
    /// Empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Queue `resource` for destruction once `fence` has completed.
    pub fn push(&mut self, fence: u64, resource: RetiredResource) {
        self.pending.push((fence, resource));
    }

    /// Destroy every queued resource whose fence the GPU has completed.
    ///
    /// Returns the number of resources freed.
    pub fn drain_completed(
        &mut self,
        backend: &mut dyn RenderBackend,
    ) -> usize {
        let completed = backend.completed_frame();
        let mut freed = 0;
        self.pending.retain(|&(fence, resource)| {
            if fence <= completed {
                destroy(backend, resource);
                freed += 1;
                false
            } else {
                true
            }
        });
        freed
    }

    /// Destroy everything regardless of fences.
    ///
    /// Only valid after a blocking [`RenderBackend::wait_idle`]; used at
    /// renderer shutdown.
    pub fn drain_all(&mut self, backend: &mut dyn RenderBackend) {
        for (_, resource) in self.pending.drain(..) {
            destroy(backend, resource);
        }
    }

    /// Number of resources still awaiting their fence.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Default for RetireQueue {
    fn default() -> Self {
        Self::new()
    }
}

fn destroy(backend: &mut dyn RenderBackend, resource: RetiredResource) {
    match resource {
        RetiredResource::Buffer(buffer) => backend.destroy_buffer(buffer),
        RetiredResource::Texture(texture) => {
            backend.release_texture(texture);
        }
        RetiredResource::Framebuffer(framebuffer) => {
            backend.destroy_framebuffer(framebuffer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::testing::MockBackend;
    use crate::gpu::{BufferUsage, MemoryClass};

    #[test]
    fn nothing_freed_before_the_fence() {
        let mut backend = MockBackend::new();
        let buffer = backend
            .create_buffer("b", 64, BufferUsage::Storage, MemoryClass::DeviceLocal)
            .unwrap();
        let mut queue = RetireQueue::new();
        queue.push(3, RetiredResource::Buffer(buffer));

        backend.set_completed_frame(2);
        assert_eq!(queue.drain_completed(&mut backend), 0);
        assert!(backend.buffer_alive(buffer));

        backend.set_completed_frame(3);
        assert_eq!(queue.drain_completed(&mut backend), 1);
        assert!(!backend.buffer_alive(buffer));
        assert!(queue.is_empty());
    }

    #[test]
    fn drain_all_ignores_fences() {
        let mut backend = MockBackend::new();
        let buffer = backend
            .create_buffer("b", 64, BufferUsage::Storage, MemoryClass::DeviceLocal)
            .unwrap();
        let mut queue = RetireQueue::new();
        queue.push(100, RetiredResource::Buffer(buffer));
        queue.drain_all(&mut backend);
        assert!(!backend.buffer_alive(buffer));
        assert!(queue.is_empty());
    }
}
