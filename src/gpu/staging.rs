//! Host-writable staging buffers paired with device-local targets.
//!
//! Every GPU-visible aggregate follows the same protocol: mutate the
//! host-side array, set `dirty`, and once per frame — if dirty — write the
//! whole array into the staging buffer and queue a staging→target copy.
//! Whole-array rewrite is the chosen policy: simpler and correct by
//! construction, at the accepted cost of a full copy for single-element
//! changes.

use crate::gpu::backend::{
    BackendError, BufferId, BufferUsage, CopyRegion, MemoryClass,
    RenderBackend,
};
use crate::gpu::retire::{RetireQueue, RetiredResource};

const MIN_CAPACITY: u64 = 64;

/// A host-visible staging buffer and its device-local target.
///
/// Invariant: the target's content is a strict copy of the staging content
/// as of the last frame in which `dirty` was observed true by
/// [`StagingBufferPair::flush`].
pub struct StagingBufferPair {
    label: String,
    staging: BufferId,
    target: BufferId,
    capacity: u64,
    len: u64,
    usage: BufferUsage,
    dirty: bool,
}

impl StagingBufferPair {
    /// Create both buffers with the given initial byte capacity.
    ///
    /// # Errors
    ///
    /// Propagates buffer-creation failure; pairs back foundational arrays,
    /// so callers treat this as fatal.
    pub fn new(
        backend: &mut dyn RenderBackend,
        label: &str,
        initial_capacity: u64,
        usage: BufferUsage,
    ) -> Result<Self, BackendError> {
        let capacity = initial_capacity.max(MIN_CAPACITY);
        let staging = backend.create_buffer(
            &format!("{label}-staging"),
            capacity,
            usage,
            MemoryClass::HostVisible,
        )?;
        let target = backend.create_buffer(
            label,
            capacity,
            usage,
            MemoryClass::DeviceLocal,
        )?;
        Ok(Self {
            label: label.to_owned(),
            staging,
            target,
            capacity,
            len: 0,
            usage,
            dirty: false,
        })
    }

    /// Write the full array into the staging buffer and mark the pair
    /// dirty. Growing past capacity recreates both buffers (2x growth) and
    /// retires the old ones; the returned flag reports that reallocation,
    /// which is the caller's signal that descriptor bindings referencing
    /// the target need a rewrite. Content-only writes never need one.
    ///
    /// # Errors
    ///
    /// Propagates buffer-creation failure during growth.
    pub fn write(
        &mut self,
        backend: &mut dyn RenderBackend,
        retire: &mut RetireQueue,
        fence: u64,
        data: &[u8],
    ) -> Result<bool, BackendError> {
        let needed = data.len() as u64;
        let reallocated = if needed > self.capacity {
            let new_capacity = (needed * 2).max(self.capacity + 1024);
            let staging = backend.create_buffer(
                &format!("{}-staging", self.label),
                new_capacity,
                self.usage,
                MemoryClass::HostVisible,
            )?;
            let target = backend.create_buffer(
                &self.label,
                new_capacity,
                self.usage,
                MemoryClass::DeviceLocal,
            )?;
            retire.push(fence, RetiredResource::Buffer(self.staging));
            retire.push(fence, RetiredResource::Buffer(self.target));
            self.staging = staging;
            self.target = target;
            self.capacity = new_capacity;
            true
        } else {
            false
        };

        if !data.is_empty() {
            backend.write_buffer(self.staging, 0, data);
        }
        self.len = needed;
        self.dirty = true;
        Ok(reallocated)
    }

    /// Mark the pair dirty without touching staging content.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Whether staging content differs from the last-flushed target.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Queue the staging→target copy if dirty, clearing the flag.
    ///
    /// Returns whether a copy was queued; a flush with `dirty == false`
    /// performs no copy.
    pub fn flush(&mut self, backend: &mut dyn RenderBackend) -> bool {
        if !self.dirty {
            return false;
        }
        self.dirty = false;
        if self.len == 0 {
            return false;
        }
        backend.queue_copy(
            self.staging,
            self.target,
            &[CopyRegion {
                src_offset: 0,
                dst_offset: 0,
                size: self.len,
            }],
        );
        true
    }

    /// The device-local buffer shaders read.
    #[must_use]
    pub const fn target(&self) -> BufferId {
        self.target
    }

    /// The host-visible staging buffer.
    #[must_use]
    pub const fn staging(&self) -> BufferId {
        self.staging
    }

    /// Bytes written by the last [`Self::write`].
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.len
    }

    /// Whether nothing has been written yet.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Queue both buffers for fence-gated destruction.
    pub fn retire(self, retire: &mut RetireQueue, fence: u64) {
        retire.push(fence, RetiredResource::Buffer(self.staging));
        retire.push(fence, RetiredResource::Buffer(self.target));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::testing::MockBackend;

    fn pair(backend: &mut MockBackend) -> StagingBufferPair {
        StagingBufferPair::new(backend, "test-array", 64, BufferUsage::Storage)
            .unwrap()
    }

    #[test]
    fn flush_copies_exactly_once_per_dirty_cycle() {
        let mut backend = MockBackend::new();
        let mut retire = RetireQueue::new();
        let mut pair = pair(&mut backend);

        // Two writes between flushes still mean one dirty flag, one copy.
        assert!(!pair.write(&mut backend, &mut retire, 0, &[1; 16]).unwrap());
        assert!(!pair.write(&mut backend, &mut retire, 0, &[2; 16]).unwrap());
        assert!(pair.is_dirty());
        assert!(pair.flush(&mut backend));
        assert_eq!(backend.queued_copy_count(), 1);

        // A flush with dirty == false performs no copy.
        assert!(!pair.flush(&mut backend));
        assert_eq!(backend.queued_copy_count(), 1);
    }

    #[test]
    fn target_matches_staging_after_submit() {
        let mut backend = MockBackend::new();
        let mut retire = RetireQueue::new();
        let mut pair = pair(&mut backend);
        let payload = [7_u8; 32];
        let _ = pair.write(&mut backend, &mut retire, 0, &payload).unwrap();
        assert!(pair.flush(&mut backend));
        backend.submit_queued_copies();
        assert_eq!(&backend.buffer_data(pair.target())[..32], &payload[..]);
    }

    #[test]
    fn growth_reallocates_and_retires_old_buffers() {
        let mut backend = MockBackend::new();
        let mut retire = RetireQueue::new();
        let mut pair = pair(&mut backend);
        let old_staging = pair.staging();
        let old_target = pair.target();

        let reallocated =
            pair.write(&mut backend, &mut retire, 5, &[0; 256]).unwrap();
        assert!(reallocated);
        assert_ne!(pair.target(), old_target);
        assert_eq!(retire.len(), 2);

        // Old buffers stay alive until the fence completes.
        assert!(backend.buffer_alive(old_staging));
        backend.set_completed_frame(5);
        let _ = retire.drain_completed(&mut backend);
        assert!(!backend.buffer_alive(old_staging));
        assert!(!backend.buffer_alive(old_target));
    }

    #[test]
    fn write_within_capacity_does_not_reallocate() {
        let mut backend = MockBackend::new();
        let mut retire = RetireQueue::new();
        let mut pair = pair(&mut backend);
        assert!(!pair.write(&mut backend, &mut retire, 0, &[0; 64]).unwrap());
        assert!(retire.is_empty());
    }
}
