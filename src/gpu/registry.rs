//! Dynamic registry deriving compacted GPU array indices for buffers.
//!
//! Maps a random non-zero key to a device buffer; iteration order defines
//! the compacted position of each buffer in the bindless-style array the
//! shaders index. Removing an entry shifts the positions of every entry
//! after it, so positions must never be cached across a mutation — every
//! position handed out is epoch-tagged, and consumers re-derive stale ones
//! instead of silently corrupting the records that embed them.

use std::num::NonZeroU64;

use crate::gpu::backend::BufferId;

/// Opaque registry key. Non-zero by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferKey(NonZeroU64);

/// A buffer's position in the compacted GPU array, tagged with the
/// registry epoch it was derived under.
///
/// The position is only meaningful while [`ShaderBufferRegistry::is_current`]
/// holds; embedding a stale position into a GPU record corrupts rendering
/// without crashing, which is exactly why the tag exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferIndex {
    /// Ordinal position among currently-registered entries.
    pub position: u32,
    /// Registry epoch at derivation time.
    pub epoch: u64,
}

/// Insertion-ordered buffer registry.
pub struct ShaderBufferRegistry {
    entries: Vec<(BufferKey, BufferId)>,
    epoch: u64,
    dirty: bool,
}

impl ShaderBufferRegistry {
    /// Empty registry at epoch 0.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            epoch: 0,
            dirty: false,
        }
    }

    fn generate_key(&self) -> BufferKey {
        loop {
            let raw = rand::random::<u64>();
            let Some(raw) = NonZeroU64::new(raw) else {
                continue;
            };
            let key = BufferKey(raw);
            if !self.entries.iter().any(|&(k, _)| k == key) {
                return key;
            }
        }
    }

    /// Register `buffer` under a fresh random key, appended at the end of
    /// the array order.
    pub fn add(&mut self, buffer: BufferId) -> BufferKey {
        let key = self.generate_key();
        self.entries.push((key, buffer));
        self.epoch += 1;
        self.dirty = true;
        key
    }

    /// Remove the entry for `key`, shifting every later entry's position
    /// down by one. Unknown keys are a logged warning.
    pub fn remove(&mut self, key: BufferKey) -> Option<BufferId> {
        let Some(position) =
            self.entries.iter().position(|&(k, _)| k == key)
        else {
            log::warn!("buffer registry: remove of unknown key {key:?}");
            return None;
        };
        let (_, buffer) = self.entries.remove(position);
        self.epoch += 1;
        self.dirty = true;
        Some(buffer)
    }

    /// Epoch-tagged position of `key` in the current array order.
    #[must_use]
    pub fn index_of(&self, key: BufferKey) -> Option<BufferIndex> {
        self.entries
            .iter()
            .position(|&(k, _)| k == key)
            .map(|position| BufferIndex {
                position: position as u32,
                epoch: self.epoch,
            })
    }

    /// The buffer registered under `key`.
    #[must_use]
    pub fn buffer_of(&self, key: BufferKey) -> Option<BufferId> {
        self.entries
            .iter()
            .find(|&&(k, _)| k == key)
            .map(|&(_, buffer)| buffer)
    }

    /// Whether a previously derived index is still valid.
    #[must_use]
    pub const fn is_current(&self, index: BufferIndex) -> bool {
        index.epoch == self.epoch
    }

    /// Current epoch; bumped by every mutation.
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Registered buffers in array order.
    pub fn iter(&self) -> impl Iterator<Item = (BufferKey, BufferId)> + '_ {
        self.entries.iter().copied()
    }

    /// Number of registered buffers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the registry mutated since the last [`Self::take_dirty`].
    ///
    /// This flag is the hard-to-skip precondition for writing any GPU
    /// record that embeds a position: while it is set, every embedded
    /// position must be re-derived first.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Consume the dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

impl Default for ShaderBufferRegistry {
    fn default() -> Self {
        Self::new()
    }
}
