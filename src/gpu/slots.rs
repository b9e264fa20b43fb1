//! Fixed-capacity allocator for shader-visible array positions.
//!
//! GPU-visible arrays (the viewport array, the per-type light arrays) are
//! small fixed-capacity arrays where *position*, not token, is the
//! shader-visible index. The token exists so callers hold an opaque,
//! reuse-safe reference distinct from that position.

use std::collections::VecDeque;
use std::num::NonZeroU32;

/// Opaque slot token. Non-zero by construction, so "slot 0 in use" can
/// never be confused with "never allocated".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotToken(NonZeroU32);

/// Free-list allocator handing out stable tokens for a fixed-capacity
/// shader-visible array.
///
/// The used list keeps insertion order: freeing a token shifts every later
/// token's array position down by one, which is why mutations mark the
/// owning array dirty for a whole rewrite.
pub struct ShaderSlotAllocator {
    label: &'static str,
    free: VecDeque<SlotToken>,
    used: Vec<SlotToken>,
    dirty: bool,
}

impl ShaderSlotAllocator {
    /// Allocator with tokens `1..=capacity` on the free list.
    #[must_use]
    pub fn new(label: &'static str, capacity: u32) -> Self {
        let free = (1..=capacity)
            .filter_map(NonZeroU32::new)
            .map(SlotToken)
            .collect();
        Self {
            label,
            free,
            used: Vec::with_capacity(capacity as usize),
            dirty: false,
        }
    }

    /// Pop the front of the free list and append to the used list.
    ///
    /// Exhaustion is a logged error and `None`, never fatal: callers
    /// handle "no slot available" as a recoverable condition.
    pub fn allocate(&mut self) -> Option<SlotToken> {
        let Some(token) = self.free.pop_front() else {
            log::error!(
                "shader slot allocator '{}' exhausted ({} slots)",
                self.label,
                self.used.len()
            );
            return None;
        };
        self.used.push(token);
        self.dirty = true;
        Some(token)
    }

    /// Remove `token` from the used list and append it to the free list.
    ///
    /// Later entries shift down by one position. An unknown token is a
    /// logged warning and `false`.
    pub fn free(&mut self, token: SlotToken) -> bool {
        let Some(position) = self.used.iter().position(|&t| t == token)
        else {
            log::warn!(
                "shader slot allocator '{}': free of unallocated token {token:?}",
                self.label
            );
            return false;
        };
        let _ = self.used.remove(position);
        self.free.push_back(token);
        self.dirty = true;
        true
    }

    /// Position of `token` in the used list — the shader-visible index.
    #[must_use]
    pub fn position_of(&self, token: SlotToken) -> Option<usize> {
        self.used.iter().position(|&t| t == token)
    }

    /// Tokens in used-list order (array order).
    #[must_use]
    pub fn used(&self) -> &[SlotToken] {
        &self.used
    }

    /// Number of live allocations.
    #[must_use]
    pub fn used_len(&self) -> usize {
        self.used.len()
    }

    /// Number of free slots.
    #[must_use]
    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    /// Total capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.used.len() + self.free.len()
    }

    /// Whether any mutation happened since the last [`Self::take_dirty`].
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Consume the dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
