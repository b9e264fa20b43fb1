//! Shader-bucketed per-viewport render lists.
//!
//! Each viewport owns one list mapping shader handle → ordered draw
//! entries, rebuilt every frame unless visibility is locked. The draw slot
//! is a monotonically increasing index across the whole list, used to
//! locate a draw's resolved per-draw data.

use rustc_hash::FxHashMap;

use crate::arena::Handle;
use crate::scene::renderable::Renderable;
use crate::scene::shader::Shader;

/// One `(renderable, surface)` draw in a shader bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawEntry {
    /// The drawable instance.
    pub renderable: Handle<Renderable>,
    /// Surface index within the renderable's model.
    pub surface: u32,
    /// Position of the renderable's record in the GPU renderable array.
    pub record_index: u32,
    /// Monotonic index across the viewport's list.
    pub draw_slot: u32,
}

/// Mapping shader handle → ordered draw entries for one viewport.
#[derive(Debug, Default)]
pub struct ViewRenderList {
    buckets: FxHashMap<Handle<Shader>, Vec<DrawEntry>>,
    next_draw_slot: u32,
}

impl ViewRenderList {
    /// Empty list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: FxHashMap::default(),
            next_draw_slot: 0,
        }
    }

    /// Drop all buckets and reset the draw-slot counter.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.next_draw_slot = 0;
    }

    /// Append a draw to `shader`'s bucket, assigning the next draw slot.
    pub fn push(
        &mut self,
        shader: Handle<Shader>,
        renderable: Handle<Renderable>,
        surface: u32,
        record_index: u32,
    ) {
        let draw_slot = self.next_draw_slot;
        self.next_draw_slot += 1;
        self.buckets.entry(shader).or_default().push(DrawEntry {
            renderable,
            surface,
            record_index,
            draw_slot,
        });
    }

    /// The bucket for `shader`, if any draw landed in it.
    #[must_use]
    pub fn bucket(&self, shader: Handle<Shader>) -> Option<&[DrawEntry]> {
        self.buckets.get(&shader).map(Vec::as_slice)
    }

    /// Iterate all buckets.
    pub fn buckets(
        &self,
    ) -> impl Iterator<Item = (Handle<Shader>, &[DrawEntry])> {
        self.buckets
            .iter()
            .map(|(&shader, entries)| (shader, entries.as_slice()))
    }

    /// Number of non-empty buckets.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Total draws across all buckets.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Whether no draws were pushed since the last clear.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
