//! Item-to-segment placement.
//!
//! Placement is `item mod N`: no hash ring, so changing the segment count
//! invalidates every placement that has not yet been flushed.

use std::num::NonZeroUsize;

use crate::triple::ItemId;

/// Owning segment of `item` for a fixed segment count.
pub fn segment_for(item: ItemId, segment_count: NonZeroUsize) -> usize {
    (item % segment_count.get() as u64) as usize
}

/// Placement function bound to one session's segment count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Router {
    segment_count: NonZeroUsize,
}

impl Router {
    /// Returns `None` when there are no segments to route to.
    pub fn new(segment_count: usize) -> Option<Self> {
        NonZeroUsize::new(segment_count).map(|segment_count| Self { segment_count })
    }

    pub fn segment_count(&self) -> usize {
        self.segment_count.get()
    }

    pub fn route(&self, item: ItemId) -> usize {
        segment_for(item, self.segment_count)
    }
}
