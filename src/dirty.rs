//! Tracks whether the in-memory state has diverged from the last persisted copy.

use std::sync::atomic::{AtomicU64, Ordering};

/// Modification epochs, independent of every shard lock.
///
/// `modified` counts mutations. `persisted` is the highest `modified` value
/// known to be reflected on disk (or loaded from it). The map is dirty while
/// the two differ.
#[derive(Debug, Default)]
pub(crate) struct DirtyTracker {
    modified: AtomicU64,
    persisted: AtomicU64,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a committed mutation.
    #[inline]
    pub fn mark_dirty(&self) {
        self.modified.fetch_add(1, Ordering::AcqRel);
    }

    /// Current modification epoch, to be passed back to [`mark_clean`](Self::mark_clean).
    #[inline]
    pub fn epoch(&self) -> u64 {
        self.modified.load(Ordering::Acquire)
    }

    /// Mark every mutation up to `epoch` as persisted. Later mutations keep the
    /// map dirty.
    #[inline]
    pub fn mark_clean(&self, epoch: u64) {
        self.persisted.fetch_max(epoch, Ordering::AcqRel);
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.modified.load(Ordering::Acquire) > self.persisted.load(Ordering::Acquire)
    }
}
