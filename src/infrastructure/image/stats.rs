//! Loader counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Running counters shared by the facade and the workers.
#[derive(Debug, Default)]
pub struct LoaderStats {
    pub(crate) immediate_hits: AtomicU64,
    pub(crate) accepted: AtomicU64,
    pub(crate) dropped: AtomicU64,
    pub(crate) deduplicated: AtomicU64,
    pub(crate) reused: AtomicU64,
    pub(crate) completed: AtomicU64,
    pub(crate) failed: AtomicU64,
    pub(crate) discarded: AtomicU64,
}

impl LoaderStats {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add(counter: &AtomicU64, amount: usize) {
        counter.fetch_add(amount as u64, Ordering::Relaxed);
    }

    /// Returns a point-in-time copy of every counter.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        StatsSnapshot {
            immediate_hits: load(&self.immediate_hits),
            accepted: load(&self.accepted),
            dropped: load(&self.dropped),
            deduplicated: load(&self.deduplicated),
            reused: load(&self.reused),
            completed: load(&self.completed),
            failed: load(&self.failed),
            discarded: load(&self.discarded),
        }
    }
}

/// Copy of the loader counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Requests answered synchronously from the cache.
    pub immediate_hits: u64,
    /// Tasks accepted by the queue.
    pub accepted: u64,
    /// Tasks dropped because the queue was full or closed.
    pub dropped: u64,
    /// Requests attached to a load already in flight.
    pub deduplicated: u64,
    /// Tasks answered from the cache on the worker's re-check.
    pub reused: u64,
    /// Tasks that produced an image.
    pub completed: u64,
    /// Tasks that failed to fetch or transform.
    pub failed: u64,
    /// Queued tasks discarded before a worker picked them up.
    pub discarded: u64,
}

impl std::fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Loader: {} accepted, {} completed, {} failed, {} dropped, {} discarded, {} hits, {} joined",
            self.accepted,
            self.completed,
            self.failed,
            self.dropped,
            self.discarded,
            self.immediate_hits,
            self.deduplicated
        )
    }
}
