//! Request generations used to discard stale deliveries.

use std::sync::atomic::{AtomicU64, Ordering};

/// Generation stamp claimed by one load request on its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl Ticket {
    /// Returns the raw generation number.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// Monotonic generation counter carried by every consumer target.
///
/// Each request claims the next generation; a result is applied only while
/// its ticket is still the newest one claimed on the target.
#[derive(Debug, Default)]
pub struct Generation(AtomicU64);

impl Generation {
    /// Creates a counter with no claims.
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Claims the next generation, superseding every earlier ticket.
    pub fn claim(&self) -> Ticket {
        Ticket(self.0.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Returns true if `ticket` is the newest claim.
    #[must_use]
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.0.load(Ordering::Acquire) == ticket.0
    }
}
