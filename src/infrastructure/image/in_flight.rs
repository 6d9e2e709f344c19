//! Per-key table of loads already queued or running.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::trace;

use crate::domain::entities::{CacheKey, Ticket};
use crate::presentation::widgets::ConsumerTarget;

/// A target waiting for a load to finish.
#[derive(Debug, Clone)]
pub struct Listener {
    /// Where the image goes.
    pub target: ConsumerTarget,
    /// Request generation claimed on the target.
    pub ticket: Ticket,
    /// Whether the target asked for a crossfade.
    pub crossfade: bool,
}

/// Keys with a load in progress, plus the extra listeners attached to each.
///
/// The listener that started a load travels with its task; only requests
/// that joined later are stored here.
#[derive(Debug, Default)]
pub struct InFlight {
    pending: Mutex<HashMap<CacheKey, Vec<Listener>>>,
}

impl InFlight {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `listener` to a load already in flight for `key`.
    ///
    /// If none is in flight, marks `key` as started and hands the listener
    /// back so the caller can enqueue a task for it.
    pub fn join(&self, key: &CacheKey, listener: Listener) -> Result<(), Listener> {
        let mut pending = self.pending.lock();
        if let Some(listeners) = pending.get_mut(key) {
            listeners.push(listener);
            trace!(key = %key, waiting = listeners.len(), "Joined in-flight load");
            return Ok(());
        }
        pending.insert(key.clone(), Vec::new());
        Err(listener)
    }

    /// Marks `key` finished and returns the listeners that joined it.
    pub fn finish(&self, key: &CacheKey) -> Vec<Listener> {
        self.pending.lock().remove(key).unwrap_or_default()
    }

    /// Forgets `key` after a failed or discarded load, dropping its listeners.
    pub fn release(&self, key: &CacheKey) -> usize {
        self.pending.lock().remove(key).map_or(0, |listeners| listeners.len())
    }

    /// Returns true if a load for `key` is in flight.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.pending.lock().contains_key(key)
    }

    /// Number of keys in flight.
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Returns true if nothing is in flight.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::widgets::ImageView;
    use std::sync::Arc;

    fn listener() -> Listener {
        let target = ConsumerTarget::from(Arc::new(ImageView::new()));
        let ticket = target.claim();
        Listener {
            target,
            ticket,
            crossfade: false,
        }
    }

    #[test]
    fn test_first_join_starts_second_attaches() {
        let table = InFlight::new();
        let key = CacheKey::new("a", 64);

        assert!(table.join(&key, listener()).is_err());
        assert!(table.contains(&key));
        assert!(table.join(&key, listener()).is_ok());
        assert!(table.join(&key, listener()).is_ok());

        assert_eq!(table.finish(&key).len(), 2);
        assert!(table.is_empty());
    }

    #[test]
    fn test_release_drops_listeners() {
        let table = InFlight::new();
        let key = CacheKey::new("a", 64);
        let _ = table.join(&key, listener());
        let _ = table.join(&key, listener());

        assert_eq!(table.release(&key), 1);
        assert!(!table.contains(&key));
        assert!(table.join(&key, listener()).is_err());
    }

    #[test]
    fn test_keys_are_independent() {
        let table = InFlight::new();
        assert!(table.join(&CacheKey::new("a", 64), listener()).is_err());
        assert!(table.join(&CacheKey::new("a", 480), listener()).is_err());
        assert_eq!(table.len(), 2);
    }
}
