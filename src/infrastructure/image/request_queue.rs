//! Bounded FIFO of pending artwork loads.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, trace};

/// Default maximum number of queued tasks.
pub const DEFAULT_QUEUE_CAPACITY: usize = 500;

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Bounded multi-producer, multi-consumer FIFO.
///
/// Producers never wait: at capacity `offer` drops the item. Consumers park
/// in `take` until an item arrives or the queue is closed.
pub struct RequestQueue<T> {
    state: Mutex<QueueState<T>>,
    capacity: usize,
    available: Notify,
}

impl<T> RequestQueue<T> {
    /// Creates a queue holding at most `capacity` items.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity.min(64)),
                closed: false,
            }),
            capacity: capacity.max(1),
            available: Notify::new(),
        }
    }

    /// Enqueues `item` without blocking.
    ///
    /// Returns false, dropping the item, when the queue is full or closed.
    pub fn offer(&self, item: T) -> bool {
        {
            let mut state = self.state.lock();
            if state.closed {
                trace!("Queue closed, dropping item");
                return false;
            }
            if state.items.len() >= self.capacity {
                debug!(capacity = self.capacity, "Queue full, dropping item");
                return false;
            }
            state.items.push_back(item);
        }
        self.available.notify_one();
        true
    }

    /// Dequeues the oldest item, waiting until one is available.
    ///
    /// Returns `None` once the queue is closed; items still queued at close
    /// are discarded, not handed out.
    pub async fn take(&self) -> Option<T> {
        loop {
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state.lock();
                if state.closed {
                    return None;
                }
                if let Some(item) = state.items.pop_front() {
                    return Some(item);
                }
            }

            notified.await;
        }
    }

    /// Dequeues the oldest item if one is ready.
    pub fn try_take(&self) -> Option<T> {
        let mut state = self.state.lock();
        if state.closed {
            return None;
        }
        state.items.pop_front()
    }

    /// Discards every item not yet taken and returns them.
    /// Items already handed to a consumer are unaffected.
    pub fn clear_pending(&self) -> Vec<T> {
        let drained: Vec<T> = self.state.lock().items.drain(..).collect();
        if !drained.is_empty() {
            debug!(count = drained.len(), "Cleared pending queue items");
        }
        drained
    }

    /// Closes the queue, discarding pending items and waking every consumer.
    pub fn close(&self) -> Vec<T> {
        let drained: Vec<T> = {
            let mut state = self.state.lock();
            state.closed = true;
            state.items.drain(..).collect()
        };
        self.available.notify_waiters();
        drained
    }

    /// Returns true once `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Returns the number of queued items.
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the fixed capacity.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> std::fmt::Debug for RequestQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}
