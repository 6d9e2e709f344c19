//! Completion channel from workers to the UI-owning thread.
//!
//! Workers only post [`Delivery`] messages; targets are mutated solely by
//! whoever drains the [`CompletionReceiver`].

use std::sync::Arc;
use std::time::Duration;

use image::DynamicImage;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::domain::entities::{CacheKey, Ticket};
use crate::presentation::widgets::ConsumerTarget;

/// A finished load waiting to be applied on the UI thread.
#[derive(Debug)]
pub struct Delivery {
    key: CacheKey,
    target: ConsumerTarget,
    image: Arc<DynamicImage>,
    ticket: Ticket,
    transition: Option<Duration>,
}

impl Delivery {
    /// Creates a delivery of `image` to `target` for the request `ticket`.
    #[must_use]
    pub fn new(
        key: CacheKey,
        target: ConsumerTarget,
        image: Arc<DynamicImage>,
        ticket: Ticket,
        transition: Option<Duration>,
    ) -> Self {
        Self {
            key,
            target,
            image,
            ticket,
            transition,
        }
    }

    /// Key the image was loaded for.
    #[must_use]
    pub const fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Applies the image unless the target has since been re-requested.
    /// Returns true if the target was updated.
    pub fn apply(self) -> bool {
        let applied = deliver(&self.target, &self.image, self.ticket, self.transition);
        if !applied {
            debug!(key = %self.key, target = self.target.kind(), "Discarded stale delivery");
        }
        applied
    }
}

/// Applies `image` to `target` if `ticket` is still its newest request.
pub(crate) fn deliver(
    target: &ConsumerTarget,
    image: &Arc<DynamicImage>,
    ticket: Ticket,
    transition: Option<Duration>,
) -> bool {
    if !target.is_current(ticket) {
        return false;
    }
    target.apply(image, transition);
    true
}

/// Worker-side handle that posts deliveries without waiting.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<Delivery>,
}

impl Dispatcher {
    /// Creates a dispatcher and the receiver the UI thread drains.
    #[must_use]
    pub fn channel() -> (Self, CompletionReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, CompletionReceiver { rx })
    }

    /// Posts `delivery` for the UI thread. Returns false if the receiver is
    /// gone, in which case the delivery is dropped.
    pub fn post(&self, delivery: Delivery) -> bool {
        match self.tx.send(delivery) {
            Ok(()) => true,
            Err(mpsc::error::SendError(delivery)) => {
                trace!(key = %delivery.key, "UI receiver gone, dropping delivery");
                false
            }
        }
    }
}

/// UI-side end of the completion channel.
#[derive(Debug)]
pub struct CompletionReceiver {
    rx: mpsc::UnboundedReceiver<Delivery>,
}

impl CompletionReceiver {
    /// Applies every delivery that is ready without waiting.
    /// Returns how many targets were updated.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(delivery) = self.rx.try_recv() {
            if delivery.apply() {
                applied += 1;
            }
        }
        applied
    }

    /// Waits for the next delivery and applies it.
    ///
    /// Returns `None` once every dispatcher is dropped, otherwise whether
    /// the target was updated.
    pub async fn apply_next(&mut self) -> Option<bool> {
        self.rx.recv().await.map(Delivery::apply)
    }

    /// Waits for the next delivery without applying it.
    pub async fn recv(&mut self) -> Option<Delivery> {
        self.rx.recv().await
    }
}
