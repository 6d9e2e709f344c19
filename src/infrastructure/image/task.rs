//! Load tasks and their execution: fetch, transform, cache, deliver.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::FutureExt;
use image::DynamicImage;
use tracing::{debug, error, warn};

use super::dispatcher::{Delivery, Dispatcher};
use super::in_flight::{InFlight, Listener};
use super::memory_cache::ArtworkCache;
use super::reflection::reflect;
use super::stats::LoaderStats;
use super::worker_pool::{TaskHandler, panic_message};
use crate::domain::entities::CacheKey;
use crate::domain::errors::{ArtworkError, ArtworkResult};
use crate::domain::ports::ArtworkSource;

/// One pending artwork load. Created on a cache miss and consumed once.
#[derive(Debug)]
pub struct LoadTask {
    key: CacheKey,
    needs_reflection: bool,
    persist_to_storage: bool,
    listener: Listener,
}

impl LoadTask {
    /// Creates a task loading `key` for `listener`.
    #[must_use]
    pub const fn new(
        key: CacheKey,
        needs_reflection: bool,
        persist_to_storage: bool,
        listener: Listener,
    ) -> Self {
        Self {
            key,
            needs_reflection,
            persist_to_storage,
            listener,
        }
    }

    /// Cache key the result is stored under.
    #[must_use]
    pub const fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Whether the result is rendered with a reflection.
    #[must_use]
    pub const fn needs_reflection(&self) -> bool {
        self.needs_reflection
    }

    /// Whether the source should keep a durable copy.
    #[must_use]
    pub const fn persist_to_storage(&self) -> bool {
        self.persist_to_storage
    }

    /// Whether the requesting target asked for a crossfade.
    #[must_use]
    pub const fn crossfade(&self) -> bool {
        self.listener.crossfade
    }
}

/// Runs load tasks on pool workers.
pub struct TaskExecutor {
    cache: Arc<ArtworkCache>,
    source: Arc<dyn ArtworkSource>,
    dispatcher: Dispatcher,
    in_flight: Arc<InFlight>,
    stats: Arc<LoaderStats>,
    crossfade: Duration,
}

impl TaskExecutor {
    /// Creates an executor storing into `cache` and posting to `dispatcher`.
    #[must_use]
    pub fn new(
        cache: Arc<ArtworkCache>,
        source: Arc<dyn ArtworkSource>,
        dispatcher: Dispatcher,
        in_flight: Arc<InFlight>,
        stats: Arc<LoaderStats>,
        crossfade: Duration,
    ) -> Self {
        Self {
            cache,
            source,
            dispatcher,
            in_flight,
            stats,
            crossfade,
        }
    }

    /// Executes `task`. Never fails: errors are logged and the target keeps
    /// whatever it already shows.
    pub async fn execute(&self, task: LoadTask) {
        let outcome = AssertUnwindSafe(self.produce(&task)).catch_unwind().await;
        match outcome {
            Ok(Ok(image)) => {
                LoaderStats::bump(&self.stats.completed);
                let joined = self.in_flight.finish(&task.key);
                self.post(&task.key, &image, task.listener);
                for listener in joined {
                    self.post(&task.key, &image, listener);
                }
            }
            Ok(Err(e)) => {
                LoaderStats::bump(&self.stats.failed);
                let dropped = self.in_flight.release(&task.key);
                warn!(key = %task.key, error = %e, waiting = dropped, "Failed to load artwork");
            }
            Err(panic) => {
                LoaderStats::bump(&self.stats.failed);
                self.in_flight.release(&task.key);
                error!(
                    key = %task.key,
                    panic = panic_message(panic.as_ref()),
                    "Artwork task panicked"
                );
            }
        }
    }

    async fn produce(&self, task: &LoadTask) -> ArtworkResult<Arc<DynamicImage>> {
        if let Some(image) = self.cache.get(&task.key) {
            LoaderStats::bump(&self.stats.reused);
            debug!(key = %task.key, "Artwork cached while queued, skipping fetch");
            return Ok(image);
        }

        let source = self
            .source
            .fetch(
                task.key.content_id(),
                task.key.size(),
                task.persist_to_storage,
            )
            .await?;

        let image = if task.needs_reflection {
            tokio::task::spawn_blocking(move || reflect(&source))
                .await
                .map_err(|e| ArtworkError::transform(format!("Reflection task failed: {e}")))??
        } else {
            source
        };

        let image = Arc::new(image);
        self.cache.put(task.key.clone(), image.clone());
        debug!(key = %task.key, reflected = task.needs_reflection, "Artwork loaded");
        Ok(image)
    }

    fn post(&self, key: &CacheKey, image: &Arc<DynamicImage>, listener: Listener) {
        let transition = listener.crossfade.then_some(self.crossfade);
        self.dispatcher.post(Delivery::new(
            key.clone(),
            listener.target,
            image.clone(),
            listener.ticket,
            transition,
        ));
    }
}

impl std::fmt::Debug for TaskExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskExecutor")
            .field("crossfade", &self.crossfade)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TaskHandler<LoadTask> for TaskExecutor {
    async fn handle(&self, task: LoadTask) {
        self.execute(task).await;
    }
}
