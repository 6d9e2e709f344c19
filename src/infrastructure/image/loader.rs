//! Artwork loading facade.
//!
//! Answers from the memory cache when it can, otherwise shows a placeholder
//! and queues a task for the worker pool. Results come back through the
//! [`CompletionReceiver`] returned by [`ImageLoader::start`].

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::dispatcher::{CompletionReceiver, Dispatcher, deliver};
use super::in_flight::{InFlight, Listener};
use super::memory_cache::{ArtworkCache, CacheStats, DEFAULT_CACHE_SIZE};
use super::placeholder::{DisplayMetrics, PlaceholderAssets, Placeholders};
use super::request_queue::{DEFAULT_QUEUE_CAPACITY, RequestQueue};
use super::stats::{LoaderStats, StatsSnapshot};
use super::task::{LoadTask, TaskExecutor};
use super::worker_pool::{DEFAULT_WORKER_COUNT, WorkerPool};
use crate::domain::entities::{ArtworkSize, CacheKey};
use crate::domain::errors::LoaderError;
use crate::domain::ports::ArtworkSource;
use crate::presentation::widgets::{ConsumerTarget, MetadataTarget};

/// Configuration for the artwork loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Number of pool workers.
    pub worker_count: usize,
    /// Maximum queued tasks before new ones are dropped.
    pub queue_capacity: usize,
    /// Maximum renditions held in memory.
    pub cache_capacity: usize,
    /// Crossfade length in milliseconds.
    pub crossfade_ms: u64,
    /// Large artwork edge as a fraction of the shorter screen side.
    pub large_fraction: f64,
    /// Share one load between concurrent requests for the same key.
    pub dedup_in_flight: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            cache_capacity: DEFAULT_CACHE_SIZE,
            crossfade_ms: 250,
            large_fraction: 0.6,
            dedup_in_flight: true,
        }
    }
}

impl LoaderConfig {
    /// Checks every field is usable.
    ///
    /// # Errors
    /// Returns `LoaderError::InvalidConfig` naming the first bad field.
    pub fn validate(&self) -> Result<(), LoaderError> {
        if self.worker_count == 0 {
            return Err(LoaderError::invalid_config("worker_count must be at least 1"));
        }
        if self.queue_capacity == 0 {
            return Err(LoaderError::invalid_config("queue_capacity must be at least 1"));
        }
        if self.cache_capacity == 0 {
            return Err(LoaderError::invalid_config("cache_capacity must be at least 1"));
        }
        if !(self.large_fraction > 0.0 && self.large_fraction <= 1.0) {
            return Err(LoaderError::invalid_config(format!(
                "large_fraction must be in (0, 1], got {}",
                self.large_fraction
            )));
        }
        Ok(())
    }

    /// Crossfade length.
    #[must_use]
    pub const fn crossfade(&self) -> Duration {
        Duration::from_millis(self.crossfade_ms)
    }
}

/// Asynchronous artwork loader with a bounded queue and worker pool.
///
/// Request methods never block; call them from the thread that drains the
/// [`CompletionReceiver`].
pub struct ImageLoader {
    config: LoaderConfig,
    cache: Arc<ArtworkCache>,
    queue: Arc<RequestQueue<LoadTask>>,
    in_flight: Arc<InFlight>,
    placeholders: Placeholders,
    stats: Arc<LoaderStats>,
    pool: Option<WorkerPool>,
}

impl std::fmt::Debug for ImageLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageLoader")
            .field("config", &self.config)
            .field("placeholders", &self.placeholders)
            .finish_non_exhaustive()
    }
}

impl ImageLoader {
    /// Builds the loader and spawns its workers on the current tokio runtime.
    ///
    /// # Errors
    /// Returns error if the configuration is invalid, a placeholder asset is
    /// unusable, or no runtime is running.
    pub fn start(
        config: LoaderConfig,
        source: Arc<dyn ArtworkSource>,
        display: DisplayMetrics,
        assets: PlaceholderAssets,
    ) -> Result<(Self, CompletionReceiver), LoaderError> {
        config.validate()?;

        let placeholders = Placeholders::prepare(display, assets, config.large_fraction)?;
        let cache = Arc::new(ArtworkCache::new(config.cache_capacity));
        let queue = Arc::new(RequestQueue::new(config.queue_capacity));
        let in_flight = Arc::new(InFlight::new());
        let stats = Arc::new(LoaderStats::default());
        let (dispatcher, receiver) = Dispatcher::channel();

        let executor = Arc::new(TaskExecutor::new(
            cache.clone(),
            source,
            dispatcher,
            in_flight.clone(),
            stats.clone(),
            config.crossfade(),
        ));
        let pool = WorkerPool::spawn(config.worker_count, queue.clone(), executor)?;

        info!(
            workers = config.worker_count,
            queue_capacity = config.queue_capacity,
            cache_capacity = config.cache_capacity,
            "Artwork loader started"
        );

        Ok((
            Self {
                config,
                cache,
                queue,
                in_flight,
                placeholders,
                stats,
                pool: Some(pool),
            },
            receiver,
        ))
    }

    /// Loads artwork into an image or label target.
    ///
    /// `None` or an empty id shows the placeholder and queues nothing. A
    /// cache hit is applied before returning; a miss shows the placeholder
    /// and delivers the real image later. Large requests are reflected and
    /// persisted by the source. A metadata target is loaded as by
    /// [`Self::load_metadata`].
    pub fn load_image(
        &self,
        target: &ConsumerTarget,
        content_id: Option<&str>,
        large: bool,
        crossfade: bool,
    ) {
        if let ConsumerTarget::Metadata(metadata) = target {
            self.load_metadata(metadata, content_id);
            return;
        }
        let size = ArtworkSize::from_large(large);
        self.request(target, content_id, size, size, large, crossfade);
    }

    /// Loads default-size artwork into an external metadata surface.
    ///
    /// Unknown artwork and misses show the large placeholder.
    pub fn load_metadata(&self, target: &Arc<MetadataTarget>, content_id: Option<&str>) {
        let target = ConsumerTarget::Metadata(target.clone());
        self.request(
            &target,
            content_id,
            ArtworkSize::Default,
            ArtworkSize::Large,
            false,
            false,
        );
    }

    fn request(
        &self,
        target: &ConsumerTarget,
        content_id: Option<&str>,
        size: ArtworkSize,
        placeholder: ArtworkSize,
        large: bool,
        crossfade: bool,
    ) {
        let ticket = target.claim();
        let placeholder = self.placeholders.image_for(placeholder);

        let Some(content_id) = content_id.filter(|id| !id.is_empty()) else {
            deliver(target, &placeholder, ticket, None);
            return;
        };

        let key = CacheKey::new(content_id, self.placeholders.size_for(size));
        let transition = crossfade.then_some(self.config.crossfade());

        if let Some(image) = self.cache.get(&key) {
            LoaderStats::bump(&self.stats.immediate_hits);
            deliver(target, &image, ticket, transition);
            return;
        }

        deliver(target, &placeholder, ticket, None);

        let listener = Listener {
            target: target.clone(),
            ticket,
            crossfade,
        };
        let listener = if self.config.dedup_in_flight {
            match self.in_flight.join(&key, listener) {
                Ok(()) => {
                    LoaderStats::bump(&self.stats.deduplicated);
                    return;
                }
                Err(listener) => listener,
            }
        } else {
            listener
        };

        let task = LoadTask::new(key.clone(), large, large, listener);
        if self.queue.offer(task) {
            LoaderStats::bump(&self.stats.accepted);
            debug!(key = %key, target = target.kind(), "Queued artwork load");
        } else {
            LoaderStats::bump(&self.stats.dropped);
            if self.config.dedup_in_flight {
                self.in_flight.release(&key);
            }
            warn!(key = %key, capacity = self.queue.capacity(), "Artwork queue full, request dropped");
        }
    }

    /// Discards every queued task no worker has started.
    /// Tasks already running finish and still deliver.
    pub fn clear_pending(&self) -> usize {
        let discarded = self.queue.clear_pending();
        self.forget(&discarded);
        LoaderStats::add(&self.stats.discarded, discarded.len());
        if !discarded.is_empty() {
            debug!(count = discarded.len(), "Discarded pending artwork loads");
        }
        discarded.len()
    }

    fn forget(&self, tasks: &[LoadTask]) {
        if self.config.dedup_in_flight {
            for task in tasks {
                self.in_flight.release(task.key());
            }
        }
    }

    /// Stops accepting work, discards queued tasks and waits for running
    /// tasks and every worker to finish.
    pub async fn shutdown(mut self) {
        let discarded = self.queue.close();
        self.forget(&discarded);
        LoaderStats::add(&self.stats.discarded, discarded.len());
        if let Some(pool) = self.pool.take() {
            pool.join().await;
        }
        info!(stats = %self.stats.snapshot(), "Artwork loader shut down");
    }

    /// The shared memory cache.
    #[must_use]
    pub fn cache(&self) -> &ArtworkCache {
        &self.cache
    }

    /// Returns memory cache statistics.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Returns loader counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// The placeholders and request sizes in use.
    #[must_use]
    pub const fn placeholders(&self) -> &Placeholders {
        &self.placeholders
    }

    /// Number of tasks waiting for a worker.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &LoaderConfig {
        &self.config
    }
}

impl Drop for ImageLoader {
    fn drop(&mut self) {
        if self.pool.is_some() {
            self.queue.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::sync::Semaphore;

    use crate::domain::ports::mocks::{FakeArtworkSource, RecordingMetadataSink};
    use crate::presentation::widgets::{ImageView, LabelView};

    const DISPLAY: DisplayMetrics = DisplayMetrics::new(400, 800);

    fn config(workers: usize, queue: usize) -> LoaderConfig {
        LoaderConfig {
            worker_count: workers,
            queue_capacity: queue,
            large_fraction: 0.5,
            ..LoaderConfig::default()
        }
    }

    fn start(
        config: LoaderConfig,
        source: Arc<FakeArtworkSource>,
    ) -> (ImageLoader, CompletionReceiver) {
        ImageLoader::start(config, source, DISPLAY, PlaceholderAssets::builtin()).unwrap()
    }

    fn image_target() -> (Arc<ImageView>, ConsumerTarget) {
        let view = Arc::new(ImageView::new());
        (view.clone(), ConsumerTarget::from(view))
    }

    async fn settle(receiver: &mut CompletionReceiver, expected: usize) {
        let mut applied = 0;
        while applied < expected {
            match tokio::time::timeout(Duration::from_secs(5), receiver.apply_next()).await {
                Ok(Some(true)) => applied += 1,
                Ok(Some(false)) => {}
                Ok(None) | Err(_) => panic!("expected {expected} deliveries, got {applied}"),
            }
        }
    }

    #[test]
    fn test_default_config_matches_documented_values() {
        let config = LoaderConfig::default();
        assert_eq!(config.worker_count, 5);
        assert_eq!(config.queue_capacity, 500);
        assert_eq!(config.cache_capacity, 100);
        assert_eq!(config.crossfade(), Duration::from_millis(250));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let zero_workers = LoaderConfig {
            worker_count: 0,
            ..LoaderConfig::default()
        };
        assert!(zero_workers.validate().is_err());

        let bad_fraction = LoaderConfig {
            large_fraction: 1.5,
            ..LoaderConfig::default()
        };
        assert!(bad_fraction.validate().is_err());
    }

    #[tokio::test]
    async fn test_miss_shows_placeholder_then_real_image() {
        let source = Arc::new(FakeArtworkSource::new());
        let (loader, mut receiver) = start(config(2, 16), source.clone());
        let (view, target) = image_target();

        loader.load_image(&target, Some("A"), false, true);
        let shown = view.image().unwrap();
        assert!(loader.placeholders().is_placeholder(&shown));

        settle(&mut receiver, 1).await;
        let real = view.image().unwrap();
        assert!(!loader.placeholders().is_placeholder(&real));
        assert_eq!(
            view.transition().unwrap().duration(),
            Duration::from_millis(250)
        );
        assert_eq!(
            source.calls(),
            vec![("A".to_string(), loader.placeholders().size_for(ArtworkSize::Default), false)]
        );

        loader.shutdown().await;
    }

    #[tokio::test]
    async fn test_cache_hit_applies_synchronously() {
        let source = Arc::new(FakeArtworkSource::new());
        let (loader, mut receiver) = start(config(1, 16), source.clone());
        let (first, first_target) = image_target();

        loader.load_image(&first_target, Some("A"), false, false);
        settle(&mut receiver, 1).await;
        let loaded = first.image().unwrap();

        let (second, second_target) = image_target();
        loader.load_image(&second_target, Some("A"), false, false);
        assert!(Arc::ptr_eq(&second.image().unwrap(), &loaded));
        assert_eq!(source.call_count("A"), 1);
        assert_eq!(loader.stats().immediate_hits, 1);

        loader.shutdown().await;
    }

    #[tokio::test]
    async fn test_unknown_artwork_uses_placeholder_without_queueing() {
        let source = Arc::new(FakeArtworkSource::new());
        let (loader, _receiver) = start(config(1, 16), source.clone());
        let (view, target) = image_target();
        let label = Arc::new(LabelView::new("Untitled"));

        loader.load_image(&target, None, true, false);
        loader.load_image(&ConsumerTarget::from(label.clone()), Some(""), false, false);

        let large = loader.placeholders().image_for(ArtworkSize::Large);
        assert!(Arc::ptr_eq(&view.image().unwrap(), &large));
        let small = loader.placeholders().image_for(ArtworkSize::Default);
        assert!(Arc::ptr_eq(&label.icon().unwrap(), &small));
        assert_eq!(loader.stats().accepted, 0);
        assert!(source.calls().is_empty());

        loader.shutdown().await;
    }

    #[tokio::test]
    async fn test_large_request_reflects_and_persists() {
        let source = Arc::new(FakeArtworkSource::new());
        let (loader, mut receiver) = start(config(1, 16), source.clone());
        let (view, target) = image_target();

        loader.load_image(&target, Some("cover"), true, false);
        settle(&mut receiver, 1).await;

        // 400x800 display at 0.5 gives 200px large artwork
        assert_eq!(source.calls(), vec![("cover".to_string(), 200, true)]);
        let image = view.image().unwrap();
        assert_eq!((image.width(), image.height()), (200, 304));

        loader.shutdown().await;
    }

    #[tokio::test]
    async fn test_metadata_target_gets_default_size_copy() {
        let source = Arc::new(FakeArtworkSource::new());
        let (loader, mut receiver) = start(config(1, 16), source.clone());
        let sink = Arc::new(RecordingMetadataSink::default());
        let target = Arc::new(MetadataTarget::new(sink.clone()));

        loader.load_metadata(&target, Some("track"));
        // miss shows the large placeholder first
        assert_eq!(sink.published().len(), 1);

        settle(&mut receiver, 1).await;
        let published = sink.published();
        assert_eq!(published.len(), 2);
        let size = loader.placeholders().size_for(ArtworkSize::Default);
        assert_eq!(published[1].width(), size);
        assert_eq!(source.calls(), vec![("track".to_string(), size, false)]);

        loader.shutdown().await;
    }

    #[tokio::test]
    async fn test_duplicate_requests_share_one_fetch() {
        let gate = Arc::new(Semaphore::new(0));
        let source = Arc::new(FakeArtworkSource::new().gated(gate.clone()));
        let (loader, mut receiver) = start(config(2, 16), source.clone());
        let (first, first_target) = image_target();
        let (second, second_target) = image_target();

        loader.load_image(&first_target, Some("A"), false, false);
        loader.load_image(&second_target, Some("A"), false, false);
        gate.add_permits(4);
        settle(&mut receiver, 2).await;

        assert!(!loader.placeholders().is_placeholder(&first.image().unwrap()));
        assert!(!loader.placeholders().is_placeholder(&second.image().unwrap()));
        assert_eq!(source.call_count("A"), 1);
        assert_eq!(loader.stats().deduplicated, 1);

        loader.shutdown().await;
    }

    #[tokio::test]
    async fn test_duplicate_requests_without_dedup_both_resolve() {
        let gate = Arc::new(Semaphore::new(0));
        let source = Arc::new(FakeArtworkSource::new().gated(gate.clone()));
        let config = LoaderConfig {
            dedup_in_flight: false,
            ..config(2, 16)
        };
        let (loader, mut receiver) = start(config, source.clone());
        let (first, first_target) = image_target();
        let (second, second_target) = image_target();

        loader.load_image(&first_target, Some("A"), false, false);
        loader.load_image(&second_target, Some("A"), false, false);
        gate.add_permits(4);
        settle(&mut receiver, 2).await;

        assert!(!loader.placeholders().is_placeholder(&first.image().unwrap()));
        assert!(!loader.placeholders().is_placeholder(&second.image().unwrap()));
        assert!(source.call_count("A") >= 1);

        loader.shutdown().await;
    }

    #[tokio::test]
    async fn test_saturated_queue_drops_without_blocking() {
        let gate = Arc::new(Semaphore::new(0));
        let source = Arc::new(FakeArtworkSource::new().gated(gate.clone()));
        let (loader, _receiver) = start(config(1, 2), source.clone());

        let (_busy, busy_target) = image_target();
        loader.load_image(&busy_target, Some("busy"), false, false);
        source.wait_started(1).await;

        let targets: Vec<_> = (0..2).map(|_| image_target()).collect();
        for (i, (_, target)) in targets.iter().enumerate() {
            loader.load_image(target, Some(&format!("queued-{i}")), false, false);
        }
        assert_eq!(loader.pending_count(), 2);

        let (dropped, dropped_target) = image_target();
        loader.load_image(&dropped_target, Some("overflow"), false, false);

        assert_eq!(loader.stats().dropped, 1);
        assert!(loader.placeholders().is_placeholder(&dropped.image().unwrap()));

        gate.add_permits(8);
        loader.shutdown().await;
    }

    #[tokio::test]
    async fn test_clear_pending_discards_queued_but_not_running() {
        let gate = Arc::new(Semaphore::new(0));
        let source = Arc::new(FakeArtworkSource::new().gated(gate.clone()));
        let (loader, mut receiver) = start(config(2, 16), source.clone());

        let targets: Vec<_> = (0..5).map(|_| image_target()).collect();
        for (i, (_, target)) in targets.iter().enumerate() {
            loader.load_image(target, Some(&format!("track-{i}")), false, false);
        }
        source.wait_started(2).await;

        assert_eq!(loader.clear_pending(), 3);
        gate.add_permits(2);
        settle(&mut receiver, 2).await;

        assert_eq!(source.calls().len(), 2);
        let real = targets
            .iter()
            .filter(|(view, _)| !loader.placeholders().is_placeholder(&view.image().unwrap()))
            .count();
        assert_eq!(real, 2);
        assert_eq!(loader.stats().discarded, 3);

        loader.shutdown().await;
    }

    #[tokio::test]
    async fn test_newer_request_wins_over_late_result() {
        let source = Arc::new(FakeArtworkSource::new());
        let (loader, mut receiver) = start(config(1, 16), source.clone());
        let (view, target) = image_target();

        loader.load_image(&target, Some("old"), false, false);
        loader.load_image(&target, None, false, false);

        tokio::time::timeout(Duration::from_secs(5), receiver.apply_next())
            .await
            .unwrap();
        assert!(loader.placeholders().is_placeholder(&view.image().unwrap()));

        loader.shutdown().await;
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_placeholder() {
        let source = Arc::new(FakeArtworkSource::new().failing_on("gone"));
        let (loader, mut receiver) = start(config(1, 16), source.clone());
        let (view, target) = image_target();

        loader.load_image(&target, Some("gone"), false, true);
        let (_, other) = image_target();
        loader.load_image(&other, Some("fine"), false, false);
        settle(&mut receiver, 1).await;

        assert!(loader.placeholders().is_placeholder(&view.image().unwrap()));
        assert_eq!(loader.stats().failed, 1);

        loader.shutdown().await;
    }

    #[tokio::test]
    async fn test_concurrent_distinct_loads_all_cached() {
        let source = Arc::new(FakeArtworkSource::new().with_delay(Duration::from_millis(2)));
        let (loader, mut receiver) = start(config(5, 64), source.clone());

        let targets: Vec<_> = (0..40).map(|_| image_target()).collect();
        for (i, (_, target)) in targets.iter().enumerate() {
            loader.load_image(target, Some(&format!("album-{i}")), false, false);
        }
        settle(&mut receiver, 40).await;

        let size = loader.placeholders().size_for(ArtworkSize::Default);
        for i in 0..40 {
            assert!(loader.cache().contains(&CacheKey::new(format!("album-{i}"), size)));
        }
        assert_eq!(loader.cache().len(), 40);

        loader.shutdown().await;
    }
}
