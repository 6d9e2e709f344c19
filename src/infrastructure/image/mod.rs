//! Artwork loading pipeline.
//!
//! This module provides:
//! - Memory caching with LRU eviction
//! - A bounded request queue drained by a fixed worker pool
//! - Reflection rendering for large artwork
//! - Placeholders and staleness-checked delivery to UI targets

pub mod dispatcher;
pub mod in_flight;
pub mod loader;
pub mod memory_cache;
pub mod placeholder;
pub mod reflection;
pub mod request_queue;
pub mod stats;
pub mod task;
pub mod worker_pool;

pub use dispatcher::{CompletionReceiver, Delivery, Dispatcher};
pub use loader::{ImageLoader, LoaderConfig};
pub use memory_cache::{ArtworkCache, CacheStats};
pub use placeholder::{DisplayMetrics, PlaceholderAssets, Placeholders};
pub use reflection::{reflect, reflected_dimensions};
pub use request_queue::RequestQueue;
pub use stats::StatsSnapshot;
pub use task::{LoadTask, TaskExecutor};
pub use worker_pool::{TaskHandler, WorkerPool};
