//! Infrastructure layer: the artwork pipeline and its external adapters.

/// Artwork sources and persistent storage.
pub mod artwork;
/// Application configuration.
pub mod config;
/// Artwork loading pipeline (caching, queueing, reflection, delivery).
pub mod image;

pub use artwork::{DirectoryArtworkSource, DiskArtworkStore, HttpArtworkSource};
pub use config::{AppConfig, CliArgs, LogLevel, StorageManager};
pub use image::{CompletionReceiver, ImageLoader, LoaderConfig};
