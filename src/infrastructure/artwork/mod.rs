//! Artwork sources and persistent storage.

pub mod directory_source;
pub mod disk_store;
pub mod http_source;

pub use directory_source::DirectoryArtworkSource;
pub use disk_store::{DEFAULT_DISK_CACHE_BYTES, DiskArtworkStore};
pub use http_source::{HttpArtworkSource, ServerCredentials};
