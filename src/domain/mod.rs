//! Domain layer with core artwork entities, errors and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;

pub use entities::{ArtworkSize, CacheKey, Generation, Ticket};
pub use errors::{ArtworkError, ArtworkResult, LoaderError};
pub use ports::{ArtworkSource, MetadataSink};
