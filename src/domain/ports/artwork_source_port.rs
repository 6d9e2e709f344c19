//! Port definition for the artwork fetch collaborator.

use async_trait::async_trait;
use image::DynamicImage;

use crate::domain::errors::ArtworkResult;

/// Supplier of decoded source artwork.
///
/// Implementations own any retry, backoff or on-disk persistence. The loader
/// calls `fetch` at most once per task and never retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArtworkSource: Send + Sync {
    /// Fetches artwork for `content_id` scaled for `size` pixels.
    /// `persist` asks the source to keep a durable copy.
    async fn fetch(&self, content_id: &str, size: u32, persist: bool)
    -> ArtworkResult<DynamicImage>;
}
