//! Artwork read from image files in a local directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::DynamicImage;
use image::imageops::FilterType;
use tracing::trace;

use crate::domain::errors::{ArtworkError, ArtworkResult};
use crate::domain::ports::ArtworkSource;

const EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// Serves `<dir>/<id>.<ext>` scaled to fit the requested size.
#[derive(Debug, Clone)]
pub struct DirectoryArtworkSource {
    dir: PathBuf,
}

impl DirectoryArtworkSource {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory artwork is read from.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn locate(&self, content_id: &str) -> Option<PathBuf> {
        for ext in EXTENSIONS {
            let path = self.dir.join(format!("{content_id}.{ext}"));
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Some(path);
            }
        }
        None
    }
}

#[async_trait]
impl ArtworkSource for DirectoryArtworkSource {
    async fn fetch(&self, content_id: &str, size: u32, _persist: bool) -> ArtworkResult<DynamicImage> {
        if content_id.contains(['/', '\\']) || content_id.starts_with('.') {
            return Err(ArtworkError::NotFound(content_id.to_string()));
        }
        let path = self
            .locate(content_id)
            .await
            .ok_or_else(|| ArtworkError::NotFound(content_id.to_string()))?;
        trace!(path = %path.display(), size, "Reading artwork file");

        let bytes = tokio::fs::read(&path).await?;
        tokio::task::spawn_blocking(move || -> ArtworkResult<DynamicImage> {
            let image = image::load_from_memory(&bytes)?;
            if size == 0 || (image.width() <= size && image.height() <= size) {
                Ok(image)
            } else {
                Ok(image.resize(size, size, FilterType::Triangle))
            }
        })
        .await
        .map_err(|e| ArtworkError::decode(format!("Decode task failed: {e}")))?
    }
}
