//! Artwork pipeline error types.

use thiserror::Error;

/// Result type for artwork pipeline operations.
pub type ArtworkResult<T> = std::result::Result<T, ArtworkError>;

/// Errors raised while fetching, decoding or transforming artwork.
///
/// None of these reach callers of the loader; workers log them and leave the
/// target on whatever it already shows.
#[derive(Debug, Clone, Error)]
pub enum ArtworkError {
    /// The source has no artwork for the requested id.
    #[error("artwork not found: {0}")]
    NotFound(String),
    /// Network or collaborator failure while fetching.
    #[error("fetch error: {0}")]
    Fetch(String),
    /// Raw bytes could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
    /// The source image could not be transformed.
    #[error("transform error: {0}")]
    Transform(String),
    /// I/O error in a storage-backed source.
    #[error("io error: {0}")]
    Io(String),
}

impl ArtworkError {
    /// Creates a fetch error.
    #[must_use]
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch(message.into())
    }

    /// Creates a decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Creates a transform error.
    #[must_use]
    pub fn transform(message: impl Into<String>) -> Self {
        Self::Transform(message.into())
    }
}

impl From<image::ImageError> for ArtworkError {
    fn from(err: image::ImageError) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<std::io::Error> for ArtworkError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
