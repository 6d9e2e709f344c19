//! Loader lifecycle error types.

use thiserror::Error;

/// Errors raised while starting or configuring the loader.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum LoaderError {
    #[error("invalid loader configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("no tokio runtime available to spawn workers")]
    NoRuntime,

    #[error("failed to prepare placeholder artwork: {0}")]
    Placeholder(#[from] super::ArtworkError),
}

impl LoaderError {
    /// Creates invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}
