//! Domain error types.

mod artwork_error;
mod loader_error;

pub use artwork_error::{ArtworkError, ArtworkResult};
pub use loader_error::LoaderError;
