//! Domain entity definitions.

mod artwork;
mod generation;

pub use artwork::{ArtworkSize, CacheKey};
pub use generation::{Generation, Ticket};
