//! Adapter binding an external metadata sink to the loader.

use std::sync::Arc;

use image::DynamicImage;

use crate::domain::entities::Generation;
use crate::domain::ports::MetadataSink;

/// Loader target publishing artwork to an external now-playing surface.
pub struct MetadataTarget {
    sink: Arc<dyn MetadataSink>,
    generation: Generation,
}

impl MetadataTarget {
    /// Wraps `sink` as a loader target.
    #[must_use]
    pub fn new(sink: Arc<dyn MetadataSink>) -> Self {
        Self {
            sink,
            generation: Generation::new(),
        }
    }

    /// Hands the sink its own copy of `image`.
    pub fn publish(&self, image: &DynamicImage) {
        self.sink.put_artwork(image.clone());
    }

    /// Request generation counter of this target.
    #[must_use]
    pub const fn generation(&self) -> &Generation {
        &self.generation
    }
}

impl std::fmt::Debug for MetadataTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataTarget").finish_non_exhaustive()
    }
}
