//! Port for external now-playing metadata surfaces.

use image::DynamicImage;

/// External surface that publishes artwork outside the application, such as
/// a lock-screen or media-session widget.
///
/// The sink may keep the image for as long as it likes, so it always
/// receives its own copy rather than the cached instance.
pub trait MetadataSink: Send + Sync {
    /// Publishes `artwork` as the current track artwork.
    fn put_artwork(&self, artwork: DynamicImage);
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use parking_lot::Mutex;

    /// Sink that records every published artwork.
    #[derive(Default)]
    pub struct RecordingMetadataSink {
        published: Mutex<Vec<DynamicImage>>,
    }

    impl RecordingMetadataSink {
        /// Returns every image received so far.
        pub fn published(&self) -> Vec<DynamicImage> {
            self.published.lock().clone()
        }
    }

    impl MetadataSink for RecordingMetadataSink {
        fn put_artwork(&self, artwork: DynamicImage) {
            self.published.lock().push(artwork);
        }
    }
}
