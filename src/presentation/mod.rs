//! Presentation layer containing the artwork consumer targets.

/// Widget state that receives artwork.
pub mod widgets;

pub use widgets::{ConsumerTarget, ImageView, LabelView, MetadataTarget};
