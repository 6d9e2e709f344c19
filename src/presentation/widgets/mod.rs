//! Display-side targets fed by the artwork loader.

mod image_view;
mod label_view;
mod metadata_target;
mod target;

pub use image_view::{CROSSFADE_DURATION, Crossfade, ImageView};
pub use label_view::LabelView;
pub use metadata_target::MetadataTarget;
pub use target::ConsumerTarget;
