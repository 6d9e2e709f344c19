//! Tagged union of everything the loader can deliver artwork to.

use std::sync::Arc;
use std::time::Duration;

use image::DynamicImage;

use super::{ImageView, LabelView, MetadataTarget};
use crate::domain::entities::{Generation, Ticket};

/// A consumer of loaded artwork.
#[derive(Clone, Debug)]
pub enum ConsumerTarget {
    /// Image widget; supports crossfade.
    Image(Arc<ImageView>),
    /// Label with a leading icon; crossfade is ignored.
    Label(Arc<LabelView>),
    /// External metadata surface; receives a copy of the image.
    Metadata(Arc<MetadataTarget>),
}

impl ConsumerTarget {
    /// Applies `image`, animating over `transition` where the variant
    /// supports it.
    pub fn apply(&self, image: &Arc<DynamicImage>, transition: Option<Duration>) {
        match self {
            Self::Image(view) => match transition {
                Some(duration) => view.crossfade_to(image.clone(), duration),
                None => view.set_image(image.clone()),
            },
            Self::Label(label) => label.set_icon(image.clone()),
            Self::Metadata(target) => target.publish(image),
        }
    }

    /// Claims a new request generation on the target.
    pub fn claim(&self) -> Ticket {
        self.generation().claim()
    }

    /// Returns true if `ticket` is still the target's newest request.
    #[must_use]
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.generation().is_current(ticket)
    }

    /// Short variant name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Image(_) => "image",
            Self::Label(_) => "label",
            Self::Metadata(_) => "metadata",
        }
    }

    fn generation(&self) -> &Generation {
        match self {
            Self::Image(view) => view.generation(),
            Self::Label(label) => label.generation(),
            Self::Metadata(target) => target.generation(),
        }
    }
}

impl From<Arc<ImageView>> for ConsumerTarget {
    fn from(view: Arc<ImageView>) -> Self {
        Self::Image(view)
    }
}

impl From<Arc<LabelView>> for ConsumerTarget {
    fn from(label: Arc<LabelView>) -> Self {
        Self::Label(label)
    }
}

impl From<Arc<MetadataTarget>> for ConsumerTarget {
    fn from(target: Arc<MetadataTarget>) -> Self {
        Self::Metadata(target)
    }
}
