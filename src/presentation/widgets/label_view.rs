//! Text label with a leading artwork icon.

use std::sync::Arc;

use image::DynamicImage;
use parking_lot::Mutex;

use crate::domain::entities::Generation;

/// Label widget state whose leading icon is fed by the loader.
///
/// Icons are always swapped in place; crossfading is not supported here.
pub struct LabelView {
    text: String,
    icon: Mutex<Option<Arc<DynamicImage>>>,
    generation: Generation,
}

impl LabelView {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            icon: Mutex::new(None),
            generation: Generation::new(),
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn icon(&self) -> Option<Arc<DynamicImage>> {
        self.icon.lock().clone()
    }

    pub fn set_icon(&self, icon: Arc<DynamicImage>) {
        *self.icon.lock() = Some(icon);
    }

    #[must_use]
    pub const fn generation(&self) -> &Generation {
        &self.generation
    }
}

impl std::fmt::Debug for LabelView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelView")
            .field("text", &self.text)
            .field("has_icon", &self.icon.lock().is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_icon_flow() {
        let label = LabelView::new("Blue Train");
        assert_eq!(label.text(), "Blue Train");
        assert!(label.icon().is_none());

        let icon = Arc::new(DynamicImage::new_rgb8(16, 16));
        label.set_icon(icon.clone());
        assert!(Arc::ptr_eq(&label.icon().unwrap(), &icon));
    }
}
