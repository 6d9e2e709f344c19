//! Placeholder artwork and request sizing derived from the display.

use std::path::Path;
use std::sync::Arc;

use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::reflection::reflect;
use crate::domain::entities::ArtworkSize;
use crate::domain::errors::{ArtworkError, ArtworkResult};

/// Edge length of the built-in default placeholder.
pub const BUILTIN_DEFAULT_PX: u32 = 64;

/// Edge length of the built-in large placeholder before scaling.
pub const BUILTIN_LARGE_PX: u32 = 512;

/// Screen dimensions reported once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayMetrics {
    /// Screen width in pixels.
    pub width_px: u32,
    /// Screen height in pixels.
    pub height_px: u32,
}

impl DisplayMetrics {
    /// Creates metrics for a `width_px` x `height_px` screen.
    #[must_use]
    pub const fn new(width_px: u32, height_px: u32) -> Self {
        Self {
            width_px,
            height_px,
        }
    }

    /// Returns the large artwork edge: `fraction` of the shorter screen side.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn large_edge(&self, fraction: f64) -> u32 {
        let short_side = self.width_px.min(self.height_px);
        ((f64::from(short_side) * fraction).round() as u32).max(1)
    }
}

impl Default for DisplayMetrics {
    fn default() -> Self {
        Self::new(1080, 1920)
    }
}

/// The two raw placeholder assets.
#[derive(Debug, Clone)]
pub struct PlaceholderAssets {
    /// Asset shown for default-size requests; its height sets the default size.
    pub default: DynamicImage,
    /// Asset scaled and reflected for large requests.
    pub large: DynamicImage,
}

impl PlaceholderAssets {
    /// Returns procedurally drawn "unknown album" assets.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            default: DynamicImage::ImageRgba8(unknown_album(BUILTIN_DEFAULT_PX)),
            large: DynamicImage::ImageRgba8(unknown_album(BUILTIN_LARGE_PX)),
        }
    }

    /// Loads both assets from image files.
    ///
    /// # Errors
    /// Returns error if either file cannot be read or decoded.
    pub fn from_files(default: &Path, large: &Path) -> ArtworkResult<Self> {
        Ok(Self {
            default: image::open(default)?,
            large: image::open(large)?,
        })
    }
}

impl Default for PlaceholderAssets {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Process-wide placeholders and the pixel sizes requests are made at.
#[derive(Clone)]
pub struct Placeholders {
    default: Arc<DynamicImage>,
    large: Arc<DynamicImage>,
    default_size: u32,
    large_size: u32,
}

impl Placeholders {
    /// Computes sizes from `display` and renders both placeholders.
    ///
    /// # Errors
    /// Returns error if an asset is empty.
    pub fn prepare(
        display: DisplayMetrics,
        assets: PlaceholderAssets,
        large_fraction: f64,
    ) -> ArtworkResult<Self> {
        let default_size = assets.default.height();
        if default_size == 0 {
            return Err(ArtworkError::decode("default placeholder asset is empty"));
        }
        let large_size = display.large_edge(large_fraction);

        let scaled = assets
            .large
            .resize_exact(large_size, large_size, FilterType::Triangle);
        let large = reflect(&scaled)?;

        debug!(default_size, large_size, "Prepared placeholder artwork");

        Ok(Self {
            default: Arc::new(assets.default),
            large: Arc::new(large),
            default_size,
            large_size,
        })
    }

    /// Returns the request size in pixels for `size`.
    #[must_use]
    pub const fn size_for(&self, size: ArtworkSize) -> u32 {
        match size {
            ArtworkSize::Default => self.default_size,
            ArtworkSize::Large => self.large_size,
        }
    }

    /// Returns the placeholder image for `size`.
    #[must_use]
    pub fn image_for(&self, size: ArtworkSize) -> Arc<DynamicImage> {
        match size {
            ArtworkSize::Default => self.default.clone(),
            ArtworkSize::Large => self.large.clone(),
        }
    }

    /// Returns true if `image` is one of the placeholder instances.
    #[must_use]
    pub fn is_placeholder(&self, image: &Arc<DynamicImage>) -> bool {
        Arc::ptr_eq(image, &self.default) || Arc::ptr_eq(image, &self.large)
    }
}

impl std::fmt::Debug for Placeholders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Placeholders")
            .field("default_size", &self.default_size)
            .field("large_size", &self.large_size)
            .finish_non_exhaustive()
    }
}

/// Draws a dark disc with a spindle hole on a grey tile.
#[allow(clippy::cast_precision_loss)]
fn unknown_album(edge: u32) -> RgbaImage {
    let tile = Rgba([0x4a, 0x4a, 0x4a, 0xff]);
    let disc = Rgba([0x22, 0x22, 0x22, 0xff]);
    let label = Rgba([0x8a, 0x8a, 0x8a, 0xff]);

    let center = edge as f32 / 2.0;
    let disc_radius = edge as f32 * 0.42;
    let label_radius = edge as f32 * 0.14;
    let hole_radius = edge as f32 * 0.03;

    RgbaImage::from_fn(edge, edge, |x, y| {
        let dx = x as f32 + 0.5 - center;
        let dy = y as f32 + 0.5 - center;
        let distance = dx.hypot(dy);
        if distance <= hole_radius {
            tile
        } else if distance <= label_radius {
            label
        } else if distance <= disc_radius {
            disc
        } else {
            tile
        }
    })
}
