//! Reflection rendering for large artwork.
//!
//! The output stacks the source, a transparent gap, and a blurred, mirrored,
//! fading copy of the source's bottom half:
//!
//! ```text
//! +-----------+  0
//! |  source   |
//! +-----------+  H
//! |    gap    |
//! +-----------+  H + GAP
//! | reflection|
//! +-----------+  H + GAP + H / 2
//! ```

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};

use crate::domain::errors::{ArtworkError, ArtworkResult};

/// Vertical gap between the source and its reflection, in pixels.
pub const REFLECTION_GAP: u32 = 4;

/// Mask alpha at the top edge of the reflection (roughly 50%).
pub const GRADIENT_TOP_ALPHA: u8 = 0x80;

/// Returns the `(width, height)` of the reflected rendition of a
/// `width` x `height` source.
#[must_use]
pub const fn reflected_dimensions(width: u32, height: u32) -> (u32, u32) {
    (width, height + height / 2 + REFLECTION_GAP)
}

/// Renders `source` with a faded reflection beneath it.
///
/// Deterministic for identical input.
///
/// # Errors
/// Returns `ArtworkError::Transform` if the source has no pixels.
pub fn reflect(source: &DynamicImage) -> ArtworkResult<DynamicImage> {
    let width = source.width();
    let height = source.height();
    if width == 0 || height == 0 {
        return Err(ArtworkError::transform(format!(
            "cannot reflect empty image ({width}x{height})"
        )));
    }

    let reflection_height = height / 2;
    let (out_width, out_height) = reflected_dimensions(width, height);
    let mut canvas = RgbaImage::new(out_width, out_height);

    imageops::replace(&mut canvas, &source.to_rgba8(), 0, 0);

    if reflection_height > 0 {
        let layer = reflection_layer(source, reflection_height);
        imageops::replace(
            &mut canvas,
            &layer,
            0,
            i64::from(height + REFLECTION_GAP),
        );
    }

    Ok(DynamicImage::ImageRgba8(canvas))
}

/// Builds the blurred, mirrored, faded copy of the bottom `reflection_height`
/// rows of `source`.
fn reflection_layer(source: &DynamicImage, reflection_height: u32) -> RgbaImage {
    let width = source.width();
    let bottom = source
        .crop_imm(0, source.height() - reflection_height, width, reflection_height)
        .to_rgba8();

    // Resampling down and back up approximates a box blur.
    let shrunk = imageops::resize(
        &bottom,
        (width / 2).max(1),
        (reflection_height / 2).max(1),
        FilterType::Triangle,
    );
    let blurred = imageops::resize(&shrunk, width, reflection_height, FilterType::Triangle);

    let mut layer = imageops::flip_vertical(&blurred);
    for (y, row) in layer.enumerate_rows_mut() {
        let mask = gradient_alpha(y, reflection_height);
        for (_, _, pixel) in row {
            apply_mask(pixel, mask);
        }
    }
    layer
}

/// Alpha of the fade mask at row `y` of a reflection `height` rows tall,
/// linear from `GRADIENT_TOP_ALPHA` to zero on the last row.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn gradient_alpha(y: u32, height: u32) -> u8 {
    if height <= 1 {
        return GRADIENT_TOP_ALPHA;
    }
    let t = f64::from(y) / f64::from(height - 1);
    (f64::from(GRADIENT_TOP_ALPHA) * (1.0 - t)).round() as u8
}

/// Destination-in blend: keeps the pixel only where the mask is opaque.
#[allow(clippy::cast_possible_truncation)]
fn apply_mask(pixel: &mut Rgba<u8>, mask: u8) {
    let alpha = u16::from(pixel[3]) * u16::from(mask) / 255;
    pixel[3] = alpha as u8;
}
