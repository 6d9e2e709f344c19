//! Image display target with optional crossfade.

use std::sync::Arc;
use std::time::{Duration, Instant};

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use parking_lot::Mutex;

use crate::domain::entities::Generation;

/// Default crossfade duration.
pub const CROSSFADE_DURATION: Duration = Duration::from_millis(250);

/// Timed transition between two images on one target.
#[derive(Clone)]
pub struct Crossfade {
    from: Arc<DynamicImage>,
    to: Arc<DynamicImage>,
    started: Instant,
    duration: Duration,
}

impl Crossfade {
    /// Starts a transition from `from` to `to` at `started`.
    #[must_use]
    pub fn new(
        from: Arc<DynamicImage>,
        to: Arc<DynamicImage>,
        started: Instant,
        duration: Duration,
    ) -> Self {
        Self {
            from,
            to,
            started,
            duration,
        }
    }

    /// Image faded out by the transition.
    #[must_use]
    pub fn from(&self) -> &Arc<DynamicImage> {
        &self.from
    }

    /// Image faded in by the transition.
    #[must_use]
    pub fn to(&self) -> &Arc<DynamicImage> {
        &self.to
    }

    /// Transition length.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Fraction of the transition elapsed at `now`, clamped to `0.0..=1.0`.
    #[must_use]
    pub fn progress_at(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    /// Returns true once the transition has fully elapsed.
    #[must_use]
    pub fn is_finished_at(&self, now: Instant) -> bool {
        self.progress_at(now) >= 1.0
    }

    /// Renders the blended frame at `now`, sized like the target image.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn frame_at(&self, now: Instant) -> DynamicImage {
        let progress = self.progress_at(now);
        if progress >= 1.0 {
            return (*self.to).clone();
        }

        let to = self.to.to_rgba8();
        let from = if self.from.width() == to.width() && self.from.height() == to.height() {
            self.from.to_rgba8()
        } else {
            imageops::resize(
                &self.from.to_rgba8(),
                to.width(),
                to.height(),
                FilterType::Triangle,
            )
        };

        let mut frame = RgbaImage::new(to.width(), to.height());
        for (x, y, pixel) in frame.enumerate_pixels_mut() {
            let a = from.get_pixel(x, y);
            let b = to.get_pixel(x, y);
            for channel in 0..4 {
                let mixed =
                    f32::from(a[channel]) + (f32::from(b[channel]) - f32::from(a[channel])) * progress;
                pixel[channel] = mixed.round().clamp(0.0, 255.0) as u8;
            }
        }
        DynamicImage::ImageRgba8(frame)
    }
}

impl std::fmt::Debug for Crossfade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crossfade")
            .field("from", &(self.from.width(), self.from.height()))
            .field("to", &(self.to.width(), self.to.height()))
            .field("duration", &self.duration)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct ImageViewState {
    image: Option<Arc<DynamicImage>>,
    transition: Option<Crossfade>,
}

/// Image widget state fed by the loader.
///
/// Mutated only from the thread that drains loader completions.
#[derive(Default)]
pub struct ImageView {
    state: Mutex<ImageViewState>,
    generation: Generation,
}

impl ImageView {
    /// Creates an empty view.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Image currently set on the view (the end state of any transition).
    #[must_use]
    pub fn image(&self) -> Option<Arc<DynamicImage>> {
        self.state.lock().image.clone()
    }

    /// Transition in progress, if any.
    #[must_use]
    pub fn transition(&self) -> Option<Crossfade> {
        self.state.lock().transition.clone()
    }

    /// Sets `image` immediately, abandoning any transition.
    pub fn set_image(&self, image: Arc<DynamicImage>) {
        let mut state = self.state.lock();
        state.image = Some(image);
        state.transition = None;
    }

    /// Sets `image`, fading from whatever the view currently shows.
    ///
    /// An empty view fades from a transparent image of the new dimensions.
    pub fn crossfade_to(&self, image: Arc<DynamicImage>, duration: Duration) {
        let mut state = self.state.lock();
        let from = state.image.take().unwrap_or_else(|| {
            Arc::new(DynamicImage::ImageRgba8(RgbaImage::new(
                image.width(),
                image.height(),
            )))
        });
        state.transition = Some(Crossfade::new(
            from,
            image.clone(),
            Instant::now(),
            duration,
        ));
        state.image = Some(image);
    }

    /// Drops a finished transition. Returns true while still animating.
    pub fn tick(&self, now: Instant) -> bool {
        let mut state = self.state.lock();
        match &state.transition {
            Some(transition) if transition.is_finished_at(now) => {
                state.transition = None;
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Renders what the view shows at `now`.
    #[must_use]
    pub fn frame_at(&self, now: Instant) -> Option<DynamicImage> {
        let state = self.state.lock();
        match (&state.transition, &state.image) {
            (Some(transition), _) => Some(transition.frame_at(now)),
            (None, Some(image)) => Some((**image).clone()),
            (None, None) => None,
        }
    }

    /// Request generation counter of this view.
    #[must_use]
    pub const fn generation(&self) -> &Generation {
        &self.generation
    }
}

impl std::fmt::Debug for ImageView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ImageView")
            .field("has_image", &state.image.is_some())
            .field("transition", &state.transition)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(width: u32, height: u32, pixel: Rgba<u8>) -> Arc<DynamicImage> {
        Arc::new(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width, height, pixel,
        )))
    }

    #[test]
    fn test_set_image_replaces_immediately() {
        let view = ImageView::new();
        let img = solid(4, 4, Rgba([1, 2, 3, 255]));
        view.set_image(img.clone());

        assert!(Arc::ptr_eq(&view.image().unwrap(), &img));
        assert!(view.transition().is_none());
    }

    #[test]
    fn test_crossfade_from_existing_image() {
        let view = ImageView::new();
        let old = solid(4, 4, Rgba([0, 0, 0, 255]));
        let new = solid(4, 4, Rgba([255, 255, 255, 255]));
        view.set_image(old.clone());
        view.crossfade_to(new.clone(), CROSSFADE_DURATION);

        let transition = view.transition().unwrap();
        assert!(Arc::ptr_eq(transition.from(), &old));
        assert!(Arc::ptr_eq(transition.to(), &new));
        assert_eq!(transition.duration(), Duration::from_millis(250));
        assert!(Arc::ptr_eq(&view.image().unwrap(), &new));
    }

    #[test]
    fn test_crossfade_on_empty_view_starts_transparent() {
        let view = ImageView::new();
        view.crossfade_to(solid(6, 3, Rgba([9, 9, 9, 255])), CROSSFADE_DURATION);

        let transition = view.transition().unwrap();
        assert_eq!(transition.from().width(), 6);
        assert_eq!(transition.from().height(), 3);
        assert_eq!(transition.from().to_rgba8().get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn test_frame_blends_midway() {
        let started = Instant::now();
        let fade = Crossfade::new(
            solid(2, 2, Rgba([0, 0, 0, 255])),
            solid(2, 2, Rgba([200, 100, 0, 255])),
            started,
            Duration::from_millis(200),
        );

        let frame = fade.frame_at(started + Duration::from_millis(100)).to_rgba8();
        assert_eq!(frame.get_pixel(0, 0), &Rgba([100, 50, 0, 255]));

        let done = fade.frame_at(started + Duration::from_millis(400)).to_rgba8();
        assert_eq!(done.get_pixel(1, 1), &Rgba([200, 100, 0, 255]));
    }

    #[test]
    fn test_frame_resizes_mismatched_source() {
        let started = Instant::now();
        let fade = Crossfade::new(
            solid(2, 2, Rgba([0, 0, 0, 255])),
            solid(8, 4, Rgba([255, 255, 255, 255])),
            started,
            CROSSFADE_DURATION,
        );
        let frame = fade.frame_at(started);
        assert_eq!((frame.width(), frame.height()), (8, 4));
    }

    #[test]
    fn test_tick_clears_finished_transition() {
        let view = ImageView::new();
        view.crossfade_to(solid(2, 2, Rgba([1, 1, 1, 255])), Duration::from_millis(250));

        assert!(view.tick(Instant::now()));
        assert!(!view.tick(Instant::now() + Duration::from_secs(1)));
        assert!(view.transition().is_none());
        assert!(view.image().is_some());
    }
}
