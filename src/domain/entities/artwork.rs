//! Artwork request entities.

/// Requested rendition of a piece of artwork.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ArtworkSize {
    /// List-row sized artwork, sized from the default placeholder asset.
    #[default]
    Default,
    /// Screen-relative artwork rendered with a reflection.
    Large,
}

impl ArtworkSize {
    /// Returns the rendition for a `large` flag.
    #[must_use]
    pub const fn from_large(large: bool) -> Self {
        if large { Self::Large } else { Self::Default }
    }

    /// Returns true for the large rendition.
    #[must_use]
    pub const fn is_large(self) -> bool {
        matches!(self, Self::Large)
    }
}

impl std::fmt::Display for ArtworkSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Large => write!(f, "large"),
        }
    }
}

/// Key of a decoded artwork rendition in the memory cache.
///
/// Content id and pixel size are kept as separate fields, so `("a1", 0)`
/// and `("a", 10)` never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    content_id: String,
    size: u32,
}

impl CacheKey {
    /// Creates a key for `content_id` rendered at `size` pixels.
    #[must_use]
    pub fn new(content_id: impl Into<String>, size: u32) -> Self {
        Self {
            content_id: content_id.into(),
            size,
        }
    }

    /// Returns the content id.
    #[must_use]
    pub fn content_id(&self) -> &str {
        &self.content_id
    }

    /// Returns the target size in pixels.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.content_id, self.size)
    }
}
