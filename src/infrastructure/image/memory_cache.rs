//! In-memory LRU artwork cache.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use image::DynamicImage;
use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::domain::entities::CacheKey;

/// Default maximum number of renditions kept in memory.
pub const DEFAULT_CACHE_SIZE: usize = 100;

/// Bounded LRU cache of decoded artwork.
///
/// Every call takes the lock once and releases it before returning, so the
/// UI thread and workers never hold it across an await or each other's calls.
/// Cached images are immutable and shared through `Arc`.
pub struct ArtworkCache {
    cache: Mutex<LruCache<CacheKey, Arc<DynamicImage>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl ArtworkCache {
    /// Creates a new cache with the specified capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(cap)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Creates a new cache with the default capacity.
    #[must_use]
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }

    /// Looks up `key`, marking it most recently used on a hit.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<DynamicImage>> {
        let mut cache = self.cache.lock();
        if let Some(img) = cache.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(key = %key, "Memory cache hit");
            Some(img.clone())
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!(key = %key, "Memory cache miss");
            None
        }
    }

    /// Stores `image` under `key` as the most recently used entry.
    /// At capacity the least recently used entry is evicted first.
    pub fn put(&self, key: CacheKey, image: Arc<DynamicImage>) {
        let mut cache = self.cache.lock();
        if let Some((evicted, _)) = cache.push(key.clone(), image)
            && evicted != key
        {
            self.evictions.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, evicted = %evicted, "Evicted least recently used artwork");
        } else {
            trace!(key = %key, "Stored artwork in memory cache");
        }
    }

    /// Peeks at an entry without promoting it in the LRU.
    pub fn peek(&self, key: &CacheKey) -> Option<Arc<DynamicImage>> {
        self.cache.lock().peek(key).cloned()
    }

    /// Returns true if `key` is cached, without promoting it.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.cache.lock().contains(key)
    }

    /// Returns the current number of cached renditions.
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the fixed capacity.
    pub fn capacity(&self) -> usize {
        self.cache.lock().cap().get()
    }

    /// Drops every cached rendition.
    pub fn clear(&self) {
        self.cache.lock().clear();
        debug!("Cleared memory artwork cache");
    }

    /// Returns cache statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        CacheStats {
            hits,
            misses,
            evictions: self.evictions.load(Ordering::Relaxed),
            hit_rate,
            size: self.len(),
        }
    }
}

impl Default for ArtworkCache {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

impl std::fmt::Debug for ArtworkCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtworkCache")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

/// Statistics about cache performance.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of capacity evictions.
    pub evictions: u64,
    /// Hit rate as a percentage.
    pub hit_rate: f64,
    /// Current number of cached renditions.
    pub size: usize,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cache: {} images, {:.1}% hit rate ({} hits, {} misses, {} evicted)",
            self.size, self.hit_rate, self.hits, self.misses, self.evictions
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn img() -> Arc<DynamicImage> {
        Arc::new(DynamicImage::new_rgb8(10, 10))
    }

    fn key(id: &str) -> CacheKey {
        CacheKey::new(id, 64)
    }

    #[test]
    fn test_cache_put_and_get() {
        let cache = ArtworkCache::new(10);
        let id = key("test1");
        cache.put(id.clone(), Arc::new(DynamicImage::new_rgb8(100, 100)));

        let retrieved = cache.get(&id);
        assert_eq!(retrieved.map(|i| i.width()), Some(100));
    }

    #[test]
    fn test_cache_miss() {
        let cache = ArtworkCache::new(10);
        assert!(cache.get(&key("nonexistent")).is_none());
    }

    #[test]
    fn test_same_id_different_sizes_are_separate_entries() {
        let cache = ArtworkCache::new(10);
        cache.put(CacheKey::new("album", 64), Arc::new(DynamicImage::new_rgb8(64, 64)));
        cache.put(
            CacheKey::new("album", 480),
            Arc::new(DynamicImage::new_rgb8(480, 480)),
        );

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&CacheKey::new("album", 64)).map(|i| i.width()), Some(64));
        assert_eq!(
            cache.get(&CacheKey::new("album", 480)).map(|i| i.width()),
            Some(480)
        );
    }

    #[test]
    fn test_cache_eviction() {
        let cache = ArtworkCache::new(2);

        cache.put(key("test1"), img());
        cache.put(key("test2"), img());
        cache.put(key("test3"), img());

        // test1 is least recently used
        assert!(cache.get(&key("test1")).is_none());
        assert!(cache.get(&key("test2")).is_some());
        assert!(cache.get(&key("test3")).is_some());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_get_refreshes_recency() {
        let cache = ArtworkCache::new(3);
        cache.put(key("a"), img());
        cache.put(key("b"), img());
        cache.put(key("c"), img());

        assert!(cache.get(&key("a")).is_some());
        cache.put(key("d"), img());

        assert!(cache.contains(&key("a")));
        assert!(!cache.contains(&key("b")));
        assert!(cache.contains(&key("c")));
        assert!(cache.contains(&key("d")));
    }

    #[test]
    fn test_put_refreshes_recency() {
        let cache = ArtworkCache::new(2);
        cache.put(key("a"), img());
        cache.put(key("b"), img());
        cache.put(key("a"), img());
        cache.put(key("c"), img());

        assert!(cache.contains(&key("a")));
        assert!(!cache.contains(&key("b")));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let cache = ArtworkCache::new(100);
        for i in 0..350 {
            cache.put(key(&format!("album-{i}")), img());
            assert!(cache.len() <= 100);
        }
        assert_eq!(cache.len(), 100);
        assert!(cache.contains(&key("album-349")));
        assert!(cache.contains(&key("album-250")));
        assert!(!cache.contains(&key("album-249")));
    }

    #[test]
    fn test_cache_stats() {
        let cache = ArtworkCache::new(10);
        cache.put(key("test1"), img());

        let _ = cache.get(&key("test1"));
        let _ = cache.get(&key("missing"));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
    }

    #[test]
    fn test_peek_does_not_promote() {
        let cache = ArtworkCache::new(2);
        cache.put(key("test1"), img());
        cache.put(key("test2"), img());

        let _ = cache.peek(&key("test1"));
        cache.put(key("test3"), img());

        assert!(cache.peek(&key("test1")).is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_puts_lose_no_updates() {
        let cache = Arc::new(ArtworkCache::new(100));
        let mut handles = Vec::new();
        for worker in 0..5 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..16 {
                    cache.put(key(&format!("w{worker}-{i}")), img());
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(cache.len(), 80);
        for worker in 0..5 {
            for i in 0..16 {
                assert!(cache.get(&key(&format!("w{worker}-{i}"))).is_some());
            }
        }
    }
}
