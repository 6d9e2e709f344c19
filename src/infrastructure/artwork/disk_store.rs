//! Size-capped on-disk store for persisted artwork bytes.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::SystemTime;

use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace, warn};

use crate::domain::entities::CacheKey;
use crate::domain::errors::ArtworkResult;

/// Default disk budget (100 MB).
pub const DEFAULT_DISK_CACHE_BYTES: u64 = 100 * 1024 * 1024;

const ENTRY_EXTENSION: &str = "art";

/// Raw artwork bytes keyed by [`CacheKey`], trimmed by oldest access once
/// the byte budget is exceeded.
#[derive(Debug)]
pub struct DiskArtworkStore {
    dir: PathBuf,
    max_bytes: u64,
    current_bytes: AtomicU64,
    entries: AtomicUsize,
}

impl DiskArtworkStore {
    /// Opens the store in `dir`, creating it if needed and counting what is
    /// already there.
    ///
    /// # Errors
    /// Returns error if the directory cannot be created or read.
    pub async fn open(dir: PathBuf, max_bytes: u64) -> ArtworkResult<Self> {
        fs::create_dir_all(&dir).await?;

        let mut total = 0u64;
        let mut count = 0usize;
        let mut entries = fs::read_dir(&dir).await?;
        while let Ok(Some(entry)) = entries.next_entry().await {
            if is_entry(&entry.path())
                && let Ok(meta) = entry.metadata().await
            {
                total += meta.len();
                count += 1;
            }
        }

        let store = Self {
            dir,
            max_bytes,
            current_bytes: AtomicU64::new(total),
            entries: AtomicUsize::new(count),
        };
        store.cleanup_if_needed().await;
        debug!(dir = %store.dir.display(), entries = count, bytes = total, "Opened artwork store");
        Ok(store)
    }

    fn path_for(&self, key: &CacheKey) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.content_id().as_bytes());
        hasher.update([0]);
        hasher.update(key.size().to_be_bytes());
        let name = hex::encode(hasher.finalize());
        self.dir.join(format!("{name}.{ENTRY_EXTENSION}"))
    }

    /// Reads the bytes stored for `key`.
    pub async fn get(&self, key: &CacheKey) -> Option<Vec<u8>> {
        let path = self.path_for(key);
        match fs::read(&path).await {
            Ok(bytes) => {
                trace!(key = %key, "Artwork store hit");
                Some(bytes)
            }
            Err(_) => {
                trace!(key = %key, "Artwork store miss");
                None
            }
        }
    }

    /// Writes `bytes` for `key`, replacing any previous entry.
    ///
    /// # Errors
    /// Returns error if the file cannot be written.
    pub async fn put(&self, key: &CacheKey, bytes: &[u8]) -> ArtworkResult<()> {
        let path = self.path_for(key);
        let old_len = fs::metadata(&path).await.map(|m| m.len()).ok();

        let mut file = fs::File::create(&path).await?;
        file.write_all(bytes).await?;
        file.flush().await?;

        let new_len = bytes.len() as u64;
        match old_len {
            Some(old) if new_len >= old => {
                self.current_bytes.fetch_add(new_len - old, Ordering::Relaxed);
            }
            Some(old) => {
                self.current_bytes.fetch_sub(old - new_len, Ordering::Relaxed);
            }
            None => {
                self.current_bytes.fetch_add(new_len, Ordering::Relaxed);
                self.entries.fetch_add(1, Ordering::Relaxed);
            }
        }
        debug!(key = %key, size = bytes.len(), "Persisted artwork");

        self.cleanup_if_needed().await;
        Ok(())
    }

    /// Returns true if `key` has a stored entry.
    pub async fn contains(&self, key: &CacheKey) -> bool {
        fs::try_exists(self.path_for(key)).await.unwrap_or(false)
    }

    /// Bytes currently stored.
    #[must_use]
    pub fn current_bytes(&self) -> u64 {
        self.current_bytes.load(Ordering::Relaxed)
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.load(Ordering::Relaxed)
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Directory the store writes to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn cleanup_if_needed(&self) {
        let current = self.current_bytes();
        if current <= self.max_bytes {
            return;
        }
        debug!(current, max = self.max_bytes, "Artwork store over budget, cleaning up");

        let Ok(mut entries) = fs::read_dir(&self.dir).await else {
            return;
        };
        let mut files: Vec<(PathBuf, SystemTime, u64)> = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if !is_entry(&path) {
                continue;
            }
            if let Ok(meta) = entry.metadata().await {
                let touched = meta
                    .accessed()
                    .or_else(|_| meta.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                files.push((path, touched, meta.len()));
            }
        }
        files.sort_by_key(|(_, touched, _)| *touched);

        // free an extra tenth so the next few writes don't trigger another scan
        let target = current - self.max_bytes + self.max_bytes / 10;
        let mut freed = 0u64;
        let mut removed = 0usize;
        for (path, _, len) in files {
            if freed >= target {
                break;
            }
            match fs::remove_file(&path).await {
                Ok(()) => {
                    freed += len;
                    removed += 1;
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove stored artwork"),
            }
        }
        self.current_bytes.fetch_sub(freed, Ordering::Relaxed);
        self.entries.fetch_sub(removed, Ordering::Relaxed);
        debug!(freed, removed, "Artwork store cleanup complete");
    }
}

fn is_entry(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    async fn store(max_bytes: u64) -> (DiskArtworkStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = DiskArtworkStore::open(temp.path().to_path_buf(), max_bytes)
            .await
            .unwrap();
        (store, temp)
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let (store, _temp) = store(1024).await;
        let key = CacheKey::new("cover", 480);

        store.put(&key, b"png bytes").await.unwrap();

        assert_eq!(store.get(&key).await.unwrap(), b"png bytes");
        assert!(store.contains(&key).await);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_sizes_are_separate_entries() {
        let (store, _temp) = store(1024).await;
        store.put(&CacheKey::new("a1", 2), b"one").await.unwrap();

        assert!(store.get(&CacheKey::new("a", 12)).await.is_none());
        assert!(store.get(&CacheKey::new("a1", 480)).await.is_none());
    }

    #[tokio::test]
    async fn test_overwrite_adjusts_byte_count() {
        let (store, _temp) = store(1024).await;
        let key = CacheKey::new("cover", 64);

        store.put(&key, b"hello world").await.unwrap();
        store.put(&key, b"hey").await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.current_bytes(), 3);
    }

    #[tokio::test]
    async fn test_over_budget_removes_oldest() {
        let (store, _temp) = store(10).await;
        let old = CacheKey::new("old", 64);
        let new = CacheKey::new("new", 64);

        store.put(&old, b"123456").await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        store.put(&new, b"123456").await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.current_bytes(), 6);
        assert!(store.contains(&new).await);
    }

    #[tokio::test]
    async fn test_reopen_counts_existing_entries() {
        let temp = TempDir::new().unwrap();
        {
            let store = DiskArtworkStore::open(temp.path().to_path_buf(), 1024)
                .await
                .unwrap();
            store.put(&CacheKey::new("a", 1), b"abc").await.unwrap();
            store.put(&CacheKey::new("b", 1), b"de").await.unwrap();
        }
        let reopened = DiskArtworkStore::open(temp.path().to_path_buf(), 1024)
            .await
            .unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.current_bytes(), 5);
    }
}
