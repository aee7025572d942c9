//! Local fallback storage for listings
//!
//! Persistence failures never reach the caller: they are logged and turn
//! into a no-op write or an empty read.

use app_api::FileEntry;
use app_db::ListingCache;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Per-screen snapshot storage
pub trait LocalFileStore: Send + Sync {
    /// Replace everything stored under `bucket`
    fn save(&self, bucket: &str, entries: &[FileEntry]);

    /// Entries stored under `bucket`, empty if none
    fn fetch(&self, bucket: &str) -> Vec<FileEntry>;

    /// Entries across every bucket
    fn fetch_all(&self) -> Vec<FileEntry>;

    /// Drop every bucket (logout)
    fn clear_all(&self);
}

/// SQLite-backed store
pub struct CachedFileStore {
    cache: ListingCache,
}

impl CachedFileStore {
    pub fn new(cache: ListingCache) -> Self {
        Self { cache }
    }
}

impl LocalFileStore for CachedFileStore {
    fn save(&self, bucket: &str, entries: &[FileEntry]) {
        if let Err(e) = self.cache.replace_bucket(bucket, entries) {
            tracing::warn!(bucket, "Failed to cache listing: {}", e);
        }
    }

    fn fetch(&self, bucket: &str) -> Vec<FileEntry> {
        self.cache.bucket_entries(bucket).unwrap_or_else(|e| {
            tracing::warn!(bucket, "Failed to read cached listing: {}", e);
            Vec::new()
        })
    }

    fn fetch_all(&self) -> Vec<FileEntry> {
        self.cache.all_entries().unwrap_or_else(|e| {
            tracing::warn!("Failed to read cached listings: {}", e);
            Vec::new()
        })
    }

    fn clear_all(&self) {
        if let Err(e) = self.cache.clear() {
            tracing::warn!("Failed to clear listing cache: {}", e);
        }
    }
}

/// Process-local store, used when caching is disabled and in tests
#[derive(Default)]
pub struct MemoryFileStore {
    buckets: RwLock<BTreeMap<String, Vec<FileEntry>>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalFileStore for MemoryFileStore {
    fn save(&self, bucket: &str, entries: &[FileEntry]) {
        self.buckets.write().insert(bucket.to_string(), entries.to_vec());
    }

    fn fetch(&self, bucket: &str) -> Vec<FileEntry> {
        self.buckets.read().get(bucket).cloned().unwrap_or_default()
    }

    fn fetch_all(&self) -> Vec<FileEntry> {
        self.buckets.read().values().flatten().cloned().collect()
    }

    fn clear_all(&self) {
        self.buckets.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_api::EntryKind;
    use tempfile::NamedTempFile;

    fn entries(n: usize) -> Vec<FileEntry> {
        (0..n)
            .map(|i| {
                let mut e = FileEntry::new(format!("f{}.txt", i), format!("disk:/f{}.txt", i), EntryKind::File);
                e.size = Some(i as u64 * 100);
                e
            })
            .collect()
    }

    fn sqlite_store() -> (NamedTempFile, CachedFileStore) {
        let temp_file = NamedTempFile::new().unwrap();
        let cache = app_db::init_at(temp_file.path()).unwrap();
        (temp_file, CachedFileStore::new(cache))
    }

    fn check_contract(store: &dyn LocalFileStore) {
        assert!(store.fetch("published_files").is_empty());

        let saved = entries(3);
        store.save("published_files", &saved);
        store.save("all_files", &entries(1));

        let fetched = store.fetch("published_files");
        assert_eq!(fetched.len(), 3);
        for (a, b) in fetched.iter().zip(&saved) {
            assert_eq!((&a.path, &a.name, a.size), (&b.path, &b.name, b.size));
        }

        // Neither spelling of "all" reaches across buckets
        assert!(store.fetch("all").is_empty());
        assert!(store.fetch("All").is_empty());
        assert_eq!(store.fetch_all().len(), 4);

        store.save("published_files", &entries(1));
        assert_eq!(store.fetch("published_files").len(), 1);

        store.clear_all();
        assert!(store.fetch_all().is_empty());
    }

    #[test]
    fn test_sqlite_store_contract() {
        let (_tmp, store) = sqlite_store();
        check_contract(&store);
    }

    #[test]
    fn test_memory_store_contract() {
        check_contract(&MemoryFileStore::new());
    }

    #[test]
    fn test_broken_database_degrades_to_empty() {
        let (_tmp, store) = sqlite_store();
        store.save("all_files", &entries(2));

        // Simulate a schema problem underneath the store
        let dir = tempfile::tempdir().unwrap();
        let pool = app_db::init_pool(&dir.path().join("unmigrated.db")).unwrap();
        let broken = CachedFileStore::new(ListingCache::new(pool));

        broken.save("all_files", &entries(2));
        assert!(broken.fetch("all_files").is_empty());
        assert!(broken.fetch_all().is_empty());
        broken.clear_all();

        assert_eq!(store.fetch("all_files").len(), 2);
    }
}
