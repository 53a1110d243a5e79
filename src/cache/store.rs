//! Cache storage backends
//!
//! The cache is persisted as one JSON document. Writers read the whole
//! document, mutate in memory, and replace the file atomically so a
//! concurrent reader never observes a half-written document. Concurrent
//! writers degrade to last-writer-wins, which only ever costs a redundant
//! arbitration, never a wrong decision.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::core::WardenResult;

use super::decision_cache::CacheEntry;

/// The whole persisted cache: key -> entry
pub type CacheDocument = HashMap<String, CacheEntry>;

/// Storage seam for the decision cache
///
/// Production binds this to `FileCacheStore`; tests use `MemoryCacheStore`
/// so cache behavior can be exercised without touching the filesystem.
pub trait CacheStore: Send + Sync {
    /// Load the full document; absent or unreadable storage yields empty
    fn load(&self) -> CacheDocument;

    /// Replace the full document
    fn save(&self, doc: &CacheDocument) -> WardenResult<()>;
}

/// File-backed store with atomic replacement
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    path: PathBuf,
}

impl FileCacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl CacheStore for FileCacheStore {
    fn load(&self) -> CacheDocument {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return CacheDocument::new(),
        };
        match serde_json::from_str(&raw) {
            Ok(doc) => doc,
            Err(err) => {
                // Fail open on the cache only: a bogus miss costs one extra
                // arbitration, while crashing here would break resolution.
                tracing::warn!(
                    "Cache document at {} is unreadable, treating as empty: {}",
                    self.path.display(),
                    err
                );
                CacheDocument::new()
            }
        }
    }

    fn save(&self, doc: &CacheDocument) -> WardenResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(doc)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-memory store for tests
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    doc: Mutex<CacheDocument>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCacheStore {
    fn load(&self) -> CacheDocument {
        self.doc.lock().expect("cache store lock poisoned").clone()
    }

    fn save(&self, doc: &CacheDocument) -> WardenResult<()> {
        *self.doc.lock().expect("cache store lock poisoned") = doc.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Verdict;
    use chrono::Utc;
    use tempfile::TempDir;

    fn sample_entry(key: &str) -> CacheEntry {
        CacheEntry {
            key: key.to_string(),
            decision: Verdict::Allow,
            reason: "test".to_string(),
            timestamp: Utc::now(),
            tool_name: "Bash".to_string(),
            tool_input: None,
            project_root: None,
        }
    }

    #[test]
    fn test_file_store_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = FileCacheStore::new(temp.path().join("cache.json"));

        assert!(store.load().is_empty());

        let mut doc = CacheDocument::new();
        doc.insert("k1".to_string(), sample_entry("k1"));
        store.save(&doc).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["k1"].tool_name, "Bash");
    }

    #[test]
    fn test_file_store_creates_parent_dirs() {
        let temp = TempDir::new().unwrap();
        let store = FileCacheStore::new(temp.path().join("nested/dir/cache.json"));
        store.save(&CacheDocument::new()).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_corrupt_document_loads_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cache.json");
        fs::write(&path, "{not json at all").unwrap();

        let store = FileCacheStore::new(&path);
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let temp = TempDir::new().unwrap();
        let store = FileCacheStore::new(temp.path().join("cache.json"));
        store.save(&CacheDocument::new()).unwrap();
        assert!(!temp.path().join("cache.json.tmp").exists());
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryCacheStore::new();
        let mut doc = CacheDocument::new();
        doc.insert("k".to_string(), sample_entry("k"));
        store.save(&doc).unwrap();
        assert_eq!(store.load().len(), 1);
    }
}
