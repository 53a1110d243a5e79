//! Decision cache operations
//!
//! TTL-checked reads, overwrite-on-same-key writes, and the clearing and
//! listing operations the CLI exposes. Only LLM-tier rulings land here;
//! fast-tier outcomes are recomputed for free and passthroughs are not
//! security decisions at all.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::Verdict;

use super::key::cache_key;
use super::store::CacheStore;

/// One cached ruling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub decision: Verdict,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
    pub tool_name: String,
    /// Kept for display and grep-based clearing; never re-keyed on read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_input: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_root: Option<String>,
}

impl CacheEntry {
    /// Whether this entry is still within its TTL at `now`
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl_hours: u64) -> bool {
        now - self.timestamp <= Duration::hours(ttl_hours as i64)
    }
}

/// The persistent decision cache
pub struct DecisionCache {
    store: Box<dyn CacheStore>,
    ttl_hours: u64,
}

impl DecisionCache {
    pub fn new(store: Box<dyn CacheStore>, ttl_hours: u64) -> Self {
        Self { store, ttl_hours }
    }

    /// Look up a fresh entry for a request
    ///
    /// Stale entries count as misses and are evicted on the spot.
    pub fn get(
        &self,
        tool_name: &str,
        tool_input: &Value,
        project_root: Option<&Path>,
    ) -> Option<CacheEntry> {
        let key = cache_key(tool_name, tool_input, project_root);
        let mut doc = self.store.load();
        let entry = doc.get(&key)?.clone();

        if entry.is_fresh(Utc::now(), self.ttl_hours) {
            return Some(entry);
        }

        // Lazy eviction; a failed write just leaves the stale entry for
        // the next reader to evict.
        doc.remove(&key);
        if let Err(err) = self.store.save(&doc) {
            tracing::warn!("Failed to evict stale cache entry: {}", err);
        }
        None
    }

    /// Record a ruling, overwriting any entry at the same key
    pub fn set(
        &self,
        tool_name: &str,
        tool_input: &Value,
        decision: Verdict,
        reason: &str,
        project_root: Option<&Path>,
    ) {
        self.set_at(tool_name, tool_input, decision, reason, project_root, Utc::now());
    }

    fn set_at(
        &self,
        tool_name: &str,
        tool_input: &Value,
        decision: Verdict,
        reason: &str,
        project_root: Option<&Path>,
        timestamp: DateTime<Utc>,
    ) {
        let key = cache_key(tool_name, tool_input, project_root);
        let mut doc = self.store.load();
        doc.insert(
            key.clone(),
            CacheEntry {
                key,
                decision,
                reason: reason.to_string(),
                timestamp,
                tool_name: tool_name.to_string(),
                tool_input: Some(tool_input.clone()),
                project_root: project_root.map(|p| p.to_string_lossy().into_owned()),
            },
        );
        if let Err(err) = self.store.save(&doc) {
            // A lost write costs one redundant arbitration on the next
            // identical request; resolution itself already succeeded.
            tracing::warn!("Failed to persist cache entry: {}", err);
        }
    }

    /// Remove every entry; returns how many were removed
    pub fn clear_all(&self) -> usize {
        let doc = self.store.load();
        let count = doc.len();
        if count > 0 {
            if let Err(err) = self.store.save(&Default::default()) {
                tracing::warn!("Failed to clear cache: {}", err);
                return 0;
            }
        }
        count
    }

    /// Remove entries with the given decision; returns how many
    pub fn clear_by_decision(&self, decision: Verdict) -> usize {
        let mut doc = self.store.load();
        let before = doc.len();
        doc.retain(|_, entry| entry.decision != decision);
        let removed = before - doc.len();
        if removed > 0 {
            if let Err(err) = self.store.save(&doc) {
                tracing::warn!("Failed to clear cache entries: {}", err);
                return 0;
            }
        }
        removed
    }

    /// Remove the entry at an exact key; returns whether it existed
    pub fn clear_by_key(&self, key: &str) -> bool {
        let mut doc = self.store.load();
        let found = doc.remove(key).is_some();
        if found {
            if let Err(err) = self.store.save(&doc) {
                tracing::warn!("Failed to clear cache entry: {}", err);
                return false;
            }
        }
        found
    }

    /// Remove entries whose tool name, reason, or serialized input
    /// contains the substring; returns how many
    pub fn clear_by_grep(&self, needle: &str) -> usize {
        let mut doc = self.store.load();
        let before = doc.len();
        doc.retain(|_, entry| {
            let input_text = entry
                .tool_input
                .as_ref()
                .map(|input| input.to_string())
                .unwrap_or_default();
            !(entry.tool_name.contains(needle)
                || entry.reason.contains(needle)
                || input_text.contains(needle))
        });
        let removed = before - doc.len();
        if removed > 0 {
            if let Err(err) = self.store.save(&doc) {
                tracing::warn!("Failed to clear cache entries: {}", err);
                return 0;
            }
        }
        removed
    }

    /// All entries, newest first, optionally filtered to one project
    pub fn list(&self, project_root: Option<&Path>) -> Vec<CacheEntry> {
        let doc = self.store.load();
        let mut entries: Vec<CacheEntry> = doc
            .into_values()
            .filter(|entry| match project_root {
                Some(root) => entry.project_root.as_deref() == Some(&*root.to_string_lossy()),
                None => true,
            })
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries
    }

    /// Number of entries currently stored
    pub fn len(&self) -> usize {
        self.store.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheStore;
    use serde_json::json;
    use std::path::PathBuf;

    fn cache(ttl_hours: u64) -> DecisionCache {
        DecisionCache::new(Box::new(MemoryCacheStore::new()), ttl_hours)
    }

    #[test]
    fn test_get_set_round_trip() {
        let cache = cache(24);
        let input = json!({"command": "cargo test"});
        let root = PathBuf::from("/work/repo");

        assert!(cache.get("Bash", &input, Some(&root)).is_none());

        cache.set("Bash", &input, Verdict::Allow, "test runner", Some(&root));
        let entry = cache.get("Bash", &input, Some(&root)).unwrap();
        assert_eq!(entry.decision, Verdict::Allow);
        assert_eq!(entry.reason, "test runner");
        assert_eq!(entry.project_root.as_deref(), Some("/work/repo"));
    }

    #[test]
    fn test_project_scoping() {
        let cache = cache(24);
        let input = json!({"command": "make deploy"});
        let p1 = PathBuf::from("/work/alpha");
        let p2 = PathBuf::from("/work/beta");

        cache.set("Bash", &input, Verdict::Deny, "deploys", Some(&p1));
        assert!(cache.get("Bash", &input, Some(&p1)).is_some());
        assert!(cache.get("Bash", &input, Some(&p2)).is_none());
        assert!(cache.get("Bash", &input, None).is_none());
    }

    #[test]
    fn test_overwrite_same_key() {
        let cache = cache(24);
        let input = json!({"command": "terraform apply"});

        cache.set("Bash", &input, Verdict::Deny, "first answer", None);
        cache.set("Bash", &input, Verdict::Allow, "second answer", None);

        let entry = cache.get("Bash", &input, None).unwrap();
        assert_eq!(entry.decision, Verdict::Allow);
        assert_eq!(entry.reason, "second answer");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_ttl_boundary() {
        let cache = cache(1);
        let input = json!({"command": "npm install"});

        // One second inside the TTL: hit
        cache.set_at(
            "Bash",
            &input,
            Verdict::Allow,
            "deps",
            None,
            Utc::now() - Duration::hours(1) + Duration::seconds(1),
        );
        assert!(cache.get("Bash", &input, None).is_some());

        // One second past the TTL: miss, and the entry is evicted
        cache.set_at(
            "Bash",
            &input,
            Verdict::Allow,
            "deps",
            None,
            Utc::now() - Duration::hours(1) - Duration::seconds(1),
        );
        assert!(cache.get("Bash", &input, None).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear_all() {
        let cache = cache(24);
        cache.set("Bash", &json!({"command": "a"}), Verdict::Allow, "r", None);
        cache.set("Bash", &json!({"command": "b"}), Verdict::Deny, "r", None);
        assert_eq!(cache.clear_all(), 2);
        assert!(cache.is_empty());
        assert_eq!(cache.clear_all(), 0);
    }

    #[test]
    fn test_clear_by_decision() {
        let cache = cache(24);
        cache.set("Bash", &json!({"command": "a"}), Verdict::Allow, "r", None);
        cache.set("Bash", &json!({"command": "b"}), Verdict::Deny, "r", None);
        cache.set("Bash", &json!({"command": "c"}), Verdict::Deny, "r", None);

        assert_eq!(cache.clear_by_decision(Verdict::Deny), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.clear_by_decision(Verdict::Deny), 0);
    }

    #[test]
    fn test_clear_by_key() {
        let cache = cache(24);
        let input = json!({"command": "a"});
        cache.set("Bash", &input, Verdict::Allow, "r", None);
        let key = cache_key("Bash", &input, None);

        assert!(cache.clear_by_key(&key));
        assert!(!cache.clear_by_key(&key));
    }

    #[test]
    fn test_clear_by_grep() {
        let cache = cache(24);
        cache.set(
            "Bash",
            &json!({"command": "docker compose up"}),
            Verdict::Allow,
            "containers",
            None,
        );
        cache.set(
            "Write",
            &json!({"file_path": "/tmp/x"}),
            Verdict::Allow,
            "scratch file",
            None,
        );

        // Matches serialized input
        assert_eq!(cache.clear_by_grep("docker"), 1);
        // Matches reason
        assert_eq!(cache.clear_by_grep("scratch"), 1);
        assert_eq!(cache.clear_by_grep("nothing"), 0);
    }

    #[test]
    fn test_list_newest_first() {
        let cache = cache(24);
        let root = PathBuf::from("/work/repo");
        cache.set_at(
            "Bash",
            &json!({"command": "old"}),
            Verdict::Allow,
            "r",
            Some(&root),
            Utc::now() - Duration::minutes(5),
        );
        cache.set("Bash", &json!({"command": "new"}), Verdict::Allow, "r", Some(&root));
        cache.set("Bash", &json!({"command": "other"}), Verdict::Allow, "r", None);

        let all = cache.list(None);
        assert_eq!(all.len(), 3);

        let scoped = cache.list(Some(&root));
        assert_eq!(scoped.len(), 2);
        assert_eq!(scoped[0].tool_input, Some(json!({"command": "new"})));
        assert_eq!(scoped[1].tool_input, Some(json!({"command": "old"})));
    }
}
