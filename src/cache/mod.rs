//! Persistent decision cache
//!
//! Stores LLM-tier rulings keyed by (tool, input, project root) so an
//! identical request does not pay for a second arbitration. The store is
//! a single JSON document replaced atomically on every write; a corrupt
//! document degrades to an empty cache, never to a resolution error.

mod decision_cache;
mod key;
mod store;

pub use decision_cache::{CacheEntry, DecisionCache};
pub use key::cache_key;
pub use store::{CacheDocument, CacheStore, FileCacheStore, MemoryCacheStore};
