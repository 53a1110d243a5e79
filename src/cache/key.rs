//! Cache key derivation

use std::path::Path;

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Derive the cache key for a request under a project scope
///
/// The key is a hex SHA-256 over the tool name, the canonical input
/// serialization, and the project root. serde_json keeps object keys in
/// a sorted map, so equal inputs serialize identically regardless of the
/// order fields arrived in. Different project roots always produce
/// different keys; decisions never leak across projects.
pub fn cache_key(tool_name: &str, tool_input: &Value, project_root: Option<&Path>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(tool_name.as_bytes());
    hasher.update([0u8]);
    hasher.update(tool_input.to_string().as_bytes());
    hasher.update([0u8]);
    match project_root {
        Some(root) => hasher.update(root.to_string_lossy().as_bytes()),
        None => hasher.update(b"<no-project>"),
    }
    format!("{:x}", hasher.finalize())
}
