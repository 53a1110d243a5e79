//! Arbitration policy
//!
//! The compiled-in system prompt and its version, plus the guard that
//! keeps a stored config in step with them. Cached rulings are only
//! trustworthy under the policy that produced them, so a version bump
//! wipes the cache in full.

use std::path::Path;

use crate::cache::DecisionCache;
use crate::config::WardenConfig;
use crate::core::WardenResult;

/// Version of [`SYSTEM_PROMPT`]. Bump on every prompt change.
pub const CURRENT_POLICY_VERSION: u32 = 3;

/// The arbitration system prompt
pub const SYSTEM_PROMPT: &str = "\
You are a security arbiter for an autonomous coding agent. You are given one \
tool-execution request: the tool name, the project it runs in, and the tool \
input. Decide whether the action is safe to run unattended.

Deny anything that could destroy data outside the project, exfiltrate \
secrets or credentials, rewrite shared branch history, modify system \
configuration, or run code fetched from an untrusted source. Allow routine \
development activity inside the project: building, testing, linting, \
reading, local file edits, and version-control operations that do not \
rewrite shared history.

When in doubt, deny.

Respond with a single JSON object and nothing else:
{\"decision\": \"allow\" | \"deny\", \"reason\": \"<one short sentence>\"}";

/// One-shot policy upgrade guard
///
/// Threaded into the resolver as explicit state rather than living in a
/// module-level flag, so "at most once per process" is visible at the
/// call site and testable.
#[derive(Debug, Default)]
pub struct PolicyGuard {
    checked: bool,
}

impl PolicyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring the config up to the compiled-in policy if it is older
    ///
    /// On upgrade the system prompt and version are overwritten, the
    /// config is persisted, and the cache is cleared in full. After the
    /// first call this is a pure flag check with no I/O.
    pub fn ensure_current(
        &mut self,
        config: &mut WardenConfig,
        cache: &DecisionCache,
        config_dir: &Path,
    ) -> WardenResult<()> {
        if self.checked {
            return Ok(());
        }
        self.checked = true;

        if config.policy_version >= CURRENT_POLICY_VERSION {
            return Ok(());
        }

        tracing::info!(
            "Upgrading arbitration policy v{} -> v{}, clearing decision cache",
            config.policy_version,
            CURRENT_POLICY_VERSION
        );
        config.system_prompt = SYSTEM_PROMPT.to_string();
        config.policy_version = CURRENT_POLICY_VERSION;
        config.save(config_dir)?;

        let cleared = cache.clear_all();
        tracing::info!("Cleared {} cached decisions", cleared);
        Ok(())
    }

    /// Whether the guard has already run this process
    pub fn checked(&self) -> bool {
        self.checked
    }
}
