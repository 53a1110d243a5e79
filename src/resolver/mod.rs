//! Decision resolution
//!
//! Sequences the tiers: policy guard, fast rules, cache, arbiter. The
//! first definitive answer wins, and every terminal outcome emits exactly
//! one audit record naming the tier that produced it.

use std::path::{Path, PathBuf};

use crate::arbiter::{Arbiter, LlmArbiter};
use crate::cache::{CacheStore, DecisionCache, FileCacheStore};
use crate::config::WardenConfig;
use crate::core::{DecisionResult, DecisionSource, FastVerdict, ToolRequest};
use crate::policy::PolicyGuard;
use crate::project::ProjectRootResolver;
use crate::rules::RuleMatcher;

/// Orchestrates one or more resolutions within a process
pub struct DecisionResolver {
    config_dir: PathBuf,
    config: WardenConfig,
    matcher: RuleMatcher,
    projects: ProjectRootResolver,
    cache: DecisionCache,
    arbiter: Box<dyn Arbiter>,
    policy_guard: PolicyGuard,
}

impl DecisionResolver {
    /// Production resolver: file-backed cache, LLM arbiter
    pub fn new(config_dir: &Path) -> Self {
        let config = WardenConfig::load(config_dir);
        let store = Box::new(FileCacheStore::new(WardenConfig::cache_path(config_dir)));
        let arbiter = Box::new(LlmArbiter::new(config.llm.clone()));
        Self::from_parts(config_dir, config, store, arbiter)
    }

    /// Assemble a resolver from explicit parts (tests inject a memory
    /// store and a stub arbiter here)
    pub fn from_parts(
        config_dir: &Path,
        config: WardenConfig,
        store: Box<dyn CacheStore>,
        arbiter: Box<dyn Arbiter>,
    ) -> Self {
        let matcher = RuleMatcher::new(
            &config.rules.allow,
            &config.rules.deny,
            &config.rules.passthrough,
        );
        let cache = DecisionCache::new(store, config.cache.ttl_hours);
        Self {
            config_dir: config_dir.to_path_buf(),
            config,
            matcher,
            projects: ProjectRootResolver::new(),
            cache,
            arbiter,
            policy_guard: PolicyGuard::new(),
        }
    }

    /// Resolve one request to a terminal decision
    ///
    /// Infallible by design: the only faults that can occur past the
    /// boundary (cache I/O, arbitration) already degrade internally, the
    /// cache toward a miss and the arbiter toward deny.
    pub async fn resolve(&mut self, request: &ToolRequest) -> DecisionResult {
        // Policy check runs before any decision is derived. If persisting
        // the upgraded config fails the cache is already cleared, which is
        // the part correctness depends on; the next process retries the
        // config write.
        if let Err(err) =
            self.policy_guard
                .ensure_current(&mut self.config, &self.cache, &self.config_dir)
        {
            tracing::warn!("Policy upgrade could not be persisted: {}", err);
        }

        let classification = self.matcher.classify(request);
        let fast_result = match classification.verdict {
            FastVerdict::Allow => Some(DecisionResult::allow(
                classification.reason,
                DecisionSource::Fast,
            )),
            FastVerdict::Deny => Some(DecisionResult::deny(
                classification.reason,
                DecisionSource::Fast,
            )),
            FastVerdict::Passthrough => Some(DecisionResult::passthrough(classification.reason)),
            FastVerdict::Unknown => None,
        };
        if let Some(result) = fast_result {
            return self.finish(request, None, result);
        }

        // Unknown: from here on the project root scopes everything
        let project_root = self.projects.resolve_opt(request.cwd.as_deref());

        if self.config.cache.enabled {
            if let Some(entry) =
                self.cache
                    .get(&request.tool_name, &request.tool_input, project_root.as_deref())
            {
                let result = DecisionResult::from_verdict(
                    entry.decision,
                    entry.reason,
                    DecisionSource::Cache,
                );
                return self.finish(request, project_root.as_deref(), result);
            }
        }

        let ruling = self
            .arbiter
            .arbitrate(request, project_root.as_deref(), &self.config.system_prompt)
            .await;

        if self.config.cache.enabled {
            self.cache.set(
                &request.tool_name,
                &request.tool_input,
                ruling.verdict,
                &ruling.reason,
                project_root.as_deref(),
            );
        }

        let result = DecisionResult::from_verdict(ruling.verdict, ruling.reason, DecisionSource::Llm);
        self.finish(request, project_root.as_deref(), result)
    }

    /// The decision cache, for the CLI's list/clear commands
    pub fn cache(&self) -> &DecisionCache {
        &self.cache
    }

    /// The active configuration
    pub fn config(&self) -> &WardenConfig {
        &self.config
    }

    fn finish(
        &self,
        request: &ToolRequest,
        project_root: Option<&Path>,
        result: DecisionResult,
    ) -> DecisionResult {
        tracing::info!(
            target: "audit",
            tool = %request.tool_name,
            session = %request.session_label(),
            project = %project_root.map(|p| p.display().to_string()).unwrap_or_else(|| "-".to_string()),
            source = %result.source,
            decision = %result.decision,
            reason = %result.reason,
            "resolved"
        );
        result
    }
}
