//! Decision types
//!
//! The closed outcome sets for each tier of the pipeline:
//! - `FastVerdict` - what the static rule matcher can say
//! - `Verdict` - a security ruling (allow/deny), the only thing the cache stores
//! - `DecisionResult` - the terminal output of one resolution

use serde::{Deserialize, Serialize};

/// Terminal decision for a tool request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Execute the tool without asking
    Allow,
    /// Block the tool call
    Deny,
    /// Defer to the caller's own confirmation flow
    Passthrough,
}

impl Decision {
    /// Lowercase string for JSON output and logs
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Deny => "deny",
            Decision::Passthrough => "passthrough",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A binary security ruling
///
/// Produced by the LLM arbiter and stored in the decision cache.
/// Passthrough is deliberately not representable here: deferrals are
/// not security decisions and must never be cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Allow,
    Deny,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Allow => "allow",
            Verdict::Deny => "deny",
        }
    }
}

impl From<Verdict> for Decision {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Allow => Decision::Allow,
            Verdict::Deny => Decision::Deny,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of the fast rule tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FastVerdict {
    /// A built-in or custom allow rule matched
    Allow,
    /// A built-in or custom deny rule matched
    Deny,
    /// A custom passthrough rule matched
    Passthrough,
    /// No rule matched; defer to the cache and LLM tiers
    Unknown,
}

impl FastVerdict {
    /// Whether this verdict terminates the pipeline
    pub fn is_definitive(self) -> bool {
        !matches!(self, FastVerdict::Unknown)
    }
}

/// Which tier produced the decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionSource {
    /// Static rule matcher
    Fast,
    /// Persistent decision cache
    Cache,
    /// LLM arbiter
    Llm,
}

impl DecisionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            DecisionSource::Fast => "fast",
            DecisionSource::Cache => "cache",
            DecisionSource::Llm => "llm",
        }
    }
}

impl std::fmt::Display for DecisionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The terminal output of one resolution
#[derive(Debug, Clone)]
pub struct DecisionResult {
    pub decision: Decision,
    pub reason: String,
    pub source: DecisionSource,
}

impl DecisionResult {
    /// Create an allow result
    pub fn allow(reason: impl Into<String>, source: DecisionSource) -> Self {
        Self {
            decision: Decision::Allow,
            reason: reason.into(),
            source,
        }
    }

    /// Create a deny result
    pub fn deny(reason: impl Into<String>, source: DecisionSource) -> Self {
        Self {
            decision: Decision::Deny,
            reason: reason.into(),
            source,
        }
    }

    /// Create a passthrough result (always fast-tier)
    pub fn passthrough(reason: impl Into<String>) -> Self {
        Self {
            decision: Decision::Passthrough,
            reason: reason.into(),
            source: DecisionSource::Fast,
        }
    }

    /// Build a result from a cached or arbitrated ruling
    pub fn from_verdict(verdict: Verdict, reason: impl Into<String>, source: DecisionSource) -> Self {
        Self {
            decision: verdict.into(),
            reason: reason.into(),
            source,
        }
    }
}
