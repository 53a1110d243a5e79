//! Rule matcher
//!
//! Compiles the built-in tables plus user-defined patterns once, then
//! classifies requests with no further allocation-heavy work. The one
//! load-bearing invariant: every deny pattern is evaluated before any
//! allow or passthrough pattern, so a destructive match can never be
//! shadowed by a benign one.

use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::{FastVerdict, ToolRequest};

use super::builtin::{ALWAYS_ALLOW_TOOLS, BUILTIN_DENY_PATTERNS};

/// A user-defined pattern rule from the config document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomRule {
    /// Tool name this rule applies to; `None` matches every tool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    /// Regex matched against the normalized command text, or against the
    /// serialized tool input for tools without a `command` field
    pub pattern: String,
    /// Reason reported when this rule decides the request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A compiled rule ready for matching
struct CompiledRule {
    tool: Option<String>,
    regex: Regex,
    reason: String,
}

impl CompiledRule {
    fn matches(&self, tool_name: &str, text: &str) -> bool {
        if let Some(tool) = &self.tool {
            if tool != tool_name {
                return false;
            }
        }
        self.regex.is_match(text)
    }
}

/// Classification of one request by the fast tier
#[derive(Debug, Clone)]
pub struct Classification {
    pub verdict: FastVerdict,
    pub reason: String,
}

impl Classification {
    fn new(verdict: FastVerdict, reason: impl Into<String>) -> Self {
        Self {
            verdict,
            reason: reason.into(),
        }
    }
}

/// The fast-tier pattern classifier
pub struct RuleMatcher {
    allow_tools: HashSet<&'static str>,
    builtin_deny: Vec<CompiledRule>,
    custom_deny: Vec<CompiledRule>,
    custom_allow: Vec<CompiledRule>,
    custom_passthrough: Vec<CompiledRule>,
}

impl RuleMatcher {
    /// Build a matcher from the built-in tables plus user-defined rules
    ///
    /// User patterns that fail to compile are skipped with a warning; a
    /// dropped pattern can only make the outcome stricter, since the
    /// built-in deny table always applies.
    pub fn new(allow: &[CustomRule], deny: &[CustomRule], passthrough: &[CustomRule]) -> Self {
        let builtin_deny = BUILTIN_DENY_PATTERNS
            .iter()
            .map(|(pattern, reason)| CompiledRule {
                tool: None,
                // Built-in patterns are covered by tests; a compile failure
                // here is a programming error, not a runtime condition.
                regex: Regex::new(pattern).expect("built-in deny pattern must compile"),
                reason: (*reason).to_string(),
            })
            .collect();

        Self {
            allow_tools: ALWAYS_ALLOW_TOOLS.iter().copied().collect(),
            builtin_deny,
            custom_deny: compile_custom(deny, "deny"),
            custom_allow: compile_custom(allow, "allow"),
            custom_passthrough: compile_custom(passthrough, "passthrough"),
        }
    }

    /// A matcher with built-in rules only
    pub fn builtin_only() -> Self {
        Self::new(&[], &[], &[])
    }

    /// Classify a request into the fast-tier outcome set
    ///
    /// Pure and synchronous. Returns `Unknown` for anything no rule
    /// covers, deferring to the cache and LLM tiers.
    pub fn classify(&self, request: &ToolRequest) -> Classification {
        let command = request.command().map(normalize_command);
        // For tools without a command line, custom rules match against the
        // serialized input so path-based rules still work.
        let subject = match &command {
            Some(cmd) => cmd.clone(),
            None => request.tool_input.to_string(),
        };

        // Deny first, always. Both tables run before any allow rule is
        // even looked at.
        if let Some(cmd) = &command {
            for rule in &self.builtin_deny {
                if rule.regex.is_match(cmd) {
                    return Classification::new(
                        FastVerdict::Deny,
                        format!("blocked by built-in rule: {}", rule.reason),
                    );
                }
            }
        }
        for rule in &self.custom_deny {
            if rule.matches(&request.tool_name, &subject) {
                return Classification::new(FastVerdict::Deny, rule.reason.clone());
            }
        }

        if self.allow_tools.contains(request.tool_name.as_str()) {
            return Classification::new(
                FastVerdict::Allow,
                format!("'{}' is a read-only or interactive tool", request.tool_name),
            );
        }
        for rule in &self.custom_allow {
            if rule.matches(&request.tool_name, &subject) {
                return Classification::new(FastVerdict::Allow, rule.reason.clone());
            }
        }

        for rule in &self.custom_passthrough {
            if rule.matches(&request.tool_name, &subject) {
                return Classification::new(FastVerdict::Passthrough, rule.reason.clone());
            }
        }

        Classification::new(FastVerdict::Unknown, "no static rule matched")
    }
}

fn compile_custom(rules: &[CustomRule], table: &str) -> Vec<CompiledRule> {
    rules
        .iter()
        .filter_map(|rule| match Regex::new(&rule.pattern) {
            Ok(regex) => Some(CompiledRule {
                tool: rule.tool.clone(),
                regex,
                reason: rule
                    .reason
                    .clone()
                    .unwrap_or_else(|| format!("matched custom {} rule '{}'", table, rule.pattern)),
            }),
            Err(err) => {
                tracing::warn!(
                    "Skipping invalid custom {} pattern '{}': {}",
                    table,
                    rule.pattern,
                    err
                );
                None
            }
        })
        .collect()
}

/// Collapse whitespace runs so patterns see one canonical spacing
fn normalize_command(command: &str) -> String {
    command.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(tool: &str, input: serde_json::Value) -> ToolRequest {
        ToolRequest::new(tool, input).unwrap()
    }

    fn allow_rule(tool: Option<&str>, pattern: &str) -> CustomRule {
        CustomRule {
            tool: tool.map(String::from),
            pattern: pattern.to_string(),
            reason: None,
        }
    }

    #[test]
    fn test_always_allow_tools() {
        let matcher = RuleMatcher::builtin_only();
        for tool in ["Read", "Glob", "Grep", "TodoWrite"] {
            let result = matcher.classify(&request(tool, json!({})));
            assert_eq!(result.verdict, FastVerdict::Allow, "tool {}", tool);
        }
    }

    #[test]
    fn test_builtin_deny_rm_root() {
        let matcher = RuleMatcher::builtin_only();
        let result = matcher.classify(&request("Bash", json!({"command": "rm -rf /"})));
        assert_eq!(result.verdict, FastVerdict::Deny);
        assert!(result.reason.contains("filesystem root"));
    }

    #[test]
    fn test_unknown_for_unscoped_shell() {
        let matcher = RuleMatcher::builtin_only();
        let result = matcher.classify(&request("Bash", json!({"command": "cargo build"})));
        assert_eq!(result.verdict, FastVerdict::Unknown);
    }

    #[test]
    fn test_unknown_for_unrecognized_tool() {
        let matcher = RuleMatcher::builtin_only();
        let result = matcher.classify(&request("Write", json!({"file_path": "/tmp/x"})));
        assert_eq!(result.verdict, FastVerdict::Unknown);
    }

    #[test]
    fn test_deny_wins_over_custom_allow() {
        // A broad allow pattern that also covers a destructive command
        let matcher = RuleMatcher::new(&[allow_rule(Some("Bash"), r"^rm\b")], &[], &[]);
        let result = matcher.classify(&request("Bash", json!({"command": "rm -rf /"})));
        assert_eq!(result.verdict, FastVerdict::Deny);

        // The same allow pattern still works where no deny rule matches
        let result = matcher.classify(&request("Bash", json!({"command": "rm stale.log"})));
        assert_eq!(result.verdict, FastVerdict::Allow);
    }

    #[test]
    fn test_custom_deny_wins_over_custom_allow() {
        let deny = CustomRule {
            tool: None,
            pattern: r"\.env\b".to_string(),
            reason: Some("touches environment secrets".to_string()),
        };
        let matcher = RuleMatcher::new(&[allow_rule(Some("Bash"), r"^cat\b")], &[deny], &[]);
        let result = matcher.classify(&request("Bash", json!({"command": "cat .env"})));
        assert_eq!(result.verdict, FastVerdict::Deny);
        assert_eq!(result.reason, "touches environment secrets");
    }

    #[test]
    fn test_custom_passthrough() {
        let passthrough = CustomRule {
            tool: Some("Bash".to_string()),
            pattern: r"^docker\b".to_string(),
            reason: Some("container commands go to the native prompt".to_string()),
        };
        let matcher = RuleMatcher::new(&[], &[], &[passthrough]);
        let result = matcher.classify(&request("Bash", json!({"command": "docker ps"})));
        assert_eq!(result.verdict, FastVerdict::Passthrough);
    }

    #[test]
    fn test_custom_rule_on_non_command_tool() {
        // No command field: the rule matches the serialized input instead
        let deny = CustomRule {
            tool: Some("Write".to_string()),
            pattern: r"\.ssh/".to_string(),
            reason: Some("writes into .ssh".to_string()),
        };
        let matcher = RuleMatcher::new(&[], &[deny], &[]);
        let result = matcher.classify(&request(
            "Write",
            json!({"file_path": "/home/u/.ssh/config", "content": "x"}),
        ));
        assert_eq!(result.verdict, FastVerdict::Deny);
    }

    #[test]
    fn test_invalid_custom_pattern_is_skipped() {
        let broken = allow_rule(None, "([unclosed");
        let matcher = RuleMatcher::new(&[broken], &[], &[]);
        let result = matcher.classify(&request("Bash", json!({"command": "ls"})));
        assert_eq!(result.verdict, FastVerdict::Unknown);
    }

    #[test]
    fn test_whitespace_normalization() {
        let matcher = RuleMatcher::builtin_only();
        let result = matcher.classify(&request("Bash", json!({"command": "rm   -rf    /"})));
        assert_eq!(result.verdict, FastVerdict::Deny);
    }

    #[test]
    fn test_tool_scoped_rule_does_not_leak() {
        let matcher = RuleMatcher::new(&[allow_rule(Some("Bash"), r"^git status")], &[], &[]);
        let result = matcher.classify(&request("OtherTool", json!({"command": "git status"})));
        assert_eq!(result.verdict, FastVerdict::Unknown);
    }
}
