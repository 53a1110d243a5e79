//! Hook wire protocol
//!
//! One request on stdin, one response on stdout. Deny is a well-formed,
//! successful response; only malformed input to the process itself exits
//! non-zero, so the caller can tell a broken hook from a denied tool.
//! Passthrough stays silent and lets the caller's own confirmation flow
//! take over.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::AsyncReadExt;

use crate::core::{Decision, DecisionResult, ToolRequest, WardenError, WardenResult};
use crate::resolver::DecisionResolver;

/// Exit code signalling a hook malfunction to the caller
pub const EXIT_MALFORMED_INPUT: i32 = 2;

/// The request document read from stdin
#[derive(Debug, Clone, Deserialize)]
pub struct HookInput {
    pub tool_name: String,
    pub tool_input: Value,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// The response envelope written to stdout
#[derive(Debug, Serialize)]
pub struct HookOutput {
    #[serde(rename = "hookSpecificOutput")]
    hook_specific_output: HookSpecificOutput,
}

#[derive(Debug, Serialize)]
struct HookSpecificOutput {
    decision: BehaviorDecision,
}

#[derive(Debug, Serialize)]
struct BehaviorDecision {
    behavior: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl HookOutput {
    pub fn allow() -> Self {
        Self {
            hook_specific_output: HookSpecificOutput {
                decision: BehaviorDecision {
                    behavior: "allow",
                    message: None,
                },
            },
        }
    }

    pub fn deny(message: impl Into<String>) -> Self {
        Self {
            hook_specific_output: HookSpecificOutput {
                decision: BehaviorDecision {
                    behavior: "deny",
                    message: Some(message.into()),
                },
            },
        }
    }

    /// The response for a decision; `None` means passthrough silence
    pub fn from_result(result: &DecisionResult) -> Option<Self> {
        match result.decision {
            Decision::Allow => Some(Self::allow()),
            Decision::Deny => Some(Self::deny(result.reason.clone())),
            Decision::Passthrough => None,
        }
    }

    pub fn to_json(&self) -> String {
        // The envelope contains only strings; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"hookSpecificOutput":{"decision":{"behavior":"deny","message":"response serialization failed"}}}"#.to_string()
        })
    }
}

/// Parse and validate one request document
pub fn parse_request(raw: &str) -> WardenResult<ToolRequest> {
    let input: HookInput = serde_json::from_str(raw)
        .map_err(|err| WardenError::invalid_request(format!("unparseable request: {}", err)))?;

    let mut request = ToolRequest::new(input.tool_name, input.tool_input)?;
    if let Some(cwd) = input.cwd {
        request = request.with_cwd(cwd);
    }
    if let Some(session_id) = input.session_id {
        request = request.with_session_id(session_id);
    }
    Ok(request)
}

/// Run one hook invocation end to end; returns the process exit code
///
/// Every failure path degrades to deny. A malformed request still gets a
/// deny response but exits non-zero so the caller knows the hook itself
/// misbehaved, not the tool.
pub async fn run(config_dir: &Path) -> i32 {
    let mut raw = String::new();
    if let Err(err) = tokio::io::stdin().read_to_string(&mut raw).await {
        emit(&HookOutput::deny(format!("could not read request: {}", err)));
        return EXIT_MALFORMED_INPUT;
    }

    let request = match parse_request(&raw) {
        Ok(request) => request,
        Err(err) => {
            // Never passthrough here: an ambiguous request must not be
            // handed to a possibly-absent fallback.
            emit(&HookOutput::deny(err.to_string()));
            return EXIT_MALFORMED_INPUT;
        }
    };

    let dir = config_dir.to_path_buf();
    let resolved = tokio::spawn(async move {
        let mut resolver = DecisionResolver::new(&dir);
        resolver.resolve(&request).await
    })
    .await;

    match resolved {
        Ok(result) => {
            if let Some(output) = HookOutput::from_result(&result) {
                emit(&output);
            }
            0
        }
        Err(err) => {
            // A panic anywhere in the pipeline lands here; the caller
            // still gets a well-formed deny.
            tracing::error!("Resolution panicked: {}", err);
            emit(&HookOutput::deny("internal error during resolution"));
            0
        }
    }
}

fn emit(output: &HookOutput) {
    println!("{}", output.to_json());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_request() {
        let raw = r#"{
            "tool_name": "Bash",
            "tool_input": {"command": "git status"},
            "cwd": "/work/repo",
            "session_id": "s-42"
        }"#;
        let request = parse_request(raw).unwrap();
        assert_eq!(request.tool_name, "Bash");
        assert_eq!(request.command(), Some("git status"));
        assert_eq!(request.cwd.as_deref(), Some("/work/repo"));
        assert_eq!(request.session_id.as_deref(), Some("s-42"));
    }

    #[test]
    fn test_parse_minimal_request() {
        let raw = r#"{"tool_name": "Read", "tool_input": {}}"#;
        let request = parse_request(raw).unwrap();
        assert_eq!(request.cwd, None);
        assert_eq!(request.session_id, None);
    }

    #[test]
    fn test_parse_rejects_non_json() {
        let err = parse_request("not json").unwrap_err();
        assert!(err.to_string().contains("unparseable request"));
    }

    #[test]
    fn test_parse_rejects_non_object_input() {
        let raw = r#"{"tool_name": "Bash", "tool_input": "rm -rf /"}"#;
        assert!(parse_request(raw).is_err());
    }

    #[test]
    fn test_parse_rejects_missing_tool_name() {
        let raw = r#"{"tool_input": {}}"#;
        assert!(parse_request(raw).is_err());
    }

    #[test]
    fn test_allow_envelope() {
        assert_eq!(
            HookOutput::allow().to_json(),
            r#"{"hookSpecificOutput":{"decision":{"behavior":"allow"}}}"#
        );
    }

    #[test]
    fn test_deny_envelope_carries_message() {
        let json = HookOutput::deny("blocked by built-in rule").to_json();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value["hookSpecificOutput"]["decision"]["behavior"],
            json!("deny")
        );
        assert_eq!(
            value["hookSpecificOutput"]["decision"]["message"],
            json!("blocked by built-in rule")
        );
    }

    #[test]
    fn test_passthrough_emits_nothing() {
        let result = DecisionResult::passthrough("deferred");
        assert!(HookOutput::from_result(&result).is_none());
    }
}
