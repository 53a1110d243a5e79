//! Tool request type
//!
//! One `ToolRequest` per hook invocation. The tool input is kept as an
//! opaque JSON object; only rules that explicitly inspect a field (e.g.
//! `command` for shell tools) assume anything about its contents.

use serde_json::Value;

use super::error::{WardenError, WardenResult};

/// A single tool-execution request awaiting a decision
#[derive(Debug, Clone)]
pub struct ToolRequest {
    /// Name of the tool being invoked (e.g. "Bash", "Write")
    pub tool_name: String,
    /// Tool input payload; always a JSON object
    pub tool_input: Value,
    /// Working directory of the calling agent, if known
    pub cwd: Option<String>,
    /// Session identifier from the caller, for audit logs
    pub session_id: Option<String>,
}

impl ToolRequest {
    /// Create a request, validating the input payload shape
    pub fn new(tool_name: impl Into<String>, tool_input: Value) -> WardenResult<Self> {
        let tool_name = tool_name.into();
        if tool_name.trim().is_empty() {
            return Err(WardenError::invalid_request("tool_name must not be empty"));
        }
        if !tool_input.is_object() {
            return Err(WardenError::invalid_request(format!(
                "tool_input for '{}' must be a JSON object",
                tool_name
            )));
        }
        Ok(Self {
            tool_name,
            tool_input,
            cwd: None,
            session_id: None,
        })
    }

    /// Set the working directory
    pub fn with_cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Set the session ID
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// The `command` field of the input, if present
    ///
    /// Shell tools carry their command line here; other tools usually don't.
    pub fn command(&self) -> Option<&str> {
        self.tool_input.get("command").and_then(Value::as_str)
    }

    /// The session ID or "-" for logging
    pub fn session_label(&self) -> &str {
        self.session_id.as_deref().unwrap_or("-")
    }
}
