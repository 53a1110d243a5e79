//! LLM arbitration tier
//!
//! One bounded request to a chat-completions endpoint with the policy
//! system prompt. The response must be a strict `{decision, reason}`
//! object; anything else, a transport failure, or a timeout resolves to
//! deny with a category reason. Single attempt, no retry, and no fault
//! ever crosses this boundary.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::core::{ToolRequest, Verdict};

/// Longest serialized tool input forwarded to the arbiter
const MAX_INPUT_CHARS: usize = 4000;

/// The arbiter's ruling on one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArbiterRuling {
    pub verdict: Verdict,
    pub reason: String,
}

impl ArbiterRuling {
    /// The fail-closed outcome for any arbitration failure
    fn fail_closed(reason: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Deny,
            reason: reason.into(),
        }
    }
}

/// Arbitration seam
///
/// The resolver only sees this trait; tests substitute a stub so no
/// network is involved.
#[async_trait]
pub trait Arbiter: Send + Sync {
    /// Rule on one request. Must not fail: every internal failure maps
    /// to a deny ruling with a descriptive reason.
    async fn arbitrate(
        &self,
        request: &ToolRequest,
        project_root: Option<&Path>,
        system_prompt: &str,
    ) -> ArbiterRuling;
}

// ============================================================================
// Chat-completions wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Expected shape of the arbiter's answer
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RulingPayload {
    decision: Verdict,
    reason: String,
}

// ============================================================================
// LlmArbiter
// ============================================================================

/// Production arbiter backed by an OpenAI-compatible endpoint
pub struct LlmArbiter {
    client: Client,
    config: LlmConfig,
}

impl LlmArbiter {
    /// Build an arbiter; the request timeout is baked into the client
    pub fn new(config: LlmConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            // Building a client with a timeout does not touch the network;
            // failure here means a broken TLS environment.
            .unwrap_or_else(|_| Client::new());
        Self { client, config }
    }

    async fn request_ruling(
        &self,
        request: &ToolRequest,
        project_root: Option<&Path>,
        system_prompt: &str,
    ) -> ArbiterRuling {
        let api_key = match self.config.resolve_api_key() {
            Some(key) => key,
            None => {
                return ArbiterRuling::fail_closed(
                    "arbiter unavailable: no API key configured",
                )
            }
        };

        let body = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: build_user_message(request, project_root),
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: 0.0,
        };

        let url = format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        );
        tracing::debug!("Arbitrating '{}' via {}", request.tool_name, url);

        let response = match self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) if err.is_timeout() => {
                tracing::warn!("Arbitration timed out after {}s", self.config.timeout_secs);
                return ArbiterRuling::fail_closed("arbitration timed out");
            }
            Err(err) => {
                tracing::warn!("Arbitration transport failure: {}", err);
                return ArbiterRuling::fail_closed("arbitration endpoint unreachable");
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!("Arbitration endpoint returned HTTP {}", status);
            return ArbiterRuling::fail_closed(format!(
                "arbitration endpoint returned HTTP {}",
                status.as_u16()
            ));
        }

        let parsed: ChatResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!("Arbitration response body unreadable: {}", err);
                return ArbiterRuling::fail_closed("arbitration response was not readable");
            }
        };

        let content = match parsed.choices.first() {
            Some(choice) => choice.message.content.as_str(),
            None => return ArbiterRuling::fail_closed("arbitration response had no content"),
        };

        match parse_ruling(content) {
            Some(ruling) => ruling,
            None => {
                tracing::warn!("Arbitration response did not match the decision contract");
                ArbiterRuling::fail_closed("arbitration response was not a valid decision")
            }
        }
    }
}

#[async_trait]
impl Arbiter for LlmArbiter {
    async fn arbitrate(
        &self,
        request: &ToolRequest,
        project_root: Option<&Path>,
        system_prompt: &str,
    ) -> ArbiterRuling {
        self.request_ruling(request, project_root, system_prompt).await
    }
}

/// Build the structured user message for one request
fn build_user_message(request: &ToolRequest, project_root: Option<&Path>) -> String {
    let mut input = serde_json::to_string_pretty(&request.tool_input)
        .unwrap_or_else(|_| request.tool_input.to_string());
    if input.chars().count() > MAX_INPUT_CHARS {
        input = input.chars().take(MAX_INPUT_CHARS).collect();
        input.push_str("\n... (truncated)");
    }
    let project = project_root
        .map(|root| root.to_string_lossy().into_owned())
        .unwrap_or_else(|| "none".to_string());

    format!(
        "Tool: {}\nProject root: {}\nTool input:\n{}",
        request.tool_name, project, input
    )
}

/// Parse the model's answer into a ruling
///
/// Accepts the bare JSON object, optionally wrapped in a fenced code
/// block. Anything else is a contract violation and returns `None`.
fn parse_ruling(content: &str) -> Option<ArbiterRuling> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end_matches("```").trim())
        .unwrap_or(trimmed);

    let payload: RulingPayload = serde_json::from_str(body).ok()?;
    if payload.reason.trim().is_empty() {
        return None;
    }
    Some(ArbiterRuling {
        verdict: payload.decision,
        reason: payload.reason,
    })
}
