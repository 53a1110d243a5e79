//! Configuration
//!
//! One JSON document holding the arbitration endpoint parameters, the
//! active system prompt and its policy version, cache settings, and the
//! user's extra pattern rules. Loaded once per process; only the policy
//! guard ever writes it back.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::{WardenError, WardenResult};
use crate::policy;
use crate::rules::CustomRule;

/// Environment variable overriding the config directory (used by tests)
pub const CONFIG_DIR_ENV: &str = "TOOLWARDEN_CONFIG_DIR";

const CONFIG_FILE: &str = "config.json";
const CACHE_FILE: &str = "cache.json";

/// Arbitration endpoint parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible chat-completions API
    pub api_base: String,
    /// API key; prefer `api_key_env` so the key stays out of the file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub model: String,
    /// Hard bound on one arbitration request, in seconds
    pub timeout_secs: u64,
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: None,
            api_key_env: "TOOLWARDEN_API_KEY".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 20,
            max_tokens: 256,
        }
    }
}

impl LlmConfig {
    /// The API key from the config value or the named environment variable
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| env::var(&self.api_key_env).ok())
    }
}

/// Decision cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Maximum age of a cached ruling, in hours
    pub ttl_hours: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_hours: 24 * 30,
        }
    }
}

/// User-defined pattern rules layered on the built-ins
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleTables {
    #[serde(default)]
    pub allow: Vec<CustomRule>,
    #[serde(default)]
    pub deny: Vec<CustomRule>,
    #[serde(default)]
    pub passthrough: Vec<CustomRule>,
}

/// The persisted configuration document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WardenConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    /// System prompt sent to the arbiter; managed by the policy guard
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// Version of the system prompt; monotonic, compared against the
    /// compiled-in current version on startup
    #[serde(default)]
    pub policy_version: u32,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub rules: RuleTables,
}

fn default_system_prompt() -> String {
    policy::SYSTEM_PROMPT.to_string()
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            system_prompt: default_system_prompt(),
            policy_version: policy::CURRENT_POLICY_VERSION,
            cache: CacheConfig::default(),
            rules: RuleTables::default(),
        }
    }
}

impl WardenConfig {
    /// The config directory: `$TOOLWARDEN_CONFIG_DIR`, or the platform
    /// config dir plus `toolwarden`
    pub fn default_dir() -> WardenResult<PathBuf> {
        if let Ok(dir) = env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }
        dirs::config_dir()
            .map(|base| base.join("toolwarden"))
            .ok_or_else(|| WardenError::config("no config directory available on this platform"))
    }

    /// Path of the config document inside a directory
    pub fn config_path(dir: &Path) -> PathBuf {
        dir.join(CONFIG_FILE)
    }

    /// Path of the cache document inside a directory
    pub fn cache_path(dir: &Path) -> PathBuf {
        dir.join(CACHE_FILE)
    }

    /// Load the config from a directory, falling back to defaults
    ///
    /// An absent document means first run; a malformed one is treated the
    /// same way rather than blocking resolution. A fresh default config
    /// still carries the current policy version, so no spurious upgrade
    /// is triggered.
    pub fn load(dir: &Path) -> Self {
        let path = Self::config_path(dir);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&raw) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(
                    "Config at {} is unreadable, using defaults: {}",
                    path.display(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Persist the config document
    pub fn save(&self, dir: &Path) -> WardenResult<()> {
        fs::create_dir_all(dir)?;
        let path = Self::config_path(dir);
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
