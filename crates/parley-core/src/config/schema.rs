//! Configuration schema.
//!
//! Hierarchy: `Config` → `AgentConfig`, `ProvidersConfig`, `SessionsConfig`, `UiConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::utils;

/// System instruction used when none is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Answer all questions to the best of your ability.";

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration: loaded from `~/.parley/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub agent: AgentConfig,
    pub providers: ProvidersConfig,
    pub sessions: SessionsConfig,
    pub ui: UiConfig,
}

// ─────────────────────────────────────────────
// Agent
// ─────────────────────────────────────────────

/// Model and prompt settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentConfig {
    /// Model identifier, optionally prefixed with a provider (`groq/llama3-8b-8192`).
    pub model: String,
    /// System instruction placed before the history. `{date}` expands to today.
    pub system_prompt: String,
    /// Maximum tokens to generate per response.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "llama3-8b-8192".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tokens: 1024,
            temperature: 0.7,
        }
    }
}

// ─────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────

/// Configuration for a single LLM provider (API key, base URL, headers).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Custom API base URL (overrides provider default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Extra HTTP headers to send with each request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_headers: Option<HashMap<String, String>>,
}

impl ProviderConfig {
    /// Whether this provider has a configured API key.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// All provider configurations, one per supported backend.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvidersConfig {
    pub groq: ProviderConfig,
    pub openai: ProviderConfig,
    pub openrouter: ProviderConfig,
    pub deepseek: ProviderConfig,
    pub vllm: ProviderConfig,
}

impl ProvidersConfig {
    /// Provider names in the order they appear in the config file.
    pub const NAMES: &'static [&'static str] = &["groq", "openai", "openrouter", "deepseek", "vllm"];

    /// Get a provider config by name (e.g. `"groq"`).
    pub fn get_by_name(&self, name: &str) -> Option<&ProviderConfig> {
        match name {
            "groq" => Some(&self.groq),
            "openai" => Some(&self.openai),
            "openrouter" => Some(&self.openrouter),
            "deepseek" => Some(&self.deepseek),
            "vllm" => Some(&self.vllm),
            _ => None,
        }
    }

    pub fn get_by_name_mut(&mut self, name: &str) -> Option<&mut ProviderConfig> {
        match name {
            "groq" => Some(&mut self.groq),
            "openai" => Some(&mut self.openai),
            "openrouter" => Some(&mut self.openrouter),
            "deepseek" => Some(&mut self.deepseek),
            "vllm" => Some(&mut self.vllm),
            _ => None,
        }
    }

    /// Convert to a map keyed by provider name, for the provider registry.
    pub fn to_map(&self) -> HashMap<String, ProviderConfig> {
        Self::NAMES
            .iter()
            .filter_map(|name| {
                self.get_by_name(name)
                    .map(|config| (name.to_string(), config.clone()))
            })
            .collect()
    }
}

// ─────────────────────────────────────────────
// Sessions
// ─────────────────────────────────────────────

/// Session persistence settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionsConfig {
    /// Mirror each session to a file. When false, history lives only in memory.
    pub persist: bool,
    /// Directory holding one `.json` file per session.
    pub dir: String,
}

impl SessionsConfig {
    /// The sessions directory with `~` expanded.
    pub fn dir_path(&self) -> PathBuf {
        utils::expand_home(&self.dir)
    }
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            persist: true,
            dir: "~/.parley/sessions".to_string(),
        }
    }
}

// ─────────────────────────────────────────────
// UI
// ─────────────────────────────────────────────

/// Terminal rendering settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UiConfig {
    /// Per-character delay of the typing animation for replies. 0 prints at once.
    pub typing_delay_ms: u64,
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
