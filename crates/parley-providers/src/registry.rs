//! Provider registry: static specs for the supported OpenAI-compatible APIs.
//!
//! Each `ProviderSpec` describes how to reach a provider: keywords for model
//! matching, the conventional API key env var, the default API base, and the
//! routing prefix users may put in front of a model name.

use std::collections::HashMap;

pub use parley_core::config::schema::ProviderConfig;

// ─────────────────────────────────────────────
// ProviderSpec: static metadata for one provider
// ─────────────────────────────────────────────

/// Static specification describing one provider.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    /// Internal name, matching the config key (e.g. `"groq"`).
    pub name: &'static str,
    /// Keywords to match in lowercase model names. E.g. `&["llama", "mixtral"]`.
    pub keywords: &'static [&'static str],
    /// Conventional environment variable for the API key. E.g. `"GROQ_API_KEY"`.
    pub env_key: &'static str,
    /// Human-readable name for logs. E.g. `"Groq"`.
    pub display_name: &'static str,
    /// Routing prefix stripped before the model name is sent.
    /// E.g. `Some("groq/")` → `"groq/llama3-8b-8192"` is sent as `"llama3-8b-8192"`.
    pub routing_prefix: Option<&'static str>,
    /// Whether this is a gateway/aggregator (OpenRouter).
    /// Gateways accept any model and are used as fallback.
    pub is_gateway: bool,
    /// Whether this is a local/self-hosted provider (vLLM).
    pub is_local: bool,
    /// Default API base URL.
    pub default_api_base: &'static str,
}

/// Supported providers, in matching priority order.
pub static PROVIDERS: &[ProviderSpec] = &[
    // Groq: default backend, hosts Llama/Mixtral/Gemma
    ProviderSpec {
        name: "groq",
        keywords: &["groq", "llama", "mixtral", "gemma"],
        env_key: "GROQ_API_KEY",
        display_name: "Groq",
        routing_prefix: Some("groq/"),
        is_gateway: false,
        is_local: false,
        default_api_base: "https://api.groq.com/openai/v1",
    },
    ProviderSpec {
        name: "openai",
        keywords: &["openai", "gpt"],
        env_key: "OPENAI_API_KEY",
        display_name: "OpenAI",
        routing_prefix: Some("openai/"),
        is_gateway: false,
        is_local: false,
        default_api_base: "https://api.openai.com/v1",
    },
    ProviderSpec {
        name: "deepseek",
        keywords: &["deepseek"],
        env_key: "DEEPSEEK_API_KEY",
        display_name: "DeepSeek",
        routing_prefix: Some("deepseek/"),
        is_gateway: false,
        is_local: false,
        default_api_base: "https://api.deepseek.com/v1",
    },
    // OpenRouter: gateway; model names keep their vendor prefix
    ProviderSpec {
        name: "openrouter",
        keywords: &["openrouter"],
        env_key: "OPENROUTER_API_KEY",
        display_name: "OpenRouter",
        routing_prefix: Some("openrouter/"),
        is_gateway: true,
        is_local: false,
        default_api_base: "https://openrouter.ai/api/v1",
    },
    // vLLM: self-hosted, selected by name only
    ProviderSpec {
        name: "vllm",
        keywords: &["vllm"],
        env_key: "HOSTED_VLLM_API_KEY",
        display_name: "vLLM",
        routing_prefix: Some("vllm/"),
        is_gateway: false,
        is_local: true,
        default_api_base: "http://localhost:8000/v1",
    },
];

// ─────────────────────────────────────────────
// Matching functions
// ─────────────────────────────────────────────

/// Find a provider spec by matching keywords against a model name.
///
/// An explicit routing prefix wins. Otherwise gateways and local providers
/// are skipped: those are fallback only.
pub fn find_by_model(model: &str) -> Option<&'static ProviderSpec> {
    let model_lower = model.to_lowercase();

    if let Some(spec) = PROVIDERS.iter().find(|spec| {
        spec.routing_prefix
            .is_some_and(|prefix| model_lower.starts_with(prefix))
    }) {
        return Some(spec);
    }

    PROVIDERS.iter().find(|spec| {
        !spec.is_gateway
            && !spec.is_local
            && spec.keywords.iter().any(|kw| model_lower.contains(kw))
    })
}

/// Find a provider spec by exact name.
pub fn find_by_name(name: &str) -> Option<&'static ProviderSpec> {
    PROVIDERS.iter().find(|spec| spec.name == name)
}

/// Resolve the model name sent on the wire by stripping the routing prefix.
pub fn resolve_model_name(model: &str, spec: &ProviderSpec) -> String {
    spec.routing_prefix
        .and_then(|prefix| {
            model
                .get(..prefix.len())
                .filter(|head| head.eq_ignore_ascii_case(prefix))
                .map(|_| &model[prefix.len()..])
        })
        .unwrap_or(model)
        .to_string()
}

/// Fill empty API keys from each provider's conventional env var
/// (e.g. `GROQ_API_KEY`). Explicitly configured keys are kept.
pub fn with_env_keys(
    providers: &HashMap<String, ProviderConfig>,
) -> HashMap<String, ProviderConfig> {
    with_keys_from(providers, |var| std::env::var(var).ok())
}

fn with_keys_from(
    providers: &HashMap<String, ProviderConfig>,
    lookup: impl Fn(&str) -> Option<String>,
) -> HashMap<String, ProviderConfig> {
    let mut filled = providers.clone();
    for spec in PROVIDERS {
        let entry = filled.entry(spec.name.to_string()).or_default();
        if entry.is_configured() {
            continue;
        }
        if let Some(key) = lookup(spec.env_key).filter(|k| !k.is_empty()) {
            entry.api_key = key;
        }
    }
    filled
}

/// Match a model name to a configured provider.
///
/// 1. Find by prefix/keyword match, only if that provider has an API key.
/// 2. Fallback to the first configured gateway.
pub fn match_provider<'a>(
    model: &str,
    providers: &'a HashMap<String, ProviderConfig>,
) -> Option<(&'a ProviderConfig, &'static ProviderSpec)> {
    if let Some(spec) = find_by_model(model) {
        if let Some(config) = providers.get(spec.name) {
            if config.is_configured() {
                return Some((config, spec));
            }
        }
    }

    PROVIDERS
        .iter()
        .filter(|s| s.is_gateway)
        .find_map(|spec| {
            providers
                .get(spec.name)
                .filter(|c| c.is_configured())
                .map(|c| (c, spec))
        })
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
