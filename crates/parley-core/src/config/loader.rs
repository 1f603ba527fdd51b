//! Config loader: reads `~/.parley/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.parley/config.json`
//! 3. Environment variables `PARLEY_<SECTION>__<FIELD>` (override JSON)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::{Config, ProviderConfig, ProvidersConfig};

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from `path` (or the default path) + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);
    apply_env_overrides(load_config_from_path(&config_path))
}

/// Read and parse a config file without env overrides.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return Config::default();
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return Config::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to parse config {}: {}", path.display(), e);
            Config::default()
        }
    }
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `PARLEY_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `PARLEY_AGENT__MODEL`, `PARLEY_AGENT__SYSTEM_PROMPT`
/// - `PARLEY_AGENT__MAX_TOKENS`, `PARLEY_AGENT__TEMPERATURE`
/// - `PARLEY_PROVIDERS__<NAME>__API_KEY`, `PARLEY_PROVIDERS__<NAME>__API_BASE`
/// - `PARLEY_SESSIONS__PERSIST`, `PARLEY_SESSIONS__DIR`
/// - `PARLEY_UI__TYPING_DELAY_MS`
fn apply_env_overrides(config: Config) -> Config {
    apply_overrides_from(config, |key| std::env::var(key).ok())
}

fn apply_overrides_from(mut config: Config, lookup: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(val) = lookup("PARLEY_AGENT__MODEL") {
        config.agent.model = val;
    }
    if let Some(val) = lookup("PARLEY_AGENT__SYSTEM_PROMPT") {
        config.agent.system_prompt = val;
    }
    if let Some(n) = parse_var::<u32>(&lookup, "PARLEY_AGENT__MAX_TOKENS") {
        config.agent.max_tokens = n;
    }
    if let Some(t) = parse_var::<f64>(&lookup, "PARLEY_AGENT__TEMPERATURE") {
        config.agent.temperature = t;
    }

    for name in ProvidersConfig::NAMES {
        if let Some(provider) = config.providers.get_by_name_mut(name) {
            apply_provider_overrides(provider, &name.to_uppercase(), &lookup);
        }
    }

    if let Some(val) = lookup("PARLEY_SESSIONS__PERSIST") {
        config.sessions.persist = val == "true" || val == "1";
    }
    if let Some(val) = lookup("PARLEY_SESSIONS__DIR") {
        config.sessions.dir = val;
    }

    if let Some(ms) = parse_var::<u64>(&lookup, "PARLEY_UI__TYPING_DELAY_MS") {
        config.ui.typing_delay_ms = ms;
    }

    config
}

/// Apply overrides for a single provider.
fn apply_provider_overrides(
    provider: &mut ProviderConfig,
    name: &str,
    lookup: &impl Fn(&str) -> Option<String>,
) {
    if let Some(val) = lookup(format!("PARLEY_PROVIDERS__{name}__API_KEY").as_str()) {
        provider.api_key = val;
    }
    if let Some(val) = lookup(format!("PARLEY_PROVIDERS__{name}__API_BASE").as_str()) {
        provider.api_base = Some(val);
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Ignoring {}: cannot parse {:?}", key, raw);
            None
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp_json(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_missing_file() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.json"));
        assert_eq!(config.agent.max_tokens, 1024);
        assert!(config.sessions.persist);
    }

    #[test]
    fn test_load_valid_json() {
        let file = write_temp_json(
            r#"{
            "agent": { "model": "deepseek-chat", "maxTokens": 2048 },
            "providers": { "deepseek": { "apiKey": "ds-123" } }
        }"#,
        );

        let config = load_config_from_path(file.path());
        assert_eq!(config.agent.model, "deepseek-chat");
        assert_eq!(config.agent.max_tokens, 2048);
        assert_eq!(config.providers.deepseek.api_key, "ds-123");
        // Default preserved
        assert_eq!(config.agent.temperature, 0.7);
    }

    #[test]
    fn test_load_invalid_json_returns_defaults() {
        let file = write_temp_json("not valid json {{{");
        let config = load_config_from_path(file.path());
        assert_eq!(config.agent.model, "llama3-8b-8192");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.agent.system_prompt = "Talk like a pirate.".to_string();
        config.providers.groq.api_key = "gsk-test".to_string();
        config.sessions.persist = false;

        save_config(&config, Some(&path)).unwrap();

        let reloaded = load_config_from_path(&path);
        assert_eq!(reloaded.agent.system_prompt, "Talk like a pirate.");
        assert_eq!(reloaded.providers.groq.api_key, "gsk-test");
        assert!(!reloaded.sessions.persist);
    }

    #[test]
    fn test_saved_json_uses_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        save_config(&Config::default(), Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert!(raw["agent"].get("systemPrompt").is_some());
        assert!(raw["agent"].get("system_prompt").is_none());
    }

    fn overrides(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        apply_overrides_from(Config::default(), |key| vars.get(key).cloned())
    }

    #[test]
    fn test_env_override_model() {
        let config = overrides(&[("PARLEY_AGENT__MODEL", "test-model")]);
        assert_eq!(config.agent.model, "test-model");
    }

    #[test]
    fn test_env_override_provider_key() {
        let config = overrides(&[
            ("PARLEY_PROVIDERS__OPENROUTER__API_KEY", "sk-or-env"),
            ("PARLEY_PROVIDERS__OPENROUTER__API_BASE", "http://localhost:9999/v1"),
        ]);
        assert_eq!(config.providers.openrouter.api_key, "sk-or-env");
        assert_eq!(
            config.providers.openrouter.api_base.as_deref(),
            Some("http://localhost:9999/v1")
        );
        // Other providers untouched
        assert!(config.providers.groq.api_key.is_empty());
    }

    #[test]
    fn test_env_override_sessions_and_ui() {
        let config = overrides(&[
            ("PARLEY_SESSIONS__PERSIST", "0"),
            ("PARLEY_SESSIONS__DIR", "/tmp/parley-sessions"),
            ("PARLEY_UI__TYPING_DELAY_MS", "12"),
        ]);
        assert!(!config.sessions.persist);
        assert_eq!(config.sessions.dir, "/tmp/parley-sessions");
        assert_eq!(config.ui.typing_delay_ms, 12);
    }

    #[test]
    fn test_env_override_unparseable_is_ignored() {
        let config = overrides(&[
            ("PARLEY_AGENT__TEMPERATURE", "warm"),
            ("PARLEY_AGENT__MAX_TOKENS", "2048"),
        ]);
        assert_eq!(config.agent.temperature, 0.7);
        assert_eq!(config.agent.max_tokens, 2048);
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let config = overrides(&[]);
        assert_eq!(config.agent.model, Config::default().agent.model);
        assert!(config.sessions.persist);
    }
}
