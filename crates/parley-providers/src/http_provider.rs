//! Generic HTTP chat model for OpenAI-compatible APIs.
//!
//! Talks directly to any `/chat/completions` endpoint: Groq, OpenAI,
//! DeepSeek, OpenRouter, self-hosted vLLM.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, error, warn};

use parley_core::error::{ConfigError, ModelCallError};
use parley_core::types::{ChatCompletionRequest, ChatCompletionResponse, PromptMessage};

use crate::registry::{resolve_model_name, ProviderConfig, ProviderSpec};
use crate::traits::{ChatModel, LlmRequestConfig};

/// Upper bound on a single completion request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

// ─────────────────────────────────────────────
// HttpProvider
// ─────────────────────────────────────────────

/// A chat model that talks to any OpenAI-compatible HTTP API.
pub struct HttpProvider {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// API base URL (e.g. `"https://api.groq.com/openai/v1"`).
    api_base: String,
    /// API key for Bearer authentication.
    api_key: String,
    /// Model name as sent on the wire (routing prefix stripped).
    model: String,
    /// Extra headers to send with each request.
    extra_headers: HeaderMap,
    /// Provider spec, for display names.
    spec: &'static ProviderSpec,
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("provider", &self.spec.display_name)
            .finish()
    }
}

impl HttpProvider {
    /// Create a new HttpProvider from a provider config and spec.
    ///
    /// # Arguments
    /// * `config` : User's config (api_key, api_base, extra_headers)
    /// * `spec`   : Static provider spec from the registry
    /// * `model`  : Model name, optionally with the provider's routing prefix
    pub fn new(
        config: &ProviderConfig,
        spec: &'static ProviderSpec,
        model: &str,
    ) -> Result<Self, ConfigError> {
        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| spec.default_api_base.to_string());

        let mut extra_headers = HeaderMap::new();
        if let Some(ref headers) = config.extra_headers {
            for (key, value) in headers {
                if let (Ok(name), Ok(val)) = (
                    HeaderName::from_bytes(key.as_bytes()),
                    HeaderValue::from_str(value),
                ) {
                    extra_headers.insert(name, val);
                } else {
                    warn!("Invalid header: {}={}", key, value);
                }
            }
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(HttpProvider {
            client,
            api_base,
            api_key: config.api_key.clone(),
            model: resolve_model_name(model, spec),
            extra_headers,
            spec,
        })
    }

    /// Build the full chat completions URL.
    fn completions_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{}/chat/completions", base)
    }

    fn provider_name(&self) -> String {
        self.spec.display_name.to_string()
    }
}

#[async_trait]
impl ChatModel for HttpProvider {
    async fn complete(
        &self,
        messages: &[PromptMessage],
        config: &LlmRequestConfig,
    ) -> Result<String, ModelCallError> {
        debug!(
            provider = self.spec.display_name,
            model = %self.model,
            messages = messages.len(),
            "Calling LLM"
        );

        let request_body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            max_tokens: Some(config.max_tokens),
            temperature: Some(config.temperature),
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .headers(self.extra_headers.clone())
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = self.spec.display_name, error = %e, "HTTP request failed");
                ModelCallError::Network {
                    provider: self.provider_name(),
                    message: e.to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(
                provider = self.spec.display_name,
                status = %status,
                body = %body,
                "API error"
            );
            return Err(ModelCallError::Api {
                provider: self.provider_name(),
                status: status.as_u16(),
                body,
            });
        }

        let chat_resp = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| {
                error!(
                    provider = self.spec.display_name,
                    error = %e,
                    "Failed to parse LLM response"
                );
                ModelCallError::Malformed {
                    provider: self.provider_name(),
                    message: e.to_string(),
                }
            })?;

        if let Some(usage) = &chat_resp.usage {
            debug!(
                provider = self.spec.display_name,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "LLM response received"
            );
        }

        chat_resp.into_text().ok_or_else(|| {
            warn!(provider = self.spec.display_name, "LLM returned no content");
            ModelCallError::EmptyReply {
                provider: self.provider_name(),
            }
        })
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn display_name(&self) -> &str {
        self.spec.display_name
    }
}

// ─────────────────────────────────────────────
// Builder (convenience)
// ─────────────────────────────────────────────

/// Build an HttpProvider from a model name and a map of provider configs.
///
/// Empty keys are filled from the providers' conventional env vars, then the
/// model is matched to a configured provider.
pub fn create_provider(
    model: &str,
    providers: &HashMap<String, ProviderConfig>,
) -> Result<HttpProvider, ConfigError> {
    let providers = crate::registry::with_env_keys(providers);
    let (config, spec) = crate::registry::match_provider(model, &providers).ok_or_else(|| {
        ConfigError::MissingCredential {
            model: model.to_string(),
        }
    })?;

    debug!(
        provider = spec.display_name,
        model = model,
        api_base = config.api_base.as_deref().unwrap_or(spec.default_api_base),
        "Creating LLM provider"
    );

    HttpProvider::new(config, spec, model)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
