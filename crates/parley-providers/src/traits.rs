//! `ChatModel` trait: the external model collaborator.
//!
//! The conversation driver only sees this trait; `HttpProvider` is the real
//! implementation and tests plug in scripted stubs.

use async_trait::async_trait;
use parley_core::error::ModelCallError;
use parley_core::types::PromptMessage;

/// Sampling settings passed to each call.
#[derive(Clone, Debug)]
pub struct LlmRequestConfig {
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
}

impl Default for LlmRequestConfig {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.7,
        }
    }
}

/// A chat-completion backend: takes the system instruction plus ordered
/// history and returns the generated text.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send the prompt context and wait for the reply.
    ///
    /// # Arguments
    /// * `messages`: System instruction followed by the conversation, oldest first.
    /// * `config`  : Temperature, max_tokens.
    ///
    /// # Returns
    /// The raw reply text. Failures are reported as [`ModelCallError`], never
    /// as reply content.
    async fn complete(
        &self,
        messages: &[PromptMessage],
        config: &LlmRequestConfig,
    ) -> Result<String, ModelCallError>;

    /// Model identifier this instance sends.
    fn model(&self) -> &str;

    /// Display name for logging.
    fn display_name(&self) -> &str;
}
