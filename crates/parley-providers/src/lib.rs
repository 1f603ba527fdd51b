//! Model collaborator layer for Parley.
//!
//! # Architecture
//!
//! - [`traits::ChatModel`]: the seam the conversation driver talks to
//! - [`registry`]: static specs for supported OpenAI-compatible providers + matching logic
//! - [`http_provider::HttpProvider`]: generic `/chat/completions` HTTP client
//! - [`http_provider::create_provider`]: convenience builder from model name + config

pub mod http_provider;
pub mod registry;
pub mod traits;

pub use http_provider::{create_provider, HttpProvider};
pub use registry::{ProviderSpec, PROVIDERS};
pub use traits::{ChatModel, LlmRequestConfig};
