//! Error types shared across Parley crates.
//!
//! Only [`ConfigError`] is fatal, and only at startup. Model and persistence
//! failures are recoverable per turn.

use std::path::PathBuf;

use thiserror::Error;

/// Startup configuration problems.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No provider with a configured API key can serve the model.
    #[error(
        "no configured provider found for model '{model}'; set an API key \
         (e.g. GROQ_API_KEY, OPENAI_API_KEY, OPENROUTER_API_KEY)"
    )]
    MissingCredential { model: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// A failed call to the model collaborator.
#[derive(Debug, Error)]
pub enum ModelCallError {
    /// Connection, DNS, TLS, or timeout failure.
    #[error("network error calling {provider}: {message}")]
    Network { provider: String, message: String },

    /// The API answered with a non-success status (rate limits, auth, …).
    #[error("{provider} returned {status}: {body}")]
    Api {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("malformed response from {provider}: {message}")]
    Malformed { provider: String, message: String },

    #[error("{provider} returned an empty reply")]
    EmptyReply { provider: String },
}

impl ModelCallError {
    /// Whether the same request may succeed if retried later.
    pub fn is_transient(&self) -> bool {
        match self {
            ModelCallError::Network { .. } => true,
            ModelCallError::Api { status, .. } => *status == 429 || *status >= 500,
            ModelCallError::Malformed { .. } | ModelCallError::EmptyReply { .. } => false,
        }
    }
}

/// Reading or writing a session's backing file failed.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt session file {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The id cannot be stored as a file name without colliding with another id.
    #[error(
        "invalid session id '{id}': use letters, digits, '-', '_' or '.', \
         not starting with '.'"
    )]
    InvalidId { id: String },

    #[error("failed to serialize session '{id}': {source}")]
    Serialize {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}
