//! Parley core: turn/session types, the session store, config, and helpers.
//!
//! - [`types`]: turns, sessions, and the chat-completions wire format
//! - [`session`]: in-memory session map with optional one-file-per-session persistence
//! - [`config`]: `~/.parley/config.json` schema, loader, env overrides
//! - [`error`]: typed errors shared by the store, providers, and driver

pub mod config;
pub mod error;
pub mod session;
pub mod types;
pub mod utils;

pub use error::{ConfigError, ModelCallError, PersistenceError};
pub use session::SessionStore;
pub use types::{Role, Session, Turn};
