//! Parley CLI: entry point.
//!
//! # Commands
//!
//! - `parley chat [-m MESSAGE] [-s SESSION] [--ephemeral]`: single-shot or REPL
//! - `parley sessions`: list persisted sessions
//! - `parley show <ID>`: print a session transcript
//! - `parley onboard`: write the default config
//! - `parley status`: show configuration and provider status

mod helpers;
mod onboard;
mod repl;
mod sessions_cmd;
mod status;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use parley_chat::{ConversationDriver, PromptTemplate};
use parley_core::config::{load_config, Config};
use parley_core::error::PersistenceError;
use parley_core::session::SessionStore;
use parley_providers::http_provider::create_provider;
use parley_providers::traits::LlmRequestConfig;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Parley: terminal chat with an LLM, one JSON file per conversation
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the model (single-shot or interactive REPL)
    Chat {
        /// Single message (non-interactive). Omit for REPL mode.
        #[arg(short, long)]
        message: Option<String>,

        /// Session to continue. A fresh timestamp id is used when omitted.
        #[arg(short, long)]
        session: Option<String>,

        /// Keep the conversation in memory only
        #[arg(long, default_value_t = false)]
        ephemeral: bool,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// List persisted sessions
    Sessions,

    /// Print the transcript of a persisted session
    Show {
        /// Session identifier
        id: String,
    },

    /// Write the default configuration
    Onboard,

    /// Show configuration and provider status
    Status,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Chat {
            message,
            session,
            ephemeral,
            logs,
        } => {
            init_logging(logs);
            run_chat(message, session, ephemeral).await
        }
        Commands::Sessions => {
            init_logging(false);
            sessions_cmd::list()
        }
        Commands::Show { id } => {
            init_logging(false);
            sessions_cmd::show(&id)
        }
        Commands::Onboard => onboard::run(),
        Commands::Status => status::run(),
    }
}

// ─────────────────────────────────────────────
// Chat command
// ─────────────────────────────────────────────

async fn run_chat(message: Option<String>, session: Option<String>, ephemeral: bool) -> Result<()> {
    let config = load_config(None);
    let mut driver = build_driver(&config, ephemeral)?;
    let session_id = session.unwrap_or_else(|| driver.store().new_session_id());
    if !driver.store().accepts_id(&session_id) {
        return Err(PersistenceError::InvalidId { id: session_id }.into());
    }

    match message {
        Some(msg) => {
            info!(session = %session_id, "processing single message");
            let turns = driver
                .handle_user_message(&session_id, &msg)
                .await
                .context("model call failed")?;
            let reply = turns.last().map(|t| t.content.as_str()).unwrap_or_default();
            helpers::print_bot(reply, config.ui.typing_delay_ms).await;
        }
        None => {
            repl::run(driver, session_id, config.ui.typing_delay_ms).await?;
        }
    }

    Ok(())
}

/// Build a `ConversationDriver` from the loaded configuration.
pub fn build_driver(config: &Config, ephemeral: bool) -> Result<ConversationDriver> {
    let agent = &config.agent;

    let provider = create_provider(&agent.model, &config.providers.to_map())?;

    let store = if ephemeral || !config.sessions.persist {
        SessionStore::ephemeral()
    } else {
        let dir = config.sessions.dir_path();
        SessionStore::new(Some(dir.clone()))
            .with_context(|| format!("failed to open sessions dir: {}", dir.display()))?
    };

    let request_config = LlmRequestConfig {
        max_tokens: agent.max_tokens,
        temperature: agent.temperature,
    };

    Ok(ConversationDriver::new(
        store,
        Arc::new(provider),
        PromptTemplate::new(agent.system_prompt.clone()),
        request_config,
    ))
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("parley=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn groq_config(sessions_dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.providers.groq.api_key = "gsk-test".to_string();
        config.sessions.dir = sessions_dir.to_string_lossy().into_owned();
        config
    }

    #[test]
    fn cli_parses_chat_flags() {
        let cli = Cli::try_parse_from(["parley", "chat", "-m", "hi", "-s", "abc", "--ephemeral"])
            .unwrap();
        match cli.command {
            Commands::Chat {
                message,
                session,
                ephemeral,
                logs,
            } => {
                assert_eq!(message.as_deref(), Some("hi"));
                assert_eq!(session.as_deref(), Some("abc"));
                assert!(ephemeral);
                assert!(!logs);
            }
            _ => panic!("expected chat command"),
        }
    }

    #[test]
    fn cli_show_requires_id() {
        assert!(Cli::try_parse_from(["parley", "show"]).is_err());
        assert!(Cli::try_parse_from(["parley", "show", "20261016-142530"]).is_ok());
    }

    #[test]
    fn build_driver_durable_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let sessions = dir.path().join("sessions");
        let driver = build_driver(&groq_config(&sessions), false).unwrap();

        assert!(driver.store().is_durable());
        assert!(sessions.is_dir());
        assert_eq!(driver.model_label(), "Groq/llama3-8b-8192");
        assert!(driver.store().accepts_id("20261016-142530"));
        assert!(!driver.store().accepts_id("a/b"));
    }

    #[test]
    fn build_driver_ephemeral_flag_and_config() {
        let dir = tempfile::tempdir().unwrap();
        let sessions = dir.path().join("sessions");

        let driver = build_driver(&groq_config(&sessions), true).unwrap();
        assert!(!driver.store().is_durable());

        let mut config = groq_config(&sessions);
        config.sessions.persist = false;
        let driver = build_driver(&config, false).unwrap();
        assert!(!driver.store().is_durable());
        assert!(!sessions.exists());
    }
}
