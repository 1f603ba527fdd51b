//! `parley sessions` / `parley show`: inspect persisted conversations.

use anyhow::{bail, Context, Result};
use colored::Colorize;

use parley_core::config::load_config;
use parley_core::session::SessionStore;
use parley_core::types::Session;
use parley_core::utils::truncate_string;

use crate::helpers;

/// Width of the first-message preview in the session list.
const PREVIEW_LEN: usize = 50;

/// Run the `sessions` command.
pub fn list() -> Result<()> {
    let store = open_store()?;
    let ids = store.list_sessions().context("failed to list sessions")?;

    println!();
    if ids.is_empty() {
        println!("  {}", "No saved sessions.".dimmed());
        println!();
        return Ok(());
    }

    for id in &ids {
        let line = match store.load(id) {
            Ok(Some(session)) => summarize(&session),
            Ok(None) => String::new(),
            Err(e) => format!("{}", format!("(unreadable: {e})").red()),
        };
        println!("  {:<20} {}", id.bold(), line);
    }
    println!();

    Ok(())
}

/// Run the `show` command.
pub fn show(id: &str) -> Result<()> {
    let store = open_store()?;
    let Some(session) = store
        .load(id)
        .with_context(|| format!("failed to read session {id}"))?
    else {
        bail!("no saved session named {id}");
    };

    println!();
    helpers::print_transcript(&session.turns);
    Ok(())
}

fn open_store() -> Result<SessionStore> {
    let config = load_config(None);
    let dir = config.sessions.dir_path();
    SessionStore::new(Some(dir.clone()))
        .with_context(|| format!("failed to open sessions dir: {}", dir.display()))
}

/// `"<n> turns · <first user message>"` for the session list.
fn summarize(session: &Session) -> String {
    let preview = session
        .turns
        .first()
        .map(|t| truncate_string(&t.content.replace('\n', " "), PREVIEW_LEN))
        .unwrap_or_default();
    format!(
        "{} {}",
        format!("{} turns ·", session.len()).dimmed(),
        preview
    )
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
