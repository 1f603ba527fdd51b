//! Interactive REPL.
//!
//! Uses `rustyline` for readline-style editing with persistent history.
//! Each message is awaited to completion before the next line is read.

use anyhow::Result;
use colored::Colorize;
use rustyline::config::Configurer;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use parley_chat::ConversationDriver;
use parley_core::error::PersistenceError;

use crate::helpers;

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

/// One line of REPL input, classified.
#[derive(Debug, PartialEq, Eq)]
enum ReplCommand<'a> {
    Exit,
    /// Start a fresh session.
    New,
    /// Empty the current session.
    Clear,
    /// List known sessions.
    Sessions,
    /// Switch to another session.
    Open(Option<&'a str>),
    /// Print the current transcript.
    History,
    Help,
    Message(&'a str),
    Unknown(&'a str),
}

fn parse_command(input: &str) -> ReplCommand<'_> {
    let input = input.trim();
    if EXIT_COMMANDS.contains(&input.to_lowercase().as_str()) {
        return ReplCommand::Exit;
    }
    if !input.starts_with('/') {
        return ReplCommand::Message(input);
    }

    let (cmd, arg) = match input.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, Some(rest.trim()).filter(|a| !a.is_empty())),
        None => (input, None),
    };

    match cmd.to_lowercase().as_str() {
        "/new" => ReplCommand::New,
        "/clear" => ReplCommand::Clear,
        "/sessions" => ReplCommand::Sessions,
        "/open" => ReplCommand::Open(arg),
        "/history" => ReplCommand::History,
        "/help" => ReplCommand::Help,
        _ => ReplCommand::Unknown(cmd),
    }
}

/// Run the interactive REPL loop.
pub async fn run(
    mut driver: ConversationDriver,
    mut session_id: String,
    typing_delay_ms: u64,
) -> Result<()> {
    helpers::print_banner(&driver.model_label(), &session_id, driver.store().is_durable());

    // Continuing an existing session: show where we left off
    let existing = driver.store_mut().get_or_create(&session_id).turns.clone();
    if !existing.is_empty() {
        helpers::print_transcript(&existing);
    }

    let mut editor = create_editor()?;

    loop {
        let input = match editor.readline("You: ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(trimmed);

        match parse_command(trimmed) {
            ReplCommand::Exit => {
                println!("\nGoodbye!");
                break;
            }
            ReplCommand::New => {
                session_id = driver.store().new_session_id();
                driver.store_mut().get_or_create(&session_id);
                println!("{}\n", format!("Started session {session_id}").dimmed());
            }
            ReplCommand::Clear => match driver.store_mut().clear(&session_id) {
                Ok(()) => println!("{}\n", "History cleared.".dimmed()),
                Err(e) => eprintln!("\n{} {e}\n", "Error:".red().bold()),
            },
            ReplCommand::Sessions => print_sessions(&driver, &session_id),
            ReplCommand::Open(None) => eprintln!("Usage: /open <session-id>\n"),
            ReplCommand::Open(Some(id)) => {
                if !driver.store().accepts_id(id) {
                    let err = PersistenceError::InvalidId { id: id.to_string() };
                    eprintln!("{} {err}\n", "Error:".red().bold());
                    continue;
                }
                if !session_exists(&driver, id) {
                    eprintln!("No session named {id}. Try /sessions.\n");
                    continue;
                }
                session_id = id.to_string();
                let turns = driver.store_mut().get_or_create(&session_id).turns.clone();
                println!("{}\n", format!("Opened session {session_id}").dimmed());
                helpers::print_transcript(&turns);
            }
            ReplCommand::History => {
                let turns = driver
                    .store()
                    .get(&session_id)
                    .map(|s| s.turns.as_slice())
                    .unwrap_or_default();
                helpers::print_transcript(turns);
            }
            ReplCommand::Help => print_help(),
            ReplCommand::Unknown(cmd) => eprintln!("Unknown command {cmd}. Try /help.\n"),
            ReplCommand::Message(text) => {
                debug!(session = %session_id, "processing input");
                helpers::print_thinking();

                match driver.handle_user_message(&session_id, text).await {
                    Ok(turns) => {
                        let reply = turns.last().map(|t| t.content.clone()).unwrap_or_default();
                        helpers::clear_thinking();
                        helpers::print_bot(&reply, typing_delay_ms).await;
                    }
                    Err(e) => {
                        helpers::clear_thinking();
                        eprintln!("\n{} {e}", "Error:".red().bold());
                        if e.is_transient() {
                            eprintln!("{}", "Nothing was saved; send the message again to retry.".dimmed());
                        }
                        eprintln!();
                    }
                }
            }
        }
    }

    save_history(&mut editor);

    Ok(())
}

fn session_exists(driver: &ConversationDriver, id: &str) -> bool {
    if driver.store().get(id).is_some() {
        return true;
    }
    driver
        .store()
        .list_sessions()
        .map(|ids| ids.iter().any(|known| known == id))
        .unwrap_or(false)
}

fn print_sessions(driver: &ConversationDriver, current: &str) {
    match driver.store().list_sessions() {
        Ok(ids) if ids.is_empty() => println!("{}\n", "No saved sessions yet.".dimmed()),
        Ok(ids) => {
            for id in ids {
                if id == current {
                    println!("  {} {}", "*".green(), id.bold());
                } else {
                    println!("    {id}");
                }
            }
            println!();
        }
        Err(e) => eprintln!("\n{} {e}\n", "Error:".red().bold()),
    }
}

fn print_help() {
    println!("  /new           start a new session");
    println!("  /clear         clear the current session");
    println!("  /sessions      list sessions");
    println!("  /open <id>     switch to a session");
    println!("  /history       print the current session");
    println!("  exit           quit");
    println!();
}

/// Create a rustyline editor with history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

/// Save history to disk.
fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

/// Path to the history file.
fn history_path() -> std::path::PathBuf {
    parley_core::utils::get_data_path().join("history").join("cli_history")
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_commands() {
        assert_eq!(parse_command("exit"), ReplCommand::Exit);
        assert_eq!(parse_command("EXIT"), ReplCommand::Exit);
        assert_eq!(parse_command("/quit"), ReplCommand::Exit);
        assert_eq!(parse_command(":q"), ReplCommand::Exit);
        assert_eq!(parse_command("  quit  "), ReplCommand::Exit);
    }

    #[test]
    fn plain_text_is_a_message() {
        assert_eq!(parse_command("hello"), ReplCommand::Message("hello"));
        assert_eq!(parse_command("exit the loop"), ReplCommand::Message("exit the loop"));
    }

    #[test]
    fn slash_commands() {
        assert_eq!(parse_command("/new"), ReplCommand::New);
        assert_eq!(parse_command("/CLEAR"), ReplCommand::Clear);
        assert_eq!(parse_command("/sessions"), ReplCommand::Sessions);
        assert_eq!(parse_command("/history"), ReplCommand::History);
        assert_eq!(parse_command("/help"), ReplCommand::Help);
        assert_eq!(parse_command("/bogus arg"), ReplCommand::Unknown("/bogus"));
    }

    #[test]
    fn open_takes_an_argument() {
        assert_eq!(
            parse_command("/open 20261016-142530"),
            ReplCommand::Open(Some("20261016-142530"))
        );
        assert_eq!(parse_command("/open"), ReplCommand::Open(None));
        assert_eq!(parse_command("/open   "), ReplCommand::Open(None));
    }

    #[test]
    fn history_path_under_data_dir() {
        let path = history_path();
        assert!(path.to_string_lossy().contains(".parley"));
        assert!(path.ends_with("history/cli_history"));
    }
}
