//! Utility helpers: path resolution, session ids, string manipulation.

use std::path::PathBuf;

use chrono::{DateTime, Local};

/// Format of generated session ids. Sorting these strings sorts them by time.
const SESSION_ID_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Get the Parley data directory (e.g. `~/.parley/`).
pub fn get_data_path() -> PathBuf {
    let home = home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".parley")
}

/// Get the default sessions directory (e.g. `~/.parley/sessions/`).
pub fn get_sessions_path() -> PathBuf {
    get_data_path().join("sessions")
}

/// Get today's date as YYYY-MM-DD.
pub fn today_date() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Timestamp-derived session id for `at`, e.g. `20261016-142530`.
pub fn session_id_at(at: DateTime<Local>) -> String {
    at.format(SESSION_ID_FORMAT).to_string()
}

/// Replace literal `\n` escape markers with real newlines.
///
/// Some models return the two characters `\` `n` instead of a line break;
/// they must be turned into newlines before display.
pub fn unescape_newlines(text: &str) -> String {
    text.replace("\\r\\n", "\n").replace("\\n", "\n")
}

/// Truncate a string to `max_len` characters, adding "..." if truncated.
/// Unicode-safe.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// Sanitize a string for use as a filename.
pub fn safe_filename(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Whether `id` can be used verbatim as a session file stem.
///
/// Only ids that [`safe_filename`] leaves unchanged qualify, so the mapping
/// from id to file is one-to-one. Empty and dot-leading ids are refused.
pub fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty() && !id.starts_with('.') && safe_filename(id) == id
}

/// Expand `~` to the home directory in a path string.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(rest)
    } else if path == "~" {
        home_dir().unwrap_or_else(|| PathBuf::from("."))
    } else {
        PathBuf::from(path)
    }
}

fn home_dir() -> Option<PathBuf> {
    dirs_next::home_dir()
}
