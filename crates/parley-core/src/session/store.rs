//! Session persistence and caching.
//!
//! File format: pretty-printed JSON array in `{sessions_dir}/{id}.json`.
//! Writes go to `{id}.json.tmp` first and are renamed into place, so a
//! crash mid-write leaves the previous snapshot intact.
//!
//! Durable stores only accept ids that are already file-name safe (see
//! [`utils::is_valid_session_id`]); the id is the file stem, one-to-one.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, warn};

use crate::error::PersistenceError;
use crate::types::{Role, Session, Turn};
use crate::utils;

const SESSION_EXT: &str = "json";

// ─────────────────────────────────────────────
// SessionStore
// ─────────────────────────────────────────────

/// Maps session ids to ordered turn sequences.
///
/// Constructed once at startup and owned by the conversation driver; there is
/// a single writer, so no locking is involved. With a sessions directory the
/// store is *durable* and every session has a backing file; without one it is
/// *ephemeral* and sessions live for the lifetime of the process.
#[derive(Debug)]
pub struct SessionStore {
    /// Directory where `.json` session files are stored (`None` = in-memory only).
    sessions_dir: Option<PathBuf>,
    /// Sessions referenced so far in this process.
    sessions: HashMap<String, Session>,
}

impl SessionStore {
    /// Create a durable store.
    ///
    /// `sessions_dir` defaults to `~/.parley/sessions/` if `None`.
    /// The directory is created if it doesn't exist.
    pub fn new(sessions_dir: Option<PathBuf>) -> Result<Self, PersistenceError> {
        let dir = sessions_dir.unwrap_or_else(utils::get_sessions_path);
        std::fs::create_dir_all(&dir).map_err(|source| PersistenceError::Io {
            path: dir.clone(),
            source,
        })?;

        Ok(SessionStore {
            sessions_dir: Some(dir),
            sessions: HashMap::new(),
        })
    }

    /// Create a store that never touches disk.
    pub fn ephemeral() -> Self {
        SessionStore {
            sessions_dir: None,
            sessions: HashMap::new(),
        }
    }

    /// Whether sessions are mirrored to backing files.
    pub fn is_durable(&self) -> bool {
        self.sessions_dir.is_some()
    }

    /// Whether `id` can be used with this store. Durable stores refuse ids
    /// that are not valid file stems.
    pub fn accepts_id(&self, id: &str) -> bool {
        !id.is_empty() && (!self.is_durable() || utils::is_valid_session_id(id))
    }

    /// Get an existing session or create a new one. Never fails.
    ///
    /// 1. Check the in-memory map
    /// 2. Try to load the backing file
    /// 3. Create a new empty session
    ///
    /// Repeated calls with the same id return the same session.
    pub fn get_or_create(&mut self, id: &str) -> &mut Session {
        if !self.sessions.contains_key(id) {
            let session = match self.load(id) {
                Ok(Some(session)) => session,
                Ok(None) => Session::new(id),
                Err(PersistenceError::Corrupt { path, source }) => {
                    match set_aside_corrupt(&path) {
                        Ok(backup) => warn!(
                            session = id,
                            error = %source,
                            backup = %backup.display(),
                            "corrupt session file moved aside, starting empty"
                        ),
                        Err(e) => warn!(
                            session = id,
                            error = %source,
                            rename_error = %e,
                            "corrupt session file left in place, starting empty"
                        ),
                    }
                    Session::new(id)
                }
                Err(e) => {
                    warn!(session = id, error = %e, "failed to load session, starting empty");
                    Session::new(id)
                }
            };
            self.sessions.insert(id.to_string(), session);
        }

        self.sessions
            .entry(id.to_string())
            .or_insert_with(|| Session::new(id))
    }

    /// Look up a session that has already been referenced in this process.
    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    /// Read a session's backing file.
    ///
    /// Returns `Ok(None)` when there is no file (or the store is ephemeral);
    /// the caller should fall back to an empty session.
    pub fn load(&self, id: &str) -> Result<Option<Session>, PersistenceError> {
        let Some(path) = self.session_path(id)? else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path).map_err(|source| PersistenceError::Io {
            path: path.clone(),
            source,
        })?;
        let turns: Vec<Turn> = serde_json::from_str(&content)
            .map_err(|source| PersistenceError::Corrupt { path: path.clone(), source })?;

        debug!(session = id, turns = turns.len(), "loaded session from disk");
        Ok(Some(Session {
            id: id.to_string(),
            turns,
        }))
    }

    /// Add a turn to the end of a session. Returns the new number of turns.
    pub fn append(&mut self, id: &str, role: Role, text: impl Into<String>) -> usize {
        let session = self.get_or_create(id);
        session.turns.push(Turn::new(role, text));
        let turns = session.turns.len();
        debug!(session = id, role = %role, turns, "appended turn");
        turns
    }

    /// Drop every turn after the first `len`. Used to undo a failed exchange.
    pub fn truncate(&mut self, id: &str, len: usize) {
        if let Some(session) = self.sessions.get_mut(id) {
            session.turns.truncate(len);
        }
    }

    /// Remove all turns from a session and persist the empty history.
    pub fn clear(&mut self, id: &str) -> Result<(), PersistenceError> {
        self.get_or_create(id).turns.clear();
        self.persist(id)
    }

    /// Write the full ordered turn sequence to the session's backing file,
    /// replacing any previous content. A no-op for ephemeral stores.
    pub fn persist(&self, id: &str) -> Result<(), PersistenceError> {
        let (Some(dir), Some(path)) = (self.sessions_dir.as_deref(), self.session_path(id)?) else {
            return Ok(());
        };
        let Some(session) = self.sessions.get(id) else {
            debug!(session = id, "persist skipped: session not referenced");
            return Ok(());
        };

        let json = serde_json::to_string_pretty(&session.turns).map_err(|source| {
            PersistenceError::Serialize {
                id: id.to_string(),
                source,
            }
        })?;

        std::fs::create_dir_all(dir).map_err(|source| PersistenceError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let tmp = path.with_extension(format!("{SESSION_EXT}.tmp"));
        std::fs::write(&tmp, json).map_err(|source| PersistenceError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &path).map_err(|source| PersistenceError::Io {
            path: path.clone(),
            source,
        })?;

        debug!(
            session = id,
            turns = session.turns.len(),
            path = %path.display(),
            "saved session"
        );
        Ok(())
    }

    /// List session ids, sorted lexicographically (chronologically for
    /// generated ids).
    ///
    /// Durable stores enumerate backing files; ephemeral stores list the
    /// sessions referenced so far.
    pub fn list_sessions(&self) -> Result<Vec<String>, PersistenceError> {
        let Some(dir) = self.sessions_dir.as_deref() else {
            let mut ids: Vec<String> = self.sessions.keys().cloned().collect();
            ids.sort();
            return Ok(ids);
        };

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(PersistenceError::Io {
                    path: dir.to_path_buf(),
                    source,
                })
            }
        };

        let mut ids: Vec<String> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == SESSION_EXT))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
            .filter(|id| utils::is_valid_session_id(id))
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// Generate a fresh timestamp-derived id that no known session uses.
    pub fn new_session_id(&self) -> String {
        let base = utils::session_id_at(Local::now());
        if !self.is_known(&base) {
            return base;
        }
        (2..)
            .map(|n| format!("{base}-{n}"))
            .find(|candidate| !self.is_known(candidate))
            .unwrap_or(base)
    }

    fn is_known(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
            || matches!(self.session_path(id), Ok(Some(path)) if path.exists())
    }

    /// Backing file path for a session id (`None` for ephemeral stores).
    fn session_path(&self, id: &str) -> Result<Option<PathBuf>, PersistenceError> {
        let Some(dir) = self.sessions_dir.as_ref() else {
            return Ok(None);
        };
        if !utils::is_valid_session_id(id) {
            return Err(PersistenceError::InvalidId { id: id.to_string() });
        }
        Ok(Some(dir.join(format!("{id}.{SESSION_EXT}"))))
    }
}

/// Rename `<id>.json` to `<id>.json.corrupt` so a fresh session does not
/// overwrite it.
fn set_aside_corrupt(path: &Path) -> std::io::Result<PathBuf> {
    let backup = path.with_extension(format!("{SESSION_EXT}.corrupt"));
    std::fs::rename(path, &backup)?;
    Ok(backup)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
