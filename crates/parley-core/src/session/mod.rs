//! Session store: in-memory map of conversations, optionally mirrored to disk.
//!
//! # Disk format
//!
//! Each session is one `.json` file under `~/.parley/sessions/`, named by its id,
//! holding the full ordered array of turns:
//! `[{"role": "user", "content": "hello"}, {"role": "assistant", "content": "hi"}]`

pub mod store;

pub use store::SessionStore;
