//! Durable key-value persistence for the session and theme preference.
//!
//! This module provides:
//! - `KeyValueBackend`: string-keyed get/set/remove, with multi-key helpers
//! - `FileBackend`, `KeyringBackend`, `MemoryBackend`: the available backends
//! - `SessionStore`: the `(profile, session id)` pair and the theme mode,
//!   stored under fixed keys on top of any backend

pub mod backend;
pub mod file;
pub mod keyring;
pub mod session_store;

#[cfg(test)]
pub(crate) mod mock;

pub use backend::{KeyValueBackend, MemoryBackend};
pub use file::FileBackend;
pub use keyring::KeyringBackend;
pub use session_store::SessionStore;
