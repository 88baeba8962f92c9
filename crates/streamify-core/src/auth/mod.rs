//! Authentication module for provider sessions.
//!
//! This module provides:
//! - `IdentityProvider`: the four-step handshake as an async trait
//! - `exchange_credentials`: the composed, short-circuiting login flow
//! - `SessionManager`: owner of the in-memory `AuthState`, serializing
//!   initialize/login/logout and keeping the `SessionStore` in step
//!
//! Sessions are persisted through the store before they become visible in
//! memory, and cleared from the store before they disappear from memory.

pub mod handshake;
pub mod manager;
pub mod provider;
pub mod state;

#[cfg(test)]
pub(crate) mod mock;

pub use handshake::{exchange_credentials, LoginOutcome, ProviderFailure};
pub use manager::{LoginError, SessionManager};
pub use provider::IdentityProvider;
pub use state::AuthState;
