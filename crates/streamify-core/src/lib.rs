//! Streamify core - identity-provider sessions for the Streamify client.
//!
//! Converts a username/password into a provider session through the
//! request-token handshake, keeps that session persisted across restarts,
//! and gates navigation on whether a session is present.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod navigation;
pub mod store;
pub mod theme;

pub use api::{ApiError, TmdbClient};
pub use auth::{AuthState, IdentityProvider, LoginError, SessionManager};
pub use config::Config;
pub use models::{AuthenticatedSession, Credentials, UserProfile};
pub use navigation::{GuardDecision, NavigationGuard, Navigator, Route};
pub use store::SessionStore;
pub use theme::{Appearance, ThemeMode};
