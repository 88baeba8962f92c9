//! Data models for identity-provider sessions.
//!
//! This module contains the types shared between the API client, the
//! session store and the auth manager:
//! - `Credentials`: transient username/password pair
//! - `UserProfile`: account details bound to a session
//! - `AuthenticatedSession`: a session id paired with its profile

pub mod credentials;
pub mod profile;

pub use credentials::Credentials;
pub use profile::{AuthenticatedSession, UserProfile};
