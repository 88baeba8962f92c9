//! REST client module for the identity provider.
//!
//! This module provides the `TmdbClient` for driving the provider's
//! request-token / session handshake and looking up the account bound to a
//! session.
//!
//! Every request carries the application's API key as a bearer token.

pub mod client;
pub mod error;

pub use client::TmdbClient;
pub use error::{ApiError, ApiResult};
