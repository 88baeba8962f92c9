//! The composed login flow: request token, validate, create session, fetch profile.

use std::fmt;

use tracing::{debug, warn};

use crate::api::ApiResult;
use crate::models::{AuthenticatedSession, Credentials};

use super::IdentityProvider;

/// Which part of the handshake the provider failed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFailure {
    Token,
    Session,
    Profile,
    Network,
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            ProviderFailure::Token => "token",
            ProviderFailure::Session => "session",
            ProviderFailure::Profile => "profile",
            ProviderFailure::Network => "network",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Success(AuthenticatedSession),
    InvalidCredentials,
    ProviderError(ProviderFailure),
}

/// Run the four handshake steps in order, stopping at the first failure.
///
/// Never returns a partial session. Transport errors from any step are
/// logged and reported as `ProviderError(Network)`.
pub async fn exchange_credentials(
    provider: &dyn IdentityProvider,
    credentials: &Credentials,
) -> LoginOutcome {
    match run_handshake(provider, credentials).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(error = %e, "Identity provider request failed during login");
            LoginOutcome::ProviderError(ProviderFailure::Network)
        }
    }
}

async fn run_handshake(
    provider: &dyn IdentityProvider,
    credentials: &Credentials,
) -> ApiResult<LoginOutcome> {
    let Some(token) = provider.create_request_token().await? else {
        return Ok(LoginOutcome::ProviderError(ProviderFailure::Token));
    };
    debug!("Request token issued");

    let valid = provider
        .validate_token(&credentials.username, &credentials.password, &token)
        .await?;
    if !valid {
        return Ok(LoginOutcome::InvalidCredentials);
    }
    debug!("Request token validated");

    let Some(session_id) = provider.create_session(&token).await? else {
        return Ok(LoginOutcome::ProviderError(ProviderFailure::Session));
    };
    debug!("Session created");

    let Some(profile) = provider.fetch_profile(&session_id).await? else {
        return Ok(LoginOutcome::ProviderError(ProviderFailure::Profile));
    };
    debug!(user_id = profile.id, "Account details fetched");

    Ok(LoginOutcome::Success(AuthenticatedSession::new(profile, session_id)))
}
