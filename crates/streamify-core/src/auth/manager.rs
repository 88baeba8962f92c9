//! Session manager: the single owner of `AuthState`.
//!
//! All state-changing operations take `op_lock` for their whole duration,
//! so they run one at a time per manager, in the order they acquired the
//! lock. Readers never take the lock; they see the latest state through the
//! `watch` channel.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

use crate::api::ApiResult;
use crate::models::{AuthenticatedSession, Credentials};
use crate::store::SessionStore;

use super::{exchange_credentials, AuthState, IdentityProvider, LoginOutcome, ProviderFailure};

/// Message shown for any failure other than rejected credentials
pub const GENERIC_FAILURE_MESSAGE: &str = "An unexpected error occurred";

/// Message shown when the provider rejects the credentials
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";

#[derive(Error, Debug)]
pub enum LoginError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Identity provider error: {0}")]
    Provider(ProviderFailure),

    #[error("{0:#}")]
    Storage(anyhow::Error),
}

impl LoginError {
    /// What to tell the user. Only bad credentials are shown verbatim.
    pub fn user_message(&self) -> &'static str {
        match self {
            LoginError::InvalidCredentials => INVALID_CREDENTIALS_MESSAGE,
            LoginError::Provider(_) | LoginError::Storage(_) => GENERIC_FAILURE_MESSAGE,
        }
    }
}

pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
    store: SessionStore,
    state: watch::Sender<AuthState>,
    op_lock: Mutex<()>,
}

impl SessionManager {
    /// Create a manager in the loading state. Call `initialize` next.
    pub fn new(provider: Arc<dyn IdentityProvider>, store: SessionStore) -> Self {
        let (state, _) = watch::channel(AuthState::loading());
        Self {
            provider,
            store,
            state,
            op_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Receive every state change from now on
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    /// Rehydrate from the store. Any store failure starts signed out.
    pub async fn initialize(&self) {
        let _guard = self.op_lock.lock().await;
        self.state.send_modify(|s| s.is_loading = true);

        let session = match self.store.read() {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Failed to load stored session, starting signed out");
                None
            }
        };

        match &session {
            Some(s) => info!(
                user_id = s.profile.id,
                username = %s.profile.username,
                "Session restored"
            ),
            None => debug!("No stored session"),
        }

        self.state.send_replace(AuthState {
            session,
            is_loading: false,
        });
    }

    /// Run the provider handshake and, on success, persist then publish the session.
    ///
    /// On any failure the store and in-memory state are left as they were.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthenticatedSession, LoginError> {
        let _guard = self.op_lock.lock().await;
        let credentials = Credentials::new(username, password);

        match exchange_credentials(self.provider.as_ref(), &credentials).await {
            LoginOutcome::Success(session) => {
                if let Err(e) = self.store.write(&session) {
                    error!(error = %e, "Failed to persist session, discarding login");
                    self.revoke(&session).await;
                    return Err(LoginError::Storage(e));
                }
                let published = session.clone();
                self.state.send_modify(|s| s.session = Some(published));
                info!(
                    user_id = session.profile.id,
                    session = %session.session_hint(),
                    "Login successful"
                );
                Ok(session)
            }
            LoginOutcome::InvalidCredentials => {
                info!(username = %credentials.username, "Login rejected: invalid credentials");
                Err(LoginError::InvalidCredentials)
            }
            LoginOutcome::ProviderError(reason) => {
                warn!(%reason, "Login failed at identity provider");
                Err(LoginError::Provider(reason))
            }
        }
    }

    /// Clear the store, then in-memory state, then revoke the remote session.
    ///
    /// Always ends signed out locally; failures are logged, never returned.
    pub async fn logout(&self) {
        let guard = self.op_lock.lock().await;

        let current = self.state.borrow().session.clone();
        let previous = match current {
            Some(session) => Some(session),
            None => self.store.read().ok().flatten(),
        };

        if let Err(e) = self.store.clear() {
            error!(error = %e, "Failed to clear stored session");
        }
        self.state.send_modify(|s| s.session = None);
        info!("Logged out");

        drop(guard);

        if let Some(session) = previous {
            self.revoke(&session).await;
        }
    }

    /// Ask the provider whether the current session is still valid.
    ///
    /// A session the provider no longer recognizes is signed out locally.
    /// Transport errors leave everything as it was.
    pub async fn verify_session(&self) -> ApiResult<bool> {
        let _guard = self.op_lock.lock().await;

        let session_id = self.state.borrow().session_id().map(str::to_string);
        let Some(session_id) = session_id else {
            return Ok(false);
        };

        let valid = self.provider.validate_session(&session_id).await?;
        if !valid {
            warn!("Provider no longer recognizes session, signing out");
            if let Err(e) = self.store.clear() {
                error!(error = %e, "Failed to clear stored session");
            }
            self.state.send_modify(|s| s.session = None);
        }
        Ok(valid)
    }

    async fn revoke(&self, session: &AuthenticatedSession) {
        match self.provider.delete_session(&session.session_id).await {
            Ok(true) => debug!(session = %session.session_hint(), "Remote session deleted"),
            Ok(false) => warn!(
                session = %session.session_hint(),
                "Provider refused to delete session"
            ),
            Err(e) => warn!(error = %e, "Failed to delete remote session"),
        }
    }
}
