use crate::models::{AuthenticatedSession, UserProfile};

/// In-memory authentication state, owned by the `SessionManager`.
///
/// Everyone else sees clones of it, either via `SessionManager::snapshot`
/// or through a `watch` subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub session: Option<AuthenticatedSession>,
    /// True only while the stored session is being rehydrated at startup
    pub is_loading: bool,
}

impl AuthState {
    /// State at process start, before the store has been read
    pub fn loading() -> Self {
        Self {
            session: None,
            is_loading: true,
        }
    }

    pub fn signed_out() -> Self {
        Self {
            session: None,
            is_loading: false,
        }
    }

    pub fn signed_in(session: AuthenticatedSession) -> Self {
        Self {
            session: Some(session),
            is_loading: false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.session.as_ref().map(|s| &s.profile)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.session_id.as_str())
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::loading()
    }
}
