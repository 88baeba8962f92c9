use async_trait::async_trait;

use crate::api::ApiResult;
use crate::models::UserProfile;

/// The identity provider's request-token / session handshake.
///
/// Each method is one network round-trip. A provider-side "no" is a normal
/// value (`None` or `false`); `Err` is reserved for failures where the
/// provider's answer could not be obtained at all.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Issue a fresh, unvalidated request token
    async fn create_request_token(&self) -> ApiResult<Option<String>>;

    /// Bind a username/password to a request token.
    /// Returns `false` when the provider rejects the credentials.
    async fn validate_token(
        &self,
        username: &str,
        password: &str,
        request_token: &str,
    ) -> ApiResult<bool>;

    /// Exchange a validated request token for a session id
    async fn create_session(&self, request_token: &str) -> ApiResult<Option<String>>;

    /// Look up the account bound to a session.
    /// `None` means the provider does not recognize the session.
    async fn fetch_profile(&self, session_id: &str) -> ApiResult<Option<UserProfile>>;

    /// Revoke a session on the provider side
    async fn delete_session(&self, session_id: &str) -> ApiResult<bool>;

    /// Check whether the provider still recognizes a session
    async fn validate_session(&self, session_id: &str) -> ApiResult<bool> {
        Ok(self.fetch_profile(session_id).await?.is_some())
    }
}
