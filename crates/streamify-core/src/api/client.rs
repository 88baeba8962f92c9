//! API client for the identity provider's authentication endpoints.
//!
//! This module provides the `TmdbClient` struct, the HTTP implementation of
//! [`IdentityProvider`]. It classifies every response into one of three
//! shapes: a value, a provider-side rejection (`None` / `false`), or an
//! [`ApiError`] for transport failures and bodies it cannot make sense of.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use tracing::debug;

use crate::auth::IdentityProvider;
use crate::models::UserProfile;

use super::{ApiError, ApiResult};

// ============================================================================
// Constants
// ============================================================================

/// Base URL for the provider's v3 API
pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Provider status code for a missing or invalid API key.
const INVALID_API_KEY_STATUS: i64 = 7;

// ============================================================================
// Wire types
// ============================================================================

/// Fields every provider response may carry, success or not.
#[derive(Debug, Deserialize)]
struct StatusEnvelope {
    status_code: Option<i64>,
    status_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    success: bool,
}

#[derive(Debug, Deserialize)]
struct RequestTokenResponse {
    #[serde(default)]
    success: bool,
    request_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    #[serde(default)]
    success: bool,
    session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    success: Option<bool>,
    id: Option<i64>,
    username: Option<String>,
    name: Option<String>,
    avatar: Option<AccountAvatar>,
}

#[derive(Debug, Deserialize)]
struct AccountAvatar {
    gravatar: Option<Gravatar>,
}

#[derive(Debug, Deserialize)]
struct Gravatar {
    hash: Option<String>,
}

impl AccountResponse {
    fn into_profile(self) -> Option<UserProfile> {
        if self.success == Some(false) {
            return None;
        }
        Some(UserProfile {
            id: self.id?,
            username: self.username?,
            display_name: self.name.filter(|n| !n.is_empty()),
            avatar_hash: self
                .avatar
                .and_then(|a| a.gravatar)
                .and_then(|g| g.hash)
                .filter(|h| !h.is_empty()),
        })
    }
}

// ============================================================================
// Client
// ============================================================================

/// HTTP client for the identity provider.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    /// Create a new client against `base_url` authenticating with `api_key`
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn headers(&self) -> ApiResult<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        let bearer = header::HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| ApiError::Unauthorized)?;
        headers.insert(header::AUTHORIZATION, bearer);
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        Ok(headers)
    }

    /// Read a response body and hand it to [`parse_body`].
    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
        let status = response.status();
        let body = response.text().await?;
        parse_body(status, &body)
    }
}

/// Turn a raw status/body pair into a typed response.
///
/// Rejections (4xx with a `success: false` body) still parse into `T`; the
/// caller looks at `success` to tell them apart. Only statuses and bodies
/// that carry no usable verdict become errors.
fn parse_body<T: DeserializeOwned>(status: StatusCode, body: &str) -> ApiResult<T> {
    if let Some(err) = ApiError::from_status(status, body) {
        return Err(err);
    }

    if !status.is_success() {
        if let Ok(envelope) = serde_json::from_str::<StatusEnvelope>(body) {
            if envelope.status_code == Some(INVALID_API_KEY_STATUS) {
                return Err(ApiError::Unauthorized);
            }
            debug!(
                status = %status,
                code = ?envelope.status_code,
                message = ?envelope.status_message,
                "Provider rejected request"
            );
        }
    }

    serde_json::from_str(body).map_err(|e| {
        ApiError::InvalidResponse(format!(
            "Status {}: {} ({})",
            status,
            e,
            ApiError::truncate_body(body)
        ))
    })
}

#[async_trait]
impl IdentityProvider for TmdbClient {
    async fn create_request_token(&self) -> ApiResult<Option<String>> {
        let response = self
            .client
            .get(self.url("/authentication/token/new"))
            .headers(self.headers()?)
            .send()
            .await?;

        let parsed: RequestTokenResponse = Self::read(response).await?;
        match parsed.request_token {
            Some(token) if parsed.success && !token.is_empty() => Ok(Some(token)),
            _ => {
                debug!("Provider declined to issue a request token");
                Ok(None)
            }
        }
    }

    async fn validate_token(
        &self,
        username: &str,
        password: &str,
        request_token: &str,
    ) -> ApiResult<bool> {
        let body = json!({
            "username": username,
            "password": password,
            "request_token": request_token,
        });

        let response = self
            .client
            .post(self.url("/authentication/token/validate_with_login"))
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await?;

        let parsed: StatusResponse = Self::read(response).await?;
        Ok(parsed.success)
    }

    async fn create_session(&self, request_token: &str) -> ApiResult<Option<String>> {
        let body = json!({ "request_token": request_token });

        let response = self
            .client
            .post(self.url("/authentication/session/new"))
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await?;

        let parsed: SessionResponse = Self::read(response).await?;
        match parsed.session_id {
            Some(id) if parsed.success && !id.is_empty() => Ok(Some(id)),
            _ => {
                debug!("Provider declined to create a session");
                Ok(None)
            }
        }
    }

    async fn fetch_profile(&self, session_id: &str) -> ApiResult<Option<UserProfile>> {
        let response = self
            .client
            .get(self.url("/account"))
            .headers(self.headers()?)
            .query(&[("session_id", session_id)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND)
            && serde_json::from_str::<AccountResponse>(&body).is_err()
        {
            debug!(status = %status, "Provider did not recognize session");
            return Ok(None);
        }

        let parsed: AccountResponse = parse_body(status, &body)?;
        let profile = parsed.into_profile();
        if profile.is_none() {
            debug!("Provider did not recognize session");
        }
        Ok(profile)
    }

    async fn delete_session(&self, session_id: &str) -> ApiResult<bool> {
        let body = json!({ "session_id": session_id });

        let response = self
            .client
            .delete(self.url("/authentication/session"))
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await?;

        let parsed: StatusResponse = Self::read(response).await?;
        Ok(parsed.success)
    }
}
