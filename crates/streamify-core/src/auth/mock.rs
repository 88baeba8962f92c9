//! Scripted in-memory identity provider for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::api::{ApiError, ApiResult};
use crate::models::UserProfile;

use super::IdentityProvider;

/// How a scripted step answers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum Step {
    #[default]
    Succeed,
    Reject,
    Fail,
}

/// Pauses `validate_token` for one username until released.
#[derive(Default)]
pub(crate) struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

#[derive(Default)]
pub(crate) struct MockProvider {
    pub token: Step,
    pub validate: Step,
    pub session: Step,
    pub profile: Step,
    pub delete: Step,

    pub token_calls: AtomicUsize,
    pub validate_calls: AtomicUsize,
    pub session_calls: AtomicUsize,
    pub profile_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,

    pub(crate) gates: Mutex<HashMap<String, Arc<Gate>>>,
    pub(crate) token_owners: Mutex<HashMap<String, String>>,
    pub(crate) session_owners: Mutex<HashMap<String, String>>,
    pub(crate) deleted: Mutex<Vec<String>>,
}

fn failure() -> ApiError {
    ApiError::InvalidResponse("scripted failure".to_string())
}

/// Profile the mock hands out for a username.
pub(crate) fn profile_for(username: &str) -> UserProfile {
    UserProfile {
        id: username.bytes().map(i64::from).sum(),
        username: username.to_string(),
        display_name: Some(format!("{} (display)", username)),
        avatar_hash: None,
    }
}

/// Session id the mock hands out for a username.
pub(crate) fn session_for(username: &str) -> String {
    format!("session-{}", username)
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold `validate_token` for `username` until the returned gate is released.
    pub fn gate(&self, username: &str) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.gates
            .lock()
            .unwrap()
            .insert(username.to_string(), Arc::clone(&gate));
        gate
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn deleted_sessions(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityProvider for MockProvider {
    async fn create_request_token(&self) -> ApiResult<Option<String>> {
        let n = self.token_calls.fetch_add(1, Ordering::SeqCst);
        match self.token {
            Step::Succeed => Ok(Some(format!("token-{}", n))),
            Step::Reject => Ok(None),
            Step::Fail => Err(failure()),
        }
    }

    async fn validate_token(
        &self,
        username: &str,
        _password: &str,
        request_token: &str,
    ) -> ApiResult<bool> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.gates.lock().unwrap().get(username).cloned();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        match self.validate {
            Step::Succeed => {
                self.token_owners
                    .lock()
                    .unwrap()
                    .insert(request_token.to_string(), username.to_string());
                Ok(true)
            }
            Step::Reject => Ok(false),
            Step::Fail => Err(failure()),
        }
    }

    async fn create_session(&self, request_token: &str) -> ApiResult<Option<String>> {
        self.session_calls.fetch_add(1, Ordering::SeqCst);
        match self.session {
            Step::Succeed => {
                let owner = self.token_owners.lock().unwrap().remove(request_token);
                let Some(username) = owner else {
                    // Unvalidated tokens never become sessions
                    return Ok(None);
                };
                let session_id = session_for(&username);
                self.session_owners
                    .lock()
                    .unwrap()
                    .insert(session_id.clone(), username);
                Ok(Some(session_id))
            }
            Step::Reject => Ok(None),
            Step::Fail => Err(failure()),
        }
    }

    async fn fetch_profile(&self, session_id: &str) -> ApiResult<Option<UserProfile>> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        match self.profile {
            Step::Succeed => Ok(self
                .session_owners
                .lock()
                .unwrap()
                .get(session_id)
                .map(|u| profile_for(u))),
            Step::Reject => Ok(None),
            Step::Fail => Err(failure()),
        }
    }

    async fn delete_session(&self, session_id: &str) -> ApiResult<bool> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        match self.delete {
            Step::Succeed => {
                self.session_owners.lock().unwrap().remove(session_id);
                self.deleted.lock().unwrap().push(session_id.to_string());
                Ok(true)
            }
            Step::Reject => Ok(false),
            Step::Fail => Err(failure()),
        }
    }
}
