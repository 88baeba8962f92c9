use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::models::{AuthenticatedSession, UserProfile};
use crate::theme::ThemeMode;

use super::KeyValueBackend;

/// Key holding the profile JSON
pub const PROFILE_KEY: &str = "@streamify_auth";

/// Key holding the raw session id
pub const SESSION_KEY: &str = "@streamify_session";

/// Key holding the theme preference
pub const THEME_KEY: &str = "themeMode";

/// Profile record as written under `PROFILE_KEY`
#[derive(Debug, Serialize, Deserialize)]
struct StoredProfile {
    #[serde(flatten)]
    profile: UserProfile,
    // Records written before this field existed load with the read time
    #[serde(default = "Utc::now")]
    established_at: DateTime<Utc>,
}

/// Persists the `(profile, session id)` pair and the theme mode.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn KeyValueBackend>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self { backend }
    }

    /// Write both keys in one backend call.
    ///
    /// If the backend fails part way, the previous pair is put back. When
    /// that is not possible both keys are removed, so a failed write never
    /// leaves one user's profile next to another user's session id.
    pub fn write(&self, session: &AuthenticatedSession) -> Result<()> {
        let record = StoredProfile {
            profile: session.profile.clone(),
            established_at: session.established_at,
        };
        let profile_json = serde_json::to_string(&record).context("Failed to encode profile")?;
        let previous = self.raw_pair();

        let written = self.backend.set_many(&[
            (PROFILE_KEY, profile_json.as_str()),
            (SESSION_KEY, session.session_id.as_str()),
        ]);
        if let Err(e) = written {
            self.roll_back(previous);
            return Err(e.context("Failed to save session"));
        }
        debug!(user_id = session.profile.id, "Session saved");
        Ok(())
    }

    /// Raw values of both keys, or `None` if either could not be read
    fn raw_pair(&self) -> Option<[(&'static str, Option<String>); 2]> {
        let profile = self.backend.get(PROFILE_KEY).ok()?;
        let session_id = self.backend.get(SESSION_KEY).ok()?;
        Some([(PROFILE_KEY, profile), (SESSION_KEY, session_id)])
    }

    fn roll_back(&self, previous: Option<[(&'static str, Option<String>); 2]>) {
        let restored = match previous {
            Some(entries) => entries.iter().try_for_each(|(key, value)| match value {
                Some(value) => self.backend.set(key, value),
                None => self.backend.remove(key),
            }),
            None => Err(anyhow!("previous session could not be read")),
        };
        let Err(e) = restored else {
            return;
        };

        warn!(error = %e, "Could not restore previous session, removing it");
        if let Err(e) = self.clear() {
            error!(error = %e, "Stored session may be inconsistent");
        }
    }

    /// Read the stored pair.
    ///
    /// Returns `None` unless both keys are present and the profile parses.
    /// Backend failures are returned as errors.
    pub fn read(&self) -> Result<Option<AuthenticatedSession>> {
        let profile_json = self
            .backend
            .get(PROFILE_KEY)
            .context("Failed to read stored profile")?;
        let session_id = self
            .backend
            .get(SESSION_KEY)
            .context("Failed to read stored session id")?;

        let (profile_json, session_id) = match (profile_json, session_id) {
            (Some(p), Some(s)) if !s.is_empty() => (p, s),
            (None, None) => return Ok(None),
            (p, s) => {
                warn!(
                    has_profile = p.is_some(),
                    has_session = s.as_deref().is_some_and(|s| !s.is_empty()),
                    "Stored session is incomplete, ignoring it"
                );
                return Ok(None);
            }
        };

        match serde_json::from_str::<StoredProfile>(&profile_json) {
            Ok(record) => Ok(Some(AuthenticatedSession {
                profile: record.profile,
                session_id,
                established_at: record.established_at,
            })),
            Err(e) => {
                warn!(error = %e, "Stored profile is corrupt, ignoring stored session");
                Ok(None)
            }
        }
    }

    /// Remove both keys. Clearing an empty store succeeds.
    pub fn clear(&self) -> Result<()> {
        self.backend
            .remove_many(&[PROFILE_KEY, SESSION_KEY])
            .context("Failed to clear stored session")
    }

    pub fn theme_mode(&self) -> Result<Option<ThemeMode>> {
        let Some(raw) = self
            .backend
            .get(THEME_KEY)
            .context("Failed to read theme preference")?
        else {
            return Ok(None);
        };
        match raw.parse() {
            Ok(mode) => Ok(Some(mode)),
            Err(e) => {
                warn!(error = %e, "Ignoring stored theme preference");
                Ok(None)
            }
        }
    }

    pub fn set_theme_mode(&self, mode: ThemeMode) -> Result<()> {
        self.backend
            .set(THEME_KEY, mode.as_str())
            .context("Failed to save theme preference")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mock::FlakyBackend;
    use crate::store::{FileBackend, MemoryBackend};
    use tempfile::tempdir;

    fn session() -> AuthenticatedSession {
        AuthenticatedSession::new(
            UserProfile {
                id: 1,
                username: "moviefan".to_string(),
                display_name: Some("Movie Fan".to_string()),
                avatar_hash: Some("abc".to_string()),
            },
            "sess-1".to_string(),
        )
    }

    fn memory_store() -> (Arc<MemoryBackend>, SessionStore) {
        let backend = Arc::new(MemoryBackend::new());
        let store = SessionStore::new(backend.clone());
        (backend, store)
    }

    #[test]
    fn test_write_then_read() {
        let (_, store) = memory_store();
        let written = session();
        store.write(&written).unwrap();
        assert_eq!(store.read().unwrap(), Some(written));
    }

    #[test]
    fn test_write_clear_read_is_empty() {
        let (_, store) = memory_store();
        store.write(&session()).unwrap();
        store.clear().unwrap();
        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (_, store) = memory_store();
        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn test_profile_without_session_reads_none() {
        let (backend, store) = memory_store();
        backend
            .set(PROFILE_KEY, r#"{"id":1,"username":"moviefan"}"#)
            .unwrap();
        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn test_session_without_profile_reads_none() {
        let (backend, store) = memory_store();
        backend.set(SESSION_KEY, "sess-1").unwrap();
        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn test_corrupt_profile_reads_none() {
        let (backend, store) = memory_store();
        backend.set(PROFILE_KEY, "{not json").unwrap();
        backend.set(SESSION_KEY, "sess-1").unwrap();
        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn test_legacy_profile_without_timestamp() {
        let (backend, store) = memory_store();
        backend
            .set(PROFILE_KEY, r#"{"id":9,"username":"old","name":"Old Timer"}"#)
            .unwrap();
        backend.set(SESSION_KEY, "sess-9").unwrap();

        let restored = store.read().unwrap().expect("legacy record should load");
        assert_eq!(restored.profile.id, 9);
        assert_eq!(restored.profile.display_name.as_deref(), Some("Old Timer"));
        assert_eq!(restored.session_id, "sess-9");
    }

    #[test]
    fn test_clear_keeps_theme() {
        let (_, store) = memory_store();
        store.write(&session()).unwrap();
        store.set_theme_mode(ThemeMode::Light).unwrap();
        store.clear().unwrap();
        assert_eq!(store.theme_mode().unwrap(), Some(ThemeMode::Light));
    }

    #[test]
    fn test_invalid_theme_is_ignored() {
        let (backend, store) = memory_store();
        assert_eq!(store.theme_mode().unwrap(), None);
        backend.set(THEME_KEY, "sepia").unwrap();
        assert_eq!(store.theme_mode().unwrap(), None);
    }

    fn alice() -> AuthenticatedSession {
        AuthenticatedSession::new(
            UserProfile {
                id: 2,
                username: "alice".to_string(),
                display_name: None,
                avatar_hash: None,
            },
            "session-alice".to_string(),
        )
    }

    fn bob() -> AuthenticatedSession {
        AuthenticatedSession::new(
            UserProfile {
                id: 3,
                username: "bob".to_string(),
                display_name: None,
                avatar_hash: None,
            },
            "session-bob".to_string(),
        )
    }

    #[test]
    fn test_partial_write_restores_previous_pair() {
        let backend = Arc::new(FlakyBackend::failing_on(SESSION_KEY));
        let store = SessionStore::new(backend.clone());
        store.write(&alice()).unwrap();

        backend.fail_next(1);
        let err = store.write(&bob()).unwrap_err();
        assert_eq!(err.to_string(), "Failed to save session");

        let stored = store.read().unwrap().expect("previous pair should be restored");
        assert_eq!(stored.profile.username, "alice");
        assert_eq!(stored.session_id, "session-alice");
    }

    #[test]
    fn test_partial_write_clears_when_restore_fails() {
        let backend = Arc::new(FlakyBackend::failing_on(SESSION_KEY));
        let store = SessionStore::new(backend.clone());
        store.write(&alice()).unwrap();

        backend.fail_next(usize::MAX);
        assert!(store.write(&bob()).is_err());

        assert_eq!(store.read().unwrap(), None);
        assert_eq!(backend.get(PROFILE_KEY).unwrap(), None);
    }

    #[test]
    fn test_partial_first_write_leaves_store_empty() {
        let backend = Arc::new(FlakyBackend::failing_on(SESSION_KEY));
        let store = SessionStore::new(backend.clone());

        backend.fail_next(1);
        assert!(store.write(&bob()).is_err());
        assert_eq!(backend.get(PROFILE_KEY).unwrap(), None);
        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn test_file_backed_store_survives_restart() {
        let dir = tempdir().unwrap();
        let written = session();
        SessionStore::new(Arc::new(FileBackend::in_dir(dir.path())))
            .write(&written)
            .unwrap();

        let reopened = SessionStore::new(Arc::new(FileBackend::in_dir(dir.path())));
        assert_eq!(reopened.read().unwrap(), Some(written));
    }
}
