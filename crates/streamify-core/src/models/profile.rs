use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account details returned by the identity provider for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_hash: Option<String>,
}

impl UserProfile {
    /// Name to show for the user: display name if set, otherwise username.
    pub fn display_label(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.username,
        }
    }

    /// Gravatar URL for the avatar hash, if the provider returned one.
    pub fn avatar_url(&self) -> Option<String> {
        self.avatar_hash
            .as_deref()
            .filter(|h| !h.is_empty())
            .map(|h| format!("https://www.gravatar.com/avatar/{}", h))
    }
}

/// A provider session id together with the profile it belongs to.
///
/// Holding both in one value keeps them paired: there is no way to have a
/// session id without a profile or the other way round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedSession {
    pub profile: UserProfile,
    pub session_id: String,
    pub established_at: DateTime<Utc>,
}

impl AuthenticatedSession {
    pub fn new(profile: UserProfile, session_id: String) -> Self {
        Self {
            profile,
            session_id,
            established_at: Utc::now(),
        }
    }

    /// Session id shortened for log output.
    pub fn session_hint(&self) -> String {
        let prefix: String = self.session_id.chars().take(6).collect();
        format!("{}…", prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: Option<&str>) -> UserProfile {
        UserProfile {
            id: 7,
            username: "moviefan".to_string(),
            display_name: name.map(str::to_string),
            avatar_hash: None,
        }
    }

    #[test]
    fn test_display_label_prefers_name() {
        assert_eq!(profile(Some("Jamie")).display_label(), "Jamie");
        assert_eq!(profile(None).display_label(), "moviefan");
        assert_eq!(profile(Some("  ")).display_label(), "moviefan");
    }

    #[test]
    fn test_profile_json_uses_name_field() {
        let json = serde_json::to_string(&profile(Some("Jamie"))).unwrap();
        assert!(json.contains(r#""name":"Jamie""#));
        assert!(!json.contains("avatar_hash"));

        let parsed: UserProfile = serde_json::from_str(r#"{"id":1,"username":"a"}"#).unwrap();
        assert_eq!(parsed.display_name, None);
        assert_eq!(parsed.avatar_hash, None);
    }

    #[test]
    fn test_avatar_url() {
        let mut p = profile(None);
        assert_eq!(p.avatar_url(), None);
        p.avatar_hash = Some("abc123".to_string());
        assert_eq!(
            p.avatar_url().as_deref(),
            Some("https://www.gravatar.com/avatar/abc123")
        );
    }

    #[test]
    fn test_session_hint_truncates() {
        let session = AuthenticatedSession::new(profile(None), "0123456789abcdef".to_string());
        assert_eq!(session.session_hint(), "012345…");
    }
}
