//! Persisted session blob and the session lifecycle

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Lifecycle of the single login context.
///
/// Transitions: login success moves to `Authenticated`, login failure back
/// to `Unauthenticated`, and a rejected session (`login_required` from the
/// platform or a failed validity check) to `Expired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
    Expired,
}

/// Credential blob written after a successful login and reloaded on startup.
///
/// Opaque to everything except the client that replays it: cookies captured
/// from the jar plus the device identity, so re-logins present as the same
/// device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub username: String,
    #[serde(default)]
    pub user_id: Option<u64>,
    pub device_id: String,
    pub client_uuid: String,
    #[serde(default)]
    pub cookies: HashMap<String, String>,
    pub saved_at: DateTime<Utc>,
}

/// File-backed store for the session blob
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted blob. A missing or unreadable blob is "no
    /// session", not an error.
    pub fn load(&self) -> Option<SessionData> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Discarding corrupt session blob");
                None
            }
        }
    }

    pub fn save(&self, data: &SessionData) -> Result<()> {
        let raw = serde_json::to_string_pretty(data)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }

    /// Remove the blob. Removing a blob that is already gone is fine.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_data() -> SessionData {
        SessionData {
            username: "driven34".to_string(),
            user_id: Some(123456789),
            device_id: "android-abcdef0123456789".to_string(),
            client_uuid: "8cc1e6ac-3f53-4a4b-9f91-6d2f9e2e3a01".to_string(),
            cookies: HashMap::from([
                ("sessionid".to_string(), "opaque-session-token".to_string()),
                ("csrftoken".to_string(), "opaque-csrf-token".to_string()),
            ]),
            saved_at: Utc::now(),
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));

        store.save(&sample_data()).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded.username, "driven34");
        assert_eq!(loaded.user_id, Some(123456789));
        assert_eq!(
            loaded.cookies.get("sessionid").map(String::as_str),
            Some("opaque-session-token")
        );
    }

    #[test]
    fn test_load_missing_blob_is_none() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("missing.json"));
        assert!(store.load().is_none());
    }

    #[test]
    fn test_load_corrupt_blob_is_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json at all {{{").unwrap();

        let store = SessionStore::new(path);
        assert!(store.load().is_none());
    }

    #[test]
    fn test_clear_removes_blob() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));

        store.save(&sample_data()).unwrap();
        assert!(store.path().exists());

        store.clear().unwrap();
        assert!(!store.path().exists());

        // Clearing again is not an error
        store.clear().unwrap();
    }
}
