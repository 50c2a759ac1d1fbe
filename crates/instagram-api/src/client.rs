//! Instagram private mobile API HTTP client

use crate::error::{InstagramError, Result};
use crate::session::{SessionData, SessionState};
use crate::types::{
    ApiErrorBody, CurrentUserResponse, LoginResponse, Media, User, UserFeedResponse,
    UsernameInfoResponse,
};
use chrono::Utc;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Device identity presented to the private API.
///
/// Generated once per fresh client and persisted with the session so
/// re-logins present as the same device.
#[derive(Debug, Clone)]
pub struct DeviceProfile {
    pub device_id: String,
    pub client_uuid: String,
}

impl DeviceProfile {
    pub fn generate() -> Self {
        Self {
            device_id: format!("android-{}", Uuid::new_v4().simple()),
            client_uuid: Uuid::new_v4().to_string(),
        }
    }
}

/// Client for Instagram's unofficial private mobile API
///
/// Holds one login context: a cookie-jar-backed HTTP client, the device
/// identity, and the session lifecycle state. All calls other than
/// [`login`](Self::login) assume an authenticated session.
pub struct InstagramClient {
    http: reqwest::Client,
    jar: Arc<Jar>,
    device: DeviceProfile,
    state: SessionState,
    username: Option<String>,
    user_id: Option<u64>,
}

impl InstagramClient {
    /// Base URL for the private mobile API
    pub const BASE_URL: &'static str = "https://i.instagram.com/api/v1";

    /// User agent of the Android app build these endpoints expect
    const USER_AGENT: &'static str = "Instagram 269.0.0.18.75 Android (30/11; 420dpi; \
        1080x2208; samsung; SM-G973F; beyond1; exynos9820; en_US; 314665256)";

    const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a client with a freshly generated device identity
    pub fn new() -> Self {
        Self::with_device(DeviceProfile::generate())
    }

    /// Create a client presenting a specific device identity
    pub fn with_device(device: DeviceProfile) -> Self {
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .timeout(Self::DEFAULT_TIMEOUT)
            .user_agent(Self::USER_AGENT)
            .cookie_provider(jar.clone())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            jar,
            device,
            state: SessionState::Unauthenticated,
            username: None,
            user_id: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn device(&self) -> &DeviceProfile {
        &self.device
    }

    /// Mark the session as no longer accepted by the platform
    pub fn mark_expired(&mut self) {
        self.state = SessionState::Expired;
    }

    /// Replay a persisted session blob into the jar, without a network call
    pub fn restore(&mut self, data: &SessionData) {
        let url = Self::cookie_url();
        for (name, value) in &data.cookies {
            let cookie = format!("{}={}; Domain=.instagram.com; Path=/", name, value);
            self.jar.add_cookie_str(&cookie, &url);
        }
        self.device = DeviceProfile {
            device_id: data.device_id.clone(),
            client_uuid: data.client_uuid.clone(),
        };
        self.username = Some(data.username.clone());
        self.user_id = data.user_id;
        self.state = SessionState::Authenticated;
    }

    /// Snapshot the current session into a persistable blob.
    ///
    /// `None` until a login has established who the session belongs to.
    pub fn session_data(&self) -> Option<SessionData> {
        let username = self.username.clone()?;
        Some(SessionData {
            username,
            user_id: self.user_id,
            device_id: self.device.device_id.clone(),
            client_uuid: self.device.client_uuid.clone(),
            cookies: self.cookie_map(),
            saved_at: Utc::now(),
        })
    }

    /// Log in with username and password.
    ///
    /// On success the jar's cookies are captured into a [`SessionData`]
    /// ready for persistence and the state moves to `Authenticated`; on
    /// failure the state falls back to `Unauthenticated`.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<SessionData> {
        let payload = serde_json::json!({
            "username": username,
            "enc_password": password,
            "device_id": self.device.device_id,
            "guid": self.device.client_uuid,
            "login_attempt_count": 0,
        });
        // The private API wants the JSON payload wrapped in a signed_body
        // form field; the "SIGNATURE." prefix without an HMAC is accepted.
        let body = format!(
            "signed_body=SIGNATURE.{}",
            urlencoding::encode(&payload.to_string())
        );

        debug!(username, device_id = %self.device.device_id, "Logging in");

        let response = self
            .http
            .post(format!("{}/accounts/login/", Self::BASE_URL))
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;

        if !status.is_success() {
            self.state = SessionState::Unauthenticated;
            return Err(match classify_failure(status, &raw, username) {
                e @ (InstagramError::ChallengeRequired | InstagramError::Api { .. }) => e,
                other => InstagramError::LoginFailed(other.to_string()),
            });
        }

        let parsed: LoginResponse = serde_json::from_str(&raw)?;
        if parsed.status != "ok" {
            self.state = SessionState::Unauthenticated;
            return Err(InstagramError::LoginFailed(format!(
                "login status '{}'",
                parsed.status
            )));
        }

        let user = parsed.logged_in_user.ok_or_else(|| {
            InstagramError::LoginFailed("no user in login response".to_string())
        })?;

        debug!(username, user_id = user.pk, "Logged in");
        self.username = Some(username.to_string());
        self.user_id = Some(user.pk);
        self.state = SessionState::Authenticated;

        self.session_data()
            .ok_or_else(|| InstagramError::LoginFailed("no session captured".to_string()))
    }

    /// Fetch the logged-in account; doubles as the session validity check
    pub async fn account_info(&self) -> Result<User> {
        let url = format!("{}/accounts/current_user/?edit=true", Self::BASE_URL);
        let response = self.http.get(&url).send().await?;

        let status = response.status();
        let raw = response.text().await?;
        if !status.is_success() {
            return Err(classify_failure(status, &raw, "current_user"));
        }

        let parsed: CurrentUserResponse = serde_json::from_str(&raw)?;
        Ok(parsed.user)
    }

    /// Look up an account by username
    pub async fn user_by_username(&self, username: &str) -> Result<User> {
        let url = format!(
            "{}/users/{}/usernameinfo/",
            Self::BASE_URL,
            urlencoding::encode(username)
        );
        debug!(username, "Resolving user");

        let response = self.http.get(&url).send().await?;

        let status = response.status();
        let raw = response.text().await?;
        if !status.is_success() {
            return Err(classify_failure(status, &raw, username));
        }

        let parsed: UsernameInfoResponse = serde_json::from_str(&raw)?;
        Ok(parsed.user)
    }

    /// Resolve a username to its numeric user id
    pub async fn user_id_from_username(&self, username: &str) -> Result<u64> {
        Ok(self.user_by_username(username).await?.pk)
    }

    /// Fetch a user's most recent media in one batch, newest first.
    ///
    /// No pagination: one request, at most `amount` items.
    pub async fn user_medias(&self, user_id: u64, amount: usize) -> Result<Vec<Media>> {
        let url = format!("{}/feed/user/{}/?count={}", Self::BASE_URL, user_id, amount);
        debug!(user_id, amount, "Fetching user feed");

        let response = self.http.get(&url).send().await?;

        let status = response.status();
        let raw = response.text().await?;
        if !status.is_success() {
            return Err(classify_failure(status, &raw, &user_id.to_string()));
        }

        let parsed: UserFeedResponse = serde_json::from_str(&raw)?;
        debug!(user_id, items = parsed.items.len(), "Fetched user feed");
        Ok(parsed.items)
    }

    fn cookie_url() -> reqwest::Url {
        "https://i.instagram.com/"
            .parse()
            .expect("static URL parses")
    }

    fn cookie_map(&self) -> HashMap<String, String> {
        let header = match self.jar.cookies(&Self::cookie_url()) {
            Some(h) => h,
            None => return HashMap::new(),
        };
        match header.to_str() {
            Ok(raw) => parse_cookie_header(raw),
            Err(_) => HashMap::new(),
        }
    }
}

impl Default for InstagramClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a `Cookie:` header value into name/value pairs
fn parse_cookie_header(raw: &str) -> HashMap<String, String> {
    raw.split(';')
        .filter_map(|part| {
            let (name, value) = part.trim().split_once('=')?;
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

/// Translate a non-success API response into the error taxonomy.
///
/// `subject` is the username or id the request was about; it lands in the
/// not-found / private-account variants.
fn classify_failure(status: StatusCode, body: &str, subject: &str) -> InstagramError {
    let parsed: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed.message.unwrap_or_default();

    if parsed.error_type.as_deref() == Some("challenge_required")
        || message == "challenge_required"
    {
        return InstagramError::ChallengeRequired;
    }
    if message == "login_required" {
        return InstagramError::SessionExpired;
    }
    if status == StatusCode::NOT_FOUND || message == "User not found" {
        return InstagramError::UserNotFound(subject.to_string());
    }
    if message.contains("Not authorized to view user") || message.contains("Private account") {
        return InstagramError::PrivateAccount(subject.to_string());
    }

    InstagramError::Api {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_profile_generate() {
        let a = DeviceProfile::generate();
        let b = DeviceProfile::generate();

        assert!(a.device_id.starts_with("android-"));
        assert_ne!(a.device_id, b.device_id);
        assert_ne!(a.client_uuid, b.client_uuid);
    }

    #[test]
    fn test_parse_cookie_header() {
        let cookies = parse_cookie_header("sessionid=abc123; csrftoken=xyz; mid=Zm9v");
        assert_eq!(cookies.len(), 3);
        assert_eq!(cookies.get("sessionid").map(String::as_str), Some("abc123"));
        assert_eq!(cookies.get("csrftoken").map(String::as_str), Some("xyz"));
    }

    #[test]
    fn test_parse_cookie_header_skips_malformed_parts() {
        let cookies = parse_cookie_header("sessionid=abc123; garbage; =novalue");
        assert_eq!(cookies.len(), 1);
        assert!(cookies.contains_key("sessionid"));
    }

    #[test]
    fn test_classify_user_not_found() {
        let err = classify_failure(
            StatusCode::NOT_FOUND,
            r#"{"message": "User not found", "status": "fail"}"#,
            "ghost",
        );
        assert!(matches!(err, InstagramError::UserNotFound(u) if u == "ghost"));
    }

    #[test]
    fn test_classify_private_account() {
        let err = classify_failure(
            StatusCode::BAD_REQUEST,
            r#"{"message": "Not authorized to view user", "status": "fail"}"#,
            "driven34",
        );
        assert!(matches!(err, InstagramError::PrivateAccount(u) if u == "driven34"));
    }

    #[test]
    fn test_classify_challenge_required() {
        let err = classify_failure(
            StatusCode::BAD_REQUEST,
            r#"{"message": "challenge_required", "error_type": "challenge_required"}"#,
            "driven34",
        );
        assert!(matches!(err, InstagramError::ChallengeRequired));
    }

    #[test]
    fn test_classify_login_required() {
        let err = classify_failure(
            StatusCode::FORBIDDEN,
            r#"{"message": "login_required", "status": "fail"}"#,
            "current_user",
        );
        assert!(matches!(err, InstagramError::SessionExpired));
    }

    #[test]
    fn test_classify_unknown_passes_message_through() {
        let err = classify_failure(
            StatusCode::BAD_REQUEST,
            r#"{"message": "feedback_required", "status": "fail"}"#,
            "driven34",
        );
        match err {
            InstagramError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "feedback_required");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_tolerates_non_json_body() {
        let err = classify_failure(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>", "x");
        assert!(matches!(err, InstagramError::Api { status: 502, .. }));
    }

    #[test]
    fn test_restore_moves_state_to_authenticated() {
        let mut client = InstagramClient::new();
        assert_eq!(client.state(), SessionState::Unauthenticated);

        let data = SessionData {
            username: "driven34".to_string(),
            user_id: Some(42),
            device_id: "android-test".to_string(),
            client_uuid: "uuid-test".to_string(),
            cookies: HashMap::from([(
                "sessionid".to_string(),
                "opaque-session-token".to_string(),
            )]),
            saved_at: Utc::now(),
        };
        client.restore(&data);

        assert_eq!(client.state(), SessionState::Authenticated);
        assert_eq!(client.device().device_id, "android-test");

        // Restored cookies survive a snapshot round-trip
        let snapshot = client.session_data().unwrap();
        assert_eq!(snapshot.username, "driven34");
        assert_eq!(
            snapshot.cookies.get("sessionid").map(String::as_str),
            Some("opaque-session-token")
        );
    }

    #[test]
    fn test_mark_expired() {
        let mut client = InstagramClient::new();
        client.mark_expired();
        assert_eq!(client.state(), SessionState::Expired);
    }
}
