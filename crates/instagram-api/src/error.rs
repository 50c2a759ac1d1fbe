//! Error types for the Instagram private-API client

use std::fmt;

/// Errors that can occur when interacting with the Instagram private API
#[derive(Debug)]
pub enum InstagramError {
    /// HTTP request failed
    Http(reqwest::Error),
    /// Failed to parse JSON response
    Json(serde_json::Error),
    /// Reading or writing the persisted session blob failed
    Io(Box<std::io::Error>),
    /// Login was rejected by the platform
    LoginFailed(String),
    /// No account exists for the requested username
    UserNotFound(String),
    /// The account exists but its content is not accessible
    PrivateAccount(String),
    /// The platform demands additional verification before continuing
    ChallengeRequired,
    /// The cached session is no longer accepted
    SessionExpired,
    /// Any other platform failure, message passed through unchanged
    Api { status: u16, message: String },
}

impl fmt::Display for InstagramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "Instagram HTTP error: {}", e),
            Self::Json(e) => write!(f, "Instagram JSON parse error: {}", e),
            Self::Io(e) => write!(f, "Session IO error: {}", e),
            Self::LoginFailed(msg) => write!(f, "Login failed: {}", msg),
            Self::UserNotFound(username) => write!(f, "User not found: {}", username),
            Self::PrivateAccount(username) => write!(f, "Private account: {}", username),
            Self::ChallengeRequired => write!(f, "Challenge required"),
            Self::SessionExpired => write!(f, "Session expired"),
            Self::Api { status, message } => {
                write!(f, "Instagram API error ({}): {}", status, message)
            }
        }
    }
}

impl std::error::Error for InstagramError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Io(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for InstagramError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

impl From<serde_json::Error> for InstagramError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<std::io::Error> for InstagramError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(Box::new(e))
    }
}

/// Result type for Instagram API operations
pub type Result<T> = std::result::Result<T, InstagramError>;
