//! Error types for the feed proxy

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use instagram_api::InstagramError;
use serde_json::json;
use std::fmt;

/// Startup and configuration errors for the binary
#[derive(Debug)]
pub enum FeedProxyError {
    Config(String),
    Instagram(InstagramError),
}

impl fmt::Display for FeedProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Instagram(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for FeedProxyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(_) => None,
            Self::Instagram(e) => Some(e),
        }
    }
}

impl From<InstagramError> for FeedProxyError {
    fn from(e: InstagramError) -> Self {
        Self::Instagram(e)
    }
}

impl From<tracing_subscriber::filter::ParseError> for FeedProxyError {
    fn from(e: tracing_subscriber::filter::ParseError) -> Self {
        Self::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FeedProxyError>;

/// Request-level error, classified into an HTTP response at the boundary.
///
/// Classification happens exactly once, here; the resolver and the client
/// propagate platform errors unchanged.
#[derive(Debug)]
pub enum ApiError {
    Instagram(InstagramError),
    /// The resolver ran to completion and found zero reachable URLs;
    /// distinct from "user not found"
    NoWorkingImages(String),
}

impl From<InstagramError> for ApiError {
    fn from(e: InstagramError) -> Self {
        Self::Instagram(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Instagram(InstagramError::UserNotFound(username)) => (
                StatusCode::NOT_FOUND,
                format!("User @{} not found", username),
            ),
            Self::Instagram(InstagramError::PrivateAccount(username)) => (
                StatusCode::FORBIDDEN,
                format!("Account @{} is private", username),
            ),
            Self::Instagram(InstagramError::ChallengeRequired) => (
                StatusCode::TOO_MANY_REQUESTS,
                "Instagram requires additional verification".to_string(),
            ),
            Self::Instagram(
                e @ (InstagramError::LoginFailed(_) | InstagramError::SessionExpired),
            ) => {
                tracing::error!(error = %e, "Instagram login failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Instagram login failed".to_string(),
                )
            }
            Self::Instagram(e) => {
                tracing::error!(error = %e, "Instagram API failure");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            Self::NoWorkingImages(username) => (
                StatusCode::NOT_FOUND,
                format!("No working images found for @{}", username),
            ),
        };

        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_user_not_found_is_404() {
        let response =
            ApiError::from(InstagramError::UserNotFound("ghost".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("@ghost"));
    }

    #[tokio::test]
    async fn test_private_account_is_403_and_names_the_user() {
        let response =
            ApiError::from(InstagramError::PrivateAccount("driven34".to_string()))
                .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("driven34"));
    }

    #[tokio::test]
    async fn test_challenge_required_is_429() {
        let response = ApiError::from(InstagramError::ChallengeRequired).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_no_working_images_is_404_distinct_from_not_found() {
        let response = ApiError::NoWorkingImages("driven34".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = body_json(response).await;
        let message = json["error"].as_str().unwrap();
        assert!(message.contains("No working images"));
        assert!(message.contains("driven34"));
    }

    #[tokio::test]
    async fn test_unclassified_error_passes_message_through() {
        let response = ApiError::from(InstagramError::Api {
            status: 400,
            message: "feedback_required".to_string(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("feedback_required"));
    }

    #[test]
    fn test_config_error_display() {
        let err = FeedProxyError::Config("IG_USERNAME is not set".to_string());
        assert_eq!(
            format!("{}", err),
            "Configuration error: IG_USERNAME is not set"
        );
    }
}
