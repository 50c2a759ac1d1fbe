//! Wire types for the Instagram private API
//!
//! Every image field is optional; the platform freely omits renditions
//! depending on media type and account state.

use serde::{Deserialize, Serialize};

/// An Instagram account as returned by the user endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub pk: u64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_count: Option<u64>,
}

/// One image rendition attached to a media item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageCandidate {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Rendition container (`image_versions2` on the wire)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageVersions {
    #[serde(default)]
    pub candidates: Vec<ImageCandidate>,
}

/// A single post with its image metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Media {
    pub id: String,
    #[serde(default)]
    pub media_type: Option<u8>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub display_url: Option<String>,
    #[serde(default)]
    pub image_versions2: Option<ImageVersions>,
}

/// Response envelope for `accounts/login/`
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub logged_in_user: Option<User>,
}

/// Response envelope for `accounts/current_user/`
#[derive(Debug, Deserialize)]
pub struct CurrentUserResponse {
    pub user: User,
}

/// Response envelope for `users/{username}/usernameinfo/`
#[derive(Debug, Deserialize)]
pub struct UsernameInfoResponse {
    pub user: User,
}

/// Response envelope for `feed/user/{id}/`
#[derive(Debug, Default, Deserialize)]
pub struct UserFeedResponse {
    #[serde(default)]
    pub items: Vec<Media>,
    #[serde(default)]
    pub num_results: Option<u32>,
    #[serde(default)]
    pub more_available: Option<bool>,
}

/// Error body the platform attaches to non-success responses
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub error_title: Option<String>,
}
