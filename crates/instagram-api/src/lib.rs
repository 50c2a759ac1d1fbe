//! Rust client for Instagram's unofficial private mobile API
//!
//! Covers the small slice of the private API a feed proxy needs: password
//! login with a persistable session blob, session validity checks, username
//! resolution, and single-batch media listing.
//!
//! # Example
//!
//! ```no_run
//! use instagram_api::{InstagramClient, SessionStore};
//!
//! # async fn example() -> Result<(), instagram_api::InstagramError> {
//! let store = SessionStore::new("session.json");
//! let mut client = InstagramClient::new();
//!
//! match store.load() {
//!     Some(blob) => client.restore(&blob),
//!     None => {
//!         let blob = client.login("username", "password").await?;
//!         store.save(&blob)?;
//!     }
//! }
//!
//! let user = client.user_by_username("driven34").await?;
//! let medias = client.user_medias(user.pk, 24).await?;
//! println!("{} recent posts", medias.len());
//! # Ok(())
//! # }
//! ```
//!
//! # API Coverage
//!
//! - `POST /accounts/login/` - password login (signed_body form)
//! - `GET /accounts/current_user/` - session validity check
//! - `GET /users/{username}/usernameinfo/` - username resolution
//! - `GET /feed/user/{id}/` - recent media, single batch
//!
//! The session lifecycle is explicit: [`SessionState`] tracks
//! `Unauthenticated` / `Authenticated` / `Expired`, and [`SessionStore`]
//! persists the [`SessionData`] blob between runs.

mod client;
mod error;
mod session;
mod types;

pub use client::{DeviceProfile, InstagramClient};
pub use error::{InstagramError, Result};
pub use session::{SessionData, SessionState, SessionStore};
pub use types::{
    ApiErrorBody, CurrentUserResponse, ImageCandidate, ImageVersions, LoginResponse, Media, User,
    UserFeedResponse, UsernameInfoResponse,
};
