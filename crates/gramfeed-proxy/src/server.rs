//! HTTP server for the feed proxy endpoints
//!
//! Provides /feed, /diagnostics, and /health.

use crate::error::ApiError;
use crate::resolver::ImageResolver;
use crate::types::{
    Credentials, DiagnosticsEntry, DiagnosticsResponse, FeedResponse, HealthResponse,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use instagram_api::{InstagramClient, SessionState, SessionStore};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Media sampled per /diagnostics request
const DIAGNOSTIC_SAMPLE: usize = 10;

/// Shared state for the HTTP server.
///
/// The Instagram client is one logical session with one login context;
/// it is not safe for concurrent use, so it sits behind a mutex and
/// requests serialize at the handlers.
pub struct ServerState {
    pub resolver: ImageResolver,
    pub instagram: Mutex<InstagramClient>,
    pub store: SessionStore,
    pub credentials: Credentials,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(
        resolver: ImageResolver,
        client: InstagramClient,
        store: SessionStore,
        credentials: Credentials,
    ) -> Self {
        Self {
            resolver,
            instagram: Mutex::new(client),
            store,
            credentials,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<ServerState>;

/// Feed query parameters
#[derive(Deserialize)]
pub struct FeedQuery {
    user: String,
    #[serde(default = "default_count")]
    count: usize,
}

fn default_count() -> usize {
    12
}

/// Diagnostics query parameters
#[derive(Deserialize)]
pub struct DiagnosticsQuery {
    user: String,
}

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/feed", get(feed))
        .route("/diagnostics", get(diagnostics))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(state: SharedState, port: u16) -> std::io::Result<()> {
    let router = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await
}

/// Validate the session before a fetch, re-authenticating when the
/// platform no longer accepts it
async fn ensure_session(
    client: &mut InstagramClient,
    store: &SessionStore,
    credentials: &Credentials,
) -> Result<(), ApiError> {
    if client.state() == SessionState::Authenticated {
        match client.account_info().await {
            Ok(_) => return Ok(()),
            Err(e) => {
                warn!(error = %e, "Session no longer valid, re-authenticating");
                client.mark_expired();
            }
        }
    }

    if let Err(e) = store.clear() {
        warn!(error = %e, "Failed to clear stale session blob");
    }

    let blob = client
        .login(&credentials.username, &credentials.password)
        .await?;
    if let Err(e) = store.save(&blob) {
        warn!(error = %e, "Failed to persist session blob");
    }

    info!(username = %credentials.username, "Authenticated");
    Ok(())
}

/// Verified image feed for a user
async fn feed(
    State(state): State<SharedState>,
    Query(params): Query<FeedQuery>,
) -> Result<Json<FeedResponse>, ApiError> {
    let mut client = state.instagram.lock().await;
    ensure_session(&mut client, &state.store, &state.credentials).await?;

    info!(username = %params.user, count = params.count, "Looking for working images");
    let images = state
        .resolver
        .fetch_recent_verified_images(&client, &params.user, params.count)
        .await?;

    if images.is_empty() {
        return Err(ApiError::NoWorkingImages(params.user));
    }

    Ok(Json(FeedResponse {
        success: true,
        username: params.user,
        count: images.len(),
        message: format!("{} working images found", images.len()),
        images,
    }))
}

/// Per-media breakdown for a small fixed sample, for operational debugging
async fn diagnostics(
    State(state): State<SharedState>,
    Query(params): Query<DiagnosticsQuery>,
) -> Result<Json<DiagnosticsResponse>, ApiError> {
    let mut client = state.instagram.lock().await;
    ensure_session(&mut client, &state.store, &state.credentials).await?;

    let user = client.user_by_username(&params.user).await?;
    let medias = client.user_medias(user.pk, DIAGNOSTIC_SAMPLE).await?;

    let mut results = Vec::with_capacity(medias.len());
    for (index, media) in medias.iter().enumerate() {
        let url = state.resolver.resolve(media).await;
        results.push(DiagnosticsEntry {
            index: index + 1,
            media_id: media.id.clone(),
            working: url.is_some(),
            url,
        });
    }

    Ok(Json(DiagnosticsResponse {
        username: params.user,
        total_medias: medias.len(),
        working_images: results.iter().filter(|r| r.working).count(),
        results,
    }))
}

/// Health check: reports whether the login session is currently valid
async fn health(State(state): State<SharedState>) -> Response {
    let uptime_secs = (Utc::now() - state.started_at).num_seconds() as u64;

    let client = state.instagram.lock().await;
    let connected = client.state() == SessionState::Authenticated
        && client.account_info().await.is_ok();

    if connected {
        Json(HealthResponse {
            status: "ok".to_string(),
            instagram: "connected".to_string(),
            uptime_secs,
        })
        .into_response()
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(HealthResponse {
                status: "error".to_string(),
                instagram: "disconnected".to_string(),
                uptime_secs,
            }),
        )
            .into_response()
    }
}
