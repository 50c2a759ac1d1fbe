//! gramfeed proxy - Instagram feed proxy serving verified image URLs
//!
//! Authenticates to Instagram with a cached session, fetches a user's
//! recent posts, and serves only the image URLs that pass a liveness
//! probe.

mod error;
mod resolver;
mod server;
mod types;

use crate::error::{FeedProxyError, Result};
use crate::resolver::ImageResolver;
use crate::server::{start_server, ServerState, SharedState};
use crate::types::{Credentials, FeedProxyConfig};
use instagram_api::{InstagramClient, InstagramError, SessionStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env().add_directive("gramfeed_proxy=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    // Credentials may live in a local .env
    dotenvy::dotenv().ok();

    info!("Starting gramfeed proxy...");

    let (config, credentials) = load_config()?;
    info!("Port: {}", config.port);
    info!("Session file: {:?}", config.session_file);
    info!("Probe timeout: {:?}", config.probe_timeout);

    let store = SessionStore::new(config.session_file.clone());
    let mut client = InstagramClient::new();

    // Restore the cached session if the platform still accepts it,
    // otherwise log in fresh. A failed startup login is not fatal: the
    // handlers re-attempt per request.
    match establish_session(&mut client, &store, &credentials).await {
        Ok(()) => info!(username = %credentials.username, "Instagram session ready"),
        Err(e) => warn!(error = %e, "Startup login failed; will retry per request"),
    }

    let resolver = ImageResolver::with_timeout(config.probe_timeout);
    let state: SharedState = Arc::new(ServerState::new(resolver, client, store, credentials));

    // Start HTTP server (blocking)
    start_server(state, config.port)
        .await
        .map_err(|e| FeedProxyError::Config(format!("Server error: {}", e)))?;

    Ok(())
}

async fn establish_session(
    client: &mut InstagramClient,
    store: &SessionStore,
    credentials: &Credentials,
) -> std::result::Result<(), InstagramError> {
    if let Some(blob) = store.load() {
        client.restore(&blob);
        match client.account_info().await {
            Ok(_) => {
                info!("Logged in with cached session");
                return Ok(());
            }
            Err(e) => {
                warn!(error = %e, "Cached session rejected, logging in fresh");
                client.mark_expired();
                store.clear()?;
            }
        }
    }

    let blob = client
        .login(&credentials.username, &credentials.password)
        .await?;
    store.save(&blob)?;
    info!("New login succeeded, session saved");
    Ok(())
}

fn load_config() -> Result<(FeedProxyConfig, Credentials)> {
    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(5000);

    let session_file = std::env::var("SESSION_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./session.json"));

    let probe_timeout = std::env::var("PROBE_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|&secs| secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(ImageResolver::DEFAULT_PROBE_TIMEOUT);

    let username = std::env::var("IG_USERNAME")
        .map_err(|_| FeedProxyError::Config("IG_USERNAME is not set".to_string()))?;
    let password = std::env::var("IG_PASSWORD")
        .map_err(|_| FeedProxyError::Config("IG_PASSWORD is not set".to_string()))?;

    Ok((
        FeedProxyConfig {
            port,
            session_file,
            probe_timeout,
        },
        Credentials { username, password },
    ))
}
