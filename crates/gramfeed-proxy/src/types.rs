//! Core types for the feed proxy

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Login credentials for the proxied Instagram account
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Configuration for the feed proxy
#[derive(Debug, Clone)]
pub struct FeedProxyConfig {
    pub port: u16,
    pub session_file: PathBuf,
    pub probe_timeout: Duration,
}

impl Default for FeedProxyConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            session_file: PathBuf::from("./session.json"),
            probe_timeout: Duration::from_secs(5),
        }
    }
}

/// Successful /feed response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedResponse {
    pub success: bool,
    pub username: String,
    pub count: usize,
    pub images: Vec<String>,
    pub message: String,
}

/// One row of the /diagnostics breakdown.
///
/// `url` stays in the JSON even when null so a dead media item is visible
/// as such.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsEntry {
    pub index: usize,
    pub media_id: String,
    pub url: Option<String>,
    pub working: bool,
}

/// /diagnostics response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsResponse {
    pub username: String,
    pub total_medias: usize,
    pub working_images: usize,
    pub results: Vec<DiagnosticsEntry>,
}

/// /health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub instagram: String,
    pub uptime_secs: u64,
}
