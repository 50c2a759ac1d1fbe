//! Best-working-image selection
//!
//! Given a media item exposing several candidate image URLs at different
//! resolutions, pick the highest-priority URL that is actually live. A URL
//! counts as live when a header-only probe comes back with a success
//! status inside the probe timeout.

use instagram_api::{InstagramClient, InstagramError, Media};
use std::cmp::Reverse;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Outcome of a single liveness probe.
///
/// Probing never fails from the caller's perspective; every transport
/// problem collapses into one of the non-reachable outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Reachable,
    Unreachable(String),
    TimedOut,
}

impl ProbeOutcome {
    pub fn is_reachable(&self) -> bool {
        matches!(self, Self::Reachable)
    }
}

/// Probes candidate image URLs and picks the best working one per media
pub struct ImageResolver {
    http: reqwest::Client,
}

impl ImageResolver {
    /// Default per-probe timeout
    pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Platform cap on how many media one feed request may ask for
    pub const MAX_FEED_COUNT: usize = 50;

    /// Fixed over-fetch multiplier compensating for media that fail
    /// verification; deliberately non-adaptive
    const FETCH_MULTIPLIER: usize = 2;

    /// Pause before the first platform call of a fetch
    const INITIAL_PAUSE: Duration = Duration::from_secs(1);

    /// Media processed between pacing pauses
    const PACE_EVERY: usize = 5;

    /// Length of each pacing pause
    const PACE_PAUSE: Duration = Duration::from_millis(500);

    pub fn new() -> Self {
        Self::with_timeout(Self::DEFAULT_PROBE_TIMEOUT)
    }

    /// Create a resolver whose probes are bounded by `timeout`.
    /// `timeout` must be positive.
    pub fn with_timeout(timeout: Duration) -> Self {
        assert!(!timeout.is_zero(), "probe timeout must be positive");
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { http }
    }

    /// Header-only liveness check, following redirects
    pub async fn probe(&self, url: &str) -> ProbeOutcome {
        if Url::parse(url).is_err() {
            return ProbeOutcome::Unreachable("not a valid absolute URL".to_string());
        }

        match self.http.head(url).send().await {
            Ok(response) if response.status().is_success() => ProbeOutcome::Reachable,
            Ok(response) => ProbeOutcome::Unreachable(format!("status {}", response.status())),
            Err(e) if e.is_timeout() => ProbeOutcome::TimedOut,
            Err(e) => ProbeOutcome::Unreachable(e.to_string()),
        }
    }

    /// Candidate URLs for one media item, in probe order: the thumbnail,
    /// then the display URL, then every rendition largest-area first.
    ///
    /// The rendition sort is stable, so renditions of equal area keep
    /// their wire order. Renditions without a URL are skipped.
    pub fn candidate_urls(media: &Media) -> Vec<String> {
        let mut urls = Vec::new();

        if let Some(thumbnail) = &media.thumbnail_url {
            urls.push(thumbnail.clone());
        }
        if let Some(display) = &media.display_url {
            urls.push(display.clone());
        }
        if let Some(versions) = &media.image_versions2 {
            let mut renditions: Vec<(String, u64)> = versions
                .candidates
                .iter()
                .filter_map(|c| {
                    let url = c.url.clone()?;
                    let area =
                        u64::from(c.width.unwrap_or(0)) * u64::from(c.height.unwrap_or(0));
                    Some((url, area))
                })
                .collect();
            renditions.sort_by_key(|&(_, area)| Reverse(area));
            urls.extend(renditions.into_iter().map(|(url, _)| url));
        }

        urls
    }

    /// Pick the best working image URL for one media item.
    ///
    /// Returns the first candidate whose probe succeeds, or `None` once
    /// the list is exhausted. Only URLs present in the input are ever
    /// returned.
    pub async fn resolve(&self, media: &Media) -> Option<String> {
        for url in Self::candidate_urls(media) {
            match self.probe(&url).await {
                ProbeOutcome::Reachable => {
                    debug!(media_id = %media.id, url = %url, "Image URL is live");
                    return Some(url);
                }
                outcome => {
                    debug!(media_id = %media.id, url = %url, outcome = ?outcome, "Image URL rejected");
                }
            }
        }
        None
    }

    /// Resolve media in platform order, collecting verified URLs until
    /// `desired` are found or the list runs out.
    ///
    /// Pauses briefly after every few media processed to stay under the
    /// platform's abuse heuristics; pacing, not retry.
    pub async fn collect_verified(&self, medias: &[Media], desired: usize) -> Vec<String> {
        let mut verified = Vec::new();

        for (tested, media) in medias.iter().enumerate() {
            if verified.len() >= desired {
                break;
            }

            if let Some(url) = self.resolve(media).await {
                verified.push(url);
                debug!(found = verified.len(), desired, "Verified image");
            }

            if (tested + 1) % Self::PACE_EVERY == 0 {
                tokio::time::sleep(Self::PACE_PAUSE).await;
            }
        }

        verified
    }

    /// Batch size requested from the platform for a desired image count:
    /// the count is clamped to the platform cap, then doubled
    pub fn batch_size(desired: usize) -> usize {
        desired.min(Self::MAX_FEED_COUNT) * Self::FETCH_MULTIPLIER
    }

    /// Fetch a user's recent posts and return up to `desired` verified
    /// image URLs, in post order.
    ///
    /// Platform errors propagate unchanged; the caller classifies them.
    pub async fn fetch_recent_verified_images(
        &self,
        client: &InstagramClient,
        username: &str,
        desired: usize,
    ) -> Result<Vec<String>, InstagramError> {
        let desired = desired.min(Self::MAX_FEED_COUNT);

        tokio::time::sleep(Self::INITIAL_PAUSE).await;

        let user = client.user_by_username(username).await?;
        let medias = client
            .user_medias(user.pk, Self::batch_size(desired))
            .await
            // The feed endpoint only knows the numeric id; surface the
            // username in account-level errors instead
            .map_err(|e| match e {
                InstagramError::PrivateAccount(_) => {
                    InstagramError::PrivateAccount(username.to_string())
                }
                InstagramError::UserNotFound(_) => {
                    InstagramError::UserNotFound(username.to_string())
                }
                other => other,
            })?;

        info!(
            username,
            medias = medias.len(),
            desired,
            "Verifying recent media"
        );
        Ok(self.collect_verified(&medias, desired).await)
    }
}

impl Default for ImageResolver {
    fn default() -> Self {
        Self::new()
    }
}
