//! External catalog provider adapters
//!
//! Each adapter turns one catalog's search API into a uniform sequence of
//! raw candidate records. Adapter failures are per-provider: the aggregator
//! absorbs them and carries on with the remaining providers.

pub mod discogs;
pub mod musicbrainz;

pub use discogs::DiscogsProvider;
pub use musicbrainz::MusicBrainzProvider;

use crate::types::SearchQuery;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;

/// Provider adapter errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Raw candidate record as returned by one provider, before normalization
/// and scoring
#[derive(Debug, Clone, Default)]
pub struct RawCandidate {
    /// Provider identifier (e.g. "musicbrainz")
    pub source: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub year: Option<i64>,
    pub duration_ms: Option<i64>,
    pub cover_url: Option<String>,
}

/// One external metadata catalog
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Provider identifier used for logging and candidate tagging
    fn name(&self) -> &'static str;

    /// Search the catalog; returns a finite batch of raw candidates
    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawCandidate>, ProviderError>;
}

/// Paces requests so adapters honor their catalog's minimum spacing
pub(crate) struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub(crate) fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Sleep out the remainder of the interval, then claim the next slot
    ///
    /// The lock is held across the sleep so concurrent callers queue
    /// rather than racing past the interval together.
    pub(crate) async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(previous) = *last {
            let since = previous.elapsed();
            if since < self.min_interval {
                let remaining = self.min_interval - since;
                tracing::trace!(wait = ?remaining, "Pacing catalog request");
                tokio::time::sleep(remaining).await;
            }
        }

        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_request_passes_immediately() {
        let limiter = RateLimiter::new(200);

        let start = Instant::now();
        limiter.wait().await;

        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_consecutive_requests_are_spaced_apart() {
        let limiter = RateLimiter::new(200);

        let start = Instant::now();
        limiter.wait().await;
        limiter.wait().await;

        // Second call sleeps out what remains of the 200ms interval
        assert!(start.elapsed() >= Duration::from_millis(150));
    }
}
