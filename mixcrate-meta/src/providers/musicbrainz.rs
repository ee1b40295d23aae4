//! MusicBrainz recording search adapter
//!
//! Queries the MusicBrainz `/ws/2/recording` search endpoint with a
//! Lucene-style query built from whichever parts of the search are present.
//! MusicBrainz recordings carry no album or cover information here; the
//! album is echoed from the query so the candidate still scores for it when
//! the caller knew it.

use super::{ProviderAdapter, ProviderError, RateLimiter, RawCandidate};
use crate::types::SearchQuery;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

const MUSICBRAINZ_BASE_URL: &str = "https://musicbrainz.org/ws/2";
const USER_AGENT: &str = "mixcrate/0.1.0 (https://github.com/mixcrate/mixcrate)";
const RATE_LIMIT_MS: u64 = 1000; // MusicBrainz allows 1 request per second
const RESULT_LIMIT: usize = 20;

pub const SOURCE_NAME: &str = "musicbrainz";

/// MusicBrainz recording search response (subset)
#[derive(Debug, Deserialize)]
struct RecordingSearchResponse {
    #[serde(default)]
    recordings: Vec<MBRecording>,
}

#[derive(Debug, Deserialize)]
struct MBRecording {
    title: Option<String>,
    /// Recording length in milliseconds
    length: Option<i64>,
    #[serde(rename = "artist-credit", default)]
    artist_credit: Vec<MBArtistCredit>,
}

#[derive(Debug, Deserialize)]
struct MBArtistCredit {
    name: Option<String>,
}

/// MusicBrainz search adapter
pub struct MusicBrainzProvider {
    http_client: reqwest::Client,
    rate_limiter: Arc<RateLimiter>,
}

impl MusicBrainzProvider {
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            rate_limiter: Arc::new(RateLimiter::new(RATE_LIMIT_MS)),
        })
    }

    /// Build the Lucene query string from the present search parts
    fn build_query(query: &SearchQuery) -> String {
        let mut parts = Vec::new();
        if let Some(artist) = &query.artist {
            parts.push(format!("artist:{}", artist));
        }
        if let Some(album) = &query.album {
            parts.push(format!("release:{}", album));
        }
        if let Some(title) = &query.title {
            parts.push(format!("recording:{}", title));
        }
        if parts.is_empty() {
            return query
                .title
                .clone()
                .or_else(|| query.album.clone())
                .or_else(|| query.artist.clone())
                .unwrap_or_default();
        }
        parts.join(" ")
    }

    fn to_raw_candidates(response: RecordingSearchResponse, query: &SearchQuery) -> Vec<RawCandidate> {
        response
            .recordings
            .into_iter()
            .take(RESULT_LIMIT)
            .map(|recording| {
                let artist = {
                    let names: Vec<&str> = recording
                        .artist_credit
                        .iter()
                        .filter_map(|credit| credit.name.as_deref())
                        .collect();
                    if names.is_empty() {
                        None
                    } else {
                        Some(names.join(", "))
                    }
                };
                RawCandidate {
                    source: SOURCE_NAME.to_string(),
                    title: recording.title,
                    artist,
                    album: query.album.clone(),
                    year: None,
                    duration_ms: recording.length,
                    cover_url: None,
                }
            })
            .collect()
    }
}

#[async_trait]
impl ProviderAdapter for MusicBrainzProvider {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawCandidate>, ProviderError> {
        self.rate_limiter.wait().await;

        let lucene_query = Self::build_query(query);
        let url = format!("{}/recording", MUSICBRAINZ_BASE_URL);

        tracing::debug!(query = %lucene_query, "Querying MusicBrainz recording search");

        let response = self
            .http_client
            .get(&url)
            .query(&[("query", lucene_query.as_str()), ("fmt", "json")])
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(status.as_u16(), error_text));
        }

        let parsed: RecordingSearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        let candidates = Self::to_raw_candidates(parsed, query);
        tracing::debug!(count = candidates.len(), "MusicBrainz search complete");
        Ok(candidates)
    }
}
