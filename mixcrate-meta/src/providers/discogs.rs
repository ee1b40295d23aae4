//! Discogs database search adapter
//!
//! Queries the Discogs `/database/search` endpoint with a free-text query
//! built from the search parts. Discogs search results describe releases,
//! so the result title doubles as the album name for `type == "release"`
//! rows; the artist is echoed from the query. An optional personal access
//! token raises the rate limits Discogs applies to anonymous clients.

use super::{ProviderAdapter, ProviderError, RateLimiter, RawCandidate};
use crate::types::SearchQuery;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use std::sync::Arc;
use std::time::Duration;

const DISCOGS_SEARCH_URL: &str = "https://api.discogs.com/database/search";
const USER_AGENT: &str = "mixcrate/0.1.0";
const RATE_LIMIT_MS: u64 = 1000;
const RESULT_LIMIT: usize = 20;

pub const SOURCE_NAME: &str = "discogs";

/// Discogs search response (subset)
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    title: Option<String>,
    /// Discogs serializes year as a number or a string depending on the
    /// result type
    #[serde(default, deserialize_with = "year_from_any")]
    year: Option<i64>,
    #[serde(rename = "type")]
    result_type: Option<String>,
    cover_image: Option<String>,
}

fn year_from_any<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.parse::<i64>().ok(),
        _ => None,
    }))
}

/// Discogs search adapter
pub struct DiscogsProvider {
    http_client: reqwest::Client,
    rate_limiter: Arc<RateLimiter>,
    token: Option<String>,
}

impl DiscogsProvider {
    pub fn new(timeout: Duration, token: Option<String>) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            rate_limiter: Arc::new(RateLimiter::new(RATE_LIMIT_MS)),
            token,
        })
    }

    /// Free-text query from the present search parts
    fn build_query(query: &SearchQuery) -> String {
        [&query.artist, &query.album, &query.title]
            .into_iter()
            .flatten()
            .cloned()
            .collect::<Vec<String>>()
            .join(" ")
    }

    fn to_raw_candidates(response: SearchResponse, query: &SearchQuery) -> Vec<RawCandidate> {
        response
            .results
            .into_iter()
            .take(RESULT_LIMIT)
            .map(|result| {
                let album = if result.result_type.as_deref() == Some("release") {
                    result.title.clone()
                } else {
                    query.album.clone()
                };
                RawCandidate {
                    source: SOURCE_NAME.to_string(),
                    title: result.title,
                    artist: query.artist.clone(),
                    album,
                    year: result.year,
                    duration_ms: None,
                    cover_url: result.cover_image,
                }
            })
            .collect()
    }
}

#[async_trait]
impl ProviderAdapter for DiscogsProvider {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawCandidate>, ProviderError> {
        self.rate_limiter.wait().await;

        let text_query = Self::build_query(query);
        tracing::debug!(query = %text_query, "Querying Discogs database search");

        let mut request = self
            .http_client
            .get(DISCOGS_SEARCH_URL)
            .query(&[("q", text_query.as_str())]);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Discogs token={}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(status.as_u16(), error_text));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        let candidates = Self::to_raw_candidates(parsed, query);
        tracing::debug!(count = candidates.len(), "Discogs search complete");
        Ok(candidates)
    }
}
