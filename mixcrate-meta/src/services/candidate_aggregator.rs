//! Candidate aggregation across providers
//!
//! Fans one query out to every configured provider concurrently, normalizes
//! and scores whatever comes back, and ranks the combined list. A provider
//! failure or timeout drops that provider's candidates only; aggregation
//! never fails wholesale.

use crate::db::candidates::Candidate;
use crate::providers::ProviderAdapter;
use crate::services::candidate_scorer;
use crate::types::SearchQuery;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(20);

/// Candidate aggregator
pub struct CandidateAggregator {
    providers: Vec<Arc<dyn ProviderAdapter>>,
    provider_timeout: Duration,
}

impl CandidateAggregator {
    pub fn new(providers: Vec<Arc<dyn ProviderAdapter>>) -> Self {
        Self {
            providers,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    pub fn with_timeout(providers: Vec<Arc<dyn ProviderAdapter>>, timeout: Duration) -> Self {
        Self {
            providers,
            provider_timeout: timeout,
        }
    }

    /// Query every provider and return the combined candidates ranked by
    /// descending score
    ///
    /// The sort is stable, so equal scores keep provider-invocation order:
    /// within one provider, the provider's own result order; across
    /// providers, the order they were configured in.
    pub async fn aggregate(&self, query: &SearchQuery) -> Vec<Candidate> {
        let searches = self.providers.iter().map(|provider| async move {
            tokio::time::timeout(self.provider_timeout, provider.search(query)).await
        });
        let results = futures::future::join_all(searches).await;

        let mut candidates = Vec::new();
        for (provider, result) in self.providers.iter().zip(results) {
            match result {
                Ok(Ok(raws)) => {
                    tracing::debug!(
                        provider = provider.name(),
                        count = raws.len(),
                        "Provider returned candidates"
                    );
                    candidates.extend(raws.into_iter().map(candidate_scorer::normalize_and_score));
                }
                Ok(Err(e)) => {
                    tracing::warn!(
                        provider = provider.name(),
                        error = %e,
                        "Provider search failed, omitting its candidates"
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        provider = provider.name(),
                        timeout = ?self.provider_timeout,
                        "Provider search timed out, omitting its candidates"
                    );
                }
            }
        }

        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        candidates
    }

    /// Highest-scored candidate from an already-ranked list
    pub fn choose_best(candidates: &[Candidate]) -> Option<&Candidate> {
        candidates.first()
    }
}

/// Derive the stable temporary reference for a local audio path
///
/// 16 hex characters of the SHA-256 of the path.
pub fn derive_temp_ref(path_audio: &str) -> String {
    let digest = Sha256::digest(path_audio.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    hex[..16].to_string()
}
