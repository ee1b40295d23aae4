//! mixcrate-meta: metadata reconciliation & provenance engine
//!
//! Reconciles track metadata gathered from disagreeing external catalogs
//! into the canonical library record, keeping a reversible audit trail of
//! every field it fills:
//!
//! - aggregation: concurrent provider fan-out, normalization, completeness
//!   scoring, ranked candidate lists persisted under a temporary reference
//! - merge: fill-only-missing application of a chosen candidate, each write
//!   attributed in the append-only provenance ledger
//! - provenance: ledger queries, per-field revert, fuzzy confidence
//!   recalculation against the live values

pub mod db;
pub mod providers;
pub mod services;
pub mod types;

pub use db::attribution::AttributionEntry;
pub use db::candidates::Candidate;
pub use db::tracks::Track;
pub use types::{AttributedField, SearchQuery};

use mixcrate_common::Result;
use services::cover_resolver::CoverResolver;
use services::{CandidateAggregator, MergeEngine, TrackDiff};
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

/// Facade over the reconciliation engine
///
/// Bundles the aggregator, merge engine, and ledger operations behind the
/// call contracts the (out-of-scope) API layer consumes.
pub struct MetadataEngine {
    db: SqlitePool,
    aggregator: CandidateAggregator,
    merge: MergeEngine,
}

impl MetadataEngine {
    pub fn new(
        db: SqlitePool,
        aggregator: CandidateAggregator,
        cover_resolver: Arc<dyn CoverResolver>,
    ) -> Self {
        let merge = MergeEngine::new(db.clone(), cover_resolver);
        Self {
            db,
            aggregator,
            merge,
        }
    }

    pub fn db(&self) -> &SqlitePool {
        &self.db
    }

    /// Ranked candidates for a query, without persistence
    pub async fn aggregate(&self, query: &SearchQuery) -> Vec<Candidate> {
        self.aggregator.aggregate(query).await
    }

    /// Aggregate and persist under the temporary reference derived from a
    /// local audio path
    ///
    /// Returns the reference together with the persisted candidates
    /// (re-read from the store, so earlier passes for the same path are
    /// included).
    pub async fn aggregate_for_path(
        &self,
        query: &SearchQuery,
        path_audio: &str,
    ) -> Result<(String, Vec<Candidate>)> {
        let candidates = self.aggregator.aggregate(query).await;
        let temp_ref = services::derive_temp_ref(path_audio);
        db::candidates::insert_candidates(&self.db, &temp_ref, &candidates).await?;
        let persisted = db::candidates::fetch_by_temp_ref(&self.db, &temp_ref).await?;
        Ok((temp_ref, persisted))
    }

    /// Persisted candidates for a temporary reference, best score first
    pub async fn fetch_candidates(&self, temp_ref: &str) -> Result<Vec<Candidate>> {
        db::candidates::fetch_by_temp_ref(&self.db, temp_ref).await
    }

    /// Highest-scored candidate from an already-ranked list
    pub fn choose_best<'a>(&self, candidates: &'a [Candidate]) -> Option<&'a Candidate> {
        CandidateAggregator::choose_best(candidates)
    }

    /// Apply a candidate onto a track (fill-only-missing)
    pub async fn apply(&self, candidate_id: Uuid, track_id: Uuid) -> Result<Track> {
        self.merge.apply(candidate_id, track_id).await
    }

    /// Apply pairs independently; returns the pairs that succeeded
    pub async fn bulk_apply(&self, pairs: &[(Uuid, Uuid)]) -> Result<Vec<(Uuid, Uuid)>> {
        self.merge.bulk_apply(pairs).await
    }

    /// Attribution history for a track, newest first
    pub async fn get_attribution(&self, track_id: Uuid) -> Result<Vec<AttributionEntry>> {
        services::provenance::get_attribution(&self.db, track_id).await
    }

    /// Revert the head ledger entry for a field; `false` when there is
    /// nothing to revert
    pub async fn revert(&self, track_id: Uuid, field_name: &str) -> Result<bool> {
        services::provenance::revert(&self.db, track_id, field_name).await
    }

    /// Recompute ledger confidence against the track's live values
    pub async fn recalculate_confidence(&self, track_id: Uuid) -> Result<bool> {
        services::confidence::recalculate(&self.db, track_id).await
    }

    /// Read-only review view: current track + attribution + pending
    /// candidates
    pub async fn diff(&self, track_id: Uuid, temp_ref: Option<&str>) -> Result<TrackDiff> {
        services::review::diff(&self.db, track_id, temp_ref).await
    }
}
