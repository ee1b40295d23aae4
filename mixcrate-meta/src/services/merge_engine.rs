//! Merge engine
//!
//! Applies a chosen candidate onto a canonical track with a fill-only-missing
//! policy: a field is written only when its current value is empty, and every
//! empty-to-filled transition is recorded in the attribution ledger. The
//! track update, the candidate's applied flag, and the ledger appends commit
//! in one transaction so readers never observe one without the others.

use crate::db::{self, attribution, candidates, tracks};
use crate::db::candidates::Candidate;
use crate::db::tracks::Track;
use crate::services::candidate_scorer::MAX_SCORE;
use crate::services::cover_resolver::CoverResolver;
use crate::types::AttributedField;
use mixcrate_common::{Error, Result};
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

/// Merge engine
pub struct MergeEngine {
    db: SqlitePool,
    cover_resolver: Arc<dyn CoverResolver>,
}

fn text_empty(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn num_empty(value: Option<i64>) -> bool {
    value.map_or(true, |v| v == 0)
}

/// Fill one text field from the candidate when the existing value is empty,
/// recording the transition
fn merge_text(
    existing: &Option<String>,
    candidate: &Option<String>,
    field: AttributedField,
    changes: &mut Vec<(AttributedField, String)>,
) -> Option<String> {
    if !text_empty(existing) {
        return existing.clone();
    }
    match candidate {
        Some(value) if !value.trim().is_empty() => {
            changes.push((field, value.clone()));
            Some(value.clone())
        }
        _ => existing.clone(),
    }
}

/// Numeric twin of [`merge_text`]; zero counts as empty
fn merge_num(
    existing: Option<i64>,
    candidate: Option<i64>,
    field: AttributedField,
    changes: &mut Vec<(AttributedField, String)>,
) -> Option<i64> {
    if !num_empty(existing) {
        return existing;
    }
    match candidate {
        Some(value) if value != 0 => {
            changes.push((field, value.to_string()));
            Some(value)
        }
        _ => existing,
    }
}

impl MergeEngine {
    pub fn new(db: SqlitePool, cover_resolver: Arc<dyn CoverResolver>) -> Self {
        Self { db, cover_resolver }
    }

    /// Apply one candidate's fields onto a track
    ///
    /// Fails with `NotFound` when either the candidate or the track does not
    /// exist. Re-applying an already-applied candidate is a no-op beyond the
    /// empty-field guard.
    pub async fn apply(&self, candidate_id: Uuid, track_id: Uuid) -> Result<Track> {
        let candidate = candidates::load_candidate(&self.db, candidate_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Candidate {}", candidate_id)))?;
        let track = tracks::load_track(&self.db, track_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Track {}", track_id)))?;

        let mut changes: Vec<(AttributedField, String)> = Vec::new();
        let merged_title = merge_text(&track.title, &candidate.title, AttributedField::Title, &mut changes);
        let merged_artist = merge_text(&track.artist, &candidate.artist, AttributedField::Artist, &mut changes);
        let merged_album = merge_text(&track.album, &candidate.album, AttributedField::Album, &mut changes);
        let merged_year = merge_num(track.year, candidate.year, AttributedField::Year, &mut changes);
        let merged_duration = merge_num(
            track.duration_ms,
            candidate.duration_ms,
            AttributedField::DurationMs,
            &mut changes,
        );

        // Cover URLs are resolved to a local path before the transaction
        // opens (network I/O); resolution failure leaves the field empty.
        let merged_cover = self.resolve_cover(&track, &candidate).await;
        if let Some(path) = &merged_cover {
            if text_empty(&track.path_cover) {
                changes.push((AttributedField::CoverPath, path.clone()));
            }
        }
        let merged_cover = merged_cover.or_else(|| track.path_cover.clone());

        // Ledger confidence stays in [0,1]: candidate score over the maximum
        // achievable score.
        let confidence = (candidate.score / MAX_SCORE).clamp(0.0, 1.0);

        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            UPDATE tracks
            SET title = ?, artist = ?, album = ?, year = ?, duration_ms = ?,
                path_cover = ?, updated_at = CURRENT_TIMESTAMP
            WHERE guid = ?
            "#,
        )
        .bind(&merged_title)
        .bind(&merged_artist)
        .bind(&merged_album)
        .bind(merged_year)
        .bind(merged_duration)
        .bind(&merged_cover)
        .bind(track_id.to_string())
        .execute(&mut *tx)
        .await?;

        candidates::mark_applied(&mut *tx, candidate_id).await?;

        for (field, value) in &changes {
            attribution::record(
                &mut *tx,
                track_id,
                *field,
                Some(value),
                &candidate.source,
                Some(candidate_id),
                confidence,
            )
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            track_id = %track_id,
            candidate_id = %candidate_id,
            source = %candidate.source,
            fields_filled = changes.len(),
            "Applied candidate to track"
        );

        tracks::load_track(&self.db, track_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Track {}", track_id)))
    }

    /// Apply each (candidate, track) pair independently, returning the pairs
    /// that succeeded
    ///
    /// A missing candidate or track skips that pair; partial success is the
    /// expected outcome, not an error.
    pub async fn bulk_apply(&self, pairs: &[(Uuid, Uuid)]) -> Result<Vec<(Uuid, Uuid)>> {
        let mut applied = Vec::new();
        for &(candidate_id, track_id) in pairs {
            match self.apply(candidate_id, track_id).await {
                Ok(_) => applied.push((candidate_id, track_id)),
                Err(Error::NotFound(what)) => {
                    tracing::warn!(
                        candidate_id = %candidate_id,
                        track_id = %track_id,
                        missing = %what,
                        "Skipping bulk-apply pair"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(applied)
    }

    async fn resolve_cover(&self, track: &Track, candidate: &Candidate) -> Option<String> {
        if !text_empty(&track.path_cover) {
            return None;
        }
        let url = candidate.cover_url.as_deref()?;
        if url.trim().is_empty() {
            return None;
        }
        self.cover_resolver.resolve(track.guid, url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::setup_test_db;
    use crate::services::cover_resolver::NullCoverResolver;
    use async_trait::async_trait;

    /// Resolver returning a fixed local path, standing in for a successful
    /// download
    struct StaticCoverResolver(String);

    #[async_trait]
    impl CoverResolver for StaticCoverResolver {
        async fn resolve(&self, _track_id: Uuid, _cover_url: &str) -> Option<String> {
            Some(self.0.clone())
        }
    }

    fn candidate(title: Option<&str>, artist: Option<&str>, score: f64) -> Candidate {
        Candidate {
            guid: Uuid::new_v4(),
            source: "musicbrainz".to_string(),
            title: title.map(String::from),
            artist: artist.map(String::from),
            album: None,
            year: None,
            duration_ms: None,
            cover_url: None,
            score,
            applied: false,
        }
    }

    async fn engine(pool: &SqlitePool) -> MergeEngine {
        MergeEngine::new(pool.clone(), Arc::new(NullCoverResolver))
    }

    async fn insert(pool: &SqlitePool, track: &Track, cand: &Candidate) {
        tracks::insert_track(pool, track).await.unwrap();
        candidates::insert_candidates(pool, "test-ref", std::slice::from_ref(cand))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_apply_never_overwrites_existing_value() {
        let pool = setup_test_db().await;
        let mut track = Track::new(None);
        track.title = Some("A".to_string());
        let cand = candidate(Some("B"), None, 2.0);
        insert(&pool, &track, &cand).await;

        let merged = engine(&pool).await.apply(cand.guid, track.guid).await.unwrap();

        assert_eq!(merged.title.as_deref(), Some("A"));
        let ledger = attribution::get_attribution(&pool, track.guid).await.unwrap();
        assert!(ledger.is_empty(), "no attribution for an untouched field");
    }

    #[tokio::test]
    async fn test_apply_fills_empty_field_and_records_attribution() {
        let pool = setup_test_db().await;
        let track = Track::new(None);
        let cand = candidate(Some("Around the World"), Some("Daft Punk"), 4.0);
        insert(&pool, &track, &cand).await;

        let merged = engine(&pool).await.apply(cand.guid, track.guid).await.unwrap();

        assert_eq!(merged.title.as_deref(), Some("Around the World"));
        assert_eq!(merged.artist.as_deref(), Some("Daft Punk"));

        let ledger = attribution::get_attribution(&pool, track.guid).await.unwrap();
        assert_eq!(ledger.len(), 2);
        assert!(ledger.iter().all(|e| !e.reverted));
        assert!(ledger.iter().all(|e| e.source == "musicbrainz"));
        assert!(ledger.iter().all(|e| e.candidate_id == Some(cand.guid)));
        // score 4.0 out of 8.5
        assert!(ledger.iter().all(|e| (e.confidence - 4.0 / 8.5).abs() < 1e-9));

        let stored = candidates::load_candidate(&pool, cand.guid).await.unwrap().unwrap();
        assert!(stored.applied);
    }

    #[tokio::test]
    async fn test_apply_missing_candidate_is_not_found() {
        let pool = setup_test_db().await;
        let track = Track::new(None);
        tracks::insert_track(&pool, &track).await.unwrap();

        let result = engine(&pool).await.apply(Uuid::new_v4(), track.guid).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_apply_missing_track_is_not_found() {
        let pool = setup_test_db().await;
        let cand = candidate(Some("X"), None, 2.0);
        candidates::insert_candidates(&pool, "r", &[cand.clone()]).await.unwrap();

        let result = engine(&pool).await.apply(cand.guid, Uuid::new_v4()).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_bulk_apply_partial_success() {
        let pool = setup_test_db().await;
        let track = Track::new(None);
        let cand = candidate(Some("X"), None, 2.0);
        insert(&pool, &track, &cand).await;

        let pairs = vec![(cand.guid, track.guid), (Uuid::new_v4(), Uuid::new_v4())];
        let applied = engine(&pool).await.bulk_apply(&pairs).await.unwrap();

        assert_eq!(applied, vec![(cand.guid, track.guid)]);
    }

    #[tokio::test]
    async fn test_cover_resolution_writes_path_and_ledger() {
        let pool = setup_test_db().await;
        let track = Track::new(None);
        let mut cand = candidate(None, None, 1.0);
        cand.cover_url = Some("https://img.example.com/c.jpg".to_string());
        insert(&pool, &track, &cand).await;

        let resolver = Arc::new(StaticCoverResolver("/covers/x.jpg".to_string()));
        let merge = MergeEngine::new(pool.clone(), resolver);
        let merged = merge.apply(cand.guid, track.guid).await.unwrap();

        assert_eq!(merged.path_cover.as_deref(), Some("/covers/x.jpg"));
        let ledger = attribution::get_attribution(&pool, track.guid).await.unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].field, AttributedField::CoverPath);
    }

    #[tokio::test]
    async fn test_cover_resolution_failure_degrades_gracefully() {
        let pool = setup_test_db().await;
        let track = Track::new(None);
        let mut cand = candidate(Some("Song"), None, 3.0);
        cand.cover_url = Some("https://img.example.com/c.jpg".to_string());
        insert(&pool, &track, &cand).await;

        // NullCoverResolver stands in for a failed download
        let merged = engine(&pool).await.apply(cand.guid, track.guid).await.unwrap();

        assert!(merged.path_cover.is_none());
        assert_eq!(merged.title.as_deref(), Some("Song"), "merge still proceeds");
        let ledger = attribution::get_attribution(&pool, track.guid).await.unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].field, AttributedField::Title);
    }

    #[tokio::test]
    async fn test_reapply_is_noop_for_filled_fields() {
        let pool = setup_test_db().await;
        let track = Track::new(None);
        let cand = candidate(Some("Song"), Some("Artist"), 4.0);
        insert(&pool, &track, &cand).await;

        let merge = engine(&pool).await;
        merge.apply(cand.guid, track.guid).await.unwrap();
        merge.apply(cand.guid, track.guid).await.unwrap();

        let ledger = attribution::get_attribution(&pool, track.guid).await.unwrap();
        assert_eq!(ledger.len(), 2, "second apply adds no ledger entries");
    }
}
