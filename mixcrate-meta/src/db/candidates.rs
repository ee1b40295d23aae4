//! Pending candidate persistence
//!
//! Candidates from one aggregation pass are grouped under a temporary
//! reference so they can be retrieved before any canonical track exists.
//! Rows are write-once except the `applied` flag and are retained
//! indefinitely for audit; repeated aggregation passes append rather than
//! replace.

use mixcrate_common::Result;
use serde::{Deserialize, Serialize};
use sqlx::{Executor, Row, Sqlite, SqlitePool};
use uuid::Uuid;

/// One provider-sourced metadata proposal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub guid: Uuid,
    /// Which provider produced this candidate (e.g. "musicbrainz")
    pub source: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub year: Option<i64>,
    pub duration_ms: Option<i64>,
    pub cover_url: Option<String>,
    /// Presence-based completeness score
    pub score: f64,
    /// Set once, by the merge engine
    pub applied: bool,
}

/// Persist candidates under a temporary reference
///
/// Unconditionally appends; earlier passes for the same reference are kept.
pub async fn insert_candidates(
    pool: &SqlitePool,
    temp_ref: &str,
    candidates: &[Candidate],
) -> Result<()> {
    for candidate in candidates {
        sqlx::query(
            r#"
            INSERT INTO metadata_candidates (
                guid, temp_track_ref, source, title, artist, album,
                year, duration_ms, cover_url, score, applied, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, CURRENT_TIMESTAMP)
            "#,
        )
        .bind(candidate.guid.to_string())
        .bind(temp_ref)
        .bind(&candidate.source)
        .bind(&candidate.title)
        .bind(&candidate.artist)
        .bind(&candidate.album)
        .bind(candidate.year)
        .bind(candidate.duration_ms)
        .bind(&candidate.cover_url)
        .bind(candidate.score)
        .execute(pool)
        .await?;
    }

    tracing::debug!(temp_ref = %temp_ref, count = candidates.len(), "Persisted candidates");

    Ok(())
}

/// Fetch all candidates for a temporary reference, best score first
///
/// Equal scores keep insertion order (rowid), matching the aggregator's
/// stable ranking.
pub async fn fetch_by_temp_ref(pool: &SqlitePool, temp_ref: &str) -> Result<Vec<Candidate>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, source, title, artist, album, year, duration_ms, cover_url, score, applied
        FROM metadata_candidates
        WHERE temp_track_ref = ?
        ORDER BY score DESC, rowid ASC
        "#,
    )
    .bind(temp_ref)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(candidate_from_row).collect()
}

/// Load a single candidate by guid
pub async fn load_candidate(pool: &SqlitePool, candidate_id: Uuid) -> Result<Option<Candidate>> {
    let row = sqlx::query(
        r#"
        SELECT guid, source, title, artist, album, year, duration_ms, cover_url, score, applied
        FROM metadata_candidates
        WHERE guid = ?
        "#,
    )
    .bind(candidate_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(candidate_from_row).transpose()
}

/// Mark a candidate applied (idempotent)
pub async fn mark_applied<'e, E>(executor: E, candidate_id: Uuid) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE metadata_candidates SET applied = 1 WHERE guid = ?")
        .bind(candidate_id.to_string())
        .execute(executor)
        .await?;

    Ok(())
}

fn candidate_from_row(row: sqlx::sqlite::SqliteRow) -> Result<Candidate> {
    let guid_str: String = row.get("guid");
    Ok(Candidate {
        guid: Uuid::parse_str(&guid_str)
            .map_err(|e| mixcrate_common::Error::Internal(format!("Bad candidate guid: {}", e)))?,
        source: row.get("source"),
        title: row.get("title"),
        artist: row.get("artist"),
        album: row.get("album"),
        year: row.get("year"),
        duration_ms: row.get("duration_ms"),
        cover_url: row.get("cover_url"),
        score: row.get("score"),
        applied: row.get::<i64, _>("applied") != 0,
    })
}
