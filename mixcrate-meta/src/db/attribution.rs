//! Attribution ledger persistence
//!
//! Append-only log of field-level writes: which source supplied which value,
//! when, and with what confidence. Rows are immutable after insert except
//! the `reverted` flag (set by revert) and `confidence` (rewritten by the
//! confidence recalculator).

use crate::types::AttributedField;
use chrono::{DateTime, Utc};
use mixcrate_common::Result;
use serde::{Deserialize, Serialize};
use sqlx::{Executor, Row, Sqlite, SqlitePool};
use uuid::Uuid;

/// One row of the provenance ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionEntry {
    pub id: i64,
    pub track_id: Uuid,
    pub field: AttributedField,
    /// Value as written to the track, rendered as text
    pub value: Option<String>,
    pub source: String,
    pub candidate_id: Option<Uuid>,
    pub confidence: f64,
    pub applied_at: DateTime<Utc>,
    pub reverted: bool,
}

/// Append one ledger entry
///
/// The field is enum-typed, so a name outside the attributable set cannot
/// reach the ledger; callers holding a raw string go through
/// [`AttributedField::parse`] first.
pub async fn record<'e, E>(
    executor: E,
    track_id: Uuid,
    field: AttributedField,
    value: Option<&str>,
    source: &str,
    candidate_id: Option<Uuid>,
    confidence: f64,
) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO metadata_attribution (
            track_id, field_name, value, source, candidate_id, confidence, applied_at, reverted
        ) VALUES (?, ?, ?, ?, ?, ?, ?, 0)
        "#,
    )
    .bind(track_id.to_string())
    .bind(field.as_str())
    .bind(value)
    .bind(source)
    .bind(candidate_id.map(|id| id.to_string()))
    .bind(confidence)
    .bind(Utc::now())
    .execute(executor)
    .await?;

    tracing::debug!(
        track_id = %track_id,
        field = %field,
        source = %source,
        confidence = confidence,
        "Recorded field attribution"
    );

    Ok(())
}

/// Full ledger for a track, newest first, reverted entries included
pub async fn get_attribution(pool: &SqlitePool, track_id: Uuid) -> Result<Vec<AttributionEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT id, track_id, field_name, value, source, candidate_id, confidence, applied_at, reverted
        FROM metadata_attribution
        WHERE track_id = ?
        ORDER BY id DESC
        "#,
    )
    .bind(track_id.to_string())
    .fetch_all(pool)
    .await?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        match entry_from_row(row)? {
            Some(entry) => entries.push(entry),
            None => continue,
        }
    }
    Ok(entries)
}

fn entry_from_row(row: sqlx::sqlite::SqliteRow) -> Result<Option<AttributionEntry>> {
    let field_name: String = row.get("field_name");
    let Some(field) = AttributedField::parse(&field_name) else {
        // A row outside the attributable set indicates a historical caller
        // defect; keep reads tolerant.
        tracing::warn!(field = %field_name, "Skipping ledger row with unknown field name");
        return Ok(None);
    };

    let track_id_str: String = row.get("track_id");
    let candidate_id_str: Option<String> = row.get("candidate_id");

    Ok(Some(AttributionEntry {
        id: row.get("id"),
        track_id: Uuid::parse_str(&track_id_str)
            .map_err(|e| mixcrate_common::Error::Internal(format!("Bad track guid: {}", e)))?,
        field,
        value: row.get("value"),
        source: row.get("source"),
        candidate_id: candidate_id_str.and_then(|s| Uuid::parse_str(&s).ok()),
        confidence: row.get("confidence"),
        applied_at: row.get("applied_at"),
        reverted: row.get::<i64, _>("reverted") != 0,
    }))
}
