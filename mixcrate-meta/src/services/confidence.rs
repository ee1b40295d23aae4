//! Confidence recalculation
//!
//! Re-scores non-reverted ledger entries against the track's current live
//! values. Later manual edits drift away from what a source once supplied;
//! the drift surfaces as reduced confidence without the ledger's recorded
//! value ever changing.

use crate::db::tracks;
use crate::types::AttributedField;
use mixcrate_common::Result;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Recompute confidence for every non-reverted ledger entry of a track
///
/// Title/artist/album entries get a normalized fuzzy similarity (0-1)
/// between the recorded value and the live value; the remaining fields get
/// 1.0 when a value was recorded and 0.0 otherwise. Returns `false` when the
/// track does not exist.
pub async fn recalculate(pool: &SqlitePool, track_id: Uuid) -> Result<bool> {
    let Some(track) = tracks::load_track(pool, track_id).await? else {
        return Ok(false);
    };

    let mut tx = pool.begin().await?;

    let rows = sqlx::query(
        r#"
        SELECT id, field_name, value
        FROM metadata_attribution
        WHERE track_id = ? AND reverted = 0
        "#,
    )
    .bind(track_id.to_string())
    .fetch_all(&mut *tx)
    .await?;

    let mut updated = 0usize;
    for row in rows {
        let entry_id: i64 = row.get("id");
        let field_name: String = row.get("field_name");
        let value: Option<String> = row.get("value");

        let Some(field) = AttributedField::parse(&field_name) else {
            continue;
        };

        let confidence = match value.as_deref() {
            Some(recorded) if !recorded.is_empty() && field.is_fuzzy() => {
                let live = track.field_value(field).unwrap_or_default();
                strsim::normalized_levenshtein(&live, recorded)
            }
            Some(recorded) if !recorded.is_empty() => 1.0,
            _ => 0.0,
        };

        sqlx::query("UPDATE metadata_attribution SET confidence = ? WHERE id = ?")
            .bind(confidence)
            .bind(entry_id)
            .execute(&mut *tx)
            .await?;
        updated += 1;
    }

    tx.commit().await?;

    tracing::debug!(track_id = %track_id, entries = updated, "Recalculated confidence");

    Ok(true)
}
