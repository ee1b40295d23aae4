//! Provenance ledger operations
//!
//! The ledger is append-only: entries are immutable once written except the
//! `reverted` flag. For any (track, field) pair at most one non-reverted
//! entry is the head, describing the provenance of the currently-applied
//! value; revert walks the head back one step.

use crate::db::attribution::{self, AttributionEntry};
use crate::db::tracks;
use crate::types::AttributedField;
use mixcrate_common::Result;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Full attribution history for a track, newest first, reverted entries
/// included for audit visibility
pub async fn get_attribution(pool: &SqlitePool, track_id: Uuid) -> Result<Vec<AttributionEntry>> {
    attribution::get_attribution(pool, track_id).await
}

/// Revert the most recent non-reverted ledger entry for a field
///
/// Marks the head entry reverted and restores the canonical field to the
/// next non-reverted value down the ledger (or NULL when none exists). Both
/// writes commit together. Returns `false` with no side effects when the
/// field name is not attributable or there is nothing to revert.
pub async fn revert(pool: &SqlitePool, track_id: Uuid, field_name: &str) -> Result<bool> {
    let Some(field) = AttributedField::parse(field_name) else {
        tracing::warn!(field = %field_name, "Revert requested for non-attributable field");
        return Ok(false);
    };

    let mut tx = pool.begin().await?;

    // Head entry plus the one beneath it, if any
    let rows = sqlx::query(
        r#"
        SELECT id, value
        FROM metadata_attribution
        WHERE track_id = ? AND field_name = ? AND reverted = 0
        ORDER BY id DESC
        LIMIT 2
        "#,
    )
    .bind(track_id.to_string())
    .bind(field.as_str())
    .fetch_all(&mut *tx)
    .await?;

    let Some(head) = rows.first() else {
        return Ok(false);
    };
    let head_id: i64 = head.get("id");
    let previous_value: Option<String> = rows.get(1).map(|row| row.get("value")).unwrap_or(None);

    sqlx::query("UPDATE metadata_attribution SET reverted = 1 WHERE id = ?")
        .bind(head_id)
        .execute(&mut *tx)
        .await?;

    tracks::update_field(&mut *tx, track_id, field, previous_value.as_deref()).await?;

    tx.commit().await?;

    tracing::info!(
        track_id = %track_id,
        field = %field,
        restored = previous_value.as_deref().unwrap_or("<null>"),
        "Reverted field attribution"
    );

    Ok(true)
}
