//! Database access for mixcrate-meta
//!
//! Shared SQLite database holding the canonical track records, pending
//! metadata candidates, and the append-only attribution ledger.

pub mod attribution;
pub mod candidates;
pub mod tracks;

use mixcrate_common::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
///
/// Connects to the library database, creating it (and its parent directory)
/// if missing, then ensures the engine's tables exist.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the reconciliation engine's tables if they don't exist
///
/// Schema notes:
/// - `tracks` and `metadata_candidates` use client-generated UUID guids.
/// - `metadata_attribution` uses an AUTOINCREMENT id so ledger insertion
///   order is the audit order; second-granularity timestamps cannot order
///   two appends from the same transaction.
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tracks (
            guid TEXT PRIMARY KEY,
            title TEXT,
            artist TEXT,
            album TEXT,
            year INTEGER,
            duration_ms INTEGER,
            genre TEXT,
            path_audio TEXT,
            path_cover TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS metadata_candidates (
            guid TEXT PRIMARY KEY,
            temp_track_ref TEXT NOT NULL,
            source TEXT NOT NULL,
            title TEXT,
            artist TEXT,
            album TEXT,
            year INTEGER,
            duration_ms INTEGER,
            cover_url TEXT,
            score REAL NOT NULL DEFAULT 0.0,
            applied INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_candidates_temp_ref \
         ON metadata_candidates (temp_track_ref)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS metadata_attribution (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            track_id TEXT NOT NULL,
            field_name TEXT NOT NULL,
            value TEXT,
            source TEXT NOT NULL,
            candidate_id TEXT,
            confidence REAL NOT NULL DEFAULT 0.0,
            applied_at TEXT NOT NULL,
            reverted INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_attribution_track_field \
         ON metadata_attribution (track_id, field_name)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (tracks, metadata_candidates, metadata_attribution)");

    Ok(())
}
