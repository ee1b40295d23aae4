//! Canonical track persistence
//!
//! Tracks are the authoritative library records. This core never deletes
//! them; it mutates fields only through the merge engine, revert, or the
//! explicit field update used by manual edits.

use crate::types::AttributedField;
use mixcrate_common::Result;
use serde::{Deserialize, Serialize};
use sqlx::{Executor, Row, Sqlite, SqlitePool};
use uuid::Uuid;

/// Canonical track record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub guid: Uuid,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub year: Option<i64>,
    pub duration_ms: Option<i64>,
    pub genre: Option<String>,
    pub path_audio: Option<String>,
    pub path_cover: Option<String>,
}

impl Track {
    /// Create a new empty track for an imported audio file
    pub fn new(path_audio: Option<String>) -> Self {
        Self {
            guid: Uuid::new_v4(),
            title: None,
            artist: None,
            album: None,
            year: None,
            duration_ms: None,
            genre: None,
            path_audio,
            path_cover: None,
        }
    }

    /// Current live value of an attributable field, as ledger text
    pub fn field_value(&self, field: AttributedField) -> Option<String> {
        match field {
            AttributedField::Title => self.title.clone(),
            AttributedField::Artist => self.artist.clone(),
            AttributedField::Album => self.album.clone(),
            AttributedField::Year => self.year.map(|y| y.to_string()),
            AttributedField::DurationMs => self.duration_ms.map(|d| d.to_string()),
            AttributedField::CoverPath => self.path_cover.clone(),
        }
    }
}

/// Insert a track record
pub async fn insert_track(pool: &SqlitePool, track: &Track) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO tracks (
            guid, title, artist, album, year, duration_ms, genre,
            path_audio, path_cover, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(track.guid.to_string())
    .bind(&track.title)
    .bind(&track.artist)
    .bind(&track.album)
    .bind(track.year)
    .bind(track.duration_ms)
    .bind(&track.genre)
    .bind(&track.path_audio)
    .bind(&track.path_cover)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load track by guid
pub async fn load_track(pool: &SqlitePool, track_id: Uuid) -> Result<Option<Track>> {
    let row = sqlx::query(
        r#"
        SELECT guid, title, artist, album, year, duration_ms, genre, path_audio, path_cover
        FROM tracks
        WHERE guid = ?
        "#,
    )
    .bind(track_id.to_string())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let guid_str: String = row.get("guid");
            Ok(Some(Track {
                guid: Uuid::parse_str(&guid_str)
                    .map_err(|e| mixcrate_common::Error::Internal(format!("Bad track guid: {}", e)))?,
                title: row.get("title"),
                artist: row.get("artist"),
                album: row.get("album"),
                year: row.get("year"),
                duration_ms: row.get("duration_ms"),
                genre: row.get("genre"),
                path_audio: row.get("path_audio"),
                path_cover: row.get("path_cover"),
            }))
        }
        None => Ok(None),
    }
}

/// Write one attributable field of a track
///
/// The value arrives as ledger text (how attribution rows store it); numeric
/// fields are parsed back to integers here. Fields are matched exhaustively,
/// so every write lands in a statically named column.
pub async fn update_field<'e, E>(
    executor: E,
    track_id: Uuid,
    field: AttributedField,
    value: Option<&str>,
) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let guid = track_id.to_string();
    let query = match field {
        AttributedField::Title => {
            sqlx::query("UPDATE tracks SET title = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?")
                .bind(value)
        }
        AttributedField::Artist => {
            sqlx::query("UPDATE tracks SET artist = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?")
                .bind(value)
        }
        AttributedField::Album => {
            sqlx::query("UPDATE tracks SET album = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?")
                .bind(value)
        }
        AttributedField::Year => {
            sqlx::query("UPDATE tracks SET year = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?")
                .bind(value.and_then(|v| v.parse::<i64>().ok()))
        }
        AttributedField::DurationMs => {
            sqlx::query("UPDATE tracks SET duration_ms = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?")
                .bind(value.and_then(|v| v.parse::<i64>().ok()))
        }
        AttributedField::CoverPath => {
            sqlx::query("UPDATE tracks SET path_cover = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?")
                .bind(value)
        }
    };

    query.bind(guid).execute(executor).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::setup_test_db;

    #[tokio::test]
    async fn test_insert_and_load_track() {
        let pool = setup_test_db().await;

        let mut track = Track::new(Some("/music/test.flac".to_string()));
        track.title = Some("Test Title".to_string());
        track.year = Some(1997);

        insert_track(&pool, &track).await.expect("Failed to insert track");

        let loaded = load_track(&pool, track.guid)
            .await
            .expect("Failed to load track")
            .expect("Track not found");

        assert_eq!(loaded.guid, track.guid);
        assert_eq!(loaded.title.as_deref(), Some("Test Title"));
        assert_eq!(loaded.year, Some(1997));
        assert_eq!(loaded.path_audio.as_deref(), Some("/music/test.flac"));
        assert!(loaded.artist.is_none());
    }

    #[tokio::test]
    async fn test_load_missing_track_returns_none() {
        let pool = setup_test_db().await;
        let loaded = load_track(&pool, Uuid::new_v4()).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_update_field_parses_numeric_ledger_text() {
        let pool = setup_test_db().await;
        let track = Track::new(None);
        insert_track(&pool, &track).await.unwrap();

        update_field(&pool, track.guid, AttributedField::Year, Some("2001"))
            .await
            .unwrap();
        update_field(&pool, track.guid, AttributedField::DurationMs, Some("215000"))
            .await
            .unwrap();
        update_field(&pool, track.guid, AttributedField::Title, Some("Around the World"))
            .await
            .unwrap();

        let loaded = load_track(&pool, track.guid).await.unwrap().unwrap();
        assert_eq!(loaded.year, Some(2001));
        assert_eq!(loaded.duration_ms, Some(215000));
        assert_eq!(loaded.title.as_deref(), Some("Around the World"));
    }

    #[tokio::test]
    async fn test_update_field_clears_with_none() {
        let pool = setup_test_db().await;
        let mut track = Track::new(None);
        track.artist = Some("Daft Punk".to_string());
        insert_track(&pool, &track).await.unwrap();

        update_field(&pool, track.guid, AttributedField::Artist, None)
            .await
            .unwrap();

        let loaded = load_track(&pool, track.guid).await.unwrap().unwrap();
        assert!(loaded.artist.is_none());
    }
}
