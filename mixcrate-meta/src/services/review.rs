//! Composite review view
//!
//! Read-only snapshot combining a track's current canonical state, its full
//! attribution history, and any pending candidates for a temporary
//! reference. Drives manual-review UIs; nothing here mutates state.

use crate::db::attribution::AttributionEntry;
use crate::db::candidates::{self, Candidate};
use crate::db::tracks::{self, Track};
use crate::services::provenance;
use mixcrate_common::{Error, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Current state + provenance + pending candidates for one track
#[derive(Debug, Serialize)]
pub struct TrackDiff {
    pub track: Track,
    pub attribution: Vec<AttributionEntry>,
    pub candidates: Vec<Candidate>,
}

/// Build the review view for a track
///
/// Fails with `NotFound` when the track does not exist; candidates are
/// included only when a temporary reference is given.
pub async fn diff(pool: &SqlitePool, track_id: Uuid, temp_ref: Option<&str>) -> Result<TrackDiff> {
    let track = tracks::load_track(pool, track_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Track {}", track_id)))?;

    let attribution = provenance::get_attribution(pool, track_id).await?;

    let candidates = match temp_ref {
        Some(temp_ref) => candidates::fetch_by_temp_ref(pool, temp_ref).await?,
        None => Vec::new(),
    };

    Ok(TrackDiff {
        track,
        attribution,
        candidates,
    })
}
