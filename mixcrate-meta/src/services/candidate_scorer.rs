//! Candidate normalization and scoring
//!
//! Normalization cleans provider text (trim, collapse internal whitespace
//! runs, drop empties); scoring sums fixed per-field presence weights. The
//! score is a completeness heuristic, not a correctness measure: it is
//! deterministic, transparent, and deliberately simple.

use crate::db::candidates::Candidate;
use crate::providers::RawCandidate;
use uuid::Uuid;

pub const TITLE_WEIGHT: f64 = 2.0;
pub const ARTIST_WEIGHT: f64 = 2.0;
pub const ALBUM_WEIGHT: f64 = 1.5;
pub const YEAR_WEIGHT: f64 = 1.0;
pub const COVER_URL_WEIGHT: f64 = 1.0;
pub const DURATION_WEIGHT: f64 = 1.0;

/// Maximum achievable score (all six fields present)
pub const MAX_SCORE: f64 = TITLE_WEIGHT
    + ARTIST_WEIGHT
    + ALBUM_WEIGHT
    + YEAR_WEIGHT
    + COVER_URL_WEIGHT
    + DURATION_WEIGHT;

/// Trim and collapse internal whitespace runs; empty results become None
pub fn normalize_text(value: Option<String>) -> Option<String> {
    let value = value?;
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// Presence-based completeness score
///
/// Zero counts as absent for numeric fields, mirroring how imports leave
/// unknown years and durations.
pub fn score(candidate: &Candidate) -> f64 {
    let mut score = 0.0;
    if candidate.title.is_some() {
        score += TITLE_WEIGHT;
    }
    if candidate.artist.is_some() {
        score += ARTIST_WEIGHT;
    }
    if candidate.album.is_some() {
        score += ALBUM_WEIGHT;
    }
    if candidate.year.is_some_and(|y| y != 0) {
        score += YEAR_WEIGHT;
    }
    if candidate.cover_url.as_deref().is_some_and(|u| !u.is_empty()) {
        score += COVER_URL_WEIGHT;
    }
    if candidate.duration_ms.is_some_and(|d| d != 0) {
        score += DURATION_WEIGHT;
    }
    score
}

/// Turn one raw provider record into a normalized, scored candidate
pub fn normalize_and_score(raw: RawCandidate) -> Candidate {
    let mut candidate = Candidate {
        guid: Uuid::new_v4(),
        source: raw.source,
        title: normalize_text(raw.title),
        artist: normalize_text(raw.artist),
        album: normalize_text(raw.album),
        year: raw.year,
        duration_ms: raw.duration_ms,
        cover_url: raw.cover_url,
        score: 0.0,
        applied: false,
    };
    candidate.score = score(&candidate);
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(title: Option<&str>, artist: Option<&str>) -> RawCandidate {
        RawCandidate {
            source: "musicbrainz".to_string(),
            title: title.map(String::from),
            artist: artist.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_text_collapses_whitespace() {
        assert_eq!(
            normalize_text(Some("  Around   the\tWorld ".to_string())),
            Some("Around the World".to_string())
        );
        assert_eq!(normalize_text(Some("   ".to_string())), None);
        assert_eq!(normalize_text(None), None);
    }

    #[test]
    fn test_score_title_artist() {
        let candidate = normalize_and_score(raw(Some("X"), Some("Y")));
        assert_eq!(candidate.score, 4.0);
    }

    #[test]
    fn test_score_title_artist_year() {
        let mut r = raw(Some("X"), Some("Y"));
        r.year = Some(2001);
        let candidate = normalize_and_score(r);
        assert_eq!(candidate.score, 5.0);
    }

    #[test]
    fn test_score_all_fields() {
        let r = RawCandidate {
            source: "discogs".to_string(),
            title: Some("t".to_string()),
            artist: Some("a".to_string()),
            album: Some("b".to_string()),
            year: Some(1997),
            duration_ms: Some(428000),
            cover_url: Some("https://example.com/c.jpg".to_string()),
        };
        let candidate = normalize_and_score(r);
        assert_eq!(candidate.score, MAX_SCORE);
    }

    #[test]
    fn test_zero_numerics_score_as_absent() {
        let mut r = raw(Some("X"), None);
        r.year = Some(0);
        r.duration_ms = Some(0);
        let candidate = normalize_and_score(r);
        assert_eq!(candidate.score, TITLE_WEIGHT);
    }

    #[test]
    fn test_whitespace_only_fields_score_as_absent() {
        let candidate = normalize_and_score(raw(Some("  "), Some("Y")));
        assert_eq!(candidate.score, ARTIST_WEIGHT);
        assert!(candidate.title.is_none());
    }

    #[test]
    fn test_score_is_deterministic() {
        let a = normalize_and_score(raw(Some("Song"), Some("Artist")));
        let b = normalize_and_score(raw(Some("Song"), Some("Artist")));
        assert_eq!(a.score, b.score);
    }
}
