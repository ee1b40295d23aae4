//! Core types for the metadata reconciliation engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of track fields the merge engine may write and the
/// provenance ledger may attribute.
///
/// Field names arriving as strings (from callers or from stored ledger rows)
/// are parsed through [`AttributedField::parse`]; anything outside this set
/// is dropped rather than guessed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributedField {
    Title,
    Artist,
    Album,
    Year,
    DurationMs,
    CoverPath,
}

impl AttributedField {
    /// All attributable fields, in merge order
    pub const ALL: [AttributedField; 6] = [
        AttributedField::Title,
        AttributedField::Artist,
        AttributedField::Album,
        AttributedField::Year,
        AttributedField::DurationMs,
        AttributedField::CoverPath,
    ];

    /// Ledger field name (also the `tracks` column name)
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributedField::Title => "title",
            AttributedField::Artist => "artist",
            AttributedField::Album => "album",
            AttributedField::Year => "year",
            AttributedField::DurationMs => "duration_ms",
            AttributedField::CoverPath => "path_cover",
        }
    }

    /// Parse a field name; returns None for anything outside the attributable set
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "title" => Some(AttributedField::Title),
            "artist" => Some(AttributedField::Artist),
            "album" => Some(AttributedField::Album),
            "year" => Some(AttributedField::Year),
            "duration_ms" => Some(AttributedField::DurationMs),
            "path_cover" => Some(AttributedField::CoverPath),
            _ => None,
        }
    }

    /// Whether confidence for this field is recomputed by fuzzy string
    /// similarity (title/artist/album) rather than simple presence
    pub fn is_fuzzy(&self) -> bool {
        matches!(
            self,
            AttributedField::Title | AttributedField::Artist | AttributedField::Album
        )
    }
}

impl fmt::Display for AttributedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query issued to every configured provider adapter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub title: Option<String>,
}

impl SearchQuery {
    pub fn is_empty(&self) -> bool {
        self.artist.is_none() && self.album.is_none() && self.title.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_round_trip() {
        for field in AttributedField::ALL {
            assert_eq!(AttributedField::parse(field.as_str()), Some(field));
        }
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert_eq!(AttributedField::parse("genre"), None);
        assert_eq!(AttributedField::parse(""), None);
        assert_eq!(AttributedField::parse("Title"), None);
    }

    #[test]
    fn test_fuzzy_fields() {
        assert!(AttributedField::Title.is_fuzzy());
        assert!(AttributedField::Artist.is_fuzzy());
        assert!(AttributedField::Album.is_fuzzy());
        assert!(!AttributedField::Year.is_fuzzy());
        assert!(!AttributedField::DurationMs.is_fuzzy());
        assert!(!AttributedField::CoverPath.is_fuzzy());
    }
}
