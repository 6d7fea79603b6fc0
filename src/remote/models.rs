//! Playlist item models and extractor response shapes

use serde::Deserialize;
use std::collections::HashSet;

use crate::error::ResolutionError;

/// Fallback for entries the extractor returns without a title
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// One item of a resolved playlist
///
/// Produced once per run by the resolver and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDescriptor {
    /// Remote-unique identifier (also the transient local file stem)
    pub id: String,
    /// 1-based position in the playlist
    pub position: u32,
    pub title: String,
    /// Canonical item URL, the ledger key
    pub source_url: String,
}

impl ItemDescriptor {
    /// Canonical watch URL for an item id
    pub fn canonical_url(id: &str) -> String {
        format!("https://www.youtube.com/watch?v={}", id)
    }
}

// Flat playlist response (`--flat-playlist --dump-single-json`)
#[derive(Debug, Clone, Deserialize)]
pub struct FlatPlaylist {
    pub id: Option<String>,
    pub title: Option<String>,
    /// Unavailable entries come back as `null`
    #[serde(default)]
    pub entries: Vec<Option<FlatEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlatEntry {
    pub id: String,
    pub title: Option<String>,
    pub playlist_index: Option<u32>,
}

impl FlatPlaylist {
    /// Convert extractor entries into descriptors ordered by position
    ///
    /// Positions come from `playlist_index` when present, otherwise from
    /// the entry's place in the response (1-based).
    pub fn into_descriptors(self) -> Vec<ItemDescriptor> {
        let mut items: Vec<ItemDescriptor> = self
            .entries
            .into_iter()
            .enumerate()
            .filter_map(|(idx, entry)| {
                let entry = entry?;
                Some(ItemDescriptor {
                    position: entry.playlist_index.unwrap_or(idx as u32 + 1),
                    title: entry.title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
                    source_url: ItemDescriptor::canonical_url(&entry.id),
                    id: entry.id,
                })
            })
            .collect();

        items.sort_by_key(|item| item.position);
        items
    }
}

/// Reject empty resolutions and positions listed more than once
pub fn validate_items(items: &[ItemDescriptor]) -> Result<(), ResolutionError> {
    if items.is_empty() {
        return Err(ResolutionError::Empty);
    }

    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item.position) {
            return Err(ResolutionError::DuplicatePosition(item.position));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flat_playlist() {
        let json = r#"{
            "id": "PL123",
            "title": "Course",
            "entries": [
                {"id": "a", "title": "Intro", "playlist_index": 1, "url": "https://www.youtube.com/watch?v=a"},
                {"id": "b", "title": "Part Two", "playlist_index": 2}
            ]
        }"#;

        let playlist: FlatPlaylist = serde_json::from_str(json).unwrap();
        let items = playlist.into_descriptors();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "a");
        assert_eq!(items[0].position, 1);
        assert_eq!(items[0].source_url, "https://www.youtube.com/watch?v=a");
        assert_eq!(items[1].title, "Part Two");
    }

    #[test]
    fn test_positions_default_to_order() {
        let json = r#"{"entries": [{"id": "x"}, null, {"id": "y", "title": "Y"}]}"#;

        let playlist: FlatPlaylist = serde_json::from_str(json).unwrap();
        let items = playlist.into_descriptors();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].position, 1);
        assert_eq!(items[0].title, UNKNOWN_TITLE);
        assert_eq!(items[1].position, 3);
    }

    #[test]
    fn test_sorted_by_playlist_index() {
        let json = r#"{"entries": [
            {"id": "late", "playlist_index": 2},
            {"id": "early", "playlist_index": 1}
        ]}"#;

        let items = serde_json::from_str::<FlatPlaylist>(json)
            .unwrap()
            .into_descriptors();

        assert_eq!(items[0].id, "early");
        assert_eq!(items[1].id, "late");
    }

    #[test]
    fn test_validate_rejects_empty_and_duplicates() {
        assert!(matches!(validate_items(&[]), Err(ResolutionError::Empty)));

        let item = |id: &str, position| ItemDescriptor {
            id: id.to_string(),
            position,
            title: id.to_string(),
            source_url: ItemDescriptor::canonical_url(id),
        };
        assert!(validate_items(&[item("a", 1), item("b", 2)]).is_ok());
        assert!(matches!(
            validate_items(&[item("a", 1), item("b", 1)]),
            Err(ResolutionError::DuplicatePosition(1))
        ));
    }
}
