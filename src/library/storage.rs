//! Local storage layout
//!
//! The storage root is a flat directory: one artifact per completed item plus
//! the ledger. Artifacts are named either by item id (`<id>.<ext>`, transient)
//! or by position and title (`<position> - <title>.<ext>`, stable).

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::remote::ItemDescriptor;
use crate::utils::sanitize_title;

/// Extensions the downloader uses for in-progress files
const PARTIAL_EXTENSIONS: &[&str] = &["part", "ytdl", "temp"];

/// Minimum zero-padding of the position prefix
const MIN_POSITION_WIDTH: usize = 3;

/// Stable naming for one resolved playlist
///
/// Positions are zero-padded to a common width so that sorting names
/// lexicographically gives playlist order. The width is 3 unless the
/// playlist has 1000 or more items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameScheme {
    width: usize,
}

impl NameScheme {
    pub fn for_items(items: &[ItemDescriptor]) -> Self {
        let max = items.iter().map(|item| item.position).max().unwrap_or(0);
        Self {
            width: max.to_string().len().max(MIN_POSITION_WIDTH),
        }
    }

    /// Filename without extension, e.g. `001 - Intro`
    pub fn stem(&self, item: &ItemDescriptor) -> String {
        format!(
            "{:0width$} - {}",
            item.position,
            sanitize_title(&item.title),
            width = self.width
        )
    }
}

impl Default for NameScheme {
    fn default() -> Self {
        Self {
            width: MIN_POSITION_WIDTH,
        }
    }
}

/// Manages the flat artifact directory
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the storage root if needed
    pub async fn init(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root).await?;
        debug!("Initialized storage root at {}", self.root.display());
        Ok(())
    }

    /// Map item ids to artifacts still carrying their transient name
    ///
    /// Scans the directory once. In-progress files are never matched.
    pub async fn index_by_id(&self, ids: &HashSet<&str>) -> io::Result<HashMap<String, PathBuf>> {
        let mut index = HashMap::new();
        let mut entries = fs::read_dir(&self.root).await?;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }

            let name = entry.file_name();
            let Some((stem, ext)) = name.to_str().and_then(|n| n.rsplit_once('.')) else {
                continue;
            };

            if PARTIAL_EXTENSIONS.contains(&ext) || !ids.contains(stem) {
                continue;
            }

            if let Some(previous) = index.insert(stem.to_string(), entry.path()) {
                warn!(
                    "Multiple transient files for {}, ignoring {}",
                    stem,
                    previous.display()
                );
            }
        }

        debug!("Pre-scan found {} transient artifacts", index.len());
        Ok(index)
    }

    /// Remove leftovers of an interrupted transfer for a stem
    ///
    /// Best effort; returns the number of files removed.
    pub async fn discard_partials(&self, stem: &str) -> usize {
        let mut removed = 0;
        let Ok(mut entries) = fs::read_dir(&self.root).await else {
            return 0;
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };

            let is_partial = name.starts_with(stem)
                && name
                    .rsplit_once('.')
                    .is_some_and(|(_, ext)| PARTIAL_EXTENSIONS.contains(&ext));

            if !is_partial {
                continue;
            }

            match fs::remove_file(entry.path()).await {
                Ok(()) => {
                    debug!("Discarded partial file {}", name);
                    removed += 1;
                }
                Err(e) => warn!("Failed to discard partial file {}: {}", name, e),
            }
        }

        removed
    }
}
