//! Renames completed artifacts from their transient id-based name to their
//! stable name once position and title are known.

use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, warn};

use super::ledger::ProgressLedger;
use super::storage::NameScheme;
use crate::error::RenameError;
use crate::remote::ItemDescriptor;

/// A pending rename of one artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub position: u32,
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Compute renames for completed items that still carry a transient name
///
/// Pure over the pre-scan index; items not in the ledger are left alone.
pub fn plan_renames(
    items: &[ItemDescriptor],
    ledger: &ProgressLedger,
    index: &HashMap<String, PathBuf>,
    names: &NameScheme,
) -> Vec<Rename> {
    items
        .iter()
        .filter(|item| ledger.contains(&item.source_url))
        .filter_map(|item| {
            let from = index.get(&item.id)?;
            let mut file_name = names.stem(item);
            if let Some(ext) = from.extension().and_then(|e| e.to_str()) {
                file_name.push('.');
                file_name.push_str(ext);
            }

            let to = from.with_file_name(file_name);
            (to != *from).then(|| Rename {
                position: item.position,
                from: from.clone(),
                to,
            })
        })
        .collect()
}

/// Perform one rename, refusing to overwrite an existing file
pub async fn apply_rename(rename: &Rename) -> Result<(), RenameError> {
    if fs::try_exists(&rename.to).await.unwrap_or(false) {
        return Err(RenameError::TargetExists(rename.to.clone()));
    }

    fs::rename(&rename.from, &rename.to)
        .await
        .map_err(|source| RenameError::Io {
            from: rename.from.clone(),
            to: rename.to.clone(),
            source,
        })
}

/// Apply all renames, logging failures; returns how many succeeded
pub async fn apply_renames(renames: &[Rename]) -> usize {
    let mut renamed = 0;

    for rename in renames {
        match apply_rename(rename).await {
            Ok(()) => {
                info!(
                    "Renamed: {} -> {}",
                    display_name(&rename.from),
                    display_name(&rename.to)
                );
                renamed += 1;
            }
            Err(e) => warn!("Could not rename item {}: {}", rename.position, e),
        }
    }

    renamed
}

fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
