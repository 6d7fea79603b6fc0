//! Error types for the mirror pipeline
//!
//! Component errors are typed so the orchestrator can tell fatal failures
//! (resolution, ledger, disk budget, exhausted retries) from the cosmetic
//! rename failures it only logs.

use std::path::PathBuf;
use thiserror::Error;

/// The playlist could not be enumerated.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("failed to run metadata extractor: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("metadata extractor failed: {0}")]
    Extractor(String),

    #[error("access to playlist denied: {0}")]
    AccessDenied(String),

    #[error("failed to parse playlist metadata: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("playlist contains no items")]
    Empty,

    #[error("playlist lists position {0} more than once")]
    DuplicatePosition(u32),
}

/// Progress ledger could not be read or appended to.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("failed to open ledger {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read ledger {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to append to ledger {path}: {source}")]
    Append {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Not enough free space, or free space could not be determined.
#[derive(Debug, Error)]
pub enum DiskBudgetError {
    #[error("insufficient disk space: {free_mb} MB free, {needed_mb} MB needed")]
    Insufficient { free_mb: u64, needed_mb: u64 },

    #[error("failed to query free space for {path}: {source}")]
    Probe {
        path: PathBuf,
        #[source]
        source: nix::Error,
    },
}

/// One failed transfer attempt.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("failed to run downloader: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("downloader exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("downloader reported no output file")]
    MissingOutput,

    #[error("downloaded file not found at {0}")]
    OutputNotFound(PathBuf),
}

impl TransferError {
    /// Whether the failure looks like the item itself is gone.
    ///
    /// Heuristic over the downloader's stderr; it never matches spawn or
    /// output errors.
    pub fn is_permanent(&self) -> bool {
        const MARKERS: &[&str] = &[
            "video unavailable",
            "private video",
            "has been removed",
            "account associated with this video has been terminated",
            "this video is not available",
        ];
        match self {
            Self::Failed { stderr, .. } => {
                let lower = stderr.to_lowercase();
                MARKERS.iter().any(|m| lower.contains(m))
            }
            _ => false,
        }
    }
}

/// An item could not be transferred within the retry bound.
#[derive(Debug, Error)]
#[error("transfer failed after {attempts} attempt(s): {last_cause}")]
pub struct MaterializeError {
    pub attempts: u32,
    #[source]
    pub last_cause: TransferError,
}

/// A reconciliation rename failed. Never fatal.
#[derive(Debug, Error)]
pub enum RenameError {
    #[error("rename target already exists: {0}")]
    TargetExists(PathBuf),

    #[error("failed to rename {from} -> {to}: {source}")]
    Io {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fatal errors that abort a mirror run.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("failed to resolve playlist: {0}")]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("disk budget check failed before item {position}: {source}")]
    DiskBudget {
        position: u32,
        #[source]
        source: DiskBudgetError,
    },

    #[error("item {position} ({title}) could not be downloaded: {source}")]
    Materialize {
        position: u32,
        title: String,
        #[source]
        source: MaterializeError,
    },

    #[error("failed to prepare storage root {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
