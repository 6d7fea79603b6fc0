//! Remote playlist capabilities
//!
//! The mirror core only depends on the two traits here; `client` provides the
//! yt-dlp backed implementation used by the binary.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::{ResolutionError, TransferError};

pub mod client;
pub mod models;
pub mod reference;

pub use client::YtDlpClient;
pub use models::ItemDescriptor;

/// Enumerates a playlist without transferring any payloads
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    /// Resolve a playlist reference into descriptors in playlist order
    async fn resolve(&self, playlist_ref: &str) -> Result<Vec<ItemDescriptor>, ResolutionError>;
}

/// A single transfer of one item's payload
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// Canonical item URL
    pub url: String,
    /// Directory the payload is written into
    pub output_dir: PathBuf,
    /// Filename without extension; the extension comes from the payload
    pub stem: String,
}

/// Fetches one item's payload to local storage
#[async_trait]
pub trait Transfer: Send + Sync {
    /// Perform one complete transfer attempt and return the written file
    async fn fetch(&self, request: &TransferRequest) -> Result<PathBuf, TransferError>;
}
