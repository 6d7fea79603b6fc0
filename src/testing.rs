//! In-memory fakes for the remote and disk capabilities.
//!
//! The fakes share their state behind an `Arc`, so a test can keep a clone
//! and inspect calls after handing the original to the engine.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{DiskBudgetError, ResolutionError, TransferError};
use crate::library::disk::{DiskUsage, SpaceProbe};
use crate::remote::{ItemDescriptor, MetadataResolver, Transfer, TransferRequest};

/// Build a descriptor with the canonical URL for `id`
pub fn item(id: &str, position: u32, title: &str) -> ItemDescriptor {
    ItemDescriptor {
        id: id.to_string(),
        position,
        title: title.to_string(),
        source_url: ItemDescriptor::canonical_url(id),
    }
}

/// The two-item playlist used by most engine tests
pub fn intro_playlist() -> Vec<ItemDescriptor> {
    vec![item("a", 1, "Intro"), item("b", 2, "Part Two")]
}

/// Resolver returning a fixed playlist, or failing
pub struct FakeResolver {
    items: Option<Vec<ItemDescriptor>>,
}

impl FakeResolver {
    pub fn new(items: Vec<ItemDescriptor>) -> Self {
        Self { items: Some(items) }
    }

    pub fn failing() -> Self {
        Self { items: None }
    }
}

#[async_trait]
impl MetadataResolver for FakeResolver {
    async fn resolve(&self, _playlist_ref: &str) -> Result<Vec<ItemDescriptor>, ResolutionError> {
        self.items
            .clone()
            .ok_or_else(|| ResolutionError::Extractor("network unreachable".to_string()))
    }
}

#[derive(Debug, Default)]
struct TransferState {
    /// Remaining failures per item id; `u32::MAX` fails forever
    failures: HashMap<String, u32>,
    /// Every attempted URL, in order
    attempts: Vec<String>,
}

/// Transfer that writes `<stem>.<ext>` containing the item URL
#[derive(Clone)]
pub struct FakeTransfer {
    ext: String,
    state: Arc<Mutex<TransferState>>,
}

impl FakeTransfer {
    pub fn new() -> Self {
        Self {
            ext: "mp4".to_string(),
            state: Arc::default(),
        }
    }

    /// Fail the first `times` attempts for an item
    pub fn fail_first(self, id: &str, times: u32) -> Self {
        self.lock().failures.insert(id.to_string(), times);
        self
    }

    /// Fail every attempt for an item
    pub fn fail_always(self, id: &str) -> Self {
        self.fail_first(id, u32::MAX)
    }

    pub fn attempts(&self) -> Vec<String> {
        self.lock().attempts.clone()
    }

    pub fn attempts_for(&self, url: &str) -> usize {
        self.lock().attempts.iter().filter(|u| *u == url).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TransferState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl Transfer for FakeTransfer {
    async fn fetch(&self, request: &TransferRequest) -> Result<PathBuf, TransferError> {
        let id = request
            .url
            .rsplit_once("v=")
            .map(|(_, id)| id.to_string())
            .unwrap_or_default();

        {
            let mut state = self.lock();
            state.attempts.push(request.url.clone());
            if let Some(remaining) = state.failures.get_mut(&id) {
                if *remaining > 0 {
                    if *remaining != u32::MAX {
                        *remaining -= 1;
                    }
                    return Err(TransferError::Failed {
                        status: "exit status: 1".to_string(),
                        stderr: "HTTP Error 503: Service Unavailable".to_string(),
                    });
                }
            }
        }

        let path = request
            .output_dir
            .join(format!("{}.{}", request.stem, self.ext));
        std::fs::write(&path, &request.url).map_err(TransferError::Spawn)?;
        Ok(path)
    }
}

/// Probe reporting a fixed amount of free space
pub struct FixedProbe(pub u64);

impl FixedProbe {
    pub fn mb(free_mb: u64) -> Self {
        Self(free_mb << 20)
    }
}

impl SpaceProbe for FixedProbe {
    fn usage(&self, _path: &Path) -> Result<DiskUsage, DiskBudgetError> {
        Ok(DiskUsage {
            total_bytes: self.0 * 2,
            free_bytes: self.0,
        })
    }
}
