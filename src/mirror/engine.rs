//! Mirror orchestration
//!
//! Resolve the playlist, rename completed artifacts to their stable names,
//! then walk the items in position order: skip what the ledger already has,
//! check the disk budget, transfer, record. Any fatal error stops the run;
//! the ledger always reflects exactly what finished, so the next invocation
//! resumes where this one stopped.

use indicatif::ProgressBar;
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

use super::materializer::Materializer;
use crate::error::MirrorError;
use crate::library::reconcile::{Rename, apply_renames, plan_renames};
use crate::library::{
    DiskBudget, DiskGuard, LocalStore, MirrorConfig, NameScheme, ProgressLedger, SpaceProbe,
};
use crate::remote::models::validate_items;
use crate::remote::{ItemDescriptor, MetadataResolver, Transfer};

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Resolving,
    Reconciling,
    Iterating { position: u32 },
    Skipping { position: u32 },
    Guarding { position: u32 },
    Materializing { position: u32 },
    Recording { position: u32 },
    Done,
    Aborted,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Resolving => write!(f, "resolving"),
            Self::Reconciling => write!(f, "reconciling"),
            Self::Iterating { position } => write!(f, "iterating #{}", position),
            Self::Skipping { position } => write!(f, "skipping #{}", position),
            Self::Guarding { position } => write!(f, "guarding #{}", position),
            Self::Materializing { position } => write!(f, "materializing #{}", position),
            Self::Recording { position } => write!(f, "recording #{}", position),
            Self::Done => write!(f, "done"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// Result of a completed run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MirrorReport {
    pub total: usize,
    pub skipped: usize,
    pub materialized: usize,
    pub renamed: usize,
    pub ledger_size: usize,
}

/// A resolved playlist and what would happen to it
#[derive(Debug, Clone)]
pub struct MirrorPlan {
    /// Items in ascending position order
    pub items: Vec<ItemDescriptor>,
    pub names: NameScheme,
    pub renames: Vec<Rename>,
    completed: HashSet<String>,
}

impl MirrorPlan {
    /// Whether the ledger already had this item when the plan was made
    pub fn is_completed(&self, item: &ItemDescriptor) -> bool {
        self.completed.contains(&item.source_url)
    }

    pub fn pending_count(&self) -> usize {
        self.items.iter().filter(|item| !self.is_completed(item)).count()
    }
}

/// Coordinates resolver, ledger, disk guard and materializer
pub struct MirrorEngine {
    resolver: Box<dyn MetadataResolver>,
    materializer: Materializer,
    ledger: ProgressLedger,
    store: LocalStore,
    disk: DiskGuard,
    budget: DiskBudget,
    throttle: Duration,
    state: RunState,
}

impl MirrorEngine {
    /// Prepare the storage root and open the ledger
    ///
    /// Fails if the ledger cannot be opened for appending; no transfer may
    /// happen without progress tracking.
    pub async fn open(
        config: &MirrorConfig,
        resolver: Box<dyn MetadataResolver>,
        transfer: Box<dyn Transfer>,
        probe: Box<dyn SpaceProbe>,
    ) -> Result<Self, MirrorError> {
        let store = LocalStore::new(config.storage_root.clone());
        store.init().await.map_err(|source| MirrorError::Storage {
            path: config.storage_root.clone(),
            source,
        })?;

        let ledger = ProgressLedger::open(&config.ledger_path())?;
        debug!("Using ledger {}", ledger.path().display());

        Ok(Self {
            resolver,
            materializer: Materializer::new(transfer, store.clone(), config.retry),
            ledger,
            disk: DiskGuard::new(config.storage_root.clone(), probe),
            store,
            budget: config.disk,
            throttle: config.throttle,
            state: RunState::Idle,
        })
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, next: RunState) {
        debug!("State: {} -> {}", self.state, next);
        self.state = next;
    }

    /// Resolve the playlist and work out renames without changing anything
    pub async fn plan(&self, playlist_ref: &str) -> Result<MirrorPlan, MirrorError> {
        let mut items = self.resolver.resolve(playlist_ref).await?;
        validate_items(&items)?;
        items.sort_by_key(|item| item.position);

        info!("Found {} items in playlist", items.len());
        info!("Found {} previously downloaded items", self.ledger.size());

        let names = NameScheme::for_items(&items);
        let ids: HashSet<&str> = items.iter().map(|item| item.id.as_str()).collect();
        let index = self
            .store
            .index_by_id(&ids)
            .await
            .map_err(|source| MirrorError::Storage {
                path: self.store.root().to_path_buf(),
                source,
            })?;

        let renames = plan_renames(&items, &self.ledger, &index, &names);
        let completed = items
            .iter()
            .filter(|item| self.ledger.contains(&item.source_url))
            .map(|item| item.source_url.clone())
            .collect();

        Ok(MirrorPlan {
            items,
            names,
            renames,
            completed,
        })
    }

    /// Mirror the playlist, stopping at the first fatal error
    pub async fn run(
        &mut self,
        playlist_ref: &str,
        progress: &ProgressBar,
    ) -> Result<MirrorReport, MirrorError> {
        let result = self.run_inner(playlist_ref, progress).await;

        match &result {
            Ok(report) => {
                self.transition(RunState::Done);
                progress.finish_with_message("All items downloaded");
                debug!("Run finished: {:?}", report);
            }
            Err(_) => {
                // reported once by the caller
                self.transition(RunState::Aborted);
                progress.abandon_with_message("Aborted");
            }
        }

        result
    }

    async fn run_inner(
        &mut self,
        playlist_ref: &str,
        progress: &ProgressBar,
    ) -> Result<MirrorReport, MirrorError> {
        self.transition(RunState::Resolving);
        let plan = self.plan(playlist_ref).await?;

        self.transition(RunState::Reconciling);
        let renamed = apply_renames(&plan.renames).await;
        info!("Renamed {} items to include position and title", renamed);

        let total = plan.items.len();
        progress.set_length(total as u64);

        let mut report = MirrorReport {
            total,
            renamed,
            ..Default::default()
        };

        for item in &plan.items {
            let position = item.position;
            self.transition(RunState::Iterating { position });
            progress.set_message(item.title.clone());

            if self.ledger.contains(&item.source_url) {
                self.transition(RunState::Skipping { position });
                info!("Skipping already downloaded item: {}", item.source_url);
                report.skipped += 1;
                progress.inc(1);
                continue;
            }

            info!("Processing item {}/{}: {}", position, total, item.source_url);

            if report.materialized > 0 && !self.throttle.is_zero() {
                debug!("Pausing {:?} between downloads", self.throttle);
                tokio::time::sleep(self.throttle).await;
            }

            self.transition(RunState::Guarding { position });
            self.disk
                .ensure(self.budget)
                .map_err(|source| MirrorError::DiskBudget { position, source })?;

            self.transition(RunState::Materializing { position });
            let stem = plan.names.stem(item);
            let path = self
                .materializer
                .materialize(item, &stem)
                .await
                .map_err(|source| MirrorError::Materialize {
                    position,
                    title: item.title.clone(),
                    source,
                })?;

            self.transition(RunState::Recording { position });
            self.ledger.record(&item.source_url)?;
            report.materialized += 1;

            info!(
                "Download completed! ({}/{}) {}",
                position,
                total,
                path.file_name()
                    .map(|n| n.to_string_lossy())
                    .unwrap_or_default()
            );
            progress.inc(1);
        }

        report.ledger_size = self.ledger.size();
        Ok(report)
    }
}
