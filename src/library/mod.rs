//! Local library: configuration, progress tracking and artifact storage

pub mod config;
pub mod disk;
pub mod ledger;
pub mod reconcile;
pub mod storage;

pub use config::{DiskBudget, FileConfig, MirrorConfig, RetryPolicy};
pub use disk::{DiskGuard, SpaceProbe, StatvfsProbe};
pub use ledger::ProgressLedger;
pub use storage::{LocalStore, NameScheme};
