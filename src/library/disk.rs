//! Free-space checks for the storage root
//!
//! Advisory only: nothing is reserved, so another writer can still fill the
//! disk between the check and the transfer.

use nix::sys::statvfs::statvfs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::config::DiskBudget;
use crate::error::DiskBudgetError;

const MIB: u64 = 1 << 20;

/// Total and free bytes of a filesystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskUsage {
    pub total_bytes: u64,
    pub free_bytes: u64,
}

impl DiskUsage {
    pub fn free_mb(&self) -> u64 {
        self.free_bytes / MIB
    }
}

/// Source of filesystem usage numbers
pub trait SpaceProbe: Send + Sync {
    fn usage(&self, path: &Path) -> Result<DiskUsage, DiskBudgetError>;
}

/// Reads usage via statvfs(3)
#[derive(Debug, Default, Clone, Copy)]
pub struct StatvfsProbe;

impl SpaceProbe for StatvfsProbe {
    fn usage(&self, path: &Path) -> Result<DiskUsage, DiskBudgetError> {
        let stat = statvfs(path).map_err(|source| DiskBudgetError::Probe {
            path: path.to_path_buf(),
            source,
        })?;

        let fragment = stat.fragment_size() as u64;
        Ok(DiskUsage {
            total_bytes: stat.blocks() as u64 * fragment,
            // blocks_available excludes blocks reserved for root
            free_bytes: stat.blocks_available() as u64 * fragment,
        })
    }
}

/// Checks the storage root against a disk budget
pub struct DiskGuard {
    root: PathBuf,
    probe: Box<dyn SpaceProbe>,
}

impl DiskGuard {
    pub fn new(root: PathBuf, probe: Box<dyn SpaceProbe>) -> Self {
        Self { root, probe }
    }

    /// Compare free space with `required_mb + margin_mb`
    pub fn has_space(
        &self,
        required_mb: u64,
        margin_mb: u64,
    ) -> Result<SpaceCheck, DiskBudgetError> {
        let usage = self.probe.usage(&self.root)?;
        let needed_mb = required_mb.saturating_add(margin_mb);

        debug!(
            "Disk check on {}: {} MB free of {} MB, {} MB needed",
            self.root.display(),
            usage.free_mb(),
            usage.total_bytes / MIB,
            needed_mb
        );

        Ok(SpaceCheck {
            free_mb: usage.free_mb(),
            needed_mb,
        })
    }

    /// Fail with `Insufficient` when the budget is not met
    pub fn ensure(&self, budget: DiskBudget) -> Result<(), DiskBudgetError> {
        let check = self.has_space(budget.required_mb, budget.margin_mb)?;
        if check.fits() {
            return Ok(());
        }

        Err(DiskBudgetError::Insufficient {
            free_mb: check.free_mb,
            needed_mb: check.needed_mb,
        })
    }
}

/// Outcome of a single disk check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpaceCheck {
    pub free_mb: u64,
    pub needed_mb: u64,
}

impl SpaceCheck {
    pub fn fits(&self) -> bool {
        self.free_mb >= self.needed_mb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FixedProbe;

    fn guard(free_mb: u64) -> DiskGuard {
        DiskGuard::new(PathBuf::from("."), Box::new(FixedProbe::mb(free_mb)))
    }

    #[test]
    fn test_has_space_threshold() {
        assert!(guard(1000).has_space(500, 500).unwrap().fits());
        assert!(!guard(999).has_space(500, 500).unwrap().fits());
    }

    #[test]
    fn test_ensure_reports_shortfall() {
        let budget = DiskBudget {
            required_mb: 100,
            margin_mb: 50,
        };

        match guard(120).ensure(budget) {
            Err(DiskBudgetError::Insufficient { free_mb, needed_mb }) => {
                assert_eq!(free_mb, 120);
                assert_eq!(needed_mb, 150);
            }
            other => panic!("expected insufficient space, got {:?}", other),
        }
    }

    #[test]
    fn test_huge_budget_does_not_wrap() {
        let check = guard(10_000).has_space(u64::MAX, 500).unwrap();
        assert_eq!(check.needed_mb, u64::MAX);
        assert!(!check.fits());

        let budget = DiskBudget {
            required_mb: u64::MAX,
            margin_mb: 1,
        };
        match guard(10_000).ensure(budget) {
            Err(DiskBudgetError::Insufficient { needed_mb, .. }) => {
                assert_eq!(needed_mb, u64::MAX);
            }
            other => panic!("expected insufficient space, got {:?}", other),
        }
    }

    #[test]
    fn test_statvfs_probe_on_tempdir() {
        let dir = tempfile::TempDir::new().unwrap();
        let usage = StatvfsProbe.usage(dir.path()).unwrap();
        assert!(usage.total_bytes >= usage.free_bytes);
    }

    #[test]
    fn test_statvfs_probe_missing_path() {
        let result = StatvfsProbe.usage(Path::new("/definitely/not/here"));
        assert!(matches!(result, Err(DiskBudgetError::Probe { .. })));
    }
}
