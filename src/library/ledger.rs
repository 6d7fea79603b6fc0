//! Append-only progress ledger
//!
//! One canonical item URL per line, UTF-8, newline-terminated. A URL is only
//! ever written after its payload is fully on disk, and every append is synced
//! before the caller moves on.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::LedgerError;

/// Durable set of completed item URLs
#[derive(Debug)]
pub struct ProgressLedger {
    path: PathBuf,
    file: File,
    entries: HashSet<String>,
}

impl ProgressLedger {
    /// Open the ledger for appending, creating an empty one on first run
    ///
    /// An unterminated last line is closed off with a newline before anything
    /// else is appended, so the next entry starts on its own line.
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| LedgerError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        let content = Self::read(path)?;
        if !content.is_empty() && !content.ends_with('\n') {
            warn!(
                "Ledger {} does not end with a newline, terminating last entry",
                path.display()
            );
            file.write_all(b"\n")
                .and_then(|_| file.sync_data())
                .map_err(|source| LedgerError::Append {
                    path: path.to_path_buf(),
                    source,
                })?;
        }

        let entries = Self::parse(&content);
        debug!("Loaded ledger {}: {} entries", path.display(), entries.len());

        Ok(Self {
            path: path.to_path_buf(),
            file,
            entries,
        })
    }

    /// Read every recorded URL
    ///
    /// Blank lines and surrounding whitespace are ignored. A missing file is
    /// an empty ledger.
    pub fn load_all(path: &Path) -> Result<HashSet<String>, LedgerError> {
        Ok(Self::parse(&Self::read(path)?))
    }

    fn read(path: &Path) -> Result<String, LedgerError> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(source) => Err(LedgerError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn parse(content: &str) -> HashSet<String> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Check if a URL was previously recorded
    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains(url)
    }

    /// Durably append a URL
    ///
    /// Recording an already present URL is a no-op.
    pub fn record(&mut self, url: &str) -> Result<(), LedgerError> {
        if self.entries.contains(url) {
            debug!("Already recorded: {}", url);
            return Ok(());
        }

        writeln!(self.file, "{}", url)
            .and_then(|_| self.file.flush())
            .and_then(|_| self.file.sync_data())
            .map_err(|source| LedgerError::Append {
                path: self.path.clone(),
                source,
            })?;

        self.entries.insert(url.to_string());
        debug!("Recorded {} in ledger", url);
        Ok(())
    }

    /// Number of recorded URLs
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_first_run_creates_empty_ledger() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("downloaded_urls.txt");

        let ledger = ProgressLedger::open(&path).unwrap();

        assert_eq!(ledger.size(), 0);
        assert!(path.exists());
    }

    #[test]
    fn test_record_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("downloaded_urls.txt");

        let mut ledger = ProgressLedger::open(&path).unwrap();
        ledger.record("https://www.youtube.com/watch?v=a").unwrap();
        ledger.record("https://www.youtube.com/watch?v=b").unwrap();
        drop(ledger);

        let reopened = ProgressLedger::open(&path).unwrap();
        assert_eq!(reopened.size(), 2);
        assert!(reopened.contains("https://www.youtube.com/watch?v=a"));
        assert!(!reopened.contains("https://www.youtube.com/watch?v=c"));

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "https://www.youtube.com/watch?v=a\nhttps://www.youtube.com/watch?v=b\n"
        );
    }

    #[test]
    fn test_duplicate_record_is_noop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("downloaded_urls.txt");

        let mut ledger = ProgressLedger::open(&path).unwrap();
        ledger.record("u1").unwrap();
        ledger.record("u1").unwrap();

        assert_eq!(ledger.size(), 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "u1\n");
    }

    #[test]
    fn test_load_ignores_blank_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("downloaded_urls.txt");
        fs::write(&path, "u1\n\n  u2  \n").unwrap();

        let entries = ProgressLedger::load_all(&path).unwrap();

        assert_eq!(entries.len(), 2);
        assert!(entries.contains("u2"));
    }

    #[test]
    fn test_unterminated_last_line_is_kept_separate() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("downloaded_urls.txt");
        fs::write(&path, "https://www.youtube.com/watch?v=a").unwrap();

        let mut ledger = ProgressLedger::open(&path).unwrap();
        assert!(ledger.contains("https://www.youtube.com/watch?v=a"));
        ledger.record("https://www.youtube.com/watch?v=b").unwrap();
        drop(ledger);

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "https://www.youtube.com/watch?v=a\nhttps://www.youtube.com/watch?v=b\n"
        );
        let reopened = ProgressLedger::open(&path).unwrap();
        assert!(reopened.contains("https://www.youtube.com/watch?v=a"));
        assert!(reopened.contains("https://www.youtube.com/watch?v=b"));
        assert_eq!(reopened.size(), 2);
    }

    #[test]
    fn test_unopenable_ledger_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing-dir").join("downloaded_urls.txt");

        assert!(matches!(
            ProgressLedger::open(&path),
            Err(LedgerError::Open { .. })
        ));
    }
}
