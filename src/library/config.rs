//! Mirror configuration
//!
//! Defaults can be persisted in ~/.config/plmirror/config.json. Every field is
//! optional there; command-line flags override whatever the file sets.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Default ledger filename, stored inside the storage root
pub const LEDGER_FILE: &str = "downloaded_urls.txt";

/// Bounded retry with a constant delay between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(5),
        }
    }
}

/// Free space required before each transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskBudget {
    pub required_mb: u64,
    pub margin_mb: u64,
}

impl Default for DiskBudget {
    fn default() -> Self {
        Self {
            required_mb: 500,
            margin_mb: 500,
        }
    }
}

/// Fully resolved configuration for one mirror run
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Flat directory holding artifacts and the ledger
    pub storage_root: PathBuf,
    pub ledger_file: String,
    pub retry: RetryPolicy,
    /// Pause between successful transfers
    pub throttle: Duration,
    pub disk: DiskBudget,
    /// Cookie file passed through to the downloader
    pub cookies: Option<PathBuf>,
    /// Downloader format selector
    pub format: String,
    pub ytdlp_bin: PathBuf,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("./videos"),
            ledger_file: LEDGER_FILE.to_string(),
            retry: RetryPolicy::default(),
            throttle: Duration::from_secs(5),
            disk: DiskBudget::default(),
            cookies: Some(PathBuf::from("cookies.txt")),
            format: "best".to_string(),
            ytdlp_bin: PathBuf::from("yt-dlp"),
        }
    }
}

impl MirrorConfig {
    /// Path of the progress ledger
    pub fn ledger_path(&self) -> PathBuf {
        self.storage_root.join(&self.ledger_file)
    }

    /// Layer persisted defaults over the built-in ones
    pub fn with_file(mut self, file: &FileConfig) -> Self {
        if let Some(root) = &file.storage_root {
            self.storage_root = root.clone();
        }
        if let Some(ledger) = &file.ledger_file {
            self.ledger_file = ledger.clone();
        }
        if let Some(retries) = file.max_retries {
            self.retry.max_retries = retries;
        }
        if let Some(secs) = file.retry_delay_secs {
            self.retry.delay = Duration::from_secs(secs);
        }
        if let Some(secs) = file.throttle_secs {
            self.throttle = Duration::from_secs(secs);
        }
        if let Some(mb) = file.required_mb {
            self.disk.required_mb = mb;
        }
        if let Some(mb) = file.margin_mb {
            self.disk.margin_mb = mb;
        }
        if let Some(cookies) = &file.cookies {
            self.cookies = Some(cookies.clone());
        }
        if let Some(format) = &file.format {
            self.format = format.clone();
        }
        if let Some(bin) = &file.ytdlp_bin {
            self.ytdlp_bin = bin.clone();
        }
        self
    }
}

/// Persisted defaults, all optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub storage_root: Option<PathBuf>,
    pub ledger_file: Option<String>,
    pub max_retries: Option<u32>,
    pub retry_delay_secs: Option<u64>,
    pub throttle_secs: Option<u64>,
    pub required_mb: Option<u64>,
    pub margin_mb: Option<u64>,
    pub cookies: Option<PathBuf>,
    pub format: Option<String>,
    pub ytdlp_bin: Option<PathBuf>,
}

impl FileConfig {
    /// Load persisted defaults from the user config directory
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No config directory available, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load persisted defaults from a specific path
    ///
    /// A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config {:?}", path))?;

        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("plmirror").join("config.json"))
    }
}
