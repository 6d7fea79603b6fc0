//! CLI module for plmirror

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::library::MirrorConfig;

pub mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "plmirror",
    about = "Mirror a remote playlist into a local, position-ordered folder"
)]
#[command(version, author)]
pub struct Cli {
    /// Playlist URL or bare playlist id
    #[arg(value_name = "PLAYLIST", required_unless_present = "completions")]
    pub playlist: Option<String>,

    /// Directory holding downloaded items and the progress ledger
    #[arg(short, long, env = "PLMIRROR_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Cookie file passed through to the downloader
    #[arg(long, env = "PLMIRROR_COOKIES")]
    pub cookies: Option<PathBuf>,

    /// Transfer attempts per item before giving up
    #[arg(long)]
    pub retries: Option<u32>,

    /// Seconds to wait between attempts
    #[arg(long, value_name = "SECS")]
    pub retry_delay: Option<u64>,

    /// Seconds to pause between downloads
    #[arg(long, value_name = "SECS")]
    pub throttle: Option<u64>,

    /// Free space required per item, in MB
    #[arg(long, value_name = "MB")]
    pub required_mb: Option<u64>,

    /// Extra free space to keep, in MB
    #[arg(long, value_name = "MB")]
    pub margin_mb: Option<u64>,

    /// Downloader format selector
    #[arg(long)]
    pub format: Option<String>,

    /// Path to the yt-dlp binary
    #[arg(long = "yt-dlp", value_name = "PATH", env = "PLMIRROR_YTDLP")]
    pub ytdlp: Option<PathBuf>,

    /// Show what would be downloaded and renamed without doing it
    #[arg(long)]
    pub dry_run: bool,

    /// Print shell completions and exit
    #[arg(long, value_name = "SHELL", exclusive = true)]
    pub completions: Option<clap_complete::Shell>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Apply command-line overrides on top of a base configuration
    pub fn apply(&self, mut config: MirrorConfig) -> MirrorConfig {
        if let Some(dir) = &self.output_dir {
            config.storage_root = dir.clone();
        }
        if let Some(cookies) = &self.cookies {
            config.cookies = Some(cookies.clone());
        }
        if let Some(retries) = self.retries {
            config.retry.max_retries = retries;
        }
        if let Some(secs) = self.retry_delay {
            config.retry.delay = Duration::from_secs(secs);
        }
        if let Some(secs) = self.throttle {
            config.throttle = Duration::from_secs(secs);
        }
        if let Some(mb) = self.required_mb {
            config.disk.required_mb = mb;
        }
        if let Some(mb) = self.margin_mb {
            config.disk.margin_mb = mb;
        }
        if let Some(format) = &self.format {
            config.format = format.clone();
        }
        if let Some(bin) = &self.ytdlp {
            config.ytdlp_bin = bin.clone();
        }
        config
    }
}
