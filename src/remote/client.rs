//! yt-dlp backed resolver and transfer

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

use super::models::{FlatPlaylist, ItemDescriptor};
use super::reference::playlist_url;
use super::{MetadataResolver, Transfer, TransferRequest};
use crate::error::{ResolutionError, TransferError};

/// Client that shells out to yt-dlp for metadata and payloads
#[derive(Debug, Clone)]
pub struct YtDlpClient {
    bin: PathBuf,
    format: String,
    cookies: Option<PathBuf>,
}

impl YtDlpClient {
    /// Create a new client
    ///
    /// A configured cookie file that does not exist is dropped with a warning
    /// rather than failing every call later.
    pub fn new(bin: PathBuf, format: &str, cookies: Option<PathBuf>) -> Self {
        let cookies = cookies.and_then(|path| {
            if path.is_file() {
                Some(path)
            } else {
                warn!("Cookie file {} not found, continuing without it", path.display());
                None
            }
        });

        Self {
            bin,
            format: format.to_string(),
            cookies,
        }
    }

    fn cookie_args(&self) -> Vec<OsString> {
        match &self.cookies {
            Some(path) => vec!["--cookies".into(), path.as_os_str().to_owned()],
            None => Vec::new(),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.args(self.cookie_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl MetadataResolver for YtDlpClient {
    async fn resolve(&self, playlist_ref: &str) -> Result<Vec<ItemDescriptor>, ResolutionError> {
        let url = playlist_url(playlist_ref);
        debug!("Resolving playlist: {}", url);

        let output = self
            .command()
            .args(["--flat-playlist", "--dump-single-json", "--no-warnings"])
            .arg(&url)
            .output()
            .await
            .map_err(ResolutionError::Spawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(if is_access_denied(&stderr) {
                ResolutionError::AccessDenied(stderr)
            } else {
                ResolutionError::Extractor(stderr)
            });
        }

        let playlist: FlatPlaylist = serde_json::from_slice(&output.stdout)?;
        debug!(
            "Resolved playlist {} ({}): {} entries",
            playlist.title.as_deref().unwrap_or("untitled"),
            playlist.id.as_deref().unwrap_or("?"),
            playlist.entries.len()
        );

        Ok(playlist.into_descriptors())
    }
}

#[async_trait]
impl Transfer for YtDlpClient {
    async fn fetch(&self, request: &TransferRequest) -> Result<PathBuf, TransferError> {
        let template = output_template(&request.output_dir, &request.stem);
        debug!("Fetching {} -> {}", request.url, template.display());

        let output = self
            .command()
            .arg("-f")
            .arg(&self.format)
            .arg("-o")
            .arg(&template)
            .args([
                "--no-playlist",
                "--no-continue",
                "--force-overwrites",
                "--no-warnings",
                "--no-simulate",
                "--print",
                "after_move:filepath",
            ])
            .arg(&request.url)
            .output()
            .await
            .map_err(TransferError::Spawn)?;

        if !output.status.success() {
            return Err(TransferError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let path = stdout
            .lines()
            .map(str::trim)
            .rev()
            .find(|line| !line.is_empty())
            .map(PathBuf::from)
            .ok_or(TransferError::MissingOutput)?;

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(TransferError::OutputNotFound(path));
        }

        Ok(path)
    }
}

/// Build the yt-dlp output template for a stem, escaping template syntax
fn output_template(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{}.%(ext)s", stem.replace('%', "%%")))
}

fn is_access_denied(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    ["private", "sign in", "members-only", "http error 403"]
        .iter()
        .any(|m| lower.contains(m))
}
