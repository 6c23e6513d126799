//! Source audio acquisition using yt-dlp

use std::path::PathBuf;

use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::DownloadError;

/// Downloads the single source audio the whole run is cut from.
#[derive(Debug)]
pub struct Downloader {
    yt_dlp_path: PathBuf,
    target: PathBuf,
}

#[derive(Debug)]
pub struct DownloadedSource {
    pub audio_path: PathBuf,
    pub metadata: Option<SourceMetadata>,
}

/// The subset of yt-dlp's JSON output worth surfacing to the user.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceMetadata {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
}

impl Downloader {
    pub fn new(yt_dlp_path: PathBuf, target: PathBuf) -> Self {
        Self {
            yt_dlp_path,
            target,
        }
    }

    /// Download the source audio, writing it to the configured target path.
    pub async fn download(&self, url: &str) -> Result<DownloadedSource, DownloadError> {
        info!("downloading audio from {url}");

        let output = Command::new(&self.yt_dlp_path)
            .args([
                // AAC audio itag, with fallbacks for sources that lack it
                "-f",
                "140/bestaudio[ext=m4a]/bestaudio",
                // Print JSON to stdout for metadata parsing
                "--print-json",
                "-o",
            ])
            .arg(&self.target)
            .arg(url)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("yt-dlp stderr: {stderr}");

            if stderr.contains("Video unavailable") || stderr.contains("Private video") {
                return Err(DownloadError::Unavailable(url.to_string()));
            }
            if stderr.contains("is not a valid URL") {
                return Err(DownloadError::InvalidUrl(url.to_string()));
            }

            return Err(DownloadError::Failed {
                status: output.status.code(),
                stderr: stderr.trim().to_string(),
            });
        }

        // Success is exit status zero plus the file actually existing;
        // metadata is informational only
        if !self.target.exists() {
            return Err(DownloadError::MissingOutput {
                path: self.target.clone(),
            });
        }

        let metadata: Option<SourceMetadata> = serde_json::from_slice(&output.stdout).ok();
        if let Some(ref meta) = metadata {
            debug!("downloaded {:?} ({})", meta.title, meta.id);
        }

        Ok(DownloadedSource {
            audio_path: self.target.clone(),
            metadata,
        })
    }
}

/// Whether the locator looks like a YouTube URL.
///
/// yt-dlp handles many other sites, so a mismatch is worth a warning, not
/// an abort.
pub fn looks_like_youtube_url(url: &str) -> bool {
    url.contains("youtube.com/watch")
        || url.contains("youtu.be/")
        || url.contains("youtube.com/playlist")
        || url.contains("youtube.com/shorts")
        || url.contains("music.youtube.com")
}
