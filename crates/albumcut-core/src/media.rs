//! Narrow interface over the external media tool (ffmpeg)

use std::future::Future;
use std::path::PathBuf;

use tokio::process::Command;
use tracing::debug;

use crate::error::ToolError;

/// A request to cut one time range out of the shared source audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceJob {
    pub source: PathBuf,
    pub output: PathBuf,
    pub start_seconds: u64,
    /// `None` slices to the end of the stream.
    pub duration_seconds: Option<u64>,
}

/// A request to combine sliced audio with cover art and metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuxJob {
    pub audio: PathBuf,
    pub cover: PathBuf,
    pub output: PathBuf,
    pub tags: Vec<(String, String)>,
}

/// The two operations the exporter needs from the media tool.
///
/// The seam is this narrow so the exporter can be exercised against a fake
/// implementation without invoking any external binary.
pub trait MediaTool {
    fn slice(&self, job: &SliceJob) -> impl Future<Output = Result<(), ToolError>> + Send;
    fn mux(&self, job: &MuxJob) -> impl Future<Output = Result<(), ToolError>> + Send;
}

/// ffmpeg-backed [`MediaTool`].
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    ffmpeg_path: PathBuf,
}

impl Ffmpeg {
    pub fn new(ffmpeg_path: PathBuf) -> Self {
        Self { ffmpeg_path }
    }

    async fn run(cmd: &mut Command) -> Result<(), ToolError> {
        let output = cmd.output().await?;

        if !output.status.success() {
            return Err(ToolError::Failed {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

impl MediaTool for Ffmpeg {
    async fn slice(&self, job: &SliceJob) -> Result<(), ToolError> {
        debug!(
            "slicing {} -> {}",
            job.source.display(),
            job.output.display()
        );

        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.args(["-hide_banner", "-loglevel", "error"]);
        cmd.arg("-i").arg(&job.source);
        // Seek on the output side: slower than seeking before -i, but
        // sample-accurate at cut points
        cmd.args(["-ss", &job.start_seconds.to_string()]);
        if let Some(duration) = job.duration_seconds {
            cmd.args(["-t", &duration.to_string()]);
        }
        cmd.arg("-y").arg(&job.output);

        Self::run(&mut cmd).await
    }

    async fn mux(&self, job: &MuxJob) -> Result<(), ToolError> {
        debug!(
            "tagging {} -> {}",
            job.audio.display(),
            job.output.display()
        );

        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.args(["-hide_banner", "-loglevel", "error"]);
        cmd.arg("-i").arg(&job.audio);
        cmd.arg("-i").arg(&job.cover);
        // Audio from the slice, the still image as the embedded cover
        cmd.args(["-map", "0:0", "-map", "1:0", "-c", "copy"]);
        for (key, value) in &job.tags {
            cmd.args(["-metadata", &format!("{key}={value}")]);
        }
        cmd.args(["-metadata:s:v", "comment=Cover (front)"]);
        cmd.arg("-y").arg(&job.output);

        Self::run(&mut cmd).await
    }
}
