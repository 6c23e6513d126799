//! Run orchestration: acquire the source, load the tracklist, fan out the
//! track exports, clean up input artifacts.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::album::AlbumContext;
use crate::config::PathsConfig;
use crate::downloader::{looks_like_youtube_url, Downloader};
use crate::error::AlbumCutError;
use crate::exporter::{self, ExportEvent};
use crate::media::Ffmpeg;
use crate::tracklist;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub url: String,
    pub tracklist: PathBuf,
    pub album: AlbumContext,
    pub max_parallel: usize,
    /// Remove the downloaded source, the tracklist, and the cover art after
    /// a successful run.
    pub clean_inputs: bool,
    pub paths: PathsConfig,
}

/// Pipeline progress stages
#[derive(Debug, Clone)]
pub enum PipelineStage {
    Downloading { url: String },
    Downloaded { title: Option<String> },
    LoadingTracklist { path: PathBuf },
    Exporting { total: usize },
    TrackFinished(ExportEvent),
    Complete { output_dir: PathBuf, duration: Duration },
    Failed { stage: String, error: String },
}

/// Main processing pipeline
pub struct Pipeline {
    config: PipelineConfig,
    progress_tx: mpsc::Sender<PipelineStage>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, progress_tx: mpsc::Sender<PipelineStage>) -> Self {
        Self {
            config,
            progress_tx,
        }
    }

    pub async fn run(&self) -> Result<PathBuf, AlbumCutError> {
        let start_time = Instant::now();

        let scratch = tempfile::tempdir()?;
        let scratch_path = scratch.path().to_path_buf();

        info!("starting run for {}", self.config.url);
        debug!("scratch directory: {}", scratch_path.display());

        let yt_dlp_path = self.config.paths.yt_dlp_path()?;
        let ffmpeg_path = self.config.paths.ffmpeg_path()?;

        // 1. Acquire the source audio
        let _ = self
            .progress_tx
            .send(PipelineStage::Downloading {
                url: self.config.url.clone(),
            })
            .await;

        if !looks_like_youtube_url(&self.config.url) {
            warn!("{} does not look like a YouTube URL", self.config.url);
        }

        let downloader = Downloader::new(yt_dlp_path, scratch_path.join("source.m4a"));
        let source = downloader.download(&self.config.url).await.map_err(|e| {
            let _ = self.progress_tx.try_send(PipelineStage::Failed {
                stage: "download".to_string(),
                error: e.to_string(),
            });
            e
        })?;

        let _ = self
            .progress_tx
            .send(PipelineStage::Downloaded {
                title: source.metadata.as_ref().map(|m| m.title.clone()),
            })
            .await;

        // 2. Load the tracklist
        let _ = self
            .progress_tx
            .send(PipelineStage::LoadingTracklist {
                path: self.config.tracklist.clone(),
            })
            .await;

        let tracks = tracklist::load_tracklist(&self.config.tracklist).map_err(|e| {
            let _ = self.progress_tx.try_send(PipelineStage::Failed {
                stage: "tracklist".to_string(),
                error: e.to_string(),
            });
            e
        })?;

        // 3. Output directory
        let album = &self.config.album;
        tokio::fs::create_dir_all(&album.output_dir)
            .await
            .map_err(|source| AlbumCutError::DirectoryCreation {
                path: album.output_dir.clone(),
                source,
            })?;

        // 4. Fan out one export task per track
        let _ = self
            .progress_tx
            .send(PipelineStage::Exporting {
                total: tracks.len(),
            })
            .await;

        let ffmpeg = Ffmpeg::new(ffmpeg_path);
        let (events_tx, mut events_rx) = mpsc::channel::<ExportEvent>(32);
        let progress_tx = self.progress_tx.clone();
        let relay = tokio::spawn(async move {
            while let Some(event) = events_rx.recv().await {
                let _ = progress_tx
                    .send(PipelineStage::TrackFinished(event))
                    .await;
            }
        });

        let result = exporter::export_all(
            &ffmpeg,
            album,
            &source.audio_path,
            &tracks,
            self.config.max_parallel,
            events_tx,
        )
        .await;
        let _ = relay.await;

        result.map_err(|e| {
            let _ = self.progress_tx.try_send(PipelineStage::Failed {
                stage: "export".to_string(),
                error: e.to_string(),
            });
            AlbumCutError::Export(e)
        })?;

        // 5. Input cleanup
        if self.config.clean_inputs {
            for path in [&self.config.tracklist, &album.cover_art] {
                tokio::fs::remove_file(path).await.map_err(|source| {
                    AlbumCutError::InputCleanup {
                        path: path.clone(),
                        source,
                    }
                })?;
            }
            // Dropping the scratch guard removes the downloaded source
        } else {
            // Keep the source audio around and tell the user where it lives
            std::mem::forget(scratch);
            info!("source audio kept at {}", source.audio_path.display());
        }

        let duration = start_time.elapsed();
        info!(
            "exported {} tracks to {} ({:.1}s)",
            tracks.len(),
            album.output_dir.display(),
            duration.as_secs_f32()
        );

        let _ = self
            .progress_tx
            .send(PipelineStage::Complete {
                output_dir: album.output_dir.clone(),
                duration,
            })
            .await;

        Ok(album.output_dir.clone())
    }
}
