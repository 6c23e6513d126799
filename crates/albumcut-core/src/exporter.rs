//! Per-track export and the fan-out orchestrator

use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::album::AlbumContext;
use crate::error::{ExportError, ExportFailures, TrackFailure};
use crate::media::{MediaTool, MuxJob, SliceJob};
use crate::tracklist::TrackSpec;

/// Emitted as each track finishes, in completion order.
#[derive(Debug, Clone)]
pub struct ExportEvent {
    pub number: u32,
    pub title: String,
    pub ok: bool,
    pub completed: usize,
    pub total: usize,
}

/// Exports a single track from the shared source audio.
pub struct TrackExporter<'a, M> {
    media: &'a M,
    album: &'a AlbumContext,
    source: &'a Path,
}

impl<'a, M: MediaTool> TrackExporter<'a, M> {
    pub fn new(media: &'a M, album: &'a AlbumContext, source: &'a Path) -> Self {
        Self {
            media,
            album,
            source,
        }
    }

    /// Slice, tag, and finalize one track, returning the finished file path.
    ///
    /// The intermediate slice is removed only after tagging has produced the
    /// final file; a failed tag leaves it on disk for inspection.
    pub async fn export(&self, track: &TrackSpec) -> Result<PathBuf, ExportError> {
        let sliced = self.album.slice_path(track);
        let slice_job = SliceJob {
            source: self.source.to_path_buf(),
            output: sliced.clone(),
            start_seconds: track.start_seconds,
            duration_seconds: track.duration_seconds(),
        };
        self.media
            .slice(&slice_job)
            .await
            .map_err(|source| ExportError::SliceFailed {
                file: sliced.clone(),
                source,
            })?;

        let finished = self.album.track_path(track);
        let mux_job = MuxJob {
            audio: sliced.clone(),
            cover: self.album.cover_art.clone(),
            output: finished.clone(),
            tags: self.album.metadata_tags(track),
        };
        self.media
            .mux(&mux_job)
            .await
            .map_err(|source| ExportError::TagFailed {
                file: finished.clone(),
                source,
            })?;

        tokio::fs::remove_file(&sliced)
            .await
            .map_err(|source| ExportError::CleanupFailed {
                file: sliced,
                source,
            })?;

        Ok(finished)
    }
}

/// Export every track concurrently against the shared source audio.
///
/// One task per track, at most `max_parallel` in flight, joined once all
/// complete. Tasks run to completion even when a sibling fails (no
/// cancellation); every failure is collected into [`ExportFailures`], so a
/// partial success still reports as overall failure while the finished
/// files stay on disk.
pub async fn export_all<M: MediaTool + Sync>(
    media: &M,
    album: &AlbumContext,
    source: &Path,
    tracks: &[TrackSpec],
    max_parallel: usize,
    events: mpsc::Sender<ExportEvent>,
) -> Result<Vec<PathBuf>, ExportFailures> {
    let total = tracks.len();
    let exporter = TrackExporter::new(media, album, source);

    let mut pending = stream::iter(tracks)
        .map(|track| {
            let exporter = &exporter;
            async move { (track, exporter.export(track).await) }
        })
        .buffer_unordered(max_parallel.max(1));

    let mut finished = Vec::with_capacity(total);
    let mut failures = Vec::new();
    let mut completed = 0usize;

    while let Some((track, result)) = pending.next().await {
        completed += 1;
        let _ = events
            .send(ExportEvent {
                number: track.number,
                title: track.title.clone(),
                ok: result.is_ok(),
                completed,
                total,
            })
            .await;

        match result {
            Ok(path) => {
                info!("exported track {} {:?}", track.number, track.title);
                finished.push(path);
            }
            Err(err) => {
                error!("track {} {:?} failed: {err}", track.number, track.title);
                failures.push(TrackFailure {
                    number: track.number,
                    title: track.title.clone(),
                    error: err,
                });
            }
        }
    }

    if failures.is_empty() {
        Ok(finished)
    } else {
        failures.sort_by_key(|failure| failure.number);
        Err(ExportFailures { failures })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::album::OutputFormat;
    use crate::error::ToolError;
    use crate::tracklist::TrackEnd;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Records every job and touches output files instead of running ffmpeg.
    #[derive(Default)]
    struct FakeMedia {
        fail_slice_containing: Option<&'static str>,
        fail_mux_containing: Option<&'static str>,
        slices: Mutex<Vec<SliceJob>>,
        muxes: Mutex<Vec<MuxJob>>,
    }

    impl MediaTool for FakeMedia {
        async fn slice(&self, job: &SliceJob) -> Result<(), ToolError> {
            if let Some(marker) = self.fail_slice_containing {
                if job.output.to_string_lossy().contains(marker) {
                    return Err(ToolError::Failed {
                        status: Some(1),
                        stderr: "Invalid data found when processing input".into(),
                    });
                }
            }
            self.slices.lock().unwrap().push(job.clone());
            tokio::fs::write(&job.output, b"slice").await.unwrap();
            Ok(())
        }

        async fn mux(&self, job: &MuxJob) -> Result<(), ToolError> {
            if let Some(marker) = self.fail_mux_containing {
                if job.output.to_string_lossy().contains(marker) {
                    return Err(ToolError::Failed {
                        status: Some(1),
                        stderr: "Could not write header".into(),
                    });
                }
            }
            self.muxes.lock().unwrap().push(job.clone());
            tokio::fs::write(&job.output, b"tagged").await.unwrap();
            Ok(())
        }
    }

    fn track(number: u32, title: &str, start: u64, end: TrackEnd) -> TrackSpec {
        TrackSpec {
            title: title.to_string(),
            number,
            start_seconds: start,
            end,
        }
    }

    fn album_in(dir: &Path) -> AlbumContext {
        AlbumContext {
            artist: "The Doors".into(),
            album: "Live in Vancouver".into(),
            year: 1970,
            cover_art: dir.join("cover.jpg"),
            output_dir: dir.to_path_buf(),
            format: OutputFormat::Mp3,
        }
    }

    #[tokio::test]
    async fn export_slices_tags_and_removes_the_intermediate() {
        let dir = TempDir::new().unwrap();
        let album = album_in(dir.path());
        let media = FakeMedia::default();
        let source = dir.path().join("source.m4a");

        let exporter = TrackExporter::new(&media, &album, &source);
        let spec = track(2, "Peace Frog", 210, TrackEnd::Bounded(385));
        let finished = exporter.export(&spec).await.unwrap();

        assert_eq!(finished, dir.path().join("2 - Peace Frog.mp3"));
        assert!(finished.exists());
        assert!(!dir.path().join("2 - Peace Frog.slice.mp3").exists());

        let slices = media.slices.lock().unwrap();
        assert_eq!(slices[0].start_seconds, 210);
        assert_eq!(slices[0].duration_seconds, Some(175));
        assert_eq!(slices[0].source, source);

        let muxes = media.muxes.lock().unwrap();
        assert_eq!(muxes[0].cover, dir.path().join("cover.jpg"));
        assert!(muxes[0]
            .tags
            .contains(&("title".to_string(), "Peace Frog".to_string())));
        assert!(muxes[0]
            .tags
            .contains(&("track".to_string(), "2".to_string())));
    }

    #[tokio::test]
    async fn open_ended_track_passes_no_duration() {
        let dir = TempDir::new().unwrap();
        let album = album_in(dir.path());
        let media = FakeMedia::default();
        let source = dir.path().join("source.m4a");

        let exporter = TrackExporter::new(&media, &album, &source);
        exporter
            .export(&track(9, "Encore", 3600, TrackEnd::Open))
            .await
            .unwrap();

        assert_eq!(media.slices.lock().unwrap()[0].duration_seconds, None);
    }

    #[tokio::test]
    async fn slice_failure_names_the_intermediate_and_keeps_the_diagnostic() {
        let dir = TempDir::new().unwrap();
        let album = album_in(dir.path());
        let media = FakeMedia {
            fail_slice_containing: Some("Broken"),
            ..FakeMedia::default()
        };
        let source = dir.path().join("source.m4a");

        let exporter = TrackExporter::new(&media, &album, &source);
        let err = exporter
            .export(&track(1, "Broken", 0, TrackEnd::Bounded(10)))
            .await
            .unwrap_err();

        match &err {
            ExportError::SliceFailed { file, .. } => {
                assert_eq!(file, &dir.path().join("1 - Broken.slice.mp3"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("Invalid data found"));
    }

    #[tokio::test]
    async fn tag_failure_leaves_the_slice_for_inspection() {
        let dir = TempDir::new().unwrap();
        let album = album_in(dir.path());
        let media = FakeMedia {
            fail_mux_containing: Some("Stuck"),
            ..FakeMedia::default()
        };
        let source = dir.path().join("source.m4a");

        let exporter = TrackExporter::new(&media, &album, &source);
        let err = exporter
            .export(&track(4, "Stuck", 0, TrackEnd::Bounded(30)))
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::TagFailed { .. }));
        // Cleanup only runs after a successful tag
        assert!(dir.path().join("4 - Stuck.slice.mp3").exists());
        assert!(!dir.path().join("4 - Stuck.mp3").exists());
    }

    #[tokio::test]
    async fn export_all_finishes_every_track() {
        let dir = TempDir::new().unwrap();
        let album = album_in(dir.path());
        let media = FakeMedia::default();
        let source = dir.path().join("source.m4a");
        let tracks = vec![
            track(1, "One", 0, TrackEnd::Bounded(60)),
            track(2, "Two", 60, TrackEnd::Bounded(120)),
            track(3, "Three", 120, TrackEnd::Open),
        ];

        let (tx, mut rx) = mpsc::channel(16);
        let finished = export_all(&media, &album, &source, &tracks, 4, tx)
            .await
            .unwrap();

        assert_eq!(finished.len(), 3);
        for spec in &tracks {
            assert!(album.track_path(spec).exists());
        }

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.ok && e.total == 3));
        assert_eq!(
            events.iter().map(|e| e.completed).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_siblings() {
        let dir = TempDir::new().unwrap();
        let album = album_in(dir.path());
        let media = FakeMedia {
            fail_slice_containing: Some("Three"),
            ..FakeMedia::default()
        };
        let source = dir.path().join("source.m4a");
        let tracks: Vec<TrackSpec> = ["One", "Two", "Three", "Four", "Five"]
            .iter()
            .enumerate()
            .map(|(i, title)| {
                track(
                    i as u32 + 1,
                    title,
                    i as u64 * 60,
                    TrackEnd::Bounded((i as u64 + 1) * 60),
                )
            })
            .collect();

        let (tx, _rx) = mpsc::channel(16);
        let err = export_all(&media, &album, &source, &tracks, 2, tx)
            .await
            .unwrap_err();

        assert_eq!(err.failures.len(), 1);
        assert_eq!(err.failures[0].number, 3);
        assert_eq!(err.failures[0].title, "Three");

        // The four siblings finished with correct names despite the failure
        for title in ["One", "Two", "Four", "Five"] {
            let spec = tracks.iter().find(|t| t.title == *title).unwrap();
            assert!(album.track_path(spec).exists());
        }
        assert!(!dir.path().join("3 - Three.mp3").exists());

        let message = err.to_string();
        assert!(message.contains("track 3"));
        assert!(message.contains("Three"));
    }

    #[tokio::test]
    async fn rerun_reproduces_identical_tags() {
        let dir = TempDir::new().unwrap();
        let album = album_in(dir.path());
        let media = FakeMedia::default();
        let source = dir.path().join("source.m4a");
        let spec = track(7, "When the Music's Over", 1200, TrackEnd::Bounded(1860));

        let exporter = TrackExporter::new(&media, &album, &source);
        let first = exporter.export(&spec).await.unwrap();
        tokio::fs::remove_file(&first).await.unwrap();
        exporter.export(&spec).await.unwrap();

        let muxes = media.muxes.lock().unwrap();
        assert_eq!(muxes.len(), 2);
        assert_eq!(muxes[0].tags, muxes[1].tags);
        assert_eq!(muxes[0].output, muxes[1].output);
    }
}
