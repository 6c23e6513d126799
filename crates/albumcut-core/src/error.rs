//! Error types for albumcut-core

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AlbumCutError>;

#[derive(Error, Debug)]
pub enum AlbumCutError {
    #[error("acquisition failed: {0}")]
    Acquisition(#[from] DownloadError),

    #[error("invalid input table: {0}")]
    Tracklist(#[from] TracklistError),

    #[error("could not create output directory {}: {source}", .path.display())]
    DirectoryCreation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("export failed: {0}")]
    Export(#[from] ExportFailures),

    #[error("could not remove input artifact {}: {source}", .path.display())]
    InputCleanup {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("yt-dlp exited with status {status:?}: {stderr}")]
    Failed {
        status: Option<i32>,
        stderr: String,
    },

    #[error("invalid source URL: {0}")]
    InvalidUrl(String),

    #[error("video unavailable or private: {0}")]
    Unavailable(String),

    #[error("yt-dlp reported success but no audio file at {}", .path.display())]
    MissingOutput { path: PathBuf },

    #[error("could not invoke yt-dlp: {0}")]
    Io(#[from] std::io::Error),
}

/// A timestamp that is not of the `H:MM:SS` shape.
#[derive(Error, Debug)]
#[error("malformed timestamp {input:?}: expected H:MM:SS")]
pub struct MalformedTimestamp {
    pub input: String,
}

#[derive(Error, Debug)]
pub enum TracklistError {
    #[error("could not read tracklist {}: {source}", .path.display())]
    Read { path: PathBuf, source: csv::Error },

    #[error("row {row}: {source}")]
    Record { row: usize, source: csv::Error },

    #[error("row {row}: title is empty")]
    EmptyTitle { row: usize },

    #[error("row {row}: title {title:?} contains illegal character {character:?}")]
    IllegalTitleCharacter {
        row: usize,
        title: String,
        character: char,
    },

    #[error("row {row}: {source}")]
    MalformedTimestamp {
        row: usize,
        source: MalformedTimestamp,
    },

    #[error("row {row}: end at {end}s is not after start at {start}s")]
    InvalidRange { row: usize, start: u64, end: u64 },

    #[error("tracklist contains no tracks")]
    Empty,
}

/// Outcome of one external ffmpeg invocation.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("could not invoke ffmpeg: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("ffmpeg exited with status {status:?}: {stderr}")]
    Failed {
        status: Option<i32>,
        stderr: String,
    },
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("slicing {} failed: {source}", .file.display())]
    SliceFailed { file: PathBuf, source: ToolError },

    #[error("tagging {} failed: {source}", .file.display())]
    TagFailed { file: PathBuf, source: ToolError },

    #[error("could not remove intermediate slice {}: {source}", .file.display())]
    CleanupFailed {
        file: PathBuf,
        source: std::io::Error,
    },
}

/// One track's export failure, with enough identity to fix the input.
#[derive(Debug)]
pub struct TrackFailure {
    pub number: u32,
    pub title: String,
    pub error: ExportError,
}

/// Aggregated outcome of a fan-out export where at least one track failed.
///
/// Holds every failure, sorted by track number; `Display` leads with the
/// first so a caller reporting a single line still surfaces real detail.
#[derive(Debug)]
pub struct ExportFailures {
    pub failures: Vec<TrackFailure>,
}

impl fmt::Display for ExportFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.failures.first() {
            Some(first) => write!(
                f,
                "{} track(s) failed; first: track {} ({:?}): {}",
                self.failures.len(),
                first.number,
                first.title,
                first.error
            ),
            None => write!(f, "no tracks failed"),
        }
    }
}

impl std::error::Error for ExportFailures {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.failures
            .first()
            .map(|failure| &failure.error as &(dyn std::error::Error + 'static))
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    LoadError(String),

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
