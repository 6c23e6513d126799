//! Tracklist CSV loading
//!
//! The input table has one row per track with three positional fields:
//! title, start timestamp, end timestamp. An empty end field marks the final
//! track as running to the end of the source; anything after that row is
//! ignored.

use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::error::TracklistError;
use crate::timestamp::parse_timestamp;

/// Characters a title may not contain because it becomes a path segment.
const ILLEGAL_TITLE_CHARS: [char; 2] = ['/', '\\'];

/// Where a track ends within the source audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackEnd {
    /// Ends at the given second offset.
    Bounded(u64),
    /// Runs to the end of the source; only valid for the last track.
    Open,
}

/// A validated, immutable description of one output track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSpec {
    pub title: String,
    /// 1-based position, assigned by input row order.
    pub number: u32,
    pub start_seconds: u64,
    pub end: TrackEnd,
}

impl TrackSpec {
    /// Slice duration in whole seconds, or `None` for an open end.
    pub fn duration_seconds(&self) -> Option<u64> {
        match self.end {
            TrackEnd::Bounded(end) => Some(end - self.start_seconds),
            TrackEnd::Open => None,
        }
    }
}

/// Load and validate the tracklist at `path`.
pub fn load_tracklist(path: &Path) -> Result<Vec<TrackSpec>, TracklistError> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(|source| TracklistError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let tracks = parse_tracklist(reader)?;
    debug!("loaded {} tracks from {}", tracks.len(), path.display());
    Ok(tracks)
}

/// Parse an already-opened tracklist table.
pub fn parse_tracklist<R: Read>(
    mut reader: csv::Reader<R>,
) -> Result<Vec<TrackSpec>, TracklistError> {
    let mut tracks = Vec::new();

    for (index, record) in reader.records().enumerate() {
        let row = index + 1;
        let record = record.map_err(|source| TracklistError::Record { row, source })?;

        let title = record.get(0).unwrap_or("").trim().to_string();
        if title.is_empty() {
            return Err(TracklistError::EmptyTitle { row });
        }
        if let Some(character) = title.chars().find(|c| ILLEGAL_TITLE_CHARS.contains(c)) {
            return Err(TracklistError::IllegalTitleCharacter {
                row,
                title,
                character,
            });
        }

        let start_seconds = parse_timestamp(record.get(1).unwrap_or(""))
            .map_err(|source| TracklistError::MalformedTimestamp { row, source })?;

        let number = row as u32;
        let end_field = record.get(2).unwrap_or("");

        // An empty end field means "to the end of the source" and closes the
        // list; later rows describe nothing playable.
        if end_field.is_empty() {
            tracks.push(TrackSpec {
                title,
                number,
                start_seconds,
                end: TrackEnd::Open,
            });
            break;
        }

        let end_seconds = parse_timestamp(end_field)
            .map_err(|source| TracklistError::MalformedTimestamp { row, source })?;
        if end_seconds <= start_seconds {
            return Err(TracklistError::InvalidRange {
                row,
                start: start_seconds,
                end: end_seconds,
            });
        }

        tracks.push(TrackSpec {
            title,
            number,
            start_seconds,
            end: TrackEnd::Bounded(end_seconds),
        });
    }

    if tracks.is_empty() {
        return Err(TracklistError::Empty);
    }

    Ok(tracks)
}
