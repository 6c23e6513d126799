//! Run-scoped album metadata and output layout

use std::path::{Path, PathBuf};

use crate::tracklist::TrackSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Mp3,
    Aac,
    Flac,
    Wav,
    Opus,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Aac => "m4a",
            OutputFormat::Flac => "flac",
            OutputFormat::Wav => "wav",
            OutputFormat::Opus => "opus",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mp3" => Some(OutputFormat::Mp3),
            "aac" | "m4a" => Some(OutputFormat::Aac),
            "flac" => Some(OutputFormat::Flac),
            "wav" => Some(OutputFormat::Wav),
            "opus" => Some(OutputFormat::Opus),
            _ => None,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Mp3 => write!(f, "MP3"),
            OutputFormat::Aac => write!(f, "AAC"),
            OutputFormat::Flac => write!(f, "FLAC"),
            OutputFormat::Wav => write!(f, "WAV"),
            OutputFormat::Opus => write!(f, "Opus"),
        }
    }
}

/// Immutable run-scoped album configuration.
///
/// Built once per run and shared read-only across every concurrent track
/// export; no component reads artist/album/year from ambient state.
#[derive(Debug, Clone)]
pub struct AlbumContext {
    pub artist: String,
    pub album: String,
    pub year: i32,
    pub cover_art: PathBuf,
    pub output_dir: PathBuf,
    pub format: OutputFormat,
}

impl AlbumContext {
    /// Build the context, resolving the final output directory.
    ///
    /// The `{artist} - {album} ({year})` folder is appended to `output_base`
    /// unless the base is explicitly the current directory.
    pub fn new(
        artist: impl Into<String>,
        album: impl Into<String>,
        year: i32,
        cover_art: PathBuf,
        output_base: &Path,
        format: OutputFormat,
    ) -> Self {
        let artist = artist.into();
        let album = album.into();
        let output_dir = if output_base == Path::new(".") {
            output_base.to_path_buf()
        } else {
            output_base.join(format!("{artist} - {album} ({year})"))
        };

        Self {
            artist,
            album,
            year,
            cover_art,
            output_dir,
            format,
        }
    }

    /// Final path of a finished track: `{n} - {title}.{ext}`.
    pub fn track_path(&self, track: &TrackSpec) -> PathBuf {
        self.output_dir.join(format!(
            "{} - {}.{}",
            track.number,
            track.title,
            self.format.extension()
        ))
    }

    /// Path of the intermediate slice a track is cut into before tagging.
    ///
    /// Carries the track number so two tracks sharing a title never race on
    /// the same intermediate file.
    pub fn slice_path(&self, track: &TrackSpec) -> PathBuf {
        self.output_dir.join(format!(
            "{} - {}.slice.{}",
            track.number,
            track.title,
            self.format.extension()
        ))
    }

    /// The metadata key/value pairs embedded into a finished track.
    pub fn metadata_tags(&self, track: &TrackSpec) -> Vec<(String, String)> {
        vec![
            ("author".into(), self.artist.clone()),
            ("artist".into(), self.artist.clone()),
            ("composer".into(), self.artist.clone()),
            ("album".into(), self.album.clone()),
            ("album_artist".into(), self.artist.clone()),
            ("year".into(), self.year.to_string()),
            ("title".into(), track.title.clone()),
            ("track".into(), track.number.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracklist::TrackEnd;

    fn track(number: u32, title: &str) -> TrackSpec {
        TrackSpec {
            title: title.to_string(),
            number,
            start_seconds: 0,
            end: TrackEnd::Bounded(60),
        }
    }

    fn context(output_base: &Path) -> AlbumContext {
        AlbumContext::new(
            "The Doors",
            "Live in Vancouver",
            1970,
            PathBuf::from("cover.jpg"),
            output_base,
            OutputFormat::Mp3,
        )
    }

    #[test]
    fn appends_album_directory_to_explicit_output() {
        let ctx = context(Path::new("/music"));
        assert_eq!(
            ctx.output_dir,
            PathBuf::from("/music/The Doors - Live in Vancouver (1970)")
        );
    }

    #[test]
    fn current_directory_gets_no_album_subdirectory() {
        let ctx = context(Path::new("."));
        assert_eq!(ctx.output_dir, PathBuf::from("."));
    }

    #[test]
    fn track_and_slice_paths_are_distinct_per_track() {
        let ctx = context(Path::new("."));
        let t = track(3, "Roadhouse Blues");
        assert_eq!(ctx.track_path(&t), PathBuf::from("./3 - Roadhouse Blues.mp3"));
        assert_eq!(
            ctx.slice_path(&t),
            PathBuf::from("./3 - Roadhouse Blues.slice.mp3")
        );
        assert_ne!(ctx.slice_path(&t), ctx.slice_path(&track(4, "Roadhouse Blues")));
    }

    #[test]
    fn tags_carry_track_identity_and_album_fields() {
        let ctx = context(Path::new("."));
        let tags = ctx.metadata_tags(&track(5, "The End"));

        let get = |key: &str| {
            tags.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
                .unwrap()
        };
        assert_eq!(get("title"), "The End");
        assert_eq!(get("track"), "5");
        assert_eq!(get("album"), "Live in Vancouver");
        assert_eq!(get("artist"), "The Doors");
        assert_eq!(get("album_artist"), "The Doors");
        assert_eq!(get("year"), "1970");
    }

    #[test]
    fn format_extension_and_parse_agree() {
        for (name, format) in [
            ("mp3", OutputFormat::Mp3),
            ("m4a", OutputFormat::Aac),
            ("flac", OutputFormat::Flac),
            ("wav", OutputFormat::Wav),
            ("opus", OutputFormat::Opus),
        ] {
            assert_eq!(OutputFormat::from_str(name), Some(format));
        }
        assert_eq!(OutputFormat::from_str("ogg"), None);
    }
}
