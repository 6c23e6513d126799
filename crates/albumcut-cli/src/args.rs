use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "albumcut")]
#[command(
    author,
    version,
    about = "Download a live set or album rip and cut it into individually tagged tracks"
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download a source and cut it into tagged tracks
    Cut {
        /// Source video URL
        #[arg(value_name = "URL")]
        link: String,

        #[command(flatten)]
        options: CutOptions,
    },

    /// Check external tool availability
    Doctor,

    /// Show configuration
    Config,
}

#[derive(clap::Args, Clone)]
pub struct CutOptions {
    /// CSV tracklist with one `title,start,end` row per track
    #[arg(short, long, default_value = "tracklist.csv")]
    pub input: PathBuf,

    /// Path to the cover art image
    #[arg(short, long)]
    pub cover: PathBuf,

    /// Album title
    #[arg(short = 't', long = "title")]
    pub album_title: String,

    /// Album artist
    #[arg(short, long)]
    pub artist: String,

    /// Release year
    #[arg(short, long)]
    pub year: i32,

    /// Output format of the cut tracks [default: mp3]
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Output directory; the album folder is appended unless this is `.`
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Maximum concurrent track exports
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Remove input artifacts (downloaded audio, tracklist, cover art)
    /// after export [default: true]
    #[arg(long, action = clap::ArgAction::Set, value_name = "BOOL")]
    pub clean: Option<bool>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// MP3 - Lossy, widely compatible
    Mp3,
    /// AAC - Lossy, good quality/size ratio
    Aac,
    /// FLAC - Lossless compression
    Flac,
    /// WAV - Uncompressed PCM
    Wav,
    /// Opus - Lossy, best quality/size ratio
    Opus,
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
