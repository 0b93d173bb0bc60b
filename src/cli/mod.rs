use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "clipset",
    about = "Clipset - Build small audiovisual datasets from YouTube clip manifests",
    version,
    long_about = "A CLI tool that downloads the clips named in a CSV manifest, trims them to their time window, extracts normalized audio and resized frames, and writes CSV annotation files mapping each retained clip to its labels."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the dataset preparation pipeline over a manifest
    Run {
        /// Manifest CSV: source_id, start_seconds, end_seconds, label_ids
        #[arg(short, long, value_name = "FILE")]
        manifest: PathBuf,

        /// Label taxonomy file (CSV in index mode, JSON in name mode)
        #[arg(short, long, value_name = "FILE")]
        labels: PathBuf,

        /// Annotation output mode
        #[arg(long, value_enum, default_value = "index")]
        mode: AnnotationMode,

        /// Process at most N manifest rows
        #[arg(long, value_name = "N")]
        max_items: Option<usize>,

        /// Root directory for clips, audio, frames, and annotations
        #[arg(long, value_name = "DIR")]
        base_dir: Option<PathBuf>,

        /// Which items receive annotation records (defaults per mode)
        #[arg(long, value_enum)]
        emit: Option<EmissionPolicy>,

        /// Per-item download timeout in seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },

    /// Check that the required external tools are installed
    Check,

    /// Show or initialize configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}

/// How annotation records are resolved from label ids
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnnotationMode {
    /// First label id mapped to its numeric class index, plus a companion
    /// evaluation manifest of bare source ids
    Index,
    /// Every label id mapped to its display name, joined with commas
    Name,
}

impl AnnotationMode {
    /// The emission policy each mode historically used. Index mode only
    /// annotates acquired items; name mode annotates every manifest item.
    pub fn default_policy(&self) -> EmissionPolicy {
        match self {
            AnnotationMode::Index => EmissionPolicy::Acquired,
            AnnotationMode::Name => EmissionPolicy::All,
        }
    }
}

/// Which manifest items get annotation records
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmissionPolicy {
    /// Only items whose clip was successfully acquired
    Acquired,
    /// Every manifest item, regardless of acquisition outcome
    All,
}

impl std::fmt::Display for AnnotationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnnotationMode::Index => write!(f, "index"),
            AnnotationMode::Name => write!(f, "name"),
        }
    }
}
