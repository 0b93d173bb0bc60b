//! Clipset - a Rust CLI tool for building small audiovisual datasets
//!
//! This library turns a CSV manifest of YouTube video IDs with time spans and
//! multi-label tags into a local dataset: trimmed clips, normalized mono audio
//! tracks, resized frame sequences, and CSV annotation files.

pub mod annotate;
pub mod cli;
pub mod config;
pub mod manifest;
pub mod pipeline;
pub mod source;
pub mod transcode;
pub mod utils;

pub use annotate::AnnotationWriter;
pub use cli::{AnnotationMode, Cli, Commands, EmissionPolicy};
pub use config::Config;
pub use manifest::{ManifestReader, WorkItem};
pub use pipeline::{HarvestPipeline, RunSummary};
pub use source::MediaSource;
pub use transcode::Transcoder;

/// Result type used throughout the library. Defaults to `anyhow::Error`;
/// stage operations substitute [`StageError`].
pub type Result<T, E = anyhow::Error> = std::result::Result<T, E>;

/// Per-item stage failures. Every stage catches its own failures and maps
/// them into this taxonomy; the orchestrating loop never aborts the run
/// because a single item failed.
#[derive(thiserror::Error, Debug)]
pub enum StageError {
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("transcode failed: {0}")]
    Transcode(String),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}
