//! Pipeline orchestration.
//!
//! One pass over the manifest, leaves first: acquire, extract audio, extract
//! frames, then annotate the retained items. Strictly sequential; item N+1
//! does not start until item N has completed or failed every stage.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::annotate::AnnotationWriter;
use crate::config::Config;
use crate::manifest::{ManifestReader, WorkItem};
use crate::source::{MediaSource, YtDlpSource};
use crate::transcode::{FfmpegTranscoder, Transcoder};
use crate::utils::format_duration;
use crate::StageError;

pub mod acquire;
pub mod derive;

pub use acquire::ClipAcquirer;
pub use derive::DerivativeExtractor;

/// Per-run outcome counts, logged and displayed when the run finishes.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Manifest items the pipeline attempted
    pub attempted: usize,

    /// Items whose clip was fetched and trimmed
    pub acquired: usize,

    /// Items with a usable audio track
    pub audio_ok: usize,

    /// Items with a usable frame sequence
    pub frames_ok: usize,

    /// Annotation records written
    pub annotated: usize,

    /// Wall-clock duration of the run in seconds
    pub elapsed_secs: f64,

    /// Timestamp when the run completed
    pub completed_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn display(&self) {
        println!("Run Summary:");
        println!("  Attempted: {}", self.attempted);
        println!("  Acquired:  {}", self.acquired);
        println!("  Audio OK:  {}", self.audio_ok);
        println!("  Frames OK: {}", self.frames_ok);
        println!("  Annotated: {}", self.annotated);
        println!("  Elapsed:   {}", format_duration(self.elapsed_secs));
    }
}

/// Main dataset preparation pipeline
pub struct HarvestPipeline {
    config: Config,
    acquirer: ClipAcquirer,
    extractor: DerivativeExtractor,
    show_progress: bool,
}

impl HarvestPipeline {
    /// Create a pipeline backed by yt-dlp and ffmpeg
    pub fn new(config: Config, show_progress: bool) -> Result<Self> {
        Self::with_collaborators(
            config,
            Arc::new(YtDlpSource::new()),
            Arc::new(FfmpegTranscoder::new()),
            show_progress,
        )
    }

    /// Create a pipeline with explicit collaborators. The seam the tests use.
    pub fn with_collaborators(
        config: Config,
        source: Arc<dyn MediaSource>,
        transcoder: Arc<dyn Transcoder>,
        show_progress: bool,
    ) -> Result<Self> {
        let storage = &config.storage;
        for dir in [storage.clips_dir(), storage.audio_dir(), storage.frames_dir()] {
            fs_err::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let acquirer = ClipAcquirer::new(
            source,
            Arc::clone(&transcoder),
            storage.clips_dir(),
            Duration::from_secs(config.run.fetch_timeout_secs),
        )?;

        let extractor = DerivativeExtractor::new(
            transcoder,
            storage.audio_dir(),
            storage.frames_dir(),
            config.media.audio_spec(),
            config.media.frame_spec(),
        );

        Ok(Self {
            config,
            acquirer,
            extractor,
            show_progress,
        })
    }

    /// Run the pipeline over `manifest_path` and write annotations through
    /// `writer`. A single item's failure never aborts the run.
    pub async fn run(&self, manifest_path: &Path, writer: &AnnotationWriter) -> Result<RunSummary> {
        let started = std::time::Instant::now();

        let items: Vec<WorkItem> =
            ManifestReader::from_path(manifest_path, self.config.run.max_items)?.collect();

        tracing::info!("Processing {} manifest item(s)", items.len());

        let progress = if self.show_progress {
            ProgressBar::new(items.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap(),
        );

        let mut acquired_ids: Vec<String> = Vec::new();
        let mut audio_ok = 0;
        let mut frames_ok = 0;

        for (index, item) in items.iter().enumerate() {
            progress.set_message(item.source_id.clone());
            tracing::info!(
                "Processing {} ({}/{}, {} window)",
                item.source_id,
                index + 1,
                items.len(),
                format_duration(item.duration_secs())
            );

            let clip_path = match self.acquirer.acquire(item).await {
                Ok(path) => path,
                Err(StageError::SourceUnavailable(id)) => {
                    tracing::warn!("Source {} unavailable, skipping", id);
                    progress.inc(1);
                    continue;
                }
                Err(err) => {
                    tracing::error!("Failed to acquire {}: {}", item.source_id, err);
                    progress.inc(1);
                    continue;
                }
            };

            acquired_ids.push(item.source_id.clone());

            // Audio and frames are independent derivatives; neither failure
            // blocks the other or the item's annotation
            if self
                .extractor
                .extract_audio(&clip_path, &item.source_id)
                .await
                .is_some()
            {
                audio_ok += 1;
            }

            if self
                .extractor
                .extract_frames(&clip_path, &item.source_id)
                .await
                .is_some()
            {
                frames_ok += 1;
            }

            progress.inc(1);
        }

        progress.finish_with_message("done");

        // Annotation waits for every acquisition attempt to resolve
        let acquired_set: HashSet<String> = acquired_ids.iter().cloned().collect();
        let annotated = writer.write(&items, &acquired_set, &self.config.storage)?;

        let summary = RunSummary {
            attempted: items.len(),
            acquired: acquired_ids.len(),
            audio_ok,
            frames_ok,
            annotated,
            elapsed_secs: started.elapsed().as_secs_f64(),
            completed_at: Utc::now(),
        };

        tracing::info!(
            "Run complete: {}/{} acquired, {} audio, {} frames, {} annotated",
            summary.acquired,
            summary.attempted,
            summary.audio_ok,
            summary.frames_ok,
            summary.annotated
        );

        Ok(summary)
    }
}
