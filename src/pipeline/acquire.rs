use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::timeout;

use crate::manifest::WorkItem;
use crate::source::MediaSource;
use crate::transcode::Transcoder;
use crate::utils::{format_file_size, sanitize_filename};
use crate::{Result, StageError};

/// Resolves a source id to a trimmed local clip.
///
/// The full-length retrieval is staged in a temporary directory and deleted
/// as soon as the trim finishes, whatever its outcome, so disk usage stays
/// bounded by one raw download at a time.
pub struct ClipAcquirer {
    source: Arc<dyn MediaSource>,
    transcoder: Arc<dyn Transcoder>,
    staging: TempDir,
    clips_dir: PathBuf,
    fetch_timeout: Duration,
}

impl ClipAcquirer {
    pub fn new(
        source: Arc<dyn MediaSource>,
        transcoder: Arc<dyn Transcoder>,
        clips_dir: PathBuf,
        fetch_timeout: Duration,
    ) -> Result<Self> {
        let staging = TempDir::new()?;

        Ok(Self {
            source,
            transcoder,
            staging,
            clips_dir,
            fetch_timeout,
        })
    }

    /// Fetch and trim one item. On any failure the item is skipped for this
    /// run; no retries, and no clip file is left behind for the source id.
    pub async fn acquire(&self, item: &WorkItem) -> Result<PathBuf, StageError> {
        let file_name = format!("{}.mp4", sanitize_filename(&item.source_id));
        let raw_path = self.staging.path().join(&file_name);

        let fetch = self.source.fetch(&item.source_id, &raw_path);
        match timeout(self.fetch_timeout, fetch).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                self.discard(&raw_path);
                return Err(err);
            }
            Err(_) => {
                self.discard(&raw_path);
                return Err(StageError::Unexpected(anyhow::anyhow!(
                    "fetch of {} timed out after {}s",
                    item.source_id,
                    self.fetch_timeout.as_secs()
                )));
            }
        }

        let clip_path = self.clips_dir.join(&file_name);
        let trimmed = self
            .transcoder
            .trim(&raw_path, &clip_path, item.start_secs, item.duration_secs())
            .await;

        // The raw download is no longer needed once the trim has run
        self.discard(&raw_path);

        match trimmed {
            Ok(()) => {
                if let Ok(metadata) = fs_err::metadata(&clip_path) {
                    tracing::info!(
                        "Acquired clip for {} ({})",
                        item.source_id,
                        format_file_size(metadata.len())
                    );
                }
                Ok(clip_path)
            }
            Err(err) => {
                self.discard(&clip_path);
                Err(err)
            }
        }
    }

    fn discard(&self, path: &std::path::Path) {
        if path.exists() {
            if let Err(err) = fs_err::remove_file(path) {
                tracing::warn!("Could not remove {}: {}", path.display(), err);
            }
        }
    }
}
