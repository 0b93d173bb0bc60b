use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::transcode::{AudioSpec, FrameSpec, Transcoder};
use crate::utils::sanitize_filename;

/// Produces the audio track and frame sequence for an acquired clip.
///
/// The two extractions are independent: failure of one never blocks the
/// other, and neither gates annotation emission.
pub struct DerivativeExtractor {
    transcoder: Arc<dyn Transcoder>,
    audio_dir: PathBuf,
    frames_dir: PathBuf,
    audio_spec: AudioSpec,
    frame_spec: FrameSpec,
}

impl DerivativeExtractor {
    pub fn new(
        transcoder: Arc<dyn Transcoder>,
        audio_dir: PathBuf,
        frames_dir: PathBuf,
        audio_spec: AudioSpec,
        frame_spec: FrameSpec,
    ) -> Self {
        Self {
            transcoder,
            audio_dir,
            frames_dir,
            audio_spec,
            frame_spec,
        }
    }

    /// Write the normalized audio track to `audio_dir/{id}.wav`. Returns
    /// `None` on failure after logging; the run continues.
    pub async fn extract_audio(&self, clip_path: &Path, source_id: &str) -> Option<PathBuf> {
        let output = self
            .audio_dir
            .join(format!("{}.wav", sanitize_filename(source_id)));

        match self
            .transcoder
            .extract_audio(clip_path, &output, &self.audio_spec)
            .await
        {
            Ok(()) => Some(output),
            Err(err) => {
                tracing::error!("Audio extraction failed for {}: {}", source_id, err);
                None
            }
        }
    }

    /// Sample resized stills into `frames_dir/{id}/`. Returns `None` on
    /// failure after logging; the run continues.
    pub async fn extract_frames(&self, clip_path: &Path, source_id: &str) -> Option<PathBuf> {
        let frame_dir = self.frames_dir.join(sanitize_filename(source_id));

        // A re-run must fully repopulate the directory, not append to it
        if frame_dir.exists() {
            if let Err(err) = fs_err::remove_dir_all(&frame_dir) {
                tracing::error!("Could not clear stale frames for {}: {}", source_id, err);
                return None;
            }
        }

        if let Err(err) = fs_err::create_dir_all(&frame_dir) {
            tracing::error!("Could not create frame directory for {}: {}", source_id, err);
            return None;
        }

        match self
            .transcoder
            .extract_frames(clip_path, &frame_dir, &self.frame_spec)
            .await
        {
            Ok(()) => Some(frame_dir),
            Err(err) => {
                tracing::error!("Frame extraction failed for {}: {}", source_id, err);
                None
            }
        }
    }
}
