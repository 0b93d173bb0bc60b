use async_trait::async_trait;
use std::path::Path;

use crate::config::MediaConfig;
use crate::StageError;

pub mod ffmpeg;

pub use ffmpeg::FfmpegTranscoder;

/// Audio normalization parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSpec {
    pub sample_rate: u32,
    pub channels: u32,
}

/// Frame sampling parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSpec {
    pub rate: u32,
    pub width: u32,
    pub height: u32,
}

impl MediaConfig {
    pub fn audio_spec(&self) -> AudioSpec {
        AudioSpec {
            sample_rate: self.audio_sample_rate,
            channels: self.audio_channels,
        }
    }

    pub fn frame_spec(&self) -> FrameSpec {
        FrameSpec {
            rate: self.frame_rate,
            width: self.frame_width,
            height: self.frame_height,
        }
    }
}

/// Trait for the external transcoding collaborator.
///
/// All three operations overwrite existing output, so re-running an item is
/// idempotent at the file level.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Cut `[start, start + duration)` out of `input` into `output`.
    async fn trim(
        &self,
        input: &Path,
        output: &Path,
        start_secs: f64,
        duration_secs: f64,
    ) -> Result<(), StageError>;

    /// Write the audio channel of `input` to `output`, resampled per `spec`.
    async fn extract_audio(
        &self,
        input: &Path,
        output: &Path,
        spec: &AudioSpec,
    ) -> Result<(), StageError>;

    /// Sample the video stream of `input` into numbered stills under
    /// `output_dir`, resized per `spec`.
    async fn extract_frames(
        &self,
        input: &Path,
        output_dir: &Path,
        spec: &FrameSpec,
    ) -> Result<(), StageError>;
}
