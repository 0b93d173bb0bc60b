use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use super::{AudioSpec, FrameSpec, Transcoder};
use crate::{Result, StageError};

/// Transcoding via the ffmpeg binary
pub struct FfmpegTranscoder {
    ffmpeg_path: String,
}

impl FfmpegTranscoder {
    pub fn new() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
        }
    }

    /// Check if ffmpeg is available
    pub async fn check_availability(&self) -> Result<bool> {
        let output = Command::new(&self.ffmpeg_path)
            .arg("-version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        Ok(output.map(|out| out.status.success()).unwrap_or(false))
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.args(["-hide_banner", "-loglevel", "error"]);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd
    }

    async fn run(mut cmd: Command, what: &str) -> Result<(), StageError> {
        let output = cmd
            .output()
            .await
            .map_err(|err| anyhow::anyhow!("Failed to run ffmpeg: {}", err))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StageError::Transcode(format!(
                "{}: {}",
                what,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn trim(
        &self,
        input: &Path,
        output: &Path,
        start_secs: f64,
        duration_secs: f64,
    ) -> Result<(), StageError> {
        tracing::debug!(
            "Trimming {} to {}s starting at {}s",
            input.display(),
            duration_secs,
            start_secs
        );

        let mut cmd = self.command();
        // Input-side seeking keeps the cut fast on long source videos
        cmd.arg("-ss")
            .arg(start_secs.to_string())
            .arg("-t")
            .arg(duration_secs.to_string())
            .arg("-i")
            .arg(input)
            .arg("-y")
            .arg(output);

        Self::run(cmd, "trim").await
    }

    async fn extract_audio(
        &self,
        input: &Path,
        output: &Path,
        spec: &AudioSpec,
    ) -> Result<(), StageError> {
        tracing::debug!(
            "Extracting audio from {} at {} Hz",
            input.display(),
            spec.sample_rate
        );

        let mut cmd = self.command();
        cmd.arg("-i")
            .arg(input)
            .arg("-vn")
            .arg("-ar")
            .arg(spec.sample_rate.to_string())
            .arg("-ac")
            .arg(spec.channels.to_string())
            .arg("-y")
            .arg(output);

        Self::run(cmd, "audio extraction").await
    }

    async fn extract_frames(
        &self,
        input: &Path,
        output_dir: &Path,
        spec: &FrameSpec,
    ) -> Result<(), StageError> {
        tracing::debug!(
            "Extracting frames from {} at {} fps",
            input.display(),
            spec.rate
        );

        let mut cmd = self.command();
        cmd.arg("-i")
            .arg(input)
            .arg("-vf")
            .arg(format!(
                "fps={},scale={}:{}",
                spec.rate, spec.width, spec.height
            ))
            .arg("-y")
            .arg(output_dir.join("%04d.jpg"));

        Self::run(cmd, "frame extraction").await
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new()
    }
}
