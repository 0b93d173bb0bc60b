use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use url::Url;

use super::MediaSource;
use crate::{Result, StageError};

/// stderr markers yt-dlp emits when the host refuses to serve an item
const UNAVAILABLE_MARKERS: &[&str] = &[
    "Video unavailable",
    "Private video",
    "This video has been removed",
    "not available in your country",
    "account associated with this video has been terminated",
];

/// YouTube retrieval using yt-dlp
pub struct YtDlpSource {
    yt_dlp_path: String,
}

impl YtDlpSource {
    pub fn new() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
        }
    }

    /// Check if yt-dlp is available
    pub async fn check_availability(&self) -> Result<bool> {
        let output = Command::new(&self.yt_dlp_path)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        Ok(output.map(|out| out.status.success()).unwrap_or(false))
    }

    /// Build the watch URL for a video id. Ids are query-encoded rather than
    /// interpolated so leading dashes and unusual characters survive intact.
    pub fn watch_url(source_id: &str) -> Result<Url> {
        Url::parse_with_params("https://www.youtube.com/watch", &[("v", source_id)])
            .map_err(|err| anyhow::anyhow!("Failed to build watch URL for {}: {}", source_id, err))
    }
}

#[async_trait]
impl MediaSource for YtDlpSource {
    async fn fetch(&self, source_id: &str, dest: &Path) -> Result<(), StageError> {
        let url = Self::watch_url(source_id)?;

        tracing::debug!("Fetching {} with yt-dlp", url);

        let output = Command::new(&self.yt_dlp_path)
            .args([
                "--output",
                &dest.to_string_lossy(),
                "--format",
                "best",
                "--no-playlist",
                "--no-progress",
                url.as_str(),
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|err| anyhow::anyhow!("Failed to run yt-dlp: {}", err))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);

            if UNAVAILABLE_MARKERS.iter().any(|marker| stderr.contains(marker)) {
                return Err(StageError::SourceUnavailable(source_id.to_string()));
            }

            return Err(StageError::Unexpected(anyhow::anyhow!(
                "yt-dlp failed for {}: {}",
                source_id,
                stderr.trim()
            )));
        }

        if !dest.exists() {
            return Err(StageError::Unexpected(anyhow::anyhow!(
                "yt-dlp reported success but {} was not written",
                dest.display()
            )));
        }

        Ok(())
    }

    fn platform_name(&self) -> &'static str {
        "YouTube"
    }
}

impl Default for YtDlpSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_url_encodes_leading_dash_ids() {
        let url = YtDlpSource::watch_url("--PJHxphWEs").unwrap();
        assert_eq!(url.as_str(), "https://www.youtube.com/watch?v=--PJHxphWEs");
    }

    #[test]
    fn watch_url_escapes_reserved_characters() {
        let url = YtDlpSource::watch_url("a&b=c").unwrap();
        assert_eq!(url.as_str(), "https://www.youtube.com/watch?v=a%26b%3Dc");
    }
}
