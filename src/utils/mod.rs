/// Format file size in human-readable format
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f = bytes as f64;
    let unit_index = (bytes_f.log10() / THRESHOLD.log10()).floor() as usize;
    let unit_index = unit_index.min(UNITS.len() - 1);

    let size = bytes_f / THRESHOLD.powi(unit_index as i32);

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Sanitize a source id for safe use as a filesystem name. YouTube ids are
/// already path-safe, but the manifest is externally sourced.
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            match c {
                // Keep alphanumeric characters, hyphens, underscores, and dots
                c if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' => c,
                // Replace everything else with underscore
                _ => '_',
            }
        })
        .collect()
}

/// Check if the current environment has required tools
pub async fn check_dependencies() -> Vec<String> {
    use crate::source::YtDlpSource;
    use crate::transcode::FfmpegTranscoder;

    let mut missing = Vec::new();

    if !YtDlpSource::new()
        .check_availability()
        .await
        .unwrap_or(false)
    {
        missing.push("yt-dlp - required for clip retrieval".to_string());
    }

    if !FfmpegTranscoder::new()
        .check_availability()
        .await
        .unwrap_or(false)
    {
        missing.push("ffmpeg - required for trimming and derivative extraction".to_string());
    }

    missing
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1024), "1.0 KB");
        assert_eq!(format_file_size(20_971_520), "20.0 MB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(10.0), "10s");
        assert_eq!(format_duration(75.0), "1m 15s");
        assert_eq!(format_duration(3605.0), "1h 0m 5s");
    }

    #[test]
    fn test_sanitize_filename() {
        // YouTube ids pass through unchanged, leading dash included
        assert_eq!(sanitize_filename("--PJHxphWEs"), "--PJHxphWEs");
        assert_eq!(sanitize_filename("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_filename("spaced out"), "spaced_out");
    }
}
