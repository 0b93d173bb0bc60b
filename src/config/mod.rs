use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Output directory layout
    pub storage: StorageConfig,

    /// Transcoding parameters
    pub media: MediaConfig,

    /// Run behavior
    pub run: RunConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory the dataset is written under
    pub base_dir: PathBuf,
}

impl StorageConfig {
    pub fn clips_dir(&self) -> PathBuf {
        self.base_dir.join("clips")
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.base_dir.join("audio_files")
    }

    pub fn frames_dir(&self) -> PathBuf {
        self.base_dir.join("rgb_frames")
    }

    pub fn train_file(&self) -> PathBuf {
        self.base_dir.join("train.csv")
    }

    pub fn test_file(&self) -> PathBuf {
        self.base_dir.join("test.csv")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Frames sampled per second of clip video
    pub frame_rate: u32,

    /// Output frame width in pixels
    pub frame_width: u32,

    /// Output frame height in pixels
    pub frame_height: u32,

    /// Audio sample rate in Hz
    pub audio_sample_rate: u32,

    /// Audio channel count
    pub audio_channels: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Process at most this many manifest rows
    pub max_items: Option<usize>,

    /// Per-item download timeout in seconds
    pub fetch_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                base_dir: PathBuf::from("./data"),
            },
            media: MediaConfig {
                frame_rate: 25,
                frame_width: 224,
                frame_height: 224,
                audio_sample_rate: 16000,
                audio_channels: 1,
            },
            run: RunConfig {
                max_items: None,
                fetch_timeout_secs: 300,
            },
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;

            let config: Config = serde_yaml::from_str(&content)
                .context("Failed to parse config file")?;

            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(&config_path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// The path the configuration is read from and written to
    pub fn path() -> Result<PathBuf> {
        Self::config_path()
    }

    /// Get configuration file path
    fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("clipset").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.media.frame_rate == 0 {
            anyhow::bail!("frame_rate must be positive");
        }

        if self.media.frame_width == 0 || self.media.frame_height == 0 {
            anyhow::bail!("frame dimensions must be positive");
        }

        if self.media.audio_sample_rate == 0 {
            anyhow::bail!("audio_sample_rate must be positive");
        }

        if self.media.audio_channels == 0 {
            anyhow::bail!("audio_channels must be positive");
        }

        if self.run.fetch_timeout_secs == 0 {
            anyhow::bail!("fetch_timeout_secs must be positive");
        }

        Ok(())
    }

    /// Apply `run` subcommand overrides on top of the loaded configuration
    pub fn apply_run_overrides(
        &mut self,
        max_items: Option<usize>,
        base_dir: Option<PathBuf>,
        timeout: Option<u64>,
    ) {
        if max_items.is_some() {
            self.run.max_items = max_items;
        }

        if let Some(dir) = base_dir {
            self.storage.base_dir = dir;
        }

        if let Some(secs) = timeout {
            self.run.fetch_timeout_secs = secs;
        }
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Base Directory: {}", self.storage.base_dir.display());
        println!(
            "  Frames: {} fps at {}x{}",
            self.media.frame_rate, self.media.frame_width, self.media.frame_height
        );
        println!(
            "  Audio: {} Hz, {} channel(s)",
            self.media.audio_sample_rate, self.media.audio_channels
        );
        match self.run.max_items {
            Some(max) => println!("  Max Items: {}", max),
            None => println!("  Max Items: unlimited"),
        }
        println!("  Fetch Timeout: {}s", self.run.fetch_timeout_secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_parameters() {
        let config = Config::default();
        assert_eq!(config.media.frame_rate, 25);
        assert_eq!(config.media.frame_width, 224);
        assert_eq!(config.media.frame_height, 224);
        assert_eq!(config.media.audio_sample_rate, 16000);
        assert_eq!(config.media.audio_channels, 1);
        assert!(config.run.max_items.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_media_parameters() {
        let mut config = Config::default();
        config.media.frame_rate = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.media.audio_channels = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn overrides_replace_only_provided_fields() {
        let mut config = Config::default();
        config.apply_run_overrides(Some(5), None, Some(60));
        assert_eq!(config.run.max_items, Some(5));
        assert_eq!(config.run.fetch_timeout_secs, 60);
        assert_eq!(config.storage.base_dir, PathBuf::from("./data"));

        config.apply_run_overrides(None, Some(PathBuf::from("/tmp/out")), None);
        assert_eq!(config.run.max_items, Some(5));
        assert_eq!(config.storage.base_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn storage_paths_hang_off_base_dir() {
        let storage = StorageConfig {
            base_dir: PathBuf::from("/data"),
        };
        assert_eq!(storage.clips_dir(), PathBuf::from("/data/clips"));
        assert_eq!(storage.audio_dir(), PathBuf::from("/data/audio_files"));
        assert_eq!(storage.frames_dir(), PathBuf::from("/data/rgb_frames"));
        assert_eq!(storage.train_file(), PathBuf::from("/data/train.csv"));
        assert_eq!(storage.test_file(), PathBuf::from("/data/test.csv"));
    }

    #[test]
    fn yaml_round_trip_preserves_settings() {
        let mut config = Config::default();
        config.run.max_items = Some(12);
        config.media.frame_rate = 10;

        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.run.max_items, Some(12));
        assert_eq!(parsed.media.frame_rate, 10);
    }
}
