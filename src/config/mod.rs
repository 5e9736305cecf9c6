use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_AD_MARKER: &str = "Annonce • ";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub presenter: PresenterConfig,
    #[serde(default)]
    pub volume: VolumeConfig,
    #[serde(default)]
    pub advertisement: AdvertisementConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    pub path: PathBuf,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/tmp/current_track.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub poll_interval_secs: u64,
    pub read_timeout_ms: u64,
    /// Re-publish on every tick while the player reports `Playing`.
    pub republish_while_playing: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 2,
            read_timeout_ms: 5000,
            republish_while_playing: true,
        }
    }
}

impl CollectorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenterConfig {
    pub poll_interval_secs: u64,
    /// Pause after warning that the snapshot file is missing at startup.
    pub startup_grace_secs: u64,
    pub clear_screen: bool,
}

impl Default for PresenterConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 2,
            startup_grace_secs: 3,
            clear_screen: false,
        }
    }
}

impl PresenterConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn startup_grace(&self) -> Duration {
        Duration::from_secs(self.startup_grace_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeConfig {
    pub enabled: bool,
    pub program: String,
    pub sink: String,
    pub restore_on_exit: bool,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "pactl".to_string(),
            sink: "@DEFAULT_SINK@".to_string(),
            restore_on_exit: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvertisementConfig {
    /// Substring of the artist field that marks an advertisement slot.
    pub marker: String,
    /// Title shown instead of the advertised one.
    pub placeholder: String,
}

impl Default for AdvertisementConfig {
    fn default() -> Self {
        Self {
            marker: DEFAULT_AD_MARKER.to_string(),
            placeholder: "ADVERTISEMENT".to_string(),
        }
    }
}

impl Config {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("btsink")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
            let config: Config =
                toml::from_str(&content).with_context(|| "Failed to parse config file")?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.snapshot_path(), Path::new("/tmp/current_track.json"));
        assert_eq!(config.collector.poll_interval(), Duration::from_secs(2));
        assert!(config.collector.republish_while_playing);
        assert_eq!(config.advertisement.marker, DEFAULT_AD_MARKER);
        assert_eq!(config.volume.program, "pactl");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[collector]
republish_while_playing = false

[advertisement]
marker = "Annonce "
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(!config.collector.republish_while_playing);
        assert_eq!(config.collector.read_timeout_ms, 5000);
        assert_eq!(config.advertisement.marker, "Annonce ");
        assert_eq!(config.advertisement.placeholder, "ADVERTISEMENT");
        assert_eq!(config.presenter.startup_grace_secs, 3);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[collector\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
