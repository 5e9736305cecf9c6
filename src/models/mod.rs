use serde::{Deserialize, Deserializer, Serialize};

pub const UNKNOWN_TITLE: &str = "Unknown title";
pub const UNKNOWN_ARTIST: &str = "Unknown artist";
pub const UNKNOWN_ALBUM: &str = "Unknown album";

/// Placeholder the collector writes for fields the player did not report.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum PlaybackStatus {
    Starting,
    Disconnected,
    Playing,
    Paused,
    Stopped,
    Error,
    /// Serialized as `N/A`; also absorbs any unrecognised status string.
    #[default]
    Unknown,
}

impl PlaybackStatus {
    /// Maps a BlueZ `MediaPlayer1.Status` value.
    pub fn from_player(status: &str) -> Self {
        match status.to_lowercase().as_str() {
            "playing" | "forward-seek" | "reverse-seek" => PlaybackStatus::Playing,
            "paused" => PlaybackStatus::Paused,
            "stopped" => PlaybackStatus::Stopped,
            "error" => PlaybackStatus::Error,
            _ => PlaybackStatus::Unknown,
        }
    }

    /// States rendered as a single message line instead of track fields.
    pub fn is_message(&self) -> bool {
        matches!(
            self,
            PlaybackStatus::Starting | PlaybackStatus::Disconnected | PlaybackStatus::Error
        )
    }
}

impl std::fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackStatus::Starting => write!(f, "Starting"),
            PlaybackStatus::Disconnected => write!(f, "Disconnected"),
            PlaybackStatus::Playing => write!(f, "Playing"),
            PlaybackStatus::Paused => write!(f, "Paused"),
            PlaybackStatus::Stopped => write!(f, "Stopped"),
            PlaybackStatus::Error => write!(f, "Error"),
            PlaybackStatus::Unknown => write!(f, "N/A"),
        }
    }
}

impl From<String> for PlaybackStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Starting" => PlaybackStatus::Starting,
            "Disconnected" => PlaybackStatus::Disconnected,
            "Playing" => PlaybackStatus::Playing,
            "Paused" => PlaybackStatus::Paused,
            "Stopped" => PlaybackStatus::Stopped,
            "Error" => PlaybackStatus::Error,
            _ => PlaybackStatus::Unknown,
        }
    }
}

impl From<PlaybackStatus> for String {
    fn from(status: PlaybackStatus) -> Self {
        status.to_string()
    }
}

/// The record shared between the collector and the presenter.
///
/// Fields are declared in alphabetical order so the JSON encoding has sorted
/// keys and two equal snapshots always serialize to the same bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSnapshot {
    #[serde(default = "unknown_album")]
    pub album: String,
    #[serde(default = "unknown_artist")]
    pub artist: String,
    /// Whole seconds; 0 when unknown. Any non-negative JSON number is
    /// accepted on read and floored.
    #[serde(default, deserialize_with = "whole_seconds")]
    pub duration: u64,
    #[serde(default)]
    pub status: PlaybackStatus,
    #[serde(default = "unknown_title")]
    pub title: String,
}

fn whole_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let seconds = f64::deserialize(deserializer)?;
    if seconds.is_finite() && seconds > 0.0 {
        Ok(seconds.floor() as u64)
    } else {
        Ok(0)
    }
}

fn unknown_album() -> String {
    UNKNOWN_ALBUM.to_string()
}

fn unknown_artist() -> String {
    UNKNOWN_ARTIST.to_string()
}

fn unknown_title() -> String {
    UNKNOWN_TITLE.to_string()
}

impl TrackSnapshot {
    pub fn new(
        status: PlaybackStatus,
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
        duration: u64,
    ) -> Self {
        Self {
            album: album.into(),
            artist: artist.into(),
            duration,
            status,
            title: title.into(),
        }
    }

    /// A status-only snapshot whose title carries the message to display.
    pub fn message(status: PlaybackStatus, message: impl Into<String>) -> Self {
        Self::new(status, message, NOT_AVAILABLE, NOT_AVAILABLE, 0)
    }

    pub fn starting() -> Self {
        Self::message(PlaybackStatus::Starting, "No data file yet.")
    }

    pub fn disconnected() -> Self {
        Self::message(
            PlaybackStatus::Disconnected,
            "Device disconnected or player unavailable.",
        )
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::message(PlaybackStatus::Error, message)
    }

    pub fn format_duration(&self) -> Option<String> {
        if self.duration == 0 {
            return None;
        }
        let minutes = self.duration / 60;
        let seconds = self.duration % 60;
        Some(format!("{minutes:02}m {seconds:02}s"))
    }
}
