use std::time::Duration;
use thiserror::Error;

#[cfg(target_os = "linux")]
pub mod bluez;

#[derive(Debug, Error)]
pub enum SourceError {
    #[cfg(target_os = "linux")]
    #[error("D-Bus error: {0}")]
    DBus(#[from] zbus::Error),

    #[error("player did not answer within {0:?}")]
    Timeout(Duration),

    #[error("unexpected reply: {0}")]
    InvalidReply(String),
}

/// Object path of a remote media player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerHandle {
    path: String,
}

impl PlayerHandle {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration_ms: Option<u32>,
}

/// One read of the player's properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerReading {
    /// Raw status string as reported by the player, e.g. `playing`.
    pub status: String,
    /// `None` when the player reports no track at all.
    pub track: Option<TrackMetadata>,
}

/// A place media players can be found and read from.
pub trait PlayerSource {
    /// First player found wins; with several devices attached the choice is arbitrary.
    async fn discover_player(&self) -> Result<Option<PlayerHandle>, SourceError>;

    async fn read_player(&self, handle: &PlayerHandle) -> Result<PlayerReading, SourceError>;
}
