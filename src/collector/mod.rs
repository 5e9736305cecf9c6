use std::future::Future;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::config::CollectorConfig;
use crate::models::{NOT_AVAILABLE, PlaybackStatus, TrackSnapshot};
use crate::snapshot::{SnapshotError, SnapshotStore};
use crate::source::{PlayerHandle, PlayerReading, PlayerSource, SourceError};
use crate::volume::VolumePolicy;

/// What one poll saw on the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    NoDevice,
    Player(PlayerReading),
}

/// Polls the player, mutes advertisements and publishes snapshots.
pub struct Collector<S> {
    source: S,
    store: SnapshotStore,
    volume: VolumePolicy,
    config: CollectorConfig,
    restore_on_exit: bool,
    last: Option<TrackSnapshot>,
}

impl<S: PlayerSource> Collector<S> {
    pub fn new(
        source: S,
        store: SnapshotStore,
        volume: VolumePolicy,
        config: CollectorConfig,
    ) -> Self {
        Self {
            source,
            store,
            volume,
            config,
            restore_on_exit: false,
            last: None,
        }
    }

    pub fn restore_volume_on_exit(mut self, restore: bool) -> Self {
        self.restore_on_exit = restore;
        self
    }

    async fn with_timeout<T>(
        &self,
        fut: impl Future<Output = Result<T, SourceError>>,
    ) -> Result<T, SourceError> {
        let limit = self.config.read_timeout();
        time::timeout(limit, fut)
            .await
            .map_err(|_| SourceError::Timeout(limit))?
    }

    pub async fn discover_player(&self) -> Result<Option<PlayerHandle>, SourceError> {
        self.with_timeout(self.source.discover_player()).await
    }

    /// Reads the player behind `handle`; no handle means no device is attached.
    pub async fn poll_once(
        &self,
        handle: Option<&PlayerHandle>,
    ) -> Result<Observation, SourceError> {
        match handle {
            None => Ok(Observation::NoDevice),
            Some(h) => Ok(Observation::Player(
                self.with_timeout(self.source.read_player(h)).await?,
            )),
        }
    }

    /// Decides what, if anything, an observation changes.
    pub fn next_snapshot(&self, observation: &Observation) -> Option<TrackSnapshot> {
        let candidate = match observation {
            Observation::NoDevice => TrackSnapshot::disconnected(),
            Observation::Player(reading) => {
                let status = PlaybackStatus::from_player(&reading.status);
                match &reading.track {
                    Some(track) => TrackSnapshot::new(
                        status,
                        track.title.as_deref().unwrap_or(NOT_AVAILABLE),
                        track.artist.as_deref().unwrap_or(NOT_AVAILABLE),
                        track.album.as_deref().unwrap_or(NOT_AVAILABLE),
                        u64::from(track.duration_ms.unwrap_or(0)) / 1000,
                    ),
                    None if status == PlaybackStatus::Paused => self.paused_without_track(),
                    None => return None,
                }
            }
        };

        let republish =
            self.config.republish_while_playing && candidate.status == PlaybackStatus::Playing;
        if republish || self.last.as_ref() != Some(&candidate) {
            Some(candidate)
        } else {
            None
        }
    }

    /// A paused player with no metadata keeps showing the last known track.
    fn paused_without_track(&self) -> TrackSnapshot {
        let (title, artist) = match &self.last {
            Some(last) if !last.status.is_message() => (last.title.as_str(), last.artist.as_str()),
            _ => (NOT_AVAILABLE, NOT_AVAILABLE),
        };
        TrackSnapshot::new(PlaybackStatus::Paused, title, artist, NOT_AVAILABLE, 0)
    }

    pub fn apply_volume_policy(&self, observation: &Observation) {
        if let Observation::Player(PlayerReading {
            track: Some(track), ..
        }) = observation
        {
            self.volume
                .apply(track.artist.as_deref().unwrap_or(NOT_AVAILABLE));
        }
    }

    pub fn publish(&mut self, snapshot: TrackSnapshot) -> Result<(), SnapshotError> {
        self.store.publish(&snapshot)?;
        if self.last.as_ref() != Some(&snapshot) {
            match snapshot.status {
                PlaybackStatus::Disconnected => info!("Device disconnected or player unavailable"),
                status => info!(
                    "{status}: {} - {} ({})",
                    snapshot.artist, snapshot.title, snapshot.album
                ),
            }
        }
        self.last = Some(snapshot);
        Ok(())
    }

    /// One poll cycle. Errors are logged and end the cycle without an update.
    pub async fn tick(&mut self) {
        let handle = match self.discover_player().await {
            Ok(handle) => handle,
            Err(e) => {
                debug!("Player discovery failed: {e}");
                return;
            }
        };

        let observation = match self.poll_once(handle.as_ref()).await {
            Ok(observation) => observation,
            Err(e) => {
                debug!("Player read failed: {e}");
                return;
            }
        };

        self.apply_volume_policy(&observation);

        if let Some(snapshot) = self.next_snapshot(&observation) {
            if let Err(e) = self.publish(snapshot) {
                error!(
                    "Failed to write snapshot {}: {e}",
                    self.store.path().display()
                );
            }
        }
    }

    /// Polls until `shutdown` resolves.
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) {
        let interval = self.config.poll_interval();
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(
            "Polling media player every {}s, writing {}",
            interval.as_secs(),
            self.store.path().display()
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => self.tick().await,
            }
        }

        if self.restore_on_exit {
            self.volume.restore();
        }
        info!("Collector stopped");
    }
}
