use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{Clear, ClearType},
};
use std::future::Future;
use std::io::{self, Write};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::AdvertisementConfig;
use crate::models::TrackSnapshot;
use crate::snapshot::{self, SnapshotStore};
use crate::volume::VolumePolicy;

mod layout;
pub use layout::render;

/// Renders the shared snapshot whenever its content changes.
pub struct Presenter<W: Write> {
    store: SnapshotStore,
    volume: VolumePolicy,
    ads: AdvertisementConfig,
    clear_screen: bool,
    out: W,
    last_encoded: Option<String>,
}

impl<W: Write> Presenter<W> {
    pub fn new(
        store: SnapshotStore,
        volume: VolumePolicy,
        ads: AdvertisementConfig,
        out: W,
    ) -> Self {
        Self {
            store,
            volume,
            ads,
            clear_screen: false,
            out,
            last_encoded: None,
        }
    }

    pub fn clear_screen(mut self, clear: bool) -> Self {
        self.clear_screen = clear;
        self
    }

    pub fn load_snapshot(&self) -> TrackSnapshot {
        self.store.load()
    }

    /// Applies the volume policy and writes the display block.
    pub fn render(&mut self, snapshot: &TrackSnapshot) -> io::Result<()> {
        self.volume.apply(&snapshot.artist);

        if self.clear_screen {
            execute!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        }
        self.out
            .write_all(render(snapshot, &self.ads).as_bytes())?;
        self.out.flush()
    }

    /// Loads the snapshot and renders it if it differs from the last one seen.
    /// Returns whether anything was rendered.
    pub fn poll(&mut self) -> io::Result<bool> {
        let snapshot = self.load_snapshot();
        let encoded = snapshot::encode(&snapshot).map_err(io::Error::other)?;

        if self.last_encoded.as_deref() == Some(encoded.as_str()) {
            return Ok(false);
        }

        debug!("Snapshot changed: {encoded}");
        self.render(&snapshot)?;
        self.last_encoded = Some(encoded);
        Ok(true)
    }

    /// Polls every `interval` until `shutdown` resolves.
    pub async fn run(
        &mut self,
        interval: Duration,
        shutdown: impl Future<Output = ()>,
    ) {
        tokio::pin!(shutdown);

        loop {
            if let Err(e) = self.poll() {
                warn!("Failed to update the display: {e}");
            }
            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        info!("Presenter stopped");
    }

    #[cfg(test)]
    fn into_output(self) -> W {
        self.out
    }
}
