use anyhow::Result;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::Config;
use crate::presenter::{Presenter, render};
use crate::snapshot::SnapshotStore;
use crate::volume::VolumePolicy;

pub struct App {
    pub config: Config,
}

impl App {
    pub fn new(config_path: Option<&Path>, snapshot: Option<PathBuf>) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        if let Some(path) = snapshot {
            config.snapshot.path = path;
        }
        Ok(Self { config })
    }

    fn store(&self) -> SnapshotStore {
        SnapshotStore::new(self.config.snapshot_path())
    }

    fn volume_policy(&self) -> VolumePolicy {
        VolumePolicy::from_config(&self.config.volume, &self.config.advertisement.marker)
    }

    #[cfg(target_os = "linux")]
    pub async fn collect(&self) -> Result<()> {
        use anyhow::Context;

        use crate::collector::Collector;
        use crate::source::bluez::BluezSource;

        info!("Connecting to the D-Bus system bus");
        let source = BluezSource::connect()
            .await
            .with_context(|| "Failed to connect to the D-Bus system bus")?;

        let mut collector = Collector::new(
            source,
            self.store(),
            self.volume_policy(),
            self.config.collector.clone(),
        )
        .restore_volume_on_exit(self.config.volume.restore_on_exit);

        collector.run(shutdown_signal()).await;
        Ok(())
    }

    #[cfg(not(target_os = "linux"))]
    pub async fn collect(&self) -> Result<()> {
        anyhow::bail!("The collector reads BlueZ over D-Bus and is only available on Linux")
    }

    pub async fn present(&self) -> Result<()> {
        let store = self.store();
        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        if !store.exists() {
            print!("{}", missing_data_warning(store.path()));
            let grace = self.config.presenter.startup_grace();
            if sleep_or_shutdown(grace, shutdown.as_mut()).await {
                println!("\nDisplay stopped.");
                return Ok(());
            }
        }

        println!("Starting display...");

        let mut presenter = Presenter::new(
            store,
            self.volume_policy(),
            self.config.advertisement.clone(),
            io::stdout(),
        )
        .clear_screen(self.config.presenter.clear_screen);

        presenter
            .run(self.config.presenter.poll_interval(), shutdown.as_mut())
            .await;

        if self.config.volume.restore_on_exit {
            self.volume_policy().restore();
        }

        println!("\nDisplay stopped.");
        Ok(())
    }

    pub fn status(&self) -> Result<()> {
        let snapshot = self.store().load();
        print!("{}", render(&snapshot, &self.config.advertisement));
        Ok(())
    }
}

fn missing_data_warning(path: &Path) -> String {
    format!(
        "WARNING: the data file {} does not exist.\n\
         Make sure the collector (btsink collect) is running.\n",
        path.display()
    )
}

/// Waits for `duration`. Returns true if `shutdown` resolved first.
async fn sleep_or_shutdown(duration: Duration, shutdown: impl Future<Output = ()>) -> bool {
    tokio::select! {
        _ = shutdown => true,
        _ = tokio::time::sleep(duration) => false,
    }
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                warn!("Cannot listen for SIGTERM: {e}");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("Shutdown requested");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_data_warning_names_file_and_collector() {
        let warning = missing_data_warning(Path::new("/tmp/btsink-test/current_track.json"));
        assert_eq!(
            warning,
            "WARNING: the data file /tmp/btsink-test/current_track.json does not exist.\n\
             Make sure the collector (btsink collect) is running.\n"
        );
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_startup_grace() {
        let interrupted =
            sleep_or_shutdown(Duration::from_secs(60), std::future::ready(())).await;
        assert!(interrupted);

        let interrupted = sleep_or_shutdown(
            Duration::from_millis(10),
            tokio::time::sleep(Duration::from_secs(60)),
        )
        .await;
        assert!(!interrupted);
    }
}
