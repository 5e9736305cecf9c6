use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::TrackSnapshot;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot file not found: {0}")]
    Missing(PathBuf),

    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("snapshot I/O error: {0}")]
    Io(#[from] io::Error),
}

/// The on-disk snapshot shared by the collector (writer) and presenter (reader).
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snapshot".to_string());
        self.path.with_file_name(format!(".{name}.tmp"))
    }

    /// Replaces the stored snapshot. Readers see either the old or the new
    /// record, never a partial one.
    pub fn publish(&self, snapshot: &TrackSnapshot) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = encode_pretty(snapshot)?;
        let temp_path = self.temp_path();
        let written = write_synced(&temp_path, content.as_bytes())
            .and_then(|()| fs::rename(&temp_path, &self.path));
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        Ok(())
    }

    pub fn read(&self) -> Result<TrackSnapshot, SnapshotError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SnapshotError::Missing(self.path.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }

    /// Reads the snapshot, substituting a placeholder for anything unreadable.
    pub fn load(&self) -> TrackSnapshot {
        match self.read() {
            Ok(snapshot) => snapshot,
            Err(SnapshotError::Missing(_)) => TrackSnapshot::starting(),
            Err(SnapshotError::Malformed(_)) => TrackSnapshot::error("Reading error..."),
            Err(SnapshotError::Io(e)) => TrackSnapshot::error(format!("Unknown error: {e}")),
        }
    }
}

fn write_synced(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content)?;
    file.sync_all()
}

/// Compact canonical encoding used for change detection.
pub fn encode(snapshot: &TrackSnapshot) -> Result<String, serde_json::Error> {
    serde_json::to_string(snapshot)
}

fn encode_pretty(snapshot: &TrackSnapshot) -> Result<String, serde_json::Error> {
    let mut content = serde_json::to_string_pretty(snapshot)?;
    content.push('\n');
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlaybackStatus;

    fn store() -> (tempfile::TempDir, SnapshotStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("current_track.json"));
        (dir, store)
    }

    #[test]
    fn test_publish_then_load() {
        let (_dir, store) = store();
        let snapshot = TrackSnapshot::new(
            PlaybackStatus::Playing,
            "Été indien",
            "Joe Dassin",
            "Joe Dassin",
            227,
        );

        store.publish(&snapshot).unwrap();
        assert_eq!(store.load(), snapshot);

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("Été indien"));
        assert!(raw.contains("\"status\": \"Playing\""));
    }

    #[test]
    fn test_publish_overwrites_and_leaves_no_temp_file() {
        let (dir, store) = store();
        store.publish(&TrackSnapshot::disconnected()).unwrap();
        let next = TrackSnapshot::new(PlaybackStatus::Paused, "A", "B", "C", 10);
        store.publish(&next).unwrap();

        assert_eq!(store.read().unwrap(), next);
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_failed_publish_removes_temp_file() {
        let (dir, store) = store();
        // A directory in the way makes the final rename fail.
        fs::create_dir(store.path()).unwrap();
        fs::write(store.path().join("keep"), "x").unwrap();

        assert!(matches!(
            store.publish(&TrackSnapshot::starting()),
            Err(SnapshotError::Io(_))
        ));
        assert!(!dir.path().join(".current_track.json.tmp").exists());
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_fractional_duration_loads() {
        let (_dir, store) = store();
        fs::write(
            store.path(),
            r#"{"album": "Discovery", "artist": "Daft Punk", "duration": 320.999, "status": "Playing", "title": "One More Time"}"#,
        )
        .unwrap();

        let snapshot = store.load();
        assert_eq!(snapshot.status, PlaybackStatus::Playing);
        assert_eq!(snapshot.title, "One More Time");
        assert_eq!(snapshot.duration, 320);
    }

    #[test]
    fn test_publish_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("nested/state/track.json"));
        store.publish(&TrackSnapshot::starting()).unwrap();
        assert!(store.exists());
    }

    #[test]
    fn test_missing_file_loads_starting() {
        let (_dir, store) = store();
        assert!(matches!(store.read(), Err(SnapshotError::Missing(_))));
        let snapshot = store.load();
        assert_eq!(snapshot.status, PlaybackStatus::Starting);
        assert_eq!(snapshot.title, "No data file yet.");
    }

    #[test]
    fn test_malformed_file_loads_error() {
        let (_dir, store) = store();
        fs::write(store.path(), "{\"status\": \"Play").unwrap();
        assert!(matches!(store.read(), Err(SnapshotError::Malformed(_))));
        assert_eq!(store.load().status, PlaybackStatus::Error);

        fs::write(store.path(), "").unwrap();
        assert_eq!(store.load().status, PlaybackStatus::Error);

        fs::write(store.path(), "[1, 2]").unwrap();
        assert_eq!(store.load().title, "Reading error...");
    }

    #[test]
    fn test_encode_is_stable() {
        let a = TrackSnapshot::new(PlaybackStatus::Playing, "T", "A", "B", 1);
        let b = a.clone();
        assert_eq!(encode(&a).unwrap(), encode(&b).unwrap());
        assert_eq!(
            encode(&a).unwrap(),
            r#"{"album":"B","artist":"A","duration":1,"status":"Playing","title":"T"}"#
        );
    }
}
