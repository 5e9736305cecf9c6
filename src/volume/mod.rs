use std::cell::Cell;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::VolumeConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeDecision {
    Mute,
    Full,
}

impl VolumeDecision {
    pub fn percent(self) -> u8 {
        match self {
            VolumeDecision::Mute => 0,
            VolumeDecision::Full => 100,
        }
    }
}

/// True when `artist` contains `marker` verbatim. An empty marker matches nothing.
pub fn is_advertisement(artist: &str, marker: &str) -> bool {
    !marker.is_empty() && artist.contains(marker)
}

pub fn decide_volume(artist: &str, marker: &str) -> VolumeDecision {
    if is_advertisement(artist, marker) {
        VolumeDecision::Mute
    } else {
        VolumeDecision::Full
    }
}

#[derive(Debug, Error)]
pub enum VolumeError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Something that accepts an absolute volume in percent.
pub trait VolumeSink {
    fn set_volume(&self, percent: u8) -> Result<(), VolumeError>;
}

/// Runs `<program> set-sink-volume <sink> <percent>%`.
pub struct CommandSink {
    program: String,
    sink: String,
}

impl CommandSink {
    pub fn new(program: impl Into<String>, sink: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            sink: sink.into(),
        }
    }
}

impl VolumeSink for CommandSink {
    fn set_volume(&self, percent: u8) -> Result<(), VolumeError> {
        let output = Command::new(&self.program)
            .args(["set-sink-volume", &self.sink, &format!("{}%", percent.min(100))])
            .stdin(Stdio::null())
            .output()
            .map_err(|source| VolumeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(VolumeError::Failed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Used when volume control is disabled in the config.
pub struct NullSink;

impl VolumeSink for NullSink {
    fn set_volume(&self, _percent: u8) -> Result<(), VolumeError> {
        Ok(())
    }
}

/// Mutes the sink during advertisements and sets it back to full otherwise.
///
/// The reset to 100% happens on every call, whatever the user set in between.
pub struct VolumePolicy {
    marker: String,
    sink: Box<dyn VolumeSink>,
    failing: Cell<bool>,
}

impl VolumePolicy {
    pub fn new(marker: impl Into<String>, sink: Box<dyn VolumeSink>) -> Self {
        Self {
            marker: marker.into(),
            sink,
            failing: Cell::new(false),
        }
    }

    pub fn from_config(config: &VolumeConfig, marker: &str) -> Self {
        let sink: Box<dyn VolumeSink> = if config.enabled {
            Box::new(CommandSink::new(&config.program, &config.sink))
        } else {
            Box::new(NullSink)
        };
        Self::new(marker, sink)
    }

    pub fn apply(&self, artist: &str) -> VolumeDecision {
        let decision = decide_volume(artist, &self.marker);
        self.set(decision);
        decision
    }

    /// Puts the sink back to full volume, used on shutdown.
    pub fn restore(&self) {
        info!("Restoring sink volume");
        self.set(VolumeDecision::Full);
    }

    fn set(&self, decision: VolumeDecision) {
        match self.sink.set_volume(decision.percent()) {
            Ok(()) => {
                if self.failing.replace(false) {
                    info!("Volume control available again");
                }
            }
            Err(e) => {
                // Only the first failure of a streak is worth a warning.
                if self.failing.replace(true) {
                    debug!("Volume command failed: {e}");
                } else {
                    warn!("Volume command failed: {e}");
                }
            }
        }
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records every requested volume.
    #[derive(Clone, Default)]
    pub struct RecordingSink {
        pub calls: Rc<RefCell<Vec<u8>>>,
        pub fail: bool,
    }

    impl VolumeSink for RecordingSink {
        fn set_volume(&self, percent: u8) -> Result<(), VolumeError> {
            self.calls.borrow_mut().push(percent);
            if self.fail {
                return Err(VolumeError::Spawn {
                    program: "pactl".to_string(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                });
            }
            Ok(())
        }
    }
}
