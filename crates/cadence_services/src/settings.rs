//! Settings management

use cadence_core::time::{ClockConfig, DEFAULT_MAX_FRAME_DELTA};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed settings in {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid setting {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Runtime settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub clock: ClockSettings,
    pub scheduler: SchedulerSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockSettings {
    /// Upper bound on the wall delta fed to the clock, in milliseconds.
    pub max_frame_delta_ms: u64,
    /// Global slow-motion floor. 1 is normal speed.
    pub debug_factor: u32,
    /// Start with logic frozen.
    pub debug_paused: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    /// System names disabled at boot.
    pub disabled_systems: Vec<String>,
    /// Frames the headless runtime simulates before exiting.
    pub frames: u32,
    /// Simulated wall time per frame, in milliseconds.
    pub frame_delta_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `tracing_subscriber::EnvFilter` directive. `RUST_LOG` wins if set.
    pub filter: String,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            max_frame_delta_ms: DEFAULT_MAX_FRAME_DELTA.as_millis() as u64,
            debug_factor: 1,
            debug_paused: false,
        }
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            disabled_systems: Vec::new(),
            frames: 600,
            frame_delta_ms: 16,
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl Settings {
    /// Read settings from a JSON file. A missing file yields the defaults;
    /// fields absent from the file keep their default values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no settings file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SettingsError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let settings = Self::parse(&text, &path.display().to_string())?;
        debug!(path = %path.display(), ?settings, "settings loaded");
        Ok(settings)
    }

    pub fn from_json(text: &str) -> Result<Self, SettingsError> {
        Self::parse(text, "<inline>")
    }

    fn parse(text: &str, origin: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(text).map_err(|source| SettingsError::Parse {
            origin: origin.to_string(),
            source,
        })?;
        if let Err(err) = settings.validate() {
            warn!(origin, %err, "settings rejected");
            return Err(err);
        }
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        serde_json::to_string_pretty(self).map_err(|source| SettingsError::Parse {
            origin: "<settings>".to_string(),
            source,
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.clock.debug_factor == 0 {
            return Err(SettingsError::Invalid {
                field: "clock.debug_factor",
                reason: "must be at least 1",
            });
        }
        if self.clock.max_frame_delta_ms == 0 {
            return Err(SettingsError::Invalid {
                field: "clock.max_frame_delta_ms",
                reason: "must be positive",
            });
        }
        Ok(())
    }

    /// Clock configuration for `World::with_clock_config`.
    pub fn to_clock_config(&self) -> ClockConfig {
        ClockConfig {
            max_frame_delta: Duration::from_millis(self.clock.max_frame_delta_ms),
            debug_factor: self.clock.debug_factor,
            debug_paused: self.clock.debug_paused,
        }
    }

    pub fn frame_delta(&self) -> Duration {
        Duration::from_millis(self.scheduler.frame_delta_ms)
    }
}
