//! Cadence Services Layer
//!
//! Host-side services that sit around the simulation core. Currently this is
//! the settings file that configures the clock, the boot-time scheduler state
//! and logging.

pub mod settings;

pub use settings::{ClockSettings, LogSettings, SchedulerSettings, Settings, SettingsError};
