//! Session settings
//!
//! Every peer in a session must run with identical simulation settings;
//! only the diagnostics section may differ. Loaded from a JSON file, any
//! missing field falls back to its default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_DESYNC_WINDOW, DEFAULT_HISTORY_CAPACITY, DEFAULT_TICK_RATE};
use crate::error::ConfigError;
use crate::fixed::Fixed;

/// Highest accepted tick rate (ticks per second)
pub const MAX_TICK_RATE: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Simulation ===
    /// Ticks per second; the tick duration is its reciprocal
    pub tick_rate: u32,
    /// Seed for the shared RNG
    pub seed: u64,

    // === Rollback ===
    /// Snapshots kept for rollback (0 disables history)
    pub history_capacity: usize,
    /// Frame checksums kept for desync checks
    pub desync_window: usize,

    // === Diagnostics ===
    /// Frames the demo binary runs
    pub demo_frames: u64,
    /// Log a summary line every this many frames (0 = never)
    pub summary_every: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            seed: 0x5EED_F00D,

            history_capacity: DEFAULT_HISTORY_CAPACITY,
            desync_window: DEFAULT_DESYNC_WINDOW,

            demo_frames: 600,
            summary_every: 120,
        }
    }
}

impl Settings {
    /// Parse and validate settings from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 || self.tick_rate > MAX_TICK_RATE {
            return Err(ConfigError::Invalid {
                field: "tick_rate",
                reason: format!("must be in 1..={MAX_TICK_RATE}, got {}", self.tick_rate),
            });
        }
        if self.desync_window == 0 {
            return Err(ConfigError::Invalid {
                field: "desync_window",
                reason: "must keep at least one frame".into(),
            });
        }
        Ok(())
    }

    /// Duration of one tick in seconds
    pub fn tick_duration(&self) -> Fixed {
        Fixed::from_ratio(1, i64::from(self.tick_rate.max(1)))
    }
}
