//! Power network settings file.
//!
//! ```ron
//! (
//!     tick_interval: 0.5,
//!     storage: true,
//! )
//! ```

use std::path::Path;

use colony_core::fixed::Fixed64;
use colony_power::PowerConfig;
use serde::Deserialize;
use tracing::debug;

use crate::loader::{DataLoadError, deserialize_file};

/// On-disk schema for [`PowerConfig`]. Every field is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PowerConfigData {
    /// Seconds of simulation time between grid ticks.
    pub tick_interval: f64,
    /// Whether storage members take part in balancing.
    pub storage: bool,
}

impl Default for PowerConfigData {
    fn default() -> Self {
        Self {
            tick_interval: 1.0,
            storage: true,
        }
    }
}

impl PowerConfigData {
    /// Validate and convert to the runtime settings. `path` is only used for
    /// error reporting.
    pub fn resolve(&self, path: &Path) -> Result<PowerConfig, DataLoadError> {
        if !self.tick_interval.is_finite() || self.tick_interval <= 0.0 {
            return Err(DataLoadError::Invalid {
                file: path.to_path_buf(),
                detail: format!(
                    "tick_interval must be a positive number, got {}",
                    self.tick_interval
                ),
            });
        }

        let tick_interval = match Fixed64::checked_from_num(self.tick_interval) {
            // Rounds to zero below the fixed-point resolution.
            Some(interval) if interval > Fixed64::ZERO => interval,
            _ => {
                return Err(DataLoadError::Invalid {
                    file: path.to_path_buf(),
                    detail: format!("tick_interval {} is out of range", self.tick_interval),
                });
            }
        };

        Ok(PowerConfig {
            tick_interval,
            storage: self.storage,
        })
    }
}

/// Load power network settings from a `.ron`, `.toml`, or `.json` file.
pub fn load_power_config(path: &Path) -> Result<PowerConfig, DataLoadError> {
    let data: PowerConfigData = deserialize_file(path)?;
    let config = data.resolve(path)?;
    debug!(
        file = %path.display(),
        tick_interval = %config.tick_interval,
        storage = config.storage,
        "loaded power config"
    );
    Ok(config)
}

// ===========================================================================
// Tests
// ===========================================================================
