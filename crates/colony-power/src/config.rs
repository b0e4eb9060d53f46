use colony_core::fixed::Fixed64;
use serde::{Deserialize, Serialize};

/// Runtime settings for a [`PowerNetwork`](crate::PowerNetwork).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerConfig {
    /// Simulation time between grid ticks.
    pub tick_interval: Fixed64,
    /// Whether storage members charge from surplus and cover deficits.
    pub storage: bool,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Fixed64::ONE,
            storage: true,
        }
    }
}
