use colony_core::fixed::{Fixed64, Ticks};
use colony_core::id::GridId;

/// Events emitted by the power network.
///
/// Brownout and restore fire only on *transitions*, not every tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridEvent {
    /// A grid was created implicitly or explicitly.
    GridCreated { grid: GridId, tick: Ticks },
    /// A grid was removed (explicitly, or by being merged away).
    GridRemoved { grid: GridId, tick: Ticks },
    /// A grid with members stopped meeting its demand.
    Brownout {
        grid: GridId,
        /// Demand left unmet after production and storage.
        deficit: Fixed64,
        tick: Ticks,
    },
    /// A grid in brownout meets its demand again.
    Restored { grid: GridId, tick: Ticks },
}

impl GridEvent {
    pub fn grid(&self) -> GridId {
        match self {
            Self::GridCreated { grid, .. }
            | Self::GridRemoved { grid, .. }
            | Self::Brownout { grid, .. }
            | Self::Restored { grid, .. } => *grid,
        }
    }
}
