//! Fixed-interval tick clock.
//!
//! The game loop reports variable frame time; utility systems advance in
//! discrete ticks. [`TickClock`] accumulates frame time and fires once the
//! accumulated time reaches the interval. On firing the accumulator is reset
//! to zero: time beyond the interval is dropped, not carried into the next
//! tick, and at most one tick fires per call.

use serde::{Deserialize, Serialize};

use crate::fixed::{Fixed64, Ticks};

/// Accumulates elapsed time and reports when a tick is due.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickClock {
    /// Time between ticks, in simulation time units.
    interval: Fixed64,
    /// Time accumulated since the last tick.
    accumulator: Fixed64,
    /// Number of ticks fired so far.
    tick: Ticks,
}

impl TickClock {
    /// Create a clock that fires every `interval` time units.
    ///
    /// A non-positive interval fires on every `advance` call.
    pub fn new(interval: Fixed64) -> Self {
        Self {
            interval,
            accumulator: Fixed64::ZERO,
            tick: 0,
        }
    }

    /// Add `delta` elapsed time. Returns `true` when a tick fires.
    ///
    /// Negative deltas are ignored.
    pub fn advance(&mut self, delta: Fixed64) -> bool {
        if delta > Fixed64::ZERO {
            self.accumulator = self.accumulator.saturating_add(delta);
        }
        if self.accumulator >= self.interval {
            self.accumulator = Fixed64::ZERO;
            self.tick += 1;
            true
        } else {
            false
        }
    }

    /// Count a tick driven directly rather than through `advance`.
    pub fn force_tick(&mut self) -> Ticks {
        self.tick += 1;
        self.tick
    }

    pub fn interval(&self) -> Fixed64 {
        self.interval
    }

    pub fn accumulated(&self) -> Fixed64 {
        self.accumulator
    }

    /// Number of ticks fired so far.
    pub fn current_tick(&self) -> Ticks {
        self.tick
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new(Fixed64::ONE)
    }
}
