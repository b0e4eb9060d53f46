use std::fmt;

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a device (generator, battery, consumer building) owned by
    /// the simulation. Utility systems hold these keys, never the devices.
    pub struct DeviceId;
}

/// Identifies a utility grid. Assigned once at grid creation and never
/// reused, so it is safe to persist or display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridId(pub u32);

impl fmt::Display for GridId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "grid#{}", self.0)
    }
}
