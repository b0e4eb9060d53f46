use colony_core::id::{DeviceId, GridId};

/// Errors raised by power network operations.
///
/// These signal caller mistakes (an id that does not resolve, a request that
/// would put one device on two grids). Queries never fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PowerError {
    /// The device is not present in the supplied device store.
    #[error("device not found: {0:?}")]
    UnknownDevice(DeviceId),
    /// The grid was never created or has been removed.
    #[error("grid not found: {0}")]
    UnknownGrid(GridId),
    /// The device already belongs to another active grid.
    #[error("device {device:?} is already plugged into {grid}")]
    AlreadyPlugged { device: DeviceId, grid: GridId },
}
