//! Utility (power) networks for the colony simulation.
//!
//! Tracks which connected electrical devices share a grid, balances
//! production against consumption once per tick, and reports operating state
//! and efficiency back to every device.
//!
//! # Design
//!
//! - Devices are owned by the simulation and referenced by [`DeviceId`]. The
//!   network reaches them through a caller-supplied [`DeviceAccess`] store
//!   only for the duration of a call.
//! - A [`UtilityGrid`] is a set of member devices sharing one power pool.
//! - The [`PowerNetwork`] registry owns every grid, guarantees a device sits
//!   on at most one registered grid, and ticks all grids together once per
//!   fixed interval.
//! - Which grid a device may join is decided by an [`AdmissionPolicy`]
//!   (wire adjacency, proximity...), evaluated fresh on every query.
//! - Storage members charge from surplus and discharge before any shortfall
//!   is counted.
//! - Brownout/restored events fire only on *transitions*, not every tick.
//!
//! ```rust,ignore
//! let mut network = PowerNetwork::new();
//! network.plug_in(generator, &mut buildings)?;
//! network.plug_in(smelter, &mut buildings)?;
//! for event in network.update(frame_time, &mut buildings) {
//!     // ...
//! }
//! assert!(network.has_power(smelter));
//! ```
//!
//! [`DeviceId`]: colony_core::id::DeviceId

pub mod config;
pub mod device;
pub mod error;
pub mod event;
pub mod grid;
pub mod network;
pub mod policy;

pub use config::PowerConfig;
pub use device::{DeviceAccess, PluggableDevice, PowerStorage};
pub use error::PowerError;
pub use event::GridEvent;
pub use grid::{GridReport, UtilityGrid};
pub use network::PowerNetwork;
pub use policy::{AcceptAll, AdmissionPolicy, WiringAdjacency};
