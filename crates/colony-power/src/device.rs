//! The capability a simulation entity needs to take part in a utility grid.
//!
//! Devices are owned by the simulation (a building, a generator, a battery).
//! Grids only remember [`DeviceId`]s; whenever the network needs to read or
//! notify a device it borrows the caller's device store through
//! [`DeviceAccess`] for the duration of that one call.

use std::collections::{BTreeMap, HashMap};

use colony_core::fixed::Fixed64;
use colony_core::id::{DeviceId, GridId};
use serde::{Deserialize, Serialize};
use slotmap::{SecondaryMap, SlotMap};

use crate::grid::GridReport;

// ---------------------------------------------------------------------------
// Storage state
// ---------------------------------------------------------------------------

/// Charge state of a storage-capable device (battery, accumulator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerStorage {
    /// Maximum charge in energy units (Fixed64).
    pub capacity: Fixed64,
    /// Current charge (Fixed64). Kept within [0, capacity].
    pub charge: Fixed64,
    /// Maximum charge or discharge per tick (Fixed64).
    pub charge_rate: Fixed64,
}

impl PowerStorage {
    /// An empty store with the given capacity and rate.
    pub fn empty(capacity: Fixed64, charge_rate: Fixed64) -> Self {
        Self {
            capacity,
            charge: Fixed64::ZERO,
            charge_rate,
        }
    }

    /// Remaining room before the store is full.
    pub fn headroom(&self) -> Fixed64 {
        (self.capacity - self.charge).max(Fixed64::ZERO)
    }

    /// Absorb up to `offered`, limited by rate and headroom. Returns the
    /// amount actually stored.
    pub fn absorb(&mut self, offered: Fixed64) -> Fixed64 {
        let taken = offered.min(self.charge_rate).min(self.headroom());
        if taken <= Fixed64::ZERO {
            return Fixed64::ZERO;
        }
        self.charge += taken;
        taken
    }

    /// Release up to `requested`, limited by rate and current charge.
    /// Returns the amount actually released.
    pub fn release(&mut self, requested: Fixed64) -> Fixed64 {
        let given = requested.min(self.charge_rate).min(self.charge);
        if given <= Fixed64::ZERO {
            return Fixed64::ZERO;
        }
        self.charge -= given;
        given
    }

    pub fn is_full(&self) -> bool {
        self.charge >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.charge <= Fixed64::ZERO
    }
}

// ---------------------------------------------------------------------------
// Pluggable device capability
// ---------------------------------------------------------------------------

/// Anything that produces, consumes, or stores power and can sit on a grid.
///
/// Every method has a neutral default, so a pure consumer only overrides
/// [`consumption`](Self::consumption) and a pure generator only
/// [`production`](Self::production).
pub trait PluggableDevice {
    /// Power this device can supply this tick.
    fn production(&self) -> Fixed64 {
        Fixed64::ZERO
    }

    /// Power this device requests this tick.
    fn consumption(&self) -> Fixed64 {
        Fixed64::ZERO
    }

    /// Whether this device is a power source at all, independent of its
    /// current output. Recorded when the device is plugged in.
    fn produces_power(&self) -> bool {
        self.production() > Fixed64::ZERO
    }

    /// Charge state, for storage-capable devices.
    fn storage_mut(&mut self) -> Option<&mut PowerStorage> {
        None
    }

    /// Called after the device joins `grid`.
    fn on_plugged_in(&mut self, grid: GridId) {
        let _ = grid;
    }

    /// Called after the device leaves `grid`.
    fn on_unplugged(&mut self, grid: GridId) {
        let _ = grid;
    }

    /// Called once per grid tick with the grid's outcome, so the device can
    /// scale its own work (e.g. run at `report.efficiency` speed).
    fn on_grid_tick(&mut self, report: &GridReport) {
        let _ = report;
    }
}

impl<T: PluggableDevice + ?Sized> PluggableDevice for Box<T> {
    fn production(&self) -> Fixed64 {
        (**self).production()
    }

    fn consumption(&self) -> Fixed64 {
        (**self).consumption()
    }

    fn produces_power(&self) -> bool {
        (**self).produces_power()
    }

    fn storage_mut(&mut self) -> Option<&mut PowerStorage> {
        (**self).storage_mut()
    }

    fn on_plugged_in(&mut self, grid: GridId) {
        (**self).on_plugged_in(grid);
    }

    fn on_unplugged(&mut self, grid: GridId) {
        (**self).on_unplugged(grid);
    }

    fn on_grid_tick(&mut self, report: &GridReport) {
        (**self).on_grid_tick(report);
    }
}

// ---------------------------------------------------------------------------
// Device store access
// ---------------------------------------------------------------------------

/// Lookup from [`DeviceId`] to the live device object.
///
/// Implemented for the usual keyed containers, so the simulation can pass
/// whatever it already stores its buildings in.
pub trait DeviceAccess {
    fn device(&self, id: DeviceId) -> Option<&dyn PluggableDevice>;

    fn device_mut(&mut self, id: DeviceId) -> Option<&mut dyn PluggableDevice>;

    fn contains_device(&self, id: DeviceId) -> bool {
        self.device(id).is_some()
    }
}

impl<D: PluggableDevice> DeviceAccess for SlotMap<DeviceId, D> {
    fn device(&self, id: DeviceId) -> Option<&dyn PluggableDevice> {
        self.get(id).map(|d| d as &dyn PluggableDevice)
    }

    fn device_mut(&mut self, id: DeviceId) -> Option<&mut dyn PluggableDevice> {
        self.get_mut(id).map(|d| d as &mut dyn PluggableDevice)
    }
}

impl<D: PluggableDevice> DeviceAccess for SecondaryMap<DeviceId, D> {
    fn device(&self, id: DeviceId) -> Option<&dyn PluggableDevice> {
        self.get(id).map(|d| d as &dyn PluggableDevice)
    }

    fn device_mut(&mut self, id: DeviceId) -> Option<&mut dyn PluggableDevice> {
        self.get_mut(id).map(|d| d as &mut dyn PluggableDevice)
    }
}

impl<D: PluggableDevice> DeviceAccess for BTreeMap<DeviceId, D> {
    fn device(&self, id: DeviceId) -> Option<&dyn PluggableDevice> {
        self.get(&id).map(|d| d as &dyn PluggableDevice)
    }

    fn device_mut(&mut self, id: DeviceId) -> Option<&mut dyn PluggableDevice> {
        self.get_mut(&id).map(|d| d as &mut dyn PluggableDevice)
    }
}

impl<D: PluggableDevice> DeviceAccess for HashMap<DeviceId, D> {
    fn device(&self, id: DeviceId) -> Option<&dyn PluggableDevice> {
        self.get(&id).map(|d| d as &dyn PluggableDevice)
    }

    fn device_mut(&mut self, id: DeviceId) -> Option<&mut dyn PluggableDevice> {
        self.get_mut(&id).map(|d| d as &mut dyn PluggableDevice)
    }
}
