//! The power network: registry of every utility grid in the simulation.
//!
//! [`PowerNetwork`] owns the grids, routes plug/unplug requests to the right
//! one, answers power queries for any device, and owns the tick clock that
//! advances all grids together once per interval.
//!
//! Grids are kept in a creation-keyed map; the *active* set is a
//! registration-ordered list. Every membership lookup, query, and tick only
//! considers active grids, and a device belongs to at most one of them.

use std::collections::BTreeMap;

use colony_core::clock::TickClock;
use colony_core::fixed::{Fixed64, Ticks};
use colony_core::id::{DeviceId, GridId};
use tracing::{debug, trace};

use crate::config::PowerConfig;
use crate::device::DeviceAccess;
use crate::error::PowerError;
use crate::event::GridEvent;
use crate::grid::UtilityGrid;
use crate::policy::{AcceptAll, AdmissionPolicy};

/// Registry of utility grids plus the clock that ticks them.
#[derive(Debug, Clone)]
pub struct PowerNetwork<P = AcceptAll> {
    /// Every known grid, active or detached, keyed by creation order.
    grids: BTreeMap<GridId, UtilityGrid>,
    /// Active grids in registration order.
    active: Vec<GridId>,
    /// Decides which grid a device may join.
    policy: P,
    clock: TickClock,
    /// Whether storage members are reconciled during ticks.
    storage: bool,
    next_grid_id: u32,
    /// Events waiting to be returned by the next `update`/`tick`.
    pending: Vec<GridEvent>,
}

impl PowerNetwork<AcceptAll> {
    /// Create an empty network where every grid accepts every device.
    pub fn new() -> Self {
        Self::with_policy(AcceptAll)
    }
}

impl Default for PowerNetwork<AcceptAll> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: AdmissionPolicy> PowerNetwork<P> {
    /// Create an empty network with default settings and the given policy.
    pub fn with_policy(policy: P) -> Self {
        Self::from_config(&PowerConfig::default(), policy)
    }

    /// Create an empty network from loaded settings.
    pub fn from_config(config: &PowerConfig, policy: P) -> Self {
        Self {
            grids: BTreeMap::new(),
            active: Vec::new(),
            policy,
            clock: TickClock::new(config.tick_interval),
            storage: config.storage,
            next_grid_id: 0,
            pending: Vec::new(),
        }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Mutable access to the policy, e.g. to add wires. Takes effect on the
    /// next plug-in query; existing memberships are not re-evaluated.
    pub fn policy_mut(&mut self) -> &mut P {
        &mut self.policy
    }

    pub fn config(&self) -> PowerConfig {
        PowerConfig {
            tick_interval: self.clock.interval(),
            storage: self.storage,
        }
    }

    /// Number of grid ticks run so far.
    pub fn current_tick(&self) -> Ticks {
        self.clock.current_tick()
    }

    // -----------------------------------------------------------------------
    // Grid set
    // -----------------------------------------------------------------------

    /// True when no grid is registered.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Number of registered grids.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Look up a grid, registered or detached.
    pub fn grid(&self, id: GridId) -> Option<&UtilityGrid> {
        self.grids.get(&id)
    }

    pub fn is_registered(&self, id: GridId) -> bool {
        self.active.contains(&id)
    }

    /// Registered grid ids in registration order.
    pub fn grid_ids(&self) -> &[GridId] {
        &self.active
    }

    /// Registered grids in registration order.
    pub fn grids(&self) -> impl Iterator<Item = &UtilityGrid> + '_ {
        self.active.iter().filter_map(|id| self.grids.get(id))
    }

    /// Create and register a new empty grid.
    pub fn create_grid(&mut self) -> GridId {
        let grid = UtilityGrid::new(GridId(self.next_grid_id));
        self.next_grid_id += 1;
        self.insert_grid(grid)
    }

    fn insert_grid(&mut self, grid: UtilityGrid) -> GridId {
        let id = grid.id();
        self.grids.insert(id, grid);
        self.active.push(id);
        debug!(grid = %id, "grid created");
        self.pending.push(GridEvent::GridCreated {
            grid: id,
            tick: self.clock.current_tick(),
        });
        id
    }

    /// Add a known grid back to the active set.
    ///
    /// Returns `Ok(false)` if it is already active. Fails if the grid is
    /// unknown, or if one of its members is plugged into another active grid;
    /// the registry is unchanged on failure.
    pub fn register_grid(&mut self, id: GridId) -> Result<bool, PowerError> {
        let grid = self.grids.get(&id).ok_or(PowerError::UnknownGrid(id))?;
        if self.active.contains(&id) {
            return Ok(false);
        }
        for &member in grid.members() {
            if let Some(other) = self.is_plugged_in(member) {
                return Err(PowerError::AlreadyPlugged {
                    device: member,
                    grid: other,
                });
            }
        }
        let members = grid.len();
        self.active.push(id);
        debug!(grid = %id, members, "grid registered");
        Ok(true)
    }

    /// Take a grid out of the active set without destroying it. Its members
    /// count as unplugged until it is registered again. Returns whether the
    /// grid was active.
    pub fn unregister_grid(&mut self, id: GridId) -> bool {
        let Some(pos) = self.active.iter().position(|g| *g == id) else {
            return false;
        };
        self.active.remove(pos);
        debug!(grid = %id, "grid unregistered");
        true
    }

    /// Destroy a grid, active or not. Members are dropped without
    /// notification; use this once the grid is known to be empty.
    pub fn remove_grid(&mut self, id: GridId) {
        self.active.retain(|g| *g != id);
        if self.grids.remove(&id).is_some() {
            debug!(grid = %id, "grid removed");
            self.pending.push(GridEvent::GridRemoved {
                grid: id,
                tick: self.clock.current_tick(),
            });
        }
    }

    /// Position of `id` among the registered grids.
    ///
    /// Display-only: positions shift when grids are unregistered. Use the
    /// [`GridId`] itself as a persistent key.
    pub fn find_id(&self, id: GridId) -> Option<usize> {
        self.active.iter().position(|g| *g == id)
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    fn producer_flag<A: DeviceAccess + ?Sized>(
        devices: &A,
        device: DeviceId,
    ) -> Result<bool, PowerError> {
        devices
            .device(device)
            .map(|d| d.produces_power())
            .ok_or(PowerError::UnknownDevice(device))
    }

    /// Whether any registered grid would accept `device`.
    pub fn can_plug_in<A: DeviceAccess + ?Sized>(
        &self,
        device: DeviceId,
        devices: &A,
    ) -> Result<bool, PowerError> {
        if !devices.contains_device(device) {
            return Err(PowerError::UnknownDevice(device));
        }
        Ok(self.grids().any(|g| g.can_plug_in(device, &self.policy)))
    }

    /// Plug `device` into the first registered grid (registration order)
    /// that admits it.
    ///
    /// When none does, a fresh grid is created for it. If the policy rejects
    /// the device even for a fresh grid, nothing changes and `Ok(false)` is
    /// returned. A device that is already plugged in stays where it is.
    pub fn plug_in<A: DeviceAccess + ?Sized>(
        &mut self,
        device: DeviceId,
        devices: &mut A,
    ) -> Result<bool, PowerError> {
        let producer = Self::producer_flag(&*devices, device)?;
        if self.is_plugged_in(device).is_some() {
            return Ok(true);
        }

        let admitting = self.active.iter().copied().find(|id| {
            self.grids
                .get(id)
                .is_some_and(|g| g.can_plug_in(device, &self.policy))
        });
        let target = match admitting {
            Some(id) => id,
            None => {
                let fresh = UtilityGrid::new(GridId(self.next_grid_id));
                if !fresh.can_plug_in(device, &self.policy) {
                    debug!(?device, "no grid admits device");
                    return Ok(false);
                }
                self.next_grid_id += 1;
                self.insert_grid(fresh)
            }
        };

        self.attach(device, target, producer, devices);
        Ok(true)
    }

    /// Plug `device` into a specific grid, bypassing the policy. A detached
    /// grid is registered first.
    pub fn plug_into<A: DeviceAccess + ?Sized>(
        &mut self,
        device: DeviceId,
        grid: GridId,
        devices: &mut A,
    ) -> Result<(), PowerError> {
        let producer = Self::producer_flag(&*devices, device)?;
        if !self.grids.contains_key(&grid) {
            return Err(PowerError::UnknownGrid(grid));
        }
        match self.is_plugged_in(device) {
            Some(current) if current == grid => return Ok(()),
            Some(current) => {
                return Err(PowerError::AlreadyPlugged {
                    device,
                    grid: current,
                });
            }
            None => {}
        }
        self.register_grid(grid)?;
        self.attach(device, grid, producer, devices);
        Ok(())
    }

    /// The registered grid `device` is plugged into, if any.
    pub fn is_plugged_in(&self, device: DeviceId) -> Option<GridId> {
        self.owning_grid(device).map(UtilityGrid::id)
    }

    /// Unplug `device` from whichever registered grid holds it. Returns
    /// whether it was plugged in.
    pub fn unplug<A: DeviceAccess + ?Sized>(
        &mut self,
        device: DeviceId,
        devices: &mut A,
    ) -> Result<bool, PowerError> {
        if !devices.contains_device(device) {
            return Err(PowerError::UnknownDevice(device));
        }
        let Some(grid) = self.is_plugged_in(device) else {
            return Ok(false);
        };
        Ok(self.detach(device, grid, devices))
    }

    /// Unplug `device` from a specific grid. Returns whether it was a member.
    pub fn unplug_from<A: DeviceAccess + ?Sized>(
        &mut self,
        device: DeviceId,
        grid: GridId,
        devices: &mut A,
    ) -> Result<bool, PowerError> {
        if !devices.contains_device(device) {
            return Err(PowerError::UnknownDevice(device));
        }
        if !self.grids.contains_key(&grid) {
            return Err(PowerError::UnknownGrid(grid));
        }
        Ok(self.detach(device, grid, devices))
    }

    /// Drop `device` from every grid without notifying it. For devices that
    /// were already removed from the store. Returns the registered grid it
    /// was plugged into.
    pub fn forget_device(&mut self, device: DeviceId) -> Option<GridId> {
        let plugged = self.is_plugged_in(device);
        for grid in self.grids.values_mut() {
            grid.unplug(device);
        }
        plugged
    }

    /// Move every member of `from` into `into`, then remove `from`.
    ///
    /// Each moved device is told it left `from` and joined `into`. Devices
    /// already on `into` are left alone. A detached `into` is registered
    /// first. Returns the number of devices moved.
    pub fn merge_grids<A: DeviceAccess + ?Sized>(
        &mut self,
        into: GridId,
        from: GridId,
        devices: &mut A,
    ) -> Result<usize, PowerError> {
        let target = self.grids.get(&into).ok_or(PowerError::UnknownGrid(into))?;
        let source = self.grids.get(&from).ok_or(PowerError::UnknownGrid(from))?;
        if into == from {
            return Ok(0);
        }

        // Members already on `into` stay put.
        let moving: Vec<(DeviceId, bool)> = source
            .members()
            .iter()
            .filter(|&&d| !target.is_plugged_in(d))
            .map(|&d| (d, source.is_producer(d)))
            .collect();
        if !self.is_registered(from) {
            for &(device, _) in &moving {
                if let Some(other) = self.is_plugged_in(device) {
                    return Err(PowerError::AlreadyPlugged {
                        device,
                        grid: other,
                    });
                }
            }
        }
        self.register_grid(into)?;

        for &(device, producer) in &moving {
            if let Some(d) = devices.device_mut(device) {
                d.on_unplugged(from);
            }
            if let Some(target) = self.grids.get_mut(&into) {
                target.plug_in(device, producer);
            }
            if let Some(d) = devices.device_mut(device) {
                d.on_plugged_in(into);
            }
        }
        self.remove_grid(from);
        debug!(into = %into, from = %from, moved = moving.len(), "grids merged");
        Ok(moving.len())
    }

    fn attach<A: DeviceAccess + ?Sized>(
        &mut self,
        device: DeviceId,
        grid: GridId,
        producer: bool,
        devices: &mut A,
    ) {
        if let Some(target) = self.grids.get_mut(&grid) {
            target.plug_in(device, producer);
            trace!(grid = %grid, ?device, producer, "device plugged in");
            if let Some(d) = devices.device_mut(device) {
                d.on_plugged_in(grid);
            }
        }
    }

    fn detach<A: DeviceAccess + ?Sized>(
        &mut self,
        device: DeviceId,
        grid: GridId,
        devices: &mut A,
    ) -> bool {
        let removed = self.grids.get_mut(&grid).is_some_and(|g| g.unplug(device));
        if removed {
            trace!(grid = %grid, ?device, "device unplugged");
            if let Some(d) = devices.device_mut(device) {
                d.on_unplugged(grid);
            }
        }
        removed
    }

    // -----------------------------------------------------------------------
    // Power queries
    // -----------------------------------------------------------------------

    fn owning_grid(&self, device: DeviceId) -> Option<&UtilityGrid> {
        self.grids().find(|g| g.is_plugged_in(device))
    }

    /// Re-read producer capability for every member of every registered
    /// grid, without ticking. Ticks do this on their own.
    pub fn refresh_producers<A: DeviceAccess + ?Sized>(&mut self, devices: &A) {
        for id in &self.active {
            if let Some(grid) = self.grids.get_mut(id) {
                grid.refresh_producers(devices);
            }
        }
    }

    /// Whether `device` is wired to a grid with at least one power source,
    /// regardless of whether demand is currently met.
    pub fn is_connected(&self, device: DeviceId) -> bool {
        self.owning_grid(device)
            .is_some_and(UtilityGrid::has_any_producer)
    }

    /// Whether the grid of `device` met its demand on the last tick.
    pub fn has_power(&self, device: DeviceId) -> bool {
        self.owning_grid(device).is_some_and(UtilityGrid::is_operating)
    }

    /// Last computed efficiency of the grid of `device`; zero when unplugged.
    pub fn efficiency(&self, device: DeviceId) -> Fixed64 {
        self.owning_grid(device)
            .map_or(Fixed64::ZERO, UtilityGrid::efficiency)
    }

    // -----------------------------------------------------------------------
    // Simulation
    // -----------------------------------------------------------------------

    /// Advance the clock by `delta`. Once the interval has accumulated, every
    /// registered grid ticks and the accumulator resets to zero (overflow is
    /// dropped).
    ///
    /// Returns the events raised since the last call.
    pub fn update<A: DeviceAccess + ?Sized>(
        &mut self,
        delta: Fixed64,
        devices: &mut A,
    ) -> Vec<GridEvent> {
        if self.clock.advance(delta) {
            self.tick_grids(devices);
        }
        self.drain_events()
    }

    /// Tick every registered grid immediately, ignoring the clock's
    /// accumulator.
    pub fn tick<A: DeviceAccess + ?Sized>(&mut self, devices: &mut A) -> Vec<GridEvent> {
        self.clock.force_tick();
        self.tick_grids(devices);
        self.drain_events()
    }

    /// Take the events queued since the last `update`/`tick`.
    pub fn drain_events(&mut self) -> Vec<GridEvent> {
        std::mem::take(&mut self.pending)
    }

    fn tick_grids<A: DeviceAccess + ?Sized>(&mut self, devices: &mut A) {
        let tick = self.clock.current_tick();
        for id in &self.active {
            let Some(grid) = self.grids.get_mut(id) else {
                continue;
            };
            let report = grid.tick(&mut *devices, tick, self.storage);
            let brownout = !report.operating && !grid.is_empty();

            if brownout && !grid.was_brownout {
                debug!(grid = %id, tick, deficit = %report.deficit(), "grid brownout");
                self.pending.push(GridEvent::Brownout {
                    grid: *id,
                    deficit: report.deficit(),
                    tick,
                });
            } else if grid.was_brownout && report.operating {
                debug!(grid = %id, tick, "grid restored");
                self.pending.push(GridEvent::Restored { grid: *id, tick });
            }
            grid.was_brownout = brownout;
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
