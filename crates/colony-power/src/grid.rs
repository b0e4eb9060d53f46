//! A single utility grid: a set of devices sharing one power pool.

use colony_core::fixed::{Fixed64, Ticks, coverage_ratio};
use colony_core::id::{DeviceId, GridId};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::device::DeviceAccess;
use crate::policy::AdmissionPolicy;

// ---------------------------------------------------------------------------
// Tick outcome
// ---------------------------------------------------------------------------

/// Outcome of one grid tick, broadcast to every member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridReport {
    pub grid: GridId,
    pub tick: Ticks,
    /// Sum of member production.
    pub production: Fixed64,
    /// Sum of member consumption.
    pub consumption: Fixed64,
    /// Surplus absorbed by storage members.
    pub charged: Fixed64,
    /// Deficit covered by storage members.
    pub discharged: Fixed64,
    /// Power actually delivered to consumers.
    pub supplied: Fixed64,
    /// `supplied / consumption`, clamped to [0, 1]; 1 when nothing is requested.
    pub efficiency: Fixed64,
    /// Whether demand was fully met.
    pub operating: bool,
}

impl GridReport {
    /// Report for a grid with no members.
    fn idle(grid: GridId, tick: Ticks) -> Self {
        Self {
            grid,
            tick,
            production: Fixed64::ZERO,
            consumption: Fixed64::ZERO,
            charged: Fixed64::ZERO,
            discharged: Fixed64::ZERO,
            supplied: Fixed64::ZERO,
            efficiency: Fixed64::ZERO,
            operating: false,
        }
    }

    /// Unmet demand this tick.
    pub fn deficit(&self) -> Fixed64 {
        (self.consumption - self.supplied).max(Fixed64::ZERO)
    }
}

// ---------------------------------------------------------------------------
// Utility grid
// ---------------------------------------------------------------------------

/// A connected set of devices sharing a power pool.
///
/// Operating state and efficiency are aggregates of the last tick, not
/// per-device state: a member is powered exactly when its grid operated on
/// the last tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtilityGrid {
    id: GridId,
    /// Member devices in plug-in order. Storage is reconciled in this order.
    members: Vec<DeviceId>,
    /// Members that reported being a power source when plugged in.
    producers: Vec<DeviceId>,
    operating: bool,
    efficiency: Fixed64,
    last_report: Option<GridReport>,
    /// Whether the last tick ended in brownout. Used to detect transitions.
    pub(crate) was_brownout: bool,
}

impl UtilityGrid {
    /// Create a new empty grid.
    pub fn new(id: GridId) -> Self {
        Self {
            id,
            members: Vec::new(),
            producers: Vec::new(),
            operating: false,
            efficiency: Fixed64::ZERO,
            last_report: None,
            was_brownout: false,
        }
    }

    pub fn id(&self) -> GridId {
        self.id
    }

    /// Whether `policy` lets `device` join this grid right now.
    pub fn can_plug_in<P: AdmissionPolicy + ?Sized>(&self, device: DeviceId, policy: &P) -> bool {
        policy.admits(self, device)
    }

    /// Add `device` without consulting any policy. Returns `true` if the
    /// device is a member afterwards (including when it already was).
    pub fn plug_in(&mut self, device: DeviceId, produces_power: bool) -> bool {
        if !self.members.contains(&device) {
            self.members.push(device);
            if produces_power {
                self.producers.push(device);
            }
        }
        true
    }

    /// Remove `device`. Returns whether it was a member.
    pub fn unplug(&mut self, device: DeviceId) -> bool {
        let before = self.members.len();
        self.members.retain(|d| *d != device);
        self.producers.retain(|d| *d != device);
        self.members.len() != before
    }

    pub fn is_plugged_in(&self, device: DeviceId) -> bool {
        self.members.contains(&device)
    }

    /// Re-read [`produces_power`](crate::PluggableDevice::produces_power)
    /// for every member. Members missing from `devices` keep their previous
    /// flag. [`tick`](Self::tick) does this as part of summing.
    pub fn refresh_producers<A: DeviceAccess + ?Sized>(&mut self, devices: &A) {
        let producers = self
            .members
            .iter()
            .copied()
            .filter(|&member| match devices.device(member) {
                Some(device) => device.produces_power(),
                None => self.producers.contains(&member),
            })
            .collect();
        self.producers = producers;
    }

    /// Whether any member is a power source, regardless of whether it
    /// currently produces enough. Capability is recorded at plug-in and
    /// re-read on every tick.
    pub fn has_any_producer(&self) -> bool {
        !self.producers.is_empty()
    }

    pub fn is_producer(&self, device: DeviceId) -> bool {
        self.producers.contains(&device)
    }

    pub fn members(&self) -> &[DeviceId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether demand was met on the last tick.
    pub fn is_operating(&self) -> bool {
        self.operating
    }

    /// Efficiency computed on the last tick.
    pub fn efficiency(&self) -> Fixed64 {
        self.efficiency
    }

    pub fn last_report(&self) -> Option<&GridReport> {
        self.last_report.as_ref()
    }

    /// Simulate one tick.
    ///
    /// 1. Sum production and consumption over all members.
    /// 2. With `reconcile_storage`, charge storage members with any surplus,
    ///    or discharge them to cover a deficit, in membership order.
    /// 3. Derive efficiency and operating state.
    /// 4. Hand the report to every member.
    ///
    /// Members missing from `devices` are skipped. An empty grid does
    /// nothing and is not operating.
    pub fn tick<A: DeviceAccess + ?Sized>(
        &mut self,
        devices: &mut A,
        current_tick: Ticks,
        reconcile_storage: bool,
    ) -> GridReport {
        if self.members.is_empty() {
            let report = GridReport::idle(self.id, current_tick);
            self.operating = false;
            self.efficiency = Fixed64::ZERO;
            self.last_report = Some(report.clone());
            return report;
        }

        // Phase 1: sum supply and demand, re-reading producer capability.
        let mut production = Fixed64::ZERO;
        let mut consumption = Fixed64::ZERO;
        let mut producers = Vec::with_capacity(self.producers.len());
        for &member in &self.members {
            match devices.device(member) {
                Some(device) => {
                    production = production.saturating_add(device.production().max(Fixed64::ZERO));
                    consumption =
                        consumption.saturating_add(device.consumption().max(Fixed64::ZERO));
                    if device.produces_power() {
                        producers.push(member);
                    }
                }
                None => {
                    warn!(grid = %self.id, ?member, "member missing from device store, skipped");
                    if self.producers.contains(&member) {
                        producers.push(member);
                    }
                }
            }
        }
        self.producers = producers;

        // Phase 2: storage reconciliation.
        let mut charged = Fixed64::ZERO;
        let mut discharged = Fixed64::ZERO;
        if reconcile_storage {
            if production >= consumption {
                let mut excess = production - consumption;
                for &member in &self.members {
                    if excess <= Fixed64::ZERO {
                        break;
                    }
                    if let Some(storage) = devices.device_mut(member).and_then(|d| d.storage_mut()) {
                        let taken = storage.absorb(excess);
                        excess -= taken;
                        charged += taken;
                    }
                }
            } else {
                let mut remaining = consumption - production;
                for &member in &self.members {
                    if remaining <= Fixed64::ZERO {
                        break;
                    }
                    if let Some(storage) = devices.device_mut(member).and_then(|d| d.storage_mut()) {
                        let given = storage.release(remaining);
                        remaining -= given;
                        discharged += given;
                    }
                }
            }
        }

        // Phase 3: aggregate state.
        let supplied = production.saturating_add(discharged).min(consumption);
        let report = GridReport {
            grid: self.id,
            tick: current_tick,
            production,
            consumption,
            charged,
            discharged,
            supplied,
            efficiency: coverage_ratio(supplied, consumption),
            operating: supplied >= consumption,
        };
        self.operating = report.operating;
        self.efficiency = report.efficiency;

        trace!(
            grid = %self.id,
            tick = current_tick,
            members = self.members.len(),
            production = %report.production,
            consumption = %report.consumption,
            efficiency = %report.efficiency,
            operating = report.operating,
            "grid ticked"
        );

        // Phase 4: notify members.
        for &member in &self.members {
            if let Some(device) = devices.device_mut(member) {
                device.on_grid_tick(&report);
            }
        }

        self.last_report = Some(report.clone());
        report
    }
}

// ===========================================================================
// Tests
// ===========================================================================
