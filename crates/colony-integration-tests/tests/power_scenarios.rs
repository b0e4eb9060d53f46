//! Cross-crate power network scenarios.
//!
//! Each test builds a small colony of heterogeneous devices in a
//! `SlotMap<DeviceId, Box<dyn PluggableDevice>>`, wires them through the
//! registry, and drives the fixed-interval clock.

use colony_core::fixed::Fixed64;
use colony_core::id::{DeviceId, GridId};
use colony_power::{
    GridEvent, GridReport, PluggableDevice, PowerConfig, PowerError, PowerNetwork, PowerStorage,
    UtilityGrid, WiringAdjacency,
};
use slotmap::SlotMap;

// ===========================================================================
// Devices
// ===========================================================================

fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

struct Generator(Fixed64);

impl PluggableDevice for Generator {
    fn production(&self) -> Fixed64 {
        self.0
    }

    fn produces_power(&self) -> bool {
        true
    }
}

struct Machine(Fixed64);

impl PluggableDevice for Machine {
    fn consumption(&self) -> Fixed64 {
        self.0
    }
}

struct Battery(PowerStorage);

impl PluggableDevice for Battery {
    fn storage_mut(&mut self) -> Option<&mut PowerStorage> {
        Some(&mut self.0)
    }
}

type Colony = SlotMap<DeviceId, Box<dyn PluggableDevice>>;

fn generator(colony: &mut Colony, output: f64) -> DeviceId {
    colony.insert(Box::new(Generator(fixed(output))))
}

fn machine(colony: &mut Colony, draw: f64) -> DeviceId {
    colony.insert(Box::new(Machine(fixed(draw))))
}

fn battery(colony: &mut Colony, charge: f64, capacity: f64, rate: f64) -> DeviceId {
    colony.insert(Box::new(Battery(PowerStorage {
        capacity: fixed(capacity),
        charge: fixed(charge),
        charge_rate: fixed(rate),
    })))
}

fn brownouts(events: &[GridEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, GridEvent::Brownout { .. }))
        .count()
}

fn restorations(events: &[GridEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, GridEvent::Restored { .. }))
        .count()
}

// ===========================================================================
// Scenarios
// ===========================================================================

#[test]
fn never_plugged_device_answers_neutrally() {
    let mut colony = Colony::with_key();
    let lamp = machine(&mut colony, 5.0);
    let network = PowerNetwork::new();

    assert!(network.is_empty());
    assert_eq!(network.is_plugged_in(lamp), None);
    assert!(!network.is_connected(lamp));
    assert!(!network.has_power(lamp));
    assert_eq!(network.efficiency(lamp), Fixed64::ZERO);
}

#[test]
fn empty_registry_creates_a_grid_on_first_plug_in() {
    let mut colony = Colony::with_key();
    let plant = generator(&mut colony, 50.0);
    let mut network = PowerNetwork::new();

    assert!(network.plug_in(plant, &mut colony).unwrap());
    assert_eq!(network.len(), 1);
    let grid = network.is_plugged_in(plant).unwrap();
    assert_eq!(network.find_id(grid), Some(0));

    let events = network.drain_events();
    assert!(matches!(events.as_slice(), [GridEvent::GridCreated { .. }]));
}

#[test]
fn unwired_devices_land_on_separate_grids() {
    let mut colony = Colony::with_key();
    let plant = generator(&mut colony, 50.0);
    let lamp = machine(&mut colony, 5.0);
    let mut network = PowerNetwork::with_policy(WiringAdjacency::new());

    network.plug_in(plant, &mut colony).unwrap();
    network.plug_in(lamp, &mut colony).unwrap();

    assert_eq!(network.len(), 2);
    assert_ne!(network.is_plugged_in(plant), network.is_plugged_in(lamp));

    network.tick(&mut colony);
    assert!(network.has_power(plant));
    assert!(!network.is_connected(lamp));
    assert!(!network.has_power(lamp));
}

#[test]
fn wiring_merge_joins_two_grids() {
    let mut colony = Colony::with_key();
    let plant = generator(&mut colony, 50.0);
    let smelter = machine(&mut colony, 30.0);
    let lamp = machine(&mut colony, 10.0);
    let mut network = PowerNetwork::with_policy(WiringAdjacency::new());

    network.policy_mut().link(plant, smelter);
    network.plug_in(plant, &mut colony).unwrap();
    network.plug_in(smelter, &mut colony).unwrap();
    network.plug_in(lamp, &mut colony).unwrap();
    let main = network.is_plugged_in(plant).unwrap();
    let remote = network.is_plugged_in(lamp).unwrap();
    assert_ne!(main, remote);
    network.drain_events();

    network.policy_mut().link(smelter, lamp);
    assert_eq!(network.merge_grids(main, remote, &mut colony).unwrap(), 1);

    assert_eq!(network.len(), 1);
    assert_eq!(network.is_plugged_in(lamp), Some(main));
    assert!(network.grid(remote).is_none());

    let events = network.tick(&mut colony);
    assert!(
        events
            .iter()
            .any(|e| matches!(e, GridEvent::GridRemoved { grid, .. } if *grid == remote))
    );
    assert!(network.has_power(lamp));
    assert_eq!(network.efficiency(lamp), Fixed64::ONE);
}

#[test]
fn brownout_and_recovery_with_battery_backup() {
    let mut colony = Colony::with_key();
    let plant = generator(&mut colony, 20.0);
    let factory = machine(&mut colony, 40.0);
    let backup = battery(&mut colony, 30.0, 100.0, 10.0);
    let mut network = PowerNetwork::new();
    for id in [plant, factory, backup] {
        network.plug_in(id, &mut colony).unwrap();
    }
    network.drain_events();

    // Deficit 20, battery covers 10 per tick: brownout from the first tick.
    let events = network.tick(&mut colony);
    assert_eq!(brownouts(&events), 1);
    assert!(!network.has_power(factory));
    assert!(network.is_connected(factory));
    assert_eq!(network.efficiency(factory), fixed(0.75));

    // No repeated brownout while the grid stays short.
    let events = network.tick(&mut colony);
    assert_eq!(brownouts(&events), 0);

    // Swap in a larger plant by unplugging and plugging a new one.
    let big_plant = generator(&mut colony, 100.0);
    assert!(network.unplug(plant, &mut colony).unwrap());
    network.plug_in(big_plant, &mut colony).unwrap();

    let events = network.tick(&mut colony);
    assert_eq!(restorations(&events), 1);
    assert!(network.has_power(factory));

    let grid = network.is_plugged_in(factory).unwrap();
    let report = network.grid(grid).and_then(UtilityGrid::last_report).unwrap();
    assert_eq!(report.charged, fixed(10.0));
}

#[test]
fn clock_ticks_once_per_interval() {
    let mut colony = Colony::with_key();
    let plant = generator(&mut colony, 10.0);
    let config = PowerConfig {
        tick_interval: fixed(1.0),
        storage: true,
    };
    let mut network = PowerNetwork::from_config(&config, colony_power::AcceptAll);
    network.plug_in(plant, &mut colony).unwrap();

    for _ in 0..3 {
        network.update(fixed(0.25), &mut colony);
    }
    assert_eq!(network.current_tick(), 0);
    assert!(!network.has_power(plant));

    network.update(fixed(0.25), &mut colony);
    assert_eq!(network.current_tick(), 1);
    assert!(network.has_power(plant));

    // A single huge frame still fires only one tick.
    network.update(fixed(10.0), &mut colony);
    assert_eq!(network.current_tick(), 2);
}

#[test]
fn devices_observe_grid_reports() {
    struct Worker {
        draw: Fixed64,
        speed: std::rc::Rc<std::cell::Cell<Fixed64>>,
    }

    impl PluggableDevice for Worker {
        fn consumption(&self) -> Fixed64 {
            self.draw
        }

        fn on_grid_tick(&mut self, report: &GridReport) {
            self.speed.set(report.efficiency);
        }
    }

    let speed = std::rc::Rc::new(std::cell::Cell::new(Fixed64::ZERO));
    let mut colony = Colony::with_key();
    let plant = generator(&mut colony, 10.0);
    let worker = colony.insert(Box::new(Worker {
        draw: fixed(40.0),
        speed: speed.clone(),
    }));
    let mut network = PowerNetwork::new();
    network.plug_in(plant, &mut colony).unwrap();
    network.plug_in(worker, &mut colony).unwrap();

    network.tick(&mut colony);
    assert_eq!(speed.get(), fixed(0.25));
}

#[test]
fn removed_device_is_forgotten_and_stale_ids_are_rejected() {
    let mut colony = Colony::with_key();
    let plant = generator(&mut colony, 10.0);
    let lamp = machine(&mut colony, 5.0);
    let mut network = PowerNetwork::new();
    network.plug_in(plant, &mut colony).unwrap();
    network.plug_in(lamp, &mut colony).unwrap();
    let grid = network.is_plugged_in(lamp).unwrap();

    colony.remove(lamp);
    assert_eq!(
        network.unplug(lamp, &mut colony),
        Err(PowerError::UnknownDevice(lamp))
    );
    assert_eq!(network.forget_device(lamp), Some(grid));
    assert_eq!(network.is_plugged_in(lamp), None);
    assert_eq!(network.grid(grid).map(UtilityGrid::len), Some(1));

    assert_eq!(
        network.plug_into(plant, GridId(99), &mut colony),
        Err(PowerError::UnknownGrid(GridId(99)))
    );
}

#[test]
fn unregistered_grid_is_reactivated_by_explicit_plug_in() {
    let mut colony = Colony::with_key();
    let plant = generator(&mut colony, 10.0);
    let lamp = machine(&mut colony, 5.0);
    let mut network = PowerNetwork::new();
    network.plug_in(plant, &mut colony).unwrap();
    let grid = network.is_plugged_in(plant).unwrap();

    assert!(network.unregister_grid(grid));
    assert_eq!(network.is_plugged_in(plant), None);
    assert_eq!(network.find_id(grid), None);

    network.plug_into(lamp, grid, &mut colony).unwrap();
    assert!(network.is_registered(grid));
    assert_eq!(network.is_plugged_in(plant), Some(grid));
    assert_eq!(network.is_plugged_in(lamp), Some(grid));
}
