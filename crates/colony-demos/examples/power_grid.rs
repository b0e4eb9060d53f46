//! Power grid example: wiring, auto-created grids, storage, brownout, merge.
//!
//! Builds a small colony whose buildings are wired together, lets the network
//! group them into grids, then drives the fixed-interval clock through a
//! brownout, a battery-backed recovery, and the merge of two grids once a new
//! wire joins them.
//!
//! Run with: `cargo run -p colony-demos --example power_grid [config.ron]`
//! Set `RUST_LOG=info` to log grid events, or `RUST_LOG=colony_power=debug`
//! to see the network's own logging.

use std::path::Path;

use colony_core::fixed::Fixed64;
use colony_core::id::DeviceId;
use colony_data::load_power_config;
use colony_power::*;
use slotmap::SlotMap;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// A building in the colony, as far as the power network is concerned.
#[derive(Debug)]
enum Building {
    Generator { output: Fixed64 },
    Consumer { draw: Fixed64, speed: Fixed64 },
    Battery(PowerStorage),
}

impl PluggableDevice for Building {
    fn production(&self) -> Fixed64 {
        match self {
            Building::Generator { output } => *output,
            _ => Fixed64::ZERO,
        }
    }

    fn consumption(&self) -> Fixed64 {
        match self {
            Building::Consumer { draw, .. } => *draw,
            _ => Fixed64::ZERO,
        }
    }

    fn produces_power(&self) -> bool {
        matches!(self, Building::Generator { .. })
    }

    fn storage_mut(&mut self) -> Option<&mut PowerStorage> {
        match self {
            Building::Battery(storage) => Some(storage),
            _ => None,
        }
    }

    fn on_grid_tick(&mut self, report: &GridReport) {
        if let Building::Consumer { speed, .. } = self {
            *speed = report.efficiency;
        }
    }
}

fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

fn battery_charge(buildings: &SlotMap<DeviceId, Building>, id: DeviceId) -> Fixed64 {
    match buildings.get(id) {
        Some(Building::Battery(storage)) => storage.charge,
        _ => Fixed64::ZERO,
    }
}

fn speed(buildings: &SlotMap<DeviceId, Building>, id: DeviceId) -> Fixed64 {
    match buildings.get(id) {
        Some(Building::Consumer { speed, .. }) => *speed,
        _ => Fixed64::ZERO,
    }
}

fn set_output(buildings: &mut SlotMap<DeviceId, Building>, id: DeviceId, value: f64) {
    if let Some(Building::Generator { output }) = buildings.get_mut(id) {
        *output = fixed(value);
    }
}

fn log_events(events: &[GridEvent]) {
    for event in events {
        match event {
            GridEvent::Brownout {
                grid,
                deficit,
                tick,
            } => warn!(grid = %grid, deficit = %deficit, tick, "grid browned out"),
            other => info!(event = ?other, "grid event"),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let config = load_power_config(Path::new(&path))?;
            info!(path = %path, "using power config from file");
            config
        }
        None => PowerConfig::default(),
    };
    println!(
        "Tick interval {}, storage {}\n",
        config.tick_interval,
        if config.storage { "on" } else { "off" }
    );

    let mut buildings: SlotMap<DeviceId, Building> = SlotMap::with_key();
    let plant = buildings.insert(Building::Generator { output: fixed(100.0) });
    let smelter = buildings.insert(Building::Consumer {
        draw: fixed(60.0),
        speed: Fixed64::ZERO,
    });
    let assembler = buildings.insert(Building::Consumer {
        draw: fixed(50.0),
        speed: Fixed64::ZERO,
    });
    let battery = buildings.insert(Building::Battery(PowerStorage {
        capacity: fixed(200.0),
        charge: fixed(40.0),
        charge_rate: fixed(25.0),
    }));
    let solar = buildings.insert(Building::Generator { output: fixed(30.0) });
    let outpost_lamp = buildings.insert(Building::Consumer {
        draw: fixed(10.0),
        speed: Fixed64::ZERO,
    });

    // --- Wiring: a main base and a separate outpost ---

    let mut wiring = WiringAdjacency::new();
    wiring.link(plant, smelter);
    wiring.link(smelter, assembler);
    wiring.link(assembler, battery);
    wiring.link(solar, outpost_lamp);

    let mut network = PowerNetwork::from_config(&config, wiring);
    for id in [plant, smelter, assembler, battery, solar, outpost_lamp] {
        network.plug_in(id, &mut buildings)?;
    }

    let main_grid = network.is_plugged_in(plant).ok_or("plant not plugged in")?;
    let outpost_grid = network.is_plugged_in(solar).ok_or("solar not plugged in")?;
    println!("=== Wiring ===\n");
    for grid in network.grids() {
        let position = network.find_id(grid.id()).unwrap_or_default();
        println!(
            "{} (position {position}): {} members, producer: {}",
            grid.id(),
            grid.len(),
            grid.has_any_producer()
        );
    }

    // Half-second frames; the clock decides when grids tick.
    let frame = fixed(0.5);
    let run_frames = |network: &mut PowerNetwork<WiringAdjacency>,
                          buildings: &mut SlotMap<DeviceId, Building>,
                          frames: usize| {
        for _ in 0..frames {
            let events = network.update(frame, buildings);
            for event in &events {
                println!("  Event: {event:?}");
            }
            log_events(&events);
        }
        let report = network.grid(main_grid).and_then(UtilityGrid::last_report);
        if let Some(report) = report {
            println!(
                "Tick {}: supplied={:.1}/{:.1}, efficiency={:.2}, battery={:.1}",
                report.tick,
                report.supplied,
                report.consumption,
                report.efficiency,
                battery_charge(buildings, battery)
            );
        }
    };

    // --- Scenario 1: the battery covers a small deficit ---
    // Demand 110, production 100: the battery supplies the missing 10.

    println!("\n=== Scenario 1: Battery covers small deficit ===\n");
    for _ in 0..3 {
        run_frames(&mut network, &mut buildings, 2);
    }

    // --- Scenario 2: brownout ---

    println!("\n=== Scenario 2: Brownout (reduced production) ===\n");
    set_output(&mut buildings, plant, 40.0);
    for _ in 0..6 {
        run_frames(&mut network, &mut buildings, 2);
    }
    println!(
        "smelter has power: {}, efficiency {:.2}, running at {:.2}",
        network.has_power(smelter),
        network.efficiency(smelter),
        speed(&buildings, smelter)
    );

    // --- Scenario 3: recovery, surplus recharges the battery ---

    println!("\n=== Scenario 3: Recovery (production restored) ===\n");
    set_output(&mut buildings, plant, 150.0);
    for _ in 0..4 {
        run_frames(&mut network, &mut buildings, 2);
    }

    // --- Scenario 4: a new wire joins the outpost to the main base ---

    println!("\n=== Scenario 4: Merging the outpost ===\n");
    network.policy_mut().link(battery, solar);
    let moved = network.merge_grids(main_grid, outpost_grid, &mut buildings)?;
    println!(
        "Moved {moved} devices; lamp is on {:?}, {} grid(s) registered",
        network.is_plugged_in(outpost_lamp),
        network.len()
    );
    let events = network.tick(&mut buildings);
    for event in &events {
        println!("  Event: {event:?}");
    }
    log_events(&events);

    println!("\nPower grid demo complete.");
    Ok(())
}
