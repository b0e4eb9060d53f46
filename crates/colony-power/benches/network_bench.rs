//! Criterion benchmarks for the power network.
//!
//! Two benchmark groups:
//! - `many_small_grids`: 500 unwired grids of 8 devices each
//! - `one_large_grid`: a single grid of 5000 devices with storage

use colony_core::fixed::Fixed64;
use colony_core::id::DeviceId;
use colony_power::*;
use criterion::{Criterion, criterion_group, criterion_main};
use slotmap::SlotMap;

#[derive(Debug, Default)]
struct Building {
    production: Fixed64,
    consumption: Fixed64,
    storage: Option<PowerStorage>,
}

impl PluggableDevice for Building {
    fn production(&self) -> Fixed64 {
        self.production
    }

    fn consumption(&self) -> Fixed64 {
        self.consumption
    }

    fn storage_mut(&mut self) -> Option<&mut PowerStorage> {
        self.storage.as_mut()
    }
}

fn building(i: usize) -> Building {
    match i % 4 {
        0 => Building {
            production: Fixed64::from_num(40),
            ..Default::default()
        },
        1 => Building {
            storage: Some(PowerStorage::empty(
                Fixed64::from_num(500),
                Fixed64::from_num(25),
            )),
            ..Default::default()
        },
        _ => Building {
            consumption: Fixed64::from_num(25),
            ..Default::default()
        },
    }
}

fn bench_many_small_grids(c: &mut Criterion) {
    let mut store: SlotMap<DeviceId, Building> = SlotMap::with_key();
    let mut network = PowerNetwork::new();
    for _ in 0..500 {
        let grid = network.create_grid();
        for i in 0..8 {
            let id = store.insert(building(i));
            network.plug_into(id, grid, &mut store).unwrap();
        }
    }

    c.bench_function("many_small_grids", |b| {
        b.iter(|| network.tick(&mut store));
    });
}

fn bench_one_large_grid(c: &mut Criterion) {
    let mut store: SlotMap<DeviceId, Building> = SlotMap::with_key();
    let mut network = PowerNetwork::new();
    for i in 0..5000 {
        let id = store.insert(building(i));
        network.plug_in(id, &mut store).unwrap();
    }

    c.bench_function("one_large_grid", |b| {
        b.iter(|| network.tick(&mut store));
    });
}

criterion_group!(benches, bench_many_small_grids, bench_one_large_grid);
criterion_main!(benches);
