//! Colony Core -- shared simulation primitives for the colony utility systems.
//!
//! This crate holds the small set of types every simulation subsystem agrees
//! on: deterministic fixed-point arithmetic, typed identifiers, and the
//! fixed-interval tick clock that turns per-frame elapsed time into discrete
//! simulation ticks.
//!
//! # Key Types
//!
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for deterministic math.
//! - [`id::DeviceId`] -- Identifies a pluggable device owned by the simulation.
//! - [`id::GridId`] -- Persistent identifier of a utility grid.
//! - [`clock::TickClock`] -- Accumulates frame time and fires once per interval.

pub mod clock;
pub mod fixed;
pub mod id;
