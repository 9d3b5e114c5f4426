//! Shapeworks Core -- the item-processing engine of a shape factory game.
//!
//! This crate provides the shape value algebra with its derivation cache,
//! the processing structures (cutters, rotaters, stackers, painters, hubs,
//! readers, ...) with their charge pipeline, throughput telemetry, events,
//! and the deterministic fixed-point time every simulation depends on.
//!
//! # Tick Pipeline
//!
//! Each call to [`engine::Engine::step`] advances the clock once and then
//! visits every structure in insertion order:
//!
//! 1. **Admission** -- Pending inputs that satisfy the structure's
//!    requirement become a charge (at most two queued).
//! 2. **Timer** -- The front charge counts down; overshoot carries over.
//! 3. **Resolve** -- An elapsed charge runs its kind's handler exactly once.
//! 4. **Drain** -- Outputs are ejected by slot policy; a blocked output
//!    stalls the structure without losing anything.
//! 5. **Telemetry** -- Readers recompute their throughput.
//!
//! Buffered events are delivered to listeners at the end of the step.
//!
//! # Key Types
//!
//! - [`engine::Engine`] -- Owns structures, the shape store and the clock.
//! - [`definitions::ShapeStore`] -- Interned shapes and memoized derivations.
//! - [`shape::ShapeDefinition`] -- Up to four layers of four quadrants.
//! - [`processor::ProcessorKind`] -- The eighteen processing behaviours.
//! - [`ports::PortLayout`] -- Acceptor and ejector slots of a structure.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for deterministic time.
//! - [`event::EventBus`] -- Buffered event delivery.

pub mod color;
pub mod config;
#[cfg(feature = "data-loader")]
pub mod data_loader;
pub mod definitions;
pub mod engine;
pub mod event;
pub mod fixed;
mod handlers;
pub mod id;
pub mod item;
pub mod ports;
pub mod processor;
pub mod query;
pub mod reader;
pub mod shape;
pub mod signal;
pub mod sim;
pub mod structure;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
