//! The processing engine: owns every structure and the shape store, and
//! advances them one tick at a time.
//!
//! # Architecture
//!
//! The `Engine` owns:
//! - Structures in a `SlotMap`, plus their insertion order (the tick order)
//! - The [`ShapeStore`] with its derivation cache
//! - A [`SimClock`] (tick counter, `now`, `delta`)
//! - The base-rate lookup, an [`EventBus`] and the [`EngineConfig`]
//!
//! Signal links and the goal sink belong to the caller and are passed to
//! every [`Engine::step`].
//!
//! # Per-structure tick
//!
//! Each structure runs the same loop:
//! 1. **Admission** -- if the pending inputs satisfy the requirement, start a
//!    charge (or, for immediate structures, eject pending items directly).
//! 2. **Timer** -- advance the front charge. The tick's elapsed time is spent
//!    once; later charges in the same tick only get the carried overshoot.
//! 3. **Resolve** -- an elapsed charge without outputs runs its handler once.
//! 4. **Drain** -- eject outputs by slot policy. A fully drained charge is
//!    popped and the loop repeats; a blocked one ends the structure's tick.

use slotmap::SlotMap;
use tracing::{debug, trace};

use crate::config::{BaseRates, EngineConfig};
use crate::definitions::ShapeStore;
use crate::event::{Event, EventBus, EventKind, Listener};
use crate::fixed::{Fixed64, Ticks, period_of};
use crate::handlers::{HandlerEnv, process_charge};
use crate::id::{SignalLinkId, StructureId};
use crate::item::Item;
use crate::ports::{Ejector, PortLayout};
use crate::processor::{
    ChargeMode, ConfigError, MAX_QUEUED_CHARGES, PendingInput, ProcessorConfig, ProducedItem,
};
use crate::query::StructureSnapshot;
use crate::reader::ReaderOutputs;
use crate::signal::{GoalSink, PIN_COUNT, SignalNetwork};
use crate::sim::{SimClock, StateHash};
use crate::structure::{Extension, Structure};

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The processing engine.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    rates: Box<dyn BaseRates>,
    clock: SimClock,
    structures: SlotMap<StructureId, Structure>,
    /// Tick order: insertion order of live structures.
    order: Vec<StructureId>,
    shapes: ShapeStore,
    pub event_bus: EventBus,
}

impl Engine {
    /// Engine whose base rates come from `config.speeds`.
    pub fn new(config: EngineConfig) -> Self {
        let rates = Box::new(config.speeds.clone());
        Self::with_rates(config, rates)
    }

    /// Engine with an external base-rate lookup.
    pub fn with_rates(config: EngineConfig, rates: Box<dyn BaseRates>) -> Self {
        Self {
            event_bus: EventBus::new(config.event_capacity),
            config,
            rates,
            clock: SimClock::new(),
            structures: SlotMap::with_key(),
            order: Vec::new(),
            shapes: ShapeStore::new(),
        }
    }

    pub fn set_rates(&mut self, rates: Box<dyn BaseRates>) {
        self.rates = rates;
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn tick(&self) -> Ticks {
        self.clock.tick()
    }

    pub fn shapes(&self) -> &ShapeStore {
        &self.shapes
    }

    pub fn shapes_mut(&mut self) -> &mut ShapeStore {
        &mut self.shapes
    }

    // -----------------------------------------------------------------------
    // Structure lifecycle
    // -----------------------------------------------------------------------

    /// Place a structure. Invalid configurations are rejected.
    pub fn add_structure(
        &mut self,
        config: ProcessorConfig,
        ports: PortLayout,
    ) -> Result<StructureId, ConfigError> {
        let kind = config.kind;
        let structure = Structure::new(config, ports)?;
        let id = self.structures.insert(structure);
        self.order.push(id);
        debug!(?id, ?kind, "structure added");
        self.event_bus.emit(Event::StructureAdded {
            structure: id,
            kind,
            tick: self.clock.tick(),
        });
        Ok(id)
    }

    /// Remove a structure, discarding its pending inputs, charges and held
    /// outputs.
    pub fn remove_structure(&mut self, id: StructureId) -> Option<Structure> {
        let structure = self.structures.remove(id)?;
        self.order.retain(|&other| other != id);
        debug!(
            ?id,
            kind = ?structure.kind(),
            charges = structure.state().charges().len(),
            "structure removed"
        );
        self.event_bus.emit(Event::StructureRemoved {
            structure: id,
            tick: self.clock.tick(),
        });
        Some(structure)
    }

    /// Replace a structure's configuration and ports atomically. On error
    /// the structure is unchanged. Returns items that sat on ejector slots
    /// which no longer exist.
    pub fn reconfigure(
        &mut self,
        id: StructureId,
        config: ProcessorConfig,
        ports: PortLayout,
    ) -> Result<Vec<Item>, ConfigError> {
        let structure = self
            .structures
            .get_mut(id)
            .ok_or(ConfigError::StructureNotFound)?;
        let kind = config.kind;
        let displaced = structure.reconfigure(config, ports)?;
        debug!(?id, ?kind, displaced = displaced.len(), "structure reconfigured");
        self.event_bus.emit(Event::StructureReconfigured {
            structure: id,
            kind,
            tick: self.clock.tick(),
        });
        Ok(displaced)
    }

    /// Link pin `pin` of a wired structure to a signal link, or unlink it.
    pub fn set_pin(
        &mut self,
        id: StructureId,
        pin: usize,
        link: Option<SignalLinkId>,
    ) -> Result<(), ConfigError> {
        if pin >= PIN_COUNT {
            return Err(ConfigError::PinOutOfRange(pin));
        }
        let structure = self
            .structures
            .get_mut(id)
            .ok_or(ConfigError::StructureNotFound)?;
        let kind = structure.kind();
        let pins = structure
            .pins_mut()
            .ok_or(ConfigError::NotWired { kind })?;
        pins[pin] = link;
        Ok(())
    }

    /// Drop every structure, the shape store and the derivation cache, and
    /// rewind the clock. Shape handles issued before are invalid afterwards.
    pub fn reset(&mut self) {
        debug!(
            structures = self.structures.len(),
            shapes = self.shapes.len(),
            "engine reset"
        );
        self.structures.clear();
        self.order.clear();
        self.shapes.clear();
        self.clock = SimClock::new();
        self.event_bus.clear_all();
    }

    pub fn structure(&self, id: StructureId) -> Option<&Structure> {
        self.structures.get(id)
    }

    pub fn structure_count(&self) -> usize {
        self.structures.len()
    }

    /// Live structures in tick order.
    pub fn structure_ids(&self) -> &[StructureId] {
        &self.order
    }

    // -----------------------------------------------------------------------
    // Item exchange
    // -----------------------------------------------------------------------

    /// Offer an item to a structure's acceptor slot. Returns false when the
    /// structure refuses it; the caller keeps the item.
    pub fn accept_item(
        &mut self,
        id: StructureId,
        slot: usize,
        item: Item,
        signals: &dyn SignalNetwork,
    ) -> bool {
        match self.structures.get_mut(id) {
            Some(structure) => structure.try_accept(slot, item, signals),
            None => false,
        }
    }

    /// The item waiting on an ejector slot, without removing it.
    pub fn peek_output(&self, id: StructureId, slot: usize) -> Option<&Item> {
        self.structures.get(id)?.ejector.held(slot)
    }

    /// Take the item waiting on an ejector slot.
    pub fn take_output(&mut self, id: StructureId, slot: usize) -> Option<Item> {
        self.structures.get_mut(id)?.ejector.take(slot)
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    pub fn suppress_event(&mut self, kind: EventKind) {
        self.event_bus.suppress(kind);
    }

    pub fn on_event(&mut self, kind: EventKind, listener: Listener) {
        self.event_bus.on(kind, listener);
    }

    // -----------------------------------------------------------------------
    // Stepping
    // -----------------------------------------------------------------------

    /// Advance the clock by `delta` seconds and tick every structure once,
    /// in insertion order. Buffered events are delivered at the end.
    pub fn step(&mut self, delta: Fixed64, signals: &dyn SignalNetwork, goals: &mut dyn GoalSink) {
        self.clock.advance(delta);
        let delta = self.clock.delta();
        let mut env = HandlerEnv {
            shapes: &mut self.shapes,
            goals,
            events: &mut self.event_bus,
            signals,
            reader_config: &self.config.reader,
            now: self.clock.now(),
            tick: self.clock.tick(),
        };
        for &id in &self.order {
            let Some(structure) = self.structures.get_mut(id) else {
                continue;
            };
            let speed = self
                .rates
                .base_speed(structure.kind())
                .saturating_mul(structure.config.speed_multiplier);
            tick_structure(&mut env, id, structure, delta, speed);
        }
        self.event_bus.deliver();
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn reader_outputs(&self, id: StructureId) -> Option<ReaderOutputs> {
        self.structures.get(id)?.reader_outputs()
    }

    pub fn snapshot(&self, id: StructureId) -> Option<StructureSnapshot> {
        let structure = self.structures.get(id)?;
        let state = structure.state();
        Some(StructureSnapshot {
            id,
            kind: structure.kind(),
            pending: state.pending().len(),
            charges: state.charges().len(),
            progress: state
                .charges()
                .front()
                .map_or(Fixed64::ZERO, |charge| charge.progress()),
            held_outputs: structure.ejector.held_count(),
            last_produced: state.last_produced(),
            reader: structure.reader_outputs(),
        })
    }

    /// Snapshots of every structure in tick order.
    pub fn snapshot_all(&self) -> Vec<StructureSnapshot> {
        self.order.iter().filter_map(|&id| self.snapshot(id)).collect()
    }

    /// Deterministic hash of processing state, for comparing runs.
    pub fn state_hash(&self) -> u64 {
        let mut hash = StateHash::new();
        hash.write_u64(self.clock.tick());
        hash.write_fixed64(self.clock.now());
        for &id in &self.order {
            let Some(structure) = self.structures.get(id) else {
                continue;
            };
            let state = structure.state();
            hash.write_u64(state.pending().len() as u64);
            hash.write_fixed64(state.bonus_time());
            for charge in state.charges() {
                hash.write_fixed64(charge.remaining);
                hash.write_u64(charge.outputs.as_ref().map_or(0, |o| o.len() as u64 + 1));
            }
            hash.write_u64(structure.ejector.held_count() as u64);
        }
        hash.finish()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Per-structure tick
// ---------------------------------------------------------------------------

fn tick_structure(
    env: &mut HandlerEnv<'_>,
    id: StructureId,
    structure: &mut Structure,
    delta: Fixed64,
    speed: Fixed64,
) {
    let mut elapsed_spent = false;
    let mut blocked = false;

    loop {
        if structure.can_process(env.shapes, env.signals) {
            match structure.config.mode {
                ChargeMode::Timed => start_charge(env, id, structure, speed),
                ChargeMode::Immediate => {
                    eject_pending(&mut structure.ejector, structure.state.pending_mut())
                }
            }
        }
        if blocked {
            break;
        }

        if structure.state.front_is_running() {
            let elapsed = if elapsed_spent { Fixed64::ZERO } else { delta };
            elapsed_spent = true;
            if !structure.state.advance_front(elapsed) {
                break;
            }
        }
        let Some(front) = structure.state.charges().front() else {
            break;
        };

        if !front.is_resolved() {
            let inputs = front.inputs.clone();
            let produced = process_charge(env, id, structure, &inputs);
            record_produced(env, id, structure, &produced);
            if let Some(charge) = structure.state.front_charge_mut() {
                charge.outputs = Some(produced);
            }
        }

        let drained = match structure.state.front_charge_mut() {
            Some(charge) => {
                let outputs = charge.outputs.get_or_insert_with(Vec::new);
                let queued = outputs.len();
                let drained = drain_outputs(outputs, &mut structure.ejector);
                if outputs.len() < queued {
                    trace!(
                        ?id,
                        ejected = queued - outputs.len(),
                        remaining = outputs.len(),
                        "outputs ejected"
                    );
                }
                drained
            }
            None => break,
        };
        if drained {
            structure.state.pop_charge();
            trace!(?id, "charge completed");
            env.events.emit(Event::ChargeCompleted {
                structure: id,
                tick: env.tick,
            });
        } else {
            // One more admission pass, then stop: later charges wait behind
            // the blocked one.
            blocked = true;
        }
    }

    if let Extension::Reader(telemetry) = &mut structure.extension {
        let in_flight = !structure.state.charges().is_empty();
        telemetry.update(env.now, in_flight, env.reader_config);
    }
}

fn start_charge(env: &mut HandlerEnv<'_>, id: StructureId, structure: &mut Structure, speed: Fixed64) {
    if structure.state.charges().len() >= MAX_QUEUED_CHARGES {
        return;
    }
    let kind = structure.kind();
    let Some(duration) = period_of(speed) else {
        panic!("{kind:?} speed {speed} has no representable charge duration");
    };
    let inputs = structure.state.pending().len();
    if structure.state.start_charge(duration) {
        trace!(?id, ?kind, inputs, ?duration, "charge started");
        env.events.emit(Event::ChargeStarted {
            structure: id,
            inputs,
            tick: env.tick,
        });
    }
}

fn record_produced(
    env: &mut HandlerEnv<'_>,
    id: StructureId,
    structure: &mut Structure,
    produced: &[ProducedItem],
) {
    for output in produced {
        structure.state.last_produced = Some(output.item);
        if !output.untracked {
            env.events.emit(Event::ItemProduced {
                structure: id,
                item: output.item,
                tick: env.tick,
            });
        }
    }
    trace!(?id, outputs = produced.len(), "charge resolved");
}

/// Eject as many outputs as their policies allow, preserving the order of
/// the rest. Returns true when nothing is left.
fn drain_outputs(outputs: &mut Vec<ProducedItem>, ejector: &mut Ejector) -> bool {
    let mut index = 0;
    while index < outputs.len() {
        let output = outputs[index];
        if ejector.eject_with_policy(output.policy, output.item).is_some() {
            outputs.remove(index);
        } else {
            index += 1;
        }
    }
    outputs.is_empty()
}

/// Immediate mode: each pending item leaves on the ejector slot matching its
/// source slot, as soon as that slot is free.
fn eject_pending(ejector: &mut Ejector, pending: &mut Vec<PendingInput>) {
    pending.retain(|input| !ejector.try_eject(input.source_slot, input.item));
}

// ===========================================================================
// Tests
// ===========================================================================
