//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use std::collections::BTreeMap;

use crate::config::{EngineConfig, ProcessorSpeeds};
use crate::engine::Engine;
use crate::fixed::Fixed64;
use crate::id::{ShapeId, SignalLinkId, StructureId};
use crate::item::{Item, ItemKind};
use crate::ports::{Direction, PortLayout, TileOffset};
use crate::processor::{ProcessorConfig, ProcessorKind};
use crate::shape::ShapeDefinition;
use crate::signal::{GoalSink, SignalNetwork};

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Collaborators
// ===========================================================================

/// A signal network with fixed link values.
#[derive(Debug, Clone, Default)]
pub struct StaticSignals {
    values: BTreeMap<SignalLinkId, Item>,
}

impl StaticSignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, link: u32, value: Item) {
        self.values.insert(SignalLinkId(link), value);
    }

    pub fn with(mut self, link: u32, value: Item) -> Self {
        self.set(link, value);
        self
    }

    /// Links `0..4` carrying the given booleans.
    pub fn pins(on: [bool; 4]) -> Self {
        let mut signals = Self::new();
        for (link, value) in on.into_iter().enumerate() {
            signals.set(link as u32, Item::Boolean(value));
        }
        signals
    }

    pub fn clear(&mut self, link: u32) {
        self.values.remove(&SignalLinkId(link));
    }
}

impl SignalNetwork for StaticSignals {
    fn value(&self, link: SignalLinkId) -> Option<Item> {
        self.values.get(&link).copied()
    }
}

/// A goal sink that remembers every delivered shape and its key.
#[derive(Debug, Clone, Default)]
pub struct RecordingGoals {
    pub delivered: Vec<ShapeId>,
    pub keys: Vec<String>,
}

impl GoalSink for RecordingGoals {
    fn shape_delivered(&mut self, shape: ShapeId, definition: &ShapeDefinition) {
        self.delivered.push(shape);
        self.keys.push(definition.short_key());
    }
}

// ===========================================================================
// Layouts
// ===========================================================================

/// Single-tile layout with unfiltered acceptors from the bottom and ejectors
/// towards the top.
pub fn layout(acceptors: usize, ejectors: usize) -> PortLayout {
    let mut ports = PortLayout::new();
    for _ in 0..acceptors {
        ports = ports.with_acceptor(TileOffset::ORIGIN, &[Direction::Bottom]);
    }
    for _ in 0..ejectors {
        ports = ports.with_ejector(TileOffset::ORIGIN, Direction::Top);
    }
    ports
}

/// The smallest layout a kind accepts. Color inputs of painters and the
/// mixer are filtered to colors, shape inputs to shapes.
pub fn default_layout(kind: ProcessorKind) -> PortLayout {
    let (acceptors, ejectors) = kind.minimum_slots();
    let filters: Vec<Option<ItemKind>> = match kind {
        ProcessorKind::Painter => vec![Some(ItemKind::Shape), Some(ItemKind::Color)],
        ProcessorKind::PainterDouble => vec![
            Some(ItemKind::Shape),
            Some(ItemKind::Shape),
            Some(ItemKind::Color),
        ],
        ProcessorKind::PainterQuad => {
            let mut filters = vec![Some(ItemKind::Shape)];
            filters.extend([Some(ItemKind::Color); 4]);
            filters
        }
        ProcessorKind::Mixer => vec![Some(ItemKind::Color); 2],
        ProcessorKind::Hub => vec![Some(ItemKind::Shape)],
        _ => vec![None; acceptors],
    };
    let mut ports = PortLayout::new();
    for filter in filters {
        ports = match filter {
            Some(kind) => ports.with_filtered_acceptor(TileOffset::ORIGIN, &[Direction::Bottom], kind),
            None => ports.with_acceptor(TileOffset::ORIGIN, &[Direction::Bottom]),
        };
    }
    for _ in 0..ejectors {
        ports = ports.with_ejector(TileOffset::ORIGIN, Direction::Top);
    }
    ports
}

// ===========================================================================
// Engine helpers
// ===========================================================================

/// An engine where every kind runs `speed` charges per second.
pub fn engine_with_uniform_speed(speed: f64) -> Engine {
    Engine::new(EngineConfig {
        speeds: ProcessorSpeeds::uniform(fixed(speed)),
        ..EngineConfig::default()
    })
}

/// Place a structure of `kind` with its default configuration and layout.
pub fn add_default(engine: &mut Engine, kind: ProcessorKind) -> StructureId {
    engine
        .add_structure(ProcessorConfig::new(kind), default_layout(kind))
        .expect("default configuration is valid")
}

/// Intern `key` and wrap it as an item.
pub fn shape_item(engine: &mut Engine, key: &str) -> Item {
    let id = engine
        .shapes_mut()
        .from_short_key(key)
        .expect("valid shape key");
    Item::Shape(id)
}

/// Short key of a shape item.
pub fn shape_key(engine: &Engine, item: Item) -> String {
    let id = item.expect_shape("shape_key");
    engine.shapes().short_key(id).to_string()
}

/// Take every item held on the structure's ejector slots, with the slot.
pub fn drain_outputs(engine: &mut Engine, id: StructureId) -> Vec<(usize, Item)> {
    let slots = engine
        .structure(id)
        .map_or(0, |s| s.ejector().slot_count());
    (0..slots)
        .filter_map(|slot| engine.take_output(id, slot).map(|item| (slot, item)))
        .collect()
}

/// Step `ticks` times by `dt` seconds.
pub fn run_ticks(
    engine: &mut Engine,
    ticks: usize,
    dt: f64,
    signals: &dyn SignalNetwork,
    goals: &mut dyn GoalSink,
) {
    for _ in 0..ticks {
        engine.step(fixed(dt), signals, goals);
    }
}
