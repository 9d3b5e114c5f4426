//! A placed processing structure: configuration, ports, processing state
//! and the kind-specific extension.

use crate::definitions::ShapeStore;
use crate::item::Item;
use crate::ports::{Acceptor, Ejector, PortLayout};
use crate::processor::{
    ChargeMode, ConfigError, ProcessorConfig, ProcessorKind, ProcessorState, Requirement,
};
use crate::reader::{ReaderOutputs, ReaderTelemetry};
use crate::signal::{PIN_COUNT, PinLinks, SignalNetwork, pin_enabled};

/// Kind-specific structure data. Each variant owns only what its kinds use.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Extension {
    Plain,
    /// Four signal pins (laser cutter, quad painter).
    Wired { pins: PinLinks },
    /// Throughput telemetry (reader).
    Reader(ReaderTelemetry),
}

impl Extension {
    pub fn for_kind(kind: ProcessorKind) -> Self {
        if kind.is_wired() {
            Extension::Wired {
                pins: [None; PIN_COUNT],
            }
        } else if kind == ProcessorKind::Reader {
            Extension::Reader(ReaderTelemetry::new())
        } else {
            Extension::Plain
        }
    }

    fn same_variant(&self, other: &Extension) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// A processing structure owned by the engine.
#[derive(Debug, Clone)]
pub struct Structure {
    pub(crate) config: ProcessorConfig,
    pub(crate) state: ProcessorState,
    pub(crate) acceptor: Acceptor,
    pub(crate) ejector: Ejector,
    pub(crate) extension: Extension,
}

impl Structure {
    pub(crate) fn new(config: ProcessorConfig, ports: PortLayout) -> Result<Self, ConfigError> {
        config.validate(&ports)?;
        Ok(Self {
            extension: Extension::for_kind(config.kind),
            config,
            state: ProcessorState::new(),
            acceptor: Acceptor::new(ports.acceptors),
            ejector: Ejector::new(ports.ejectors),
        })
    }

    /// Swap configuration and ports in one step. Pending inputs and charges
    /// carry over; the extension is kept when the kind still uses the same
    /// variant. Returns items displaced from removed ejector slots.
    pub(crate) fn reconfigure(
        &mut self,
        config: ProcessorConfig,
        ports: PortLayout,
    ) -> Result<Vec<Item>, ConfigError> {
        config.validate(&ports)?;
        let extension = Extension::for_kind(config.kind);
        if !self.extension.same_variant(&extension) {
            self.extension = extension;
        }
        self.config = config;
        self.acceptor = Acceptor::new(ports.acceptors);
        let mut displaced = self.ejector.set_slots(ports.ejectors);
        let immediate = self.config.mode == ChargeMode::Immediate;
        displaced.extend(self.state.take_unplaceable(self.ejector.slot_count(), immediate));
        Ok(displaced)
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn kind(&self) -> ProcessorKind {
        self.config.kind
    }

    pub fn state(&self) -> &ProcessorState {
        &self.state
    }

    pub fn acceptor(&self) -> &Acceptor {
        &self.acceptor
    }

    pub fn ejector(&self) -> &Ejector {
        &self.ejector
    }

    pub fn extension(&self) -> &Extension {
        &self.extension
    }

    pub fn pins(&self) -> Option<&PinLinks> {
        match &self.extension {
            Extension::Wired { pins } => Some(pins),
            _ => None,
        }
    }

    pub(crate) fn pins_mut(&mut self) -> Option<&mut PinLinks> {
        match &mut self.extension {
            Extension::Wired { pins } => Some(pins),
            _ => None,
        }
    }

    pub fn reader_outputs(&self) -> Option<ReaderOutputs> {
        match &self.extension {
            Extension::Reader(telemetry) => Some(telemetry.outputs()),
            _ => None,
        }
    }

    /// Which pins are currently enabled. Unwired structures report none.
    pub fn enabled_pins(&self, signals: &dyn SignalNetwork) -> [bool; PIN_COUNT] {
        match self.pins() {
            Some(pins) => pins.map(|link| pin_enabled(signals, link)),
            None => [false; PIN_COUNT],
        }
    }

    // -----------------------------------------------------------------------
    // Admission
    // -----------------------------------------------------------------------

    /// Whether an item may enter on `slot`, before the one-per-slot check.
    pub fn check_requirements(&self, slot: usize, signals: &dyn SignalNetwork) -> bool {
        match self.config.requirement {
            Requirement::PainterQuad if slot > 0 => self.enabled_pins(signals)[slot - 1],
            _ => true,
        }
    }

    /// Offer an item to the acceptor. Returns false if the slot filter, the
    /// requirement check or the pending-input rule refuses it.
    pub fn try_accept(&mut self, slot: usize, item: Item, signals: &dyn SignalNetwork) -> bool {
        if !self.acceptor.accepts(slot, &item) || !self.check_requirements(slot, signals) {
            return false;
        }
        let pooling = self.config.kind.is_pooling();
        self.state.try_take_item(item, slot, pooling)
    }

    /// Whether the pending inputs are enough to start work.
    pub fn can_process(&self, shapes: &ShapeStore, signals: &dyn SignalNetwork) -> bool {
        let pending = self.state.pending();
        let enough = pending.len() >= self.config.inputs_per_charge;
        match self.config.requirement {
            Requirement::None | Requirement::ShapeMerger => enough,
            Requirement::SmartStacker => enough && self.state.pending_on_slot(0).is_some(),
            Requirement::PainterQuad => self.quad_painter_ready(shapes, signals),
        }
    }

    fn quad_painter_ready(&self, shapes: &ShapeStore, signals: &dyn SignalNetwork) -> bool {
        let Some(item) = self.state.pending_on_slot(0) else {
            return false;
        };
        let shape = shapes.definition(item.expect_shape("quad painter slot 0"));
        let enabled = self.enabled_pins(signals);
        if !enabled.iter().any(|&on| on) {
            return false;
        }
        (0..PIN_COUNT).all(|quadrant| {
            !enabled[quadrant]
                || self.state.pending_on_slot(quadrant + 1).is_some()
                || !shape.occupies_quadrant(quadrant)
        })
    }
}
