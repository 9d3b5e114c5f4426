//! Processor kinds, placement-time configuration and the per-structure
//! charge state machine.
//!
//! A structure collects [`PendingInput`]s until its [`Requirement`] is met,
//! then moves them into a [`Charge`]. At most [`MAX_QUEUED_CHARGES`] charges
//! may be queued; only the front one runs its timer.

use std::collections::VecDeque;

use crate::fixed::Fixed64;
use crate::item::Item;
use crate::ports::{Direction, PortLayout, SlotPolicy};

/// Maximum number of unresolved charges a structure may queue.
pub const MAX_QUEUED_CHARGES: usize = 2;

// ---------------------------------------------------------------------------
// Processor kinds
// ---------------------------------------------------------------------------

/// What a structure does with a charge. Dispatch is an exhaustive match in
/// [`crate::handlers`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum ProcessorKind {
    Link,
    Balancer,
    Cutter,
    CutterQuad,
    CutterLaser,
    Rotater,
    RotaterCcw,
    Rotater180,
    Stacker,
    SmartStacker,
    ShapeMerger,
    Trash,
    Mixer,
    Painter,
    PainterDouble,
    PainterQuad,
    Hub,
    Reader,
}

impl ProcessorKind {
    pub const ALL: [ProcessorKind; 18] = [
        ProcessorKind::Link,
        ProcessorKind::Balancer,
        ProcessorKind::Cutter,
        ProcessorKind::CutterQuad,
        ProcessorKind::CutterLaser,
        ProcessorKind::Rotater,
        ProcessorKind::RotaterCcw,
        ProcessorKind::Rotater180,
        ProcessorKind::Stacker,
        ProcessorKind::SmartStacker,
        ProcessorKind::ShapeMerger,
        ProcessorKind::Trash,
        ProcessorKind::Mixer,
        ProcessorKind::Painter,
        ProcessorKind::PainterDouble,
        ProcessorKind::PainterQuad,
        ProcessorKind::Hub,
        ProcessorKind::Reader,
    ];

    /// Stable snake_case name, used by the data loader.
    pub fn name(self) -> &'static str {
        match self {
            ProcessorKind::Link => "link",
            ProcessorKind::Balancer => "balancer",
            ProcessorKind::Cutter => "cutter",
            ProcessorKind::CutterQuad => "cutter_quad",
            ProcessorKind::CutterLaser => "cutter_laser",
            ProcessorKind::Rotater => "rotater",
            ProcessorKind::RotaterCcw => "rotater_ccw",
            ProcessorKind::Rotater180 => "rotater_180",
            ProcessorKind::Stacker => "stacker",
            ProcessorKind::SmartStacker => "smart_stacker",
            ProcessorKind::ShapeMerger => "shape_merger",
            ProcessorKind::Trash => "trash",
            ProcessorKind::Mixer => "mixer",
            ProcessorKind::Painter => "painter",
            ProcessorKind::PainterDouble => "painter_double",
            ProcessorKind::PainterQuad => "painter_quad",
            ProcessorKind::Hub => "hub",
            ProcessorKind::Reader => "reader",
        }
    }

    pub fn from_name(name: &str) -> Option<ProcessorKind> {
        ProcessorKind::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Pooling kinds take any number of items per source slot.
    pub fn is_pooling(self) -> bool {
        matches!(self, ProcessorKind::Hub | ProcessorKind::Trash)
    }

    /// Kinds whose behavior reads the four signal pins.
    pub fn is_wired(self) -> bool {
        matches!(self, ProcessorKind::CutterLaser | ProcessorKind::PainterQuad)
    }

    /// Default number of pending inputs that starts a charge.
    pub fn default_inputs_per_charge(self) -> usize {
        match self {
            ProcessorKind::Stacker
            | ProcessorKind::SmartStacker
            | ProcessorKind::ShapeMerger
            | ProcessorKind::Mixer
            | ProcessorKind::Painter => 2,
            ProcessorKind::PainterDouble => 3,
            _ => 1,
        }
    }

    pub fn default_requirement(self) -> Requirement {
        match self {
            ProcessorKind::ShapeMerger => Requirement::ShapeMerger,
            ProcessorKind::SmartStacker => Requirement::SmartStacker,
            ProcessorKind::PainterQuad => Requirement::PainterQuad,
            _ => Requirement::None,
        }
    }

    /// Minimum `(acceptor, ejector)` slot counts the handler relies on.
    pub fn minimum_slots(self) -> (usize, usize) {
        match self {
            ProcessorKind::Link | ProcessorKind::Balancer | ProcessorKind::Reader => (1, 1),
            ProcessorKind::Cutter | ProcessorKind::CutterLaser => (1, 2),
            ProcessorKind::CutterQuad => (1, 4),
            ProcessorKind::Rotater | ProcessorKind::RotaterCcw | ProcessorKind::Rotater180 => {
                (1, 1)
            }
            ProcessorKind::Stacker
            | ProcessorKind::SmartStacker
            | ProcessorKind::ShapeMerger
            | ProcessorKind::Mixer
            | ProcessorKind::Painter => (2, 1),
            ProcessorKind::PainterDouble => (3, 1),
            ProcessorKind::PainterQuad => (5, 1),
            ProcessorKind::Trash | ProcessorKind::Hub => (1, 0),
        }
    }
}

/// Admission rule applied before a charge may start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Requirement {
    /// Start once enough inputs are pending.
    None,
    /// Same rule as `None`; kept distinct so it can diverge per kind.
    ShapeMerger,
    /// The main shape on slot 0 must be present as well.
    SmartStacker,
    /// Shape on slot 0 and a color for every enabled pin whose quadrant the
    /// shape occupies.
    PainterQuad,
}

impl Requirement {
    fn allowed_for(self, kind: ProcessorKind) -> bool {
        match self {
            Requirement::None => true,
            Requirement::ShapeMerger => kind == ProcessorKind::ShapeMerger,
            Requirement::SmartStacker => kind == ProcessorKind::SmartStacker,
            Requirement::PainterQuad => kind == ProcessorKind::PainterQuad,
        }
    }
}

/// Whether work goes through a timed charge or straight to the ejector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ChargeMode {
    Timed,
    /// Emit each pending item on the ejector slot with its source slot's
    /// index, without a timer.
    Immediate,
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Errors from validating a structure configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{kind:?} needs at least one input per charge")]
    ZeroInputsPerCharge { kind: ProcessorKind },
    #[error("requirement {requirement:?} cannot be used by {kind:?}")]
    IncompatibleRequirement {
        kind: ProcessorKind,
        requirement: Requirement,
    },
    #[error("{kind:?} needs {acceptors} acceptor and {ejectors} ejector slots")]
    MissingSlots {
        kind: ProcessorKind,
        acceptors: usize,
        ejectors: usize,
    },
    #[error("{kind:?} waits for {inputs} inputs but only has {acceptors} acceptor slots")]
    UnreachableInputCount {
        kind: ProcessorKind,
        inputs: usize,
        acceptors: usize,
    },
    #[error("immediate mode needs an ejector slot for every acceptor slot")]
    ImmediateSlotMismatch,
    #[error("speed multiplier must be positive")]
    NonPositiveSpeed,
    #[error("{kind:?} has no signal pins")]
    NotWired { kind: ProcessorKind },
    #[error("pin index {0} out of range")]
    PinOutOfRange(usize),
    #[error("structure not found")]
    StructureNotFound,
}

/// Placement-time configuration of a processing structure.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProcessorConfig {
    pub kind: ProcessorKind,
    pub requirement: Requirement,
    pub inputs_per_charge: usize,
    pub mode: ChargeMode,
    /// Scales the base speed, e.g. 3 for link entrances.
    pub speed_multiplier: Fixed64,
    /// The way the structure faces.
    pub facing: Direction,
}

impl ProcessorConfig {
    /// Configuration with the kind's default requirement and input count.
    pub fn new(kind: ProcessorKind) -> Self {
        Self {
            kind,
            requirement: kind.default_requirement(),
            inputs_per_charge: kind.default_inputs_per_charge(),
            mode: ChargeMode::Timed,
            speed_multiplier: Fixed64::from_num(1),
            facing: Direction::Top,
        }
    }

    pub fn with_inputs_per_charge(mut self, inputs: usize) -> Self {
        self.inputs_per_charge = inputs;
        self
    }

    pub fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.requirement = requirement;
        self
    }

    pub fn with_speed_multiplier(mut self, multiplier: Fixed64) -> Self {
        self.speed_multiplier = multiplier;
        self
    }

    pub fn facing(mut self, facing: Direction) -> Self {
        self.facing = facing;
        self
    }

    pub fn immediate(mut self) -> Self {
        self.mode = ChargeMode::Immediate;
        self
    }

    /// Check the configuration against the slot layout it will run with.
    pub fn validate(&self, ports: &PortLayout) -> Result<(), ConfigError> {
        let kind = self.kind;
        if self.inputs_per_charge == 0 {
            return Err(ConfigError::ZeroInputsPerCharge { kind });
        }
        if !self.requirement.allowed_for(kind) {
            return Err(ConfigError::IncompatibleRequirement {
                kind,
                requirement: self.requirement,
            });
        }
        if self.speed_multiplier <= Fixed64::ZERO {
            return Err(ConfigError::NonPositiveSpeed);
        }

        let (acceptors, ejectors) = kind.minimum_slots();
        if ports.acceptors.len() < acceptors || ports.ejectors.len() < ejectors {
            return Err(ConfigError::MissingSlots {
                kind,
                acceptors,
                ejectors,
            });
        }
        let counted = self.requirement != Requirement::PainterQuad;
        if counted && !kind.is_pooling() && self.inputs_per_charge > ports.acceptors.len() {
            return Err(ConfigError::UnreachableInputCount {
                kind,
                inputs: self.inputs_per_charge,
                acceptors: ports.acceptors.len(),
            });
        }
        if self.mode == ChargeMode::Immediate && ports.ejectors.len() < ports.acceptors.len() {
            return Err(ConfigError::ImmediateSlotMismatch);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Runtime state
// ---------------------------------------------------------------------------

/// An accepted item waiting to be consumed, with the slot it arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PendingInput {
    pub item: Item,
    pub source_slot: usize,
}

/// One output of a resolved charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProducedItem {
    pub item: Item,
    pub policy: SlotPolicy,
    /// Untracked outputs (pass-through routing) do not raise
    /// [`crate::event::Event::ItemProduced`].
    pub untracked: bool,
}

impl ProducedItem {
    pub fn tracked(item: Item, policy: SlotPolicy) -> Self {
        Self {
            item,
            policy,
            untracked: false,
        }
    }

    pub fn untracked(item: Item, policy: SlotPolicy) -> Self {
        Self {
            item,
            policy,
            untracked: true,
        }
    }
}

/// A unit of work: the inputs it consumed, the time left and, once the timer
/// elapses, the outputs still waiting to be ejected.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Charge {
    pub inputs: Vec<PendingInput>,
    pub remaining: Fixed64,
    pub duration: Fixed64,
    pub outputs: Option<Vec<ProducedItem>>,
}

impl Charge {
    pub fn is_resolved(&self) -> bool {
        self.outputs.is_some()
    }

    /// Fraction of the timer that has elapsed, in `[0, 1]`.
    pub fn progress(&self) -> Fixed64 {
        if self.duration <= Fixed64::ZERO || self.remaining <= Fixed64::ZERO {
            return Fixed64::from_num(1);
        }
        let left = self.remaining.checked_div(self.duration).unwrap_or(Fixed64::ZERO);
        (Fixed64::from_num(1) - left).max(Fixed64::ZERO)
    }
}

/// Per-structure processing state.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProcessorState {
    pending: Vec<PendingInput>,
    charges: VecDeque<Charge>,
    /// Round-robin cursor for balancing handlers.
    pub(crate) next_output_slot: usize,
    /// Timer overshoot carried into the next advance.
    pub(crate) bonus_time: Fixed64,
    pub(crate) last_produced: Option<Item>,
}

impl ProcessorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &[PendingInput] {
        &self.pending
    }

    pub fn charges(&self) -> &VecDeque<Charge> {
        &self.charges
    }

    pub fn last_produced(&self) -> Option<Item> {
        self.last_produced
    }

    pub fn bonus_time(&self) -> Fixed64 {
        self.bonus_time
    }

    /// The pending item that arrived on `slot`, if any.
    pub fn pending_on_slot(&self, slot: usize) -> Option<&Item> {
        slot_item(&self.pending, slot)
    }

    /// Accept `item` from `source_slot` into pending inputs. Non-pooling
    /// processors hold at most one item per source slot.
    pub fn try_take_item(&mut self, item: Item, source_slot: usize, pooling: bool) -> bool {
        if !pooling && self.pending.iter().any(|p| p.source_slot == source_slot) {
            return false;
        }
        self.pending.push(PendingInput { item, source_slot });
        true
    }

    /// Move every pending input into a new charge. Returns false if the
    /// charge queue is full.
    pub(crate) fn start_charge(&mut self, duration: Fixed64) -> bool {
        if self.charges.len() >= MAX_QUEUED_CHARGES {
            return false;
        }
        self.charges.push_back(Charge {
            inputs: std::mem::take(&mut self.pending),
            remaining: duration,
            duration,
            outputs: None,
        });
        true
    }

    /// Whether the front charge exists and its timer is still running.
    pub(crate) fn front_is_running(&self) -> bool {
        self.charges
            .front()
            .is_some_and(|c| c.remaining > Fixed64::ZERO)
    }

    /// Advance the front charge's timer by `elapsed` plus any carried bonus
    /// time. Returns true once the timer has run out. Overshoot is kept as
    /// bonus for the next advance.
    pub(crate) fn advance_front(&mut self, elapsed: Fixed64) -> bool {
        let Some(charge) = self.charges.front_mut() else {
            return false;
        };
        if charge.remaining <= Fixed64::ZERO {
            return true;
        }
        charge.remaining -= elapsed + self.bonus_time;
        self.bonus_time = Fixed64::ZERO;
        if charge.remaining > Fixed64::ZERO {
            return false;
        }
        self.bonus_time = -charge.remaining;
        true
    }

    pub(crate) fn pending_mut(&mut self) -> &mut Vec<PendingInput> {
        &mut self.pending
    }

    pub(crate) fn front_charge_mut(&mut self) -> Option<&mut Charge> {
        self.charges.front_mut()
    }

    pub(crate) fn pop_charge(&mut self) -> Option<Charge> {
        self.charges.pop_front()
    }

    /// Remove every queued item that can no longer leave through an ejector
    /// with `ejector_slots` slots: resolved outputs bound to a missing slot,
    /// and pass-through inputs whose mirrored slot is gone.
    pub(crate) fn take_unplaceable(
        &mut self,
        ejector_slots: usize,
        immediate: bool,
    ) -> Vec<Item> {
        let mut removed = Vec::new();
        for charge in &mut self.charges {
            let Some(outputs) = charge.outputs.as_mut() else {
                continue;
            };
            outputs.retain(|output| {
                let placeable = match output.policy {
                    SlotPolicy::Required(slot) => slot < ejector_slots,
                    SlotPolicy::Preferred(_) | SlotPolicy::Any => ejector_slots > 0,
                };
                if !placeable {
                    removed.push(output.item);
                }
                placeable
            });
        }
        if immediate {
            self.pending.retain(|input| {
                let placeable = input.source_slot < ejector_slots;
                if !placeable {
                    removed.push(input.item);
                }
                placeable
            });
        }
        removed
    }
}

/// The input that arrived on `slot`. When a pooling processor holds several,
/// the latest wins.
pub fn slot_item(inputs: &[PendingInput], slot: usize) -> Option<&Item> {
    inputs
        .iter()
        .rev()
        .find(|p| p.source_slot == slot)
        .map(|p| &p.item)
}
