//! Read-only snapshots of structure state.
//!
//! Snapshot types are owned copies; they hold no references into engine
//! storage and can be kept across ticks.

use crate::fixed::Fixed64;
use crate::id::StructureId;
use crate::item::Item;
use crate::processor::ProcessorKind;
use crate::reader::ReaderOutputs;

/// An aggregated view of a single structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureSnapshot {
    pub id: StructureId,
    pub kind: ProcessorKind,
    /// Items accepted but not yet consumed by a charge.
    pub pending: usize,
    /// Charges queued, resolved or not.
    pub charges: usize,
    /// Timer progress of the front charge as a 0..1 fraction, 0 when idle.
    pub progress: Fixed64,
    /// Items sitting on ejector slots waiting to be taken.
    pub held_outputs: usize,
    pub last_produced: Option<Item>,
    /// Present for readers only.
    pub reader: Option<ReaderOutputs>,
}
