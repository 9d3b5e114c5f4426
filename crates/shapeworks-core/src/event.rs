//! Typed events with bounded per-kind buffers.
//!
//! Events are recorded while the engine ticks and delivered to listeners in
//! one batch at the end of [`crate::engine::Engine::step`]. Each event kind
//! has its own [`EventBuffer`]; when a buffer is full the oldest event is
//! dropped and counted.
//!
//! Kinds can be suppressed with [`EventBus::suppress`]. Suppressed kinds are
//! never buffered.

use std::collections::VecDeque;

use crate::fixed::Ticks;
use crate::id::{ShapeId, StructureId};
use crate::item::Item;
use crate::processor::ProcessorKind;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A simulation event. All events carry the tick at which they occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // -- Processing --
    ItemProduced {
        structure: StructureId,
        item: Item,
        tick: Ticks,
    },
    ChargeStarted {
        structure: StructureId,
        inputs: usize,
        tick: Ticks,
    },
    ChargeCompleted {
        structure: StructureId,
        tick: Ticks,
    },
    ShapeDelivered {
        structure: StructureId,
        shape: ShapeId,
        tick: Ticks,
    },

    // -- Structures --
    StructureAdded {
        structure: StructureId,
        kind: ProcessorKind,
        tick: Ticks,
    },
    StructureRemoved {
        structure: StructureId,
        tick: Ticks,
    },
    StructureReconfigured {
        structure: StructureId,
        kind: ProcessorKind,
        tick: Ticks,
    },
}

/// Discriminant tag for event types, used for suppression and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ItemProduced,
    ChargeStarted,
    ChargeCompleted,
    ShapeDelivered,
    StructureAdded,
    StructureRemoved,
    StructureReconfigured,
}

const EVENT_KIND_COUNT: usize = 7;

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::ItemProduced { .. } => EventKind::ItemProduced,
            Event::ChargeStarted { .. } => EventKind::ChargeStarted,
            Event::ChargeCompleted { .. } => EventKind::ChargeCompleted,
            Event::ShapeDelivered { .. } => EventKind::ShapeDelivered,
            Event::StructureAdded { .. } => EventKind::StructureAdded,
            Event::StructureRemoved { .. } => EventKind::StructureRemoved,
            Event::StructureReconfigured { .. } => EventKind::StructureReconfigured,
        }
    }

    pub fn tick(&self) -> Ticks {
        match self {
            Event::ItemProduced { tick, .. }
            | Event::ChargeStarted { tick, .. }
            | Event::ChargeCompleted { tick, .. }
            | Event::ShapeDelivered { tick, .. }
            | Event::StructureAdded { tick, .. }
            | Event::StructureRemoved { tick, .. }
            | Event::StructureReconfigured { tick, .. } => *tick,
        }
    }
}

// ---------------------------------------------------------------------------
// EventBuffer
// ---------------------------------------------------------------------------

/// Bounded FIFO of events of one kind.
#[derive(Debug, Clone)]
pub struct EventBuffer {
    events: VecDeque<Event>,
    capacity: usize,
    total_written: u64,
    delivered: u64,
}

impl EventBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
            total_written: 0,
            delivered: 0,
        }
    }

    /// Append an event, dropping the oldest one when full.
    pub fn push(&mut self, event: Event) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
        self.total_written += 1;
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Events lost to overflow since creation.
    pub fn dropped_count(&self) -> u64 {
        self.total_written - self.events.len() as u64 - self.delivered
    }

    /// Oldest first.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Event> {
        self.events.iter()
    }

    pub fn clear(&mut self) {
        self.delivered += self.events.len() as u64;
        self.events.clear();
    }
}

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

/// A listener receives events read-only.
pub type Listener = Box<dyn FnMut(&Event)>;

/// Optional predicate that filters events for a listener.
pub type EventFilter = Box<dyn Fn(&Event) -> bool>;

struct ListenerEntry {
    listener: Listener,
    filter: Option<EventFilter>,
}

impl std::fmt::Debug for ListenerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerEntry")
            .field("filtered", &self.filter.is_some())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// One buffer per event kind, listener lists and suppression flags.
#[derive(Debug)]
pub struct EventBus {
    buffers: [Option<EventBuffer>; EVENT_KIND_COUNT],
    suppressed: [bool; EVENT_KIND_COUNT],
    listeners: [Vec<ListenerEntry>; EVENT_KIND_COUNT],
    default_capacity: usize,
}

impl EventBus {
    pub fn new(default_capacity: usize) -> Self {
        Self {
            buffers: Default::default(),
            suppressed: [false; EVENT_KIND_COUNT],
            listeners: Default::default(),
            default_capacity,
        }
    }

    pub fn suppress(&mut self, kind: EventKind) {
        self.suppressed[kind as usize] = true;
        self.buffers[kind as usize] = None;
    }

    pub fn is_suppressed(&self, kind: EventKind) -> bool {
        self.suppressed[kind as usize]
    }

    /// Record an event for delivery at the end of the tick.
    pub fn emit(&mut self, event: Event) {
        let idx = event.kind() as usize;
        if self.suppressed[idx] {
            return;
        }
        let capacity = self.default_capacity;
        self.buffers[idx]
            .get_or_insert_with(|| EventBuffer::new(capacity))
            .push(event);
    }

    pub fn on(&mut self, kind: EventKind, listener: Listener) {
        self.listeners[kind as usize].push(ListenerEntry {
            listener,
            filter: None,
        });
    }

    pub fn on_filtered(&mut self, kind: EventKind, filter: EventFilter, listener: Listener) {
        self.listeners[kind as usize].push(ListenerEntry {
            listener,
            filter: Some(filter),
        });
    }

    /// Hand every buffered event to the listeners of its kind, in
    /// registration order, then clear the buffers.
    pub fn deliver(&mut self) {
        for idx in 0..EVENT_KIND_COUNT {
            let Some(buffer) = self.buffers[idx].as_mut() else {
                continue;
            };
            if buffer.is_empty() {
                continue;
            }
            for entry in &mut self.listeners[idx] {
                for event in buffer.iter() {
                    if let Some(filter) = &entry.filter
                        && !filter(event)
                    {
                        continue;
                    }
                    (entry.listener)(event);
                }
            }
            buffer.clear();
        }
    }

    pub fn buffer(&self, kind: EventKind) -> Option<&EventBuffer> {
        self.buffers[kind as usize].as_ref()
    }

    pub fn buffered_count(&self, kind: EventKind) -> usize {
        self.buffer(kind).map_or(0, EventBuffer::len)
    }

    pub fn total_emitted(&self, kind: EventKind) -> u64 {
        self.buffer(kind).map_or(0, EventBuffer::total_written)
    }

    /// Drop all buffered events without delivering them.
    pub fn clear_all(&mut self) {
        for buffer in self.buffers.iter_mut().flatten() {
            buffer.clear();
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
