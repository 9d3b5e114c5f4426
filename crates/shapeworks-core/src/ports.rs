//! Routing ports: where items enter and leave a structure.
//!
//! Directions and offsets are local to the structure. `Top` is the way the
//! structure faces; conversion to world space is the caller's job.
//!
//! An [`Acceptor`] lists the slots items may arrive on. An [`Ejector`] lists
//! output slots, each holding at most one item until something downstream
//! takes it.

use serde::{Deserialize, Serialize};

use crate::item::{Item, ItemKind};

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// One of the four sides of a tile, clockwise from `Top`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    Top,
    Right,
    Bottom,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Top,
        Direction::Right,
        Direction::Bottom,
        Direction::Left,
    ];

    /// Clockwise angle in degrees, `Top` = 0.
    pub fn angle(self) -> u16 {
        match self {
            Direction::Top => 0,
            Direction::Right => 90,
            Direction::Bottom => 180,
            Direction::Left => 270,
        }
    }

    /// Direction at a clockwise angle; any multiple of 90 is accepted.
    pub fn from_angle(degrees: u16) -> Option<Direction> {
        match degrees % 360 {
            0 => Some(Direction::Top),
            90 => Some(Direction::Right),
            180 => Some(Direction::Bottom),
            270 => Some(Direction::Left),
            _ => None,
        }
    }

    /// Rotate by `quarter_turns` clockwise steps.
    pub fn rotated_cw(self, quarter_turns: u8) -> Direction {
        let index = (self as usize + quarter_turns as usize) % 4;
        Direction::ALL[index]
    }

    pub fn opposite(self) -> Direction {
        self.rotated_cw(2)
    }

    /// Unit tile offset, with y growing downward.
    pub fn offset(self) -> TileOffset {
        match self {
            Direction::Top => TileOffset::new(0, -1),
            Direction::Right => TileOffset::new(1, 0),
            Direction::Bottom => TileOffset::new(0, 1),
            Direction::Left => TileOffset::new(-1, 0),
        }
    }
}

/// A tile offset relative to the structure's origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TileOffset {
    pub x: i32,
    pub y: i32,
}

impl TileOffset {
    pub const ORIGIN: TileOffset = TileOffset { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

// ---------------------------------------------------------------------------
// Slot definitions
// ---------------------------------------------------------------------------

/// An input slot: the tile it sits on, the sides it accepts from and an
/// optional item kind restriction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptorSlot {
    pub pos: TileOffset,
    pub directions: Vec<Direction>,
    pub filter: Option<ItemKind>,
}

/// An output slot: the tile it sits on and the side it emits towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EjectorSlot {
    pub pos: TileOffset,
    pub direction: Direction,
}

/// The full static slot list of a structure configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortLayout {
    pub acceptors: Vec<AcceptorSlot>,
    pub ejectors: Vec<EjectorSlot>,
}

impl PortLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_acceptor(mut self, pos: TileOffset, directions: &[Direction]) -> Self {
        self.acceptors.push(AcceptorSlot {
            pos,
            directions: directions.to_vec(),
            filter: None,
        });
        self
    }

    pub fn with_filtered_acceptor(
        mut self,
        pos: TileOffset,
        directions: &[Direction],
        filter: ItemKind,
    ) -> Self {
        self.acceptors.push(AcceptorSlot {
            pos,
            directions: directions.to_vec(),
            filter: Some(filter),
        });
        self
    }

    pub fn with_ejector(mut self, pos: TileOffset, direction: Direction) -> Self {
        self.ejectors.push(EjectorSlot { pos, direction });
        self
    }
}

// ---------------------------------------------------------------------------
// Acceptor
// ---------------------------------------------------------------------------

/// Runtime view of a structure's input slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acceptor {
    slots: Vec<AcceptorSlot>,
}

impl Acceptor {
    pub fn new(slots: Vec<AcceptorSlot>) -> Self {
        Self { slots }
    }

    pub fn slots(&self) -> &[AcceptorSlot] {
        &self.slots
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Whether `slot` exists and its filter admits `item`.
    pub fn accepts(&self, slot: usize, item: &Item) -> bool {
        match self.slots.get(slot) {
            Some(def) => def.filter.is_none_or(|kind| kind == item.kind()),
            None => false,
        }
    }

    /// First slot at `pos` that accepts items entering from `from`.
    pub fn find_slot(&self, pos: TileOffset, from: Direction) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.pos == pos && s.directions.contains(&from))
    }
}

// ---------------------------------------------------------------------------
// Ejector
// ---------------------------------------------------------------------------

/// Where a produced item may be ejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotPolicy {
    /// Only this slot; the item waits until it is free.
    Required(usize),
    /// This slot if free and not the slot used last, otherwise another free
    /// slot.
    Preferred(usize),
    /// The first free slot.
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct EjectorPort {
    slot: EjectorSlot,
    held: Option<Item>,
}

/// Runtime view of a structure's output slots and the items they hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ejector {
    ports: Vec<EjectorPort>,
    last_used_slot: Option<usize>,
}

impl Ejector {
    pub fn new(slots: Vec<EjectorSlot>) -> Self {
        Self {
            ports: slots
                .into_iter()
                .map(|slot| EjectorPort { slot, held: None })
                .collect(),
            last_used_slot: None,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.ports.len()
    }

    pub fn slot(&self, index: usize) -> Option<&EjectorSlot> {
        self.ports.get(index).map(|p| &p.slot)
    }

    pub fn last_used_slot(&self) -> Option<usize> {
        self.last_used_slot
    }

    pub fn can_eject_on_slot(&self, slot: usize) -> bool {
        self.ports.get(slot).is_some_and(|p| p.held.is_none())
    }

    /// Place `item` on `slot`. Returns false if the slot is missing or
    /// occupied.
    pub fn try_eject(&mut self, slot: usize, item: Item) -> bool {
        if !self.can_eject_on_slot(slot) {
            return false;
        }
        self.ports[slot].held = Some(item);
        true
    }

    /// Resolve `policy` and place `item` on the chosen slot. Only preferred
    /// placements update the slot that later preferences steer away from.
    pub fn eject_with_policy(&mut self, policy: SlotPolicy, item: Item) -> Option<usize> {
        let slot = self.pick_slot(policy)?;
        if !self.try_eject(slot, item) {
            return None;
        }
        if matches!(policy, SlotPolicy::Preferred(_)) {
            self.last_used_slot = Some(slot);
        }
        Some(slot)
    }

    pub fn held(&self, slot: usize) -> Option<&Item> {
        self.ports.get(slot).and_then(|p| p.held.as_ref())
    }

    /// Remove and return the item waiting on `slot`.
    pub fn take(&mut self, slot: usize) -> Option<Item> {
        self.ports.get_mut(slot).and_then(|p| p.held.take())
    }

    /// Number of slots currently holding an item.
    pub fn held_count(&self) -> usize {
        self.ports.iter().filter(|p| p.held.is_some()).count()
    }

    pub fn first_free_slot(&self) -> Option<usize> {
        (0..self.ports.len()).find(|&i| self.can_eject_on_slot(i))
    }

    /// Next free slot scanning clockwise from `start`, skipping the slot
    /// used last unless it is the only free one.
    fn next_free_slot_avoiding_last(&self, start: usize) -> Option<usize> {
        let n = self.ports.len();
        let mut fallback = None;
        for step in 0..n {
            let slot = (start + step) % n;
            if !self.can_eject_on_slot(slot) {
                continue;
            }
            if Some(slot) == self.last_used_slot {
                fallback = Some(slot);
                continue;
            }
            return Some(slot);
        }
        fallback
    }

    /// Resolve a policy against the current slot occupancy.
    pub fn pick_slot(&self, policy: SlotPolicy) -> Option<usize> {
        match policy {
            SlotPolicy::Required(slot) => self.can_eject_on_slot(slot).then_some(slot),
            SlotPolicy::Preferred(slot) => {
                if self.can_eject_on_slot(slot) && Some(slot) != self.last_used_slot {
                    Some(slot)
                } else if self.ports.len() > 2 {
                    self.next_free_slot_avoiding_last(slot)
                } else {
                    self.first_free_slot()
                }
            }
            SlotPolicy::Any => self.first_free_slot(),
        }
    }

    /// Replace the slot list, keeping held items on slots that still exist.
    /// Items on removed slots are returned.
    pub fn set_slots(&mut self, slots: Vec<EjectorSlot>) -> Vec<Item> {
        let mut old = std::mem::take(&mut self.ports).into_iter();
        let mut ports = Vec::with_capacity(slots.len());
        for slot in slots {
            let held = old.next().and_then(|p| p.held);
            ports.push(EjectorPort { slot, held });
        }
        self.ports = ports;
        if self.last_used_slot.is_some_and(|s| s >= self.ports.len()) {
            self.last_used_slot = None;
        }
        old.filter_map(|p| p.held).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    fn ejector(n: usize) -> Ejector {
        Ejector::new(
            (0..n)
                .map(|_| EjectorSlot {
                    pos: TileOffset::ORIGIN,
                    direction: Direction::Top,
                })
                .collect(),
        )
    }

    fn red() -> Item {
        Item::Color(Color::Red)
    }

    #[test]
    fn direction_rotation() {
        assert_eq!(Direction::Top.rotated_cw(1), Direction::Right);
        assert_eq!(Direction::Left.rotated_cw(1), Direction::Top);
        assert_eq!(Direction::Right.opposite(), Direction::Left);
        assert_eq!(Direction::from_angle(450), Some(Direction::Right));
        assert_eq!(Direction::from_angle(45), None);
        for d in Direction::ALL {
            assert_eq!(Direction::from_angle(d.angle()), Some(d));
        }
    }

    #[test]
    fn eject_and_take() {
        let mut ej = ejector(1);
        assert!(ej.try_eject(0, red()));
        assert!(!ej.try_eject(0, red()));
        assert!(!ej.try_eject(1, red()));
        assert_eq!(ej.take(0), Some(red()));
        assert!(ej.can_eject_on_slot(0));
    }

    #[test]
    fn required_policy_waits_for_its_slot() {
        let mut ej = ejector(2);
        ej.try_eject(1, red());
        assert_eq!(ej.pick_slot(SlotPolicy::Required(1)), None);
        assert_eq!(ej.pick_slot(SlotPolicy::Required(0)), Some(0));
        assert_eq!(ej.pick_slot(SlotPolicy::Required(5)), None);
    }

    #[test]
    fn preferred_policy_with_two_slots_falls_back_to_first_free() {
        let mut ej = ejector(2);
        assert_eq!(ej.eject_with_policy(SlotPolicy::Preferred(0), red()), Some(0));
        ej.take(0);
        // Slot 0 was used last, so a preference for it falls back.
        assert_eq!(ej.pick_slot(SlotPolicy::Preferred(0)), Some(0));
        assert_eq!(ej.pick_slot(SlotPolicy::Preferred(1)), Some(1));
    }

    #[test]
    fn preferred_policy_with_three_slots_avoids_last_used() {
        let mut ej = ejector(3);
        assert_eq!(ej.eject_with_policy(SlotPolicy::Preferred(1), red()), Some(1));
        ej.take(1);
        assert_eq!(ej.pick_slot(SlotPolicy::Preferred(1)), Some(2));
        assert_eq!(ej.eject_with_policy(SlotPolicy::Preferred(2), red()), Some(2));
        // Slot 2 busy, last used is 2; scanning from 2 wraps to 0.
        assert_eq!(ej.pick_slot(SlotPolicy::Preferred(2)), Some(0));
    }

    #[test]
    fn preferred_policy_uses_last_slot_when_nothing_else_is_free() {
        let mut ej = ejector(3);
        ej.try_eject(0, red());
        ej.try_eject(1, red());
        ej.eject_with_policy(SlotPolicy::Preferred(2), red());
        ej.take(2);
        assert_eq!(ej.last_used_slot(), Some(2));
        assert_eq!(ej.pick_slot(SlotPolicy::Preferred(2)), Some(2));
    }

    #[test]
    fn required_and_any_placements_leave_preference_history_alone() {
        let mut ej = ejector(3);
        assert_eq!(ej.eject_with_policy(SlotPolicy::Preferred(0), red()), Some(0));
        assert_eq!(ej.eject_with_policy(SlotPolicy::Required(2), red()), Some(2));
        assert_eq!(ej.eject_with_policy(SlotPolicy::Any, red()), Some(1));
        assert_eq!(ej.last_used_slot(), Some(0));

        // A later preference for slot 2 is honoured because slot 0 was the
        // last preferred placement.
        ej.take(2);
        assert_eq!(ej.pick_slot(SlotPolicy::Preferred(2)), Some(2));
        assert_eq!(ej.eject_with_policy(SlotPolicy::Required(1), red()), None);
    }

    #[test]
    fn set_slots_returns_items_on_removed_slots() {
        let mut ej = ejector(3);
        ej.try_eject(0, red());
        ej.eject_with_policy(SlotPolicy::Preferred(2), Item::Boolean(true));
        assert_eq!(ej.last_used_slot(), Some(2));
        let displaced = ej.set_slots(vec![EjectorSlot {
            pos: TileOffset::ORIGIN,
            direction: Direction::Left,
        }]);
        assert_eq!(displaced, vec![Item::Boolean(true)]);
        assert_eq!(ej.held(0), Some(&red()));
        assert_eq!(ej.last_used_slot(), None);
    }

    #[test]
    fn acceptor_filter_and_lookup() {
        let layout = PortLayout::new()
            .with_acceptor(TileOffset::ORIGIN, &[Direction::Bottom])
            .with_filtered_acceptor(TileOffset::new(1, 0), &[Direction::Left], ItemKind::Color);
        let acceptor = Acceptor::new(layout.acceptors);
        assert!(acceptor.accepts(0, &red()));
        assert!(acceptor.accepts(1, &red()));
        assert!(!acceptor.accepts(1, &Item::Boolean(true)));
        assert!(!acceptor.accepts(2, &red()));
        assert_eq!(acceptor.find_slot(TileOffset::new(1, 0), Direction::Left), Some(1));
        assert_eq!(acceptor.find_slot(TileOffset::ORIGIN, Direction::Left), None);
    }
}
