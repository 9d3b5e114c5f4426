//! A grid of placed port layouts, answering which neighbour ports touch a
//! tile.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shapeworks_core::ports::{Direction, PortLayout};

use crate::{GridPosition, LayoutError, TileContacts, rotate_direction, rotate_offset};

/// A structure's port layout placed at an origin with a rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub rotation: Direction,
    pub ports: PortLayout,
}

/// Placed layouts keyed by origin tile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortGrid {
    placements: BTreeMap<GridPosition, Placement>,
}

impl PortGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a layout at `origin`. Fails if something already has its
    /// origin there.
    pub fn place(
        &mut self,
        origin: GridPosition,
        rotation: Direction,
        ports: PortLayout,
    ) -> Result<(), LayoutError> {
        if self.placements.contains_key(&origin) {
            return Err(LayoutError::Occupied(origin));
        }
        self.placements.insert(origin, Placement { rotation, ports });
        Ok(())
    }

    /// Swap the layout at `origin`, e.g. after a variant change. Returns the
    /// previous placement.
    pub fn replace(
        &mut self,
        origin: GridPosition,
        rotation: Direction,
        ports: PortLayout,
    ) -> Option<Placement> {
        self.placements.insert(origin, Placement { rotation, ports })
    }

    pub fn remove(&mut self, origin: GridPosition) -> Option<Placement> {
        self.placements.remove(&origin)
    }

    pub fn get(&self, origin: GridPosition) -> Option<&Placement> {
        self.placements.get(&origin)
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// World-space ports of every placed layout that emit into or accept
    /// from `tile`. Placements whose origin is `tile` are skipped.
    pub fn contacts_at(&self, tile: GridPosition) -> TileContacts {
        let mut contacts = TileContacts::new();
        for (&origin, placement) in &self.placements {
            if origin == tile {
                continue;
            }
            let rotation = placement.rotation;
            for slot in &placement.ports.ejectors {
                let pos = origin.offset_by(rotate_offset(slot.pos, rotation));
                let to = rotate_direction(slot.direction, rotation);
                if pos.step(to) == tile {
                    contacts.ejectors.push(to);
                }
            }
            for slot in &placement.ports.acceptors {
                let pos = origin.offset_by(rotate_offset(slot.pos, rotation));
                for &local in &slot.directions {
                    let from = rotate_direction(local, rotation);
                    if pos.step(from) == tile {
                        contacts.acceptors.push(from);
                    }
                }
            }
        }
        contacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapeworks_core::ports::TileOffset;

    fn belt_up() -> PortLayout {
        PortLayout::new()
            .with_acceptor(TileOffset::ORIGIN, &[Direction::Bottom])
            .with_ejector(TileOffset::ORIGIN, Direction::Top)
    }

    #[test]
    fn ejector_below_feeds_tile() {
        let mut grid = PortGrid::new();
        grid.place(GridPosition::new(0, 1), Direction::Top, belt_up()).unwrap();
        let contacts = grid.contacts_at(GridPosition::new(0, 0));
        assert_eq!(contacts.ejectors, vec![Direction::Top]);
        assert!(contacts.acceptors.is_empty());
    }

    #[test]
    fn acceptor_above_takes_from_tile() {
        let mut grid = PortGrid::new();
        grid.place(GridPosition::new(0, -1), Direction::Top, belt_up()).unwrap();
        let contacts = grid.contacts_at(GridPosition::new(0, 0));
        assert_eq!(contacts.acceptors, vec![Direction::Bottom]);
    }

    #[test]
    fn rotated_placement() {
        // A belt facing right, left of the tile, pushes into it.
        let mut grid = PortGrid::new();
        grid.place(GridPosition::new(-1, 0), Direction::Right, belt_up()).unwrap();
        let contacts = grid.contacts_at(GridPosition::new(0, 0));
        assert_eq!(contacts.ejectors, vec![Direction::Right]);
        assert!(grid.contacts_at(GridPosition::new(0, 1)).is_empty());
    }

    #[test]
    fn occupied_origin_is_rejected() {
        let mut grid = PortGrid::new();
        let origin = GridPosition::new(3, 3);
        grid.place(origin, Direction::Top, belt_up()).unwrap();
        assert_eq!(
            grid.place(origin, Direction::Left, belt_up()),
            Err(LayoutError::Occupied(origin))
        );
        assert!(grid.replace(origin, Direction::Left, belt_up()).is_some());
        assert_eq!(grid.get(origin).unwrap().rotation, Direction::Left);
        assert!(grid.remove(origin).is_some());
        assert!(grid.is_empty());
    }
}
