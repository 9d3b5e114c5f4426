//! Classifying neighbour ports relative to a structure's rotation.
//!
//! A connector is *center* when it lines up with the structure's main axis,
//! *left* or *right* when it touches the corresponding side. Which ports
//! count depends on what the structure wants to connect to: inputs look at
//! neighbouring ejectors, outputs at neighbouring acceptors.

use serde::{Deserialize, Serialize};
use shapeworks_core::ports::Direction;

use crate::{LayoutError, TileContacts, rotate_direction};

/// Which sides of a tile have a usable neighbour port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connectors {
    pub center: bool,
    pub left: bool,
    pub right: bool,
}

impl Connectors {
    pub const NONE: Connectors = Connectors {
        center: false,
        left: false,
        right: false,
    };

    /// Classify neighbouring ejectors that feed the tile. An ejector pushing
    /// towards the structure's left comes from its right side.
    pub fn from_ejectors(contacts: &TileContacts, rotation: Direction) -> Self {
        let top = rotation;
        let right = rotate_direction(Direction::Right, rotation);
        let left = rotate_direction(Direction::Left, rotation);
        let mut out = Connectors::NONE;
        for &to in &contacts.ejectors {
            if to == left {
                out.right = true;
            } else if to == right {
                out.left = true;
            } else if to == top {
                out.center = true;
            }
        }
        out
    }

    /// Classify neighbouring acceptors that take from the tile. An acceptor
    /// taking from its right side sits on the structure's left.
    pub fn from_acceptors(contacts: &TileContacts, rotation: Direction) -> Self {
        let right = rotate_direction(Direction::Right, rotation);
        let bottom = rotate_direction(Direction::Bottom, rotation);
        let left = rotate_direction(Direction::Left, rotation);
        let mut out = Connectors::NONE;
        for &from in &contacts.acceptors {
            if from == right {
                out.left = true;
            } else if from == left {
                out.right = true;
            } else if from == bottom {
                out.center = true;
            }
        }
        out
    }

    pub fn count(self) -> usize {
        [self.center, self.left, self.right]
            .into_iter()
            .filter(|&c| c)
            .count()
    }

    /// True if every connector set in `other` is also set here.
    pub fn covers(self, other: Connectors) -> bool {
        (!other.center || self.center) && (!other.left || self.left) && (!other.right || self.right)
    }
}

/// Rotation variant of a three-way structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SmartVariant {
    Center,
    Left,
    Right,
    /// Center and both sides.
    All,
    /// Both sides, no center.
    Both,
}

impl SmartVariant {
    pub const ALL: [SmartVariant; 5] = [
        SmartVariant::Center,
        SmartVariant::Left,
        SmartVariant::Right,
        SmartVariant::All,
        SmartVariant::Both,
    ];

    /// Stable numeric index, as stored in saved layouts.
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Result<Self, LayoutError> {
        Self::ALL
            .get(index as usize)
            .copied()
            .ok_or(LayoutError::InvalidRotationVariant(index))
    }

    pub fn name(self) -> &'static str {
        match self {
            SmartVariant::Center => "center",
            SmartVariant::Left => "left",
            SmartVariant::Right => "right",
            SmartVariant::All => "all",
            SmartVariant::Both => "both",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, LayoutError> {
        Self::ALL
            .into_iter()
            .find(|v| v.name() == name)
            .ok_or_else(|| LayoutError::UnknownVariant(name.to_string()))
    }

    /// The connectors this variant uses.
    pub fn connectors(self) -> Connectors {
        match self {
            SmartVariant::Center => Connectors {
                center: true,
                ..Connectors::NONE
            },
            SmartVariant::Left => Connectors {
                left: true,
                ..Connectors::NONE
            },
            SmartVariant::Right => Connectors {
                right: true,
                ..Connectors::NONE
            },
            SmartVariant::All => Connectors {
                center: true,
                left: true,
                right: true,
            },
            SmartVariant::Both => Connectors {
                center: false,
                left: true,
                right: true,
            },
        }
    }

    /// Pick a variant by precedence: all, both, right, left, center.
    pub fn from_connectors(found: Connectors) -> Self {
        match (found.right, found.left, found.center) {
            (true, true, true) => SmartVariant::All,
            (true, true, false) => SmartVariant::Both,
            (true, false, _) => SmartVariant::Right,
            (false, true, _) => SmartVariant::Left,
            (false, false, _) => SmartVariant::Center,
        }
    }

    /// Keep `current` while the connector it was chosen for is still
    /// there, otherwise pick by precedence. Only single-connector variants
    /// are sticky; `All` and `Both` are re-derived every time.
    pub fn resolve(found: Connectors, current: Option<SmartVariant>) -> Self {
        if let Some(current @ (SmartVariant::Center | SmartVariant::Left | SmartVariant::Right)) =
            current
            && found.covers(current.connectors())
        {
            return current;
        }
        Self::from_connectors(found)
    }
}
