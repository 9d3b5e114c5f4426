//! Tunnels: paired sender and receiver tiles that carry items underground.
//!
//! Placing a tunnel searches along its rotation for a partner of the same
//! tier. Finding an opposite-facing sender turns the new tile into its
//! receiver; finding a same-facing receiver makes it a sender. Smart tunnels
//! additionally pick a side port from the neighbours, like smart balancers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shapeworks_core::ports::{Direction, PortLayout, TileOffset};
use tracing::trace;

use crate::{Connectors, GridPosition, LayoutError, TileContacts};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TunnelTier {
    Standard,
    Tier2,
    Smart,
}

impl TunnelTier {
    /// How many tiles ahead a partner may be.
    pub fn max_tiles(self) -> i32 {
        match self {
            TunnelTier::Standard => 5,
            TunnelTier::Tier2 | TunnelTier::Smart => 9,
        }
    }

    pub fn is_smart(self) -> bool {
        self == TunnelTier::Smart
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TunnelMode {
    Sender,
    Receiver,
}

/// Which side of the tile the above-ground port is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TunnelSide {
    Center,
    Left,
    Right,
}

impl TunnelSide {
    fn present_in(self, found: Connectors) -> bool {
        match self {
            TunnelSide::Center => found.center,
            TunnelSide::Left => found.left,
            TunnelSide::Right => found.right,
        }
    }
}

/// Mode and port side of a placed tunnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TunnelVariant {
    pub mode: TunnelMode,
    pub side: TunnelSide,
}

impl TunnelVariant {
    pub const SENDER: TunnelVariant = TunnelVariant {
        mode: TunnelMode::Sender,
        side: TunnelSide::Center,
    };
    pub const RECEIVER: TunnelVariant = TunnelVariant {
        mode: TunnelMode::Receiver,
        side: TunnelSide::Center,
    };

    pub fn new(mode: TunnelMode, side: TunnelSide) -> Self {
        Self { mode, side }
    }

    /// Saved rotation variant: senders are even, receivers odd, in side
    /// order center, left, right.
    pub fn index(self) -> u8 {
        let side = match self.side {
            TunnelSide::Center => 0,
            TunnelSide::Left => 2,
            TunnelSide::Right => 4,
        };
        match self.mode {
            TunnelMode::Sender => side,
            TunnelMode::Receiver => side + 1,
        }
    }

    pub fn from_index(index: u8) -> Result<Self, LayoutError> {
        let side = match index / 2 {
            0 => TunnelSide::Center,
            1 => TunnelSide::Left,
            2 => TunnelSide::Right,
            _ => return Err(LayoutError::InvalidRotationVariant(index)),
        };
        let mode = if index % 2 == 0 {
            TunnelMode::Sender
        } else {
            TunnelMode::Receiver
        };
        Ok(Self { mode, side })
    }
}

/// A tunnel already on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedTunnel {
    pub tier: TunnelTier,
    pub rotation: Direction,
    pub variant: TunnelVariant,
}

/// Placed tunnels keyed by tile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TunnelMap {
    tunnels: BTreeMap<GridPosition, PlacedTunnel>,
}

impl TunnelMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tile: GridPosition, tunnel: PlacedTunnel) -> Option<PlacedTunnel> {
        self.tunnels.insert(tile, tunnel)
    }

    pub fn remove(&mut self, tile: GridPosition) -> Option<PlacedTunnel> {
        self.tunnels.remove(&tile)
    }

    pub fn get(&self, tile: GridPosition) -> Option<&PlacedTunnel> {
        self.tunnels.get(&tile)
    }

    pub fn len(&self) -> usize {
        self.tunnels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tunnels.is_empty()
    }
}

/// Outcome of placing a tunnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TunnelResolution {
    pub rotation: Direction,
    pub variant: TunnelVariant,
    /// The tunnel this one pairs with, if any.
    pub partner: Option<GridPosition>,
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Decide rotation and variant for a tunnel placed at `tile`. `contacts`
/// are the neighbour ports of `tile`; `old` is the variant the tile had
/// before, if it is being re-evaluated.
pub fn resolve_tunnel(
    map: &TunnelMap,
    tile: GridPosition,
    rotation: Direction,
    tier: TunnelTier,
    contacts: &TileContacts,
    old: Option<TunnelVariant>,
) -> TunnelResolution {
    let facing_back = rotation.opposite();
    let mut cursor = tile;
    let mut found = None;
    for _ in 0..tier.max_tiles() {
        cursor = cursor.step(rotation);
        let Some(other) = map.get(cursor) else {
            continue;
        };
        if other.tier != tier {
            continue;
        }
        if other.rotation == facing_back {
            // A receiver facing us blocks the way.
            if other.variant.mode == TunnelMode::Sender {
                found = Some((TunnelMode::Receiver, facing_back, cursor));
            }
            break;
        } else if other.rotation == rotation {
            if other.variant.mode == TunnelMode::Receiver {
                found = Some((TunnelMode::Sender, rotation, cursor));
            }
            break;
        }
    }

    let (mode, rotation, partner) = match found {
        Some((mode, rotation, partner)) => (mode, rotation, Some(partner)),
        None => (TunnelMode::Sender, rotation, None),
    };
    let variant = if tier.is_smart() {
        compute_tunnel_variant(contacts, rotation, mode, old)
    } else {
        TunnelVariant::new(mode, TunnelSide::Center)
    };
    trace!(?tile, ?tier, ?rotation, ?variant, ?partner, "tunnel resolved");
    TunnelResolution {
        rotation,
        variant,
        partner,
    }
}

/// Pick the port side of a smart tunnel. Senders look at neighbours feeding
/// them, receivers at neighbours taking from them. The old side is kept
/// while its connector remains; with zero or several candidates the old
/// side is also kept when anything connects at all.
pub fn compute_tunnel_variant(
    contacts: &TileContacts,
    rotation: Direction,
    mode: TunnelMode,
    old: Option<TunnelVariant>,
) -> TunnelVariant {
    let found = match mode {
        TunnelMode::Sender => Connectors::from_ejectors(contacts, rotation),
        TunnelMode::Receiver => Connectors::from_acceptors(contacts, rotation),
    };
    let old_side = old.filter(|v| v.mode == mode).map(|v| v.side);
    if let Some(side) = old_side
        && side.present_in(found)
    {
        return TunnelVariant::new(mode, side);
    }

    let side = if found.count() != 1 {
        match old_side {
            Some(side) if found.count() > 0 => side,
            _ => TunnelSide::Center,
        }
    } else if found.center {
        TunnelSide::Center
    } else if found.left {
        TunnelSide::Left
    } else {
        TunnelSide::Right
    };
    TunnelVariant::new(mode, side)
}

/// Slot layout of a tunnel end. Senders only accept, receivers only eject.
pub fn tunnel_layout(variant: TunnelVariant) -> PortLayout {
    let side = match variant.side {
        TunnelSide::Center => None,
        TunnelSide::Left => Some(Direction::Left),
        TunnelSide::Right => Some(Direction::Right),
    };
    match variant.mode {
        TunnelMode::Sender => PortLayout::new()
            .with_acceptor(TileOffset::ORIGIN, &[side.unwrap_or(Direction::Bottom)]),
        TunnelMode::Receiver => {
            PortLayout::new().with_ejector(TileOffset::ORIGIN, side.unwrap_or(Direction::Top))
        }
    }
}
