//! Connectivity heuristics and slot layouts for self-orienting structures.
//!
//! Smart balancers, smart tunnels and links pick their shape from the ports
//! of their neighbours. This crate classifies those ports relative to the
//! structure's rotation, resolves a variant, and returns the
//! [`PortLayout`](shapeworks_core::ports::PortLayout) the engine should run
//! the structure with. It never touches processing state.
//!
//! World-space neighbour ports come from a [`grid::PortGrid`], or from any
//! other source that can fill in a [`TileContacts`].

use serde::{Deserialize, Serialize};
use shapeworks_core::ports::{Direction, TileOffset};

pub mod balancer;
pub mod connectivity;
pub mod grid;
pub mod link;
pub mod tunnel;

pub use balancer::{BalancerVariant, balancer_config, balancer_layout, compute_balancer_variant};
pub use connectivity::{Connectors, SmartVariant};
pub use grid::PortGrid;
pub use link::{LinkCurve, LinkOrientation, LinkVariant, compute_link_variant, link_config, link_layout};
pub use tunnel::{
    TunnelMap, TunnelMode, TunnelResolution, TunnelSide, TunnelTier, TunnelVariant,
    compute_tunnel_variant, resolve_tunnel, tunnel_layout,
};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A position on the 2D grid, y growing downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring tile in `direction`.
    pub fn step(self, direction: Direction) -> Self {
        self.offset_by(direction.offset())
    }

    pub fn offset_by(self, offset: TileOffset) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y)
    }
}

/// Quarter turns clockwise a structure facing `rotation` is turned by.
pub fn quarter_turns(rotation: Direction) -> u8 {
    (rotation.angle() / 90) as u8
}

/// Rotate a local tile offset into world space for a structure facing
/// `rotation`.
pub fn rotate_offset(offset: TileOffset, rotation: Direction) -> TileOffset {
    let mut out = offset;
    for _ in 0..quarter_turns(rotation) {
        out = TileOffset::new(-out.y, out.x);
    }
    out
}

/// Rotate a local direction into world space.
pub fn rotate_direction(local: Direction, rotation: Direction) -> Direction {
    local.rotated_cw(quarter_turns(rotation))
}

/// Ports of neighbouring structures that touch one tile, in world space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileContacts {
    /// Directions of neighbouring ejectors that emit into the tile.
    pub ejectors: Vec<Direction>,
    /// Sides neighbouring acceptors take items from when they accept from
    /// the tile.
    pub acceptors: Vec<Direction>,
}

impl TileContacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ejector(mut self, to: Direction) -> Self {
        self.ejectors.push(to);
        self
    }

    pub fn with_acceptor(mut self, from: Direction) -> Self {
        self.acceptors.push(from);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ejectors.is_empty() && self.acceptors.is_empty()
    }
}

/// Errors from decoding layout variants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("rotation variant {0} out of range")]
    InvalidRotationVariant(u8),
    #[error("unknown variant name: {0}")]
    UnknownVariant(String),
    #[error("a layout is already placed at ({}, {})", .0.x, .0.y)]
    Occupied(GridPosition),
}
