//! Balancers: the two-wide standard balancer and the single-tile smart
//! splitter and merger, which grow side ports towards their neighbours.

use serde::{Deserialize, Serialize};
use shapeworks_core::ports::{Direction, PortLayout, TileOffset};
use shapeworks_core::processor::{ProcessorConfig, ProcessorKind};
use tracing::trace;

use crate::{Connectors, LayoutError, SmartVariant, TileContacts};

/// Which balancer building a structure is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BalancerVariant {
    /// Two tiles wide, two inputs and two outputs.
    Standard,
    /// One input from behind, up to three outputs.
    SplitterTriple,
    /// Up to three inputs, one output ahead.
    MergerTriple,
}

impl BalancerVariant {
    pub const ALL: [BalancerVariant; 3] = [
        BalancerVariant::Standard,
        BalancerVariant::SplitterTriple,
        BalancerVariant::MergerTriple,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BalancerVariant::Standard => "default",
            BalancerVariant::SplitterTriple => "splitter-triple",
            BalancerVariant::MergerTriple => "merger-triple",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, LayoutError> {
        Self::ALL
            .into_iter()
            .find(|v| v.name() == name)
            .ok_or_else(|| LayoutError::UnknownVariant(name.to_string()))
    }

    pub fn is_smart(self) -> bool {
        self != BalancerVariant::Standard
    }

    /// Footprint as `(width, height)` in tiles.
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            BalancerVariant::Standard => (2, 1),
            _ => (1, 1),
        }
    }
}

/// Engine configuration shared by every balancer variant.
pub fn balancer_config() -> ProcessorConfig {
    ProcessorConfig::new(ProcessorKind::Balancer)
}

/// Resolve the rotation variant of a balancer at a tile. The standard
/// balancer always uses `Center`. Mergers look for neighbours feeding them,
/// splitters for neighbours taking from them.
pub fn compute_balancer_variant(
    contacts: &TileContacts,
    rotation: Direction,
    variant: BalancerVariant,
    current: Option<SmartVariant>,
) -> SmartVariant {
    let found = match variant {
        BalancerVariant::Standard => return SmartVariant::Center,
        BalancerVariant::MergerTriple => Connectors::from_ejectors(contacts, rotation),
        BalancerVariant::SplitterTriple => Connectors::from_acceptors(contacts, rotation),
    };
    let resolved = SmartVariant::resolve(found, current);
    trace!(?variant, ?rotation, ?found, ?current, ?resolved, "balancer variant");
    resolved
}

/// The slot layout of a balancer variant in a given rotation variant.
/// `smart` is ignored for the standard balancer.
pub fn balancer_layout(variant: BalancerVariant, smart: SmartVariant) -> PortLayout {
    let origin = TileOffset::ORIGIN;
    match variant {
        BalancerVariant::Standard => {
            let right = TileOffset::new(1, 0);
            PortLayout::new()
                .with_acceptor(origin, &[Direction::Bottom])
                .with_acceptor(right, &[Direction::Bottom])
                .with_ejector(origin, Direction::Top)
                .with_ejector(right, Direction::Top)
        }
        BalancerVariant::MergerTriple => {
            let inputs: &[Direction] = match smart {
                SmartVariant::Center => &[Direction::Bottom],
                SmartVariant::Left => &[Direction::Bottom, Direction::Left],
                SmartVariant::Right => &[Direction::Bottom, Direction::Right],
                SmartVariant::All => &[Direction::Left, Direction::Bottom, Direction::Right],
                SmartVariant::Both => &[Direction::Left, Direction::Right],
            };
            inputs
                .iter()
                .fold(PortLayout::new(), |ports, &side| ports.with_acceptor(origin, &[side]))
                .with_ejector(origin, Direction::Top)
        }
        BalancerVariant::SplitterTriple => {
            let outputs: &[Direction] = match smart {
                SmartVariant::Center => &[Direction::Top],
                SmartVariant::Left => &[Direction::Top, Direction::Left],
                SmartVariant::Right => &[Direction::Top, Direction::Right],
                SmartVariant::All => &[Direction::Left, Direction::Top, Direction::Right],
                SmartVariant::Both => &[Direction::Left, Direction::Right],
            };
            outputs.iter().fold(
                PortLayout::new().with_acceptor(origin, &[Direction::Bottom]),
                |ports, &side| ports.with_ejector(origin, side),
            )
        }
    }
}
