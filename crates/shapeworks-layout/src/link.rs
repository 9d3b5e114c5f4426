//! Links: belt-like single-tile structures that curve towards their
//! neighbours, plus the two-tile entrance and exit that bridge links and
//! regular item ports.

use serde::{Deserialize, Serialize};
use shapeworks_core::fixed::Fixed64;
use shapeworks_core::ports::{Direction, PortLayout, TileOffset};
use shapeworks_core::processor::{ProcessorConfig, ProcessorKind};
use tracing::trace;

use crate::{LayoutError, TileContacts, rotate_direction};

/// Base speed multiplier of a link entrance.
pub const ENTRANCE_SPEED_MULTIPLIER: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkVariant {
    Plain,
    /// Takes items from both sides of its lower tile into the link.
    Entrance,
    /// Hands link items to both sides of its upper tile.
    Exit,
}

impl LinkVariant {
    pub const ALL: [LinkVariant; 3] = [LinkVariant::Plain, LinkVariant::Entrance, LinkVariant::Exit];

    pub fn name(self) -> &'static str {
        match self {
            LinkVariant::Plain => "default",
            LinkVariant::Entrance => "entrance",
            LinkVariant::Exit => "exit",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, LayoutError> {
        Self::ALL
            .into_iter()
            .find(|v| v.name() == name)
            .ok_or_else(|| LayoutError::UnknownVariant(name.to_string()))
    }

    /// Footprint as `(width, height)` in tiles.
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            LinkVariant::Plain => (1, 1),
            LinkVariant::Entrance | LinkVariant::Exit => (1, 2),
        }
    }
}

/// Which way a plain link's output points, relative to its rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkCurve {
    Straight,
    Left,
    Right,
}

impl LinkCurve {
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Result<Self, LayoutError> {
        match index {
            0 => Ok(LinkCurve::Straight),
            1 => Ok(LinkCurve::Left),
            2 => Ok(LinkCurve::Right),
            _ => Err(LayoutError::InvalidRotationVariant(index)),
        }
    }

    fn output_direction(self) -> Direction {
        match self {
            LinkCurve::Straight => Direction::Top,
            LinkCurve::Left => Direction::Left,
            LinkCurve::Right => Direction::Right,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkOrientation {
    pub rotation: Direction,
    pub curve: LinkCurve,
}

/// Orient a plain link placed with `rotation`.
///
/// A neighbour feeding from behind keeps the link straight. Otherwise a
/// single side feeder turns the link so it enters from that side and curves
/// back to the original heading. Failing that, a single side taker curves
/// the output towards it.
pub fn compute_link_variant(contacts: &TileContacts, rotation: Direction) -> LinkOrientation {
    let top = rotation;
    let right = rotate_direction(Direction::Right, rotation);
    let bottom = rotate_direction(Direction::Bottom, rotation);
    let left = rotate_direction(Direction::Left, rotation);

    let mut fed_from_behind = false;
    let mut fed_from_right = false;
    let mut fed_from_left = false;
    for &to in &contacts.ejectors {
        if to == top {
            fed_from_behind = true;
        } else if to == left {
            fed_from_right = true;
        } else if to == right {
            fed_from_left = true;
        }
    }

    let mut taken_ahead = false;
    let mut taken_left = false;
    let mut taken_right = false;
    for &from in &contacts.acceptors {
        if from == bottom {
            taken_ahead = true;
        } else if from == right {
            taken_left = true;
        } else if from == left {
            taken_right = true;
        }
    }

    let orientation = if !fed_from_behind && fed_from_right && !fed_from_left {
        LinkOrientation {
            rotation: rotation.rotated_cw(3),
            curve: LinkCurve::Right,
        }
    } else if !fed_from_behind && fed_from_left && !fed_from_right {
        LinkOrientation {
            rotation: rotation.rotated_cw(1),
            curve: LinkCurve::Left,
        }
    } else if !taken_ahead && taken_right && !taken_left {
        LinkOrientation {
            rotation,
            curve: LinkCurve::Right,
        }
    } else if !taken_ahead && taken_left && !taken_right {
        LinkOrientation {
            rotation,
            curve: LinkCurve::Left,
        }
    } else {
        LinkOrientation {
            rotation,
            curve: LinkCurve::Straight,
        }
    };
    trace!(?rotation, ?orientation, "link oriented");
    orientation
}

/// Slot layout of a link. `curve` only applies to plain links.
pub fn link_layout(variant: LinkVariant, curve: LinkCurve) -> PortLayout {
    let origin = TileOffset::ORIGIN;
    let lower = TileOffset::new(0, 1);
    match variant {
        LinkVariant::Plain => PortLayout::new()
            .with_acceptor(origin, &[Direction::Bottom])
            .with_ejector(origin, curve.output_direction()),
        LinkVariant::Entrance => PortLayout::new()
            .with_acceptor(lower, &[Direction::Left])
            .with_acceptor(lower, &[Direction::Right])
            .with_ejector(origin, Direction::Top),
        LinkVariant::Exit => PortLayout::new()
            .with_acceptor(lower, &[Direction::Bottom])
            .with_ejector(origin, Direction::Right)
            .with_ejector(origin, Direction::Left),
    }
}

/// Engine configuration of a link variant. Entrances run faster and start a
/// charge for every single item so one-sided feeding never stalls.
pub fn link_config(variant: LinkVariant) -> ProcessorConfig {
    let config = ProcessorConfig::new(ProcessorKind::Link);
    match variant {
        LinkVariant::Entrance => config
            .with_inputs_per_charge(1)
            .with_speed_multiplier(Fixed64::from_num(ENTRANCE_SPEED_MULTIPLIER)),
        LinkVariant::Plain | LinkVariant::Exit => config,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_neighbours_goes_straight() {
        let o = compute_link_variant(&TileContacts::new(), Direction::Right);
        assert_eq!(o.rotation, Direction::Right);
        assert_eq!(o.curve, LinkCurve::Straight);
    }

    #[test]
    fn side_feeder_turns_the_link() {
        // Facing up, a belt on the left pushes right into the tile.
        let contacts = TileContacts::new().with_ejector(Direction::Right);
        let o = compute_link_variant(&contacts, Direction::Top);
        assert_eq!(
            o,
            LinkOrientation {
                rotation: Direction::Right,
                curve: LinkCurve::Left,
            }
        );
        // The turned link still outputs upwards.
        let out = link_layout(LinkVariant::Plain, o.curve).ejectors[0].direction;
        assert_eq!(rotate_direction(out, o.rotation), Direction::Top);

        let contacts = TileContacts::new().with_ejector(Direction::Left);
        let o = compute_link_variant(&contacts, Direction::Top);
        assert_eq!(o.rotation, Direction::Left);
        assert_eq!(o.curve, LinkCurve::Right);
    }

    #[test]
    fn feeder_from_behind_wins() {
        let contacts = TileContacts::new()
            .with_ejector(Direction::Top)
            .with_ejector(Direction::Right)
            .with_acceptor(Direction::Left);
        let o = compute_link_variant(&contacts, Direction::Top);
        // Side feeders are ignored; the side taker still curves the output.
        assert_eq!(o.rotation, Direction::Top);
        assert_eq!(o.curve, LinkCurve::Right);
    }

    #[test]
    fn taker_ahead_keeps_straight() {
        let contacts = TileContacts::new()
            .with_acceptor(Direction::Bottom)
            .with_acceptor(Direction::Right);
        let o = compute_link_variant(&contacts, Direction::Top);
        assert_eq!(o.curve, LinkCurve::Straight);
    }

    #[test]
    fn two_side_feeders_cancel() {
        let contacts = TileContacts::new()
            .with_ejector(Direction::Right)
            .with_ejector(Direction::Left);
        let o = compute_link_variant(&contacts, Direction::Top);
        assert_eq!(o.curve, LinkCurve::Straight);
    }

    #[test]
    fn layouts_validate_against_configs() {
        for variant in LinkVariant::ALL {
            let ports = link_layout(variant, LinkCurve::Straight);
            assert_eq!(link_config(variant).validate(&ports), Ok(()));
        }
        let entrance = link_layout(LinkVariant::Entrance, LinkCurve::Straight);
        assert_eq!(entrance.acceptors.len(), 2);
        assert_eq!(entrance.acceptors[0].pos, TileOffset::new(0, 1));
        let exit = link_layout(LinkVariant::Exit, LinkCurve::Straight);
        assert_eq!(exit.ejectors.len(), 2);
    }

    #[test]
    fn entrance_runs_three_times_faster() {
        assert_eq!(
            link_config(LinkVariant::Entrance).speed_multiplier,
            Fixed64::from_num(3)
        );
        assert_eq!(link_config(LinkVariant::Plain).speed_multiplier, Fixed64::from_num(1));
    }

    #[test]
    fn curve_indices() {
        for index in 0..3 {
            assert_eq!(LinkCurve::from_index(index).map(LinkCurve::index), Ok(index));
        }
        assert!(LinkCurve::from_index(3).is_err());
        assert_eq!(LinkVariant::from_name("exit"), Ok(LinkVariant::Exit));
    }
}
