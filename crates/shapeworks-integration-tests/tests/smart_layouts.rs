//! Structures whose slot layout comes from their neighbours on a grid, run
//! through the engine.

use shapeworks_core::engine::Engine;
use shapeworks_core::item::Item;
use shapeworks_core::ports::{Direction, PortLayout, TileOffset};
use shapeworks_core::processor::{ProcessorConfig, ProcessorKind};
use shapeworks_core::signal::{DiscardGoals, NoSignals};
use shapeworks_core::test_utils::*;
use shapeworks_layout::tunnel::PlacedTunnel;
use shapeworks_layout::*;

// ===========================================================================
// Shared helpers
// ===========================================================================

/// A one-tile belt taking from behind and pushing ahead.
fn belt() -> PortLayout {
    PortLayout::new()
        .with_acceptor(TileOffset::ORIGIN, &[Direction::Bottom])
        .with_ejector(TileOffset::ORIGIN, Direction::Top)
}

fn step(engine: &mut Engine, seconds: f64) {
    engine.step(fixed(seconds), &NoSignals, &mut DiscardGoals);
}

// ===========================================================================
// Test 1: Smart splitter between two side belts
// ===========================================================================

/// Belts leading away on both sides turn a splitter into its two-sided
/// variant, which then alternates between them.
#[test]
fn test_splitter_feeds_both_sides() {
    let mut grid = PortGrid::new();
    grid.place(GridPosition::new(1, 0), Direction::Right, belt()).unwrap();
    grid.place(GridPosition::new(-1, 0), Direction::Left, belt()).unwrap();

    let tile = GridPosition::new(0, 0);
    let contacts = grid.contacts_at(tile);
    let variant = compute_balancer_variant(
        &contacts,
        Direction::Top,
        BalancerVariant::SplitterTriple,
        None,
    );
    assert_eq!(variant, SmartVariant::Both);

    let ports = balancer_layout(BalancerVariant::SplitterTriple, variant);
    let mut engine = engine_with_uniform_speed(10.0);
    let splitter = engine
        .add_structure(
            balancer_config(),
            ports.clone(),
        )
        .unwrap();

    let mut sides = Vec::new();
    for _ in 0..4 {
        engine.accept_item(splitter, 0, Item::Boolean(true), &NoSignals);
        step(&mut engine, 0.25);
        for (slot, _) in drain_outputs(&mut engine, splitter) {
            sides.push(ports.ejectors[slot].direction);
        }
    }
    assert_eq!(
        sides,
        vec![Direction::Left, Direction::Right, Direction::Left, Direction::Right]
    );
}

// ===========================================================================
// Test 2: A merger keeps its variant while the neighbour stays
// ===========================================================================

#[test]
fn test_merger_reconfigures_when_neighbours_change() {
    let mut grid = PortGrid::new();
    // Feeds the tile from its left side.
    grid.place(GridPosition::new(-1, 0), Direction::Right, belt()).unwrap();
    let tile = GridPosition::new(0, 0);

    let merger = BalancerVariant::MergerTriple;
    let first = compute_balancer_variant(&grid.contacts_at(tile), Direction::Top, merger, None);
    assert_eq!(first, SmartVariant::Left);

    let mut engine = engine_with_uniform_speed(10.0);
    let id = engine
        .add_structure(balancer_config(), balancer_layout(merger, first))
        .unwrap();
    assert_eq!(engine.structure(id).unwrap().acceptor().slot_count(), 2);

    // A second feeder on the right does not flip a still-valid variant.
    grid.place(GridPosition::new(1, 0), Direction::Left, belt()).unwrap();
    let kept = compute_balancer_variant(&grid.contacts_at(tile), Direction::Top, merger, Some(first));
    assert_eq!(kept, SmartVariant::Left);

    // Losing the left feeder does.
    grid.remove(GridPosition::new(-1, 0));
    let next = compute_balancer_variant(&grid.contacts_at(tile), Direction::Top, merger, Some(kept));
    assert_eq!(next, SmartVariant::Right);
    engine
        .reconfigure(id, balancer_config(), balancer_layout(merger, next))
        .unwrap();

    engine.accept_item(id, 1, Item::Boolean(false), &NoSignals);
    step(&mut engine, 0.25);
    assert_eq!(engine.take_output(id, 0), Some(Item::Boolean(false)));
}

// ===========================================================================
// Test 3: Links curve into place and entrances run faster
// ===========================================================================

#[test]
fn test_link_curves_towards_side_feeder() {
    let mut grid = PortGrid::new();
    grid.place(GridPosition::new(-1, 0), Direction::Right, belt()).unwrap();
    let tile = GridPosition::new(0, 0);

    let orientation = compute_link_variant(&grid.contacts_at(tile), Direction::Top);
    assert_eq!(orientation.rotation, Direction::Right);
    assert_eq!(orientation.curve, LinkCurve::Left);

    grid.place(
        tile,
        orientation.rotation,
        link_layout(LinkVariant::Plain, orientation.curve),
    )
    .unwrap();
    // The curved link hands items to the tile above it.
    let above = grid.contacts_at(GridPosition::new(0, -1));
    assert_eq!(above.ejectors, vec![Direction::Top]);
}

#[test]
fn test_link_entrance_runs_at_triple_speed() {
    let mut engine = engine_with_uniform_speed(1.0);
    let plain = engine
        .add_structure(
            link_config(LinkVariant::Plain),
            link_layout(LinkVariant::Plain, LinkCurve::Straight),
        )
        .unwrap();
    let entrance = engine
        .add_structure(
            link_config(LinkVariant::Entrance),
            link_layout(LinkVariant::Entrance, LinkCurve::Straight),
        )
        .unwrap();
    let item = Item::Boolean(true);
    engine.accept_item(plain, 0, item, &NoSignals);
    // Fed from one side only.
    engine.accept_item(entrance, 1, item, &NoSignals);

    step(&mut engine, 0.25);
    assert_eq!(engine.peek_output(entrance, 0), None);
    step(&mut engine, 0.25);
    assert_eq!(engine.take_output(entrance, 0), Some(item));
    assert_eq!(engine.peek_output(plain, 0), None);
    step(&mut engine, 0.5);
    assert_eq!(engine.take_output(plain, 0), Some(item));
}

// ===========================================================================
// Test 4: Tunnel pairs
// ===========================================================================

#[test]
fn test_smart_tunnel_pair() {
    let mut grid = PortGrid::new();
    let mut tunnels = TunnelMap::new();
    // A belt below the sender tile feeds it from behind.
    grid.place(GridPosition::new(0, 5), Direction::Top, belt()).unwrap();

    let sender_tile = GridPosition::new(0, 4);
    let sender = resolve_tunnel(
        &tunnels,
        sender_tile,
        Direction::Top,
        TunnelTier::Smart,
        &grid.contacts_at(sender_tile),
        None,
    );
    assert_eq!(sender.variant, TunnelVariant::SENDER);
    assert_eq!(sender.partner, None);
    tunnels.insert(
        sender_tile,
        PlacedTunnel {
            tier: TunnelTier::Smart,
            rotation: sender.rotation,
            variant: sender.variant,
        },
    );
    grid.place(sender_tile, sender.rotation, tunnel_layout(sender.variant))
        .unwrap();

    // A belt to the right of the exit takes from its left side.
    grid.place(GridPosition::new(1, 0), Direction::Right, belt()).unwrap();
    let receiver_tile = GridPosition::new(0, 0);
    let receiver = resolve_tunnel(
        &tunnels,
        receiver_tile,
        Direction::Bottom,
        TunnelTier::Smart,
        &grid.contacts_at(receiver_tile),
        None,
    );
    assert_eq!(receiver.partner, Some(sender_tile));
    assert_eq!(receiver.rotation, Direction::Top);
    assert_eq!(
        receiver.variant,
        TunnelVariant::new(TunnelMode::Receiver, TunnelSide::Right)
    );
    let ports = tunnel_layout(receiver.variant);
    assert_eq!(ports.ejectors[0].direction, Direction::Right);
}

#[test]
fn test_standard_balancer_layout_validates() {
    let config = ProcessorConfig::new(ProcessorKind::Balancer);
    let ports = balancer_layout(BalancerVariant::Standard, SmartVariant::Center);
    assert_eq!(config.validate(&ports), Ok(()));
}
