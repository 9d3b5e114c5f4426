//! Per-kind charge handlers.
//!
//! A handler runs exactly once per charge, when its timer has elapsed, and
//! turns the consumed inputs into an ordered list of outputs with slot
//! policies. Inputs have already passed admission, so a wrong item kind on a
//! slot is a wiring bug and panics.

use crate::definitions::ShapeStore;
use crate::event::{Event, EventBus};
use crate::fixed::{Fixed64, Ticks};
use crate::id::{ShapeId, StructureId};
use crate::item::Item;
use crate::ports::SlotPolicy;
use crate::processor::{PendingInput, ProcessorKind, ProducedItem, slot_item};
use crate::reader::ReaderConfig;
use crate::shape::{QUADRANTS, QuadrantMask};
use crate::signal::{GoalSink, SignalNetwork};
use crate::structure::{Extension, Structure};

/// Shared resources a handler may touch.
pub(crate) struct HandlerEnv<'a> {
    pub shapes: &'a mut ShapeStore,
    pub goals: &'a mut dyn GoalSink,
    pub events: &'a mut EventBus,
    pub signals: &'a dyn SignalNetwork,
    pub reader_config: &'a ReaderConfig,
    pub now: Fixed64,
    pub tick: Ticks,
}

/// Run the handler for `structure`'s kind over `inputs`.
pub(crate) fn process_charge(
    env: &mut HandlerEnv<'_>,
    id: StructureId,
    structure: &mut Structure,
    inputs: &[PendingInput],
) -> Vec<ProducedItem> {
    let mut out = Vec::new();
    match structure.config.kind {
        ProcessorKind::Link | ProcessorKind::Balancer => balance(structure, inputs, &mut out),
        ProcessorKind::Cutter => {
            let shape = first_shape(inputs, "cutter");
            let halves = env.shapes.cut_half(shape, structure.config.facing);
            emit_required(env.shapes, &halves, &mut out);
        }
        ProcessorKind::CutterQuad => {
            let shape = first_shape(inputs, "quad cutter");
            let quarters = env.shapes.cut_quad(shape);
            emit_required(env.shapes, &quarters, &mut out);
        }
        ProcessorKind::CutterLaser => {
            let shape = first_shape(inputs, "laser cutter");
            let enabled = structure.enabled_pins(env.signals);
            let mut bits = 0u8;
            for (quadrant, on) in enabled.iter().enumerate() {
                if *on {
                    bits |= 1 << quadrant;
                }
            }
            let parts = env.shapes.cut_laser(shape, QuadrantMask::from_bits(bits));
            emit_required(env.shapes, &parts, &mut out);
        }
        ProcessorKind::Rotater => {
            let rotated = env.shapes.rotate_cw(first_shape(inputs, "rotater"));
            out.push(ProducedItem::tracked(Item::Shape(rotated), SlotPolicy::Any));
        }
        ProcessorKind::RotaterCcw => {
            let rotated = env.shapes.rotate_ccw(first_shape(inputs, "ccw rotater"));
            out.push(ProducedItem::tracked(Item::Shape(rotated), SlotPolicy::Any));
        }
        ProcessorKind::Rotater180 => {
            let rotated = env.shapes.rotate_180(first_shape(inputs, "180 rotater"));
            out.push(ProducedItem::tracked(Item::Shape(rotated), SlotPolicy::Any));
        }
        ProcessorKind::Stacker => {
            let lower = shape_on(inputs, 0, "stacker lower");
            let upper = shape_on(inputs, 1, "stacker upper");
            let stacked = env.shapes.stack(lower, upper);
            out.push(ProducedItem::tracked(Item::Shape(stacked), SlotPolicy::Any));
        }
        ProcessorKind::SmartStacker => {
            let main = shape_on(inputs, 0, "smart stacker main");
            let aux = [1, 2, 3].map(|slot| {
                slot_item(inputs, slot).map(|item| item.expect_shape("smart stacker aux"))
            });
            assert!(
                aux.iter().any(Option::is_some),
                "smart stacker charge has no auxiliary shape"
            );
            let stacked = env.shapes.smart_stack(main, aux);
            out.push(ProducedItem::tracked(Item::Shape(stacked), SlotPolicy::Any));
        }
        ProcessorKind::ShapeMerger => {
            let first = shape_on(inputs, 0, "merger first");
            let second = shape_on(inputs, 1, "merger second");
            let merged = env.shapes.merge(first, second);
            out.push(ProducedItem::tracked(Item::Shape(merged), SlotPolicy::Any));
        }
        ProcessorKind::Trash => {}
        ProcessorKind::Mixer => {
            assert!(inputs.len() >= 2, "mixer charge needs two colors");
            let a = inputs[0].item.expect_color("mixer first");
            let b = inputs[1].item.expect_color("mixer second");
            out.push(ProducedItem::tracked(
                Item::Color(a.mix_or_first(b)),
                SlotPolicy::Any,
            ));
        }
        ProcessorKind::Painter => {
            let shape = shape_on(inputs, 0, "painter");
            let color = color_on(inputs, 1, "painter");
            let painted = env.shapes.paint(shape, color);
            out.push(ProducedItem::tracked(Item::Shape(painted), SlotPolicy::Any));
        }
        ProcessorKind::PainterDouble => {
            let first = shape_on(inputs, 0, "double painter first");
            let second = shape_on(inputs, 1, "double painter second");
            let color = color_on(inputs, 2, "double painter");
            for shape in [first, second] {
                let painted = env.shapes.paint(shape, color);
                out.push(ProducedItem::tracked(Item::Shape(painted), SlotPolicy::Any));
            }
        }
        ProcessorKind::PainterQuad => {
            let shape = shape_on(inputs, 0, "quad painter");
            let mut colors = [None; QUADRANTS];
            for (quadrant, color) in colors.iter_mut().enumerate() {
                *color = slot_item(inputs, quadrant + 1)
                    .map(|item| item.expect_color("quad painter color"));
            }
            let painted = env.shapes.paint_quadrants(shape, colors);
            out.push(ProducedItem::tracked(Item::Shape(painted), SlotPolicy::Any));
        }
        ProcessorKind::Reader => {
            let item = slot_item(inputs, 0)
                .or_else(|| inputs.first().map(|p| &p.item))
                .copied();
            if let Some(item) = item {
                if let Extension::Reader(telemetry) = &mut structure.extension {
                    telemetry.observe(env.now, item, env.reader_config);
                }
                out.push(ProducedItem::untracked(item, SlotPolicy::Any));
            }
        }
        ProcessorKind::Hub => {
            for input in inputs {
                let shape = input.item.expect_shape("hub");
                env.goals.shape_delivered(shape, env.shapes.definition(shape));
                env.events.emit(Event::ShapeDelivered {
                    structure: id,
                    shape,
                    tick: env.tick,
                });
            }
        }
    }
    out
}

/// Round-robin distribution: each input prefers the slot after the one the
/// previous charge started at.
fn balance(structure: &mut Structure, inputs: &[PendingInput], out: &mut Vec<ProducedItem>) {
    let slots = structure.ejector.slot_count();
    assert!(slots > 0, "balancing structure has no ejector slots");
    let start = structure.state.next_output_slot % slots;
    structure.state.next_output_slot = structure.state.next_output_slot.wrapping_add(1);
    for (offset, input) in inputs.iter().enumerate() {
        out.push(ProducedItem::untracked(
            input.item,
            SlotPolicy::Preferred((start + offset) % slots),
        ));
    }
}

/// Emit each non-empty part on the slot with its index.
fn emit_required(shapes: &ShapeStore, parts: &[ShapeId], out: &mut Vec<ProducedItem>) {
    for (slot, &part) in parts.iter().enumerate() {
        if !shapes.is_entirely_empty(part) {
            out.push(ProducedItem::tracked(
                Item::Shape(part),
                SlotPolicy::Required(slot),
            ));
        }
    }
}

fn first_shape(inputs: &[PendingInput], context: &str) -> ShapeId {
    match inputs.first() {
        Some(input) => input.item.expect_shape(context),
        None => panic!("{context}: charge has no inputs"),
    }
}

fn shape_on(inputs: &[PendingInput], slot: usize, context: &str) -> ShapeId {
    match slot_item(inputs, slot) {
        Some(item) => item.expect_shape(context),
        None => panic!("{context}: no input on slot {slot}"),
    }
}

fn color_on(inputs: &[PendingInput], slot: usize, context: &str) -> crate::color::Color {
    match slot_item(inputs, slot) {
        Some(item) => item.expect_color(context),
        None => panic!("{context}: no input on slot {slot}"),
    }
}
