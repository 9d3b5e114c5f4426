//! Outside collaborators the engine consults while ticking: signal links
//! for wired pins and the goal sink for delivered shapes.

use std::collections::BTreeMap;

use crate::id::{ShapeId, SignalLinkId};
use crate::item::{Item, is_truthy};
use crate::shape::ShapeDefinition;

/// Number of signal pins on a wired structure.
pub const PIN_COUNT: usize = 4;

/// Signal links attached to a wired structure's pins.
pub type PinLinks = [Option<SignalLinkId>; PIN_COUNT];

/// Read access to the current value of signal links.
pub trait SignalNetwork {
    /// Current value of `link`, or `None` when nothing drives it.
    fn value(&self, link: SignalLinkId) -> Option<Item>;
}

impl SignalNetwork for BTreeMap<SignalLinkId, Item> {
    fn value(&self, link: SignalLinkId) -> Option<Item> {
        self.get(&link).copied()
    }
}

/// A network with no driven links.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSignals;

impl SignalNetwork for NoSignals {
    fn value(&self, _link: SignalLinkId) -> Option<Item> {
        None
    }
}

/// Whether a pin is enabled: it must be linked and its value truthy.
pub fn pin_enabled(signals: &dyn SignalNetwork, link: Option<SignalLinkId>) -> bool {
    link.is_some_and(|l| is_truthy(signals.value(l).as_ref()))
}

/// Receives shapes consumed by hub structures.
pub trait GoalSink {
    fn shape_delivered(&mut self, shape: ShapeId, definition: &ShapeDefinition);
}

/// A goal sink that ignores deliveries.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardGoals;

impl GoalSink for DiscardGoals {
    fn shape_delivered(&mut self, _shape: ShapeId, _definition: &ShapeDefinition) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    #[test]
    fn pins_need_link_and_truthy_value() {
        let mut signals = BTreeMap::new();
        signals.insert(SignalLinkId(1), Item::Boolean(true));
        signals.insert(SignalLinkId(2), Item::Boolean(false));
        signals.insert(SignalLinkId(3), Item::Color(Color::Red));

        assert!(!pin_enabled(&signals, None));
        assert!(pin_enabled(&signals, Some(SignalLinkId(1))));
        assert!(!pin_enabled(&signals, Some(SignalLinkId(2))));
        assert!(pin_enabled(&signals, Some(SignalLinkId(3))));
        assert!(!pin_enabled(&signals, Some(SignalLinkId(4))));
        assert!(!pin_enabled(&NoSignals, Some(SignalLinkId(1))));
    }
}
