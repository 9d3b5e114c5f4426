use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a placed processing structure inside an [`crate::engine::Engine`].
    pub struct StructureId;
}

/// Handle to an interned shape definition in a [`crate::definitions::ShapeStore`].
///
/// Two handles from the same store are equal exactly when their canonical
/// short keys are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShapeId(pub u32);

/// Identifies a signal link (wire network) that a structure pin may read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SignalLinkId(pub u32);

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn shape_id_orders_by_index() {
        assert!(ShapeId(1) < ShapeId(2));
        assert_eq!(ShapeId(7), ShapeId(7));
    }

    #[test]
    fn structure_ids_are_distinct() {
        let mut sm = SlotMap::<StructureId, ()>::with_key();
        let a = sm.insert(());
        let b = sm.insert(());
        assert_ne!(a, b);
    }
}
