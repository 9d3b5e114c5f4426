//! Interned shape definitions and the derivation cache.
//!
//! [`ShapeStore`] is the arena every [`ShapeId`] points into. Registering a
//! definition whose canonical key is already known returns the existing
//! handle, so equal shapes always share one handle.
//!
//! Derived shapes (cut halves, rotations, stacks, ...) are memoized in a
//! cache keyed by the operation, its scalar arguments and the operand
//! handles. The cache only grows; [`ShapeStore::clear`] drops it together
//! with the arena when a simulation is reset.

use std::collections::HashMap;

use tracing::trace;

use crate::color::Color;
use crate::id::ShapeId;
use crate::ports::Direction;
use crate::shape::{QUADRANTS, QuadrantMask, ShapeDefinition, ShapeKeyError, SubShape};

/// A cacheable shape operation together with its scalar arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CutHalf,
    CutLaser(QuadrantMask),
    CutQuad,
    RotateCw,
    RotateCcw,
    Rotate180,
    Stack,
    Merge,
    Paint(Color),
    PaintQuadrants([Option<Color>; QUADRANTS]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    operation: Operation,
    first: ShapeId,
    second: Option<ShapeId>,
}

/// Hit and miss counters of the derivation cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Arena of interned shapes plus the derivation cache.
#[derive(Debug, Default)]
pub struct ShapeStore {
    definitions: Vec<ShapeDefinition>,
    keys: Vec<String>,
    by_key: HashMap<String, ShapeId>,
    cache: HashMap<CacheKey, Vec<ShapeId>>,
    stats: CacheStats,
}

impl ShapeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of interned shapes.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Number of memoized derivations.
    pub fn cached_derivations(&self) -> usize {
        self.cache.len()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.stats
    }

    /// Drop every interned shape and cached derivation. Handles issued
    /// before the call are invalid afterwards.
    pub fn clear(&mut self) {
        self.definitions.clear();
        self.keys.clear();
        self.by_key.clear();
        self.cache.clear();
        self.stats = CacheStats::default();
    }

    // -----------------------------------------------------------------------
    // Interning
    // -----------------------------------------------------------------------

    /// Register a definition, or return the handle of the equal definition
    /// registered earlier.
    pub fn intern(&mut self, definition: ShapeDefinition) -> ShapeId {
        let key = definition.short_key();
        if let Some(&id) = self.by_key.get(&key) {
            return id;
        }
        let id = ShapeId(self.definitions.len() as u32);
        self.definitions.push(definition);
        self.keys.push(key.clone());
        self.by_key.insert(key, id);
        id
    }

    /// Parse a short key and intern the result.
    pub fn from_short_key(&mut self, key: &str) -> Result<ShapeId, ShapeKeyError> {
        if let Some(&id) = self.by_key.get(key) {
            return Ok(id);
        }
        let definition = ShapeDefinition::from_short_key(key)?;
        Ok(self.intern(definition))
    }

    /// Intern a single-layer shape from four optional outlines, all painted
    /// `color`.
    pub fn from_simple_shapes(
        &mut self,
        quadrants: [Option<SubShape>; QUADRANTS],
        color: Color,
    ) -> ShapeId {
        self.intern(ShapeDefinition::single_layer(quadrants, color))
    }

    /// Handle of an already interned canonical key.
    pub fn lookup(&self, key: &str) -> Option<ShapeId> {
        self.by_key.get(key).copied()
    }

    pub fn get(&self, id: ShapeId) -> Option<&ShapeDefinition> {
        self.definitions.get(id.0 as usize)
    }

    /// The definition behind a handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle was not issued by this store.
    pub fn definition(&self, id: ShapeId) -> &ShapeDefinition {
        match self.definitions.get(id.0 as usize) {
            Some(definition) => definition,
            None => panic!("shape handle {id:?} is not registered in this store"),
        }
    }

    /// Canonical short key of a handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle was not issued by this store.
    pub fn short_key(&self, id: ShapeId) -> &str {
        match self.keys.get(id.0 as usize) {
            Some(key) => key,
            None => panic!("shape handle {id:?} is not registered in this store"),
        }
    }

    pub fn is_entirely_empty(&self, id: ShapeId) -> bool {
        self.definition(id).is_entirely_empty()
    }

    // -----------------------------------------------------------------------
    // Cached derivations
    // -----------------------------------------------------------------------

    fn derive<const N: usize>(
        &mut self,
        operation: Operation,
        first: ShapeId,
        second: Option<ShapeId>,
        compute: impl FnOnce(&ShapeDefinition, Option<&ShapeDefinition>) -> [ShapeDefinition; N],
    ) -> [ShapeId; N] {
        let key = CacheKey {
            operation,
            first,
            second,
        };
        let mut out = [ShapeId(0); N];
        if let Some(cached) = self.cache.get(&key) {
            self.stats.hits += 1;
            out.copy_from_slice(cached);
            return out;
        }

        self.stats.misses += 1;
        let results = compute(
            self.definition(first),
            second.map(|id| self.definition(id)),
        );
        for (slot, definition) in out.iter_mut().zip(results) {
            *slot = self.intern(definition);
        }
        trace!(?operation, ?first, ?second, results = ?out, "derived shape");
        self.cache.insert(key, out.to_vec());
        out
    }

    /// Split into `[left half, right half]`: quadrants {2, 3} and {0, 1}.
    ///
    /// The cutter's facing is accepted for call-site symmetry with the other
    /// processors but does not change which halves are produced.
    pub fn cut_half(&mut self, shape: ShapeId, _facing: Direction) -> [ShapeId; 2] {
        self.derive(Operation::CutHalf, shape, None, |def, _| {
            [
                def.filtered(QuadrantMask::of(&[2, 3])),
                def.filtered(QuadrantMask::of(&[0, 1])),
            ]
        })
    }

    /// Split into `[wanted, unwanted]` where `unwanted` holds the quadrants
    /// in `unwanted_mask`.
    pub fn cut_laser(&mut self, shape: ShapeId, unwanted_mask: QuadrantMask) -> [ShapeId; 2] {
        self.derive(Operation::CutLaser(unwanted_mask), shape, None, |def, _| {
            [
                def.filtered(unwanted_mask.complement()),
                def.filtered(unwanted_mask),
            ]
        })
    }

    /// Split into four shapes holding one quadrant each, in quadrant order.
    pub fn cut_quad(&mut self, shape: ShapeId) -> [ShapeId; 4] {
        self.derive(Operation::CutQuad, shape, None, |def, _| {
            [0, 1, 2, 3].map(|q| def.filtered(QuadrantMask::of(&[q])))
        })
    }

    pub fn rotate_cw(&mut self, shape: ShapeId) -> ShapeId {
        let [out] = self.derive(Operation::RotateCw, shape, None, |def, _| [def.rotated_cw()]);
        out
    }

    pub fn rotate_ccw(&mut self, shape: ShapeId) -> ShapeId {
        let [out] = self.derive(Operation::RotateCcw, shape, None, |def, _| [def.rotated_ccw()]);
        out
    }

    pub fn rotate_180(&mut self, shape: ShapeId) -> ShapeId {
        let [out] = self.derive(Operation::Rotate180, shape, None, |def, _| [def.rotated_180()]);
        out
    }

    /// Stack `upper` onto `lower`, capped at four layers.
    pub fn stack(&mut self, lower: ShapeId, upper: ShapeId) -> ShapeId {
        let [out] = self.derive(Operation::Stack, lower, Some(upper), |def, other| {
            [def.stacked_with(other.unwrap_or(def))]
        });
        out
    }

    /// Layer-wise merge; `first`'s cells win where both are occupied.
    pub fn merge(&mut self, first: ShapeId, second: ShapeId) -> ShapeId {
        let [out] = self.derive(Operation::Merge, first, Some(second), |def, other| {
            [def.merged_with(other.unwrap_or(def))]
        });
        out
    }

    pub fn paint(&mut self, shape: ShapeId, color: Color) -> ShapeId {
        let [out] = self.derive(Operation::Paint(color), shape, None, |def, _| {
            [def.painted(color)]
        });
        out
    }

    /// Recolor per quadrant; a `None` entry leaves that quadrant unchanged.
    pub fn paint_quadrants(&mut self, shape: ShapeId, colors: [Option<Color>; QUADRANTS]) -> ShapeId {
        let [out] = self.derive(Operation::PaintQuadrants(colors), shape, None, |def, _| {
            [def.painted_quadrants(colors)]
        });
        out
    }

    /// Stack each present auxiliary shape onto `main` in slot order, with
    /// the usual four-layer cap. Not memoized.
    pub fn smart_stack(&mut self, main: ShapeId, aux: [Option<ShapeId>; 3]) -> ShapeId {
        let mut result = self.definition(main).clone();
        for id in aux.into_iter().flatten() {
            result = result.stacked_with(self.definition(id));
        }
        self.intern(result)
    }
}
