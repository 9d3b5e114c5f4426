//! Layered shape values and the pure transforms over them.
//!
//! A shape is a stack of at most [`MAX_LAYERS`] layers, bottom first. Each
//! layer holds four quadrant cells, indexed clockwise from the top-right
//! corner: 0 = top-right, 1 = bottom-right, 2 = bottom-left, 3 = top-left.
//!
//! Everything in this module is a pure function of plain values. Interning
//! and caching live in [`crate::definitions::ShapeStore`].

use serde::{Deserialize, Serialize};

use crate::color::Color;

/// Maximum number of layers a shape may hold.
pub const MAX_LAYERS: usize = 4;

/// Number of quadrants per layer.
pub const QUADRANTS: usize = 4;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from parsing a shape short key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeKeyError {
    #[error("layer {layer} has {len} characters, expected 8")]
    LayerLength { layer: usize, len: usize },
    #[error("unknown subshape code {0:?}")]
    UnknownSubShape(char),
    #[error("unknown color code {0:?}")]
    UnknownColor(char),
    #[error("shape has {0} layers, at most 4 are allowed")]
    TooManyLayers(usize),
}

// ---------------------------------------------------------------------------
// Cells and layers
// ---------------------------------------------------------------------------

/// The outline of a single quadrant piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SubShape {
    Rect,
    Circle,
    Star,
    Windmill,
}

impl SubShape {
    pub const ALL: [SubShape; 4] = [
        SubShape::Rect,
        SubShape::Circle,
        SubShape::Star,
        SubShape::Windmill,
    ];

    pub fn code(self) -> char {
        match self {
            SubShape::Rect => 'R',
            SubShape::Circle => 'C',
            SubShape::Star => 'S',
            SubShape::Windmill => 'W',
        }
    }

    pub fn from_code(code: char) -> Option<SubShape> {
        SubShape::ALL.into_iter().find(|s| s.code() == code)
    }
}

/// One occupied quadrant: an outline plus its paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShapeCell {
    pub subshape: SubShape,
    pub color: Color,
}

impl ShapeCell {
    pub fn new(subshape: SubShape, color: Color) -> Self {
        Self { subshape, color }
    }
}

/// Four quadrant cells; `None` is an empty quadrant.
pub type ShapeLayer = [Option<ShapeCell>; QUADRANTS];

const EMPTY_LAYER: ShapeLayer = [None; QUADRANTS];

fn layer_is_empty(layer: &ShapeLayer) -> bool {
    layer.iter().all(Option::is_none)
}

// ---------------------------------------------------------------------------
// Quadrant masks
// ---------------------------------------------------------------------------

/// A set of quadrant indices, stored as the low four bits of a byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct QuadrantMask(u8);

impl QuadrantMask {
    pub const NONE: QuadrantMask = QuadrantMask(0);
    pub const ALL: QuadrantMask = QuadrantMask(0b1111);

    /// Build a mask from raw bits; bits above the fourth are discarded.
    pub fn from_bits(bits: u8) -> Self {
        Self(bits & 0b1111)
    }

    pub fn of(quadrants: &[usize]) -> Self {
        let mut bits = 0u8;
        for &q in quadrants {
            assert!(q < QUADRANTS, "quadrant index {q} out of range");
            bits |= 1 << q;
        }
        Self(bits)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, quadrant: usize) -> bool {
        quadrant < QUADRANTS && self.0 & (1 << quadrant) != 0
    }

    pub fn complement(self) -> Self {
        Self(!self.0 & 0b1111)
    }
}

// ---------------------------------------------------------------------------
// ShapeDefinition
// ---------------------------------------------------------------------------

/// An immutable layered shape in canonical form.
///
/// Canonical form has no trailing (topmost) empty layers. Interior empty
/// layers are kept so that halves produced by a cut stay layer-aligned and
/// merge back to the original.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShapeDefinition {
    layers: Vec<ShapeLayer>,
}

impl ShapeDefinition {
    /// Build a shape from layers, bottom first. Trailing empty layers are
    /// trimmed.
    ///
    /// # Panics
    ///
    /// Panics if more than [`MAX_LAYERS`] layers are given.
    pub fn new(mut layers: Vec<ShapeLayer>) -> Self {
        assert!(
            layers.len() <= MAX_LAYERS,
            "shape has {} layers, at most {MAX_LAYERS} allowed",
            layers.len()
        );
        while layers.last().is_some_and(layer_is_empty) {
            layers.pop();
        }
        Self { layers }
    }

    /// The shape with no layers at all.
    pub fn empty() -> Self {
        Self { layers: Vec::new() }
    }

    /// A single-layer shape with the given outlines, all painted `color`.
    pub fn single_layer(quadrants: [Option<SubShape>; QUADRANTS], color: Color) -> Self {
        Self::new(vec![quadrants.map(|s| s.map(|subshape| ShapeCell::new(subshape, color)))])
    }

    pub fn layers(&self) -> &[ShapeLayer] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// True if every cell of every layer is empty.
    pub fn is_entirely_empty(&self) -> bool {
        self.layers.iter().all(layer_is_empty)
    }

    /// True if any layer has a cell in `quadrant`.
    pub fn occupies_quadrant(&self, quadrant: usize) -> bool {
        self.layers.iter().any(|layer| layer[quadrant].is_some())
    }

    // -- Short key --------------------------------------------------------

    /// Deterministic string encoding, e.g. `"CuCuCuCu:--Rr--Rr"`.
    pub fn short_key(&self) -> String {
        let mut key = String::with_capacity(self.layers.len() * 9);
        for (i, layer) in self.layers.iter().enumerate() {
            if i > 0 {
                key.push(':');
            }
            for cell in layer {
                match cell {
                    Some(cell) => {
                        key.push(cell.subshape.code());
                        key.push(cell.color.code());
                    }
                    None => key.push_str("--"),
                }
            }
        }
        key
    }

    /// Parse a short key. The result is canonical even if the key is not.
    pub fn from_short_key(key: &str) -> Result<Self, ShapeKeyError> {
        if key.is_empty() {
            return Ok(Self::empty());
        }
        let parts: Vec<&str> = key.split(':').collect();
        if parts.len() > MAX_LAYERS {
            return Err(ShapeKeyError::TooManyLayers(parts.len()));
        }

        let mut layers = Vec::with_capacity(parts.len());
        for (index, part) in parts.iter().enumerate() {
            let chars: Vec<char> = part.chars().collect();
            if chars.len() != QUADRANTS * 2 {
                return Err(ShapeKeyError::LayerLength {
                    layer: index,
                    len: chars.len(),
                });
            }
            let mut layer = EMPTY_LAYER;
            for (q, pair) in chars.chunks(2).enumerate() {
                layer[q] = match (pair[0], pair[1]) {
                    ('-', '-') => None,
                    (s, c) => {
                        let subshape =
                            SubShape::from_code(s).ok_or(ShapeKeyError::UnknownSubShape(s))?;
                        let color = Color::from_code(c).ok_or(ShapeKeyError::UnknownColor(c))?;
                        Some(ShapeCell::new(subshape, color))
                    }
                };
            }
            layers.push(layer);
        }
        Ok(Self::new(layers))
    }

    // -- Transforms -------------------------------------------------------

    /// Keep only the cells in `keep`, in every layer.
    pub fn filtered(&self, keep: QuadrantMask) -> Self {
        let layers = self
            .layers
            .iter()
            .map(|layer| {
                let mut out = EMPTY_LAYER;
                for q in 0..QUADRANTS {
                    if keep.contains(q) {
                        out[q] = layer[q];
                    }
                }
                out
            })
            .collect();
        Self::new(layers)
    }

    /// Rotate every layer by `steps` quarter turns clockwise.
    fn rotated(&self, steps: usize) -> Self {
        let layers = self
            .layers
            .iter()
            .map(|layer| {
                let mut out = EMPTY_LAYER;
                for (q, cell) in out.iter_mut().enumerate() {
                    *cell = layer[(q + QUADRANTS - steps % QUADRANTS) % QUADRANTS];
                }
                out
            })
            .collect();
        Self { layers }
    }

    pub fn rotated_cw(&self) -> Self {
        self.rotated(1)
    }

    pub fn rotated_ccw(&self) -> Self {
        self.rotated(3)
    }

    pub fn rotated_180(&self) -> Self {
        self.rotated(2)
    }

    /// Put `upper`'s layers on top of this shape's, keeping at most
    /// [`MAX_LAYERS`] layers in total.
    pub fn stacked_with(&self, upper: &ShapeDefinition) -> Self {
        let mut layers = self.layers.clone();
        layers.extend(upper.layers.iter().copied());
        layers.truncate(MAX_LAYERS);
        Self::new(layers)
    }

    /// Cell-wise union, layer by layer. Where both shapes occupy a cell the
    /// cell of `self` wins.
    pub fn merged_with(&self, other: &ShapeDefinition) -> Self {
        let count = self.layers.len().max(other.layers.len());
        let layers = (0..count)
            .map(|i| {
                let a = self.layers.get(i).unwrap_or(&EMPTY_LAYER);
                let b = other.layers.get(i).unwrap_or(&EMPTY_LAYER);
                let mut out = EMPTY_LAYER;
                for q in 0..QUADRANTS {
                    out[q] = a[q].or(b[q]);
                }
                out
            })
            .collect();
        Self::new(layers)
    }

    /// Recolor every occupied cell.
    pub fn painted(&self, color: Color) -> Self {
        self.painted_quadrants([Some(color); QUADRANTS])
    }

    /// Recolor occupied cells per quadrant; `None` leaves a quadrant as is.
    pub fn painted_quadrants(&self, colors: [Option<Color>; QUADRANTS]) -> Self {
        let layers = self
            .layers
            .iter()
            .map(|layer| {
                let mut out = *layer;
                for (cell, color) in out.iter_mut().zip(colors) {
                    if let (Some(cell), Some(color)) = (cell.as_mut(), color) {
                        cell.color = color;
                    }
                }
                out
            })
            .collect();
        Self { layers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(key: &str) -> ShapeDefinition {
        ShapeDefinition::from_short_key(key).unwrap()
    }

    #[test]
    fn short_key_round_trips() {
        for key in ["CuCuCuCu", "RrSg--Wb", "CuCuCuCu:--Rr--Rr", "--------:Cu------"] {
            assert_eq!(parse(key).short_key(), key);
        }
    }

    #[test]
    fn trailing_empty_layers_are_trimmed() {
        let shape = parse("CuCuCuCu:--------");
        assert_eq!(shape.layer_count(), 1);
        assert_eq!(shape.short_key(), "CuCuCuCu");
        assert_eq!(parse("--------").short_key(), "");
    }

    #[test]
    fn parse_errors() {
        assert_eq!(
            ShapeDefinition::from_short_key("CuCu"),
            Err(ShapeKeyError::LayerLength { layer: 0, len: 4 })
        );
        assert_eq!(
            ShapeDefinition::from_short_key("XuCuCuCu"),
            Err(ShapeKeyError::UnknownSubShape('X'))
        );
        assert_eq!(
            ShapeDefinition::from_short_key("CzCuCuCu"),
            Err(ShapeKeyError::UnknownColor('z'))
        );
        assert_eq!(
            ShapeDefinition::from_short_key("Cu------:Cu------:Cu------:Cu------:Cu------"),
            Err(ShapeKeyError::TooManyLayers(5))
        );
    }

    #[test]
    fn rotate_cw_moves_top_right_to_bottom_right() {
        let shape = parse("Cr------");
        assert_eq!(shape.rotated_cw().short_key(), "--Cr----");
        assert_eq!(shape.rotated_ccw().short_key(), "------Cr");
        assert_eq!(shape.rotated_180().short_key(), "----Cr--");
    }

    #[test]
    fn four_clockwise_turns_are_identity() {
        let shape = parse("CrRgSbWy:--Cu--Ru");
        let turned = shape.rotated_cw().rotated_cw().rotated_cw().rotated_cw();
        assert_eq!(turned, shape);
    }

    #[test]
    fn filter_keeps_selected_quadrants() {
        let shape = parse("CrRgSbWy");
        assert_eq!(shape.filtered(QuadrantMask::of(&[2, 3])).short_key(), "----SbWy");
        assert_eq!(shape.filtered(QuadrantMask::of(&[0, 1])).short_key(), "CrRg----");
    }

    #[test]
    fn filter_preserves_interior_empty_layers() {
        let shape = parse("Cu------:------Cu");
        let left = shape.filtered(QuadrantMask::of(&[2, 3]));
        assert_eq!(left.short_key(), "--------:------Cu");
        let right = shape.filtered(QuadrantMask::of(&[0, 1]));
        assert_eq!(right.short_key(), "Cu------");
        assert_eq!(left.merged_with(&right), shape);
    }

    #[test]
    fn stack_caps_layers() {
        let lower = parse("Cu------:Cu------:Cu------");
        let upper = parse("Ru------:Ru------");
        let stacked = lower.stacked_with(&upper);
        assert_eq!(stacked.layer_count(), MAX_LAYERS);
        assert_eq!(stacked.short_key(), "Cu------:Cu------:Cu------:Ru------");
    }

    #[test]
    fn merge_prefers_first_shape() {
        let a = parse("Cr------");
        let b = parse("RgRg----");
        assert_eq!(a.merged_with(&b).short_key(), "CrRg----");
    }

    #[test]
    fn paint_quadrants_leaves_none_untouched() {
        let shape = parse("CuCuCuCu:CuCuCuCu");
        let painted = shape.painted_quadrants([Some(Color::Red), None, None, Some(Color::Blue)]);
        assert_eq!(painted.short_key(), "CrCuCuCb:CrCuCuCb");
        assert_eq!(shape.painted(Color::Green).short_key(), "CgCgCgCg:CgCgCgCg");
    }

    #[test]
    fn quadrant_occupancy_spans_layers() {
        let shape = parse("Cu------:----Ru--");
        assert!(shape.occupies_quadrant(0));
        assert!(!shape.occupies_quadrant(1));
        assert!(shape.occupies_quadrant(2));
        assert!(!shape.occupies_quadrant(3));
    }

    #[test]
    fn mask_complement() {
        let mask = QuadrantMask::of(&[0, 2]);
        assert_eq!(mask.complement(), QuadrantMask::of(&[1, 3]));
        assert_eq!(QuadrantMask::from_bits(0xff), QuadrantMask::ALL);
    }
}
