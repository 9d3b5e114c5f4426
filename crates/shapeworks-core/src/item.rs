//! Items that travel between structures.

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::id::ShapeId;

/// An immutable item value. Shapes are carried as interned handles, so
/// equality of two shape items is equality of their canonical keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Item {
    Shape(ShapeId),
    Color(Color),
    Boolean(bool),
}

/// Discriminant of [`Item`], used by acceptor slot filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Shape,
    Color,
    Boolean,
}

impl Item {
    pub fn kind(&self) -> ItemKind {
        match self {
            Item::Shape(_) => ItemKind::Shape,
            Item::Color(_) => ItemKind::Color,
            Item::Boolean(_) => ItemKind::Boolean,
        }
    }

    /// Signal truthiness: a boolean is its own value, every other item is
    /// true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Item::Boolean(value) => *value,
            Item::Shape(_) | Item::Color(_) => true,
        }
    }

    pub fn as_shape(&self) -> Option<ShapeId> {
        match self {
            Item::Shape(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            Item::Color(color) => Some(*color),
            _ => None,
        }
    }

    /// The shape handle of a shape item.
    ///
    /// # Panics
    ///
    /// Panics if the item is not a shape. Handlers only ever see items that
    /// passed admission, so a mismatch is a wiring bug.
    pub fn expect_shape(&self, context: &str) -> ShapeId {
        match self {
            Item::Shape(id) => *id,
            other => panic!("{context}: expected a shape item, got {other:?}"),
        }
    }

    /// The color of a color item.
    ///
    /// # Panics
    ///
    /// Panics if the item is not a color.
    pub fn expect_color(&self, context: &str) -> Color {
        match self {
            Item::Color(color) => *color,
            other => panic!("{context}: expected a color item, got {other:?}"),
        }
    }
}

/// Truthiness of an optional signal value. An absent signal is false.
pub fn is_truthy(item: Option<&Item>) -> bool {
    item.is_some_and(Item::is_truthy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some(&Item::Boolean(false))));
        assert!(is_truthy(Some(&Item::Boolean(true))));
        assert!(is_truthy(Some(&Item::Color(Color::Uncolored))));
        assert!(is_truthy(Some(&Item::Shape(ShapeId(0)))));
    }

    #[test]
    fn kinds() {
        assert_eq!(Item::Shape(ShapeId(3)).kind(), ItemKind::Shape);
        assert_eq!(Item::Color(Color::Red).kind(), ItemKind::Color);
        assert_eq!(Item::Boolean(true).kind(), ItemKind::Boolean);
    }

    #[test]
    fn accessors() {
        assert_eq!(Item::Shape(ShapeId(3)).as_shape(), Some(ShapeId(3)));
        assert_eq!(Item::Color(Color::Red).as_shape(), None);
        assert_eq!(Item::Color(Color::Red).as_color(), Some(Color::Red));
    }

    #[test]
    #[should_panic(expected = "expected a shape item")]
    fn expect_shape_panics_on_color() {
        Item::Color(Color::Red).expect_shape("cutter");
    }
}
