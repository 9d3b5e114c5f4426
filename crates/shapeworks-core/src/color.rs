//! Paint colors and the additive mixing table.
//!
//! Colors mix like light: each color is a set of primary components
//! (red, green, blue) and mixing takes the union. `White` holds all three
//! primaries, so it absorbs anything it is mixed with. `Uncolored` has no
//! components and does not mix.

use serde::{Deserialize, Serialize};

/// A paint color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
    Cyan,
    White,
    Uncolored,
}

const RED: u8 = 0b001;
const GREEN: u8 = 0b010;
const BLUE: u8 = 0b100;

impl Color {
    /// Every color, in declaration order.
    pub const ALL: [Color; 8] = [
        Color::Red,
        Color::Green,
        Color::Blue,
        Color::Yellow,
        Color::Purple,
        Color::Cyan,
        Color::White,
        Color::Uncolored,
    ];

    /// Single-character code used in shape short keys.
    pub fn code(self) -> char {
        match self {
            Color::Red => 'r',
            Color::Green => 'g',
            Color::Blue => 'b',
            Color::Yellow => 'y',
            Color::Purple => 'p',
            Color::Cyan => 'c',
            Color::White => 'w',
            Color::Uncolored => 'u',
        }
    }

    /// Parse a short-key color code.
    pub fn from_code(code: char) -> Option<Color> {
        Color::ALL.into_iter().find(|c| c.code() == code)
    }

    fn components(self) -> u8 {
        match self {
            Color::Red => RED,
            Color::Green => GREEN,
            Color::Blue => BLUE,
            Color::Yellow => RED | GREEN,
            Color::Purple => RED | BLUE,
            Color::Cyan => GREEN | BLUE,
            Color::White => RED | GREEN | BLUE,
            Color::Uncolored => 0,
        }
    }

    fn from_components(components: u8) -> Option<Color> {
        match components {
            RED => Some(Color::Red),
            GREEN => Some(Color::Green),
            BLUE => Some(Color::Blue),
            c if c == RED | GREEN => Some(Color::Yellow),
            c if c == RED | BLUE => Some(Color::Purple),
            c if c == GREEN | BLUE => Some(Color::Cyan),
            c if c == RED | GREEN | BLUE => Some(Color::White),
            _ => None,
        }
    }

    /// Look up the mixing table. `None` means the pair has no defined result.
    pub fn mix(self, other: Color) -> Option<Color> {
        if self == Color::Uncolored || other == Color::Uncolored {
            return None;
        }
        Color::from_components(self.components() | other.components())
    }

    /// Mix two colors, falling back to `self` when the table has no entry.
    pub fn mix_or_first(self, other: Color) -> Color {
        self.mix(other).unwrap_or(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primaries_mix_to_secondaries() {
        assert_eq!(Color::Red.mix(Color::Green), Some(Color::Yellow));
        assert_eq!(Color::Red.mix(Color::Blue), Some(Color::Purple));
        assert_eq!(Color::Green.mix(Color::Blue), Some(Color::Cyan));
    }

    #[test]
    fn complements_mix_to_white() {
        assert_eq!(Color::Red.mix(Color::Cyan), Some(Color::White));
        assert_eq!(Color::Blue.mix(Color::Yellow), Some(Color::White));
        assert_eq!(Color::Purple.mix(Color::Cyan), Some(Color::White));
    }

    #[test]
    fn mixing_is_symmetric_and_idempotent() {
        for a in Color::ALL {
            for b in Color::ALL {
                assert_eq!(a.mix(b), b.mix(a), "{a:?} + {b:?}");
            }
            if a != Color::Uncolored {
                assert_eq!(a.mix(a), Some(a));
            }
        }
    }

    #[test]
    fn white_absorbs() {
        for c in Color::ALL.into_iter().filter(|c| *c != Color::Uncolored) {
            assert_eq!(Color::White.mix(c), Some(Color::White));
        }
    }

    #[test]
    fn uncolored_falls_back_to_first_input() {
        assert_eq!(Color::Uncolored.mix(Color::Red), None);
        assert_eq!(Color::Uncolored.mix_or_first(Color::Red), Color::Uncolored);
        assert_eq!(Color::Red.mix_or_first(Color::Uncolored), Color::Red);
    }

    #[test]
    fn codes_round_trip() {
        for c in Color::ALL {
            assert_eq!(Color::from_code(c.code()), Some(c));
        }
        assert_eq!(Color::from_code('x'), None);
    }
}
