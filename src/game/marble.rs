//! Marbles
//!
//! A marble is a point in board space with a heading, a color and a
//! speed. Movement is integer-only: the board advances a marble one
//! pixel at a time so every decision point is hit exactly.

use serde::{Serialize, Deserialize};

use crate::core::geometry::{BoardPoint, Direction};
use crate::core::hash::StateHasher;

/// Color code of the wild marble, matched by every color rule.
pub const WILD_COLOR: u8 = 8;

/// Highest valid marble color.
pub const MAX_COLOR: u8 = 8;

/// Stable identifier of a live marble.
///
/// Assigned monotonically by the board so iteration order is
/// creation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MarbleId(pub u32);

/// Does `color` satisfy a rule asking for `wanted`?
#[inline]
pub fn color_matches(color: u8, wanted: u8) -> bool {
    color == wanted || color == WILD_COLOR
}

/// A live marble.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marble {
    /// Identifier
    pub id: MarbleId,
    /// Center position
    pub position: BoardPoint,
    /// Heading
    pub direction: Direction,
    /// Color code (0-8)
    pub color: u8,
    /// Pixels per tick
    pub speed: i32,
}

impl Marble {
    /// Create a marble.
    pub fn new(id: MarbleId, position: BoardPoint, direction: Direction, color: u8, speed: i32) -> Self {
        Self {
            id,
            position,
            direction,
            color: color.min(MAX_COLOR),
            speed,
        }
    }

    /// Move one pixel along the current heading.
    #[inline]
    pub fn step(&mut self) {
        self.position.x += self.direction.dx();
        self.position.y += self.direction.dy();
    }

    /// Hash the marble into state.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.id.0);
        hasher.update_i32(self.position.x);
        hasher.update_i32(self.position.y);
        hasher.update_u8(self.direction as u8);
        hasher.update_u8(self.color);
        hasher.update_i32(self.speed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_follows_direction() {
        let mut marble = Marble::new(MarbleId(1), BoardPoint::new(10, 10), Direction::Left, 2, 3);
        marble.step();
        assert_eq!(marble.position, BoardPoint::new(9, 10));

        marble.direction = Direction::Up;
        marble.step();
        assert_eq!(marble.position, BoardPoint::new(9, 9));
    }

    #[test]
    fn test_wild_matches_everything() {
        assert!(color_matches(WILD_COLOR, 3));
        assert!(color_matches(3, 3));
        assert!(!color_matches(2, 3));
    }

    #[test]
    fn test_color_clamped() {
        let marble = Marble::new(MarbleId(0), BoardPoint::default(), Direction::Down, 12, 3);
        assert_eq!(marble.color, WILD_COLOR);
    }
}
