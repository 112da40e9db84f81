//! Input Routing
//!
//! Turns press/release pairs into tile gestures. Coordinates arrive in
//! board space; the host has already undone any viewport scaling.
//!
//! A release close to its press is a tap (`click`). Anything farther is
//! a flick in the dominant direction of travel. The tap radius is one
//! marble width, halved when the press starts near the wheel hole the
//! flick would empty, so ejecting a marble takes a shorter swipe.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::core::geometry::{BoardPoint, Direction};
use crate::game::config::Rules;

/// Pointer identifier supplied by the host.
pub type PointerId = u32;

/// A classified gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gesture {
    /// Short tap
    Click,
    /// Swipe in a direction
    Flick(Direction),
}

/// Direction of a displacement by its dominant axis.
///
/// Ties go to the vertical axis.
pub fn flick_direction(dx: i32, dy: i32) -> Direction {
    let dx2 = dx as i64 * dx as i64;
    let dy2 = dy as i64 * dy as i64;
    if dx2 > dy2 {
        if dx > 0 { Direction::Right } else { Direction::Left }
    } else if dy > 0 {
        Direction::Down
    } else {
        Direction::Up
    }
}

/// Classify a gesture.
///
/// `press_offset` is the press point relative to the top-left corner of
/// the tile under it; `(dx, dy)` is release minus press.
pub fn classify(rules: &Rules, press_offset: BoardPoint, dx: i32, dy: i32) -> Gesture {
    let dir = flick_direction(dx, dy);

    let mut threshold = rules.marble_size as i64;
    let near = rules.flick_near_radius() as i64;
    if press_offset.distance_squared(rules.hole_center(dir)) <= near * near {
        threshold /= 2;
    }

    let dist2 = dx as i64 * dx as i64 + dy as i64 * dy as i64;
    if dist2 <= threshold * threshold {
        Gesture::Click
    } else {
        Gesture::Flick(dir)
    }
}

/// Outstanding presses keyed by pointer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRouter {
    presses: BTreeMap<PointerId, BoardPoint>,
}

impl InputRouter {
    /// Create an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press; a repeated press on the same pointer moves it.
    pub fn press(&mut self, pointer: PointerId, at: BoardPoint) {
        self.presses.insert(pointer, at);
    }

    /// Match a release with its press.
    pub fn release(&mut self, pointer: PointerId) -> Option<BoardPoint> {
        self.presses.remove(&pointer)
    }

    /// Number of outstanding presses.
    pub fn pending(&self) -> usize {
        self.presses.len()
    }

    /// Drop every outstanding press.
    pub fn clear(&mut self) {
        self.presses.clear();
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // Tile center: 19 px from every hole
    const CENTER: BoardPoint = BoardPoint::new(38, 38);
    // Bottom-right corner: outside the up and left hole radius
    const CORNER: BoardPoint = BoardPoint::new(75, 75);

    #[test]
    fn test_small_move_is_click() {
        let rules = Rules::default();
        assert_eq!(classify(&rules, CORNER, 0, 0), Gesture::Click);
        assert_eq!(classify(&rules, CORNER, -30, -10), Gesture::Click);
    }

    #[test]
    fn test_positive_x_is_flick_right() {
        let rules = Rules::default();
        assert_eq!(classify(&rules, CORNER, 60, 5), Gesture::Flick(Direction::Right));
        assert_eq!(classify(&rules, CORNER, -60, 5), Gesture::Flick(Direction::Left));
        assert_eq!(classify(&rules, CORNER, 5, 60), Gesture::Flick(Direction::Down));
    }

    #[test]
    fn test_ties_go_vertical() {
        assert_eq!(flick_direction(40, 40), Direction::Down);
        assert_eq!(flick_direction(40, -40), Direction::Up);
        assert_eq!(flick_direction(0, 0), Direction::Up);
    }

    #[test]
    fn test_threshold_halved_near_hole() {
        let rules = Rules::default();
        // 25 px: a click far from a hole, a flick near one
        assert_eq!(classify(&rules, BoardPoint::new(2, 2), 25, 0), Gesture::Click);
        assert_eq!(classify(&rules, CENTER, 25, 0), Gesture::Flick(Direction::Right));
    }

    #[test]
    fn test_router_matches_pointers() {
        let mut router = InputRouter::new();
        router.press(1, BoardPoint::new(10, 10));
        router.press(2, BoardPoint::new(50, 50));
        router.press(1, BoardPoint::new(12, 10));

        assert_eq!(router.pending(), 2);
        assert_eq!(router.release(1), Some(BoardPoint::new(12, 10)));
        assert_eq!(router.release(1), None);
        assert_eq!(router.release(3), None);
        assert_eq!(router.pending(), 1);
    }

    proptest! {
        #[test]
        fn tiny_moves_always_click(ox in 0i32..76, oy in 0i32..76, dx in -13i32..=13, dy in -13i32..=13) {
            let rules = Rules::default();
            prop_assert_eq!(classify(&rules, BoardPoint::new(ox, oy), dx, dy), Gesture::Click);
        }

        #[test]
        fn long_moves_always_flick(ox in 0i32..76, oy in 0i32..76, dx in -200i32..200, dy in -200i32..200) {
            prop_assume!(dx * dx + dy * dy > 38 * 38);
            let rules = Rules::default();
            prop_assert_eq!(
                classify(&rules, BoardPoint::new(ox, oy), dx, dy),
                Gesture::Flick(flick_direction(dx, dy))
            );
        }
    }
}
