//! Wheels
//!
//! The goal tile. A wheel has four holes, one per direction. Marbles
//! enter through the rim, drop into a hole and stay there until the
//! wheel completes or the player flicks them back out.

use serde::{Serialize, Deserialize};

use crate::core::geometry::Direction;
use crate::core::hash::StateHasher;
use crate::game::marble::WILD_COLOR;

/// State of one wheel hole.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Slot {
    /// Nothing here
    #[default]
    Empty,
    /// Held for a marble dropping in from the launch lane
    Reserved,
    /// A marble is rolling from the rim to the hole
    Entering,
    /// Holds a marble of this color
    Filled(u8),
}

impl Slot {
    /// Color of the held marble, if any.
    pub fn color(self) -> Option<u8> {
        match self {
            Slot::Filled(c) => Some(c),
            _ => None,
        }
    }

    /// Reserved or entering.
    pub fn is_pending(self) -> bool {
        matches!(self, Slot::Reserved | Slot::Entering)
    }

    fn hash_code(self) -> u8 {
        match self {
            Slot::Empty => 0xF0,
            Slot::Reserved => 0xF1,
            Slot::Entering => 0xF2,
            Slot::Filled(c) => c,
        }
    }
}

/// Goal tile state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wheel {
    /// Holes indexed by `Direction::index()`
    pub slots: [Slot; 4],
    /// Ticks of rotation left; the wheel is locked while positive
    pub spin: u32,
    /// Latched once completed
    pub completed: bool,
}

impl Wheel {
    /// An empty, idle wheel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot facing a direction.
    #[inline]
    pub fn slot(&self, dir: Direction) -> Slot {
        self.slots[dir.index()]
    }

    /// Mutable slot facing a direction.
    #[inline]
    pub fn slot_mut(&mut self, dir: Direction) -> &mut Slot {
        &mut self.slots[dir.index()]
    }

    /// Is the wheel rotating?
    #[inline]
    pub fn is_spinning(&self) -> bool {
        self.spin > 0
    }

    /// Can a lane marble drop into the top hole?
    pub fn accepts_drop(&self) -> bool {
        !self.is_spinning() && self.slot(Direction::Up) == Slot::Empty
    }

    /// Number of filled holes.
    pub fn filled_count(&self) -> usize {
        self.slots.iter().filter(|s| s.color().is_some()).count()
    }

    /// Rotate the holes one quarter clockwise and start spinning.
    ///
    /// Refused while spinning or while a marble is on its way in.
    pub fn rotate(&mut self, spin_ticks: u32) -> bool {
        if self.is_spinning() || self.slots.iter().any(|s| s.is_pending()) {
            return false;
        }
        let old = self.slots;
        for i in 0..4 {
            self.slots[i] = old[(i + 3) % 4];
        }
        self.spin = spin_ticks;
        true
    }

    /// Count down the spin.
    pub fn update(&mut self) {
        if self.spin > 0 {
            self.spin -= 1;
        }
    }

    /// Completion check against the board's trigger and stoplight.
    ///
    /// `pattern` is the live trigger pattern and `next_light` the next
    /// stoplight color, when either exists. Prerequisite wheels are
    /// checked by the caller.
    pub fn ready_to_complete(&self, pattern: Option<&[u8; 4]>, next_light: Option<u8>) -> bool {
        if self.completed {
            return false;
        }

        let mut colors = [0u8; 4];
        for (i, slot) in self.slots.iter().enumerate() {
            match slot.color() {
                Some(c) => colors[i] = c,
                None => return false,
            }
        }

        match pattern {
            Some(pattern) => {
                let matches = colors
                    .iter()
                    .zip(pattern.iter())
                    .all(|(c, p)| *c == *p || *c == WILD_COLOR);
                if !matches {
                    return false;
                }
            }
            None => {
                let mut shared = None;
                for c in colors.iter().copied().filter(|c| *c != WILD_COLOR) {
                    match shared {
                        None => shared = Some(c),
                        Some(s) if s != c => return false,
                        Some(_) => {}
                    }
                }
            }
        }

        if let Some(light) = next_light {
            if colors.iter().any(|c| *c != WILD_COLOR && *c != light) {
                return false;
            }
        }

        true
    }

    /// Latch completion and empty the holes.
    pub fn complete(&mut self) {
        self.completed = true;
        self.slots = [Slot::Empty; 4];
    }

    /// Hash into state.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        for slot in &self.slots {
            hasher.update_u8(slot.hash_code());
        }
        hasher.update_u32(self.spin);
        hasher.update_bool(self.completed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(colors: [u8; 4]) -> Wheel {
        Wheel {
            slots: colors.map(Slot::Filled),
            ..Wheel::default()
        }
    }

    #[test]
    fn test_rotate_clockwise() {
        let mut wheel = Wheel::new();
        *wheel.slot_mut(Direction::Up) = Slot::Filled(2);
        assert!(wheel.rotate(9));
        assert_eq!(wheel.slot(Direction::Right), Slot::Filled(2));
        assert_eq!(wheel.slot(Direction::Up), Slot::Empty);
        assert!(wheel.is_spinning());

        // Locked while spinning
        assert!(!wheel.rotate(9));
        for _ in 0..9 {
            wheel.update();
        }
        assert!(!wheel.is_spinning());
        assert!(wheel.rotate(9));
        assert_eq!(wheel.slot(Direction::Down), Slot::Filled(2));
    }

    #[test]
    fn test_rotate_refused_while_entering() {
        let mut wheel = Wheel::new();
        *wheel.slot_mut(Direction::Left) = Slot::Entering;
        assert!(!wheel.rotate(9));
        assert!(!wheel.is_spinning());
    }

    #[test]
    fn test_same_color_completes() {
        assert!(filled([3, 3, 3, 3]).ready_to_complete(None, None));
        assert!(filled([3, 8, 3, 8]).ready_to_complete(None, None));
        assert!(filled([8, 8, 8, 8]).ready_to_complete(None, None));
        assert!(!filled([3, 3, 2, 3]).ready_to_complete(None, None));
    }

    #[test]
    fn test_needs_all_holes() {
        let mut wheel = filled([3, 3, 3, 3]);
        *wheel.slot_mut(Direction::Down) = Slot::Entering;
        assert!(!wheel.ready_to_complete(None, None));
    }

    #[test]
    fn test_trigger_pattern() {
        let pattern = [2, 3, 4, 6];
        assert!(filled([2, 3, 4, 6]).ready_to_complete(Some(&pattern), None));
        assert!(filled([2, 8, 4, 6]).ready_to_complete(Some(&pattern), None));
        assert!(!filled([6, 4, 3, 2]).ready_to_complete(Some(&pattern), None));
    }

    #[test]
    fn test_stoplight_gate() {
        assert!(filled([6, 6, 8, 6]).ready_to_complete(None, Some(6)));
        assert!(!filled([4, 4, 4, 4]).ready_to_complete(None, Some(6)));
    }

    #[test]
    fn test_complete_latches() {
        let mut wheel = filled([1, 1, 1, 1]);
        wheel.complete();
        assert!(wheel.completed);
        assert_eq!(wheel.filled_count(), 0);

        wheel.slots = [Slot::Filled(1); 4];
        assert!(!wheel.ready_to_complete(None, None));
    }
}
