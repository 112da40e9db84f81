//! Trigger and Stoplight
//!
//! Board-level signal tiles. Neither moves marbles on its own; wheels
//! consult them when deciding whether they may complete.

use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;
use crate::core::rng::DeterministicRng;
use crate::game::launch::ColorPalette;
use crate::game::marble::WILD_COLOR;

/// Points for each stoplight advance.
pub const STOPLIGHT_BONUS: u32 = 20;

// =============================================================================
// TRIGGER
// =============================================================================

/// Four-color pattern that wheels must reproduce.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    /// Current pattern; `None` while regenerating
    pub pattern: Option<[u8; 4]>,
    /// Ticks until a new pattern is drawn
    pub countdown: u32,
}

impl Trigger {
    /// A trigger with no pattern yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw a fresh pattern from the launch palette.
    pub fn draw(&mut self, palette: &ColorPalette, rng: &mut DeterministicRng) -> [u8; 4] {
        let pattern = [
            palette.sample(rng),
            palette.sample(rng),
            palette.sample(rng),
            palette.sample(rng),
        ];
        self.pattern = Some(pattern);
        self.countdown = 0;
        pattern
    }

    /// Clear the pattern after a wheel matched it.
    pub fn complete(&mut self, reset_ticks: u32) {
        self.pattern = None;
        self.countdown = reset_ticks.max(1);
    }

    /// Count down towards a new pattern. Returns the pattern when drawn.
    pub fn update(&mut self, palette: &ColorPalette, rng: &mut DeterministicRng) -> Option<[u8; 4]> {
        if self.pattern.is_some() || self.countdown == 0 {
            return None;
        }
        self.countdown -= 1;
        if self.countdown == 0 {
            Some(self.draw(palette, rng))
        } else {
            None
        }
    }

    /// Hash into state.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        match self.pattern {
            Some(pattern) => {
                hasher.update_bool(true);
                for c in pattern {
                    hasher.update_u8(c);
                }
            }
            None => hasher.update_bool(false),
        }
        hasher.update_u32(self.countdown);
    }
}

// =============================================================================
// STOPLIGHT
// =============================================================================

/// Ordered color sequence consumed one step at a time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stoplight {
    /// Required colors in order
    pub sequence: Vec<u8>,
    /// Index of the next required color
    pub current: usize,
}

impl Stoplight {
    /// Build from a `stoplight` directive (digits 0-7, others ignored).
    pub fn parse(spec: &str) -> Self {
        let sequence = spec
            .chars()
            .filter_map(|c| c.to_digit(10))
            .filter(|d| *d < WILD_COLOR as u32)
            .map(|d| d as u8)
            .collect();
        Self { sequence, current: 0 }
    }

    /// Next required color, if any remain.
    pub fn next_color(&self) -> Option<u8> {
        self.sequence.get(self.current).copied()
    }

    /// Colors still to go.
    pub fn remaining(&self) -> usize {
        self.sequence.len().saturating_sub(self.current)
    }

    /// Step to the next color. False when already exhausted.
    pub fn advance(&mut self) -> bool {
        if self.current < self.sequence.len() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Hash into state.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.sequence.len() as u32);
        for c in &self.sequence {
            hasher.update_u8(*c);
        }
        hasher.update_u32(self.current as u32);
    }
}
