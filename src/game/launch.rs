//! Launch Queue and Timers
//!
//! The queue holds the colors of upcoming marbles. Every launch pops
//! the head and appends a fresh sample, so its length never changes
//! after load. The slide cooldown tracks how far the queue still has
//! to scroll after a launch, in hundredths of a pixel.

use std::collections::VecDeque;

use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;
use crate::core::rng::DeterministicRng;
use crate::game::config::Rules;
use crate::game::marble::WILD_COLOR;

/// Copies of a normal color added to the pool per palette digit.
const NORMAL_WEIGHT: usize = 3;

/// Copies of the wild color added per `8` digit.
const WILD_WEIGHT: usize = 1;

// =============================================================================
// PALETTE
// =============================================================================

/// Weighted color pool sampled for new queue entries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPalette {
    pool: Vec<u8>,
}

impl ColorPalette {
    /// Build from a `colors` directive.
    ///
    /// Digits 0-7 contribute three copies, `8` contributes one; any
    /// other character is ignored.
    pub fn parse(colors: &str) -> Self {
        let mut pool = Vec::new();
        for c in colors.chars() {
            match c.to_digit(10) {
                Some(d) if d < WILD_COLOR as u32 => {
                    pool.extend(std::iter::repeat(d as u8).take(NORMAL_WEIGHT));
                }
                Some(d) if d == WILD_COLOR as u32 => {
                    pool.extend(std::iter::repeat(WILD_COLOR).take(WILD_WEIGHT));
                }
                _ => {}
            }
        }
        Self { pool }
    }

    /// Is the pool empty?
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// The weighted pool.
    pub fn pool(&self) -> &[u8] {
        &self.pool
    }

    /// Uniform pick from the pool; color 0 if the pool is empty.
    pub fn sample(&self, rng: &mut DeterministicRng) -> u8 {
        rng.choose(&self.pool).copied().unwrap_or(0)
    }
}

// =============================================================================
// QUEUE
// =============================================================================

/// FIFO of upcoming marble colors plus the slide cooldown.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchQueue {
    entries: VecDeque<u8>,
    /// Remaining slide in hundredths of a pixel
    slide: i32,
}

impl LaunchQueue {
    /// Fill a queue of `len` independent samples.
    pub fn filled(len: usize, palette: &ColorPalette, rng: &mut DeterministicRng) -> Self {
        let entries = (0..len).map(|_| palette.sample(rng)).collect();
        Self { entries, slide: 0 }
    }

    /// Number of queued colors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Is the queue empty?
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Color of the next marble to launch.
    pub fn head(&self) -> Option<u8> {
        self.entries.front().copied()
    }

    /// Iterate queued colors, head first.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.entries.iter().copied()
    }

    /// Pop the head and append a fresh sample.
    pub fn advance(&mut self, palette: &ColorPalette, rng: &mut DeterministicRng) -> u8 {
        let head = self.entries.pop_front().unwrap_or(0);
        self.entries.push_back(palette.sample(rng));
        head
    }

    /// Remaining slide in hundredths of a pixel.
    pub fn slide(&self) -> i32 {
        self.slide
    }

    /// Start a full one-marble slide.
    pub fn start_slide(&mut self, rules: &Rules) {
        self.slide = rules.marble_size * 100;
    }

    /// Animate the slide by one tick.
    ///
    /// `lane_open` says whether the top-right tile would accept the
    /// lane marble right now; the fast speed only applies once the
    /// slide is below the hold threshold.
    pub fn advance_slide(&mut self, rules: &Rules, lane_open: bool) {
        if self.slide <= 0 {
            return;
        }
        let hold = rules.marble_size * rules.slide_hold_percent;
        let percent = if self.slide < hold && lane_open {
            rules.slide_fast_percent
        } else {
            rules.slide_slow_percent
        };
        self.slide = (self.slide - rules.marble_speed * percent).max(0);
    }

    /// Hash into state.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.entries.len() as u32);
        for color in &self.entries {
            hasher.update_u8(*color);
        }
        hasher.update_i32(self.slide);
    }
}

// =============================================================================
// TIMERS
// =============================================================================

/// A countdown that is inactive at zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    /// Value restored by `restart`
    pub start: u32,
    /// Ticks left; 0 = inactive
    pub remaining: u32,
}

impl Countdown {
    /// A countdown with `start` configured but not running.
    pub fn idle(start: u32) -> Self {
        Self { start, remaining: 0 }
    }

    /// A countdown running from `start`.
    pub fn running(start: u32) -> Self {
        Self { start, remaining: start }
    }

    /// Reset to the start value.
    pub fn restart(&mut self) {
        self.remaining = self.start;
    }

    /// Is the countdown running?
    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }

    /// Decrement if active. Returns true on the tick it reaches zero.
    pub fn tick(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.remaining == 0
    }

    /// Remaining time as a percentage of the start value, rounded down.
    pub fn percent_remaining(&self) -> u32 {
        if self.start == 0 {
            return 0;
        }
        (self.remaining as u64 * 100 / self.start as u64) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_palette_weights() {
        let palette = ColorPalette::parse("238x");
        assert_eq!(palette.pool(), &[2, 2, 2, 3, 3, 3, 8]);
        assert!(ColorPalette::parse("9z").is_empty());
    }

    #[test]
    fn test_palette_frequency() {
        let palette = ColorPalette::parse("23468");
        let mut rng = DeterministicRng::new(2024);
        let mut counts = [0u32; 9];
        for _ in 0..10_000 {
            counts[palette.sample(&mut rng) as usize] += 1;
        }

        // 13-entry pool: normal colors 3/13, wild 1/13
        let wild = counts[8] as f64;
        for color in [2, 3, 4, 6] {
            let ratio = counts[color] as f64 / wild;
            assert!(ratio > 2.4 && ratio < 3.7, "color {} ratio {}", color, ratio);
        }
        assert_eq!(counts[0] + counts[1] + counts[5] + counts[7], 0);
    }

    #[test]
    fn test_queue_refills_one_for_one() {
        let palette = ColorPalette::parse("2346");
        let mut rng = DeterministicRng::new(1);
        let mut queue = LaunchQueue::filled(39, &palette, &mut rng);
        let second: Vec<u8> = queue.iter().skip(1).collect();

        let head = queue.advance(&palette, &mut rng);
        assert!([2, 3, 4, 6].contains(&head));
        assert_eq!(queue.len(), 39);
        assert_eq!(queue.iter().take(38).collect::<Vec<_>>(), second);
    }

    #[test]
    fn test_slide_speeds() {
        let rules = Rules::default();
        let mut queue = LaunchQueue::default();
        queue.start_slide(&rules);
        assert_eq!(queue.slide(), 3800);

        // Above the hold threshold the slow speed applies even when open
        queue.advance_slide(&rules, true);
        assert_eq!(queue.slide(), 3800 - 60);

        // Below the hold threshold the lane decides
        queue.slide = 3000;
        queue.advance_slide(&rules, false);
        assert_eq!(queue.slide(), 2940);
        queue.advance_slide(&rules, true);
        assert_eq!(queue.slide(), 2940 - 210);

        queue.slide = 100;
        queue.advance_slide(&rules, true);
        assert_eq!(queue.slide(), 0);
    }

    #[test]
    fn test_countdown() {
        let mut idle = Countdown::idle(3);
        assert!(!idle.tick());
        assert!(!idle.is_active());

        let mut running = Countdown::running(2);
        assert_eq!(running.percent_remaining(), 100);
        assert!(!running.tick());
        assert_eq!(running.percent_remaining(), 50);
        assert!(running.tick());
        assert!(!running.tick());
        running.restart();
        assert_eq!(running.remaining, 2);
    }

    #[test]
    fn test_percent_remaining_rounds_down() {
        // 148 of 150 is 98.67%
        let mut timer = Countdown::running(150);
        timer.tick();
        timer.tick();
        assert_eq!(timer.percent_remaining(), 98);

        let nearly_done = Countdown { start: 3, remaining: 1 };
        assert_eq!(nearly_done.percent_remaining(), 33);
    }

    proptest! {
        #[test]
        fn samples_stay_in_palette(seed in any::<u64>(), colors in "[0-9a-z]{1,8}") {
            let palette = ColorPalette::parse(&colors);
            let mut rng = DeterministicRng::new(seed);
            for _ in 0..20 {
                let color = palette.sample(&mut rng);
                if palette.is_empty() {
                    prop_assert_eq!(color, 0);
                } else {
                    prop_assert!(palette.pool().contains(&color));
                }
            }
        }
    }
}
