//! Fixed-Step Clock
//!
//! Decides how many board ticks are due at a given instant. The clock
//! keeps its own deadline so a late wake-up runs the missed ticks, up
//! to `max_catch_up` of them; anything older is dropped.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Fixed-rate tick deadline tracker.
#[derive(Clone, Debug)]
pub struct FixedStepClock {
    interval: Duration,
    max_catch_up: u32,
    next_deadline: Option<Instant>,
    paused: bool,
}

impl FixedStepClock {
    /// Create a clock ticking at `tick_rate_hz`.
    pub fn new(tick_rate_hz: u32, max_catch_up: u32) -> Self {
        let hz = tick_rate_hz.max(1) as u64;
        Self {
            interval: Duration::from_micros(1_000_000 / hz),
            max_catch_up: max_catch_up.max(1),
            next_deadline: None,
            paused: false,
        }
    }

    /// Time between ticks.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// First tick is due one interval from `now`.
    pub fn start(&mut self, now: Instant) {
        self.next_deadline = Some(now + self.interval);
        self.paused = false;
    }

    /// Number of ticks to run at `now`.
    pub fn due_ticks(&mut self, now: Instant) -> u32 {
        if self.paused {
            return 0;
        }
        let Some(deadline) = self.next_deadline else {
            return 0;
        };
        if now < deadline {
            return 0;
        }

        let behind = now.duration_since(deadline);
        let elapsed = (behind.as_micros() / self.interval.as_micros().max(1)) as u32;
        let owed = elapsed.saturating_add(1);
        self.next_deadline = Some(deadline + self.interval * owed);

        if owed > self.max_catch_up {
            debug!(owed, max = self.max_catch_up, "clock behind, skipping ticks");
            self.max_catch_up
        } else {
            owed
        }
    }

    /// Stop producing ticks.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Produce ticks again, the first one interval from `now`.
    pub fn resume(&mut self, now: Instant) {
        self.start(now);
    }

    /// Is the clock paused?
    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

/// Eases the board in after a level starts.
///
/// The first `ticks - ramp` clock ticks are all held; the last `ramp`
/// ticks alternate hold and run, starting with a hold.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Warmup {
    remaining: u32,
    ramp: u32,
}

impl Warmup {
    /// Warm up over `ticks` clock ticks, the last `ramp` at half rate.
    pub fn new(ticks: u32, ramp: u32) -> Self {
        Self { remaining: ticks, ramp: ramp.min(ticks) }
    }

    /// Consume one clock tick. True if the board should not tick.
    pub fn hold(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        if self.remaining >= self.ramp {
            return true;
        }
        self.remaining % 2 == 1
    }

    /// Done warming up?
    pub fn is_done(&self) -> bool {
        self.remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: Duration = Duration::from_millis(20);

    #[test]
    fn test_nothing_due_before_first_deadline() {
        let start = Instant::now();
        let mut clock = FixedStepClock::new(50, 4);
        assert_eq!(clock.interval(), STEP);
        assert_eq!(clock.due_ticks(start), 0);

        clock.start(start);
        assert_eq!(clock.due_ticks(start), 0);
        assert_eq!(clock.due_ticks(start + Duration::from_millis(19)), 0);
        assert_eq!(clock.due_ticks(start + STEP), 1);
        assert_eq!(clock.due_ticks(start + STEP), 0);
    }

    #[test]
    fn test_catches_up_missed_ticks() {
        let start = Instant::now();
        let mut clock = FixedStepClock::new(50, 4);
        clock.start(start);

        // Three intervals late
        assert_eq!(clock.due_ticks(start + STEP * 3), 3);
        assert_eq!(clock.due_ticks(start + STEP * 3 + Duration::from_millis(5)), 0);
        assert_eq!(clock.due_ticks(start + STEP * 4), 1);
    }

    #[test]
    fn test_catch_up_is_bounded() {
        let start = Instant::now();
        let mut clock = FixedStepClock::new(50, 4);
        clock.start(start);

        // A full second behind runs only four, then resumes on schedule
        assert_eq!(clock.due_ticks(start + Duration::from_secs(1)), 4);
        assert_eq!(clock.due_ticks(start + Duration::from_secs(1)), 0);
        assert_eq!(clock.due_ticks(start + Duration::from_secs(1) + STEP), 1);
    }

    #[test]
    fn test_pause_and_resume() {
        let start = Instant::now();
        let mut clock = FixedStepClock::new(50, 4);
        clock.start(start);
        clock.pause();
        assert!(clock.is_paused());
        assert_eq!(clock.due_ticks(start + Duration::from_secs(5)), 0);

        let later = start + Duration::from_secs(5);
        clock.resume(later);
        assert_eq!(clock.due_ticks(later + STEP), 1);
    }

    #[test]
    fn test_warmup_holds_then_releases() {
        let mut warmup = Warmup::new(2, 0);
        assert!(warmup.hold());
        assert!(warmup.hold());
        assert!(!warmup.hold());
        assert!(warmup.is_done());
    }

    #[test]
    fn test_warmup_ramps_at_half_rate() {
        let mut warmup = Warmup::new(50, 20);
        let held: Vec<bool> = (0..50).map(|_| warmup.hold()).collect();

        assert!(held[..30].iter().all(|h| *h));
        let ramp = &held[30..];
        assert_eq!(ramp.iter().filter(|h| !**h).count(), 10);
        assert!(ramp.chunks(2).all(|pair| pair == [true, false]));

        assert!(warmup.is_done());
        assert!(!warmup.hold());
    }
}
