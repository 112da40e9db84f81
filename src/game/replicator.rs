//! Replicators
//!
//! A replicator clones every marble that crosses its center. Clones
//! are queued and released one at a time with a fixed delay between
//! them. If the live-marble cap is reached when a clone is due, the
//! whole pending queue is dropped, not just the due entry.

use serde::{Serialize, Deserialize};

use crate::core::geometry::Direction;
use crate::core::hash::StateHasher;

/// One queued batch of clones.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingClone {
    /// Clone color
    pub color: u8,
    /// Clone heading
    pub direction: Direction,
    /// Clones still to spawn
    pub remaining: u32,
    /// Ticks until the next clone
    pub delay: u32,
}

/// What a replicator wants done this tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplicatorAction {
    /// Spawn a clone at the tile center
    Spawn {
        /// Clone color
        color: u8,
        /// Clone heading
        direction: Direction,
    },
    /// The cap was hit; this many batches were dropped
    Overflow(usize),
}

/// Replicator tile state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replicator {
    /// Total copies per marble, including the original
    pub count: u32,
    /// Queued batches in arrival order
    pub pending: Vec<PendingClone>,
}

impl Replicator {
    /// Create a replicator making `count` copies of each marble.
    pub fn new(count: u32) -> Self {
        Self {
            count,
            pending: Vec::new(),
        }
    }

    /// Queue `count - 1` clones of a marble at the center.
    pub fn enqueue(&mut self, color: u8, direction: Direction, delay: u32) {
        let remaining = self.count.saturating_sub(1);
        if remaining == 0 {
            return;
        }
        self.pending.push(PendingClone {
            color,
            direction,
            remaining,
            delay,
        });
    }

    /// Advance the delays by one tick.
    ///
    /// `live` and `limit` are the board's marble count and cap. The
    /// returned actions are in the order they must be applied.
    pub fn update(&mut self, mut live: usize, limit: usize, delay: u32) -> Vec<ReplicatorAction> {
        let mut actions = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            let entry = &mut self.pending[i];
            entry.delay = entry.delay.saturating_sub(1);
            if entry.delay > 0 {
                i += 1;
                continue;
            }
            entry.delay = delay;

            if live >= limit {
                let dropped = self.pending.len();
                self.pending.clear();
                actions.push(ReplicatorAction::Overflow(dropped));
                return actions;
            }

            actions.push(ReplicatorAction::Spawn {
                color: entry.color,
                direction: entry.direction,
            });
            live += 1;

            entry.remaining -= 1;
            if entry.remaining == 0 {
                self.pending.swap_remove(i);
            } else {
                i += 1;
            }
        }
        actions
    }

    /// Hash into state.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.count);
        hasher.update_u32(self.pending.len() as u32);
        for entry in &self.pending {
            hasher.update_u8(entry.color);
            hasher.update_u8(entry.direction as u8);
            hasher.update_u32(entry.remaining);
            hasher.update_u32(entry.delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cascade_spawns_two_clones_35_apart() {
        let mut rep = Replicator::new(3);
        rep.enqueue(4, Direction::Right, 35);
        assert_eq!(rep.pending[0].remaining, 2);

        let mut spawn_ticks = Vec::new();
        for t in 1..=100 {
            let actions = rep.update(1, 10, 35);
            if !actions.is_empty() {
                assert_eq!(
                    actions,
                    vec![ReplicatorAction::Spawn { color: 4, direction: Direction::Right }]
                );
                spawn_ticks.push(t);
            }
        }
        assert_eq!(spawn_ticks, vec![35, 70]);
        assert!(rep.pending.is_empty());
    }

    #[test]
    fn test_overflow_drops_whole_queue() {
        let mut rep = Replicator::new(3);
        rep.enqueue(4, Direction::Right, 35);
        rep.enqueue(5, Direction::Left, 35);
        rep.pending[1].delay = 80;

        for _ in 0..34 {
            assert!(rep.update(10, 10, 35).is_empty());
        }
        assert_eq!(rep.update(10, 10, 35), vec![ReplicatorAction::Overflow(2)]);
        assert!(rep.pending.is_empty());
    }

    #[test]
    fn test_single_copy_queues_nothing() {
        let mut rep = Replicator::new(1);
        rep.enqueue(2, Direction::Up, 35);
        assert!(rep.pending.is_empty());
    }
}
