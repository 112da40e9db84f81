//! Board Events
//!
//! Events generated during simulation. The board queues them while it
//! ticks; the session drains them with `Board::take_events()` for
//! logging and for the snapshot feed.

use serde::{Serialize, Deserialize};

use crate::core::geometry::{Direction, Position};
use crate::game::board::BoardStatus;
use crate::game::marble::MarbleId;

/// Why a marble left the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalReason {
    /// Shredder tile
    Shredded,
    /// Filter rejected its color
    Filtered,
    /// Captured into a wheel hole
    Captured,
    /// Absorbed by an empty buffer
    Buffered,
    /// Consumed by the stoplight
    Stoplight,
}

/// Event payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardEventData {
    /// Queue head entered the launch lane
    MarbleLaunched {
        marble: MarbleId,
        color: u8,
    },

    /// A tile created a marble (clone, eject, buffer release)
    MarbleSpawned {
        marble: MarbleId,
        color: u8,
        tile: Position,
    },

    /// A marble was destroyed or absorbed
    MarbleRemoved {
        marble: MarbleId,
        color: u8,
        tile: Position,
        reason: RemovalReason,
    },

    /// A wheel hole received a marble
    SlotFilled {
        wheel: Position,
        slot: Direction,
        color: u8,
    },

    /// Wheel completion latched
    WheelCompleted {
        wheel: Position,
    },

    /// Replicator hit the live cap and dropped its pending clones
    ReplicatorOverflow {
        tile: Position,
        dropped: usize,
    },

    /// Trigger drew a new pattern
    TriggerPattern {
        pattern: [u8; 4],
    },

    /// Stoplight advanced to its next color
    StoplightAdvanced {
        remaining: usize,
    },

    /// Points were added
    Scored {
        points: u32,
        total: u32,
    },

    /// Board left INCOMPLETE
    StatusChanged {
        status: BoardStatus,
    },
}

/// An event stamped with the tick it happened on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardEvent {
    /// Tick when event occurred
    pub tick: u32,

    /// Event data
    pub data: BoardEventData,
}

impl BoardEvent {
    /// Create a new event.
    pub fn new(tick: u32, data: BoardEventData) -> Self {
        Self { tick, data }
    }

    /// Create marble removed event.
    pub fn marble_removed(
        tick: u32,
        marble: MarbleId,
        color: u8,
        tile: Position,
        reason: RemovalReason,
    ) -> Self {
        Self::new(
            tick,
            BoardEventData::MarbleRemoved {
                marble,
                color,
                tile,
                reason,
            },
        )
    }

    /// Create scored event.
    pub fn scored(tick: u32, points: u32, total: u32) -> Self {
        Self::new(tick, BoardEventData::Scored { points, total })
    }

    /// Create status changed event.
    pub fn status_changed(tick: u32, status: BoardStatus) -> Self {
        Self::new(tick, BoardEventData::StatusChanged { status })
    }

    /// Does this event end the game?
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.data,
            BoardEventData::StatusChanged { status } if status != BoardStatus::Incomplete
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_detection() {
        assert!(BoardEvent::status_changed(5, BoardStatus::Complete).is_terminal());
        assert!(BoardEvent::status_changed(5, BoardStatus::BoardTimeout).is_terminal());
        assert!(!BoardEvent::scored(5, 10, 10).is_terminal());
    }

    #[test]
    fn test_event_serializes() {
        let event = BoardEvent::marble_removed(
            3,
            MarbleId(7),
            2,
            Position::new(1, 4),
            RemovalReason::Shredded,
        );
        let json = serde_json::to_string(&event).unwrap();
        let back: BoardEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
