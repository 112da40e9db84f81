//! Input Recording and Replay
//!
//! The board is deterministic, so a level, a seed and the inputs with
//! the ticks they arrived on are enough to reproduce a whole game.
//! Inputs are stamped with `Board::current_tick()` at the moment they
//! are applied, which is always between two ticks.

use serde::{Serialize, Deserialize};
use tracing::{debug, warn};

use crate::core::geometry::BoardPoint;
use crate::core::hash::StateHash;
use crate::game::board::{Board, BoardStatus};
use crate::game::config::Rules;
use crate::game::input::PointerId;
use crate::level::{LevelDescriptor, LevelLoadError};

/// One host input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardInput {
    /// Pointer down
    Press {
        /// Pointer
        pointer: PointerId,
        /// Board-space position
        at: BoardPoint,
    },
    /// Pointer up
    Release {
        /// Pointer
        pointer: PointerId,
        /// Board-space position
        at: BoardPoint,
    },
    /// Launch the queue head
    Launch,
    /// Pause or resume
    SetPaused(bool),
}

impl BoardInput {
    /// Apply to a board.
    pub fn apply(&self, board: &mut Board) {
        match *self {
            BoardInput::Press { pointer, at } => board.on_press(pointer, at),
            BoardInput::Release { pointer, at } => {
                board.on_release(pointer, at);
            }
            BoardInput::Launch => {
                board.launch_marble();
            }
            BoardInput::SetPaused(paused) => board.set_paused(paused),
        }
    }
}

/// An input and the tick it was applied before.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedInput {
    /// `Board::current_tick()` when applied
    pub tick: u32,
    /// The input
    pub input: BoardInput,
}

/// Everything needed to replay a game.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRecording {
    /// Board seed
    pub seed: u64,
    /// Level title, for display
    pub level_name: String,
    /// Inputs in application order
    pub inputs: Vec<RecordedInput>,
    /// Tick the recording stopped at
    pub end_tick: u32,
}

impl InputRecording {
    /// Start a recording.
    pub fn new(seed: u64, level_name: impl Into<String>) -> Self {
        Self {
            seed,
            level_name: level_name.into(),
            inputs: Vec::new(),
            end_tick: 0,
        }
    }

    /// Append an input. Ticks must not go backwards.
    pub fn record(&mut self, tick: u32, input: BoardInput) {
        if let Some(last) = self.inputs.last() {
            if tick < last.tick {
                warn!(tick, last = last.tick, "dropping out-of-order input");
                return;
            }
        }
        self.inputs.push(RecordedInput { tick, input });
        self.end_tick = self.end_tick.max(tick);
    }

    /// Mark where the recording stopped.
    pub fn finish(&mut self, tick: u32) {
        self.end_tick = self.end_tick.max(tick);
    }

    /// Inputs applied before tick `tick + 1`.
    pub fn inputs_at(&self, tick: u32) -> &[RecordedInput] {
        let start = self.inputs.partition_point(|r| r.tick < tick);
        let end = self.inputs.partition_point(|r| r.tick <= tick);
        &self.inputs[start..end]
    }

    /// Number of recorded inputs.
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    /// Nothing recorded?
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Serialize to binary (bincode).
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from binary (bincode).
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }
}

/// Result of a replay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayOutcome {
    /// Final status
    pub status: BoardStatus,
    /// Final score
    pub score: u32,
    /// Ticks simulated
    pub ticks: u32,
    /// Board events drained along the way
    pub events: usize,
    /// Final state hash
    pub hash: StateHash,
}

/// Replay a recording on a fresh board.
pub fn replay(
    rules: &Rules,
    level: &LevelDescriptor,
    recording: &InputRecording,
) -> Result<ReplayOutcome, LevelLoadError> {
    let mut board = Board::from_level(rules.clone(), recording.seed, level)?;
    let mut events = board.take_events().len();

    while !board.status().is_terminal() && board.current_tick() < recording.end_tick {
        let tick = board.current_tick();
        for recorded in recording.inputs_at(tick) {
            recorded.input.apply(&mut board);
        }
        board.tick();
        events += board.take_events().len();
        if board.current_tick() == tick {
            // Paused for good, or the inputs ended the board
            break;
        }
    }

    // Inputs stamped on the final tick still count
    if !board.status().is_terminal() && board.current_tick() == recording.end_tick {
        for recorded in recording.inputs_at(board.current_tick()) {
            recorded.input.apply(&mut board);
        }
        events += board.take_events().len();
    }

    debug!(
        ticks = board.current_tick(),
        events,
        score = board.score(),
        status = ?board.status(),
        "replay finished"
    );

    Ok(ReplayOutcome {
        status: board.status(),
        score: board.score(),
        ticks: board.current_tick(),
        events,
        hash: board.compute_hash(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Position;
    use crate::level::TileSpec;

    fn level() -> LevelDescriptor {
        let mut level = LevelDescriptor::blank("replay");
        level
            .set(Position::new(0, 7), TileSpec::new('O', 15, None))
            .set(Position::new(0, 6), TileSpec::new(' ', 5, None))
            .set(Position::new(1, 6), TileSpec::new('<', 15, Some('v')))
            .set(Position::new(1, 5), TileSpec::new('O', 15, None));
        level
    }

    /// Drive a board live and record what was applied.
    fn play(seed: u64) -> (InputRecording, StateHash, u32, usize) {
        let rules = Rules::default();
        let level = level();
        let mut board = Board::from_level(rules, seed, &level).unwrap();
        let mut recording = InputRecording::new(seed, board.name());
        let mut events = board.take_events().len();

        let script: Vec<(u32, BoardInput)> = vec![
            (0, BoardInput::Launch),
            (40, BoardInput::Press { pointer: 1, at: BoardPoint::new(494, 114) }),
            (40, BoardInput::Release { pointer: 1, at: BoardPoint::new(494, 114) }),
            (90, BoardInput::SetPaused(true)),
            (90, BoardInput::SetPaused(false)),
            (120, BoardInput::Press { pointer: 2, at: BoardPoint::new(418, 100) }),
            (121, BoardInput::Release { pointer: 2, at: BoardPoint::new(418, 180) }),
        ];

        for _ in 0..400 {
            let tick = board.current_tick();
            for (_, input) in script.iter().filter(|(t, _)| *t == tick) {
                input.apply(&mut board);
                recording.record(tick, *input);
            }
            board.tick();
            events += board.take_events().len();
            if board.status().is_terminal() {
                break;
            }
        }
        recording.finish(board.current_tick());
        (recording, board.compute_hash(), board.current_tick(), events)
    }

    #[test]
    fn test_replay_reproduces_hash() {
        let (recording, hash, ticks, _) = play(1234);
        let outcome = replay(&Rules::default(), &level(), &recording).unwrap();
        assert_eq!(outcome.ticks, ticks);
        assert_eq!(outcome.hash, hash);
    }

    #[test]
    fn test_replay_drains_events() {
        let (recording, _, _, live_events) = play(77);
        let outcome = replay(&Rules::default(), &level(), &recording).unwrap();
        assert!(live_events > 0);
        assert_eq!(outcome.events, live_events);
    }

    #[test]
    fn test_inputs_at_slices_by_tick() {
        let (recording, _, _, _) = play(1);
        assert_eq!(recording.inputs_at(0).len(), 1);
        assert_eq!(recording.inputs_at(40).len(), 2);
        assert_eq!(recording.inputs_at(90).len(), 2);
        assert!(recording.inputs_at(41).is_empty());
    }

    #[test]
    fn test_out_of_order_input_dropped() {
        let mut recording = InputRecording::new(1, "x");
        recording.record(5, BoardInput::Launch);
        recording.record(3, BoardInput::Launch);
        assert_eq!(recording.len(), 1);
        assert_eq!(recording.end_tick, 5);
    }

    #[test]
    fn test_recording_bytes_and_json() {
        let (recording, _, _, _) = play(99);
        let bytes = recording.to_bytes().unwrap();
        assert_eq!(InputRecording::from_bytes(&bytes).unwrap(), recording);

        let json = recording.to_json().unwrap();
        assert_eq!(InputRecording::from_json(&json).unwrap(), recording);
    }

    #[test]
    fn test_replay_with_bad_level_fails() {
        let mut bad = level();
        bad.set(Position::new(3, 3), TileSpec::new('Z', 0, None));
        let recording = InputRecording::new(1, "bad");
        assert!(replay(&Rules::default(), &bad, &recording).is_err());
    }
}
