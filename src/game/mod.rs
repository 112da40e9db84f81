//! Game Logic Module
//!
//! All simulation code. 100% deterministic.
//!
//! ## Module Structure
//!
//! - `config`: Gameplay rules and engine settings
//! - `board`: Tile grid, marbles, per-tick update protocol
//! - `tile`: Tile kinds and their marble/update/gesture behavior
//! - `marble`: Marble entity and color rules
//! - `wheel`: Goal tile state
//! - `replicator`: Clone queue
//! - `signal`: Trigger and stoplight
//! - `launch`: Palette, launch queue and countdown timers
//! - `input`: Gesture classification and pointer tracking
//! - `events`: Board events for logging and hosts
//! - `replay`: Input recording and deterministic replay

pub mod config;
pub mod board;
pub mod tile;
pub mod marble;
pub mod wheel;
pub mod replicator;
pub mod signal;
pub mod launch;
pub mod input;
pub mod events;
pub mod replay;

// Re-export key types
pub use board::{Board, BoardSnapshot, BoardStatus, LevelResult, WheelView};
pub use config::{EngineConfig, Rules, SchedulerConfig};
pub use events::{BoardEvent, BoardEventData, RemovalReason};
pub use input::{Gesture, PointerId};
pub use marble::{Marble, MarbleId};
pub use replay::{replay, BoardInput, InputRecording, ReplayOutcome};
pub use tile::{Tile, TileKind};
