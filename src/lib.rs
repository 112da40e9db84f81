//! # Pathological Engine
//!
//! Deterministic simulation for the Pathological marble-routing puzzle.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   PATHOLOGICAL ENGINE                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── geometry.rs - Tiles, directions, path masks             │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  level/          - Level loading                             │
//! │  ├── parser.rs   - Text level format                         │
//! │  └── build.rs    - Descriptor to tiles, marbles, timers      │
//! │                                                              │
//! │  game/           - Game logic (deterministic)                │
//! │  ├── board.rs    - Grid, marbles, per-tick protocol          │
//! │  ├── tile.rs     - Tile behaviors                            │
//! │  ├── wheel.rs    - Goal wheels                               │
//! │  ├── launch.rs   - Launch queue and countdowns               │
//! │  ├── input.rs    - Tap / flick classification                │
//! │  └── replay.rs   - Input recording and replay                │
//! │                                                              │
//! │  runtime/        - Real-time driving (non-deterministic)     │
//! │  ├── scheduler.rs- Fixed-step clock                          │
//! │  └── session.rs  - Session task and handle                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/`, `level/` and `game/` modules are **100% deterministic**:
//! - Integer board coordinates only
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies
//! - All randomness from one seeded Xorshift128+ per board
//!
//! Given the same level, seed and recorded inputs, a board produces
//! **identical state hashes** on any platform.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod level;
pub mod runtime;

// Re-export commonly used types
pub use crate::core::geometry::{BoardPoint, Direction, Paths, Position};
pub use crate::core::rng::{seed_for_level, DeterministicRng};
pub use crate::core::hash::StateHash;
pub use game::{Board, BoardSnapshot, BoardStatus, EngineConfig, LevelResult, Rules};
pub use level::{parse_level, LevelDescriptor, LevelLoadError};
pub use runtime::{GameSession, SessionHandle};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 50;
