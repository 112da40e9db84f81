//! Core deterministic primitives.
//!
//! Everything here is integer-only and platform independent, so a
//! recorded game replays to the same state hash on any machine.

pub mod geometry;
pub mod rng;
pub mod hash;

// Re-export core types
pub use geometry::{Direction, Paths, Position, BoardPoint, VERT_TILES, HORIZ_TILES, TILE_COUNT};
pub use rng::{DeterministicRng, seed_for_level};
pub use hash::{compute_state_hash, StateHash, StateHasher};
