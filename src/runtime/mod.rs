//! Runtime Layer
//!
//! Drives a board in real time. This layer is **non-deterministic**
//! (wall-clock scheduling, task wake-ups); everything it does to the
//! board goes through `BoardInput`s and `Board::tick`, so a recorded
//! session replays exactly.

pub mod scheduler;
pub mod session;

pub use scheduler::{FixedStepClock, Warmup};
pub use session::{
    FrameSink, GameSession, SessionCommand, SessionError, SessionHandle, SessionId, SessionOutcome,
};
