//! Game Session
//!
//! One tokio task owns the board. Hosts send `SessionCommand`s over a
//! bounded channel and read `BoardSnapshot`s from a watch channel.
//! Commands are applied between ticks, so their effects show up on the
//! next tick. The task ends when the board reaches a terminal status,
//! on `Shutdown`, or when every command sender is dropped.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::geometry::BoardPoint;
use crate::core::hash::StateHash;
use crate::game::board::{Board, BoardSnapshot, BoardStatus, LevelResult};
use crate::game::config::SchedulerConfig;
use crate::game::events::BoardEvent;
use crate::game::input::PointerId;
use crate::game::replay::{BoardInput, InputRecording};
use crate::runtime::scheduler::{FixedStepClock, Warmup};

/// Session identifier.
pub type SessionId = Uuid;

/// Host request to a running session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionCommand {
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
    /// Stop the session now
    Shutdown,
}

impl SessionCommand {
    fn into_input(self) -> Option<BoardInput> {
        match self {
            SessionCommand::Press { pointer, at } => Some(BoardInput::Press { pointer, at }),
            SessionCommand::Release { pointer, at } => Some(BoardInput::Release { pointer, at }),
            SessionCommand::Launch => Some(BoardInput::Launch),
            SessionCommand::SetPaused(paused) => Some(BoardInput::SetPaused(paused)),
            SessionCommand::Shutdown => None,
        }
    }
}

/// Session errors.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// The session task is gone.
    #[error("session closed")]
    Closed,
}

/// Called after every tick that advanced the board.
pub trait FrameSink: Send {
    /// A tick finished.
    fn on_frame(&mut self, snapshot: &BoardSnapshot, events: &[BoardEvent]);
}

impl<F> FrameSink for F
where
    F: FnMut(&BoardSnapshot, &[BoardEvent]) + Send,
{
    fn on_frame(&mut self, snapshot: &BoardSnapshot, events: &[BoardEvent]) {
        self(snapshot, events)
    }
}

/// How a session ended.
#[derive(Clone, Debug)]
pub struct SessionOutcome {
    /// Session that produced it
    pub id: SessionId,
    /// Final status (`Incomplete` if shut down early)
    pub status: BoardStatus,
    /// Score and completion bonuses
    pub result: LevelResult,
    /// Board ticks simulated
    pub ticks: u32,
    /// Final state hash
    pub hash: StateHash,
    /// Applied inputs, when recording was enabled
    pub recording: Option<InputRecording>,
}

/// A board plus the settings to run it.
pub struct GameSession {
    id: SessionId,
    board: Board,
    config: SchedulerConfig,
    recording: Option<InputRecording>,
    sink: Option<Box<dyn FrameSink>>,
}

impl GameSession {
    /// Wrap a loaded board.
    pub fn new(board: Board, config: SchedulerConfig) -> Self {
        let recording = config
            .record_inputs
            .then(|| InputRecording::new(board.seed(), board.name()));
        Self {
            id: Uuid::new_v4(),
            board,
            config,
            recording,
            sink: None,
        }
    }

    /// Install a frame callback.
    pub fn with_sink(mut self, sink: impl FrameSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Start the session task.
    pub fn spawn(self) -> SessionHandle {
        let (command_tx, command_rx) = mpsc::channel(self.config.command_capacity.max(1));
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(self.board.snapshot()));
        let id = self.id;

        info!(session = %id, level = %self.board.name(), "session starting");
        let task = tokio::spawn(self.run(command_rx, snapshot_tx));

        SessionHandle {
            id,
            commands: command_tx,
            snapshots: snapshot_rx,
            task,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
        snapshots: watch::Sender<Arc<BoardSnapshot>>,
    ) -> SessionOutcome {
        let mut clock = FixedStepClock::new(self.config.tick_rate_hz, self.config.max_catch_up);
        let mut warmup = Warmup::new(self.config.warmup_ticks, self.config.warmup_ramp_ticks);
        let mut ticker = interval(clock.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        clock.start(Instant::now());

        if self.config.auto_launch {
            self.apply(BoardInput::Launch);
        }
        snapshots.send_replace(Arc::new(self.board.snapshot()));

        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(input) = command.and_then(SessionCommand::into_input) else {
                        debug!(session = %self.id, "shutdown requested");
                        break;
                    };
                    self.apply(input);
                    self.sync_clock(&mut clock);
                    snapshots.send_replace(Arc::new(self.board.snapshot()));
                }

                _ = ticker.tick() => {
                    let due = clock.due_ticks(Instant::now());
                    for _ in 0..due {
                        if warmup.hold() {
                            continue;
                        }
                        self.step();
                        if self.board.status().is_terminal() {
                            break;
                        }
                    }
                    if due > 0 {
                        snapshots.send_replace(Arc::new(self.board.snapshot()));
                    }
                }
            }

            if self.board.status().is_terminal() {
                break;
            }
        }

        self.finish()
    }

    /// Apply and record one input.
    fn apply(&mut self, input: BoardInput) {
        let tick = self.board.current_tick();
        input.apply(&mut self.board);
        if let Some(recording) = &mut self.recording {
            recording.record(tick, input);
        }
    }

    /// Follow the board's pause flag; a tap can resume the board.
    fn sync_clock(&self, clock: &mut FixedStepClock) {
        match (self.board.is_paused(), clock.is_paused()) {
            (true, false) => clock.pause(),
            (false, true) => clock.resume(Instant::now()),
            _ => {}
        }
    }

    fn step(&mut self) {
        let before = self.board.current_tick();
        self.board.tick();
        if self.board.current_tick() == before {
            return;
        }

        let events = self.board.take_events();
        for event in &events {
            debug!(session = %self.id, tick = event.tick, event = ?event.data, "board event");
        }
        if let Some(sink) = &mut self.sink {
            sink.on_frame(&self.board.snapshot(), &events);
        }
    }

    fn finish(mut self) -> SessionOutcome {
        let ticks = self.board.current_tick();
        if let Some(recording) = &mut self.recording {
            recording.finish(ticks);
        }
        let result = self.board.result();
        let hash = self.board.compute_hash();

        info!(
            session = %self.id,
            status = ?result.status,
            score = result.score,
            total = result.total,
            ticks,
            hash = %hex::encode(hash),
            "session ended"
        );

        SessionOutcome {
            id: self.id,
            status: result.status,
            result,
            ticks,
            hash,
            recording: self.recording,
        }
    }
}

/// Host side of a running session.
pub struct SessionHandle {
    id: SessionId,
    commands: mpsc::Sender<SessionCommand>,
    snapshots: watch::Receiver<Arc<BoardSnapshot>>,
    task: JoinHandle<SessionOutcome>,
}

impl SessionHandle {
    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Queue a command.
    pub async fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.commands.send(command).await.map_err(|_| SessionError::Closed)
    }

    /// Pointer down.
    pub async fn press(&self, pointer: PointerId, at: BoardPoint) -> Result<(), SessionError> {
        self.send(SessionCommand::Press { pointer, at }).await
    }

    /// Pointer up.
    pub async fn release(&self, pointer: PointerId, at: BoardPoint) -> Result<(), SessionError> {
        self.send(SessionCommand::Release { pointer, at }).await
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<BoardSnapshot> {
        self.snapshots.borrow().clone()
    }

    /// A receiver that sees every new snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<BoardSnapshot>> {
        self.snapshots.clone()
    }

    /// Has the session task ended?
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Ask the session to stop and wait for its outcome.
    pub async fn shutdown(self) -> Result<SessionOutcome, SessionError> {
        // Already gone is fine; the outcome is still in the task
        let _ = self.commands.send(SessionCommand::Shutdown).await;
        self.join().await
    }

    /// Wait for the session to end by itself.
    pub async fn join(self) -> Result<SessionOutcome, SessionError> {
        self.task.await.map_err(|_| SessionError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use crate::core::geometry::Position;
    use crate::game::config::Rules;
    use crate::game::replay::replay;
    use crate::level::{LevelDescriptor, TileSpec};

    fn quick_config() -> SchedulerConfig {
        SchedulerConfig {
            warmup_ticks: 0,
            auto_launch: false,
            ..SchedulerConfig::default()
        }
    }

    fn idle_level() -> LevelDescriptor {
        let mut level = LevelDescriptor::blank("idle");
        level.launch_timer = Some(1);
        level.set(Position::new(5, 7), TileSpec::new('O', 0, None));
        level
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_board_completes() {
        let board = Board::new(Rules::default(), 1);
        let handle = GameSession::new(board, quick_config()).spawn();

        let outcome = handle.join().await.unwrap();
        assert_eq!(outcome.status, BoardStatus::Complete);
        assert_eq!(outcome.ticks, 1);
        assert!(outcome.recording.map_or(false, |r| r.is_empty()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_launch_timeout_ends_session_and_replays() {
        let level = idle_level();
        let board = Board::from_level(Rules::default(), 21, &level).unwrap();
        let config = SchedulerConfig { auto_launch: true, warmup_ticks: 10, ..quick_config() };
        let handle = GameSession::new(board, config).spawn();

        let outcome = handle.join().await.unwrap();
        assert_eq!(outcome.status, BoardStatus::LaunchTimeout);
        assert_eq!(outcome.ticks, 202);

        let recording = outcome.recording.unwrap();
        assert_eq!(recording.len(), 1);
        let replayed = replay(&Rules::default(), &level, &recording).unwrap();
        assert_eq!(replayed.hash, outcome.hash);
        assert_eq!(replayed.status, BoardStatus::LaunchTimeout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_returns_outcome() {
        let board = Board::from_level(Rules::default(), 2, &idle_level()).unwrap();
        let handle = GameSession::new(board, quick_config()).spawn();

        tokio::time::sleep(Duration::from_millis(200)).await;
        handle.press(1, BoardPoint::new(10, 10)).await.unwrap();
        handle.release(1, BoardPoint::new(10, 10)).await.unwrap();

        let outcome = handle.shutdown().await.unwrap();
        assert_eq!(outcome.status, BoardStatus::Incomplete);
        assert!(outcome.ticks > 0);
        assert_eq!(outcome.recording.map(|r| r.len()), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_stops_ticks() {
        let board = Board::from_level(Rules::default(), 3, &idle_level()).unwrap();
        let handle = GameSession::new(board, quick_config()).spawn();

        handle.send(SessionCommand::SetPaused(true)).await.unwrap();
        let mut snapshots = handle.subscribe();
        while !snapshots.borrow_and_update().paused {
            snapshots.changed().await.unwrap();
        }
        let paused_at = snapshots.borrow().tick;

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(handle.snapshot().tick, paused_at);

        // A tap resumes
        handle.press(1, BoardPoint::new(100, 100)).await.unwrap();
        handle.release(1, BoardPoint::new(102, 101)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(!handle.snapshot().paused);
        assert!(handle.snapshot().tick > paused_at);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_frame_sink_sees_every_tick() {
        let frames = Arc::new(AtomicU32::new(0));
        let counter = frames.clone();
        let board = Board::from_level(Rules::default(), 4, &idle_level()).unwrap();
        let config = SchedulerConfig { auto_launch: true, ..quick_config() };

        let handle = GameSession::new(board, config)
            .with_sink(move |snapshot: &BoardSnapshot, _events: &[BoardEvent]| {
                counter.fetch_add(1, Ordering::SeqCst);
                assert!(snapshot.tick > 0);
            })
            .spawn();

        let outcome = handle.join().await.unwrap();
        assert_eq!(frames.load(Ordering::SeqCst), outcome.ticks);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_after_end_is_closed() {
        let board = Board::new(Rules::default(), 1);
        let handle = GameSession::new(board, quick_config()).spawn();

        while !handle.is_finished() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(matches!(
            handle.send(SessionCommand::Launch).await,
            Err(SessionError::Closed)
        ));
    }
}
