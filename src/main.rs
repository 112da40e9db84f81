//! Pathological Engine
//!
//! Runs a demo level in a real-time session, then replays the recorded
//! inputs on a fresh board and checks the state hashes agree.

use std::time::Duration;

use anyhow::{bail, Context};
use chrono::Utc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use pathological::{
    parse_level, seed_for_level, Board, BoardPoint, EngineConfig, GameSession, TICK_RATE, VERSION,
    game::{
        events::{BoardEvent, BoardEventData},
        replay,
        BoardSnapshot,
    },
};

/// Two wheels joined by a loop of track.
const DEMO_LEVEL: &str = "\
name=Demo Loop
launchtimer=3
boardtimer=60
colors=2346
|Of | a | a | a | a | a | a |Of |
| 5 |   |   |   |   |   |   | 5 |
| 5 |   |   |   |   |   |   | 5 |
| 5 |   |   |   |   |   |   | 5 |
| 5 |   |   |   |   |   |   | 5 |
| 3 | a | a | a | a | a | a | 9 |
";

/// Wall-clock cap on the demo.
const DEMO_SECONDS: u64 = 20;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("Pathological Engine v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::from_path(&path)
            .with_context(|| format!("loading config from {}", path))?,
        None => EngineConfig::default(),
    };

    demo_session(config).await
}

/// Play the demo level with a few scripted taps.
async fn demo_session(config: EngineConfig) -> anyhow::Result<()> {
    info!("=== Starting Demo Session ===");

    let level = parse_level(DEMO_LEVEL, 0)?;
    let seed = seed_for_level(0, Utc::now().timestamp_millis());
    let board = Board::from_level(config.rules.clone(), seed, &level)?;

    info!("Level: {}", level.name);
    info!("RNG Seed: {}", seed);

    let session = GameSession::new(board, config.scheduler.clone())
        .with_sink(|snapshot: &BoardSnapshot, events: &[BoardEvent]| {
            for event in events {
                match &event.data {
                    BoardEventData::WheelCompleted { wheel } => {
                        info!("Tick {}: wheel ({}, {}) completed", event.tick, wheel.row, wheel.col);
                    }
                    BoardEventData::StatusChanged { status } => {
                        info!("Tick {}: board {:?}, score {}", event.tick, status, snapshot.score);
                    }
                    _ => {}
                }
            }
        });

    let handle = session.spawn();
    info!("Session ID: {}", handle.id());

    // Tap both wheels every few seconds to flush their holes
    let wheels = [BoardPoint::new(38, 38), BoardPoint::new(570, 38)];
    let mut snapshots = handle.subscribe();
    let deadline = tokio::time::sleep(Duration::from_secs(DEMO_SECONDS));
    tokio::pin!(deadline);
    let mut taps = tokio::time::interval(Duration::from_secs(4));
    let mut pointer = 0;

    loop {
        tokio::select! {
            _ = &mut deadline => {
                info!("Demo time is up");
                break;
            }
            _ = taps.tick() => {
                let at = wheels[pointer as usize % wheels.len()];
                pointer += 1;
                if handle.press(pointer, at).await.is_err() || handle.release(pointer, at).await.is_err() {
                    break;
                }
            }
            changed = snapshots.changed() => {
                if changed.is_err() || snapshots.borrow().status.is_terminal() {
                    break;
                }
            }
        }
    }

    let outcome = handle.shutdown().await?;

    // Print final results
    info!("=== Session Results ===");
    info!("Status: {:?}", outcome.status);
    info!("Ticks: {}", outcome.ticks);
    info!(
        "Score: {} (+{} empty holes, +{} time) = {}",
        outcome.result.score,
        outcome.result.empty_hole_bonus,
        outcome.result.time_remaining_bonus,
        outcome.result.total
    );
    info!("Final State Hash: {}", hex::encode(outcome.hash));

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let Some(recording) = outcome.recording else {
        warn!("Input recording disabled, skipping replay");
        return Ok(());
    };
    info!("Replaying {} inputs", recording.len());

    let replayed = replay(&config.rules, &level, &recording)?;
    info!("Replay State Hash: {}", hex::encode(replayed.hash));

    if replayed.hash == outcome.hash {
        info!("DETERMINISM VERIFIED: Hashes match!");
        Ok(())
    } else {
        bail!("DETERMINISM FAILURE: Hashes differ!")
    }
}
