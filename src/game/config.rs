//! Gameplay Rules and Engine Configuration
//!
//! `Rules` holds the board geometry and the pacing/scoring constants.
//! `EngineConfig` wraps the rules together with scheduler settings and
//! can be loaded from JSON. Every field has a default, so a partial
//! JSON document only overrides what it names.

use std::path::Path;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::geometry::{Direction, BoardPoint, HORIZ_TILES, VERT_TILES};

/// Error loading an engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid JSON for `EngineConfig`
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of range
    #[error("invalid config: {field} {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: &'static str,
    },
}

// =============================================================================
// RULES
// =============================================================================

/// Gameplay geometry and constants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// Edge length of a tile in pixels
    pub tile_size: i32,
    /// Diameter of a marble in pixels
    pub marble_size: i32,
    /// Marble speed in pixels per tick
    pub marble_speed: i32,
    /// Simulation rate
    pub ticks_per_second: u32,
    /// Launch timer in board passes when a level names none
    pub default_launch_passes: u32,
    /// Board seconds per wheel when a level names no board timer
    pub default_board_seconds: u32,
    /// Launch palette when a level names none
    pub default_colors: String,
    /// Stoplight sequence when a level names none
    pub default_stoplight: String,
    /// Live marble cap when a level names none
    pub default_live_marbles: usize,
    /// Ticks between replicator clones
    pub replicator_delay: u32,
    /// Ticks a wheel spends rotating after a click
    pub wheel_spin_ticks: u32,
    /// Ticks before a completed trigger draws a new pattern
    pub trigger_reset_ticks: u32,
    /// Points for completing a wheel
    pub wheel_bonus: u32,
    /// Points for completing the trigger pattern
    pub trigger_bonus: u32,
    /// Queue slide speed in percent of marble speed
    pub slide_slow_percent: i32,
    /// Accelerated queue slide speed in percent of marble speed
    pub slide_fast_percent: i32,
    /// Slide offset (percent of a marble width) below which acceleration may start
    pub slide_hold_percent: i32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            tile_size: 76,
            marble_size: 38,
            marble_speed: 3,
            ticks_per_second: 50,
            default_launch_passes: 6,
            default_board_seconds: 30,
            default_colors: "2346".to_string(),
            default_stoplight: "643".to_string(),
            default_live_marbles: 10,
            replicator_delay: 35,
            wheel_spin_ticks: 9,
            trigger_reset_ticks: 250,
            wheel_bonus: 10,
            trigger_bonus: 50,
            slide_slow_percent: 20,
            slide_fast_percent: 70,
            slide_hold_percent: 90,
        }
    }
}

impl Rules {
    /// Half a marble width: lane center offset and bounce line.
    #[inline]
    pub fn half_marble(&self) -> i32 {
        self.marble_size / 2
    }

    /// Width of the tile grid in pixels.
    #[inline]
    pub fn board_width(&self) -> i32 {
        HORIZ_TILES as i32 * self.tile_size
    }

    /// Height of the tile grid in pixels.
    #[inline]
    pub fn board_height(&self) -> i32 {
        VERT_TILES as i32 * self.tile_size
    }

    /// Number of queued colors: three screen heights of marbles.
    pub fn launch_queue_len(&self) -> usize {
        ((self.board_height() + self.marble_size) * 3 / self.marble_size).max(1) as usize
    }

    /// Where launched marbles enter the lane (moving left).
    pub fn launch_entry(&self) -> BoardPoint {
        BoardPoint::new(self.board_width() + self.half_marble(), -self.half_marble())
    }

    /// Offset of a wheel hole center from the tile's top-left corner.
    pub fn hole_center(&self, dir: Direction) -> BoardPoint {
        let center = self.tile_size / 2;
        let reach = (self.tile_size - self.marble_size) / 2;
        BoardPoint::new(center + dir.dx() * reach, center + dir.dy() * reach)
    }

    /// Radius around a hole center inside which flicks need half the distance.
    #[inline]
    pub fn flick_near_radius(&self) -> i32 {
        self.marble_size * 5 / 3
    }

    /// Ticks for a marble to make `passes` trips across the board.
    pub fn launch_timeout_for(&self, passes: u32) -> u32 {
        let span = self.board_width() - self.marble_size;
        let distance = self.marble_size as i64 + span as i64 * passes as i64;
        (distance / self.marble_speed.max(1) as i64).max(0) as u32
    }

    /// Convert seconds to ticks.
    #[inline]
    pub fn ticks_for_seconds(&self, seconds: u32) -> u32 {
        seconds.saturating_mul(self.ticks_per_second)
    }

    /// Reject geometry the board cannot divide by or step through.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &'static str, reason: &'static str| Err(ConfigError::Invalid { field, reason });
        if self.tile_size <= 0 {
            return invalid("tile_size", "must be positive");
        }
        if self.marble_size <= 0 {
            return invalid("marble_size", "must be positive");
        }
        if self.marble_size > self.tile_size {
            return invalid("marble_size", "must not exceed tile_size");
        }
        if self.marble_speed <= 0 {
            return invalid("marble_speed", "must be positive");
        }
        if self.ticks_per_second == 0 {
            return invalid("ticks_per_second", "must be positive");
        }
        Ok(())
    }
}

// =============================================================================
// ENGINE CONFIG
// =============================================================================

/// Settings for the fixed-step scheduler and the session task.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Target tick rate
    pub tick_rate_hz: u32,
    /// Intervals of lag tolerated before the clock skips ahead
    pub max_catch_up: u32,
    /// Clock ticks of warmup before the board runs at full rate
    pub warmup_ticks: u32,
    /// Final warmup ticks during which the board runs at half rate
    pub warmup_ramp_ticks: u32,
    /// Capacity of the session command channel
    pub command_capacity: usize,
    /// Launch a marble as soon as the session starts
    pub auto_launch: bool,
    /// Keep a recording of applied inputs for replay
    pub record_inputs: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 50,
            max_catch_up: 4,
            warmup_ticks: 50,
            warmup_ramp_ticks: 20,
            command_capacity: 64,
            auto_launch: true,
            record_inputs: true,
        }
    }
}

/// Top-level engine configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Gameplay rules
    pub rules: Rules,
    /// Scheduler and session settings
    pub scheduler: SchedulerConfig,
}

impl EngineConfig {
    /// Parse from a JSON document and validate the rules.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.rules.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
