//! Level Descriptors
//!
//! A level is a 6×8 grid of tile specs plus a handful of directives.
//! `parser` reads the text format; `build` validates a descriptor and
//! turns it into tiles ready for `Board::load`.

pub mod parser;
pub mod build;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::geometry::Position;

pub use parser::{parse_level, load_level_file};
pub use build::{build_level, BuiltLevel, InitialMarble};

/// Errors loading a level. A failed load installs nothing.
#[derive(Debug, Error)]
pub enum LevelLoadError {
    /// Ran out of input before the level was complete.
    #[error("level data truncated")]
    Truncated,

    /// A row or directive could not be understood.
    #[error("malformed row at line {line}: {reason}")]
    MalformedRow {
        /// Source line (1-based); row number within the level for
        /// descriptors built in code
        line: usize,
        /// What was wrong
        reason: String,
    },

    /// A tile type code is not recognized.
    #[error("unknown tile code {code:?} at row {row}, column {col}")]
    UnknownTileCode {
        /// Tile row
        row: usize,
        /// Tile column
        col: usize,
        /// Offending code
        code: char,
    },

    /// A `requires` entry names a tile that is not a wheel.
    #[error("requirement {wheel:?} -> {needs:?} does not name two wheels")]
    InvalidRequirement {
        /// Gated wheel
        wheel: Position,
        /// Prerequisite
        needs: Position,
    },

    /// Reading the level source failed.
    #[error("failed to read level: {0}")]
    IoFailure(#[from] std::io::Error),
}

/// One tile as written in a level: type code, paths mask, color glyph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSpec {
    /// Type code character
    pub code: char,
    /// Open edges (0-15)
    pub paths: u8,
    /// Literal color/orientation glyph; `None` when blank
    pub color: Option<char>,
}

impl TileSpec {
    /// Blank plain tile with no paths.
    pub const EMPTY: TileSpec = TileSpec { code: ' ', paths: 0, color: None };

    /// Create a spec.
    pub fn new(code: char, paths: u8, color: Option<char>) -> Self {
        Self { code, paths, color }
    }

    /// Numeric value of the color glyph: digits, then `a`.. as 10..
    pub fn color_value(&self) -> u8 {
        match self.color {
            Some(c @ '0'..='9') => c as u8 - b'0',
            Some(c @ 'a'..='z') => c as u8 - b'a' + 10,
            _ => 0,
        }
    }
}

/// Wheel `wheel` cannot complete before wheel `needs`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// Gated wheel
    pub wheel: Position,
    /// Prerequisite wheel
    pub needs: Position,
}

/// A parsed level.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDescriptor {
    /// Level title
    pub name: String,
    /// Live marble cap
    pub max_marbles: Option<usize>,
    /// Launch timer in board passes
    pub launch_timer: Option<u32>,
    /// Board timer in seconds
    pub board_timer: Option<u32>,
    /// Launch palette digits
    pub colors: Option<String>,
    /// Stoplight sequence digits
    pub stoplight: Option<String>,
    /// Wheel prerequisites
    pub requires: Vec<Requirement>,
    /// Tile rows, top first
    pub rows: Vec<Vec<TileSpec>>,
}

impl LevelDescriptor {
    /// Descriptor with every tile blank.
    pub fn blank(name: impl Into<String>) -> Self {
        use crate::core::geometry::{HORIZ_TILES, VERT_TILES};
        Self {
            name: name.into(),
            rows: vec![vec![TileSpec::EMPTY; HORIZ_TILES]; VERT_TILES],
            ..Self::default()
        }
    }

    /// Replace one tile spec.
    pub fn set(&mut self, pos: Position, spec: TileSpec) -> &mut Self {
        if let Some(slot) = self.rows.get_mut(pos.row).and_then(|r| r.get_mut(pos.col)) {
            *slot = spec;
        }
        self
    }
}
