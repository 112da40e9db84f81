//! Board Geometry
//!
//! Integer-only grid coordinates, compass directions and path masks.
//! Board space: x grows right, y grows down, (0, 0) is the top-left
//! corner of the tile grid. The launch lane sits above it (y < 0).

use serde::{Serialize, Deserialize};

/// Number of tile rows.
pub const VERT_TILES: usize = 6;

/// Number of tile columns.
pub const HORIZ_TILES: usize = 8;

/// Total number of tiles on a board.
pub const TILE_COUNT: usize = VERT_TILES * HORIZ_TILES;

// =============================================================================
// DIRECTION
// =============================================================================

/// Compass direction of travel.
///
/// The discriminant doubles as the bit index in a [`Paths`] mask and as
/// the slot index of a wheel hole.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    /// Toward the launch lane (negative y)
    Up = 0,
    /// Positive x
    Right = 1,
    /// Positive y
    Down = 2,
    /// Negative x
    Left = 3,
}

impl Direction {
    /// All directions, clockwise from up.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Parse an arrow glyph used by level files.
    pub fn from_glyph(glyph: char) -> Option<Direction> {
        match glyph {
            '^' => Some(Direction::Up),
            '>' => Some(Direction::Right),
            'v' => Some(Direction::Down),
            '<' => Some(Direction::Left),
            _ => None,
        }
    }

    /// Index into per-direction arrays.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Unit step along x.
    #[inline]
    pub fn dx(self) -> i32 {
        match self {
            Direction::Right => 1,
            Direction::Left => -1,
            _ => 0,
        }
    }

    /// Unit step along y.
    #[inline]
    pub fn dy(self) -> i32 {
        match self {
            Direction::Up => -1,
            Direction::Down => 1,
            _ => 0,
        }
    }

    /// Reverse direction.
    #[inline]
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    /// Bit for this direction in a paths mask.
    #[inline]
    pub fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

// =============================================================================
// PATHS
// =============================================================================

/// 4-bit mask of open tile edges: up=1, right=2, down=4, left=8.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Paths(pub u8);

impl Paths {
    /// No open edges.
    pub const NONE: Paths = Paths(0);

    /// Create from raw bits (upper bits dropped).
    pub const fn new(bits: u8) -> Self {
        Self(bits & 0x0F)
    }

    /// Is the edge in this direction open?
    #[inline]
    pub fn has(self, dir: Direction) -> bool {
        self.0 & dir.bit() != 0
    }

    /// Mask with one edge removed.
    #[inline]
    pub fn without(self, dir: Direction) -> Paths {
        Paths(self.0 & !dir.bit())
    }

    /// The direction if exactly one edge is open.
    pub fn single(self) -> Option<Direction> {
        match self.0 {
            1 => Some(Direction::Up),
            2 => Some(Direction::Right),
            4 => Some(Direction::Down),
            8 => Some(Direction::Left),
            _ => None,
        }
    }

    /// First open edge clockwise from up.
    pub fn first_open(self) -> Option<Direction> {
        Direction::ALL.into_iter().find(|d| self.has(*d))
    }
}

// =============================================================================
// POSITIONS
// =============================================================================

/// Grid coordinate of a tile.
///
/// Ordered row-major so BTreeMap iteration follows board scan order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Row (0 = top)
    pub row: usize,
    /// Column (0 = left)
    pub col: usize,
}

impl Position {
    /// Create a position.
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Whether the position lies on the grid.
    #[inline]
    pub fn is_valid(self) -> bool {
        self.row < VERT_TILES && self.col < HORIZ_TILES
    }

    /// Row-major index into the tile array.
    #[inline]
    pub fn index(self) -> usize {
        self.row * HORIZ_TILES + self.col
    }

    /// Inverse of [`Position::index`].
    #[inline]
    pub fn from_index(index: usize) -> Self {
        Self {
            row: index / HORIZ_TILES,
            col: index % HORIZ_TILES,
        }
    }
}

/// A point in board space (pixels).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardPoint {
    /// Horizontal coordinate
    pub x: i32,
    /// Vertical coordinate
    pub y: i32,
}

impl BoardPoint {
    /// Create a point.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Squared distance to another point.
    #[inline]
    pub fn distance_squared(self, other: BoardPoint) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_opposites() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_eq!(dir.dx(), -dir.opposite().dx());
            assert_eq!(dir.dy(), -dir.opposite().dy());
        }
    }

    #[test]
    fn test_direction_bits() {
        assert_eq!(Direction::Up.bit(), 1);
        assert_eq!(Direction::Right.bit(), 2);
        assert_eq!(Direction::Down.bit(), 4);
        assert_eq!(Direction::Left.bit(), 8);
    }

    #[test]
    fn test_paths_single_and_without() {
        let paths = Paths::new(Direction::Left.bit() | Direction::Down.bit());
        assert!(paths.has(Direction::Left));
        assert!(!paths.has(Direction::Up));
        assert_eq!(paths.without(Direction::Left).single(), Some(Direction::Down));
        assert_eq!(paths.single(), None);
        assert_eq!(paths.first_open(), Some(Direction::Down));
    }

    #[test]
    fn test_position_index_roundtrip() {
        let pos = Position::new(5, 7);
        assert_eq!(pos.index(), TILE_COUNT - 1);
        assert_eq!(Position::from_index(pos.index()), pos);
        assert!(!Position::new(6, 0).is_valid());
    }

    #[test]
    fn test_position_ordering_is_row_major() {
        assert!(Position::new(0, 7) < Position::new(1, 0));
    }
}
