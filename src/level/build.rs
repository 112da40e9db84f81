//! Level Builder
//!
//! Validates a descriptor and produces everything `Board::load` needs.
//! Nothing touches a board until the whole level has been built, so a
//! bad tile anywhere leaves the previous board untouched.

use std::collections::BTreeMap;

use crate::core::geometry::{BoardPoint, Direction, Paths, Position, HORIZ_TILES, VERT_TILES};
use crate::game::config::Rules;
use crate::game::launch::ColorPalette;
use crate::game::marble::MAX_COLOR;
use crate::game::replicator::Replicator;
use crate::game::signal::{Stoplight, Trigger};
use crate::game::tile::{tile_center, Tile, TileKind};
use crate::game::wheel::Wheel;
use crate::level::{LevelDescriptor, LevelLoadError, Requirement, TileSpec};

/// A marble placed by a digit tile code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InitialMarble {
    /// Center (the tile center)
    pub position: BoardPoint,
    /// Heading
    pub direction: Direction,
    /// Color
    pub color: u8,
}

/// A validated level.
#[derive(Clone, Debug)]
pub struct BuiltLevel {
    /// Level title
    pub name: String,
    /// Tiles in row-major order
    pub tiles: Vec<Tile>,
    /// Marbles present at start
    pub initial_marbles: Vec<InitialMarble>,
    /// Live marble cap
    pub live_limit: usize,
    /// Launch timer start in ticks
    pub launch_timeout_start: u32,
    /// Board timer start in ticks
    pub board_timeout_start: u32,
    /// Launch palette
    pub palette: ColorPalette,
    /// Wheel prerequisites
    pub requirements: Vec<Requirement>,
    /// Number of wheels
    pub wheel_count: usize,
}

/// Build a level from its descriptor.
pub fn build_level(level: &LevelDescriptor, rules: &Rules) -> Result<BuiltLevel, LevelLoadError> {
    if level.rows.len() < VERT_TILES {
        return Err(LevelLoadError::Truncated);
    }

    let mut palette = ColorPalette::parse(level.colors.as_deref().unwrap_or(&rules.default_colors));
    if palette.is_empty() {
        palette = ColorPalette::parse(&rules.default_colors);
    }
    let stoplight = level.stoplight.as_deref().unwrap_or(&rules.default_stoplight);

    let mut tiles = Vec::with_capacity(VERT_TILES * HORIZ_TILES);
    let mut initial_marbles = Vec::new();
    // First teleporter seen per glyph; later ones all pair back to it
    let mut first_teleporter: BTreeMap<Option<char>, Position> = BTreeMap::new();
    let mut wheel_count = 0;

    for (row, specs) in level.rows.iter().take(VERT_TILES).enumerate() {
        if specs.len() != HORIZ_TILES {
            return Err(LevelLoadError::MalformedRow {
                line: row + 1,
                reason: format!("expected {} tiles, found {}", HORIZ_TILES, specs.len()),
            });
        }

        for (col, spec) in specs.iter().enumerate() {
            let position = Position::new(row, col);
            let kind = tile_kind(spec, position, stoplight)?;

            match &kind {
                TileKind::Wheel(_) => wheel_count += 1,
                TileKind::Teleporter { .. } => {
                    if let Some(&first) = first_teleporter.get(&spec.color) {
                        link_teleporters(&mut tiles, first, position);
                        tiles.push(Tile::new(
                            position,
                            Paths::new(spec.paths),
                            TileKind::Teleporter { partner: Some(first) },
                        ));
                        continue;
                    }
                    first_teleporter.insert(spec.color, position);
                }
                _ => {}
            }

            if let Some(color) = spec.code.to_digit(10).filter(|d| *d <= MAX_COLOR as u32) {
                initial_marbles.push(InitialMarble {
                    position: tile_center(position, rules),
                    direction: spec.color.and_then(Direction::from_glyph).unwrap_or(Direction::Left),
                    color: color as u8,
                });
            }

            tiles.push(Tile::new(position, Paths::new(spec.paths), kind));
        }
    }

    for req in &level.requires {
        let is_wheel = |p: Position| {
            p.is_valid() && matches!(tiles[p.index()].kind, TileKind::Wheel(_))
        };
        if !is_wheel(req.wheel) || !is_wheel(req.needs) {
            return Err(LevelLoadError::InvalidRequirement { wheel: req.wheel, needs: req.needs });
        }
    }

    let launch_passes = level.launch_timer.unwrap_or(rules.default_launch_passes);
    let board_seconds = level
        .board_timer
        .unwrap_or(rules.default_board_seconds * wheel_count as u32);

    Ok(BuiltLevel {
        name: level.name.clone(),
        tiles,
        initial_marbles,
        live_limit: level.max_marbles.unwrap_or(rules.default_live_marbles),
        launch_timeout_start: rules.launch_timeout_for(launch_passes),
        board_timeout_start: rules.ticks_for_seconds(board_seconds),
        palette,
        requirements: level.requires.clone(),
        wheel_count,
    })
}

fn link_teleporters(tiles: &mut [Tile], first: Position, second: Position) {
    if let Some(tile) = tiles.get_mut(first.index()) {
        tile.kind = TileKind::Teleporter { partner: Some(second) };
    }
}

fn tile_kind(spec: &TileSpec, position: Position, stoplight: &str) -> Result<TileKind, LevelLoadError> {
    let color = spec.color_value().min(MAX_COLOR);
    let unknown = || LevelLoadError::UnknownTileCode {
        row: position.row,
        col: position.col,
        code: spec.code,
    };

    let kind = match spec.code {
        ' ' | '0'..='8' => TileKind::Plain,
        'O' => TileKind::Wheel(Wheel::new()),
        '%' => TileKind::Trigger(Trigger::new()),
        '!' => TileKind::Stoplight(Stoplight::parse(stoplight)),
        '&' => TileKind::Painter { color },
        '#' => TileKind::Filter { color },
        '@' => TileKind::Buffer {
            held: spec.color.map(|_| color),
            release: None,
        },
        'X' => TileKind::Shredder,
        '*' => TileKind::Replicator(Replicator::new(spec.color_value() as u32)),
        '=' => TileKind::Teleporter { partner: None },
        '^' | '>' | 'v' | '<' => {
            let direction = Direction::from_glyph(spec.code).ok_or_else(unknown)?;
            match spec.color {
                None => TileKind::Director { direction },
                Some(glyph) => match Direction::from_glyph(glyph) {
                    Some(other) if other != direction => TileKind::Switch { current: direction, other },
                    _ => {
                        return Err(LevelLoadError::MalformedRow {
                            line: position.row + 1,
                            reason: format!(
                                "switch at column {} needs a second arrow, got {:?}",
                                position.col, glyph
                            ),
                        })
                    }
                },
            }
        }
        _ => return Err(unknown()),
    };
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(code: char, paths: u8, color: Option<char>) -> TileSpec {
        TileSpec::new(code, paths, color)
    }

    #[test]
    fn test_default_board_timer_scales_with_wheels() {
        let rules = Rules::default();
        let mut level = LevelDescriptor::blank("three wheels");
        for col in 0..3 {
            level.set(Position::new(2, col), spec('O', 15, None));
        }
        let built = build_level(&level, &rules).unwrap();
        assert_eq!(built.wheel_count, 3);
        assert_eq!(built.board_timeout_start, 30 * rules.ticks_per_second * 3);
        assert_eq!(built.launch_timeout_start, rules.launch_timeout_for(6));
        assert_eq!(built.live_limit, 10);
    }

    #[test]
    fn test_explicit_timers() {
        let rules = Rules::default();
        let mut level = LevelDescriptor::blank("timed");
        level.board_timer = Some(90);
        level.launch_timer = Some(3);
        let built = build_level(&level, &rules).unwrap();
        assert_eq!(built.board_timeout_start, 90 * 50);
        assert_eq!(built.launch_timeout_start, 582);
    }

    #[test]
    fn test_teleporters_pair_by_glyph() {
        let rules = Rules::default();
        let mut level = LevelDescriptor::blank("tele");
        level
            .set(Position::new(0, 1), spec('=', 10, Some('1')))
            .set(Position::new(1, 1), spec('=', 10, Some('2')))
            .set(Position::new(4, 6), spec('=', 10, Some('1')))
            .set(Position::new(5, 0), spec('=', 10, Some('2')));
        let built = build_level(&level, &rules).unwrap();

        let partner = |p: Position| match built.tiles[p.index()].kind {
            TileKind::Teleporter { partner } => partner,
            _ => None,
        };
        assert_eq!(partner(Position::new(0, 1)), Some(Position::new(4, 6)));
        assert_eq!(partner(Position::new(4, 6)), Some(Position::new(0, 1)));
        assert_eq!(partner(Position::new(1, 1)), Some(Position::new(5, 0)));
        assert_eq!(partner(Position::new(5, 0)), Some(Position::new(1, 1)));
    }

    #[test]
    fn test_extra_teleporter_pairs_with_first() {
        let rules = Rules::default();
        let mut level = LevelDescriptor::blank("tele3");
        level
            .set(Position::new(0, 1), spec('=', 10, Some('1')))
            .set(Position::new(2, 3), spec('=', 10, Some('1')))
            .set(Position::new(4, 6), spec('=', 10, Some('1')));
        let built = build_level(&level, &rules).unwrap();

        let partner = |p: Position| match built.tiles[p.index()].kind {
            TileKind::Teleporter { partner } => partner,
            _ => None,
        };
        // The third links back to the first, which now points at the third
        assert_eq!(partner(Position::new(4, 6)), Some(Position::new(0, 1)));
        assert_eq!(partner(Position::new(0, 1)), Some(Position::new(4, 6)));
        assert_eq!(partner(Position::new(2, 3)), Some(Position::new(0, 1)));
    }

    #[test]
    fn test_directors_and_switches() {
        let rules = Rules::default();
        let mut level = LevelDescriptor::blank("arrows");
        level
            .set(Position::new(0, 0), spec('^', 15, None))
            .set(Position::new(0, 1), spec('>', 15, Some('v')));
        let built = build_level(&level, &rules).unwrap();
        assert_eq!(built.tiles[0].kind, TileKind::Director { direction: Direction::Up });
        assert_eq!(
            built.tiles[1].kind,
            TileKind::Switch { current: Direction::Right, other: Direction::Down }
        );

        level.set(Position::new(0, 2), spec('<', 15, Some('<')));
        assert!(matches!(build_level(&level, &rules), Err(LevelLoadError::MalformedRow { .. })));
    }

    #[test]
    fn test_digit_tiles_place_marbles() {
        let rules = Rules::default();
        let mut level = LevelDescriptor::blank("marbles");
        level
            .set(Position::new(1, 2), spec('3', 10, Some('>')))
            .set(Position::new(2, 2), spec('8', 10, None));
        let built = build_level(&level, &rules).unwrap();
        assert_eq!(
            built.initial_marbles,
            vec![
                InitialMarble { position: BoardPoint::new(190, 114), direction: Direction::Right, color: 3 },
                InitialMarble { position: BoardPoint::new(190, 190), direction: Direction::Left, color: 8 },
            ]
        );
        assert_eq!(built.tiles[Position::new(1, 2).index()].kind, TileKind::Plain);
    }

    #[test]
    fn test_unknown_code() {
        let rules = Rules::default();
        let mut level = LevelDescriptor::blank("bad");
        level.set(Position::new(3, 5), spec('Q', 0, None));
        match build_level(&level, &rules) {
            Err(LevelLoadError::UnknownTileCode { row, col, code }) => {
                assert_eq!((row, col, code), (3, 5, 'Q'));
            }
            other => panic!("expected unknown code, got {:?}", other),
        }
    }

    #[test]
    fn test_requirements_must_name_wheels() {
        let rules = Rules::default();
        let mut level = LevelDescriptor::blank("gated");
        level
            .set(Position::new(0, 0), spec('O', 15, None))
            .set(Position::new(0, 7), spec('O', 15, None));
        level.requires.push(Requirement { wheel: Position::new(0, 0), needs: Position::new(0, 7) });
        assert!(build_level(&level, &rules).is_ok());

        level.requires.push(Requirement { wheel: Position::new(0, 0), needs: Position::new(3, 3) });
        assert!(matches!(
            build_level(&level, &rules),
            Err(LevelLoadError::InvalidRequirement { .. })
        ));
    }

    #[test]
    fn test_short_descriptor_is_truncated() {
        let rules = Rules::default();
        let mut level = LevelDescriptor::blank("short");
        level.rows.pop();
        assert!(matches!(build_level(&level, &rules), Err(LevelLoadError::Truncated)));

        let mut level = LevelDescriptor::blank("narrow");
        level.rows[2].pop();
        assert!(matches!(
            build_level(&level, &rules),
            Err(LevelLoadError::MalformedRow { line: 3, .. })
        ));
    }
}
