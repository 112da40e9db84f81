//! Level Text Format
//!
//! ```text
//! name=Switchback
//! maxmarbles=6
//! colors=2346
//! |Of | a | a |<c^| a |...
//! ```
//!
//! Row lines start with `|`. Each tile takes four characters: a
//! separator, the type code, the paths mask as a hex digit and the
//! color glyph. Other non-blank lines are `key=value` directives that
//! apply to the level whose rows follow. Level `N` starts after `6·N`
//! row lines.

use std::path::Path;

use tracing::{debug, warn};

use crate::core::geometry::{Position, HORIZ_TILES, VERT_TILES};
use crate::level::{LevelDescriptor, LevelLoadError, Requirement, TileSpec};

/// Characters per tile in a row line.
const TILE_WIDTH: usize = 4;

/// Parse level `index` out of a text containing many levels.
pub fn parse_level(text: &str, index: usize) -> Result<LevelDescriptor, LevelLoadError> {
    let mut lines = text.lines().enumerate().map(|(n, line)| (n + 1, line));

    // Skip the previous levels
    let mut skipped = 0;
    while skipped < VERT_TILES * index {
        let (_, line) = lines.next().ok_or(LevelLoadError::Truncated)?;
        if line.starts_with('|') {
            skipped += 1;
        }
    }

    let mut level = LevelDescriptor::default();
    while level.rows.len() < VERT_TILES {
        let (number, line) = lines.next().ok_or(LevelLoadError::Truncated)?;
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with('|') {
            level.rows.push(parse_row(number, line)?);
        } else {
            apply_directive(&mut level, number, line)?;
        }
    }

    debug!(index, name = %level.name, "parsed level");
    Ok(level)
}

/// Read a level file and parse level `index`.
pub fn load_level_file(path: impl AsRef<Path>, index: usize) -> Result<LevelDescriptor, LevelLoadError> {
    let text = std::fs::read_to_string(path)?;
    parse_level(&text, index)
}

fn parse_row(number: usize, line: &str) -> Result<Vec<TileSpec>, LevelLoadError> {
    let chars: Vec<char> = line.chars().collect();
    // Trailing blanks are often trimmed by editors
    let at = |i: usize| chars.get(i).copied().unwrap_or(' ');

    (0..HORIZ_TILES)
        .map(|col| -> Result<TileSpec, LevelLoadError> {
            let base = col * TILE_WIDTH;
            let code = at(base + 1);
            let paths = parse_paths(at(base + 2)).ok_or_else(|| LevelLoadError::MalformedRow {
                line: number,
                reason: format!("bad paths digit {:?} in column {}", at(base + 2), col),
            })?;
            let color = match at(base + 3) {
                ' ' => None,
                c => Some(c),
            };
            Ok(TileSpec::new(code, paths, color))
        })
        .collect()
}

fn parse_paths(c: char) -> Option<u8> {
    match c {
        ' ' => Some(0),
        _ => c.to_digit(16).filter(|_| !c.is_ascii_uppercase()).map(|d| d as u8),
    }
}

fn apply_directive(level: &mut LevelDescriptor, number: usize, line: &str) -> Result<(), LevelLoadError> {
    let Some((key, value)) = line.split_once('=') else {
        return Err(LevelLoadError::MalformedRow {
            line: number,
            reason: format!("expected a row or key=value, got {:?}", line),
        });
    };

    match key {
        "name" => level.name = value.to_string(),
        "maxmarbles" => level.max_marbles = Some(parse_number(number, key, value)? as usize),
        "launchtimer" => level.launch_timer = Some(parse_number(number, key, value)?),
        "boardtimer" => level.board_timer = Some(parse_number(number, key, value)?),
        "colors" => level.colors = Some(value.to_string()),
        "stoplight" => level.stoplight = Some(value.to_string()),
        "requires" => {
            for token in value.split_whitespace() {
                level.requires.push(parse_requirement(number, token)?);
            }
        }
        _ => warn!(line = number, key, "ignoring unknown level directive"),
    }
    Ok(())
}

fn parse_number(number: usize, key: &str, value: &str) -> Result<u32, LevelLoadError> {
    value.trim().parse().map_err(|_| LevelLoadError::MalformedRow {
        line: number,
        reason: format!("{} expects a number, got {:?}", key, value),
    })
}

/// `RC:RC`, gated wheel first.
fn parse_requirement(number: usize, token: &str) -> Result<Requirement, LevelLoadError> {
    let malformed = || LevelLoadError::MalformedRow {
        line: number,
        reason: format!("requirement {:?} is not RC:RC", token),
    };

    let position = |s: &str| -> Option<Position> {
        let mut digits = s.chars().map(|c| c.to_digit(10));
        match (digits.next(), digits.next(), digits.next()) {
            (Some(Some(r)), Some(Some(c)), None) => {
                let pos = Position::new(r as usize, c as usize);
                pos.is_valid().then_some(pos)
            }
            _ => None,
        }
    };

    let (wheel, needs) = token.split_once(':').ok_or_else(malformed)?;
    Ok(Requirement {
        wheel: position(wheel).ok_or_else(malformed)?,
        needs: position(needs).ok_or_else(malformed)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_LEVELS: &str = "\
name=First
|Of | a | a | a | a | a | a | c |
| 5 |   |   |   |   |   |   | 5 |
| 5 |   |   |   |   |   |   | 5 |
| 5 |   |   |   |   |   |   | 5 |
| 5 |   |   |   |   |   |   | 5 |
| 3 | a | a | a | a | a | a | 9 |

name=Second
maxmarbles=4
launchtimer=3
boardtimer=120
colors=2348
stoplight=64x
requires=00:07
|Of |=a1| a | a | a | a | a |Oc |
| 5 |^5 |>5v|25<| a | a | a | 5 |
| 5 |   |   |   |   |   |   | 5 |
| 5 |   |   |   |   |   |   | 5 |
| 5 |   |   |   |   |   |   | 5 |
| 3 |=a1| a | a | a | a | a | 9 |
";

    #[test]
    fn test_parse_first_level() {
        let level = parse_level(TWO_LEVELS, 0).unwrap();
        assert_eq!(level.name, "First");
        assert_eq!(level.rows.len(), 6);
        assert_eq!(level.rows[0][0], TileSpec::new('O', 15, None));
        assert_eq!(level.rows[0][7], TileSpec::new(' ', 12, None));
        assert_eq!(level.max_marbles, None);
    }

    #[test]
    fn test_parse_indexed_level_with_directives() {
        let level = parse_level(TWO_LEVELS, 1).unwrap();
        assert_eq!(level.name, "Second");
        assert_eq!(level.max_marbles, Some(4));
        assert_eq!(level.launch_timer, Some(3));
        assert_eq!(level.board_timer, Some(120));
        assert_eq!(level.colors.as_deref(), Some("2348"));
        assert_eq!(level.stoplight.as_deref(), Some("64x"));
        assert_eq!(
            level.requires,
            vec![Requirement { wheel: Position::new(0, 0), needs: Position::new(0, 7) }]
        );
        assert_eq!(level.rows[0][1], TileSpec::new('=', 10, Some('1')));
        assert_eq!(level.rows[1][2], TileSpec::new('>', 5, Some('v')));
        assert_eq!(level.rows[1][3], TileSpec::new('2', 5, Some('<')));
    }

    #[test]
    fn test_missing_level_is_truncated() {
        assert!(matches!(parse_level(TWO_LEVELS, 2), Err(LevelLoadError::Truncated)));

        let short = TWO_LEVELS.lines().take(4).collect::<Vec<_>>().join("\n");
        assert!(matches!(parse_level(&short, 0), Err(LevelLoadError::Truncated)));
    }

    #[test]
    fn test_bad_paths_digit() {
        let text = TWO_LEVELS.replacen("| 5 |   |", "| G |   |", 1);
        match parse_level(&text, 0) {
            Err(LevelLoadError::MalformedRow { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected malformed row, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_directive_value() {
        let text = TWO_LEVELS.replace("maxmarbles=4", "maxmarbles=lots");
        assert!(matches!(
            parse_level(&text, 1),
            Err(LevelLoadError::MalformedRow { line: 10, .. })
        ));

        let text = TWO_LEVELS.replace("requires=00:07", "requires=0:07");
        assert!(matches!(parse_level(&text, 1), Err(LevelLoadError::MalformedRow { .. })));
    }

    #[test]
    fn test_missing_file_is_io_failure() {
        let result = load_level_file("/nonexistent/all_boards.txt", 0);
        assert!(matches!(result, Err(LevelLoadError::IoFailure(_))));
    }
}
