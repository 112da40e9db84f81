//! Tiles
//!
//! Every grid cell holds a `Tile`: its position, the paths mask and a
//! `TileKind` carrying per-kind state. Tiles never reach back into the
//! board. They receive a `TileContext` with the rules, live-marble
//! counts, palette and RNG, and push `TileEffect`s that the board
//! applies as soon as the call returns.

use serde::{Serialize, Deserialize};

use crate::core::geometry::{BoardPoint, Direction, Paths, Position};
use crate::core::hash::StateHasher;
use crate::core::rng::DeterministicRng;
use crate::game::config::Rules;
use crate::game::events::RemovalReason;
use crate::game::launch::ColorPalette;
use crate::game::marble::{color_matches, Marble};
use crate::game::replicator::{Replicator, ReplicatorAction};
use crate::game::signal::{Stoplight, Trigger, STOPLIGHT_BONUS};
use crate::game::wheel::{Slot, Wheel};

// =============================================================================
// CONTEXT & EFFECTS
// =============================================================================

/// Side effect requested by a tile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TileEffect {
    /// Remove the marble passed to `affect_marble`
    Remove(RemovalReason),
    /// Create a marble
    Spawn {
        /// Center of the new marble
        position: BoardPoint,
        /// Heading
        direction: Direction,
        /// Color code
        color: u8,
    },
    /// Add points
    Score(u32),
    /// A wheel hole took a marble
    SlotFilled {
        /// Hole
        slot: Direction,
        /// Color now held
        color: u8,
    },
    /// The trigger drew a new pattern
    TriggerPattern([u8; 4]),
    /// The stoplight moved on; colors left
    StoplightAdvanced(usize),
    /// Replicator dropped its queue at the cap
    ReplicatorOverflow(usize),
}

/// What a tile may see of the board.
pub struct TileContext<'a> {
    /// Gameplay rules
    pub rules: &'a Rules,
    /// Live marble count, including spawns made during this call
    pub live_marbles: usize,
    /// Live marble cap
    pub live_limit: usize,
    /// Launch palette
    pub palette: &'a ColorPalette,
    /// Board RNG
    pub rng: &'a mut DeterministicRng,
    effects: Vec<TileEffect>,
}

impl<'a> TileContext<'a> {
    /// Create a context.
    pub fn new(
        rules: &'a Rules,
        live_marbles: usize,
        live_limit: usize,
        palette: &'a ColorPalette,
        rng: &'a mut DeterministicRng,
    ) -> Self {
        Self {
            rules,
            live_marbles,
            live_limit,
            palette,
            rng,
            effects: Vec::new(),
        }
    }

    /// Is there room for another marble?
    #[inline]
    pub fn has_room(&self) -> bool {
        self.live_marbles < self.live_limit
    }

    /// Queue a spawn and count it as live.
    pub fn spawn(&mut self, position: BoardPoint, direction: Direction, color: u8) {
        self.live_marbles += 1;
        self.effects.push(TileEffect::Spawn { position, direction, color });
    }

    /// Queue an effect.
    pub fn push(&mut self, effect: TileEffect) {
        self.effects.push(effect);
    }

    /// Effects pushed so far.
    pub fn effects(&self) -> &[TileEffect] {
        &self.effects
    }

    /// Take the effects.
    pub fn into_effects(self) -> Vec<TileEffect> {
        self.effects
    }
}

// =============================================================================
// TILE KINDS
// =============================================================================

/// Per-kind tile state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileKind {
    /// Track; turns marbles at corners
    Plain,
    /// Forces every marble one way
    Director {
        /// Forced heading
        direction: Direction,
    },
    /// Two-way switch toggled by the player
    Switch {
        /// Output marbles take
        current: Direction,
        /// Output taken after a toggle
        other: Direction,
    },
    /// Goal tile
    Wheel(Wheel),
    /// Moves marbles to its partner
    Teleporter {
        /// Paired teleporter
        partner: Option<Position>,
    },
    /// Clones marbles
    Replicator(Replicator),
    /// Recolors marbles
    Painter {
        /// Paint color
        color: u8,
    },
    /// Passes one color (and wild)
    Filter {
        /// Allowed color
        color: u8,
    },
    /// Destroys marbles
    Shredder,
    /// Holds one marble for later release
    Buffer {
        /// Held color
        held: Option<u8>,
        /// Release requested by the player
        release: Option<Direction>,
    },
    /// Pattern wheels must match
    Trigger(Trigger),
    /// Ordered color gate
    Stoplight(Stoplight),
}

impl TileKind {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            TileKind::Plain => "plain",
            TileKind::Director { .. } => "director",
            TileKind::Switch { .. } => "switch",
            TileKind::Wheel(_) => "wheel",
            TileKind::Teleporter { .. } => "teleporter",
            TileKind::Replicator(_) => "replicator",
            TileKind::Painter { .. } => "painter",
            TileKind::Filter { .. } => "filter",
            TileKind::Shredder => "shredder",
            TileKind::Buffer { .. } => "buffer",
            TileKind::Trigger(_) => "trigger",
            TileKind::Stoplight(_) => "stoplight",
        }
    }

    fn hash_tag(&self) -> u8 {
        match self {
            TileKind::Plain => 0,
            TileKind::Director { .. } => 1,
            TileKind::Switch { .. } => 2,
            TileKind::Wheel(_) => 3,
            TileKind::Teleporter { .. } => 4,
            TileKind::Replicator(_) => 5,
            TileKind::Painter { .. } => 6,
            TileKind::Filter { .. } => 7,
            TileKind::Shredder => 8,
            TileKind::Buffer { .. } => 9,
            TileKind::Trigger(_) => 10,
            TileKind::Stoplight(_) => 11,
        }
    }
}

// =============================================================================
// TILE
// =============================================================================

/// One grid cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Grid coordinate
    pub position: Position,
    /// Open edges
    pub paths: Paths,
    /// Kind and state
    pub kind: TileKind,
}

impl Tile {
    /// Create a tile.
    pub fn new(position: Position, paths: Paths, kind: TileKind) -> Self {
        Self { position, paths, kind }
    }

    /// Top-left corner in board space.
    pub fn origin(&self, rules: &Rules) -> BoardPoint {
        BoardPoint::new(
            self.position.col as i32 * rules.tile_size,
            self.position.row as i32 * rules.tile_size,
        )
    }

    /// Center in board space.
    pub fn center(&self, rules: &Rules) -> BoardPoint {
        tile_center(self.position, rules)
    }

    /// Wheel state, if this is a wheel.
    pub fn as_wheel(&self) -> Option<&Wheel> {
        match &self.kind {
            TileKind::Wheel(w) => Some(w),
            _ => None,
        }
    }

    /// Mutable wheel state, if this is a wheel.
    pub fn as_wheel_mut(&mut self) -> Option<&mut Wheel> {
        match &mut self.kind {
            TileKind::Wheel(w) => Some(w),
            _ => None,
        }
    }

    /// React to a marble whose center sits at `offset` from the origin.
    pub fn affect_marble(&mut self, ctx: &mut TileContext<'_>, marble: &mut Marble, offset: BoardPoint) {
        let half = ctx.rules.tile_size / 2;
        let at_center = offset.x == half && offset.y == half;
        let paths = self.paths;

        match &mut self.kind {
            TileKind::Plain => {
                if at_center {
                    corner_turn(paths, marble);
                }
            }

            TileKind::Director { direction } => {
                if at_center {
                    marble.direction = *direction;
                }
            }

            TileKind::Switch { current, other } => {
                if at_center {
                    marble.direction = if marble.direction == current.opposite() {
                        *other
                    } else {
                        *current
                    };
                }
            }

            TileKind::Wheel(wheel) => {
                affect_wheel(wheel, paths, ctx, marble, offset);
            }

            TileKind::Teleporter { partner } => {
                if at_center {
                    if let Some(partner) = partner {
                        marble.position = tile_center(*partner, ctx.rules);
                    }
                }
            }

            TileKind::Replicator(replicator) => {
                if at_center {
                    corner_turn(paths, marble);
                    replicator.enqueue(marble.color, marble.direction, ctx.rules.replicator_delay);
                }
            }

            TileKind::Painter { color } => {
                if at_center {
                    marble.color = *color;
                    corner_turn(paths, marble);
                }
            }

            TileKind::Filter { color } => {
                if at_center {
                    if color_matches(marble.color, *color) {
                        corner_turn(paths, marble);
                    } else {
                        ctx.push(TileEffect::Remove(RemovalReason::Filtered));
                    }
                }
            }

            TileKind::Shredder => {
                if at_center {
                    ctx.push(TileEffect::Remove(RemovalReason::Shredded));
                }
            }

            TileKind::Buffer { held, .. } => {
                if at_center {
                    match held {
                        None => {
                            *held = Some(marble.color);
                            ctx.push(TileEffect::Remove(RemovalReason::Buffered));
                        }
                        Some(stored) => {
                            std::mem::swap(stored, &mut marble.color);
                            corner_turn(paths, marble);
                        }
                    }
                }
            }

            TileKind::Trigger(_) => {}

            TileKind::Stoplight(light) => {
                if at_center {
                    match light.next_color() {
                        Some(next) if color_matches(marble.color, next) => {
                            light.advance();
                            ctx.push(TileEffect::Remove(RemovalReason::Stoplight));
                            ctx.push(TileEffect::Score(STOPLIGHT_BONUS));
                            ctx.push(TileEffect::StoplightAdvanced(light.remaining()));
                        }
                        _ => corner_turn(paths, marble),
                    }
                }
            }
        }
    }

    /// Per-tick self update.
    pub fn update(&mut self, ctx: &mut TileContext<'_>) {
        let center = self.center(ctx.rules);
        let paths = self.paths;

        match &mut self.kind {
            TileKind::Wheel(wheel) => wheel.update(),

            TileKind::Replicator(replicator) => {
                let actions = replicator.update(
                    ctx.live_marbles,
                    ctx.live_limit,
                    ctx.rules.replicator_delay,
                );
                for action in actions {
                    match action {
                        ReplicatorAction::Spawn { color, direction } => {
                            ctx.spawn(center, direction, color);
                        }
                        ReplicatorAction::Overflow(dropped) => {
                            ctx.push(TileEffect::ReplicatorOverflow(dropped));
                        }
                    }
                }
            }

            TileKind::Buffer { held, release } => {
                if let Some(dir) = release.take() {
                    if let Some(color) = *held {
                        if paths.has(dir) && ctx.has_room() {
                            *held = None;
                            ctx.spawn(center, dir, color);
                        }
                    }
                }
            }

            TileKind::Trigger(trigger) => {
                if let Some(pattern) = trigger.update(ctx.palette, ctx.rng) {
                    ctx.push(TileEffect::TriggerPattern(pattern));
                }
            }

            _ => {}
        }
    }

    /// Player tapped the tile.
    pub fn click(&mut self, ctx: &mut TileContext<'_>) {
        let paths = self.paths;
        match &mut self.kind {
            TileKind::Wheel(wheel) => {
                wheel.rotate(ctx.rules.wheel_spin_ticks);
            }
            TileKind::Switch { current, other } => {
                std::mem::swap(current, other);
            }
            TileKind::Buffer { held, release } => {
                if held.is_some() {
                    *release = paths.first_open();
                }
            }
            _ => {}
        }
    }

    /// Player flicked across the tile.
    pub fn flick(&mut self, ctx: &mut TileContext<'_>, dir: Direction) {
        let origin = self.origin(ctx.rules);
        let paths = self.paths;
        let top_row = self.position.row == 0;

        match &mut self.kind {
            TileKind::Wheel(wheel) => {
                // No ejecting straight up into the launch lane
                if wheel.is_spinning() || !paths.has(dir) || (top_row && dir == Direction::Up) {
                    return;
                }
                if let Slot::Filled(color) = wheel.slot(dir) {
                    *wheel.slot_mut(dir) = Slot::Empty;
                    let hole = ctx.rules.hole_center(dir);
                    let position = BoardPoint::new(origin.x + hole.x, origin.y + hole.y);
                    ctx.spawn(position, dir, color);
                }
            }
            TileKind::Switch { current, other } => {
                if dir == *other {
                    std::mem::swap(current, other);
                }
            }
            TileKind::Buffer { held, release } => {
                if held.is_some() && paths.has(dir) {
                    *release = Some(dir);
                }
            }
            _ => {}
        }
    }

    /// Hash into state.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u8(self.kind.hash_tag());
        hasher.update_u8(self.paths.0);
        match &self.kind {
            TileKind::Plain | TileKind::Shredder => {}
            TileKind::Director { direction } => hasher.update_u8(*direction as u8),
            TileKind::Switch { current, other } => {
                hasher.update_u8(*current as u8);
                hasher.update_u8(*other as u8);
            }
            TileKind::Wheel(wheel) => wheel.hash_into(hasher),
            TileKind::Teleporter { partner } => {
                let index = partner.map(|p| p.index() as u32).unwrap_or(u32::MAX);
                hasher.update_u32(index);
            }
            TileKind::Replicator(replicator) => replicator.hash_into(hasher),
            TileKind::Painter { color } | TileKind::Filter { color } => hasher.update_u8(*color),
            TileKind::Buffer { held, release } => {
                hasher.update_u8(held.unwrap_or(u8::MAX));
                hasher.update_u8(release.map(|d| d as u8).unwrap_or(u8::MAX));
            }
            TileKind::Trigger(trigger) => trigger.hash_into(hasher),
            TileKind::Stoplight(light) => light.hash_into(hasher),
        }
    }
}

/// Center of the tile at `position`.
pub fn tile_center(position: Position, rules: &Rules) -> BoardPoint {
    let half = rules.tile_size / 2;
    BoardPoint::new(
        position.col as i32 * rules.tile_size + half,
        position.row as i32 * rules.tile_size + half,
    )
}

/// Keep going if the way ahead is open, otherwise take the only other
/// open path, otherwise turn back.
pub fn corner_turn(paths: Paths, marble: &mut Marble) {
    let heading = marble.direction;
    if paths.has(heading) {
        return;
    }
    let back = heading.opposite();
    marble.direction = paths.without(back).single().unwrap_or(back);
}

/// Rim point where a marble heading `dir` enters a wheel, and the hole
/// it is bound for.
fn rim_entry(dir: Direction, tile_size: i32) -> (BoardPoint, Direction) {
    let half = tile_size / 2;
    let point = match dir {
        Direction::Down => BoardPoint::new(half, 0),
        Direction::Left => BoardPoint::new(tile_size, half),
        Direction::Up => BoardPoint::new(half, tile_size),
        Direction::Right => BoardPoint::new(0, half),
    };
    (point, dir.opposite())
}

fn affect_wheel(
    wheel: &mut Wheel,
    paths: Paths,
    ctx: &mut TileContext<'_>,
    marble: &mut Marble,
    offset: BoardPoint,
) {
    let (rim, hole) = rim_entry(marble.direction, ctx.rules.tile_size);
    if offset == rim {
        let open = !wheel.is_spinning()
            && paths.has(hole)
            && matches!(wheel.slot(hole), Slot::Empty | Slot::Reserved);
        if open {
            *wheel.slot_mut(hole) = Slot::Entering;
        } else {
            marble.direction = marble.direction.opposite();
        }
        return;
    }

    if offset == ctx.rules.hole_center(hole) && wheel.slot(hole) == Slot::Entering {
        *wheel.slot_mut(hole) = Slot::Filled(marble.color);
        ctx.push(TileEffect::Remove(RemovalReason::Captured));
        ctx.push(TileEffect::SlotFilled { slot: hole, color: marble.color });
    }
}
