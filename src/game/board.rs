//! Board
//!
//! The authoritative simulation. The board owns the tile grid, the live
//! marbles, the launch queue and both timers, and advances all of them
//! one tick at a time.
//!
//! # Determinism
//!
//! - Marbles live in a `BTreeMap` keyed by creation order
//! - Tiles update in row-major order
//! - All randomness comes from the board's seeded RNG
//! - Integer arithmetic only
//!
//! Given the same level, seed and inputs on the same ticks, two boards
//! produce identical hashes.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::core::geometry::{BoardPoint, Direction, Paths, Position, HORIZ_TILES, TILE_COUNT};
use crate::core::hash::{compute_state_hash, StateHash};
use crate::core::rng::DeterministicRng;
use crate::game::config::Rules;
use crate::game::events::{BoardEvent, BoardEventData};
use crate::game::input::{classify, Gesture, InputRouter, PointerId};
use crate::game::launch::{ColorPalette, Countdown, LaunchQueue};
use crate::game::marble::{Marble, MarbleId};
use crate::game::signal::STOPLIGHT_BONUS;
use crate::game::tile::{Tile, TileContext, TileEffect, TileKind};
use crate::game::wheel::Slot;
use crate::level::{build_level, LevelDescriptor, LevelLoadError};

/// Points per percent of empty holes at completion.
pub const EMPTY_HOLE_BONUS_FACTOR: u32 = 2;

/// Points per percent of board time left at completion.
pub const TIME_BONUS_FACTOR: u32 = 5;

/// Board outcome. Anything but `Incomplete` is terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardStatus {
    /// Still playing
    #[default]
    Incomplete,
    /// Every wheel completed
    Complete,
    /// No launch before the launch timer ran out
    LaunchTimeout,
    /// The board timer ran out
    BoardTimeout,
}

impl BoardStatus {
    /// Has the game ended?
    #[inline]
    pub fn is_terminal(self) -> bool {
        self != BoardStatus::Incomplete
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// What a renderer needs to know about one wheel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WheelView {
    /// Grid position
    pub position: Position,
    /// Holes indexed by direction
    pub slots: [Slot; 4],
    /// Rotating right now
    pub spinning: bool,
    /// Completion latched
    pub completed: bool,
}

/// Immutable copy of the visible board state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    /// Level title
    pub name: String,
    /// Ticks simulated
    pub tick: u32,
    /// Current status
    pub status: BoardStatus,
    /// Score so far
    pub score: u32,
    /// Paused flag
    pub paused: bool,
    /// Launch timer ticks left (0 before the first launch)
    pub launch_timeout: u32,
    /// Board timer ticks left
    pub board_timeout: u32,
    /// Board time left in percent
    pub time_remaining_percentage: u32,
    /// Upcoming colors, head first
    pub queue: Vec<u8>,
    /// Queue slide in hundredths of a pixel
    pub slide: i32,
    /// Live marbles in id order
    pub marbles: Vec<Marble>,
    /// Wheels in row-major order
    pub wheels: Vec<WheelView>,
    /// Pattern the wheels must match, if any
    pub trigger_pattern: Option<[u8; 4]>,
    /// Stoplight colors left, if the level has one
    pub stoplight_remaining: Option<usize>,
}

/// Final tally shown when a board ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelResult {
    /// How the board ended
    pub status: BoardStatus,
    /// Points scored during play
    pub score: u32,
    /// Empty holes in percent
    pub empty_hole_percentage: u32,
    /// Board time left in percent
    pub time_remaining_percentage: u32,
    /// Bonus for empty holes (completed boards only)
    pub empty_hole_bonus: u32,
    /// Bonus for time left (completed boards only)
    pub time_remaining_bonus: u32,
    /// Score plus bonuses
    pub total: u32,
}

// =============================================================================
// BOARD
// =============================================================================

/// The simulation state of one level.
#[derive(Clone, Debug)]
pub struct Board {
    rules: Rules,
    name: String,
    /// Row-major
    tiles: Vec<Tile>,
    marbles: BTreeMap<MarbleId, Marble>,
    next_marble_id: u32,
    queue: LaunchQueue,
    palette: ColorPalette,
    launch_timer: Countdown,
    board_timer: Countdown,
    live_limit: usize,
    status: BoardStatus,
    score: u32,
    paused: bool,
    tick: u32,
    seed: u64,
    rng: DeterministicRng,
    /// Most recently installed trigger
    trigger: Option<Position>,
    /// Most recently installed stoplight
    stoplight: Option<Position>,
    /// Gated wheel -> prerequisite wheels
    requirements: BTreeMap<Position, Vec<Position>>,
    input: InputRouter,
    pending_events: Vec<BoardEvent>,
}

impl Board {
    /// Create an empty board: no paths, no wheels, default palette.
    pub fn new(rules: Rules, seed: u64) -> Self {
        let mut rng = DeterministicRng::new(seed);
        let palette = ColorPalette::parse(&rules.default_colors);
        let queue = LaunchQueue::filled(rules.launch_queue_len(), &palette, &mut rng);
        let tiles = (0..TILE_COUNT)
            .map(|i| Tile::new(Position::from_index(i), Paths::NONE, TileKind::Plain))
            .collect();

        Self {
            name: String::new(),
            tiles,
            marbles: BTreeMap::new(),
            next_marble_id: 0,
            queue,
            palette,
            launch_timer: Countdown::idle(rules.launch_timeout_for(rules.default_launch_passes)),
            board_timer: Countdown::running(0),
            live_limit: rules.default_live_marbles,
            status: BoardStatus::Incomplete,
            score: 0,
            paused: false,
            tick: 0,
            seed,
            rng,
            trigger: None,
            stoplight: None,
            requirements: BTreeMap::new(),
            input: InputRouter::new(),
            pending_events: Vec::new(),
            rules,
        }
    }

    /// Create a board and load a level into it.
    pub fn from_level(rules: Rules, seed: u64, level: &LevelDescriptor) -> Result<Self, LevelLoadError> {
        let mut board = Self::new(rules, seed);
        board.load(level)?;
        Ok(board)
    }

    /// Load a level. On error the board is left as it was.
    pub fn load(&mut self, level: &LevelDescriptor) -> Result<(), LevelLoadError> {
        let built = build_level(level, &self.rules)?;

        self.name = built.name;
        self.marbles.clear();
        self.status = BoardStatus::Incomplete;
        self.score = 0;
        self.paused = false;
        self.tick = 0;
        self.trigger = None;
        self.stoplight = None;
        self.input.clear();
        self.pending_events.clear();

        self.palette = built.palette;
        self.live_limit = built.live_limit;
        self.launch_timer = Countdown::idle(built.launch_timeout_start);
        self.board_timer = Countdown::running(built.board_timeout_start);

        self.requirements.clear();
        for req in &built.requirements {
            self.requirements.entry(req.wheel).or_default().push(req.needs);
        }

        for tile in built.tiles {
            self.set_tile(tile.position, tile);
        }

        // Pattern first, then the queue: both draw from the RNG
        let pattern = match self.trigger.map(|p| p.index()) {
            Some(idx) => match &mut self.tiles[idx].kind {
                TileKind::Trigger(trigger) => Some(trigger.draw(&self.palette, &mut self.rng)),
                _ => None,
            },
            None => None,
        };
        if let Some(pattern) = pattern {
            self.push_event(BoardEventData::TriggerPattern { pattern });
        }
        self.queue = LaunchQueue::filled(self.rules.launch_queue_len(), &self.palette, &mut self.rng);

        for initial in built.initial_marbles {
            let speed = self.rules.marble_speed;
            self.activate_marble(Marble::new(
                MarbleId(0),
                initial.position,
                initial.direction,
                initial.color,
                speed,
            ));
        }

        info!(
            name = %self.name,
            wheels = built.wheel_count,
            board_ticks = built.board_timeout_start,
            launch_ticks = built.launch_timeout_start,
            "level loaded"
        );
        Ok(())
    }

    // =========================================================================
    // TICK
    // =========================================================================

    /// Advance the simulation one tick.
    ///
    /// A paused or finished board does nothing and reports `Incomplete`.
    pub fn tick(&mut self) -> BoardStatus {
        if self.paused || self.status.is_terminal() {
            return BoardStatus::Incomplete;
        }

        // 0. Advance tick counter
        self.tick += 1;

        // 1. Move marbles in id order
        let ids: Vec<MarbleId> = self.marbles.keys().copied().collect();
        for id in ids {
            self.advance_marble(id);
        }

        // 2. Tile self-updates
        for idx in 0..self.tiles.len() {
            self.update_tile(idx);
        }

        // 3. Wheel completion
        self.resolve_completions();

        // 4-6. Status and timers
        if self.all_wheels_completed() {
            self.set_status(BoardStatus::Complete);
        } else if self.launch_timer.tick() {
            self.set_status(BoardStatus::LaunchTimeout);
        } else if self.board_timer.tick() {
            self.set_status(BoardStatus::BoardTimeout);
        }

        // 7. Queue slide
        let lane_open = self.top_right_open();
        self.queue.advance_slide(&self.rules, lane_open);

        self.status
    }

    fn advance_marble(&mut self, id: MarbleId) {
        let Some(mut marble) = self.marbles.get(&id).cloned() else {
            return;
        };

        for _ in 0..marble.speed {
            marble.step();
            if !self.interact(&mut marble) {
                self.deactivate_marble(id);
                return;
            }
        }

        self.marbles.insert(id, marble);
    }

    /// Resolve the tile interaction after one unit step. Returns false
    /// if the marble was removed.
    fn interact(&mut self, marble: &mut Marble) -> bool {
        let half = self.rules.half_marble();

        #[cfg(feature = "debug-tracing")]
        tracing::trace!(id = marble.id.0, x = marble.position.x, y = marble.position.y, "step");

        // Nothing goes back up into the lane
        if marble.position.y == half && marble.direction == Direction::Up {
            marble.direction = Direction::Down;
        }

        if marble.position.y < 0 {
            self.lane_step(marble);
            return true;
        }

        let dir = marble.direction;
        let lead = BoardPoint::new(
            marble.position.x + dir.dx() * half,
            marble.position.y + dir.dy() * half,
        );
        let Some(pos) = self.tile_at(lead) else {
            return true;
        };

        let idx = pos.index();
        let origin = self.tiles[idx].origin(&self.rules);
        let offset = BoardPoint::new(marble.position.x - origin.x, marble.position.y - origin.y);

        let effects = {
            let live = self.marbles.len();
            let Board { rules, tiles, palette, rng, live_limit, .. } = self;
            let mut ctx = TileContext::new(rules, live, *live_limit, palette, rng);
            tiles[idx].affect_marble(&mut ctx, marble, offset);
            ctx.into_effects()
        };

        self.apply_effects(pos, effects, Some(&*marble))
    }

    /// Launch lane: turn at the ends, drop into open columns.
    fn lane_step(&mut self, marble: &mut Marble) {
        let x = marble.position.x;
        let half = self.rules.half_marble();
        let tile_size = self.rules.tile_size;

        match marble.direction {
            Direction::Left if x == half => {
                marble.direction = Direction::Right;
                return;
            }
            Direction::Right if x == self.rules.board_width() - half => {
                marble.direction = Direction::Left;
                return;
            }
            Direction::Down => return,
            _ => {}
        }

        if x < 0 || x % tile_size != tile_size / 2 {
            return;
        }
        let col = (x / tile_size) as usize;
        if col >= HORIZ_TILES {
            return;
        }

        let live = self.marbles.len();
        let tile = &mut self.tiles[Position::new(0, col).index()];
        if !tile.paths.has(Direction::Up) {
            return;
        }
        let drops = match tile.as_wheel_mut() {
            Some(wheel) => {
                if wheel.accepts_drop() {
                    *wheel.slot_mut(Direction::Up) = Slot::Reserved;
                    true
                } else {
                    false
                }
            }
            None => live < self.live_limit,
        };

        if drops {
            debug!(tick = self.tick, marble = marble.id.0, col, "marble dropped from lane");
            marble.direction = Direction::Down;
            self.launch_marble();
        }
    }

    fn update_tile(&mut self, idx: usize) {
        let effects = {
            let live = self.marbles.len();
            let Board { rules, tiles, palette, rng, live_limit, .. } = self;
            let mut ctx = TileContext::new(rules, live, *live_limit, palette, rng);
            tiles[idx].update(&mut ctx);
            ctx.into_effects()
        };
        if !effects.is_empty() {
            self.apply_effects(Position::from_index(idx), effects, None);
        }
    }

    /// Apply tile effects. Returns false if `marble` was removed.
    fn apply_effects(&mut self, tile: Position, effects: Vec<TileEffect>, marble: Option<&Marble>) -> bool {
        let mut alive = true;

        for effect in effects {
            match effect {
                TileEffect::Remove(reason) => {
                    if let Some(m) = marble {
                        alive = false;
                        debug!(
                            tick = self.tick,
                            marble = m.id.0,
                            ?reason,
                            ?tile,
                            kind = self.tiles[tile.index()].kind.name(),
                            "marble removed"
                        );
                        self.pending_events.push(BoardEvent::marble_removed(
                            self.tick, m.id, m.color, tile, reason,
                        ));
                    }
                }
                TileEffect::Spawn { position, direction, color } => {
                    let speed = self.rules.marble_speed;
                    let id = self.activate_marble(Marble::new(MarbleId(0), position, direction, color, speed));
                    self.push_event(BoardEventData::MarbleSpawned { marble: id, color, tile });
                }
                TileEffect::Score(points) => self.add_score(points),
                TileEffect::SlotFilled { slot, color } => {
                    self.push_event(BoardEventData::SlotFilled { wheel: tile, slot, color });
                }
                TileEffect::TriggerPattern(pattern) => {
                    self.push_event(BoardEventData::TriggerPattern { pattern });
                }
                TileEffect::StoplightAdvanced(remaining) => {
                    self.push_event(BoardEventData::StoplightAdvanced { remaining });
                }
                TileEffect::ReplicatorOverflow(dropped) => {
                    debug!(tick = self.tick, ?tile, dropped, "replicator overflow");
                    self.push_event(BoardEventData::ReplicatorOverflow { tile, dropped });
                }
            }
        }

        alive
    }

    // =========================================================================
    // COMPLETION
    // =========================================================================

    /// Complete every wheel that can, repeating until nothing changes.
    ///
    /// One scan per wheel plus one is enough for any acyclic chain of
    /// requirements; wheels on a cycle never complete.
    fn resolve_completions(&mut self) {
        let wheels: Vec<Position> = self
            .tiles
            .iter()
            .filter(|t| t.as_wheel().is_some())
            .map(|t| t.position)
            .collect();

        for _ in 0..=wheels.len() {
            let mut progressed = false;

            for &pos in &wheels {
                if !self.requirements_met(pos) {
                    continue;
                }
                let pattern = self.trigger_pattern();
                let next_light = self.stoplight_next();

                let ready = self.tiles[pos.index()]
                    .as_wheel()
                    .map_or(false, |w| w.ready_to_complete(pattern.as_ref(), next_light));
                if !ready {
                    continue;
                }

                if let Some(wheel) = self.tiles[pos.index()].as_wheel_mut() {
                    wheel.complete();
                }
                progressed = true;
                debug!(tick = self.tick, wheel = ?pos, "wheel completed");
                self.push_event(BoardEventData::WheelCompleted { wheel: pos });
                self.add_score(self.rules.wheel_bonus);

                if next_light.is_some() {
                    self.advance_stoplight();
                }
                if pattern.is_some() {
                    self.complete_trigger();
                }
            }

            if !progressed {
                break;
            }
        }
    }

    fn requirements_met(&self, wheel: Position) -> bool {
        self.requirements.get(&wheel).map_or(true, |needs| {
            needs.iter().all(|p| {
                self.tiles
                    .get(p.index())
                    .and_then(Tile::as_wheel)
                    .map_or(false, |w| w.completed)
            })
        })
    }

    fn trigger_pattern(&self) -> Option<[u8; 4]> {
        let pos = self.trigger?;
        match &self.tiles[pos.index()].kind {
            TileKind::Trigger(trigger) => trigger.pattern,
            _ => None,
        }
    }

    fn stoplight_next(&self) -> Option<u8> {
        let pos = self.stoplight?;
        match &self.tiles[pos.index()].kind {
            TileKind::Stoplight(light) => light.next_color(),
            _ => None,
        }
    }

    fn advance_stoplight(&mut self) {
        let Some(pos) = self.stoplight else { return };
        let remaining = match &mut self.tiles[pos.index()].kind {
            TileKind::Stoplight(light) => {
                light.advance();
                light.remaining()
            }
            _ => return,
        };
        self.add_score(STOPLIGHT_BONUS);
        self.push_event(BoardEventData::StoplightAdvanced { remaining });
    }

    fn complete_trigger(&mut self) {
        let Some(pos) = self.trigger else { return };
        let reset = self.rules.trigger_reset_ticks;
        match &mut self.tiles[pos.index()].kind {
            TileKind::Trigger(trigger) => trigger.complete(reset),
            _ => return,
        }
        self.add_score(self.rules.trigger_bonus);
    }

    fn all_wheels_completed(&self) -> bool {
        self.tiles
            .iter()
            .filter_map(Tile::as_wheel)
            .all(|w| w.completed)
    }

    /// Would the top-right tile take the lane marble right now?
    fn top_right_open(&self) -> bool {
        let tile = &self.tiles[Position::new(0, HORIZ_TILES - 1).index()];
        if !tile.paths.has(Direction::Up) {
            return false;
        }
        match tile.as_wheel() {
            Some(wheel) => wheel.slot(Direction::Up).color().is_none() && !wheel.is_spinning(),
            None => true,
        }
    }

    fn set_status(&mut self, status: BoardStatus) {
        if self.status == status {
            return;
        }
        self.status = status;
        info!(tick = self.tick, ?status, score = self.score, "board status changed");
        self.pending_events.push(BoardEvent::status_changed(self.tick, status));
    }

    fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
        self.pending_events.push(BoardEvent::scored(self.tick, points, self.score));
    }

    fn push_event(&mut self, data: BoardEventData) {
        self.pending_events.push(BoardEvent::new(self.tick, data));
    }

    // =========================================================================
    // MARBLES & TILES
    // =========================================================================

    /// Launch the queue head into the lane. Ignored once the board ended.
    pub fn launch_marble(&mut self) -> Option<MarbleId> {
        if self.status.is_terminal() {
            return None;
        }

        let color = self.queue.advance(&self.palette, &mut self.rng);
        let entry = self.rules.launch_entry();
        let speed = self.rules.marble_speed;
        let id = self.activate_marble(Marble::new(MarbleId(0), entry, Direction::Left, color, speed));

        self.launch_timer.restart();
        self.queue.start_slide(&self.rules);
        debug!(tick = self.tick, marble = id.0, color, "marble launched");
        self.push_event(BoardEventData::MarbleLaunched { marble: id, color });
        Some(id)
    }

    /// Install a tile at `pos`.
    pub fn set_tile(&mut self, pos: Position, mut tile: Tile) {
        if !pos.is_valid() {
            return;
        }
        tile.position = pos;
        match tile.kind {
            TileKind::Trigger(_) => self.trigger = Some(pos),
            TileKind::Stoplight(_) => self.stoplight = Some(pos),
            _ => {}
        }
        self.tiles[pos.index()] = tile;
    }

    /// Launch timeout in board passes. Applies from the next launch.
    pub fn set_launch_timer(&mut self, passes: u32) {
        self.launch_timer.start = self.rules.launch_timeout_for(passes);
    }

    /// Restart the board timer at `seconds`.
    pub fn set_board_timer(&mut self, seconds: u32) {
        self.board_timer = Countdown::running(self.rules.ticks_for_seconds(seconds));
    }

    /// Add a marble to the live set under a fresh id.
    pub fn activate_marble(&mut self, mut marble: Marble) -> MarbleId {
        let id = MarbleId(self.next_marble_id);
        self.next_marble_id += 1;
        marble.id = id;
        self.marbles.insert(id, marble);
        id
    }

    /// Remove a marble from the live set.
    pub fn deactivate_marble(&mut self, id: MarbleId) -> Option<Marble> {
        self.marbles.remove(&id)
    }

    // =========================================================================
    // INPUT
    // =========================================================================

    /// Pointer went down.
    pub fn on_press(&mut self, pointer: PointerId, at: BoardPoint) {
        if self.status.is_terminal() {
            return;
        }
        self.input.press(pointer, at);
    }

    /// Pointer went up. Returns the tile and gesture that were applied.
    pub fn on_release(&mut self, pointer: PointerId, at: BoardPoint) -> Option<(Position, Gesture)> {
        let press = self.input.release(pointer)?;
        if self.status.is_terminal() {
            return None;
        }

        if self.paused {
            let size = self.rules.marble_size as i64;
            if press.distance_squared(at) <= size * size {
                self.set_paused(false);
            }
            return None;
        }

        let pos = self.tile_at(press)?;
        let idx = pos.index();
        let origin = self.tiles[idx].origin(&self.rules);
        let offset = BoardPoint::new(press.x - origin.x, press.y - origin.y);
        let gesture = classify(&self.rules, offset, at.x - press.x, at.y - press.y);

        let effects = {
            let live = self.marbles.len();
            let Board { rules, tiles, palette, rng, live_limit, .. } = self;
            let mut ctx = TileContext::new(rules, live, *live_limit, palette, rng);
            match gesture {
                Gesture::Click => tiles[idx].click(&mut ctx),
                Gesture::Flick(dir) => tiles[idx].flick(&mut ctx, dir),
            }
            ctx.into_effects()
        };
        self.apply_effects(pos, effects, None);

        debug!(tick = self.tick, tile = ?pos, kind = self.tiles[idx].kind.name(), ?gesture, "gesture");
        Some((pos, gesture))
    }

    /// Tile under a board-space point.
    pub fn tile_at(&self, at: BoardPoint) -> Option<Position> {
        if at.x < 0 || at.y < 0 || at.x >= self.rules.board_width() || at.y >= self.rules.board_height() {
            return None;
        }
        Some(Position::new(
            (at.y / self.rules.tile_size) as usize,
            (at.x / self.rules.tile_size) as usize,
        ))
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Score so far.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Is the board paused?
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pause or resume.
    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            debug!(tick = self.tick, paused, "pause toggled");
        }
        self.paused = paused;
    }

    /// Percentage of wheel holes that are empty, rounded down. A board
    /// without wheels reports 0.
    pub fn empty_hole_percentage(&self) -> u32 {
        let (empty, total) = self
            .tiles
            .iter()
            .filter_map(Tile::as_wheel)
            .fold((0u32, 0u32), |(empty, total), wheel| {
                let e = wheel.slots.iter().filter(|s| **s == Slot::Empty).count() as u32;
                (empty + e, total + 4)
            });
        if total == 0 {
            0
        } else {
            empty * 100 / total
        }
    }

    /// Board time left in percent, rounded down.
    pub fn time_remaining_percentage(&self) -> u32 {
        self.board_timer.percent_remaining()
    }

    /// Final tally. Bonuses only count on a completed board.
    pub fn result(&self) -> LevelResult {
        let empty_hole_percentage = self.empty_hole_percentage();
        let time_remaining_percentage = self.time_remaining_percentage();
        let (empty_hole_bonus, time_remaining_bonus) = if self.status == BoardStatus::Complete {
            (
                empty_hole_percentage * EMPTY_HOLE_BONUS_FACTOR,
                time_remaining_percentage * TIME_BONUS_FACTOR,
            )
        } else {
            (0, 0)
        };

        LevelResult {
            status: self.status,
            score: self.score,
            empty_hole_percentage,
            time_remaining_percentage,
            empty_hole_bonus,
            time_remaining_bonus,
            total: self.score + empty_hole_bonus + time_remaining_bonus,
        }
    }

    /// Current status.
    pub fn status(&self) -> BoardStatus {
        self.status
    }

    /// Ticks simulated since load.
    pub fn current_tick(&self) -> u32 {
        self.tick
    }

    /// RNG seed the board was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Level title.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gameplay rules.
    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Live marble cap.
    pub fn live_limit(&self) -> usize {
        self.live_limit
    }

    /// Tile at a grid position.
    pub fn tile(&self, pos: Position) -> Option<&Tile> {
        if pos.is_valid() {
            self.tiles.get(pos.index())
        } else {
            None
        }
    }

    /// All tiles, row-major.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// A live marble.
    pub fn marble(&self, id: MarbleId) -> Option<&Marble> {
        self.marbles.get(&id)
    }

    /// Live marbles in id order.
    pub fn marbles(&self) -> impl Iterator<Item = &Marble> {
        self.marbles.values()
    }

    /// Number of live marbles.
    pub fn marble_count(&self) -> usize {
        self.marbles.len()
    }

    /// Launch queue.
    pub fn queue(&self) -> &LaunchQueue {
        &self.queue
    }

    /// Launch timer.
    pub fn launch_timer(&self) -> Countdown {
        self.launch_timer
    }

    /// Board timer.
    pub fn board_timer(&self) -> Countdown {
        self.board_timer
    }

    /// Number of wheels on the board.
    pub fn wheel_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.as_wheel().is_some()).count()
    }

    /// Copy the visible state.
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            name: self.name.clone(),
            tick: self.tick,
            status: self.status,
            score: self.score,
            paused: self.paused,
            launch_timeout: self.launch_timer.remaining,
            board_timeout: self.board_timer.remaining,
            time_remaining_percentage: self.time_remaining_percentage(),
            queue: self.queue.iter().collect(),
            slide: self.queue.slide(),
            marbles: self.marbles.values().cloned().collect(),
            wheels: self
                .tiles
                .iter()
                .filter_map(|t| {
                    t.as_wheel().map(|w| WheelView {
                        position: t.position,
                        slots: w.slots,
                        spinning: w.is_spinning(),
                        completed: w.completed,
                    })
                })
                .collect(),
            trigger_pattern: self.trigger_pattern(),
            stoplight_remaining: self.stoplight.and_then(|p| match &self.tiles[p.index()].kind {
                TileKind::Stoplight(light) => Some(light.remaining()),
                _ => None,
            }),
        }
    }

    /// Hash of the full simulation state.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, self.seed, |hasher| {
            hasher.update_u8(self.status as u8);
            hasher.update_u32(self.score);
            hasher.update_bool(self.paused);
            hasher.update_u32(self.launch_timer.remaining);
            hasher.update_u32(self.board_timer.remaining);
            hasher.update_u32(self.live_limit as u32);
            self.queue.hash_into(hasher);

            for tile in &self.tiles {
                tile.hash_into(hasher);
            }

            hasher.update_u32(self.marbles.len() as u32);
            for marble in self.marbles.values() {
                marble.hash_into(hasher);
            }

            let [s0, s1] = self.rng.state();
            hasher.update_u64(s0);
            hasher.update_u64(s1);
        })
    }

    /// Drain events generated since the last call.
    pub fn take_events(&mut self) -> Vec<BoardEvent> {
        std::mem::take(&mut self.pending_events)
    }
}

// =============================================================================
// TESTS
// =============================================================================
