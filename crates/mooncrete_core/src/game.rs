//! Game-flow controller.
//!
//! [`MoonGame`] wraps the state stack, both simulators, the pacing gates,
//! the deferred-action queue and the event bus. The outside world drives it
//! with [`MoonGame::tick`] and the input methods, and reads it back through
//! queries and published events.
//!
//! # Level flow
//!
//! ```text
//! Menu -> Phase1 -> Phase2 -> Phase3 -> Reprieve -> LevelDone -> Phase1 (level + 1)
//!                                  \-> Reprieve (loss pending) -> Lose
//! Phase1/Phase2 --(board full)--> Lose
//! ```
//!
//! Phase changes swap the top of the stack so escape always leads back to
//! the menu, never to an earlier phase.
//!
//! # Example
//!
//! ```
//! use mooncrete_core::prelude::*;
//!
//! let config = GameConfig {
//!     auto_help: false,
//!     ..GameConfig::default()
//! };
//! let mut game = MoonGame::new(config).unwrap();
//! game.begin();
//! assert_eq!(game.current_state(), Some(GameState::Phase1));
//!
//! for now in (0..5_000).step_by(50) {
//!     game.tick(now);
//! }
//! assert!(game.active_piece().is_some());
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::Serialize;

use crate::arcade::{ArcadeSim, Asteroid, Explosion, Missile, MissileId, StructureId, WaveMode};
use crate::config::GameConfig;
use crate::deferred::DeferredQueue;
use crate::error::Result;
use crate::events::{
    EventBus, EventListener, EventQueue, GameEvent, ListenerId, PieceCell, StructureInfo,
};
use crate::math::Point;
use crate::pacing::{ClockTick, PhaseClock, TickGate};
use crate::puzzle::{ActivePiece, PuzzleEngine, PuzzleGrid, Rotation, StepOutcome};
use crate::score::{Scoreboard, WaveTally};
use crate::state::{GameState, StateStack};

/// Actions held back until a later tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredAction {
    /// Push a state on top of the current one.
    PushState(GameState),
}

/// Serializable view of the whole game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSnapshot {
    /// Current state.
    pub state: Option<GameState>,
    /// States on the stack, bottom first.
    pub stack: Vec<GameState>,
    /// Whether the game still accepts ticks.
    pub running: bool,
    /// Whether ticks are paused.
    pub paused: bool,
    /// Current level.
    pub level: u32,
    /// Current score.
    pub score: i64,
    /// Counters for the current wave.
    pub tally: WaveTally,
    /// Seconds left in a timed phase.
    pub time_left: Option<u32>,
    /// Occupied board cells.
    pub board: Vec<PieceCell>,
    /// Cells of the falling piece.
    pub piece: Vec<PieceCell>,
    /// Terrain and moon base structures.
    pub structures: Vec<StructureInfo>,
    /// Turrets ready to fire.
    pub ready_turrets: usize,
    /// Asteroids in flight.
    pub asteroids: Vec<Asteroid>,
    /// Missiles in flight.
    pub missiles: Vec<Missile>,
    /// Live explosions.
    pub explosions: Vec<Explosion>,
}

/// The game-flow controller.
#[derive(Debug)]
pub struct MoonGame {
    config: GameConfig,
    stack: StateStack,
    puzzle: PuzzleEngine,
    arcade: ArcadeSim,
    scoreboard: Scoreboard,
    puzzle_gate: TickGate,
    arcade_gate: TickGate,
    clock: PhaseClock,
    deferred: DeferredQueue<DeferredAction>,
    bus: EventBus,
    outbox: EventQueue,
    now: u64,
    running: bool,
    paused: bool,
    in_progress: bool,
    player_state: Option<GameState>,
    loss_pending: bool,
}

impl MoonGame {
    /// Validate the configuration and open on the menu.
    pub fn new(config: GameConfig) -> Result<Self> {
        config.validate()?;
        let puzzle = PuzzleEngine::new(config.puzzle.clone(), config.seed);
        let arcade = ArcadeSim::new(
            config.arcade.clone(),
            config.moonscape.clone(),
            config.seed.wrapping_add(1),
        );
        let mut game = Self {
            config,
            stack: StateStack::new(),
            puzzle,
            arcade,
            scoreboard: Scoreboard::default(),
            puzzle_gate: TickGate::new(),
            arcade_gate: TickGate::new(),
            clock: PhaseClock::new(),
            deferred: DeferredQueue::new(),
            bus: EventBus::new(),
            outbox: EventQueue::new(),
            now: 0,
            running: true,
            paused: false,
            in_progress: false,
            player_state: None,
            loss_pending: false,
        };
        game.push_state(GameState::Menu);
        tracing::info!(seed = game.config.seed, "Game created");
        Ok(game)
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Register a listener for every published event.
    pub fn subscribe<L: EventListener + 'static>(&mut self, listener: L) -> ListenerId {
        self.bus.subscribe(listener)
    }

    /// Remove a listener.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Move subsystem events into the controller outbox, keeping order.
    fn collect_events(&mut self) {
        for event in self.puzzle.drain_events() {
            self.outbox.push(event);
        }
        for event in self.arcade.drain_events() {
            self.outbox.push(event);
        }
    }

    fn emit(&mut self, event: GameEvent) {
        self.collect_events();
        self.outbox.push(event);
    }

    /// Publish everything queued so far.
    pub fn flush_events(&mut self) {
        self.collect_events();
        let events: Vec<GameEvent> = self.outbox.drain().collect();
        self.bus.publish_all(events);
    }

    // ------------------------------------------------------------------
    // State changes
    // ------------------------------------------------------------------

    fn push_state(&mut self, state: GameState) {
        self.stack.push(state);
        self.on_state_changed(state);
    }

    fn swap_state(&mut self, state: GameState) {
        self.stack.swap(state);
        self.on_state_changed(state);
    }

    fn pop_state(&mut self) {
        self.stack.pop();
        match self.stack.peek() {
            Some(state) => self.on_state_changed(state),
            None => {
                tracing::info!("State stack empty, quitting");
                self.running = false;
                self.deferred.clear();
                self.emit(GameEvent::Quit);
            }
        }
    }

    fn on_state_changed(&mut self, state: GameState) {
        tracing::debug!(?state, depth = self.stack.len(), "State changed");
        self.clock.reset(self.config.pacing.duration(state), self.now);
        self.puzzle.set_phase(state);
        if state.is_puzzle() {
            self.puzzle_gate.reset(self.now);
        }
        if !matches!(state, GameState::Menu | GameState::Help) && self.in_progress {
            self.player_state = Some(state);
        }
        self.emit(GameEvent::StateChanged { state });
    }

    fn start_new_game(&mut self) {
        tracing::info!("Starting new game");
        self.scoreboard = Scoreboard::default();
        self.in_progress = true;
        self.loss_pending = false;
        self.arcade.take_tally();
        self.arcade.set_level(self.scoreboard.level);
        self.puzzle.clear();
        self.emit(GameEvent::ResetGame);
        self.arcade.generate_terrain();
        self.push_state(GameState::Phase1);
        self.drop_flotsam();
        if self.config.auto_help {
            self.deferred.defer(DeferredAction::PushState(GameState::Help));
        }
    }

    fn end_game(&mut self) {
        tracing::info!(
            score = self.scoreboard.score,
            level = self.scoreboard.level,
            "Game over"
        );
        self.in_progress = false;
        self.player_state = None;
        self.loss_pending = false;
    }

    fn start_next_level(&mut self) {
        self.scoreboard.level_up();
        tracing::info!(level = self.scoreboard.level, "Level up");
        self.arcade.set_level(self.scoreboard.level);
        self.arcade.generate_terrain();
        self.swap_state(GameState::Phase1);
    }

    fn finish_wave(&mut self) {
        let tally = self.arcade.take_tally();
        let bonus = self
            .scoreboard
            .apply_wave_bonus(&tally, &self.config.scoring);
        tracing::info!(?tally, bonus, score = self.scoreboard.score, "Wave scored");
        self.emit(GameEvent::WaveScored {
            tally,
            bonus,
            score: self.scoreboard.score,
        });
        if self.loss_pending {
            self.swap_state(GameState::Lose);
        } else {
            self.swap_state(GameState::LevelDone);
        }
    }

    fn drop_flotsam(&mut self) {
        if !self.puzzle.drop_flotsam_for_level(self.scoreboard.level) {
            self.board_full();
        }
    }

    fn board_full(&mut self) {
        tracing::info!("Puzzle board full");
        self.swap_state(GameState::Lose);
    }

    /// Move the level on from the current phase.
    fn advance_phase(&mut self) {
        match self.stack.peek() {
            Some(GameState::Phase1) => {
                self.swap_state(GameState::Phase2);
                self.drop_flotsam();
            }
            Some(GameState::Phase2) => {
                self.swap_state(GameState::Phase3);
                self.drop_flotsam();
            }
            Some(GameState::Phase3) => self.swap_state(GameState::Reprieve),
            Some(GameState::Reprieve) => self.finish_wave(),
            Some(GameState::LevelDone) => self.start_next_level(),
            Some(GameState::Lose) => {
                self.end_game();
                self.pop_state();
            }
            other => tracing::trace!(state = ?other, "Nothing to advance"),
        }
    }

    fn apply_deferred(&mut self, action: DeferredAction) {
        tracing::debug!(?action, "Deferred action due");
        match action {
            DeferredAction::PushState(state) => self.push_state(state),
        }
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Advance the game to `now_ms` on a monotonic millisecond clock.
    ///
    /// Ignored after quitting. While paused nothing moves. While a deferred
    /// action is pending, one is applied per tick and the simulation holds.
    pub fn tick(&mut self, now_ms: u64) {
        if !self.running {
            return;
        }
        self.now = now_ms;
        if !self.paused {
            if let Some(action) = self.deferred.next_due() {
                self.apply_deferred(action);
            } else {
                self.advance_clock(now_ms);
                self.step_subsystems(now_ms);
            }
        }
        self.flush_events();
    }

    fn advance_clock(&mut self, now_ms: u64) {
        match self.clock.advance(now_ms) {
            ClockTick::Idle => {}
            ClockTick::Second(seconds) => self.emit(GameEvent::TimeLeft { seconds }),
            ClockTick::Expired => {
                self.emit(GameEvent::TimeLeft { seconds: 0 });
                self.advance_phase();
            }
        }
    }

    fn step_subsystems(&mut self, now_ms: u64) {
        let Some(state) = self.stack.peek() else {
            return;
        };
        let level = self.scoreboard.level;

        if state.is_puzzle()
            && self
                .puzzle_gate
                .try_open(now_ms, self.config.pacing.puzzle_interval(level))
            && self.puzzle.tick(&mut self.arcade) == StepOutcome::BoardFull
        {
            self.board_full();
            return;
        }

        if state.is_arcade()
            && self
                .arcade_gate
                .try_open(now_ms, self.config.pacing.arcade_interval(level))
        {
            let mode = if state == GameState::Phase3 {
                WaveMode::Attack
            } else {
                WaveMode::Calm
            };
            let report = self.arcade.step(mode);
            if state == GameState::Phase3 && report.base_lost {
                tracing::info!("No turrets left");
                self.loss_pending = true;
                self.swap_state(GameState::Reprieve);
            }
        }
    }

    /// Pause or resume ticking.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    // ------------------------------------------------------------------
    // Inputs
    // ------------------------------------------------------------------

    fn accepts_puzzle_input(&self) -> bool {
        self.running && !self.paused && self.stack.peek().is_some_and(GameState::is_puzzle)
    }

    fn puzzle_input<F>(&mut self, input: F) -> bool
    where
        F: FnOnce(&mut PuzzleEngine) -> bool,
    {
        if !self.accepts_puzzle_input() {
            return false;
        }
        let moved = input(&mut self.puzzle);
        self.flush_events();
        moved
    }

    /// Move the piece one column left.
    pub fn move_left(&mut self) -> bool {
        self.puzzle_input(PuzzleEngine::move_left)
    }

    /// Move the piece one column right.
    pub fn move_right(&mut self) -> bool {
        self.puzzle_input(PuzzleEngine::move_right)
    }

    /// Move the piece one row down.
    pub fn move_down(&mut self) -> bool {
        self.puzzle_input(PuzzleEngine::move_down)
    }

    /// Rotate the piece.
    pub fn rotate(&mut self, rotation: Rotation) -> bool {
        self.puzzle_input(|puzzle| puzzle.rotate(rotation))
    }

    /// Fire the nearest ready turret at a point. Only during the attack phase.
    pub fn fire_missile(&mut self, target: Point) -> Option<MissileId> {
        if !self.running || self.paused || self.stack.peek() != Some(GameState::Phase3) {
            return None;
        }
        let fired = self.arcade.fire_missile(target);
        self.flush_events();
        fired
    }

    /// Skip ahead to the next phase.
    pub fn request_next_phase(&mut self) {
        if !self.running {
            return;
        }
        self.advance_phase();
        self.flush_events();
    }

    /// Leave the current state. Leaving the last one quits.
    pub fn escape(&mut self) {
        if !self.running {
            return;
        }
        if self.stack.peek() == Some(GameState::Lose) {
            self.end_game();
        }
        self.pop_state();
        self.flush_events();
    }

    /// Start a new game, or toggle between the menu and a game in progress.
    pub fn begin(&mut self) {
        if !self.running {
            return;
        }
        if !self.in_progress {
            self.start_new_game();
        } else if let Some(saved) = self.player_state {
            if self.stack.peek() == Some(saved) {
                self.pop_state();
            } else {
                self.push_state(saved);
            }
        }
        self.flush_events();
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Current state.
    #[must_use]
    pub fn current_state(&self) -> Option<GameState> {
        self.stack.peek()
    }

    /// The state stack.
    #[must_use]
    pub fn state_stack(&self) -> &StateStack {
        &self.stack
    }

    /// Whether the game still accepts ticks.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Whether ticking is paused.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether deferred actions are holding the simulation.
    #[must_use]
    pub fn is_holding(&self) -> bool {
        self.deferred.is_holding()
    }

    /// Whether a game has been started and not yet lost.
    #[must_use]
    pub const fn is_in_progress(&self) -> bool {
        self.in_progress
    }

    /// Score and level.
    #[must_use]
    pub const fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    /// Counters for the current wave.
    #[must_use]
    pub fn tally(&self) -> &WaveTally {
        self.arcade.tally()
    }

    /// Seconds left in a timed phase.
    #[must_use]
    pub fn time_left(&self) -> Option<u32> {
        self.clock.is_timed().then(|| self.clock.time_left())
    }

    /// The puzzle board.
    #[must_use]
    pub fn board(&self) -> &PuzzleGrid {
        self.puzzle.grid()
    }

    /// Board contents as `(x, y, tag)` triples, `0` for empty.
    pub fn board_triples(&self) -> impl Iterator<Item = (i32, i32, u8)> + '_ {
        self.puzzle.grid().triples()
    }

    /// Terrain band as `(x, y, solid)` triples.
    pub fn terrain_triples(&self) -> impl Iterator<Item = (i32, i32, bool)> + '_ {
        self.arcade.moonscape().triples()
    }

    /// The falling piece.
    #[must_use]
    pub fn active_piece(&self) -> Option<&ActivePiece> {
        self.puzzle.active_piece()
    }

    /// The puzzle engine.
    #[must_use]
    pub fn puzzle(&self) -> &PuzzleEngine {
        &self.puzzle
    }

    /// The arcade simulator.
    #[must_use]
    pub fn arcade(&self) -> &ArcadeSim {
        &self.arcade
    }

    /// Mutable access to the arcade, for setting up scenarios.
    ///
    /// Events queued here are published with the next flush.
    pub fn arcade_mut(&mut self) -> &mut ArcadeSim {
        &mut self.arcade
    }

    /// The ready turret nearest to a point.
    #[must_use]
    pub fn closest_ready_turret(&self, target: Point) -> Option<StructureId> {
        self.arcade.closest_ready_turret(target)
    }

    /// Copy of the board with the falling piece merged in.
    #[must_use]
    pub fn board_with_piece(&self) -> PuzzleGrid {
        let mut board = self.puzzle.grid().clone();
        if let Some(piece) = self.puzzle.active_piece() {
            for PieceCell { cell, block } in piece.cells() {
                board.set(cell, block);
            }
        }
        board
    }

    /// Serializable view of everything.
    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            state: self.stack.peek(),
            stack: self.stack.iter().collect(),
            running: self.running,
            paused: self.paused,
            level: self.scoreboard.level,
            score: self.scoreboard.score,
            tally: *self.arcade.tally(),
            time_left: self.time_left(),
            board: self
                .puzzle
                .grid()
                .blocks()
                .map(|(cell, block)| PieceCell { cell, block })
                .collect(),
            piece: self
                .puzzle
                .active_piece()
                .map(|piece| piece.cells().collect())
                .unwrap_or_default(),
            structures: self
                .arcade
                .structures()
                .map(|(id, s)| StructureInfo {
                    id,
                    kind: s.kind,
                    cell: s.cell,
                    position: s.position,
                })
                .collect(),
            ready_turrets: self
                .arcade
                .structures()
                .filter(|(_, s)| s.is_ready_turret())
                .count(),
            asteroids: self.arcade.asteroids().map(|(_, a)| a.clone()).collect(),
            missiles: self.arcade.missiles().map(|(_, m)| m.clone()).collect(),
            explosions: self.arcade.explosions().map(|(_, e)| e.clone()).collect(),
        }
    }

    /// Hash of the simulation state, for determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.stack.hash(&mut hasher);
        self.scoreboard.hash(&mut hasher);
        self.arcade.tally().hash(&mut hasher);
        self.puzzle.grid().hash(&mut hasher);
        self.puzzle.active_piece().hash(&mut hasher);
        for (id, structure) in self.arcade.structures() {
            id.hash(&mut hasher);
            structure.hash(&mut hasher);
        }
        for (id, asteroid) in self.arcade.asteroids() {
            id.hash(&mut hasher);
            asteroid.hash(&mut hasher);
        }
        for (id, missile) in self.arcade.missiles() {
            id.hash(&mut hasher);
            missile.hash(&mut hasher);
        }
        for (id, explosion) in self.arcade.explosions() {
            id.hash(&mut hasher);
            explosion.hash(&mut hasher);
        }
        self.clock.hash(&mut hasher);
        self.paused.hash(&mut hasher);
        self.in_progress.hash(&mut hasher);
        self.loss_pending.hash(&mut hasher);
        self.deferred.len().hash(&mut hasher);
        hasher.finish()
    }
}
