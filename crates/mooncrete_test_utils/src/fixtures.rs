//! Test fixtures and helpers.
//!
//! Pre-built configurations, recording collaborators and games parked in a
//! given phase, for consistent testing.

use mooncrete_core::arcade::{ArcadeSim, StructureKind};
use mooncrete_core::blocks::BlockType;
use mooncrete_core::config::{GameConfig, MoonscapeConfig};
use mooncrete_core::game::MoonGame;
use mooncrete_core::math::Cell;
use mooncrete_core::puzzle::MoonbaseBuilder;
use mooncrete_core::state::GameState;

/// Default configuration without the auto-help screen.
#[must_use]
pub fn quiet_config() -> GameConfig {
    GameConfig {
        auto_help: false,
        ..GameConfig::default()
    }
}

/// [`quiet_config`] with a given seed.
#[must_use]
pub fn quiet_config_with_seed(seed: u64) -> GameConfig {
    quiet_config().with_seed(seed)
}

/// A [`MoonbaseBuilder`] that records every request and builds nothing.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordingBuilder {
    /// Requests in arrival order.
    pub requests: Vec<(BlockType, Cell)>,
    /// What to answer each request with.
    pub accept: bool,
}

impl RecordingBuilder {
    /// A builder that reports every request as built.
    #[must_use]
    pub fn accepting() -> Self {
        Self {
            requests: Vec::new(),
            accept: true,
        }
    }

    /// Number of requests for a derived type.
    #[must_use]
    pub fn count(&self, derived: BlockType) -> usize {
        self.requests.iter().filter(|(block, _)| *block == derived).count()
    }
}

impl MoonbaseBuilder for RecordingBuilder {
    fn build_moonbase(&mut self, derived: BlockType, origin: Cell) -> bool {
        tracing::trace!(?derived, ?origin, "Recorded build request");
        self.requests.push((derived, origin));
        self.accept
    }
}

/// Arcade simulator on default tuning with a flat, floor-only terrain band.
#[must_use]
pub fn flat_arcade(seed: u64) -> ArcadeSim {
    let config = GameConfig::default();
    let flat = MoonscapeConfig {
        ruggedness: 0.0,
        ..config.moonscape
    };
    let mut sim = ArcadeSim::new(config.arcade, flat, seed);
    sim.generate_terrain();
    sim.drain_events().for_each(drop);
    sim
}

/// Stack a slab and a structure on top of it at column `x`, just above the
/// floor. Returns the slab cell.
pub fn build_on_slab(sim: &mut ArcadeSim, x: i32, kind: StructureKind) -> Cell {
    let floor = sim.config().rows as i32 - 1;
    let slab = Cell::new(x, floor - 1);
    sim.place_structure(StructureKind::Mooncrete, slab);
    sim.place_structure(kind, slab.above());
    slab
}

/// A started game with no help screen.
#[must_use]
pub fn started_game(seed: u64) -> MoonGame {
    let mut game = match MoonGame::new(quiet_config_with_seed(seed)) {
        Ok(game) => game,
        Err(err) => panic!("default config rejected: {err}"),
    };
    game.begin();
    game
}

/// A started game advanced to `target` with phase requests.
///
/// # Panics
///
/// Panics if `target` is not reachable from phase 1 by requests.
#[must_use]
pub fn game_in(seed: u64, target: GameState) -> MoonGame {
    let mut game = started_game(seed);
    for _ in 0..5 {
        if game.current_state() == Some(target) {
            return game;
        }
        game.request_next_phase();
    }
    panic!("could not reach {target:?}, stuck in {:?}", game.current_state());
}
