//! Autopilot sessions and determinism checks.

use std::cell::RefCell;
use std::rc::Rc;

use mooncrete_core::config::GameConfig;
use mooncrete_core::error::Result;
use mooncrete_core::game::MoonGame;
use mooncrete_core::state::GameState;
use serde::Serialize;

use crate::autopilot::Autopilot;
use crate::metrics::RunMetrics;
use crate::runner::DEFAULT_TICK_MS;

/// Parameters for an autopilot session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Game tuning, including the simulation seed.
    pub game: GameConfig,
    /// Maximum ticks to run.
    pub ticks: u64,
    /// Virtual milliseconds per tick.
    pub tick_ms: u64,
    /// Seed for the autopilot's own choices.
    pub pilot_seed: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            game: GameConfig::default(),
            ticks: 20_000,
            tick_ms: DEFAULT_TICK_MS,
            pilot_seed: 1,
        }
    }
}

/// Outcome of an autopilot session.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Simulation seed.
    pub seed: u64,
    /// Ticks actually run.
    pub ticks_run: u64,
    /// State when the session stopped.
    pub final_state: Option<GameState>,
    /// Level reached.
    pub level: u32,
    /// Final score.
    pub score: i64,
    /// Determinism hash of the final state.
    pub state_hash: u64,
    /// Counters gathered from events.
    pub metrics: RunMetrics,
}

/// A finished session: its summary and the game as it was left.
#[derive(Debug)]
pub struct Session {
    /// Summary of the run.
    pub summary: RunSummary,
    /// The game, for rendering.
    pub game: MoonGame,
}

/// Play a seeded game with the autopilot until it is lost or the tick
/// budget runs out.
pub fn simulate(config: &SessionConfig) -> Result<Session> {
    let mut game = MoonGame::new(config.game.clone())?;
    let metrics = Rc::new(RefCell::new(RunMetrics::new()));
    game.subscribe(Rc::clone(&metrics));
    game.begin();

    let mut pilot = Autopilot::new(config.pilot_seed);
    let tick_ms = config.tick_ms.max(1);
    let mut ticks_run = 0;

    for tick in 1..=config.ticks {
        game.tick(tick * tick_ms);
        pilot.act(&mut game);
        ticks_run = tick;
        if !game.is_running() || game.current_state() == Some(GameState::Lose) {
            break;
        }
    }

    let summary = RunSummary {
        seed: config.game.seed,
        ticks_run,
        final_state: game.current_state(),
        level: game.scoreboard().level,
        score: game.scoreboard().score,
        state_hash: game.state_hash(),
        metrics: metrics.borrow().clone(),
    };
    tracing::info!(
        seed = summary.seed,
        ticks = summary.ticks_run,
        level = summary.level,
        score = summary.score,
        "Session finished"
    );
    Ok(Session { summary, game })
}

/// Result of running one session several times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    /// Simulation seed.
    pub seed: u64,
    /// Ticks per run.
    pub ticks: u64,
    /// Final hash of each run.
    pub hashes: Vec<u64>,
    /// Whether every run hashed the same.
    pub deterministic: bool,
}

/// Run the same session `runs` times and compare the final hashes.
pub fn verify(config: &SessionConfig, runs: u32) -> Result<VerifyReport> {
    let mut hashes = Vec::with_capacity(runs as usize);
    for run in 0..runs {
        let session = simulate(config)?;
        tracing::debug!(run, hash = session.summary.state_hash, "Verify run");
        hashes.push(session.summary.state_hash);
    }
    let deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    if !deterministic {
        tracing::warn!(?hashes, "Runs diverged");
    }
    Ok(VerifyReport {
        seed: config.game.seed,
        ticks: config.ticks,
        hashes,
        deterministic,
    })
}
