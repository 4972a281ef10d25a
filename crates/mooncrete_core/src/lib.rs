//! # Mooncrete Core
//!
//! Game simulation core for Mooncrete, a falling-block puzzle that feeds a
//! lunar base defence arcade game.
//!
//! This crate contains **only** simulation logic:
//! - No rendering
//! - No IO
//! - No wall clock (callers post ticks with a monotonic millisecond value)
//! - No unseeded randomness (every random choice flows from the config seed)
//!
//! This separation enables:
//! - Headless runs for CI and tuning
//! - Replays from a seed plus an input log
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`state`] - Stack-based phase tracker
//! - [`puzzle`] - Puzzle grid, shapes and the pairing engine
//! - [`moonscape`] - Procedural terrain generation
//! - [`arcade`] - Asteroids, missiles, explosions and the moon base
//! - [`events`] - Typed notifications and the fan-out bus
//! - [`game`] - Game-flow controller tying everything to the tick clock
//! - [`config`] - Immutable tuning tables

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod arcade;
pub mod blocks;
pub mod config;
pub mod deferred;
pub mod error;
pub mod events;
pub mod game;
pub mod math;
pub mod moonscape;
pub mod pacing;
pub mod puzzle;
pub mod score;
pub mod state;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::arcade::{
        ArcadeSim, Asteroid, AsteroidId, Charge, Explosion, ExplosionId, Missile, MissileId,
        StepReport, Structure, StructureId, StructureKind, WaveMode,
    };
    pub use crate::blocks::BlockType;
    pub use crate::config::{
        ArcadeConfig, BuildRequirement, GameConfig, MoonscapeConfig, PacingConfig, PairingRule,
        PuzzleConfig, ScoringConfig,
    };
    pub use crate::error::{GameError, Result};
    pub use crate::events::{EventBus, EventListener, EventLog, GameEvent, ListenerId};
    pub use crate::game::{GameSnapshot, MoonGame};
    pub use crate::math::{Cell, Fixed, Point};
    pub use crate::moonscape::Moonscape;
    pub use crate::puzzle::{
        MoonbaseBuilder, PuzzleEngine, PuzzleGrid, Rotation, Shape, SpawnOutcome, StepOutcome,
    };
    pub use crate::score::{Scoreboard, WaveTally};
    pub use crate::state::{GameState, StateStack};
}
