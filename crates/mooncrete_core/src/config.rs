//! Game tuning tables.
//!
//! All gameplay constants live in one immutable [`GameConfig`] that is
//! loaded once at startup and handed by value to each subsystem. Every
//! struct is `#[serde(default)]`, so a RON file only needs to name the
//! values it overrides.
//!
//! # Example RON
//!
//! ```ron
//! GameConfig(
//!     seed: 42,
//!     puzzle: PuzzleConfig(width: 15, height: 15),
//!     arcade: ArcadeConfig(turret_max_charge: 30),
//! )
//! ```

use serde::{Deserialize, Serialize};

use crate::arcade::StructureKind;
use crate::blocks::BlockType;
use crate::error::{GameError, Result};
use crate::math::Fixed;
use crate::state::GameState;

/// Top-level configuration for a game session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for every random choice in the session.
    pub seed: u64,
    /// Show the help screen when a new game starts.
    pub auto_help: bool,
    /// Puzzle grid tuning.
    pub puzzle: PuzzleConfig,
    /// Terrain generation tuning.
    pub moonscape: MoonscapeConfig,
    /// Arcade tuning.
    pub arcade: ArcadeConfig,
    /// Tick cadence and phase durations.
    pub pacing: PacingConfig,
    /// Wave bonus weights.
    pub scoring: ScoringConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            auto_help: true,
            puzzle: PuzzleConfig::default(),
            moonscape: MoonscapeConfig::default(),
            arcade: ArcadeConfig::default(),
            pacing: PacingConfig::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl GameConfig {
    /// Parse a configuration from RON text and validate it.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let config: GameConfig = ron::from_str(ron)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check the invariants the simulation relies on.
    pub fn validate(&self) -> Result<()> {
        self.puzzle.validate()?;
        self.moonscape.validate(&self.arcade)?;
        self.arcade.validate()?;
        self.pacing.validate()?;
        Ok(())
    }
}

/// A rule that turns two adjacent puzzle blocks into a derived type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairingRule {
    /// What the pair becomes.
    pub derived: BlockType,
    /// One required component.
    pub first: BlockType,
    /// The other required component.
    pub second: BlockType,
}

impl PairingRule {
    /// Create a new pairing rule.
    #[must_use]
    pub const fn new(derived: BlockType, first: BlockType, second: BlockType) -> Self {
        Self {
            derived,
            first,
            second,
        }
    }

    /// The component that completes a pair with `block`, if `block` takes part.
    #[must_use]
    pub fn partner(&self, block: BlockType) -> Option<BlockType> {
        if block == self.first {
            Some(self.second)
        } else if block == self.second {
            Some(self.first)
        } else {
            None
        }
    }
}

/// How many flotsam blocks drop at a phase change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlotsamDrop {
    /// Blocks dropped at level 1.
    pub base: u32,
    /// One extra block for each threshold the level exceeds.
    pub extra_after_levels: Vec<u32>,
}

impl Default for FlotsamDrop {
    fn default() -> Self {
        Self {
            base: 2,
            extra_after_levels: vec![5, 10],
        }
    }
}

impl FlotsamDrop {
    /// Number of blocks to drop at a given level.
    #[must_use]
    pub fn amount(&self, level: u32) -> u32 {
        let extra = self
            .extra_after_levels
            .iter()
            .filter(|&&threshold| level > threshold)
            .count() as u32;
        self.base + extra
    }
}

/// Puzzle grid tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PuzzleConfig {
    /// Board width in cells.
    pub width: u32,
    /// Board height in cells.
    pub height: u32,
    /// Whether falling pieces may contain the phase's flotsam type.
    pub flotsam_in_pieces: bool,
    /// Flotsam dropped on phase changes.
    pub flotsam_drop: FlotsamDrop,
    /// Pairing rules, derived type to its two components.
    pub pairing_rules: Vec<PairingRule>,
}

impl Default for PuzzleConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            flotsam_in_pieces: true,
            flotsam_drop: FlotsamDrop::default(),
            pairing_rules: vec![
                PairingRule::new(
                    BlockType::MooncreteSlab,
                    BlockType::CalciumBarrel,
                    BlockType::WaterBarrel,
                ),
                PairingRule::new(BlockType::Radar, BlockType::RadarBits, BlockType::RadarDish),
                PairingRule::new(
                    BlockType::Turret,
                    BlockType::TurretBase,
                    BlockType::TurretAmmo,
                ),
                PairingRule::new(BlockType::Building, BlockType::RadarDish, BlockType::TurretBase),
            ],
        }
    }
}

impl PuzzleConfig {
    fn validate(&self) -> Result<()> {
        if self.width < 4 || self.height < 4 {
            return Err(GameError::invalid(
                "puzzle.width/height",
                "board must be at least 4x4 to fit every shape",
            ));
        }
        for (i, rule) in self.pairing_rules.iter().enumerate() {
            if rule.first == rule.second {
                return Err(GameError::invalid(
                    format!("puzzle.pairing_rules[{i}]"),
                    "components must differ",
                ));
            }
            if rule.derived.structure_kind().is_none() {
                return Err(GameError::invalid(
                    format!("puzzle.pairing_rules[{i}].derived"),
                    format!("{:?} is not a buildable type", rule.derived),
                ));
            }
            if rule.first.is_flotsam() || rule.second.is_flotsam() {
                return Err(GameError::invalid(
                    format!("puzzle.pairing_rules[{i}]"),
                    "flotsam cannot pair",
                ));
            }
        }
        Ok(())
    }

    /// Board width as a signed coordinate bound.
    #[must_use]
    pub const fn width_i32(&self) -> i32 {
        self.width as i32
    }

    /// Board height as a signed coordinate bound.
    #[must_use]
    pub const fn height_i32(&self) -> i32 {
        self.height as i32
    }
}

/// Terrain generation tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoonscapeConfig {
    /// Height of the terrain band at the bottom of the arcade, in cells.
    pub rows: u32,
    /// How many rows above the floor may hold rugged terrain.
    pub rugged_rows: u32,
    /// Chance that a supported cell becomes rugged terrain.
    pub ruggedness: f64,
}

impl Default for MoonscapeConfig {
    fn default() -> Self {
        Self {
            rows: 4,
            rugged_rows: 3,
            ruggedness: 0.35,
        }
    }
}

impl MoonscapeConfig {
    fn validate(&self, arcade: &ArcadeConfig) -> Result<()> {
        if self.rows == 0 || self.rows >= arcade.rows {
            return Err(GameError::invalid(
                "moonscape.rows",
                "terrain band must be non-empty and leave sky above it",
            ));
        }
        if self.rugged_rows >= self.rows {
            return Err(GameError::invalid(
                "moonscape.rugged_rows",
                "rugged rows must sit above the floor row",
            ));
        }
        if !(0.0..=1.0).contains(&self.ruggedness) {
            return Err(GameError::invalid(
                "moonscape.ruggedness",
                "must be a probability in [0, 1]",
            ));
        }
        Ok(())
    }
}

/// Which structures may stand on top of which.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequirement {
    /// The structure being placed.
    pub kind: StructureKind,
    /// Kinds that may sit directly beneath it.
    pub supports: Vec<StructureKind>,
}

impl BuildRequirement {
    /// Create a new build requirement.
    #[must_use]
    pub fn new(kind: StructureKind, supports: &[StructureKind]) -> Self {
        Self {
            kind,
            supports: supports.to_vec(),
        }
    }
}

/// Relative pull of a structure kind on targeted asteroids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetWeight {
    /// Structure kind.
    pub kind: StructureKind,
    /// Selection weight.
    pub weight: u32,
}

/// Arcade tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcadeConfig {
    /// Playfield width in cells.
    pub columns: u32,
    /// Playfield height in cells.
    pub rows: u32,
    /// Cell size in world units.
    pub cell_size: i32,
    /// Ticks for a turret to recharge from empty.
    pub turret_max_charge: u32,
    /// Trajectory steps a missile covers per tick.
    pub missile_speed: u32,
    /// Explosion radius growth per tick, in hundredths of a world unit.
    pub explosion_growth_hundredths: u32,
    /// Radius at which an explosion fizzles, in world units.
    pub explosion_max_radius: u32,
    /// Asteroids allowed at level 0.
    pub min_asteroids: u32,
    /// Extra asteroids per level, in hundredths (floored).
    pub asteroid_growth_hundredths: u32,
    /// First level at which asteroids aim at structures.
    pub targeting_level: u32,
    /// Chance a spawn aims at a structure once targeting starts.
    pub targeting_chance: f64,
    /// Weights for picking a targeted structure.
    pub target_weights: Vec<TargetWeight>,
    /// Fire requests this close to the bottom edge are refused, in world units.
    pub defense_margin: i32,
    /// Support rules for building.
    ///
    /// By default mooncrete sits only on lunar land, so each column holds
    /// one slab. List `Mooncrete` among its own supports to allow stacking.
    pub build_requirements: Vec<BuildRequirement>,
}

impl Default for ArcadeConfig {
    fn default() -> Self {
        Self {
            columns: 20,
            rows: 20,
            cell_size: 5,
            turret_max_charge: 40,
            missile_speed: 5,
            explosion_growth_hundredths: 20,
            explosion_max_radius: 6,
            min_asteroids: 2,
            asteroid_growth_hundredths: 50,
            targeting_level: 3,
            targeting_chance: 0.5,
            target_weights: vec![
                TargetWeight {
                    kind: StructureKind::Turret,
                    weight: 3,
                },
                TargetWeight {
                    kind: StructureKind::Radar,
                    weight: 2,
                },
                TargetWeight {
                    kind: StructureKind::Mooncrete,
                    weight: 1,
                },
            ],
            defense_margin: 10,
            build_requirements: vec![
                BuildRequirement::new(StructureKind::Mooncrete, &[StructureKind::LunarLand]),
                BuildRequirement::new(StructureKind::Turret, &[StructureKind::Mooncrete]),
                BuildRequirement::new(StructureKind::Radar, &[StructureKind::Mooncrete]),
                BuildRequirement::new(StructureKind::Building, &[StructureKind::Mooncrete]),
            ],
        }
    }
}

impl ArcadeConfig {
    fn validate(&self) -> Result<()> {
        if self.columns == 0 || self.rows == 0 || self.cell_size <= 0 {
            return Err(GameError::invalid(
                "arcade.columns/rows/cell_size",
                "playfield dimensions must be positive",
            ));
        }
        if self.turret_max_charge == 0 {
            return Err(GameError::invalid(
                "arcade.turret_max_charge",
                "must be at least 1",
            ));
        }
        if self.missile_speed == 0 {
            return Err(GameError::invalid("arcade.missile_speed", "must be at least 1"));
        }
        if self.explosion_growth_hundredths == 0 {
            return Err(GameError::invalid(
                "arcade.explosion_growth_hundredths",
                "explosions must grow or they never expire",
            ));
        }
        if !(0.0..=1.0).contains(&self.targeting_chance) {
            return Err(GameError::invalid(
                "arcade.targeting_chance",
                "must be a probability in [0, 1]",
            ));
        }
        Ok(())
    }

    /// Playfield width in world units.
    #[must_use]
    pub const fn width_units(&self) -> i32 {
        self.columns as i32 * self.cell_size
    }

    /// Playfield height in world units.
    #[must_use]
    pub const fn height_units(&self) -> i32 {
        self.rows as i32 * self.cell_size
    }

    /// Explosion growth per tick.
    #[must_use]
    pub fn explosion_growth(&self) -> Fixed {
        Fixed::from_num(self.explosion_growth_hundredths) / Fixed::from_num(100)
    }

    /// Explosion radius cap.
    #[must_use]
    pub fn explosion_max_radius(&self) -> Fixed {
        Fixed::from_num(self.explosion_max_radius)
    }

    /// Asteroid cap at a level: `min + floor(level * growth)`.
    #[must_use]
    pub fn asteroid_cap(&self, level: u32) -> usize {
        let extra = level.saturating_mul(self.asteroid_growth_hundredths) / 100;
        self.min_asteroids.saturating_add(extra) as usize
    }

    /// Kinds allowed directly beneath `kind`.
    #[must_use]
    pub fn supports_for(&self, kind: StructureKind) -> &[StructureKind] {
        self.build_requirements
            .iter()
            .find(|req| req.kind == kind)
            .map(|req| req.supports.as_slice())
            .unwrap_or(&[])
    }
}

/// Tick cadence and phase durations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Minimum milliseconds between puzzle steps at level 0.
    pub puzzle_interval_ms: u64,
    /// Milliseconds shaved off per level.
    pub puzzle_level_step_ms: u64,
    /// Fastest the puzzle will ever step.
    pub puzzle_min_interval_ms: u64,
    /// Minimum milliseconds between arcade steps at level 0.
    pub arcade_interval_ms: u64,
    /// Milliseconds shaved off per level.
    pub arcade_level_step_ms: u64,
    /// Fastest the arcade will ever step.
    pub arcade_min_interval_ms: u64,
    /// Play time for phase 1, in seconds.
    pub phase1_seconds: u32,
    /// Play time for phase 2, in seconds.
    pub phase2_seconds: u32,
    /// Play time for phase 3, in seconds.
    pub phase3_seconds: u32,
    /// Length of the reprieve, in seconds.
    pub reprieve_seconds: u32,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            puzzle_interval_ms: 1000,
            puzzle_level_step_ms: 50,
            puzzle_min_interval_ms: 250,
            arcade_interval_ms: 50,
            arcade_level_step_ms: 2,
            arcade_min_interval_ms: 20,
            phase1_seconds: 30,
            phase2_seconds: 30,
            phase3_seconds: 90,
            reprieve_seconds: 5,
        }
    }
}

impl PacingConfig {
    fn validate(&self) -> Result<()> {
        if self.puzzle_min_interval_ms > self.puzzle_interval_ms {
            return Err(GameError::invalid(
                "pacing.puzzle_min_interval_ms",
                "floor exceeds the base interval",
            ));
        }
        if self.arcade_min_interval_ms > self.arcade_interval_ms {
            return Err(GameError::invalid(
                "pacing.arcade_min_interval_ms",
                "floor exceeds the base interval",
            ));
        }
        Ok(())
    }

    /// Puzzle step interval at a level.
    #[must_use]
    pub fn puzzle_interval(&self, level: u32) -> u64 {
        scaled_interval(
            self.puzzle_interval_ms,
            self.puzzle_level_step_ms,
            self.puzzle_min_interval_ms,
            level,
        )
    }

    /// Arcade step interval at a level.
    #[must_use]
    pub fn arcade_interval(&self, level: u32) -> u64 {
        scaled_interval(
            self.arcade_interval_ms,
            self.arcade_level_step_ms,
            self.arcade_min_interval_ms,
            level,
        )
    }

    /// Play time for a state, if the state is timed.
    #[must_use]
    pub const fn duration(&self, state: GameState) -> Option<u32> {
        match state {
            GameState::Phase1 => Some(self.phase1_seconds),
            GameState::Phase2 => Some(self.phase2_seconds),
            GameState::Phase3 => Some(self.phase3_seconds),
            GameState::Reprieve => Some(self.reprieve_seconds),
            _ => None,
        }
    }
}

fn scaled_interval(base: u64, step: u64, floor: u64, level: u32) -> u64 {
    base.saturating_sub(step.saturating_mul(u64::from(level)))
        .max(floor)
}

/// Wave bonus weights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Points per asteroid destroyed.
    pub asteroid_points: i64,
    /// Points per moon base structure built.
    pub built_points: i64,
    /// Points lost per moon base structure destroyed.
    pub destroyed_penalty: i64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            asteroid_points: 10,
            built_points: 5,
            destroyed_penalty: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = GameConfig::from_ron_str(
            "GameConfig(seed: 7, puzzle: PuzzleConfig(width: 15, height: 15))",
        )
        .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.puzzle.width, 15);
        assert_eq!(config.puzzle.pairing_rules.len(), 4);
        assert_eq!(config.arcade, ArcadeConfig::default());
    }

    #[test]
    fn test_ron_parse_error() {
        let err = GameConfig::from_ron_str("GameConfig(seed: )").unwrap_err();
        assert!(matches!(err, GameError::ConfigParse(_)));
    }

    #[test]
    fn test_rejects_self_pairing() {
        let mut config = GameConfig::default();
        config.puzzle.pairing_rules.push(PairingRule::new(
            BlockType::Building,
            BlockType::WaterBarrel,
            BlockType::WaterBarrel,
        ));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("components must differ"));
    }

    #[test]
    fn test_rejects_bad_ruggedness() {
        let mut config = GameConfig::default();
        config.moonscape.ruggedness = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partner_lookup() {
        let rule = PairingRule::new(
            BlockType::MooncreteSlab,
            BlockType::CalciumBarrel,
            BlockType::WaterBarrel,
        );
        assert_eq!(
            rule.partner(BlockType::CalciumBarrel),
            Some(BlockType::WaterBarrel)
        );
        assert_eq!(
            rule.partner(BlockType::WaterBarrel),
            Some(BlockType::CalciumBarrel)
        );
        assert_eq!(rule.partner(BlockType::RadarDish), None);
    }

    #[test]
    fn test_flotsam_amount_by_level() {
        let drop = FlotsamDrop::default();
        assert_eq!(drop.amount(1), 2);
        assert_eq!(drop.amount(5), 2);
        assert_eq!(drop.amount(6), 3);
        assert_eq!(drop.amount(11), 4);
    }

    #[test]
    fn test_intervals_scale_with_level() {
        let pacing = PacingConfig::default();
        assert_eq!(pacing.puzzle_interval(0), 1000);
        assert_eq!(pacing.puzzle_interval(4), 800);
        assert_eq!(pacing.puzzle_interval(100), 250);
        assert_eq!(pacing.arcade_interval(100), 20);
        assert_eq!(pacing.duration(GameState::Phase3), Some(90));
        assert_eq!(pacing.duration(GameState::Menu), None);
    }

    #[test]
    fn test_asteroid_cap() {
        let arcade = ArcadeConfig::default();
        assert_eq!(arcade.asteroid_cap(0), 2);
        assert_eq!(arcade.asteroid_cap(1), 2);
        assert_eq!(arcade.asteroid_cap(3), 3);
        assert_eq!(arcade.asteroid_cap(10), 7);
    }

    #[test]
    fn test_supports_lookup() {
        let arcade = ArcadeConfig::default();
        assert_eq!(
            arcade.supports_for(StructureKind::Turret),
            &[StructureKind::Mooncrete]
        );
        assert!(arcade.supports_for(StructureKind::LunarLand).is_empty());
    }

    #[test]
    fn test_mooncrete_stacking_is_opt_in() {
        let arcade = ArcadeConfig::default();
        assert_eq!(
            arcade.supports_for(StructureKind::Mooncrete),
            &[StructureKind::LunarLand]
        );

        let stacked = ArcadeConfig {
            build_requirements: vec![BuildRequirement::new(
                StructureKind::Mooncrete,
                &[StructureKind::LunarLand, StructureKind::Mooncrete],
            )],
            ..ArcadeConfig::default()
        };
        assert!(stacked
            .supports_for(StructureKind::Mooncrete)
            .contains(&StructureKind::Mooncrete));
    }
}
