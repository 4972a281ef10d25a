//! Score keeping.

use serde::{Deserialize, Serialize};

use crate::config::ScoringConfig;

/// Per-wave counters, reset each time a bonus is paid out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WaveTally {
    /// Asteroids the player's defences destroyed.
    pub asteroids_destroyed: u32,
    /// Moon base structures built from puzzle pairings.
    pub moonbases_built: u32,
    /// Turrets, radars and buildings lost.
    pub moonbases_destroyed: u32,
}

impl WaveTally {
    /// Bonus this tally is worth.
    #[must_use]
    pub fn bonus(&self, scoring: &ScoringConfig) -> i64 {
        i64::from(self.asteroids_destroyed)
            .saturating_mul(scoring.asteroid_points)
            .saturating_add(i64::from(self.moonbases_built).saturating_mul(scoring.built_points))
            .saturating_sub(
                i64::from(self.moonbases_destroyed).saturating_mul(scoring.destroyed_penalty),
            )
    }
}

/// Player progress across a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scoreboard {
    /// Accumulated score.
    pub score: i64,
    /// Current level, starting at 1.
    pub level: u32,
}

impl Default for Scoreboard {
    fn default() -> Self {
        Self { score: 0, level: 1 }
    }
}

impl Scoreboard {
    /// Add a wave's bonus to the score. Returns the bonus awarded.
    pub fn apply_wave_bonus(&mut self, tally: &WaveTally, scoring: &ScoringConfig) -> i64 {
        let bonus = tally.bonus(scoring);
        self.score = self.score.saturating_add(bonus);
        bonus
    }

    /// Move on to the next level.
    pub fn level_up(&mut self) {
        self.level = self.level.saturating_add(1);
    }
}
