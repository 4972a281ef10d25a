//! Event-driven metrics for headless sessions.
//!
//! [`RunMetrics`] listens on the game's event bus and counts what happened,
//! so an autopilot run can be summarised without poking at internals.

use std::collections::BTreeMap;

use mooncrete_core::events::{EventListener, GameEvent};
use mooncrete_core::score::WaveTally;
use mooncrete_core::state::GameState;
use serde::Serialize;

/// One scored wave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaveRecord {
    /// Counters the bonus came from.
    pub tally: WaveTally,
    /// Bonus awarded.
    pub bonus: i64,
    /// Score afterwards.
    pub score: i64,
}

/// Counters gathered from published events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunMetrics {
    /// Pieces that entered the board.
    pub pieces_spawned: u32,
    /// Component pairs consumed.
    pub pairs: u32,
    /// Full rows cleared.
    pub rows_cleared: u32,
    /// Structures built, by kind name.
    pub built: BTreeMap<String, u32>,
    /// Structures lost, by kind name.
    pub lost: BTreeMap<String, u32>,
    /// Asteroids launched.
    pub asteroids_spawned: u32,
    /// Asteroids the defences caught.
    pub asteroids_caught: u32,
    /// Missiles fired.
    pub missiles_fired: u32,
    /// Times each state was entered.
    pub states_entered: BTreeMap<String, u32>,
    /// Scored waves in order.
    pub waves: Vec<WaveRecord>,
    /// Whether a piece ever failed to spawn.
    pub board_filled: bool,
    /// Whether the game quit.
    pub quit: bool,
}

impl RunMetrics {
    /// Create empty metrics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times a state was entered.
    #[must_use]
    pub fn entered(&self, state: GameState) -> u32 {
        self.states_entered
            .get(&format!("{state:?}"))
            .copied()
            .unwrap_or(0)
    }

    /// Whether the game reached the lose state.
    #[must_use]
    pub fn lost_game(&self) -> bool {
        self.entered(GameState::Lose) > 0
    }

    fn bump(map: &mut BTreeMap<String, u32>, key: &str) {
        *map.entry(key.to_string()).or_insert(0) += 1;
    }
}

impl EventListener for RunMetrics {
    fn notify(&mut self, event: &GameEvent) {
        match event {
            GameEvent::PieceSpawned { .. } => self.pieces_spawned += 1,
            GameEvent::BlocksPaired { .. } => self.pairs += 1,
            GameEvent::RowCleared { .. } => self.rows_cleared += 1,
            GameEvent::BoardFull => self.board_filled = true,
            GameEvent::Quit => self.quit = true,
            GameEvent::StateChanged { state } => {
                Self::bump(&mut self.states_entered, &format!("{state:?}"));
            }
            GameEvent::MooncreteSpawned { .. } => Self::bump(&mut self.built, "mooncrete"),
            GameEvent::TurretSpawned { .. } => Self::bump(&mut self.built, "turret"),
            GameEvent::RadarSpawned { .. } => Self::bump(&mut self.built, "radar"),
            GameEvent::BuildingSpawned { .. } => Self::bump(&mut self.built, "building"),
            GameEvent::MooncreteDestroyed { .. } => Self::bump(&mut self.lost, "mooncrete"),
            GameEvent::TurretDestroyed { .. } => Self::bump(&mut self.lost, "turret"),
            GameEvent::RadarDestroyed { .. } => Self::bump(&mut self.lost, "radar"),
            GameEvent::BuildingDestroyed { .. } => Self::bump(&mut self.lost, "building"),
            GameEvent::AsteroidSpawned { .. } => self.asteroids_spawned += 1,
            GameEvent::AsteroidDestroyed { by_player, .. } => {
                if *by_player {
                    self.asteroids_caught += 1;
                }
            }
            GameEvent::MissileSpawned { .. } => self.missiles_fired += 1,
            GameEvent::WaveScored {
                tally,
                bonus,
                score,
            } => self.waves.push(WaveRecord {
                tally: *tally,
                bonus: *bonus,
                score: *score,
            }),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mooncrete_core::math::Cell;
    use mooncrete_core::blocks::BlockType;

    #[test]
    fn test_counts_events() {
        let mut metrics = RunMetrics::new();
        metrics.notify(&GameEvent::StateChanged {
            state: GameState::Phase1,
        });
        metrics.notify(&GameEvent::BlocksPaired {
            derived: BlockType::MooncreteSlab,
            first: Cell::new(0, 9),
            second: Cell::new(1, 9),
        });
        metrics.notify(&GameEvent::RowCleared { row: 9 });
        metrics.notify(&GameEvent::StateChanged {
            state: GameState::Lose,
        });

        assert_eq!(metrics.pairs, 1);
        assert_eq!(metrics.rows_cleared, 1);
        assert_eq!(metrics.entered(GameState::Phase1), 1);
        assert!(metrics.lost_game());
        assert!(!metrics.quit);
    }

    #[test]
    fn test_wave_records_keep_order() {
        let mut metrics = RunMetrics::new();
        for bonus in [10, -3] {
            metrics.notify(&GameEvent::WaveScored {
                tally: WaveTally::default(),
                bonus,
                score: bonus,
            });
        }
        let bonuses: Vec<i64> = metrics.waves.iter().map(|w| w.bonus).collect();
        assert_eq!(bonuses, vec![10, -3]);
    }
}
