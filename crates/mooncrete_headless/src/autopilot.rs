//! A simple scripted player for headless sessions.
//!
//! The autopilot jiggles puzzle pieces at random, fires at the lowest
//! asteroid whenever a turret is ready, and clicks through screens that
//! wait for input. It is seeded, so a session with the same seed plays the
//! same way.

use mooncrete_core::game::MoonGame;
use mooncrete_core::puzzle::Rotation;
use mooncrete_core::state::GameState;
use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;

/// What the autopilot did on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Nothing.
    Idle,
    /// Moved or rotated the piece.
    Steer,
    /// Fired a missile.
    Fire,
    /// Left a screen or skipped ahead.
    Advance,
}

/// Seeded scripted player.
#[derive(Debug, Clone)]
pub struct Autopilot {
    rng: Pcg32,
    steer_chance: f64,
}

impl Autopilot {
    /// Create an autopilot that steers on roughly one tick in four.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_steer_chance(seed, 0.25)
    }

    /// Create an autopilot with a given steering probability.
    #[must_use]
    pub fn with_steer_chance(seed: u64, steer_chance: f64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            steer_chance: steer_chance.clamp(0.0, 1.0),
        }
    }

    /// Take one action on the game.
    pub fn act(&mut self, game: &mut MoonGame) -> Action {
        match game.current_state() {
            Some(GameState::Help) => {
                game.escape();
                Action::Advance
            }
            Some(GameState::LevelDone) => {
                game.request_next_phase();
                Action::Advance
            }
            Some(state) if state.is_puzzle() => self.steer(game),
            Some(GameState::Phase3) => Self::defend(game),
            _ => Action::Idle,
        }
    }

    fn steer(&mut self, game: &mut MoonGame) -> Action {
        if !self.rng.random_bool(self.steer_chance) {
            return Action::Idle;
        }
        let moved = match self.rng.random_range(0..5) {
            0 => game.move_left(),
            1 => game.move_right(),
            2 => game.rotate(Rotation::Clockwise),
            3 => game.rotate(Rotation::CounterClockwise),
            _ => game.move_down(),
        };
        if moved {
            Action::Steer
        } else {
            Action::Idle
        }
    }

    fn defend(game: &mut MoonGame) -> Action {
        let target = game
            .arcade()
            .asteroids()
            .map(|(_, asteroid)| asteroid.position)
            .filter(|&position| game.closest_ready_turret(position).is_some())
            .max_by_key(|position| position.y);
        match target.and_then(|target| game.fire_missile(target)) {
            Some(_) => Action::Fire,
            None => Action::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mooncrete_test_utils::fixtures::{game_in, quiet_config, started_game};

    #[test]
    fn test_clicks_through_level_done() {
        let mut game = game_in(4, GameState::LevelDone);
        let mut pilot = Autopilot::new(1);
        assert_eq!(pilot.act(&mut game), Action::Advance);
        assert_eq!(game.current_state(), Some(GameState::Phase1));
        assert_eq!(game.scoreboard().level, 2);
    }

    #[test]
    fn test_always_steering_moves_the_piece() {
        let mut game = started_game(8);
        for now in (0..2_000).step_by(50) {
            game.tick(now);
        }
        assert!(game.active_piece().is_some());

        let mut pilot = Autopilot::with_steer_chance(2, 1.0);
        let steered = (0..20)
            .filter(|_| pilot.act(&mut game) == Action::Steer)
            .count();
        assert!(steered > 0);
    }

    #[test]
    fn test_idle_on_menu() {
        let mut game = MoonGame::new(quiet_config()).unwrap();
        let mut pilot = Autopilot::new(3);
        assert_eq!(pilot.act(&mut game), Action::Idle);
        assert_eq!(game.current_state(), Some(GameState::Menu));
    }
}
