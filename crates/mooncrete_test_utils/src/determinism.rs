//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the game produces identical
//! results given an identical seed and input script.
//!
//! # Testing Strategy
//!
//! Sources of non-determinism the simulation guards against:
//!
//! - **Floating-point math**: explosion radii use fixed-point arithmetic via
//!   [`mooncrete_core::math::Fixed`].
//!
//! - **Hash map iteration order**: entities live in arenas and are always
//!   walked in slot order.
//!
//! - **System randomness**: every random choice flows from the config seed.
//!
//! - **Wall clock**: the game only knows the millisecond values it is ticked
//!   with.

use mooncrete_core::game::MoonGame;
use mooncrete_core::math::Point;
use mooncrete_core::puzzle::Rotation;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps simulated.
    pub steps: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic game).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the game was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Game is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `steps` - Number of steps per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one step, given its index
/// * `hash` - Function to compute the state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, u64),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for index in 0..steps {
            step(&mut state, index);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// One scripted player action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerInput {
    /// Do nothing this step.
    Wait,
    /// Move the piece left.
    Left,
    /// Move the piece right.
    Right,
    /// Move the piece down.
    Down,
    /// Rotate the piece.
    Rotate(Rotation),
    /// Fire at a point.
    Fire(Point),
    /// Skip to the next phase.
    Next,
}

impl PlayerInput {
    /// Apply the input to a game.
    pub fn apply(self, game: &mut MoonGame) {
        match self {
            PlayerInput::Wait => {}
            PlayerInput::Left => {
                game.move_left();
            }
            PlayerInput::Right => {
                game.move_right();
            }
            PlayerInput::Down => {
                game.move_down();
            }
            PlayerInput::Rotate(rotation) => {
                game.rotate(rotation);
            }
            PlayerInput::Fire(target) => {
                game.fire_missile(target);
            }
            PlayerInput::Next => game.request_next_phase(),
        }
    }
}

/// Milliseconds between scripted ticks.
pub const SCRIPT_TICK_MS: u64 = 25;

/// Play a script against a game: one tick per input, then the input.
pub fn play_script(game: &mut MoonGame, script: &[PlayerInput]) {
    for (index, input) in script.iter().enumerate() {
        let now = (index as u64 + 1) * SCRIPT_TICK_MS;
        game.tick(now);
        input.apply(game);
    }
}

/// Play the same script against two freshly built games and report the
/// first step at which their state hashes differ.
///
/// # Returns
///
/// `None` if the games stayed identical, `Some(step)` otherwise.
pub fn find_first_divergence<F>(setup: F, script: &[PlayerInput]) -> Option<usize>
where
    F: Fn() -> MoonGame,
{
    let mut a = setup();
    let mut b = setup();

    if a.state_hash() != b.state_hash() {
        return Some(0);
    }

    for (index, input) in script.iter().enumerate() {
        let now = (index as u64 + 1) * SCRIPT_TICK_MS;
        a.tick(now);
        b.tick(now);
        input.apply(&mut a);
        input.apply(&mut b);
        if a.state_hash() != b.state_hash() {
            return Some(index + 1);
        }
    }

    None
}

/// Proptest strategies for determinism and invariant testing.
pub mod strategies {
    use proptest::prelude::*;

    use super::PlayerInput;
    use mooncrete_core::math::Point;
    use mooncrete_core::puzzle::Rotation;

    /// A seed from the full range.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }

    /// A point inside the default 100x100 arcade playfield.
    pub fn arb_point() -> impl Strategy<Value = Point> {
        (0i32..100, 0i32..100).prop_map(|(x, y)| Point::new(x, y))
    }

    /// A rotation direction.
    pub fn arb_rotation() -> impl Strategy<Value = Rotation> {
        prop_oneof![Just(Rotation::Clockwise), Just(Rotation::CounterClockwise)]
    }

    /// A single player input, weighted toward waiting and puzzle moves.
    pub fn arb_input() -> impl Strategy<Value = PlayerInput> {
        prop_oneof![
            6 => Just(PlayerInput::Wait),
            2 => Just(PlayerInput::Left),
            2 => Just(PlayerInput::Right),
            1 => Just(PlayerInput::Down),
            1 => arb_rotation().prop_map(PlayerInput::Rotate),
            1 => arb_point().prop_map(PlayerInput::Fire),
        ]
    }

    /// A script of inputs.
    pub fn arb_script(max_len: usize) -> impl Strategy<Value = Vec<PlayerInput>> {
        prop::collection::vec(arb_input(), 0..max_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::started_game;

    #[test]
    fn test_verify_determinism_counter() {
        let result = verify_determinism(
            3,
            100,
            || 0u64,
            |state, index| *state = state.wrapping_mul(31).wrapping_add(index),
            |state| *state,
        );
        result.assert_deterministic();
        assert_eq!(result.unique_hashes().len(), 1);
    }

    #[test]
    fn test_scripted_games_do_not_diverge() {
        let script: Vec<PlayerInput> = (0..400)
            .map(|i| match i % 7 {
                0 => PlayerInput::Left,
                3 => PlayerInput::Rotate(Rotation::Clockwise),
                5 => PlayerInput::Right,
                _ => PlayerInput::Wait,
            })
            .collect();
        assert_eq!(find_first_divergence(|| started_game(7), &script), None);
    }
}
