//! Stack-based game state tracking.
//!
//! The stack is deliberately dumb: it never validates transitions. The
//! game-flow controller in [`crate::game`] decides what is legal; the stack
//! only records where we are and where escape leads back to.

use serde::{Deserialize, Serialize};

/// A game state tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    /// Main menu.
    Menu,
    /// Puzzle phase 1: mine calcium and water for mooncrete.
    Phase1,
    /// Puzzle phase 2: assemble radars and turrets.
    Phase2,
    /// Arcade phase: defend the base.
    Phase3,
    /// Cool-down after the arcade phase.
    Reprieve,
    /// Level results screen.
    LevelDone,
    /// Game over.
    Lose,
    /// Help screen.
    Help,
}

impl GameState {
    /// Whether the puzzle grid runs in this state.
    #[must_use]
    pub const fn is_puzzle(self) -> bool {
        matches!(self, GameState::Phase1 | GameState::Phase2)
    }

    /// Whether the arcade simulation runs in this state.
    #[must_use]
    pub const fn is_arcade(self) -> bool {
        matches!(
            self,
            GameState::Phase3 | GameState::Reprieve | GameState::Lose
        )
    }
}

/// A simple stack of game states. The top is the current state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateStack {
    stack: Vec<GameState>,
}

impl StateStack {
    /// Create an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current state, if any.
    #[must_use]
    pub fn peek(&self) -> Option<GameState> {
        self.stack.last().copied()
    }

    /// Remove and return the current state.
    ///
    /// `None` on an empty stack; callers treat an emptied stack as quit.
    pub fn pop(&mut self) -> Option<GameState> {
        self.stack.pop()
    }

    /// Push a new current state.
    pub fn push(&mut self, state: GameState) -> GameState {
        self.stack.push(state);
        state
    }

    /// Replace the current state without leaving a return point.
    ///
    /// On an empty stack this is a push.
    pub fn swap(&mut self, state: GameState) -> GameState {
        self.stack.pop();
        self.push(state)
    }

    /// Whether the stack holds no states.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Number of stacked states.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// States from bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = GameState> + '_ {
        self.stack.iter().copied()
    }
}
