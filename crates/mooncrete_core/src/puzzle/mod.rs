//! Falling-block puzzle.
//!
//! Pieces of raw materials and components fall onto a fixed board. Adjacent
//! component pairs are consumed and turned into moon base structures by
//! whatever implements [`MoonbaseBuilder`].

pub mod engine;
pub mod grid;
pub mod shape;

pub use engine::{ActivePiece, MoonbaseBuilder, PuzzleEngine, SpawnOutcome, StepOutcome};
pub use grid::PuzzleGrid;
pub use shape::{Rotation, Shape, ShapeTemplate};
