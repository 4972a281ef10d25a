//! Procedural lunar terrain.
//!
//! The moonscape is a short band of cells at the bottom of the arcade
//! playfield. The floor row is always solid. Rows above it are grown
//! upward at random, but a cell only becomes rugged when the cell directly
//! beneath it is already solid, so terrain never floats.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::MoonscapeConfig;
use crate::math::Cell;

/// Terrain band, row 0 at the top and the floor at `rows - 1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Moonscape {
    columns: u32,
    rows: u32,
    solid: Vec<bool>,
}

impl Moonscape {
    /// An empty band with no terrain at all.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    #[must_use]
    pub fn empty(columns: u32, rows: u32) -> Self {
        assert!(columns > 0 && rows > 0, "Moonscape dimensions must be positive");
        Self {
            columns,
            rows,
            solid: vec![false; (columns as usize) * (rows as usize)],
        }
    }

    /// Generate a band `columns` wide.
    pub fn generate<R: Rng + ?Sized>(config: &MoonscapeConfig, columns: u32, rng: &mut R) -> Self {
        let mut scape = Self::empty(columns, config.rows);
        let floor = scape.floor_row();
        for x in 0..columns as i32 {
            scape.set_solid(Cell::new(x, floor));
        }

        let top = floor - config.rugged_rows as i32;
        for y in (top.max(0)..floor).rev() {
            for x in 0..columns as i32 {
                let cell = Cell::new(x, y);
                if scape.is_solid(cell.below())
                    && !scape.is_solid(cell)
                    && rng.random_bool(config.ruggedness)
                {
                    scape.set_solid(cell);
                }
            }
        }
        tracing::debug!(columns, rows = config.rows, solid = scape.solid_count(), "Moonscape generated");
        scape
    }

    /// Band width in cells.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Band height in cells.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Index of the always-solid floor row.
    #[must_use]
    pub const fn floor_row(&self) -> i32 {
        self.rows as i32 - 1
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        let in_bounds = cell.x >= 0
            && cell.y >= 0
            && cell.x < self.columns as i32
            && cell.y < self.rows as i32;
        in_bounds.then(|| cell.y as usize * self.columns as usize + cell.x as usize)
    }

    /// Whether a cell holds terrain. Out-of-band cells are never solid.
    #[must_use]
    pub fn is_solid(&self, cell: Cell) -> bool {
        self.index(cell).is_some_and(|idx| self.solid[idx])
    }

    fn set_solid(&mut self, cell: Cell) {
        if let Some(idx) = self.index(cell) {
            self.solid[idx] = true;
        }
    }

    /// Every cell as `(x, y, solid)`, row by row.
    pub fn triples(&self) -> impl Iterator<Item = (i32, i32, bool)> + '_ {
        let columns = self.columns as usize;
        self.solid
            .iter()
            .enumerate()
            .map(move |(idx, &solid)| ((idx % columns) as i32, (idx / columns) as i32, solid))
    }

    /// Solid cells, row by row.
    pub fn solid_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.triples()
            .filter(|&(_, _, solid)| solid)
            .map(|(x, y, _)| Cell::new(x, y))
    }

    /// Number of solid cells.
    #[must_use]
    pub fn solid_count(&self) -> usize {
        self.solid.iter().filter(|&&solid| solid).count()
    }

    /// Whether every solid cell above the floor rests on another solid cell.
    #[must_use]
    pub fn is_grounded(&self) -> bool {
        self.solid_cells()
            .filter(|cell| cell.y < self.floor_row())
            .all(|cell| self.is_solid(cell.below()))
    }
}
