//! Falling piece shapes.

use serde::{Deserialize, Serialize};

use crate::blocks::BlockType;

/// Rotation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    /// Quarter turn clockwise.
    Clockwise,
    /// Quarter turn counter-clockwise.
    CounterClockwise,
}

/// The seven canonical four-cell shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeTemplate {
    /// Straight line.
    I,
    /// Square.
    O,
    /// T junction.
    T,
    /// S skew.
    S,
    /// Z skew.
    Z,
    /// J hook.
    J,
    /// L hook.
    L,
}

impl ShapeTemplate {
    /// Every template.
    pub const ALL: [ShapeTemplate; 7] = [
        ShapeTemplate::I,
        ShapeTemplate::O,
        ShapeTemplate::T,
        ShapeTemplate::S,
        ShapeTemplate::Z,
        ShapeTemplate::J,
        ShapeTemplate::L,
    ];

    /// Occupancy mask, top row first.
    #[must_use]
    pub const fn mask(self) -> &'static [&'static [bool]] {
        const X: bool = true;
        const O: bool = false;
        match self {
            ShapeTemplate::I => &[&[X, X, X, X]],
            ShapeTemplate::O => &[&[X, X], &[X, X]],
            ShapeTemplate::T => &[&[O, X, O], &[X, X, X]],
            ShapeTemplate::S => &[&[O, X, X], &[X, X, O]],
            ShapeTemplate::Z => &[&[X, X, O], &[O, X, X]],
            ShapeTemplate::J => &[&[X, O, O], &[X, X, X]],
            ShapeTemplate::L => &[&[O, O, X], &[X, X, X]],
        }
    }
}

/// A small matrix of optional blocks, top row first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    rows: Vec<Vec<Option<BlockType>>>,
}

impl Shape {
    /// Build a shape from explicit rows.
    ///
    /// # Panics
    ///
    /// Panics on an empty or ragged matrix.
    #[must_use]
    pub fn from_rows(rows: Vec<Vec<Option<BlockType>>>) -> Self {
        let width = rows.first().map_or(0, Vec::len);
        assert!(width > 0, "Shape must have at least one column");
        assert!(
            rows.iter().all(|row| row.len() == width),
            "Shape rows must all be the same width"
        );
        Self { rows }
    }

    /// A single horizontal row of blocks.
    #[must_use]
    pub fn horizontal(blocks: &[BlockType]) -> Self {
        Self::from_rows(vec![blocks.iter().copied().map(Some).collect()])
    }

    /// Instantiate a template, filling each occupied cell from `fill`.
    pub fn from_template<F>(template: ShapeTemplate, mut fill: F) -> Self
    where
        F: FnMut() -> BlockType,
    {
        let rows = template
            .mask()
            .iter()
            .map(|row| row.iter().map(|&occupied| occupied.then(&mut fill)).collect())
            .collect();
        Self { rows }
    }

    /// Matrix width.
    #[must_use]
    pub fn width(&self) -> usize {
        self.rows[0].len()
    }

    /// Matrix height.
    #[must_use]
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Occupied cells as `(dx, dy, block)` offsets from the top-left corner.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32, BlockType)> + '_ {
        self.rows.iter().enumerate().flat_map(|(dy, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(dx, block)| block.map(|block| (dx as i32, dy as i32, block)))
        })
    }

    /// Transpose, then reverse rows (clockwise) or row order (counter-clockwise).
    #[must_use]
    pub fn rotated(&self, rotation: Rotation) -> Self {
        let (width, height) = (self.width(), self.height());
        let mut transposed: Vec<Vec<Option<BlockType>>> = (0..width)
            .map(|col| (0..height).map(|row| self.rows[row][col]).collect())
            .collect();
        match rotation {
            Rotation::Clockwise => {
                for row in &mut transposed {
                    row.reverse();
                }
            }
            Rotation::CounterClockwise => transposed.reverse(),
        }
        Self { rows: transposed }
    }
}
