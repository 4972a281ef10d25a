//! Coordinates and deterministic math helpers.
//!
//! Arcade positions are integer [`Point`]s in world units; grids (puzzle
//! board, terrain, build slots) are addressed by [`Cell`]. Anything with a
//! fractional part, such as explosion radii, uses fixed-point [`Fixed`] so
//! proximity checks give the same answer on every platform.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for fractional simulation values.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// A position in arcade world units.
///
/// `y` grows downward: asteroids spawn at `y == 0` and fall toward the
/// moon surface at the bottom of the playfield.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: i32,
    /// Vertical coordinate (down is positive).
    pub y: i32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Squared distance as an integer, saturating instead of overflowing.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Squared distance in fixed-point, for comparing against radii.
    #[must_use]
    pub fn distance_squared_fixed(self, other: Self) -> Fixed {
        let dx = Fixed::from_num(self.x) - Fixed::from_num(other.x);
        let dy = Fixed::from_num(self.y) - Fixed::from_num(other.y);
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// The grid cell containing this point for a given cell size.
    #[must_use]
    pub const fn to_cell(self, cell_size: i32) -> Cell {
        Cell::new(self.x.div_euclid(cell_size), self.y.div_euclid(cell_size))
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// A cell on one of the simulation grids.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Cell {
    /// Column.
    pub x: i32,
    /// Row (down is positive).
    pub y: i32,
}

impl Cell {
    /// Create a new cell coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell directly above (one row up).
    #[must_use]
    pub const fn above(self) -> Self {
        Self::new(self.x, self.y - 1)
    }

    /// The cell directly below (one row down).
    #[must_use]
    pub const fn below(self) -> Self {
        Self::new(self.x, self.y + 1)
    }

    /// The cell to the right.
    #[must_use]
    pub const fn right(self) -> Self {
        Self::new(self.x + 1, self.y)
    }

    /// Top-left world point of this cell.
    #[must_use]
    pub const fn origin(self, cell_size: i32) -> Point {
        Point::new(self.x * cell_size, self.y * cell_size)
    }
}

impl From<(i32, i32)> for Cell {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Rasterize the straight line between two points (Bresenham).
///
/// The result runs from `start` to `end`, both included. The work is in
/// `i64`, so any pair of `i32` points is safe, but the output holds one
/// point per step along the major axis; keep endpoints on the playfield.
#[must_use]
pub fn line_points(start: Point, end: Point) -> Vec<Point> {
    let (mut x0, mut y0) = (i64::from(start.x), i64::from(start.y));
    let (mut x1, mut y1) = (i64::from(end.x), i64::from(end.y));

    let steep = (y1 - y0).abs() > (x1 - x0).abs();
    if steep {
        std::mem::swap(&mut x0, &mut y0);
        std::mem::swap(&mut x1, &mut y1);
    }

    let reversed = x0 > x1;
    if reversed {
        std::mem::swap(&mut x0, &mut x1);
        std::mem::swap(&mut y0, &mut y1);
    }

    let dx = x1 - x0;
    let dy = (y1 - y0).abs();
    let y_step = if y0 < y1 { 1 } else { -1 };
    let mut error = dx / 2;
    let mut y = y0;

    // Every coordinate lies between the two i32 endpoints.
    let mut points = Vec::with_capacity(usize::try_from(dx).unwrap_or(0).saturating_add(1));
    for x in x0..=x1 {
        points.push(if steep {
            Point::new(y as i32, x as i32)
        } else {
            Point::new(x as i32, y as i32)
        });
        error -= dy;
        if error < 0 {
            y += y_step;
            error += dx;
        }
    }

    if reversed {
        points.reverse();
    }
    points
}
