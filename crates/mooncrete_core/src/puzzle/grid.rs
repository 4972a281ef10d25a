//! The puzzle board.
//!
//! A plain owned grid: cloning it gives an independent snapshot, so there is
//! no way to alias a board by accident.

use serde::{Deserialize, Serialize};

use crate::blocks::BlockType;
use crate::math::Cell;

/// Fixed-size board of optional blocks, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PuzzleGrid {
    width: u32,
    height: u32,
    cells: Vec<Option<BlockType>>,
}

impl PuzzleGrid {
    /// Create an empty board.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0, "PuzzleGrid width must be positive");
        assert!(height > 0, "PuzzleGrid height must be positive");
        Self {
            width,
            height,
            cells: vec![None; (width as usize) * (height as usize)],
        }
    }

    /// Build a board from glyph rows, top row first. `.` is an empty cell.
    ///
    /// Returns `None` for ragged rows or unknown glyphs.
    #[must_use]
    pub fn from_glyph_rows(rows: &[&str]) -> Option<Self> {
        let height = rows.len() as u32;
        let width = rows.first()?.chars().count() as u32;
        if width == 0 {
            return None;
        }
        let mut grid = Self::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() as u32 != width {
                return None;
            }
            for (x, glyph) in row.chars().enumerate() {
                if glyph != '.' {
                    let block = BlockType::from_glyph(glyph)?;
                    grid.set(Cell::new(x as i32, y as i32), block);
                }
            }
        }
        Some(grid)
    }

    /// Board width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Board height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, cell: Cell) -> Option<usize> {
        if self.in_bounds(cell) {
            Some(cell.y as usize * self.width as usize + cell.x as usize)
        } else {
            None
        }
    }

    /// Check if a cell lies on the board.
    #[must_use]
    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width as i32 && cell.y < self.height as i32
    }

    /// Block at a cell. `None` for empty or out-of-bounds cells.
    #[must_use]
    pub fn get(&self, cell: Cell) -> Option<BlockType> {
        self.index(cell).and_then(|idx| self.cells[idx])
    }

    /// Whether a cell is on the board and empty.
    #[must_use]
    pub fn is_vacant(&self, cell: Cell) -> bool {
        self.index(cell).is_some_and(|idx| self.cells[idx].is_none())
    }

    /// Put a block in a cell. Returns `false` if out of bounds.
    pub fn set(&mut self, cell: Cell, block: BlockType) -> bool {
        match self.index(cell) {
            Some(idx) => {
                self.cells[idx] = Some(block);
                true
            }
            None => false,
        }
    }

    /// Empty a cell, returning what was there.
    pub fn take(&mut self, cell: Cell) -> Option<BlockType> {
        self.index(cell).and_then(|idx| self.cells[idx].take())
    }

    /// Every cell, row by row: `(cell, contents)`.
    pub fn cells(&self) -> impl Iterator<Item = (Cell, Option<BlockType>)> + '_ {
        let width = self.width as usize;
        self.cells.iter().enumerate().map(move |(idx, block)| {
            (Cell::new((idx % width) as i32, (idx / width) as i32), *block)
        })
    }

    /// Occupied cells only, row by row.
    pub fn blocks(&self) -> impl Iterator<Item = (Cell, BlockType)> + '_ {
        self.cells()
            .filter_map(|(cell, block)| block.map(|block| (cell, block)))
    }

    /// The board as `(x, y, tag)` triples, `0` for empty cells.
    pub fn triples(&self) -> impl Iterator<Item = (i32, i32, u8)> + '_ {
        self.cells()
            .map(|(cell, block)| (cell.x, cell.y, block.map_or(0, BlockType::tag)))
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|block| block.is_some()).count()
    }

    /// Whether every cell of a row is occupied.
    #[must_use]
    pub fn is_row_full(&self, row: i32) -> bool {
        (0..self.width as i32).all(|x| self.get(Cell::new(x, row)).is_some())
    }

    /// Empty a row, returning the removed blocks. Rows above do not shift.
    pub fn clear_row(&mut self, row: i32) -> Vec<(Cell, BlockType)> {
        (0..self.width as i32)
            .filter_map(|x| {
                let cell = Cell::new(x, row);
                self.take(cell).map(|block| (cell, block))
            })
            .collect()
    }

    /// Empty the whole board.
    pub fn clear(&mut self) {
        self.cells.fill(None);
    }

    /// Render as glyph rows, `.` for empty.
    #[must_use]
    pub fn to_glyph_rows(&self) -> Vec<String> {
        (0..self.height as i32)
            .map(|y| {
                (0..self.width as i32)
                    .map(|x| self.get(Cell::new(x, y)).map_or('.', BlockType::glyph))
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_take() {
        let mut grid = PuzzleGrid::new(4, 4);
        let cell = Cell::new(1, 2);
        assert!(grid.is_vacant(cell));
        assert!(grid.set(cell, BlockType::WaterBarrel));
        assert_eq!(grid.get(cell), Some(BlockType::WaterBarrel));
        assert!(!grid.is_vacant(cell));
        assert_eq!(grid.take(cell), Some(BlockType::WaterBarrel));
        assert!(grid.is_vacant(cell));
    }

    #[test]
    fn test_out_of_bounds() {
        let mut grid = PuzzleGrid::new(4, 4);
        assert!(!grid.set(Cell::new(4, 0), BlockType::MoonRocks));
        assert!(!grid.set(Cell::new(0, -1), BlockType::MoonRocks));
        assert_eq!(grid.get(Cell::new(-1, 0)), None);
        assert!(!grid.is_vacant(Cell::new(0, 4)));
    }

    #[test]
    fn test_glyph_round_trip() {
        let rows = ["....", ".cw.", "rrrr"];
        let grid = PuzzleGrid::from_glyph_rows(&rows).unwrap();
        assert_eq!(grid.width(), 4);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.occupied(), 6);
        assert_eq!(grid.to_glyph_rows(), rows);
        assert!(PuzzleGrid::from_glyph_rows(&["..", "..."]).is_none());
        assert!(PuzzleGrid::from_glyph_rows(&["?."]).is_none());
    }

    #[test]
    fn test_triples_cover_every_cell() {
        let grid = PuzzleGrid::from_glyph_rows(&["c.", ".w"]).unwrap();
        let triples: Vec<_> = grid.triples().collect();
        assert_eq!(triples, vec![(0, 0, 1), (1, 0, 0), (0, 1, 0), (1, 1, 2)]);
    }

    #[test]
    fn test_row_clear_does_not_shift() {
        let mut grid = PuzzleGrid::from_glyph_rows(&["c...", "wwww"]).unwrap();
        assert!(grid.is_row_full(1));
        assert!(!grid.is_row_full(0));
        assert_eq!(grid.clear_row(1).len(), 4);
        assert_eq!(grid.to_glyph_rows(), ["c...", "...."]);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut grid = PuzzleGrid::new(3, 3);
        let snapshot = grid.clone();
        grid.set(Cell::new(0, 0), BlockType::CalciumBarrel);
        assert_eq!(snapshot.occupied(), 0);
        assert_eq!(grid.occupied(), 1);
    }
}
