//! Cell lookup for structures.
//!
//! Structures are owned by the arena. This index is derived from it and
//! kept in step on every insert and removal.

use crate::arcade::StructureId;
use crate::math::Cell;

/// Grid of slots, one optional structure handle per cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpatialIndex {
    columns: u32,
    rows: u32,
    slots: Vec<Option<StructureId>>,
}

impl SpatialIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new(columns: u32, rows: u32) -> Self {
        Self {
            columns,
            rows,
            slots: vec![None; (columns as usize) * (rows as usize)],
        }
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        self.in_bounds(cell)
            .then(|| cell.y as usize * self.columns as usize + cell.x as usize)
    }

    /// Whether a cell lies in the playfield.
    #[must_use]
    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.columns as i32 && cell.y < self.rows as i32
    }

    /// Structure at a cell.
    #[must_use]
    pub fn get(&self, cell: Cell) -> Option<StructureId> {
        self.index(cell).and_then(|idx| self.slots[idx])
    }

    /// Whether a cell is in bounds and free.
    #[must_use]
    pub fn is_free(&self, cell: Cell) -> bool {
        self.index(cell).is_some_and(|idx| self.slots[idx].is_none())
    }

    /// Claim a free cell. Returns `false` if taken or out of bounds.
    pub fn insert(&mut self, cell: Cell, id: StructureId) -> bool {
        match self.index(cell) {
            Some(idx) if self.slots[idx].is_none() => {
                self.slots[idx] = Some(id);
                true
            }
            _ => false,
        }
    }

    /// Release a cell.
    pub fn remove(&mut self, cell: Cell) -> Option<StructureId> {
        self.index(cell).and_then(|idx| self.slots[idx].take())
    }

    /// Release every cell.
    pub fn clear(&mut self) {
        self.slots.fill(None);
    }

    /// Number of claimed cells.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arcade::arena::Arena;
    use crate::arcade::entities::{Structure, StructureKind};

    #[test]
    fn test_insert_is_exclusive() {
        let mut arena = Arena::new();
        let cell = Cell::new(2, 3);
        let a = arena.insert(Structure::new(StructureKind::LunarLand, cell, 5, 1));
        let b = arena.insert(Structure::new(StructureKind::Mooncrete, cell, 5, 1));
        let mut index = SpatialIndex::new(4, 4);
        assert!(index.insert(cell, a));
        assert!(!index.insert(cell, b));
        assert_eq!(index.get(cell), Some(a));
        assert_eq!(index.remove(cell), Some(a));
        assert!(index.is_free(cell));
        assert!(!index.insert(Cell::new(4, 0), b));
    }
}
