//! Puzzle simulation: the falling piece, pairing, gravity and row clears.
//!
//! A puzzle tick runs in a fixed order:
//!
//! 1. drop the active piece one row, or merge it and spawn the next one
//! 2. pairing sweep, handing derived blocks to a [`MoonbaseBuilder`]
//! 3. gravity, one row-step
//! 4. clear full rows
//!
//! Every positional change goes through the same collision predicate. A
//! blocked move, drop or rotation is a silent no-op.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::blocks::BlockType;
use crate::config::PuzzleConfig;
use crate::events::{EventQueue, GameEvent, PieceCell};
use crate::math::Cell;
use crate::puzzle::grid::PuzzleGrid;
use crate::puzzle::shape::{Rotation, Shape, ShapeTemplate};
use crate::state::GameState;

/// The construction entry point pairing calls into.
///
/// Implemented by the arcade simulator; tests substitute a recorder.
pub trait MoonbaseBuilder {
    /// Build the structure a derived block stands for.
    ///
    /// `origin` is the puzzle cell the pair was found at. Returns whether a
    /// structure was placed. Failing to place is not an error.
    fn build_moonbase(&mut self, derived: BlockType, origin: Cell) -> bool;
}

/// Result of trying to put a new piece on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SpawnOutcome {
    /// The piece is now active.
    Spawned,
    /// The piece collided on creation: the board is full.
    BoardFull,
}

/// Result of a puzzle step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StepOutcome {
    /// There was no active piece; a new one spawned.
    Spawned,
    /// The active piece dropped one row.
    Dropped,
    /// The active piece merged into the board and the next one spawned.
    Landed,
    /// The next piece could not be placed.
    BoardFull,
}

/// The falling piece: a shape anchored at a board cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ActivePiece {
    /// Block layout.
    pub shape: Shape,
    /// Board cell of the shape's top-left corner.
    pub origin: Cell,
}

impl ActivePiece {
    /// Occupied board cells.
    pub fn cells(&self) -> impl Iterator<Item = PieceCell> + '_ {
        let origin = self.origin;
        self.shape.cells().map(move |(dx, dy, block)| PieceCell {
            cell: Cell::new(origin.x + dx, origin.y + dy),
            block,
        })
    }

    /// Whether the piece covers a board cell.
    #[must_use]
    pub fn occupies(&self, cell: Cell) -> bool {
        self.cells().any(|piece_cell| piece_cell.cell == cell)
    }
}

/// Owns the puzzle board and the active piece.
#[derive(Debug, Clone)]
pub struct PuzzleEngine {
    config: PuzzleConfig,
    grid: PuzzleGrid,
    piece: Option<ActivePiece>,
    palette: Vec<BlockType>,
    rng: Pcg32,
    events: EventQueue,
}

impl PuzzleEngine {
    /// Create an engine with an empty board and the phase 1 palette.
    #[must_use]
    pub fn new(config: PuzzleConfig, seed: u64) -> Self {
        let grid = PuzzleGrid::new(config.width, config.height);
        let palette = BlockType::palette(GameState::Phase1, config.flotsam_in_pieces);
        Self {
            config,
            grid,
            piece: None,
            palette,
            rng: Pcg32::seed_from_u64(seed),
            events: EventQueue::new(),
        }
    }

    /// The board.
    #[must_use]
    pub fn grid(&self) -> &PuzzleGrid {
        &self.grid
    }

    /// The falling piece, if any.
    #[must_use]
    pub fn active_piece(&self) -> Option<&ActivePiece> {
        self.piece.as_ref()
    }

    /// Block types new pieces are drawn from.
    #[must_use]
    pub fn palette(&self) -> &[BlockType] {
        &self.palette
    }

    /// Switch the palette to a phase's block types.
    ///
    /// States without puzzle play keep the current palette.
    pub fn set_phase(&mut self, state: GameState) {
        let palette = BlockType::palette(state, self.config.flotsam_in_pieces);
        if !palette.is_empty() {
            tracing::debug!(?state, ?palette, "Puzzle palette changed");
            self.palette = palette;
        }
    }

    /// Empty the board and drop the active piece.
    pub fn clear(&mut self) {
        self.grid.clear();
        self.piece = None;
    }

    /// Take queued events, oldest first.
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, GameEvent> {
        self.events.drain()
    }

    /// Whether a shape anchored at `origin` leaves the board or overlaps a block.
    #[must_use]
    pub fn collides(&self, shape: &Shape, origin: Cell) -> bool {
        shape.cells().any(|(dx, dy, _)| {
            let cell = Cell::new(origin.x + dx, origin.y + dy);
            !self.grid.is_vacant(cell)
        })
    }

    fn piece_occupies(&self, cell: Cell) -> bool {
        self.piece.as_ref().is_some_and(|piece| piece.occupies(cell))
    }

    fn piece_cells(&self) -> Vec<PieceCell> {
        self.piece
            .as_ref()
            .map(|piece| piece.cells().collect())
            .unwrap_or_default()
    }

    /// Put a block on the board. Refused if the cell is taken, off the board
    /// or under the active piece.
    pub fn place_block(&mut self, cell: Cell, block: BlockType) -> bool {
        if !self.grid.is_vacant(cell) || self.piece_occupies(cell) {
            return false;
        }
        self.grid.set(cell, block);
        self.events.push(GameEvent::BlockSpawned { cell, block });
        true
    }

    /// Spawn a random shape filled from the palette.
    pub fn spawn_next(&mut self) -> SpawnOutcome {
        let template = ShapeTemplate::ALL[self.rng.random_range(0..ShapeTemplate::ALL.len())];
        let palette = &self.palette;
        let rng = &mut self.rng;
        let shape = Shape::from_template(template, || {
            palette[rng.random_range(0..palette.len())]
        });
        self.spawn(shape)
    }

    /// Centre a shape on the top row and make it the active piece.
    ///
    /// A shape that collides on creation is not placed; the board is full.
    pub fn spawn(&mut self, shape: Shape) -> SpawnOutcome {
        let origin = Cell::new(
            (self.config.width_i32() - shape.width() as i32) / 2,
            0,
        );
        if self.collides(&shape, origin) {
            tracing::debug!(?origin, "New piece collides on spawn, board is full");
            self.piece = None;
            self.events.push(GameEvent::BoardFull);
            return SpawnOutcome::BoardFull;
        }
        self.piece = Some(ActivePiece { shape, origin });
        self.events.push(GameEvent::PieceSpawned {
            cells: self.piece_cells(),
        });
        SpawnOutcome::Spawned
    }

    /// Drop the active piece one row, or merge it and spawn the next.
    pub fn step(&mut self) -> StepOutcome {
        let Some(piece) = &self.piece else {
            return match self.spawn_next() {
                SpawnOutcome::Spawned => StepOutcome::Spawned,
                SpawnOutcome::BoardFull => StepOutcome::BoardFull,
            };
        };

        let lowered = piece.origin.below();
        if !self.collides(&piece.shape, lowered) {
            self.commit_origin(lowered);
            return StepOutcome::Dropped;
        }

        self.merge_piece();
        match self.spawn_next() {
            SpawnOutcome::Spawned => StepOutcome::Landed,
            SpawnOutcome::BoardFull => StepOutcome::BoardFull,
        }
    }

    /// Run a full puzzle tick: step, pairing, gravity, row clears.
    pub fn tick<B>(&mut self, builder: &mut B) -> StepOutcome
    where
        B: MoonbaseBuilder + ?Sized,
    {
        let outcome = self.step();
        if outcome == StepOutcome::BoardFull {
            return outcome;
        }
        self.pairing_sweep(builder);
        self.settle();
        self.clear_full_rows();

        #[cfg(feature = "debug-validation")]
        self.assert_invariants();

        outcome
    }

    fn commit_origin(&mut self, origin: Cell) {
        if let Some(piece) = &mut self.piece {
            piece.origin = origin;
        }
        self.events.push(GameEvent::PieceMoved {
            cells: self.piece_cells(),
        });
    }

    fn merge_piece(&mut self) {
        let Some(piece) = self.piece.take() else {
            return;
        };
        for PieceCell { cell, block } in piece.cells() {
            if self.grid.is_vacant(cell) {
                self.grid.set(cell, block);
                self.events.push(GameEvent::BlockSpawned { cell, block });
            } else {
                tracing::warn!(?cell, ?block, "Merge target occupied, block dropped");
            }
        }
    }

    fn try_shift(&mut self, dx: i32, dy: i32) -> bool {
        let Some(piece) = &self.piece else {
            return false;
        };
        let candidate = Cell::new(piece.origin.x + dx, piece.origin.y + dy);
        if self.collides(&piece.shape, candidate) {
            return false;
        }
        self.commit_origin(candidate);
        true
    }

    /// Move the piece one column left.
    pub fn move_left(&mut self) -> bool {
        self.try_shift(-1, 0)
    }

    /// Move the piece one column right.
    pub fn move_right(&mut self) -> bool {
        self.try_shift(1, 0)
    }

    /// Move the piece one row down. Never merges; landing is left to [`step`](Self::step).
    pub fn move_down(&mut self) -> bool {
        self.try_shift(0, 1)
    }

    /// Rotate the piece about its anchor.
    pub fn rotate(&mut self, rotation: Rotation) -> bool {
        let Some(piece) = &self.piece else {
            return false;
        };
        let turned = piece.shape.rotated(rotation);
        if self.collides(&turned, piece.origin) {
            return false;
        }
        if let Some(piece) = &mut self.piece {
            piece.shape = turned;
        }
        self.events.push(GameEvent::PieceMoved {
            cells: self.piece_cells(),
        });
        true
    }

    /// Consume adjacent component pairs and hand each derived type to `builder`.
    ///
    /// Rules are tried in a fresh random order each sweep. For each source
    /// cell the bottom neighbour is checked before the right one. Returns
    /// the number of pairs consumed.
    pub fn pairing_sweep<B>(&mut self, builder: &mut B) -> usize
    where
        B: MoonbaseBuilder + ?Sized,
    {
        let mut rules = self.config.pairing_rules.clone();
        rules.shuffle(&mut self.rng);

        let mut paired = 0;
        for rule in &rules {
            for y in 0..self.config.height_i32() {
                for x in 0..self.config.width_i32() {
                    let cell = Cell::new(x, y);
                    let Some(partner) = self.grid.get(cell).and_then(|b| rule.partner(b)) else {
                        continue;
                    };
                    let neighbour = [cell.below(), cell.right()]
                        .into_iter()
                        .find(|&n| self.grid.get(n) == Some(partner));
                    if let Some(neighbour) = neighbour {
                        self.consume_pair(cell, neighbour);
                        self.events.push(GameEvent::BlocksPaired {
                            derived: rule.derived,
                            first: cell,
                            second: neighbour,
                        });
                        if !builder.build_moonbase(rule.derived, cell) {
                            tracing::debug!(derived = ?rule.derived, "Pair consumed but nothing was built");
                        }
                        paired += 1;
                    }
                }
            }
        }
        paired
    }

    fn consume_pair(&mut self, first: Cell, second: Cell) {
        for cell in [first, second] {
            if let Some(block) = self.grid.take(cell) {
                self.events.push(GameEvent::BlockDestroyed { cell, block });
            }
        }
    }

    /// Let loose blocks fall one row. Returns how many moved.
    pub fn settle(&mut self) -> usize {
        let mut moved = 0;
        for y in (0..self.config.height_i32() - 1).rev() {
            for x in 0..self.config.width_i32() {
                let from = Cell::new(x, y);
                let to = from.below();
                let Some(block) = self.grid.get(from) else {
                    continue;
                };
                if !self.grid.is_vacant(to) || self.piece_occupies(to) {
                    continue;
                }
                self.grid.take(from);
                self.grid.set(to, block);
                self.events.push(GameEvent::BlockMoved { from, to, block });
                moved += 1;
            }
        }
        moved
    }

    /// Clear every full row in place. Returns the cleared row indices.
    pub fn clear_full_rows(&mut self) -> Vec<i32> {
        let full: Vec<i32> = (0..self.config.height_i32())
            .filter(|&row| self.grid.is_row_full(row))
            .collect();
        for &row in &full {
            for (cell, block) in self.grid.clear_row(row) {
                self.events.push(GameEvent::BlockDestroyed { cell, block });
            }
            self.events.push(GameEvent::RowCleared { row });
        }
        full
    }

    /// Drop single flotsam blocks into random open top-row columns.
    ///
    /// Returns `false` if a block found no open column: the board is full.
    pub fn drop_flotsam(&mut self, amount: u32) -> bool {
        for _ in 0..amount {
            let open: Vec<Cell> = (0..self.config.width_i32())
                .map(|x| Cell::new(x, 0))
                .filter(|&cell| self.grid.is_vacant(cell) && !self.piece_occupies(cell))
                .collect();
            if open.is_empty() {
                tracing::debug!("No open column for flotsam, board is full");
                self.events.push(GameEvent::BoardFull);
                return false;
            }
            let cell = open[self.rng.random_range(0..open.len())];
            let block = BlockType::FLOTSAM[self.rng.random_range(0..BlockType::FLOTSAM.len())];
            self.place_block(cell, block);
        }
        true
    }

    /// Drop the configured amount of flotsam for a level.
    pub fn drop_flotsam_for_level(&mut self, level: u32) -> bool {
        let amount = self.config.flotsam_drop.amount(level);
        self.drop_flotsam(amount)
    }

    #[cfg(feature = "debug-validation")]
    fn assert_invariants(&self) {
        if let Some(piece) = &self.piece {
            for piece_cell in piece.cells() {
                assert!(
                    self.grid.is_vacant(piece_cell.cell),
                    "active piece overlaps board at {:?}",
                    piece_cell.cell
                );
            }
        }
    }
}
