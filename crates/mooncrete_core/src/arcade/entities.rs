//! Arcade entity data.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, line_points, Cell, Fixed, Point};

/// Kinds of stationary structure on the moon base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StructureKind {
    /// Generated terrain. Absorbs impacts.
    LunarLand,
    /// Foundation slab. Its loss brings down what stands on it.
    Mooncrete,
    /// Radar station.
    Radar,
    /// Missile turret.
    Turret,
    /// Habitat building.
    Building,
}

impl StructureKind {
    /// Whether this is terrain rather than something the player built.
    #[must_use]
    pub const fn is_terrain(self) -> bool {
        matches!(self, StructureKind::LunarLand)
    }

    /// Whether losing one counts against the wave bonus.
    #[must_use]
    pub const fn is_moonbase(self) -> bool {
        matches!(
            self,
            StructureKind::Radar | StructureKind::Turret | StructureKind::Building
        )
    }
}

/// Turret charge counter, always within `0..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Charge {
    current: u32,
    max: u32,
}

impl Charge {
    /// A fully charged counter.
    #[must_use]
    pub const fn full(max: u32) -> Self {
        Self { current: max, max }
    }

    /// An empty counter.
    #[must_use]
    pub const fn empty(max: u32) -> Self {
        Self { current: 0, max }
    }

    /// Current charge.
    #[must_use]
    pub const fn current(self) -> u32 {
        self.current
    }

    /// Charge needed to fire.
    #[must_use]
    pub const fn max(self) -> u32 {
        self.max
    }

    /// Ready to fire.
    #[must_use]
    pub const fn is_ready(self) -> bool {
        self.current == self.max
    }

    /// Add one unit, capped at max.
    pub fn recharge(&mut self) {
        self.current = self.current.saturating_add(1).min(self.max);
    }

    /// Spend the whole charge.
    pub fn discharge(&mut self) {
        self.current = 0;
    }
}

/// A stationary structure occupying one arcade cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Structure {
    /// What it is.
    pub kind: StructureKind,
    /// Grid cell.
    pub cell: Cell,
    /// Top-left corner in world units.
    pub position: Point,
    /// Firing charge, turrets only.
    pub charge: Option<Charge>,
}

impl Structure {
    /// Create a structure at a cell. Turrets start fully charged.
    #[must_use]
    pub fn new(kind: StructureKind, cell: Cell, cell_size: i32, max_charge: u32) -> Self {
        Self {
            kind,
            cell,
            position: cell.origin(cell_size),
            charge: (kind == StructureKind::Turret).then(|| Charge::full(max_charge)),
        }
    }

    /// Whether this is a turret with a full charge.
    #[must_use]
    pub fn is_ready_turret(&self) -> bool {
        self.charge.is_some_and(Charge::is_ready)
    }
}

/// Rasterised path from a start point, the start itself excluded.
fn trajectory(start: Point, end: Point) -> VecDeque<Point> {
    line_points(start, end).into_iter().skip(1).collect()
}

/// A falling rock.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Asteroid {
    /// Current position.
    pub position: Point,
    /// Where it is headed.
    pub destination: Point,
    #[serde(skip)]
    path: VecDeque<Point>,
}

impl Asteroid {
    /// Aim an asteroid from `start` to `destination`.
    #[must_use]
    pub fn new(start: Point, destination: Point) -> Self {
        Self {
            position: start,
            destination,
            path: trajectory(start, destination),
        }
    }

    /// Move one step. `None` once the path is used up.
    pub fn advance(&mut self) -> Option<Point> {
        let next = self.path.pop_front()?;
        self.position = next;
        Some(next)
    }

    /// Steps left on the path.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.path.len()
    }
}

/// A fired missile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Missile {
    /// Firing position.
    pub origin: Point,
    /// Detonation point.
    pub destination: Point,
    /// Current position.
    pub position: Point,
    #[serde(skip)]
    path: VecDeque<Point>,
}

impl Missile {
    /// Aim a missile from `origin` to `destination`.
    #[must_use]
    pub fn new(origin: Point, destination: Point) -> Self {
        Self {
            origin,
            destination,
            position: origin,
            path: trajectory(origin, destination),
        }
    }

    /// Move up to `steps` along the path. Returns whether it moved.
    pub fn advance(&mut self, steps: u32) -> bool {
        let mut moved = false;
        for _ in 0..steps {
            match self.path.pop_front() {
                Some(next) => {
                    self.position = next;
                    moved = true;
                }
                None => break,
            }
        }
        moved
    }

    /// Whether the path is used up.
    #[must_use]
    pub fn is_spent(&self) -> bool {
        self.path.is_empty()
    }
}

/// A growing blast that catches asteroids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Explosion {
    /// Centre.
    pub position: Point,
    /// Current radius in world units.
    #[serde(with = "fixed_serde")]
    pub radius: Fixed,
}

impl Explosion {
    /// A new blast of zero radius.
    #[must_use]
    pub fn new(position: Point) -> Self {
        Self {
            position,
            radius: Fixed::ZERO,
        }
    }

    /// Grow, capped at `max`. Returns whether the cap was reached.
    pub fn grow(&mut self, by: Fixed, max: Fixed) -> bool {
        self.radius = self.radius.saturating_add(by).min(max);
        self.radius >= max
    }

    /// Whether a point lies strictly inside the blast.
    #[must_use]
    pub fn catches(&self, point: Point) -> bool {
        self.position.distance_squared_fixed(point) < self.radius.saturating_mul(self.radius)
    }
}
