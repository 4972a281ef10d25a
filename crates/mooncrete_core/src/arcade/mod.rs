//! Arcade defence: terrain, moon base structures, asteroids, missiles and
//! explosions.

pub mod arena;
pub mod entities;
pub mod sim;
pub mod spatial;

pub use arena::{Arena, Handle};
pub use entities::{Asteroid, Charge, Explosion, Missile, Structure, StructureKind};
pub use sim::{ArcadeSim, StepReport, WaveMode};
pub use spatial::SpatialIndex;

/// Handle to a structure.
pub type StructureId = Handle<Structure>;
/// Handle to an asteroid.
pub type AsteroidId = Handle<Asteroid>;
/// Handle to a missile.
pub type MissileId = Handle<Missile>;
/// Handle to an explosion.
pub type ExplosionId = Handle<Explosion>;
