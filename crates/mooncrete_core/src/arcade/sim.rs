//! Arcade defence simulation.
//!
//! Each step runs the same passes in order:
//!
//! 1. recharge turrets
//! 2. spawn an asteroid if below the level cap (attack waves only)
//! 3. move asteroids, resolving impacts
//! 4. move missiles, detonating spent ones
//! 5. grow explosions, catching asteroids in range
//! 6. report whether any turret is left
//!
//! All entities are owned by arenas inside [`ArcadeSim`]; the outside world
//! only sees them through events and read-only queries.

use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::arcade::arena::Arena;
use crate::arcade::entities::{Asteroid, Explosion, Missile, Structure, StructureKind};
use crate::arcade::spatial::SpatialIndex;
use crate::arcade::{AsteroidId, ExplosionId, MissileId, StructureId};
use crate::blocks::BlockType;
use crate::config::{ArcadeConfig, MoonscapeConfig};
use crate::events::{EventQueue, GameEvent, StructureInfo};
use crate::math::{Cell, Point};
use crate::moonscape::Moonscape;
use crate::puzzle::MoonbaseBuilder;
use crate::score::WaveTally;

/// Whether a step may spawn new asteroids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WaveMode {
    /// Asteroids keep coming.
    Attack,
    /// Everything in flight keeps moving, nothing new spawns.
    Calm,
}

/// Summary of one arcade step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// Asteroids spawned this step.
    pub asteroids_spawned: u32,
    /// Asteroids caught by explosions this step.
    pub asteroids_caught: u32,
    /// Structures lost to impacts this step.
    pub structures_destroyed: u32,
    /// No turret is left standing.
    pub base_lost: bool,
}

fn structure_info(id: StructureId, structure: &Structure) -> StructureInfo {
    StructureInfo {
        id,
        kind: structure.kind,
        cell: structure.cell,
        position: structure.position,
    }
}

/// Owns the moon base, the terrain and everything flying over it.
#[derive(Debug, Clone)]
pub struct ArcadeSim {
    config: ArcadeConfig,
    terrain: MoonscapeConfig,
    moonscape: Moonscape,
    structures: Arena<Structure>,
    spatial: SpatialIndex,
    asteroids: Arena<Asteroid>,
    missiles: Arena<Missile>,
    explosions: Arena<Explosion>,
    tally: WaveTally,
    level: u32,
    rng: Pcg32,
    events: EventQueue,
}

impl ArcadeSim {
    /// Create an empty playfield.
    #[must_use]
    pub fn new(config: ArcadeConfig, terrain: MoonscapeConfig, seed: u64) -> Self {
        let spatial = SpatialIndex::new(config.columns, config.rows);
        let moonscape = Moonscape::empty(config.columns, terrain.rows.max(1));
        Self {
            config,
            terrain,
            moonscape,
            structures: Arena::new(),
            spatial,
            asteroids: Arena::new(),
            missiles: Arena::new(),
            explosions: Arena::new(),
            tally: WaveTally::default(),
            level: 1,
            rng: Pcg32::seed_from_u64(seed),
            events: EventQueue::new(),
        }
    }

    /// Arcade tuning in use.
    #[must_use]
    pub fn config(&self) -> &ArcadeConfig {
        &self.config
    }

    /// Level driving spawn caps and targeting.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Set the level.
    pub fn set_level(&mut self, level: u32) {
        self.level = level;
    }

    /// Counters for the current wave.
    #[must_use]
    pub const fn tally(&self) -> &WaveTally {
        &self.tally
    }

    /// Hand over the wave counters and start a fresh wave.
    pub fn take_tally(&mut self) -> WaveTally {
        std::mem::take(&mut self.tally)
    }

    /// Terrain generated for this level.
    #[must_use]
    pub fn moonscape(&self) -> &Moonscape {
        &self.moonscape
    }

    /// Take queued events, oldest first.
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, GameEvent> {
        self.events.drain()
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Structures in slot order.
    pub fn structures(&self) -> impl Iterator<Item = (StructureId, &Structure)> + '_ {
        self.structures.iter()
    }

    /// Look up a structure.
    #[must_use]
    pub fn structure(&self, id: StructureId) -> Option<&Structure> {
        self.structures.get(id)
    }

    /// Structure occupying a cell.
    #[must_use]
    pub fn structure_at(&self, cell: Cell) -> Option<(StructureId, &Structure)> {
        let id = self.spatial.get(cell)?;
        self.structures.get(id).map(|structure| (id, structure))
    }

    /// Asteroids in slot order.
    pub fn asteroids(&self) -> impl Iterator<Item = (AsteroidId, &Asteroid)> + '_ {
        self.asteroids.iter()
    }

    /// Missiles in slot order.
    pub fn missiles(&self) -> impl Iterator<Item = (MissileId, &Missile)> + '_ {
        self.missiles.iter()
    }

    /// Explosions in slot order.
    pub fn explosions(&self) -> impl Iterator<Item = (ExplosionId, &Explosion)> + '_ {
        self.explosions.iter()
    }

    /// Live asteroid count.
    #[must_use]
    pub fn asteroid_count(&self) -> usize {
        self.asteroids.len()
    }

    /// Turrets standing, charged or not.
    #[must_use]
    pub fn turret_count(&self) -> usize {
        self.count_kind(StructureKind::Turret)
    }

    /// Structures of one kind.
    #[must_use]
    pub fn count_kind(&self, kind: StructureKind) -> usize {
        self.structures
            .iter()
            .filter(|(_, structure)| structure.kind == kind)
            .count()
    }

    fn in_world(&self, point: Point) -> bool {
        point.x >= 0
            && point.y >= 0
            && point.x < self.config.width_units()
            && point.y < self.config.height_units()
    }

    /// Whether a point lies in the reserved strip above the bottom edge.
    #[must_use]
    pub fn in_defense_zone(&self, point: Point) -> bool {
        point.y >= self.config.height_units() - self.config.defense_margin
    }

    // ------------------------------------------------------------------
    // Terrain and structures
    // ------------------------------------------------------------------

    /// Remove every structure and everything in flight.
    pub fn clear_all(&mut self) {
        self.structures.clear();
        self.spatial.clear();
        self.asteroids.clear();
        self.missiles.clear();
        self.explosions.clear();
        self.events.push(GameEvent::TerrainCleared);
    }

    /// Wipe the playfield and lay down fresh terrain.
    pub fn generate_terrain(&mut self) {
        self.clear_all();
        let moonscape = Moonscape::generate(&self.terrain, self.config.columns, &mut self.rng);
        self.install_terrain(moonscape);
    }

    /// Lay a terrain band along the bottom of the playfield.
    pub fn install_terrain(&mut self, moonscape: Moonscape) {
        let offset = self.config.rows as i32 - moonscape.rows() as i32;
        for cell in moonscape.solid_cells() {
            self.insert_structure(
                StructureKind::LunarLand,
                Cell::new(cell.x, cell.y + offset),
                None,
            );
        }
        self.moonscape = moonscape;
    }

    fn insert_structure(
        &mut self,
        kind: StructureKind,
        cell: Cell,
        flyin: Option<Cell>,
    ) -> Option<StructureId> {
        if !self.spatial.is_free(cell) {
            return None;
        }
        let structure = Structure::new(
            kind,
            cell,
            self.config.cell_size,
            self.config.turret_max_charge,
        );
        let position = structure.position;
        let id = self.structures.insert(structure);
        self.spatial.insert(cell, id);
        self.events.push(GameEvent::structure_spawned(
            StructureInfo {
                id,
                kind,
                cell,
                position,
            },
            flyin,
        ));
        Some(id)
    }

    /// Place a structure at a cell, ignoring build requirements.
    ///
    /// Fails only if the cell is taken or off the playfield.
    pub fn place_structure(&mut self, kind: StructureKind, cell: Cell) -> Option<StructureId> {
        self.insert_structure(kind, cell, None)
    }

    /// Whether `kind` could be built at `cell` right now.
    #[must_use]
    pub fn can_build_at(&self, kind: StructureKind, cell: Cell) -> bool {
        let supports = self.config.supports_for(kind);
        self.spatial.is_free(cell)
            && self
                .structure_at(cell.below())
                .is_some_and(|(_, below)| supports.contains(&below.kind))
    }

    /// Build a structure at a random eligible cell.
    ///
    /// `origin` is the puzzle cell the build came from, passed on for the
    /// fly-in animation. Returns `None` when no cell qualifies.
    pub fn build(&mut self, kind: StructureKind, origin: Option<Cell>) -> Option<StructureId> {
        let candidates: Vec<Cell> = (0..self.config.rows as i32)
            .flat_map(|y| (0..self.config.columns as i32).map(move |x| Cell::new(x, y)))
            .filter(|&cell| self.can_build_at(kind, cell))
            .collect();
        let Some(&cell) = candidates.choose(&mut self.rng) else {
            tracing::debug!(?kind, "No eligible build position");
            return None;
        };
        let id = self.insert_structure(kind, cell, origin)?;
        if !kind.is_terrain() {
            self.tally.moonbases_built = self.tally.moonbases_built.saturating_add(1);
        }
        tracing::debug!(?kind, ?cell, "Structure built");
        Some(id)
    }

    fn remove_structure(&mut self, id: StructureId) -> Option<Structure> {
        let structure = self.structures.remove(id)?;
        self.spatial.remove(structure.cell);
        if structure.kind.is_moonbase() {
            self.tally.moonbases_destroyed = self.tally.moonbases_destroyed.saturating_add(1);
        }
        if let Some(event) = GameEvent::structure_destroyed(structure_info(id, &structure)) {
            self.events.push(event);
        }
        Some(structure)
    }

    /// Resolve an impact at a cell. Returns how many structures fell.
    ///
    /// Terrain absorbs the hit. A destroyed slab takes whatever stands on
    /// it down too, all the way up the stack.
    pub fn strike(&mut self, cell: Cell) -> u32 {
        let mut destroyed = 0;
        let mut current = cell;
        while let Some((id, structure)) = self.structure_at(current) {
            let kind = structure.kind;
            if kind.is_terrain() {
                break;
            }
            self.remove_structure(id);
            destroyed += 1;
            if kind != StructureKind::Mooncrete {
                break;
            }
            current = current.above();
        }
        destroyed
    }

    // ------------------------------------------------------------------
    // Mobiles
    // ------------------------------------------------------------------

    /// Launch an asteroid from `start` toward `destination`.
    pub fn spawn_asteroid(&mut self, start: Point, destination: Point) -> AsteroidId {
        let id = self.asteroids.insert(Asteroid::new(start, destination));
        self.events.push(GameEvent::AsteroidSpawned {
            id,
            position: start,
            destination,
        });
        id
    }

    fn remove_asteroid(&mut self, id: AsteroidId, by_player: bool) {
        if let Some(asteroid) = self.asteroids.remove(id) {
            if by_player {
                self.tally.asteroids_destroyed = self.tally.asteroids_destroyed.saturating_add(1);
            }
            self.events.push(GameEvent::AsteroidDestroyed {
                id,
                position: asteroid.position,
                by_player,
            });
        }
    }

    /// Start an explosion at a point.
    pub fn spawn_explosion(&mut self, position: Point) -> ExplosionId {
        let id = self.explosions.insert(Explosion::new(position));
        self.events.push(GameEvent::ExplosionSpawned { id, position });
        id
    }

    /// The ready turret nearest to `target`.
    ///
    /// Targets inside the defence zone are refused. Ties go to the turret
    /// found first.
    #[must_use]
    pub fn closest_ready_turret(&self, target: Point) -> Option<StructureId> {
        if self.in_defense_zone(target) {
            return None;
        }
        self.structures
            .iter()
            .filter(|(_, structure)| structure.is_ready_turret())
            .min_by_key(|(_, structure)| structure.position.distance_squared(target))
            .map(|(id, _)| id)
    }

    /// Pull a point onto the playfield.
    #[must_use]
    pub fn clamp_to_field(&self, point: Point) -> Point {
        Point::new(
            point.x.clamp(0, self.config.width_units() - 1),
            point.y.clamp(0, self.config.height_units() - 1),
        )
    }

    /// Fire the nearest ready turret at `target`, pulled onto the playfield
    /// first. A silent no-op when none is ready.
    pub fn fire_missile(&mut self, target: Point) -> Option<MissileId> {
        let target = self.clamp_to_field(target);
        let Some(turret_id) = self.closest_ready_turret(target) else {
            tracing::trace!(?target, "No ready turret");
            return None;
        };
        let turret = self.structures.get_mut(turret_id)?;
        if let Some(charge) = &mut turret.charge {
            charge.discharge();
        }
        let origin = turret.position;
        let id = self.missiles.insert(Missile::new(origin, target));
        self.events.push(GameEvent::MissileSpawned {
            id,
            origin,
            destination: target,
        });
        Some(id)
    }

    // ------------------------------------------------------------------
    // Step
    // ------------------------------------------------------------------

    /// Advance the arcade one step.
    pub fn step(&mut self, mode: WaveMode) -> StepReport {
        let mut report = StepReport::default();

        self.recharge_turrets();
        if mode == WaveMode::Attack && self.spawn_scheduled_asteroid().is_some() {
            report.asteroids_spawned = 1;
        }
        report.structures_destroyed = self.move_asteroids();
        self.move_missiles();
        report.asteroids_caught = self.grow_explosions();
        report.base_lost = self.turret_count() == 0;

        report
    }

    fn recharge_turrets(&mut self) {
        for (_, structure) in self.structures.iter_mut() {
            if let Some(charge) = &mut structure.charge {
                charge.recharge();
            }
        }
    }

    fn spawn_scheduled_asteroid(&mut self) -> Option<AsteroidId> {
        if self.asteroids.len() >= self.config.asteroid_cap(self.level) {
            return None;
        }
        let width = self.config.width_units();
        let start = Point::new(self.rng.random_range(0..width), 0);
        let destination = match self.pick_target() {
            Some(target) => target,
            None => Point::new(
                self.rng.random_range(0..width),
                self.config.height_units() - 1,
            ),
        };
        Some(self.spawn_asteroid(start, destination))
    }

    /// Centre of a weighted random structure, once targeting has started.
    fn pick_target(&mut self) -> Option<Point> {
        if self.level < self.config.targeting_level
            || !self.rng.random_bool(self.config.targeting_chance)
        {
            return None;
        }
        let half = self.config.cell_size / 2;
        let candidates: Vec<(Point, u32)> = self
            .structures
            .iter()
            .filter_map(|(_, structure)| {
                let weight = self
                    .config
                    .target_weights
                    .iter()
                    .find(|tw| tw.kind == structure.kind)?
                    .weight;
                let centre = Point::new(structure.position.x + half, structure.position.y + half);
                (weight > 0).then_some((centre, weight))
            })
            .collect();
        candidates
            .choose_weighted(&mut self.rng, |&(_, weight)| weight)
            .ok()
            .map(|&(centre, _)| centre)
    }

    fn move_asteroids(&mut self) -> u32 {
        let mut destroyed = 0;
        for id in self.asteroids.handles() {
            let Some(asteroid) = self.asteroids.get_mut(id) else {
                continue;
            };
            let Some(position) = asteroid.advance() else {
                self.remove_asteroid(id, false);
                continue;
            };
            if !self.in_world(position) {
                self.remove_asteroid(id, false);
                continue;
            }
            self.events.push(GameEvent::AsteroidMoved { id, position });

            let cell = position.to_cell(self.config.cell_size);
            if self.spatial.get(cell).is_some() {
                tracing::trace!(?id, ?cell, "Asteroid impact");
                destroyed += self.strike(cell);
                self.remove_asteroid(id, false);
            }
        }
        destroyed
    }

    fn move_missiles(&mut self) {
        let speed = self.config.missile_speed;
        for id in self.missiles.handles() {
            let Some(missile) = self.missiles.get_mut(id) else {
                continue;
            };
            if missile.advance(speed) {
                self.events.push(GameEvent::MissileMoved {
                    id,
                    position: missile.position,
                });
            }
            if missile.is_spent() {
                let position = missile.position;
                self.missiles.remove(id);
                self.events.push(GameEvent::MissileDestroyed { id, position });
                self.spawn_explosion(position);
            }
        }
    }

    fn grow_explosions(&mut self) -> u32 {
        let growth = self.config.explosion_growth();
        let max = self.config.explosion_max_radius();
        let mut caught = 0;

        for id in self.explosions.handles() {
            let Some(explosion) = self.explosions.get_mut(id) else {
                continue;
            };
            let finished = explosion.grow(growth, max);
            let blast = explosion.clone();
            self.events.push(GameEvent::ExplosionGrown {
                id,
                radius: blast.radius,
            });

            let victims: Vec<(AsteroidId, Point)> = self
                .asteroids
                .iter()
                .filter(|(_, asteroid)| blast.catches(asteroid.position))
                .map(|(victim, asteroid)| (victim, asteroid.position))
                .collect();
            for (victim, position) in victims {
                self.remove_asteroid(victim, true);
                // Chain reaction; the new blast starts growing next step.
                self.spawn_explosion(position);
                caught += 1;
            }

            if finished {
                self.explosions.remove(id);
                self.events.push(GameEvent::ExplosionDestroyed { id });
            }
        }
        caught
    }
}

impl MoonbaseBuilder for ArcadeSim {
    fn build_moonbase(&mut self, derived: BlockType, origin: Cell) -> bool {
        match derived.structure_kind() {
            Some(kind) => self.build(kind, Some(origin)).is_some(),
            None => {
                tracing::debug!(?derived, "Block type has no structure");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetWeight;

    fn sim() -> ArcadeSim {
        ArcadeSim::new(ArcadeConfig::default(), MoonscapeConfig::default(), 11)
    }

    fn with_floor() -> ArcadeSim {
        let mut sim = sim();
        for x in 0..20 {
            sim.place_structure(StructureKind::LunarLand, Cell::new(x, 19));
        }
        sim
    }

    fn kinds_destroyed(events: &[GameEvent]) -> Vec<StructureKind> {
        events
            .iter()
            .filter_map(|event| match event {
                GameEvent::MooncreteDestroyed { structure }
                | GameEvent::TurretDestroyed { structure }
                | GameEvent::RadarDestroyed { structure }
                | GameEvent::BuildingDestroyed { structure } => Some(structure.kind),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_generated_terrain_sits_at_bottom() {
        let mut sim = sim();
        sim.generate_terrain();
        let solid = sim.moonscape().solid_count();
        assert_eq!(sim.count_kind(StructureKind::LunarLand), solid);
        for x in 0..20 {
            let (_, land) = sim.structure_at(Cell::new(x, 19)).unwrap();
            assert_eq!(land.kind, StructureKind::LunarLand);
        }
        assert!(sim
            .structures()
            .all(|(_, s)| s.cell.y >= 16 && s.kind.is_terrain()));
    }

    #[test]
    fn test_build_requires_support() {
        let mut sim = with_floor();
        assert!(sim.build(StructureKind::Turret, None).is_none());
        assert_eq!(sim.tally().moonbases_built, 0);

        let slab = sim.build(StructureKind::Mooncrete, Some(Cell::new(1, 1))).unwrap();
        let slab_cell = sim.structure(slab).unwrap().cell;
        assert_eq!(slab_cell.y, 18);

        let turret = sim.build(StructureKind::Turret, None).unwrap();
        assert_eq!(sim.structure(turret).unwrap().cell, slab_cell.above());
        assert_eq!(sim.tally().moonbases_built, 2);

        let events: Vec<_> = sim.drain_events().collect();
        assert!(events.iter().any(|event| matches!(
            event,
            GameEvent::MooncreteSpawned { flyin: Some(origin), .. } if *origin == Cell::new(1, 1)
        )));
    }

    #[test]
    fn test_default_mooncrete_does_not_stack() {
        let mut sim = with_floor();
        for _ in 0..20 {
            let slab = sim.build(StructureKind::Mooncrete, None).unwrap();
            assert_eq!(sim.structure(slab).unwrap().cell.y, 18);
        }
        assert!(sim.build(StructureKind::Mooncrete, None).is_none());
        assert_eq!(sim.count_kind(StructureKind::Mooncrete), 20);
    }

    #[test]
    fn test_build_fails_quietly_when_full() {
        let mut sim = sim();
        assert!(sim.build(StructureKind::Mooncrete, None).is_none());
        assert!(!sim.build_moonbase(BlockType::MooncreteSlab, Cell::new(0, 0)));
        assert!(!sim.build_moonbase(BlockType::WaterBarrel, Cell::new(0, 0)));
    }

    #[test]
    fn test_spawn_cap() {
        let mut sim = sim();
        sim.set_level(0);
        for _ in 0..10 {
            sim.step(WaveMode::Attack);
        }
        assert_eq!(sim.asteroid_count(), 2);
    }

    #[test]
    fn test_calm_waves_spawn_nothing() {
        let mut sim = sim();
        for _ in 0..10 {
            sim.step(WaveMode::Calm);
        }
        assert_eq!(sim.asteroid_count(), 0);
    }

    #[test]
    fn test_targeted_spawn_aims_at_structure_centre() {
        let config = ArcadeConfig {
            targeting_chance: 1.0,
            target_weights: vec![TargetWeight {
                kind: StructureKind::Radar,
                weight: 1,
            }],
            ..ArcadeConfig::default()
        };
        let mut sim = ArcadeSim::new(config, MoonscapeConfig::default(), 5);
        sim.set_level(5);
        sim.place_structure(StructureKind::Radar, Cell::new(3, 10));
        sim.step(WaveMode::Attack);
        let (_, rock) = sim.asteroids().next().unwrap();
        assert_eq!(rock.destination, Point::new(17, 52));
    }

    #[test]
    fn test_terrain_absorbs_impact() {
        let mut sim = with_floor();
        sim.spawn_asteroid(Point::new(2, 90), Point::new(2, 99));
        for _ in 0..5 {
            sim.step(WaveMode::Calm);
        }
        assert_eq!(sim.asteroid_count(), 0);
        assert_eq!(*sim.tally(), WaveTally::default());
        assert!(sim.structure_at(Cell::new(0, 19)).is_some());
    }

    #[test]
    fn test_direct_turret_hit_does_not_cascade_down() {
        let mut sim = with_floor();
        sim.place_structure(StructureKind::Mooncrete, Cell::new(4, 18));
        sim.place_structure(StructureKind::Turret, Cell::new(4, 17));
        sim.drain_events().for_each(drop);

        assert_eq!(sim.strike(Cell::new(4, 17)), 1);
        assert!(sim.structure_at(Cell::new(4, 18)).is_some());
        let events: Vec<_> = sim.drain_events().collect();
        assert_eq!(kinds_destroyed(&events), vec![StructureKind::Turret]);
        assert_eq!(sim.tally().moonbases_destroyed, 1);
    }

    #[test]
    fn test_slab_loss_cascades_up_the_stack() {
        let mut sim = with_floor();
        sim.place_structure(StructureKind::Mooncrete, Cell::new(4, 18));
        sim.place_structure(StructureKind::Mooncrete, Cell::new(4, 17));
        sim.place_structure(StructureKind::Radar, Cell::new(4, 16));
        sim.drain_events().for_each(drop);

        assert_eq!(sim.strike(Cell::new(4, 18)), 3);
        let events: Vec<_> = sim.drain_events().collect();
        assert_eq!(
            kinds_destroyed(&events),
            vec![
                StructureKind::Mooncrete,
                StructureKind::Mooncrete,
                StructureKind::Radar
            ]
        );
        // Slabs are not moon bases.
        assert_eq!(sim.tally().moonbases_destroyed, 1);
    }

    #[test]
    fn test_fire_refused_in_defense_zone() {
        let mut sim = sim();
        sim.place_structure(StructureKind::Turret, Cell::new(10, 18));
        assert!(sim.closest_ready_turret(Point::new(10, 90)).is_none());
        assert!(sim.fire_missile(Point::new(10, 95)).is_none());
        assert!(sim.closest_ready_turret(Point::new(10, 89)).is_some());
    }

    #[test]
    fn test_fire_at_far_targets_is_clamped() {
        let mut sim = sim();
        let turret = sim.place_structure(StructureKind::Turret, Cell::new(10, 18)).unwrap();

        // Off the bottom edge lands in the defence zone.
        assert!(sim.fire_missile(Point::new(0, i32::MAX)).is_none());
        assert!(sim.structure(turret).unwrap().is_ready_turret());

        let id = sim.fire_missile(Point::new(i32::MIN, 0)).unwrap();
        let missile = sim.missiles().find(|(mid, _)| *mid == id).unwrap().1;
        assert_eq!(missile.destination, Point::new(0, 0));
        let events: Vec<GameEvent> = sim.drain_events().collect();
        assert!(events.contains(&GameEvent::MissileSpawned {
            id,
            origin: Point::new(50, 90),
            destination: Point::new(0, 0),
        }));

        for _ in 0..40 {
            sim.step(WaveMode::Calm);
        }
        assert_eq!(sim.missiles().count(), 0);
    }

    #[test]
    fn test_closest_turret_wins() {
        let mut sim = sim();
        let far = sim.place_structure(StructureKind::Turret, Cell::new(0, 10)).unwrap();
        let near = sim.place_structure(StructureKind::Turret, Cell::new(15, 10)).unwrap();
        assert_eq!(sim.closest_ready_turret(Point::new(80, 40)), Some(near));
        sim.fire_missile(Point::new(80, 40));
        assert_eq!(sim.closest_ready_turret(Point::new(80, 40)), Some(far));
    }

    #[test]
    fn test_turret_recharges_after_firing() {
        let mut sim = sim();
        let turret = sim.place_structure(StructureKind::Turret, Cell::new(10, 18)).unwrap();
        sim.fire_missile(Point::new(50, 40)).unwrap();
        assert_eq!(sim.structure(turret).unwrap().charge.unwrap().current(), 0);
        for _ in 0..39 {
            sim.step(WaveMode::Calm);
        }
        assert!(!sim.structure(turret).unwrap().is_ready_turret());
        sim.step(WaveMode::Calm);
        assert!(sim.structure(turret).unwrap().is_ready_turret());
    }

    #[test]
    fn test_missile_detonates_at_destination() {
        let mut sim = sim();
        sim.place_structure(StructureKind::Turret, Cell::new(10, 18));
        sim.fire_missile(Point::new(50, 40)).unwrap();
        for _ in 0..9 {
            sim.step(WaveMode::Calm);
        }
        assert_eq!(sim.missiles().count(), 1);
        sim.step(WaveMode::Calm);
        assert_eq!(sim.missiles().count(), 0);
        let (_, blast) = sim.explosions().next().unwrap();
        assert_eq!(blast.position, Point::new(50, 40));
    }

    #[test]
    fn test_explosion_catches_and_chains() {
        let mut sim = sim();
        sim.spawn_explosion(Point::new(20, 25));
        sim.spawn_asteroid(Point::new(20, 20), Point::new(20, 99));
        for _ in 0..4 {
            sim.step(WaveMode::Calm);
        }
        assert_eq!(sim.asteroid_count(), 1);
        let report = sim.step(WaveMode::Calm);
        assert_eq!(report.asteroids_caught, 1);
        assert_eq!(sim.asteroid_count(), 0);
        assert_eq!(sim.tally().asteroids_destroyed, 1);
        assert_eq!(sim.explosions().count(), 2);
    }

    #[test]
    fn test_explosion_expires_at_cap() {
        let mut sim = sim();
        sim.spawn_explosion(Point::new(50, 50));
        // 0.2 per step up to 6
        for _ in 0..29 {
            sim.step(WaveMode::Calm);
        }
        assert_eq!(sim.explosions().count(), 1);
        sim.step(WaveMode::Calm);
        sim.step(WaveMode::Calm);
        assert_eq!(sim.explosions().count(), 0);
    }

    #[test]
    fn test_take_tally_resets() {
        let mut sim = with_floor();
        sim.build(StructureKind::Mooncrete, None);
        assert_eq!(sim.take_tally().moonbases_built, 1);
        assert_eq!(*sim.tally(), WaveTally::default());
    }
}
