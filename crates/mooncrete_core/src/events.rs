//! Typed game notifications and the fan-out bus that delivers them.
//!
//! Subsystems never call listeners directly. Each one pushes
//! [`GameEvent`]s into its own [`EventQueue`] while it mutates state, and
//! the game-flow controller publishes the queued events on the
//! [`EventBus`] once the tick's writes are complete. Listeners therefore
//! always observe a consistent simulation.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

use crate::arcade::{AsteroidId, ExplosionId, MissileId, StructureId, StructureKind};
use crate::blocks::BlockType;
use crate::math::{fixed_serde, Cell, Fixed, Point};
use crate::score::WaveTally;
use crate::state::GameState;

/// One occupied cell of the active puzzle piece, in board coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PieceCell {
    /// Board cell.
    pub cell: Cell,
    /// Block in that cell.
    pub block: BlockType,
}

/// What a view needs to know about a moon base structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct StructureInfo {
    /// Stable handle of the structure.
    pub id: StructureId,
    /// Structure kind.
    pub kind: StructureKind,
    /// Arcade grid cell.
    pub cell: Cell,
    /// Top-left corner in world units.
    pub position: Point,
}

/// Every notification the simulation emits.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    /// The current state changed.
    StateChanged {
        /// New current state.
        state: GameState,
    },
    /// The state stack emptied; the tick loop should stop.
    Quit,
    /// A fresh game was started.
    ResetGame,
    /// The phase countdown ticked.
    TimeLeft {
        /// Seconds remaining in the phase.
        seconds: u32,
    },

    /// A new active piece appeared at the top of the board.
    PieceSpawned {
        /// Occupied cells of the piece.
        cells: Vec<PieceCell>,
    },
    /// The active piece moved or rotated.
    PieceMoved {
        /// Occupied cells after the move.
        cells: Vec<PieceCell>,
    },
    /// A block was placed on the board (piece merge or flotsam drop).
    BlockSpawned {
        /// Board cell.
        cell: Cell,
        /// Block type.
        block: BlockType,
    },
    /// A board block fell one row.
    BlockMoved {
        /// Previous cell.
        from: Cell,
        /// New cell.
        to: Cell,
        /// Block type.
        block: BlockType,
    },
    /// A board block was removed.
    BlockDestroyed {
        /// Board cell.
        cell: Cell,
        /// Block type.
        block: BlockType,
    },
    /// Two adjacent blocks paired into a derived type.
    BlocksPaired {
        /// What they became.
        derived: BlockType,
        /// Source cell of the sweep.
        first: Cell,
        /// Its partner cell.
        second: Cell,
    },
    /// A full row was cleared.
    RowCleared {
        /// Row index.
        row: i32,
    },
    /// A new piece could not fit: the puzzle is over.
    BoardFull,

    /// All terrain and structures were removed.
    TerrainCleared,
    /// A piece of lunar land was placed.
    TerrainPieceSpawned {
        /// The terrain structure.
        structure: StructureInfo,
    },
    /// A mooncrete slab was built.
    MooncreteSpawned {
        /// The slab.
        structure: StructureInfo,
        /// Puzzle cell it was paired at, for fly-in animation.
        flyin: Option<Cell>,
    },
    /// A mooncrete slab was destroyed.
    MooncreteDestroyed {
        /// The slab.
        structure: StructureInfo,
    },
    /// A turret was built.
    TurretSpawned {
        /// The turret.
        structure: StructureInfo,
        /// Puzzle cell it was paired at.
        flyin: Option<Cell>,
    },
    /// A turret was destroyed.
    TurretDestroyed {
        /// The turret.
        structure: StructureInfo,
    },
    /// A radar was built.
    RadarSpawned {
        /// The radar.
        structure: StructureInfo,
        /// Puzzle cell it was paired at.
        flyin: Option<Cell>,
    },
    /// A radar was destroyed.
    RadarDestroyed {
        /// The radar.
        structure: StructureInfo,
    },
    /// A building was built.
    BuildingSpawned {
        /// The building.
        structure: StructureInfo,
        /// Puzzle cell it was paired at.
        flyin: Option<Cell>,
    },
    /// A building was destroyed.
    BuildingDestroyed {
        /// The building.
        structure: StructureInfo,
    },

    /// An asteroid entered the playfield.
    AsteroidSpawned {
        /// Asteroid handle.
        id: AsteroidId,
        /// Spawn position.
        position: Point,
        /// Where it is headed.
        destination: Point,
    },
    /// An asteroid advanced along its trajectory.
    AsteroidMoved {
        /// Asteroid handle.
        id: AsteroidId,
        /// New position.
        position: Point,
    },
    /// An asteroid was removed.
    AsteroidDestroyed {
        /// Asteroid handle.
        id: AsteroidId,
        /// Last position.
        position: Point,
        /// Whether the player's defences caught it.
        by_player: bool,
    },
    /// A turret fired.
    MissileSpawned {
        /// Missile handle.
        id: MissileId,
        /// Firing turret position.
        origin: Point,
        /// Detonation point.
        destination: Point,
    },
    /// A missile advanced.
    MissileMoved {
        /// Missile handle.
        id: MissileId,
        /// New position.
        position: Point,
    },
    /// A missile reached its destination.
    MissileDestroyed {
        /// Missile handle.
        id: MissileId,
        /// Final position.
        position: Point,
    },
    /// An explosion started.
    ExplosionSpawned {
        /// Explosion handle.
        id: ExplosionId,
        /// Centre.
        position: Point,
    },
    /// An explosion grew.
    ExplosionGrown {
        /// Explosion handle.
        id: ExplosionId,
        /// New radius in world units.
        #[serde(with = "fixed_serde")]
        radius: Fixed,
    },
    /// An explosion fizzled out.
    ExplosionDestroyed {
        /// Explosion handle.
        id: ExplosionId,
    },
    /// The wave bonus was added to the score.
    WaveScored {
        /// Counters the bonus was computed from.
        tally: WaveTally,
        /// Points awarded (may be negative).
        bonus: i64,
        /// Score after the bonus.
        score: i64,
    },
}

impl GameEvent {
    /// The typed spawn event for a newly placed structure.
    #[must_use]
    pub fn structure_spawned(structure: StructureInfo, flyin: Option<Cell>) -> Self {
        match structure.kind {
            StructureKind::LunarLand => GameEvent::TerrainPieceSpawned { structure },
            StructureKind::Mooncrete => GameEvent::MooncreteSpawned { structure, flyin },
            StructureKind::Turret => GameEvent::TurretSpawned { structure, flyin },
            StructureKind::Radar => GameEvent::RadarSpawned { structure, flyin },
            StructureKind::Building => GameEvent::BuildingSpawned { structure, flyin },
        }
    }

    /// The typed destroy event for a structure. Terrain is never destroyed.
    #[must_use]
    pub fn structure_destroyed(structure: StructureInfo) -> Option<Self> {
        match structure.kind {
            StructureKind::LunarLand => None,
            StructureKind::Mooncrete => Some(GameEvent::MooncreteDestroyed { structure }),
            StructureKind::Turret => Some(GameEvent::TurretDestroyed { structure }),
            StructureKind::Radar => Some(GameEvent::RadarDestroyed { structure }),
            StructureKind::Building => Some(GameEvent::BuildingDestroyed { structure }),
        }
    }

    /// High-frequency events that are only worth tracing.
    #[must_use]
    pub const fn is_noisy(&self) -> bool {
        matches!(
            self,
            GameEvent::TimeLeft { .. }
                | GameEvent::PieceMoved { .. }
                | GameEvent::BlockMoved { .. }
                | GameEvent::AsteroidMoved { .. }
                | GameEvent::MissileMoved { .. }
                | GameEvent::ExplosionGrown { .. }
        )
    }
}

/// Something that wants to hear about game events.
pub trait EventListener {
    /// Called once per published event, in publish order.
    fn notify(&mut self, event: &GameEvent);
}

/// Shared listeners: keep one clone, hand the other to the bus.
impl<L: EventListener> EventListener for Rc<RefCell<L>> {
    fn notify(&mut self, event: &GameEvent) {
        self.borrow_mut().notify(event);
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

/// Publish/subscribe fan-out to registered listeners.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(ListenerId, Box<dyn EventListener>)>,
    next_id: u32,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl EventBus {
    /// Create a bus with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Listeners are notified in registration order.
    pub fn subscribe<L: EventListener + 'static>(&mut self, listener: L) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Deliver one event to every listener.
    pub fn publish(&mut self, event: &GameEvent) {
        if event.is_noisy() {
            tracing::trace!(?event, "publish");
        } else {
            tracing::debug!(?event, "publish");
        }
        for (_, listener) in &mut self.listeners {
            listener.notify(event);
        }
    }

    /// Deliver a batch of events in order.
    pub fn publish_all<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = GameEvent>,
    {
        for event in events {
            self.publish(&event);
        }
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listeners are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

/// Outbox a subsystem fills while it mutates state.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Vec<GameEvent>,
}

impl EventQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event.
    pub fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take every queued event, oldest first.
    pub fn drain(&mut self) -> std::vec::Drain<'_, GameEvent> {
        self.events.drain(..)
    }

    /// Queued events, oldest first.
    #[must_use]
    pub fn as_slice(&self) -> &[GameEvent] {
        &self.events
    }

    /// Number of queued events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// A listener that records everything it hears.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<GameEvent>,
}

impl EventLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A log shared between the bus and the caller.
    #[must_use]
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Recorded events, oldest first.
    #[must_use]
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Count recorded events matching a predicate.
    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&GameEvent) -> bool,
    {
        self.events.iter().filter(|event| predicate(event)).count()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

impl EventListener for EventLog {
    fn notify(&mut self, event: &GameEvent) {
        self.events.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter(usize);

    impl EventListener for Counter {
        fn notify(&mut self, _event: &GameEvent) {
            self.0 += 1;
        }
    }

    #[test]
    fn test_fan_out_in_order() {
        let mut bus = EventBus::new();
        let log_a = EventLog::shared();
        let log_b = EventLog::shared();
        bus.subscribe(Rc::clone(&log_a));
        bus.subscribe(Rc::clone(&log_b));

        bus.publish_all([GameEvent::ResetGame, GameEvent::RowCleared { row: 3 }]);

        for log in [&log_a, &log_b] {
            assert_eq!(
                log.borrow().events(),
                &[GameEvent::ResetGame, GameEvent::RowCleared { row: 3 }]
            );
        }
    }

    #[test]
    fn test_unsubscribe() {
        let mut bus = EventBus::new();
        let counter = Rc::new(RefCell::new(Counter(0)));
        let id = bus.subscribe(Rc::clone(&counter));
        bus.publish(&GameEvent::Quit);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(&GameEvent::Quit);

        assert_eq!(counter.borrow().0, 1);
        assert!(bus.is_empty());
    }

    #[test]
    fn test_queue_drain_empties() {
        let mut queue = EventQueue::new();
        queue.push(GameEvent::BoardFull);
        queue.push(GameEvent::TerrainCleared);
        let drained: Vec<_> = queue.drain().collect();
        assert_eq!(drained.len(), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_noisy_classification() {
        assert!(GameEvent::TimeLeft { seconds: 3 }.is_noisy());
        assert!(!GameEvent::BoardFull.is_noisy());
    }

    #[test]
    fn test_log_count_and_take() {
        let mut log = EventLog::new();
        log.notify(&GameEvent::RowCleared { row: 1 });
        log.notify(&GameEvent::RowCleared { row: 2 });
        log.notify(&GameEvent::BoardFull);
        assert_eq!(
            log.count(|e| matches!(e, GameEvent::RowCleared { .. })),
            2
        );
        assert_eq!(log.take().len(), 3);
        assert!(log.events().is_empty());
    }
}
