//! End-to-end scenarios driven through the public API.
//!
//! Each test sets up a small board or playfield by hand, runs the engine
//! and checks the resulting state and the events it queued.

use mooncrete_core::prelude::*;
use mooncrete_test_utils::determinism::{play_script, verify_determinism, PlayerInput};
use mooncrete_test_utils::fixtures::{build_on_slab, flat_arcade, started_game, RecordingBuilder};

fn engine() -> PuzzleEngine {
    PuzzleEngine::new(PuzzleConfig::default(), 11)
}

fn arcade() -> ArcadeSim {
    ArcadeSim::new(ArcadeConfig::default(), MoonscapeConfig::default(), 11)
}

// =============================================================================
// Puzzle
// =============================================================================

#[test]
fn horizontal_pair_falls_to_the_floor_and_merges() {
    let mut engine = engine();
    let shape = Shape::horizontal(&[BlockType::CalciumBarrel, BlockType::WaterBarrel]);
    assert_eq!(engine.spawn(shape), SpawnOutcome::Spawned);

    let piece = engine.active_piece().unwrap();
    assert_eq!(piece.origin, Cell::new(4, 0));

    let mut steps = 0;
    while engine.step() == StepOutcome::Dropped {
        steps += 1;
        assert!(steps < 20, "piece never landed");
    }
    assert_eq!(steps, 9);

    let grid = engine.grid();
    assert_eq!(grid.get(Cell::new(4, 9)), Some(BlockType::CalciumBarrel));
    assert_eq!(grid.get(Cell::new(5, 9)), Some(BlockType::WaterBarrel));
    assert_eq!(grid.occupied(), 2);
}

#[test]
fn adjacent_components_pair_into_one_build_request() {
    let mut engine = engine();
    assert!(engine.place_block(Cell::new(2, 3), BlockType::CalciumBarrel));
    assert!(engine.place_block(Cell::new(3, 3), BlockType::WaterBarrel));

    let mut builder = RecordingBuilder::accepting();
    assert_eq!(engine.pairing_sweep(&mut builder), 1);

    assert!(engine.grid().is_vacant(Cell::new(2, 3)));
    assert!(engine.grid().is_vacant(Cell::new(3, 3)));
    assert_eq!(builder.requests.len(), 1);
    assert_eq!(builder.count(BlockType::MooncreteSlab), 1);

    let events: Vec<GameEvent> = engine.drain_events().collect();
    let destroyed = events
        .iter()
        .filter(|e| matches!(e, GameEvent::BlockDestroyed { .. }))
        .count();
    assert_eq!(destroyed, 2);
}

#[test]
fn spawn_into_occupied_top_reports_board_full() {
    let mut engine = engine();
    for x in 0..10 {
        assert!(engine.place_block(Cell::new(x, 0), BlockType::MoonRocks));
    }
    engine.drain_events().for_each(drop);

    let shape = Shape::horizontal(&[BlockType::CalciumBarrel, BlockType::WaterBarrel]);
    assert_eq!(engine.spawn(shape), SpawnOutcome::BoardFull);
    assert!(engine.active_piece().is_none());
    assert_eq!(engine.grid().occupied(), 10);

    let events: Vec<GameEvent> = engine.drain_events().collect();
    assert_eq!(events, vec![GameEvent::BoardFull]);
}

#[test]
fn move_left_at_the_edge_is_a_no_op() {
    let mut engine = engine();
    engine.spawn(Shape::horizontal(&[BlockType::CalciumBarrel]));
    while engine.move_left() {}
    let at_edge = engine.active_piece().unwrap().clone();
    assert_eq!(at_edge.origin.x, 0);

    for _ in 0..10 {
        assert!(!engine.move_left());
    }
    assert_eq!(engine.active_piece(), Some(&at_edge));
}

#[test]
fn four_clockwise_turns_restore_every_template() {
    for template in mooncrete_core::puzzle::ShapeTemplate::ALL {
        let shape = Shape::from_template(template, || BlockType::RadarDish);
        let turned = (0..4).fold(shape.clone(), |s, _| s.rotated(Rotation::Clockwise));
        assert_eq!(turned, shape, "{template:?}");
    }
}

// =============================================================================
// Arcade
// =============================================================================

#[test]
fn firing_discharges_the_only_turret() {
    let mut sim = arcade();
    let turret = sim
        .place_structure(StructureKind::Turret, Cell::new(10, 18))
        .unwrap();
    assert_eq!(sim.structure(turret).unwrap().position, Point::new(50, 90));

    let missile = sim.fire_missile(Point::new(10, 10)).unwrap();

    let charge = sim.structure(turret).unwrap().charge.unwrap();
    assert_eq!(charge.current(), 0);
    let missiles: Vec<_> = sim.missiles().collect();
    assert_eq!(missiles.len(), 1);
    assert_eq!(missiles[0].0, missile);
    assert_eq!(missiles[0].1.destination, Point::new(10, 10));

    // Nothing else is ready.
    assert!(sim.fire_missile(Point::new(20, 20)).is_none());
}

#[test]
fn slab_hit_brings_down_the_turret_on_top() {
    let mut sim = arcade();
    sim.place_structure(StructureKind::Mooncrete, Cell::new(10, 15))
        .unwrap();
    sim.place_structure(StructureKind::Turret, Cell::new(10, 14))
        .unwrap();
    sim.spawn_asteroid(Point::new(49, 77), Point::new(60, 77));
    sim.drain_events().for_each(drop);

    let report = sim.step(WaveMode::Calm);

    assert_eq!(report.structures_destroyed, 2);
    assert!(sim.structure_at(Cell::new(10, 15)).is_none());
    assert!(sim.structure_at(Cell::new(10, 14)).is_none());
    assert_eq!(sim.asteroid_count(), 0);

    let events: Vec<GameEvent> = sim.drain_events().collect();
    let slab_lost = events
        .iter()
        .filter(|e| matches!(e, GameEvent::MooncreteDestroyed { .. }))
        .count();
    let turret_lost = events
        .iter()
        .filter(|e| matches!(e, GameEvent::TurretDestroyed { .. }))
        .count();
    assert_eq!((slab_lost, turret_lost), (1, 1));
    assert_eq!(sim.tally().moonbases_destroyed, 1);
}

#[test]
fn terrain_absorbs_impacts() {
    let mut sim = flat_arcade(3);
    let before = sim.count_kind(StructureKind::LunarLand);
    assert_eq!(before, 20);
    sim.spawn_asteroid(Point::new(52, 0), Point::new(52, 99));

    for _ in 0..200 {
        sim.step(WaveMode::Calm);
    }

    assert_eq!(sim.asteroid_count(), 0);
    assert_eq!(sim.count_kind(StructureKind::LunarLand), before);
    assert_eq!(sim.tally().asteroids_destroyed, 0);
}

#[test]
fn built_turret_on_slab_protects_the_base() {
    let mut sim = flat_arcade(5);
    build_on_slab(&mut sim, 4, StructureKind::Turret);
    assert_eq!(sim.turret_count(), 1);
    assert!(!sim.step(WaveMode::Calm).base_lost);
}

#[test]
fn missile_blast_catches_a_nearby_asteroid() {
    let mut sim = flat_arcade(9);
    build_on_slab(&mut sim, 10, StructureKind::Turret);
    sim.spawn_asteroid(Point::new(50, 30), Point::new(50, 94));
    sim.fire_missile(Point::new(50, 40)).unwrap();

    let mut caught = 0;
    for _ in 0..60 {
        caught += sim.step(WaveMode::Calm).asteroids_caught;
    }
    assert_eq!(caught, 1);
    assert_eq!(sim.tally().asteroids_destroyed, 1);
}

// =============================================================================
// Game flow
// =============================================================================

#[test]
fn quiet_game_plays_a_puzzle_phase() {
    let mut game = started_game(21);
    let log = EventLog::shared();
    game.subscribe(std::rc::Rc::clone(&log));

    for now in (0..10_000).step_by(50) {
        game.tick(now);
    }

    assert_eq!(game.current_state(), Some(GameState::Phase1));
    let log = log.borrow();
    assert!(log.count(|e| matches!(e, GameEvent::PieceSpawned { .. })) >= 1);
    assert!(log.count(|e| matches!(e, GameEvent::TimeLeft { .. })) >= 9);
}

#[test]
fn reprieve_scores_the_wave_and_resets_the_tally() {
    let mut game = started_game(17);
    let log = EventLog::shared();
    game.subscribe(std::rc::Rc::clone(&log));

    let arcade = game.arcade_mut();
    for _ in 0..3 {
        arcade.build(StructureKind::Mooncrete, None).unwrap();
    }
    let turret = arcade.build(StructureKind::Turret, None).unwrap();
    let turret_cell = arcade.structure(turret).unwrap().cell;
    assert_eq!(arcade.strike(turret_cell), 1);

    game.request_next_phase();
    game.request_next_phase();
    game.request_next_phase();
    assert_eq!(game.current_state(), Some(GameState::Reprieve));
    assert_eq!(game.scoreboard().score, 0);
    assert_eq!(game.tally().moonbases_built, 4);
    assert_eq!(game.tally().moonbases_destroyed, 1);

    game.request_next_phase();
    assert_eq!(game.current_state(), Some(GameState::LevelDone));
    let scoring = ScoringConfig::default();
    let expected = 4 * scoring.built_points - scoring.destroyed_penalty;
    assert_eq!(expected, 17);
    assert_eq!(game.scoreboard().score, expected);
    assert_eq!(*game.tally(), WaveTally::default());
    assert_eq!(
        log.borrow()
            .count(|e| matches!(e, GameEvent::WaveScored { bonus, .. } if *bonus == expected)),
        1
    );

    game.request_next_phase();
    assert_eq!(game.current_state(), Some(GameState::Phase1));
    assert_eq!(game.scoreboard().level, 2);
    assert_eq!(game.scoreboard().score, expected);
    assert_eq!(*game.tally(), WaveTally::default());
}

#[test]
fn scripted_level_replays_identically() {
    let script: Vec<PlayerInput> = (0..600)
        .map(|i| match i % 50 {
            0 => PlayerInput::Next,
            7 => PlayerInput::Rotate(Rotation::Clockwise),
            13 => PlayerInput::Left,
            21 => PlayerInput::Fire(Point::new(40, 30)),
            _ => PlayerInput::Wait,
        })
        .collect();
    let result = verify_determinism(
        3,
        1,
        || started_game(31),
        |game, _| play_script(game, &script),
        MoonGame::state_hash,
    );
    result.assert_deterministic();
}
