//! Simulation benchmarks for mooncrete_core.
//!
//! Run with: `cargo bench -p mooncrete_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use mooncrete_core::prelude::*;

fn quiet_game(seed: u64) -> MoonGame {
    let config = GameConfig {
        auto_help: false,
        ..GameConfig::default()
    }
    .with_seed(seed);
    let mut game = MoonGame::new(config).expect("default config is valid");
    game.begin();
    game
}

/// Puzzle ticks with a populated board.
pub fn puzzle_benchmark(c: &mut Criterion) {
    c.bench_function("puzzle_tick_1000", |b| {
        b.iter_batched(
            || {
                let mut engine = PuzzleEngine::new(PuzzleConfig::default(), 42);
                engine.drop_flotsam(6);
                engine
            },
            |mut engine| {
                let mut sink = ArcadeSim::new(
                    ArcadeConfig::default(),
                    MoonscapeConfig::default(),
                    42,
                );
                for _ in 0..1000 {
                    if engine.tick(&mut sink) == StepOutcome::BoardFull {
                        engine.clear();
                    }
                    engine.drain_events().for_each(drop);
                    sink.drain_events().for_each(drop);
                }
                black_box(engine.grid().occupied())
            },
            BatchSize::SmallInput,
        );
    });
}

/// Arcade steps under a steady attack.
pub fn arcade_benchmark(c: &mut Criterion) {
    c.bench_function("arcade_step_1000", |b| {
        b.iter_batched(
            || {
                let mut sim = ArcadeSim::new(
                    ArcadeConfig::default(),
                    MoonscapeConfig::default(),
                    7,
                );
                sim.set_level(8);
                sim.generate_terrain();
                sim
            },
            |mut sim| {
                for step in 0..1000u32 {
                    sim.step(WaveMode::Attack);
                    if step % 20 == 0 {
                        sim.fire_missile(Point::new(50, 40));
                    }
                    sim.drain_events().for_each(drop);
                }
                black_box(sim.tally().asteroids_destroyed)
            },
            BatchSize::SmallInput,
        );
    });
}

/// The whole game ticked through phase 1 and 2.
pub fn game_benchmark(c: &mut Criterion) {
    c.bench_function("game_ticks_60s", |b| {
        b.iter_batched(
            || quiet_game(3),
            |mut game| {
                for now in (0..60_000).step_by(16) {
                    game.tick(now);
                }
                black_box(game.state_hash())
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, puzzle_benchmark, arcade_benchmark, game_benchmark);
criterion_main!(benches);
