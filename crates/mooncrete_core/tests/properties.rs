//! Property tests for the invariants that must hold on every tick.

use mooncrete_core::moonscape::Moonscape;
use mooncrete_core::prelude::*;
use mooncrete_core::puzzle::ShapeTemplate;
use mooncrete_test_utils::determinism::strategies::{
    arb_point, arb_rotation, arb_script, arb_seed,
};
use mooncrete_test_utils::determinism::{
    find_first_divergence, play_script, verify_determinism, SCRIPT_TICK_MS,
};
use mooncrete_test_utils::fixtures::{build_on_slab, flat_arcade, started_game};
use mooncrete_test_utils::proptest::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg32;

fn piece_overlaps_board(game: &MoonGame) -> bool {
    game.active_piece().is_some_and(|piece| {
        piece
            .cells()
            .any(|piece_cell| !game.board().is_vacant(piece_cell.cell))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_piece_never_overlaps_board(seed in arb_seed(), script in arb_script(600)) {
        let mut game = started_game(seed);
        for (index, input) in script.iter().enumerate() {
            game.tick((index as u64 + 1) * SCRIPT_TICK_MS);
            input.apply(&mut game);
            prop_assert!(!piece_overlaps_board(&game), "overlap at step {}", index);
        }
    }

    #[test]
    fn prop_same_seed_same_script_same_game(seed in arb_seed(), script in arb_script(300)) {
        prop_assert_eq!(find_first_divergence(|| started_game(seed), &script), None);
    }

    #[test]
    fn prop_replayed_script_hashes_identically(seed in arb_seed(), script in arb_script(300)) {
        let result = verify_determinism(
            3,
            1,
            || started_game(seed),
            |game, _| play_script(game, &script),
            MoonGame::state_hash,
        );
        prop_assert!(result.is_deterministic, "hashes {:?}", result.hashes);
    }

    #[test]
    fn prop_terrain_never_floats(
        seed in arb_seed(),
        columns in 1u32..40,
        ruggedness in 0.0f64..=1.0,
    ) {
        let config = MoonscapeConfig {
            ruggedness,
            ..MoonscapeConfig::default()
        };
        let mut rng = Pcg32::seed_from_u64(seed);
        let scape = Moonscape::generate(&config, columns, &mut rng);
        prop_assert!(scape.is_grounded());
        prop_assert!(scape.solid_count() >= columns as usize);
    }

    #[test]
    fn prop_turret_charge_stays_in_range(
        seed in arb_seed(),
        shots in prop::collection::vec((arb_point(), 0usize..12), 1..30),
    ) {
        let mut sim = flat_arcade(seed);
        build_on_slab(&mut sim, 3, StructureKind::Turret);
        build_on_slab(&mut sim, 16, StructureKind::Turret);
        let max = sim.config().turret_max_charge;

        for (target, wait) in shots {
            sim.fire_missile(target);
            for _ in 0..wait {
                sim.step(WaveMode::Calm);
            }
            for (_, structure) in sim.structures() {
                if let Some(charge) = structure.charge {
                    prop_assert!(charge.current() <= max);
                    prop_assert_eq!(charge.is_ready(), charge.current() == max);
                }
            }
        }
    }

    #[test]
    fn prop_four_turns_round_trip(
        template_index in 0usize..7,
        rotation in arb_rotation(),
        blocks in prop::collection::vec(prop::sample::select(BlockType::ALL.to_vec()), 4),
    ) {
        let mut fill = blocks.into_iter().cycle();
        let shape = Shape::from_template(ShapeTemplate::ALL[template_index], || {
            fill.next().unwrap_or(BlockType::CalciumBarrel)
        });
        let turned = (0..4).fold(shape.clone(), |s, _| s.rotated(rotation));
        prop_assert_eq!(turned, shape);
    }

    #[test]
    fn prop_move_left_at_edge_is_idempotent(presses in 1usize..40) {
        let mut engine = PuzzleEngine::new(PuzzleConfig::default(), 1);
        engine.spawn(Shape::horizontal(&[BlockType::WaterBarrel, BlockType::CalciumBarrel]));
        while engine.move_left() {}
        let parked = engine.active_piece().cloned();
        for _ in 0..presses {
            prop_assert!(!engine.move_left());
        }
        prop_assert_eq!(engine.active_piece().cloned(), parked);
    }
}
