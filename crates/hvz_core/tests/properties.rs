//! Property-based tests for the simulation invariants.

use hvz_core::prelude::*;
use hvz_core::rng::SimRng;
use hvz_core::systems::{approach_point, in_attack_range, random_point, step_toward};
use hvz_test_utils::determinism::strategies::{
    arb_point_in, arb_pointer, arb_spawns, arb_speed, arb_world,
};
use hvz_test_utils::determinism::verify_simulation_determinism;
use hvz_test_utils::fixtures::{empty, HUMAN};
use proptest::prelude::*;

fn populate(world: WorldSize, seed: u64, spawns: &[(Archetype, Vec2Fixed)]) -> Simulation {
    let mut sim = empty(world, SimulationConfig::default().with_seed(seed));
    for &(archetype, at) in spawns {
        let owner = match archetype {
            Archetype::Soldier => HUMAN,
            Archetype::Zombie => PlayerId::AI,
        };
        sim.spawn_unit(archetype, Some(owner), at).unwrap();
    }
    sim
}

fn world_and_spawns() -> impl Strategy<Value = (WorldSize, Vec<(Archetype, Vec2Fixed)>)> {
    (100u32..600, 100u32..600).prop_flat_map(|(w, h)| {
        let world = WorldSize::new(w, h);
        (Just(world), arb_spawns(world, 30))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Walking to the approach point always ends inside attack range, from
    /// any direction, and never leaves the map.
    #[test]
    fn prop_approach_point_is_in_range(
        (world, attacker, target) in arb_world().prop_flat_map(|world| {
            (Just(world), arb_point_in(world), arb_point_in(world))
        }),
        range in 0u32..=6,
    ) {
        let point = approach_point(attacker, target, range, 10, world);
        prop_assert!(world.contains(point));
        prop_assert!(in_attack_range(point, target, range, 10));
        if !in_attack_range(attacker, target, range, 10) {
            prop_assert!(point.distance(target) < attacker.distance(target));
        }
    }

    /// Every live unit sits in exactly the cell its position maps to, its
    /// health stays in bounds, and relations stay symmetric.
    #[test]
    fn prop_state_stays_consistent(
        (world, spawns) in world_and_spawns(),
        seed in any::<u64>(),
    ) {
        let mut sim = populate(world, seed, &spawns);
        for _ in 0..400 {
            sim.tick();
            for unit in sim.units().iter() {
                let expected = sim.grid().cell_of(unit.pos());
                prop_assert_eq!(unit.cell(), expected);
                prop_assert!(unit.health().current <= unit.health().max);
                prop_assert!(world.contains(unit.pos()));
            }
            prop_assert_eq!(sim.grid().len(), sim.units().len());
        }
        let violations = sim.validate();
        prop_assert!(violations.is_empty(), "{:?}", violations);
    }

    /// Stepping toward a point never overshoots and arrives exactly.
    #[test]
    fn prop_movement_converges(
        world in arb_world(),
        speed in arb_speed(),
        seed in 0u64..1000,
    ) {
        let mut rng = SimRng::new(seed);
        let mut pos = random_point(&mut rng, world);
        let to = random_point(&mut rng, world);

        let longest = f64::from(world.width.max(world.height));
        let bound = (longest / speed.to_num::<f64>()).ceil() as u64 + 1;
        for _ in 0..bound {
            let next = step_toward(pos, to, speed);
            prop_assert!((next.x - to.x).abs() <= (pos.x - to.x).abs());
            prop_assert!((next.y - to.y).abs() <= (pos.y - to.y).abs());
            pos = next;
        }
        prop_assert_eq!(pos, to);
    }

    /// Orders inside the map are accepted as given; orders outside are
    /// rejected without touching the destination.
    #[test]
    fn prop_orders_respect_bounds(
        world in arb_world(),
        x in -100i32..3200,
        y in -100i32..3200,
    ) {
        let mut sim = empty(world, SimulationConfig::default().with_wander(None));
        let id = sim
            .spawn_unit(Archetype::Soldier, Some(HUMAN), Vec2Fixed::ZERO)
            .unwrap();
        let point = Vec2Fixed::from_int(x, y);
        let result = sim.goes_to(id, point);
        let destination = sim.unit(id).unwrap().destination();
        if world.contains(point) {
            prop_assert!(result.is_ok());
            prop_assert_eq!(destination, point);
        } else {
            prop_assert!(
                matches!(result, Err(GameError::InvalidOrder { .. })),
                "unexpected result {:?}",
                result
            );
            prop_assert_eq!(destination, Vec2Fixed::ZERO);
        }
    }

    /// The camera never leaves `[0, world - viewport]` whatever the pointer does.
    #[test]
    fn prop_camera_stays_clamped(
        world in arb_world(),
        pointers in proptest::collection::vec(arb_pointer(), 1..40),
        frames in 1usize..20,
    ) {
        let viewport = Viewport::new(800, 600);
        let controller = CameraController::new(CameraSettings::default());
        let mut camera = Camera::new();
        let max = Camera::max_gap(viewport, world);

        for (x, y) in pointers {
            let pointer = Vec2Fixed::try_from_f64(x, y).unwrap();
            for _ in 0..frames {
                controller.update(&mut camera, pointer, viewport, world);
                prop_assert!(camera.gap.x >= Fixed::ZERO && camera.gap.x <= max.x);
                prop_assert!(camera.gap.y >= Fixed::ZERO && camera.gap.y <= max.y);
            }
        }
    }

    /// Selection marks exactly the owned units inside the normalized rectangle.
    #[test]
    fn prop_selection_matches_rectangle(
        (world, spawns) in world_and_spawns(),
        corners in (0u32..600, 0u32..600, 0u32..600, 0u32..600),
    ) {
        let sim = populate(world, 0, &spawns);
        let mut game = Game::new(
            sim,
            Viewport::new(800, 600),
            CameraSettings::default(),
            HUMAN,
            0.0,
        );
        let (ax, ay, bx, by) = corners;
        prop_assume!(ax.abs_diff(bx) >= 10 || ay.abs_diff(by) >= 10);

        game.handle_pointer(PointerEvent::Moved { x: f64::from(ax), y: f64::from(ay) });
        game.handle_pointer(PointerEvent::Down(Button::Left));
        game.handle_pointer(PointerEvent::Moved { x: f64::from(bx), y: f64::from(by) });
        game.handle_pointer(PointerEvent::Up(Button::Left));

        let (lo_x, hi_x) = (ax.min(bx), ax.max(bx));
        let (lo_y, hi_y) = (ay.min(by), ay.max(by));
        for unit in game.simulation().units().iter() {
            let p = unit.pos();
            let inside = Fixed::from_num(lo_x) <= p.x
                && p.x <= Fixed::from_num(hi_x)
                && Fixed::from_num(lo_y) <= p.y
                && p.y <= Fixed::from_num(hi_y);
            let expected = inside && unit.owner() == Some(HUMAN);
            prop_assert_eq!(unit.is_selected(), expected);
        }
    }

    /// Random spawns replay to the same hash.
    #[test]
    fn prop_random_spawns_are_deterministic(
        (world, spawns) in world_and_spawns(),
        seed in any::<u64>(),
    ) {
        let setup = || populate(world, seed, &spawns);
        prop_assert!(verify_simulation_determinism(setup, 200));
    }

    /// Any point inside the world maps to an in-range cell.
    #[test]
    fn prop_cell_of_is_in_range(
        (world, point) in arb_world().prop_flat_map(|w| (Just(w), arb_point_in(w))),
    ) {
        let grid = SpatialGrid::new(world, 10);
        let cell = grid.cell_of(point);
        let (cols, rows) = grid.dimensions();
        prop_assert!(cell.i < cols && cell.j < rows);
    }
}
