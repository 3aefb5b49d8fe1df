//! Test fixtures and helpers.
//!
//! Pre-built simulations for consistent testing. Every fixture registers
//! the AI player (black) and [`HUMAN`] (white) so colours never depend on
//! the RNG.

use fixed::types::I32F32;
use hvz_core::archetype::Archetype;
use hvz_core::config::{SimulationConfig, WorldSize};
use hvz_core::math::Vec2Fixed;
use hvz_core::player::{Colour, PlayerId};
use hvz_core::rng::SimRng;
use hvz_core::simulation::Simulation;
use hvz_core::systems::random_point;
use hvz_core::unit::UnitId;

/// Player id used for the human side in fixtures.
pub const HUMAN: PlayerId = PlayerId(1);

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Integer world position.
#[must_use]
pub fn pos(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::from_int(x, y)
}

/// Empty simulation with both fixture players registered.
#[must_use]
pub fn empty(world: WorldSize, config: SimulationConfig) -> Simulation {
    let mut sim = Simulation::new(world, config);
    for (id, colour) in [(PlayerId::AI, Colour::BLACK), (HUMAN, Colour::WHITE)] {
        if let Err(e) = sim.add_player_with_colour(id, colour) {
            tracing::warn!(error = %e, "fixture player registration failed");
        }
    }
    sim
}

/// Default config without wandering, so AI units only move when attacking.
#[must_use]
pub fn still_config() -> SimulationConfig {
    SimulationConfig::default().with_wander(None)
}

/// A soldier/zombie pair placed as a fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Duel {
    /// The human soldier.
    pub soldier: UnitId,
    /// The AI zombie.
    pub zombie: UnitId,
}

/// One soldier and one zombie `distance` apart on a horizontal line, in a
/// 1000x1000 world with wandering off.
///
/// # Panics
///
/// Panics if the positions fall outside the world.
#[must_use]
pub fn duel(distance: i32) -> (Simulation, Duel) {
    let mut sim = empty(WorldSize::new(1000, 1000), still_config());
    let soldier = sim
        .spawn_unit(Archetype::Soldier, Some(HUMAN), pos(100, 100))
        .expect("soldier inside world");
    let zombie = sim
        .spawn_unit(Archetype::Zombie, Some(PlayerId::AI), pos(100 + distance, 100))
        .expect("zombie inside world");
    (sim, Duel { soldier, zombie })
}

/// Randomly placed soldiers and zombies, positions drawn from `seed`.
///
/// # Panics
///
/// Panics if spawning fails, which cannot happen for in-world positions.
#[must_use]
pub fn skirmish(seed: u64, world: WorldSize, soldiers: usize, zombies: usize) -> Simulation {
    let mut sim = empty(world, SimulationConfig::default().with_seed(seed));
    let mut rng = SimRng::new(seed ^ 0x5eed);
    for _ in 0..soldiers {
        let at = random_point(&mut rng, world);
        sim.spawn_unit(Archetype::Soldier, Some(HUMAN), at)
            .expect("random point inside world");
    }
    for _ in 0..zombies {
        let at = random_point(&mut rng, world);
        sim.spawn_unit(Archetype::Zombie, Some(PlayerId::AI), at)
            .expect("random point inside world");
    }
    sim
}

/// Dense crowd for benchmarks: `count` zombies and `count / 10` soldiers.
#[must_use]
pub fn crowd(seed: u64, count: usize) -> Simulation {
    skirmish(seed, WorldSize::new(2000, 2000), count / 10, count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duel_layout() {
        let (sim, duel) = duel(40);
        assert_eq!(sim.unit(duel.soldier).unwrap().pos(), pos(100, 100));
        assert_eq!(sim.unit(duel.zombie).unwrap().pos(), pos(140, 100));
        assert_eq!(sim.units_of(HUMAN), vec![duel.soldier]);
    }

    #[test]
    fn test_skirmish_is_seeded() {
        let world = WorldSize::new(500, 500);
        let a = skirmish(7, world, 5, 20);
        let b = skirmish(7, world, 5, 20);
        assert_eq!(a.units().len(), 25);
        assert_eq!(a.state_hash(), b.state_hash());
    }
}
