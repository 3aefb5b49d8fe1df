//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation produces identical
//! results given identical inputs.
//!
//! # Sources of non-determinism
//!
//! - **Floating-point math**: positions use [`hvz_core::math::Fixed`].
//! - **HashMap iteration order**: unit storage is always walked in sorted
//!   id order and grid cells in row-major order.
//! - **System randomness**: wander targets and colours come from the
//!   seeded [`hvz_core::rng::SimRng`].

use std::thread;

use hvz_core::simulation::Simulation;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        assert!(
            self.is_deterministic,
            "Simulation is non-deterministic!\n\
             Runs: {}\n\
             Ticks: {}\n\
             Unique hashes: {} (expected 1)\n\
             All hashes: {:?}",
            self.hashes.len(),
            self.ticks,
            self.unique_hashes().len(),
            self.hashes
        );
    }
}

/// Run a setup `runs` times, advance each `ticks` steps and compare hashes.
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);
    for _ in 0..runs {
        let mut state = setup();
        for _ in 0..ticks {
            step(&mut state);
        }
        hashes.push(hash(&state));
    }

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks,
    }
}

/// Run a [`Simulation`] setup twice and compare final state hashes.
pub fn verify_simulation_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |sim| {
            sim.tick();
        },
        Simulation::state_hash,
    )
    .is_deterministic
}

/// Run `num_sims` copies of a setup on scoped threads and compare hashes.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_simulations<F>(
    setup_fn: F,
    num_sims: usize,
    num_ticks: u64,
) -> DeterminismResult
where
    F: Fn() -> Simulation + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    for _ in 0..num_ticks {
                        sim.tick();
                    }
                    sim.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("simulation thread panicked"))
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks: num_ticks,
    }
}

/// Step two copies of a setup in lockstep and return the first tick at
/// which their hashes differ (0 = already different after setup).
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut a = setup_fn();
    let mut b = setup_fn();
    if a.state_hash() != b.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        a.tick();
        b.tick();
        if a.state_hash() != b.state_hash() {
            return Some(tick);
        }
    }
    None
}

/// Run `num_ticks`, snapshot through bincode, and check the restored
/// simulation hashes the same and keeps producing the same hashes.
pub fn verify_serialization_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    let mut sim = setup_fn();
    for _ in 0..num_ticks {
        sim.tick();
    }

    let Ok(bytes) = sim.serialize() else {
        return false;
    };
    let Ok(mut restored) = Simulation::deserialize(&bytes) else {
        return false;
    };
    if restored.state_hash() != sim.state_hash() {
        return false;
    }

    // The snapshot must carry the RNG and pass schedule too
    for _ in 0..num_ticks.max(1) {
        sim.tick();
        restored.tick();
    }
    restored.state_hash() == sim.state_hash()
}

/// Proptest strategies for simulation inputs.
pub mod strategies {
    use hvz_core::archetype::Archetype;
    use hvz_core::config::WorldSize;
    use hvz_core::math::{Fixed, Vec2Fixed};
    use proptest::prelude::*;

    /// World sizes from a small arena up to a large map.
    pub fn arb_world() -> impl Strategy<Value = WorldSize> {
        (100u32..3000, 100u32..3000).prop_map(|(w, h)| WorldSize::new(w, h))
    }

    /// A point inside `[0, width] × [0, height]`, with a fractional part.
    pub fn arb_point_in(world: WorldSize) -> impl Strategy<Value = Vec2Fixed> {
        (0..=world.width * 4, 0..=world.height * 4).prop_map(|(x, y)| {
            let four = Fixed::from_num(4);
            Vec2Fixed::new(Fixed::from_num(x) / four, Fixed::from_num(y) / four)
        })
    }

    /// Either archetype.
    pub fn arb_archetype() -> impl Strategy<Value = Archetype> {
        prop_oneof![Just(Archetype::Soldier), Just(Archetype::Zombie)]
    }

    /// Movement speed in units per tick, 0.25 to 20.
    pub fn arb_speed() -> impl Strategy<Value = Fixed> {
        (1i32..=80).prop_map(|q| Fixed::from_num(q) / Fixed::from_num(4))
    }

    /// Pointer position anywhere in and slightly around an 800x600 viewport.
    pub fn arb_pointer() -> impl Strategy<Value = (f64, f64)> {
        (-50.0f64..850.0, -50.0f64..650.0)
    }

    /// Units to spawn: archetype plus position inside `world`.
    pub fn arb_spawns(
        world: WorldSize,
        max_units: usize,
    ) -> impl Strategy<Value = Vec<(Archetype, Vec2Fixed)>> {
        proptest::collection::vec((arb_archetype(), arb_point_in(world)), 1..max_units)
    }
}
