//! Seeded deterministic RNG.
//!
//! The simulation never touches system randomness. Wander destinations and
//! player colours are drawn from this generator so that a seed fully
//! determines a run.

use serde::{Deserialize, Serialize};

/// Linear congruential generator with a golden-ratio seed offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    /// Create a generator from a seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(0x9E37_79B9_7F4A_7C15),
        }
    }

    /// Next raw value.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        // The low bits of an LCG are weak; fold the high half in.
        self.state ^ (self.state >> 33)
    }

    /// Uniform integer in `[0, bound)`. Returns 0 when `bound` is 0.
    pub fn next_below(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        (self.next_u64() % u64::from(bound)) as u32
    }

    /// Current internal state, for hashing.
    #[must_use]
    pub const fn state(&self) -> u64 {
        self.state
    }
}
