// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! The source of randomness used by a simulation.
//!
//! All random decisions in a model go through one [`RandomSource`] owned by
//! the simulator so that a run is reproducible from its seed. Tests can swap
//! in any `FnMut(u64) -> u64` to script the values drawn.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seed used when none is given.
pub const DEFAULT_SEED: u64 = 0x5EED_D51A;

pub trait RandomSource {
    /// Return a uniformly distributed integer in `[0, max)`, or 0 if `max`
    /// is 0.
    fn random(&mut self, max: u64) -> u64;
}

/// The default [`RandomSource`]: a seeded [`StdRng`].
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for SeededRandom {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl RandomSource for SeededRandom {
    fn random(&mut self, max: u64) -> u64 {
        if max == 0 {
            return 0;
        }
        self.rng.gen_range(0..max)
    }
}

impl<F> RandomSource for F
where
    F: FnMut(u64) -> u64,
{
    fn random(&mut self, max: u64) -> u64 {
        self(max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_values() {
        let mut a = SeededRandom::new(7);
        let mut b = SeededRandom::new(7);
        for _ in 0..100 {
            let v = a.random(1000);
            assert!(v < 1000);
            assert_eq!(v, b.random(1000));
        }
        assert_eq!(a.random(0), 0);
    }

    #[test]
    fn closures_are_sources() {
        let mut next = 0;
        let mut counter = move |max: u64| {
            next += 1;
            next % max
        };
        assert_eq!(counter.random(10), 1);
        assert_eq!(counter.random(10), 2);
    }
}
