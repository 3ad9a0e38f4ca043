//! # Random Sources
//!
//! The engine draws every random value through [`RandomSource`], so a
//! resolution (including all nested tables) is reproducible from a single
//! seeded source.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Supplier of uniform draws.
pub trait RandomSource {
    /// Returns a uniform value in `[0, upper)`. `upper` is always `> 0`.
    fn roll(&mut self, upper: f64) -> f64;
}

/// Deterministic source backed by `ChaCha8`.
#[derive(Clone, Debug)]
pub struct SeededRandom {
    rng: ChaCha8Rng,
    seed: u64,
}

impl SeededRandom {
    /// Creates a source from a seed. Same seed, same sequence.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// The seed this source was created with.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for SeededRandom {
    #[inline]
    fn roll(&mut self, upper: f64) -> f64 {
        // gen::<f64>() is in [0, 1); the product can round up to `upper`
        let value = self.rng.gen::<f64>() * upper;
        if value < upper {
            value
        } else {
            0.0
        }
    }
}
