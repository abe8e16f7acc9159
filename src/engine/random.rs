//! Random sources for stochastic successor selection
//!
//! The engine draws uniform samples through the [`RandomSource`] trait so a
//! run can be made reproducible: [`StdRandom`] wraps a seedable generator
//! for normal use, [`FixedRandom`] replays a scripted sample list so tests
//! can force a specific alternative.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Supplier of uniform samples in `[0, 1)`.
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;
}

/// The default source, backed by a seedable PRNG. Two instances with the
/// same seed produce the same sample stream.
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl RandomSource for StdRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen()
    }
}

/// A scripted source that cycles through a fixed sample list. With an
/// empty list every draw is `0.0`, which always selects the first
/// alternative.
pub struct FixedRandom {
    samples: Vec<f64>,
    index: usize,
}

impl FixedRandom {
    pub fn new(samples: Vec<f64>) -> Self {
        Self { samples, index: 0 }
    }
}

impl RandomSource for FixedRandom {
    fn next_f64(&mut self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sample = self.samples[self.index % self.samples.len()];
        self.index += 1;
        sample
    }
}
