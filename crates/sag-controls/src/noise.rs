//! Random sources for feed variability.
//!
//! The feed generator never touches a global RNG; it draws from a
//! [`NoiseSource`] owned by the simulator so a run can be replayed from its
//! seed or made fully deterministic with [`SilentNoise`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Injectable source of random samples.
pub trait NoiseSource: std::fmt::Debug + Send {
    /// Draw from the standard normal distribution N(0, 1).
    fn standard_normal(&mut self) -> f64;

    /// Draw uniformly from [0, 1).
    fn unit_uniform(&mut self) -> f64;

    /// Rewind to the initial state so the same sequence is produced again.
    fn restart(&mut self);
}

/// Reproducible pseudo-random source.
#[derive(Debug, Clone)]
pub struct SeededNoise {
    seed: u64,
    rng: StdRng,
}

impl SeededNoise {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeded from OS entropy; the drawn seed is kept for replay.
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl NoiseSource for SeededNoise {
    fn standard_normal(&mut self) -> f64 {
        self.rng.sample(StandardNormal)
    }

    fn unit_uniform(&mut self) -> f64 {
        self.rng.gen_range(0.0..1.0)
    }

    fn restart(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
    }
}

/// Source that never perturbs anything.
///
/// Normal draws are 0 and uniform draws sit at the midpoint, so a signal
/// built on it is exactly its deterministic part.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNoise;

impl NoiseSource for SilentNoise {
    fn standard_normal(&mut self) -> f64 {
        0.0
    }

    fn unit_uniform(&mut self) -> f64 {
        0.5
    }

    fn restart(&mut self) {}
}
