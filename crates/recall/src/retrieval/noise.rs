//! Injectable randomness for ranking jitter and path selection

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Source of uniform samples in `[0, 1)`
pub trait NoiseSource: Send {
    fn unit(&mut self) -> f64;
}

/// ChaCha20-backed noise; the same seed always yields the same sequence
#[derive(Debug)]
pub struct SeededNoise {
    rng: ChaCha20Rng,
    seed: Option<u64>,
}

impl SeededNoise {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    /// Seeded from OS entropy, for production runs
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha20Rng::from_entropy(),
            seed: None,
        }
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

impl NoiseSource for SeededNoise {
    fn unit(&mut self) -> f64 {
        self.rng.gen_range(0.0..1.0)
    }
}

/// Returns the same sample every time
#[derive(Debug, Clone, Copy)]
pub struct FixedNoise(pub f64);

impl FixedNoise {
    /// Zero jitter; path selection goes to the action path unless the
    /// advice probability exceeds one half
    pub fn centered() -> Self {
        Self(0.5)
    }
}

impl NoiseSource for FixedNoise {
    fn unit(&mut self) -> f64 {
        self.0
    }
}
