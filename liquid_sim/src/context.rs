//! Per-trial seeding.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Derives an independent, reproducible random stream for every trial.
///
/// Trials never share RNG state, so they may run in any order (or in
/// parallel) without changing each other's results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialContext {
    /// Master seed for the run
    seed: u64,
}

impl TrialContext {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed taken from the wall clock, for exploratory runs.
    pub fn from_time() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self::new(nanos)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Seed for trial `index`.
    pub fn trial_seed(&self, index: u64) -> u64 {
        self.seed
            .wrapping_mul(0x9e3779b97f4a7c15) // Golden ratio prime
            .wrapping_add(index.wrapping_mul(0x517cc1b727220a95))
    }

    /// Fresh RNG for trial `index`.
    pub fn trial_rng(&self, index: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.trial_seed(index))
    }
}
