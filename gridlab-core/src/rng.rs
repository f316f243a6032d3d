//! Deterministic RNG and seed derivation.
//!
//! A master seed is expanded into per-(race, trial) sub-seeds via BLAKE3
//! hashing, independently of execution order, so batch results are identical
//! regardless of whether trials run sequentially or across a thread pool.
//! Each trial owns a `TrialRng` constructed from its sub-seed; no trial ever
//! shares RNG state with another.

use crate::domain::RaceId;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Per-trial random source.
///
/// Wraps a `ChaCha8Rng` so that streams are stable across platforms and
/// library versions. Two instances constructed with the same seed produce
/// identical sequences forever.
#[derive(Debug, Clone)]
pub struct TrialRng {
    inner: ChaCha8Rng,
}

impl TrialRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Uniform draw in [0, 1).
    pub fn uniform(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Uniform draw in [lo, hi).
    pub fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.uniform() * (hi - lo)
    }

    /// Bernoulli draw: true with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.uniform() < p
    }

    /// Gaussian variate via the Box-Muller transform.
    ///
    /// The log-argument draw is floored away from zero so a uniform draw of
    /// exactly 0.0 cannot produce an infinite variate.
    pub fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.uniform().max(1e-12);
        let u2 = self.uniform();
        let radius = (-2.0 * u1.ln()).sqrt();
        mean + std_dev * radius * (std::f64::consts::TAU * u2).cos()
    }
}

/// Deterministic seed hierarchy for Monte Carlo batches.
///
/// Sub-seeds are derived by hashing (master seed, race id, trial index), so
/// `trial_seed(race, 7)` is the same value no matter how many trials ran
/// before it or on which thread.
#[derive(Debug, Clone)]
pub struct SeedHierarchy {
    master_seed: u64,
}

impl SeedHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Derive the deterministic sub-seed for one trial of one race.
    pub fn trial_seed(&self, race_id: &RaceId, trial_index: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(race_id.as_str().as_bytes());
        hasher.update(&trial_index.to_le_bytes());
        let hash = hasher.finalize();
        u64::from_le_bytes(hash.as_bytes()[..8].try_into().unwrap())
    }

    /// Construct the RNG for one trial.
    pub fn rng_for(&self, race_id: &RaceId, trial_index: u64) -> TrialRng {
        TrialRng::new(self.trial_seed(race_id, trial_index))
    }
}

/// Hash a simulation context into a stable, positive, non-zero seed.
///
/// Used to pin a whole prediction run to its context: the same
/// (track, round, weather state, session type) always reproduces the same
/// batch, while any change to the context yields an unrelated seed.
pub fn context_seed(track: &str, round: u32, weather_state: &str, session_type: &str) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(track.as_bytes());
    hasher.update(&round.to_le_bytes());
    hasher.update(weather_state.as_bytes());
    hasher.update(session_type.as_bytes());
    let hash = hasher.finalize();
    let raw = u64::from_le_bytes(hash.as_bytes()[..8].try_into().unwrap());
    // Clear the top bit so the seed also fits signed consumers; zero is
    // reserved as "no seed".
    let seed = raw & 0x7fff_ffff_ffff_ffff;
    if seed == 0 {
        1
    } else {
        seed
    }
}
