//! Seeded randomness for reproducible training
//!
//! Every random decision (split shuffling, bootstrap draws, feature
//! subsampling) flows from a seeded `StdRng`. With a fixed seed the same
//! inputs always produce the same split and the same trees, regardless of
//! thread scheduling. Without a seed the stream is drawn from OS entropy
//! and runs differ.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cmp::Ordering;

/// Seeded generator, or an entropy-seeded one when `seed` is `None`
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Concrete base seed; draws a fresh one when `seed` is `None`
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(rand::random)
}

/// Seed of tree `tree_idx` in a forest seeded with `base`
pub fn tree_seed(base: u64, tree_idx: usize) -> u64 {
    base.wrapping_add(tree_idx as u64)
}

/// Deterministic tie-breaker for split selection
///
/// Equal-gain candidates are ordered by `(feature_idx, threshold)` so the
/// chosen split never depends on the order features were visited in.
#[derive(Debug, Clone, Copy)]
pub struct SplitTieBreaker {
    pub feature_idx: usize,
    pub threshold: f64,
}

impl SplitTieBreaker {
    pub fn new(feature_idx: usize, threshold: f64) -> Self {
        Self {
            feature_idx,
            threshold,
        }
    }
}

impl PartialEq for SplitTieBreaker {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SplitTieBreaker {}

impl PartialOrd for SplitTieBreaker {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SplitTieBreaker {
    fn cmp(&self, other: &Self) -> Ordering {
        self.feature_idx
            .cmp(&other.feature_idx)
            .then_with(|| self.threshold.total_cmp(&other.threshold))
    }
}
