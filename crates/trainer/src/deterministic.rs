//! Deterministic utilities for reproducible training
//!
//! Every random draw in the trainer comes from an RNG derived here from
//! the configured seed, so identical inputs produce identical models
//! regardless of thread scheduling.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::cmp::Ordering;

/// RNG for a top-level seed
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Independent seed for one tree of the ensemble
pub fn tree_seed(base_seed: u64, tree_idx: usize) -> u64 {
    base_seed.wrapping_add(tree_idx as u64)
}

/// Deterministically shuffle a slice with the given RNG
pub fn shuffle<T>(items: &mut [T], rng: &mut StdRng) {
    items.shuffle(rng);
}

/// Deterministic tie-breaker for split selection
///
/// Among equal-gain candidates the lowest feature index wins, then the
/// lowest threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
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

    /// Total order over candidates
    pub fn cmp(&self, other: &Self) -> Ordering {
        self.feature_idx
            .cmp(&other.feature_idx)
            .then_with(|| self.threshold.total_cmp(&other.threshold))
    }

    pub fn precedes(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Less
    }
}
