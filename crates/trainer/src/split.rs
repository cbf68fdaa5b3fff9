//! Stratified train/test splitting
//!
//! Each class is shuffled independently and contributes
//! `round(test_fraction * class_count)` rows to the test partition, so
//! both partitions keep the class balance of the input.

use crate::deterministic::{seeded_rng, shuffle};
use crate::errors::{Result, TrainerError};

/// Row indices of the two partitions
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Stratified shuffle split of `labels` with a fixed seed
pub fn stratified_split(labels: &[bool], test_fraction: f64, seed: u64) -> Result<SplitIndices> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(TrainerError::Split(format!(
            "test fraction must be in (0, 1), got {test_fraction}"
        )));
    }
    if labels.len() < 2 {
        return Err(TrainerError::Split(format!(
            "need at least 2 rows to split, got {}",
            labels.len()
        )));
    }

    let mut rng = seeded_rng(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();

    for class in [false, true] {
        let mut members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, &label)| label == class)
            .map(|(idx, _)| idx)
            .collect();

        match members.len() {
            0 => continue,
            1 => {
                return Err(TrainerError::Split(format!(
                    "class {} has a single member; cannot stratify",
                    class as u8
                )))
            }
            count => {
                shuffle(&mut members, &mut rng);
                let n_test = ((count as f64 * test_fraction).round() as usize).clamp(1, count - 1);
                test.extend_from_slice(&members[..n_test]);
                train.extend_from_slice(&members[n_test..]);
            }
        }
    }

    shuffle(&mut train, &mut rng);
    shuffle(&mut test, &mut rng);

    Ok(SplitIndices { train, test })
}
