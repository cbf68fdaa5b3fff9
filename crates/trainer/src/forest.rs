//! Random forest trainer
//!
//! Trees are grown in parallel. Each tree draws its bootstrap sample and
//! its per-node feature subsets from an RNG seeded with
//! `seed + tree_index`, so the fitted forest does not depend on how rayon
//! schedules the work.

use rand::Rng;
use rayon::prelude::*;
use tracing::{debug, info};
use winerate_model::{FeatureVector, ForestParams, RandomForest, FEATURE_COUNT};

use crate::cart::{CartBuilder, TreeConfig};
use crate::deterministic::{seeded_rng, tree_seed};
use crate::errors::{Result, TrainerError};

/// `max(1, floor(sqrt(n_features)))`
pub fn sqrt_features(n_features: usize) -> usize {
    ((n_features as f64).sqrt() as usize).max(1)
}

/// Fitted forest plus normalized mean-decrease-in-impurity per feature
#[derive(Clone, Debug)]
pub struct FittedForest {
    pub forest: RandomForest,
    pub feature_importances: [f64; FEATURE_COUNT],
}

/// Random forest trainer
pub struct ForestTrainer {
    params: ForestParams,
}

impl ForestTrainer {
    pub fn new(params: ForestParams) -> Self {
        Self { params }
    }

    /// Fit a forest on a feature matrix and binary labels
    pub fn fit(&self, features: &[FeatureVector], labels: &[bool]) -> Result<FittedForest> {
        if features.len() != labels.len() {
            return Err(TrainerError::Training(format!(
                "feature rows ({}) and labels ({}) differ in length",
                features.len(),
                labels.len()
            )));
        }
        if self.params.n_estimators == 0 {
            return Err(TrainerError::Training("n_estimators must be positive".to_string()));
        }

        let positives = labels.iter().filter(|&&l| l).count();
        if positives == 0 || positives == labels.len() {
            return Err(TrainerError::Training(format!(
                "training labels must contain both classes ({positives} positive of {})",
                labels.len()
            )));
        }

        let n_samples = features.len();
        let tree_config = TreeConfig {
            max_depth: self.params.max_depth,
            min_samples_split: self.params.min_samples_split,
            min_samples_leaf: self.params.min_samples_leaf,
            max_features: self.params.max_features.clamp(1, FEATURE_COUNT),
        };
        let builder = CartBuilder::new(features, labels, tree_config);

        info!(
            "Growing {} trees on {} samples ({} positive)",
            self.params.n_estimators, n_samples, positives
        );

        let grown: Vec<_> = (0..self.params.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = seeded_rng(tree_seed(self.params.seed, tree_idx));

                let samples: Vec<usize> = if self.params.bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };

                let (tree, importances) = builder.build(&samples, &mut rng);
                debug!(
                    tree = tree_idx,
                    nodes = tree.nodes.len(),
                    depth = tree.depth(),
                    "grew tree"
                );
                (tree, importances)
            })
            .collect();

        let mut feature_importances = [0.0; FEATURE_COUNT];
        let mut trees = Vec::with_capacity(grown.len());
        for (tree, importances) in grown {
            // Per-tree normalization, then average across trees.
            let total: f64 = importances.iter().sum();
            if total > 0.0 {
                for (acc, value) in feature_importances.iter_mut().zip(importances) {
                    *acc += value / total;
                }
            }
            trees.push(tree);
        }
        let total: f64 = feature_importances.iter().sum();
        if total > 0.0 {
            feature_importances.iter_mut().for_each(|v| *v /= total);
        }

        Ok(FittedForest {
            forest: RandomForest::new(trees, FEATURE_COUNT, self.params.clone()),
            feature_importances,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic(n: usize) -> (Vec<FeatureVector>, Vec<bool>) {
        let mut features = Vec::with_capacity(n);
        let mut labels = Vec::with_capacity(n);
        for i in 0..n {
            let alcohol = 8.0 + (i % 50) as f64 * 0.12;
            let mut row = [0.0; FEATURE_COUNT];
            for (j, value) in row.iter_mut().enumerate() {
                *value = ((i * 31 + j * 17) % 97) as f64 / 97.0;
            }
            row[7] = alcohol;
            features.push(row);
            labels.push(alcohol > 11.0);
        }
        (features, labels)
    }

    fn small_params() -> ForestParams {
        ForestParams {
            n_estimators: 10,
            max_depth: Some(6),
            min_samples_split: 4,
            min_samples_leaf: 2,
            max_features: sqrt_features(FEATURE_COUNT),
            bootstrap: true,
            seed: 42,
        }
    }

    #[test]
    fn test_sqrt_features() {
        assert_eq!(sqrt_features(8), 2);
        assert_eq!(sqrt_features(9), 3);
        assert_eq!(sqrt_features(0), 1);
    }

    #[test]
    fn test_fit_learns_threshold_feature() {
        let (features, labels) = synthetic(200);
        let fitted = ForestTrainer::new(small_params()).fit(&features, &labels).unwrap();

        assert_eq!(fitted.forest.num_trees(), 10);
        assert!(fitted.forest.validate().is_ok());

        let mut high = [0.5; FEATURE_COUNT];
        high[7] = 13.0;
        let mut low = [0.5; FEATURE_COUNT];
        low[7] = 8.5;
        assert!(fitted.forest.predict_positive(&high) > fitted.forest.predict_positive(&low));

        let sum: f64 = fitted.feature_importances.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        // Alcohol alone determines the label.
        assert!(fitted.feature_importances[7] > 1.0 / FEATURE_COUNT as f64);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (features, labels) = synthetic(150);
        let a = ForestTrainer::new(small_params()).fit(&features, &labels).unwrap();
        let b = ForestTrainer::new(small_params()).fit(&features, &labels).unwrap();
        assert_eq!(a.forest, b.forest);
    }

    #[test]
    fn test_single_class_is_rejected() {
        let (features, _) = synthetic(20);
        let labels = vec![true; 20];
        assert!(ForestTrainer::new(small_params()).fit(&features, &labels).is_err());
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let (features, labels) = synthetic(20);
        assert!(ForestTrainer::new(small_params())
            .fit(&features, &labels[..10])
            .is_err());
    }
}
