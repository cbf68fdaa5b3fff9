//! Random forest ensemble inference
//!
//! The positive-class probability of the forest is the unweighted mean of
//! its trees' leaf probabilities.

use serde::{Deserialize, Serialize};

use crate::tree::Tree;

/// Hyperparameters the forest was trained with, kept for provenance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Candidate features examined per split
    pub max_features: usize,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 120,
            max_depth: Some(30),
            min_samples_split: 10,
            min_samples_leaf: 5,
            max_features: 2,
            bootstrap: true,
            seed: 42,
        }
    }
}

/// Fitted random forest classifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RandomForest {
    pub trees: Vec<Tree>,
    pub feature_count: usize,
    pub params: ForestParams,
}

impl RandomForest {
    pub fn new(trees: Vec<Tree>, feature_count: usize, params: ForestParams) -> Self {
        Self {
            trees,
            feature_count,
            params,
        }
    }

    /// Uncalibrated positive-class probability
    pub fn predict_positive(&self, features: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|tree| tree.evaluate(features)).sum();
        sum / self.trees.len() as f64
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("Forest has no trees".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.feature_count)
                .map_err(|e| format!("Tree {i} validation failed: {e}"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Node;

    #[test]
    fn test_forest_averages_trees() {
        let trees = vec![
            Tree::new(vec![
                Node::internal(0, 0, 1.0, 1, 2),
                Node::leaf(1, 0.0),
                Node::leaf(2, 1.0),
            ]),
            Tree::new(vec![Node::leaf(0, 0.5)]),
        ];
        let forest = RandomForest::new(trees, 1, ForestParams::default());

        assert_eq!(forest.predict_positive(&[0.0]), 0.25);
        assert_eq!(forest.predict_positive(&[2.0]), 0.75);
        assert!(forest.validate().is_ok());
    }

    #[test]
    fn test_empty_forest_is_invalid() {
        let forest = RandomForest::new(Vec::new(), 8, ForestParams::default());
        assert_eq!(forest.predict_positive(&[0.0; 8]), 0.0);
        assert!(forest.validate().is_err());
    }
}
