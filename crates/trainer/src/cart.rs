//! CART (Classification and Regression Tree) builder
//!
//! Grows a binary classification tree with Gini impurity and exact
//! greedy splits over a random subset of features at every node.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use winerate_model::{FeatureVector, Node, Tree, FEATURE_COUNT};

use crate::deterministic::SplitTieBreaker;

/// Values closer than this are treated as equal when placing thresholds
const FEATURE_THRESHOLD: f64 = 1e-7;

/// Training parameters for a single tree
#[derive(Clone, Debug)]
pub struct TreeConfig {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features examined per split before falling back to the rest
    pub max_features: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: FEATURE_COUNT,
        }
    }
}

/// Split candidate with its weighted child impurity
#[derive(Debug, Clone)]
struct SplitCandidate {
    /// Sum of child Gini impurities weighted by child sample counts
    impurity: f64,
    tie_breaker: SplitTieBreaker,
}

impl SplitCandidate {
    fn feature_idx(&self) -> usize {
        self.tie_breaker.feature_idx
    }

    fn threshold(&self) -> f64 {
        self.tie_breaker.threshold
    }

    fn beats(&self, other: &SplitCandidate) -> bool {
        self.impurity < other.impurity
            || (self.impurity == other.impurity && self.tie_breaker.precedes(&other.tie_breaker))
    }
}

/// Gini impurity of a node with `pos` positives out of `n`
fn gini(pos: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = pos as f64 / n as f64;
    2.0 * p * (1.0 - p)
}

/// Build a classification tree over a training matrix
pub struct CartBuilder<'a> {
    config: TreeConfig,
    features: &'a [FeatureVector],
    labels: &'a [bool],
}

impl<'a> CartBuilder<'a> {
    pub fn new(features: &'a [FeatureVector], labels: &'a [bool], config: TreeConfig) -> Self {
        debug_assert_eq!(features.len(), labels.len());
        Self {
            config,
            features,
            labels,
        }
    }

    /// Grow a tree on `samples` (row indices, duplicates allowed).
    ///
    /// Returns the tree and the unnormalized impurity decrease per feature.
    pub fn build(&self, samples: &[usize], rng: &mut StdRng) -> (Tree, [f64; FEATURE_COUNT]) {
        let mut nodes = Vec::new();
        let mut importances = [0.0; FEATURE_COUNT];
        let mut indices = samples.to_vec();

        self.build_node(&mut indices, 0, &mut nodes, &mut importances, rng);

        (Tree::new(nodes), importances)
    }

    /// Recursively build tree nodes, returning the index of the created node
    fn build_node(
        &self,
        indices: &mut [usize],
        depth: usize,
        nodes: &mut Vec<Node>,
        importances: &mut [f64; FEATURE_COUNT],
        rng: &mut StdRng,
    ) -> i32 {
        let current_idx = nodes.len() as i32;
        let n = indices.len();
        let pos = indices.iter().filter(|&&i| self.labels[i]).count();
        let leaf_value = if n == 0 { 0.0 } else { pos as f64 / n as f64 };

        let depth_reached = self.config.max_depth.is_some_and(|max| depth >= max);
        if depth_reached
            || n < self.config.min_samples_split
            || n < 2 * self.config.min_samples_leaf
            || pos == 0
            || pos == n
        {
            nodes.push(Node::leaf(current_idx, leaf_value));
            return current_idx;
        }

        let Some(split) = self.find_best_split(indices, rng) else {
            nodes.push(Node::leaf(current_idx, leaf_value));
            return current_idx;
        };

        let feature_idx = split.feature_idx();
        let threshold = split.threshold();
        let n_left = partition(indices, |i| self.features[i][feature_idx] <= threshold);

        importances[feature_idx] += n as f64 * gini(pos, n) - split.impurity;

        // Reserve space for current node
        nodes.push(Node::internal(current_idx, feature_idx as i32, threshold, -1, -1));

        let (left, right) = indices.split_at_mut(n_left);
        let left_idx = self.build_node(left, depth + 1, nodes, importances, rng);
        let right_idx = self.build_node(right, depth + 1, nodes, importances, rng);

        let node = &mut nodes[current_idx as usize];
        node.left = left_idx;
        node.right = right_idx;

        current_idx
    }

    /// Best split over a random feature subset.
    ///
    /// Features beyond `max_features` are only visited while no valid
    /// split has been found.
    fn find_best_split(&self, indices: &[usize], rng: &mut StdRng) -> Option<SplitCandidate> {
        let mut order: Vec<usize> = (0..FEATURE_COUNT).collect();
        order.shuffle(rng);

        let mut best: Option<SplitCandidate> = None;
        for (visited, &feature_idx) in order.iter().enumerate() {
            if visited >= self.config.max_features && best.is_some() {
                break;
            }
            if let Some(candidate) = self.best_split_for_feature(indices, feature_idx) {
                best = match best {
                    Some(current) if !candidate.beats(&current) => Some(current),
                    _ => Some(candidate),
                };
            }
        }

        best
    }

    /// Exact greedy scan over one feature's sorted values
    fn best_split_for_feature(&self, indices: &[usize], feature_idx: usize) -> Option<SplitCandidate> {
        let mut column: Vec<(f64, bool)> = indices
            .iter()
            .map(|&i| (self.features[i][feature_idx], self.labels[i]))
            .collect();
        column.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = column.len();
        let total_pos = column.iter().filter(|(_, label)| *label).count();
        let min_leaf = self.config.min_samples_leaf.max(1);

        let mut best: Option<SplitCandidate> = None;
        let mut left_pos = 0usize;

        for i in 1..n {
            if column[i - 1].1 {
                left_pos += 1;
            }

            let (prev, next) = (column[i - 1].0, column[i].0);
            if next <= prev + FEATURE_THRESHOLD {
                continue;
            }
            if i < min_leaf || n - i < min_leaf {
                continue;
            }

            let right_pos = total_pos - left_pos;
            let impurity = i as f64 * gini(left_pos, i) + (n - i) as f64 * gini(right_pos, n - i);

            let mut threshold = prev / 2.0 + next / 2.0;
            if threshold >= next {
                threshold = prev;
            }

            let candidate = SplitCandidate {
                impurity,
                tie_breaker: SplitTieBreaker::new(feature_idx, threshold),
            };
            best = match best {
                Some(current) if !candidate.beats(&current) => Some(current),
                _ => Some(candidate),
            };
        }

        best
    }
}

/// Reorder `items` so that those matching `pred` come first; returns their count
fn partition<F: Fn(usize) -> bool>(items: &mut [usize], pred: F) -> usize {
    let mut boundary = 0;
    for i in 0..items.len() {
        if pred(items[i]) {
            items.swap(boundary, i);
            boundary += 1;
        }
    }
    boundary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deterministic::seeded_rng;

    fn row(alcohol: f64, acidity: f64) -> FeatureVector {
        let mut features = [0.0; FEATURE_COUNT];
        features[0] = acidity;
        features[7] = alcohol;
        features
    }

    fn separable() -> (Vec<FeatureVector>, Vec<bool>) {
        let features = vec![
            row(9.0, 0.7),
            row(9.2, 0.6),
            row(9.5, 0.65),
            row(11.5, 0.3),
            row(12.0, 0.35),
            row(12.8, 0.25),
        ];
        let labels = vec![false, false, false, true, true, true];
        (features, labels)
    }

    #[test]
    fn test_pure_split_on_separable_data() {
        let (features, labels) = separable();
        let config = TreeConfig::default();
        let builder = CartBuilder::new(&features, &labels, config);
        let samples: Vec<usize> = (0..features.len()).collect();
        let (tree, importances) = builder.build(&samples, &mut seeded_rng(1));

        assert_eq!(tree.nodes.len(), 3);
        assert!(tree.validate(FEATURE_COUNT).is_ok());
        for (f, &label) in features.iter().zip(&labels) {
            assert_eq!(tree.evaluate(f), if label { 1.0 } else { 0.0 });
        }
        // Both acidity and alcohol separate perfectly; the lower feature index wins ties.
        assert_eq!(tree.nodes[0].feature_idx, 0);
        assert!((tree.nodes[0].threshold - 0.475).abs() < 1e-12);
        assert!((importances[0] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_leaf_only_tree_for_pure_node() {
        let features = vec![row(9.0, 0.5), row(10.0, 0.4)];
        let labels = vec![true, true];
        let builder = CartBuilder::new(&features, &labels, TreeConfig::default());
        let (tree, _) = builder.build(&[0, 1], &mut seeded_rng(1));

        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.nodes[0].leaf, Some(1.0));
    }

    #[test]
    fn test_min_samples_leaf_blocks_split() {
        let (features, labels) = separable();
        let config = TreeConfig {
            min_samples_leaf: 4,
            ..TreeConfig::default()
        };
        let builder = CartBuilder::new(&features, &labels, config);
        let (tree, _) = builder.build(&[0, 1, 2, 3, 4, 5], &mut seeded_rng(1));

        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.nodes[0].leaf, Some(0.5));
    }

    #[test]
    fn test_max_depth_zero_is_stump_leaf() {
        let (features, labels) = separable();
        let config = TreeConfig {
            max_depth: Some(0),
            ..TreeConfig::default()
        };
        let builder = CartBuilder::new(&features, &labels, config);
        let (tree, _) = builder.build(&[0, 1, 2, 3, 4, 5], &mut seeded_rng(1));
        assert_eq!(tree.nodes.len(), 1);
    }

    #[test]
    fn test_bootstrap_duplicates_weight_leaves() {
        let (features, labels) = separable();
        let config = TreeConfig {
            max_depth: Some(0),
            ..TreeConfig::default()
        };
        let builder = CartBuilder::new(&features, &labels, config);
        let (tree, _) = builder.build(&[0, 0, 0, 3], &mut seeded_rng(1));
        assert_eq!(tree.nodes[0].leaf, Some(0.25));
    }

    #[test]
    fn test_constant_features_yield_leaf() {
        let features = vec![row(10.0, 0.5); 4];
        let labels = vec![true, false, true, false];
        let builder = CartBuilder::new(&features, &labels, TreeConfig::default());
        let (tree, _) = builder.build(&[0, 1, 2, 3], &mut seeded_rng(3));
        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.nodes[0].leaf, Some(0.5));
    }

    #[test]
    fn test_partition() {
        let mut items = vec![5, 2, 8, 1, 9];
        let n = partition(&mut items, |x| x < 5);
        assert_eq!(n, 2);
        assert!(items[..n].iter().all(|&x| x < 5));
        assert!(items[n..].iter().all(|&x| x >= 5));
    }
}
