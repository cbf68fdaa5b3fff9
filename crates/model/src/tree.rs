//! Decision tree structures for forest inference
//!
//! Trees are stored as flat node arrays with node 0 as the root. Leaves
//! hold the fraction of positive training samples that reached them.

use serde::{Deserialize, Serialize};

/// A decision tree node (internal or leaf)
///
/// For internal nodes:
/// - `feature_idx >= 0`: index into the feature vector
/// - `left` and `right` point to child node indices
/// - `leaf` is `None`
///
/// For leaf nodes:
/// - `feature_idx == -1`
/// - `leaf` contains the positive-class probability
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Node ID (position in the node array)
    pub id: i32,

    /// Left child index (-1 for leaf nodes)
    pub left: i32,

    /// Right child index (-1 for leaf nodes)
    pub right: i32,

    /// Feature index to split on (-1 for leaf nodes)
    pub feature_idx: i32,

    /// Split threshold; `x <= threshold` goes left
    pub threshold: f64,

    /// Positive-class probability (Some for leaf nodes)
    pub leaf: Option<f64>,
}

impl Node {
    /// Create a new internal (split) node
    pub fn internal(id: i32, feature_idx: i32, threshold: f64, left: i32, right: i32) -> Self {
        Self {
            id,
            left,
            right,
            feature_idx,
            threshold,
            leaf: None,
        }
    }

    /// Create a new leaf node
    pub fn leaf(id: i32, value: f64) -> Self {
        Self {
            id,
            left: -1,
            right: -1,
            feature_idx: -1,
            threshold: 0.0,
            leaf: Some(value),
        }
    }

    /// Check if this node is a leaf
    pub fn is_leaf(&self) -> bool {
        self.feature_idx == -1 || self.leaf.is_some()
    }
}

/// A single classification tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tree {
    /// Tree nodes (node 0 is the root)
    pub nodes: Vec<Node>,
}

impl Tree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Positive-class probability for a feature vector.
    ///
    /// Callers must validate the tree first; a malformed tree yields 0.
    pub fn evaluate(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;

        loop {
            let Some(node) = self.nodes.get(idx) else {
                return 0.0;
            };

            if node.is_leaf() {
                return node.leaf.unwrap_or(0.0);
            }

            let Some(&value) = features.get(node.feature_idx as usize) else {
                return 0.0;
            };

            let next = if value <= node.threshold {
                node.left
            } else {
                node.right
            };
            if next < 0 {
                return 0.0;
            }
            idx = next as usize;
        }
    }

    /// Number of nodes on the longest root-to-leaf path, minus one
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes.get(idx) {
                Some(node) if !node.is_leaf() => {
                    1 + walk(nodes, node.left as usize).max(walk(nodes, node.right as usize))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }

    /// Validate tree structure against the expected feature count
    pub fn validate(&self, feature_count: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("Tree has no nodes".to_string());
        }

        let len = self.nodes.len();
        for (i, node) in self.nodes.iter().enumerate() {
            if node.is_leaf() {
                match node.leaf {
                    Some(value) if (0.0..=1.0).contains(&value) => {}
                    Some(value) => {
                        return Err(format!("Leaf node {i} has probability {value} outside [0, 1]"))
                    }
                    None => return Err(format!("Leaf node {i} has no leaf value")),
                }
                continue;
            }

            // Children are always emitted after their parent, which rules out cycles.
            if node.left <= i as i32 || node.left as usize >= len {
                return Err(format!("Node {} has invalid left child: {}", i, node.left));
            }
            if node.right <= i as i32 || node.right as usize >= len {
                return Err(format!("Node {} has invalid right child: {}", i, node.right));
            }
            if node.feature_idx < 0 || node.feature_idx as usize >= feature_count {
                return Err(format!(
                    "Internal node {} has invalid feature index: {}",
                    i, node.feature_idx
                ));
            }
            if !node.threshold.is_finite() {
                return Err(format!("Internal node {i} has non-finite threshold"));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> Tree {
        Tree::new(vec![
            Node::internal(0, 0, 0.5, 1, 2),
            Node::leaf(1, 0.25),
            Node::leaf(2, 0.75),
        ])
    }

    #[test]
    fn test_node_creation() {
        let internal = Node::internal(0, 3, 1.5, 1, 2);
        assert_eq!(internal.feature_idx, 3);
        assert_eq!(internal.threshold, 1.5);
        assert!(!internal.is_leaf());

        let leaf = Node::leaf(1, 0.4);
        assert_eq!(leaf.feature_idx, -1);
        assert!(leaf.is_leaf());
        assert_eq!(leaf.leaf, Some(0.4));
    }

    #[test]
    fn test_tree_evaluation() {
        let tree = stump();
        assert_eq!(tree.evaluate(&[0.1]), 0.25);
        assert_eq!(tree.evaluate(&[0.5]), 0.25); // Equal goes left
        assert_eq!(tree.evaluate(&[0.9]), 0.75);
    }

    #[test]
    fn test_tree_depth() {
        assert_eq!(stump().depth(), 1);
        assert_eq!(Tree::new(vec![Node::leaf(0, 1.0)]).depth(), 0);
    }

    #[test]
    fn test_tree_validation() {
        assert!(stump().validate(1).is_ok());
        assert!(stump().validate(0).is_err());

        let bad_child = Tree::new(vec![
            Node::internal(0, 0, 0.5, 5, 2),
            Node::leaf(1, 0.0),
            Node::leaf(2, 1.0),
        ]);
        assert!(bad_child.validate(1).is_err());

        let bad_leaf = Tree::new(vec![Node::leaf(0, 1.5)]);
        assert!(bad_leaf.validate(1).is_err());

        let cycle = Tree::new(vec![
            Node::internal(0, 0, 0.5, 0, 1),
            Node::leaf(1, 0.0),
        ]);
        assert!(cycle.validate(1).is_err());
    }
}
