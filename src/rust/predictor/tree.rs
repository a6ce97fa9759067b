//! Decision-tree and random-forest inference from a JSON dump.
//!
//! The dump mirrors the arrays a fitted scikit-learn tree exposes:
//!
//! ```json
//! {
//!   "n_features": 6,
//!   "n_classes": 3,
//!   "trees": [{
//!     "children_left":  [1, -1, -1],
//!     "children_right": [2, -1, -1],
//!     "feature":        [1, -2, -2],
//!     "threshold":      [0.5, -2.0, -2.0],
//!     "value":          [[5, 5, 0], [5, 0, 0], [0, 5, 0]]
//!   }]
//! }
//! ```
//!
//! A sample goes left when `x[feature] <= threshold`. A node is a leaf when
//! its left child is `-1`. Each leaf's `value` row is normalized into a class
//! distribution; the forest averages them and the first maximum wins.

use std::fs;
use std::path::Path;

use log::info;
use serde::Deserialize;

use super::error::{BoxError, PredictorError};
use super::features::FeatureVector;
use super::model::ClassModel;

const LEAF: i64 = -1;

#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("model expects {expected} features, got {actual}")]
    FeatureCount { expected: usize, actual: usize },
    #[error("tree {tree} has inconsistent array lengths")]
    RaggedArrays { tree: usize },
    #[error("tree {tree} node {node}: {reason}")]
    InvalidNode {
        tree: usize,
        node: usize,
        reason: String,
    },
    #[error("tree {tree} did not reach a leaf")]
    Cycle { tree: usize },
    #[error("{0}")]
    Invalid(String),
}

/// One fitted tree, stored as parallel node arrays.
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

impl DecisionTree {
    fn node_count(&self) -> usize {
        self.children_left.len()
    }

    fn validate(&self, tree: usize, n_features: usize, n_classes: usize) -> Result<(), TreeError> {
        let n = self.node_count();
        if n == 0
            || self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err(TreeError::RaggedArrays { tree });
        }

        for node in 0..n {
            let invalid = |reason: String| TreeError::InvalidNode { tree, node, reason };
            if self.value[node].len() != n_classes {
                return Err(invalid(format!(
                    "value has {} entries, expected {}",
                    self.value[node].len(),
                    n_classes
                )));
            }
            if self.children_left[node] == LEAF {
                continue;
            }
            for child in [self.children_left[node], self.children_right[node]] {
                if child < 0 || child as usize >= n {
                    return Err(invalid(format!("child index {} out of range", child)));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature as usize >= n_features {
                return Err(invalid(format!("feature index {} out of range", feature)));
            }
        }
        Ok(())
    }

    /// Walks from the root to a leaf and returns that leaf's node index.
    fn leaf_for(&self, tree: usize, x: &[f32]) -> Result<usize, TreeError> {
        let mut node = 0usize;
        // A valid tree reaches a leaf in fewer steps than it has nodes.
        for _ in 0..self.node_count() {
            let left = self.children_left[node];
            if left == LEAF {
                return Ok(node);
            }
            let value = f64::from(x[self.feature[node] as usize]);
            node = if value <= self.threshold[node] {
                left as usize
            } else {
                self.children_right[node] as usize
            };
        }
        Err(TreeError::Cycle { tree })
    }
}

#[derive(Debug, Deserialize)]
struct TreeEnsembleDump {
    n_features: usize,
    n_classes: usize,
    trees: Vec<DecisionTree>,
}

/// A single decision tree or a forest of them.
#[derive(Debug, Clone)]
pub struct TreeEnsembleModel {
    n_features: usize,
    n_classes: usize,
    trees: Vec<DecisionTree>,
}

impl TreeEnsembleModel {
    /// Builds a model from fitted trees after checking their structure.
    pub fn new(n_features: usize, n_classes: usize, trees: Vec<DecisionTree>) -> Result<Self, TreeError> {
        if trees.is_empty() {
            return Err(TreeError::Invalid("model has no trees".into()));
        }
        if n_classes == 0 {
            return Err(TreeError::Invalid("model declares zero classes".into()));
        }
        for (i, tree) in trees.iter().enumerate() {
            tree.validate(i, n_features, n_classes)?;
        }
        Ok(Self {
            n_features,
            n_classes,
            trees,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, PredictorError> {
        let dump: TreeEnsembleDump = serde_json::from_str(json)
            .map_err(|e| PredictorError::ModelUnavailable(format!("Invalid tree model: {}", e)))?;
        Self::new(dump.n_features, dump.n_classes, dump.trees)
            .map_err(|e| PredictorError::ModelUnavailable(format!("Invalid tree model: {}", e)))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PredictorError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            PredictorError::ModelUnavailable(format!(
                "Failed to read model file {}: {}",
                path.display(),
                e
            ))
        })?;
        let model = Self::from_json_str(&contents)?;
        info!(
            "Tree model: {} tree(s), {} features, {} classes",
            model.trees.len(),
            model.n_features,
            model.n_classes
        );
        Ok(model)
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Mean class distribution over all trees.
    pub fn predict_proba(&self, x: &[f32]) -> Result<Vec<f64>, TreeError> {
        if x.len() != self.n_features {
            return Err(TreeError::FeatureCount {
                expected: self.n_features,
                actual: x.len(),
            });
        }

        let mut proba = vec![0.0; self.n_classes];
        for (i, tree) in self.trees.iter().enumerate() {
            let leaf = &tree.value[tree.leaf_for(i, x)?];
            let total: f64 = leaf.iter().sum();
            if total > 0.0 {
                for (p, v) in proba.iter_mut().zip(leaf) {
                    *p += v / total;
                }
            }
        }
        let n_trees = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n_trees);
        Ok(proba)
    }
}

impl ClassModel for TreeEnsembleModel {
    fn predict_class(&self, features: &FeatureVector) -> Result<i64, BoxError> {
        let proba = self.predict_proba(features.as_slice())?;
        let mut best = 0;
        for (i, p) in proba.iter().enumerate() {
            if *p > proba[best] {
                best = i;
            }
        }
        Ok(best as i64)
    }

    fn backend(&self) -> &'static str {
        "tree-ensemble"
    }

    fn num_classes(&self) -> Option<usize> {
        Some(self.n_classes)
    }
}
