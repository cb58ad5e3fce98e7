//! Gradient-boosted tree ensemble inference.
//!
//! Loads the exported classifier from its JSON artifact and evaluates it
//! with a plain loop-based traversal. Node 0 of every tree is the root.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use cardiorisk_core::{Error, Result};

use crate::traits::RiskClassifier;

/// Supported classifier artifact format version.
const FORMAT_VERSION: u32 = 1;

/// A decision tree node (internal or leaf).
///
/// Internal nodes carry `feature >= 0` and child indices; leaf nodes carry
/// `feature == -1` and a leaf value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreeNode {
    /// Feature index to split on (-1 for leaf nodes)
    pub feature: i32,

    /// Split threshold; values strictly below it go left
    pub threshold: f64,

    /// Left child index (-1 for leaf nodes)
    pub left: i32,

    /// Right child index (-1 for leaf nodes)
    pub right: i32,

    /// Leaf value on the margin scale (None for internal nodes)
    pub leaf: Option<f64>,
}

impl TreeNode {
    /// Create a new internal (split) node
    pub fn internal(feature: i32, threshold: f64, left: i32, right: i32) -> Self {
        Self {
            feature,
            threshold,
            left,
            right,
            leaf: None,
        }
    }

    /// Create a new leaf node
    pub fn leaf(value: f64) -> Self {
        Self {
            feature: -1,
            threshold: 0.0,
            left: -1,
            right: -1,
            leaf: Some(value),
        }
    }

    /// Check if this node is a leaf
    pub fn is_leaf(&self) -> bool {
        self.feature < 0 || self.leaf.is_some()
    }
}

/// A single decision tree (node 0 is the root).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    pub fn new(nodes: Vec<TreeNode>) -> Self {
        Self { nodes }
    }

    /// Evaluate this tree on a feature vector.
    ///
    /// Traversal follows the exporter's split convention: a value strictly
    /// below the threshold goes left. Structural anomalies resolve to 0.0
    /// rather than panicking; [`DecisionTree::validate`] rules them out for
    /// any tree accepted at load.
    pub fn evaluate(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;

        loop {
            let Some(node) = self.nodes.get(idx) else {
                return 0.0;
            };

            if node.is_leaf() {
                return node.leaf.unwrap_or(0.0);
            }

            let feature_idx = node.feature as usize;
            let Some(value) = features.get(feature_idx) else {
                return 0.0;
            };

            let next = if *value < node.threshold {
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

    /// Validate tree structure against the expected feature count.
    pub fn validate(&self, num_features: usize) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        for (i, node) in self.nodes.iter().enumerate() {
            if node.is_leaf() {
                if node.leaf.is_none() {
                    return Err(format!("leaf node {i} has no leaf value"));
                }
                continue;
            }

            if node.left < 0 || node.left as usize >= self.nodes.len() {
                return Err(format!("node {} has invalid left child: {}", i, node.left));
            }
            if node.right < 0 || node.right as usize >= self.nodes.len() {
                return Err(format!("node {} has invalid right child: {}", i, node.right));
            }
            if node.feature as usize >= num_features {
                return Err(format!(
                    "node {} splits on unknown feature index: {}",
                    i, node.feature
                ));
            }
        }

        Ok(())
    }
}

/// The trained classifier: a boosted ensemble over the scaled features.
///
/// Margin = base_score + sum of per-tree leaf values; probability is the
/// logistic link over the margin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GbdtClassifier {
    /// Artifact format version
    pub version: u32,

    /// Number of features the ensemble was trained on
    pub num_features: usize,

    /// Margin offset learned at training time
    pub base_score: f64,

    /// Decision trees in the ensemble
    pub trees: Vec<DecisionTree>,
}

impl GbdtClassifier {
    /// Create a new ensemble over `num_features` features
    pub fn new(trees: Vec<DecisionTree>, base_score: f64, num_features: usize) -> Self {
        Self {
            version: FORMAT_VERSION,
            num_features,
            base_score,
            trees,
        }
    }

    /// Validate structure before the model is accepted.
    ///
    /// # Errors
    /// Returns [`Error::Integrity`] for an unsupported version, an empty
    /// ensemble, or any malformed tree.
    pub fn validate(&self) -> Result<()> {
        if self.version != FORMAT_VERSION {
            return Err(Error::integrity(format!(
                "unsupported classifier format version: {}",
                self.version
            )));
        }
        if self.trees.is_empty() {
            return Err(Error::integrity("classifier has no trees"));
        }
        if self.num_features == 0 {
            return Err(Error::integrity("classifier declares zero features"));
        }

        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.num_features)
                .map_err(|e| Error::integrity(format!("tree {i}: {e}")))?;
        }

        Ok(())
    }

    /// Load and validate an ensemble from its JSON artifact.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let model: GbdtClassifier = serde_json::from_str(&json)?;
        model.validate()?;
        Ok(model)
    }

    fn check_input(&self, features: &[f64]) -> Result<()> {
        if features.len() != self.num_features {
            return Err(Error::integrity(format!(
                "classifier expects {} features, got {}",
                self.num_features,
                features.len()
            )));
        }
        Ok(())
    }

    /// Number of trees in the ensemble
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }
}

impl RiskClassifier for GbdtClassifier {
    fn raw_margin(&self, features: &[f64]) -> Result<f64> {
        self.check_input(features)?;

        let mut margin = self.base_score;
        for tree in &self.trees {
            margin += tree.evaluate(features);
        }
        Ok(margin)
    }

    fn predict_probability(&self, features: &[f64]) -> Result<f64> {
        let margin = self.raw_margin(features)?;
        Ok(sigmoid(margin))
    }

    fn name(&self) -> &str {
        "gbdt"
    }
}

/// Logistic link from margin to probability.
pub fn sigmoid(margin: f64) -> f64 {
    1.0 / (1.0 + (-margin).exp())
}
