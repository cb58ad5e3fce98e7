//! Per-feature attribution from the exported explainer artifact.
//!
//! The artifact mirrors the classifier's trees, but every node carries the
//! expected margin at that node (computed offline when the explainer is
//! exported). Walking a patient's path and crediting each child-minus-parent
//! step to the split feature telescopes to leaf minus root per tree, so the
//! contributions plus the recorded baseline reproduce the classifier margin
//! without re-deriving anything about the engine's internals here.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use cardiorisk_core::{Error, Result};

use crate::traits::AttributionEngine;

/// Supported explainer artifact format version.
const FORMAT_VERSION: u32 = 1;

/// A node of a valued tree: split fields as in the classifier, plus the
/// expected margin at the node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValuedNode {
    /// Feature index to split on (-1 for leaf nodes)
    pub feature: i32,

    /// Split threshold; values strictly below it go left
    pub threshold: f64,

    /// Left child index (-1 for leaf nodes)
    pub left: i32,

    /// Right child index (-1 for leaf nodes)
    pub right: i32,

    /// Expected margin at this node
    pub value: f64,
}

impl ValuedNode {
    /// Create a new internal (split) node
    pub fn internal(feature: i32, threshold: f64, left: i32, right: i32, value: f64) -> Self {
        Self {
            feature,
            threshold,
            left,
            right,
            value,
        }
    }

    /// Create a new leaf node
    pub fn leaf(value: f64) -> Self {
        Self {
            feature: -1,
            threshold: 0.0,
            left: -1,
            right: -1,
            value,
        }
    }

    /// Check if this node is a leaf
    pub fn is_leaf(&self) -> bool {
        self.feature < 0
    }
}

/// One valued tree (node 0 is the root).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValuedTree {
    pub nodes: Vec<ValuedNode>,
}

impl ValuedTree {
    pub fn new(nodes: Vec<ValuedNode>) -> Self {
        Self { nodes }
    }

    /// Walk the patient's path, crediting each step to the split feature.
    fn accumulate(&self, features: &[f64], contributions: &mut [f64]) {
        let mut idx = 0usize;

        loop {
            let Some(node) = self.nodes.get(idx) else {
                return;
            };
            if node.is_leaf() {
                return;
            }

            let feature_idx = node.feature as usize;
            let Some(value) = features.get(feature_idx) else {
                return;
            };

            let next = if *value < node.threshold {
                node.left
            } else {
                node.right
            };
            if next < 0 || next as usize >= self.nodes.len() {
                return;
            }

            contributions[feature_idx] += self.nodes[next as usize].value - node.value;
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

/// The exported attribution engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreeAttribution {
    /// Artifact format version
    pub version: u32,

    /// Number of features the explainer was exported for
    pub num_features: usize,

    /// Expected margin over the training population
    pub baseline: f64,

    /// Valued trees mirroring the classifier ensemble
    pub trees: Vec<ValuedTree>,
}

impl TreeAttribution {
    pub fn new(trees: Vec<ValuedTree>, baseline: f64, num_features: usize) -> Self {
        Self {
            version: FORMAT_VERSION,
            num_features,
            baseline,
            trees,
        }
    }

    /// Validate structure before the explainer is accepted.
    ///
    /// # Errors
    /// Returns [`Error::Integrity`] for an unsupported version, an empty
    /// ensemble, or any malformed tree.
    pub fn validate(&self) -> Result<()> {
        if self.version != FORMAT_VERSION {
            return Err(Error::integrity(format!(
                "unsupported explainer format version: {}",
                self.version
            )));
        }
        if self.trees.is_empty() {
            return Err(Error::integrity("explainer has no trees"));
        }
        if self.num_features == 0 {
            return Err(Error::integrity("explainer declares zero features"));
        }

        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.num_features)
                .map_err(|e| Error::integrity(format!("tree {i}: {e}")))?;
        }

        Ok(())
    }

    /// Load and validate an explainer from its JSON artifact.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let engine: TreeAttribution = serde_json::from_str(&json)?;
        engine.validate()?;
        Ok(engine)
    }
}

impl AttributionEngine for TreeAttribution {
    fn baseline(&self) -> f64 {
        self.baseline
    }

    fn contributions(&self, features: &[f64]) -> Result<Vec<f64>> {
        if features.len() != self.num_features {
            return Err(Error::integrity(format!(
                "explainer expects {} features, got {}",
                self.num_features,
                features.len()
            )));
        }

        let mut contributions = vec![0.0; self.num_features];
        for tree in &self.trees {
            tree.accumulate(features, &mut contributions);
        }
        Ok(contributions)
    }
}
