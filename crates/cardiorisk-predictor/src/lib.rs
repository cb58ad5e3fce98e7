//! CardioRisk Predictor
//!
//! Inference pipeline for cardiovascular risk assessment.
//!
//! The pipeline runs in three stages behind one facade:
//! - Feature preparation: derived clinical features plus standardization
//! - Scoring: gradient-boosted tree ensemble with a logistic link
//! - Attribution: per-feature contributions from valued decision trees
//!
//! All stages are plain CPU arithmetic over `f64` slices; a single
//! assessment completes in microseconds with no allocation beyond the
//! result structs.

pub mod artifacts;
pub mod attribution;
pub mod cohort;
pub mod explainer;
pub mod gbdt;
pub mod predictor;
pub mod scaler;
pub mod scorer;
pub mod stub;
pub mod traits;

pub use artifacts::{ArtifactPaths, ArtifactStore};
pub use attribution::{TreeAttribution, ValuedNode, ValuedTree};
pub use cohort::CohortTable;
pub use explainer::{explain, DEFAULT_TOP_FEATURES};
pub use gbdt::{sigmoid, DecisionTree, GbdtClassifier, TreeNode};
pub use predictor::{ModelInfo, RiskPredictor};
pub use scaler::{scale_features, StandardScaler};
pub use scorer::{high_risk_indicators, score};
pub use traits::{AttributionEngine, FeatureScaler, RiskClassifier};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::artifacts::{ArtifactPaths, ArtifactStore};
    pub use crate::predictor::{ModelInfo, RiskPredictor};
    pub use crate::traits::{AttributionEngine, FeatureScaler, RiskClassifier};
    pub use cardiorisk_core::prelude::*;
}
