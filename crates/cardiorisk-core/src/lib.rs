//! CardioRisk Core
//!
//! Core types shared across CardioRisk components.
//!
//! This crate provides:
//! - The validated patient record and its clinical intake ranges
//! - Feature derivation and the canonical model feature ordering
//! - Result types for prediction, attribution, and cohort comparison
//! - Error types and result handling

pub mod error;
pub mod features;
pub mod patient;
pub mod results;

pub use error::{Error, Result};
pub use features::{
    derive_features, DerivedFeatures, ScaledFeatures, FEATURE_COUNT, FEATURE_NAMES,
    RAW_FEATURE_COUNT,
};
pub use patient::PatientRecord;
pub use results::{
    AttributionResult, CohortPosition, Direction, FeatureContribution, FeaturePosition,
    ModelMetrics, PredictionResult, RiskAssessment, RiskTier,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::features::{derive_features, DerivedFeatures, ScaledFeatures, FEATURE_NAMES};
    pub use crate::patient::PatientRecord;
    pub use crate::results::{AttributionResult, CohortPosition, PredictionResult, RiskTier};
}
