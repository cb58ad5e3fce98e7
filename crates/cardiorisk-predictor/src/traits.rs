//! Capability traits for the trained model components.
//!
//! The scorer, explainer, and artifact store talk to the trained model only
//! through these seams, so the serialized form of any component can change
//! without touching the pipeline, and tests can substitute the
//! deterministic doubles from [`crate::stub`].
//!
//! Inference here is a pure CPU tree walk, so all three traits are
//! synchronous.

use cardiorisk_core::Result;

/// A trained binary classifier over the scaled feature vector.
pub trait RiskClassifier: Send + Sync {
    /// Additive score on the margin scale, before the logistic link.
    fn raw_margin(&self, features: &[f64]) -> Result<f64>;

    /// Probability of disease in [0, 1].
    fn predict_probability(&self, features: &[f64]) -> Result<f64>;

    /// Identifying name for logs and diagnostics.
    fn name(&self) -> &str;
}

/// A fitted per-column transform applied to numeric features before
/// inference, matching how the classifier was trained.
///
/// Implementations hold no mutable state; transforming the same value
/// twice yields the same output.
pub trait FeatureScaler: Send + Sync {
    /// Transform one value of the named column.
    fn transform(&self, column: &str, value: f64) -> Result<f64>;
}

/// An engine that decomposes one prediction into per-feature signed
/// contributions on the margin scale.
pub trait AttributionEngine: Send + Sync {
    /// Expected margin over the training population.
    fn baseline(&self) -> f64;

    /// Signed contribution per feature, in canonical feature order.
    /// Output length always equals the input length.
    fn contributions(&self, features: &[f64]) -> Result<Vec<f64>>;
}
