//! Result types returned by the prediction pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Risk tier classification derived from predicted probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTier {
    /// Probability below 0.30
    Low,
    /// Probability in [0.30, 0.70)
    Moderate,
    /// Probability at or above 0.70
    High,
}

impl RiskTier {
    /// Classify a predicted probability. Boundary values land in the
    /// higher tier.
    pub fn from_probability(probability: f64) -> Self {
        if probability < 0.3 {
            Self::Low
        } else if probability < 0.7 {
            Self::Moderate
        } else {
            Self::High
        }
    }

    /// Human-readable tier label as shown in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low Risk",
            Self::Moderate => "Moderate Risk",
            Self::High => "High Risk",
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Output of the risk scorer for one patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Predicted probability of coronary artery disease, in [0, 1]
    pub probability: f64,

    /// Tier obtained by thresholding the probability
    pub risk_class: RiskTier,

    /// Narrative interpretation composed from the tier and rule-based
    /// indicators
    pub clinical_summary: String,
}

/// Whether a feature pushed the prediction toward or away from disease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    IncreasesRisk,
    DecreasesRisk,
}

impl Direction {
    /// Non-negative contributions count as risk-increasing.
    pub fn from_contribution(contribution: f64) -> Self {
        if contribution >= 0.0 {
            Self::IncreasesRisk
        } else {
            Self::DecreasesRisk
        }
    }
}

/// One feature's share of the prediction, as attributed by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureContribution {
    /// Feature name from the canonical ordering
    pub feature: String,

    /// Signed contribution on the model's margin scale
    pub contribution: f64,

    /// Absolute contribution, the ranking key
    pub magnitude: f64,

    /// Sign of the contribution
    pub direction: Direction,

    /// Short clinical note for the feature, phrased for the direction
    pub clinical_note: String,
}

/// Ranked per-feature attribution for one prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionResult {
    /// Expected model margin over the training population; the anchor the
    /// contributions are measured against
    pub baseline: f64,

    /// Contributions sorted by descending magnitude, truncated to the
    /// requested count
    pub contributions: Vec<FeatureContribution>,
}

/// One raw feature located within the reference cohort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturePosition {
    /// Feature name
    pub feature: String,

    /// The patient's value
    pub value: f64,

    /// Fraction of the cohort at or below the patient's value, in [0, 1]
    pub percentile: f64,

    /// Cohort median for the feature
    pub cohort_median: f64,
}

/// A patient's raw features placed against the reference cohort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortPosition {
    /// Number of reference patients the comparison is against
    pub cohort_size: usize,

    /// One entry per raw intake feature
    pub features: Vec<FeaturePosition>,
}

/// Combined prediction and attribution for one patient, computed from a
/// single derivation and scaling pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub prediction: PredictionResult,
    pub attribution: AttributionResult,
}

/// Held-out evaluation metrics recorded when the model was trained.
pub type ModelMetrics = BTreeMap<String, f64>;
