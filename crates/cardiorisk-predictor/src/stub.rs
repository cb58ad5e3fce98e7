//! Deterministic doubles for the model capability seams.
//!
//! Used by unit tests, router tests, and the benches; shipped as a public
//! module so downstream crates can exercise the full pipeline without real
//! artifacts on disk.

use std::collections::BTreeMap;

use cardiorisk_core::{ModelMetrics, Result, FEATURE_NAMES, RAW_FEATURE_COUNT};

use crate::artifacts::ArtifactStore;
use crate::cohort::CohortTable;
use crate::traits::{AttributionEngine, FeatureScaler, RiskClassifier};

/// Classifier double returning one fixed probability for every input.
#[derive(Debug, Clone)]
pub struct StubClassifier {
    probability: f64,
}

impl StubClassifier {
    /// Probability must lie in (0, 1) for the margin to be finite.
    pub fn new(probability: f64) -> Self {
        Self { probability }
    }
}

impl RiskClassifier for StubClassifier {
    fn raw_margin(&self, _features: &[f64]) -> Result<f64> {
        Ok((self.probability / (1.0 - self.probability)).ln())
    }

    fn predict_probability(&self, _features: &[f64]) -> Result<f64> {
        Ok(self.probability)
    }

    fn name(&self) -> &str {
        "stub-classifier"
    }
}

/// Scaler double that passes every value through unchanged.
#[derive(Debug, Clone, Default)]
pub struct StubScaler;

impl FeatureScaler for StubScaler {
    fn transform(&self, _column: &str, value: f64) -> Result<f64> {
        Ok(value)
    }
}

/// Attribution double returning one fixed contribution vector.
#[derive(Debug, Clone)]
pub struct StubAttribution {
    values: Vec<f64>,
    baseline: f64,
}

impl StubAttribution {
    pub fn new(values: Vec<f64>, baseline: f64) -> Self {
        Self { values, baseline }
    }
}

impl AttributionEngine for StubAttribution {
    fn baseline(&self) -> f64 {
        self.baseline
    }

    fn contributions(&self, _features: &[f64]) -> Result<Vec<f64>> {
        Ok(self.values.clone())
    }
}

/// Numeric columns the default stub scaler claims, mirroring the trained
/// artifact set.
pub fn stub_numeric_features() -> Vec<String> {
    [
        "age",
        "trestbps",
        "chol",
        "thalach",
        "oldpeak",
        "hr_achievement",
        "age_chol_interaction",
    ]
    .iter()
    .map(|n| (*n).to_string())
    .collect()
}

/// A complete in-memory store built from stubs.
///
/// The classifier always answers `probability`; contributions are a fixed
/// alternating ramp over all features.
pub fn stub_store(probability: f64) -> Result<ArtifactStore> {
    let contributions: Vec<f64> = (0..FEATURE_NAMES.len())
        .map(|i| {
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            sign * (i as f64 + 1.0) * 0.01
        })
        .collect();
    stub_store_with(
        StubClassifier::new(probability),
        StubAttribution::new(contributions, 0.1),
    )
}

/// A complete in-memory store around the given doubles.
pub fn stub_store_with(
    classifier: StubClassifier,
    engine: StubAttribution,
) -> Result<ArtifactStore> {
    let feature_names: Vec<String> = FEATURE_NAMES.iter().map(|n| (*n).to_string()).collect();

    let mut metrics: ModelMetrics = BTreeMap::new();
    metrics.insert("accuracy".to_string(), 0.885);
    metrics.insert("precision".to_string(), 0.871);
    metrics.insert("recall".to_string(), 0.903);
    metrics.insert("f1".to_string(), 0.887);
    metrics.insert("roc_auc".to_string(), 0.931);

    let columns: Vec<Vec<f64>> = (0..RAW_FEATURE_COUNT)
        .map(|col| (1..=50).map(|row| (row as f64) + (col as f64) * 0.5).collect())
        .collect();
    let cohort = CohortTable::from_columns(columns)?;

    ArtifactStore::assemble(
        Box::new(classifier),
        Box::new(StubScaler),
        Box::new(engine),
        feature_names,
        stub_numeric_features(),
        metrics,
        cohort,
        BTreeMap::new(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_classifier_is_fixed() {
        let classifier = StubClassifier::new(0.42);
        assert_eq!(classifier.predict_probability(&[1.0]).unwrap(), 0.42);
        assert_eq!(classifier.predict_probability(&[]).unwrap(), 0.42);

        let margin = classifier.raw_margin(&[]).unwrap();
        assert!((margin - (0.42f64 / 0.58).ln()).abs() < 1e-12);
    }

    #[test]
    fn stub_store_assembles() {
        let store = stub_store(0.5).unwrap();
        assert_eq!(store.feature_names().len(), FEATURE_NAMES.len());
        assert_eq!(store.cohort().size(), 50);
        assert!(store.metrics().contains_key("accuracy"));
    }
}
