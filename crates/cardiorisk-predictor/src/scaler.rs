//! Standardization of numeric features.
//!
//! The scaler artifact records the per-column mean and scale fitted at
//! training time. Numeric features are standardized with those parameters
//! before inference; categorical and derived bucket fields pass through
//! untouched.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use cardiorisk_core::{DerivedFeatures, Error, Result, ScaledFeatures, FEATURE_NAMES};

use crate::traits::FeatureScaler;

/// Fitted standardization parameters, one entry per numeric column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StandardScaler {
    /// Column names, aligned with `means` and `scales`
    pub columns: Vec<String>,

    /// Per-column training mean
    pub means: Vec<f64>,

    /// Per-column training scale (standard deviation)
    pub scales: Vec<f64>,
}

impl StandardScaler {
    pub fn new(columns: Vec<String>, means: Vec<f64>, scales: Vec<f64>) -> Self {
        Self {
            columns,
            means,
            scales,
        }
    }

    /// Validate shape before the scaler is accepted.
    ///
    /// # Errors
    /// Returns [`Error::Integrity`] for mismatched array lengths or a scale
    /// that is not a positive finite number.
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(Error::integrity("scaler has no columns"));
        }
        if self.columns.len() != self.means.len() || self.columns.len() != self.scales.len() {
            return Err(Error::integrity(format!(
                "scaler arrays disagree: {} columns, {} means, {} scales",
                self.columns.len(),
                self.means.len(),
                self.scales.len()
            )));
        }
        for (column, scale) in self.columns.iter().zip(&self.scales) {
            if !scale.is_finite() || *scale <= 0.0 {
                return Err(Error::integrity(format!(
                    "scaler column '{column}' has non-positive scale {scale}"
                )));
            }
        }
        Ok(())
    }

    /// Load and validate a scaler from its JSON artifact.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let scaler: StandardScaler = serde_json::from_str(&json)?;
        scaler.validate()?;
        Ok(scaler)
    }

    /// Whether the scaler was fitted for the named column.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    fn position(&self, column: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| Error::integrity(format!("scaler has no column '{column}'")))
    }
}

impl FeatureScaler for StandardScaler {
    fn transform(&self, column: &str, value: f64) -> Result<f64> {
        let idx = self.position(column)?;
        Ok((value - self.means[idx]) / self.scales[idx])
    }
}

/// Standardize the numeric subset of a derived feature vector.
///
/// `numeric_columns` is the list loaded from the artifact set, never
/// re-derived, so the served pipeline always standardizes exactly the
/// columns the training pipeline did. Called once per request; the result
/// is shared by the classifier and the attribution engine.
pub fn scale_features(
    scaler: &dyn FeatureScaler,
    numeric_columns: &[String],
    derived: &DerivedFeatures,
) -> Result<ScaledFeatures> {
    let mut values = derived.ordered_values();
    for (idx, name) in FEATURE_NAMES.iter().enumerate() {
        if numeric_columns.iter().any(|c| c == name) {
            values[idx] = scaler.transform(name, values[idx])?;
        }
    }
    Ok(ScaledFeatures::new(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardiorisk_core::{derive_features, PatientRecord};

    fn sample_scaler() -> StandardScaler {
        StandardScaler::new(
            vec!["age".to_string(), "chol".to_string()],
            vec![54.0, 246.0],
            vec![9.0, 51.0],
        )
    }

    fn sample_record() -> PatientRecord {
        PatientRecord {
            age: 63.0,
            sex: 1,
            cp: 0,
            trestbps: 145.0,
            chol: 233.0,
            fbs: 1,
            restecg: 0,
            thalach: 150.0,
            exang: 0,
            oldpeak: 2.3,
            slope: 0,
            ca: 0,
            thal: 1,
        }
    }

    #[test]
    fn standardizes_against_training_parameters() {
        let scaler = sample_scaler();
        let z = scaler.transform("age", 63.0).unwrap();
        assert!((z - 1.0).abs() < 1e-12);

        let z = scaler.transform("chol", 246.0).unwrap();
        assert!(z.abs() < 1e-12);
    }

    #[test]
    fn unknown_column_is_integrity_error() {
        let scaler = sample_scaler();
        let err = scaler.transform("nonsense", 1.0).unwrap_err();
        assert!(matches!(err, Error::Integrity(_)));
    }

    #[test]
    fn validation_rejects_shape_mismatch() {
        let scaler = StandardScaler::new(
            vec!["age".to_string(), "chol".to_string()],
            vec![54.0],
            vec![9.0, 51.0],
        );
        assert!(scaler.validate().is_err());
    }

    #[test]
    fn validation_rejects_zero_scale() {
        let scaler = StandardScaler::new(vec!["age".to_string()], vec![54.0], vec![0.0]);
        assert!(scaler.validate().is_err());
    }

    #[test]
    fn transform_is_deterministic() {
        let scaler = sample_scaler();
        let first = scaler.transform("age", 47.5).unwrap();
        let second = scaler.transform("age", 47.5).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn scales_only_numeric_columns() {
        let scaler = sample_scaler();
        let numeric = vec!["age".to_string(), "chol".to_string()];
        let derived = derive_features(&sample_record()).unwrap();

        let scaled = scale_features(&scaler, &numeric, &derived).unwrap();
        let values = scaled.values();

        // age standardized, chol standardized, everything else untouched
        assert!((values[0] - 1.0).abs() < 1e-12);
        assert!((values[4] - (233.0 - 246.0) / 51.0).abs() < 1e-12);
        assert_eq!(values[3], 145.0); // trestbps not in the numeric list here
        assert_eq!(values[13], 2.0); // age_group untouched
    }

    #[test]
    fn repeated_scaling_yields_identical_output() {
        let scaler = sample_scaler();
        let numeric = vec!["age".to_string(), "chol".to_string()];
        let mut derived = derive_features(&sample_record()).unwrap();
        // zero the interaction terms to pin the pass-through positions too
        derived.age_chol_interaction = 0.0;
        derived.cp_exang_interaction = 0.0;

        let first = scale_features(&scaler, &numeric, &derived).unwrap();
        let second = scale_features(&scaler, &numeric, &derived).unwrap();
        assert_eq!(first.values(), second.values());
    }
}
