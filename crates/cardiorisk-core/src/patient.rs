//! Patient record types for cardiovascular risk prediction.
//!
//! Field codes follow the UCI heart-disease convention used by the
//! training pipeline (cp, trestbps, thalach, ...).

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A validated clinical intake record.
///
/// Thirteen raw features as captured at intake. Categorical fields are
/// integer codes; continuous fields are physical measurements. Records are
/// immutable once constructed; derived features are computed downstream and
/// never stored back onto the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRecord {
    /// Age in years (18-100)
    pub age: f64,

    /// Sex: 0 = female, 1 = male
    pub sex: u8,

    /// Chest pain type: 0 = typical angina, 1 = atypical angina,
    /// 2 = non-anginal pain, 3 = asymptomatic
    pub cp: u8,

    /// Resting systolic blood pressure in mmHg (80-300)
    pub trestbps: f64,

    /// Serum cholesterol in mg/dl (100-600)
    pub chol: f64,

    /// Fasting blood sugar > 120 mg/dl: 0 = no, 1 = yes
    pub fbs: u8,

    /// Resting ECG result: 0 = normal, 1 = ST-T abnormality,
    /// 2 = left ventricular hypertrophy
    pub restecg: u8,

    /// Maximum heart rate achieved during exercise test (60-220)
    pub thalach: f64,

    /// Exercise-induced angina: 0 = no, 1 = yes
    pub exang: u8,

    /// ST depression induced by exercise relative to rest (0-10)
    pub oldpeak: f64,

    /// Slope of the peak exercise ST segment: 0 = upsloping,
    /// 1 = flat, 2 = downsloping
    pub slope: u8,

    /// Number of major vessels colored by fluoroscopy (0-3)
    pub ca: u8,

    /// Thalassemia status: 1 = fixed defect, 2 = normal,
    /// 3 = reversible defect
    pub thal: u8,
}

impl PatientRecord {
    /// Raw feature values in intake order, aligned with the first thirteen
    /// entries of the canonical feature ordering.
    pub fn raw_values(&self) -> [f64; 13] {
        [
            self.age,
            f64::from(self.sex),
            f64::from(self.cp),
            self.trestbps,
            self.chol,
            f64::from(self.fbs),
            f64::from(self.restecg),
            self.thalach,
            f64::from(self.exang),
            self.oldpeak,
            f64::from(self.slope),
            f64::from(self.ca),
            f64::from(self.thal),
        ]
    }

    /// Check every field against its clinical intake range.
    ///
    /// Returns one entry per violation as `(field, reason)` so callers can
    /// report all problems in a single round trip rather than the first.
    pub fn violations(&self) -> Vec<(&'static str, String)> {
        let mut violations = Vec::new();

        if !(18.0..=100.0).contains(&self.age) {
            violations.push(("age", format!("{} out of range [18, 100]", self.age)));
        }
        if self.sex > 1 {
            violations.push(("sex", format!("{} must be 0 or 1", self.sex)));
        }
        if self.cp > 3 {
            violations.push(("cp", format!("{} out of range [0, 3]", self.cp)));
        }
        if !(80.0..=300.0).contains(&self.trestbps) {
            violations.push((
                "trestbps",
                format!("{} out of range [80, 300]", self.trestbps),
            ));
        }
        if !(100.0..=600.0).contains(&self.chol) {
            violations.push(("chol", format!("{} out of range [100, 600]", self.chol)));
        }
        if self.fbs > 1 {
            violations.push(("fbs", format!("{} must be 0 or 1", self.fbs)));
        }
        if self.restecg > 2 {
            violations.push(("restecg", format!("{} out of range [0, 2]", self.restecg)));
        }
        if !(60.0..=220.0).contains(&self.thalach) {
            violations.push((
                "thalach",
                format!("{} out of range [60, 220]", self.thalach),
            ));
        }
        if self.exang > 1 {
            violations.push(("exang", format!("{} must be 0 or 1", self.exang)));
        }
        if !(0.0..=10.0).contains(&self.oldpeak) {
            violations.push(("oldpeak", format!("{} out of range [0, 10]", self.oldpeak)));
        }
        if self.slope > 2 {
            violations.push(("slope", format!("{} out of range [0, 2]", self.slope)));
        }
        if self.ca > 3 {
            violations.push(("ca", format!("{} out of range [0, 3]", self.ca)));
        }
        if !(1..=3).contains(&self.thal) {
            violations.push(("thal", format!("{} out of range [1, 3]", self.thal)));
        }

        violations
    }

    /// Validate the record, rejecting it if any field is out of range.
    ///
    /// # Errors
    /// Returns [`Error::InvalidInput`] naming every offending field.
    pub fn validate(&self) -> Result<()> {
        let violations = self.violations();
        if violations.is_empty() {
            return Ok(());
        }

        let fields: Vec<&str> = violations.iter().map(|(f, _)| *f).collect();
        let reasons: Vec<String> = violations
            .iter()
            .map(|(f, r)| format!("{f} {r}"))
            .collect();
        Err(Error::invalid_input(fields.join(", "), reasons.join("; ")))
    }
}
