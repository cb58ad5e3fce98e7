//! Feature derivation for the risk model.
//!
//! The classifier was trained on 20 features: the 13 raw intake fields plus
//! 7 derived clinical fields. [`FEATURE_NAMES`] fixes the training-time
//! column order; every model artifact is checked against it at load.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::patient::PatientRecord;

/// Number of raw intake features.
pub const RAW_FEATURE_COUNT: usize = 13;

/// Number of model features (raw + derived).
pub const FEATURE_COUNT: usize = 20;

/// Canonical feature order as used at training time.
///
/// Raw intake fields first, derived fields after, in fixed positions.
/// Artifacts that disagree with this order are rejected at load.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age",
    "sex",
    "cp",
    "trestbps",
    "chol",
    "fbs",
    "restecg",
    "thalach",
    "exang",
    "oldpeak",
    "slope",
    "ca",
    "thal",
    "age_group",
    "cp_severity",
    "bp_category",
    "chol_risk",
    "hr_achievement",
    "age_chol_interaction",
    "cp_exang_interaction",
];

/// A patient record augmented with the seven derived clinical fields.
///
/// Produced by [`derive_features`]; immutable once built. The raw record is
/// kept alongside so downstream consumers (narrative composition, cohort
/// comparison) never need to re-derive anything.
#[derive(Debug, Clone, Serialize)]
pub struct DerivedFeatures {
    #[serde(flatten)]
    pub record: PatientRecord,

    /// Age bucket: <40 young, <55 middle-aged, <65 older, else elderly
    pub age_group: u8,

    /// Chest-pain severity rank: typical angina most severe (4) down to
    /// asymptomatic (1)
    pub cp_severity: u8,

    /// Blood-pressure bucket over trestbps: <120, <130, <140, else
    pub bp_category: u8,

    /// Cholesterol bucket: <200 desirable, <240 borderline, else high
    pub chol_risk: u8,

    /// Fraction of age-predicted maximum heart rate achieved
    pub hr_achievement: f64,

    /// Age and cholesterol interaction term (age * chol / 1000)
    pub age_chol_interaction: f64,

    /// Chest pain and exertional angina interaction term (cp * exang)
    pub cp_exang_interaction: f64,
}

impl DerivedFeatures {
    /// Emit all 20 feature values in [`FEATURE_NAMES`] order.
    pub fn ordered_values(&self) -> [f64; FEATURE_COUNT] {
        let mut values = [0.0; FEATURE_COUNT];
        values[..RAW_FEATURE_COUNT].copy_from_slice(&self.record.raw_values());
        values[13] = f64::from(self.age_group);
        values[14] = f64::from(self.cp_severity);
        values[15] = f64::from(self.bp_category);
        values[16] = f64::from(self.chol_risk);
        values[17] = self.hr_achievement;
        values[18] = self.age_chol_interaction;
        values[19] = self.cp_exang_interaction;
        values
    }
}

/// Feature values after standardization of the numeric subset.
///
/// Same length and order as [`FEATURE_NAMES`]. Never serialized or
/// persisted; computed once per request and handed to both the classifier
/// and the attribution engine so the two always see identical inputs.
#[derive(Debug, Clone)]
pub struct ScaledFeatures([f64; FEATURE_COUNT]);

impl ScaledFeatures {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }
}

/// Compute the seven derived fields from a raw record.
///
/// Pure and deterministic; touches no artifact state, so it behaves the
/// same before and after model load. Thresholds match the training
/// pipeline exactly: a value equal to a bucket boundary lands in the
/// higher bucket.
///
/// # Errors
/// Returns [`Error::InvalidInput`] when `cp` is not a known chest-pain
/// code or when `age` makes the age-predicted maximum heart rate
/// (220 - age) non-positive.
pub fn derive_features(record: &PatientRecord) -> Result<DerivedFeatures> {
    let cp_severity = cp_severity(record.cp)?;

    let denominator = 220.0 - record.age;
    if denominator <= 0.0 {
        return Err(Error::invalid_input(
            "age",
            format!(
                "{} leaves no age-predicted maximum heart rate (220 - age must be positive)",
                record.age
            ),
        ));
    }

    Ok(DerivedFeatures {
        record: record.clone(),
        age_group: age_group(record.age),
        cp_severity,
        bp_category: bp_category(record.trestbps),
        chol_risk: chol_risk(record.chol),
        hr_achievement: record.thalach / denominator,
        age_chol_interaction: record.age * record.chol / 1000.0,
        cp_exang_interaction: f64::from(record.cp) * f64::from(record.exang),
    })
}

fn age_group(age: f64) -> u8 {
    if age < 40.0 {
        0
    } else if age < 55.0 {
        1
    } else if age < 65.0 {
        2
    } else {
        3
    }
}

fn cp_severity(cp: u8) -> Result<u8> {
    match cp {
        0 => Ok(4),
        1 => Ok(3),
        2 => Ok(2),
        3 => Ok(1),
        other => Err(Error::invalid_input(
            "cp",
            format!("{other} is not a known chest-pain code"),
        )),
    }
}

fn bp_category(trestbps: f64) -> u8 {
    if trestbps < 120.0 {
        0
    } else if trestbps < 130.0 {
        1
    } else if trestbps < 140.0 {
        2
    } else {
        3
    }
}

fn chol_risk(chol: f64) -> u8 {
    if chol < 200.0 {
        0
    } else if chol < 240.0 {
        1
    } else {
        2
    }
}
