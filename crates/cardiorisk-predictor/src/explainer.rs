//! Ranking and annotation of per-feature contributions.
//!
//! Wraps the attribution seam: queries one contribution per feature, pairs
//! values with the loaded feature names, ranks by absolute magnitude, and
//! truncates to the requested count. A length mismatch between the engine's
//! output and the feature-name list means the artifacts disagree about the
//! schema and aborts the request.

use cardiorisk_core::{
    AttributionResult, Direction, Error, FeatureContribution, Result, ScaledFeatures,
};

use crate::traits::AttributionEngine;

/// Default number of ranked contributions returned.
pub const DEFAULT_TOP_FEATURES: usize = 5;

/// Query the engine and rank its per-feature contributions.
///
/// `feature_names` is the list loaded from the artifact set; its order
/// matches the engine's output order by the store's startup assertion.
/// Ranking is stable: ties keep their original feature-list order.
///
/// # Errors
/// Returns [`Error::Integrity`] when the engine yields a different number
/// of contributions than there are feature names.
pub fn explain(
    engine: &dyn AttributionEngine,
    feature_names: &[String],
    scaled: &ScaledFeatures,
    top_n: usize,
) -> Result<AttributionResult> {
    let values = engine.contributions(scaled.values())?;
    if values.len() != feature_names.len() {
        return Err(Error::integrity(format!(
            "attribution engine returned {} contributions for {} features",
            values.len(),
            feature_names.len()
        )));
    }

    let mut contributions: Vec<FeatureContribution> = feature_names
        .iter()
        .zip(values)
        .map(|(feature, contribution)| {
            let direction = Direction::from_contribution(contribution);
            FeatureContribution {
                feature: feature.clone(),
                contribution,
                magnitude: contribution.abs(),
                direction,
                clinical_note: clinical_note(feature, direction),
            }
        })
        .collect();

    contributions.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));
    contributions.truncate(top_n);

    Ok(AttributionResult {
        baseline: engine.baseline(),
        contributions,
    })
}

/// Short clinical reading of one contribution, phrased for its direction.
fn clinical_note(feature: &str, direction: Direction) -> String {
    let subject = match feature {
        "age" => "Patient age",
        "sex" => "Patient sex",
        "cp" => "Chest pain type",
        "trestbps" => "Resting blood pressure",
        "chol" => "Serum cholesterol",
        "fbs" => "Fasting blood sugar",
        "restecg" => "Resting ECG result",
        "thalach" => "Maximum heart rate achieved",
        "exang" => "Exercise-induced angina",
        "oldpeak" => "Exercise-induced ST depression",
        "slope" => "Peak exercise ST slope",
        "ca" => "Number of vessels on angiography",
        "thal" => "Thalassemia status",
        "age_group" => "Age bracket",
        "cp_severity" => "Chest pain severity rank",
        "bp_category" => "Blood pressure category",
        "chol_risk" => "Cholesterol category",
        "hr_achievement" => "Heart rate achievement ratio",
        "age_chol_interaction" => "Combined age and cholesterol profile",
        "cp_exang_interaction" => "Chest pain combined with exertional angina",
        other => other,
    };
    match direction {
        Direction::IncreasesRisk => {
            format!("{subject} pushed this prediction toward disease.")
        }
        Direction::DecreasesRisk => {
            format!("{subject} pulled this prediction away from disease.")
        }
    }
}
