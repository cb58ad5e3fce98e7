//! Risk scoring and clinical narrative composition.
//!
//! The tier comes from the model probability alone; the indicator list
//! comes from fixed rules over the raw intake fields. The two are
//! deliberately decoupled: a High-tier patient can match none of the
//! indicator rules (the model saw something the rules do not cover), and
//! the summary then says so instead of inventing a cause. Treat the
//! narrative as illustrative context for the reader, not as a causal
//! account of the prediction.

use cardiorisk_core::{
    DerivedFeatures, PatientRecord, PredictionResult, Result, RiskTier, ScaledFeatures,
};

use crate::traits::RiskClassifier;

/// Run the classifier and compose the prediction result.
///
/// `scaled` must be produced from `derived` by the shared scaling step so
/// the narrative and the probability describe the same patient.
pub fn score(
    classifier: &dyn RiskClassifier,
    derived: &DerivedFeatures,
    scaled: &ScaledFeatures,
) -> Result<PredictionResult> {
    let probability = classifier.predict_probability(scaled.values())?;
    let risk_class = RiskTier::from_probability(probability);
    let clinical_summary = compose_summary(risk_class, probability, &derived.record);

    Ok(PredictionResult {
        probability,
        risk_class,
        clinical_summary,
    })
}

/// Collect matched high-risk indicators in fixed priority order.
///
/// Priority: multi-vessel disease, reversible perfusion defect,
/// exertional angina, downsloping ST segment, typical anginal pain.
pub fn high_risk_indicators(record: &PatientRecord) -> Vec<&'static str> {
    let mut indicators = Vec::new();
    if record.ca >= 2 {
        indicators.push("multi-vessel coronary disease");
    }
    if record.thal == 3 {
        indicators.push("reversible perfusion defect");
    }
    if record.exang == 1 {
        indicators.push("exercise-induced angina");
    }
    if record.slope == 2 {
        indicators.push("downsloping ST segment");
    }
    if record.cp == 0 {
        indicators.push("typical anginal chest pain");
    }
    indicators
}

/// Compose the tier-specific narrative for one patient.
pub fn compose_summary(tier: RiskTier, probability: f64, record: &PatientRecord) -> String {
    let percent = probability * 100.0;
    match tier {
        RiskTier::High => {
            let indicators = high_risk_indicators(record);
            let findings = match indicators.as_slice() {
                [] => {
                    "No single dominant clinical indicator; the risk is driven by the \
                     combined feature profile."
                        .to_string()
                }
                [only] => format!("Key finding: {only}."),
                [first, second, ..] => format!("Key findings: {first}; {second}."),
            };
            format!(
                "High risk of coronary artery disease ({percent:.1}% probability). \
                 {findings} Urgent cardiology evaluation is recommended."
            )
        }
        RiskTier::Moderate => format!(
            "Moderate risk of coronary artery disease ({percent:.1}% probability). \
             Further diagnostic evaluation and risk-factor management are recommended."
        ),
        RiskTier::Low => format!(
            "Low risk of coronary artery disease ({percent:.1}% probability). \
             Maintain current lifestyle and routine preventive care."
        ),
    }
}
