//! Service-level tests over a real artifact directory.
//!
//! Covers the degraded-start story: the service boots with no artifacts on
//! disk, reports itself degraded, refuses model requests with 503, and
//! recovers through the reload endpoint once the artifact files appear.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusBuilder;
use tempfile::TempDir;
use tower::ServiceExt;

use cardiorisk_api::{create_router, AppState, ServiceConfig};
use cardiorisk_predictor::{sigmoid, ArtifactPaths, RiskPredictor};

const MODEL_JSON: &str = r#"{
  "version": 1,
  "num_features": 20,
  "base_score": 0.0,
  "trees": [
    {
      "nodes": [
        { "feature": 15, "threshold": 2.5, "left": 1, "right": 2, "leaf": null },
        { "feature": -1, "threshold": 0.0, "left": -1, "right": -1, "leaf": -1.5 },
        { "feature": -1, "threshold": 0.0, "left": -1, "right": -1, "leaf": 1.5 }
      ]
    }
  ]
}"#;

const SCALER_JSON: &str = r#"{
  "columns": ["age", "trestbps", "chol", "thalach", "oldpeak", "hr_achievement", "age_chol_interaction"],
  "means": [54.0, 131.0, 247.0, 150.0, 1.05, 0.8, 13.679],
  "scales": [9.0, 14.0, 14.0, 23.0, 1.25, 0.1, 1.0]
}"#;

const EXPLAINER_JSON: &str = r#"{
  "version": 1,
  "num_features": 20,
  "baseline": 0.0,
  "trees": [
    {
      "nodes": [
        { "feature": 15, "threshold": 2.5, "left": 1, "right": 2, "value": 0.0 },
        { "feature": -1, "threshold": 0.0, "left": -1, "right": -1, "value": -1.5 },
        { "feature": -1, "threshold": 0.0, "left": -1, "right": -1, "value": 1.5 }
      ]
    }
  ]
}"#;

const FEATURE_NAMES_JSON: &str = r#"[
  "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalach",
  "exang", "oldpeak", "slope", "ca", "thal", "age_group", "cp_severity",
  "bp_category", "chol_risk", "hr_achievement", "age_chol_interaction",
  "cp_exang_interaction"
]"#;

const NUMERIC_FEATURES_JSON: &str = r#"[
  "age", "trestbps", "chol", "thalach", "oldpeak", "hr_achievement",
  "age_chol_interaction"
]"#;

const METRICS_JSON: &str = r#"{
  "accuracy": 0.885,
  "precision": 0.871,
  "recall": 0.903,
  "f1": 0.887,
  "roc_auc": 0.931
}"#;

const COHORT_CSV: &str = "\
age,sex,cp,trestbps,chol,fbs,restecg,thalach,exang,oldpeak,slope,ca,thal
40,0,0,120,180,0,0,170,0,0.0,0,0,1
50,1,1,130,210,0,1,160,0,0.5,1,0,2
60,1,2,140,240,1,1,150,1,1.0,1,1,2
70,1,3,160,280,1,2,120,1,2.0,2,2,3
";

const PATIENT_JSON: &str = r#"{
  "age": 63, "sex": 1, "cp": 0, "trestbps": 145, "chol": 233, "fbs": 1,
  "restecg": 0, "thalach": 150, "exang": 0, "oldpeak": 2.3, "slope": 0,
  "ca": 0, "thal": 1
}"#;

fn write_artifacts(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("model.json"), MODEL_JSON).unwrap();
    fs::write(dir.join("scaler.json"), SCALER_JSON).unwrap();
    fs::write(dir.join("explainer.json"), EXPLAINER_JSON).unwrap();
    fs::write(dir.join("feature_names.json"), FEATURE_NAMES_JSON).unwrap();
    fs::write(dir.join("numerical_features.json"), NUMERIC_FEATURES_JSON).unwrap();
    fs::write(dir.join("metrics.json"), METRICS_JSON).unwrap();
    fs::write(dir.join("cohort.csv"), COHORT_CSV).unwrap();
}

fn state_for(artifacts_dir: &Path) -> AppState {
    let predictor = Arc::new(RiskPredictor::new(ArtifactPaths::new(artifacts_dir)));
    // Startup load; failure leaves the service degraded, as main does.
    let _ = predictor.load();
    let handle = PrometheusBuilder::new().build_recorder().handle();
    AppState::new(predictor, ServiceConfig::default(), handle)
}

async fn call(
    state: &AppState,
    method: &str,
    uri: &str,
    body: &str,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = create_router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn degraded_start_recovers_through_reload() {
    let dir = TempDir::new().unwrap();
    let artifacts = dir.path().join("artifacts");

    // Boot with nothing on disk.
    let state = state_for(&artifacts);

    let (status, body) = call(&state, "GET", "/health", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");

    let (status, body) = call(&state, "POST", "/v1/predict", PATIENT_JSON).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["kind"], "not_ready");

    // A reload before the files exist fails and stays degraded.
    let (status, _) = call(&state, "POST", "/admin/reload", "").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    // Operator ships the artifacts and reloads.
    write_artifacts(&artifacts);
    let (status, body) = call(&state, "POST", "/admin/reload", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = call(&state, "GET", "/health", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model_loaded"], true);

    // The single tree routes this patient right on bp_category.
    let (status, body) = call(&state, "POST", "/v1/predict", PATIENT_JSON).await;
    assert_eq!(status, StatusCode::OK);
    let probability = body["probability"].as_f64().unwrap();
    assert!((probability - sigmoid(1.5)).abs() < 1e-9);
    assert_eq!(body["risk_class"], "High");
}

#[tokio::test]
async fn serves_immediately_when_artifacts_exist() {
    let dir = TempDir::new().unwrap();
    let artifacts = dir.path().join("artifacts");
    write_artifacts(&artifacts);

    let state = state_for(&artifacts);

    let (status, body) = call(&state, "POST", "/v1/assess?top_n=3", PATIENT_JSON).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["assessment_id"].as_str().unwrap().is_empty());
    assert_eq!(body["prediction"]["risk_class"], "High");

    let contributions = body["attribution"]["contributions"].as_array().unwrap();
    assert_eq!(contributions[0]["feature"], "bp_category");
    assert_eq!(contributions[0]["direction"], "increases_risk");

    let (status, body) = call(&state, "GET", "/v1/model", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metrics"]["roc_auc"], 0.931);
    assert_eq!(body["artifacts"].as_object().unwrap().len(), 7);

    let (status, body) = call(&state, "POST", "/v1/cohort", PATIENT_JSON).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cohort_size"], 4);
}
