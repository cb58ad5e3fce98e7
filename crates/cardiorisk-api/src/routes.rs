//! HTTP routes and handlers

use std::time::Instant;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use cardiorisk_core::{
    AttributionResult, CohortPosition, Error, PatientRecord, PredictionResult,
};
use cardiorisk_predictor::ModelInfo;

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/v1/predict", post(predict))
        .route("/v1/explain", post(explain))
        .route("/v1/cohort", post(cohort))
        .route("/v1/assess", post(assess))
        .route("/v1/model", get(model_info))
        .route("/admin/reload", post(reload))
        .fallback(fallback)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Optional query parameters for the explanation endpoints
#[derive(Debug, Deserialize)]
struct TopParams {
    top_n: Option<usize>,
}

/// Full assessment payload: prediction and attribution from one pass over
/// the patient, wrapped with request metadata.
#[derive(Debug, Serialize)]
pub struct AssessmentResponse {
    pub assessment_id: String,
    pub generated_at: DateTime<Utc>,
    pub prediction: PredictionResult,
    pub attribution: AttributionResult,
}

async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "service": "cardiorisk-api",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "predict": "POST /v1/predict",
            "explain": "POST /v1/explain?top_n=5",
            "cohort": "POST /v1/cohort",
            "assess": "POST /v1/assess?top_n=5",
            "model": "GET /v1/model",
            "health": "GET /health",
            "metrics": "GET /metrics",
        }
    }))
}

/// Always 200; a degraded status tells operators artifacts are missing
/// while the process itself is fine.
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let model_loaded = state.predictor.is_ready();
    Json(json!({
        "status": if model_loaded { "ok" } else { "degraded" },
        "model_loaded": model_loaded,
        "uptime_seconds": state.uptime_seconds(),
    }))
}

async fn metrics(State(state): State<AppState>) -> String {
    state.metrics_handle.render()
}

async fn predict(
    State(state): State<AppState>,
    Json(record): Json<PatientRecord>,
) -> Result<Json<PredictionResult>, AppError> {
    let started = Instant::now();
    record.validate()?;

    let result = state.predictor.score(&record)?;
    info!(
        "Prediction complete: {} ({:.1}%)",
        result.risk_class,
        result.probability * 100.0
    );
    record_request("predict", started);
    Ok(Json(result))
}

async fn explain(
    State(state): State<AppState>,
    Query(params): Query<TopParams>,
    Json(record): Json<PatientRecord>,
) -> Result<Json<AttributionResult>, AppError> {
    let started = Instant::now();
    record.validate()?;

    let top_n = resolve_top_n(&params, &state);
    let result = state.predictor.explain(&record, top_n)?;
    debug!(
        "Attribution complete with {} contributions",
        result.contributions.len()
    );
    record_request("explain", started);
    Ok(Json(result))
}

async fn cohort(
    State(state): State<AppState>,
    Json(record): Json<PatientRecord>,
) -> Result<Json<CohortPosition>, AppError> {
    let started = Instant::now();
    record.validate()?;

    let position = state.predictor.cohort_position(&record)?;
    debug!(
        "Cohort comparison complete against {} patients",
        position.cohort_size
    );
    record_request("cohort", started);
    Ok(Json(position))
}

async fn assess(
    State(state): State<AppState>,
    Query(params): Query<TopParams>,
    Json(record): Json<PatientRecord>,
) -> Result<Json<AssessmentResponse>, AppError> {
    let started = Instant::now();
    record.validate()?;

    let top_n = resolve_top_n(&params, &state);
    let assessment = state.predictor.assess(&record, top_n)?;
    info!(
        "Assessment complete: {} ({:.1}%)",
        assessment.prediction.risk_class,
        assessment.prediction.probability * 100.0
    );
    record_request("assess", started);

    Ok(Json(AssessmentResponse {
        assessment_id: Uuid::new_v4().to_string(),
        generated_at: Utc::now(),
        prediction: assessment.prediction,
        attribution: assessment.attribution,
    }))
}

async fn model_info(State(state): State<AppState>) -> Result<Json<ModelInfo>, AppError> {
    Ok(Json(state.predictor.model_info()?))
}

/// Re-run the artifact load. On failure the previously loaded artifacts,
/// if any, keep serving.
async fn reload(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    info!("Artifact reload requested");
    match state.predictor.load() {
        Ok(()) => {
            metrics::counter!("cardiorisk_reloads_total", "outcome" => "ok").increment(1);
            let info = state.predictor.model_info()?;
            Ok(Json(json!({
                "status": "ok",
                "loaded_at": info.loaded_at,
            })))
        }
        Err(e) => {
            metrics::counter!("cardiorisk_reloads_total", "outcome" => "error").increment(1);
            Err(e.into())
        }
    }
}

async fn fallback() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}

/// At least one contribution always comes back; top_n=0 makes no sense
/// for a ranked explanation.
fn resolve_top_n(params: &TopParams, state: &AppState) -> usize {
    params
        .top_n
        .unwrap_or(state.config.default_top_features)
        .max(1)
}

fn record_request(endpoint: &'static str, started: Instant) {
    metrics::counter!("cardiorisk_requests_total", "endpoint" => endpoint).increment(1);
    metrics::histogram!("cardiorisk_inference_latency_us", "endpoint" => endpoint)
        .record(started.elapsed().as_micros() as f64);
}

/// Error handling
struct AppError(Error);

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self.0 {
            Error::InvalidInput { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_input"),
            Error::NotReady { .. } => (StatusCode::SERVICE_UNAVAILABLE, "not_ready"),
            Error::Integrity(_) => (StatusCode::INTERNAL_SERVER_ERROR, "integrity"),
            Error::Artifact { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "artifact"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };

        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            warn!("Request rejected: {}", self.0);
        }
        metrics::counter!("cardiorisk_errors_total", "kind" => kind).increment(1);

        let body = json!({
            "error": {
                "message": self.0.to_string(),
                "kind": kind,
            }
        });

        (status, Json(body)).into_response()
    }
}
