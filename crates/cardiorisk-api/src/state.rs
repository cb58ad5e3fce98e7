//! Shared application state

use std::sync::Arc;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusHandle;

use cardiorisk_predictor::RiskPredictor;

use crate::config::ServiceConfig;

/// State shared by every handler. Cloning is cheap; the predictor is
/// behind an `Arc` and reloads swap artifacts inside it.
#[derive(Clone)]
pub struct AppState {
    /// The predictor facade
    pub predictor: Arc<RiskPredictor>,

    /// Resolved service configuration
    pub config: ServiceConfig,

    /// Renders the Prometheus exposition for /metrics
    pub metrics_handle: PrometheusHandle,

    /// Process start, for the health report
    started_at: Instant,
}

impl AppState {
    pub fn new(
        predictor: Arc<RiskPredictor>,
        config: ServiceConfig,
        metrics_handle: PrometheusHandle,
    ) -> Self {
        Self {
            predictor,
            config,
            metrics_handle,
            started_at: Instant::now(),
        }
    }

    /// Seconds since the service started
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
