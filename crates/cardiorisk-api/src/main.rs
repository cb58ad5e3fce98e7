//! CardioRisk API
//!
//! Prediction and explanation service for coronary artery disease risk.
//!
//! The server loads the trained artifact set (classifier, scaler,
//! attribution engine, reference cohort) at startup and serves scoring,
//! attribution, and cohort-comparison requests over HTTP. If the
//! artifacts are missing it starts degraded and can be brought up later
//! with a reload.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::signal;
use tracing::{info, warn};

use cardiorisk_api::cli::Cli;
use cardiorisk_api::config::ServiceConfig;
use cardiorisk_api::routes;
use cardiorisk_api::state::AppState;
use cardiorisk_predictor::{ArtifactPaths, RiskPredictor};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose);

    info!("Starting CardioRisk API");

    // Load configuration
    let config = ServiceConfig::load(&cli.config, &cli)?;
    info!("Configuration loaded successfully");
    info!("Artifacts: {}", config.artifacts_dir);

    // Initialize metrics
    let metrics_handle = init_metrics()?;

    // Load model artifacts; a failure leaves the service degraded rather
    // than dead, so operators can fix the artifacts and reload.
    let predictor = Arc::new(RiskPredictor::new(ArtifactPaths::new(&config.artifacts_dir)));
    match predictor.load() {
        Ok(()) => info!("Model artifacts loaded successfully"),
        Err(e) => warn!(
            "Starting degraded, model endpoints will return 503 until a reload succeeds: {}",
            e
        ),
    }

    let state = AppState::new(predictor, config.clone(), metrics_handle);

    let addr: SocketAddr = format!("{}:{}", config.listen, config.port).parse()?;
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API listening on http://{}", addr);

    let shutdown = async {
        shutdown_signal().await;
        warn!("Shutdown signal received, stopping server...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("cardiorisk=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cardiorisk=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    // Initialize baseline metrics
    metrics::describe_counter!(
        "cardiorisk_requests_total",
        "Total number of completed model requests by endpoint"
    );
    metrics::describe_counter!(
        "cardiorisk_errors_total",
        "Total number of failed requests by error kind"
    );
    metrics::describe_counter!(
        "cardiorisk_reloads_total",
        "Artifact reload attempts by outcome"
    );
    metrics::describe_histogram!(
        "cardiorisk_inference_latency_us",
        metrics::Unit::Microseconds,
        "End-to-end inference latency in microseconds by endpoint"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}
