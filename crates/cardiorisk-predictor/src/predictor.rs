//! The predictor facade.
//!
//! [`RiskPredictor`] owns the artifact lifecycle and exposes the three
//! pipeline operations plus the combined assessment. It starts unready;
//! [`RiskPredictor::load`] installs a complete artifact store or fails and
//! leaves the previous state alone. In-flight requests work against an
//! `Arc` snapshot, so a concurrent reload never changes artifacts under a
//! request that has already started.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{error, info};

use cardiorisk_core::{
    derive_features, AttributionResult, CohortPosition, Error, ModelMetrics, PatientRecord,
    PredictionResult, Result, RiskAssessment,
};

use crate::artifacts::{ArtifactPaths, ArtifactStore};
use crate::explainer;
use crate::scaler::scale_features;
use crate::scorer;

/// Service metadata for operators: training metrics, artifact
/// fingerprints, and when the current store was installed.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub metrics: ModelMetrics,
    pub artifacts: BTreeMap<String, String>,
    pub loaded_at: DateTime<Utc>,
}

/// Entry point for all prediction operations.
pub struct RiskPredictor {
    paths: ArtifactPaths,
    store: RwLock<Option<Arc<ArtifactStore>>>,
}

impl RiskPredictor {
    /// Create an unready predictor; call [`RiskPredictor::load`] to make
    /// it serve.
    pub fn new(paths: ArtifactPaths) -> Self {
        Self {
            paths,
            store: RwLock::new(None),
        }
    }

    /// Load (or reload) the artifact set and swap it in.
    ///
    /// On failure the previously installed store, if any, keeps serving.
    pub fn load(&self) -> Result<()> {
        match ArtifactStore::load(&self.paths) {
            Ok(store) => {
                self.install(store);
                Ok(())
            }
            Err(e) => {
                error!("Artifact load failed: {}", e);
                Err(e)
            }
        }
    }

    /// Swap in an assembled store directly.
    pub fn install(&self, store: ArtifactStore) {
        info!("Installing artifact store loaded at {}", store.loaded_at());
        *self.store.write() = Some(Arc::new(store));
    }

    /// Whether a complete artifact set is installed.
    pub fn is_ready(&self) -> bool {
        self.store.read().is_some()
    }

    fn snapshot(&self, component: &str) -> Result<Arc<ArtifactStore>> {
        self.store
            .read()
            .clone()
            .ok_or_else(|| Error::not_ready(component))
    }

    /// Score one patient: probability, risk tier, and narrative.
    pub fn score(&self, record: &PatientRecord) -> Result<PredictionResult> {
        let store = self.snapshot("classifier")?;
        let derived = derive_features(record)?;
        let scaled = scale_features(store.scaler(), store.numeric_features(), &derived)?;
        scorer::score(store.classifier(), &derived, &scaled)
    }

    /// Rank per-feature contributions for one patient.
    pub fn explain(&self, record: &PatientRecord, top_n: usize) -> Result<AttributionResult> {
        let store = self.snapshot("explainer")?;
        let derived = derive_features(record)?;
        let scaled = scale_features(store.scaler(), store.numeric_features(), &derived)?;
        explainer::explain(store.engine(), store.feature_names(), &scaled, top_n)
    }

    /// Place one patient's raw values within the reference cohort.
    pub fn cohort_position(&self, record: &PatientRecord) -> Result<CohortPosition> {
        let store = self.snapshot("cohort")?;
        Ok(store.cohort().position(record))
    }

    /// Score and explain in one pass: the patient is derived and scaled
    /// once, and the same scaled vector feeds both the classifier and the
    /// attribution engine.
    pub fn assess(&self, record: &PatientRecord, top_n: usize) -> Result<RiskAssessment> {
        let store = self.snapshot("classifier")?;
        let derived = derive_features(record)?;
        let scaled = scale_features(store.scaler(), store.numeric_features(), &derived)?;

        let prediction = scorer::score(store.classifier(), &derived, &scaled)?;
        let attribution =
            explainer::explain(store.engine(), store.feature_names(), &scaled, top_n)?;

        Ok(RiskAssessment {
            prediction,
            attribution,
        })
    }

    /// Training metrics and artifact fingerprints of the installed store.
    pub fn model_info(&self) -> Result<ModelInfo> {
        let store = self.snapshot("metrics")?;
        Ok(ModelInfo {
            metrics: store.metrics().clone(),
            artifacts: store.fingerprints().clone(),
            loaded_at: store.loaded_at(),
        })
    }
}
