//! Artifact loading and the loaded-model store.
//!
//! [`ArtifactStore::load`] reads every trained component and its metadata
//! from disk, in a fixed order, failing on the first problem. A store
//! either holds a complete, mutually-consistent artifact set or it does
//! not exist; there is no partially-loaded state.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::info;

use cardiorisk_core::{Error, ModelMetrics, Result, FEATURE_NAMES};

use crate::attribution::TreeAttribution;
use crate::cohort::CohortTable;
use crate::gbdt::GbdtClassifier;
use crate::scaler::StandardScaler;
use crate::traits::{AttributionEngine, FeatureScaler, RiskClassifier};

/// Locations of the artifact files.
///
/// File names default to the exporter's conventions; only the root
/// directory normally varies between deployments.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    /// Directory holding all artifact files
    pub dir: PathBuf,

    /// Trained classifier ensemble
    pub classifier_file: String,

    /// Fitted numeric scaler
    pub scaler_file: String,

    /// Exported attribution engine
    pub explainer_file: String,

    /// Ordered feature-name list
    pub feature_names_file: String,

    /// Names of the columns the scaler applies to
    pub numeric_features_file: String,

    /// Held-out evaluation metrics
    pub metrics_file: String,

    /// Processed reference cohort
    pub cohort_file: String,
}

impl ArtifactPaths {
    /// Conventional file names under the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            classifier_file: "model.json".to_string(),
            scaler_file: "scaler.json".to_string(),
            explainer_file: "explainer.json".to_string(),
            feature_names_file: "feature_names.json".to_string(),
            numeric_features_file: "numerical_features.json".to_string(),
            metrics_file: "metrics.json".to_string(),
            cohort_file: "cohort.csv".to_string(),
        }
    }

    fn path_of(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }
}

/// A complete, validated artifact set.
///
/// Built once per (re)load and shared read-only between in-flight
/// requests; a reload swaps in a whole new store rather than mutating
/// this one.
pub struct ArtifactStore {
    classifier: Box<dyn RiskClassifier>,
    scaler: Box<dyn FeatureScaler>,
    engine: Box<dyn AttributionEngine>,
    feature_names: Vec<String>,
    numeric_features: Vec<String>,
    metrics: ModelMetrics,
    cohort: CohortTable,
    fingerprints: BTreeMap<String, String>,
    loaded_at: DateTime<Utc>,
}

impl ArtifactStore {
    /// Load every artifact, in order: classifier, scaler, attribution
    /// engine, feature names, numeric feature names, metrics, cohort.
    ///
    /// # Errors
    /// Returns [`Error::Artifact`] naming the failing file on the first
    /// read or parse problem, or [`Error::Integrity`] when the loaded
    /// pieces disagree with each other.
    pub fn load(paths: &ArtifactPaths) -> Result<Self> {
        info!("Loading model artifacts from {}", paths.dir.display());
        let mut fingerprints = BTreeMap::new();

        let classifier_path = paths.path_of(&paths.classifier_file);
        let classifier = GbdtClassifier::load_json(&classifier_path)
            .map_err(|e| Error::artifact(&paths.classifier_file, e.to_string()))?;
        record_fingerprint(&mut fingerprints, &paths.classifier_file, &classifier_path)?;
        info!(
            "Loaded classifier '{}' with {} trees ({})",
            classifier.name(),
            classifier.num_trees(),
            fingerprints[&paths.classifier_file]
        );

        let scaler_path = paths.path_of(&paths.scaler_file);
        let scaler = StandardScaler::load_json(&scaler_path)
            .map_err(|e| Error::artifact(&paths.scaler_file, e.to_string()))?;
        record_fingerprint(&mut fingerprints, &paths.scaler_file, &scaler_path)?;
        info!(
            "Loaded scaler over {} columns ({})",
            scaler.columns.len(),
            fingerprints[&paths.scaler_file]
        );

        let explainer_path = paths.path_of(&paths.explainer_file);
        let engine = TreeAttribution::load_json(&explainer_path)
            .map_err(|e| Error::artifact(&paths.explainer_file, e.to_string()))?;
        record_fingerprint(&mut fingerprints, &paths.explainer_file, &explainer_path)?;
        info!(
            "Loaded attribution engine with {} trees ({})",
            engine.trees.len(),
            fingerprints[&paths.explainer_file]
        );

        let names_path = paths.path_of(&paths.feature_names_file);
        let feature_names: Vec<String> = load_json_file(&names_path)
            .map_err(|e| Error::artifact(&paths.feature_names_file, e.to_string()))?;
        record_fingerprint(&mut fingerprints, &paths.feature_names_file, &names_path)?;
        info!(
            "Loaded {} feature names ({})",
            feature_names.len(),
            fingerprints[&paths.feature_names_file]
        );

        let numeric_path = paths.path_of(&paths.numeric_features_file);
        let numeric_features: Vec<String> = load_json_file(&numeric_path)
            .map_err(|e| Error::artifact(&paths.numeric_features_file, e.to_string()))?;
        record_fingerprint(&mut fingerprints, &paths.numeric_features_file, &numeric_path)?;
        info!(
            "Loaded {} numeric feature names ({})",
            numeric_features.len(),
            fingerprints[&paths.numeric_features_file]
        );

        let metrics_path = paths.path_of(&paths.metrics_file);
        let metrics: ModelMetrics = load_json_file(&metrics_path)
            .map_err(|e| Error::artifact(&paths.metrics_file, e.to_string()))?;
        record_fingerprint(&mut fingerprints, &paths.metrics_file, &metrics_path)?;
        info!(
            "Loaded {} evaluation metrics ({})",
            metrics.len(),
            fingerprints[&paths.metrics_file]
        );

        let cohort_path = paths.path_of(&paths.cohort_file);
        let cohort = CohortTable::load_csv(&cohort_path)
            .map_err(|e| Error::artifact(&paths.cohort_file, e.to_string()))?;
        record_fingerprint(&mut fingerprints, &paths.cohort_file, &cohort_path)?;
        info!("Loaded reference cohort with {} patients", cohort.size());

        if classifier.num_features != FEATURE_NAMES.len() {
            return Err(Error::integrity(format!(
                "classifier was trained on {} features, this build derives {}",
                classifier.num_features,
                FEATURE_NAMES.len()
            )));
        }
        if engine.num_features != FEATURE_NAMES.len() {
            return Err(Error::integrity(format!(
                "attribution engine was exported for {} features, this build derives {}",
                engine.num_features,
                FEATURE_NAMES.len()
            )));
        }
        for name in &numeric_features {
            if !scaler.has_column(name) {
                return Err(Error::integrity(format!(
                    "scaler has no parameters for numeric feature '{name}'"
                )));
            }
        }
        for column in &scaler.columns {
            if !FEATURE_NAMES.contains(&column.as_str()) {
                return Err(Error::integrity(format!(
                    "scaler was fitted for unknown column '{column}'"
                )));
            }
        }

        let store = Self::assemble(
            Box::new(classifier),
            Box::new(scaler),
            Box::new(engine),
            feature_names,
            numeric_features,
            metrics,
            cohort,
            fingerprints,
        )?;
        info!("All artifacts loaded successfully");
        Ok(store)
    }

    /// Assemble a store from already-constructed parts, running the same
    /// cross-artifact integrity checks as [`ArtifactStore::load`].
    ///
    /// This is how in-memory stores (tests, the stub module) are built.
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        classifier: Box<dyn RiskClassifier>,
        scaler: Box<dyn FeatureScaler>,
        engine: Box<dyn AttributionEngine>,
        feature_names: Vec<String>,
        numeric_features: Vec<String>,
        metrics: ModelMetrics,
        cohort: CohortTable,
        fingerprints: BTreeMap<String, String>,
    ) -> Result<Self> {
        check_feature_names(&feature_names)?;
        check_numeric_features(&feature_names, &numeric_features)?;

        Ok(Self {
            classifier,
            scaler,
            engine,
            feature_names,
            numeric_features,
            metrics,
            cohort,
            fingerprints,
            loaded_at: Utc::now(),
        })
    }

    /// The trained classifier.
    pub fn classifier(&self) -> &dyn RiskClassifier {
        self.classifier.as_ref()
    }

    /// The fitted numeric scaler.
    pub fn scaler(&self) -> &dyn FeatureScaler {
        self.scaler.as_ref()
    }

    /// The attribution engine.
    pub fn engine(&self) -> &dyn AttributionEngine {
        self.engine.as_ref()
    }

    /// Ordered feature names, equal to the canonical ordering.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Names of the columns the scaler standardizes.
    pub fn numeric_features(&self) -> &[String] {
        &self.numeric_features
    }

    /// Held-out evaluation metrics recorded at training time.
    pub fn metrics(&self) -> &ModelMetrics {
        &self.metrics
    }

    /// The reference cohort.
    pub fn cohort(&self) -> &CohortTable {
        &self.cohort
    }

    /// SHA-256 fingerprint per artifact file.
    pub fn fingerprints(&self) -> &BTreeMap<String, String> {
        &self.fingerprints
    }

    /// When this store was assembled.
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

/// The loaded feature-name list must equal the canonical ordering exactly;
/// anything else means the artifacts were trained against a different
/// schema than this binary derives.
fn check_feature_names(feature_names: &[String]) -> Result<()> {
    if feature_names.len() != FEATURE_NAMES.len() {
        return Err(Error::integrity(format!(
            "feature-name list has {} entries, expected {}",
            feature_names.len(),
            FEATURE_NAMES.len()
        )));
    }
    for (idx, (loaded, expected)) in feature_names.iter().zip(FEATURE_NAMES.iter()).enumerate() {
        if loaded != expected {
            return Err(Error::integrity(format!(
                "feature-name mismatch at position {idx}: artifact says '{loaded}', \
                 this build derives '{expected}'"
            )));
        }
    }
    Ok(())
}

fn check_numeric_features(feature_names: &[String], numeric_features: &[String]) -> Result<()> {
    if numeric_features.is_empty() {
        return Err(Error::integrity("numeric-feature list is empty"));
    }
    for name in numeric_features {
        if !feature_names.iter().any(|f| f == name) {
            return Err(Error::integrity(format!(
                "numeric feature '{name}' is not in the feature-name list"
            )));
        }
    }
    Ok(())
}

fn load_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

fn record_fingerprint(
    fingerprints: &mut BTreeMap<String, String>,
    name: &str,
    path: &Path,
) -> Result<()> {
    let bytes =
        fs::read(path).map_err(|e| Error::artifact(name, format!("fingerprinting: {e}")))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    fingerprints.insert(name.to_string(), format!("{:x}", hasher.finalize()));
    Ok(())
}
