//! Latency benchmarks for the inference pipeline.
//!
//! The whole path is plain `f64` tree traversal on the CPU; a full
//! score-plus-explain assessment should stay well under one millisecond
//! even for ensembles far larger than the shipped artifact.
//!
//! Run with: cargo bench -p cardiorisk-predictor

use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use cardiorisk_core::{derive_features, PatientRecord, FEATURE_NAMES, RAW_FEATURE_COUNT};
use cardiorisk_predictor::attribution::{TreeAttribution, ValuedNode, ValuedTree};
use cardiorisk_predictor::cohort::CohortTable;
use cardiorisk_predictor::gbdt::{DecisionTree, GbdtClassifier, TreeNode};
use cardiorisk_predictor::scaler::{scale_features, StandardScaler};
use cardiorisk_predictor::stub::stub_numeric_features;
use cardiorisk_predictor::traits::{AttributionEngine, RiskClassifier};
use cardiorisk_predictor::{ArtifactPaths, ArtifactStore, RiskPredictor};

fn sample_record() -> PatientRecord {
    PatientRecord {
        age: 63.0,
        sex: 1,
        cp: 0,
        trestbps: 145.0,
        chol: 233.0,
        fbs: 1,
        restecg: 0,
        thalach: 150.0,
        exang: 0,
        oldpeak: 2.3,
        slope: 0,
        ca: 0,
        thal: 1,
    }
}

fn fitted_scaler() -> StandardScaler {
    StandardScaler::new(
        stub_numeric_features(),
        vec![54.4, 131.6, 246.7, 149.6, 1.04, 0.84, 13.4],
        vec![9.1, 17.6, 51.8, 22.9, 1.16, 0.11, 4.1],
    )
}

/// A complete depth-3 tree: internal nodes 0..7, leaves 7..15, feature
/// indices cycling over the full feature space.
fn synthetic_tree(seed: usize) -> DecisionTree {
    let mut nodes = Vec::with_capacity(15);
    for i in 0..7usize {
        let feature = ((seed * 7 + i * 3) % FEATURE_NAMES.len()) as i32;
        let threshold = (i as f64 - 3.0) * 0.4;
        nodes.push(TreeNode::internal(
            feature,
            threshold,
            (2 * i + 1) as i32,
            (2 * i + 2) as i32,
        ));
    }
    for i in 0..8usize {
        let sign = if (seed + i) % 2 == 0 { 1.0 } else { -1.0 };
        nodes.push(TreeNode::leaf(sign * 0.05 * ((i % 4) as f64 + 1.0)));
    }
    DecisionTree::new(nodes)
}

fn synthetic_valued_tree(seed: usize) -> ValuedTree {
    let mut nodes = Vec::with_capacity(15);
    for i in 0..7usize {
        let feature = ((seed * 7 + i * 3) % FEATURE_NAMES.len()) as i32;
        let threshold = (i as f64 - 3.0) * 0.4;
        nodes.push(ValuedNode::internal(
            feature,
            threshold,
            (2 * i + 1) as i32,
            (2 * i + 2) as i32,
            i as f64 * 0.01,
        ));
    }
    for i in 0..8usize {
        let sign = if (seed + i) % 2 == 0 { 1.0 } else { -1.0 };
        nodes.push(ValuedNode::leaf(sign * 0.05 * ((i % 4) as f64 + 1.0)));
    }
    ValuedTree::new(nodes)
}

fn synthetic_classifier(num_trees: usize) -> GbdtClassifier {
    let trees = (0..num_trees).map(synthetic_tree).collect();
    GbdtClassifier::new(trees, -0.2, FEATURE_NAMES.len())
}

fn synthetic_engine(num_trees: usize) -> TreeAttribution {
    let trees = (0..num_trees).map(synthetic_valued_tree).collect();
    TreeAttribution::new(trees, -0.2, FEATURE_NAMES.len())
}

fn synthetic_store(num_trees: usize) -> ArtifactStore {
    let feature_names: Vec<String> = FEATURE_NAMES.iter().map(|n| (*n).to_string()).collect();

    let mut metrics = BTreeMap::new();
    metrics.insert("roc_auc".to_string(), 0.931);

    let columns: Vec<Vec<f64>> = (0..RAW_FEATURE_COUNT)
        .map(|col| (1..=300).map(|row| row as f64 + col as f64 * 0.5).collect())
        .collect();
    let cohort = CohortTable::from_columns(columns).expect("cohort columns");

    ArtifactStore::assemble(
        Box::new(synthetic_classifier(num_trees)),
        Box::new(fitted_scaler()),
        Box::new(synthetic_engine(num_trees)),
        feature_names,
        stub_numeric_features(),
        metrics,
        cohort,
        BTreeMap::new(),
    )
    .expect("store assembles")
}

fn benchmark_feature_pipeline(c: &mut Criterion) {
    let record = sample_record();
    let scaler = fitted_scaler();
    let numeric = stub_numeric_features();
    let derived = derive_features(&record).expect("valid record");

    let mut group = c.benchmark_group("Feature_Pipeline");
    group.significance_level(0.05);
    group.sample_size(100);

    group.bench_function("derive", |b| {
        b.iter(|| derive_features(black_box(&record)).unwrap());
    });

    group.bench_function("standardize", |b| {
        b.iter(|| scale_features(&scaler, &numeric, black_box(&derived)).unwrap());
    });

    group.finish();
}

fn benchmark_tree_ensembles(c: &mut Criterion) {
    let record = sample_record();
    let derived = derive_features(&record).expect("valid record");
    let scaled = scale_features(&fitted_scaler(), &stub_numeric_features(), &derived)
        .expect("scaling succeeds");
    let values = scaled.values();

    let mut group = c.benchmark_group("Tree_Ensembles");
    group.significance_level(0.05);
    group.sample_size(100);

    for num_trees in [50, 100, 200] {
        let classifier = synthetic_classifier(num_trees);
        group.bench_with_input(BenchmarkId::new("score", num_trees), &num_trees, |b, _| {
            b.iter(|| classifier.predict_probability(black_box(values)).unwrap());
        });

        let engine = synthetic_engine(num_trees);
        group.bench_with_input(BenchmarkId::new("attribute", num_trees), &num_trees, |b, _| {
            b.iter(|| engine.contributions(black_box(values)).unwrap());
        });
    }

    group.finish();
}

fn benchmark_full_assessment(c: &mut Criterion) {
    let record = sample_record();
    let predictor = RiskPredictor::new(ArtifactPaths::new("/unused"));
    predictor.install(synthetic_store(100));

    let mut group = c.benchmark_group("Full_Assessment");
    group.significance_level(0.05);
    group.sample_size(100);

    group.bench_function("assess_top5", |b| {
        b.iter(|| predictor.assess(black_box(&record), 5).unwrap());
    });

    group.bench_function("cohort_position", |b| {
        b.iter(|| predictor.cohort_position(black_box(&record)).unwrap());
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_feature_pipeline,
    benchmark_tree_ensembles,
    benchmark_full_assessment
);
criterion_main!(benches);
