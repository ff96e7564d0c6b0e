//! Integration tests for the binclass library
//!
//! These tests run the full load, split, fit, score and render sequence on
//! synthetic mushroom tables and check the properties users rely on.

mod common;

use approx::assert_relative_eq;
use binclass::api::{quick, Session};
use binclass::core::{ClassifyError, DataSource, Fingerprint, Result};
use binclass::data::{DatasetSchema, InMemorySource};
use binclass::model::{
    ClassifierConfig, ClassifierFamily, ForestConfig, Gamma, Kernel, LogisticConfig, SvmConfig,
};
use binclass::plot::{MetricPlot, MetricSelection, SvgRenderer};
use binclass::AppConfig;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// In-memory table that counts how often it is read
struct CountingSource {
    inner: InMemorySource,
    reads: Arc<AtomicUsize>,
}

impl CountingSource {
    fn new(csv: String) -> (Self, Arc<AtomicUsize>) {
        let reads = Arc::new(AtomicUsize::new(0));
        let source = Self {
            inner: InMemorySource::new("synthetic mushrooms", csv),
            reads: Arc::clone(&reads),
        };
        (source, reads)
    }
}

impl DataSource for CountingSource {
    fn describe(&self) -> String {
        self.inner.describe()
    }

    fn fingerprint(&self) -> Result<Fingerprint> {
        self.inner.fingerprint()
    }

    fn read(&self) -> Result<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read()
    }
}

fn memory_config() -> AppConfig {
    AppConfig {
        persist: false,
        ..AppConfig::default()
    }
}

fn session() -> Session<InMemorySource> {
    let csv = common::mushroom_csv(common::N_ROWS, 7);
    Session::with_source(InMemorySource::new("synthetic mushrooms", csv), memory_config())
}

fn svg_count(dir: &std::path::Path) -> usize {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.path().extension().map_or(false, |ext| ext == "svg"))
                .count()
        })
        .unwrap_or(0)
}

/// Test complete workflow: file on disk -> classify -> plots on disk
#[test]
fn test_complete_workflow() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let data = common::write_mushroom_csv(dir.path());
    let plots = dir.path().join("plots");

    let mut session = Session::from_file(&data);
    let renderer = SvgRenderer::new(&plots);
    let report = session
        .classify(
            &LogisticConfig::default().into(),
            &MetricSelection::all(),
            &renderer,
        )
        .expect("Classification should succeed");

    assert!(report.is_complete());
    assert_eq!(report.family, ClassifierFamily::LogisticRegression);
    assert_eq!(
        report.plots.iter().map(|(plot, _)| *plot).collect::<Vec<_>>(),
        MetricPlot::ALL.to_vec()
    );
    for (_, path) in &report.plots {
        assert!(path.exists(), "missing plot {}", path.display());
    }
    assert_eq!(svg_count(&plots), 3);

    let evaluation = &report.evaluation;
    assert_eq!(evaluation.confusion.total(), 180);
    assert_eq!(evaluation.classes.name(evaluation.classes.positive()), "poisonous");
}

#[test]
fn test_logistic_regression_accuracy() {
    let mut session = session();
    let renderer = SvgRenderer::new(TempDir::new().unwrap().path());
    let config = ClassifierConfig::from(LogisticConfig::new(1.0, 100));

    let report = session
        .classify(&config, &MetricSelection::new(), &renderer)
        .unwrap();

    let metrics = report.evaluation.metrics;
    assert!(
        metrics.accuracy >= 0.9,
        "Accuracy should be at least 90%, got: {}",
        metrics.accuracy
    );
    assert!(metrics.precision > 0.8);
    assert!(metrics.recall > 0.8);
}

/// Edible is the majority in the real data set; scores must still point at poisonous
#[test]
fn test_logistic_regression_with_poisonous_minority() {
    let csv = common::mushroom_csv_with_share(1000, 21, 0.4);
    let mut session =
        Session::with_source(InMemorySource::new("edible majority", csv), memory_config());
    let renderer = SvgRenderer::new(TempDir::new().unwrap().path());

    let split = session.split().unwrap();
    let positive = split.y_train.iter().filter(|&&label| label == 1).count();
    assert!(positive * 2 < split.n_train(), "poisonous should be the minority");

    let report = session
        .classify(
            &LogisticConfig::new(1.0, 100).into(),
            &MetricSelection::new(),
            &renderer,
        )
        .unwrap();

    let evaluation = &report.evaluation;
    assert!(evaluation.metrics.accuracy >= 0.9, "{:?}", evaluation.metrics);
    assert!(evaluation.metrics.precision > 0.8);
    assert!(evaluation.metrics.recall > 0.8);
    assert!(evaluation.roc.auc > 0.9, "auc {}", evaluation.roc.auc);
}

#[test]
fn test_repeated_classify_is_deterministic() {
    let mut session = session();
    let renderer = SvgRenderer::new(TempDir::new().unwrap().path());
    // (config, tolerance): the forest is seeded but linfa-trees breaks tied
    // leaf votes in hash order, so it is only approximately stable
    let configs = [
        (ClassifierConfig::from(SvmConfig::new(1.0, Kernel::Rbf, Gamma::Scale)), 1e-12),
        (ClassifierConfig::from(LogisticConfig::new(0.5, 200)), 1e-12),
        (
            ClassifierConfig::from(ForestConfig::new(100, 2, true).with_random_state(1)),
            0.05,
        ),
    ];

    for (config, tolerance) in configs {
        let first = session
            .classify(&config, &MetricSelection::new(), &renderer)
            .unwrap();
        let second = session
            .classify(&config, &MetricSelection::new(), &renderer)
            .unwrap();
        let (a, b) = (first.evaluation.metrics, second.evaluation.metrics);
        assert_relative_eq!(a.accuracy, b.accuracy, epsilon = tolerance);
        assert_relative_eq!(a.precision, b.precision, epsilon = tolerance);
        assert_relative_eq!(a.recall, b.recall, epsilon = tolerance);
    }

    // one read, one split, reused by all six runs
    let stats = session.cache_stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.split_misses, 1);
}

#[test]
fn test_metrics_within_bounds_for_every_family() {
    let mut session = session();
    let renderer = SvgRenderer::new(TempDir::new().unwrap().path());
    let configs = [
        ClassifierConfig::from(SvmConfig::new(0.01, Kernel::Linear, Gamma::Auto)),
        ClassifierConfig::from(SvmConfig::new(10.0, Kernel::Rbf, Gamma::Auto)),
        ClassifierConfig::from(LogisticConfig::new(0.01, 500)),
        ClassifierConfig::from(ForestConfig::new(100, 1, false).with_random_state(9)),
    ];

    for config in configs {
        let report = session
            .classify(&config, &MetricSelection::new(), &renderer)
            .unwrap();
        let metrics = report.evaluation.metrics;
        for value in [metrics.accuracy, metrics.precision, metrics.recall] {
            assert!((0.0..=1.0).contains(&value), "{config}: {value}");
        }
        let rounded = metrics.rounded();
        assert_relative_eq!(rounded.accuracy, (metrics.accuracy * 100.0).round() / 100.0);
    }
}

#[test]
fn test_loader_cache_hit_does_not_reread() {
    let (source, reads) = CountingSource::new(common::mushroom_csv(common::N_ROWS, 7));
    let mut session = Session::with_source(source, memory_config());

    let (fp_a, first) = session.load().unwrap();
    let (fp_b, second) = session.load().unwrap();

    assert_eq!(reads.load(Ordering::SeqCst), 1);
    assert_eq!(fp_a, fp_b);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.n_rows(), common::N_ROWS);
    assert_eq!(first.n_columns(), 23);
}

#[test]
fn test_snapshot_restores_after_restart() {
    let dir = TempDir::new().unwrap();
    let config = AppConfig {
        cache_dir: dir.path().join("cache"),
        ..AppConfig::default()
    };
    let csv = common::mushroom_csv(common::N_ROWS, 7);

    let (source, reads) = CountingSource::new(csv.clone());
    let mut first = Session::with_source(source, config.clone());
    let original = first.dataset().unwrap();
    assert_eq!(reads.load(Ordering::SeqCst), 1);

    let (source, reads) = CountingSource::new(csv);
    let mut second = Session::with_source(source, config);
    let restored = second.dataset().unwrap();

    assert_eq!(reads.load(Ordering::SeqCst), 0);
    assert_eq!(*restored, *original);
    assert_eq!(second.cache_stats().disk_hits, 1);
}

#[test]
fn test_split_proportions() {
    let mut session = session();
    let split = session.split().unwrap();

    assert_eq!(split.n_train() + split.n_test(), common::N_ROWS);
    assert_eq!(split.n_test(), 180);
    assert_relative_eq!(split.n_test() as f64 / common::N_ROWS as f64, 0.3, epsilon = 0.01);
    assert_eq!(split.n_features(), 22);
    assert!(!split.feature_names.iter().any(|name| name == "type"));

    let mut rows: Vec<usize> = split.train_rows.iter().chain(&split.test_rows).copied().collect();
    rows.sort_unstable();
    assert_eq!(rows, (0..common::N_ROWS).collect::<Vec<_>>());
}

#[test]
fn test_encoded_values_within_vocabulary() {
    let mut session = session();
    let dataset = session.dataset().unwrap();

    for column in dataset.columns() {
        let k = column.encoder.n_classes() as u32;
        assert!(k > 0);
        assert!(
            column.codes.iter().all(|&code| code < k),
            "column {} has a code outside [0, {})",
            column.name,
            k
        );
    }
    assert!(dataset.column("stalk_shape").is_some());
}

#[test]
fn test_single_plot_selection_renders_one_file() {
    let dir = TempDir::new().unwrap();
    let mut session = session();
    let renderer = SvgRenderer::new(dir.path());
    let selection: MetricSelection = "confusion-matrix".parse().unwrap();

    let report = session
        .classify(&LogisticConfig::default().into(), &selection, &renderer)
        .unwrap();

    assert_eq!(report.plots.len(), 1);
    assert_eq!(report.plots[0].0, MetricPlot::ConfusionMatrix);
    assert_eq!(svg_count(dir.path()), 1);
}

#[test]
fn test_missing_label_column_is_invalid_schema() {
    let csv = common::mushroom_csv_without(100, 3, Some("type"));
    let mut session =
        Session::with_source(InMemorySource::new("no labels", csv), memory_config());
    let dir = TempDir::new().unwrap();

    let result = session.classify(
        &ClassifierConfig::default(),
        &MetricSelection::all(),
        &SvgRenderer::new(dir.path()),
    );

    assert!(matches!(result, Err(ClassifyError::InvalidSchema(_))));
    assert_eq!(svg_count(dir.path()), 0);
}

#[test]
fn test_label_only_schema_accepts_subset() {
    let csv = common::mushroom_csv_without(200, 4, Some("odor"));
    let mut strict =
        Session::with_source(InMemorySource::new("subset", csv.clone()), memory_config());
    assert!(matches!(strict.load(), Err(ClassifyError::InvalidSchema(_))));

    let mut relaxed = Session::with_source(InMemorySource::new("subset", csv), memory_config())
        .with_schema(DatasetSchema::label_only("type"));
    let split = relaxed.split().unwrap();
    assert_eq!(split.n_features(), 21);
}

#[test]
fn test_quick_classify_file() {
    let dir = TempDir::new().unwrap();
    let data = common::write_mushroom_csv(dir.path());
    let plots = dir.path().join("out");

    let config = ClassifierConfig::from(ForestConfig::new(100, 3, true).with_random_state(0));
    let report = quick::classify_file(&data, &config, &plots).unwrap();

    assert_eq!(report.family, ClassifierFamily::RandomForest);
    assert!(report.evaluation.metrics.accuracy > 0.8);
    assert_eq!(svg_count(&plots), 3);
}
