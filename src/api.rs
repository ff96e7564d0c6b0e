//! High-level API for the classification workflow
//!
//! A [`Session`] owns the data source, the memoization cache and the
//! application settings. Each call to [`Session::classify`] runs the whole
//! load, split, fit, score and render sequence, reusing cached tables.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use binclass::api::Session;
//! use binclass::model::LogisticConfig;
//! use binclass::plot::{MetricSelection, SvgRenderer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = Session::from_file("mushrooms.csv");
//! let renderer = SvgRenderer::new("plots");
//! let report = session.classify(
//!     &LogisticConfig::default().into(),
//!     &MetricSelection::all(),
//!     &renderer,
//! )?;
//! println!("{}", report.evaluation.metrics.rounded());
//! # Ok(())
//! # }
//! ```

use crate::cache::{CacheStats, DatasetCache};
use crate::config::AppConfig;
use crate::core::{ClassNames, ClassifyError, DataSource, Fingerprint, Result, Split};
use crate::data::{DatasetSchema, EncodedDataset, FileSource};
use crate::evaluation::{self, Evaluation};
use crate::model::{ClassifierConfig, ClassifierFamily};
use crate::persistence::SnapshotMetadata;
use crate::plot::{MetricPlot, MetricSelection, PlotRenderer};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Cached dataset access plus one-shot classification runs
pub struct Session<S: DataSource = FileSource> {
    source: S,
    schema: DatasetSchema,
    config: AppConfig,
    cache: DatasetCache,
}

impl Session<FileSource> {
    /// Session over a CSV file with default settings and no disk snapshots
    pub fn from_file<P: AsRef<Path>>(path: P) -> Self {
        let config = AppConfig {
            data_path: path.as_ref().to_path_buf(),
            persist: false,
            ..AppConfig::default()
        };
        Self::from_config(config)
    }

    /// Session over `config.data_path`, persisting snapshots when enabled
    pub fn from_config(config: AppConfig) -> Self {
        let source = FileSource::new(&config.data_path);
        Self::with_source(source, config)
    }
}

impl<S: DataSource> Session<S> {
    /// Session over any data source
    pub fn with_source(source: S, config: AppConfig) -> Self {
        let mut cache = DatasetCache::new(config.cache_capacity);
        if config.persist {
            cache = cache.with_snapshot_dir(&config.cache_dir);
        }
        Self {
            source,
            schema: DatasetSchema::mushroom(),
            config,
            cache,
        }
    }

    /// Replace the expected table layout
    pub fn with_schema(mut self, schema: DatasetSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn schema(&self) -> &DatasetSchema {
        &self.schema
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Encoded table, read from the source only on a cache miss
    pub fn load(&mut self) -> Result<(Fingerprint, Arc<EncodedDataset>)> {
        self.cache.load(&self.source, &self.schema)
    }

    /// Full encoded table, for display
    pub fn dataset(&mut self) -> Result<Arc<EncodedDataset>> {
        self.load().map(|(_, dataset)| dataset)
    }

    /// Train/test partition under the configured split settings
    pub fn split(&mut self) -> Result<Arc<Split>> {
        let (fingerprint, dataset) = self.load()?;
        let split_config = self.config.split;
        self.cache
            .split(&fingerprint, &dataset, self.schema.label(), &split_config)
    }

    /// Display names of the label codes
    pub fn class_names(&mut self) -> Result<ClassNames> {
        let dataset = self.dataset()?;
        class_names_of(&dataset, self.schema.label())
    }

    /// Fit `config`, score it on the test side and render the selected plots.
    ///
    /// Plots are drawn in the fixed [`MetricPlot`] order. A rendering failure
    /// stops further drawing but is reported alongside the metrics instead
    /// of replacing them.
    pub fn classify(
        &mut self,
        config: &ClassifierConfig,
        metrics: &MetricSelection,
        renderer: &dyn PlotRenderer,
    ) -> Result<ClassificationReport> {
        config.validate()?;
        let split = self.split()?;
        let classes = self.class_names()?;

        let evaluation = evaluation::evaluate(config, &split, &classes)?;
        let family = config.family();

        let mut plots = Vec::with_capacity(metrics.len());
        let mut render_error = None;
        for plot in metrics.iter() {
            match renderer.render(plot, family, &evaluation) {
                Ok(path) => {
                    info!("Rendered {} to {}", plot, path.display());
                    plots.push((plot, path));
                }
                Err(e) => {
                    warn!("Rendering {plot} failed: {e}");
                    render_error = Some(e);
                    break;
                }
            }
        }

        Ok(ClassificationReport {
            family,
            config: *config,
            evaluation,
            plots,
            render_error,
        })
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop cached tables in memory and on disk; returns removed snapshots
    pub fn clear_cache(&mut self) -> Result<usize> {
        self.cache.invalidate()
    }

    /// Persisted snapshots in the cache directory
    pub fn snapshots(&self) -> Result<Vec<SnapshotMetadata>> {
        self.cache.snapshots()
    }
}

/// Outcome of one classify action
#[derive(Debug)]
pub struct ClassificationReport {
    pub family: ClassifierFamily,
    pub config: ClassifierConfig,
    pub evaluation: Evaluation,
    /// Rendered plots in drawing order
    pub plots: Vec<(MetricPlot, PathBuf)>,
    /// Set when a selected plot could not be drawn
    pub render_error: Option<ClassifyError>,
}

impl ClassificationReport {
    /// Metrics are valid, but some requested plots may be missing
    pub fn is_complete(&self) -> bool {
        self.render_error.is_none()
    }

    /// Turn a rendering failure into an error, dropping the metrics
    pub fn into_result(self) -> Result<Self> {
        match self.render_error {
            Some(e) => Err(e),
            None => Ok(self),
        }
    }
}

fn class_names_of(dataset: &EncodedDataset, label: &str) -> Result<ClassNames> {
    let column = dataset.column(label).ok_or_else(|| {
        ClassifyError::InvalidSchema(format!("label column '{label}' is missing"))
    })?;
    ClassNames::from_vocabulary(column.encoder.vocabulary())
}

/// Convenience functions for one-off runs
pub mod quick {
    use super::*;
    use crate::plot::SvgRenderer;

    /// Classify a CSV file with default settings, rendering every plot into `plot_dir`
    pub fn classify_file<P: AsRef<Path>, Q: AsRef<Path>>(
        data: P,
        config: &ClassifierConfig,
        plot_dir: Q,
    ) -> Result<ClassificationReport> {
        let mut session = Session::from_file(data);
        session.classify(config, &MetricSelection::all(), &SvgRenderer::new(plot_dir))
    }
}
