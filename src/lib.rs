//! Binary classification of the mushroom data set
//!
//! Loads a categorical CSV table, encodes it per column, splits it into
//! training and test sides and evaluates one of three classifier families
//! (SVM, logistic regression, random forest) with accuracy, precision,
//! recall and diagnostic plots.

pub mod api;
pub mod cache;
pub mod config;
pub mod core;
pub mod data;
pub mod evaluation;
pub mod model;
pub mod persistence;
pub mod plot;
pub mod utils;

// Re-export main types for convenience
pub use crate::api::{ClassificationReport, Session};
pub use crate::cache::{CacheStats, DatasetCache};
pub use crate::config::AppConfig;
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::core::{ClassifyError, Result};
pub use crate::data::{DatasetSchema, EncodedDataset, FileSource, InMemorySource};
pub use crate::evaluation::{ConfusionMatrix, Evaluation, MetricsResult};
pub use crate::model::{
    ClassifierConfig, ClassifierFamily, ForestConfig, Gamma, Kernel, LogisticConfig, Parallelism,
    SvmConfig,
};
pub use crate::plot::{MetricPlot, MetricSelection, PlotRenderer, SvgRenderer};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
