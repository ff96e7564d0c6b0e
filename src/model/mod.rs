//! Classifier families, their hyperparameters and fitting
//!
//! [`ClassifierConfig`] is the closed set of supported configurations. Each
//! variant validates its own ranges and fits into a boxed [`FittedModel`],
//! so callers never branch on the family themselves.

pub mod forest;
pub mod logistic;
pub mod svm;

pub use forest::{FittedForest, ForestConfig, Parallelism};
pub use logistic::{FittedLogistic, LogisticConfig};
pub use svm::{FittedSvm, Gamma, Kernel, SvmConfig};

use crate::core::{ClassNames, ClassifyError, FittedModel, Result};
use log::{debug, info};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Instant;

/// The three supported classifier families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierFamily {
    Svm,
    LogisticRegression,
    RandomForest,
}

impl ClassifierFamily {
    pub const ALL: [ClassifierFamily; 3] = [
        ClassifierFamily::Svm,
        ClassifierFamily::LogisticRegression,
        ClassifierFamily::RandomForest,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            ClassifierFamily::Svm => "Support Vector Machine (SVM)",
            ClassifierFamily::LogisticRegression => "Logistic Regression",
            ClassifierFamily::RandomForest => "Random Forest",
        }
    }

    /// Short identifier used in file names
    pub fn slug(&self) -> &'static str {
        match self {
            ClassifierFamily::Svm => "svm",
            ClassifierFamily::LogisticRegression => "logistic-regression",
            ClassifierFamily::RandomForest => "random-forest",
        }
    }

    /// Default hyperparameters; switching family starts from these
    pub fn default_config(&self) -> ClassifierConfig {
        match self {
            ClassifierFamily::Svm => ClassifierConfig::Svm(SvmConfig::default()),
            ClassifierFamily::LogisticRegression => {
                ClassifierConfig::LogisticRegression(LogisticConfig::default())
            }
            ClassifierFamily::RandomForest => ClassifierConfig::RandomForest(ForestConfig::default()),
        }
    }
}

impl fmt::Display for ClassifierFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Hyperparameters of one classifier family
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum ClassifierConfig {
    Svm(SvmConfig),
    LogisticRegression(LogisticConfig),
    RandomForest(ForestConfig),
}

impl ClassifierConfig {
    pub fn family(&self) -> ClassifierFamily {
        match self {
            ClassifierConfig::Svm(_) => ClassifierFamily::Svm,
            ClassifierConfig::LogisticRegression(_) => ClassifierFamily::LogisticRegression,
            ClassifierConfig::RandomForest(_) => ClassifierFamily::RandomForest,
        }
    }

    /// Reject hyperparameters outside the supported ranges
    pub fn validate(&self) -> Result<()> {
        match self {
            ClassifierConfig::Svm(config) => config.validate(),
            ClassifierConfig::LogisticRegression(config) => config.validate(),
            ClassifierConfig::RandomForest(config) => config.validate(),
        }
    }

    /// Validate, then fit on the training side of a split
    pub fn fit(
        &self,
        x: &Array2<f64>,
        y: &Array1<usize>,
        classes: &ClassNames,
    ) -> Result<Box<dyn FittedModel>> {
        self.validate()?;
        check_training_data(x, y)?;

        let target = BinaryTarget::from_classes(classes);
        debug!("Fitting {} ({})", self.family(), self);
        let start = Instant::now();

        let model: Box<dyn FittedModel> = match self {
            ClassifierConfig::Svm(config) => Box::new(config.fit(x, y, target)?),
            ClassifierConfig::LogisticRegression(config) => Box::new(config.fit(x, y, target)?),
            ClassifierConfig::RandomForest(config) => Box::new(config.fit(x, y, target)?),
        };

        info!(
            "Fitted {} on {} rows in {:.2?}",
            self.family(),
            x.nrows(),
            start.elapsed()
        );
        Ok(model)
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierFamily::Svm.default_config()
    }
}

impl fmt::Display for ClassifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifierConfig::Svm(config) => fmt::Display::fmt(config, f),
            ClassifierConfig::LogisticRegression(config) => fmt::Display::fmt(config, f),
            ClassifierConfig::RandomForest(config) => fmt::Display::fmt(config, f),
        }
    }
}

impl From<SvmConfig> for ClassifierConfig {
    fn from(config: SvmConfig) -> Self {
        ClassifierConfig::Svm(config)
    }
}

impl From<LogisticConfig> for ClassifierConfig {
    fn from(config: LogisticConfig) -> Self {
        ClassifierConfig::LogisticRegression(config)
    }
}

impl From<ForestConfig> for ClassifierConfig {
    fn from(config: ForestConfig) -> Self {
        ClassifierConfig::RandomForest(config)
    }
}

/// Maps label codes to the boolean targets the fitting routines expect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BinaryTarget {
    positive: usize,
    negative: usize,
}

impl BinaryTarget {
    pub(crate) fn new(positive: usize, negative: usize) -> Self {
        Self { positive, negative }
    }

    fn from_classes(classes: &ClassNames) -> Self {
        Self::new(classes.positive(), classes.negative())
    }

    pub(crate) fn encode(&self, y: &Array1<usize>) -> Array1<bool> {
        y.mapv(|label| label == self.positive)
    }

    pub(crate) fn decode(&self, is_positive: bool) -> usize {
        if is_positive {
            self.positive
        } else {
            self.negative
        }
    }
}

fn check_training_data(x: &Array2<f64>, y: &Array1<usize>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(ClassifyError::Fit(format!(
            "feature rows ({}) and labels ({}) differ in length",
            x.nrows(),
            y.len()
        )));
    }
    if x.ncols() == 0 {
        return Err(ClassifyError::Fit("no feature columns to fit on".to_string()));
    }
    let classes: BTreeSet<usize> = y.iter().copied().collect();
    if classes.len() != 2 {
        return Err(ClassifyError::Fit(format!(
            "training labels must contain exactly 2 classes, found {}",
            classes.len()
        )));
    }
    Ok(())
}
