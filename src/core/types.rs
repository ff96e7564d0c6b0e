//! Core type definitions for the classification pipeline

use crate::core::{ClassifyError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a dataset snapshot; cache entries are keyed on it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap an already computed hex digest
    pub fn new(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }

    /// Hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened digest used in file names and log lines
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(16)]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Configuration for the train/test partition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of rows held out for evaluation
    pub test_size: f64,
    /// Seed for the row permutation
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: 0.3,
            seed: 0,
        }
    }
}

impl SplitConfig {
    /// Reject proportions that cannot produce two non-empty sides
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(ClassifyError::InvalidParameter(format!(
                "test_size must be between 0 and 1, got: {}",
                self.test_size
            )));
        }
        Ok(())
    }

    /// Number of held-out rows for a table of `n_rows`
    pub fn n_test(&self, n_rows: usize) -> usize {
        (self.test_size * n_rows as f64).ceil() as usize
    }
}

/// Train/test partition of an encoded dataset
#[derive(Debug, Clone)]
pub struct Split {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<usize>,
    pub y_test: Array1<usize>,
    /// Source row index of every training row
    pub train_rows: Vec<usize>,
    /// Source row index of every test row
    pub test_rows: Vec<usize>,
    /// Names of the feature columns, in matrix column order
    pub feature_names: Vec<String>,
}

impl Split {
    pub fn n_train(&self) -> usize {
        self.y_train.len()
    }

    pub fn n_test(&self) -> usize {
        self.y_test.len()
    }

    /// Total number of rows across both sides
    pub fn len(&self) -> usize {
        self.n_train() + self.n_test()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn n_features(&self) -> usize {
        self.x_train.ncols()
    }
}

/// Display names of the two label codes and which code counts as positive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassNames {
    names: Vec<String>,
    positive: usize,
}

impl ClassNames {
    /// Derive class names from the label column's vocabulary.
    ///
    /// Single-letter mushroom codes are expanded (`e` -> `edible`,
    /// `p` -> `poisonous`). The positive class is `poisonous` when present,
    /// otherwise the highest code.
    pub fn from_vocabulary(vocabulary: &[String]) -> Result<Self> {
        if vocabulary.len() != 2 {
            return Err(ClassifyError::InvalidSchema(format!(
                "label column must have exactly 2 classes, found {}",
                vocabulary.len()
            )));
        }

        let names: Vec<String> = vocabulary
            .iter()
            .map(|value| match value.as_str() {
                "e" => "edible".to_string(),
                "p" => "poisonous".to_string(),
                other => other.to_string(),
            })
            .collect();

        let positive = names
            .iter()
            .position(|name| name == "poisonous")
            .unwrap_or(names.len() - 1);

        Ok(Self { names, positive })
    }

    /// Display name of a label code
    pub fn name(&self, code: usize) -> &str {
        self.names.get(code).map(String::as_str).unwrap_or("unknown")
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Code of the class precision and recall are measured against
    pub fn positive(&self) -> usize {
        self.positive
    }

    /// Code of the other class
    pub fn negative(&self) -> usize {
        1 - self.positive
    }
}
