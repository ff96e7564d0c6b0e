//! Logistic regression configuration and fitted model

use crate::core::{ClassifyError, FittedModel, Result};
use crate::utils::validation;
use linfa::traits::Fit;
use linfa::Dataset;
use linfa_logistic::{FittedLogisticRegression, LogisticRegression};
use log::debug;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::BinaryTarget;

/// Logistic regression hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticConfig {
    /// Inverse of the L2 penalty strength
    pub c: f64,
    /// Upper bound on solver iterations
    pub max_iter: u64,
}

impl LogisticConfig {
    pub const C_MIN: f64 = 0.01;
    pub const C_MAX: f64 = 10.0;
    pub const MAX_ITER_MIN: u64 = 100;
    pub const MAX_ITER_MAX: u64 = 500;

    pub fn new(c: f64, max_iter: u64) -> Self {
        Self { c, max_iter }
    }

    pub fn validate(&self) -> Result<()> {
        validation::check_range("C", self.c, Self::C_MIN, Self::C_MAX)?;
        validation::check_range(
            "max_iter",
            self.max_iter,
            Self::MAX_ITER_MIN,
            Self::MAX_ITER_MAX,
        )
    }

    pub(crate) fn fit(
        &self,
        x: &Array2<f64>,
        y: &Array1<usize>,
        target: BinaryTarget,
    ) -> Result<FittedLogistic> {
        let dataset = Dataset::new(x.clone(), target.encode(y));
        let model = LogisticRegression::default()
            .alpha(1.0 / self.c)
            .max_iterations(self.max_iter)
            .fit(&dataset)
            .map_err(|e| ClassifyError::Fit(format!("logistic regression: {e}")))?;
        // linfa orients its probabilities toward whichever class it labelled positive
        let true_is_positive = model.labels().pos.class;
        debug!(
            "Logistic regression fitted (intercept {:.4}, linfa positive label {})",
            model.intercept(),
            true_is_positive
        );

        Ok(FittedLogistic {
            model,
            target,
            true_is_positive,
        })
    }
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            c: Self::C_MIN,
            max_iter: Self::MAX_ITER_MIN,
        }
    }
}

impl fmt::Display for LogisticConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C={}, max_iter={}", self.c, self.max_iter)
    }
}

/// Fitted logistic regression; decision scores are positive-class probabilities
pub struct FittedLogistic {
    model: FittedLogisticRegression<f64, bool>,
    target: BinaryTarget,
    true_is_positive: bool,
}

impl FittedLogistic {
    /// Learned feature weights
    pub fn coefficients(&self) -> &Array1<f64> {
        self.model.params()
    }

    pub fn intercept(&self) -> f64 {
        self.model.intercept()
    }
}

impl FittedModel for FittedLogistic {
    fn predict(&self, x: &Array2<f64>) -> Array1<usize> {
        self.decision_scores(x)
            .mapv(|p| self.target.decode(p >= 0.5))
    }

    fn decision_scores(&self, x: &Array2<f64>) -> Array1<f64> {
        let p = self.model.predict_probabilities(x);
        if self.true_is_positive {
            p
        } else {
            p.mapv(|v| 1.0 - v)
        }
    }
}
