//! Support vector machine configuration and fitted model

use crate::core::{ClassifyError, FittedModel, Result};
use crate::utils::{stats, validation};
use linfa::traits::Fit;
use linfa::Dataset;
use linfa_svm::Svm;
use log::debug;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::BinaryTarget;

/// Kernel function of the SVM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Kernel {
    /// Radial basis function `exp(-gamma * ||x - x'||^2)`
    #[default]
    Rbf,
    Linear,
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kernel::Rbf => write!(f, "rbf"),
            Kernel::Linear => write!(f, "linear"),
        }
    }
}

/// Policy for the RBF kernel coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gamma {
    /// `1 / (n_features * var(X))`
    #[default]
    Scale,
    /// `1 / n_features`
    Auto,
}

impl Gamma {
    /// Kernel coefficient for a training matrix
    pub fn resolve(&self, x: &Array2<f64>) -> f64 {
        let n_features = x.ncols().max(1) as f64;
        match self {
            Gamma::Scale => {
                let variance = stats::matrix_variance(x);
                if variance > 0.0 {
                    1.0 / (n_features * variance)
                } else {
                    1.0
                }
            }
            Gamma::Auto => 1.0 / n_features,
        }
    }
}

impl fmt::Display for Gamma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gamma::Scale => write!(f, "scale"),
            Gamma::Auto => write!(f, "auto"),
        }
    }
}

/// SVM hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvmConfig {
    /// Regularization strength, applied to both classes
    pub c: f64,
    pub kernel: Kernel,
    pub gamma: Gamma,
}

impl SvmConfig {
    pub const C_MIN: f64 = 0.01;
    pub const C_MAX: f64 = 10.0;

    pub fn new(c: f64, kernel: Kernel, gamma: Gamma) -> Self {
        Self { c, kernel, gamma }
    }

    pub fn validate(&self) -> Result<()> {
        validation::check_range("C", self.c, Self::C_MIN, Self::C_MAX)
    }

    pub(crate) fn fit(
        &self,
        x: &Array2<f64>,
        y: &Array1<usize>,
        target: BinaryTarget,
    ) -> Result<FittedSvm> {
        let params = Svm::<f64, bool>::params().pos_neg_weights(self.c, self.c);
        let params = match self.kernel {
            Kernel::Rbf => {
                let gamma = self.gamma.resolve(x);
                debug!("SVM rbf kernel with gamma {:.6} ({})", gamma, self.gamma);
                params.gaussian_kernel(1.0 / gamma)
            }
            Kernel::Linear => params.linear_kernel(),
        };

        let dataset = Dataset::new(x.clone(), target.encode(y));
        let model = params
            .fit(&dataset)
            .map_err(|e| ClassifyError::Fit(format!("SVM: {e}")))?;
        debug!("SVM fitted with {} support vectors", model.nsupport());

        Ok(FittedSvm { model, target })
    }
}

impl Default for SvmConfig {
    fn default() -> Self {
        Self {
            c: Self::C_MIN,
            kernel: Kernel::Rbf,
            gamma: Gamma::Scale,
        }
    }
}

impl fmt::Display for SvmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C={}, kernel={}, gamma={}", self.c, self.kernel, self.gamma)
    }
}

/// Fitted SVM; decision scores are signed margins
pub struct FittedSvm {
    model: Svm<f64, bool>,
    target: BinaryTarget,
}

impl FittedSvm {
    pub fn n_support_vectors(&self) -> usize {
        self.model.nsupport()
    }
}

impl FittedModel for FittedSvm {
    fn predict(&self, x: &Array2<f64>) -> Array1<usize> {
        self.decision_scores(x)
            .mapv(|margin| self.target.decode(margin >= 0.0))
    }

    fn decision_scores(&self, x: &Array2<f64>) -> Array1<f64> {
        x.outer_iter()
            .map(|row| self.model.weighted_sum(&row) - self.model.rho)
            .collect()
    }
}
