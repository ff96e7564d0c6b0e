//! Core traits for the classification pipeline

use crate::core::{Fingerprint, Result};
use ndarray::{Array1, Array2};

/// Where the raw dataset comes from
pub trait DataSource: Send + Sync {
    /// Human-readable location, used in log lines and error messages
    fn describe(&self) -> String;

    /// Identity of the current snapshot.
    ///
    /// Must be cheap: computing it may not read the full contents, so that
    /// a cache hit never touches the data itself.
    fn fingerprint(&self) -> Result<Fingerprint>;

    /// Read the full raw contents
    fn read(&self) -> Result<Vec<u8>>;
}

/// A fitted binary classifier over encoded feature matrices
pub trait FittedModel: Send + Sync {
    /// Predict a label code for every row
    fn predict(&self, x: &Array2<f64>) -> Array1<usize>;

    /// Confidence that each row belongs to the positive class.
    ///
    /// Only the ordering matters: larger values are more likely positive.
    fn decision_scores(&self, x: &Array2<f64>) -> Array1<f64>;

    /// Mean accuracy on the given rows and labels
    fn score(&self, x: &Array2<f64>, y: &Array1<usize>) -> f64 {
        if y.is_empty() {
            return 0.0;
        }
        let predictions = self.predict(x);
        let correct = predictions
            .iter()
            .zip(y.iter())
            .filter(|(pred, actual)| pred == actual)
            .count();
        correct as f64 / y.len() as f64
    }
}
