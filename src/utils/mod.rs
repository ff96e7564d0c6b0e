//! Utility functions shared across the pipeline

/// Rounding helpers for displayed values
pub mod rounding {
    /// Round to `decimals` decimal digits, half away from zero
    pub fn round_to(value: f64, decimals: i32) -> f64 {
        let factor = 10f64.powi(decimals);
        (value * factor).round() / factor
    }

    /// Round to the two decimals shown for every metric
    pub fn round2(value: f64) -> f64 {
        round_to(value, 2)
    }
}

/// Validation utilities
pub mod validation {
    use crate::core::{ClassifyError, Result};
    use std::collections::BTreeSet;

    /// Labels must be binary codes (0 or 1) and both classes must occur
    pub fn validate_binary_labels(labels: &[usize]) -> Result<()> {
        if let Some((i, &label)) = labels.iter().enumerate().find(|(_, &l)| l > 1) {
            return Err(ClassifyError::InvalidSchema(format!(
                "Invalid label code {label} at row {i}: labels must be 0 or 1"
            )));
        }

        let distinct: BTreeSet<usize> = labels.iter().copied().collect();
        if distinct.len() != 2 {
            return Err(ClassifyError::InvalidSchema(format!(
                "label column must contain both classes, found {}",
                distinct.len()
            )));
        }
        Ok(())
    }

    /// Check that a value lies in an inclusive range
    pub fn check_range<T>(name: &str, value: T, min: T, max: T) -> Result<()>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if value < min || value > max || value.partial_cmp(&value).is_none() {
            return Err(ClassifyError::InvalidParameter(format!(
                "{name} must be within [{min}, {max}], got: {value}"
            )));
        }
        Ok(())
    }

    /// Count of (positive, negative) labels for a positive class code
    pub fn label_balance(labels: &[usize], positive: usize) -> (usize, usize) {
        let positive_count = labels.iter().filter(|&&l| l == positive).count();
        (positive_count, labels.len() - positive_count)
    }
}

/// Statistical utilities
pub mod stats {
    use ndarray::Array2;

    /// Population variance over every element of a matrix
    pub fn matrix_variance(x: &Array2<f64>) -> f64 {
        let n = x.len();
        if n == 0 {
            return 0.0;
        }
        let mean = x.sum() / n as f64;
        x.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / n as f64
    }
}
