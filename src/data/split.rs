//! Train/test partitioning
//!
//! Rows are permuted with a seeded ChaCha8 generator; the first
//! `ceil(test_size * n)` permuted rows form the test side and the rest the
//! training side. The same table and configuration always give the same
//! assignment.

use crate::core::{ClassifyError, Result, Split, SplitConfig};
use crate::data::encoder::EncodedDataset;
use crate::utils::validation;
use log::debug;
use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Separate `label` from the features and partition the rows
pub fn split(dataset: &EncodedDataset, label: &str, config: &SplitConfig) -> Result<Split> {
    config.validate()?;

    let label_column = dataset.column(label).ok_or_else(|| {
        ClassifyError::InvalidSchema(format!("label column '{label}' is missing"))
    })?;
    let features = dataset.without_column(label);

    let n = dataset.n_rows();
    let n_test = config.n_test(n);
    if n_test == 0 || n_test >= n {
        return Err(ClassifyError::InvalidParameter(format!(
            "cannot split {n} rows with test_size {} into two non-empty sides",
            config.test_size
        )));
    }

    let mut permutation: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    permutation.shuffle(&mut rng);
    let (test_rows, train_rows) = permutation.split_at(n_test);

    let labels: Vec<usize> = label_column.codes.iter().map(|&c| c as usize).collect();
    validation::validate_binary_labels(&labels)?;

    let split = Split {
        x_train: feature_matrix(&features, train_rows),
        x_test: feature_matrix(&features, test_rows),
        y_train: train_rows.iter().map(|&r| labels[r]).collect::<Array1<usize>>(),
        y_test: test_rows.iter().map(|&r| labels[r]).collect::<Array1<usize>>(),
        train_rows: train_rows.to_vec(),
        test_rows: test_rows.to_vec(),
        feature_names: features.column_names().into_iter().map(String::from).collect(),
    };

    debug!(
        "Split {} rows into {} train / {} test (seed {})",
        n,
        split.n_train(),
        split.n_test(),
        config.seed
    );
    Ok(split)
}

fn feature_matrix(features: &EncodedDataset, rows: &[usize]) -> Array2<f64> {
    let columns = features.columns();
    Array2::from_shape_fn((rows.len(), columns.len()), |(i, j)| {
        columns[j].codes[rows[i]] as f64
    })
}
