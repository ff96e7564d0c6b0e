//! Per-column categorical encoding
//!
//! Each column is encoded independently: its distinct values are sorted and
//! mapped to `0..k`, so the same value always receives the same code within
//! one load.

use crate::core::{ClassifyError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Sorted vocabulary of one column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnEncoder {
    vocabulary: Vec<String>,
}

impl ColumnEncoder {
    /// Fit on every value observed in a column
    pub fn fit<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let distinct: BTreeSet<&str> = values.into_iter().collect();
        Self {
            vocabulary: distinct.into_iter().map(String::from).collect(),
        }
    }

    /// Code of a value, if it was seen during fitting
    pub fn encode(&self, value: &str) -> Option<u32> {
        self.vocabulary
            .binary_search_by(|entry| entry.as_str().cmp(value))
            .ok()
            .map(|idx| idx as u32)
    }

    /// Original value of a code
    pub fn decode(&self, code: u32) -> Option<&str> {
        self.vocabulary.get(code as usize).map(String::as_str)
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Number of distinct values (`k`)
    pub fn n_classes(&self) -> usize {
        self.vocabulary.len()
    }
}

/// One encoded column: name, encoder and a code per row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedColumn {
    pub name: String,
    pub encoder: ColumnEncoder,
    pub codes: Vec<u32>,
}

impl EncodedColumn {
    /// Fit an encoder on `values` and transform them
    pub fn fit_transform(name: &str, values: &[&str]) -> Result<Self> {
        let encoder = ColumnEncoder::fit(values.iter().copied());
        let codes = values
            .iter()
            .map(|value| {
                encoder.encode(value).ok_or_else(|| {
                    ClassifyError::InvalidParameter(format!(
                        "value '{value}' missing from vocabulary of column '{name}'"
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: name.to_string(),
            encoder,
            codes,
        })
    }
}

/// Dataset with every column replaced by integer codes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedDataset {
    columns: Vec<EncodedColumn>,
    n_rows: usize,
}

impl EncodedDataset {
    /// Assemble from already encoded columns of equal length
    pub fn from_columns(columns: Vec<EncodedColumn>) -> Result<Self> {
        let n_rows = columns.first().map(|c| c.codes.len()).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.codes.len() != n_rows) {
            return Err(ClassifyError::InvalidSchema(format!(
                "column '{}' has {} rows, expected {}",
                bad.name,
                bad.codes.len(),
                n_rows
            )));
        }
        Ok(Self { columns, n_rows })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn columns(&self) -> &[EncodedColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&EncodedColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Codes of row `i` in column order
    ///
    /// # Panics
    /// Panics if `i >= n_rows()`
    pub fn row(&self, i: usize) -> Vec<u32> {
        self.columns.iter().map(|c| c.codes[i]).collect()
    }

    /// Copy without the named column
    pub fn without_column(&self, name: &str) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .filter(|c| c.name != name)
                .cloned()
                .collect(),
            n_rows: self.n_rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoder_sorts_vocabulary() {
        let encoder = ColumnEncoder::fit(["p", "e", "p", "e", "e"]);
        assert_eq!(encoder.vocabulary(), &["e".to_string(), "p".to_string()]);
        assert_eq!(encoder.encode("e"), Some(0));
        assert_eq!(encoder.encode("p"), Some(1));
        assert_eq!(encoder.encode("x"), None);
        assert_eq!(encoder.decode(1), Some("p"));
        assert_eq!(encoder.decode(2), None);
    }

    #[test]
    fn test_codes_stay_within_vocabulary() {
        let values = ["y", "f", "n", "a", "y", "l", "f"];
        let column = EncodedColumn::fit_transform("odor", &values).unwrap();
        let k = column.encoder.n_classes() as u32;
        assert_eq!(k, 5);
        assert!(column.codes.iter().all(|&code| code < k));

        for (value, code) in values.iter().zip(&column.codes) {
            assert_eq!(column.encoder.decode(*code), Some(*value));
        }
    }

    #[test]
    fn test_same_value_same_code() {
        let column = EncodedColumn::fit_transform("cap_color", &["n", "w", "n", "g", "w"]).unwrap();
        assert_eq!(column.codes[0], column.codes[2]);
        assert_eq!(column.codes[1], column.codes[4]);
        assert_ne!(column.codes[0], column.codes[1]);
    }

    #[test]
    fn test_dataset_accessors() {
        let label = EncodedColumn::fit_transform("type", &["p", "e", "e"]).unwrap();
        let odor = EncodedColumn::fit_transform("odor", &["p", "a", "l"]).unwrap();
        let dataset = EncodedDataset::from_columns(vec![label, odor]).unwrap();

        assert_eq!(dataset.n_rows(), 3);
        assert_eq!(dataset.n_columns(), 2);
        assert_eq!(dataset.column_names(), vec!["type", "odor"]);
        assert_eq!(dataset.row(0), vec![1, 2]);
        assert!(dataset.column("odor").is_some());
        assert!(dataset.column("habitat").is_none());

        let features = dataset.without_column("type");
        assert_eq!(features.column_names(), vec!["odor"]);
        assert_eq!(features.n_rows(), 3);
    }

    #[test]
    fn test_ragged_columns_rejected() {
        let a = EncodedColumn::fit_transform("a", &["x", "y"]).unwrap();
        let b = EncodedColumn::fit_transform("b", &["x"]).unwrap();
        assert!(EncodedDataset::from_columns(vec![a, b]).is_err());
    }
}
