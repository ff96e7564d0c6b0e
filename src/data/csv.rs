//! Categorical CSV dataset loading
//!
//! The first row names the columns, every following row holds one
//! categorical value per column. Values are kept as strings until
//! [`load_data`] encodes them column by column.

use crate::core::{ClassifyError, DataSource, Result};
use crate::data::encoder::{EncodedColumn, EncodedDataset};
use crate::data::schema::{normalize_column_name, DatasetSchema};
use log::{debug, info};
use std::io::Read;

/// Raw categorical table as read from CSV
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoricalTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CategoricalTable {
    /// Parse a table from any reader.
    ///
    /// Every record must have as many fields as the header; blank values are
    /// kept as their own category.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = ::csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(::csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()
            .map_err(malformed)?
            .iter()
            .map(normalize_column_name)
            .collect();

        if headers.is_empty() || headers.iter().all(String::is_empty) {
            return Err(ClassifyError::ResourceNotFound(
                "malformed dataset: missing header row".to_string(),
            ));
        }

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record.map_err(malformed)?;
            rows.push(record.iter().map(String::from).collect());
        }

        if rows.is_empty() {
            return Err(ClassifyError::ResourceNotFound(
                "malformed dataset: no data rows".to_string(),
            ));
        }

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Values of column `idx` in row order
    fn column_values(&self, idx: usize) -> Vec<&str> {
        self.rows.iter().map(|row| row[idx].as_str()).collect()
    }

    /// Fit one encoder per column and transform every value
    pub fn encode(&self) -> Result<EncodedDataset> {
        let columns = self
            .headers
            .iter()
            .enumerate()
            .map(|(idx, name)| EncodedColumn::fit_transform(name, &self.column_values(idx)))
            .collect::<Result<Vec<_>>>()?;
        EncodedDataset::from_columns(columns)
    }
}

fn malformed(err: ::csv::Error) -> ClassifyError {
    let location = err
        .position()
        .map(|pos| format!(" at line {}", pos.line()))
        .unwrap_or_default();
    ClassifyError::ResourceNotFound(format!("malformed dataset{location}: {err}"))
}

/// Read, validate and encode a dataset without any caching
pub fn load_data<S: DataSource + ?Sized>(source: &S, schema: &DatasetSchema) -> Result<EncodedDataset> {
    let bytes = source.read()?;
    debug!("Read {} bytes from {}", bytes.len(), source.describe());

    let table = CategoricalTable::from_reader(bytes.as_slice()).map_err(|e| match e {
        ClassifyError::ResourceNotFound(msg) => {
            ClassifyError::ResourceNotFound(format!("{}: {msg}", source.describe()))
        }
        other => other,
    })?;
    schema.validate(table.headers())?;

    let dataset = table.encode()?;
    info!(
        "Loaded {} rows x {} columns from {}",
        dataset.n_rows(),
        dataset.n_columns(),
        source.describe()
    );
    Ok(dataset)
}
