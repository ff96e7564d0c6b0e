//! Dataset snapshot serialization
//!
//! An encoded dataset is stored as pretty JSON next to the metadata needed
//! to decide whether it can be reused: the library version that wrote it,
//! the source fingerprint it was built from and a creation timestamp.

use crate::core::{ClassifyError, Fingerprint, Result};
use crate::data::EncodedDataset;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Serializable encoded dataset with its provenance
#[derive(Debug, Serialize, Deserialize)]
pub struct DatasetSnapshot {
    /// Provenance of the table
    pub metadata: SnapshotMetadata,
    /// The encoded table itself
    pub dataset: EncodedDataset,
}

/// Snapshot metadata for tracking and validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// Library version used to write the snapshot
    pub library_version: String,
    /// Fingerprint of the source the table was loaded from
    pub fingerprint: Fingerprint,
    /// Human-readable source location
    pub source: String,
    pub n_rows: usize,
    pub n_columns: usize,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}

impl DatasetSnapshot {
    /// Wrap a freshly encoded table
    pub fn new(fingerprint: Fingerprint, source: impl Into<String>, dataset: EncodedDataset) -> Self {
        Self {
            metadata: SnapshotMetadata {
                library_version: crate::VERSION.to_string(),
                fingerprint,
                source: source.into(),
                n_rows: dataset.n_rows(),
                n_columns: dataset.n_columns(),
                created_at: chrono::Utc::now().to_rfc3339(),
            },
            dataset,
        }
    }

    /// File name a snapshot for `fingerprint` is stored under
    pub fn file_name(fingerprint: &Fingerprint) -> String {
        format!("dataset-{}.json", fingerprint.short())
    }

    /// Full path of the snapshot for `fingerprint` inside `dir`
    pub fn path_in<P: AsRef<Path>>(dir: P, fingerprint: &Fingerprint) -> PathBuf {
        dir.as_ref().join(Self::file_name(fingerprint))
    }

    /// Whether this snapshot can stand in for a fresh load of `fingerprint`
    pub fn matches(&self, fingerprint: &Fingerprint) -> bool {
        self.metadata.library_version == crate::VERSION
            && &self.metadata.fingerprint == fingerprint
            && self.metadata.n_rows == self.dataset.n_rows()
            && self.metadata.n_columns == self.dataset.n_columns()
    }

    /// Save snapshot to file, creating the parent directory if needed
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| ClassifyError::Serialization(e.to_string()))?;
        Ok(())
    }

    /// Load snapshot from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let snapshot = serde_json::from_reader(reader)
            .map_err(|e| ClassifyError::Serialization(e.to_string()))?;
        Ok(snapshot)
    }

    /// Print snapshot summary
    pub fn print_summary(&self) {
        self.metadata.print_summary();
    }
}

impl SnapshotMetadata {
    pub fn print_summary(&self) {
        println!("=== Dataset Snapshot ===");
        println!("Source: {}", self.source);
        println!("Fingerprint: {}", self.fingerprint.short());
        println!("Shape: {} rows x {} columns", self.n_rows, self.n_columns);
        println!("Library Version: {}", self.library_version);
        println!("Created: {}", self.created_at);
    }
}
