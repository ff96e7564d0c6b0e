//! Application configuration
//!
//! Every field has a default, so a config file only needs the values it
//! changes. Command line flags are applied on top by the binary.

use crate::core::{ClassifyError, Result, SplitConfig};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Settings for one run of the classifier demo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// CSV file with the mushroom table
    pub data_path: PathBuf,
    /// Where encoded dataset snapshots are persisted
    pub cache_dir: PathBuf,
    /// Persist snapshots across restarts
    pub persist: bool,
    /// Entries kept per in-memory cache table
    pub cache_capacity: usize,
    /// Output directory for rendered plots
    pub plot_dir: PathBuf,
    pub split: SplitConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("mushrooms.csv"),
            cache_dir: PathBuf::from(".binclass-cache"),
            persist: true,
            cache_capacity: 4,
            plot_dir: PathBuf::from("plots"),
            split: SplitConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ClassifyError::InvalidParameter(format!("cannot read config {}: {e}", path.display()))
        })?;
        let config: AppConfig = serde_json::from_str(&content).map_err(|e| {
            ClassifyError::Serialization(format!("cannot parse config {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration as pretty JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .map_err(|e| ClassifyError::Serialization(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        self.split.validate()?;
        if self.cache_capacity == 0 {
            return Err(ClassifyError::InvalidParameter(
                "cache_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
