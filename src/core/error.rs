//! Error types for the classification pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("Dataset resource not found or unreadable: {0}")]
    ResourceNotFound(String),

    #[error("Invalid dataset schema: {0}")]
    InvalidSchema(String),

    #[error("Model fitting failed: {0}")]
    Fit(String),

    #[error("Metric computation failed: {0}")]
    Metric(String),

    #[error("Plot rendering failed: {0}")]
    Render(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClassifyError>;
