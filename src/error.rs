//! Pipeline error taxonomy.
//!
//! Only two failure kinds abort a run: invalid input (missing required
//! column, empty vocabulary, unreadable source) and a similarity search
//! against an empty index. Everything else is recorded as a degraded
//! per-item result and the batch continues. A label that fails to
//! canonicalize is not an error at all - it falls back to its raw value.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Input file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Input validation failed: {0}")]
    InputValidation(String),

    #[error("Similarity search attempted against an empty vector index")]
    EmptyIndex,

    #[error("Embedding dimension mismatch: index holds {expected}-dimensional vectors, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// Validation error naming the column a tabular source is missing.
    pub fn missing_column(source_name: &str, column: &str) -> Self {
        PipelineError::InputValidation(format!(
            "{} is missing required '{}' column",
            source_name, column
        ))
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
