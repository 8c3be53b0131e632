use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrialGraphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Delimited parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Required table '{table}' not found in {}", dir.display())]
    MissingTable { table: String, dir: PathBuf },

    #[error("Missing required columns in {table}: {}", columns.join(", "))]
    MissingColumns { table: String, columns: Vec<String> },

    #[error("Contract violation on {nct_id}: field '{field}' has unexpected value {value:?}")]
    ContractViolation {
        nct_id: String,
        field: &'static str,
        value: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, TrialGraphError>;
