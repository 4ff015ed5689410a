//! Error types for the composable-beta library.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum BetaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid numeric value '{value}' at row {row}, column {col}")]
    InvalidValue {
        value: String,
        row: usize,
        col: usize,
    },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Duplicate identifier '{0}'")]
    DuplicateId(String),

    #[error("Invalid distance matrix: {0}")]
    InvalidDistanceMatrix(String),

    #[error("{} identifier(s) not present in metadata: {}", ids.len(), ids.join(", "))]
    MissingIdentifiers { ids: Vec<String> },

    #[error("No samples remain after filtering: {0}")]
    EmptyResult(String),

    #[error("Missing column '{0}' in metadata")]
    MissingColumn(String),

    #[error("Missing value for sample '{sample}' in column '{column}'")]
    MissingValue { sample: String, column: String },

    #[error("Invalid variable type for column '{column}': {reason}")]
    InvalidVariableType { column: String, reason: String },

    #[error("Invalid grouping for column '{column}': {reason}")]
    InvalidGrouping { column: String, reason: String },

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, BetaError>;
