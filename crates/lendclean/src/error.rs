//! Error types for the lendclean library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for lendclean operations.
#[derive(Debug, Error)]
pub enum LendcleanError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file or no data to process.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Regex compilation error.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A column named by an operation does not exist.
    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    /// A column does not share the dataset's row count.
    #[error("Column '{column}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Two columns ended up with the same name.
    #[error("Duplicate column '{0}'")]
    DuplicateColumn(String),

    /// A numeric operation met a value it cannot treat as a number.
    #[error("Non-numeric value '{value}' in column '{column}' at row {row}")]
    NotNumeric {
        column: String,
        row: usize,
        value: String,
    },

    /// The state-name reference could not be resolved.
    #[error("Reference error: {0}")]
    Reference(String),

    /// HTTP request failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Table creation refused because the table is already present.
    #[error("Table '{0}' already exists")]
    TableExists(String),

    /// Any other failure inside a table store.
    #[error("Store error: {0}")]
    Store(String),
}

impl LendcleanError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LendcleanError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for lendclean operations.
pub type Result<T> = std::result::Result<T, LendcleanError>;
