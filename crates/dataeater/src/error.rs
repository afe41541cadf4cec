//! Error types for the DataEater library.

use std::path::PathBuf;
use thiserror::Error;

use crate::diagnostics::{ErrorCode, ErrorReport};

/// Main error type for DataEater operations.
#[derive(Debug, Error)]
pub enum DataEaterError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library while streaming a source file.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error raised by the embedded SQL engine.
    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// Spreadsheet could not be opened or converted.
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    /// File format not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Empty file or no data to load.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// An operation needs a loaded dataset but none is present.
    #[error("No dataset loaded")]
    NoDataset,

    /// A column referenced by name does not exist in the dataset.
    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    /// Caller supplied an argument that cannot be honoured.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A mutation failed; the report carries the classified cause.
    #[error("{}: {}", .0.title, .0.raw_message)]
    Mutation(Box<ErrorReport>),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Persistence (history, favorites, config files) failure.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DataEaterError {
    /// Classify this error into the coarse user-facing taxonomy.
    pub fn code(&self) -> ErrorCode {
        match self {
            DataEaterError::Io { .. } | DataEaterError::Persistence(_) => ErrorCode::IoError,
            DataEaterError::Mutation(report) => report.code,
            DataEaterError::ColumnNotFound(_) => ErrorCode::StructuralMismatch,
            DataEaterError::Sql(err) => ErrorCode::from_sql_error(err),
            other => ErrorCode::classify(&other.to_string()),
        }
    }

    /// Build a user-facing report for this error.
    pub fn report(&self) -> ErrorReport {
        match self {
            DataEaterError::Mutation(report) => (**report).clone(),
            other => ErrorReport::new(other.code(), other.to_string()),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DataEaterError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<calamine::Error> for DataEaterError {
    fn from(err: calamine::Error) -> Self {
        DataEaterError::Spreadsheet(err.to_string())
    }
}

/// Result type alias for DataEater operations.
pub type Result<T> = std::result::Result<T, DataEaterError>;
