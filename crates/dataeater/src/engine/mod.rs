//! Embedded analytical table engine.
//!
//! A single SQLite connection holds the current dataset as `current_dataset`,
//! either a typed in-memory table or, when materialization is not possible,
//! a view over the staged source. Both satisfy the same query contract.

mod connection;
mod ingest;
mod spreadsheet;
mod types;
mod value;

pub use connection::{TableEngine, register_functions};
pub use ingest::{IngestSummary, normalize_headers};
pub use spreadsheet::first_sheet_to_csv;
pub use types::{ColumnType, TypeInferrer, ValueKind, detect_value_type};
pub use value::{CellValue, Column, QueryResult, StorageKind};

pub use rusqlite::InterruptHandle;
pub use rusqlite::types::Value as SqlValue;
