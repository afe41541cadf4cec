//! DataEater: spreadsheet/CSV cleaning core.
//!
//! DataEater sniffs a delimited or spreadsheet file, loads it into an
//! embedded SQL engine as a single dataset, and routes every later change
//! through one audited mutation pipeline.
//!
//! # Core Principles
//!
//! - **Bounded sniffing**: encoding, delimiter and structure are inferred
//!   from a file prefix, never the whole file
//! - **One writer**: all schema and data changes go through [`DataStore`]
//! - **Always consistent**: schema, row count and preview are re-read after
//!   every change, and every change is recorded in the history
//!
//! # Example
//!
//! ```no_run
//! use dataeater::DataStore;
//!
//! let mut store = DataStore::new();
//! store.load_file("clients.csv").unwrap();
//! store.rename_column("Nom Complet", "full_name").unwrap();
//!
//! println!("Columns: {}", store.columns().len());
//! println!("Rows: {}", store.row_count());
//! ```

pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod history;
pub mod sniff;
pub mod sql;
pub mod store;
pub mod view;

pub use config::{DataEaterConfig, EngineConfig, SniffConfig, ViewConfig};
pub use diagnostics::{ErrorCode, ErrorReport};
pub use engine::{CellValue, Column, ColumnType, QueryResult, StorageKind, TableEngine};
pub use error::{DataEaterError, Result};
pub use history::{HistoryEntry, HistoryKind, HistoryLog};
pub use sniff::{Delimiter, Encoding, JaggedRowError, Newline, SniffResult, Sniffer};
pub use store::{ColumnStats, DataStore, HealthReport, Preview};
pub use view::{Favorite, FavoriteStore, Operator, Rule, SortState, ViewState};
