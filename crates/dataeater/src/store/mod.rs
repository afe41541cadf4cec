//! The data store: session state and the mutation pipeline.
//!
//! [`DataStore`] is the single authorized writer of the dataset. Reads for
//! previews and statistics go straight to the engine; every change goes
//! through the store so that schema, row count, preview, statistics and
//! history stay consistent with the last applied change.

mod data_store;
mod health;
mod rewrite;
mod row_id;
mod stats;

pub use data_store::{DataStore, LoadedSource, Preview, StoreStatus};
pub use health::{HealthReport, empty_columns};
pub use row_id::ROW_ID_COLUMN;
pub use stats::{ColumnStats, ValueCount, column_stats};
