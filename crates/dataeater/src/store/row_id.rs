//! Scoped synthetic row identifiers for multi-batch updates.

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error};

use super::data_store::DataStore;
use crate::error::Result;
use crate::sql::{DATASET_TABLE, quote_ident};

/// Name of the temporary row identifier column.
pub const ROW_ID_COLUMN: &str = "__dataeater_row_id";

impl DataStore {
    /// Run `f` with a temporary row identifier column on the dataset.
    ///
    /// The column holds each row's engine identity and lets a caller
    /// correlate rows across several round trips. It is removed when `f`
    /// returns, fails or panics, and never appears in the visible schema.
    pub fn with_row_ids<T>(
        &mut self,
        f: impl FnOnce(&mut DataStore, &str) -> Result<T>,
    ) -> Result<T> {
        self.require_dataset()?;

        let table = quote_ident(DATASET_TABLE);
        let column = quote_ident(ROW_ID_COLUMN);
        let add = format!(
            "ALTER TABLE {table} ADD COLUMN {column} INTEGER; UPDATE {table} SET {column} = rowid;"
        );
        if let Err(e) = self.engine.transaction(|tx| Ok(tx.execute_batch(&add)?)) {
            return Err(self.fail(e, "add row ids"));
        }
        debug!("row id column added");

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| f(self, ROW_ID_COLUMN)));
        let cleanup = self.drop_row_ids();

        match outcome {
            Err(payload) => {
                if let Err(e) = cleanup {
                    error!(error = %e, "row id cleanup failed during panic");
                }
                panic::resume_unwind(payload)
            }
            Ok(Err(e)) => {
                if let Err(cleanup_err) = cleanup {
                    error!(error = %cleanup_err, "row id cleanup failed");
                }
                Err(e)
            }
            Ok(Ok(value)) => match cleanup {
                Ok(()) => Ok(value),
                Err(e) => Err(self.fail(e, "drop row ids")),
            },
        }
    }

    fn drop_row_ids(&mut self) -> Result<()> {
        // A rewrite inside the scope may already have rebuilt the table.
        let present = !self
            .engine
            .query(
                "SELECT 1 FROM pragma_table_info(?1) WHERE name = ?2",
                &[
                    DATASET_TABLE.to_string().into(),
                    ROW_ID_COLUMN.to_string().into(),
                ],
            )?
            .is_empty();

        if present {
            self.engine.execute(&format!(
                "ALTER TABLE {} DROP COLUMN {}",
                quote_ident(DATASET_TABLE),
                quote_ident(ROW_ID_COLUMN)
            ))?;
            debug!("row id column dropped");
        }
        self.sync()
    }
}
