//! Dataset health report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::{CellValue, Column, StorageKind, TableEngine};
use crate::error::Result;
use crate::sniff::{JaggedRowError, SniffResult, SourceMetadata};
use crate::sql::{DATASET_TABLE, quote_ident};

/// Diagnostics gathered at load time plus a fresh look at the dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub source: SourceMetadata,
    pub sniff: SniffResult,
    /// Advisory structural problems found in the source prefix.
    pub jagged_rows: Vec<JaggedRowError>,
    pub row_count: u64,
    pub column_count: usize,
    pub storage: Option<StorageKind>,
    /// Columns where every value is null or empty.
    pub empty_columns: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl HealthReport {
    /// True when nothing in the report needs attention.
    pub fn is_clean(&self) -> bool {
        self.jagged_rows.is_empty() && self.empty_columns.is_empty()
    }
}

/// Names of columns that hold no non-empty value.
pub fn empty_columns(engine: &TableEngine, columns: &[Column]) -> Result<Vec<String>> {
    if columns.is_empty() {
        return Ok(Vec::new());
    }

    let counts: Vec<String> = columns
        .iter()
        .map(|c| {
            let col = quote_ident(&c.name);
            format!("SUM(CASE WHEN {col} IS NOT NULL AND CAST({col} AS TEXT) <> '' THEN 1 ELSE 0 END)")
        })
        .collect();
    let result = engine.query(
        &format!(
            "SELECT {} FROM {}",
            counts.join(", "),
            quote_ident(DATASET_TABLE)
        ),
        &[],
    )?;

    let row = result.rows.into_iter().next().unwrap_or_default();
    Ok(columns
        .iter()
        .enumerate()
        .filter(|(i, _)| {
            matches!(
                row.get(*i),
                None | Some(CellValue::Null) | Some(CellValue::Integer(0))
            )
        })
        .map(|(_, c)| c.name.clone())
        .collect())
}
