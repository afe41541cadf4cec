//! Loading delimited sources into the engine.
//!
//! Rows are streamed into `staging.source_file` as text, types are inferred
//! from every non-empty value on the way, and the dataset is then
//! materialized as a typed in-memory table. When that copy fails the
//! dataset becomes a view over the staging table instead.

use std::collections::HashSet;
use std::path::Path;

use rusqlite::{ErrorCode as SqliteCode, params_from_iter};
use tracing::{debug, info, warn};

use super::connection::TableEngine;
use super::types::{ColumnType, TypeInferrer};
use super::value::StorageKind;
use crate::error::{DataEaterError, Result};
use crate::sniff::{Encoding, SniffResult};
use crate::sql::{DATASET_TABLE, SOURCE_TABLE, STAGING_SCHEMA, quote_ident};

/// Outcome of a load.
#[derive(Debug, Clone)]
pub struct IngestSummary {
    pub storage: StorageKind,
    pub rows: u64,
    pub columns: Vec<(String, ColumnType)>,
}

/// Clean up raw header cells: strip a byte order mark, name blank headers
/// `column_N` and suffix duplicates with `_2`, `_3`...
pub fn normalize_headers<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(raw.len());

    for (idx, header) in raw.iter().enumerate() {
        let header = header.as_ref();
        let header = if idx == 0 {
            header.trim_start_matches('\u{feff}')
        } else {
            header
        };
        let base = if header.trim().is_empty() {
            format!("column_{}", idx + 1)
        } else {
            header.to_string()
        };

        let mut name = base.clone();
        let mut suffix = 2;
        while seen.contains(&name.to_lowercase()) {
            name = format!("{base}_{suffix}");
            suffix += 1;
        }
        seen.insert(name.to_lowercase());
        names.push(name);
    }

    names
}

fn staging_column(idx: usize) -> String {
    format!("c{idx}")
}

/// SQL expression converting a staged text column to its inferred type.
/// Empty cells of non-text columns become NULL.
fn convert_expr(idx: usize, ty: ColumnType) -> String {
    let col = quote_ident(&staging_column(idx));
    match ty {
        ColumnType::Text => col,
        ColumnType::Integer => format!("CAST(NULLIF({col}, '') AS INTEGER)"),
        ColumnType::Float => format!("CAST(NULLIF({col}, '') AS REAL)"),
        ColumnType::Boolean => format!(
            "CASE WHEN lower({col}) IN ('true', 'yes') THEN 1 \
             WHEN lower({col}) IN ('false', 'no') THEN 0 END"
        ),
        ColumnType::Date | ColumnType::Timestamp => format!("NULLIF({col}, '')"),
    }
}

fn is_interrupt(err: &DataEaterError) -> bool {
    matches!(
        err,
        DataEaterError::Sql(rusqlite::Error::SqliteFailure(e, _))
            if e.code == SqliteCode::OperationInterrupted
    )
}

impl TableEngine {
    /// Replace the dataset with the contents of a delimited file.
    pub fn load_delimited(&self, path: &Path, sniff: &SniffResult) -> Result<IngestSummary> {
        self.init()?;
        self.drop_dataset()?;

        let (names, types, rows) = self.stage(path, sniff)?;
        let columns: Vec<(String, ColumnType)> = names.into_iter().zip(types).collect();

        let storage = if self.config().materialize {
            match self.materialize(&columns) {
                Ok(()) => StorageKind::Table,
                Err(e) if is_interrupt(&e) => {
                    self.execute(&format!("DROP TABLE IF EXISTS main.{}", quote_ident(DATASET_TABLE)))?;
                    return Err(e);
                }
                Err(e) => {
                    warn!(error = %e, "materialization failed, falling back to a view");
                    self.execute(&format!("DROP TABLE IF EXISTS main.{}", quote_ident(DATASET_TABLE)))?;
                    self.create_view(&columns)?;
                    StorageKind::View
                }
            }
        } else {
            self.create_view(&columns)?;
            StorageKind::View
        };

        info!(
            path = %path.display(),
            rows,
            columns = columns.len(),
            storage = %storage,
            "dataset loaded"
        );
        Ok(IngestSummary {
            storage,
            rows,
            columns,
        })
    }

    /// Stream the file into the staging table. Returns header names,
    /// inferred types and the number of data rows.
    fn stage(&self, path: &Path, sniff: &SniffResult) -> Result<(Vec<String>, Vec<ColumnType>, u64)> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(sniff.delimiter.as_byte())
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .map_err(|e| match e.into_kind() {
                csv::ErrorKind::Io(io) => DataEaterError::io(path, io),
                other => DataEaterError::InvalidInput(format!("{other:?}")),
            })?;

        let mut records = reader.byte_records();
        let first = match records.next() {
            Some(record) => record?,
            None => return Err(DataEaterError::EmptyData(format!("'{}' has no rows", path.display()))),
        };

        let decode = |encoding: Encoding, field: &[u8]| encoding.decode(field).into_owned();
        let first_fields: Vec<String> = first.iter().map(|f| decode(sniff.encoding, f)).collect();

        let (names, pending_first) = if sniff.has_header {
            (normalize_headers(&first_fields), None)
        } else {
            let generated: Vec<String> = (1..=first_fields.len()).map(|i| format!("column_{i}")).collect();
            (generated, Some(first_fields))
        };
        let width = names.len();
        if width == 0 {
            return Err(DataEaterError::EmptyData("no columns found".to_string()));
        }

        let table = format!("{}.{}", quote_ident(STAGING_SCHEMA), quote_ident(SOURCE_TABLE));
        let column_defs: Vec<String> = (0..width)
            .map(|i| format!("{} TEXT", quote_ident(&staging_column(i))))
            .collect();
        self.execute(&format!(
            "DROP TABLE IF EXISTS {table}; CREATE TABLE {table} ({});",
            column_defs.join(", ")
        ))?;

        let placeholders = vec!["?"; width].join(", ");
        let insert = format!("INSERT INTO {table} VALUES ({placeholders})");
        let batch_rows = self.config().staging_batch_rows.max(1);

        let mut inferrer = TypeInferrer::new(width);
        let mut rows: u64 = 0;
        let mut row_buf: Vec<String> = Vec::with_capacity(width);
        let mut pending = pending_first;

        let conn = self.init()?;
        loop {
            let tx = conn.unchecked_transaction()?;
            let mut in_batch = 0;
            {
                let mut stmt = tx.prepare_cached(&insert)?;
                while in_batch < batch_rows {
                    let fields: Vec<String> = match pending.take() {
                        Some(fields) => fields,
                        None => match records.next() {
                            Some(record) => record?.iter().map(|f| decode(sniff.encoding, f)).collect(),
                            None => break,
                        },
                    };

                    // Pad short rows, truncate long ones.
                    row_buf.clear();
                    row_buf.extend(fields.into_iter().take(width));
                    row_buf.resize(width, String::new());
                    for (i, value) in row_buf.iter().enumerate() {
                        inferrer.observe(i, value);
                    }

                    stmt.execute(params_from_iter(row_buf.iter()))?;
                    in_batch += 1;
                }
            }
            tx.commit()?;
            rows += in_batch as u64;
            debug!(rows, "staged batch");
            if in_batch < batch_rows {
                break;
            }
        }

        Ok((names, inferrer.finish(), rows))
    }

    fn projection(columns: &[(String, ColumnType)]) -> String {
        columns
            .iter()
            .enumerate()
            .map(|(i, (name, ty))| format!("{} AS {}", convert_expr(i, *ty), quote_ident(name)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn materialize(&self, columns: &[(String, ColumnType)]) -> Result<()> {
        let table = format!("main.{}", quote_ident(DATASET_TABLE));
        let defs: Vec<String> = columns
            .iter()
            .map(|(name, ty)| format!("{} {}", quote_ident(name), ty.sql_type()))
            .collect();
        let source = format!("{}.{}", quote_ident(STAGING_SCHEMA), quote_ident(SOURCE_TABLE));

        self.execute(&format!("CREATE TABLE {table} ({})", defs.join(", ")))?;
        self.execute(&format!(
            "INSERT INTO {table} SELECT {} FROM {source} ORDER BY rowid",
            Self::projection(columns)
        ))
    }

    fn create_view(&self, columns: &[(String, ColumnType)]) -> Result<()> {
        let source = format!("{}.{}", quote_ident(STAGING_SCHEMA), quote_ident(SOURCE_TABLE));
        self.execute(&format!(
            "CREATE TEMP VIEW {} AS SELECT {} FROM {source} ORDER BY rowid",
            quote_ident(DATASET_TABLE),
            Self::projection(columns)
        ))
    }
}
