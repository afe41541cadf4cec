//! The embedded SQL engine instance.

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::unsync::OnceCell;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::{Value, ValueRef};
use rusqlite::{Connection, InterruptHandle, OptionalExtension, Transaction, params_from_iter};
use tempfile::TempDir;
use tracing::{debug, info};

use super::types::ColumnType;
use super::value::{CellValue, Column, QueryResult, StorageKind};
use crate::config::EngineConfig;
use crate::error::{DataEaterError, Result};
use crate::sql::{DATASET_TABLE, LOWER_FUNCTION, STAGING_SCHEMA, is_reserved, quote_ident};

/// Register the engine's scalar functions on a connection.
///
/// `dataeater_lower(x)` lowercases text with full Unicode case mapping,
/// where the built-in `lower()` only folds ASCII.
pub fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        LOWER_FUNCTION,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let lowered = match ctx.get_raw(0) {
                ValueRef::Null | ValueRef::Blob(_) => None,
                ValueRef::Integer(i) => Some(i.to_string()),
                ValueRef::Real(f) => Some(f.to_string()),
                ValueRef::Text(bytes) => Some(String::from_utf8_lossy(bytes).to_lowercase()),
            };
            Ok(lowered)
        },
    )
}

/// Owns one in-memory connection and its on-disk staging database.
///
/// The connection is opened lazily on the first call to [`TableEngine::init`];
/// later calls return the same handle.
pub struct TableEngine {
    config: EngineConfig,
    work_dir: OnceCell<TempDir>,
    conn: OnceCell<Connection>,
}

impl TableEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            work_dir: OnceCell::new(),
            conn: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Open the engine if needed and return the connection.
    pub fn init(&self) -> Result<&Connection> {
        self.conn.get_or_try_init(|| self.open())
    }

    /// Whether [`TableEngine::init`] has already run.
    pub fn is_initialized(&self) -> bool {
        self.conn.get().is_some()
    }

    fn open(&self) -> Result<Connection> {
        let dir = self.work_dir()?;
        let conn = Connection::open_in_memory()?;
        register_functions(&conn)?;

        let staging = dir.join("staging.db");
        conn.execute(
            &format!("ATTACH DATABASE ?1 AS {}", quote_ident(STAGING_SCHEMA)),
            [staging.to_string_lossy().as_ref()],
        )?;

        if let Some(limit) = self.config.memory_limit_bytes {
            // PRAGMA hard_heap_limit answers with a row, so it is queried.
            let applied: i64 = conn.query_row(
                &format!("PRAGMA hard_heap_limit = {}", limit.max(0)),
                [],
                |row| row.get(0),
            )?;
            debug!(limit = applied, "engine heap limit set");
        }

        info!(work_dir = %dir.display(), "table engine initialized");
        Ok(conn)
    }

    /// Directory holding the staging database and registered files.
    pub fn work_dir(&self) -> Result<&Path> {
        let dir = self.work_dir.get_or_try_init(|| {
            let mut builder = tempfile::Builder::new();
            builder.prefix("dataeater-");
            match &self.config.work_dir {
                Some(parent) => {
                    fs::create_dir_all(parent).map_err(|e| DataEaterError::io(parent, e))?;
                    builder.tempdir_in(parent).map_err(|e| DataEaterError::io(parent, e))
                }
                None => builder
                    .tempdir()
                    .map_err(|e| DataEaterError::io(std::env::temp_dir(), e)),
            }
        })?;
        Ok(dir.path())
    }

    /// Make bytes addressable by a file name inside the engine's work
    /// directory and return the resulting path.
    pub fn register_file(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let file_name = Path::new(name)
            .file_name()
            .ok_or_else(|| DataEaterError::InvalidInput(format!("invalid file name '{name}'")))?;
        let path = self.work_dir()?.join(file_name);
        fs::write(&path, bytes).map_err(|e| DataEaterError::io(&path, e))?;
        debug!(path = %path.display(), bytes = bytes.len(), "registered file");
        Ok(path)
    }

    /// Handle that aborts whatever statement is running, from any thread.
    pub fn interrupt_handle(&self) -> Result<InterruptHandle> {
        Ok(self.init()?.get_interrupt_handle())
    }

    /// Execute one or more statements, discarding any rows.
    pub fn execute(&self, sql: &str) -> Result<()> {
        debug!(sql, "execute");
        self.init()?.execute_batch(sql)?;
        Ok(())
    }

    /// Execute a single statement with bound parameters.
    pub fn execute_with(&self, sql: &str, params: &[Value]) -> Result<usize> {
        debug!(sql, params = params.len(), "execute");
        Ok(self.init()?.execute(sql, params_from_iter(params.iter()))?)
    }

    /// Run a statement and collect every row.
    pub fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        debug!(sql, params = params.len(), "query");
        let conn = self.init()?;
        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(width);
            for i in 0..width {
                cells.push(CellValue::from(row.get_ref(i)?));
            }
            out.push(cells);
        }

        Ok(QueryResult { columns, rows: out })
    }

    /// Whether a statement only reads. Fails if the SQL does not prepare.
    pub fn is_read_only(&self, sql: &str) -> Result<bool> {
        let stmt = self.init()?.prepare(sql)?;
        Ok(stmt.readonly())
    }

    /// Run `f` inside a transaction: committed if it returns `Ok`, rolled
    /// back otherwise.
    pub fn transaction<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let tx = self.init()?.unchecked_transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Whether `current_dataset` exists and if so, as what.
    pub fn storage_kind(&self) -> Result<Option<StorageKind>> {
        let conn = self.init()?;
        let lookup = |catalog: &str| -> Result<Option<String>> {
            let sql = format!("SELECT type FROM {catalog} WHERE name = ?1 AND type IN ('table', 'view')");
            Ok(conn
                .query_row(&sql, [DATASET_TABLE], |row| row.get::<_, String>(0))
                .optional()?)
        };

        // Temp objects shadow main ones.
        let kind = match lookup("sqlite_temp_master")? {
            Some(kind) => Some(kind),
            None => lookup("main.sqlite_master")?,
        };
        Ok(kind.map(|k| if k == "view" { StorageKind::View } else { StorageKind::Table }))
    }

    /// Drop the dataset, whether it is a table or a view.
    pub fn drop_dataset(&self) -> Result<()> {
        let name = quote_ident(DATASET_TABLE);
        self.execute(&format!(
            "DROP VIEW IF EXISTS temp.{name}; DROP TABLE IF EXISTS main.{name};"
        ))
    }

    /// Visible columns of the dataset, read fresh from the engine.
    pub fn describe(&self) -> Result<Vec<Column>> {
        let conn = self.init()?;
        let mut stmt = conn.prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
        let declared: Vec<(String, String)> = stmt
            .query_map([DATASET_TABLE], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<_, _>>()?;

        if declared.is_empty() {
            return Err(DataEaterError::NoDataset);
        }

        let mut columns = Vec::with_capacity(declared.len());
        for (name, decl) in declared {
            if is_reserved(&name) {
                continue;
            }
            let column_type = match ColumnType::from_declared(&decl) {
                Some(ty) => ty,
                None => self.probe_type(&name)?,
            };
            columns.push(Column { name, column_type });
        }
        Ok(columns)
    }

    fn probe_type(&self, column: &str) -> Result<ColumnType> {
        let col = quote_ident(column);
        let sql = format!(
            "SELECT typeof({col}), CAST({col} AS TEXT) FROM {} WHERE {col} IS NOT NULL LIMIT 1",
            quote_ident(DATASET_TABLE)
        );
        let sample: Option<(String, Option<String>)> = self
            .init()?
            .query_row(&sql, [], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()?;

        Ok(match sample {
            Some((storage, text)) => ColumnType::from_storage_class(&storage, text.as_deref()),
            None => ColumnType::Text,
        })
    }

    /// Total row count, read fresh from the engine.
    pub fn row_count(&self) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(DATASET_TABLE));
        let count: i64 = self.init()?.query_row(&sql, [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

impl Default for TableEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for TableEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableEngine")
            .field("config", &self.config)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
