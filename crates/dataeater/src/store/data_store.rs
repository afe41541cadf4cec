//! The session object that owns the dataset and every write to it.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::health::{HealthReport, empty_columns};
use super::stats::{ColumnStats, column_stats};
use crate::config::DataEaterConfig;
use crate::diagnostics::ErrorReport;
use crate::engine::{
    CellValue, Column, InterruptHandle, QueryResult, SqlValue, StorageKind, TableEngine,
};
use crate::error::{DataEaterError, Result};
use crate::history::{HistoryKind, HistoryLog};
use crate::sniff::{JaggedRowError, SniffResult, Sniffer, SourceFormat, SourceMetadata};
use crate::sql::{DATASET_TABLE, ident_list, quote_ident};
use crate::view::{Rule, SortState, ViewState};

/// What was loaded and what the sniffer found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadedSource {
    pub metadata: SourceMetadata,
    pub sniff: SniffResult,
    pub jagged_rows: Vec<JaggedRowError>,
    /// Storage chosen at load time.
    pub storage: StorageKind,
}

/// Bounded preview of the filtered, sorted dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Preview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    /// Rows matching the current filter, before the limit.
    pub matching_rows: u64,
    pub limit: usize,
}

/// Snapshot of the session for status displays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStatus {
    pub loaded: bool,
    pub file: Option<String>,
    pub row_count: u64,
    pub column_count: usize,
    pub unsaved_changes: bool,
    pub history_len: usize,
    pub last_error: Option<ErrorReport>,
}

/// Owns the engine, the dataset's derived state and the history log.
///
/// Every schema or data change goes through [`DataStore::execute_mutation`]
/// or one of its siblings. Each successful change re-reads the schema and
/// row count from the engine, refreshes the preview and the selected
/// column's statistics, and appends to the history before returning.
#[derive(Debug)]
pub struct DataStore {
    config: DataEaterConfig,
    sniffer: Sniffer,
    pub(super) engine: TableEngine,
    source: Option<LoadedSource>,
    pub(super) columns: Vec<Column>,
    row_count: u64,
    preview: Preview,
    selected_column: Option<String>,
    column_stats: Option<ColumnStats>,
    history: HistoryLog,
    view: ViewState,
    unsaved_changes: bool,
    last_error: Option<ErrorReport>,
}

impl DataStore {
    /// Create a store with default configuration.
    pub fn new() -> Self {
        Self::build(DataEaterConfig::default())
    }

    /// Create a store with a validated configuration.
    pub fn with_config(config: DataEaterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: DataEaterConfig) -> Self {
        Self {
            sniffer: Sniffer::with_config(config.sniff.clone()),
            engine: TableEngine::new(config.engine.clone()),
            config,
            source: None,
            columns: Vec::new(),
            row_count: 0,
            preview: Preview::default(),
            selected_column: None,
            column_stats: None,
            history: HistoryLog::new(),
            view: ViewState::default(),
            unsaved_changes: false,
            last_error: None,
        }
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Load a file, replacing any previous dataset, history and view state.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading file");
        self.reset()?;

        match self.load_inner(path) {
            Ok(()) => Ok(()),
            Err(e) => {
                let report = e.report().with_operation(format!("Load {}", path.display()));
                error!(code = %report.code, error = %report.raw_message, "load failed");
                self.last_error = Some(report);
                Err(e)
            }
        }
    }

    fn load_inner(&mut self, path: &Path) -> Result<()> {
        let metadata = SourceMetadata::from_path(path)?;

        let (sniff, jagged_rows, summary) = match metadata.format {
            SourceFormat::Delimited => {
                let sniff = self.sniffer.sniff_or_default(path);
                let jagged_rows = self
                    .sniffer
                    .find_jagged_rows(path, Some(sniff.delimiter), sniff.encoding)
                    .unwrap_or_else(|e| {
                        warn!(error = %e, "structural scan failed");
                        Vec::new()
                    });
                let summary = self.engine.load_delimited(path, &sniff)?;
                (sniff, jagged_rows, summary)
            }
            SourceFormat::Spreadsheet => {
                let summary = self.engine.load_spreadsheet(path)?;
                (SniffResult::default(), Vec::new(), summary)
            }
        };

        if !jagged_rows.is_empty() {
            warn!(count = jagged_rows.len(), "jagged rows detected");
        }

        let description = format!(
            "Loaded {} ({} rows, {} columns)",
            metadata.file,
            summary.rows,
            summary.columns.len()
        );
        self.source = Some(LoadedSource {
            metadata,
            sniff,
            jagged_rows,
            storage: summary.storage,
        });
        self.sync()?;
        self.history.append(HistoryKind::Load, description, None);
        self.unsaved_changes = false;
        self.last_error = None;
        Ok(())
    }

    /// Discard the dataset, history, view state and last error.
    pub fn reset(&mut self) -> Result<()> {
        if self.engine.is_initialized() {
            self.engine.drop_dataset()?;
        }
        self.source = None;
        self.columns.clear();
        self.row_count = 0;
        self.preview = Preview::default();
        self.selected_column = None;
        self.column_stats = None;
        self.history.clear();
        self.view.clear();
        self.unsaved_changes = false;
        self.last_error = None;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Mutation pipeline
    // ------------------------------------------------------------------

    /// Apply a statement that changes the dataset, recorded as TRANSFORM
    /// when a description is given.
    pub fn execute_mutation(&mut self, sql: &str, description: Option<&str>) -> Result<()> {
        self.execute_mutation_as(HistoryKind::Transform, sql, description)
    }

    /// Apply a statement, tagging its history entry with `kind`.
    ///
    /// On failure the dataset keeps whatever the engine left behind.
    pub fn execute_mutation_as(
        &mut self,
        kind: HistoryKind,
        sql: &str,
        description: Option<&str>,
    ) -> Result<()> {
        self.require_dataset()?;
        let label = description.unwrap_or("mutation");
        info!(kind = %kind, description = label, "applying mutation");

        if let Err(e) = self.engine.execute(sql) {
            return Err(self.fail(e, label));
        }
        self.commit_change(kind, description, sql.to_string())
    }

    /// Apply several statements atomically: all succeed or none is kept.
    pub fn execute_transaction<S: AsRef<str>>(
        &mut self,
        statements: &[S],
        kind: HistoryKind,
        description: Option<&str>,
    ) -> Result<()> {
        self.require_dataset()?;
        if statements.is_empty() {
            return Ok(());
        }
        let label = description.unwrap_or("transaction");
        info!(kind = %kind, description = label, statements = statements.len(), "applying transaction");

        let result = self.engine.transaction(|tx| {
            for statement in statements {
                tx.execute_batch(statement.as_ref())?;
            }
            Ok(())
        });
        if let Err(e) = result {
            return Err(self.fail(e, label));
        }

        let sql = statements
            .iter()
            .map(|s| s.as_ref().trim_end_matches(';'))
            .collect::<Vec<_>>()
            .join(";\n");
        self.commit_change(kind, description, sql)
    }

    /// Record an event that did not change the dataset, such as an export.
    pub fn record_event(&mut self, kind: HistoryKind, description: impl Into<String>) {
        self.history.append(kind, description, None);
    }

    fn commit_change(
        &mut self,
        kind: HistoryKind,
        description: Option<&str>,
        sql: String,
    ) -> Result<()> {
        if let Err(e) = self.sync() {
            return Err(self.fail(e, description.unwrap_or("refresh after mutation")));
        }
        self.unsaved_changes = true;
        if let Some(description) = description {
            self.history.append(kind, description, Some(sql));
        }
        Ok(())
    }

    /// Classify, log and remember a failure, returning it as a mutation error.
    pub(super) fn fail(&mut self, err: DataEaterError, operation: &str) -> DataEaterError {
        let report = err.report().with_operation(operation);
        error!(
            code = %report.code,
            operation,
            error = %report.raw_message,
            "operation failed"
        );
        self.last_error = Some(report.clone());
        DataEaterError::Mutation(Box::new(report))
    }

    pub(super) fn require_dataset(&self) -> Result<()> {
        if self.source.is_none() {
            return Err(DataEaterError::NoDataset);
        }
        Ok(())
    }

    /// Re-read schema and row count, then refresh preview and statistics.
    pub(super) fn sync(&mut self) -> Result<()> {
        self.columns = self.engine.describe()?;
        self.row_count = self.engine.row_count()?;

        if let Some(selected) = &self.selected_column {
            if !self.columns.iter().any(|c| &c.name == selected) {
                self.selected_column = None;
                self.column_stats = None;
            }
        }

        self.refresh_preview();
        self.refresh_stats();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Run a read-only statement. Anything that would write is rejected.
    pub fn query_result(&mut self, sql: &str) -> Result<QueryResult> {
        let outcome = self.engine.is_read_only(sql).and_then(|read_only| {
            if read_only {
                self.engine.query(sql, &[])
            } else {
                Err(DataEaterError::InvalidInput(
                    "only read-only statements are accepted; submit changes as mutations"
                        .to_string(),
                ))
            }
        });

        outcome.map_err(|e| {
            let report = e.report().with_operation("query");
            warn!(code = %report.code, error = %report.raw_message, "query failed");
            self.last_error = Some(report);
            e
        })
    }

    /// Re-run the bounded preview with the current view state.
    ///
    /// Failures are logged and leave an empty preview.
    pub fn refresh_preview(&mut self) {
        let limit = self.config.view.preview_limit;
        let compiled = self.view.compile(&self.columns, limit);

        let fetched = self
            .engine
            .query(&compiled.select_sql, &compiled.select_params())
            .and_then(|result| {
                let matching = self.engine.query(&compiled.count_sql, &compiled.params)?;
                let matching_rows = match matching.rows.first().and_then(|r| r.first()) {
                    Some(CellValue::Integer(n)) => (*n).max(0) as u64,
                    _ => 0,
                };
                Ok((result, matching_rows))
            });

        self.preview = match fetched {
            Ok((result, matching_rows)) => Preview {
                columns: result.columns,
                rows: result.rows,
                matching_rows,
                limit,
            },
            Err(e) => {
                warn!(error = %e, "preview query failed, showing no rows");
                Preview {
                    columns: self.column_names(),
                    limit,
                    ..Preview::default()
                }
            }
        };
    }

    fn refresh_stats(&mut self) {
        let Some(selected) = self.selected_column.clone() else {
            return;
        };
        self.column_stats = match self.compute_stats(&selected) {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!(column = %selected, error = %e, "column statistics failed");
                None
            }
        };
    }

    fn compute_stats(&self, name: &str) -> Result<ColumnStats> {
        let column = self.column(name)?;
        column_stats(&self.engine, column, self.config.view.top_values)
    }

    /// Select a column (or clear the selection) and compute its statistics.
    pub fn select_column(&mut self, name: Option<&str>) -> Result<Option<&ColumnStats>> {
        match name {
            None => {
                self.selected_column = None;
                self.column_stats = None;
            }
            Some(name) => {
                self.require_dataset()?;
                let stats = self.compute_stats(name)?;
                self.selected_column = Some(name.to_string());
                self.column_stats = Some(stats);
            }
        }
        Ok(self.column_stats.as_ref())
    }

    /// Every row of the dataset as ordered objects, unbounded and unfiltered.
    pub fn fetch_all(&self) -> Result<Vec<IndexMap<String, CellValue>>> {
        self.require_dataset()?;
        let sql = format!(
            "SELECT {} FROM {}",
            ident_list(&self.column_names()),
            quote_ident(DATASET_TABLE)
        );
        Ok(self.engine.query(&sql, &[])?.into_records())
    }

    /// Load diagnostics plus a fresh look at the dataset.
    pub fn health_report(&self) -> Result<HealthReport> {
        let source = self.source.as_ref().ok_or(DataEaterError::NoDataset)?;
        Ok(HealthReport {
            source: source.metadata.clone(),
            sniff: source.sniff,
            jagged_rows: source.jagged_rows.clone(),
            row_count: self.engine.row_count()?,
            column_count: self.columns.len(),
            storage: self.engine.storage_kind()?,
            empty_columns: empty_columns(&self.engine, &self.columns)?,
            generated_at: chrono::Utc::now(),
        })
    }

    // ------------------------------------------------------------------
    // View state
    // ------------------------------------------------------------------

    /// Replace the filter rules and refresh the preview.
    pub fn set_rules(&mut self, rules: Vec<Rule>) {
        self.view.rules = rules;
        self.refresh_preview();
    }

    /// Set or clear the free-text search and refresh the preview.
    pub fn set_search(&mut self, search: Option<String>) {
        self.view.search = search.filter(|s| !s.trim().is_empty());
        self.refresh_preview();
    }

    /// Advance the sort on `column` and refresh the preview.
    pub fn toggle_sort(&mut self, column: &str) -> Result<&SortState> {
        self.column(column)?;
        self.view.sort.toggle(column);
        self.refresh_preview();
        Ok(&self.view.sort)
    }

    /// Drop rules, search and sort.
    pub fn clear_view(&mut self) {
        self.view.clear();
        self.refresh_preview();
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn config(&self) -> &DataEaterConfig {
        &self.config
    }

    pub fn engine(&self) -> &TableEngine {
        &self.engine
    }

    /// Handle that cancels the running statement from another thread.
    pub fn interrupt_handle(&self) -> Result<InterruptHandle> {
        self.engine.interrupt_handle()
    }

    pub fn is_loaded(&self) -> bool {
        self.source.is_some()
    }

    pub fn source(&self) -> Option<&LoadedSource> {
        self.source.as_ref()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Look up a visible column by exact name.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| DataEaterError::ColumnNotFound(name.to_string()))
    }

    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    pub fn preview(&self) -> &Preview {
        &self.preview
    }

    pub fn selected_column(&self) -> Option<&str> {
        self.selected_column.as_deref()
    }

    pub fn column_stats(&self) -> Option<&ColumnStats> {
        self.column_stats.as_ref()
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved_changes
    }

    /// Clear the unsaved-changes flag after an export or checkpoint.
    pub fn mark_saved(&mut self) {
        self.unsaved_changes = false;
    }

    pub fn last_error(&self) -> Option<&ErrorReport> {
        self.last_error.as_ref()
    }

    pub fn status(&self) -> StoreStatus {
        StoreStatus {
            loaded: self.is_loaded(),
            file: self.source.as_ref().map(|s| s.metadata.file.clone()),
            row_count: self.row_count,
            column_count: self.columns.len(),
            unsaved_changes: self.unsaved_changes,
            history_len: self.history.len(),
            last_error: self.last_error.clone(),
        }
    }

    /// Count rows matching a bound predicate; used by the rewrites.
    pub(super) fn count_where(&self, predicate: &str, params: &[SqlValue]) -> Result<u64> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {predicate}",
            quote_ident(DATASET_TABLE)
        );
        let result = self.engine.query(&sql, params)?;
        Ok(match result.rows.first().and_then(|r| r.first()) {
            Some(CellValue::Integer(n)) => (*n).max(0) as u64,
            _ => 0,
        })
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(".csv").unwrap();
        write!(file, "{}", content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_mutation_requires_dataset() {
        let mut store = DataStore::new();
        let err = store.execute_mutation("DELETE FROM current_dataset", None).unwrap_err();
        assert!(matches!(err, DataEaterError::NoDataset));
    }

    #[test]
    fn test_load_records_history_and_preview() {
        let file = create_test_file("a,b\n1,x\n2,y\n");
        let mut store = DataStore::new();
        store.load_file(file.path()).unwrap();

        assert_eq!(store.row_count(), 2);
        assert_eq!(store.preview().rows.len(), 2);
        assert_eq!(store.preview().matching_rows, 2);
        assert_eq!(store.history().len(), 1);
        assert_eq!(store.history().entries()[0].kind, HistoryKind::Load);
        assert!(!store.has_unsaved_changes());
    }

    #[test]
    fn test_failed_mutation_is_classified() {
        let file = create_test_file("a\n1\n");
        let mut store = DataStore::new();
        store.load_file(file.path()).unwrap();

        let err = store
            .execute_mutation("UPDATE current_dataset SET missing = 1", Some("Bad update"))
            .unwrap_err();
        let DataEaterError::Mutation(report) = err else {
            panic!("expected a mutation error");
        };
        assert_eq!(report.code, crate::diagnostics::ErrorCode::StructuralMismatch);
        assert_eq!(report.operation.as_deref(), Some("Bad update"));
        assert_eq!(store.last_error().unwrap().code, report.code);
        assert_eq!(store.history().len(), 1);
    }

    #[test]
    fn test_query_result_rejects_writes() {
        let file = create_test_file("a\n1\n");
        let mut store = DataStore::new();
        store.load_file(file.path()).unwrap();

        assert!(store.query_result("DELETE FROM current_dataset").is_err());
        assert!(store.last_error().is_some());
        let result = store.query_result("SELECT a * 2 AS doubled FROM current_dataset").unwrap();
        assert_eq!(result.columns, vec!["doubled"]);
        assert_eq!(result.rows[0][0], CellValue::Integer(2));
        assert_eq!(store.row_count(), 1);
    }

    #[test]
    fn test_mark_saved() {
        let file = create_test_file("a\n1\n");
        let mut store = DataStore::new();
        store.load_file(file.path()).unwrap();
        store
            .execute_mutation("UPDATE current_dataset SET a = a + 1", None)
            .unwrap();
        assert!(store.has_unsaved_changes());
        assert_eq!(store.history().len(), 1);
        store.mark_saved();
        assert!(!store.has_unsaved_changes());
    }
}
