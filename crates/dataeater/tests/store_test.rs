//! Integration tests for the data store and its mutation pipeline.

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};

use dataeater::config::{DataEaterConfig, EngineConfig};
use dataeater::store::ROW_ID_COLUMN;
use dataeater::{
    CellValue, ColumnType, DataEaterError, DataStore, HistoryKind, HistoryLog, StorageKind,
};

/// Helper to create a temporary CSV file with given content.
fn create_test_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(".csv").expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file.flush().expect("Failed to flush temp file");
    file
}

fn clients_csv() -> NamedTempFile {
    create_test_file(
        "Nom Complet,age,city,active\n\
         Alice Martin,34,Paris,yes\n\
         Bob Durand,28,Lyon,no\n\
         Chloé Petit,41,Paris,yes\n\
         David Leroy,35,Nice,no\n",
    )
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn loaded_store(file: &NamedTempFile) -> DataStore {
    let mut store = DataStore::new();
    store.load_file(file.path()).expect("Load failed");
    store
}

fn view_store(file: &NamedTempFile) -> DataStore {
    let config = DataEaterConfig {
        engine: EngineConfig {
            materialize: false,
            ..EngineConfig::default()
        },
        ..DataEaterConfig::default()
    };
    let mut store = DataStore::with_config(config).expect("Invalid config");
    store.load_file(file.path()).expect("Load failed");
    store
}

// =============================================================================
// Loading
// =============================================================================

#[test]
fn test_load_infers_schema() {
    let file = clients_csv();
    let store = loaded_store(&file);

    assert_eq!(store.row_count(), 4);
    assert_eq!(
        store.column_names(),
        vec!["Nom Complet", "age", "city", "active"]
    );
    assert_eq!(store.column("age").unwrap().column_type, ColumnType::Integer);
    assert_eq!(store.column("city").unwrap().column_type, ColumnType::Text);
    assert_eq!(store.column("active").unwrap().column_type, ColumnType::Boolean);

    let source = store.source().unwrap();
    assert_eq!(source.storage, StorageKind::Table);
    assert!(source.metadata.hash.starts_with("sha256:"));
}

#[test]
fn test_load_without_materialization_is_a_view() {
    let file = clients_csv();
    let store = view_store(&file);

    assert_eq!(store.source().unwrap().storage, StorageKind::View);
    assert_eq!(store.engine().storage_kind().unwrap(), Some(StorageKind::View));
    assert_eq!(store.row_count(), 4);
    assert_eq!(store.columns().len(), 4);
    assert_eq!(store.preview().rows.len(), 4);
}

#[test]
fn test_reload_replaces_dataset_and_history() {
    let first = clients_csv();
    let second = create_test_file("x,y\n1,2\n");
    let mut store = loaded_store(&first);
    store
        .execute_mutation("DELETE FROM current_dataset WHERE age < 30", Some("Drop minors"))
        .unwrap();

    store.load_file(second.path()).unwrap();
    assert_eq!(store.column_names(), vec!["x", "y"]);
    assert_eq!(store.row_count(), 1);
    assert_eq!(store.history().len(), 1);
    assert!(!store.has_unsaved_changes());
}

#[test]
fn test_duplicate_and_blank_headers_are_normalized() {
    let file = create_test_file("id,ID,,name\n1,2,3,a\n");
    let store = loaded_store(&file);
    assert_eq!(store.column_names(), vec!["id", "ID_2", "column_3", "name"]);
}

#[test]
fn test_ragged_rows_load_and_are_reported() {
    let file = create_test_file("a,b,c\n1,2,3\n4,5\n6,7,8,9\n");
    let store = loaded_store(&file);

    assert_eq!(store.row_count(), 3);
    let rows = store.fetch_all().unwrap();
    assert_eq!(rows[1]["c"], CellValue::Null);

    let jagged = &store.source().unwrap().jagged_rows;
    assert_eq!(jagged.len(), 2);
    assert_eq!(jagged[0].row, 3);
}

#[test]
fn test_empty_file_fails_and_records_error() {
    let file = create_test_file("");
    let mut store = DataStore::new();

    let err = store.load_file(file.path()).unwrap_err();
    assert!(matches!(err, DataEaterError::EmptyData(_)));
    assert!(!store.is_loaded());
    assert!(store.last_error().is_some());
}

#[test]
fn test_load_spreadsheet_reads_first_sheet_only() {
    let mut store = DataStore::new();
    store
        .load_file(fixture("clients.xlsx"))
        .expect("Load failed");

    // The second sheet has four columns and four rows.
    assert_eq!(store.column_names(), vec!["Nom Complet", "age", "city"]);
    assert_eq!(store.row_count(), 3);
    assert_eq!(store.column("age").unwrap().column_type, ColumnType::Integer);
    assert_eq!(store.column("city").unwrap().column_type, ColumnType::Text);
    assert_eq!(
        store.preview().rows[2],
        vec![
            CellValue::Text("Chloé Petit".into()),
            CellValue::Integer(41),
            CellValue::Text("Paris".into())
        ]
    );
    assert_eq!(store.source().unwrap().metadata.file, "clients.xlsx");

    store
        .execute_mutation(
            "DELETE FROM current_dataset WHERE city = 'Lyon'",
            Some("Drop Lyon"),
        )
        .unwrap();
    assert_eq!(store.row_count(), 2);
    assert_eq!(store.history().len(), 2);
}

#[test]
fn test_missing_spreadsheet_fails() {
    let dir = TempDir::new().unwrap();
    let mut store = DataStore::new();

    let result = store.load_file(dir.path().join("missing.xlsx"));
    assert!(result.is_err());
    assert!(!store.is_loaded());
    assert!(store.last_error().is_some());
}

// =============================================================================
// Mutations
// =============================================================================

#[test]
fn test_rename_keeps_rows_and_records_history() {
    let file = clients_csv();
    let mut store = loaded_store(&file);

    store.rename_column("Nom Complet", "full_name").unwrap();

    assert_eq!(store.row_count(), 4);
    assert_eq!(store.columns()[0].name, "full_name");
    assert!(store.column("Nom Complet").is_err());
    let last = store.history().last().unwrap();
    assert_eq!(last.kind, HistoryKind::Rename);
    assert_eq!(last.description, "Renamed Nom Complet → full_name");
    assert!(store.has_unsaved_changes());
}

#[test]
fn test_swap_column_names() {
    let file = create_test_file("a,b\n1,x\n");
    let mut store = loaded_store(&file);

    store.rename_columns(&[("a", "b"), ("b", "a")]).unwrap();
    assert_eq!(store.column_names(), vec!["b", "a"]);
    let rows = store.fetch_all().unwrap();
    assert_eq!(rows[0]["b"], CellValue::Integer(1));
    assert_eq!(rows[0]["a"], CellValue::Text("x".to_string()));
}

#[test]
fn test_rename_to_existing_name_is_rejected() {
    let file = clients_csv();
    let mut store = loaded_store(&file);

    let err = store.rename_column("age", "CITY").unwrap_err();
    assert!(matches!(err, DataEaterError::InvalidInput(_)));
    assert_eq!(store.history().len(), 1);
}

#[test]
fn test_rename_on_view_fails_without_changes() {
    let file = clients_csv();
    let mut store = view_store(&file);

    assert!(store.rename_column("age", "years").is_err());
    assert!(store.column("age").is_ok());
    assert_eq!(store.row_count(), 4);
    assert!(store.last_error().is_some());
    assert_eq!(store.history().len(), 1);
}

#[test]
fn test_failed_transaction_rolls_back() {
    let file = clients_csv();
    let mut store = loaded_store(&file);

    let result = store.execute_transaction(
        &[
            "UPDATE current_dataset SET city = 'Marseille'",
            "UPDATE current_dataset SET no_such_column = 1",
        ],
        HistoryKind::Clean,
        Some("Normalize cities"),
    );
    assert!(result.is_err());

    let cities = store
        .query_result("SELECT DISTINCT city FROM current_dataset ORDER BY city")
        .unwrap();
    assert_eq!(cities.len(), 3);
    assert_eq!(store.history().len(), 1);
    assert!(!store.has_unsaved_changes());
}

#[test]
fn test_transaction_commits_as_one_entry() {
    let file = clients_csv();
    let mut store = loaded_store(&file);

    store
        .execute_transaction(
            &[
                "UPDATE current_dataset SET city = upper(city)",
                "DELETE FROM current_dataset WHERE city = 'NICE'",
            ],
            HistoryKind::Clean,
            Some("Uppercase cities and drop Nice"),
        )
        .unwrap();

    assert_eq!(store.row_count(), 3);
    assert_eq!(store.history().len(), 2);
    let entry = store.history().last().unwrap();
    assert_eq!(entry.kind, HistoryKind::Clean);
    assert!(entry.sql.as_deref().unwrap().contains("upper(city)"));
}

#[test]
fn test_undescribed_mutation_is_not_logged() {
    let file = clients_csv();
    let mut store = loaded_store(&file);

    store
        .execute_mutation("UPDATE current_dataset SET age = age + 1", None)
        .unwrap();
    assert_eq!(store.history().len(), 1);
    assert!(store.has_unsaved_changes());
}

#[test]
fn test_reorder_columns() {
    let file = clients_csv();
    let mut store = loaded_store(&file);

    store.reorder_columns(&["city", "age"]).unwrap();
    assert_eq!(
        store.column_names(),
        vec!["city", "age", "Nom Complet", "active"]
    );
    assert_eq!(store.column("age").unwrap().column_type, ColumnType::Integer);
    assert_eq!(store.row_count(), 4);

    let rows = store.fetch_all().unwrap();
    assert_eq!(rows[0]["Nom Complet"], CellValue::Text("Alice Martin".to_string()));
    assert_eq!(store.history().last().unwrap().kind, HistoryKind::Reorder);
}

#[test]
fn test_remove_duplicates_keeps_first() {
    let file = create_test_file("name,city\nAlice,Paris\nBob,Lyon\nAlice,Paris\nAlice,Nice\n");
    let mut store = loaded_store(&file);

    assert_eq!(store.remove_duplicates::<&str>(&[]).unwrap(), 1);
    assert_eq!(store.row_count(), 3);

    assert_eq!(store.remove_duplicates(&["name"]).unwrap(), 1);
    let rows = store.fetch_all().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["city"], CellValue::Text("Paris".to_string()));

    assert_eq!(store.remove_duplicates(&["name"]).unwrap(), 0);
    assert_eq!(
        store.history().of_kind(HistoryKind::Deduplicate).count(),
        2
    );
}

#[test]
fn test_drop_columns() {
    let file = clients_csv();
    let mut store = loaded_store(&file);

    store.drop_columns(&["age", "active"]).unwrap();
    assert_eq!(store.column_names(), vec!["Nom Complet", "city"]);

    let err = store.drop_columns(&["Nom Complet", "city"]).unwrap_err();
    assert!(matches!(err, DataEaterError::InvalidInput(_)));
    assert_eq!(store.columns().len(), 2);
}

// =============================================================================
// Row identifiers
// =============================================================================

#[test]
fn test_row_ids_are_hidden_and_removed() {
    let file = clients_csv();
    let mut store = loaded_store(&file);

    store
        .with_row_ids(|store, row_id| {
            assert!(store.column(row_id).is_err());
            store.execute_mutation(
                &format!("UPDATE current_dataset SET city = 'Paris' WHERE \"{row_id}\" = 2"),
                Some("Move second client"),
            )
        })
        .unwrap();

    assert_eq!(store.columns().len(), 4);
    let city = store
        .query_result("SELECT city FROM current_dataset WHERE age = 28")
        .unwrap();
    assert_eq!(city.rows[0][0], CellValue::Text("Paris".to_string()));

    let probe = store.query_result(&format!(
        "SELECT COUNT(*) FROM pragma_table_info('current_dataset') WHERE name = '{ROW_ID_COLUMN}'"
    ));
    assert_eq!(probe.unwrap().rows[0][0], CellValue::Integer(0));
}

#[test]
fn test_row_ids_removed_after_error() {
    let file = clients_csv();
    let mut store = loaded_store(&file);

    let result: dataeater::Result<()> = store.with_row_ids(|store, _| {
        store.execute_mutation("UPDATE current_dataset SET missing = 1", Some("Broken"))
    });
    assert!(result.is_err());

    let probe = store
        .query_result(&format!(
            "SELECT COUNT(*) FROM pragma_table_info('current_dataset') WHERE name = '{ROW_ID_COLUMN}'"
        ))
        .unwrap();
    assert_eq!(probe.rows[0][0], CellValue::Integer(0));
    assert_eq!(store.columns().len(), 4);
}

// =============================================================================
// Reads, statistics and health
// =============================================================================

#[test]
fn test_fetch_all_preserves_column_order() {
    let file = clients_csv();
    let store = loaded_store(&file);

    let rows = store.fetch_all().unwrap();
    assert_eq!(rows.len(), 4);
    let keys: Vec<&String> = rows[0].keys().collect();
    assert_eq!(keys, vec!["Nom Complet", "age", "city", "active"]);
    assert_eq!(rows[0]["age"], CellValue::Integer(34));
    assert_eq!(rows[0]["active"], CellValue::Integer(1));
}

#[test]
fn test_selected_column_stats_follow_mutations() {
    let file = clients_csv();
    let mut store = loaded_store(&file);

    let stats = store.select_column(Some("age")).unwrap().unwrap();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.min, CellValue::Integer(28));
    assert_eq!(stats.max, CellValue::Integer(41));
    assert_eq!(stats.mean, Some(34.5));

    store
        .execute_mutation("DELETE FROM current_dataset WHERE age > 40", Some("Drop seniors"))
        .unwrap();
    let stats = store.column_stats().unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.max, CellValue::Integer(35));

    store.drop_columns(&["age"]).unwrap();
    assert!(store.selected_column().is_none());
    assert!(store.column_stats().is_none());
}

#[test]
fn test_health_report() {
    let file = create_test_file("a,b,c\n1,,x\n2,,y\n3\n");
    let store = loaded_store(&file);

    let report = store.health_report().unwrap();
    assert_eq!(report.row_count, 3);
    assert_eq!(report.column_count, 3);
    assert_eq!(report.storage, Some(StorageKind::Table));
    assert_eq!(report.empty_columns, vec!["b"]);
    assert_eq!(report.jagged_rows.len(), 1);
    assert!(!report.is_clean());
}

#[test]
fn test_status_snapshot() {
    let file = clients_csv();
    let mut store = loaded_store(&file);
    store.rename_column("age", "years").unwrap();

    let status = store.status();
    assert!(status.loaded);
    assert_eq!(status.row_count, 4);
    assert_eq!(status.column_count, 4);
    assert_eq!(status.history_len, 2);
    assert!(status.unsaved_changes);
}

// =============================================================================
// History persistence
// =============================================================================

#[test]
fn test_history_saved_and_reloaded_in_order() {
    let file = clients_csv();
    let mut store = loaded_store(&file);
    store.rename_column("Nom Complet", "full_name").unwrap();
    store
        .execute_mutation_as(
            HistoryKind::Clean,
            "UPDATE current_dataset SET city = trim(city)",
            Some("Trim cities"),
        )
        .unwrap();
    store.record_event(HistoryKind::Export, "Exported clients.json");

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("clients.history.json");
    store.history().save(&path, Some("clients.csv")).unwrap();

    let loaded = HistoryLog::load(&path).unwrap();
    let kinds: Vec<HistoryKind> = loaded.entries().iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            HistoryKind::Load,
            HistoryKind::Rename,
            HistoryKind::Clean,
            HistoryKind::Export
        ]
    );
    let seqs: Vec<u64> = loaded.entries().iter().map(|e| e.seq).collect();
    assert_eq!(seqs, vec![1, 2, 3, 4]);
    assert!(loaded.entries()[3].sql.is_none());
}
