//! Example: Load a file, clean it and print the audit trail.
//!
//! Usage:
//!   cargo run --example clean -- <file_path>

use std::env;
use std::path::Path;

use dataeater::{DataStore, HistoryKind};

fn main() -> dataeater::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: cargo run --example clean -- <file_path>");
        std::process::exit(1);
    }

    let path = Path::new(&args[1]);
    if !path.exists() {
        eprintln!("Error: File not found: {}", path.display());
        std::process::exit(1);
    }

    let separator = "=".repeat(80);
    println!("{}", separator);
    println!("DataEater: {}", path.display());
    println!("{}", separator);
    println!();

    let mut store = DataStore::new();
    store.load_file(path)?;

    let health = store.health_report()?;
    println!("## Source");
    println!("  Encoding: {}", health.sniff.encoding);
    println!("  Delimiter: {}", health.sniff.delimiter);
    println!("  Rows: {}", health.row_count);
    println!("  Storage: {:?}", health.storage);
    for jagged in &health.jagged_rows {
        println!(
            "  Jagged row {}: expected {}, found {}",
            jagged.row, jagged.expected, jagged.actual
        );
    }
    println!();

    println!("## Schema");
    for column in store.columns() {
        println!("  {:30} {}", column.name, column.column_type);
    }
    println!();

    // Trim every text column in one transaction.
    let statements: Vec<String> = store
        .columns()
        .iter()
        .filter(|c| c.column_type == dataeater::ColumnType::Text)
        .map(|c| {
            let col = dataeater::sql::quote_ident(&c.name);
            format!("UPDATE current_dataset SET {col} = trim({col})")
        })
        .collect();
    store.execute_transaction(&statements, HistoryKind::Clean, Some("Trim text columns"))?;

    let removed = store.remove_duplicates::<&str>(&[])?;
    println!("Removed {} duplicate rows", removed);
    println!();

    if !health.empty_columns.is_empty() && health.empty_columns.len() < store.columns().len() {
        store.drop_columns(&health.empty_columns)?;
    }

    println!("## History");
    for entry in store.history().entries() {
        println!("  {:>3} {:12} {}", entry.seq, entry.kind.as_str(), entry.description);
    }

    Ok(())
}
