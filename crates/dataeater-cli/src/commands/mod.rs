//! CLI command implementations.

pub mod apply;
pub mod inspect;
pub mod query;
pub mod serve;
pub mod sniff;

use std::path::{Path, PathBuf};

use colored::Colorize;
use dataeater::{CellValue, DataEaterConfig, DataStore, QueryResult};

/// Configuration from `--config` (or defaults), with flag overrides applied.
pub fn load_config(
    path: Option<&Path>,
    memory_limit: Option<i64>,
) -> Result<DataEaterConfig, Box<dyn std::error::Error>> {
    let mut config = match path {
        Some(path) => DataEaterConfig::load(path)?,
        None => DataEaterConfig::default(),
    };
    if let Some(limit) = memory_limit {
        config.engine.memory_limit_bytes = Some(limit);
    }
    config.validate()?;
    Ok(config)
}

/// Create a store and load `file` into it.
pub fn open_store(
    file: &PathBuf,
    config: DataEaterConfig,
) -> Result<DataStore, Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }
    let mut store = DataStore::with_config(config)?;
    if let Err(e) = store.load_file(file) {
        print_last_error(&store);
        return Err(e.into());
    }
    Ok(store)
}

/// Print the store's classified last error, if any.
pub fn print_last_error(store: &DataStore) {
    let Some(report) = store.last_error() else {
        return;
    };
    eprintln!("{} {}", report.title.red().bold(), report.message);
    eprintln!("  {} {}", "Suggestion:".yellow(), report.suggestion);
    if let Some(operation) = &report.operation {
        eprintln!("  {} {}", "While:".dimmed(), operation);
    }
}

/// Render a result as an aligned text table, at most `limit` rows.
pub fn print_table(result: &QueryResult, limit: usize) {
    const MAX_WIDTH: usize = 32;

    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .take(limit)
        .map(|row| row.iter().map(display_cell).collect())
        .collect();

    let widths: Vec<usize> = result
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            cells
                .iter()
                .filter_map(|row| row.get(i))
                .map(|c| c.chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
                .min(MAX_WIDTH)
        })
        .collect();

    let header: Vec<String> = result
        .columns
        .iter()
        .zip(&widths)
        .map(|(name, w)| format!("{:<w$}", truncate(name, *w), w = *w))
        .collect();
    println!("{}", header.join(" | ").bold());
    println!(
        "{}",
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-")
    );
    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<w$}", truncate(cell, *w), w = *w))
            .collect();
        println!("{}", line.join(" | "));
    }

    if result.len() > limit {
        println!(
            "{}",
            format!("... {} more rows", result.len() - limit).dimmed()
        );
    }
}

fn display_cell(value: &CellValue) -> String {
    match value {
        CellValue::Null => "NULL".to_string(),
        other => other.to_string(),
    }
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let cut: String = s.chars().take(width.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
