//! Inspect command - load a file and report schema, health and statistics.

use std::path::PathBuf;

use colored::Colorize;
use dataeater::{ColumnStats, DataEaterConfig, HealthReport};

use super::open_store;

pub fn run(
    file: PathBuf,
    column: Option<String>,
    json_output: bool,
    config: DataEaterConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_store(&file, config)?;
    let health = store.health_report()?;
    let stats = match &column {
        Some(name) => store.select_column(Some(name.as_str()))?.cloned(),
        None => None,
    };

    if json_output {
        let output = serde_json::json!({
            "columns": store.columns(),
            "health": health,
            "column_stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_health(&health);
    println!();

    println!("{}", "Schema:".yellow().bold());
    let width = store
        .columns()
        .iter()
        .map(|c| c.name.chars().count())
        .max()
        .unwrap_or(0);
    for column in store.columns() {
        println!(
            "  {:<width$}  {}",
            column.name.white(),
            column.column_type.to_string().cyan(),
            width = width
        );
    }

    if let Some(stats) = &stats {
        println!();
        print_stats(stats);
    }

    Ok(())
}

fn print_health(health: &HealthReport) {
    println!(
        "{} {}",
        "Inspecting".cyan().bold(),
        health.source.file.white()
    );
    println!();
    println!("  Rows:      {}", health.row_count.to_string().white().bold());
    println!("  Columns:   {}", health.column_count.to_string().white().bold());
    if let Some(storage) = health.storage {
        println!("  Storage:   {}", storage);
    }
    println!(
        "  Format:    {} / {} / {}",
        health.sniff.encoding,
        health.sniff.delimiter,
        health.sniff.newline.as_str().escape_default()
    );
    println!("  Hash:      {}", health.source.hash.dimmed());

    if health.is_clean() {
        println!();
        println!("{}", "No structural problems found.".green());
        return;
    }

    if !health.jagged_rows.is_empty() {
        println!();
        println!(
            "{} {}",
            "Jagged rows:".yellow().bold(),
            health.jagged_rows.len()
        );
        for row in &health.jagged_rows {
            println!(
                "  row {}: expected {}, found {}",
                row.row.to_string().white().bold(),
                row.expected,
                row.actual.to_string().red()
            );
        }
    }
    if !health.empty_columns.is_empty() {
        println!();
        println!(
            "{} {}",
            "Empty columns:".yellow().bold(),
            health.empty_columns.join(", ")
        );
    }
}

fn print_stats(stats: &ColumnStats) {
    println!(
        "{} {} ({})",
        "Column".yellow().bold(),
        stats.column.white().bold(),
        stats.column_type
    );
    println!("  Total:     {}", stats.total);
    println!("  Nulls:     {}", stats.null_count);
    println!("  Empty:     {}", stats.empty_count);
    println!("  Distinct:  {}", stats.distinct_count);
    println!("  Min:       {}", stats.min);
    println!("  Max:       {}", stats.max);
    if let Some(mean) = stats.mean {
        println!("  Mean:      {:.4}", mean);
    }
    if !stats.top_values.is_empty() {
        println!("  Top values:");
        for top in &stats.top_values {
            println!("    {:>6}  {}", top.count.to_string().cyan(), top.value);
        }
    }
}
