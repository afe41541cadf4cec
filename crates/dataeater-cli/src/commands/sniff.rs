//! Sniff command - detect the file format without loading it.

use std::path::PathBuf;

use colored::Colorize;
use dataeater::{DataEaterConfig, Sniffer};

pub fn run(
    file: PathBuf,
    json_output: bool,
    config: &DataEaterConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    let sniffer = Sniffer::with_config(config.sniff.clone());
    let result = sniffer.sniff_path(&file)?;
    let jagged = sniffer.find_jagged_rows(&file, Some(result.delimiter), result.encoding)?;

    if json_output {
        let output = serde_json::json!({
            "file": file.display().to_string(),
            "sniff": result,
            "jagged_rows": jagged,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{} {}", "Sniffed".cyan().bold(), file.display().to_string().white());
    println!();
    println!("  Encoding:  {}", result.encoding.to_string().white());
    println!("  Delimiter: {}", result.delimiter.to_string().white());
    println!("  Newline:   {}", result.newline.as_str().escape_default().to_string().white());
    println!("  Header:    {}", if result.has_header { "yes" } else { "no" });
    println!();

    if jagged.is_empty() {
        println!("{}", "No jagged rows in the scanned prefix.".green());
    } else {
        println!(
            "{} {}",
            "Jagged rows:".yellow().bold(),
            jagged.len().to_string().white()
        );
        for row in &jagged {
            println!(
                "  row {}: expected {} fields, found {}  {}",
                row.row.to_string().white().bold(),
                row.expected,
                row.actual.to_string().red(),
                row.content.dimmed()
            );
        }
    }

    Ok(())
}
