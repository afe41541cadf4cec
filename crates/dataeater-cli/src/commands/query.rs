//! Query command - run a read-only statement against a loaded file.

use std::path::PathBuf;

use colored::Colorize;
use dataeater::DataEaterConfig;

use super::{open_store, print_last_error, print_table};

pub fn run(
    file: PathBuf,
    sql: String,
    limit: usize,
    config: DataEaterConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_store(&file, config)?;

    let result = match store.query_result(&sql) {
        Ok(result) => result,
        Err(e) => {
            print_last_error(&store);
            return Err(e.into());
        }
    };

    print_table(&result, limit);
    println!();
    println!(
        "{} {}",
        result.len().to_string().white().bold(),
        "rows".dimmed()
    );
    Ok(())
}
