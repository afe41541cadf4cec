//! Spreadsheet inputs, converted to CSV before ingestion.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use chrono::Timelike;
use tracing::info;

use super::connection::TableEngine;
use super::ingest::IngestSummary;
use crate::error::{DataEaterError, Result};
use crate::sniff::SniffResult;

/// Render one cell the way it reads in the spreadsheet.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) if value.time().num_seconds_from_midnight() == 0 => {
                value.format("%Y-%m-%d").to_string()
            }
            Some(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => cell.to_string(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
    }
}

/// Convert the first sheet of a workbook into CSV bytes.
pub fn first_sheet_to_csv(path: &Path) -> Result<Vec<u8>> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DataEaterError::EmptyData(format!("'{}' has no sheets", path.display())))??;

    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in range.rows() {
        writer.write_record(row.iter().map(cell_text))?;
    }
    writer
        .into_inner()
        .map_err(|e| DataEaterError::Spreadsheet(e.to_string()))
}

impl TableEngine {
    /// Replace the dataset with the first sheet of a workbook.
    pub fn load_spreadsheet(&self, path: &Path) -> Result<IngestSummary> {
        let bytes = first_sheet_to_csv(path)?;
        if bytes.is_empty() {
            return Err(DataEaterError::EmptyData(format!(
                "first sheet of '{}' is empty",
                path.display()
            )));
        }

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "sheet".to_string());
        let converted = self.register_file(&format!("{stem}.csv"), &bytes)?;
        info!(path = %path.display(), "converted first sheet to csv");

        self.load_delimited(&converted, &SniffResult::default())
    }
}
