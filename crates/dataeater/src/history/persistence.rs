//! Persistence for history logs - save/load JSON files.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DataEaterError, Result};

use super::entry::HistoryEntry;
use super::log::HistoryLog;

/// Current version of the history file format.
pub const HISTORY_VERSION: &str = "1.0.0";

#[derive(Debug, Serialize, Deserialize)]
struct HistoryFile {
    version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    saved_at: DateTime<Utc>,
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    /// Save the log to a JSON file.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use dataeater::history::HistoryLog;
    /// # fn example(log: &HistoryLog) -> dataeater::Result<()> {
    /// log.save("people.history.json", Some("people.csv"))?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn save(&self, path: impl AsRef<Path>, source: Option<&str>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    DataEaterError::Persistence(format!(
                        "Failed to create directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let file = File::create(path).map_err(|e| {
            DataEaterError::Persistence(format!(
                "Failed to create file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let document = HistoryFile {
            version: HISTORY_VERSION.to_string(),
            source: source.map(str::to_string),
            saved_at: Utc::now(),
            entries: self.entries().to_vec(),
        };

        serde_json::to_writer_pretty(BufWriter::new(file), &document).map_err(|e| {
            DataEaterError::Persistence(format!("Failed to serialize history: {}", e))
        })?;

        Ok(())
    }

    /// Load a log from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|e| {
            DataEaterError::Persistence(format!(
                "Failed to open file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let document: HistoryFile =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| {
                DataEaterError::Persistence(format!(
                    "Failed to parse history '{}': {}",
                    path.display(),
                    e
                ))
            })?;

        let mut log = HistoryLog::new();
        for entry in document.entries {
            log.push_loaded(entry)?;
        }
        Ok(log)
    }

    fn push_loaded(&mut self, entry: HistoryEntry) -> Result<()> {
        let expected = self.last().map_or(1, |e| e.seq + 1);
        if entry.seq != expected {
            return Err(DataEaterError::Persistence(format!(
                "History entry {} is out of order (expected {})",
                entry.seq, expected
            )));
        }
        self.append_entry(entry);
        Ok(())
    }
}

/// Default history file path for a data file.
///
/// # Example
///
/// ```
/// use dataeater::history::history_path;
///
/// let path = history_path("data/people.csv");
/// assert_eq!(path.to_string_lossy(), "data/people.history.json");
/// ```
pub fn history_path(data_path: impl AsRef<Path>) -> PathBuf {
    let data_path = data_path.as_ref();
    let stem = data_path.file_stem().unwrap_or_default().to_string_lossy();
    let parent = data_path.parent().unwrap_or(Path::new("."));

    parent.join(format!("{}.history.json", stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryKind;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("log.json");

        let mut log = HistoryLog::new();
        log.append(HistoryKind::Load, "Loaded a.csv", None);
        log.append(HistoryKind::Delete, "Drop empty rows", Some("DELETE FROM t".into()));
        log.save(&path, Some("a.csv")).unwrap();

        let loaded = HistoryLog::load(&path).unwrap();
        assert_eq!(loaded.entries(), log.entries());
    }

    #[test]
    fn test_rejects_out_of_order_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(
            &path,
            r#"{"version":"1.0.0","saved_at":"2024-01-01T00:00:00Z","entries":[
                {"seq":2,"timestamp":"2024-01-01T00:00:00Z","kind":"LOAD","description":"x"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            HistoryLog::load(&path),
            Err(DataEaterError::Persistence(_))
        ));
    }

    #[test]
    fn test_history_path() {
        assert_eq!(history_path("test.csv").to_string_lossy(), "test.history.json");
    }
}
