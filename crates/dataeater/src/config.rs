//! Configuration for sniffing, the table engine and the preview view.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DataEaterError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataEaterConfig {
    /// Byte sniffer and structural validator settings.
    pub sniff: SniffConfig,
    /// Embedded engine settings.
    pub engine: EngineConfig,
    /// Preview and statistics settings.
    pub view: ViewConfig,
}

/// Settings for the byte sniffer and jagged-row scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SniffConfig {
    /// Prefix size used for encoding and delimiter detection.
    pub encoding_prefix_bytes: usize,
    /// Prefix size used for the structural (jagged row) scan.
    pub structure_prefix_bytes: usize,
    /// Non-empty lines considered when scoring delimiters.
    pub delimiter_sample_lines: usize,
    /// Non-empty lines scanned for jagged rows, header included.
    pub max_structure_lines: usize,
    /// Stop collecting jagged rows after this many.
    pub max_jagged_rows: usize,
    /// Treat the first line as a header.
    pub assume_header: bool,
}

impl Default for SniffConfig {
    fn default() -> Self {
        Self {
            encoding_prefix_bytes: 16 * 1024,
            structure_prefix_bytes: 1024 * 1024,
            delimiter_sample_lines: 10,
            max_structure_lines: 1000,
            max_jagged_rows: 5,
            assume_header: true,
        }
    }
}

/// Settings for the embedded SQL engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Copy the source into an in-memory table. When false, or when the copy
    /// fails, the dataset is exposed as a view over the staging table.
    pub materialize: bool,
    /// Hard heap limit handed to the engine, in bytes.
    pub memory_limit_bytes: Option<i64>,
    /// Directory for the staging database and registered files.
    /// A fresh temporary directory is used when unset.
    pub work_dir: Option<PathBuf>,
    /// Rows inserted per staging transaction.
    pub staging_batch_rows: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            materialize: true,
            memory_limit_bytes: None,
            work_dir: None,
            staging_batch_rows: 50_000,
        }
    }
}

/// Settings for the bounded preview and column statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Rows fetched for the preview after every change.
    pub preview_limit: usize,
    /// Most frequent values reported in column statistics.
    pub top_values: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            preview_limit: 100,
            top_values: 10,
        }
    }
}

impl DataEaterConfig {
    /// Load configuration from a JSON file. Missing fields take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| DataEaterError::io(path, e))?;
        let config: Self = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            DataEaterError::Config(format!("Failed to parse '{}': {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make sniffing or previews meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.sniff.encoding_prefix_bytes == 0 || self.sniff.structure_prefix_bytes == 0 {
            return Err(DataEaterError::Config(
                "sniff prefix sizes must be greater than zero".to_string(),
            ));
        }
        if self.sniff.delimiter_sample_lines == 0 {
            return Err(DataEaterError::Config(
                "delimiter_sample_lines must be greater than zero".to_string(),
            ));
        }
        if self.view.preview_limit == 0 {
            return Err(DataEaterError::Config(
                "preview_limit must be greater than zero".to_string(),
            ));
        }
        if self.engine.staging_batch_rows == 0 {
            return Err(DataEaterError::Config(
                "staging_batch_rows must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_match_sniffing_bounds() {
        let config = DataEaterConfig::default();
        assert_eq!(config.sniff.encoding_prefix_bytes, 16 * 1024);
        assert_eq!(config.sniff.structure_prefix_bytes, 1024 * 1024);
        assert_eq!(config.sniff.max_jagged_rows, 5);
        assert_eq!(config.view.preview_limit, 100);
        assert!(config.engine.materialize);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"engine": {{"materialize": false}}, "view": {{"preview_limit": 25}}}}"#).unwrap();

        let config = DataEaterConfig::load(file.path()).unwrap();
        assert!(!config.engine.materialize);
        assert_eq!(config.view.preview_limit, 25);
        assert_eq!(config.view.top_values, 10);
        assert_eq!(config.sniff.delimiter_sample_lines, 10);
    }

    #[test]
    fn test_rejects_zero_preview() {
        let mut config = DataEaterConfig::default();
        config.view.preview_limit = 0;
        assert!(config.validate().is_err());
    }
}
