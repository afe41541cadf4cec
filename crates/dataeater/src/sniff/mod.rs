//! Byte-level sniffing and structural validation.
//!
//! The [`Sniffer`] inspects a bounded prefix of a file, never the whole file,
//! to infer encoding, delimiter and line endings before any parsing happens.
//! It also runs the advisory jagged-row scan that feeds the health report.

mod delimiter;
mod encoding;
mod source;
mod structure;

pub use delimiter::{Delimiter, count_fields, detect_delimiter, score_delimiter};
pub use encoding::{Encoding, decode_prefix, detect_encoding};
pub use source::{Newline, SniffResult, SourceFormat, SourceMetadata, read_prefix};
pub use structure::{JaggedRowError, ScanLimits, find_jagged_rows};

use std::path::Path;

use tracing::{debug, warn};

use crate::config::SniffConfig;
use crate::error::Result;

/// Infers how a delimited file is encoded and laid out.
#[derive(Debug, Clone, Default)]
pub struct Sniffer {
    config: SniffConfig,
}

impl Sniffer {
    /// Create a sniffer with default bounds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sniffer with custom bounds.
    pub fn with_config(config: SniffConfig) -> Self {
        Self { config }
    }

    /// The bounds in use.
    pub fn config(&self) -> &SniffConfig {
        &self.config
    }

    /// Sniff a file from its first `encoding_prefix_bytes` bytes.
    pub fn sniff_path(&self, path: impl AsRef<Path>) -> Result<SniffResult> {
        let path = path.as_ref();
        let (prefix, complete) = read_prefix(path, self.config.encoding_prefix_bytes)?;
        let result = self.sniff_bytes(&prefix, complete);
        debug!(
            path = %path.display(),
            encoding = %result.encoding,
            delimiter = %result.delimiter,
            "sniffed file"
        );
        Ok(result)
    }

    /// Sniff a file, falling back to UTF-8 / comma / LF / header when it
    /// cannot be read.
    pub fn sniff_or_default(&self, path: impl AsRef<Path>) -> SniffResult {
        let path = path.as_ref();
        match self.sniff_path(path) {
            Ok(result) => result,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "sniff failed, using defaults");
                SniffResult {
                    has_header: self.config.assume_header,
                    ..SniffResult::default()
                }
            }
        }
    }

    /// Sniff an in-memory prefix. `complete` is true when the prefix is the
    /// whole file, so its last line is not cut off.
    pub fn sniff_bytes(&self, prefix: &[u8], complete: bool) -> SniffResult {
        let encoding = detect_encoding(prefix);
        let text = decode_prefix(prefix, encoding);
        let newline = Newline::detect(&text);

        let lines = sample_lines(&text, complete, self.config.delimiter_sample_lines);
        let delimiter = detect_delimiter(&lines);

        SniffResult {
            encoding,
            delimiter,
            newline,
            has_header: self.config.assume_header,
        }
    }

    /// Scan the first `structure_prefix_bytes` bytes for jagged rows.
    ///
    /// The delimiter is detected from the same prefix when not given.
    pub fn find_jagged_rows(
        &self,
        path: impl AsRef<Path>,
        delimiter: Option<Delimiter>,
        encoding: Encoding,
    ) -> Result<Vec<JaggedRowError>> {
        let (prefix, complete) = read_prefix(path.as_ref(), self.config.structure_prefix_bytes)?;
        Ok(self.jagged_rows_in(&prefix, complete, delimiter, encoding))
    }

    /// Jagged-row scan over an in-memory prefix.
    pub fn jagged_rows_in(
        &self,
        prefix: &[u8],
        complete: bool,
        delimiter: Option<Delimiter>,
        encoding: Encoding,
    ) -> Vec<JaggedRowError> {
        let text = decode_prefix(prefix, encoding);
        let lines = sample_lines(&text, complete, self.config.max_structure_lines);
        let delimiter = delimiter.unwrap_or_else(|| {
            let end = lines.len().min(self.config.delimiter_sample_lines);
            detect_delimiter(&lines[..end])
        });

        find_jagged_rows(
            &lines,
            delimiter,
            ScanLimits {
                max_lines: self.config.max_structure_lines,
                max_errors: self.config.max_jagged_rows,
            },
        )
    }
}

/// Up to `max` non-empty lines of `text`, split on any line terminator.
///
/// When the prefix is not the whole file its final line may be cut off
/// mid-row, so it is dropped.
pub fn sample_lines(text: &str, complete: bool, max: usize) -> Vec<&str> {
    let mut segments: Vec<&str> = text.split(['\r', '\n']).collect();
    if !complete && segments.len() > 1 {
        segments.pop();
    }
    segments
        .into_iter()
        .filter(|line| !line.is_empty())
        .take(max)
        .collect()
}
