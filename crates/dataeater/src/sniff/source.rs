//! Sniff results and source file metadata.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::delimiter::Delimiter;
use super::encoding::Encoding;
use crate::error::{DataEaterError, Result};

/// Line ending convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Newline {
    /// `\r\n`
    Crlf,
    /// `\r`
    Cr,
    /// `\n`
    #[default]
    Lf,
}

impl Newline {
    /// Detect the convention used in decoded text: CRLF, then CR, then LF.
    pub fn detect(text: &str) -> Self {
        if text.contains("\r\n") {
            Newline::Crlf
        } else if text.contains('\r') {
            Newline::Cr
        } else {
            Newline::Lf
        }
    }

    /// The terminator string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Newline::Crlf => "\r\n",
            Newline::Cr => "\r",
            Newline::Lf => "\n",
        }
    }
}

/// What the sniffer learned from a file prefix. Immutable once computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SniffResult {
    pub encoding: Encoding,
    pub delimiter: Delimiter,
    pub newline: Newline,
    /// Always true for now: header presence is not inferred.
    pub has_header: bool,
}

impl Default for SniffResult {
    /// Documented fallback when a file cannot be sniffed.
    fn default() -> Self {
        Self {
            encoding: Encoding::Utf8,
            delimiter: Delimiter::Comma,
            newline: Newline::Lf,
            has_header: true,
        }
    }
}

/// Input file family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Comma/semicolon/tab/pipe separated text.
    Delimited,
    /// Spreadsheet workbook; only the first sheet is loaded.
    Spreadsheet,
}

impl SourceFormat {
    /// Guess the format from the file extension.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => SourceFormat::Spreadsheet,
            _ => SourceFormat::Delimited,
        }
    }
}

/// Metadata about the loaded source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Input family.
    pub format: SourceFormat,
    /// When the file was loaded.
    pub loaded_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Hash and describe a file. The file is streamed, never held in memory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| DataEaterError::io(path, e))?;
        let size_bytes = file
            .metadata()
            .map_err(|e| DataEaterError::io(path, e))?
            .len();

        let mut hasher = Sha256::new();
        io::copy(&mut file, &mut hasher).map_err(|e| DataEaterError::io(path, e))?;
        let hash = format!("sha256:{:x}", hasher.finalize());

        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            file: file_name,
            path: path.to_path_buf(),
            hash,
            size_bytes,
            format: SourceFormat::from_path(path),
            loaded_at: Utc::now(),
        })
    }
}

/// Read at most `limit` bytes from the start of a file.
///
/// Returns the bytes and whether the whole file fit in the prefix.
pub fn read_prefix(path: &Path, limit: usize) -> Result<(Vec<u8>, bool)> {
    let file = File::open(path).map_err(|e| DataEaterError::io(path, e))?;
    let mut buf = Vec::with_capacity(limit.min(1 << 20));
    // One extra byte tells a file of exactly `limit` bytes from a longer one.
    file.take(limit as u64 + 1)
        .read_to_end(&mut buf)
        .map_err(|e| DataEaterError::io(path, e))?;
    let complete = buf.len() <= limit;
    buf.truncate(limit);
    Ok((buf, complete))
}
