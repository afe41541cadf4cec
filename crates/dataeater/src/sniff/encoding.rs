//! Character encoding detection and decoding.

use std::borrow::Cow;
use std::fmt;

use encoding_rs::WINDOWS_1252;
use serde::{Deserialize, Serialize};

/// Encodings accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Encoding {
    #[default]
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "windows-1252")]
    Windows1252,
}

impl Encoding {
    /// Canonical label.
    pub fn label(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Windows1252 => "windows-1252",
        }
    }

    /// Decode a field or line.
    ///
    /// Invalid UTF-8 beyond the sniffed prefix is replaced rather than
    /// rejected so a late stray byte cannot abort ingestion.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str> {
        match self {
            Encoding::Utf8 => String::from_utf8_lossy(bytes),
            Encoding::Windows1252 => WINDOWS_1252.decode_without_bom_handling(bytes).0,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Classify a byte prefix as UTF-8 or Windows-1252.
///
/// The prefix is UTF-8 when every multi-byte sequence is well formed. A
/// sequence cut off by the end of the prefix counts as valid, since the
/// missing continuation bytes lie past the chunk boundary.
pub fn detect_encoding(prefix: &[u8]) -> Encoding {
    match std::str::from_utf8(prefix) {
        Ok(_) => Encoding::Utf8,
        // `error_len() == None` means the input ended mid-sequence.
        Err(e) if e.error_len().is_none() => Encoding::Utf8,
        Err(_) => Encoding::Windows1252,
    }
}

/// Decode a sniffed prefix. For UTF-8 a sequence truncated at the boundary is
/// dropped instead of being replaced.
pub fn decode_prefix(prefix: &[u8], encoding: Encoding) -> Cow<'_, str> {
    match encoding {
        Encoding::Utf8 => {
            let prefix = prefix.strip_prefix(UTF8_BOM).unwrap_or(prefix);
            match std::str::from_utf8(prefix) {
                Ok(s) => Cow::Borrowed(s),
                Err(e) if e.error_len().is_none() => {
                    String::from_utf8_lossy(&prefix[..e.valid_up_to()])
                }
                Err(_) => String::from_utf8_lossy(prefix),
            }
        }
        Encoding::Windows1252 => encoding.decode(prefix),
    }
}
