//! History entry types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DataEaterError;

/// What kind of change an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryKind {
    /// A source file was loaded.
    Load,
    /// Generic transformation.
    Transform,
    /// Value normalization or cleanup.
    Clean,
    /// Data was exported.
    Export,
    /// Rows or columns were removed.
    Delete,
    /// A column was split into several.
    Split,
    /// Columns were renamed.
    Rename,
    /// Columns were reordered.
    Reorder,
    /// Duplicate rows were removed.
    Deduplicate,
}

impl HistoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryKind::Load => "LOAD",
            HistoryKind::Transform => "TRANSFORM",
            HistoryKind::Clean => "CLEAN",
            HistoryKind::Export => "EXPORT",
            HistoryKind::Delete => "DELETE",
            HistoryKind::Split => "SPLIT",
            HistoryKind::Rename => "RENAME",
            HistoryKind::Reorder => "REORDER",
            HistoryKind::Deduplicate => "DEDUPLICATE",
        }
    }
}

impl fmt::Display for HistoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryKind {
    type Err = DataEaterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LOAD" => Ok(HistoryKind::Load),
            "TRANSFORM" => Ok(HistoryKind::Transform),
            "CLEAN" => Ok(HistoryKind::Clean),
            "EXPORT" => Ok(HistoryKind::Export),
            "DELETE" => Ok(HistoryKind::Delete),
            "SPLIT" => Ok(HistoryKind::Split),
            "RENAME" => Ok(HistoryKind::Rename),
            "REORDER" => Ok(HistoryKind::Reorder),
            "DEDUPLICATE" => Ok(HistoryKind::Deduplicate),
            other => Err(DataEaterError::InvalidInput(format!(
                "unknown history kind '{other}'"
            ))),
        }
    }
}

/// One applied change. Entries are never edited once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Position in the log, starting at 1.
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub kind: HistoryKind,
    pub description: String,
    /// Statement(s) that were executed, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&HistoryKind::Deduplicate).unwrap();
        assert_eq!(json, "\"DEDUPLICATE\"");
        assert_eq!("clean".parse::<HistoryKind>().unwrap(), HistoryKind::Clean);
        assert!("UNDO".parse::<HistoryKind>().is_err());
    }
}
