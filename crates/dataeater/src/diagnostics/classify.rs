//! Keyword based error taxonomy.

use std::fmt;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::ErrorCode as SqliteCode;
use serde::{Deserialize, Serialize};

/// Coarse classification applied to every caught engine/network/IO error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Syntax/parse error in user- or tool-generated SQL.
    SyntaxError,
    /// A referenced table does not exist (engine state desync).
    TableNotFound,
    /// Casting/conversion failure during a mutation.
    TypeMismatch,
    /// Schema mismatch between datasets, missing columns, wrong arity.
    StructuralMismatch,
    /// External API failure.
    NetworkError,
    /// File read/permission failure.
    IoError,
    /// The running statement was cancelled.
    Interrupted,
    /// Default bucket.
    Unknown,
}

fn compile(patterns: &[(&str, ErrorCode)]) -> Vec<(Regex, ErrorCode)> {
    patterns
        .iter()
        .map(|(pattern, code)| {
            let regex = Regex::new(pattern).expect("classification pattern is valid");
            (regex, *code)
        })
        .collect()
}

// Engine messages, matched at the start of the message or after a `Label: `
// wrapper. Their identifiers never reach the keyword patterns below.
static ENGINE_PATTERNS: Lazy<Vec<(Regex, ErrorCode)>> = Lazy::new(|| {
    compile(&[
        (r"(?:^|: )interrupted$", ErrorCode::Interrupted),
        (r"(?:^|: )no such (?:table|view)\b", ErrorCode::TableNotFound),
        (
            r"(?:^|: )(?:no such column\b|duplicate column name\b|ambiguous column name\b|table .+ has \d+ columns but \d+ values|\d+ values for \d+ columns|cannot (?:modify|alter|add|drop|rename) .+ view|view .+ may not be altered|use drop view)",
            ErrorCode::StructuralMismatch,
        ),
        (
            r#"(?:^|: )(?:near ".*": syntax error|incomplete input$|unrecognized token\b)"#,
            ErrorCode::SyntaxError,
        ),
        (r"(?:^|: )datatype mismatch\b", ErrorCode::TypeMismatch),
        (
            r"(?:^|: )(?:unable to open database|disk i/o error|attempt to write a readonly database)",
            ErrorCode::IoError,
        ),
    ])
});

// Free-form messages from other sources. Quoted spans are removed first.
static KEYWORD_PATTERNS: Lazy<Vec<(Regex, ErrorCode)>> = Lazy::new(|| {
    compile(&[
        (
            r"permission denied|no such file|not readable|\bi/o error|\bio error",
            ErrorCode::IoError,
        ),
        (
            r"\bnetwork ?error|network is unreachable|fetch failed|\btimed out\b|connection (?:refused|reset)|\bdns\b|\bhttp \d{3}\b",
            ErrorCode::NetworkError,
        ),
        (
            r"table .* does not exist|catalog error",
            ErrorCode::TableNotFound,
        ),
        (r"syntax error|parser error", ErrorCode::SyntaxError),
        (
            r"type mismatch|conversion error|could not convert|cannot cast|invalid cast|cast error",
            ErrorCode::TypeMismatch,
        ),
        (r"columns? .*mismatch|schema mismatch", ErrorCode::StructuralMismatch),
        (r"\b(?:interrupted|cancell?ed)\b", ErrorCode::Interrupted),
    ])
});

static QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""[^"]*"|'[^']*'|`[^`]*`"#).expect("quote pattern is valid"));

impl ErrorCode {
    /// Classify a raw error message.
    ///
    /// Engine messages are recognized by their fixed wording first; other
    /// messages fall back to keywords outside quoted identifiers.
    pub fn classify(message: &str) -> Self {
        let lower = message.trim().to_lowercase();
        if let Some((_, code)) = ENGINE_PATTERNS.iter().find(|(regex, _)| regex.is_match(&lower)) {
            return *code;
        }
        let unquoted = QUOTED.replace_all(&lower, "");
        KEYWORD_PATTERNS
            .iter()
            .find(|(regex, _)| regex.is_match(&unquoted))
            .map(|(_, code)| *code)
            .unwrap_or(ErrorCode::Unknown)
    }

    /// Classify an engine error by its result code, then by its message.
    pub fn from_sql_error(err: &rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, message) = err {
            let by_code = match failure.code {
                SqliteCode::OperationInterrupted => Some(ErrorCode::Interrupted),
                SqliteCode::TypeMismatch => Some(ErrorCode::TypeMismatch),
                SqliteCode::CannotOpen
                | SqliteCode::PermissionDenied
                | SqliteCode::SystemIoFailure
                | SqliteCode::ReadOnly
                | SqliteCode::DiskFull => Some(ErrorCode::IoError),
                _ => None,
            };
            if let Some(code) = by_code {
                return code;
            }
            if let Some(message) = message {
                return Self::classify(message);
            }
        }
        Self::classify(&err.to_string())
    }

    /// Stable snake_case name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::SyntaxError => "syntax_error",
            ErrorCode::TableNotFound => "table_not_found",
            ErrorCode::TypeMismatch => "type_mismatch",
            ErrorCode::StructuralMismatch => "structural_mismatch",
            ErrorCode::NetworkError => "network_error",
            ErrorCode::IoError => "io_error",
            ErrorCode::Interrupted => "interrupted",
            ErrorCode::Unknown => "unknown",
        }
    }

    /// Short title shown in notifications.
    pub fn title(&self) -> &'static str {
        match self {
            ErrorCode::SyntaxError => "Invalid SQL",
            ErrorCode::TableNotFound => "Table not found",
            ErrorCode::TypeMismatch => "Type conversion failed",
            ErrorCode::StructuralMismatch => "Structure mismatch",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::IoError => "File access error",
            ErrorCode::Interrupted => "Operation cancelled",
            ErrorCode::Unknown => "Unexpected error",
        }
    }

    /// What went wrong, in plain words.
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::SyntaxError => "The generated query could not be parsed by the engine.",
            ErrorCode::TableNotFound => {
                "A step referenced a table that no longer exists. The dataset may be out of sync."
            }
            ErrorCode::TypeMismatch => "Some values could not be converted to the requested type.",
            ErrorCode::StructuralMismatch => {
                "The columns involved do not match what the operation expected."
            }
            ErrorCode::NetworkError => "An external service could not be reached.",
            ErrorCode::IoError => "The file could not be read.",
            ErrorCode::Interrupted => "The running operation was stopped before it finished.",
            ErrorCode::Unknown => "The operation failed for an unrecognized reason.",
        }
    }

    /// Suggested next step for the user.
    pub fn suggestion(&self) -> &'static str {
        match self {
            ErrorCode::SyntaxError => "Check column names and quoting, then retry.",
            ErrorCode::TableNotFound => "Reload the source file to restore a consistent dataset.",
            ErrorCode::TypeMismatch => {
                "Clean or filter the offending values first, or keep the column as text."
            }
            ErrorCode::StructuralMismatch => {
                "Refresh the column list; a previous step may have renamed or dropped a column."
            }
            ErrorCode::NetworkError => "Check your connection and retry in a moment.",
            ErrorCode::IoError => "Verify the file exists and is readable, then load it again.",
            ErrorCode::Interrupted => {
                "Review the history; the dataset may hold partially applied changes."
            }
            ErrorCode::Unknown => "Reload the source file or undo the last step from the history.",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified, user-presentable error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Classification code.
    pub code: ErrorCode,
    /// Notification title.
    pub title: String,
    /// Human-readable explanation.
    pub message: String,
    /// Suggested remedy.
    pub suggestion: String,
    /// Original error text, preserved for diagnostics.
    pub raw_message: String,
    /// Description of the operation that failed, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    /// When the error was reported.
    pub occurred_at: DateTime<Utc>,
}

impl ErrorReport {
    /// Build a report for a code, looking up its texts.
    pub fn new(code: ErrorCode, raw_message: impl Into<String>) -> Self {
        Self {
            code,
            title: code.title().to_string(),
            message: code.message().to_string(),
            suggestion: code.suggestion().to_string(),
            raw_message: raw_message.into(),
            operation: None,
            occurred_at: Utc::now(),
        }
    }

    /// Classify a raw message and build its report.
    pub fn from_message(raw_message: impl Into<String>) -> Self {
        let raw_message = raw_message.into();
        Self::new(ErrorCode::classify(&raw_message), raw_message)
    }

    /// Attach the description of the failing operation.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_syntax() {
        assert_eq!(
            ErrorCode::classify("near \"SELEC\": syntax error"),
            ErrorCode::SyntaxError
        );
        assert_eq!(ErrorCode::classify("incomplete input"), ErrorCode::SyntaxError);
    }

    #[test]
    fn test_classify_table_not_found() {
        assert_eq!(
            ErrorCode::classify("no such table: current_dataset"),
            ErrorCode::TableNotFound
        );
        assert_eq!(
            ErrorCode::classify("Catalog Error: Table with name tmp does not exist!"),
            ErrorCode::TableNotFound
        );
    }

    #[test]
    fn test_classify_type_and_structure() {
        assert_eq!(
            ErrorCode::classify("Conversion Error: Could not convert string 'abc' to INT32"),
            ErrorCode::TypeMismatch
        );
        assert_eq!(ErrorCode::classify("datatype mismatch"), ErrorCode::TypeMismatch);
        assert_eq!(
            ErrorCode::classify("no such column: \"Nom Complet\""),
            ErrorCode::StructuralMismatch
        );
        assert_eq!(
            ErrorCode::classify("table tmp has 3 columns but 2 values were supplied"),
            ErrorCode::StructuralMismatch
        );
    }

    #[test]
    fn test_classify_network_io_and_interrupt() {
        assert_eq!(ErrorCode::classify("NetworkError when attempting to fetch resource"), ErrorCode::NetworkError);
        assert_eq!(ErrorCode::classify("Permission denied (os error 13)"), ErrorCode::IoError);
        assert_eq!(ErrorCode::classify("interrupted"), ErrorCode::Interrupted);
        assert_eq!(ErrorCode::classify("something odd happened"), ErrorCode::Unknown);
    }

    #[test]
    fn test_identifiers_do_not_drive_classification() {
        assert_eq!(
            ErrorCode::classify("no such column: cancel_reason"),
            ErrorCode::StructuralMismatch
        );
        assert_eq!(
            ErrorCode::classify("no such table: network_sites"),
            ErrorCode::TableNotFound
        );
        assert_eq!(
            ErrorCode::classify("SQL error: no such column: interrupted"),
            ErrorCode::StructuralMismatch
        );
        assert_eq!(
            ErrorCode::classify("near \"cancel\": syntax error"),
            ErrorCode::SyntaxError
        );
        assert_eq!(
            ErrorCode::classify("table network_log has 3 columns but 2 values were supplied"),
            ErrorCode::StructuralMismatch
        );
        assert_eq!(
            ErrorCode::classify("Conversion Error: could not convert 'timed out' to INT"),
            ErrorCode::TypeMismatch
        );
        assert_eq!(ErrorCode::classify("SQL error: interrupted"), ErrorCode::Interrupted);
    }

    #[test]
    fn test_sql_errors_classify_by_result_code() {
        let interrupted = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_INTERRUPT),
            Some("interrupted".to_string()),
        );
        assert_eq!(ErrorCode::from_sql_error(&interrupted), ErrorCode::Interrupted);

        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let missing = conn
            .execute_batch("CREATE TABLE cancel_log (a); SELECT network FROM cancel_log;")
            .unwrap_err();
        assert_eq!(ErrorCode::from_sql_error(&missing), ErrorCode::StructuralMismatch);

        let table = conn.execute_batch("SELECT * FROM network_sites").unwrap_err();
        assert_eq!(ErrorCode::from_sql_error(&table), ErrorCode::TableNotFound);
    }

    #[test]
    fn test_report_keeps_raw_message() {
        let report = ErrorReport::from_message("no such table: t").with_operation("Drop t");

        assert_eq!(report.code, ErrorCode::TableNotFound);
        assert_eq!(report.title, "Table not found");
        assert_eq!(report.raw_message, "no such table: t");
        assert_eq!(report.operation.as_deref(), Some("Drop t"));
    }
}
