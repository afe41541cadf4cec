//! Jagged row detection over a decoded prefix.

use serde::{Deserialize, Serialize};

use super::delimiter::{Delimiter, count_fields};

/// Characters of row content kept in a report.
const CONTENT_PREVIEW_CHARS: usize = 100;

/// A row whose field count disagrees with the header's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JaggedRowError {
    /// 1-based line number among non-empty lines; the header is row 1.
    pub row: usize,
    pub expected: usize,
    pub actual: usize,
    /// Row text, truncated.
    pub content: String,
}

/// Limits for a structural scan.
#[derive(Debug, Clone, Copy)]
pub struct ScanLimits {
    /// Non-empty lines to inspect, header included.
    pub max_lines: usize,
    /// Stop after this many mismatches.
    pub max_errors: usize,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            max_lines: 1000,
            max_errors: 5,
        }
    }
}

/// Compare every line's field count to the first line's.
///
/// Returns nothing when there are fewer than two lines. The result is
/// advisory only.
pub fn find_jagged_rows<S: AsRef<str>>(
    lines: &[S],
    delimiter: Delimiter,
    limits: ScanLimits,
) -> Vec<JaggedRowError> {
    if lines.len() < 2 || limits.max_errors == 0 {
        return Vec::new();
    }

    let expected = count_fields(lines[0].as_ref(), delimiter);
    let mut errors = Vec::new();

    for (idx, line) in lines.iter().enumerate().take(limits.max_lines).skip(1) {
        let line = line.as_ref();
        let actual = count_fields(line, delimiter);
        if actual != expected {
            errors.push(JaggedRowError {
                row: idx + 1,
                expected,
                actual,
                content: truncate_content(line),
            });
            if errors.len() >= limits.max_errors {
                break;
            }
        }
    }

    errors
}

fn truncate_content(line: &str) -> String {
    match line.char_indices().nth(CONTENT_PREVIEW_CHARS) {
        Some((byte_idx, _)) => format!("{}...", &line[..byte_idx]),
        None => line.to_string(),
    }
}
