//! Field delimiter detection.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Candidate field delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    #[default]
    Comma,
    Semicolon,
    Tab,
    Pipe,
}

impl Delimiter {
    /// Candidates in tie-break order.
    pub const CANDIDATES: [Delimiter; 4] = [
        Delimiter::Comma,
        Delimiter::Semicolon,
        Delimiter::Tab,
        Delimiter::Pipe,
    ];

    /// The delimiter byte.
    pub fn as_byte(&self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Semicolon => b';',
            Delimiter::Tab => b'\t',
            Delimiter::Pipe => b'|',
        }
    }

    /// The delimiter character.
    pub fn as_char(&self) -> char {
        self.as_byte() as char
    }

    /// Parse a delimiter from user input: the character itself or a name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "," | "comma" => Some(Delimiter::Comma),
            ";" | "semicolon" => Some(Delimiter::Semicolon),
            "\t" | "\\t" | "tab" => Some(Delimiter::Tab),
            "|" | "pipe" => Some(Delimiter::Pipe),
            _ => None,
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Tab => f.write_str("\\t"),
            other => write!(f, "{}", other.as_char()),
        }
    }
}

/// Score weights: many columns are rewarded, inconsistent counts are
/// penalized ten times harder.
const MEAN_WEIGHT: f64 = 10.0;
const VARIANCE_WEIGHT: f64 = 100.0;

/// Pick the delimiter that splits the sample lines into the most consistent
/// number of fields. Falls back to comma when no candidate splits anything.
pub fn detect_delimiter<S: AsRef<str>>(lines: &[S]) -> Delimiter {
    let mut best: Option<(Delimiter, f64)> = None;

    for delimiter in Delimiter::CANDIDATES {
        let Some(score) = score_delimiter(lines, delimiter) else {
            continue;
        };
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((delimiter, score));
        }
    }

    best.map(|(delimiter, _)| delimiter).unwrap_or_default()
}

/// `10 × mean − 100 × variance` of the per-line field counts, or `None` when
/// the candidate does not split the lines at all (mean ≤ 1).
pub fn score_delimiter<S: AsRef<str>>(lines: &[S], delimiter: Delimiter) -> Option<f64> {
    if lines.is_empty() {
        return None;
    }

    let counts: Vec<f64> = lines
        .iter()
        .map(|line| count_fields(line.as_ref(), delimiter) as f64)
        .collect();

    let n = counts.len() as f64;
    let mean = counts.iter().sum::<f64>() / n;
    if mean <= 1.0 {
        return None;
    }
    let variance = counts.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n;

    Some(MEAN_WEIGHT * mean - VARIANCE_WEIGHT * variance)
}

/// Count fields in a line, ignoring delimiters inside double quotes.
pub fn count_fields(line: &str, delimiter: Delimiter) -> usize {
    let delim = delimiter.as_char();
    let mut count = 1;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == delim && !in_quotes => count += 1,
            _ => {}
        }
    }

    count
}
