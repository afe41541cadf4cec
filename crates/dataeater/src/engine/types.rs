//! Semantic column types and streaming type inference.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static DATE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

static TIMESTAMP_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2})[ T](\d{2}:\d{2}(?::\d{2}(?:\.\d{1,9})?)?)$").unwrap()
});

/// Semantic type of a dataset column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Whole numbers.
    Integer,
    /// Floating-point numbers.
    Float,
    /// true/false, yes/no.
    Boolean,
    /// Anything else.
    Text,
    /// `YYYY-MM-DD`
    Date,
    /// Date with a time of day.
    Timestamp,
}

impl ColumnType {
    /// Declared SQL type used when creating tables.
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Float => "REAL",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Text => "TEXT",
            ColumnType::Date => "DATE",
            ColumnType::Timestamp => "TIMESTAMP",
        }
    }

    /// Map a declared column type back to a semantic type.
    ///
    /// Returns `None` for an empty or affinity-only declaration, in which case
    /// the type has to be probed from the data.
    pub fn from_declared(declared: &str) -> Option<Self> {
        let upper = declared.trim().to_uppercase();
        if upper.is_empty() || upper == "NUM" || upper == "NUMERIC" {
            return None;
        }
        let ty = if upper.contains("BOOL") {
            ColumnType::Boolean
        } else if upper.contains("TIMESTAMP") || upper.contains("DATETIME") {
            ColumnType::Timestamp
        } else if upper.contains("DATE") {
            ColumnType::Date
        } else if upper.contains("INT") {
            ColumnType::Integer
        } else if upper.contains("REAL")
            || upper.contains("FLOA")
            || upper.contains("DOUB")
            || upper.contains("DEC")
        {
            ColumnType::Float
        } else {
            ColumnType::Text
        };
        Some(ty)
    }

    /// Map the engine's `typeof()` of a sample value to a semantic type.
    /// Text samples that look like dates keep their temporal type.
    pub fn from_storage_class(storage: &str, sample: Option<&str>) -> Self {
        match storage {
            "integer" => ColumnType::Integer,
            "real" => ColumnType::Float,
            "text" => match sample.map(detect_value_type) {
                Some(ValueKind::Date) => ColumnType::Date,
                Some(ValueKind::Timestamp) => ColumnType::Timestamp,
                _ => ColumnType::Text,
            },
            _ => ColumnType::Text,
        }
    }

    /// Returns true if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    /// Returns true if this type is temporal.
    pub fn is_temporal(&self) -> bool {
        matches!(self, ColumnType::Date | ColumnType::Timestamp)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
            ColumnType::Text => "text",
            ColumnType::Date => "date",
            ColumnType::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

/// What a single non-empty value looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Integer,
    Float,
    Boolean,
    Date,
    Timestamp,
    Text,
}

/// Detect the kind of a single value. Values are not trimmed: a value with
/// surrounding whitespace is text.
pub fn detect_value_type(value: &str) -> ValueKind {
    if is_integer(value) {
        return ValueKind::Integer;
    }
    if is_float(value) {
        return ValueKind::Float;
    }
    if matches!(
        value.to_ascii_lowercase().as_str(),
        "true" | "false" | "yes" | "no"
    ) {
        return ValueKind::Boolean;
    }
    if DATE_PATTERN.is_match(value) {
        if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok() {
            return ValueKind::Date;
        }
        return ValueKind::Text;
    }
    if let Some(caps) = TIMESTAMP_PATTERN.captures(value) {
        let date_ok = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").is_ok();
        let time_ok = ["%H:%M", "%H:%M:%S", "%H:%M:%S%.f"]
            .iter()
            .any(|fmt| NaiveTime::parse_from_str(&caps[2], fmt).is_ok());
        if date_ok && time_ok {
            return ValueKind::Timestamp;
        }
    }
    ValueKind::Text
}

fn unsigned_digits(value: &str) -> &str {
    value.strip_prefix(['+', '-']).unwrap_or(value)
}

// Leading zeros ("007", "0123") carry meaning in identifiers and postcodes,
// so such values stay text.
fn has_leading_zero(digits: &str) -> bool {
    digits.len() > 1 && digits.starts_with('0')
}

fn is_integer(value: &str) -> bool {
    let digits = unsigned_digits(value);
    !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && !has_leading_zero(digits)
        && value.parse::<i64>().is_ok()
}

fn is_float(value: &str) -> bool {
    if !value.contains(['.', 'e', 'E']) {
        return false;
    }
    let digits = unsigned_digits(value);
    if !digits.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return false;
    }
    let int_part = digits.split(['.', 'e', 'E']).next().unwrap_or("");
    if has_leading_zero(int_part) {
        return false;
    }
    value.parse::<f64>().is_ok_and(f64::is_finite)
}

/// Running type of one column while rows stream through staging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Lattice {
    #[default]
    Empty,
    Integer,
    Float,
    Boolean,
    Date,
    Timestamp,
    Text,
}

impl Lattice {
    fn join(self, kind: ValueKind) -> Self {
        use Lattice as L;
        match (self, kind) {
            (L::Text, _) | (_, ValueKind::Text) => L::Text,
            (L::Empty, k) => L::from(k),
            (L::Integer, ValueKind::Integer) => L::Integer,
            (L::Integer | L::Float, ValueKind::Integer | ValueKind::Float) => L::Float,
            (L::Boolean, ValueKind::Boolean) => L::Boolean,
            (L::Date, ValueKind::Date) => L::Date,
            (L::Date | L::Timestamp, ValueKind::Date | ValueKind::Timestamp) => L::Timestamp,
            _ => L::Text,
        }
    }
}

impl From<ValueKind> for Lattice {
    fn from(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Integer => Lattice::Integer,
            ValueKind::Float => Lattice::Float,
            ValueKind::Boolean => Lattice::Boolean,
            ValueKind::Date => Lattice::Date,
            ValueKind::Timestamp => Lattice::Timestamp,
            ValueKind::Text => Lattice::Text,
        }
    }
}

/// Infers column types from every non-empty value, one row at a time.
#[derive(Debug, Clone)]
pub struct TypeInferrer {
    columns: Vec<Lattice>,
}

impl TypeInferrer {
    /// Track `width` columns.
    pub fn new(width: usize) -> Self {
        Self {
            columns: vec![Lattice::Empty; width],
        }
    }

    /// Fold one value into the column's running type.
    pub fn observe(&mut self, column: usize, value: &str) {
        let Some(state) = self.columns.get_mut(column) else {
            return;
        };
        if value.is_empty() || *state == Lattice::Text {
            return;
        }
        *state = state.join(detect_value_type(value));
    }

    /// Final types. Columns that never held a value are text.
    pub fn finish(&self) -> Vec<ColumnType> {
        self.columns
            .iter()
            .map(|state| match state {
                Lattice::Integer => ColumnType::Integer,
                Lattice::Float => ColumnType::Float,
                Lattice::Boolean => ColumnType::Boolean,
                Lattice::Date => ColumnType::Date,
                Lattice::Timestamp => ColumnType::Timestamp,
                Lattice::Empty | Lattice::Text => ColumnType::Text,
            })
            .collect()
    }
}
