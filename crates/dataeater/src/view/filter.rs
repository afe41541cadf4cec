//! Rule and search compilation into a bound SQL predicate.

use rusqlite::types::Value;
use tracing::warn;

use super::rules::{Operator, Rule, ordered_rules};
use crate::engine::{Column, ColumnType};
use crate::sql::{LOWER_FUNCTION, escape_like, quote_ident};

/// A boolean SQL expression with `?` placeholders and their values, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Predicate {
    fn new(sql: String, params: Vec<Value>) -> Self {
        Self { sql, params }
    }

    /// True when nothing filters.
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// AND the non-empty predicates together, each parenthesized.
    pub fn all(parts: Vec<Predicate>) -> Self {
        let mut sql = Vec::new();
        let mut params = Vec::new();
        for part in parts.into_iter().filter(|p| !p.is_empty()) {
            sql.push(format!("({})", part.sql));
            params.extend(part.params);
        }
        Self::new(sql.join(" AND "), params)
    }

    /// ` WHERE …`, or an empty string.
    pub fn where_clause(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.sql)
        }
    }
}

fn as_text(col: &str) -> String {
    format!("CAST({col} AS TEXT)")
}

/// Text of a cell, lowercased with Unicode case mapping.
fn folded(col: &str) -> String {
    format!("{LOWER_FUNCTION}({})", as_text(col))
}

/// Parse a comparison value as a number when it looks like one.
fn numeric_value(value: &str) -> Option<Value> {
    let trimmed = value.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(Value::Integer(i));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Value::Real)
}

/// Boolean columns store 1/0.
fn boolean_value(value: &str) -> Option<Value> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Some(Value::Integer(1)),
        "false" | "no" | "0" => Some(Value::Integer(0)),
        _ => None,
    }
}

/// Case-insensitive LIKE. `pattern` is already escaped.
fn like(col: &str, pattern: String, negate: bool) -> Predicate {
    let text = folded(col);
    let sql = if negate {
        format!("{col} IS NULL OR {text} NOT LIKE ? ESCAPE '\\'")
    } else {
        format!("{text} LIKE ? ESCAPE '\\'")
    };
    Predicate::new(sql, vec![Value::Text(pattern.to_lowercase())])
}

fn text_compare(col: &str, op: &str, value: &str) -> Predicate {
    Predicate::new(
        format!("{} {op} ?", as_text(col)),
        vec![Value::Text(value.to_string())],
    )
}

/// Ordering comparison: numeric when the value parses as a number.
fn compare(col: &str, op: &str, value: &str) -> Predicate {
    match numeric_value(value) {
        Some(number) => Predicate::new(format!("{col} {op} ?"), vec![number]),
        None => text_compare(col, op, value),
    }
}

/// Equality against the stored value. Only numeric and boolean columns
/// compare as numbers; everything else compares the cell text verbatim,
/// so `007` never matches `7`.
fn equals(col: &str, column_type: ColumnType, value: &str) -> Predicate {
    let bound = match column_type {
        ty if ty.is_numeric() => numeric_value(value),
        ColumnType::Boolean => boolean_value(value),
        _ => None,
    };
    match bound {
        Some(bound) => Predicate::new(format!("{col} = ?"), vec![bound]),
        None => text_compare(col, "=", value),
    }
}

/// Compile one rule against a column of the given type. The caller checks
/// that the rule is applicable.
pub fn compile_rule(rule: &Rule, column_type: ColumnType) -> Predicate {
    let col = quote_ident(&rule.column);
    let value = rule.value.as_str();

    match rule.operator {
        Operator::Equals => equals(&col, column_type, value),
        Operator::NotEquals => {
            let inner = equals(&col, column_type, value);
            Predicate::new(format!("{col} IS NULL OR NOT ({})", inner.sql), inner.params)
        }
        Operator::GreaterThan => compare(&col, ">", value),
        Operator::LessThan => compare(&col, "<", value),
        Operator::Contains => like(&col, format!("%{}%", escape_like(value)), false),
        Operator::NotContains => like(&col, format!("%{}%", escape_like(value)), true),
        Operator::StartsWith => like(&col, format!("{}%", escape_like(value)), false),
        Operator::EndsWith => like(&col, format!("%{}", escape_like(value)), false),
        Operator::IsEmpty => Predicate::new(
            format!("{col} IS NULL OR {} = ''", as_text(&col)),
            Vec::new(),
        ),
        Operator::IsNotEmpty => Predicate::new(
            format!("{col} IS NOT NULL AND {} <> ''", as_text(&col)),
            Vec::new(),
        ),
    }
}

/// Case-insensitive substring match of `search` across every column.
pub fn compile_search<S: AsRef<str>>(search: &str, columns: &[S]) -> Predicate {
    let needle = search.trim();
    if needle.is_empty() || columns.is_empty() {
        return Predicate::default();
    }
    let pattern = format!("%{}%", escape_like(&needle.to_lowercase()));
    let mut clauses = Vec::with_capacity(columns.len());
    let mut params = Vec::with_capacity(columns.len());
    for column in columns {
        clauses.push(format!(
            "{} LIKE ? ESCAPE '\\'",
            folded(&quote_ident(column.as_ref()))
        ));
        params.push(Value::Text(pattern.clone()));
    }
    Predicate::new(clauses.join(" OR "), params)
}

/// Combine the applicable rules, in ascending priority, and the search
/// into one AND-ed predicate. Rules on columns not in `columns` are skipped.
pub fn compile_filter(rules: &[Rule], search: Option<&str>, columns: &[Column]) -> Predicate {
    let mut parts = Vec::new();
    for rule in ordered_rules(rules) {
        let Some(column) = columns.iter().find(|c| c.name == rule.column) else {
            warn!(rule = %rule.id, column = %rule.column, "skipping rule on unknown column");
            continue;
        };
        parts.push(compile_rule(rule, column.column_type));
    }
    if let Some(search) = search {
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        parts.push(compile_search(search, &names));
    }
    Predicate::all(parts)
}
