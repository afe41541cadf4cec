//! Column statistics for the selected column.

use serde::{Deserialize, Serialize};

use crate::engine::{CellValue, Column, ColumnType, SqlValue, TableEngine};
use crate::error::Result;
use crate::sql::{DATASET_TABLE, quote_ident};

/// A value and how often it occurs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: CellValue,
    pub count: u64,
}

/// Summary of one column, computed fresh from the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub column: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub total: u64,
    pub null_count: u64,
    /// Non-null cells whose text is empty.
    pub empty_count: u64,
    pub distinct_count: u64,
    pub min: CellValue,
    pub max: CellValue,
    /// Only for numeric columns.
    pub mean: Option<f64>,
    /// Most frequent non-null values, most frequent first.
    pub top_values: Vec<ValueCount>,
}

fn count(value: &CellValue) -> u64 {
    match value {
        CellValue::Integer(i) => (*i).max(0) as u64,
        CellValue::Real(f) => f.max(0.0) as u64,
        _ => 0,
    }
}

/// Compute statistics for `column`, keeping `top` most frequent values.
pub fn column_stats(engine: &TableEngine, column: &Column, top: usize) -> Result<ColumnStats> {
    let col = quote_ident(&column.name);
    let table = quote_ident(DATASET_TABLE);
    let mean = if column.column_type.is_numeric() {
        format!("AVG({col})")
    } else {
        "NULL".to_string()
    };

    let summary = engine.query(
        &format!(
            "SELECT COUNT(*), COUNT(*) - COUNT({col}), \
             COALESCE(SUM(CASE WHEN {col} IS NOT NULL AND CAST({col} AS TEXT) = '' THEN 1 ELSE 0 END), 0), \
             COUNT(DISTINCT {col}), MIN({col}), MAX({col}), {mean} \
             FROM {table}"
        ),
        &[],
    )?;
    let row = summary.rows.into_iter().next().unwrap_or_default();
    let cell = |i: usize| row.get(i).cloned().unwrap_or(CellValue::Null);

    let top_values = if top == 0 {
        Vec::new()
    } else {
        engine
            .query(
                &format!(
                    "SELECT {col}, COUNT(*) AS n FROM {table} WHERE {col} IS NOT NULL \
                     GROUP BY {col} ORDER BY n DESC, {col} ASC LIMIT ?"
                ),
                &[SqlValue::Integer(top as i64)],
            )?
            .rows
            .into_iter()
            .filter_map(|mut r| {
                let n = r.pop()?;
                let value = r.pop()?;
                Some(ValueCount {
                    value,
                    count: count(&n),
                })
            })
            .collect()
    };

    Ok(ColumnStats {
        column: column.name.clone(),
        column_type: column.column_type,
        total: count(&cell(0)),
        null_count: count(&cell(1)),
        empty_count: count(&cell(2)),
        distinct_count: count(&cell(3)),
        min: cell(4),
        max: cell(5),
        mean: cell(6).as_f64(),
        top_values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_and_text_stats() {
        let engine = TableEngine::default();
        engine
            .execute(
                "CREATE TABLE current_dataset (age INTEGER, city TEXT);
                 INSERT INTO current_dataset VALUES (30, 'Paris'), (40, 'Lyon'), (NULL, 'Paris'), (20, '');",
            )
            .unwrap();

        let age = Column {
            name: "age".into(),
            column_type: ColumnType::Integer,
        };
        let stats = column_stats(&engine, &age, 10).unwrap();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.null_count, 1);
        assert_eq!(stats.distinct_count, 3);
        assert_eq!(stats.min, CellValue::Integer(20));
        assert_eq!(stats.max, CellValue::Integer(40));
        assert_eq!(stats.mean, Some(30.0));

        let city = Column {
            name: "city".into(),
            column_type: ColumnType::Text,
        };
        let stats = column_stats(&engine, &city, 1).unwrap();
        assert_eq!(stats.empty_count, 1);
        assert_eq!(stats.mean, None);
        assert_eq!(
            stats.top_values,
            vec![ValueCount {
                value: CellValue::Text("Paris".into()),
                count: 2
            }]
        );
    }
}
