//! Fuzz target for filter compilation.
//!
//! Arbitrary rule values and search text must compile to statements the
//! engine accepts, with every value bound as a parameter.

#![no_main]

use arbitrary::Arbitrary;
use dataeater::engine::{Column, ColumnType, TableEngine};
use dataeater::view::compile_filter;
use dataeater::{Operator, Rule};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    operator: u8,
    column: u8,
    value: String,
    search: Option<String>,
}

const OPERATORS: [Operator; 10] = [
    Operator::Equals,
    Operator::NotEquals,
    Operator::Contains,
    Operator::NotContains,
    Operator::GreaterThan,
    Operator::LessThan,
    Operator::StartsWith,
    Operator::EndsWith,
    Operator::IsEmpty,
    Operator::IsNotEmpty,
];

const COLUMNS: [(&str, ColumnType); 3] = [
    ("name", ColumnType::Text),
    ("age", ColumnType::Integer),
    ("odd \"col\"", ColumnType::Text),
];

fuzz_target!(|input: Input| {
    let operator = OPERATORS[input.operator as usize % OPERATORS.len()];
    let (column, _) = COLUMNS[input.column as usize % COLUMNS.len()];
    let rule = Rule::new("r1", column, operator, input.value);
    let columns: Vec<Column> = COLUMNS.iter().map(|(name, ty)| Column::new(*name, *ty)).collect();

    let predicate = compile_filter(&[rule], input.search.as_deref(), &columns);

    let engine = TableEngine::default();
    engine
        .execute(
            "CREATE TABLE current_dataset (name TEXT, age INTEGER, \"odd \"\"col\"\"\" TEXT);
             INSERT INTO current_dataset VALUES ('a', 1, 'x'), (NULL, NULL, '');",
        )
        .unwrap();
    let sql = format!("SELECT COUNT(*) FROM current_dataset{}", predicate.where_clause());
    engine.query(&sql, &predicate.params).unwrap();
});
