//! Read-time view state and the bounded preview query.

use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use super::filter::{Predicate, compile_filter};
use super::rules::Rule;
use super::sort::SortState;
use crate::engine::Column;
use crate::sql::{DATASET_TABLE, quote_ident};

/// Rules, search and sort applied to every preview fetch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewState {
    pub rules: Vec<Rule>,
    pub search: Option<String>,
    pub sort: SortState,
}

/// SQL for one preview fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledView {
    /// Bounded row fetch.
    pub select_sql: String,
    /// Number of rows matching the filter, unbounded.
    pub count_sql: String,
    /// Parameters shared by both statements.
    pub params: Vec<Value>,
    /// Row bound, passed separately.
    pub limit: usize,
}

impl CompiledView {
    /// Parameters for `select_sql`, including the trailing limit.
    pub fn select_params(&self) -> Vec<Value> {
        let mut params = self.params.clone();
        params.push(Value::Integer(self.limit as i64));
        params
    }
}

impl ViewState {
    /// The compiled filter predicate over the given visible columns.
    pub fn predicate(&self, columns: &[Column]) -> Predicate {
        compile_filter(&self.rules, self.search.as_deref(), columns)
    }

    /// Compile the preview over the given visible columns.
    pub fn compile(&self, columns: &[Column], limit: usize) -> CompiledView {
        let predicate = self.predicate(columns);
        let table = quote_ident(DATASET_TABLE);
        let where_clause = predicate.where_clause();

        let sort_known = self
            .sort
            .column
            .as_deref()
            .is_some_and(|c| columns.iter().any(|col| col.name == c));
        let order_by = if sort_known {
            self.sort.order_by()
        } else {
            String::new()
        };

        let projection = if columns.is_empty() {
            "*".to_string()
        } else {
            columns
                .iter()
                .map(|c| quote_ident(&c.name))
                .collect::<Vec<_>>()
                .join(", ")
        };

        CompiledView {
            select_sql: format!("SELECT {projection} FROM {table}{where_clause}{order_by} LIMIT ?"),
            count_sql: format!("SELECT COUNT(*) FROM {table}{where_clause}"),
            params: predicate.params,
            limit,
        }
    }

    /// Drop every rule, the search and the sort.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
