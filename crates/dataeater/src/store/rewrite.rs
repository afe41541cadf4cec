//! Built-in multi-step schema rewrites. Each runs in one transaction.

use std::collections::HashSet;

use tracing::info;

use super::data_store::DataStore;
use crate::error::{DataEaterError, Result};
use crate::history::HistoryKind;
use crate::sql::{DATASET_TABLE, RESERVED_PREFIX, ident_list, is_reserved, quote_ident};

const REWRITE_TABLE: &str = "__dataeater_rewrite";

impl DataStore {
    /// Rename a single column.
    pub fn rename_column(&mut self, old: &str, new: &str) -> Result<()> {
        self.rename_columns(&[(old, new)])
    }

    /// Rename several columns at once. Swaps and cycles are allowed.
    pub fn rename_columns<S: AsRef<str>, T: AsRef<str>>(&mut self, renames: &[(S, T)]) -> Result<()> {
        self.require_dataset()?;

        let pairs: Vec<(&str, &str)> = renames
            .iter()
            .map(|(old, new)| (old.as_ref(), new.as_ref()))
            .filter(|(old, new)| old != new)
            .collect();
        if pairs.is_empty() {
            return Ok(());
        }

        let mut renamed = HashSet::new();
        for (old, new) in &pairs {
            self.column(old)?;
            if new.trim().is_empty() {
                return Err(DataEaterError::InvalidInput("column name must not be empty".to_string()));
            }
            if is_reserved(new) {
                return Err(DataEaterError::InvalidInput(format!(
                    "column names starting with '{RESERVED_PREFIX}' are reserved"
                )));
            }
            if !renamed.insert(old.to_lowercase()) {
                return Err(DataEaterError::InvalidInput(format!("column '{old}' renamed twice")));
            }
        }

        // Final names must stay unique; engine identifiers are case-insensitive.
        let mut final_names = HashSet::new();
        for column in &self.columns {
            let name = pairs
                .iter()
                .find(|(old, _)| *old == column.name)
                .map_or(column.name.as_str(), |(_, new)| *new);
            if !final_names.insert(name.to_lowercase()) {
                return Err(DataEaterError::InvalidInput(format!(
                    "column '{name}' would be duplicated"
                )));
            }
        }

        let table = quote_ident(DATASET_TABLE);
        let mut statements = Vec::with_capacity(pairs.len() * 2);
        for (i, (old, _)) in pairs.iter().enumerate() {
            statements.push(format!(
                "ALTER TABLE {table} RENAME COLUMN {} TO {}",
                quote_ident(old),
                quote_ident(&format!("{RESERVED_PREFIX}rename_{i}"))
            ));
        }
        for (i, (_, new)) in pairs.iter().enumerate() {
            statements.push(format!(
                "ALTER TABLE {table} RENAME COLUMN {} TO {}",
                quote_ident(&format!("{RESERVED_PREFIX}rename_{i}")),
                quote_ident(new)
            ));
        }

        let description = pairs
            .iter()
            .map(|(old, new)| format!("{old} → {new}"))
            .collect::<Vec<_>>()
            .join(", ");
        info!(renames = pairs.len(), "renaming columns");
        self.execute_transaction(
            &statements,
            HistoryKind::Rename,
            Some(&format!("Renamed {description}")),
        )
    }

    /// Move the listed columns to the front, in order. Unlisted columns
    /// follow in their current order.
    pub fn reorder_columns<S: AsRef<str>>(&mut self, order: &[S]) -> Result<()> {
        self.require_dataset()?;

        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(self.columns.len());
        for name in order {
            let column = self.column(name.as_ref())?;
            if !seen.insert(column.name.clone()) {
                return Err(DataEaterError::InvalidInput(format!(
                    "column '{}' listed twice",
                    column.name
                )));
            }
            columns.push(column.clone());
        }
        for column in &self.columns {
            if !seen.contains(&column.name) {
                columns.push(column.clone());
            }
        }

        if columns == self.columns {
            return Ok(());
        }

        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        let defs = columns
            .iter()
            .map(|c| format!("{} {}", quote_ident(&c.name), c.column_type.sql_type()))
            .collect::<Vec<_>>()
            .join(", ");
        let statements = recreate_statements(&defs, &ident_list(&names));

        self.execute_transaction(
            &statements,
            HistoryKind::Reorder,
            Some(&format!("Reordered columns: {}", names.join(", "))),
        )
    }

    /// Delete repeated rows, keeping the first occurrence in row order.
    ///
    /// Rows are compared on `keys`, or on every column when `keys` is empty.
    /// Returns the number of rows removed.
    pub fn remove_duplicates<S: AsRef<str>>(&mut self, keys: &[S]) -> Result<u64> {
        self.require_dataset()?;

        let key_names: Vec<String> = if keys.is_empty() {
            self.column_names()
        } else {
            keys.iter()
                .map(|k| self.column(k.as_ref()).map(|c| c.name.clone()))
                .collect::<Result<_>>()?
        };

        let table = quote_ident(DATASET_TABLE);
        let keep_first = format!(
            "rowid NOT IN (SELECT MIN(rowid) FROM {table} GROUP BY {})",
            ident_list(&key_names)
        );
        let duplicates = match self.count_where(&keep_first, &[]) {
            Ok(n) => n,
            Err(e) => return Err(self.fail(e, "count duplicates")),
        };
        if duplicates == 0 {
            return Ok(0);
        }

        let scope = if keys.is_empty() {
            "all columns".to_string()
        } else {
            key_names.join(", ")
        };
        self.execute_transaction(
            &[format!("DELETE FROM {table} WHERE {keep_first}")],
            HistoryKind::Deduplicate,
            Some(&format!("Removed {duplicates} duplicate rows on {scope}")),
        )?;
        Ok(duplicates)
    }

    /// Drop columns. At least one column must remain.
    pub fn drop_columns<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        self.require_dataset()?;
        if names.is_empty() {
            return Ok(());
        }

        let mut dropped = HashSet::new();
        for name in names {
            dropped.insert(self.column(name.as_ref())?.name.clone());
        }
        if dropped.len() >= self.columns.len() {
            return Err(DataEaterError::InvalidInput(
                "cannot drop every column of the dataset".to_string(),
            ));
        }

        let table = quote_ident(DATASET_TABLE);
        let ordered: Vec<String> = self
            .columns
            .iter()
            .map(|c| c.name.clone())
            .filter(|n| dropped.contains(n))
            .collect();
        let statements: Vec<String> = ordered
            .iter()
            .map(|n| format!("ALTER TABLE {table} DROP COLUMN {}", quote_ident(n)))
            .collect();
        let description = format!("Dropped columns: {}", ordered.join(", "));

        self.execute_transaction(&statements, HistoryKind::Delete, Some(&description))
    }
}

/// Create-copy-drop-rename sequence that rebuilds the dataset table.
fn recreate_statements(defs: &str, columns: &str) -> Vec<String> {
    let table = quote_ident(DATASET_TABLE);
    let rewrite = quote_ident(REWRITE_TABLE);
    vec![
        format!("DROP TABLE IF EXISTS main.{rewrite}"),
        format!("CREATE TABLE main.{rewrite} ({defs})"),
        format!("INSERT INTO main.{rewrite} ({columns}) SELECT {columns} FROM {table} ORDER BY rowid"),
        format!("DROP TABLE {table}"),
        format!("ALTER TABLE main.{rewrite} RENAME TO {table}"),
    ]
}
