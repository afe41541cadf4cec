//! Single-column tri-state sort.

use serde::{Deserialize, Serialize};

use crate::sql::quote_ident;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Current sort, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub column: Option<String>,
    pub direction: Option<SortDirection>,
}

impl SortState {
    /// Advance on a click: unsorted → ascending → descending → unsorted.
    /// Clicking another column starts over at ascending.
    pub fn toggle(&mut self, column: &str) {
        let same = self.column.as_deref() == Some(column);
        let next = match (same, self.direction) {
            (true, Some(SortDirection::Asc)) => Some(SortDirection::Desc),
            (true, Some(SortDirection::Desc)) => None,
            _ => Some(SortDirection::Asc),
        };
        match next {
            Some(direction) => {
                self.column = Some(column.to_string());
                self.direction = Some(direction);
            }
            None => self.clear(),
        }
    }

    pub fn clear(&mut self) {
        self.column = None;
        self.direction = None;
    }

    pub fn is_sorted(&self) -> bool {
        self.column.is_some() && self.direction.is_some()
    }

    /// ` ORDER BY …`, or an empty string when unsorted.
    pub fn order_by(&self) -> String {
        match (&self.column, self.direction) {
            (Some(column), Some(SortDirection::Asc)) => {
                format!(" ORDER BY {} ASC", quote_ident(column))
            }
            (Some(column), Some(SortDirection::Desc)) => {
                format!(" ORDER BY {} DESC", quote_ident(column))
            }
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_clicks_cycle() {
        let mut sort = SortState::default();
        sort.toggle("age");
        assert_eq!(sort.order_by(), " ORDER BY \"age\" ASC");
        sort.toggle("age");
        assert_eq!(sort.order_by(), " ORDER BY \"age\" DESC");
        sort.toggle("age");
        assert_eq!(sort.order_by(), "");
        assert!(!sort.is_sorted());
    }

    #[test]
    fn test_other_column_resets_to_ascending() {
        let mut sort = SortState::default();
        sort.toggle("age");
        sort.toggle("age");
        sort.toggle("city");
        assert_eq!(sort.column.as_deref(), Some("city"));
        assert_eq!(sort.direction, Some(SortDirection::Asc));
    }
}
