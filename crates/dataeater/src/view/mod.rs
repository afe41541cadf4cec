//! Read-time shaping of the preview: filter rules, free-text search, sort
//! and saved favorites.
//!
//! Rules compile to a single predicate with bound parameters; identifiers go
//! through [`crate::sql::quote_ident`].

mod favorites;
mod filter;
mod query;
mod rules;
mod sort;

pub use favorites::{Favorite, FavoriteStore};
pub use filter::{Predicate, compile_filter, compile_rule, compile_search};
pub use query::{CompiledView, ViewState};
pub use rules::{Operator, Rule, ordered_rules};
pub use sort::{SortDirection, SortState};
