//! Identifier quoting and SQL text helpers.
//!
//! Every column or table name interpolated into generated SQL goes through
//! [`quote_ident`]. Literal values are always bound as parameters.

/// Name of the table or view holding the loaded dataset.
pub const DATASET_TABLE: &str = "current_dataset";

/// Name of the staging table holding the raw source text.
pub const SOURCE_TABLE: &str = "source_file";

/// Schema name of the attached staging database.
pub const STAGING_SCHEMA: &str = "staging";

/// Unicode-aware `lower()` registered on every engine connection.
pub const LOWER_FUNCTION: &str = "dataeater_lower";

/// Prefix reserved for internal helper columns and tables.
pub const RESERVED_PREFIX: &str = "__dataeater_";

/// Quote an identifier, doubling embedded double quotes.
///
/// ```
/// use dataeater::sql::quote_ident;
///
/// assert_eq!(quote_ident("Nom Complet"), "\"Nom Complet\"");
/// assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
/// ```
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Escape `%`, `_` and `\` so a value matches literally inside a LIKE
/// pattern declared with `ESCAPE '\'`.
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Whether a column or table name is reserved for internal use.
pub fn is_reserved(name: &str) -> bool {
    name.starts_with(RESERVED_PREFIX)
}

/// Comma-separated list of quoted identifiers.
pub fn ident_list<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .map(|n| quote_ident(n.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_handles_accents_and_punctuation() {
        assert_eq!(quote_ident("Prénom (usuel)"), "\"Prénom (usuel)\"");
        assert_eq!(quote_ident(""), "\"\"");
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_ident_list() {
        assert_eq!(ident_list(&["a", "b c"]), "\"a\", \"b c\"");
        assert!(is_reserved("__dataeater_row_id"));
        assert!(!is_reserved("row_id"));
    }
}
