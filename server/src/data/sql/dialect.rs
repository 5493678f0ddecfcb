//! SQL dialect trait for multi-database support
//!
//! This trait defines the interface for generating database-specific filter
//! SQL.

/// SQL dialect trait for generating database-specific SQL
///
/// Different databases have different syntax for:
/// - Parameter placeholders (? vs $1)
/// - Identifier quoting ("col" vs `col`)
/// - Regular expression matching
pub trait SqlDialect: Send + Sync {
    /// Get the dialect name
    fn name(&self) -> &'static str;

    /// Generate a parameter placeholder for the given index (1-based)
    ///
    /// - SQLite/DuckDB/ClickHouse: Always returns "?"
    /// - PostgreSQL: Returns "$1", "$2", etc.
    fn placeholder(&self, index: usize) -> String;

    /// Quote a field name as a single column identifier
    ///
    /// Dotted names (`dims.width`) map to one flattened column of that exact
    /// name, never to a table-qualified column. Embedded quotes are doubled.
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Case-insensitive regular expression match against a bound pattern
    ///
    /// - SQLite: `col REGEXP ?`
    /// - PostgreSQL: `col ~* $1`
    /// - DuckDB: `regexp_matches(col, ?, 'i')`
    /// - ClickHouse: `match(col, ?)`
    fn regex_match(&self, col: &str, param_idx: usize) -> String;

    /// Pattern as bound for [`regex_match`](Self::regex_match)
    ///
    /// Dialects without a case-insensitive flag prefix the pattern with `(?i)`.
    fn regex_pattern(&self, pattern: &str) -> String {
        pattern.to_string()
    }
}
