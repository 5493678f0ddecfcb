//! SQLite SQL dialect implementation

use super::SqlDialect;

/// SQLite SQL dialect
pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn regex_match(&self, col: &str, _param_idx: usize) -> String {
        // REGEXP is backed by the application-registered regexp() function
        format!("{} REGEXP ?", col)
    }

    fn regex_pattern(&self, pattern: &str) -> String {
        format!("(?i){}", pattern)
    }
}
