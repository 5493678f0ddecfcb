//! ClickHouse SQL dialect implementation

use super::SqlDialect;

/// ClickHouse SQL dialect
pub struct ClickhouseDialect;

impl SqlDialect for ClickhouseDialect {
    fn name(&self) -> &'static str {
        "clickhouse"
    }

    fn placeholder(&self, _index: usize) -> String {
        // ClickHouse uses ? for positional parameters
        "?".to_string()
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn regex_match(&self, col: &str, _param_idx: usize) -> String {
        format!("match({}, ?)", col)
    }

    fn regex_pattern(&self, pattern: &str) -> String {
        // re2 has no case-insensitive flag argument
        format!("(?i){}", pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        let dialect = ClickhouseDialect;
        assert_eq!(dialect.quote_identifier("dims.width"), "`dims.width`");
        assert_eq!(dialect.quote_identifier("a`b"), "`a``b`");
    }

    #[test]
    fn test_regex() {
        let dialect = ClickhouseDialect;
        assert_eq!(dialect.regex_match("`name`", 1), "match(`name`, ?)");
        assert_eq!(dialect.regex_pattern("^foo"), "(?i)^foo");
    }
}
