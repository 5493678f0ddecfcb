//! SQL abstraction layer for multi-database support
//!
//! This module provides abstractions for generating filter SQL that works
//! across different database backends (DuckDB, PostgreSQL, SQLite, ClickHouse).

mod clickhouse_dialect;
mod dialect;
mod duckdb_dialect;
mod postgres_dialect;
mod sqlite_dialect;

pub use clickhouse_dialect::ClickhouseDialect;
pub use dialect::SqlDialect;
pub use duckdb_dialect::DuckdbDialect;
pub use postgres_dialect::PostgresDialect;
pub use sqlite_dialect::SqliteDialect;

/// SQL backend identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlBackend {
    Sqlite,
    Postgres,
    Duckdb,
    Clickhouse,
}

impl SqlBackend {
    /// Get the SQL dialect for this backend
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            SqlBackend::Sqlite => &SqliteDialect,
            SqlBackend::Postgres => &PostgresDialect,
            SqlBackend::Duckdb => &DuckdbDialect,
            SqlBackend::Clickhouse => &ClickhouseDialect,
        }
    }

    /// Get the backend name
    pub fn name(&self) -> &'static str {
        match self {
            SqlBackend::Sqlite => "sqlite",
            SqlBackend::Postgres => "postgres",
            SqlBackend::Duckdb => "duckdb",
            SqlBackend::Clickhouse => "clickhouse",
        }
    }
}

impl std::fmt::Display for SqlBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
