//! Data layer for filter compilation backends
//!
//! ## Modules
//!
//! - `search` - Query compilers (Elasticsearch, SQL) and search requests
//! - `sql` - SQL dialect abstraction for multi-database support

pub mod search;
pub mod sql;

pub use search::{ElasticsearchCompiler, QueryCompiler, SearchRequest, SqlCompiler, SqlQuery};
pub use sql::{SqlBackend, SqlDialect};
