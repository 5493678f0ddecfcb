//! Search backends
//!
//! Compilers that render a parsed [`FilterNode`] into a backend query:
//! - `elasticsearch` - Elasticsearch Query DSL clause maps
//! - `sql` - Parameterised SQL `WHERE` fragments per dialect
//! - `request` - Complete `_search` request bodies with pagination
//!
//! New backends implement [`QueryCompiler`]; parsing is unaffected.

pub mod elasticsearch;
pub mod request;
pub mod sql;


pub use elasticsearch::ElasticsearchCompiler;
pub use request::{PaginationError, SearchRequest};
pub use sql::{SqlCompiler, SqlParams, SqlQuery, SqlValue};

use crate::domain::filters::{FilterError, FilterNode};

/// Renders a filter tree into a backend query document
///
/// Compilation is pure. A tree the compiler cannot render is a
/// [`FilterError::Internal`], never a caller error.
pub trait QueryCompiler: Send + Sync {
    type Output;

    /// Backend name for logs and CLI output
    fn name(&self) -> &'static str;

    fn compile(&self, node: &FilterNode) -> Result<Self::Output, FilterError>;
}

/// Reject trees deeper than `max_depth` before walking them
pub(crate) fn ensure_depth(
    compiler: &'static str,
    node: &FilterNode,
    max_depth: usize,
) -> Result<(), FilterError> {
    let depth = node.depth();
    if depth > max_depth {
        return Err(internal_error(
            compiler,
            node,
            format!("tree depth {} exceeds limit of {}", depth, max_depth),
        ));
    }
    Ok(())
}

/// Log an unrenderable tree and wrap the message as an internal error
pub(crate) fn internal_error(
    compiler: &'static str,
    node: &FilterNode,
    message: String,
) -> FilterError {
    tracing::error!(compiler, ast = ?node, error = %message, "Filter compilation failed");
    FilterError::internal(message)
}
