//! `_search` request bodies
//!
//! Wraps a compiled filter into a complete request with `from`/`size`
//! pagination.

use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use crate::core::constants::{MAX_PAGE, MAX_PAGE_LIMIT};
use crate::domain::filters::{FilterError, FilterNode};

use super::ElasticsearchCompiler;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaginationError {
    #[error("page must be between 1 and {max}, got {page}")]
    Page { page: u32, max: u32 },

    #[error("limit must be between 1 and {max}, got {limit}")]
    Limit { limit: u32, max: u32 },
}

/// A paginated search over an optional filter
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    filter: Option<FilterNode>,
    page: u32,
    limit: u32,
}

impl SearchRequest {
    pub fn new(filter: Option<FilterNode>, page: u32, limit: u32) -> Result<Self, PaginationError> {
        if page == 0 || page > MAX_PAGE {
            return Err(PaginationError::Page {
                page,
                max: MAX_PAGE,
            });
        }
        if limit == 0 || limit > MAX_PAGE_LIMIT {
            return Err(PaginationError::Limit {
                limit,
                max: MAX_PAGE_LIMIT,
            });
        }
        Ok(Self {
            filter,
            page,
            limit,
        })
    }

    pub fn filter(&self) -> Option<&FilterNode> {
        self.filter.as_ref()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of hits skipped before this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    /// Request body; `query` is omitted when there is no filter
    pub fn to_body(&self, compiler: &ElasticsearchCompiler) -> Result<JsonValue, FilterError> {
        let mut body = Map::new();
        if let Some(filter) = &self.filter {
            body.insert("query".to_string(), compiler.compile_query(filter)?);
        }
        body.insert("from".to_string(), JsonValue::from(self.offset()));
        body.insert("size".to_string(), JsonValue::from(self.limit));
        Ok(JsonValue::Object(body))
    }
}
