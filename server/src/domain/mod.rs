//! Domain logic for inventory search
//!
//! - `filters` - Filter grammar: registry, coercion, AST and parser

pub mod filters;

pub use filters::{FilterError, FilterNode, FilterParser, OperatorRegistry, parse_filter};
