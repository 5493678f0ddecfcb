//! Filters - backend-agnostic boolean filter grammar
//!
//! Client filters are JSON mappings in a MongoDB-style operator syntax with
//! `@`-prefixed markers. They are parsed into a typed [`FilterNode`] tree
//! which backend compilers (see `data::search`) render into query documents.
//!
//! # Core Types
//!
//! - [`FilterNode`] - Logical (`@and`, `@or`, `@nor`) or field condition
//! - [`FieldOperator`] - Comparison, element and evaluation operators
//! - [`Value`] - Filter operand with typed coercion via [`coerce`]
//! - [`OperatorRegistry`] - Frozen table of operator markers
//!
//! # Example
//!
//! ```
//! use stockroom_server::domain::filters::{FilterNode, parse_filter};
//!
//! let raw = serde_json::json!({"@or": [{"sku": "A-1"}, {"qty": {"@gt": 10}}]});
//! let node = parse_filter(&raw).unwrap();
//! assert!(matches!(node, FilterNode::Logical { .. }));
//! ```

// ============================================================================
// PUBLIC MODULES
// ============================================================================

pub mod ast;
pub mod coerce;
pub mod error;
pub mod parser;
pub mod registry;

#[cfg(test)]
mod tests;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use ast::{FieldOperator, FieldPath, FilterNode, LogicalKind};
pub use coerce::{TargetKind, Value, ValueKind, coerce, coerce_each};
pub use error::{BuildError, ConversionError, FilterError, RegistryError, ValidationError};
pub use parser::{FieldSchema, FilterParser, ParseOptions, parse_filter};
pub use registry::{OperatorCategory, OperatorRegistry, RegistryEntry};
