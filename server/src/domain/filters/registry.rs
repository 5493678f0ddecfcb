//! Operator registry
//!
//! Maps each operator marker (`@eq`, `@and`, ...) to its category and the
//! function that builds the AST for it. The table is assembled once through a
//! [`RegistryBuilder`] and is read-only afterwards.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use super::ast::{FieldOperator, FilterNode};
use super::coerce::{TargetKind, Value, coerce};
use super::error::{BuildError, RegistryError};

/// Prefix that marks a mapping key as an operator rather than a field name
pub const OPERATOR_SIGIL: char = '@';

/// Markers of the standard operator table
pub mod markers {
    pub const AND: &str = "@and";
    pub const OR: &str = "@or";
    pub const NOR: &str = "@nor";
    pub const EQ: &str = "@eq";
    pub const NE: &str = "@ne";
    pub const GT: &str = "@gt";
    pub const GTE: &str = "@gte";
    pub const LT: &str = "@lt";
    pub const LTE: &str = "@lte";
    pub const EXISTS: &str = "@exists";
    pub const REGEX: &str = "@regex";
}

/// Whether a key carries the operator sigil
pub fn is_operator_key(key: &str) -> bool {
    key.starts_with(OPERATOR_SIGIL)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorCategory {
    Comparison,
    Element,
    Evaluation,
    Logical,
}

impl OperatorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperatorCategory::Comparison => "comparison",
            OperatorCategory::Element => "element",
            OperatorCategory::Evaluation => "evaluation",
            OperatorCategory::Logical => "logical",
        }
    }
}

impl fmt::Display for OperatorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub type FieldBuilder = fn(Value) -> Result<FieldOperator, BuildError>;
pub type LogicalBuilder = fn(Vec<FilterNode>) -> FilterNode;

/// How a resolved marker turns its operand into a node
#[derive(Clone, Copy)]
pub enum OperatorBuilder {
    Field(FieldBuilder),
    Logical(LogicalBuilder),
}

impl fmt::Debug for OperatorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(_) => write!(f, "Field(..)"),
            Self::Logical(_) => write!(f, "Logical(..)"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RegistryEntry {
    pub marker: &'static str,
    pub category: OperatorCategory,
    pub builder: OperatorBuilder,
}

/// Mutable registration phase of the operator table
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: Vec<RegistryEntry>,
}

impl RegistryBuilder {
    pub fn register(
        &mut self,
        marker: &'static str,
        category: OperatorCategory,
        builder: OperatorBuilder,
    ) -> Result<&mut Self, RegistryError> {
        if !is_operator_key(marker) || marker.len() == OPERATOR_SIGIL.len_utf8() {
            return Err(RegistryError::InvalidMarker(marker.to_string()));
        }
        let logical_builder = matches!(builder, OperatorBuilder::Logical(_));
        if logical_builder != (category == OperatorCategory::Logical) {
            return Err(RegistryError::CategoryMismatch {
                marker: marker.to_string(),
                category,
            });
        }
        if self.entries.iter().any(|e| e.marker == marker) {
            return Err(RegistryError::DuplicateMarker(marker.to_string()));
        }

        self.entries.push(RegistryEntry {
            marker,
            category,
            builder,
        });
        Ok(self)
    }

    /// Freeze the table
    pub fn build(self) -> OperatorRegistry {
        let index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.marker, i))
            .collect();
        OperatorRegistry {
            entries: self.entries,
            index,
        }
    }
}

/// Frozen operator table
#[derive(Debug)]
pub struct OperatorRegistry {
    entries: Vec<RegistryEntry>,
    index: HashMap<&'static str, usize>,
}

impl OperatorRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// The standard logical, comparison, element and evaluation operators
    pub fn standard() -> Result<Self, RegistryError> {
        use OperatorBuilder::{Field, Logical};
        use OperatorCategory as C;

        let mut builder = Self::builder();
        builder
            .register(markers::AND, C::Logical, Logical(FilterNode::and))?
            .register(markers::OR, C::Logical, Logical(FilterNode::or))?
            .register(markers::NOR, C::Logical, Logical(FilterNode::nor))?
            .register(markers::EQ, C::Comparison, Field(build_eq))?
            .register(markers::NE, C::Comparison, Field(build_ne))?
            .register(markers::GT, C::Comparison, Field(build_gt))?
            .register(markers::GTE, C::Comparison, Field(build_gte))?
            .register(markers::LT, C::Comparison, Field(build_lt))?
            .register(markers::LTE, C::Comparison, Field(build_lte))?
            .register(markers::EXISTS, C::Element, Field(build_exists))?
            .register(markers::REGEX, C::Evaluation, Field(build_regex))?;
        Ok(builder.build())
    }

    pub fn resolve(&self, marker: &str) -> Option<&RegistryEntry> {
        self.index.get(marker).map(|&i| &self.entries[i])
    }

    /// Entries in registration order
    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

static GLOBAL: LazyLock<Result<OperatorRegistry, RegistryError>> =
    LazyLock::new(OperatorRegistry::standard);

/// Process-wide standard registry
pub fn global() -> Result<&'static OperatorRegistry, RegistryError> {
    GLOBAL.as_ref().map_err(Clone::clone)
}

// ============================================================================
// Builders
// ============================================================================

fn build_eq(value: Value) -> Result<FieldOperator, BuildError> {
    Ok(FieldOperator::Eq(value))
}

fn build_ne(value: Value) -> Result<FieldOperator, BuildError> {
    Ok(FieldOperator::Ne(value))
}

fn range_operand(value: Value) -> Result<Value, BuildError> {
    match value {
        Value::List(_) => Err(BuildError::Shape("range operators do not accept lists")),
        other => Ok(other),
    }
}

fn build_gt(value: Value) -> Result<FieldOperator, BuildError> {
    range_operand(value).map(FieldOperator::Gt)
}

fn build_gte(value: Value) -> Result<FieldOperator, BuildError> {
    range_operand(value).map(FieldOperator::Gte)
}

fn build_lt(value: Value) -> Result<FieldOperator, BuildError> {
    range_operand(value).map(FieldOperator::Lt)
}

fn build_lte(value: Value) -> Result<FieldOperator, BuildError> {
    range_operand(value).map(FieldOperator::Lte)
}

fn build_exists(value: Value) -> Result<FieldOperator, BuildError> {
    match coerce(value, TargetKind::Bool)? {
        Value::Bool(flag) => Ok(FieldOperator::Exists(flag)),
        _ => Err(BuildError::Shape("expected a boolean")),
    }
}

fn build_regex(value: Value) -> Result<FieldOperator, BuildError> {
    match coerce(value, TargetKind::Str)? {
        Value::Str(pattern) => Ok(FieldOperator::Regex(pattern)),
        _ => Err(BuildError::Shape("expected a pattern string")),
    }
}
