//! Filter AST
//!
//! The typed tree shared by the parser and every backend compiler.

use std::fmt;

use super::coerce::Value;
use super::registry::OperatorCategory;

/// Boolean connective of a logical node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalKind {
    And,
    Or,
    Nor,
}

impl LogicalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalKind::And => "and",
            LogicalKind::Or => "or",
            LogicalKind::Nor => "nor",
        }
    }
}

impl fmt::Display for LogicalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Operator applied to a single field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOperator {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    Exists(bool),
    Regex(String),
}

impl FieldOperator {
    pub fn category(&self) -> OperatorCategory {
        match self {
            Self::Eq(_) | Self::Ne(_) | Self::Gt(_) | Self::Gte(_) | Self::Lt(_) | Self::Lte(_) => {
                OperatorCategory::Comparison
            }
            Self::Exists(_) => OperatorCategory::Element,
            Self::Regex(_) => OperatorCategory::Evaluation,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Eq(_) => "eq",
            Self::Ne(_) => "ne",
            Self::Gt(_) => "gt",
            Self::Gte(_) => "gte",
            Self::Lt(_) => "lt",
            Self::Lte(_) => "lte",
            Self::Exists(_) => "exists",
            Self::Regex(_) => "regex",
        }
    }
}

/// A node of the filter tree
///
/// Logical nodes produced by the parser always have at least one child.
/// Hand-built trees that break this are rejected by the compilers.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    Logical {
        kind: LogicalKind,
        children: Vec<FilterNode>,
    },
    Field {
        field: String,
        operator: FieldOperator,
    },
}

impl FilterNode {
    pub fn field(field: impl Into<String>, operator: FieldOperator) -> Self {
        Self::Field {
            field: field.into(),
            operator,
        }
    }

    pub fn logical(kind: LogicalKind, children: Vec<FilterNode>) -> Self {
        Self::Logical { kind, children }
    }

    pub fn and(children: Vec<FilterNode>) -> Self {
        Self::logical(LogicalKind::And, children)
    }

    pub fn or(children: Vec<FilterNode>) -> Self {
        Self::logical(LogicalKind::Or, children)
    }

    pub fn nor(children: Vec<FilterNode>) -> Self {
        Self::logical(LogicalKind::Nor, children)
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(field, FieldOperator::Eq(value.into()))
    }

    pub fn exists(field: impl Into<String>, flag: bool) -> Self {
        Self::field(field, FieldOperator::Exists(flag))
    }

    pub fn regex(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::field(field, FieldOperator::Regex(pattern.into()))
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, Self::Logical { .. })
    }

    /// Height of the tree; a lone field node has depth 1
    pub fn depth(&self) -> usize {
        match self {
            Self::Field { .. } => 1,
            Self::Logical { children, .. } => {
                1 + children.iter().map(FilterNode::depth).max().unwrap_or(0)
            }
        }
    }
}

/// Location inside a raw filter, used to annotate errors
///
/// Segments are field names and logical positions (`@or[1]`), rendered
/// dotted: `@or[1].dims.width`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        Self {
            segments: path
                .split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "<root>")
        } else {
            write!(f, "{}", self.segments.join("."))
        }
    }
}
