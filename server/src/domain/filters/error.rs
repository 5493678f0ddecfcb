//! Filter error types
//!
//! Request-path errors carry the [`FieldPath`] of the offending input.
//! Registry errors only occur while the operator table is being built.

use thiserror::Error;

use super::ast::FieldPath;
use super::coerce::{TargetKind, ValueKind};
use super::registry::OperatorCategory;

/// A value could not be converted to the requested representation
#[derive(Error, Debug, Clone, PartialEq)]
#[error("cannot convert {source_kind} to {target_kind}")]
pub struct ConversionError {
    pub source_kind: ValueKind,
    pub target_kind: TargetKind,
}

impl ConversionError {
    pub fn new(source_kind: ValueKind, target_kind: TargetKind) -> Self {
        Self {
            source_kind,
            target_kind,
        }
    }
}

/// Caller input that does not form a valid filter
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("unknown operator '{key}' at {path}")]
    UnknownOperator { key: String, path: FieldPath },

    #[error("'{key}' requires at least one condition at {path}")]
    EmptyLogicalChildren { key: String, path: FieldPath },

    #[error("filter nesting exceeds maximum depth of {max_depth} at {path}")]
    MaxDepthExceeded { max_depth: usize, path: FieldPath },

    #[error("malformed filter at {path}: {reason}")]
    MalformedShape { path: FieldPath, reason: String },
}

impl ValidationError {
    pub fn malformed(path: &FieldPath, reason: impl Into<String>) -> Self {
        Self::MalformedShape {
            path: path.clone(),
            reason: reason.into(),
        }
    }

    pub fn path(&self) -> &FieldPath {
        match self {
            Self::UnknownOperator { path, .. }
            | Self::EmptyLogicalChildren { path, .. }
            | Self::MaxDepthExceeded { path, .. }
            | Self::MalformedShape { path, .. } => path,
        }
    }
}

/// Error returned by parsing and compilation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("invalid value at {path}: {error}")]
    Conversion {
        path: FieldPath,
        error: ConversionError,
    },

    /// The compiler was handed a tree it cannot render
    #[error("internal filter error: {0}")]
    Internal(String),
}

impl FilterError {
    pub fn conversion(path: &FieldPath, error: ConversionError) -> Self {
        Self::Conversion {
            path: path.clone(),
            error,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(ValidationError::UnknownOperator { .. }) => "UNKNOWN_OPERATOR",
            Self::Validation(ValidationError::EmptyLogicalChildren { .. }) => {
                "EMPTY_LOGICAL_CHILDREN"
            }
            Self::Validation(ValidationError::MaxDepthExceeded { .. }) => "MAX_DEPTH_EXCEEDED",
            Self::Validation(ValidationError::MalformedShape { .. }) => "MALFORMED_FILTER",
            Self::Conversion { .. } => "INVALID_FILTER_VALUE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True when the caller's input is at fault
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }

    pub fn path(&self) -> Option<&FieldPath> {
        match self {
            Self::Validation(e) => Some(e.path()),
            Self::Conversion { path, .. } => Some(path),
            Self::Internal(_) => None,
        }
    }
}

/// Operator table construction failure
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("operator '{0}' is already registered")]
    DuplicateMarker(String),

    #[error("operator '{marker}' cannot be registered as {category}")]
    CategoryMismatch {
        marker: String,
        category: OperatorCategory,
    },

    #[error("operator marker '{0}' must start with the operator sigil")]
    InvalidMarker(String),
}

/// Failure inside an operator builder, before the path is known
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("{0}")]
    Shape(&'static str),
}

impl BuildError {
    pub fn at(self, path: &FieldPath) -> FilterError {
        match self {
            Self::Conversion(error) => FilterError::conversion(path, error),
            Self::Shape(reason) => ValidationError::malformed(path, reason).into(),
        }
    }
}
