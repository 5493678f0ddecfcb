//! Filter parsing
//!
//! Turns a raw JSON filter mapping into a validated [`FilterNode`] tree.
//!
//! Keys carrying the `@` sigil are resolved through the operator registry;
//! any other key names a field. A mapping with several keys becomes an
//! implicit `@and` of its entries, in input order. A field whose value is not
//! a mapping is an implicit `@eq`.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use crate::core::constants::{DEFAULT_FILTER_MAX_DEPTH, MAX_FILTER_JSON_SIZE};

use super::ast::{FieldOperator, FieldPath, FilterNode};
use super::coerce::{TargetKind, Value, coerce_each};
use super::error::{FilterError, ValidationError};
use super::registry::{
    self, FieldBuilder, LogicalBuilder, OperatorBuilder, OperatorCategory, OperatorRegistry,
    RegistryEntry, is_operator_key,
};

/// Caller-supplied target kinds for comparison values, keyed by dotted field
/// name
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct FieldSchema {
    fields: HashMap<String, TargetKind>,
}

impl FieldSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, kind: TargetKind) -> Self {
        self.insert(field, kind);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, kind: TargetKind) {
        self.fields.insert(field.into(), kind);
    }

    pub fn get(&self, field: &str) -> Option<TargetKind> {
        self.fields.get(field).copied()
    }

    /// Merge `other` in, its entries taking precedence
    pub fn extend(&mut self, other: FieldSchema) {
        self.fields.extend(other.fields);
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseOptions {
    /// Deepest level a node of the parsed tree may sit at (root is 1)
    pub max_depth: usize,
    pub schema: FieldSchema,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_FILTER_MAX_DEPTH,
            schema: FieldSchema::default(),
        }
    }
}

pub struct FilterParser<'a> {
    registry: &'a OperatorRegistry,
    options: ParseOptions,
}

impl<'a> FilterParser<'a> {
    pub fn new(registry: &'a OperatorRegistry, options: ParseOptions) -> Self {
        Self { registry, options }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse a filter mapping
    pub fn parse(&self, raw: &JsonValue) -> Result<FilterNode, FilterError> {
        let root = FieldPath::root();
        let map = raw
            .as_object()
            .ok_or_else(|| ValidationError::malformed(&root, "filter must be a mapping"))?;

        let node = self.parse_object(map, &root, 1)?;
        tracing::trace!(depth = node.depth(), "Parsed filter");
        Ok(node)
    }

    /// Parse filter JSON text, rejecting input over the size limit
    pub fn parse_str(&self, json: &str) -> Result<FilterNode, FilterError> {
        let root = FieldPath::root();
        if json.len() > MAX_FILTER_JSON_SIZE {
            return Err(ValidationError::malformed(
                &root,
                format!(
                    "filter JSON exceeds maximum size of {} bytes",
                    MAX_FILTER_JSON_SIZE
                ),
            )
            .into());
        }

        let raw: JsonValue = serde_json::from_str(json)
            .map_err(|e| ValidationError::malformed(&root, format!("invalid JSON: {}", e)))?;
        self.parse(&raw)
    }

    /// Root or logical-element mapping; the resulting node sits at `level`
    fn parse_object(
        &self,
        map: &Map<String, JsonValue>,
        path: &FieldPath,
        level: usize,
    ) -> Result<FilterNode, FilterError> {
        let entry_level = self.entry_level(map, path, level)?;
        let nodes = map
            .iter()
            .map(|(key, value)| self.parse_entry(key, value, path, entry_level))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(combine(nodes))
    }

    fn parse_entry(
        &self,
        key: &str,
        value: &JsonValue,
        path: &FieldPath,
        level: usize,
    ) -> Result<FilterNode, FilterError> {
        if !is_operator_key(key) {
            return self.parse_field(key.to_string(), value, &path.child(key), level);
        }

        match self.resolve(key, path)?.builder {
            OperatorBuilder::Logical(build) => self.parse_logical(key, build, value, path, level),
            OperatorBuilder::Field(_) => Err(ValidationError::malformed(
                path,
                format!("operator '{}' must be applied to a field", key),
            )
            .into()),
        }
    }

    fn parse_logical(
        &self,
        key: &str,
        build: LogicalBuilder,
        value: &JsonValue,
        path: &FieldPath,
        level: usize,
    ) -> Result<FilterNode, FilterError> {
        self.check_depth(level, path)?;

        let items = value.as_array().ok_or_else(|| {
            ValidationError::malformed(path, format!("'{}' expects a list of conditions", key))
        })?;
        if items.is_empty() {
            return Err(ValidationError::EmptyLogicalChildren {
                key: key.to_string(),
                path: path.clone(),
            }
            .into());
        }

        let children = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let item_path = path.child(format!("{}[{}]", key, i));
                let map = item.as_object().ok_or_else(|| {
                    ValidationError::malformed(&item_path, "each condition must be a mapping")
                })?;
                self.parse_object(map, &item_path, level + 1)
            })
            .collect::<Result<Vec<_>, FilterError>>()?;

        Ok(build(children))
    }

    fn parse_field(
        &self,
        field: String,
        value: &JsonValue,
        path: &FieldPath,
        level: usize,
    ) -> Result<FilterNode, FilterError> {
        if let JsonValue::Object(map) = value {
            return self.parse_operator_map(&field, map, path, level);
        }

        self.check_depth(level, path)?;
        let value = self.field_value(&field, value, path)?;
        Ok(FilterNode::field(field, FieldOperator::Eq(value)))
    }

    /// Operators applied to `field`; non-sigil keys extend the field name
    fn parse_operator_map(
        &self,
        field: &str,
        map: &Map<String, JsonValue>,
        path: &FieldPath,
        level: usize,
    ) -> Result<FilterNode, FilterError> {
        let entry_level = self.entry_level(map, path, level)?;
        let nodes = map
            .iter()
            .map(|(key, value)| {
                if is_operator_key(key) {
                    self.parse_operator(field, key, value, path, entry_level)
                } else {
                    self.parse_field(
                        format!("{}.{}", field, key),
                        value,
                        &path.child(key),
                        entry_level,
                    )
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(combine(nodes))
    }

    fn parse_operator(
        &self,
        field: &str,
        key: &str,
        value: &JsonValue,
        path: &FieldPath,
        level: usize,
    ) -> Result<FilterNode, FilterError> {
        self.check_depth(level, path)?;

        let entry = self.resolve(key, path)?;
        let build: FieldBuilder = match entry.builder {
            OperatorBuilder::Field(build) => build,
            OperatorBuilder::Logical(_) => {
                return Err(ValidationError::malformed(
                    path,
                    format!("logical operator '{}' cannot be applied to a field", key),
                )
                .into());
            }
        };

        let value = if entry.category == OperatorCategory::Comparison {
            self.field_value(field, value, path)?
        } else {
            raw_value(value, path)?
        };
        let operator = build(value).map_err(|e| e.at(path))?;

        tracing::trace!(field, operator = operator.name(), "Parsed field operator");
        Ok(FilterNode::field(field, operator))
    }

    /// Comparison operand for `field`, coerced when the schema names it
    fn field_value(
        &self,
        field: &str,
        value: &JsonValue,
        path: &FieldPath,
    ) -> Result<Value, FilterError> {
        let value = raw_value(value, path)?;
        match self.options.schema.get(field) {
            Some(target) => {
                coerce_each(value, target).map_err(|e| FilterError::conversion(path, e))
            }
            None => Ok(value),
        }
    }

    fn resolve(
        &self,
        key: &str,
        path: &FieldPath,
    ) -> Result<&'a RegistryEntry, FilterError> {
        self.registry.resolve(key).ok_or_else(|| {
            ValidationError::UnknownOperator {
                key: key.to_string(),
                path: path.clone(),
            }
            .into()
        })
    }

    /// Level of a mapping's entries; a multi-key mapping adds an implicit
    /// `@and` at `level`
    fn entry_level(
        &self,
        map: &Map<String, JsonValue>,
        path: &FieldPath,
        level: usize,
    ) -> Result<usize, FilterError> {
        match map.len() {
            0 => Err(ValidationError::malformed(path, "empty mapping").into()),
            1 => Ok(level),
            _ => {
                self.check_depth(level, path)?;
                Ok(level + 1)
            }
        }
    }

    fn check_depth(&self, level: usize, path: &FieldPath) -> Result<(), FilterError> {
        if level > self.options.max_depth {
            return Err(ValidationError::MaxDepthExceeded {
                max_depth: self.options.max_depth,
                path: path.clone(),
            }
            .into());
        }
        Ok(())
    }
}

/// Parse with the process-wide registry and default options
pub fn parse_filter(raw: &JsonValue) -> Result<FilterNode, FilterError> {
    let registry = registry::global().map_err(|e| FilterError::internal(e.to_string()))?;
    FilterParser::new(registry, ParseOptions::default()).parse(raw)
}

fn raw_value(value: &JsonValue, path: &FieldPath) -> Result<Value, FilterError> {
    Value::from_json(value).map_err(|reason| ValidationError::malformed(path, reason).into())
}

fn combine(nodes: Vec<FilterNode>) -> FilterNode {
    match <[FilterNode; 1]>::try_from(nodes) {
        Ok([node]) => node,
        Err(nodes) => FilterNode::and(nodes),
    }
}
