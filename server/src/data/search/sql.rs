//! SQL filter compiler
//!
//! Builds a parameterised SQL `WHERE` fragment from a filter tree.
//! Identifiers are always quoted by the dialect and every operand is bound
//! through [`SqlParams`]; nothing from the filter is spliced into the SQL text.

use serde::Serialize;

use crate::core::constants::DEFAULT_FILTER_MAX_DEPTH;
use crate::data::sql::{SqlBackend, SqlDialect};
use crate::domain::filters::{
    FieldOperator, FilterError, FilterNode, LogicalKind, TargetKind, Value, coerce,
};

use super::{QueryCompiler, ensure_depth, internal_error};

/// A bound parameter value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

/// Collects SQL parameters during query building (maintains insertion order)
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SqlParams {
    pub values: Vec<SqlValue>,
}

impl SqlParams {
    /// Append a value, returning its 1-based placeholder index
    pub fn push(&mut self, value: SqlValue) -> usize {
        self.values.push(value);
        self.values.len()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Compiled `WHERE` fragment and its bound values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlQuery {
    #[serde(rename = "where")]
    pub clause: String,
    pub params: SqlParams,
}

pub struct SqlCompiler {
    dialect: &'static dyn SqlDialect,
    max_depth: usize,
}

impl SqlCompiler {
    pub fn new(dialect: &'static dyn SqlDialect, max_depth: usize) -> Self {
        Self { dialect, max_depth }
    }

    pub fn for_backend(backend: SqlBackend) -> Self {
        Self::new(backend.dialect(), DEFAULT_FILTER_MAX_DEPTH)
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn dialect(&self) -> &'static dyn SqlDialect {
        self.dialect
    }

    fn render(&self, node: &FilterNode, params: &mut SqlParams) -> Result<String, String> {
        match node {
            FilterNode::Logical { kind, children } => {
                if children.is_empty() {
                    return Err(format!("'{}' node has no children", kind));
                }
                let parts = children
                    .iter()
                    .map(|child| self.render(child, params))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(match kind {
                    LogicalKind::And => format!("({})", parts.join(" AND ")),
                    LogicalKind::Or => format!("({})", parts.join(" OR ")),
                    // A NULL child counts as no match
                    LogicalKind::Nor => format!("NOT COALESCE({}, FALSE)", parts.join(" OR ")),
                })
            }
            FilterNode::Field { field, operator } => self.render_field(field, operator, params),
        }
    }

    fn render_field(
        &self,
        field: &str,
        operator: &FieldOperator,
        params: &mut SqlParams,
    ) -> Result<String, String> {
        let col = self.dialect.quote_identifier(field);

        let sql = match operator {
            FieldOperator::Eq(Value::List(items)) => {
                if items.is_empty() {
                    return Ok("1=0".to_string());
                }
                format!("{} IN ({})", col, self.bind_all(items, params)?)
            }
            FieldOperator::Ne(Value::List(items)) => {
                if items.is_empty() {
                    return Ok("1=1".to_string());
                }
                format!(
                    "({} NOT IN ({}) OR {} IS NULL)",
                    col,
                    self.bind_all(items, params)?,
                    col
                )
            }
            FieldOperator::Eq(value) => format!("{} = {}", col, self.bind(value, params)?),
            FieldOperator::Ne(value) => {
                format!("({} <> {} OR {} IS NULL)", col, self.bind(value, params)?, col)
            }
            FieldOperator::Gt(value)
            | FieldOperator::Gte(value)
            | FieldOperator::Lt(value)
            | FieldOperator::Lte(value) => {
                if let Value::List(_) = value {
                    return Err(format!("range operator on '{}' has a list operand", field));
                }
                let op = match operator {
                    FieldOperator::Gt(_) => ">",
                    FieldOperator::Gte(_) => ">=",
                    FieldOperator::Lt(_) => "<",
                    _ => "<=",
                };
                format!("{} {} {}", col, op, self.bind(value, params)?)
            }
            FieldOperator::Exists(true) => format!("{} IS NOT NULL", col),
            FieldOperator::Exists(false) => format!("{} IS NULL", col),
            FieldOperator::Regex(pattern) => {
                let idx = params.push(SqlValue::String(self.dialect.regex_pattern(pattern)));
                self.dialect.regex_match(&col, idx)
            }
        };
        Ok(sql)
    }

    fn bind(&self, value: &Value, params: &mut SqlParams) -> Result<String, String> {
        let idx = params.push(sql_value(value)?);
        Ok(self.dialect.placeholder(idx))
    }

    fn bind_all(&self, items: &[Value], params: &mut SqlParams) -> Result<String, String> {
        let placeholders = items
            .iter()
            .map(|item| self.bind(item, params))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(placeholders.join(", "))
    }
}

impl QueryCompiler for SqlCompiler {
    type Output = SqlQuery;

    fn name(&self) -> &'static str {
        self.dialect.name()
    }

    fn compile(&self, node: &FilterNode) -> Result<SqlQuery, FilterError> {
        let name = self.name();
        ensure_depth(name, node, self.max_depth)?;

        let mut params = SqlParams::default();
        let clause = self
            .render(node, &mut params)
            .map_err(|message| internal_error(name, node, message))?;
        tracing::trace!(dialect = name, params = params.len(), "Compiled SQL filter");
        Ok(SqlQuery { clause, params })
    }
}

/// Bind representation of a value; temporal values and nested lists bind as
/// their string form
fn sql_value(value: &Value) -> Result<SqlValue, String> {
    match value {
        Value::Bool(b) => Ok(SqlValue::Bool(*b)),
        Value::Int(i) => Ok(SqlValue::Integer(*i)),
        Value::Float(f) if f.is_finite() => Ok(SqlValue::Float(*f)),
        Value::Float(f) => Err(format!("non-finite float {} cannot be bound", f)),
        Value::Str(s) | Value::Formula(s) => Ok(SqlValue::String(s.clone())),
        Value::Date(_) | Value::DateTime(_) | Value::List(_) => {
            match coerce(value.clone(), TargetKind::Str) {
                Ok(Value::Str(s)) => Ok(SqlValue::String(s)),
                Ok(other) => Err(format!("unexpected {} from string coercion", other.kind())),
                Err(e) => Err(e.to_string()),
            }
        }
    }
}
