//! Elasticsearch Query DSL compiler
//!
//! Leaf operators map to `term`, `range`, `exists` and `regexp` queries.
//! Logical nodes become `bool` clause maps (`must`, `should`, `must_not`);
//! a logical child is wrapped as `{"bool": <clause-map>}` inside its parent's
//! list while leaf queries are inserted as-is.

use serde_json::{Value as JsonValue, json};

use crate::core::constants::DEFAULT_FILTER_MAX_DEPTH;
use crate::domain::filters::{FieldOperator, FilterError, FilterNode, LogicalKind, Value};

use super::{QueryCompiler, ensure_depth, internal_error};

const NAME: &str = "elasticsearch";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElasticsearchCompiler {
    max_depth: usize,
}

impl Default for ElasticsearchCompiler {
    fn default() -> Self {
        Self::new(DEFAULT_FILTER_MAX_DEPTH)
    }
}

impl ElasticsearchCompiler {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Compile into a complete query object
    ///
    /// A logical root's clause map is wrapped in `bool`; leaf queries are
    /// already complete.
    pub fn compile_query(&self, node: &FilterNode) -> Result<JsonValue, FilterError> {
        let compiled = self.compile(node)?;
        if node.is_logical() {
            Ok(json!({ "bool": compiled }))
        } else {
            Ok(compiled)
        }
    }

    fn render(&self, node: &FilterNode) -> Result<JsonValue, String> {
        match node {
            FilterNode::Logical { kind, children } => {
                if children.is_empty() {
                    return Err(format!("'{}' node has no children", kind));
                }
                let clauses = children
                    .iter()
                    .map(|child| self.render_child(child))
                    .collect::<Result<Vec<_>, _>>()?;
                let key = clause_key(*kind);
                Ok(json!({ key: clauses }))
            }
            FilterNode::Field { field, operator } => render_field(field, operator),
        }
    }

    fn render_child(&self, node: &FilterNode) -> Result<JsonValue, String> {
        let rendered = self.render(node)?;
        if node.is_logical() {
            Ok(json!({ "bool": rendered }))
        } else {
            Ok(rendered)
        }
    }
}

impl QueryCompiler for ElasticsearchCompiler {
    type Output = JsonValue;

    fn name(&self) -> &'static str {
        NAME
    }

    /// Compile to Query DSL; a logical root yields its bare clause map
    fn compile(&self, node: &FilterNode) -> Result<JsonValue, FilterError> {
        ensure_depth(NAME, node, self.max_depth)?;
        let compiled = self
            .render(node)
            .map_err(|message| internal_error(NAME, node, message))?;
        tracing::trace!(depth = node.depth(), "Compiled Elasticsearch query");
        Ok(compiled)
    }
}

fn clause_key(kind: LogicalKind) -> &'static str {
    match kind {
        LogicalKind::And => "must",
        LogicalKind::Or => "should",
        LogicalKind::Nor => "must_not",
    }
}

fn render_field(field: &str, operator: &FieldOperator) -> Result<JsonValue, String> {
    let query = match operator {
        FieldOperator::Eq(value) => term(field, value)?,
        FieldOperator::Ne(value) => json!({ "bool": { "must_not": [term(field, value)?] } }),
        FieldOperator::Gt(value)
        | FieldOperator::Gte(value)
        | FieldOperator::Lt(value)
        | FieldOperator::Lte(value) => {
            let op = operator.name();
            json!({ "range": { field: { op: render_value(value)? } } })
        }
        FieldOperator::Exists(true) => json!({ "exists": { "field": field } }),
        FieldOperator::Exists(false) => {
            json!({ "bool": { "must_not": { "exists": { "field": field } } } })
        }
        FieldOperator::Regex(pattern) => json!({
            "regexp": { field: { "value": pattern, "case_insensitive": true } }
        }),
    };
    Ok(query)
}

fn term(field: &str, value: &Value) -> Result<JsonValue, String> {
    Ok(json!({ "term": { field: render_value(value)? } }))
}

fn render_value(value: &Value) -> Result<JsonValue, String> {
    value
        .to_json()
        .ok_or_else(|| format!("value {:?} has no JSON representation", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn compile(node: &FilterNode) -> JsonValue {
        ElasticsearchCompiler::default().compile(node).unwrap()
    }

    #[test]
    fn leaf_operators() {
        assert_eq!(
            compile(&FilterNode::eq("sku", "A-1")),
            json!({"term": {"sku": "A-1"}})
        );
        assert_eq!(
            compile(&FilterNode::field("qty", FieldOperator::Ne(Value::Int(0)))),
            json!({"bool": {"must_not": [{"term": {"qty": 0}}]}})
        );
        assert_eq!(
            compile(&FilterNode::field("qty", FieldOperator::Lte(Value::Float(2.5)))),
            json!({"range": {"qty": {"lte": 2.5}}})
        );
        assert_eq!(
            compile(&FilterNode::exists("k", true)),
            json!({"exists": {"field": "k"}})
        );
        assert_eq!(
            compile(&FilterNode::exists("k", false)),
            json!({"bool": {"must_not": {"exists": {"field": "k"}}}})
        );
        assert_eq!(
            compile(&FilterNode::regex("name", "^foo")),
            json!({"regexp": {"name": {"value": "^foo", "case_insensitive": true}}})
        );
    }

    #[test]
    fn logical_nodes() {
        let and = FilterNode::and(vec![FilterNode::eq("a", 1), FilterNode::eq("b", 2)]);
        assert_eq!(
            compile(&and),
            json!({"must": [{"term": {"a": 1}}, {"term": {"b": 2}}]})
        );

        let or = FilterNode::or(vec![
            FilterNode::and(vec![FilterNode::eq("a", 1)]),
            FilterNode::eq("b", 2),
        ]);
        assert_eq!(
            compile(&or),
            json!({"should": [{"bool": {"must": [{"term": {"a": 1}}]}}, {"term": {"b": 2}}]})
        );

        let nor = FilterNode::nor(vec![FilterNode::eq("a", 1), FilterNode::eq("b", 2)]);
        assert_eq!(
            compile(&nor),
            json!({"must_not": [{"term": {"a": 1}}, {"term": {"b": 2}}]})
        );
    }

    #[test]
    fn temporal_values_render_as_strings() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(
            compile(&FilterNode::field("received", FieldOperator::Gte(Value::Date(date)))),
            json!({"range": {"received": {"gte": "2024-05-01"}}})
        );
    }

    #[test]
    fn compile_query_wraps_logical_root() {
        let compiler = ElasticsearchCompiler::default();
        let node = FilterNode::or(vec![FilterNode::eq("a", 1)]);
        assert_eq!(
            compiler.compile_query(&node).unwrap(),
            json!({"bool": {"should": [{"term": {"a": 1}}]}})
        );
        assert_eq!(
            compiler.compile_query(&FilterNode::eq("a", 1)).unwrap(),
            json!({"term": {"a": 1}})
        );
    }

    #[test]
    fn unrenderable_trees_are_internal_errors() {
        let compiler = ElasticsearchCompiler::default();

        let empty = FilterNode::and(vec![FilterNode::or(vec![])]);
        let err = compiler.compile(&empty).unwrap_err();
        assert_eq!(err.code(), "INTERNAL_ERROR");
        assert!(!err.is_client_error());

        let nan = FilterNode::eq("a", f64::NAN);
        assert_eq!(compiler.compile(&nan).unwrap_err().code(), "INTERNAL_ERROR");

        let shallow = ElasticsearchCompiler::new(1);
        let nested = FilterNode::and(vec![FilterNode::eq("a", 1)]);
        assert_eq!(shallow.compile(&nested).unwrap_err().code(), "INTERNAL_ERROR");
    }
}
