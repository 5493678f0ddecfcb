//! Tests for filter parsing against the standard operator table

use super::*;
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::json;

fn parser_with(schema: FieldSchema) -> FilterParser<'static> {
    let registry = registry::global().unwrap();
    FilterParser::new(
        registry,
        ParseOptions {
            schema,
            ..ParseOptions::default()
        },
    )
}

fn parse(raw: serde_json::Value) -> Result<FilterNode, FilterError> {
    parse_filter(&raw)
}

// === Structure ===

#[test]
fn test_parsed_logical_nodes_have_children() {
    fn check(node: &FilterNode) {
        if let FilterNode::Logical { children, .. } = node {
            assert!(!children.is_empty());
            children.iter().for_each(check);
        }
    }

    let node = parse(json!({
        "@and": [
            {"@or": [{"a": 1}, {"b": {"@ne": 2}}]},
            {"@nor": [{"c": {"@exists": true}}]},
            {"d": {"@gte": 1, "@lte": 9}}
        ]
    }))
    .unwrap();
    check(&node);
    assert_eq!(node.depth(), 3);
}

#[test]
fn test_inventory_filter() {
    let node = parse(json!({
        "warehouse": "north",
        "@or": [
            {"qty": {"@lt": 5}},
            {"discontinued": {"@exists": false}}
        ],
        "name": {"@regex": "^bolt"}
    }))
    .unwrap();

    assert_eq!(
        node,
        FilterNode::and(vec![
            FilterNode::eq("warehouse", "north"),
            FilterNode::or(vec![
                FilterNode::field("qty", FieldOperator::Lt(Value::Int(5))),
                FilterNode::exists("discontinued", false),
            ]),
            FilterNode::regex("name", "^bolt"),
        ])
    );
}

#[test]
fn test_nested_sub_fields_mix_with_operators() {
    let node = parse(json!({"dims": {"@exists": true, "width": {"@gt": 2.5}}})).unwrap();
    assert_eq!(
        node,
        FilterNode::and(vec![
            FilterNode::exists("dims", true),
            FilterNode::field("dims.width", FieldOperator::Gt(Value::Float(2.5))),
        ])
    );
}

// === Errors ===

#[test]
fn test_unknown_operator_in_operator_map() {
    let err = parse(json!({"qty": {"@bogus": 1}})).unwrap_err();
    assert_eq!(
        err,
        FilterError::Validation(ValidationError::UnknownOperator {
            key: "@bogus".into(),
            path: FieldPath::from("qty"),
        })
    );
    assert_eq!(err.to_string(), "unknown operator '@bogus' at qty");
}

#[test]
fn test_empty_logical_children_nested() {
    let err = parse(json!({"@or": [{"@and": []}]})).unwrap_err();
    assert_eq!(err.code(), "EMPTY_LOGICAL_CHILDREN");
    assert_eq!(err.path(), Some(&FieldPath::root().child("@or[0]")));
}

#[test]
fn test_integer_beyond_i64_is_rejected() {
    let err = parse(json!({"sku_id": {"@gte": u64::MAX}})).unwrap_err();
    assert_eq!(
        err,
        FilterError::Validation(ValidationError::MalformedShape {
            path: FieldPath::from("sku_id"),
            reason: "number is out of range".into(),
        })
    );
}

#[test]
fn test_over_deep_input() {
    let mut raw = json!({"a": 1});
    for _ in 0..ParseOptions::default().max_depth {
        raw = json!({"@and": [raw]});
    }
    let err = parse(raw).unwrap_err();
    assert!(matches!(
        err,
        FilterError::Validation(ValidationError::MaxDepthExceeded { .. })
    ));
}

// === Schema ===

#[test]
fn test_schema_temporal_fields() {
    let parser = parser_with(
        FieldSchema::new()
            .with("received_on", TargetKind::Date)
            .with("updated_at", TargetKind::DateTime),
    );

    let node = parser
        .parse(&json!({
            "received_on": "2024-02-29",
            "updated_at": {"@gt": 1704067200}
        }))
        .unwrap();

    assert_eq!(
        node,
        FilterNode::and(vec![
            FilterNode::eq("received_on", NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()),
            FilterNode::field(
                "updated_at",
                FieldOperator::Gt(Value::DateTime(
                    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                )),
            ),
        ])
    );
}

#[test]
fn test_schema_conversion_error_reports_kinds() {
    let parser = parser_with(FieldSchema::new().with("active", TargetKind::Bool));
    assert_eq!(
        parser.parse(&json!({"active": {"@eq": [1, "false"]}})).unwrap(),
        FilterNode::eq("active", vec![Value::Bool(true), Value::Bool(false)])
    );

    let err = parser.parse(&json!({"active": {"@eq": [[true]]}})).unwrap_err();
    assert_eq!(
        err,
        FilterError::Conversion {
            path: FieldPath::from("active"),
            error: ConversionError::new(ValueKind::List, TargetKind::Bool),
        }
    );
}

#[test]
fn test_schema_sequence_keeps_lists() {
    let parser = parser_with(FieldSchema::new().with("tags", TargetKind::Sequence));
    let node = parser.parse(&json!({"tags": "[\"a\"]"})).unwrap();
    assert_eq!(node, FilterNode::eq("tags", vec![Value::from("a")]));
}
