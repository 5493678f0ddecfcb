//! Value coercion
//!
//! Converts filter values between representations. Every (source, target)
//! pair is either defined below or fails with [`ConversionError`]; nothing is
//! truncated or guessed.

use std::fmt;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Number, Value as JsonValue};

use super::error::ConversionError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Largest integer magnitude an f64 represents exactly
const MAX_EXACT_FLOAT_INT: u64 = 1 << 53;

/// A filter value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    /// Spreadsheet-style formula text, always starting with `=`
    Formula(String),
}

/// Kind of a value, reported as the source of a failed conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Str,
    List,
    Date,
    DateTime,
    Formula,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Str => "str",
            ValueKind::List => "list",
            ValueKind::Date => "date",
            ValueKind::DateTime => "datetime",
            ValueKind::Formula => "formula",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Representation requested from [`coerce`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Int,
    Str,
    Bool,
    Float,
    List,
    Sequence,
    Date,
    DateTime,
    Formula,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Int => "int",
            TargetKind::Str => "str",
            TargetKind::Bool => "bool",
            TargetKind::Float => "float",
            TargetKind::List => "list",
            TargetKind::Sequence => "sequence",
            TargetKind::Date => "date",
            TargetKind::DateTime => "datetime",
            TargetKind::Formula => "formula",
        }
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, TargetKind::List | TargetKind::Sequence)
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::Str,
            Value::List(_) => ValueKind::List,
            Value::Date(_) => ValueKind::Date,
            Value::DateTime(_) => ValueKind::DateTime,
            Value::Formula(_) => ValueKind::Formula,
        }
    }

    /// Convert a raw JSON filter value
    ///
    /// Returns the rejection reason for shapes that cannot be filter values
    /// (null, mappings, out-of-range numbers).
    pub fn from_json(json: &JsonValue) -> Result<Self, &'static str> {
        match json {
            JsonValue::Bool(b) => Ok(Value::Bool(*b)),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Ok(Value::Int(i)),
                None if n.is_u64() => Err("number is out of range"),
                None => n
                    .as_f64()
                    .filter(|f| f.is_finite())
                    .map(Value::Float)
                    .ok_or("number is out of range"),
            },
            JsonValue::String(s) => Ok(Value::Str(s.clone())),
            JsonValue::Array(items) => items
                .iter()
                .map(|item| {
                    if item.is_object() {
                        Err("lists cannot contain mappings")
                    } else {
                        Value::from_json(item)
                    }
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            JsonValue::Null => Err("null is not a valid filter value"),
            JsonValue::Object(_) => Err("a mapping is not a valid filter value"),
        }
    }

    /// JSON form of the value; `None` for non-finite floats
    ///
    /// Dates and datetimes render as their `str` coercion.
    pub fn to_json(&self) -> Option<JsonValue> {
        match self {
            Value::Bool(b) => Some(JsonValue::Bool(*b)),
            Value::Int(i) => Some(JsonValue::Number(Number::from(*i))),
            Value::Float(f) => Number::from_f64(*f).map(JsonValue::Number),
            Value::Str(s) | Value::Formula(s) => Some(JsonValue::String(s.clone())),
            Value::List(items) => items
                .iter()
                .map(Value::to_json)
                .collect::<Option<Vec<_>>>()
                .map(JsonValue::Array),
            Value::Date(d) => Some(JsonValue::String(format_date(d))),
            Value::DateTime(dt) => Some(JsonValue::String(format_datetime(dt))),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::DateTime(value)
    }
}

fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn date_to_datetime(date: &NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc())
}

fn float_to_datetime(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    if whole < i64::MIN as f64 || whole >= i64::MAX as f64 {
        return None;
    }
    let nanos = (((secs - whole) * 1e9).round() as u32).min(999_999_999);
    DateTime::from_timestamp(whole as i64, nanos)
}

fn datetime_to_float(dt: &DateTime<Utc>) -> f64 {
    dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_nanos()) / 1e9
}

fn float_to_int(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn quote_formula_text(s: &str) -> String {
    format!("=\"{}\"", s.replace('"', "\"\""))
}

fn parse_json_list(s: &str) -> Option<Value> {
    match serde_json::from_str::<JsonValue>(s) {
        Ok(json @ JsonValue::Array(_)) => Value::from_json(&json).ok(),
        _ => None,
    }
}

/// Convert `value` into the `target` representation
pub fn coerce(value: Value, target: TargetKind) -> Result<Value, ConversionError> {
    let source = value.kind();
    let fail = move || ConversionError::new(source, target);

    match (value, target) {
        (Value::Bool(b), TargetKind::Bool) => Ok(Value::Bool(b)),
        (Value::Bool(b), TargetKind::Int) => Ok(Value::Int(i64::from(b))),
        (Value::Bool(b), TargetKind::Float) => Ok(Value::Float(if b { 1.0 } else { 0.0 })),
        (Value::Bool(b), TargetKind::Str) => Ok(Value::Str(b.to_string())),

        (Value::Int(i), TargetKind::Int) => Ok(Value::Int(i)),
        (Value::Int(i), TargetKind::Str) => Ok(Value::Str(i.to_string())),
        (Value::Int(i), TargetKind::Float) if i.unsigned_abs() <= MAX_EXACT_FLOAT_INT => {
            Ok(Value::Float(i as f64))
        }
        (Value::Int(0), TargetKind::Bool) => Ok(Value::Bool(false)),
        (Value::Int(1), TargetKind::Bool) => Ok(Value::Bool(true)),
        (Value::Int(i), TargetKind::DateTime) => DateTime::from_timestamp(i, 0)
            .map(Value::DateTime)
            .ok_or_else(fail),
        (Value::Int(i), TargetKind::Date) => DateTime::from_timestamp(i, 0)
            .map(|dt| Value::Date(dt.date_naive()))
            .ok_or_else(fail),
        (Value::Int(i), TargetKind::Formula) => Ok(Value::Formula(format!("={}", i))),

        (Value::Float(f), _) if !f.is_finite() => Err(fail()),
        (Value::Float(f), TargetKind::Float) => Ok(Value::Float(f)),
        (Value::Float(f), TargetKind::Int) => float_to_int(f).map(Value::Int).ok_or_else(fail),
        (Value::Float(f), TargetKind::Str) => Ok(Value::Str(f.to_string())),
        (Value::Float(f), TargetKind::DateTime) => {
            float_to_datetime(f).map(Value::DateTime).ok_or_else(fail)
        }
        (Value::Float(f), TargetKind::Formula) => Ok(Value::Formula(format!("={}", f))),

        (Value::Str(s), TargetKind::Str) => Ok(Value::Str(s)),
        (Value::Str(s), TargetKind::Int) => s.trim().parse().map(Value::Int).map_err(|_| fail()),
        (Value::Str(s), TargetKind::Float) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Value::Float)
            .ok_or_else(fail),
        (Value::Str(s), TargetKind::Bool) => match s.trim() {
            t if t.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
            t if t.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
            _ => Err(fail()),
        },
        (Value::Str(s), TargetKind::Date) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .map(Value::Date)
            .map_err(|_| fail()),
        (Value::Str(s), TargetKind::DateTime) => DateTime::parse_from_rfc3339(s.trim())
            .map(|dt| Value::DateTime(dt.with_timezone(&Utc)))
            .map_err(|_| fail()),
        (Value::Str(s), TargetKind::List | TargetKind::Sequence) => {
            parse_json_list(&s).ok_or_else(fail)
        }
        (Value::Str(s), TargetKind::Formula) => Ok(Value::Formula(quote_formula_text(&s))),

        (Value::List(items), TargetKind::List | TargetKind::Sequence) => Ok(Value::List(items)),
        (Value::List(items), TargetKind::Str) => Value::List(items)
            .to_json()
            .map(|json| Value::Str(json.to_string()))
            .ok_or_else(fail),

        (Value::Date(d), TargetKind::Date) => Ok(Value::Date(d)),
        (Value::Date(d), TargetKind::Str) => Ok(Value::Str(format_date(&d))),
        (Value::Date(d), TargetKind::DateTime) => {
            date_to_datetime(&d).map(Value::DateTime).ok_or_else(fail)
        }
        (Value::Date(d), TargetKind::Int) => date_to_datetime(&d)
            .map(|dt| Value::Int(dt.timestamp()))
            .ok_or_else(fail),
        (Value::Date(d), TargetKind::Float) => date_to_datetime(&d)
            .map(|dt| Value::Float(dt.timestamp() as f64))
            .ok_or_else(fail),

        (Value::DateTime(dt), TargetKind::DateTime) => Ok(Value::DateTime(dt)),
        (Value::DateTime(dt), TargetKind::Int) => Ok(Value::Int(dt.timestamp())),
        (Value::DateTime(dt), TargetKind::Str) => Ok(Value::Str(format_datetime(&dt))),
        (Value::DateTime(dt), TargetKind::Float) => Ok(Value::Float(datetime_to_float(&dt))),
        (Value::DateTime(dt), TargetKind::Date) => Ok(Value::Date(dt.date_naive())),

        (Value::Formula(text), TargetKind::Formula) => Ok(Value::Formula(text)),
        (Value::Formula(text), TargetKind::Str) => Ok(Value::Str(text)),

        _ => Err(fail()),
    }
}

/// Like [`coerce`], but converts list elements individually unless the
/// target is itself a sequence
pub fn coerce_each(value: Value, target: TargetKind) -> Result<Value, ConversionError> {
    match value {
        Value::List(items) if !target.is_sequence() => items
            .into_iter()
            .map(|item| coerce(item, target))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        other => coerce(other, target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn datetime(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn assert_fails(value: Value, target: TargetKind) {
        let source = value.kind();
        assert_eq!(
            coerce(value, target),
            Err(ConversionError::new(source, target)),
            "{} -> {} should fail",
            source,
            target
        );
    }

    #[test]
    fn bool_conversions() {
        assert_eq!(coerce(Value::Bool(true), TargetKind::Int), Ok(Value::Int(1)));
        assert_eq!(coerce(Value::Bool(false), TargetKind::Int), Ok(Value::Int(0)));
        assert_eq!(
            coerce(Value::Bool(true), TargetKind::Float),
            Ok(Value::Float(1.0))
        );
        assert_eq!(
            coerce(Value::Bool(false), TargetKind::Str),
            Ok(Value::Str("false".into()))
        );

        for target in [
            TargetKind::List,
            TargetKind::Sequence,
            TargetKind::DateTime,
            TargetKind::Date,
            TargetKind::Formula,
        ] {
            assert_fails(Value::Bool(true), target);
        }
    }

    #[test]
    fn list_conversions() {
        let list = Value::List(vec![Value::Int(1), Value::Str("a".into())]);
        assert_eq!(
            coerce(list.clone(), TargetKind::Str),
            Ok(Value::Str(r#"[1,"a"]"#.into()))
        );
        assert_eq!(coerce(list.clone(), TargetKind::List), Ok(list.clone()));
        assert_eq!(coerce(list.clone(), TargetKind::Sequence), Ok(list.clone()));

        for target in [
            TargetKind::Int,
            TargetKind::Bool,
            TargetKind::Float,
            TargetKind::Date,
            TargetKind::DateTime,
            TargetKind::Formula,
        ] {
            assert_fails(list.clone(), target);
        }
    }

    #[test]
    fn list_to_bool_reports_kinds() {
        let err = coerce(Value::List(vec![]), TargetKind::Bool).unwrap_err();
        assert_eq!(err.source_kind, ValueKind::List);
        assert_eq!(err.target_kind, TargetKind::Bool);
        assert_eq!(err.to_string(), "cannot convert list to bool");
    }

    #[test]
    fn datetime_conversions() {
        let dt = datetime(2024, 1, 1, 12, 30, 0);
        assert_eq!(
            coerce(Value::DateTime(dt), TargetKind::Int),
            Ok(Value::Int(1704112200))
        );
        assert_eq!(
            coerce(Value::DateTime(dt), TargetKind::Float),
            Ok(Value::Float(1704112200.0))
        );
        assert_eq!(
            coerce(Value::DateTime(dt), TargetKind::Str),
            Ok(Value::Str("2024-01-01T12:30:00Z".into()))
        );
        assert_eq!(
            coerce(Value::DateTime(dt), TargetKind::Date),
            Ok(Value::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()))
        );

        for target in [
            TargetKind::Bool,
            TargetKind::List,
            TargetKind::Sequence,
            TargetKind::Formula,
        ] {
            assert_fails(Value::DateTime(dt), target);
        }
    }

    #[test]
    fn date_conversions() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(
            coerce(Value::Date(date), TargetKind::Str),
            Ok(Value::Str("2024-01-01".into()))
        );
        assert_eq!(
            coerce(Value::Date(date), TargetKind::DateTime),
            Ok(Value::DateTime(datetime(2024, 1, 1, 0, 0, 0)))
        );
        assert_eq!(
            coerce(Value::Date(date), TargetKind::Int),
            Ok(Value::Int(1704067200))
        );
        assert_fails(Value::Date(date), TargetKind::Bool);
        assert_fails(Value::Date(date), TargetKind::Formula);
    }

    #[test]
    fn string_parsing() {
        assert_eq!(
            coerce(Value::Str(" 42 ".into()), TargetKind::Int),
            Ok(Value::Int(42))
        );
        assert_eq!(
            coerce(Value::Str("2.5".into()), TargetKind::Float),
            Ok(Value::Float(2.5))
        );
        assert_eq!(
            coerce(Value::Str("TRUE".into()), TargetKind::Bool),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            coerce(Value::Str("2024-03-05".into()), TargetKind::Date),
            Ok(Value::Date(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()))
        );
        assert_eq!(
            coerce(Value::Str("2024-01-01T13:30:00+01:00".into()), TargetKind::DateTime),
            Ok(Value::DateTime(datetime(2024, 1, 1, 12, 30, 0)))
        );
        assert_eq!(
            coerce(Value::Str("[1, 2]".into()), TargetKind::Sequence),
            Ok(Value::List(vec![Value::Int(1), Value::Int(2)]))
        );

        assert_fails(Value::Str("forty".into()), TargetKind::Int);
        assert_fails(Value::Str("NaN".into()), TargetKind::Float);
        assert_fails(Value::Str("yes".into()), TargetKind::Bool);
        assert_fails(Value::Str("01/02/2024".into()), TargetKind::Date);
        assert_fails(Value::Str("{\"a\": 1}".into()), TargetKind::List);
    }

    #[test]
    fn numeric_conversions_never_truncate() {
        assert_eq!(coerce(Value::Float(3.0), TargetKind::Int), Ok(Value::Int(3)));
        assert_fails(Value::Float(3.5), TargetKind::Int);
        assert_fails(Value::Float(1e30), TargetKind::Int);
        assert_fails(Value::Float(f64::NAN), TargetKind::Str);
        assert_fails(Value::Int(i64::MAX), TargetKind::Float);
        assert_fails(Value::Int(2), TargetKind::Bool);
        assert_fails(Value::Float(1.0), TargetKind::Bool);

        assert_eq!(coerce(Value::Int(1), TargetKind::Bool), Ok(Value::Bool(true)));
        assert_eq!(coerce(Value::Int(7), TargetKind::Float), Ok(Value::Float(7.0)));
    }

    #[test]
    fn epoch_numbers_to_temporal() {
        assert_eq!(
            coerce(Value::Int(1704067200), TargetKind::DateTime),
            Ok(Value::DateTime(datetime(2024, 1, 1, 0, 0, 0)))
        );
        assert_eq!(
            coerce(Value::Int(1704067200), TargetKind::Date),
            Ok(Value::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()))
        );

        let Ok(Value::DateTime(dt)) = coerce(Value::Float(1.5), TargetKind::DateTime) else {
            panic!("expected datetime");
        };
        assert_eq!(dt.timestamp(), 1);
        assert_eq!(dt.timestamp_subsec_nanos(), 500_000_000);
    }

    #[test]
    fn formula_conversions() {
        assert_eq!(
            coerce(Value::Int(5), TargetKind::Formula),
            Ok(Value::Formula("=5".into()))
        );
        assert_eq!(
            coerce(Value::Str("say \"hi\"".into()), TargetKind::Formula),
            Ok(Value::Formula("=\"say \"\"hi\"\"\"".into()))
        );
        assert_eq!(
            coerce(Value::Formula("=5".into()), TargetKind::Str),
            Ok(Value::Str("=5".into()))
        );
        assert_fails(Value::Formula("=5".into()), TargetKind::Int);
    }

    #[test]
    fn coerce_each_converts_elements() {
        let list = Value::List(vec![Value::Str("1".into()), Value::Str("2".into())]);
        assert_eq!(
            coerce_each(list.clone(), TargetKind::Int),
            Ok(Value::List(vec![Value::Int(1), Value::Int(2)]))
        );
        assert_eq!(coerce_each(list.clone(), TargetKind::List), Ok(list));
        assert_eq!(
            coerce_each(Value::Str("3".into()), TargetKind::Int),
            Ok(Value::Int(3))
        );
    }

    #[test]
    fn from_json_shapes() {
        assert_eq!(Value::from_json(&json!(1)), Ok(Value::Int(1)));
        assert_eq!(Value::from_json(&json!(1.5)), Ok(Value::Float(1.5)));
        assert_eq!(
            Value::from_json(&json!(["a", true])),
            Ok(Value::List(vec![Value::Str("a".into()), Value::Bool(true)]))
        );
        assert!(Value::from_json(&json!(null)).is_err());
        assert!(Value::from_json(&json!({"a": 1})).is_err());
        assert!(Value::from_json(&json!([{"a": 1}])).is_err());
    }

    #[test]
    fn from_json_rejects_integers_beyond_i64() {
        assert_eq!(
            Value::from_json(&json!(i64::MAX)),
            Ok(Value::Int(i64::MAX))
        );
        assert_eq!(
            Value::from_json(&json!(u64::MAX)),
            Err("number is out of range")
        );
        assert_eq!(
            Value::from_json(&json!([1, 9_223_372_036_854_775_808u64])),
            Err("number is out of range")
        );
    }

    #[test]
    fn to_json_renders_temporal_as_strings() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(Value::Date(date).to_json(), Some(json!("2024-01-02")));
        assert_eq!(
            Value::DateTime(datetime(2024, 1, 2, 3, 4, 5)).to_json(),
            Some(json!("2024-01-02T03:04:05Z"))
        );
        assert_eq!(Value::Float(f64::INFINITY).to_json(), None);
    }
}
