//! Runtime values for TQL expressions.
//!
//! `Value` is the tagged union every expression evaluates to. Node
//! properties arrive as `serde_json` maps from the host; leaves are
//! converted into `Value` on access, and non-leaf objects normalize to
//! `Null` (the canonical "absent").

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use std::fmt;

/// Property map handed over by the graph provider for one node.
pub type PropertyMap = serde_json::Map<String, JsonValue>;

/// A TQL runtime value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    /// Dates carry no timezone; the host's local wall clock is the frame.
    Date(NaiveDateTime),
    List(Vec<Value>),
}

impl Value {
    /// `false`, `null`, `0`, `""` and the empty list are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Date(_) => true,
            Value::List(items) => !items.is_empty(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Equality for `=` / `!=`: null only matches null, dates compare by
    /// instant, lists element-wise, everything else structurally.
    pub fn eq_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.eq_value(y))
            }
            (a, b) => a == b,
        }
    }

    /// Ordering for `< > <= >=` and for sort keys.
    ///
    /// Numbers compare numerically, strings and mixed types by code-point
    /// string order, dates by instant. Any null operand propagates as
    /// `None`.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => None,
            (Value::Number(a), Value::Number(b)) => Some(total_cmp(*a, *b)),
            (Value::String(a), Value::String(b)) => Some(a.as_str().cmp(b.as_str())),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            // Mixed types fall back to string comparison.
            (a, b) => Some(a.to_string().cmp(&b.to_string())),
        }
    }

    /// Convert a JSON property leaf into a `Value`. Objects are non-leaf
    /// and normalize to `Null`.
    pub fn from_json(json: &JsonValue) -> Value {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
            JsonValue::String(s) => Value::String(s.clone()),
            JsonValue::Array(items) => Value::List(items.iter().map(Value::from_json).collect()),
            JsonValue::Object(_) => Value::Null,
        }
    }

    /// Convert back to JSON for display projection and host serialization.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Date(d) => JsonValue::String(format_date(d)),
            Value::List(items) => JsonValue::Array(items.iter().map(Value::to_json).collect()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::List(_) => "list",
        }
    }
}

/// Resolve a dotted property path against a node's property map.
///
/// Each segment prefers a nested key; when the nested descent comes up
/// empty, the remaining path joined with `.` is tried as a flat key at the
/// current level. Anything that lands on a non-leaf object is `Null`.
pub fn resolve_path(props: &PropertyMap, segments: &[String]) -> Value {
    let Some(first) = segments.first() else {
        return Value::Null;
    };
    if let Some(json) = props.get(first.as_str()) {
        if segments.len() == 1 {
            return Value::from_json(json);
        }
        if let Some(inner) = json.as_object() {
            let nested = resolve_path(inner, &segments[1..]);
            if !nested.is_null() {
                return nested;
            }
        }
    }
    if segments.len() > 1 {
        if let Some(json) = props.get(&segments.join(".")) {
            return Value::from_json(json);
        }
    }
    Value::Null
}

/// f64 comparison that never panics and stays total (NaN sorts last).
fn total_cmp(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or_else(|| {
        if a.is_nan() && b.is_nan() {
            Ordering::Equal
        } else if a.is_nan() {
            Ordering::Greater
        } else {
            Ordering::Less
        }
    })
}

/// Integral numbers print without a trailing `.0` so string concat and
/// mixed-type comparison behave as users expect.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn format_date(d: &NaiveDateTime) -> String {
    d.format("%Y-%m-%dT%H:%M:%S").to_string()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{s}"),
            Value::Date(d) => write!(f, "{}", format_date(d)),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(Value::to_string).collect();
                write!(f, "{}", parts.join(", "))
            }
        }
    }
}
