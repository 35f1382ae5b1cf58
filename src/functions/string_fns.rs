//! String builtins.
//!
//! All of these are tolerant: a non-string input yields `Null` rather than
//! failing the query. Only an invalid regular expression aborts.

use super::FunctionContext;
use crate::engine::errors::RuntimeError;
use crate::value::Value;

fn as_str(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s),
        _ => None,
    }
}

pub(super) fn contains(args: &[Value], _ctx: &dyn FunctionContext) -> Result<Value, RuntimeError> {
    match (as_str(&args[0]), as_str(&args[1])) {
        (Some(haystack), Some(needle)) => Ok(Value::Bool(haystack.contains(needle))),
        _ => Ok(Value::Null),
    }
}

pub(super) fn starts_with(
    args: &[Value],
    _ctx: &dyn FunctionContext,
) -> Result<Value, RuntimeError> {
    match (as_str(&args[0]), as_str(&args[1])) {
        (Some(s), Some(prefix)) => Ok(Value::Bool(s.starts_with(prefix))),
        _ => Ok(Value::Null),
    }
}

pub(super) fn ends_with(args: &[Value], _ctx: &dyn FunctionContext) -> Result<Value, RuntimeError> {
    match (as_str(&args[0]), as_str(&args[1])) {
        (Some(s), Some(suffix)) => Ok(Value::Bool(s.ends_with(suffix))),
        _ => Ok(Value::Null),
    }
}

pub(super) fn length(args: &[Value], _ctx: &dyn FunctionContext) -> Result<Value, RuntimeError> {
    match as_str(&args[0]) {
        Some(s) => Ok(Value::Number(s.chars().count() as f64)),
        None => Ok(Value::Null),
    }
}

pub(super) fn lower(args: &[Value], _ctx: &dyn FunctionContext) -> Result<Value, RuntimeError> {
    match as_str(&args[0]) {
        Some(s) => Ok(Value::String(s.to_lowercase())),
        None => Ok(Value::Null),
    }
}

pub(super) fn upper(args: &[Value], _ctx: &dyn FunctionContext) -> Result<Value, RuntimeError> {
    match as_str(&args[0]) {
        Some(s) => Ok(Value::String(s.to_uppercase())),
        None => Ok(Value::Null),
    }
}

pub(super) fn trim(args: &[Value], _ctx: &dyn FunctionContext) -> Result<Value, RuntimeError> {
    match as_str(&args[0]) {
        Some(s) => Ok(Value::String(s.trim().to_string())),
        None => Ok(Value::Null),
    }
}

pub(super) fn split(args: &[Value], _ctx: &dyn FunctionContext) -> Result<Value, RuntimeError> {
    match (as_str(&args[0]), as_str(&args[1])) {
        (Some(s), Some(sep)) if !sep.is_empty() => Ok(Value::List(
            s.split(sep).map(|part| Value::String(part.to_string())).collect(),
        )),
        _ => Ok(Value::Null),
    }
}

/// `matches(s, pattern, flags?)` — regex match. Supported flags: `i`
/// (case-insensitive), `m` (multi-line), `s` (dot matches newline).
pub(super) fn matches(args: &[Value], _ctx: &dyn FunctionContext) -> Result<Value, RuntimeError> {
    let (Some(s), Some(pattern)) = (as_str(&args[0]), as_str(&args[1])) else {
        return Ok(Value::Null);
    };
    let flags = args.get(2).and_then(as_str).unwrap_or("");
    let full_pattern = if flags.is_empty() {
        pattern.to_string()
    } else {
        format!("(?{flags}){pattern}")
    };
    let regex = regex::Regex::new(&full_pattern).map_err(|e| RuntimeError::InvalidPattern {
        pattern: pattern.to_string(),
        error: e.to_string(),
    })?;
    Ok(Value::Bool(regex.is_match(s)))
}
