//! Array builtins.

use super::FunctionContext;
use crate::engine::errors::RuntimeError;
use crate::value::Value;

pub(super) fn len(args: &[Value], _ctx: &dyn FunctionContext) -> Result<Value, RuntimeError> {
    match &args[0] {
        Value::List(items) => Ok(Value::Number(items.len() as f64)),
        Value::String(s) => Ok(Value::Number(s.chars().count() as f64)),
        _ => Ok(Value::Null),
    }
}

pub(super) fn first(args: &[Value], _ctx: &dyn FunctionContext) -> Result<Value, RuntimeError> {
    match &args[0] {
        Value::List(items) => Ok(items.first().cloned().unwrap_or(Value::Null)),
        _ => Ok(Value::Null),
    }
}

pub(super) fn last(args: &[Value], _ctx: &dyn FunctionContext) -> Result<Value, RuntimeError> {
    match &args[0] {
        Value::List(items) => Ok(items.last().cloned().unwrap_or(Value::Null)),
        _ => Ok(Value::Null),
    }
}

/// Null counts as empty: an absent list property and an empty one behave
/// the same in filters.
pub(super) fn is_empty(args: &[Value], _ctx: &dyn FunctionContext) -> Result<Value, RuntimeError> {
    match &args[0] {
        Value::List(items) => Ok(Value::Bool(items.is_empty())),
        Value::String(s) => Ok(Value::Bool(s.is_empty())),
        Value::Null => Ok(Value::Bool(true)),
        _ => Ok(Value::Bool(false)),
    }
}
