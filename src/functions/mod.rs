//! Builtin function registry.
//!
//! A single static table maps function names to their arity bounds and
//! implementation. The validator checks names and arities against this
//! table; the evaluator dispatches through it at runtime with a
//! [`FunctionContext`] giving builtins access to the current file and the
//! host's metadata.

pub mod date_fns;
pub mod file_fns;
pub mod list_fns;
pub mod string_fns;

use crate::engine::context::FileMetadata;
use crate::engine::errors::RuntimeError;
use crate::value::{resolve_path, PropertyMap, Value};
use std::collections::HashMap;

/// What a builtin can see while it runs.
pub trait FunctionContext {
    /// Path of the file the expression is being evaluated against.
    fn file_path(&self) -> String;
    fn properties(&self, path: &str) -> PropertyMap;
    fn file_metadata(&self, path: &str) -> Option<FileMetadata>;
}

pub type BuiltinFn = fn(&[Value], &dyn FunctionContext) -> Result<Value, RuntimeError>;

/// Registry entry: arity bounds plus the implementation.
#[derive(Clone)]
pub struct Builtin {
    pub name: &'static str,
    pub min_args: usize,
    pub max_args: usize,
    pub call: BuiltinFn,
}

/// Look up a builtin by name. Unknown names are a validation error (or a
/// runtime error when validation was skipped).
pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.get(name)
}

/// All registered builtin names, for diagnostics.
pub fn builtin_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = BUILTINS.keys().copied().collect();
    names.sort_unstable();
    names
}

macro_rules! builtin {
    ($map:expr, $name:literal, $min:expr, $max:expr, $func:expr) => {
        $map.insert(
            $name,
            Builtin {
                name: $name,
                min_args: $min,
                max_args: $max,
                call: $func,
            },
        );
    };
}

lazy_static::lazy_static! {
    static ref BUILTINS: HashMap<&'static str, Builtin> = {
        let mut m = HashMap::new();

        // ===== EXISTENCE =====
        builtin!(m, "prop", 1, 1, prop);
        builtin!(m, "exists", 1, 1, exists);
        builtin!(m, "coalesce", 1, usize::MAX, coalesce);
        builtin!(m, "ifnull", 2, 2, ifnull);

        // ===== STRING =====
        builtin!(m, "contains", 2, 2, string_fns::contains);
        builtin!(m, "startsWith", 2, 2, string_fns::starts_with);
        builtin!(m, "endsWith", 2, 2, string_fns::ends_with);
        builtin!(m, "length", 1, 1, string_fns::length);
        builtin!(m, "lower", 1, 1, string_fns::lower);
        builtin!(m, "upper", 1, 1, string_fns::upper);
        builtin!(m, "trim", 1, 1, string_fns::trim);
        builtin!(m, "split", 2, 2, string_fns::split);
        builtin!(m, "matches", 2, 3, string_fns::matches);

        // ===== ARRAY =====
        builtin!(m, "len", 1, 1, list_fns::len);
        builtin!(m, "first", 1, 1, list_fns::first);
        builtin!(m, "last", 1, 1, list_fns::last);
        builtin!(m, "isEmpty", 1, 1, list_fns::is_empty);

        // ===== DATE =====
        builtin!(m, "now", 0, 0, date_fns::now);
        builtin!(m, "date", 0, 1, date_fns::date);
        builtin!(m, "year", 1, 1, date_fns::year);
        builtin!(m, "month", 1, 1, date_fns::month);
        builtin!(m, "day", 1, 1, date_fns::day);
        builtin!(m, "weekday", 1, 1, date_fns::weekday);
        builtin!(m, "hours", 1, 1, date_fns::hours);
        builtin!(m, "minutes", 1, 1, date_fns::minutes);
        builtin!(m, "format", 2, 2, date_fns::format);
        builtin!(m, "dateDiff", 2, 3, date_fns::date_diff);

        // ===== FILE =====
        builtin!(m, "inFolder", 1, 1, file_fns::in_folder);
        builtin!(m, "hasExtension", 1, 1, file_fns::has_extension);
        builtin!(m, "hasTag", 1, 1, file_fns::has_tag);
        builtin!(m, "tags", 0, 0, file_fns::tags);
        builtin!(m, "hasLink", 1, 1, file_fns::has_link);
        builtin!(m, "backlinks", 0, 0, file_fns::backlinks);
        builtin!(m, "outlinks", 0, 0, file_fns::outlinks);

        m
    };
}

/// `prop(name)` — look up a property of the current file by (dotted) name.
fn prop(args: &[Value], ctx: &dyn FunctionContext) -> Result<Value, RuntimeError> {
    let Value::String(name) = &args[0] else {
        return Ok(Value::Null);
    };
    let segments: Vec<String> = name.split('.').map(str::to_string).collect();
    let props = ctx.properties(&ctx.file_path());
    Ok(resolve_path(&props, &segments))
}

/// `exists(x)` — true unless `x` is null.
fn exists(args: &[Value], _ctx: &dyn FunctionContext) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(!args[0].is_null()))
}

/// `coalesce(a, ...)` — the first non-null argument.
fn coalesce(args: &[Value], _ctx: &dyn FunctionContext) -> Result<Value, RuntimeError> {
    Ok(args
        .iter()
        .find(|v| !v.is_null())
        .cloned()
        .unwrap_or(Value::Null))
}

/// `ifnull(x, fallback)`.
fn ifnull(args: &[Value], _ctx: &dyn FunctionContext) -> Result<Value, RuntimeError> {
    Ok(if args[0].is_null() {
        args[1].clone()
    } else {
        args[0].clone()
    })
}


#[cfg(test)]
mod tests {
    use super::test_support::FixtureContext;
    use super::*;

    #[test]
    fn test_registry_knows_the_canonical_set() {
        for name in [
            "prop", "exists", "coalesce", "ifnull", "contains", "startsWith", "endsWith",
            "length", "lower", "upper", "trim", "split", "matches", "len", "first", "last",
            "isEmpty", "now", "date", "year", "month", "day", "weekday", "hours", "minutes",
            "format", "dateDiff", "inFolder", "hasExtension", "hasTag", "tags", "hasLink",
            "backlinks", "outlinks",
        ] {
            assert!(lookup(name).is_some(), "missing builtin {name}");
        }
        assert!(lookup("unknownFn").is_none());
    }

    #[test]
    fn test_prop_resolves_dotted_names() {
        let ctx = FixtureContext::new(
            "notes/a.md",
            serde_json::json!({"task": {"status": "done"}}),
        );
        let result = prop(&[Value::String("task.status".into())], &ctx).unwrap();
        assert_eq!(result, Value::String("done".into()));
    }

    #[test]
    fn test_exists_and_ifnull() {
        let ctx = FixtureContext::new("notes/a.md", serde_json::json!({}));
        assert_eq!(exists(&[Value::Null], &ctx).unwrap(), Value::Bool(false));
        assert_eq!(
            exists(&[Value::Number(0.0)], &ctx).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            ifnull(&[Value::Null, Value::Number(5.0)], &ctx).unwrap(),
            Value::Number(5.0)
        );
        assert_eq!(
            ifnull(&[Value::Bool(false), Value::Number(5.0)], &ctx).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_coalesce_first_non_null() {
        let ctx = FixtureContext::new("notes/a.md", serde_json::json!({}));
        assert_eq!(
            coalesce(
                &[Value::Null, Value::Null, Value::String("x".into())],
                &ctx
            )
            .unwrap(),
            Value::String("x".into())
        );
        assert_eq!(coalesce(&[Value::Null], &ctx).unwrap(), Value::Null);
    }
}
