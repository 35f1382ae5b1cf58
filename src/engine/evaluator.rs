//! Expression evaluation against one node.
//!
//! Every evaluation sees a `(file path, properties, traversal context)`
//! triple. The coercion rules live here: truthiness-driven logic,
//! null-propagating ordering, date/duration arithmetic, and the reserved
//! `file.*` / `traversal.*` namespaces.

use super::aggregates;
use super::context::TraversalContext;
use super::errors::RuntimeError;
use super::ExecEnv;
use crate::functions::{self, date_fns, FunctionContext};
use crate::parser::ast::{
    ArithOp, ComparisonOp, Expr, ExprKind, Literal, LogicalOp, LogicalOp::*, PropertyPath,
    RelativeDate,
};
use crate::value::{resolve_path, PropertyMap, Value};
use chrono::{Datelike, Duration, NaiveDateTime};
use std::cmp::Ordering;

/// The node an expression is being evaluated against.
pub(crate) struct EvalTarget<'a> {
    pub path: &'a str,
    pub props: &'a PropertyMap,
    pub traversal: Option<&'a TraversalContext>,
}

pub(crate) fn eval_expr(
    expr: &Expr,
    target: &EvalTarget<'_>,
    env: &ExecEnv<'_>,
) -> Result<Value, RuntimeError> {
    match &expr.kind {
        ExprKind::Literal(literal) => Ok(eval_literal(literal)),
        ExprKind::Property(path) => Ok(eval_property(path, target, env)),
        ExprKind::Logical { op, lhs, rhs } => eval_logical(*op, lhs, rhs, target, env),
        ExprKind::Not(inner) => {
            let value = eval_expr(inner, target, env)?;
            Ok(Value::Bool(!value.is_truthy()))
        }
        ExprKind::Comparison { op, lhs, rhs } => {
            let left = eval_expr(lhs, target, env)?;
            let right = eval_expr(rhs, target, env)?;
            Ok(eval_comparison(*op, &left, &right))
        }
        ExprKind::Arith { op, lhs, rhs } => {
            let left = eval_expr(lhs, target, env)?;
            let right = eval_expr(rhs, target, env)?;
            eval_arith(*op, left, right, expr)
        }
        ExprKind::In { item, collection } => {
            let item = eval_expr(item, target, env)?;
            let collection = eval_expr(collection, target, env)?;
            Ok(eval_in(&item, &collection))
        }
        ExprKind::Range { item, lower, upper } => {
            let item = eval_expr(item, target, env)?;
            let lower = eval_expr(lower, target, env)?;
            let upper = eval_expr(upper, target, env)?;
            Ok(eval_range(&item, &lower, &upper))
        }
        ExprKind::Call { name, args } => eval_call(name, args, expr, target, env),
        ExprKind::Aggregate(aggregate) => aggregates::eval_aggregate(aggregate, target, env),
        ExprKind::DateOffset {
            base,
            op,
            duration_millis,
        } => {
            let base = eval_expr(base, target, env)?;
            Ok(eval_date_offset(&base, *op, *duration_millis))
        }
    }
}

fn eval_literal(literal: &Literal) -> Value {
    match literal {
        Literal::Null => Value::Null,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Number(n) => Value::Number(*n),
        Literal::String(s) => Value::String(s.clone()),
        Literal::Date(d) => Value::Date(*d),
        // A bare duration is its millisecond count.
        Literal::Duration { millis } => Value::Number(*millis as f64),
        Literal::RelativeDate(relative) => Value::Date(resolve_relative_date(*relative)),
    }
}

/// Relative dates resolve against the current day at midnight local time.
/// Weeks run Monday through Sunday.
pub(crate) fn resolve_relative_date(relative: RelativeDate) -> NaiveDateTime {
    let today = date_fns::today_midnight();
    match relative {
        RelativeDate::Today => today,
        RelativeDate::Yesterday => today - Duration::days(1),
        RelativeDate::Tomorrow => today + Duration::days(1),
        RelativeDate::StartOfWeek => {
            today - Duration::days(i64::from(today.weekday().num_days_from_monday()))
        }
        RelativeDate::EndOfWeek => {
            today - Duration::days(i64::from(today.weekday().num_days_from_monday()))
                + Duration::days(6)
        }
    }
}

fn eval_property(path: &PropertyPath, target: &EvalTarget<'_>, env: &ExecEnv<'_>) -> Value {
    match path.first() {
        "file" if path.segments.len() >= 2 => {
            eval_file_field(&path.segments[1], target.path, env)
        }
        "traversal" if path.segments.len() >= 2 => {
            eval_traversal_field(&path.segments[1], target.traversal)
        }
        _ => resolve_path(target.props, &path.segments),
    }
}

fn eval_file_field(field: &str, path: &str, env: &ExecEnv<'_>) -> Value {
    let Some(meta) = env.ctx.file_metadata(path) else {
        return Value::Null;
    };
    match field {
        "name" => Value::String(meta.name),
        "path" => Value::String(meta.path),
        "folder" => Value::String(meta.folder),
        "created" => Value::Date(meta.created),
        "modified" => Value::Date(meta.modified),
        "size" => Value::Number(meta.size as f64),
        "tags" => Value::List(meta.tags.into_iter().map(Value::String).collect()),
        _ => Value::Null,
    }
}

fn eval_traversal_field(field: &str, traversal: Option<&TraversalContext>) -> Value {
    let Some(tc) = traversal else {
        return Value::Null;
    };
    match field {
        "depth" => Value::Number(f64::from(tc.depth)),
        "relation" => Value::String(tc.relation.clone()),
        "isImplied" => Value::Bool(tc.is_implied),
        "parent" => Value::String(tc.parent.clone()),
        "path" => Value::String(tc.path.clone()),
        _ => Value::Null,
    }
}

fn eval_logical(
    op: LogicalOp,
    lhs: &Expr,
    rhs: &Expr,
    target: &EvalTarget<'_>,
    env: &ExecEnv<'_>,
) -> Result<Value, RuntimeError> {
    let left = eval_expr(lhs, target, env)?.is_truthy();
    match (op, left) {
        (And, false) => Ok(Value::Bool(false)),
        (Or, true) => Ok(Value::Bool(true)),
        _ => {
            let right = eval_expr(rhs, target, env)?.is_truthy();
            Ok(Value::Bool(right))
        }
    }
}

fn eval_comparison(op: ComparisonOp, left: &Value, right: &Value) -> Value {
    match op {
        ComparisonOp::Eq => Value::Bool(left.eq_value(right)),
        ComparisonOp::NotEq => Value::Bool(!left.eq_value(right)),
        // Null-safe forms look at the left side first and never propagate.
        ComparisonOp::NullSafeEq => {
            if left.is_null() {
                Value::Bool(false)
            } else {
                Value::Bool(left.eq_value(right))
            }
        }
        ComparisonOp::NullSafeNotEq => {
            if left.is_null() {
                Value::Bool(true)
            } else {
                Value::Bool(!left.eq_value(right))
            }
        }
        ComparisonOp::Lt | ComparisonOp::Gt | ComparisonOp::Le | ComparisonOp::Ge => {
            match left.compare(right) {
                None => Value::Null,
                Some(ordering) => Value::Bool(match op {
                    ComparisonOp::Lt => ordering == Ordering::Less,
                    ComparisonOp::Gt => ordering == Ordering::Greater,
                    ComparisonOp::Le => ordering != Ordering::Greater,
                    ComparisonOp::Ge => ordering != Ordering::Less,
                    _ => unreachable!("outer match covers ordering ops only"),
                }),
            }
        }
    }
}

fn eval_arith(op: ArithOp, left: Value, right: Value, expr: &Expr) -> Result<Value, RuntimeError> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }
    match (op, &left, &right) {
        (_, Value::Number(a), Value::Number(b)) => Ok(Value::Number(match op {
            ArithOp::Add => a + b,
            ArithOp::Sub => a - b,
        })),
        // date ± number treats the number as milliseconds.
        (_, Value::Date(d), Value::Number(ms)) => Ok(Value::Date(shift_date(*d, op, *ms))),
        (ArithOp::Add, Value::Number(ms), Value::Date(d)) => {
            Ok(Value::Date(shift_date(*d, ArithOp::Add, *ms)))
        }
        (ArithOp::Add, Value::String(_), _) | (ArithOp::Add, _, Value::String(_)) => {
            Ok(Value::String(format!("{left}{right}")))
        }
        _ => Err(RuntimeError::InvalidArithmetic {
            op: match op {
                ArithOp::Add => "+",
                ArithOp::Sub => "-",
            },
            lhs: left.type_name(),
            rhs: right.type_name(),
            span: expr.span,
        }),
    }
}

fn shift_date(date: NaiveDateTime, op: ArithOp, millis: f64) -> NaiveDateTime {
    let delta = Duration::milliseconds(millis.round() as i64);
    match op {
        ArithOp::Add => date + delta,
        ArithOp::Sub => date - delta,
    }
}

fn eval_in(item: &Value, collection: &Value) -> Value {
    match collection {
        Value::Null => Value::Bool(false),
        Value::List(items) => Value::Bool(items.iter().any(|v| v.eq_value(item))),
        Value::String(haystack) => match item {
            Value::String(needle) => Value::Bool(haystack.contains(needle.as_str())),
            _ => Value::Bool(false),
        },
        _ => Value::Bool(false),
    }
}

fn eval_range(item: &Value, lower: &Value, upper: &Value) -> Value {
    if item.is_null() || lower.is_null() || upper.is_null() {
        return Value::Null;
    }
    match (lower.compare(item), item.compare(upper)) {
        (Some(lo), Some(hi)) => {
            Value::Bool(lo != Ordering::Greater && hi != Ordering::Greater)
        }
        _ => Value::Null,
    }
}

fn eval_call(
    name: &str,
    args: &[Expr],
    expr: &Expr,
    target: &EvalTarget<'_>,
    env: &ExecEnv<'_>,
) -> Result<Value, RuntimeError> {
    let Some(builtin) = functions::lookup(name) else {
        return Err(RuntimeError::UnknownFunction {
            name: name.to_string(),
            span: expr.span,
        });
    };
    if args.len() < builtin.min_args || args.len() > builtin.max_args {
        return Err(RuntimeError::WrongArity {
            name: name.to_string(),
            expected: if builtin.min_args == builtin.max_args {
                builtin.min_args.to_string()
            } else {
                format!("{}..{}", builtin.min_args, builtin.max_args)
            },
            got: args.len(),
            span: expr.span,
        });
    }
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        values.push(eval_expr(arg, target, env)?);
    }
    let fn_ctx = EvalFunctionContext {
        path: target.path,
        env,
    };
    (builtin.call)(&values, &fn_ctx)
}

/// Bridges the engine's provider into the builtin function interface.
struct EvalFunctionContext<'a> {
    path: &'a str,
    env: &'a ExecEnv<'a>,
}

impl FunctionContext for EvalFunctionContext<'_> {
    fn file_path(&self) -> String {
        self.path.to_string()
    }
    fn properties(&self, path: &str) -> PropertyMap {
        self.env.ctx.properties(path)
    }
    fn file_metadata(&self, path: &str) -> Option<super::context::FileMetadata> {
        self.env.ctx.file_metadata(path)
    }
}

fn eval_date_offset(base: &Value, op: ArithOp, duration_millis: i64) -> Value {
    let Some(date) = date_fns::coerce_date(base) else {
        return Value::Null;
    };
    Value::Date(shift_date(date, op, duration_millis as f64))
}
