//! Aggregate evaluation: `count/sum/avg/min/max/any/all` over a subquery
//! executed from the current node.
//!
//! Results are memoized per `(node, aggregate shape)` for the duration of
//! one top-level execution. The shape key hashes the condition expression
//! structurally (spans excluded), so the same condition spelled in two
//! places shares a slot. A key already being computed further up the stack
//! is a circular reference: it degrades to a warning and `null`.

use super::evaluator::{eval_expr, EvalTarget};
use super::errors::RuntimeError;
use super::result::QueryResultNode;
use super::traversal::traverse_from;
use super::ExecEnv;
use crate::parser::ast::{
    AggregateExpr, AggregateFunc, AggregateSource, Expr, ExprKind, Literal, RelationSpec,
};
use crate::value::{resolve_path, Value};
use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

/// Per-execution aggregate state. Never escapes one `execute` call.
#[derive(Default)]
pub(crate) struct AggregateState {
    in_flight: HashSet<AggregateKey>,
    memo: HashMap<AggregateKey, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AggregateKey {
    path: String,
    func: AggregateFunc,
    source: String,
    property: Option<String>,
    condition_hash: u64,
}

pub(crate) fn eval_aggregate(
    aggregate: &AggregateExpr,
    target: &EvalTarget<'_>,
    env: &ExecEnv<'_>,
) -> Result<Value, RuntimeError> {
    let key = AggregateKey {
        path: target.path.to_string(),
        func: aggregate.func,
        source: source_shape(&aggregate.source),
        property: aggregate.property.as_ref().map(|p| p.joined()),
        condition_hash: aggregate
            .condition
            .as_ref()
            .map(structural_hash)
            .unwrap_or(0),
    };

    {
        let state = env.aggregates.borrow();
        if state.in_flight.contains(&key) {
            drop(state);
            env.warn(format!(
                "[CIRCULAR_REFERENCE] aggregate `{}` refers back to itself at `{}`",
                aggregate.func, target.path
            ));
            return Ok(Value::Null);
        }
        if let Some(cached) = state.memo.get(&key) {
            return Ok(cached.clone());
        }
    }

    if !aggregate.func.needs_property() && !aggregate.func.needs_condition() {
        if aggregate.property.is_some() || aggregate.condition.is_some() {
            env.warn("`count` ignores its extra argument".to_string());
        }
    }

    env.aggregates.borrow_mut().in_flight.insert(key.clone());
    let result = compute(aggregate, target, env);
    env.aggregates.borrow_mut().in_flight.remove(&key);

    let value = result?;
    env.aggregates
        .borrow_mut()
        .memo
        .insert(key, value.clone());
    Ok(value)
}

fn compute(
    aggregate: &AggregateExpr,
    target: &EvalTarget<'_>,
    env: &ExecEnv<'_>,
) -> Result<Value, RuntimeError> {
    let Some(relations) = resolve_source(&aggregate.source, env) else {
        return Ok(Value::Null);
    };

    let ancestors = HashSet::from([target.path.to_string()]);
    let tree = traverse_from(
        target.path,
        &relations,
        None,
        &ancestors,
        &[target.path.to_string()],
        env,
    )?;
    let nodes = flatten_tree(tree);

    match aggregate.func {
        AggregateFunc::Count => Ok(Value::Number(nodes.len() as f64)),
        AggregateFunc::Sum | AggregateFunc::Avg => {
            let numbers = property_numbers(&nodes, aggregate);
            match aggregate.func {
                AggregateFunc::Sum => Ok(Value::Number(numbers.iter().sum())),
                _ => {
                    if numbers.is_empty() {
                        Ok(Value::Null)
                    } else {
                        Ok(Value::Number(numbers.iter().sum::<f64>() / numbers.len() as f64))
                    }
                }
            }
        }
        AggregateFunc::Min | AggregateFunc::Max => {
            let want = if aggregate.func == AggregateFunc::Min {
                Ordering::Less
            } else {
                Ordering::Greater
            };
            let mut best = Value::Null;
            for value in property_values(&nodes, aggregate) {
                if value.is_null() {
                    continue;
                }
                if best.is_null() || value.compare(&best) == Some(want) {
                    best = value;
                }
            }
            Ok(best)
        }
        AggregateFunc::Any | AggregateFunc::All => {
            let Some(condition) = &aggregate.condition else {
                return Ok(Value::Null);
            };
            // any: vacuously false; all: vacuously true.
            let mut result = aggregate.func == AggregateFunc::All;
            for node in &nodes {
                let tc = node.traversal_context();
                let node_target = EvalTarget {
                    path: &node.path,
                    props: &node.properties,
                    traversal: Some(&tc),
                };
                let holds = eval_expr(condition, &node_target, env)?.is_truthy();
                match aggregate.func {
                    AggregateFunc::Any if holds => {
                        result = true;
                        break;
                    }
                    AggregateFunc::All if !holds => {
                        result = false;
                        break;
                    }
                    _ => {}
                }
            }
            Ok(Value::Bool(result))
        }
    }
}

/// Resolve the subquery's relations. `None` means an unresolvable group,
/// already reported as a warning.
fn resolve_source(source: &AggregateSource, env: &ExecEnv<'_>) -> Option<Vec<RelationSpec>> {
    match source {
        AggregateSource::Group(name) => match env.ctx.resolve_group_query(name) {
            Some(query) => Some(query.from.relations),
            None => {
                env.warn(format!("aggregate references unknown group `{name}`"));
                None
            }
        },
        AggregateSource::Relations(specs) => Some(specs.clone()),
        AggregateSource::Named(name) => match env.ctx.resolve_group_query(name) {
            Some(query) => Some(query.from.relations),
            None => Some(vec![RelationSpec::unlimited(
                name.clone(),
                crate::span::Span::default(),
            )]),
        },
    }
}

fn flatten_tree(nodes: Vec<QueryResultNode>) -> Vec<QueryResultNode> {
    let mut out = Vec::new();
    for mut node in nodes {
        let children = std::mem::take(&mut node.children);
        out.push(node);
        out.extend(flatten_tree(children));
    }
    out
}

fn property_values(nodes: &[QueryResultNode], aggregate: &AggregateExpr) -> Vec<Value> {
    let Some(path) = &aggregate.property else {
        return Vec::new();
    };
    nodes
        .iter()
        .map(|node| resolve_path(&node.properties, &path.segments))
        .collect()
}

fn property_numbers(nodes: &[QueryResultNode], aggregate: &AggregateExpr) -> Vec<f64> {
    property_values(nodes, aggregate)
        .into_iter()
        .filter_map(|value| match value {
            Value::Number(n) => Some(n),
            _ => None,
        })
        .collect()
}

fn source_shape(source: &AggregateSource) -> String {
    match source {
        AggregateSource::Group(name) => format!("group:{name}"),
        AggregateSource::Named(name) => format!("ident:{name}"),
        AggregateSource::Relations(specs) => {
            let parts: Vec<String> = specs
                .iter()
                .map(|spec| {
                    format!(
                        "{}/{:?}/{}/{}",
                        spec.name,
                        spec.depth,
                        spec.extend.as_deref().unwrap_or("-"),
                        spec.flatten
                    )
                })
                .collect();
            format!("from:{}", parts.join(","))
        }
    }
}

/// Hash an expression by structure, ignoring spans, so identical
/// conditions share a memo slot wherever they appear in the query.
pub(crate) fn structural_hash(expr: &Expr) -> u64 {
    let mut hasher = DefaultHasher::new();
    hash_expr(expr, &mut hasher);
    hasher.finish()
}

fn hash_expr(expr: &Expr, state: &mut impl Hasher) {
    match &expr.kind {
        ExprKind::Literal(literal) => {
            0u8.hash(state);
            hash_literal(literal, state);
        }
        ExprKind::Property(path) => {
            1u8.hash(state);
            path.segments.hash(state);
        }
        ExprKind::Logical { op, lhs, rhs } => {
            2u8.hash(state);
            op.hash(state);
            hash_expr(lhs, state);
            hash_expr(rhs, state);
        }
        ExprKind::Comparison { op, lhs, rhs } => {
            3u8.hash(state);
            op.hash(state);
            hash_expr(lhs, state);
            hash_expr(rhs, state);
        }
        ExprKind::Arith { op, lhs, rhs } => {
            4u8.hash(state);
            op.hash(state);
            hash_expr(lhs, state);
            hash_expr(rhs, state);
        }
        ExprKind::Not(inner) => {
            5u8.hash(state);
            hash_expr(inner, state);
        }
        ExprKind::In { item, collection } => {
            6u8.hash(state);
            hash_expr(item, state);
            hash_expr(collection, state);
        }
        ExprKind::Range { item, lower, upper } => {
            7u8.hash(state);
            hash_expr(item, state);
            hash_expr(lower, state);
            hash_expr(upper, state);
        }
        ExprKind::Call { name, args } => {
            8u8.hash(state);
            name.hash(state);
            args.len().hash(state);
            for arg in args {
                hash_expr(arg, state);
            }
        }
        ExprKind::Aggregate(aggregate) => {
            9u8.hash(state);
            aggregate.func.hash(state);
            source_shape(&aggregate.source).hash(state);
            aggregate.property.as_ref().map(|p| p.joined()).hash(state);
            if let Some(condition) = &aggregate.condition {
                hash_expr(condition, state);
            }
        }
        ExprKind::DateOffset {
            base,
            op,
            duration_millis,
        } => {
            10u8.hash(state);
            op.hash(state);
            duration_millis.hash(state);
            hash_expr(base, state);
        }
    }
}

fn hash_literal(literal: &Literal, state: &mut impl Hasher) {
    match literal {
        Literal::Null => 0u8.hash(state),
        Literal::Bool(b) => {
            1u8.hash(state);
            b.hash(state);
        }
        Literal::Number(n) => {
            2u8.hash(state);
            n.to_bits().hash(state);
        }
        Literal::String(s) => {
            3u8.hash(state);
            s.hash(state);
        }
        Literal::Date(d) => {
            4u8.hash(state);
            d.hash(state);
        }
        Literal::Duration { millis } => {
            5u8.hash(state);
            millis.hash(state);
        }
        Literal::RelativeDate(r) => {
            6u8.hash(state);
            r.hash(state);
        }
    }
}
