//! Graph traversal: tree-mode DFS and flatten-mode BFS.
//!
//! Cycle avoidance is per traversal path: the ancestor set holds every
//! path from the active node down to the current one (including segments
//! contributed by `extend`), so a node may appear in sibling branches but
//! never twice on one path.

use super::evaluator::{eval_expr, EvalTarget};
use super::errors::RuntimeError;
use super::result::QueryResultNode;
use super::ExecEnv;
use crate::parser::ast::{Expr, RelationSpec};
use std::collections::{HashSet, VecDeque};

/// Traverse every relation spec in order from `origin`, concatenating the
/// per-relation results. `ancestors` must already contain `origin`.
pub(crate) fn traverse_from(
    origin: &str,
    relations: &[RelationSpec],
    prune: Option<&Expr>,
    ancestors: &HashSet<String>,
    traversal_path: &[String],
    env: &ExecEnv<'_>,
) -> Result<Vec<QueryResultNode>, RuntimeError> {
    let mut results = Vec::new();
    for spec in relations {
        if spec.flatten {
            if spec.extend.is_some() {
                env.warn(format!(
                    "`extend` is ignored for relation `{}` because `flatten` is set",
                    spec.name
                ));
            }
            results.extend(traverse_flatten(origin, spec, prune, env)?);
        } else {
            results.extend(traverse_tree(
                origin,
                spec,
                1,
                ancestors,
                traversal_path,
                prune,
                env,
            )?);
        }
    }
    Ok(results)
}

/// Tree mode: DFS that emits each reached node and recurses under the same
/// relation spec. At the depth limit or a natural leaf, `extend` continues
/// traversal with the named group's `from` clause.
fn traverse_tree(
    src: &str,
    spec: &RelationSpec,
    current_depth: u32,
    ancestors: &HashSet<String>,
    traversal_path: &[String],
    prune: Option<&Expr>,
    env: &ExecEnv<'_>,
) -> Result<Vec<QueryResultNode>, RuntimeError> {
    if !spec.depth.allows(current_depth) {
        return Ok(Vec::new());
    }

    let mut out = Vec::new();
    for edge in env.ctx.outgoing_edges(src, Some(&spec.name)) {
        let dst = edge.to_path.clone();
        if ancestors.contains(&dst) {
            continue;
        }

        let properties = env.ctx.properties(&dst);
        let traversal_ctx = super::context::TraversalContext {
            depth: current_depth,
            relation: edge.relation.clone(),
            is_implied: edge.implied,
            parent: src.to_string(),
            path: dst.clone(),
        };

        if let Some(prune_expr) = prune {
            let target = EvalTarget {
                path: &dst,
                props: &properties,
                traversal: Some(&traversal_ctx),
            };
            if eval_expr(prune_expr, &target, env)?.is_truthy() {
                continue;
            }
        }

        let mut next_ancestors = ancestors.clone();
        next_ancestors.insert(dst.clone());
        let mut next_path = traversal_path.to_vec();
        next_path.push(dst.clone());

        let mut children = traverse_tree(
            &dst,
            spec,
            current_depth + 1,
            &next_ancestors,
            &next_path,
            prune,
            env,
        )?;

        // Depth limit or natural leaf: hand over to the extended group.
        if children.is_empty() {
            if let Some(group) = &spec.extend {
                children = run_extension(group, &dst, &next_ancestors, &next_path, env)?;
            }
        }

        out.push(QueryResultNode {
            path: dst,
            relation: edge.relation.clone(),
            depth: current_depth,
            implied: edge.implied,
            implied_from: edge.implied_from.clone(),
            parent: src.to_string(),
            traversal_path: next_path,
            properties,
            display_properties: serde_json::Map::new(),
            visual_direction: env.ctx.visual_direction(&edge.relation),
            has_filtered_ancestor: false,
            children,
        });
    }
    Ok(out)
}

/// Execute the extended group's `from` clause from `origin`. Unresolvable
/// groups degrade to a warning and an empty subtree.
fn run_extension(
    group: &str,
    origin: &str,
    ancestors: &HashSet<String>,
    traversal_path: &[String],
    env: &ExecEnv<'_>,
) -> Result<Vec<QueryResultNode>, RuntimeError> {
    let Some(query) = env.ctx.resolve_group_query(group) else {
        env.warn(format!("`extend` references unknown group `{group}`"));
        return Ok(Vec::new());
    };
    traverse_from(
        origin,
        &query.from.relations,
        None,
        ancestors,
        traversal_path,
        env,
    )
}

/// Flatten mode: BFS collecting every node reachable within the depth
/// bound, each emitted once at depth 1 with no children. A pruned node is
/// withheld from the output and not expanded, but stays in the visited set
/// so it is not rediscovered through another edge.
fn traverse_flatten(
    origin: &str,
    spec: &RelationSpec,
    prune: Option<&Expr>,
    env: &ExecEnv<'_>,
) -> Result<Vec<QueryResultNode>, RuntimeError> {
    let mut visited: HashSet<String> = HashSet::from([origin.to_string()]);
    let mut queue: VecDeque<(String, u32)> = VecDeque::from([(origin.to_string(), 0)]);
    let mut out = Vec::new();

    while let Some((path, depth)) = queue.pop_front() {
        if !spec.depth.allows(depth + 1) {
            continue;
        }
        for edge in env.ctx.outgoing_edges(&path, Some(&spec.name)) {
            let dst = edge.to_path.clone();
            if !visited.insert(dst.clone()) {
                continue;
            }

            let properties = env.ctx.properties(&dst);
            let traversal_ctx = super::context::TraversalContext {
                depth: 1,
                relation: edge.relation.clone(),
                is_implied: edge.implied,
                parent: origin.to_string(),
                path: dst.clone(),
            };

            if let Some(prune_expr) = prune {
                let target = EvalTarget {
                    path: &dst,
                    props: &properties,
                    traversal: Some(&traversal_ctx),
                };
                if eval_expr(prune_expr, &target, env)?.is_truthy() {
                    continue;
                }
            }

            queue.push_back((dst.clone(), depth + 1));
            out.push(QueryResultNode {
                path: dst.clone(),
                relation: edge.relation.clone(),
                depth: 1,
                implied: edge.implied,
                implied_from: edge.implied_from.clone(),
                parent: origin.to_string(),
                traversal_path: vec![origin.to_string(), dst],
                properties,
                display_properties: serde_json::Map::new(),
                visual_direction: env.ctx.visual_direction(&edge.relation),
                has_filtered_ancestor: false,
                children: Vec::new(),
            });
        }
    }
    Ok(out)
}
