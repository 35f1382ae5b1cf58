//! Sibling ordering: property sorts and chain-aware sorts.
//!
//! When a sort key is `chain`, siblings connected by *sequential* relations
//! (e.g. `next`) are grouped into chains via union-find and ordered by
//! following successors. Chains stay intact when `chain` is the primary
//! key; as a secondary key, chains are recomputed inside each group formed
//! by the keys before it. Every comparison ends in the alphabetical
//! basename tiebreaker so the order is total and deterministic.

use super::context::QueryContext;
use super::result::QueryResultNode;
use crate::parser::ast::{SortClause, SortDirection, SortKey, SortKeyKind};
use crate::value::{resolve_path, Value};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Sort the result tree in place. Children are sorted with the same keys.
pub(crate) fn sort_results(
    nodes: &mut Vec<QueryResultNode>,
    sort: Option<&SortClause>,
    ctx: &dyn QueryContext,
) {
    let Some(sort) = sort else {
        return;
    };
    sort_level(nodes, &sort.keys, ctx);
}

fn sort_level(nodes: &mut Vec<QueryResultNode>, keys: &[SortKey], ctx: &dyn QueryContext) {
    let chain_pos = keys.iter().position(|k| k.key == SortKeyKind::Chain);
    match chain_pos {
        None => nodes.sort_by(|a, b| compare_nodes(a, b, keys, ctx)),
        Some(0) => {
            let taken = std::mem::take(nodes);
            *nodes = chain_primary(taken, &keys[1..], ctx);
        }
        Some(pos) => {
            let taken = std::mem::take(nodes);
            *nodes = chain_secondary(taken, &keys[..pos], &keys[pos + 1..], ctx);
        }
    }
    for node in nodes.iter_mut() {
        sort_level(&mut node.children, keys, ctx);
    }
}

/// Property-key comparison with the basename tiebreaker. `chain` keys in
/// the list compare equal here (they are handled structurally).
fn compare_nodes(
    a: &QueryResultNode,
    b: &QueryResultNode,
    keys: &[SortKey],
    ctx: &dyn QueryContext,
) -> Ordering {
    match compare_by_keys(a, b, keys, ctx) {
        Ordering::Equal => a.basename().cmp(b.basename()),
        other => other,
    }
}

fn compare_by_keys(
    a: &QueryResultNode,
    b: &QueryResultNode,
    keys: &[SortKey],
    ctx: &dyn QueryContext,
) -> Ordering {
    for key in keys {
        let SortKeyKind::Property(path) = &key.key else {
            continue;
        };
        let va = sort_value(a, &path.segments, ctx);
        let vb = sort_value(b, &path.segments, ctx);
        let mut ordering = compare_values(&va, &vb);
        if key.direction == SortDirection::Desc {
            ordering = ordering.reverse();
        }
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Null sorts last; otherwise the value ordering rules apply.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.compare(b).unwrap_or(Ordering::Equal),
    }
}

/// Resolve a sort key against a node: reserved namespaces come from the
/// provider and the traversal step, everything else from the snapshot.
fn sort_value(node: &QueryResultNode, segments: &[String], ctx: &dyn QueryContext) -> Value {
    match segments.first().map(String::as_str) {
        Some("file") if segments.len() >= 2 => {
            let Some(meta) = ctx.file_metadata(&node.path) else {
                return Value::Null;
            };
            match segments[1].as_str() {
                "name" => Value::String(meta.name),
                "path" => Value::String(meta.path),
                "folder" => Value::String(meta.folder),
                "created" => Value::Date(meta.created),
                "modified" => Value::Date(meta.modified),
                "size" => Value::Number(meta.size as f64),
                _ => Value::Null,
            }
        }
        Some("traversal") if segments.len() >= 2 => match segments[1].as_str() {
            "depth" => Value::Number(f64::from(node.depth)),
            "relation" => Value::String(node.relation.clone()),
            "isImplied" => Value::Bool(node.implied),
            "parent" => Value::String(node.parent.clone()),
            "path" => Value::String(node.path.clone()),
            _ => Value::Null,
        },
        _ => resolve_path(&node.properties, segments),
    }
}

/// Chains plus leftover nodes over one sibling set, as index lists.
struct ChainStructure {
    /// Each chain in follow order; always length >= 2.
    chains: Vec<Vec<usize>>,
    disconnected: Vec<usize>,
}

/// Partition sibling indices into chains along sequential relations.
fn build_chains(nodes: &[QueryResultNode], ctx: &dyn QueryContext) -> ChainStructure {
    let sequential = ctx.sequential_relations();
    let index_of: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.path.as_str(), i))
        .collect();

    // Union-find over sibling indices; successor lists keep edge order.
    let mut parent: Vec<usize> = (0..nodes.len()).collect();
    fn find(parent: &mut Vec<usize>, i: usize) -> usize {
        if parent[i] != i {
            let root = find(parent, parent[i]);
            parent[i] = root;
        }
        parent[i]
    }
    let mut successors: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut has_predecessor: Vec<bool> = vec![false; nodes.len()];

    for (i, node) in nodes.iter().enumerate() {
        for edge in ctx.outgoing_edges(&node.path, None) {
            if !sequential.contains(&edge.relation) {
                continue;
            }
            let Some(&j) = index_of.get(edge.to_path.as_str()) else {
                continue;
            };
            if i == j {
                continue;
            }
            let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
            if ri != rj {
                parent[ri] = rj;
            }
            successors.entry(i).or_default().push(j);
            has_predecessor[j] = true;
        }
    }

    let mut components: HashMap<usize, Vec<usize>> = HashMap::new();
    for i in 0..nodes.len() {
        let root = find(&mut parent, i);
        components.entry(root).or_default().push(i);
    }

    let mut chains = Vec::new();
    let mut disconnected = Vec::new();
    let mut roots: Vec<usize> = components.keys().copied().collect();
    roots.sort_unstable();
    for root in roots {
        let members = &components[&root];
        if members.len() < 2 {
            disconnected.push(members[0]);
            continue;
        }
        chains.push(order_chain(members, &successors, &has_predecessor, nodes));
    }

    ChainStructure { chains, disconnected }
}

/// Walk a chain component from its head, following successors. A cycle has
/// no head; the alphabetically earliest basename starts it. Members a walk
/// cannot reach (branching remnants) are appended in basename order.
fn order_chain(
    members: &[usize],
    successors: &HashMap<usize, Vec<usize>>,
    has_predecessor: &[bool],
    nodes: &[QueryResultNode],
) -> Vec<usize> {
    let by_basename = |&i: &usize| (nodes[i].basename().to_string(), i);

    let mut heads: Vec<usize> = members
        .iter()
        .copied()
        .filter(|&i| !has_predecessor[i])
        .collect();
    heads.sort_by_key(by_basename);
    let head = heads.first().copied().unwrap_or_else(|| {
        // Cycle: alphabetically earliest member is the head.
        let mut sorted: Vec<usize> = members.to_vec();
        sorted.sort_by_key(by_basename);
        sorted[0]
    });

    let mut ordered = Vec::with_capacity(members.len());
    let mut seen: Vec<bool> = vec![false; nodes.len()];
    let mut current = Some(head);
    while let Some(i) = current {
        if seen[i] {
            break;
        }
        seen[i] = true;
        ordered.push(i);
        current = successors
            .get(&i)
            .and_then(|next| next.iter().copied().find(|&j| !seen[j]));
    }

    let mut rest: Vec<usize> = members.iter().copied().filter(|&i| !seen[i]).collect();
    rest.sort_by_key(by_basename);
    ordered.extend(rest);
    ordered
}

/// Chain is the primary key: chains stay intact, heads and disconnected
/// nodes sort by the remaining keys, chains then expand in chain order.
fn chain_primary(
    nodes: Vec<QueryResultNode>,
    remaining: &[SortKey],
    ctx: &dyn QueryContext,
) -> Vec<QueryResultNode> {
    let structure = build_chains(&nodes, ctx);

    // One unit per chain (represented by its head) or disconnected node.
    let mut units: Vec<Vec<usize>> = structure.chains;
    units.extend(structure.disconnected.into_iter().map(|i| vec![i]));
    units.sort_by(|a, b| compare_nodes(&nodes[a[0]], &nodes[b[0]], remaining, ctx));

    reorder(nodes, units.into_iter().flatten().collect())
}

/// Chain is a secondary key: group siblings by the keys before it, sort
/// the groups, then chain-sort within each group independently.
fn chain_secondary(
    nodes: Vec<QueryResultNode>,
    before: &[SortKey],
    after: &[SortKey],
    ctx: &dyn QueryContext,
) -> Vec<QueryResultNode> {
    let mut order: Vec<usize> = (0..nodes.len()).collect();
    order.sort_by(|&a, &b| compare_nodes(&nodes[a], &nodes[b], before, ctx));

    // Split into runs of equal `before`-key values.
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for i in order {
        let starts_new = match groups.last().and_then(|g| g.first()) {
            Some(&first) => {
                compare_by_keys(&nodes[first], &nodes[i], before, ctx) != Ordering::Equal
            }
            None => true,
        };
        if starts_new {
            groups.push(Vec::new());
        }
        groups.last_mut().expect("just pushed").push(i);
    }

    let mut final_order = Vec::with_capacity(nodes.len());
    let mut scratch: Vec<Option<QueryResultNode>> = nodes.into_iter().map(Some).collect();

    for group in groups {
        let members: Vec<QueryResultNode> = group
            .iter()
            .map(|&i| scratch[i].take().expect("each index appears once"))
            .collect();
        let sorted = chain_primary(members, after, ctx);
        final_order.extend(sorted);
    }
    final_order
}

fn reorder(mut nodes: Vec<QueryResultNode>, order: Vec<usize>) -> Vec<QueryResultNode> {
    let mut scratch: Vec<Option<QueryResultNode>> = nodes.drain(..).map(Some).collect();
    order
        .into_iter()
        .map(|i| scratch[i].take().expect("each index appears once"))
        .collect()
}
