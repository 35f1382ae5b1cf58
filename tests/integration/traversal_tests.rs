//! Traversal, prune, where, and flatten behavior end to end.

use crate::fixtures::{paths, MemoryGraph};
use std::collections::HashSet;
use trailql::run;

#[test]
fn test_depth_limited_traversal() {
    // A → B → C via `down`; depth 1 sees only B, with no children.
    let mut graph = MemoryGraph::new("A");
    graph.edge("A", "B", "down").edge("B", "C", "down");
    let result = run(r#"group "T" from down depth 1"#, &graph, &graph).unwrap();
    assert!(result.visible);
    assert_eq!(paths(&result.results), vec!["B"]);
    assert!(result.results[0].children.is_empty());
}

#[test]
fn test_where_with_null_filtering() {
    let mut graph = MemoryGraph::new("root");
    graph
        .note("c1", serde_json::json!({"gender": "f"}))
        .note("c2", serde_json::json!({"gender": serde_json::Value::Null}))
        .note("c3", serde_json::json!({}))
        .note("c4", serde_json::json!({"gender": "x"}))
        .edge("root", "c1", "down")
        .edge("root", "c2", "down")
        .edge("root", "c3", "down")
        .edge("root", "c4", "down");
    let result = run(
        r#"group "T" from down depth 1 where exists(gender)"#,
        &graph,
        &graph,
    )
    .unwrap();
    assert_eq!(paths(&result.results), vec!["c1", "c4"]);
}

#[test]
fn test_traversal_is_acyclic_per_path() {
    // Diamond with a back edge: every root-to-node path is cycle-free.
    let mut graph = MemoryGraph::new("root");
    graph
        .edge("root", "a", "down")
        .edge("a", "b", "down")
        .edge("b", "root", "down")
        .edge("b", "a", "down");
    let result = run(r#"group "T" from down depth unlimited"#, &graph, &graph).unwrap();

    fn assert_acyclic(nodes: &[trailql::QueryResultNode]) {
        for node in nodes {
            let unique: HashSet<&String> = node.traversal_path.iter().collect();
            assert_eq!(
                unique.len(),
                node.traversal_path.len(),
                "repeated node on path {:?}",
                node.traversal_path
            );
            assert_acyclic(&node.children);
        }
    }
    assert_acyclic(&result.results);
}

#[test]
fn test_flatten_collapses_to_depth_one_set() {
    // Diamond: b and c both reach d. Flatten yields each node once.
    let mut graph = MemoryGraph::new("a");
    graph
        .edge("a", "b", "down")
        .edge("a", "c", "down")
        .edge("b", "d", "down")
        .edge("c", "d", "down")
        .edge("d", "e", "down");
    let result = run(
        r#"group "T" from down depth 2 flatten"#,
        &graph,
        &graph,
    )
    .unwrap();
    // Reachable within depth 2: b, c, d. Not e (depth 3).
    assert_eq!(paths(&result.results), vec!["b", "c", "d"]);
    for node in &result.results {
        assert_eq!(node.depth, 1);
        assert_eq!(node.parent, "a");
        assert!(node.children.is_empty());
    }
}

#[test]
fn test_flatten_set_matches_tree_reachable_set() {
    let mut graph = MemoryGraph::new("a");
    graph
        .edge("a", "b", "down")
        .edge("a", "c", "down")
        .edge("b", "d", "down")
        .edge("c", "d", "down");

    let tree = run(r#"group "T" from down depth unlimited"#, &graph, &graph).unwrap();
    let flat = run(
        r#"group "T" from down depth unlimited flatten"#,
        &graph,
        &graph,
    )
    .unwrap();

    fn collect(nodes: &[trailql::QueryResultNode], out: &mut HashSet<String>) {
        for node in nodes {
            out.insert(node.path.clone());
            collect(&node.children, out);
        }
    }
    let mut tree_set = HashSet::new();
    collect(&tree.results, &mut tree_set);
    let flat_set: HashSet<String> =
        flat.results.iter().map(|n| n.path.clone()).collect();
    assert_eq!(tree_set, flat_set);
    assert_eq!(flat.results.len(), flat_set.len(), "each node exactly once");
}

#[test]
fn test_prune_in_flatten_blocks_expansion_but_not_other_routes() {
    // a → p(pruned) → x, and a → q → x: x is still found through q.
    let mut graph = MemoryGraph::new("a");
    graph
        .note("p", serde_json::json!({"skip": true}))
        .edge("a", "p", "down")
        .edge("a", "q", "down")
        .edge("p", "x", "down")
        .edge("q", "x", "down");
    let result = run(
        r#"group "T" from down depth unlimited flatten prune skip = true"#,
        &graph,
        &graph,
    )
    .unwrap();
    assert_eq!(paths(&result.results), vec!["q", "x"]);
}

#[test]
fn test_extend_runs_group_from_clause_at_leaves() {
    let mut graph = MemoryGraph::new("a");
    graph
        .edge("a", "b", "down")
        .edge("b", "c", "ref")
        .edge("c", "d", "ref");
    graph.group("Refs", r#"group "Refs" from ref depth 1"#);
    let result = run(
        r#"group "T" from down depth 1 extend "Refs""#,
        &graph,
        &graph,
    )
    .unwrap();
    assert_eq!(paths(&result.results), vec!["b"]);
    assert_eq!(paths(&result.results[0].children), vec!["c"]);
    // The extension itself ran with depth 1, so d is not reached.
    assert!(result.results[0].children[0].children.is_empty());
}

#[test]
fn test_flatten_with_extend_warns() {
    let mut graph = MemoryGraph::new("a");
    graph.edge("a", "b", "down");
    graph.group("Refs", r#"group "Refs" from down depth 1"#);
    let result = run(
        r#"group "T" from down flatten extend "Refs""#,
        &graph,
        &graph,
    )
    .unwrap();
    assert_eq!(paths(&result.results), vec!["b"]);
    assert!(
        result.warnings.iter().any(|w| w.contains("flatten")),
        "{:?}",
        result.warnings
    );
}

#[test]
fn test_where_gap_promotion_marks_nodes() {
    // a → mid → leaf; mid fails WHERE, leaf passes.
    let mut graph = MemoryGraph::new("a");
    graph
        .note("mid", serde_json::json!({}))
        .note("leaf", serde_json::json!({"wanted": true}))
        .edge("a", "mid", "down")
        .edge("mid", "leaf", "down");
    let result = run(
        r#"group "T" from down depth unlimited where wanted = true"#,
        &graph,
        &graph,
    )
    .unwrap();
    assert_eq!(paths(&result.results), vec!["leaf"]);
    assert!(result.results[0].has_filtered_ancestor);
}

#[test]
fn test_when_clause_controls_visibility() {
    let mut graph = MemoryGraph::new("a");
    graph.note("a", serde_json::json!({"kind": "hub"}));
    graph.edge("a", "b", "down");

    let hidden = run(
        r#"group "T" from down when kind = "leaf""#,
        &graph,
        &graph,
    )
    .unwrap();
    assert!(!hidden.visible);
    assert!(hidden.results.is_empty());

    let shown = run(
        r#"group "T" from down when kind = "hub""#,
        &graph,
        &graph,
    )
    .unwrap();
    assert!(shown.visible);
}
