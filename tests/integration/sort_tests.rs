//! Chain-aware and property sorting end to end.

use crate::fixtures::{paths, MemoryGraph};
use trailql::run;

/// root → {c, a, b} via `down`; `next` edges a→b→c.
fn chain_graph() -> MemoryGraph {
    let mut graph = MemoryGraph::new("root");
    graph
        .edge("root", "c", "down")
        .edge("root", "a", "down")
        .edge("root", "b", "down")
        .edge("a", "b", "next")
        .edge("b", "c", "next")
        .sequential("next");
    graph
}

#[test]
fn test_chain_sort_primary() {
    let graph = chain_graph();
    let result = run(r#"group "T" from down depth 1 sort by chain"#, &graph, &graph).unwrap();
    assert_eq!(paths(&result.results), vec!["a", "b", "c"]);
}

#[test]
fn test_chain_sort_with_cycle_picks_alphabetical_head() {
    let mut graph = MemoryGraph::new("root");
    graph
        .edge("root", "b", "down")
        .edge("root", "c", "down")
        .edge("root", "a", "down")
        .edge("a", "b", "next")
        .edge("b", "c", "next")
        .edge("c", "a", "next")
        .sequential("next");
    let result = run(r#"group "T" from down depth 1 sort by chain"#, &graph, &graph).unwrap();
    assert_eq!(paths(&result.results), vec!["a", "b", "c"]);
}

#[test]
fn test_chain_heads_sorted_by_secondary_property() {
    // Two chains and one loose node, ranked so the second chain leads.
    let mut graph = MemoryGraph::new("root");
    graph
        .note("a", serde_json::json!({"rank": 9}))
        .note("b", serde_json::json!({"rank": 9}))
        .note("x", serde_json::json!({"rank": 1}))
        .note("y", serde_json::json!({"rank": 1}))
        .note("solo", serde_json::json!({"rank": 5}))
        .edge("root", "a", "down")
        .edge("root", "b", "down")
        .edge("root", "x", "down")
        .edge("root", "y", "down")
        .edge("root", "solo", "down")
        .edge("a", "b", "next")
        .edge("x", "y", "next")
        .sequential("next");
    let result = run(
        r#"group "T" from down depth 1 sort by chain, rank"#,
        &graph,
        &graph,
    )
    .unwrap();
    assert_eq!(paths(&result.results), vec!["x", "y", "solo", "a", "b"]);
}

#[test]
fn test_chain_as_secondary_key_respects_groups() {
    // Status groups first; chains reassemble only within each group.
    let mut graph = chain_graph();
    graph
        .note("a", serde_json::json!({"status": "open"}))
        .note("b", serde_json::json!({"status": "done"}))
        .note("c", serde_json::json!({"status": "open"}));
    let result = run(
        r#"group "T" from down depth 1 sort by status, chain"#,
        &graph,
        &graph,
    )
    .unwrap();
    // "done" group: [b]. "open" group: [a, c] — the a→b→c chain is cut by
    // the group boundary, leaving two disconnected nodes in basename order.
    assert_eq!(paths(&result.results), vec!["b", "a", "c"]);
}

#[test]
fn test_property_sort_with_desc_and_tiebreak() {
    let mut graph = MemoryGraph::new("root");
    graph
        .note("n1", serde_json::json!({"rank": 1, "bucket": "x"}))
        .note("n2", serde_json::json!({"rank": 2, "bucket": "x"}))
        .note("n3", serde_json::json!({"bucket": "x"}))
        .edge("root", "n2", "down")
        .edge("root", "n3", "down")
        .edge("root", "n1", "down");
    let result = run(
        r#"group "T" from down depth 1 sort by rank desc"#,
        &graph,
        &graph,
    )
    .unwrap();
    // Null rank sorts... reversed for desc it leads; n2 > n1 among the rest.
    assert_eq!(paths(&result.results), vec!["n3", "n2", "n1"]);

    // Equal keys fall back to basename order.
    let tied = run(
        r#"group "T" from down depth 1 sort by bucket"#,
        &graph,
        &graph,
    )
    .unwrap();
    assert_eq!(paths(&tied.results), vec!["n1", "n2", "n3"]);
}

#[test]
fn test_sorting_does_not_change_result_set() {
    let graph = chain_graph();
    let unsorted = run(r#"group "T" from down depth 1"#, &graph, &graph).unwrap();
    let sorted = run(
        r#"group "T" from down depth 1 sort by chain, rank desc"#,
        &graph,
        &graph,
    )
    .unwrap();
    let mut a = paths(&unsorted.results);
    let mut b = paths(&sorted.results);
    a.sort_unstable();
    b.sort_unstable();
    assert_eq!(a, b);
}

#[test]
fn test_sort_by_file_name() {
    let mut graph = MemoryGraph::new("root");
    graph
        .edge("root", "notes/zeta.md", "down")
        .edge("root", "notes/alpha.md", "down");
    let result = run(
        r#"group "T" from down depth 1 sort by file.name"#,
        &graph,
        &graph,
    )
    .unwrap();
    assert_eq!(paths(&result.results), vec!["notes/alpha.md", "notes/zeta.md"]);
}

#[test]
fn test_children_sorted_with_same_keys() {
    let mut graph = MemoryGraph::new("root");
    graph
        .note("p", serde_json::json!({"rank": 1}))
        .note("k2", serde_json::json!({"rank": 2}))
        .note("k1", serde_json::json!({"rank": 1}))
        .edge("root", "p", "down")
        .edge("p", "k2", "down")
        .edge("p", "k1", "down");
    let result = run(
        r#"group "T" from down depth 2 sort by rank"#,
        &graph,
        &graph,
    )
    .unwrap();
    assert_eq!(paths(&result.results[0].children), vec!["k1", "k2"]);
}
