//! Aggregates inside `where` clauses, end to end.

use crate::fixtures::{paths, MemoryGraph};
use trailql::run;

/// parent1 → {c1 done, c2 pending}; parent2 → {c3 pending}.
fn tasks_graph() -> MemoryGraph {
    let mut graph = MemoryGraph::new("root");
    graph
        .note("c1", serde_json::json!({"status": "done", "points": 2}))
        .note("c2", serde_json::json!({"status": "pending", "points": 3}))
        .note("c3", serde_json::json!({"status": "pending"}))
        .edge("root", "parent1", "down")
        .edge("root", "parent2", "down")
        .edge("parent1", "c1", "down")
        .edge("parent1", "c2", "down")
        .edge("parent2", "c3", "down");
    graph
}

#[test]
fn test_any_filters_parents_by_child_status() {
    let graph = tasks_graph();
    let result = run(
        r#"group "T" from down depth 1 where any(from down depth 1, status = "done")"#,
        &graph,
        &graph,
    )
    .unwrap();
    assert_eq!(paths(&result.results), vec!["parent1"]);
}

#[test]
fn test_all_is_vacuously_true_on_leaves() {
    let graph = tasks_graph();
    // Leaves have no children, so `all(...)` holds for them vacuously.
    // parent1 fails (c1 is done) and its passing children are promoted;
    // parent2 passes and keeps c3 nested beneath it.
    let result = run(
        r#"group "T" from down depth unlimited where all(from down depth 1, status = "pending")"#,
        &graph,
        &graph,
    )
    .unwrap();
    let mut got = paths(&result.results);
    got.sort_unstable();
    assert_eq!(got, vec!["c1", "c2", "parent2"]);
    assert_eq!(paths(&result.results.iter().find(|n| n.path == "parent2").unwrap().children), vec!["c3"]);
}

#[test]
fn test_count_in_comparison() {
    let graph = tasks_graph();
    let result = run(
        r#"group "T" from down depth 1 where count(from down depth 1) >= 2"#,
        &graph,
        &graph,
    )
    .unwrap();
    assert_eq!(paths(&result.results), vec!["parent1"]);
}

#[test]
fn test_sum_and_comparison() {
    let graph = tasks_graph();
    let result = run(
        r#"group "T" from down depth 1 where sum(from down depth 1, points) = 5"#,
        &graph,
        &graph,
    )
    .unwrap();
    assert_eq!(paths(&result.results), vec!["parent1"]);
}

#[test]
fn test_aggregate_over_group_source() {
    let mut graph = tasks_graph();
    graph.group("Children", r#"group "Children" from down depth 1"#);
    let result = run(
        r#"group "T" from down depth 1 where count(group("Children")) = 1"#,
        &graph,
        &graph,
    )
    .unwrap();
    assert_eq!(paths(&result.results), vec!["parent2"]);
}

#[test]
fn test_count_extra_argument_warns_but_runs() {
    let graph = tasks_graph();
    let result = run(
        r#"group "T" from down depth 1 where count(from down depth 1, status) >= 0"#,
        &graph,
        &graph,
    )
    .unwrap();
    assert_eq!(result.results.len(), 2);
    assert!(
        result.warnings.iter().any(|w| w.contains("count")),
        "{:?}",
        result.warnings
    );
}

#[test]
fn test_validation_rejects_unknown_aggregate_group() {
    let graph = tasks_graph();
    let err = run(
        r#"group "T" from down where count(group("Missing")) > 0"#,
        &graph,
        &graph,
    )
    .unwrap_err();
    match err {
        trailql::TrailQlError::Validation(errors) => {
            assert_eq!(errors.errors.len(), 1);
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
}
