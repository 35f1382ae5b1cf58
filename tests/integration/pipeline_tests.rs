//! Whole-pipeline behavior: parse → validate → execute via `run`, plus
//! user-facing error rendering.

use crate::fixtures::{paths, MemoryGraph};
use trailql::{parse, run, TrailQlError};

fn graph() -> MemoryGraph {
    let mut graph = MemoryGraph::new("home");
    graph
        .note("task1", serde_json::json!({"status": "open", "priority": 2}))
        .note("task2", serde_json::json!({"status": "done", "priority": 1}))
        .edge("home", "task1", "down")
        .edge("home", "task2", "down");
    graph
}

#[test]
fn test_run_full_query() {
    let graph = graph();
    let result = run(
        r#"group "Open Tasks"
           from down depth 1
           where status != "done"
           sort by priority
           display status, priority"#,
        &graph,
        &graph,
    )
    .unwrap();
    assert!(result.visible);
    assert_eq!(paths(&result.results), vec!["task1"]);
    assert_eq!(
        result.results[0].display_properties["status"],
        serde_json::json!("open")
    );
    assert!(result.warnings.is_empty());
}

#[test]
fn test_run_stops_on_validation_errors() {
    let graph = graph();
    let err = run(
        r#"group "T" from nowhere where frobnicate(x)"#,
        &graph,
        &graph,
    )
    .unwrap_err();
    match err {
        TrailQlError::Validation(errors) => {
            assert_eq!(errors.errors.len(), 2, "all problems reported together");
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[test]
fn test_parse_error_renders_with_caret() {
    let source = "group \"T\"\nfrom down\nwhere and";
    let err = parse(source).unwrap_err();
    let rendered = err.render(source);
    assert!(rendered.contains("line 3"), "{rendered}");
    assert!(rendered.contains("where and"), "{rendered}");
    assert!(rendered.contains('^'), "{rendered}");
}

#[test]
fn test_unicode_identifiers_end_to_end() {
    let mut graph = MemoryGraph::new("start");
    graph
        .note("π-note", serde_json::json!({"Übersicht": "ja"}))
        .edge("start", "π-note", "down");
    let result = run(
        r#"group "Ü" from down where Übersicht = "ja""#,
        &graph,
        &graph,
    )
    .unwrap();
    assert_eq!(paths(&result.results), vec!["π-note"]);
}

#[test]
fn test_validated_query_executes_without_reference_errors() {
    // Validation soundness: a query that validates never hits unknown
    // relation/group/function errors at runtime.
    let mut graph = graph();
    graph.group("Archive", r#"group "Archive" from down depth 1"#);
    let result = run(
        r#"group "T"
           from down depth 2 extend "Archive"
           where exists(status) and count(group("Archive")) >= 0
           sort by priority desc
           display all"#,
        &graph,
        &graph,
    )
    .unwrap();
    assert!(result.visible);
}

#[test]
fn test_empty_traversal_is_ok() {
    let mut graph = MemoryGraph::new("lonely");
    // Catalog needs the relation to exist even if no edge leaves `lonely`.
    graph.edge("other", "third", "down");
    let result = run(r#"group "T" from down"#, &graph, &graph).unwrap();
    assert!(result.visible);
    assert!(result.results.is_empty());
}
