//! Query/result cache behavior against a live graph.

use crate::fixtures::MemoryGraph;
use serial_test::serial;
use std::sync::Arc;
use trailql::{execute, query_cache, QueryCache};

fn simple_graph() -> MemoryGraph {
    let mut graph = MemoryGraph::new("A");
    graph.edge("A", "B", "down");
    graph
}

#[test]
fn test_cached_execution_and_file_invalidation() {
    let graph = simple_graph();
    let cache = QueryCache::with_defaults();
    let source = r#"group "T" from down"#;

    // First run: parse through the cache, execute, store.
    let query = cache.parse_query(source, &graph).unwrap();
    let result = Arc::new(execute(&query, &graph).unwrap());
    cache.set_result(source, "A", Arc::clone(&result));

    // Second run: served from cache.
    assert!(cache.get_result(source, "A").is_some());
    assert_eq!(cache.stats().result_hits, 1);

    // B appears in the result tree; touching it evicts the entry.
    cache.invalidate_file("B");
    assert!(cache.get_result(source, "A").is_none());

    // Re-execution recomputes and repopulates.
    let recomputed = Arc::new(execute(&query, &graph).unwrap());
    cache.set_result(source, "A", recomputed);
    assert!(cache.get_result(source, "A").is_some());
}

#[test]
fn test_invalidation_is_scoped_to_involved_paths() {
    let mut graph = simple_graph();
    graph.edge("X", "Y", "down");
    let cache = QueryCache::with_defaults();
    let source = r#"group "T" from down"#;

    let at_a = Arc::new(execute(&cache.parse_query(source, &graph).unwrap(), &graph).unwrap());
    cache.set_result(source, "A", at_a);

    let at_x = graph.with_active("X");
    let result_x = Arc::new(execute(&cache.parse_query(source, &at_x).unwrap(), &at_x).unwrap());
    cache.set_result(source, "X", result_x);

    // Y is only in the X-anchored result.
    cache.invalidate_file("Y");
    assert!(cache.get_result(source, "A").is_some());
    assert!(cache.get_result(source, "X").is_none());
}

#[test]
fn test_parse_cache_shared_across_active_nodes() {
    let graph = simple_graph();
    let cache = QueryCache::with_defaults();
    let source = r#"group "T" from down"#;
    let first = cache.parse_query(source, &graph).unwrap();
    let second = cache.parse_query(source, &graph).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
#[serial]
fn test_global_cache_singleton() {
    let graph = simple_graph();
    let source = r#"group "GlobalCacheTest" from down"#;
    query_cache().clear();

    let query = query_cache().parse_query(source, &graph).unwrap();
    let result = Arc::new(execute(&query, &graph).unwrap());
    query_cache().set_result(source, "A", result);
    assert!(query_cache().get_result(source, "A").is_some());

    query_cache().invalidate_all_results();
    assert!(query_cache().get_result(source, "A").is_none());

    query_cache().clear();
}
