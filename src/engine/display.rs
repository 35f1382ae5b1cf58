//! Display projection: attach the values the host should render.
//!
//! Runs after sorting. `display all` projects every top-level property
//! outside the reserved `file.*` / `traversal.*` namespaces, unioned with
//! the explicitly listed paths; an explicit list projects exactly those
//! paths. Without a `display` clause nothing is projected.

use super::result::QueryResultNode;
use crate::parser::ast::DisplayClause;
use crate::value::resolve_path;
use serde_json::Value as JsonValue;

pub(crate) fn project_display(nodes: &mut [QueryResultNode], display: Option<&DisplayClause>) {
    let Some(display) = display else {
        return;
    };
    for node in nodes {
        node.display_properties = project_node(node, display);
        project_display(&mut node.children, Some(display));
    }
}

fn project_node(
    node: &QueryResultNode,
    display: &DisplayClause,
) -> serde_json::Map<String, JsonValue> {
    let mut out = serde_json::Map::new();
    if display.all {
        for (key, value) in &node.properties {
            if is_reserved(key) {
                continue;
            }
            out.insert(key.clone(), value.clone());
        }
    }
    for path in &display.properties {
        let value = resolve_path(&node.properties, &path.segments);
        out.insert(path.joined(), value.to_json());
    }
    out
}

fn is_reserved(key: &str) -> bool {
    key == "file" || key == "traversal" || key.starts_with("file.") || key.starts_with("traversal.")
}
