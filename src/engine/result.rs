//! Execution output types.

use super::context::{TraversalContext, VisualDirection};
use crate::value::PropertyMap;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::HashSet;

/// One node reached by traversal, with the step that reached it and the
/// subtree found below it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResultNode {
    pub path: String,
    /// Relation and depth of the traversal step that reached this node.
    pub relation: String,
    pub depth: u32,
    pub implied: bool,
    pub implied_from: Option<String>,
    /// The path traversal came from (the active node under `flatten`).
    pub parent: String,
    /// Chain of paths from the active node down to this node, inclusive.
    pub traversal_path: Vec<String>,
    /// Property snapshot used for filtering and sorting.
    pub properties: PropertyMap,
    /// Projected values per the `display` clause.
    pub display_properties: serde_json::Map<String, JsonValue>,
    pub visual_direction: VisualDirection,
    /// True when an ancestor failed `where` but this node survived and was
    /// promoted into its place.
    pub has_filtered_ancestor: bool,
    pub children: Vec<QueryResultNode>,
}

impl QueryResultNode {
    /// The traversal context expressions see when evaluated at this node.
    pub fn traversal_context(&self) -> TraversalContext {
        TraversalContext {
            depth: self.depth,
            relation: self.relation.clone(),
            is_implied: self.implied,
            parent: self.parent.clone(),
            path: self.path.clone(),
        }
    }

    /// Last path component, the deterministic sort tiebreaker.
    pub fn basename(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Result of executing one query at one active node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    /// False iff the `when` clause rejected the active node; `results` is
    /// empty in that case.
    pub visible: bool,
    pub results: Vec<QueryResultNode>,
    /// Non-fatal diagnostics accumulated during execution.
    pub warnings: Vec<String>,
}

impl QueryResult {
    pub fn hidden(warnings: Vec<String>) -> Self {
        QueryResult {
            visible: false,
            results: Vec::new(),
            warnings,
        }
    }

    /// Every path appearing anywhere in the result tree. The cache uses
    /// this for fine-grained invalidation.
    pub fn collect_paths(&self) -> HashSet<String> {
        fn walk(nodes: &[QueryResultNode], out: &mut HashSet<String>) {
            for node in nodes {
                out.insert(node.path.clone());
                walk(&node.children, out);
            }
        }
        let mut paths = HashSet::new();
        walk(&self.results, &mut paths);
        paths
    }
}
