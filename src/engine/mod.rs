//! Query execution.
//!
//! `execute` runs a validated query against the host's graph provider:
//! evaluate `when` at the active node, traverse the `from` clause with
//! `prune`, filter with `where` (promoting surviving descendants of
//! filtered nodes), sort (chain-aware), and project display properties.
//!
//! Everything is synchronous on the caller's thread. The only state that
//! outlives a call is what the caller does with the returned result.

pub mod aggregates;
pub mod chain_sort;
pub mod context;
pub mod display;
pub mod errors;
pub mod evaluator;
pub mod result;
pub mod traversal;

pub use context::{Edge, FileMetadata, QueryContext, TraversalContext, VisualDirection};
pub use errors::RuntimeError;
pub use result::{QueryResult, QueryResultNode};

use crate::parser::ast::{Expr, Query};
use aggregates::AggregateState;
use evaluator::{eval_expr, EvalTarget};
use std::cell::RefCell;
use std::collections::HashSet;

/// Shared state for one execution: the provider plus warning and
/// aggregate-memo sinks. Local to a single `execute` call.
pub(crate) struct ExecEnv<'a> {
    pub ctx: &'a dyn QueryContext,
    pub warnings: RefCell<Vec<String>>,
    pub aggregates: RefCell<AggregateState>,
}

impl<'a> ExecEnv<'a> {
    pub(crate) fn new(ctx: &'a dyn QueryContext) -> Self {
        ExecEnv {
            ctx,
            warnings: RefCell::new(Vec::new()),
            aggregates: RefCell::new(AggregateState::default()),
        }
    }

    pub(crate) fn warn(&self, message: String) {
        log::warn!("{message}");
        self.warnings.borrow_mut().push(message);
    }

    pub(crate) fn take_warnings(&self) -> Vec<String> {
        std::mem::take(&mut self.warnings.borrow_mut())
    }
}

/// Execute a query at the provider's active node.
pub fn execute(query: &Query, ctx: &dyn QueryContext) -> Result<QueryResult, RuntimeError> {
    let env = ExecEnv::new(ctx);
    let active_path = ctx.active_file_path();
    let active_props = ctx.active_file_properties();

    // `when` gates visibility of the whole query at this node.
    if let Some(when) = &query.when {
        let target = EvalTarget {
            path: &active_path,
            props: &active_props,
            traversal: None,
        };
        if !eval_expr(when, &target, &env)?.is_truthy() {
            return Ok(QueryResult::hidden(env.take_warnings()));
        }
    }

    let ancestors = HashSet::from([active_path.clone()]);
    let mut results = traversal::traverse_from(
        &active_path,
        &query.from.relations,
        query.prune.as_ref(),
        &ancestors,
        std::slice::from_ref(&active_path),
        &env,
    )?;

    if let Some(where_expr) = &query.where_clause {
        results = apply_where(results, where_expr, &env)?;
    }

    chain_sort::sort_results(&mut results, query.sort.as_ref(), ctx);
    display::project_display(&mut results, query.display.as_ref());

    Ok(QueryResult {
        visible: true,
        results,
        warnings: env.take_warnings(),
    })
}

/// Bottom-up `where` filter. A failing node is dropped; its surviving
/// children are re-emitted at its tree position with
/// `has_filtered_ancestor` set.
fn apply_where(
    nodes: Vec<QueryResultNode>,
    where_expr: &Expr,
    env: &ExecEnv<'_>,
) -> Result<Vec<QueryResultNode>, RuntimeError> {
    let mut out = Vec::new();
    for mut node in nodes {
        let children = std::mem::take(&mut node.children);
        let kept_children = apply_where(children, where_expr, env)?;

        let traversal_ctx = node.traversal_context();
        let target = EvalTarget {
            path: &node.path,
            props: &node.properties,
            traversal: Some(&traversal_ctx),
        };
        if eval_expr(where_expr, &target, env)?.is_truthy() {
            node.children = kept_children;
            out.push(node);
        } else {
            for mut child in kept_children {
                child.has_filtered_ancestor = true;
                out.push(child);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::context::{Edge, FileMetadata, QueryContext, VisualDirection};
    use crate::parser::ast::Query;
    use crate::value::PropertyMap;
    use chrono::NaiveDate;
    use std::collections::{HashMap, HashSet};

    /// In-memory graph provider for engine tests: notes with JSON
    /// properties, explicit edges, stored group queries.
    pub struct GraphFixture {
        pub active: String,
        pub notes: HashMap<String, PropertyMap>,
        pub edges: Vec<Edge>,
        pub sequential: HashSet<String>,
        pub groups: HashMap<String, Query>,
    }

    impl GraphFixture {
        pub fn new(active: &str) -> Self {
            GraphFixture {
                active: active.to_string(),
                notes: HashMap::new(),
                edges: Vec::new(),
                sequential: HashSet::new(),
                groups: HashMap::new(),
            }
        }

        pub fn add_note(&mut self, path: &str, props: serde_json::Value) {
            let props = match props {
                serde_json::Value::Object(map) => map,
                other => panic!("note properties must be an object, got {other:?}"),
            };
            self.notes.insert(path.to_string(), props);
        }

        pub fn add_edge(&mut self, from: &str, to: &str, relation: &str) {
            self.edges.push(Edge {
                from_path: from.to_string(),
                to_path: to.to_string(),
                relation: relation.to_string(),
                implied: false,
                implied_from: None,
            });
        }

        pub fn add_implied_edge(&mut self, from: &str, to: &str, relation: &str, source: &str) {
            self.edges.push(Edge {
                from_path: from.to_string(),
                to_path: to.to_string(),
                relation: relation.to_string(),
                implied: true,
                implied_from: Some(source.to_string()),
            });
        }

        pub fn mark_sequential(&mut self, relation: &str) {
            self.sequential.insert(relation.to_string());
        }

        pub fn add_group(&mut self, name: &str, source: &str) {
            let query =
                crate::parser::parse_query(crate::lexer::tokenize(source).unwrap()).unwrap();
            self.groups.insert(name.to_string(), query);
        }
    }

    impl QueryContext for GraphFixture {
        fn active_file_path(&self) -> String {
            self.active.clone()
        }
        fn active_file_properties(&self) -> PropertyMap {
            self.notes.get(&self.active).cloned().unwrap_or_default()
        }
        fn outgoing_edges(&self, path: &str, relation: Option<&str>) -> Vec<Edge> {
            self.edges
                .iter()
                .filter(|e| e.from_path == path)
                .filter(|e| relation.is_none_or(|r| e.relation == r))
                .cloned()
                .collect()
        }
        fn properties(&self, path: &str) -> PropertyMap {
            self.notes.get(path).cloned().unwrap_or_default()
        }
        fn file_metadata(&self, path: &str) -> Option<FileMetadata> {
            if !self.notes.contains_key(path) {
                return None;
            }
            let midnight = NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap();
            let name = path.rsplit('/').next().unwrap_or(path).to_string();
            let folder = match path.rfind('/') {
                Some(idx) => path[..idx].to_string(),
                None => String::new(),
            };
            Some(FileMetadata {
                name,
                path: path.to_string(),
                folder,
                created: midnight,
                modified: midnight,
                size: 100,
                tags: Vec::new(),
                links: Vec::new(),
                backlinks: Vec::new(),
            })
        }
        fn relation_names(&self) -> Vec<String> {
            let mut names: Vec<String> =
                self.edges.iter().map(|e| e.relation.clone()).collect();
            names.sort();
            names.dedup();
            names
        }
        fn visual_direction(&self, relation: &str) -> VisualDirection {
            if self.sequential.contains(relation) {
                VisualDirection::Sequential
            } else {
                VisualDirection::Descending
            }
        }
        fn sequential_relations(&self) -> HashSet<String> {
            self.sequential.clone()
        }
        fn resolve_group_query(&self, name: &str) -> Option<Query> {
            self.groups.get(name).cloned()
        }
    }
}
