//! The graph/context provider interface the executor consumes.
//!
//! The host note application implements [`QueryContext`]; the engine never
//! touches storage itself. All calls are synchronous — the host is
//! expected to serve them from data it already has in memory.

use crate::parser::ast::Query;
use crate::value::PropertyMap;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::HashSet;

/// A directed, labeled edge between two notes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub from_path: String,
    pub to_path: String,
    pub relation: String,
    /// True when the edge was inferred from another relation (e.g. the
    /// reverse of `up` surfacing as `down`).
    pub implied: bool,
    /// The relation the implied edge was derived from.
    pub implied_from: Option<String>,
}

/// How the host renders a relation; `Sequential` relations participate in
/// chain sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VisualDirection {
    Ascending,
    Descending,
    Sequential,
}

/// Snapshot of a note's file-level metadata, served under `file.*`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileMetadata {
    pub name: String,
    pub path: String,
    pub folder: String,
    pub created: NaiveDateTime,
    pub modified: NaiveDateTime,
    pub size: u64,
    pub tags: Vec<String>,
    pub links: Vec<String>,
    pub backlinks: Vec<String>,
}

/// Per-node traversal state, served under `traversal.*` during expression
/// evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraversalContext {
    pub depth: u32,
    pub relation: String,
    pub is_implied: bool,
    pub parent: String,
    pub path: String,
}

/// Everything the executor needs from the host.
pub trait QueryContext {
    fn active_file_path(&self) -> String;
    fn active_file_properties(&self) -> PropertyMap;

    /// Edges leaving `path`, optionally restricted to one relation. Edge
    /// order must be stable per call; traversal order follows it.
    fn outgoing_edges(&self, path: &str, relation: Option<&str>) -> Vec<Edge>;

    /// Reserved for future use; no current operation consumes it.
    fn incoming_edges(&self, path: &str, relation: Option<&str>) -> Vec<Edge> {
        let _ = (path, relation);
        Vec::new()
    }

    fn properties(&self, path: &str) -> PropertyMap;
    fn file_metadata(&self, path: &str) -> Option<FileMetadata>;

    fn relation_names(&self) -> Vec<String>;
    fn visual_direction(&self, relation: &str) -> VisualDirection;
    fn sequential_relations(&self) -> HashSet<String>;

    /// Resolve a group name to its stored query, for `extend` and
    /// `group(...)` aggregate sources.
    fn resolve_group_query(&self, name: &str) -> Option<Query>;
}
