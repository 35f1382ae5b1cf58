//! In-memory graph provider shared by the integration tests.

use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use trailql::engine::{Edge, FileMetadata, QueryContext, VisualDirection};
use trailql::value::PropertyMap;
use trailql::{Query, ValidationCatalog};

/// A small note vault: notes with JSON properties, labeled edges, stored
/// group queries, and a designated active note.
pub struct MemoryGraph {
    pub active: String,
    notes: HashMap<String, PropertyMap>,
    edges: Vec<Edge>,
    sequential: HashSet<String>,
    groups: HashMap<String, Query>,
}

impl MemoryGraph {
    pub fn new(active: &str) -> Self {
        let mut graph = MemoryGraph {
            active: active.to_string(),
            notes: HashMap::new(),
            edges: Vec::new(),
            sequential: HashSet::new(),
            groups: HashMap::new(),
        };
        graph.note(active, serde_json::json!({}));
        graph
    }

    pub fn note(&mut self, path: &str, props: serde_json::Value) -> &mut Self {
        let props = match props {
            serde_json::Value::Object(map) => map,
            other => panic!("note properties must be an object, got {other:?}"),
        };
        self.notes.insert(path.to_string(), props);
        self
    }

    pub fn edge(&mut self, from: &str, to: &str, relation: &str) -> &mut Self {
        for path in [from, to] {
            self.notes.entry(path.to_string()).or_default();
        }
        self.edges.push(Edge {
            from_path: from.to_string(),
            to_path: to.to_string(),
            relation: relation.to_string(),
            implied: false,
            implied_from: None,
        });
        self
    }

    pub fn sequential(&mut self, relation: &str) -> &mut Self {
        self.sequential.insert(relation.to_string());
        self
    }

    pub fn group(&mut self, name: &str, source: &str) -> &mut Self {
        let query = trailql::parse(source).expect("group query parses");
        self.groups.insert(name.to_string(), query);
        self
    }

    /// Switch the active note without rebuilding the graph.
    pub fn with_active(&self, active: &str) -> MemoryGraph {
        MemoryGraph {
            active: active.to_string(),
            notes: self.notes.clone(),
            edges: self.edges.clone(),
            sequential: self.sequential.clone(),
            groups: self.groups.clone(),
        }
    }
}

impl QueryContext for MemoryGraph {
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
        let stamp = NaiveDate::from_ymd_opt(2024, 1, 1)?.and_hms_opt(0, 0, 0)?;
        Some(FileMetadata {
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            path: path.to_string(),
            folder: path.rfind('/').map(|i| path[..i].to_string()).unwrap_or_default(),
            created: stamp,
            modified: stamp,
            size: 100,
            tags: Vec::new(),
            links: Vec::new(),
            backlinks: Vec::new(),
        })
    }
    fn relation_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.edges.iter().map(|e| e.relation.clone()).collect();
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

impl ValidationCatalog for MemoryGraph {
    fn has_relation(&self, name: &str) -> bool {
        QueryContext::relation_names(self).iter().any(|r| r == name) || self.sequential.contains(name)
    }
    fn relation_names(&self) -> Vec<String> {
        QueryContext::relation_names(self)
    }
    fn has_group(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }
    fn group_names(&self) -> Vec<String> {
        self.groups.keys().cloned().collect()
    }
}

/// Paths of a result level, in order.
pub fn paths(nodes: &[trailql::QueryResultNode]) -> Vec<&str> {
    nodes.iter().map(|n| n.path.as_str()).collect()
}
