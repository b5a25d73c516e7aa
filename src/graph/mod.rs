//! Dependency and inheritance graphs over analysis results.
//!
//! Nodes are result unique names. Graphs are built once, after parsing, by
//! [`build_graphs`] and are read-only afterwards.

mod builder;
mod resolve;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use crate::analysis::ResultKind;

pub use builder::build_graphs;
pub use resolve::{normalize_reference, ResolutionPolicy, Resolver};

/// The graphs built for every analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GraphKind {
    FileDependency,
    EntityDependency,
    EntityInheritance,
    /// Union of entity dependency and inheritance.
    EntityComplete,
}

impl GraphKind {
    pub const ALL: [GraphKind; 4] = [
        GraphKind::FileDependency,
        GraphKind::EntityDependency,
        GraphKind::EntityInheritance,
        GraphKind::EntityComplete,
    ];

    /// Slug used in metric keys and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphKind::FileDependency => "file-dependency-graph",
            GraphKind::EntityDependency => "entity-dependency-graph",
            GraphKind::EntityInheritance => "entity-inheritance-graph",
            GraphKind::EntityComplete => "entity-complete-graph",
        }
    }

    /// Which results the graph's nodes are.
    pub fn scope(&self) -> ResultKind {
        match self {
            GraphKind::FileDependency => ResultKind::File,
            _ => ResultKind::Entity,
        }
    }
}

impl fmt::Display for GraphKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A directed graph keyed by unique name.
///
/// Nodes and edges are inserted in sorted order, so two graphs built from
/// the same input are identical down to their petgraph indices.
#[derive(Debug, Clone)]
pub struct CodeGraph {
    kind: GraphKind,
    graph: DiGraph<String, ()>,
    index: BTreeMap<String, NodeIndex>,
}

impl CodeGraph {
    pub(crate) fn from_parts(
        kind: GraphKind,
        nodes: BTreeSet<String>,
        edges: &BTreeSet<(String, String)>,
    ) -> Self {
        let mut graph = DiGraph::with_capacity(nodes.len(), edges.len());
        let mut index = BTreeMap::new();
        for node in nodes {
            let idx = graph.add_node(node.clone());
            index.insert(node, idx);
        }

        for (from, to) in edges {
            if from == to {
                continue;
            }
            if let (Some(&a), Some(&b)) = (index.get(from), index.get(to)) {
                graph.add_edge(a, b, ());
            }
        }

        Self { kind, graph, index }
    }

    /// Union of two graphs' nodes and edges under a new kind.
    pub(crate) fn union(kind: GraphKind, a: &CodeGraph, b: &CodeGraph) -> Self {
        let nodes: BTreeSet<String> = a.index.keys().chain(b.index.keys()).cloned().collect();
        let edges: BTreeSet<(String, String)> = a
            .edges()
            .into_iter()
            .chain(b.edges())
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect();
        Self::from_parts(kind, nodes, &edges)
    }

    pub fn kind(&self) -> GraphKind {
        self.kind
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Node names in sorted order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    pub fn contains_node(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Edges as (from, to), sorted.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        let mut edges: Vec<(&str, &str)> = self
            .graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(a, b)| (self.graph[a].as_str(), self.graph[b].as_str()))
            .collect();
        edges.sort_unstable();
        edges
    }

    pub fn contains_edge(&self, from: &str, to: &str) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&a), Some(&b)) => self.graph.find_edge(a, b).is_some(),
            _ => false,
        }
    }

    pub fn in_degree(&self, name: &str) -> usize {
        self.degree(name, Direction::Incoming)
    }

    pub fn out_degree(&self, name: &str) -> usize {
        self.degree(name, Direction::Outgoing)
    }

    fn degree(&self, name: &str, direction: Direction) -> usize {
        self.index
            .get(name)
            .map(|&idx| self.graph.neighbors_directed(idx, direction).count())
            .unwrap_or(0)
    }

    /// Direct successors of a node, sorted.
    pub fn successors(&self, name: &str) -> Vec<&str> {
        let Some(&idx) = self.index.get(name) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|n| self.graph[n].as_str())
            .collect();
        out.sort_unstable();
        out
    }

    /// The underlying petgraph graph, for graph algorithms.
    pub fn inner(&self) -> &DiGraph<String, ()> {
        &self.graph
    }

    pub(crate) fn node_index(&self, name: &str) -> Option<NodeIndex> {
        self.index.get(name).copied()
    }
}

/// Every graph of one analysis plus resolution diagnostics.
#[derive(Debug, Clone, Default)]
pub struct Graphs {
    graphs: BTreeMap<GraphKind, CodeGraph>,
    unresolved_dependencies: usize,
    unresolved_inheritance: usize,
}

impl Graphs {
    pub fn get(&self, kind: GraphKind) -> Option<&CodeGraph> {
        self.graphs.get(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CodeGraph> {
        self.graphs.values()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    /// Graphs whose nodes are results of `scope`.
    pub fn for_scope(&self, scope: ResultKind) -> Vec<&CodeGraph> {
        self.graphs
            .values()
            .filter(|g| g.kind().scope() == scope)
            .collect()
    }

    /// Dependency references (files and entities) that matched nothing.
    pub fn unresolved_dependencies(&self) -> usize {
        self.unresolved_dependencies
    }

    /// Parent references that matched no entity.
    pub fn unresolved_inheritance(&self) -> usize {
        self.unresolved_inheritance
    }
}
