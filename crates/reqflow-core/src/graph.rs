//! Requirement graph indexing and inspection
//!
//! [`FlowIndex`] resolves string ids to positions once so traversal works on
//! plain indices. [`inspect`] reports structural facts about a flow (entry
//! points, cycles, dangling connections) using `petgraph`.

use crate::types::{Connection, NodeId, RequirementNode};
use indexmap::IndexMap;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use serde::{Deserialize, Serialize};

/// Nodes and connections resolved to input-order indices
#[derive(Debug)]
pub(crate) struct FlowIndex<'a> {
    /// Unique nodes, first occurrence wins
    positions: IndexMap<&'a str, &'a RequirementNode>,
    /// Outgoing targets per node, in connection order
    successors: Vec<Vec<usize>>,
    /// Whether any connection names the node as its target
    targeted: Vec<bool>,
    /// Connections with an endpoint missing from the node list
    dangling: Vec<&'a Connection>,
    /// Ids that appeared more than once
    duplicates: Vec<&'a NodeId>,
}

impl<'a> FlowIndex<'a> {
    pub(crate) fn new(nodes: &'a [RequirementNode], connections: &'a [Connection]) -> Self {
        let mut positions = IndexMap::with_capacity(nodes.len());
        let mut duplicates = Vec::new();
        for node in nodes {
            if positions.contains_key(node.id.as_str()) {
                duplicates.push(&node.id);
            } else {
                positions.insert(node.id.as_str(), node);
            }
        }

        let mut successors = vec![Vec::new(); positions.len()];
        let mut targeted = vec![false; positions.len()];
        let mut dangling = Vec::new();
        for conn in connections {
            let source = positions.get_index_of(conn.source.as_str());
            let target = positions.get_index_of(conn.target.as_str());
            if let Some(t) = target {
                targeted[t] = true;
            }
            match (source, target) {
                (Some(s), Some(t)) => successors[s].push(t),
                _ => dangling.push(conn),
            }
        }

        Self {
            positions,
            successors,
            targeted,
            dangling,
            duplicates,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.positions.len()
    }

    pub(crate) fn contains(&self, id: &NodeId) -> bool {
        self.positions.contains_key(id.as_str())
    }

    pub(crate) fn node(&self, index: usize) -> &'a RequirementNode {
        self.positions[index]
    }

    pub(crate) fn successors(&self, index: usize) -> &[usize] {
        &self.successors[index]
    }

    /// Nodes without an incoming connection, in input order
    pub(crate) fn entry_points(&self) -> Vec<usize> {
        (0..self.len()).filter(|&i| !self.targeted[i]).collect()
    }

    pub(crate) fn dangling(&self) -> &[&'a Connection] {
        &self.dangling
    }

    pub(crate) fn duplicates(&self) -> &[&'a NodeId] {
        &self.duplicates
    }

    fn to_petgraph(&self) -> (DiGraph<usize, ()>, Vec<NodeIndex>) {
        let mut graph = DiGraph::with_capacity(self.len(), 0);
        let handles: Vec<NodeIndex> = (0..self.len()).map(|i| graph.add_node(i)).collect();
        for (source, targets) in self.successors.iter().enumerate() {
            for &target in targets {
                graph.add_edge(handles[source], handles[target], ());
            }
        }
        (graph, handles)
    }
}

/// Structural facts about a requirement flow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSummary {
    /// Number of distinct nodes
    pub node_count: usize,
    /// Number of connections between known nodes
    pub edge_count: usize,
    /// Nodes without incoming connections, in input order
    pub entry_nodes: Vec<NodeId>,
    /// Connection ids whose source or target is not a known node
    pub dangling_connections: Vec<String>,
    /// Connection ids from a known node back to itself
    pub self_loops: Vec<String>,
    /// Node ids listed more than once
    pub duplicate_nodes: Vec<NodeId>,
    /// Whether the resolved connections contain a cycle
    pub has_cycle: bool,
    /// Nodes not reachable from any entry node, in input order
    pub unreachable_nodes: Vec<NodeId>,
}

impl GraphSummary {
    /// Whether the flow has no anomalies worth reporting
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.dangling_connections.is_empty()
            && self.duplicate_nodes.is_empty()
            && self.unreachable_nodes.is_empty()
            && !self.has_cycle
    }
}

/// Inspect nodes and connections without building a path
#[must_use]
pub fn inspect(nodes: &[RequirementNode], connections: &[Connection]) -> GraphSummary {
    let index = FlowIndex::new(nodes, connections);
    let (graph, handles) = index.to_petgraph();
    let entries = index.entry_points();

    let mut reached = vec![false; index.len()];
    for &entry in &entries {
        let mut dfs = Dfs::new(&graph, handles[entry]);
        while let Some(nx) = dfs.next(&graph) {
            reached[graph[nx]] = true;
        }
    }

    GraphSummary {
        node_count: index.len(),
        edge_count: graph.edge_count(),
        entry_nodes: entries.iter().map(|&i| index.node(i).id.clone()).collect(),
        dangling_connections: index.dangling().iter().map(|c| c.id.clone()).collect(),
        self_loops: connections
            .iter()
            .filter(|c| c.source == c.target && index.contains(&c.source))
            .map(|c| c.id.clone())
            .collect(),
        duplicate_nodes: index.duplicates().iter().map(|&id| id.clone()).collect(),
        has_cycle: petgraph::algo::is_cyclic_directed(&graph),
        unreachable_nodes: (0..index.len())
            .filter(|&i| !reached[i])
            .map(|i| index.node(i).id.clone())
            .collect(),
    }
}
