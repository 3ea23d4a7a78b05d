//! Execution path building
//!
//! Flattens a requirement graph into one replayable step order:
//! 1. Entry points are nodes that no connection targets
//! 2. Each entry point is walked depth-first in input order; a node emits
//!    all its steps before any outgoing connection is followed, and
//!    connections are followed in input order
//! 3. A node is emitted at most once, so cycles and shared successors are safe
//! 4. Without any entry point, the configured [`FallbackOrder`] applies
//! 5. Nodes still unvisited afterwards are walked in input order
//!
//! Connections naming unknown nodes are never followed.

use crate::config::{BuilderConfig, FallbackOrder};
use crate::graph::FlowIndex;
use crate::types::{Connection, ExecutionPath, ExecutionPathEntry, RequirementNode};

/// Build the execution path with default configuration
#[must_use]
pub fn build_execution_path(
    nodes: &[RequirementNode],
    connections: &[Connection],
) -> ExecutionPath {
    ExecutionPathBuilder::default().build(nodes, connections)
}

/// Derives execution paths from nodes and connections
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionPathBuilder {
    config: BuilderConfig,
}

impl ExecutionPathBuilder {
    /// Create builder with configuration
    #[inline]
    #[must_use]
    pub fn new(config: BuilderConfig) -> Self {
        Self { config }
    }

    /// Builder configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Build the execution path
    ///
    /// Pure: identical input always yields an identical path.
    #[must_use]
    pub fn build(&self, nodes: &[RequirementNode], connections: &[Connection]) -> ExecutionPath {
        let index = FlowIndex::new(nodes, connections);
        for conn in index.dangling() {
            tracing::warn!(
                connection = %conn.id,
                source = %conn.source,
                target = %conn.target,
                "Connection references unknown requirement"
            );
        }
        for id in index.duplicates() {
            tracing::warn!(requirement = %id, "Duplicate requirement id ignored");
        }

        let mut walk = Walk::new(&index);
        let entries = index.entry_points();
        for &entry in &entries {
            walk.traverse(entry);
        }

        if entries.is_empty() && walk.path.is_empty() {
            tracing::debug!(fallback = ?self.config.fallback, "No entry point found");
            match self.config.fallback {
                FallbackOrder::InputOrder => {
                    for i in 0..index.len() {
                        walk.visit(i);
                    }
                }
                FallbackOrder::FirstNodeEntry => {
                    if index.len() > 0 {
                        walk.traverse(0);
                    }
                }
            }
        }

        for i in 0..index.len() {
            if !walk.visited[i] {
                tracing::debug!(requirement = %index.node(i).id, "Walking unreachable requirement");
                walk.traverse(i);
            }
        }

        tracing::debug!(
            nodes = index.len(),
            entry_points = entries.len(),
            steps = walk.path.len(),
            "Built execution path"
        );
        ExecutionPath::new(walk.path)
    }
}

/// Traversal state: visited set plus output accumulator
struct Walk<'i, 'a> {
    index: &'i FlowIndex<'a>,
    visited: Vec<bool>,
    path: Vec<ExecutionPathEntry>,
}

impl<'i, 'a> Walk<'i, 'a> {
    fn new(index: &'i FlowIndex<'a>) -> Self {
        Self {
            index,
            visited: vec![false; index.len()],
            path: Vec::new(),
        }
    }

    /// Mark `node` visited and emit its steps; false if already visited
    fn visit(&mut self, node: usize) -> bool {
        if self.visited[node] {
            return false;
        }
        self.visited[node] = true;

        let requirement = self.index.node(node);
        self.path.extend(
            requirement
                .steps
                .iter()
                .enumerate()
                .map(|(step_index, step)| ExecutionPathEntry {
                    node_id: requirement.id.clone(),
                    step_index,
                    kind: step.kind,
                    text: step.text.clone(),
                }),
        );
        true
    }

    /// Depth-first walk from `start` in pre-order
    fn traverse(&mut self, start: usize) {
        if !self.visit(start) {
            return;
        }

        // (node, next outgoing connection to follow)
        let mut stack = vec![(start, 0usize)];
        while let Some(frame) = stack.last_mut() {
            let next = self.index.successors(frame.0).get(frame.1).copied();
            frame.1 += 1;
            match next {
                Some(target) => {
                    if self.visit(target) {
                        stack.push((target, 0));
                    }
                }
                None => {
                    stack.pop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NodeId, Step, StepKind};
    use pretty_assertions::assert_eq;

    fn node(id: &str, steps: usize) -> RequirementNode {
        RequirementNode::new(
            id,
            (0..steps)
                .map(|i| Step::new(StepKind::Given, format!("{id}{i}")))
                .collect(),
        )
    }

    fn order(path: &ExecutionPath) -> Vec<String> {
        path.iter().map(|e| e.text.clone()).collect()
    }

    #[test]
    fn worked_example() {
        let nodes = vec![
            RequirementNode::new(
                "r1",
                vec![Step::new(StepKind::Given, "a"), Step::new(StepKind::When, "b")],
            ),
            RequirementNode::new("r2", vec![Step::new(StepKind::Then, "c")]),
        ];
        let conns = vec![Connection::new("c1", "r1", "r2")];
        let path = build_execution_path(&nodes, &conns);
        let expected = vec![
            ExecutionPathEntry {
                node_id: NodeId::from("r1"),
                step_index: 0,
                kind: StepKind::Given,
                text: "a".into(),
            },
            ExecutionPathEntry {
                node_id: NodeId::from("r1"),
                step_index: 1,
                kind: StepKind::When,
                text: "b".into(),
            },
            ExecutionPathEntry {
                node_id: NodeId::from("r2"),
                step_index: 0,
                kind: StepKind::Then,
                text: "c".into(),
            },
        ];
        assert_eq!(path.entries(), &expected[..]);
    }

    #[test]
    fn follows_connections_depth_first_in_input_order() {
        // a -> c, a -> b, c -> d
        let nodes = vec![node("a", 1), node("b", 1), node("c", 1), node("d", 1)];
        let conns = vec![
            Connection::new("1", "a", "c"),
            Connection::new("2", "a", "b"),
            Connection::new("3", "c", "d"),
        ];
        let path = build_execution_path(&nodes, &conns);
        assert_eq!(order(&path), vec!["a0", "c0", "d0", "b0"]);
    }

    #[test]
    fn diamond_emits_shared_successor_once() {
        let nodes = vec![node("a", 1), node("b", 1), node("c", 1), node("d", 2)];
        let conns = vec![
            Connection::new("1", "a", "b"),
            Connection::new("2", "a", "c"),
            Connection::new("3", "b", "d"),
            Connection::new("4", "c", "d"),
        ];
        let path = build_execution_path(&nodes, &conns);
        assert_eq!(order(&path), vec!["a0", "b0", "d0", "d1", "c0"]);
    }

    #[test]
    fn pure_cycle_falls_back_to_input_order() {
        let nodes = vec![node("a", 1), node("b", 1), node("c", 1)];
        let conns = vec![
            Connection::new("1", "a", "c"),
            Connection::new("2", "c", "b"),
            Connection::new("3", "b", "a"),
        ];
        let path = build_execution_path(&nodes, &conns);
        assert_eq!(order(&path), vec!["a0", "b0", "c0"]);
    }

    #[test]
    fn first_node_entry_fallback_keeps_connection_order() {
        let nodes = vec![node("a", 1), node("b", 1), node("c", 1)];
        let conns = vec![
            Connection::new("1", "a", "c"),
            Connection::new("2", "c", "b"),
            Connection::new("3", "b", "a"),
        ];
        let builder =
            ExecutionPathBuilder::new(BuilderConfig::default().with_fallback(FallbackOrder::FirstNodeEntry));
        assert_eq!(order(&builder.build(&nodes, &conns)), vec!["a0", "c0", "b0"]);
    }

    #[test]
    fn zero_step_nodes_still_propagate() {
        let nodes = vec![node("a", 0), node("b", 2)];
        let conns = vec![Connection::new("1", "a", "b")];
        let path = build_execution_path(&nodes, &conns);
        assert_eq!(order(&path), vec!["b0", "b1"]);
    }

    #[test]
    fn self_loop_is_harmless() {
        let nodes = vec![node("a", 2)];
        let conns = vec![Connection::new("1", "a", "a")];
        // a targets itself, so there is no entry point and the fallback applies
        assert_eq!(order(&build_execution_path(&nodes, &conns)), vec!["a0", "a1"]);
    }

    #[test]
    fn dangling_connections_are_ignored() {
        let nodes = vec![node("a", 1), node("b", 1)];
        let conns = vec![
            Connection::new("1", "a", "ghost"),
            Connection::new("2", "a", "b"),
            Connection::new("3", "phantom", "a"),
        ];
        let path = build_execution_path(&nodes, &conns);
        assert_eq!(order(&path), vec!["a0", "b0"]);
    }

    #[test]
    fn cycle_hanging_off_nothing_is_swept() {
        // a is the only entry point; b <-> c is unreachable from it
        let nodes = vec![node("a", 1), node("b", 1), node("c", 1)];
        let conns = vec![Connection::new("1", "b", "c"), Connection::new("2", "c", "b")];
        let path = build_execution_path(&nodes, &conns);
        assert_eq!(order(&path), vec!["a0", "b0", "c0"]);
    }

    #[test]
    fn duplicate_ids_emit_first_occurrence_only() {
        let nodes = vec![node("a", 1), RequirementNode::new("a", vec![Step::new(StepKind::But, "dup")])];
        let path = build_execution_path(&nodes, &[]);
        assert_eq!(order(&path), vec!["a0"]);
    }

    #[test]
    fn empty_inputs_give_empty_path() {
        assert!(build_execution_path(&[], &[]).is_empty());
        assert!(build_execution_path(&[], &[Connection::new("1", "a", "b")]).is_empty());
    }
}
