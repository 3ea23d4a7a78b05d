//! Testing utilities for reqflow workspace
//!
//! Shared flow fixtures and a highlight observer that records every call.

#![allow(missing_docs)]

use parking_lot::Mutex;
use reqflow_core::{Connection, Highlight, HighlightObserver, NodeId, RequirementNode, Step, StepKind};
use std::sync::Arc;

/// Observer that appends every highlight to a shared log
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    log: Arc<Mutex<Vec<Highlight>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far
    pub fn highlights(&self) -> Vec<Highlight> {
        self.log.lock().clone()
    }

    pub fn last(&self) -> Option<Highlight> {
        self.log.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.log.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.lock().is_empty()
    }

    pub fn clear(&self) {
        self.log.lock().clear();
    }
}

impl HighlightObserver for RecordingObserver {
    fn on_highlight(&mut self, node_id: Option<&NodeId>, step_index: Option<usize>) {
        self.log
            .lock()
            .push(Highlight::from_parts(node_id, step_index));
    }
}

pub fn highlight(node: &str, step_index: usize) -> Highlight {
    Highlight::Step {
        node_id: NodeId::from(node),
        step_index,
    }
}

/// Node whose steps are all `Given` with text `<id><n>`
pub fn create_node(id: &str, steps: usize) -> RequirementNode {
    RequirementNode::new(
        id,
        (0..steps)
            .map(|i| Step::new(StepKind::Given, format!("{id}{i}")))
            .collect(),
    )
}

/// Connections `ids[0] -> ids[1] -> ...`, ids `c1`, `c2`, ...
pub fn create_chain(ids: &[&str]) -> Vec<Connection> {
    ids.windows(2)
        .enumerate()
        .map(|(i, pair)| Connection::new(format!("c{}", i + 1), pair[0], pair[1]))
        .collect()
}

/// Chain closed back onto its first node
pub fn create_cycle(ids: &[&str]) -> Vec<Connection> {
    let mut connections = create_chain(ids);
    if let (Some(first), Some(last)) = (ids.first(), ids.last()) {
        connections.push(Connection::new(format!("c{}", ids.len()), *last, *first));
    }
    connections
}

/// `r1: [given a, when b]`, `r2: [then c]`, `r1 -> r2`
pub fn worked_example() -> (Vec<RequirementNode>, Vec<Connection>) {
    let nodes = vec![
        RequirementNode::new(
            "r1",
            vec![Step::new(StepKind::Given, "a"), Step::new(StepKind::When, "b")],
        ),
        RequirementNode::new("r2", vec![Step::new(StepKind::Then, "c")]),
    ];
    (nodes, vec![Connection::new("c1", "r1", "r2")])
}

/// Step texts of a path, in order
pub fn step_texts(path: &reqflow_core::ExecutionPath) -> Vec<String> {
    path.iter().map(|e| e.text.clone()).collect()
}
