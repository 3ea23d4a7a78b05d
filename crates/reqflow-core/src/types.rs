//! Core data model for requirement flows
//!
//! Requirement nodes carry ordered Gherkin steps; connections are directed
//! edges between nodes. An [`ExecutionPath`] is the flattened step order
//! derived from both.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque requirement node identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create node id from any string-like value
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Gherkin step category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    /// Precondition
    Given,
    /// Action
    When,
    /// Expected outcome
    Then,
    /// Continuation of the previous category
    And,
    /// Negative continuation
    But,
}

impl StepKind {
    /// All kinds in keyword-matching order
    pub const ALL: [StepKind; 5] = [
        StepKind::Given,
        StepKind::When,
        StepKind::Then,
        StepKind::And,
        StepKind::But,
    ];

    /// Capitalised Gherkin keyword
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            StepKind::Given => "Given",
            StepKind::When => "When",
            StepKind::Then => "Then",
            StepKind::And => "And",
            StepKind::But => "But",
        }
    }

    /// Lowercase wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            StepKind::Given => "given",
            StepKind::When => "when",
            StepKind::Then => "then",
            StepKind::And => "and",
            StepKind::But => "but",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a step keyword
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown step kind: {0}")]
pub struct UnknownStepKind(pub String);

impl FromStr for StepKind {
    type Err = UnknownStepKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StepKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownStepKind(s.to_string()))
    }
}

/// One Given/When/Then/And/But line of a requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Step category
    #[serde(rename = "stepType", alias = "kind")]
    pub kind: StepKind,
    /// Free-form step text
    #[serde(rename = "stepText", alias = "text")]
    pub text: String,
}

impl Step {
    /// Create a step
    #[inline]
    #[must_use]
    pub fn new(kind: StepKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// A requirement with its ordered steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementNode {
    /// Node identifier
    pub id: NodeId,
    /// Human readable title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Steps in execution order
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl RequirementNode {
    /// Create a node without a title
    #[must_use]
    pub fn new(id: impl Into<NodeId>, steps: Vec<Step>) -> Self {
        Self {
            id: id.into(),
            title: None,
            steps,
        }
    }

    /// Set the title
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Directed edge between two requirement nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Connection identifier
    pub id: String,
    /// Source node
    #[serde(alias = "sourceRequirementId")]
    pub source: NodeId,
    /// Target node
    #[serde(alias = "targetRequirementId")]
    pub target: NodeId,
}

impl Connection {
    /// Create a connection
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        }
    }
}

/// One flattened step of an execution path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPathEntry {
    /// Owning node
    pub node_id: NodeId,
    /// Index of the step within its node
    pub step_index: usize,
    /// Step category
    #[serde(rename = "stepType", alias = "kind")]
    pub kind: StepKind,
    /// Step text
    #[serde(rename = "stepText", alias = "text")]
    pub text: String,
}

/// Ordered sequence of steps derived from nodes and connections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionPath(Vec<ExecutionPathEntry>);

impl ExecutionPath {
    /// Wrap a list of entries
    #[inline]
    #[must_use]
    pub fn new(entries: Vec<ExecutionPathEntry>) -> Self {
        Self(entries)
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the path has no entries
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entry at `index`
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ExecutionPathEntry> {
        self.0.get(index)
    }

    /// Iterate entries in order
    pub fn iter(&self) -> std::slice::Iter<'_, ExecutionPathEntry> {
        self.0.iter()
    }

    /// Borrow all entries
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[ExecutionPathEntry] {
        &self.0
    }

    /// `(node id, step index)` pairs in order
    #[must_use]
    pub fn positions(&self) -> Vec<(NodeId, usize)> {
        self.0
            .iter()
            .map(|e| (e.node_id.clone(), e.step_index))
            .collect()
    }
}

impl<'a> IntoIterator for &'a ExecutionPath {
    type Item = &'a ExecutionPathEntry;
    type IntoIter = std::slice::Iter<'a, ExecutionPathEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Cursor and play flag owned by the playback controller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    /// Current index into the path
    pub cursor: usize,
    /// Whether the timer is driving the cursor
    pub is_playing: bool,
}

/// Named phase of a playback state against a path of known length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackPhase {
    /// Cursor at zero, not playing
    IdleAtStart,
    /// Timer running
    Playing,
    /// Stopped somewhere inside the path
    PausedMid,
    /// Cursor ran past the last entry
    Finished,
}

impl PlaybackState {
    /// Phase of this state for a path of `len` entries
    #[must_use]
    pub fn phase(self, len: usize) -> PlaybackPhase {
        if self.cursor >= len {
            PlaybackPhase::Finished
        } else if self.is_playing {
            PlaybackPhase::Playing
        } else if self.cursor == 0 {
            PlaybackPhase::IdleAtStart
        } else {
            PlaybackPhase::PausedMid
        }
    }
}

/// Notification sent to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Highlight {
    /// Highlight one step of one node
    Step {
        /// Node to highlight
        node_id: NodeId,
        /// Step within the node
        step_index: usize,
    },
    /// Nothing highlighted
    Cleared,
}

impl Highlight {
    /// Highlight for a path entry
    #[must_use]
    pub fn of(entry: &ExecutionPathEntry) -> Self {
        Highlight::Step {
            node_id: entry.node_id.clone(),
            step_index: entry.step_index,
        }
    }

    /// Rebuild from the nullable `(node id, step index)` pair
    #[must_use]
    pub fn from_parts(node_id: Option<&NodeId>, step_index: Option<usize>) -> Self {
        match (node_id, step_index) {
            (Some(node_id), Some(step_index)) => Highlight::Step {
                node_id: node_id.clone(),
                step_index,
            },
            _ => Highlight::Cleared,
        }
    }

    /// Split into the nullable `(node id, step index)` pair
    #[must_use]
    pub fn parts(&self) -> (Option<&NodeId>, Option<usize>) {
        match self {
            Highlight::Step {
                node_id,
                step_index,
            } => (Some(node_id), Some(*step_index)),
            Highlight::Cleared => (None, None),
        }
    }
}

impl fmt::Display for Highlight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Highlight::Step {
                node_id,
                step_index,
            } => write!(f, "({node_id}, {step_index})"),
            Highlight::Cleared => f.write_str("(null, null)"),
        }
    }
}
