//! reqflow core - requirement flow traversal and playback
//!
//! Turns a graph of Gherkin requirements into one replayable step order and
//! walks it on a timer:
//! 1. **Path building**: depth-first traversal from entry points, safe
//!    against cycles, dangling connections and orphaned nodes
//! 2. **Playback**: a play/pause/step/reset state machine that notifies a
//!    highlight observer on every cursor change
//!
//! # Quick Start
//!
//! ```rust
//! use reqflow_core::prelude::*;
//!
//! let nodes = vec![
//!     RequirementNode::from_gherkin("r1", "Given a\nWhen b").unwrap(),
//!     RequirementNode::from_gherkin("r2", "Then c").unwrap(),
//! ];
//! let connections = vec![Connection::new("c1", "r1", "r2")];
//!
//! let path = build_execution_path(&nodes, &connections);
//! assert_eq!(path.len(), 3);
//!
//! let mut seen = Vec::new();
//! let mut playback = PlaybackController::new(path, |node: Option<&NodeId>, step: Option<usize>| {
//!     seen.push((node.cloned(), step));
//! });
//! playback.play();
//! while let Some(ticket) = playback.pending_tick() {
//!     playback.tick(ticket);
//! }
//! assert!(!playback.state().is_playing);
//! drop(playback);
//! assert_eq!(seen.last(), Some(&(None, None)));
//! ```

// Core modules
pub mod config;
pub mod error;
pub mod types;

// Flow input
pub mod document;
pub mod gherkin;
pub mod graph;

// Traversal and playback
pub mod path;
pub mod playback;

// Re-exports
pub use config::{BuilderConfig, FallbackOrder, PlaybackConfig, ReqflowConfig};
pub use error::{FlowError, GherkinError, PlaybackError, Result};
pub use path::{build_execution_path, ExecutionPathBuilder};
pub use playback::{ChannelObserver, HighlightObserver, PlaybackController, PlaybackDriver, PlaybackHandle};
pub use types::*;

/// Common imports
pub mod prelude {
    pub use crate::config::{BuilderConfig, FallbackOrder, PlaybackConfig, ReqflowConfig};
    pub use crate::document::{FlowDocument, RequirementRecord};
    pub use crate::error::{FlowError, PlaybackError};
    pub use crate::graph::{inspect, GraphSummary};
    pub use crate::path::{build_execution_path, ExecutionPathBuilder};
    pub use crate::playback::{
        ChannelObserver, HighlightObserver, PlaybackController, PlaybackDriver, PlaybackHandle,
        Transport,
    };
    pub use crate::types::{
        Connection, ExecutionPath, ExecutionPathEntry, Highlight, NodeId, PlaybackPhase,
        PlaybackState, RequirementNode, Step, StepKind,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
