//! Error types for reqflow
//!
//! Path building and playback are total and never fail. Errors only arise
//! at the edges:
//! - Loading flow documents and configuration files
//! - Parsing Gherkin scenario text
//! - Talking to a playback driver that has shut down

use std::path::PathBuf;

/// Main reqflow error type
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// File could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that was being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON document
    #[error("invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed YAML document
    #[error("invalid YAML document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Malformed TOML configuration
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// File extension not recognised
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// Scenario text rejected
    #[error("gherkin error in requirement {requirement}: {source}")]
    Gherkin {
        /// Requirement whose scenario failed to parse
        requirement: String,
        /// Underlying error
        #[source]
        source: GherkinError,
    },
}

impl FlowError {
    /// Wrap an io error with the path that caused it
    #[inline]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if the error comes from document content rather than the filesystem
    #[inline]
    #[must_use]
    pub fn is_content_error(&self) -> bool {
        !matches!(self, Self::Io { .. } | Self::UnsupportedFormat(_))
    }
}

/// Gherkin scenario errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GherkinError {
    /// No line started with a step keyword
    #[error("no valid Gherkin steps found, use Given/When/Then/And/But keywords")]
    NoSteps,
}

/// Playback driver errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackError {
    /// The driver task is no longer running
    #[error("playback driver has shut down")]
    DriverClosed,
}

/// Result alias for reqflow operations
pub type Result<T> = std::result::Result<T, FlowError>;
