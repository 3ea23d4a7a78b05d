//! Configuration for path building and playback

use crate::error::{FlowError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default time between playback ticks
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1500;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReqflowConfig {
    /// Playback timing
    pub playback: PlaybackConfig,
    /// Path building
    pub builder: BuilderConfig,
}

impl ReqflowConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With playback configuration
    #[inline]
    #[must_use]
    pub fn with_playback(mut self, playback: PlaybackConfig) -> Self {
        self.playback = playback;
        self
    }

    /// With builder configuration
    #[inline]
    #[must_use]
    pub fn with_builder(mut self, builder: BuilderConfig) -> Self {
        self.builder = builder;
        self
    }

    /// Parse TOML configuration text
    ///
    /// # Errors
    /// - `FlowError::Config` if the text is not valid configuration
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a TOML configuration file
    ///
    /// # Errors
    /// - `FlowError::Io` if the file cannot be read
    /// - `FlowError::Config` if its content is invalid
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| FlowError::io(path, e))?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), ?config, "Loaded configuration");
        Ok(config)
    }
}

/// Playback timing configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Milliseconds between automatic cursor advances
    pub tick_interval_ms: u64,
    /// Capacity of the playback command channel
    pub command_buffer: usize,
}

impl PlaybackConfig {
    /// With tick interval
    #[inline]
    #[must_use]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Tick interval as a duration
    #[inline]
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            command_buffer: 32,
        }
    }
}

/// Ordering used when no node lacks an incoming connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackOrder {
    /// Emit every node's steps in input order, ignoring connections
    #[default]
    InputOrder,
    /// Traverse connections starting from the first node in input order
    FirstNodeEntry,
}

/// Path building configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Behaviour for graphs with no entry point
    pub fallback: FallbackOrder,
}

impl BuilderConfig {
    /// With fallback ordering
    #[inline]
    #[must_use]
    pub fn with_fallback(mut self, fallback: FallbackOrder) -> Self {
        self.fallback = fallback;
        self
    }
}
