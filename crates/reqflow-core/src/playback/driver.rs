//! Async playback driver
//!
//! One tokio task owns the [`PlaybackController`]. Hosts talk to it through
//! a cloneable [`PlaybackHandle`]; every command is applied inside the task,
//! so the state is never mutated from two places. The task sleeps on the
//! controller's pending tick only while one exists; a command that cancels
//! or replaces the tick simply causes the old deadline to be dropped.

use super::controller::{HighlightObserver, PlaybackController, TickTicket};
use crate::config::ReqflowConfig;
use crate::error::PlaybackError;
use crate::path::ExecutionPathBuilder;
use crate::types::{Connection, ExecutionPath, PlaybackState, RequirementNode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::Instrument;
use uuid::Uuid;

/// Identifier of one playback session, used in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generate a fresh id
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transport controls exposed to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// Start or resume
    Play,
    /// Stop, keep cursor
    Pause,
    /// Stop and rewind
    Reset,
    /// One entry forward while paused
    StepForward,
    /// One entry back while paused
    StepBackward,
    /// Report state without changing it
    Query,
}

/// Messages accepted by the driver task
#[derive(Debug)]
enum PlaybackCommand {
    Transport(Transport, oneshot::Sender<PlaybackState>),
    Load {
        nodes: Vec<RequirementNode>,
        connections: Vec<Connection>,
        reply: oneshot::Sender<PlaybackState>,
    },
    Shutdown,
}

/// What woke the driver loop
enum Wake {
    Command(Option<PlaybackCommand>),
    Tick,
}

/// Cloneable control surface for a running driver
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    session: SessionId,
    sender: mpsc::Sender<PlaybackCommand>,
}

impl PlaybackHandle {
    /// Session this handle controls
    #[inline]
    #[must_use]
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Start or resume playback
    ///
    /// # Errors
    /// - `PlaybackError::DriverClosed` if the driver task has stopped
    pub async fn play(&self) -> Result<PlaybackState, PlaybackError> {
        self.transport(Transport::Play).await
    }

    /// Pause playback
    ///
    /// # Errors
    /// - `PlaybackError::DriverClosed` if the driver task has stopped
    pub async fn pause(&self) -> Result<PlaybackState, PlaybackError> {
        self.transport(Transport::Pause).await
    }

    /// Reset to the start
    ///
    /// # Errors
    /// - `PlaybackError::DriverClosed` if the driver task has stopped
    pub async fn reset(&self) -> Result<PlaybackState, PlaybackError> {
        self.transport(Transport::Reset).await
    }

    /// Step forward while paused
    ///
    /// # Errors
    /// - `PlaybackError::DriverClosed` if the driver task has stopped
    pub async fn step_forward(&self) -> Result<PlaybackState, PlaybackError> {
        self.transport(Transport::StepForward).await
    }

    /// Step backward while paused
    ///
    /// # Errors
    /// - `PlaybackError::DriverClosed` if the driver task has stopped
    pub async fn step_backward(&self) -> Result<PlaybackState, PlaybackError> {
        self.transport(Transport::StepBackward).await
    }

    /// Current state
    ///
    /// # Errors
    /// - `PlaybackError::DriverClosed` if the driver task has stopped
    pub async fn state(&self) -> Result<PlaybackState, PlaybackError> {
        self.transport(Transport::Query).await
    }

    /// Send any transport control
    ///
    /// # Errors
    /// - `PlaybackError::DriverClosed` if the driver task has stopped
    pub async fn transport(&self, transport: Transport) -> Result<PlaybackState, PlaybackError> {
        let (reply, response) = oneshot::channel();
        self.send(PlaybackCommand::Transport(transport, reply)).await?;
        response.await.map_err(|_| PlaybackError::DriverClosed)
    }

    /// Rebuild the path from new nodes and connections and rewind
    ///
    /// # Errors
    /// - `PlaybackError::DriverClosed` if the driver task has stopped
    pub async fn load(
        &self,
        nodes: Vec<RequirementNode>,
        connections: Vec<Connection>,
    ) -> Result<PlaybackState, PlaybackError> {
        let (reply, response) = oneshot::channel();
        self.send(PlaybackCommand::Load {
            nodes,
            connections,
            reply,
        })
        .await?;
        response.await.map_err(|_| PlaybackError::DriverClosed)
    }

    /// Stop the driver task; its join handle yields the observer
    ///
    /// # Errors
    /// - `PlaybackError::DriverClosed` if the driver task has already stopped
    pub async fn shutdown(&self) -> Result<(), PlaybackError> {
        self.send(PlaybackCommand::Shutdown).await
    }

    async fn send(&self, command: PlaybackCommand) -> Result<(), PlaybackError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| PlaybackError::DriverClosed)
    }
}

/// Task that owns a controller and its timer
#[derive(Debug)]
pub struct PlaybackDriver<O> {
    controller: PlaybackController<O>,
    builder: ExecutionPathBuilder,
    interval: Duration,
    commands: mpsc::Receiver<PlaybackCommand>,
}

impl<O> PlaybackDriver<O>
where
    O: HighlightObserver + Send + 'static,
{
    /// Build the initial path and spawn the driver task
    ///
    /// Must be called inside a tokio runtime.
    pub fn spawn(
        config: &ReqflowConfig,
        nodes: &[RequirementNode],
        connections: &[Connection],
        observer: O,
    ) -> (PlaybackHandle, JoinHandle<O>) {
        let builder = ExecutionPathBuilder::new(config.builder);
        let path = builder.build(nodes, connections);
        Self::spawn_with_path(config, builder, path, observer)
    }

    /// Spawn the driver task over an already built path
    pub fn spawn_with_path(
        config: &ReqflowConfig,
        builder: ExecutionPathBuilder,
        path: ExecutionPath,
        observer: O,
    ) -> (PlaybackHandle, JoinHandle<O>) {
        let session = SessionId::new();
        let (sender, commands) = mpsc::channel(config.playback.command_buffer.max(1));
        let driver = Self {
            controller: PlaybackController::new(path, observer),
            builder,
            interval: config.playback.tick_interval(),
            commands,
        };
        let span = tracing::info_span!("playback", session = %session);
        let task = tokio::spawn(driver.run().instrument(span));
        (PlaybackHandle { session, sender }, task)
    }

    async fn run(mut self) -> O {
        tracing::info!(
            steps = self.controller.path().len(),
            interval_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX),
            "Playback driver started"
        );
        let mut armed: Option<(TickTicket, Instant)> = None;

        loop {
            let pending = self.controller.pending_tick();
            if pending != armed.map(|(ticket, _)| ticket) {
                armed = pending.map(|ticket| (ticket, Instant::now() + self.interval));
            }
            let deadline = armed.map_or_else(Instant::now, |(_, at)| at);

            let wake = tokio::select! {
                command = self.commands.recv() => Wake::Command(command),
                () = sleep_until(deadline), if armed.is_some() => Wake::Tick,
            };

            match wake {
                Wake::Command(Some(PlaybackCommand::Shutdown) | None) => break,
                Wake::Command(Some(command)) => self.apply(command),
                Wake::Tick => {
                    if let Some((ticket, _)) = armed.take() {
                        self.controller.tick(ticket);
                    }
                }
            }
        }

        tracing::info!("Playback driver stopped");
        self.controller.into_observer()
    }

    fn apply(&mut self, command: PlaybackCommand) {
        match command {
            PlaybackCommand::Transport(transport, reply) => {
                let state = match transport {
                    Transport::Play => self.controller.play(),
                    Transport::Pause => self.controller.pause(),
                    Transport::Reset => self.controller.reset(),
                    Transport::StepForward => self.controller.step_forward(),
                    Transport::StepBackward => self.controller.step_backward(),
                    Transport::Query => self.controller.state(),
                };
                let _ = reply.send(state);
            }
            PlaybackCommand::Load {
                nodes,
                connections,
                reply,
            } => {
                let path = self.builder.build(&nodes, &connections);
                let state = self.controller.load(path);
                let _ = reply.send(state);
            }
            PlaybackCommand::Shutdown => {}
        }
    }
}
