//! Timed playback over an execution path
//!
//! [`PlaybackController`] is the synchronous state machine; it tracks the
//! cursor, the play flag and the one pending tick. [`PlaybackDriver`] runs a
//! controller inside a tokio task and turns pending ticks into real sleeps.

mod controller;
mod driver;

pub use controller::{ChannelObserver, HighlightObserver, PlaybackController, TickTicket};
pub use driver::{PlaybackDriver, PlaybackHandle, SessionId, Transport};
