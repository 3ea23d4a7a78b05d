//! Playback state machine
//!
//! The controller owns the cursor, the play flag and the single pending
//! tick. It never sleeps: whoever drives it (the async driver, a test, a UI
//! loop) waits for the interval and presents the ticket back via
//! [`PlaybackController::tick`]. Leaving `playing` drops the ticket, so a
//! late tick carrying it is ignored.

use crate::types::{
    ExecutionPath, ExecutionPathEntry, Highlight, NodeId, PlaybackPhase, PlaybackState,
};

/// Receiver of highlight notifications
pub trait HighlightObserver {
    /// Called on every cursor-driven change; `(None, None)` clears the highlight
    fn on_highlight(&mut self, node_id: Option<&NodeId>, step_index: Option<usize>);
}

impl<F> HighlightObserver for F
where
    F: FnMut(Option<&NodeId>, Option<usize>),
{
    fn on_highlight(&mut self, node_id: Option<&NodeId>, step_index: Option<usize>) {
        self(node_id, step_index);
    }
}

/// Observer that forwards highlights over a channel
///
/// Lets a host render highlights outside the task that owns the controller.
#[derive(Debug, Clone)]
pub struct ChannelObserver(pub tokio::sync::mpsc::UnboundedSender<Highlight>);

impl ChannelObserver {
    /// Create an observer and the receiver its highlights arrive on
    #[must_use]
    pub fn new() -> (Self, tokio::sync::mpsc::UnboundedReceiver<Highlight>) {
        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
        (Self(sender), receiver)
    }
}

impl HighlightObserver for ChannelObserver {
    fn on_highlight(&mut self, node_id: Option<&NodeId>, step_index: Option<usize>) {
        // A dropped receiver means nobody is rendering any more
        let _ = self.0.send(Highlight::from_parts(node_id, step_index));
    }
}

/// Handle for the one scheduled wake-up
///
/// Only the ticket most recently issued by a controller is honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickTicket {
    generation: u64,
}

/// Timer-driven cursor over an execution path
#[derive(Debug)]
pub struct PlaybackController<O> {
    path: ExecutionPath,
    state: PlaybackState,
    pending: Option<TickTicket>,
    generation: u64,
    observer: O,
}

impl<O: HighlightObserver> PlaybackController<O> {
    /// Create controller at `idle-at-start` and highlight the first entry
    pub fn new(path: ExecutionPath, observer: O) -> Self {
        let mut controller = Self {
            path: ExecutionPath::default(),
            state: PlaybackState::default(),
            pending: None,
            generation: 0,
            observer,
        };
        controller.load(path);
        controller
    }

    /// Replace the path
    ///
    /// Cancels any pending tick and returns to `idle-at-start`; the old
    /// cursor is never applied to the new path. Swapping a non-empty path
    /// for an empty one clears the highlight left by the old path.
    pub fn load(&mut self, path: ExecutionPath) -> PlaybackState {
        self.cancel_tick();
        let was_active = self.is_active();
        self.path = path;
        self.state = PlaybackState::default();
        tracing::debug!(steps = self.path.len(), "Playback path loaded");
        match self.path.get(0) {
            Some(first) => {
                let highlight = Highlight::of(first);
                self.emit(&highlight);
            }
            None if was_active => self.emit(&Highlight::Cleared),
            None => {}
        }
        self.state
    }

    /// Start or resume automatic advancement
    ///
    /// From `finished` the cursor restarts at zero.
    pub fn play(&mut self) -> PlaybackState {
        if !self.is_active() || self.state.is_playing {
            return self.state;
        }
        if self.state.cursor >= self.path.len() {
            self.state.cursor = 0;
            self.notify_cursor();
        }
        self.state.is_playing = true;
        self.arm_tick();
        tracing::info!(cursor = self.state.cursor, "Playback started");
        self.state
    }

    /// Stop automatic advancement, keeping the cursor
    pub fn pause(&mut self) -> PlaybackState {
        if !self.state.is_playing {
            return self.state;
        }
        self.cancel_tick();
        self.state.is_playing = false;
        tracing::info!(cursor = self.state.cursor, "Playback paused");
        self.state
    }

    /// Stop and rewind to the start, clearing the highlight
    pub fn reset(&mut self) -> PlaybackState {
        if !self.is_active() {
            return self.state;
        }
        self.cancel_tick();
        self.state = PlaybackState::default();
        self.emit(&Highlight::Cleared);
        tracing::info!("Playback reset");
        self.state
    }

    /// Advance one entry while paused
    pub fn step_forward(&mut self) -> PlaybackState {
        if self.state.is_playing || self.state.cursor + 1 >= self.path.len() {
            return self.state;
        }
        self.state.cursor += 1;
        self.notify_cursor();
        self.state
    }

    /// Go back one entry while paused
    pub fn step_backward(&mut self) -> PlaybackState {
        if self.state.is_playing || self.state.cursor == 0 || !self.is_active() {
            return self.state;
        }
        self.state.cursor -= 1;
        self.notify_cursor();
        self.state
    }

    /// Deliver a scheduled wake-up
    ///
    /// Ignored unless `ticket` is the pending one. Advances the cursor by
    /// one; reaching the end clears the highlight and stops playback,
    /// otherwise the next tick is armed.
    pub fn tick(&mut self, ticket: TickTicket) -> PlaybackState {
        if self.pending != Some(ticket) {
            tracing::debug!(?ticket, "Stale tick ignored");
            return self.state;
        }
        self.pending = None;
        self.state.cursor += 1;

        if self.state.cursor >= self.path.len() {
            self.state.is_playing = false;
            self.emit(&Highlight::Cleared);
            tracing::info!(steps = self.path.len(), "Playback finished");
        } else {
            self.notify_cursor();
            self.arm_tick();
        }
        self.state
    }

    /// Ticket the driver should wait on, if playing
    #[inline]
    #[must_use]
    pub fn pending_tick(&self) -> Option<TickTicket> {
        self.pending
    }

    /// Current cursor and play flag
    #[inline]
    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Named phase of the current state
    #[inline]
    #[must_use]
    pub fn phase(&self) -> PlaybackPhase {
        self.state.phase(self.path.len())
    }

    /// Whether there is anything to play; an empty path exposes no controls
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.path.is_empty()
    }

    /// Entry under the cursor
    #[inline]
    #[must_use]
    pub fn current_entry(&self) -> Option<&ExecutionPathEntry> {
        self.path.get(self.state.cursor)
    }

    /// Loaded path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &ExecutionPath {
        &self.path
    }

    /// Position as a percentage of the path, 1-based like "step k of N"
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self) -> f64 {
        if self.path.is_empty() {
            return 0.0;
        }
        let shown = (self.state.cursor + 1).min(self.path.len());
        shown as f64 / self.path.len() as f64 * 100.0
    }

    /// Borrow the observer
    #[inline]
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Consume the controller, returning the observer
    #[inline]
    pub fn into_observer(self) -> O {
        self.observer
    }

    fn arm_tick(&mut self) {
        self.generation += 1;
        self.pending = Some(TickTicket {
            generation: self.generation,
        });
    }

    fn cancel_tick(&mut self) {
        self.pending = None;
    }

    fn notify_cursor(&mut self) {
        let highlight = self
            .path
            .get(self.state.cursor)
            .map_or(Highlight::Cleared, Highlight::of);
        self.emit(&highlight);
    }

    fn emit(&mut self, highlight: &Highlight) {
        let (node_id, step_index) = highlight.parts();
        self.observer.on_highlight(node_id, step_index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExecutionPathEntry, StepKind};

    type Log = Vec<(Option<String>, Option<usize>)>;

    fn path(len: usize) -> ExecutionPath {
        ExecutionPath::new(
            (0..len)
                .map(|i| ExecutionPathEntry {
                    node_id: NodeId::from("n"),
                    step_index: i,
                    kind: StepKind::Given,
                    text: format!("s{i}"),
                })
                .collect(),
        )
    }

    fn controller(len: usize) -> PlaybackController<impl FnMut(Option<&NodeId>, Option<usize>)> {
        PlaybackController::new(path(len), |_: Option<&NodeId>, _: Option<usize>| {})
    }

    fn recording(len: usize, log: &mut Log) -> PlaybackController<impl FnMut(Option<&NodeId>, Option<usize>) + '_> {
        PlaybackController::new(path(len), move |n: Option<&NodeId>, s: Option<usize>| {
            log.push((n.map(ToString::to_string), s));
        })
    }

    fn run_to_end<O: HighlightObserver>(c: &mut PlaybackController<O>) {
        while let Some(ticket) = c.pending_tick() {
            c.tick(ticket);
        }
    }

    #[test]
    fn plays_through_and_auto_pauses() {
        let mut log = Log::new();
        let mut c = recording(3, &mut log);
        c.play();
        run_to_end(&mut c);
        assert_eq!(c.state(), PlaybackState { cursor: 3, is_playing: false });
        assert_eq!(c.phase(), PlaybackPhase::Finished);
        drop(c);
        let steps: Vec<_> = log.iter().map(|(_, s)| *s).collect();
        assert_eq!(steps, vec![Some(0), Some(1), Some(2), None]);
    }

    #[test]
    fn play_from_finished_restarts() {
        let mut c = controller(2);
        c.play();
        run_to_end(&mut c);
        let state = c.play();
        assert_eq!(state, PlaybackState { cursor: 0, is_playing: true });
    }

    #[test]
    fn stale_ticket_is_ignored_after_pause() {
        let mut c = controller(3);
        c.play();
        let ticket = c.pending_tick().unwrap();
        c.pause();
        assert_eq!(c.pending_tick(), None);
        assert_eq!(c.tick(ticket).cursor, 0);
        c.play();
        assert_eq!(c.tick(ticket).cursor, 0, "old generation must not advance");
    }

    #[test]
    fn load_discards_cursor_and_timer() {
        let mut c = controller(4);
        c.play();
        let ticket = c.pending_tick().unwrap();
        c.tick(ticket);
        let ticket = c.pending_tick().unwrap();
        let state = c.load(path(2));
        assert_eq!(state, PlaybackState::default());
        assert_eq!(c.pending_tick(), None);
        assert_eq!(c.tick(ticket).cursor, 0);
    }

    #[test]
    fn step_controls_respect_bounds_and_play_flag() {
        let mut c = controller(3);
        assert_eq!(c.step_backward().cursor, 0);
        assert_eq!(c.step_forward().cursor, 1);
        assert_eq!(c.step_forward().cursor, 2);
        assert_eq!(c.step_forward().cursor, 2);
        assert_eq!(c.phase(), PlaybackPhase::PausedMid);
        c.play();
        assert_eq!(c.step_backward().cursor, 2);
        c.pause();
        assert_eq!(c.step_backward().cursor, 1);
    }

    #[test]
    fn empty_path_is_inert() {
        let mut log = Log::new();
        let mut c = recording(0, &mut log);
        assert!(!c.is_active());
        c.play();
        c.step_forward();
        c.step_backward();
        c.reset();
        assert_eq!(c.state(), PlaybackState::default());
        assert_eq!(c.pending_tick(), None);
        drop(c);
        assert!(log.is_empty());
    }

    #[test]
    fn progress_counts_from_one() {
        let mut c = controller(4);
        assert!((c.progress() - 25.0).abs() < f64::EPSILON);
        c.step_forward();
        assert!((c.progress() - 50.0).abs() < f64::EPSILON);
        c.play();
        run_to_end(&mut c);
        assert!((c.progress() - 100.0).abs() < f64::EPSILON);
    }
}
