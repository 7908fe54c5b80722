//! Cloneable handle the UI (and the ingest layer) uses to drive playback.

use tokio::sync::{broadcast, mpsc, watch};

use crate::ingest::PanelListener;

use super::orchestrator::{PlaybackCommand, PlaybackError};
use super::state::{PlaybackEvent, PlaybackSnapshot};

/// Control surface over a running [`Orchestrator`](super::Orchestrator).
///
/// Every method only enqueues a command; the orchestrator task applies them
/// in order.  They fail with [`PlaybackError::Closed`] once the task has
/// exited.
#[derive(Clone)]
pub struct PlaybackControls {
    commands: mpsc::UnboundedSender<PlaybackCommand>,
    snapshot: watch::Receiver<PlaybackSnapshot>,
    events: broadcast::Sender<PlaybackEvent>,
}

impl PlaybackControls {
    pub(crate) fn new(
        commands: mpsc::UnboundedSender<PlaybackCommand>,
        snapshot: watch::Receiver<PlaybackSnapshot>,
        events: broadcast::Sender<PlaybackEvent>,
    ) -> Self {
        Self {
            commands,
            snapshot,
            events,
        }
    }

    fn send(&self, cmd: PlaybackCommand) -> Result<(), PlaybackError> {
        self.commands.send(cmd).map_err(|_| PlaybackError::Closed)
    }

    /// Jump to panel `n`.  Ignored if `n` is missing or incomplete.
    pub fn play_panel(&self, n: u32) -> Result<(), PlaybackError> {
        self.send(PlaybackCommand::Play(n))
    }

    /// The user landed on panel `n` by hand: turn auto-advance off and play
    /// it.
    pub fn land_on(&self, n: u32) -> Result<(), PlaybackError> {
        self.send(PlaybackCommand::SetAutoAdvance(false))?;
        self.send(PlaybackCommand::Play(n))
    }

    pub fn next(&self) -> Result<(), PlaybackError> {
        self.send(PlaybackCommand::Next)
    }

    pub fn previous(&self) -> Result<(), PlaybackError> {
        self.send(PlaybackCommand::Previous)
    }

    pub fn restart(&self) -> Result<(), PlaybackError> {
        self.send(PlaybackCommand::Restart)
    }

    pub fn stop(&self) -> Result<(), PlaybackError> {
        self.send(PlaybackCommand::Stop)
    }

    /// Soft pause: silence both sinks without leaving the current state.
    pub fn pause_audio(&self) -> Result<(), PlaybackError> {
        self.send(PlaybackCommand::Pause)
    }

    pub fn resume_audio(&self) -> Result<(), PlaybackError> {
        self.send(PlaybackCommand::Resume)
    }

    pub fn toggle_mute(&self) -> Result<(), PlaybackError> {
        self.send(PlaybackCommand::ToggleMute)
    }

    pub fn set_auto_advance(&self, enabled: bool) -> Result<(), PlaybackError> {
        self.send(PlaybackCommand::SetAutoAdvance(enabled))
    }

    /// Tell the orchestrator panel `n` was (re)queued.
    pub fn notify_panel(&self, n: u32, start_show: bool) -> Result<(), PlaybackError> {
        self.send(PlaybackCommand::PanelArrived {
            panel: n,
            start_show,
        })
    }

    /// Stop the orchestrator task; both sinks are released.
    pub fn shutdown(&self) -> Result<(), PlaybackError> {
        self.send(PlaybackCommand::Shutdown)
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshot.borrow().clone()
    }

    /// A receiver that is notified on every snapshot change.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshot.clone()
    }

    /// Transition events from now on.
    pub fn events(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    /// Wait until a published snapshot satisfies `predicate`.
    pub async fn wait_until(
        &self,
        predicate: impl FnMut(&PlaybackSnapshot) -> bool,
    ) -> Result<PlaybackSnapshot, PlaybackError> {
        let mut rx = self.snapshot.clone();
        let snap = rx
            .wait_for(predicate)
            .await
            .map_err(|_| PlaybackError::Closed)?;
        Ok(snap.clone())
    }
}

impl PanelListener for PlaybackControls {
    fn panel_arrived(&self, panel_number: u32, start_show: bool) {
        if let Err(e) = self.notify_panel(panel_number, start_show) {
            log::warn!("panel {panel_number} queued but playback is gone: {e}");
        }
    }
}
