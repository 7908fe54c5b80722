//! Playback state machine states and the observable snapshot.
//!
//! [`PlaybackState`] is the orchestrator's state.  The UI never reads the
//! orchestrator directly: it observes a [`PlaybackSnapshot`] published on a
//! `tokio::sync::watch` channel and, optionally, the [`PlaybackEvent`] stream
//! on a broadcast channel.

// ---------------------------------------------------------------------------
// PlaybackState
// ---------------------------------------------------------------------------

/// States of the narration playback orchestrator.
///
/// ```text
/// Idle ──play_panel(n)──▶ Loading ──can play + play()──▶ Playing
///                          │ load/play error ──▶ Idle
/// Playing ──narration ended, next ready──────▶ Loading (next)
///         ──narration ended, next not ready──▶ Transitioning ──next ready──▶ Loading
///         ──last panel ended─────────────────▶ Ended ──restart──▶ Loading (1)
/// any state ──stop──▶ Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Nothing playing; initial state and the target of `stop`.
    #[default]
    Idle,

    /// A narration clip is being loaded and has not started yet.
    Loading,

    /// A narration clip is playing.
    Playing,

    /// Narration ended; waiting for the next panel to arrive.
    Transitioning,

    /// The last panel's narration has finished.
    Ended,
}

impl PlaybackState {
    /// A short label suitable for a status indicator.
    pub fn label(&self) -> &'static str {
        match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Loading => "loading",
            PlaybackState::Playing => "playing",
            PlaybackState::Transitioning => "transitioning",
            PlaybackState::Ended => "ended",
        }
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// PlaybackSnapshot
// ---------------------------------------------------------------------------

/// Everything the presentational layer needs to render the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,

    /// Panel whose narration is (or last was) playing.  `0` before anything
    /// has started and after `stop`.
    pub current_panel: u32,

    pub muted: bool,

    /// Soft pause: sinks paused without leaving `state`.
    pub paused: bool,

    /// When `false`, narration ending does nothing.
    pub auto_advance: bool,

    /// Panel awaited while `Transitioning`.
    pub waiting_for: Option<u32>,

    pub total_panels: u32,
}

impl PlaybackSnapshot {
    pub fn new(total_panels: u32, muted: bool, auto_advance: bool) -> Self {
        Self {
            state: PlaybackState::Idle,
            current_panel: 0,
            muted,
            paused: false,
            auto_advance,
            waiting_for: None,
            total_panels,
        }
    }

    /// `true` once the last panel has been reached.
    pub fn is_story_finished(&self) -> bool {
        self.state == PlaybackState::Ended
    }
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self::new(6, false, true)
    }
}

// ---------------------------------------------------------------------------
// PlaybackEvent
// ---------------------------------------------------------------------------

/// Notifications broadcast on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    StateChanged {
        from: PlaybackState,
        to: PlaybackState,
    },
    /// A panel's narration started playing.
    PanelChanged(u32),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_idle() {
        assert_eq!(PlaybackState::default(), PlaybackState::Idle);
    }

    #[test]
    fn labels() {
        assert_eq!(PlaybackState::Idle.label(), "idle");
        assert_eq!(PlaybackState::Loading.label(), "loading");
        assert_eq!(PlaybackState::Playing.label(), "playing");
        assert_eq!(PlaybackState::Transitioning.label(), "transitioning");
        assert_eq!(PlaybackState::Ended.to_string(), "ended");
    }

    #[test]
    fn new_snapshot_has_nothing_started() {
        let snap = PlaybackSnapshot::new(6, true, false);
        assert_eq!(snap.state, PlaybackState::Idle);
        assert_eq!(snap.current_panel, 0);
        assert!(snap.muted);
        assert!(!snap.auto_advance);
        assert!(snap.waiting_for.is_none());
        assert!(!snap.is_story_finished());
    }

    #[test]
    fn snapshot_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PlaybackSnapshot>();
        assert_send_sync::<PlaybackEvent>();
    }
}
