//! Narration playback orchestrator — the panel-sequencing state machine.
//!
//! [`Orchestrator`] owns the narration sink, the music sink and the
//! [`PlaybackSnapshot`].  It runs as a single tokio task and reacts to three
//! interleaved sources:
//!
//! ```text
//! PlaybackCommand (mpsc, from PlaybackControls / EventIngest)
//! ClipEnded       (mpsc, fired by the narration sink)
//! poll interval   (armed only while Transitioning)
//!        │
//!        ▼
//! play_panel(n)
//!   └─▶ stop + rewind both sinks  [Loading]
//!         └─▶ narration.load (commands still served; `next` dropped)
//!               ├─ Ok  → narration.play, music bed     [Playing]
//!               └─ Err → warn                          [Idle]
//!
//! ClipEnded(n)
//!   ├─ n == total          → stop music                 [Ended]
//!   ├─ n + 1 ready         → play_panel(n + 1)
//!   └─ n + 1 not ready     → poll every interval        [Transitioning]
//! ```
//!
//! Every failure is turned into a state change and a log line; nothing is
//! propagated to the embedding UI.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use crate::audio::{AudioSink, ClipEnded, EndSignal, SinkError};
use crate::config::PlaybackConfig;
use crate::panel::{PanelAudio, PanelQueue};

use super::controls::PlaybackControls;
use super::state::{PlaybackEvent, PlaybackSnapshot, PlaybackState};

// ---------------------------------------------------------------------------
// PlaybackError
// ---------------------------------------------------------------------------

/// Errors that can surface around the orchestrator.
///
/// Only [`PlaybackError::Closed`] ever reaches a caller; the other variants
/// are logged and turned into state transitions.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    /// The requested panel is missing from the queue or still incomplete.
    #[error("panel {0} is not ready")]
    PanelNotReady(u32),

    /// The narration sink failed to load or start the clip.
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// The orchestrator task has shut down.
    #[error("playback orchestrator is no longer running")]
    Closed,
}

// ---------------------------------------------------------------------------
// PlaybackCommand
// ---------------------------------------------------------------------------

/// Requests accepted by the orchestrator task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackCommand {
    /// A panel was upserted into the queue.
    PanelArrived { panel: u32, start_show: bool },
    Play(u32),
    Next,
    Previous,
    Restart,
    Stop,
    Pause,
    Resume,
    ToggleMute,
    SetAutoAdvance(bool),
    Shutdown,
}

/// How a load attempt finished.
enum LoadStep {
    Loaded(Result<(), SinkError>),
    /// Another panel was requested mid-load.
    Preempted(u32),
    /// Stop or shutdown arrived mid-load; already handled.
    Aborted,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Drives panel-by-panel narration playback.
///
/// Create with [`Orchestrator::new`], take as many [`PlaybackControls`] as
/// needed with [`controls`](Self::controls), then spawn [`run`](Self::run).
///
/// ```rust,no_run
/// use std::time::Duration;
/// use panel_narrator::audio::SimulatedSink;
/// use panel_narrator::config::AppConfig;
/// use panel_narrator::panel::PanelQueue;
/// use panel_narrator::playback::Orchestrator;
///
/// # async fn example() {
/// let config = AppConfig::default();
/// let clip = Duration::from_secs(3);
/// let orchestrator = Orchestrator::new(
///     &config.playback,
///     PanelQueue::new(),
///     std::sync::Arc::new(SimulatedSink::new("narration", clip, Duration::ZERO)),
///     std::sync::Arc::new(SimulatedSink::new("music", clip, Duration::ZERO)),
/// );
/// let controls = orchestrator.controls();
/// tokio::spawn(orchestrator.run());
/// controls.play_panel(1).unwrap();
/// # }
/// ```
pub struct Orchestrator {
    config: PlaybackConfig,
    queue: PanelQueue,
    narration: Arc<dyn AudioSink>,
    music: Arc<dyn AudioSink>,

    snapshot: PlaybackSnapshot,
    snapshot_tx: watch::Sender<PlaybackSnapshot>,
    events_tx: broadcast::Sender<PlaybackEvent>,

    /// Dropped when `run` starts so the channel closes with the last control.
    command_tx: Option<mpsc::UnboundedSender<PlaybackCommand>>,
    commands: mpsc::UnboundedReceiver<PlaybackCommand>,
    ended_tx: mpsc::UnboundedSender<ClipEnded>,
    ended_rx: mpsc::UnboundedReceiver<ClipEnded>,
    poll: Option<Interval>,

    /// Incremented on every load and stop; ended signals carry it.
    epoch: u64,
    transition_in_flight: bool,
    clip_finished: bool,
    music_source: Option<String>,
    seed: Option<u32>,
    active: bool,
    closing: bool,
}

impl Orchestrator {
    /// Create an orchestrator over `queue` that exclusively owns both sinks.
    pub fn new(
        config: &PlaybackConfig,
        queue: PanelQueue,
        narration: Arc<dyn AudioSink>,
        music: Arc<dyn AudioSink>,
    ) -> Self {
        let snapshot = PlaybackSnapshot::new(
            config.total_panels,
            config.start_muted,
            config.auto_advance,
        );
        let (snapshot_tx, _) = watch::channel(snapshot.clone());
        let (events_tx, _) = broadcast::channel(64);
        let (command_tx, commands) = mpsc::unbounded_channel();
        let (ended_tx, ended_rx) = mpsc::unbounded_channel();

        Self {
            config: config.clone(),
            queue,
            narration,
            music,
            snapshot,
            snapshot_tx,
            events_tx,
            command_tx: Some(command_tx),
            commands,
            ended_tx,
            ended_rx,
            poll: None,
            epoch: 0,
            transition_in_flight: false,
            clip_finished: false,
            music_source: None,
            seed: None,
            active: false,
            closing: false,
        }
    }

    /// Seed the queue with a panel known at mount time and play it as soon
    /// as the task starts.
    pub fn with_initial_panel(mut self, panel: PanelAudio) -> Self {
        self.seed = Some(panel.panel_number);
        self.queue.upsert(panel);
        self
    }

    /// A new control handle.  Must be called before [`run`](Self::run).
    pub fn controls(&self) -> PlaybackControls {
        let commands = self
            .command_tx
            .clone()
            .unwrap_or_else(|| mpsc::unbounded_channel().0);
        PlaybackControls::new(
            commands,
            self.snapshot_tx.subscribe(),
            self.events_tx.clone(),
        )
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run until [`PlaybackCommand::Shutdown`] or until every control handle
    /// has been dropped.  Both sinks are stopped and released on exit.
    pub async fn run(mut self) {
        self.command_tx = None;
        self.active = true;

        self.narration.set_volume(self.config.narration_volume);
        self.narration.set_muted(self.snapshot.muted);
        self.music.set_looping(true);
        self.music.set_volume(self.config.music_volume);

        if let Some(seed) = self.seed.take() {
            log::info!("playback: starting with seeded panel {seed}");
            self.play_panel(seed).await;
        }

        while !self.closing {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => self.closing = true,
                },
                Some(clip) = self.ended_rx.recv() => self.handle_clip_ended(clip).await,
                _ = next_tick(&mut self.poll), if self.poll.is_some() => {
                    self.poll_waiting_panel().await
                }
            }
        }

        log::info!("playback: orchestrator shutting down");
    }

    async fn handle_command(&mut self, cmd: PlaybackCommand) {
        log::debug!("playback: command {cmd:?} in state {}", self.snapshot.state);
        match cmd {
            PlaybackCommand::PanelArrived { panel, start_show } => {
                self.handle_panel_arrived(panel, start_show).await
            }
            PlaybackCommand::Play(n) => self.play_panel(n).await,
            PlaybackCommand::Next => self.advance_to_next().await,
            PlaybackCommand::Previous => self.go_back().await,
            PlaybackCommand::Restart => self.play_panel(1).await,
            PlaybackCommand::Stop => self.stop(),
            PlaybackCommand::Pause => self.pause_audio(),
            PlaybackCommand::Resume => self.resume_audio().await,
            PlaybackCommand::ToggleMute => self.toggle_mute().await,
            PlaybackCommand::SetAutoAdvance(enabled) => self.set_auto_advance(enabled),
            PlaybackCommand::Shutdown => self.closing = true,
        }
    }

    // -----------------------------------------------------------------------
    // play_panel: the single entry point into playback
    // -----------------------------------------------------------------------

    async fn play_panel(&mut self, panel_number: u32) {
        let mut target = panel_number;
        while let Some(preempted_by) = self.load_and_start(target).await {
            log::info!("playback: panel {target} pre-empted by panel {preempted_by}");
            target = preempted_by;
        }
    }

    /// Returns `Some(m)` when a request for panel `m` cut the load short.
    async fn load_and_start(&mut self, n: u32) -> Option<u32> {
        let record = match self.playable(n) {
            Ok(record) => record,
            Err(e) => {
                log::warn!("playback: {e}");
                return None;
            }
        };

        if self.snapshot.state == PlaybackState::Playing
            && self.snapshot.current_panel == n
            && !self.clip_finished
        {
            log::debug!("playback: panel {n} already playing");
            return None;
        }

        self.transition_in_flight = true;
        self.poll = None;
        self.snapshot.waiting_for = None;
        self.snapshot.paused = false;
        self.set_state(PlaybackState::Loading);

        // At most one narration: silence everything before touching the source.
        self.silence_sinks();
        self.music_source = None;
        self.epoch += 1;

        self.narration.set_muted(self.snapshot.muted);
        self.narration
            .on_ended(EndSignal::new(self.ended_tx.clone(), n, self.epoch));

        match self.await_narration_load(n, &record.narration_url).await {
            LoadStep::Loaded(Ok(())) => {}
            LoadStep::Loaded(Err(e)) => {
                self.fail_load(n, e.into());
                return None;
            }
            LoadStep::Preempted(m) => return Some(m),
            LoadStep::Aborted => return None,
        }

        // A soft pause issued mid-load holds the clip until resume.
        if !self.snapshot.paused {
            if let Err(e) = self.narration.play().await {
                self.fail_load(n, e.into());
                return None;
            }
        }

        self.snapshot.current_panel = n;
        self.transition_in_flight = false;
        self.clip_finished = false;
        self.set_state(PlaybackState::Playing);
        self.emit(PlaybackEvent::PanelChanged(n));
        log::info!("playback: started panel {n}");

        if !self.snapshot.paused {
            self.start_music(&record).await;
        }
        None
    }

    /// Wait for the narration sink to report it can play, serving commands
    /// that arrive in the meantime.
    async fn await_narration_load(&mut self, n: u32, url: &str) -> LoadStep {
        let sink = Arc::clone(&self.narration);
        let url = url.to_string();
        let load = async move { sink.load(&url).await };
        tokio::pin!(load);

        loop {
            tokio::select! {
                res = &mut load => return LoadStep::Loaded(res),
                cmd = self.commands.recv() => {
                    let Some(cmd) = cmd else {
                        self.closing = true;
                        return LoadStep::Aborted;
                    };
                    if let Some(step) = self.handle_during_load(n, cmd) {
                        return step;
                    }
                }
                Some(clip) = self.ended_rx.recv() => {
                    log::trace!("playback: discarding ended signal {clip:?} during load");
                }
            }
        }
    }

    fn handle_during_load(&mut self, loading: u32, cmd: PlaybackCommand) -> Option<LoadStep> {
        let wanted = match cmd {
            PlaybackCommand::Play(m) => Some(m),
            PlaybackCommand::Restart
            | PlaybackCommand::PanelArrived {
                start_show: true, ..
            } => Some(1),
            _ => None,
        };
        if let Some(m) = wanted {
            if m != loading && self.queue.is_ready(m) {
                return Some(LoadStep::Preempted(m));
            }
            log::debug!("playback: {cmd:?} ignored while loading panel {loading}");
            return None;
        }

        match cmd {
            PlaybackCommand::Stop => {
                self.stop();
                return Some(LoadStep::Aborted);
            }
            PlaybackCommand::Shutdown => {
                self.closing = true;
                return Some(LoadStep::Aborted);
            }
            PlaybackCommand::Pause => self.pause_audio(),
            PlaybackCommand::Resume => {
                self.snapshot.paused = false;
                self.publish();
            }
            PlaybackCommand::ToggleMute => self.apply_mute(!self.snapshot.muted),
            PlaybackCommand::SetAutoAdvance(enabled) => self.set_auto_advance(enabled),
            _ => log::debug!("playback: transition in progress, ignoring {cmd:?}"),
        }
        None
    }

    fn playable(&self, n: u32) -> Result<PanelAudio, PlaybackError> {
        self.queue
            .get(n)
            .filter(PanelAudio::is_playable)
            .ok_or(PlaybackError::PanelNotReady(n))
    }

    fn fail_load(&mut self, n: u32, error: PlaybackError) {
        log::warn!("playback: failed to play panel {n}: {error}");
        self.narration.stop();
        self.transition_in_flight = false;
        self.set_state(PlaybackState::Idle);
    }

    async fn start_music(&mut self, record: &PanelAudio) {
        let Some(url) = record.background_music_url.clone() else {
            return;
        };
        if self.snapshot.muted {
            return;
        }

        self.music.set_looping(true);
        self.music.set_volume(self.config.music_volume);
        if let Err(e) = self.music.load(&url).await {
            log::warn!("playback: background music unavailable: {e}");
            return;
        }
        self.music_source = Some(url);
        if let Err(e) = self.music.play().await {
            log::warn!("playback: background music blocked: {e}");
        }
    }

    /// Resume the current music bed, loading it first if playback started
    /// muted.
    async fn ensure_music(&mut self) {
        if self.snapshot.muted {
            return;
        }
        if self.music_source.is_some() {
            if let Err(e) = self.music.play().await {
                log::warn!("playback: background music blocked: {e}");
            }
        } else if let Some(record) = self.queue.get(self.snapshot.current_panel) {
            self.start_music(&record).await;
        }
    }

    // -----------------------------------------------------------------------
    // Auto-advance
    // -----------------------------------------------------------------------

    async fn handle_clip_ended(&mut self, clip: ClipEnded) {
        if !self.active || clip.epoch != self.epoch {
            log::trace!("playback: stale ended signal {clip:?}");
            return;
        }
        if self.snapshot.state != PlaybackState::Playing {
            return;
        }

        self.clip_finished = true;
        log::info!("playback: panel {} narration ended", clip.panel);

        if !self.snapshot.auto_advance {
            log::info!("playback: auto-advance off, staying on panel {}", clip.panel);
            return;
        }

        let next = clip.panel + 1;
        if next > self.config.total_panels {
            log::info!("playback: story complete, all panels finished");
            self.finish_story();
        } else if self.queue.is_ready(next) {
            log::info!("playback: auto-advancing to panel {next}");
            self.play_panel(next).await;
        } else {
            self.wait_for_panel(next);
        }
    }

    fn wait_for_panel(&mut self, next: u32) {
        log::info!("playback: panel {next} not ready, waiting");
        self.snapshot.waiting_for = Some(next);
        self.set_state(PlaybackState::Transitioning);

        let period = self.config.poll_interval();
        let mut poll = interval_at(Instant::now() + period, period);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.poll = Some(poll);
    }

    async fn poll_waiting_panel(&mut self) {
        if !self.active || self.snapshot.state != PlaybackState::Transitioning {
            self.poll = None;
            return;
        }
        if let Some(next) = self.snapshot.waiting_for {
            if self.queue.is_ready(next) {
                log::info!("playback: panel {next} is now ready");
                self.play_panel(next).await;
            }
        }
    }

    async fn handle_panel_arrived(&mut self, panel: u32, start_show: bool) {
        let state = self.snapshot.state;
        if start_show {
            log::info!("playback: slideshow start requested");
            self.play_panel(1).await;
        } else if state == PlaybackState::Transitioning && self.snapshot.waiting_for == Some(panel)
        {
            log::info!("playback: panel {panel} arrived while waiting");
            self.play_panel(panel).await;
        } else if panel == 1 && state == PlaybackState::Idle && self.snapshot.current_panel == 0 {
            log::info!("playback: starting show with panel 1");
            self.play_panel(1).await;
        } else {
            log::debug!("playback: panel {panel} queued for later");
        }
    }

    fn finish_story(&mut self) {
        self.narration.stop();
        self.music_source = None;
        self.poll = None;
        self.snapshot.waiting_for = None;
        self.transition_in_flight = false;
        self.epoch += 1;
        self.set_state(PlaybackState::Ended);
    }

    // -----------------------------------------------------------------------
    // Manual navigation
    // -----------------------------------------------------------------------

    async fn advance_to_next(&mut self) {
        if self.transition_in_flight || self.snapshot.state == PlaybackState::Transitioning {
            log::debug!("playback: already transitioning, ignoring advance request");
            return;
        }
        let current = self.snapshot.current_panel;
        if current >= self.config.total_panels {
            if self.snapshot.state != PlaybackState::Ended {
                log::info!("playback: no panels left, ending story");
                self.finish_story();
            }
            return;
        }

        let next = current + 1;
        if self.queue.is_ready(next) {
            self.play_panel(next).await;
        } else {
            log::info!("playback: panel {next} not ready yet, ignoring advance request");
        }
    }

    async fn go_back(&mut self) {
        if self.transition_in_flight {
            return;
        }
        let current = self.snapshot.current_panel;
        if current > 1 {
            self.play_panel(current - 1).await;
        }
    }

    // -----------------------------------------------------------------------
    // Controls
    // -----------------------------------------------------------------------

    fn stop(&mut self) {
        self.silence_sinks();
        self.epoch += 1;
        self.poll = None;
        self.music_source = None;
        self.transition_in_flight = false;
        self.snapshot.waiting_for = None;
        self.snapshot.paused = false;
        self.snapshot.current_panel = 0;
        self.set_state(PlaybackState::Idle);
    }

    fn pause_audio(&mut self) {
        self.narration.pause();
        self.music.pause();
        self.snapshot.paused = true;
        self.publish();
    }

    async fn resume_audio(&mut self) {
        self.snapshot.paused = false;
        match self.snapshot.state {
            PlaybackState::Playing => {
                if !self.clip_finished {
                    if let Err(e) = self.narration.play().await {
                        log::warn!("playback: could not resume narration: {e}");
                    }
                }
                self.ensure_music().await;
            }
            // The music bed keeps looping between panels.
            PlaybackState::Transitioning if self.music_source.is_some() => {
                self.ensure_music().await;
            }
            _ => {}
        }
        self.publish();
    }

    async fn toggle_mute(&mut self) {
        let muted = !self.snapshot.muted;
        self.apply_mute(muted);
        if !muted && self.snapshot.state == PlaybackState::Playing && !self.snapshot.paused {
            self.ensure_music().await;
        }
    }

    fn apply_mute(&mut self, muted: bool) {
        self.snapshot.muted = muted;
        self.narration.set_muted(muted);
        if muted {
            self.music.pause();
        }
        log::info!("playback: {}", if muted { "muted" } else { "unmuted" });
        self.publish();
    }

    fn set_auto_advance(&mut self, enabled: bool) {
        self.snapshot.auto_advance = enabled;
        self.publish();
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn silence_sinks(&self) {
        self.narration.stop();
        self.music.stop();
    }

    fn set_state(&mut self, state: PlaybackState) {
        let from = self.snapshot.state;
        self.snapshot.state = state;
        if from != state {
            log::info!("playback: {from} -> {state}");
            if state == PlaybackState::Ended {
                self.music.stop();
            }
            self.emit(PlaybackEvent::StateChanged { from, to: state });
        }
        self.publish();
    }

    fn emit(&self, event: PlaybackEvent) {
        // No subscribers is fine.
        let _ = self.events_tx.send(event);
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot.clone());
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.active = false;
        self.poll = None;
        self.narration.stop();
        self.music.stop();
        self.narration.release();
        self.music.release();
        log::debug!("playback: sinks released");
    }
}

async fn next_tick(poll: &mut Option<Interval>) {
    match poll {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
