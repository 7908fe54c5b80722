//! Audio output sink trait and the end-of-clip signal.
//!
//! # Overview
//!
//! [`AudioSink`] is the interface the orchestrator drives.  It is modelled on
//! a media element: point it at a source with [`load`](AudioSink::load)
//! (which resolves once the source can play), then [`play`](AudioSink::play),
//! [`pause`](AudioSink::pause) or [`stop`](AudioSink::stop) it.  The trait is
//! object-safe and `Send + Sync` so it can be held behind an
//! `Arc<dyn AudioSink>`.
//!
//! Natural end of a clip is reported through the [`EndSignal`] registered with
//! [`on_ended`](AudioSink::on_ended).  The signal carries the panel number and
//! the load epoch so the receiver can discard signals from superseded clips.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// SinkError
// ---------------------------------------------------------------------------

/// Errors reported by an [`AudioSink`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SinkError {
    /// The source could not be fetched or decoded.
    #[error("failed to load {url}: {reason}")]
    Load { url: String, reason: String },

    /// The platform refused to start audio without a user gesture.
    #[error("playback blocked by autoplay policy")]
    AutoplayBlocked,

    /// `play()` was called before any source was loaded.
    #[error("no source loaded")]
    NoSource,

    /// The sink was released and can no longer be used.
    #[error("sink has been released")]
    Released,
}

// ---------------------------------------------------------------------------
// EndSignal
// ---------------------------------------------------------------------------

/// Identifies the clip whose playback ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipEnded {
    pub panel: u32,
    pub epoch: u64,
}

/// One-shot notification a sink fires when its clip reaches the end.
#[derive(Debug)]
pub struct EndSignal {
    tx: mpsc::UnboundedSender<ClipEnded>,
    clip: ClipEnded,
}

impl EndSignal {
    pub fn new(tx: mpsc::UnboundedSender<ClipEnded>, panel: u32, epoch: u64) -> Self {
        Self {
            tx,
            clip: ClipEnded { panel, epoch },
        }
    }

    pub fn clip(&self) -> ClipEnded {
        self.clip
    }

    /// Deliver the signal.  Returns `false` if the receiver is gone.
    pub fn fire(self) -> bool {
        self.tx.send(self.clip).is_ok()
    }
}

// ---------------------------------------------------------------------------
// SinkStatus
// ---------------------------------------------------------------------------

/// Point-in-time view of a sink, used for diagnostics and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkStatus {
    pub source: Option<String>,
    pub playing: bool,
    pub position: Duration,
    pub muted: bool,
    pub volume: f32,
    pub looping: bool,
}

impl Default for SinkStatus {
    fn default() -> Self {
        Self {
            source: None,
            playing: false,
            position: Duration::ZERO,
            muted: false,
            volume: 1.0,
            looping: false,
        }
    }
}

// ---------------------------------------------------------------------------
// AudioSink trait
// ---------------------------------------------------------------------------

/// A single audio output channel.
///
/// # Contract
///
/// - `load` replaces the current source, rewinds to zero and resolves only
///   once the new source is ready to play.
/// - `stop` pauses and rewinds; the source stays loaded.
/// - `set_muted` silences output without pausing, so ended signals still fire.
/// - After `release` every `load`/`play` fails with [`SinkError::Released`].
#[async_trait]
pub trait AudioSink: Send + Sync {
    async fn load(&self, url: &str) -> Result<(), SinkError>;

    async fn play(&self) -> Result<(), SinkError>;

    fn pause(&self);

    fn stop(&self);

    fn set_muted(&self, muted: bool);

    fn set_volume(&self, volume: f32);

    fn set_looping(&self, looping: bool);

    /// Register the signal fired at the natural end of the current clip,
    /// replacing any previous one.
    fn on_ended(&self, signal: EndSignal);

    fn release(&self);

    fn status(&self) -> SinkStatus;
}

// Compile-time assertion: Box<dyn AudioSink> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn AudioSink>) {}
};
