//! Timer-driven sink that stands in for a real audio device.
//!
//! [`SimulatedSink`] keeps a virtual playhead: loading takes `load_delay`,
//! every clip lasts `clip_len`, and a non-looping clip fires its ended signal
//! when the playhead reaches the end.  The binary uses it to replay event
//! logs without an audio backend.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::sink::{AudioSink, EndSignal, SinkError, SinkStatus};

struct SimState {
    status: SinkStatus,
    started_at: Option<Instant>,
    /// Bumped on every load/play/pause/stop so stale end timers do nothing.
    generation: u64,
    ended: Option<EndSignal>,
    released: bool,
}

impl SimState {
    fn position(&self, clip_len: Duration) -> Duration {
        let live = self
            .started_at
            .map(|t| t.elapsed())
            .unwrap_or(Duration::ZERO);
        (self.status.position + live).min(clip_len)
    }

    fn halt(&mut self, clip_len: Duration) {
        self.status.position = self.position(clip_len);
        self.status.playing = false;
        self.started_at = None;
        self.generation += 1;
    }
}

/// A virtual audio output with a fixed clip length.
#[derive(Clone)]
pub struct SimulatedSink {
    label: &'static str,
    clip_len: Duration,
    load_delay: Duration,
    state: Arc<Mutex<SimState>>,
}

impl SimulatedSink {
    pub fn new(label: &'static str, clip_len: Duration, load_delay: Duration) -> Self {
        Self {
            label,
            clip_len,
            load_delay,
            state: Arc::new(Mutex::new(SimState {
                status: SinkStatus::default(),
                started_at: None,
                generation: 0,
                ended: None,
                released: false,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl AudioSink for SimulatedSink {
    async fn load(&self, url: &str) -> Result<(), SinkError> {
        {
            let mut st = self.lock();
            if st.released {
                return Err(SinkError::Released);
            }
            st.halt(self.clip_len);
            st.status.position = Duration::ZERO;
            st.status.source = Some(url.to_string());
        }

        if url.trim().is_empty() {
            return Err(SinkError::Load {
                url: url.to_string(),
                reason: "empty source".into(),
            });
        }

        tokio::time::sleep(self.load_delay).await;

        let st = self.lock();
        if st.status.source.as_deref() != Some(url) {
            return Err(SinkError::Load {
                url: url.to_string(),
                reason: "superseded by another source".into(),
            });
        }
        log::debug!("{}: loaded {url}", self.label);
        Ok(())
    }

    async fn play(&self) -> Result<(), SinkError> {
        let (generation, remaining, looping) = {
            let mut st = self.lock();
            if st.released {
                return Err(SinkError::Released);
            }
            let Some(source) = st.status.source.clone() else {
                return Err(SinkError::NoSource);
            };
            if st.status.playing {
                return Ok(());
            }
            if st.status.position >= self.clip_len {
                st.status.position = Duration::ZERO;
            }
            st.generation += 1;
            st.status.playing = true;
            st.started_at = Some(Instant::now());
            log::info!(
                "{}: playing {source} from {:?}",
                self.label,
                st.status.position
            );
            (
                st.generation,
                self.clip_len - st.status.position,
                st.status.looping,
            )
        };

        if looping {
            return Ok(());
        }

        let state = Arc::clone(&self.state);
        let label = self.label;
        let clip_len = self.clip_len;
        tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            let signal = {
                let mut st = state.lock().unwrap_or_else(PoisonError::into_inner);
                if st.generation != generation || !st.status.playing {
                    return;
                }
                st.status.playing = false;
                st.status.position = clip_len;
                st.started_at = None;
                st.ended.take()
            };
            match signal {
                Some(signal) => {
                    log::debug!("{label}: {:?} ended", signal.clip());
                    signal.fire();
                }
                None => log::debug!("{label}: clip ended"),
            }
        });

        Ok(())
    }

    fn pause(&self) {
        let mut st = self.lock();
        if st.status.playing {
            st.halt(self.clip_len);
            log::debug!("{}: paused at {:?}", self.label, st.status.position);
        }
    }

    fn stop(&self) {
        let mut st = self.lock();
        st.halt(self.clip_len);
        st.status.position = Duration::ZERO;
    }

    fn set_muted(&self, muted: bool) {
        self.lock().status.muted = muted;
    }

    fn set_volume(&self, volume: f32) {
        self.lock().status.volume = volume.clamp(0.0, 1.0);
    }

    fn set_looping(&self, looping: bool) {
        self.lock().status.looping = looping;
    }

    fn on_ended(&self, signal: EndSignal) {
        self.lock().ended = Some(signal);
    }

    fn release(&self) {
        let mut st = self.lock();
        st.halt(self.clip_len);
        st.status = SinkStatus::default();
        st.ended = None;
        st.released = true;
        log::debug!("{}: released", self.label);
    }

    fn status(&self) -> SinkStatus {
        let st = self.lock();
        let mut status = st.status.clone();
        status.position = st.position(self.clip_len);
        status
    }
}
