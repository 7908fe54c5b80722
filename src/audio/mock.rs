//! Recording test double for [`AudioSink`].
//!
//! [`MockSink`] keeps a log of every call, lets a test fail the next load or
//! play, hold loads until released, and end the current clip on demand with
//! [`MockSink::finish`].

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use super::sink::{AudioSink, EndSignal, SinkError, SinkStatus};

/// One recorded interaction with a [`MockSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Load(String),
    Play,
    Pause,
    Stop,
    Muted(bool),
    Volume(f32),
    Looping(bool),
    Release,
}

#[derive(Default)]
struct MockState {
    calls: Vec<SinkCall>,
    status: SinkStatus,
    ended: Option<EndSignal>,
    fail_next_load: bool,
    fail_next_play: Option<SinkError>,
    load_gate: Option<Arc<Notify>>,
    released: bool,
}

#[derive(Default)]
pub struct MockSink {
    state: Mutex<MockState>,
}

impl MockSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// URLs passed to `load`, in order.
    pub fn loaded_urls(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                SinkCall::Load(url) => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn status(&self) -> SinkStatus {
        self.lock().status.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.lock().status.playing
    }

    pub fn fail_next_load(&self) {
        self.lock().fail_next_load = true;
    }

    pub fn fail_next_play(&self, error: SinkError) {
        self.lock().fail_next_play = Some(error);
    }

    /// Make every subsequent `load` wait for [`release_load`](Self::release_load).
    pub fn hold_loads(&self) {
        self.lock().load_gate = Some(Arc::new(Notify::new()));
    }

    pub fn release_load(&self) {
        if let Some(gate) = self.lock().load_gate.clone() {
            gate.notify_one();
        }
    }

    /// Move the playhead forward while playing.
    pub fn advance(&self, by: Duration) {
        let mut st = self.lock();
        if st.status.playing {
            st.status.position += by;
        }
    }

    /// Simulate the clip reaching its end.  Returns `true` if an ended signal
    /// was delivered.
    pub fn finish(&self) -> bool {
        let signal = {
            let mut st = self.lock();
            if !st.status.playing {
                return false;
            }
            st.status.playing = false;
            st.ended.take()
        };
        signal.is_some_and(EndSignal::fire)
    }
}

#[async_trait]
impl AudioSink for MockSink {
    async fn load(&self, url: &str) -> Result<(), SinkError> {
        let gate = {
            let mut st = self.lock();
            st.calls.push(SinkCall::Load(url.to_string()));
            if st.released {
                return Err(SinkError::Released);
            }
            st.status.source = Some(url.to_string());
            st.status.playing = false;
            st.status.position = Duration::ZERO;
            st.load_gate.clone()
        };

        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut st = self.lock();
        if std::mem::take(&mut st.fail_next_load) {
            return Err(SinkError::Load {
                url: url.to_string(),
                reason: "mock load failure".into(),
            });
        }
        Ok(())
    }

    async fn play(&self) -> Result<(), SinkError> {
        let mut st = self.lock();
        st.calls.push(SinkCall::Play);
        if st.released {
            return Err(SinkError::Released);
        }
        if let Some(err) = st.fail_next_play.take() {
            return Err(err);
        }
        if st.status.source.is_none() {
            return Err(SinkError::NoSource);
        }
        st.status.playing = true;
        Ok(())
    }

    fn pause(&self) {
        let mut st = self.lock();
        st.calls.push(SinkCall::Pause);
        st.status.playing = false;
    }

    fn stop(&self) {
        let mut st = self.lock();
        st.calls.push(SinkCall::Stop);
        st.status.playing = false;
        st.status.position = Duration::ZERO;
    }

    fn set_muted(&self, muted: bool) {
        let mut st = self.lock();
        st.calls.push(SinkCall::Muted(muted));
        st.status.muted = muted;
    }

    fn set_volume(&self, volume: f32) {
        let mut st = self.lock();
        st.calls.push(SinkCall::Volume(volume));
        st.status.volume = volume;
    }

    fn set_looping(&self, looping: bool) {
        let mut st = self.lock();
        st.calls.push(SinkCall::Looping(looping));
        st.status.looping = looping;
    }

    fn on_ended(&self, signal: EndSignal) {
        self.lock().ended = Some(signal);
    }

    fn release(&self) {
        let mut st = self.lock();
        st.calls.push(SinkCall::Release);
        st.released = true;
        st.status = SinkStatus::default();
        st.ended = None;
    }

    fn status(&self) -> SinkStatus {
        MockSink::status(self)
    }
}
