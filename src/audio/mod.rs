//! Audio output sinks driven by the playback orchestrator.
//!
//! # Sinks
//!
//! ```text
//! Orchestrator ──load/play/stop──▶ narration sink ──EndSignal──▶ Orchestrator
//!              ──load/play/stop──▶ music sink (looped, reduced volume)
//! ```
//!
//! * [`AudioSink`] — object-safe trait every output implements.
//! * [`SimulatedSink`] — timer-driven implementation used by the binary.
//! * `MockSink` — recording test double (test builds only).
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use panel_narrator::audio::{AudioSink, SimulatedSink};
//!
//! # async fn example() {
//! let sink = SimulatedSink::new("narration", Duration::from_secs(3), Duration::from_millis(50));
//! sink.load("https://cdn.example/tts/1.mp3").await.unwrap();
//! sink.play().await.unwrap();
//! # }
//! ```

pub mod simulated;
pub mod sink;

#[cfg(test)]
pub mod mock;

pub use simulated::SimulatedSink;
pub use sink::{AudioSink, ClipEnded, EndSignal, SinkError, SinkStatus};

#[cfg(test)]
pub use mock::{MockSink, SinkCall};
