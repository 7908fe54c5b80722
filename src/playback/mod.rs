//! Narration playback orchestration.
//!
//! # Architecture
//!
//! ```text
//! EventIngest ──upsert──▶ PanelQueue ◀──lookup── Orchestrator (tokio task)
//!      │                                              │
//!      └─panel_arrived─▶ PlaybackControls ──cmd──────▶│
//!                          ▲        ▲                 ├─▶ narration sink
//!                    UI buttons     │                 └─▶ music sink
//!                                   └── watch<PlaybackSnapshot> / PlaybackEvent
//! ```
//!
//! * [`Orchestrator`] — the state machine; owns both sinks.
//! * [`PlaybackControls`] — cloneable command handle and snapshot reader.
//! * [`PlaybackState`] / [`PlaybackSnapshot`] — what the UI renders.

pub mod controls;
pub mod orchestrator;
pub mod state;

pub use controls::PlaybackControls;
pub use orchestrator::{Orchestrator, PlaybackCommand, PlaybackError};
pub use state::{PlaybackEvent, PlaybackSnapshot, PlaybackState};
