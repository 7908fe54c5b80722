//! Panel-by-panel narration playback for generated manga stories.
//!
//! Panels arrive out of order from a generation backend ([`ingest`]), are
//! kept in a keyed [`panel::PanelQueue`], and are narrated strictly in
//! order by the [`playback::Orchestrator`] over two [`audio::AudioSink`]s.

pub mod audio;
pub mod config;
pub mod ingest;
pub mod panel;
pub mod playback;
