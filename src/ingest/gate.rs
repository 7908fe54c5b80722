//! Normalization and admission of panel-ready events.
//!
//! [`EventIngest`] turns a [`RawEvent`] into a canonical [`PanelAudio`],
//! refuses anything without both an image and a narration locator, upserts
//! the survivors into the [`PanelQueue`] and tells the orchestrator (through
//! a [`PanelListener`]) which panel changed.
//!
//! Rejected events never reach the queue or the listener.

use serde_json::Value;
use thiserror::Error;

use crate::config::IngestConfig;
use crate::panel::{PanelAudio, PanelQueue};

use super::payload::{
    PanelAssets, PanelUpdateData, PanelUpdatePayload, ProgressPayload, RawEvent,
    SlideshowStartPayload,
};
use super::progress::progress_message;

// ---------------------------------------------------------------------------
// PanelListener
// ---------------------------------------------------------------------------

/// Receiver of "panel available" notifications.
///
/// Implemented by [`PlaybackControls`](crate::playback::PlaybackControls); the
/// ingest layer never sees the orchestrator itself.
pub trait PanelListener: Send + Sync {
    /// `start_show` is set for slideshow-start events, which begin playback
    /// at panel 1 regardless of what else has arrived.
    fn panel_arrived(&self, panel_number: u32, start_show: bool);
}

// ---------------------------------------------------------------------------
// Rejection / IngestOutcome
// ---------------------------------------------------------------------------

/// Why an event was dropped at the gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("malformed event: {0}")]
    Malformed(String),

    #[error("event has no usable panel number")]
    InvalidPanelNumber,

    #[error("panel {0} has no image")]
    MissingImage(u32),

    #[error("panel {0} has no narration")]
    MissingNarration(u32),

    #[error("event belongs to story {0}")]
    OtherStory(String),
}

/// Result of feeding one event through [`EventIngest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The panel was upserted and the listener notified.
    Queued {
        panel: u32,
        start_show: bool,
        replaced: bool,
    },
    /// The event was dropped; nothing changed.
    Rejected(Rejection),
    /// A progress notification with no panel payload.
    Progress(String),
    /// An event name this crate does not handle.
    Ignored,
}

// ---------------------------------------------------------------------------
// EventIngest
// ---------------------------------------------------------------------------

pub struct EventIngest<L: PanelListener> {
    story_id: Option<String>,
    default_music_url: Option<String>,
    queue: PanelQueue,
    listener: L,
}

impl<L: PanelListener> EventIngest<L> {
    pub fn new(config: &IngestConfig, queue: PanelQueue, listener: L) -> Self {
        Self {
            story_id: config.story_id.clone().filter(|s| !s.is_empty()),
            default_music_url: Some(config.default_music_url.clone()).filter(|s| !s.is_empty()),
            queue,
            listener,
        }
    }

    pub fn queue(&self) -> &PanelQueue {
        &self.queue
    }

    /// Parse one JSON line (`{"event": ..., "data": ...}`) and handle it.
    pub fn handle_json(&self, line: &str) -> IngestOutcome {
        let value: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => return self.reject(Rejection::Malformed(e.to_string())),
        };
        let name = value
            .get("event")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let data = value.get("data").cloned().unwrap_or(Value::Null);
        self.handle_named(&name, data)
    }

    /// Handle an event delivered as a name plus JSON body.
    pub fn handle_named(&self, name: &str, data: Value) -> IngestOutcome {
        match RawEvent::from_parts(name, data) {
            Ok(Some(event)) => self.handle(event),
            Ok(None) => {
                log::trace!("ingest: ignoring event {name:?}");
                IngestOutcome::Ignored
            }
            Err(e) => self.reject(Rejection::Malformed(format!("{name}: {e}"))),
        }
    }

    pub fn handle(&self, event: RawEvent) -> IngestOutcome {
        log::debug!("ingest: received {}", event.name());
        match event {
            RawEvent::PanelUpdate(p) | RawEvent::PanelProcessingComplete(p) => {
                self.admit_update(p)
            }
            RawEvent::SlideshowStart(p) => self.admit_slideshow(p),
            RawEvent::GenerationProgress(p) => self.progress(p),
        }
    }

    // -----------------------------------------------------------------------
    // Variants
    // -----------------------------------------------------------------------

    fn admit_update(&self, payload: PanelUpdatePayload) -> IngestOutcome {
        let Some(data) = payload.data else {
            return self.reject(Rejection::Malformed("missing data".into()));
        };
        let story = payload.story_id.or_else(|| data.story_id.clone());
        if let Err(rejection) = self.check_story(story.as_deref()) {
            return self.reject(rejection);
        }
        self.admit_nested(data, false)
    }

    fn admit_slideshow(&self, payload: SlideshowStartPayload) -> IngestOutcome {
        if let Err(rejection) = self.check_story(payload.story_id.as_deref()) {
            return self.reject(rejection);
        }
        let Some(first) = payload.first_panel else {
            return self.reject(Rejection::Malformed("missing first_panel".into()));
        };
        let Some(number) = first.panel_number.as_ref().and_then(|n| n.coerce()) else {
            return self.reject(Rejection::InvalidPanelNumber);
        };
        self.admit(number, first, true)
    }

    fn progress(&self, payload: ProgressPayload) -> IngestOutcome {
        let panel_number = payload
            .data
            .as_ref()
            .and_then(|d| d.panel_number.as_ref())
            .and_then(|n| n.coerce());
        let message = progress_message(&payload.event_type, panel_number);
        log::info!("story progress: {message}");

        // Completed panels may ride along inside a progress notification.
        if payload.event_type == "panel_processing_complete" {
            if let Some(data) = payload.data.filter(|d| d.panel_data.is_some()) {
                let story = payload.story_id.or_else(|| data.story_id.clone());
                if let Err(rejection) = self.check_story(story.as_deref()) {
                    return self.reject(rejection);
                }
                return self.admit_nested(data, false);
            }
        }

        IngestOutcome::Progress(message)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn admit_nested(&self, data: PanelUpdateData, start_show: bool) -> IngestOutcome {
        let Some(number) = data.panel_number.as_ref().and_then(|n| n.coerce()) else {
            return self.reject(Rejection::InvalidPanelNumber);
        };
        let assets = data.panel_data.unwrap_or_default();
        self.admit(number, assets, start_show)
    }

    fn admit(&self, number: u32, assets: PanelAssets, start_show: bool) -> IngestOutcome {
        let image = assets.image_url.unwrap_or_default();
        let narration = assets.tts_url.unwrap_or_default();

        if image.trim().is_empty() {
            return self.reject(Rejection::MissingImage(number));
        }
        if narration.trim().is_empty() {
            return self.reject(Rejection::MissingNarration(number));
        }

        let music = assets
            .music_url
            .filter(|m| !m.trim().is_empty())
            .or_else(|| self.default_music_url.clone());

        let Some(record) = PanelAudio::from_assets(number, image, narration, music) else {
            return self.reject(Rejection::InvalidPanelNumber);
        };

        let replaced = self.queue.upsert(record);
        log::info!(
            "ingest: panel {number} ready{}",
            if replaced { " (replaced)" } else { "" }
        );
        self.listener.panel_arrived(number, start_show);

        IngestOutcome::Queued {
            panel: number,
            start_show,
            replaced,
        }
    }

    fn check_story(&self, story_id: Option<&str>) -> Result<(), Rejection> {
        match (&self.story_id, story_id) {
            (None, _) => Ok(()),
            (Some(mine), Some(theirs)) if mine == theirs => Ok(()),
            (Some(_), theirs) => Err(Rejection::OtherStory(
                theirs.unwrap_or("<none>").to_string(),
            )),
        }
    }

    fn reject(&self, rejection: Rejection) -> IngestOutcome {
        log::debug!("ingest: dropped event ({rejection})");
        IngestOutcome::Rejected(rejection)
    }
}
