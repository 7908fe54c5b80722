//! Wire shapes of the push-channel notifications.
//!
//! Two historical payload layouts carry panel assets:
//!
//! ```text
//! panel_update / panel_processing_complete
//!   { story_id, data: { panel_number, panel_data: { image_url, tts_url, music_url? } } }
//!
//! slideshow_start
//!   { story_id, first_panel: { panel_number, image_url, tts_url, music_url? } }
//! ```
//!
//! `generation_progress` wraps pipeline progress and, for
//! `panel_processing_complete`, may embed the nested panel layout too.
//! Every field is optional on the wire; admission is decided in
//! [`EventIngest`](super::EventIngest), not here.

use serde::Deserialize;
use serde_json::Value;

/// Event names this crate understands.
pub const KNOWN_EVENTS: [&str; 4] = [
    "panel_update",
    "panel_processing_complete",
    "slideshow_start",
    "generation_progress",
];

/// One notification from the push channel, tagged by event name.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum RawEvent {
    PanelUpdate(PanelUpdatePayload),
    PanelProcessingComplete(PanelUpdatePayload),
    SlideshowStart(SlideshowStartPayload),
    GenerationProgress(ProgressPayload),
}

impl RawEvent {
    /// Build an event from a channel that delivers the name and body
    /// separately.  Returns `Ok(None)` for event names this crate ignores.
    pub fn from_parts(name: &str, data: Value) -> Result<Option<Self>, serde_json::Error> {
        if !KNOWN_EVENTS.contains(&name) {
            return Ok(None);
        }
        let tagged = serde_json::json!({ "event": name, "data": data });
        serde_json::from_value(tagged).map(Some)
    }

    pub fn name(&self) -> &'static str {
        match self {
            RawEvent::PanelUpdate(_) => "panel_update",
            RawEvent::PanelProcessingComplete(_) => "panel_processing_complete",
            RawEvent::SlideshowStart(_) => "slideshow_start",
            RawEvent::GenerationProgress(_) => "generation_progress",
        }
    }
}

/// Nested layout: assets live under `data.panel_data`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PanelUpdatePayload {
    #[serde(default)]
    pub story_id: Option<String>,
    #[serde(default)]
    pub data: Option<PanelUpdateData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PanelUpdateData {
    #[serde(default)]
    pub panel_number: Option<PanelNumber>,
    #[serde(default)]
    pub story_id: Option<String>,
    #[serde(default)]
    pub panel_data: Option<PanelAssets>,
}

/// Asset locators; also the flat `first_panel` layout.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PanelAssets {
    #[serde(default)]
    pub panel_number: Option<PanelNumber>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tts_url: Option<String>,
    #[serde(default)]
    pub music_url: Option<String>,
}

/// Flat layout: assets live under `first_panel`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlideshowStartPayload {
    #[serde(default)]
    pub story_id: Option<String>,
    #[serde(default)]
    pub first_panel: Option<PanelAssets>,
}

/// Story-generation progress notification.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgressPayload {
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub story_id: Option<String>,
    #[serde(default)]
    pub data: Option<PanelUpdateData>,
}

// ---------------------------------------------------------------------------
// PanelNumber
// ---------------------------------------------------------------------------

/// A panel number as the backend sends it: integer, float or numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PanelNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

impl PanelNumber {
    /// Coerce to a 1-based panel number.  Zero, negatives, fractions and
    /// non-numeric text yield `None`.
    ///
    /// ```
    /// use panel_narrator::ingest::PanelNumber;
    ///
    /// assert_eq!(PanelNumber::Text(" 3 ".into()).coerce(), Some(3));
    /// assert_eq!(PanelNumber::Float(2.0).coerce(), Some(2));
    /// assert_eq!(PanelNumber::Int(0).coerce(), None);
    /// ```
    pub fn coerce(&self) -> Option<u32> {
        let n = match self {
            PanelNumber::Int(i) => *i,
            PanelNumber::Float(f) if f.fract() == 0.0 && f.is_finite() => *f as i64,
            PanelNumber::Float(_) => return None,
            PanelNumber::Text(s) => s.trim().parse::<i64>().ok()?,
        };
        u32::try_from(n).ok().filter(|n| *n > 0)
    }
}
