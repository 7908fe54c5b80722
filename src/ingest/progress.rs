//! Human-readable messages for story-generation progress events.

/// Map a `generation_progress` event type to the loading-screen message.
///
/// ```
/// use panel_narrator::ingest::progress_message;
///
/// assert_eq!(
///     progress_message("tts_generation_complete", Some(2)),
///     "Panel 2 narration ready!"
/// );
/// assert_eq!(progress_message("warming_up", None), "Processing: warming_up");
/// ```
pub fn progress_message(event_type: &str, panel_number: Option<u32>) -> String {
    let n = panel_number.map(|n| n.to_string()).unwrap_or_default();
    match event_type {
        "story_creation_started" => "Creating your personalized story...".into(),
        "panels_generation_started" => "Generating story panels...".into(),
        "image_generation_started" => format!("Creating image for panel {n}..."),
        "image_generation_complete" => format!("Panel {n} image ready!"),
        "tts_generation_started" => format!("Adding narration to panel {n}..."),
        "tts_generation_complete" => format!("Panel {n} narration ready!"),
        "music_generation_started" => format!("Composing background music for panel {n}..."),
        "music_generation_complete" => format!("Panel {n} music ready!"),
        "panel_processing_complete" => format!("Panel {n} completed! Assets generated."),
        "story_generation_complete" => "Story ready.".into(),
        "story_generation_error" => "Story generation failed. Please try again.".into(),
        other => format!("Processing: {other}"),
    }
}
