//! Canonical panel readiness record.

use serde::{Deserialize, Serialize};

/// One story panel: an image paired with a narration clip and an optional
/// music bed.
///
/// A record is only playable when [`ready`](Self::ready) is `true`, which
/// [`PanelAudio::from_assets`] guarantees by refusing empty locators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelAudio {
    /// 1-based position in the story.
    pub panel_number: u32,
    /// Locator of the panel artwork.
    pub image_url: String,
    /// Locator of the spoken narration clip.
    pub narration_url: String,
    /// Optional looping background music.
    pub background_music_url: Option<String>,
    /// `true` once every required asset is known.
    pub ready: bool,
}

impl PanelAudio {
    /// Build a ready record, or `None` if the image or narration locator is
    /// empty or the panel number is zero.
    ///
    /// ```
    /// use panel_narrator::panel::PanelAudio;
    ///
    /// let panel = PanelAudio::from_assets(1, "img.png", "tts.mp3", None).unwrap();
    /// assert!(panel.ready);
    /// assert!(PanelAudio::from_assets(2, "", "tts.mp3", None).is_none());
    /// ```
    pub fn from_assets(
        panel_number: u32,
        image_url: impl Into<String>,
        narration_url: impl Into<String>,
        background_music_url: Option<String>,
    ) -> Option<Self> {
        let image_url = image_url.into();
        let narration_url = narration_url.into();

        if panel_number == 0 || image_url.trim().is_empty() || narration_url.trim().is_empty() {
            return None;
        }

        Some(Self {
            panel_number,
            image_url,
            narration_url,
            background_music_url: background_music_url.filter(|url| !url.trim().is_empty()),
            ready: true,
        })
    }

    /// A placeholder for a panel whose assets are still being generated.
    pub fn pending(panel_number: u32) -> Self {
        Self {
            panel_number,
            image_url: String::new(),
            narration_url: String::new(),
            background_music_url: None,
            ready: false,
        }
    }

    /// Whether the record may be handed to the narration sink.
    pub fn is_playable(&self) -> bool {
        self.ready && !self.narration_url.is_empty()
    }
}
