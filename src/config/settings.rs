//! Player settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and handed to tasks.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// PlaybackConfig
// ---------------------------------------------------------------------------

/// Settings for the narration playback orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Number of panels in a story.  Narration ending on this panel ends the
    /// show.
    pub total_panels: u32,
    /// How often the queue is re-checked while waiting for the next panel.
    pub poll_interval_ms: u64,
    /// Background music volume (0.0 – 1.0), kept well below narration.
    pub music_volume: f32,
    /// Narration volume (0.0 – 1.0).
    pub narration_volume: f32,
    /// Advance to the next panel automatically when narration ends.
    pub auto_advance: bool,
    /// Start with both sinks muted.
    pub start_muted: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            total_panels: 6,
            poll_interval_ms: 500,
            music_volume: 0.3,
            narration_volume: 1.0,
            auto_advance: true,
            start_muted: false,
        }
    }
}

impl PlaybackConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

// ---------------------------------------------------------------------------
// IngestConfig
// ---------------------------------------------------------------------------

/// Settings for the event admission layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Only accept events for this story.  `None` accepts every story.
    pub story_id: Option<String>,
    /// Music bed used when a panel arrives without its own `music_url`.
    pub default_music_url: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            story_id: None,
            default_music_url: "/assets/audio/background-music.mp3".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// SimulationConfig
// ---------------------------------------------------------------------------

/// Timing of the simulated sinks used by the command-line player.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Length of every narration clip in milliseconds.
    pub clip_ms: u64,
    /// Time a sink takes before it reports it can play.
    pub load_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            clip_ms: 3_000,
            load_ms: 50,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use panel_narrator::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// assert_eq!(config.playback.total_panels, 6);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub playback: PlaybackConfig,
    pub ingest: IngestConfig,
    pub simulation: SimulationConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.playback.total_panels, 6);
        assert_eq!(cfg.playback.poll_interval(), Duration::from_millis(500));
        assert!((cfg.playback.music_volume - 0.3).abs() < f32::EPSILON);
        assert!(cfg.playback.auto_advance);
        assert!(!cfg.playback.start_muted);
        assert!(cfg.ingest.story_id.is_none());
        assert_eq!(
            cfg.ingest.default_music_url,
            "/assets/audio/background-music.mp3"
        );
        assert_eq!(cfg.simulation.clip_ms, 3_000);
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config.playback.total_panels, 6);
        assert_eq!(config.playback.poll_interval_ms, 500);
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("settings.toml");

        let mut cfg = AppConfig::default();
        cfg.playback.total_panels = 8;
        cfg.playback.poll_interval_ms = 250;
        cfg.playback.start_muted = true;
        cfg.ingest.story_id = Some("story-42".into());
        cfg.simulation.clip_ms = 1_200;

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.playback.total_panels, 8);
        assert_eq!(loaded.playback.poll_interval_ms, 250);
        assert!(loaded.playback.start_muted);
        assert_eq!(loaded.ingest.story_id.as_deref(), Some("story-42"));
        assert_eq!(loaded.simulation.clip_ms, 1_200);
    }

    /// Sections left out of the file fall back to their defaults.
    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[playback]\ntotal_panels = 4\n").unwrap();

        let loaded = AppConfig::load_from(&path).expect("load");
        assert_eq!(loaded.playback.total_panels, 4);
        assert_eq!(loaded.playback.poll_interval_ms, 500);
        assert_eq!(loaded.simulation.load_ms, 50);
    }

    #[test]
    fn zero_poll_interval_is_clamped() {
        let cfg = PlaybackConfig {
            poll_interval_ms: 0,
            ..PlaybackConfig::default()
        };
        assert_eq!(cfg.poll_interval(), Duration::from_millis(1));
    }
}
