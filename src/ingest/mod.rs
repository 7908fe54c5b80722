//! Event Ingest: normalization and admission of panel-ready notifications.
//!
//! # Flow
//!
//! ```text
//! push channel ──JSON──▶ RawEvent (tagged union of payload shapes)
//!                          │
//!                          ├─ missing image / narration ──▶ dropped
//!                          ├─ generation_progress       ──▶ progress message
//!                          └─ complete panel ──▶ PanelQueue::upsert
//!                                                 └─▶ PanelListener::panel_arrived
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use panel_narrator::config::AppConfig;
//! use panel_narrator::ingest::{EventIngest, IngestOutcome, PanelListener};
//! use panel_narrator::panel::PanelQueue;
//!
//! struct Print;
//! impl PanelListener for Print {
//!     fn panel_arrived(&self, n: u32, _start: bool) {
//!         println!("panel {n} ready");
//!     }
//! }
//!
//! let config = AppConfig::default();
//! let ingest = EventIngest::new(&config.ingest, PanelQueue::new(), Print);
//! let line = r#"{"event":"panel_update","data":{"data":{"panel_number":1,
//!     "panel_data":{"image_url":"i.png","tts_url":"t.mp3"}}}}"#;
//! assert!(matches!(ingest.handle_json(line), IngestOutcome::Queued { .. }));
//! ```

pub mod gate;
pub mod payload;
pub mod progress;

pub use gate::{EventIngest, IngestOutcome, PanelListener, Rejection};
pub use payload::{PanelNumber, RawEvent};
pub use progress::progress_message;
