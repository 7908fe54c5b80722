//! Keyed panel storage shared between Event Ingest and the orchestrator.
//!
//! The queue is passive: it never calls back into the orchestrator.  Ordering
//! is imposed by the reader, which always looks up `current + 1` explicitly.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::PanelAudio;

/// Map from panel number to its readiness record.
///
/// Cheap to clone (`Arc` clone).  Writers are Event Ingest and the mount-time
/// seed; the orchestrator only reads.
#[derive(Debug, Clone, Default)]
pub struct PanelQueue {
    inner: Arc<RwLock<HashMap<u32, PanelAudio>>>,
}

impl PanelQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for `record.panel_number`.
    ///
    /// Returns `true` when an existing record was replaced.
    pub fn upsert(&self, record: PanelAudio) -> bool {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let number = record.panel_number;
        let replaced = map.insert(number, record).is_some();
        log::debug!("queue: upserted panel {number} (size {})", map.len());
        replaced
    }

    pub fn get(&self, panel_number: u32) -> Option<PanelAudio> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&panel_number)
            .cloned()
    }

    /// `true` when the panel is present and playable.
    pub fn is_ready(&self, panel_number: u32) -> bool {
        self.get(panel_number).is_some_and(|p| p.is_playable())
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored panel numbers in ascending order.
    pub fn panel_numbers(&self) -> Vec<u32> {
        let mut numbers: Vec<u32> = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        numbers.sort_unstable();
        numbers
    }
}
