//! Panel records and the keyed queue they are stored in.

pub mod queue;
pub mod record;

pub use queue::PanelQueue;
pub use record::PanelAudio;
