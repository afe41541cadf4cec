//! Lineage log of applied mutations.
//!
//! Entries are appended in execution order and never edited or reordered.
//! The log lives as long as the loaded dataset and is cleared on reset.

mod entry;
mod log;
mod persistence;

pub use entry::{HistoryEntry, HistoryKind};
pub use log::HistoryLog;
pub use persistence::{HISTORY_VERSION, history_path};
