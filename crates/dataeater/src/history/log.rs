//! Append-only mutation log.

use chrono::Utc;
use serde::Serialize;

use super::entry::{HistoryEntry, HistoryKind};

/// Ordered record of every applied change, oldest first.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and return it.
    pub fn append(
        &mut self,
        kind: HistoryKind,
        description: impl Into<String>,
        sql: Option<String>,
    ) -> &HistoryEntry {
        let seq = self.entries.last().map_or(1, |e| e.seq + 1);
        self.entries.push(HistoryEntry {
            seq,
            timestamp: Utc::now(),
            kind,
            description: description.into(),
            sql,
        });
        &self.entries[self.entries.len() - 1]
    }

    pub(super) fn append_entry(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries of one kind, in order.
    pub fn of_kind(&self, kind: HistoryKind) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().filter(move |e| e.kind == kind)
    }

    /// Discard everything; used when the dataset is reset.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_orders_entries() {
        let mut log = HistoryLog::new();
        log.append(HistoryKind::Load, "Loaded people.csv", None);
        log.append(HistoryKind::Clean, "Trim names", Some("UPDATE t SET a = trim(a)".into()));
        let entry = log.append(HistoryKind::Rename, "Rename", None);
        assert_eq!(entry.seq, 3);

        let seqs: Vec<u64> = log.entries().iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        assert!(log.entries()[0].timestamp <= log.entries()[2].timestamp);
        assert_eq!(log.of_kind(HistoryKind::Clean).count(), 1);
    }

    #[test]
    fn test_clear() {
        let mut log = HistoryLog::new();
        log.append(HistoryKind::Load, "x", None);
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.append(HistoryKind::Load, "y", None).seq, 1);
    }
}
