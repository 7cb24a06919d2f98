use crate::types::RecordId;
use serde::{Deserialize, Serialize};

/// One activity journal line. The id doubles as the timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: RecordId,
    pub message: String,
}

/// Prepend-only activity journal. Unbounded; nothing is ever evicted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message at the head of the journal.
    pub fn record(&mut self, message: impl Into<String>) -> RecordId {
        let id = RecordId::now();
        self.entries.insert(
            0,
            JournalEntry {
                id,
                message: message.into(),
            },
        );
        id
    }

    /// Newest-first view of all entries.
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Case-insensitive substring search, order preserved. A blank needle
    /// matches everything.
    pub fn search(&self, needle: &str) -> Vec<&JournalEntry> {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return self.entries.iter().collect();
        }
        self.entries
            .iter()
            .filter(|entry| entry.message.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Wholesale replacement, used by snapshot restore.
    pub fn replace_all(&mut self, entries: Vec<JournalEntry>) {
        self.entries = entries;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_entry_comes_first() {
        let mut journal = Journal::new();
        journal.record("first");
        journal.record("second");
        assert_eq!(journal.entries()[0].message, "second");
        assert_eq!(journal.entries()[1].message, "first");
    }

    #[test]
    fn search_is_case_insensitive_and_order_preserving() {
        let mut journal = Journal::new();
        journal.record("Debt added: Aissata — 40.00");
        journal.record("Task added: buy chalk");
        journal.record("Debt removed: Aissata — 40.00");

        let hits = journal.search("DEBT");
        assert_eq!(hits.len(), 2);
        assert!(hits[0].message.starts_with("Debt removed"));
        assert!(hits[1].message.starts_with("Debt added"));

        assert_eq!(journal.search("  ").len(), 3);
    }

    #[test]
    fn clear_empties_the_journal() {
        let mut journal = Journal::new();
        journal.record("something");
        journal.clear();
        assert!(journal.is_empty());
    }
}
