use crate::error::StorageResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Named persistence slot, one JSON file per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    TasksBackup,
    CashEntries,
    FundingRecords,
    Debts,
    Contributions,
    Penalties,
    RuleSet,
    Journal,
    ReportSettings,
    Session,
}

impl Slot {
    pub fn file_name(self) -> &'static str {
        match self {
            Self::TasksBackup => "tasks-backup.json",
            Self::CashEntries => "cash-entries.json",
            Self::FundingRecords => "funding-records.json",
            Self::Debts => "debts.json",
            Self::Contributions => "contributions.json",
            Self::Penalties => "penalties.json",
            Self::RuleSet => "rule-set.json",
            Self::Journal => "journal.json",
            Self::ReportSettings => "report-settings.json",
            Self::Session => "session.json",
        }
    }
}

/// Per-category JSON slot store rooted at a data directory.
///
/// Saves are atomic (temp file + rename) and create the directory on
/// demand. Loads never surface a parse failure: missing, unreadable, or
/// malformed content silently resets to the default value.
#[derive(Debug, Clone)]
pub struct SlotStore {
    dir: PathBuf,
}

impl SlotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, slot: Slot) -> PathBuf {
        self.dir.join(slot.file_name())
    }

    /// Serialize the full value into its slot.
    pub fn save<T: Serialize + ?Sized>(&self, slot: Slot, value: &T) -> StorageResult<()> {
        fs::create_dir_all(&self.dir)?;
        let bytes = serde_json::to_vec_pretty(value)?;
        let path = self.path(slot);
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, bytes)?;
        fs::rename(tmp_path, path)?;
        Ok(())
    }

    /// Load a slot, substituting the default on missing or malformed
    /// content. The reset is logged at debug level and never surfaced.
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, slot: Slot) -> T {
        let path = self.path(slot);
        let bytes = match fs::read(&path) {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) => return T::default(),
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    debug!(slot = slot.file_name(), error = %err, "slot unreadable, using default");
                }
                return T::default();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(err) => {
                debug!(slot = slot.file_name(), error = %err, "slot malformed, using default");
                T::default()
            }
        }
    }

    /// Load a slot that may legitimately be absent (the session).
    pub fn load_optional<T: DeserializeOwned>(&self, slot: Slot) -> Option<T> {
        let bytes = fs::read(self.path(slot)).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                debug!(slot = slot.file_name(), error = %err, "slot malformed, treating as absent");
                None
            }
        }
    }

    /// Delete a slot's file, tolerating its absence.
    pub fn remove(&self, slot: Slot) -> StorageResult<()> {
        match fs::remove_file(self.path(slot)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tontine_core::{RecordId, RuleSet, TaskRecord};
    use uuid::Uuid;

    fn temp_store() -> SlotStore {
        SlotStore::new(std::env::temp_dir().join(format!("tontine-slots-{}", Uuid::new_v4())))
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = temp_store();
        let tasks = vec![TaskRecord::new(RecordId(1), "count the cash box")];
        store.save(Slot::TasksBackup, &tasks).unwrap();
        let loaded: Vec<TaskRecord> = store.load_or_default(Slot::TasksBackup);
        assert_eq!(loaded, tasks);
    }

    #[test]
    fn missing_slot_loads_the_default() {
        let store = temp_store();
        let rules: RuleSet = store.load_or_default(Slot::RuleSet);
        assert!(rules.is_empty());
        let tasks: Vec<TaskRecord> = store.load_or_default(Slot::TasksBackup);
        assert!(tasks.is_empty());
    }

    #[test]
    fn malformed_slot_silently_resets() {
        let store = temp_store();
        std::fs::create_dir_all(store.dir()).unwrap();
        std::fs::write(store.path(Slot::Debts), b"{not json").unwrap();
        let debts: Vec<tontine_core::DebtRecord> = store.load_or_default(Slot::Debts);
        assert!(debts.is_empty());
    }

    #[test]
    fn remove_tolerates_absent_files() {
        let store = temp_store();
        store.remove(Slot::Session).unwrap();
        store.save(Slot::RuleSet, &RuleSet::default()).unwrap();
        store.remove(Slot::RuleSet).unwrap();
        assert!(!store.path(Slot::RuleSet).exists());
    }
}
