//! Whole-ledger snapshot for export and import.
//!
//! The snapshot carries one field per category. Import is a wholesale
//! replacement: a missing field resets its category to empty rather than
//! leaving the current contents in place. Report settings are not part of
//! the snapshot; they persist in their own slot.

use crate::journal::JournalEntry;
use crate::store::Ledger;
use crate::types::{
    CashEntry, ContributionRecord, DebtRecord, FundingRecord, PenaltyRecord, RuleSet, TaskRecord,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
    #[serde(default, rename = "cashEntries")]
    pub cash_entries: Vec<CashEntry>,
    #[serde(default, rename = "fundingRecords")]
    pub funding_records: Vec<FundingRecord>,
    #[serde(default)]
    pub debts: Vec<DebtRecord>,
    #[serde(default)]
    pub contributions: Vec<ContributionRecord>,
    #[serde(default)]
    pub penalties: Vec<PenaltyRecord>,
    #[serde(default, rename = "ruleSet")]
    pub rule_set: RuleSet,
    #[serde(default, rename = "logs")]
    pub journal: Vec<JournalEntry>,
}

impl Snapshot {
    /// Deep copy of the ledger's current state.
    pub fn capture(ledger: &Ledger) -> Self {
        Self {
            tasks: ledger.tasks().records().to_vec(),
            cash_entries: ledger.cash_entries().records().to_vec(),
            funding_records: ledger.funding_records().records().to_vec(),
            debts: ledger.debts().records().to_vec(),
            contributions: ledger.contributions().records().to_vec(),
            penalties: ledger.penalties().records().to_vec(),
            rule_set: ledger.rules().clone(),
            journal: ledger.journal().entries().to_vec(),
        }
    }
}

impl Ledger {
    /// Replace every category with the snapshot's contents without
    /// journaling anything. Startup load path.
    pub fn hydrate(&mut self, snapshot: Snapshot) {
        self.restore_parts(
            snapshot.tasks,
            snapshot.cash_entries,
            snapshot.funding_records,
            snapshot.debts,
            snapshot.contributions,
            snapshot.penalties,
            snapshot.rule_set,
            snapshot.journal,
        );
    }

    /// Replace every category with the snapshot's contents, then note the
    /// import in the journal. Never merges.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.restore_parts(
            snapshot.tasks,
            snapshot.cash_entries,
            snapshot.funding_records,
            snapshot.debts,
            snapshot.contributions,
            snapshot.penalties,
            snapshot.rule_set,
            snapshot.journal,
        );
        self.journal_mut().record("Snapshot imported");
    }
}
