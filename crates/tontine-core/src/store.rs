use crate::error::CoreError;
use crate::journal::Journal;
use crate::types::{
    CashEntry, CashFlow, ContributionRecord, DebtRecord, FundingRecord, MemberKey, PenaltyRecord,
    RecordId, ReportSettings, RuleSet, TaskRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Anything held by a [`RecordStore`].
pub trait Record {
    fn id(&self) -> RecordId;
}

macro_rules! impl_record {
    ($($ty:ty),+) => {
        $(impl Record for $ty {
            fn id(&self) -> RecordId {
                self.id
            }
        })+
    };
}

impl_record!(
    TaskRecord,
    CashEntry,
    FundingRecord,
    DebtRecord,
    ContributionRecord,
    PenaltyRecord
);

/// Insertion-ordered collection with newest-first display order: appends
/// go to the head. Operations are invoked serially; there is no
/// concurrent-mutation contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordStore<T> {
    records: Vec<T>,
}

impl<T> Default for RecordStore<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<T: Record> RecordStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at the head.
    pub fn append(&mut self, record: T) {
        self.records.insert(0, record);
    }

    /// Delete by id. Returns whether a match was found.
    pub fn remove(&mut self, id: RecordId) -> bool {
        let before = self.records.len();
        self.records.retain(|record| record.id() != id);
        self.records.len() != before
    }

    pub fn get(&self, id: RecordId) -> Option<&T> {
        self.records.iter().find(|record| record.id() == id)
    }

    pub fn get_mut(&mut self, id: RecordId) -> Option<&mut T> {
        self.records.iter_mut().find(|record| record.id() == id)
    }

    /// Order-preserving view of all records, newest first.
    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }

    /// Order-preserving filtered view.
    pub fn filtered(&self, predicate: impl Fn(&T) -> bool) -> Vec<&T> {
        self.records.iter().filter(|r| predicate(r)).collect()
    }

    /// Keep only records matching the predicate.
    pub fn retain(&mut self, predicate: impl FnMut(&T) -> bool) {
        self.records.retain(predicate);
    }

    /// Wholesale replacement. Order of the incoming records is preserved.
    pub fn replace_all(&mut self, records: Vec<T>) {
        self.records = records;
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Task list view filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    #[default]
    All,
    Active,
    Done,
}

impl TaskFilter {
    pub fn matches(self, task: &TaskRecord) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.done,
            Self::Done => task.done,
        }
    }
}

/// Cash-box position: inflows, outflows, and the running balance.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CashSummary {
    pub total_in: f64,
    pub total_out: f64,
    pub balance: f64,
}

/// Contribution position: grand total plus per-member totals.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContributionSummary {
    pub total: f64,
    pub per_member: BTreeMap<MemberKey, f64>,
}

/// The treasury ledger: one store per category plus the rule set, the
/// report settings, and the activity journal. Every component that needs
/// ledger state receives this aggregate explicitly; there is no ambient
/// shared state.
#[derive(Debug, Default)]
pub struct Ledger {
    tasks: RecordStore<TaskRecord>,
    cash_entries: RecordStore<CashEntry>,
    funding_records: RecordStore<FundingRecord>,
    debts: RecordStore<DebtRecord>,
    contributions: RecordStore<ContributionRecord>,
    penalties: RecordStore<PenaltyRecord>,
    rules: RuleSet,
    report_settings: ReportSettings,
    journal: Journal,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    // ----- tasks -----

    pub fn add_task(&mut self, text: &str) -> Result<RecordId, CoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CoreError::EmptyField("task text"));
        }
        let task = TaskRecord::new(RecordId::now(), text);
        let id = task.id;
        self.tasks.append(task);
        self.journal.record(format!("Task added: {text}"));
        Ok(id)
    }

    pub fn set_task_done(&mut self, id: RecordId, done: bool) -> Result<(), CoreError> {
        let task = self
            .tasks
            .get_mut(id)
            .ok_or(CoreError::UnknownRecord(id))?;
        task.done = done;
        Ok(())
    }

    pub fn remove_task(&mut self, id: RecordId) -> bool {
        self.tasks.remove(id)
    }

    /// Drop every completed task, keeping active ones in order.
    pub fn clear_completed(&mut self) {
        self.tasks.retain(|task| !task.done);
        self.journal.record("Completed tasks cleared");
    }

    pub fn active_task_count(&self) -> usize {
        self.tasks.iter().filter(|task| !task.done).count()
    }

    pub fn tasks_filtered(&self, filter: TaskFilter) -> Vec<&TaskRecord> {
        self.tasks.filtered(|task| filter.matches(task))
    }

    pub fn tasks(&self) -> &RecordStore<TaskRecord> {
        &self.tasks
    }

    /// Replace the task collection wholesale (remote load, import).
    pub fn replace_tasks(&mut self, tasks: Vec<TaskRecord>) {
        self.tasks.replace_all(tasks);
    }

    // ----- cash entries -----

    pub fn add_cash_entry(
        &mut self,
        text: &str,
        amount: f64,
        kind: CashFlow,
    ) -> Result<RecordId, CoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CoreError::EmptyField("cash entry description"));
        }
        let entry = CashEntry::new(RecordId::now(), text, amount, kind);
        let id = entry.id;
        self.journal.record(format!(
            "Cash entry added: {text} ({kind} {:.2})",
            entry.amount
        ));
        self.cash_entries.append(entry);
        Ok(id)
    }

    pub fn remove_cash_entry(&mut self, id: RecordId) -> bool {
        self.cash_entries.remove(id)
    }

    pub fn cash_summary(&self) -> CashSummary {
        let mut summary = CashSummary::default();
        for entry in self.cash_entries.iter() {
            match entry.kind {
                CashFlow::In => summary.total_in += entry.amount,
                CashFlow::Out => summary.total_out += entry.amount,
            }
        }
        summary.balance = summary.total_in - summary.total_out;
        summary
    }

    pub fn cash_entries(&self) -> &RecordStore<CashEntry> {
        &self.cash_entries
    }

    // ----- funding records -----

    pub fn add_funding(
        &mut self,
        name: &str,
        fund_source: Option<String>,
        amount: f64,
    ) -> Result<RecordId, CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::EmptyField("funding name"));
        }
        let record = FundingRecord::new(RecordId::now(), name, fund_source, amount);
        let id = record.id;
        self.journal
            .record(format!("Funding added: {name} ({:.2})", record.amount));
        self.funding_records.append(record);
        Ok(id)
    }

    pub fn remove_funding(&mut self, id: RecordId) -> bool {
        if let Some(record) = self.funding_records.get(id) {
            let name = record.name.clone();
            self.funding_records.remove(id);
            self.journal.record(format!("Funding removed: {name}"));
            true
        } else {
            false
        }
    }

    pub fn funding(&self, id: RecordId) -> Option<&FundingRecord> {
        self.funding_records.get(id)
    }

    pub fn funding_records(&self) -> &RecordStore<FundingRecord> {
        &self.funding_records
    }

    // ----- debts -----

    pub fn add_debt(&mut self, member: MemberKey, amount: f64) -> Result<RecordId, CoreError> {
        if member.name.trim().is_empty() {
            return Err(CoreError::EmptyField("member name"));
        }
        let debt = DebtRecord::new(RecordId::now(), member, amount);
        let id = debt.id;
        self.journal
            .record(format!("Debt added: {} — {:.2}", debt.member, debt.amount));
        self.debts.append(debt);
        Ok(id)
    }

    pub fn remove_debt(&mut self, id: RecordId) -> bool {
        if let Some(debt) = self.debts.get(id) {
            let line = format!("Debt removed: {} — {:.2}", debt.member, debt.amount);
            self.debts.remove(id);
            self.journal.record(line);
            true
        } else {
            false
        }
    }

    pub fn debts(&self) -> &RecordStore<DebtRecord> {
        &self.debts
    }

    // ----- contributions -----

    pub fn add_contribution(
        &mut self,
        member: MemberKey,
        amount: f64,
        period: Option<String>,
    ) -> Result<RecordId, CoreError> {
        if member.name.trim().is_empty() {
            return Err(CoreError::EmptyField("member name"));
        }
        let contribution = ContributionRecord::new(RecordId::now(), member, amount, period);
        let id = contribution.id;
        self.journal.record(format!(
            "Contribution added: {} — {:.2}",
            contribution.member, contribution.amount
        ));
        self.contributions.append(contribution);
        Ok(id)
    }

    pub fn remove_contribution(&mut self, id: RecordId) -> bool {
        if let Some(contribution) = self.contributions.get(id) {
            let line = format!(
                "Contribution removed: {} — {:.2}",
                contribution.member, contribution.amount
            );
            self.contributions.remove(id);
            self.journal.record(line);
            true
        } else {
            false
        }
    }

    pub fn contribution_summary(&self) -> ContributionSummary {
        let mut summary = ContributionSummary::default();
        for contribution in self.contributions.iter() {
            summary.total += contribution.amount;
            *summary
                .per_member
                .entry(contribution.member.clone())
                .or_insert(0.0) += contribution.amount;
        }
        summary
    }

    pub fn contributions(&self) -> &RecordStore<ContributionRecord> {
        &self.contributions
    }

    // ----- penalties -----

    /// Issue a penalty. Always opens the linked debt in the same
    /// operation; returns `(penalty id, debt id)`.
    pub fn add_penalty(
        &mut self,
        member: MemberKey,
        amount: f64,
        reason: Option<String>,
    ) -> Result<(RecordId, RecordId), CoreError> {
        if member.name.trim().is_empty() {
            return Err(CoreError::EmptyField("member name"));
        }
        let penalty = PenaltyRecord::new(RecordId::now(), member, amount, reason);
        let debt = DebtRecord::from_penalty(&penalty);
        let ids = (penalty.id, debt.id);
        self.journal.record(format!(
            "Penalty added: {} — {:.2} (reason: {})",
            penalty.member,
            penalty.amount,
            penalty.reason.as_deref().unwrap_or("—")
        ));
        self.journal.record(format!(
            "Linked debt opened for penalty: {} — {:.2}",
            penalty.member, penalty.amount
        ));
        self.penalties.append(penalty);
        self.debts.append(debt);
        Ok(ids)
    }

    /// Remove a penalty and every debt linked to it, nothing else.
    pub fn remove_penalty(&mut self, id: RecordId) -> bool {
        if let Some(penalty) = self.penalties.get(id) {
            let line = format!(
                "Penalty removed: {} — {:.2}",
                penalty.member, penalty.amount
            );
            self.penalties.remove(id);
            self.debts.retain(|debt| !debt.links_penalty(id));
            self.journal.record(line);
            true
        } else {
            false
        }
    }

    /// Per-member penalty totals, independent of the debt ledger.
    pub fn penalty_totals(&self) -> BTreeMap<MemberKey, f64> {
        let mut totals = BTreeMap::new();
        for penalty in self.penalties.iter() {
            *totals.entry(penalty.member.clone()).or_insert(0.0) += penalty.amount;
        }
        totals
    }

    pub fn penalties(&self) -> &RecordStore<PenaltyRecord> {
        &self.penalties
    }

    // ----- aggregation -----

    /// Total obligation per member: debts plus penalties with no linked
    /// debt. See [`crate::aggregation::member_totals`].
    pub fn member_totals(&self) -> BTreeMap<MemberKey, f64> {
        crate::aggregation::member_totals(self.debts.records(), self.penalties.records())
    }

    // ----- singletons -----

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Replace the rule set without journaling. Hydration path.
    pub fn set_rules(&mut self, rules: RuleSet) {
        self.rules = rules;
    }

    /// Replace the rule set and note it in the journal.
    pub fn save_rules(&mut self, rules: RuleSet) {
        self.rules = rules;
        self.journal.record("Rule set saved");
    }

    /// Unset every rule and note it in the journal.
    pub fn clear_rules(&mut self) {
        self.rules = RuleSet::default();
        self.journal.record("Rule set cleared");
    }

    pub fn report_settings(&self) -> &ReportSettings {
        &self.report_settings
    }

    pub fn set_report_settings(&mut self, settings: ReportSettings) {
        self.report_settings = settings;
    }

    // ----- journal -----

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn journal_mut(&mut self) -> &mut Journal {
        &mut self.journal
    }

    pub fn clear_journal(&mut self) {
        self.journal.clear();
        self.journal.record("Journal cleared");
    }

    // ----- bulk operations -----

    /// Empty every category and the rule set. The journal survives with a
    /// wipe entry appended.
    pub fn clear_all(&mut self) {
        self.tasks.clear();
        self.cash_entries.clear();
        self.funding_records.clear();
        self.debts.clear();
        self.contributions.clear();
        self.penalties.clear();
        self.rules = RuleSet::default();
        self.journal.record("All data cleared");
    }

    /// Drop all in-memory collections, as sign-out does. Local slots are
    /// untouched by this; persistence is the caller's concern.
    pub fn reset(&mut self) {
        self.tasks.clear();
        self.cash_entries.clear();
        self.funding_records.clear();
        self.debts.clear();
        self.contributions.clear();
        self.penalties.clear();
        self.rules = RuleSet::default();
        self.journal.clear();
    }

    pub(crate) fn restore_parts(
        &mut self,
        tasks: Vec<TaskRecord>,
        cash_entries: Vec<CashEntry>,
        funding_records: Vec<FundingRecord>,
        debts: Vec<DebtRecord>,
        contributions: Vec<ContributionRecord>,
        penalties: Vec<PenaltyRecord>,
        rules: RuleSet,
        journal: Vec<crate::journal::JournalEntry>,
    ) {
        self.tasks.replace_all(tasks);
        self.cash_entries.replace_all(cash_entries);
        self.funding_records.replace_all(funding_records);
        self.debts.replace_all(debts);
        self.contributions.replace_all(contributions);
        self.penalties.replace_all(penalties);
        self.rules = rules;
        self.journal.replace_all(journal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(name: &str) -> MemberKey {
        MemberKey::new(name, None)
    }

    #[test]
    fn append_is_newest_first() {
        let mut store = RecordStore::new();
        store.append(TaskRecord::new(RecordId(1), "one"));
        store.append(TaskRecord::new(RecordId(2), "two"));
        let texts: Vec<_> = store.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["two", "one"]);
    }

    #[test]
    fn remove_deletes_exactly_one_and_preserves_order() {
        let mut store = RecordStore::new();
        for id in 1..=4 {
            store.append(TaskRecord::new(RecordId(id), format!("t{id}")));
        }
        assert!(store.remove(RecordId(3)));
        assert!(!store.remove(RecordId(99)));
        let ids: Vec<_> = store.iter().map(|t| t.id.0).collect();
        assert_eq!(ids, [4, 2, 1]);
    }

    #[test]
    fn empty_text_creates_nothing() {
        let mut ledger = Ledger::new();
        assert!(ledger.add_task("   ").is_err());
        assert!(ledger.add_cash_entry("", 10.0, CashFlow::In).is_err());
        assert!(ledger.add_debt(member(""), 10.0).is_err());
        assert!(ledger.tasks().is_empty());
        assert!(ledger.cash_entries().is_empty());
        assert!(ledger.debts().is_empty());
    }

    #[test]
    fn clear_completed_keeps_active_tasks_in_order() {
        let mut ledger = Ledger::new();
        let a = ledger.add_task("a").unwrap();
        let b = ledger.add_task("b").unwrap();
        let c = ledger.add_task("c").unwrap();
        ledger.set_task_done(b, true).unwrap();
        ledger.clear_completed();

        let remaining: Vec<_> = ledger.tasks().iter().map(|t| t.id).collect();
        assert_eq!(remaining, [c, a]);
        assert_eq!(ledger.active_task_count(), 2);
    }

    #[test]
    fn task_filters_split_by_done() {
        let mut ledger = Ledger::new();
        let a = ledger.add_task("open").unwrap();
        let b = ledger.add_task("closed").unwrap();
        ledger.set_task_done(b, true).unwrap();

        assert_eq!(ledger.tasks_filtered(TaskFilter::All).len(), 2);
        assert_eq!(ledger.tasks_filtered(TaskFilter::Active)[0].id, a);
        assert_eq!(ledger.tasks_filtered(TaskFilter::Done)[0].id, b);
    }

    #[test]
    fn cash_summary_splits_by_flow() {
        let mut ledger = Ledger::new();
        ledger.add_cash_entry("dues", 100.0, CashFlow::In).unwrap();
        ledger.add_cash_entry("chalk", 30.0, CashFlow::Out).unwrap();
        ledger.add_cash_entry("gift", -20.0, CashFlow::In).unwrap();

        let summary = ledger.cash_summary();
        assert_eq!(summary.total_in, 120.0);
        assert_eq!(summary.total_out, 30.0);
        assert_eq!(summary.balance, 90.0);
    }

    #[test]
    fn penalty_opens_exactly_one_linked_debt() {
        let mut ledger = Ledger::new();
        let (penalty_id, debt_id) = ledger
            .add_penalty(member("Fanta"), 50.0, Some("late".to_string()))
            .unwrap();

        assert_eq!(ledger.penalties().len(), 1);
        assert_eq!(ledger.debts().len(), 1);
        let debt = ledger.debts().get(debt_id).unwrap();
        assert!(debt.links_penalty(penalty_id));
    }

    #[test]
    fn removing_a_penalty_removes_its_debt_and_no_other() {
        let mut ledger = Ledger::new();
        let hand_entered = ledger.add_debt(member("Oumar"), 25.0).unwrap();
        let (penalty_id, _) = ledger.add_penalty(member("Fanta"), 50.0, None).unwrap();

        assert!(ledger.remove_penalty(penalty_id));
        assert!(ledger.penalties().is_empty());
        assert_eq!(ledger.debts().len(), 1);
        assert!(ledger.debts().get(hand_entered).is_some());
    }

    #[test]
    fn contribution_summary_totals_per_member() {
        let mut ledger = Ledger::new();
        ledger
            .add_contribution(member("Aissata"), 10.0, Some("january".to_string()))
            .unwrap();
        ledger
            .add_contribution(member("Aissata"), 10.0, Some("february".to_string()))
            .unwrap();
        ledger.add_contribution(member("Oumar"), 5.0, None).unwrap();

        let summary = ledger.contribution_summary();
        assert_eq!(summary.total, 25.0);
        assert_eq!(summary.per_member[&member("Aissata")], 20.0);
        assert_eq!(summary.per_member[&member("Oumar")], 5.0);
    }

    #[test]
    fn clear_all_empties_categories_but_keeps_the_journal() {
        let mut ledger = Ledger::new();
        ledger.add_task("t").unwrap();
        ledger.add_debt(member("Oumar"), 5.0).unwrap();
        ledger.set_rules(RuleSet {
            min_funding: Some(10.0),
            ..RuleSet::default()
        });

        ledger.clear_all();
        assert!(ledger.tasks().is_empty());
        assert!(ledger.debts().is_empty());
        assert!(ledger.rules().is_empty());
        assert!(!ledger.journal().is_empty());
        assert_eq!(ledger.journal().entries()[0].message, "All data cleared");
    }

    #[test]
    fn reset_drops_every_collection_and_the_journal() {
        let mut ledger = Ledger::new();
        ledger.add_task("t").unwrap();
        ledger.add_cash_entry("dues", 100.0, CashFlow::In).unwrap();
        ledger.add_penalty(member("Fanta"), 50.0, None).unwrap();
        ledger.set_rules(RuleSet {
            min_funding: Some(10.0),
            ..RuleSet::default()
        });

        ledger.reset();
        assert!(ledger.tasks().is_empty());
        assert!(ledger.cash_entries().is_empty());
        assert!(ledger.debts().is_empty());
        assert!(ledger.penalties().is_empty());
        assert!(ledger.rules().is_empty());
        assert!(ledger.journal().is_empty());
    }

    #[test]
    fn rule_set_changes_land_in_the_journal() {
        let mut ledger = Ledger::new();
        ledger.save_rules(RuleSet {
            min_funding: Some(100.0),
            ..RuleSet::default()
        });
        assert_eq!(ledger.rules().min_funding, Some(100.0));
        assert_eq!(ledger.journal().entries()[0].message, "Rule set saved");

        ledger.clear_rules();
        assert!(ledger.rules().is_empty());
        assert_eq!(ledger.journal().entries()[0].message, "Rule set cleared");
    }

    #[test]
    fn mutations_land_in_the_journal() {
        let mut ledger = Ledger::new();
        ledger.add_task("buy chalk").unwrap();
        assert_eq!(
            ledger.journal().entries()[0].message,
            "Task added: buy chalk"
        );

        ledger.add_penalty(member("Fanta"), 50.0, None).unwrap();
        let messages: Vec<_> = ledger
            .journal()
            .entries()
            .iter()
            .map(|e| e.message.as_str())
            .collect();
        assert!(messages[0].starts_with("Linked debt opened"));
        assert!(messages[1].starts_with("Penalty added"));
    }
}
