use crate::error::StorageResult;
use crate::slot::{Slot, SlotStore};
use tontine_core::{Ledger, ReportSettings, Snapshot};

/// Whole-ledger persistence over the local slots. Tasks are deliberately
/// absent here: they belong to the remote backend (see
/// [`crate::tasks::TaskPersistence`]) and start empty until a remote load
/// replaces them. There is no transactional guarantee across categories.
#[derive(Debug, Clone)]
pub struct LedgerStorage {
    slots: SlotStore,
}

impl LedgerStorage {
    pub fn new(slots: SlotStore) -> Self {
        Self { slots }
    }

    pub fn slots(&self) -> &SlotStore {
        &self.slots
    }

    /// Hydrate a ledger from the local slots. Any missing or malformed
    /// slot yields its empty/default value.
    pub fn load(&self) -> Ledger {
        let snapshot = Snapshot {
            tasks: Vec::new(),
            cash_entries: self.slots.load_or_default(Slot::CashEntries),
            funding_records: self.slots.load_or_default(Slot::FundingRecords),
            debts: self.slots.load_or_default(Slot::Debts),
            contributions: self.slots.load_or_default(Slot::Contributions),
            penalties: self.slots.load_or_default(Slot::Penalties),
            rule_set: self.slots.load_or_default(Slot::RuleSet),
            journal: self.slots.load_or_default(Slot::Journal),
        };

        let mut ledger = Ledger::new();
        ledger.hydrate(snapshot);
        ledger.set_report_settings(self.slots.load_or_default::<ReportSettings>(Slot::ReportSettings));
        ledger
    }

    /// Serialize every local category into its slot.
    pub fn save(&self, ledger: &Ledger) -> StorageResult<()> {
        self.slots
            .save(Slot::CashEntries, ledger.cash_entries().records())?;
        self.slots
            .save(Slot::FundingRecords, ledger.funding_records().records())?;
        self.slots.save(Slot::Debts, ledger.debts().records())?;
        self.slots
            .save(Slot::Contributions, ledger.contributions().records())?;
        self.slots
            .save(Slot::Penalties, ledger.penalties().records())?;
        self.slots.save(Slot::RuleSet, ledger.rules())?;
        self.slots.save(Slot::Journal, ledger.journal())?;
        self.slots
            .save(Slot::ReportSettings, ledger.report_settings())?;
        Ok(())
    }
}
