//! Tontine core: the treasury ledger of a small member organization.
//!
//! This crate owns the record types, the per-category stores, the activity
//! journal, the member-totals aggregation, and the rule-based funding
//! evaluator. Persistence and presentation live in sibling crates; nothing
//! here touches the filesystem or the network.

#![deny(unsafe_code)]

pub mod aggregation;
pub mod criteria;
pub mod error;
pub mod journal;
pub mod snapshot;
pub mod store;
pub mod types;

pub use aggregation::member_totals;
pub use criteria::{evaluate, Evaluation, Projection, RuleFailure, RuleKind, Verdict};
pub use error::CoreError;
pub use journal::{Journal, JournalEntry};
pub use snapshot::Snapshot;
pub use store::{CashSummary, ContributionSummary, Ledger, Record, RecordStore, TaskFilter};
pub use types::{
    CashEntry, CashFlow, ContributionRecord, DebtOrigin, DebtRecord, FundingRecord, MemberKey,
    PageFormat, PenaltyRecord, RecordId, ReportSettings, RuleSet, TaskRecord,
};
