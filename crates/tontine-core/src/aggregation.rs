//! Member-totals aggregation.
//!
//! A member's total obligation is the sum of their debts plus any penalty
//! that has no linked debt on the books. Every penalty opens a linked debt
//! at creation time, so a penalty only counts here when that debt was
//! deleted independently; counting both would double the sanction.

use crate::types::{DebtRecord, MemberKey, PenaltyRecord};
use std::collections::BTreeMap;

/// Total obligation per member, keyed by (name, rank). Deterministic
/// (BTreeMap) so listings and reports are stable.
pub fn member_totals(
    debts: &[DebtRecord],
    penalties: &[PenaltyRecord],
) -> BTreeMap<MemberKey, f64> {
    let mut totals: BTreeMap<MemberKey, f64> = BTreeMap::new();

    for debt in debts {
        *totals.entry(debt.member.clone()).or_insert(0.0) += debt.amount;
    }

    for penalty in penalties {
        let linked = debts.iter().any(|debt| debt.links_penalty(penalty.id));
        if !linked {
            *totals.entry(penalty.member.clone()).or_insert(0.0) += penalty.amount;
        }
    }

    totals
}
