//! Plain-text rendering of ledger state for the terminal.

use std::collections::BTreeMap;
use tontine_core::{
    CashEntry, CashFlow, CashSummary, ContributionRecord, ContributionSummary, DebtRecord,
    Evaluation, FundingRecord, JournalEntry, MemberKey, PenaltyRecord, Projection, RecordId,
    TaskRecord,
};

/// Creation timestamp of a record, derived from its id.
pub fn when(id: RecordId) -> String {
    id.timestamp()
        .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "—".to_string())
}

pub fn task_line(task: &TaskRecord) -> String {
    let mark = if task.done { "x" } else { " " };
    format!("[{mark}] {}  {}", task.id, task.text)
}

/// "3 tasks left" / "1 task left".
pub fn task_counter(active: usize) -> String {
    if active == 1 {
        "1 task left".to_string()
    } else {
        format!("{active} tasks left")
    }
}

pub fn cash_line(entry: &CashEntry) -> String {
    let sign = match entry.kind {
        CashFlow::In => '+',
        CashFlow::Out => '-',
    };
    format!(
        "{}  {}  {sign}{:.2}  {}",
        entry.id,
        when(entry.id),
        entry.amount,
        entry.text
    )
}

pub fn cash_summary_block(summary: &CashSummary) -> String {
    format!(
        "in: {:.2}  out: {:.2}  balance: {:.2}",
        summary.total_in, summary.total_out, summary.balance
    )
}

pub fn funding_line(record: &FundingRecord) -> String {
    format!(
        "{}  {}  {:.2}  {}{}",
        record.id,
        when(record.id),
        record.amount,
        record.name,
        record
            .fund_source
            .as_deref()
            .map(|s| format!(" ({s})"))
            .unwrap_or_default()
    )
}

pub fn debt_line(debt: &DebtRecord) -> String {
    let origin = if debt.origin.is_some() {
        "  [penalty]"
    } else {
        ""
    };
    format!(
        "{}  {}  -{:.2}  {}{origin}",
        debt.id,
        when(debt.id),
        debt.amount,
        debt.member
    )
}

pub fn contribution_line(contribution: &ContributionRecord) -> String {
    format!(
        "{}  {}  +{:.2}  {}{}",
        contribution.id,
        when(contribution.id),
        contribution.amount,
        contribution.member,
        contribution
            .period
            .as_deref()
            .map(|p| format!(" ({p})"))
            .unwrap_or_default()
    )
}

pub fn penalty_line(penalty: &PenaltyRecord) -> String {
    format!(
        "{}  {}  -{:.2}  {}  ({})",
        penalty.id,
        when(penalty.id),
        penalty.amount,
        penalty.member,
        penalty.reason.as_deref().unwrap_or("—")
    )
}

pub fn journal_line(entry: &JournalEntry) -> String {
    format!("{}  {}", when(entry.id), entry.message)
}

pub fn member_totals_block(totals: &BTreeMap<MemberKey, f64>) -> String {
    if totals.is_empty() {
        return "no member obligations".to_string();
    }
    totals
        .iter()
        .map(|(member, total)| format!("{member} : {total:.2}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn contribution_summary_block(summary: &ContributionSummary) -> String {
    let mut lines = vec![format!("total contributions: {:.2}", summary.total)];
    for (member, total) in &summary.per_member {
        lines.push(format!("{member} : {total:.2}"));
    }
    lines.join("\n")
}

pub fn simulation_block(funding: &FundingRecord, projection: &Projection) -> String {
    format!(
        "project: {}\nprojected balance: {:.2}\nestimated ROI: {:.2}%\nduration: {} months",
        funding.name, projection.projected_balance, projection.roi, projection.duration_months
    )
}

pub fn evaluation_block(evaluation: &Evaluation) -> String {
    if evaluation.accepted() {
        "Accepted — the project satisfies every rule".to_string()
    } else {
        let mut out = format!(
            "Rejected — {} condition(s) not met",
            evaluation.failures.len()
        );
        for failure in &evaluation.failures {
            out.push_str("\n  - ");
            out.push_str(&failure.reason);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tontine_core::{evaluate, Projection, RuleSet};

    #[test]
    fn task_line_marks_done_tasks() {
        let mut task = TaskRecord::new(RecordId(1), "buy chalk");
        assert!(task_line(&task).starts_with("[ ]"));
        task.done = true;
        assert!(task_line(&task).starts_with("[x]"));
    }

    #[test]
    fn task_counter_pluralizes() {
        assert_eq!(task_counter(1), "1 task left");
        assert_eq!(task_counter(0), "0 tasks left");
        assert_eq!(task_counter(3), "3 tasks left");
    }

    #[test]
    fn member_totals_block_lists_each_member() {
        let mut totals = BTreeMap::new();
        totals.insert(MemberKey::new("Aissata", None), 40.0);
        totals.insert(
            MemberKey::new("Oumar", Some("secretary".to_string())),
            15.5,
        );
        let block = member_totals_block(&totals);
        assert!(block.contains("Aissata : 40.00"));
        assert!(block.contains("Oumar — secretary : 15.50"));
    }

    #[test]
    fn evaluation_block_reports_both_verdicts() {
        let funding = FundingRecord::new(RecordId(1), "well", None, 150.0);
        let projection = Projection::simulate(&funding, 0.0, 0.0, 0);
        let rules = RuleSet {
            min_funding: Some(100.0),
            ..RuleSet::default()
        };
        let accepted = evaluate(&funding, &projection, &rules, &BTreeMap::new());
        assert!(evaluation_block(&accepted).starts_with("Accepted"));

        let poor = FundingRecord::new(RecordId(2), "well", None, 50.0);
        let rejected = evaluate(&poor, &projection, &rules, &BTreeMap::new());
        let block = evaluation_block(&rejected);
        assert!(block.starts_with("Rejected — 1 condition(s) not met"));
        assert!(block.contains("50.00"));
    }
}
