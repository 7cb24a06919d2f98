//! Funding projection and rule evaluation.
//!
//! A projection is a what-if income/expense/duration scenario applied to a
//! funding record. Evaluation checks the projection and the record against
//! the organization's rule set and the member-totals aggregation, producing
//! a verdict with one human-readable reason per violated rule.

use crate::types::{FundingRecord, MemberKey, RuleSet};
use serde::Serialize;
use std::collections::BTreeMap;

/// Simulated outcome of running a funding record through an income/expense
/// scenario.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Projection {
    pub projected_balance: f64,
    pub roi: f64,
    pub income: f64,
    pub expenses: f64,
    pub duration_months: u32,
}

impl Projection {
    /// `projected_balance = funding + income - expenses`;
    /// `roi = (income - expenses) / funding * 100`, zero when the funding
    /// amount is zero rather than dividing by it.
    pub fn simulate(funding: &FundingRecord, income: f64, expenses: f64, duration_months: u32) -> Self {
        let net = income - expenses;
        let roi = if funding.amount != 0.0 {
            net / funding.amount * 100.0
        } else {
            0.0
        };
        Self {
            projected_balance: funding.amount + net,
            roi,
            income,
            expenses,
            duration_months,
        }
    }
}

/// Which rule a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleKind {
    MinFunding,
    MinBalance,
    MinRoi,
    RequiredFundSource,
    MaxMemberDebt,
}

/// One violated rule, with observed and required values in the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleFailure {
    pub rule: RuleKind,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Accepted,
    Rejected,
}

/// Outcome of evaluating one funding record under one projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub verdict: Verdict,
    pub failures: Vec<RuleFailure>,
}

impl Evaluation {
    pub fn accepted(&self) -> bool {
        self.verdict == Verdict::Accepted
    }
}

/// Evaluate a funding record under a projection. An unset rule never
/// fails; the verdict is accepted iff no rule failed.
///
/// The max-member-debt rule checks the worst-case member across the whole
/// organization, not the member tied to the funding record. Observed
/// behavior of the system this reimplements; kept as is.
pub fn evaluate(
    funding: &FundingRecord,
    projection: &Projection,
    rules: &RuleSet,
    member_totals: &BTreeMap<MemberKey, f64>,
) -> Evaluation {
    let mut failures = Vec::new();

    if let Some(min_funding) = rules.min_funding {
        if funding.amount < min_funding {
            failures.push(RuleFailure {
                rule: RuleKind::MinFunding,
                reason: format!(
                    "funding ({:.2}) below required minimum ({:.2})",
                    funding.amount, min_funding
                ),
            });
        }
    }

    if let Some(min_balance) = rules.min_balance {
        if projection.projected_balance < min_balance {
            failures.push(RuleFailure {
                rule: RuleKind::MinBalance,
                reason: format!(
                    "projected balance ({:.2}) below required minimum ({:.2})",
                    projection.projected_balance, min_balance
                ),
            });
        }
    }

    if let Some(min_roi) = rules.min_roi {
        if projection.roi < min_roi {
            failures.push(RuleFailure {
                rule: RuleKind::MinRoi,
                reason: format!(
                    "estimated ROI ({:.2}%) below required minimum ({min_roi}%)",
                    projection.roi
                ),
            });
        }
    }

    if let Some(required) = rules.required_fund_source.as_deref() {
        if funding.fund_source.as_deref() != Some(required) {
            failures.push(RuleFailure {
                rule: RuleKind::RequiredFundSource,
                reason: format!(
                    "fund source ({}) does not match required source ({required})",
                    funding.fund_source.as_deref().unwrap_or("—")
                ),
            });
        }
    }

    if let Some(max_member_debt) = rules.max_member_debt {
        let worst = member_totals.values().fold(0.0_f64, |acc, &v| acc.max(v));
        if worst > max_member_debt {
            failures.push(RuleFailure {
                rule: RuleKind::MaxMemberDebt,
                reason: format!(
                    "highest member debt ({worst:.2}) exceeds allowed maximum ({max_member_debt:.2})"
                ),
            });
        }
    }

    let verdict = if failures.is_empty() {
        Verdict::Accepted
    } else {
        Verdict::Rejected
    };
    Evaluation { verdict, failures }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordId;

    fn funding(amount: f64, source: Option<&str>) -> FundingRecord {
        FundingRecord::new(
            RecordId(1),
            "community well",
            source.map(str::to_string),
            amount,
        )
    }

    fn no_totals() -> BTreeMap<MemberKey, f64> {
        BTreeMap::new()
    }

    #[test]
    fn zero_funding_yields_zero_roi_not_a_fault() {
        let projection = Projection::simulate(&funding(0.0, None), 100.0, 20.0, 6);
        assert_eq!(projection.roi, 0.0);
        assert_eq!(projection.projected_balance, 80.0);
    }

    #[test]
    fn projection_math_matches_the_definition() {
        let projection = Projection::simulate(&funding(1000.0, None), 500.0, 300.0, 12);
        assert_eq!(projection.projected_balance, 1200.0);
        assert_eq!(projection.roi, 20.0);
    }

    #[test]
    fn sufficient_funding_passes_the_minimum() {
        let rules = RuleSet {
            min_funding: Some(100.0),
            ..RuleSet::default()
        };
        let record = funding(150.0, None);
        let projection = Projection::simulate(&record, 0.0, 0.0, 0);
        let evaluation = evaluate(&record, &projection, &rules, &no_totals());
        assert!(evaluation.accepted());
        assert!(evaluation
            .failures
            .iter()
            .all(|f| f.rule != RuleKind::MinFunding));
    }

    #[test]
    fn insufficient_funding_fails_with_exactly_one_reason() {
        let rules = RuleSet {
            min_funding: Some(100.0),
            ..RuleSet::default()
        };
        let record = funding(50.0, None);
        let projection = Projection::simulate(&record, 0.0, 0.0, 0);
        let evaluation = evaluate(&record, &projection, &rules, &no_totals());
        assert!(!evaluation.accepted());
        assert_eq!(evaluation.failures.len(), 1);
        assert_eq!(evaluation.failures[0].rule, RuleKind::MinFunding);
        assert!(evaluation.failures[0].reason.contains("50.00"));
        assert!(evaluation.failures[0].reason.contains("100.00"));
    }

    #[test]
    fn missing_fund_source_never_satisfies_the_requirement() {
        let rules = RuleSet {
            required_fund_source: Some("main fund".to_string()),
            ..RuleSet::default()
        };
        let record = funding(10.0, None);
        let projection = Projection::simulate(&record, 0.0, 0.0, 0);
        let evaluation = evaluate(&record, &projection, &rules, &no_totals());
        assert_eq!(evaluation.failures[0].rule, RuleKind::RequiredFundSource);

        let matching = funding(10.0, Some("main fund"));
        let evaluation = evaluate(&matching, &projection, &rules, &no_totals());
        assert!(evaluation.accepted());
    }

    #[test]
    fn max_member_debt_checks_the_global_worst_case() {
        let rules = RuleSet {
            max_member_debt: Some(40.0),
            ..RuleSet::default()
        };
        let mut totals = BTreeMap::new();
        totals.insert(MemberKey::new("Aissata", None), 30.0);
        totals.insert(MemberKey::new("Oumar", None), 55.0);

        let record = funding(1000.0, None);
        let projection = Projection::simulate(&record, 0.0, 0.0, 0);
        let evaluation = evaluate(&record, &projection, &rules, &totals);
        assert_eq!(evaluation.failures.len(), 1);
        assert_eq!(evaluation.failures[0].rule, RuleKind::MaxMemberDebt);
        assert!(evaluation.failures[0].reason.contains("55.00"));
    }

    #[test]
    fn debt_exactly_at_the_maximum_passes() {
        let rules = RuleSet {
            max_member_debt: Some(55.0),
            ..RuleSet::default()
        };
        let mut totals = BTreeMap::new();
        totals.insert(MemberKey::new("Oumar", None), 55.0);

        let record = funding(1000.0, None);
        let projection = Projection::simulate(&record, 0.0, 0.0, 0);
        assert!(evaluate(&record, &projection, &rules, &totals).accepted());
    }

    #[test]
    fn empty_rule_set_accepts_everything() {
        let record = funding(0.0, None);
        let projection = Projection::simulate(&record, 0.0, 1000.0, 1);
        let evaluation = evaluate(&record, &projection, &RuleSet::default(), &no_totals());
        assert!(evaluation.accepted());
        assert!(evaluation.failures.is_empty());
    }

    #[test]
    fn multiple_violations_accumulate_in_rule_order() {
        let rules = RuleSet {
            min_funding: Some(100.0),
            min_balance: Some(0.0),
            min_roi: Some(10.0),
            ..RuleSet::default()
        };
        let record = funding(50.0, None);
        let projection = Projection::simulate(&record, 0.0, 200.0, 3);
        let evaluation = evaluate(&record, &projection, &rules, &no_totals());
        let kinds: Vec<_> = evaluation.failures.iter().map(|f| f.rule).collect();
        assert_eq!(
            kinds,
            [RuleKind::MinFunding, RuleKind::MinBalance, RuleKind::MinRoi]
        );
    }
}
