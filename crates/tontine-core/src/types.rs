use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

/// Synthetic record identifier: a millisecond clock reading taken at
/// creation time. [`RecordId::now`] is clamped monotonic within a process,
/// so a burst of creations inside one millisecond still yields distinct
/// ids; the value stays a usable timestamp.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct RecordId(pub i64);

static LAST_ID: AtomicI64 = AtomicI64::new(0);

impl RecordId {
    /// Read the clock, never repeating an id handed out by this process.
    pub fn now() -> Self {
        let now = Utc::now().timestamp_millis();
        let mut prev = LAST_ID.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev + 1);
            match LAST_ID.compare_exchange(prev, next, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => return Self(next),
                Err(observed) => prev = observed,
            }
        }
    }

    /// The next identifier after this one, reserved against future
    /// [`RecordId::now`] calls. Used for the debt opened alongside a
    /// penalty so the pair stays distinct within one tick.
    pub fn successor(self) -> Self {
        let next = self.0 + 1;
        LAST_ID.fetch_max(next, Ordering::Relaxed);
        Self(next)
    }

    /// The id doubles as a creation timestamp.
    pub fn timestamp(self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.0).single()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Member identity used to key debts, contributions, and penalties.
/// Rank is normalized to the empty string when absent so the same member
/// entered with and without a blank rank aggregates under one key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MemberKey {
    #[serde(rename = "memberName")]
    pub name: String,
    #[serde(rename = "memberRank", default)]
    pub rank: String,
}

impl MemberKey {
    pub fn new(name: impl Into<String>, rank: Option<String>) -> Self {
        Self {
            name: name.into(),
            rank: rank.map(|r| r.trim().to_string()).unwrap_or_default(),
        }
    }
}

impl fmt::Display for MemberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rank.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} — {}", self.name, self.rank)
        }
    }
}

/// A tracked task. The only record kind mutated in place (done toggles).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: RecordId,
    pub text: String,
    #[serde(default)]
    pub done: bool,
}

impl TaskRecord {
    pub fn new(id: RecordId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            done: false,
        }
    }
}

/// Direction of a cash movement. Amounts are stored unsigned; direction
/// lives here, never in the sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CashFlow {
    In,
    Out,
}

impl fmt::Display for CashFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::In => write!(f, "in"),
            Self::Out => write!(f, "out"),
        }
    }
}

/// A cash-box movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashEntry {
    pub id: RecordId,
    pub text: String,
    pub amount: f64,
    pub kind: CashFlow,
}

impl CashEntry {
    pub fn new(id: RecordId, text: impl Into<String>, amount: f64, kind: CashFlow) -> Self {
        Self {
            id,
            text: text.into(),
            amount: amount.abs(),
            kind,
        }
    }
}

/// A funded project or initiative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingRecord {
    pub id: RecordId,
    pub name: String,
    #[serde(rename = "fundSource", default, skip_serializing_if = "Option::is_none")]
    pub fund_source: Option<String>,
    pub amount: f64,
}

impl FundingRecord {
    pub fn new(
        id: RecordId,
        name: impl Into<String>,
        fund_source: Option<String>,
        amount: f64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            fund_source: fund_source.filter(|s| !s.trim().is_empty()),
            amount: amount.abs(),
        }
    }
}

/// Where a debt came from, when it was not entered by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebtOrigin {
    Penalty,
}

/// A member debt. Debts opened by a penalty carry the penalty's id in
/// `origin_id`; the aggregation engine relies on that link to avoid
/// counting the penalty twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtRecord {
    pub id: RecordId,
    #[serde(flatten)]
    pub member: MemberKey,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<DebtOrigin>,
    #[serde(rename = "originId", default, skip_serializing_if = "Option::is_none")]
    pub origin_id: Option<RecordId>,
}

impl DebtRecord {
    pub fn new(id: RecordId, member: MemberKey, amount: f64) -> Self {
        Self {
            id,
            member,
            amount: amount.abs(),
            origin: None,
            origin_id: None,
        }
    }

    /// The debt automatically opened when a penalty is issued.
    pub fn from_penalty(penalty: &PenaltyRecord) -> Self {
        Self {
            id: penalty.id.successor(),
            member: penalty.member.clone(),
            amount: penalty.amount,
            origin: Some(DebtOrigin::Penalty),
            origin_id: Some(penalty.id),
        }
    }

    pub fn links_penalty(&self, penalty_id: RecordId) -> bool {
        self.origin == Some(DebtOrigin::Penalty) && self.origin_id == Some(penalty_id)
    }
}

/// A member contribution for a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionRecord {
    pub id: RecordId,
    #[serde(flatten)]
    pub member: MemberKey,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
}

impl ContributionRecord {
    pub fn new(id: RecordId, member: MemberKey, amount: f64, period: Option<String>) -> Self {
        Self {
            id,
            member,
            amount: amount.abs(),
            period: period.filter(|p| !p.trim().is_empty()),
        }
    }
}

/// A financial sanction against a member. Issuing one always opens a
/// linked debt; see [`DebtRecord::from_penalty`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltyRecord {
    pub id: RecordId,
    #[serde(flatten)]
    pub member: MemberKey,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl PenaltyRecord {
    pub fn new(id: RecordId, member: MemberKey, amount: f64, reason: Option<String>) -> Self {
        Self {
            id,
            member,
            amount: amount.abs(),
            reason: reason.filter(|r| !r.trim().is_empty()),
        }
    }
}

/// Acceptance thresholds for funding evaluation. `None` means unset; an
/// unset rule never fails.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSet {
    #[serde(default)]
    pub min_funding: Option<f64>,
    #[serde(default)]
    pub min_balance: Option<f64>,
    #[serde(default, rename = "minROI")]
    pub min_roi: Option<f64>,
    #[serde(default)]
    pub max_member_debt: Option<f64>,
    #[serde(default)]
    pub required_fund_source: Option<String>,
}

impl RuleSet {
    pub fn is_empty(&self) -> bool {
        self.min_funding.is_none()
            && self.min_balance.is_none()
            && self.min_roi.is_none()
            && self.max_member_debt.is_none()
            && self.required_fund_source.is_none()
    }
}

/// Page size for generated report documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageFormat {
    #[default]
    A4,
    Letter,
}

impl PageFormat {
    /// The CSS `@page` size keyword.
    pub fn css_size(self) -> &'static str {
        match self {
            Self::A4 => "A4",
            Self::Letter => "Letter",
        }
    }
}

/// Report document settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSettings {
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub logo_url: String,
    #[serde(default, rename = "format")]
    pub page_format: PageFormat,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            title: "Tontine report".to_string(),
            subtitle: String::new(),
            logo_url: String::new(),
            page_format: PageFormat::A4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_are_stored_unsigned() {
        let entry = CashEntry::new(RecordId(1), "refund", -20.0, CashFlow::Out);
        assert_eq!(entry.amount, 20.0);

        let debt = DebtRecord::new(RecordId(2), MemberKey::new("Aissata", None), -75.5);
        assert_eq!(debt.amount, 75.5);

        let funding = FundingRecord::new(RecordId(3), "well", None, -1000.0);
        assert_eq!(funding.amount, 1000.0);
    }

    #[test]
    fn member_key_normalizes_blank_rank() {
        let with_blank = MemberKey::new("Mamadou", Some("  ".to_string()));
        let without = MemberKey::new("Mamadou", None);
        assert_eq!(with_blank, without);
        assert_eq!(with_blank.to_string(), "Mamadou");

        let ranked = MemberKey::new("Mamadou", Some("treasurer".to_string()));
        assert_eq!(ranked.to_string(), "Mamadou — treasurer");
    }

    #[test]
    fn penalty_debt_carries_the_link() {
        let penalty = PenaltyRecord::new(
            RecordId(100),
            MemberKey::new("Fanta", None),
            50.0,
            Some("late".to_string()),
        );
        let debt = DebtRecord::from_penalty(&penalty);
        assert_eq!(debt.id, RecordId(101));
        assert_eq!(debt.amount, 50.0);
        assert!(debt.links_penalty(RecordId(100)));
        assert!(!debt.links_penalty(RecordId(101)));
    }

    #[test]
    fn debt_round_trips_with_flat_member_fields() {
        let debt = DebtRecord::new(
            RecordId(7),
            MemberKey::new("Oumar", Some("secretary".to_string())),
            30.0,
        );
        let json = serde_json::to_value(&debt).unwrap();
        assert_eq!(json["memberName"], "Oumar");
        assert_eq!(json["memberRank"], "secretary");
        let back: DebtRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, debt);
    }

    #[test]
    fn rule_set_defaults_to_everything_unset() {
        let rules = RuleSet::default();
        assert!(rules.is_empty());
        let parsed: RuleSet = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, rules);
    }
}
