//! Print-ready report documents.
//!
//! Each generator returns a self-contained HTML page embedding a snapshot
//! of the ledger. Human-facing only; nothing parses these back.

use crate::render::when;
use tontine_core::{Ledger, PenaltyRecord, ReportSettings};

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let head = headers
        .iter()
        .map(|h| format!("<th>{}</th>", escape(h)))
        .collect::<String>();
    let body = rows
        .iter()
        .map(|row| {
            let cells = row
                .iter()
                .map(|cell| format!("<td>{}</td>", escape(cell)))
                .collect::<String>();
            format!("<tr>{cells}</tr>")
        })
        .collect::<String>();
    format!("<table><thead><tr>{head}</tr></thead><tbody>{body}</tbody></table>")
}

fn page_open(settings: &ReportSettings, title: &str) -> String {
    let logo = if settings.logo_url.is_empty() {
        String::new()
    } else {
        format!(
            "<img src=\"{}\" style=\"max-height:60px;margin-bottom:15px\" />",
            escape(&settings.logo_url)
        )
    };
    let subtitle = if settings.subtitle.is_empty() {
        String::new()
    } else {
        format!(
            "<p style=\"color:#666;font-size:14px;margin:5px 0\">{}</p>",
            escape(&settings.subtitle)
        )
    };
    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{title}</title>\
         <style>@page{{size:{page};margin:20mm}}\
         body{{font-family:Arial,Helvetica,sans-serif;padding:20px;color:#111}}\
         h1{{font-size:22px;margin:0;padding:0}}\
         h2{{font-size:14px;margin-top:20px;border-bottom:1px solid #ccc;padding-bottom:5px}}\
         table{{width:100%;border-collapse:collapse;margin-bottom:16px}}\
         th,td{{border:1px solid #ddd;padding:8px;text-align:left}}\
         th{{background:#f4f4f4}}</style></head><body>{logo}<h1>{title}</h1>{subtitle}",
        title = escape(title),
        page = settings.page_format.css_size(),
    )
}

fn page_close(note: &str) -> String {
    format!(
        "<div style=\"margin-top:30px;color:#999;font-size:11px;border-top:1px solid #ddd;\
         padding-top:10px\">{note} — {}</div></body></html>",
        chrono::Utc::now().format("%Y-%m-%d %H:%M UTC")
    )
}

/// The full report: every category, member totals, and the rule set.
pub fn full_report(ledger: &Ledger) -> String {
    let settings = ledger.report_settings();
    let mut doc = page_open(settings, &settings.title);

    doc.push_str("<h2>Tasks</h2>");
    let rows: Vec<_> = ledger
        .tasks()
        .iter()
        .map(|t| {
            let status = if t.done { "✓" } else { "" };
            vec![t.text.clone(), status.to_string()]
        })
        .collect();
    doc.push_str(&table(&["Task", "Status"], &rows));

    doc.push_str("<h2>Cash entries</h2>");
    let rows: Vec<_> = ledger
        .cash_entries()
        .iter()
        .map(|e| {
            vec![
                e.text.clone(),
                e.kind.to_string(),
                format!("{:.2}", e.amount),
                when(e.id),
            ]
        })
        .collect();
    doc.push_str(&table(&["Description", "Kind", "Amount", "Date"], &rows));

    doc.push_str("<h2>Funding records</h2>");
    let rows: Vec<_> = ledger
        .funding_records()
        .iter()
        .map(|p| {
            vec![
                p.name.clone(),
                p.fund_source.clone().unwrap_or_default(),
                format!("{:.2}", p.amount),
            ]
        })
        .collect();
    doc.push_str(&table(&["Name", "Fund source", "Amount"], &rows));

    doc.push_str("<h2>Debts</h2>");
    let rows: Vec<_> = ledger
        .debts()
        .iter()
        .map(|d| {
            vec![
                d.member.name.clone(),
                d.member.rank.clone(),
                format!("{:.2}", d.amount),
                d.origin.map(|_| "penalty").unwrap_or("").to_string(),
                when(d.id),
            ]
        })
        .collect();
    doc.push_str(&table(&["Member", "Rank", "Amount", "Origin", "Date"], &rows));

    doc.push_str("<h2>Contributions</h2>");
    let rows: Vec<_> = ledger
        .contributions()
        .iter()
        .map(|c| {
            vec![
                c.member.name.clone(),
                c.member.rank.clone(),
                c.period.clone().unwrap_or_default(),
                format!("{:.2}", c.amount),
                when(c.id),
            ]
        })
        .collect();
    doc.push_str(&table(&["Member", "Rank", "Period", "Amount", "Date"], &rows));

    doc.push_str("<h2>Penalties</h2>");
    let rows: Vec<_> = ledger
        .penalties()
        .iter()
        .map(|s| {
            vec![
                s.member.name.clone(),
                s.member.rank.clone(),
                s.reason.clone().unwrap_or_default(),
                format!("{:.2}", s.amount),
                when(s.id),
            ]
        })
        .collect();
    doc.push_str(&table(&["Member", "Rank", "Reason", "Amount", "Date"], &rows));

    doc.push_str("<h2>Activity journal</h2>");
    let rows: Vec<_> = ledger
        .journal()
        .entries()
        .iter()
        .map(|l| vec![l.message.clone(), when(l.id)])
        .collect();
    doc.push_str(&table(&["Event", "Date"], &rows));

    doc.push_str("<h2>Member totals (debts + penalties)</h2>");
    let rows: Vec<_> = ledger
        .member_totals()
        .iter()
        .map(|(member, total)| vec![member.to_string(), format!("{total:.2}")])
        .collect();
    doc.push_str(&table(&["Member", "Total owed"], &rows));

    doc.push_str("<h2>Rule set</h2><ul>");
    let rules = ledger.rules();
    let mut rule_item = |name: &str, value: Option<String>| {
        if let Some(value) = value {
            doc.push_str(&format!("<li>{name}: {}</li>", escape(&value)));
        }
    };
    rule_item("minimum funding", rules.min_funding.map(|v| format!("{v:.2}")));
    rule_item("minimum balance", rules.min_balance.map(|v| format!("{v:.2}")));
    rule_item("minimum ROI", rules.min_roi.map(|v| format!("{v}%")));
    rule_item(
        "maximum member debt",
        rules.max_member_debt.map(|v| format!("{v:.2}")),
    );
    rule_item("required fund source", rules.required_fund_source.clone());
    doc.push_str("</ul>");

    doc.push_str(&page_close("Generated by tontine"));
    doc
}

/// A one-page notice for a single penalty.
pub fn penalty_notice(penalty: &PenaltyRecord, settings: &ReportSettings) -> String {
    let mut doc = page_open(settings, &format!("Penalty — {}", penalty.member.name));
    doc.push_str(&format!(
        "<div><strong>Member:</strong> {}</div>\
         <div class=\"meta\"><strong>Reason:</strong> {} — <strong>Date:</strong> {}</div>\
         <div style=\"font-weight:700;color:#b22323;margin-top:10px;font-size:18px\">\
         Amount: -{:.2}</div>",
        escape(&penalty.member.to_string()),
        escape(penalty.reason.as_deref().unwrap_or("—")),
        when(penalty.id),
        penalty.amount,
    ));
    doc.push_str(&page_close("Generated by tontine"));
    doc
}

/// The roster of every penalty on the books.
pub fn penalty_roster(penalties: &[PenaltyRecord], settings: &ReportSettings) -> String {
    let mut doc = page_open(settings, "Penalties");
    let rows: Vec<_> = penalties
        .iter()
        .map(|s| {
            vec![
                s.member.to_string(),
                s.reason.clone().unwrap_or_else(|| "—".to_string()),
                when(s.id),
                format!("-{:.2}", s.amount),
            ]
        })
        .collect();
    doc.push_str(&table(&["Member", "Reason", "Date", "Amount"], &rows));
    doc.push_str(&page_close("Exported by tontine"));
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use tontine_core::{CashFlow, MemberKey, PageFormat, RuleSet};

    fn sample_ledger() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.add_task("buy chalk").unwrap();
        ledger.add_cash_entry("dues", 100.0, CashFlow::In).unwrap();
        ledger
            .add_funding("well", Some("main fund".to_string()), 500.0)
            .unwrap();
        ledger
            .add_penalty(
                MemberKey::new("Fanta", None),
                50.0,
                Some("late".to_string()),
            )
            .unwrap();
        ledger.set_rules(RuleSet {
            min_funding: Some(200.0),
            ..RuleSet::default()
        });
        ledger
    }

    #[test]
    fn full_report_embeds_every_section() {
        let doc = full_report(&sample_ledger());
        for heading in [
            "<h2>Tasks</h2>",
            "<h2>Cash entries</h2>",
            "<h2>Funding records</h2>",
            "<h2>Debts</h2>",
            "<h2>Contributions</h2>",
            "<h2>Penalties</h2>",
            "<h2>Activity journal</h2>",
            "<h2>Member totals (debts + penalties)</h2>",
            "<h2>Rule set</h2>",
        ] {
            assert!(doc.contains(heading), "missing {heading}");
        }
        assert!(doc.contains("buy chalk"));
        assert!(doc.contains("minimum funding: 200.00"));
        // the penalty's auto-created debt shows in both tables
        assert!(doc.contains("Fanta"));
    }

    #[test]
    fn page_format_drives_the_page_rule() {
        let mut ledger = sample_ledger();
        assert!(full_report(&ledger).contains("@page{size:A4;"));
        let mut settings = ledger.report_settings().clone();
        settings.page_format = PageFormat::Letter;
        ledger.set_report_settings(settings);
        assert!(full_report(&ledger).contains("@page{size:Letter;"));
    }

    #[test]
    fn untrusted_text_is_escaped() {
        let mut ledger = Ledger::new();
        ledger.add_task("<script>alert(1)</script>").unwrap();
        let doc = full_report(&ledger);
        assert!(!doc.contains("<script>"));
        assert!(doc.contains("&lt;script&gt;"));
    }

    #[test]
    fn penalty_notice_carries_member_reason_and_amount() {
        let penalty = PenaltyRecord::new(
            tontine_core::RecordId(1),
            MemberKey::new("Fanta", Some("member".to_string())),
            50.0,
            Some("late to meeting".to_string()),
        );
        let doc = penalty_notice(&penalty, &ReportSettings::default());
        assert!(doc.contains("Fanta — member"));
        assert!(doc.contains("late to meeting"));
        assert!(doc.contains("Amount: -50.00"));
    }

    #[test]
    fn roster_lists_every_penalty() {
        let penalties = vec![
            PenaltyRecord::new(tontine_core::RecordId(1), MemberKey::new("A", None), 10.0, None),
            PenaltyRecord::new(tontine_core::RecordId(2), MemberKey::new("B", None), 20.0, None),
        ];
        let doc = penalty_roster(&penalties, &ReportSettings::default());
        assert!(doc.contains("<td>A</td>"));
        assert!(doc.contains("<td>B</td>"));
        assert!(doc.contains("-20.00"));
    }
}
