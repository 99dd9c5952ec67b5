use std::fmt::Write;

use chrono::NaiveDate;
use serde::Serialize;

use crate::dataset::MalformedRow;
use crate::error::Result;
use crate::kpi;
use crate::models::{CampaignEvent, GroupBy, Kpis, MonthlyTotals, SummaryRow};

const TOP_EVENTS: usize = 5;

#[derive(Debug, Serialize)]
pub struct EventKpis {
    pub date: NaiveDate,
    pub campaign: String,
    pub platform: String,
    #[serde(flatten)]
    pub kpis: Kpis,
}

/// Every rollup the reports draw from, computed once per run.
#[derive(Debug, Serialize)]
pub struct SummaryDocument {
    pub overall: SummaryRow,
    pub campaign: Vec<SummaryRow>,
    pub channel: Vec<SummaryRow>,
    pub platform: Vec<SummaryRow>,
    pub monthly: Vec<MonthlyTotals>,
    pub top_events: Vec<EventKpis>,
}

impl SummaryDocument {
    pub fn from_events(events: &[CampaignEvent]) -> Self {
        let rows = |group_by: GroupBy| -> Vec<SummaryRow> {
            kpi::aggregate(events, group_by)
                .iter()
                .map(SummaryRow::from)
                .collect()
        };
        SummaryDocument {
            overall: SummaryRow::from(&kpi::overall(events)),
            campaign: rows(GroupBy::Campaign),
            channel: rows(GroupBy::Channel),
            platform: rows(GroupBy::Platform),
            monthly: kpi::monthly(events),
            top_events: top_events(events, TOP_EVENTS),
        }
    }

    pub fn rows(&self, group_by: GroupBy) -> &[SummaryRow] {
        match group_by {
            GroupBy::Campaign => &self.campaign,
            GroupBy::Channel => &self.channel,
            GroupBy::Platform => &self.platform,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Single rows with the best return on ad spend, newest first on ties.
pub fn top_events(events: &[CampaignEvent], limit: usize) -> Vec<EventKpis> {
    let mut scored: Vec<EventKpis> = events
        .iter()
        .map(|event| EventKpis {
            date: event.date,
            campaign: event.campaign.clone(),
            platform: event.platform.clone(),
            kpis: event.kpis(),
        })
        .collect();
    scored.sort_by(|a, b| {
        b.kpis
            .roas
            .total_cmp(&a.kpis.roas)
            .then_with(|| b.date.cmp(&a.date))
    });
    scored.truncate(limit);
    scored
}

pub fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut output = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            output.push(',');
        }
        output.push(ch);
    }
    output
}

pub fn money(value: f64) -> String {
    let cents = (value * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{sign}${}.{:02}", thousands(cents / 100), cents % 100)
}

pub fn overall_block(overall: &SummaryRow) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "- Total Impressions: {}", thousands(overall.total_impressions));
    let _ = writeln!(output, "- Total Clicks: {}", thousands(overall.total_clicks));
    let _ = writeln!(output, "- Total Conversions: {}", thousands(overall.total_conversions));
    let _ = writeln!(output, "- Total Cost: {}", money(overall.total_cost));
    let _ = writeln!(output, "- Total Revenue: {}", money(overall.total_revenue));
    let _ = writeln!(output, "- Overall CTR: {:.2}%", overall.ctr);
    let _ = writeln!(output, "- Overall CVR: {:.2}%", overall.cvr);
    let _ = writeln!(output, "- Overall ROAS: {:.2}", overall.roas);
    output
}

pub fn summary_table(group_by: GroupBy, rows: &[SummaryRow], limit: Option<usize>) -> String {
    let mut output = String::new();

    if rows.is_empty() {
        let _ = writeln!(output, "No campaign events recorded.");
        return output;
    }

    let _ = writeln!(
        output,
        "| {} | TotalImpressions | TotalClicks | TotalConversions | TotalCost | TotalRevenue \
         | CTR | CVR | CPC | CPA | ROAS |",
        group_by.label()
    );
    let _ = writeln!(output, "|:--|--:|--:|--:|--:|--:|--:|--:|--:|--:|--:|");

    for row in rows.iter().take(limit.unwrap_or(rows.len())) {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {:.2} | {:.2} | {:.2} | {:.2} | {:.2} | {:.2} | {:.2} |",
            row.key,
            row.total_impressions,
            row.total_clicks,
            row.total_conversions,
            row.total_cost,
            row.total_revenue,
            row.ctr,
            row.cvr,
            row.cpc,
            row.cpa,
            row.roas
        );
    }

    output
}

pub fn monthly_table(months: &[MonthlyTotals]) -> String {
    let mut output = String::new();

    if months.is_empty() {
        let _ = writeln!(output, "No campaign events recorded.");
        return output;
    }

    let _ = writeln!(output, "| Month | TotalRevenue | TotalCost |");
    let _ = writeln!(output, "|:--|--:|--:|");
    for month in months {
        let _ = writeln!(
            output,
            "| {} | {:.2} | {:.2} |",
            month.label(),
            month.total_revenue,
            month.total_cost
        );
    }

    output
}

/// Console rendering for the `summary` command: overall totals followed by
/// either one grouping or all three.
pub fn render_summary(
    document: &SummaryDocument,
    group_by: Option<GroupBy>,
    limit: Option<usize>,
) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "--- Overall KPIs ---");
    output.push_str(&overall_block(&document.overall));

    let groupings = match group_by {
        Some(group_by) => vec![group_by],
        None => GroupBy::ALL.to_vec(),
    };
    for group_by in groupings {
        let _ = writeln!(output);
        let _ = writeln!(output, "--- {} Performance Summary ---", group_by.label());
        output.push_str(&summary_table(group_by, document.rows(group_by), limit));
    }

    output
}

pub fn build_report(
    source: &str,
    document: &SummaryDocument,
    malformed: &[MalformedRow],
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Marketing Campaign Performance Report");
    let _ = writeln!(output, "Generated from {source}");

    let _ = writeln!(output);
    let _ = writeln!(output, "## Overall KPIs");
    output.push_str(&overall_block(&document.overall));

    for group_by in GroupBy::ALL {
        let _ = writeln!(output);
        let _ = writeln!(output, "## {} Performance", group_by.label());
        output.push_str(&summary_table(group_by, document.rows(group_by), None));
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Monthly Revenue and Cost");
    output.push_str(&monthly_table(&document.monthly));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Events by ROAS");
    if document.top_events.is_empty() {
        let _ = writeln!(output, "No campaign events recorded.");
    } else {
        for event in &document.top_events {
            let _ = writeln!(
                output,
                "- {} {} on {}: ROAS {:.2}, CTR {:.2}%, CVR {:.2}%",
                event.date,
                event.campaign,
                event.platform,
                event.kpis.roas,
                event.kpis.ctr,
                event.kpis.cvr
            );
        }
    }

    if !malformed.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Data Quality");
        let _ = writeln!(
            output,
            "{} malformed cells or rows were treated as zero or skipped.",
            malformed.len()
        );
        for row in malformed.iter().take(20) {
            let _ = writeln!(output, "- line {}: {} = {:?}", row.line, row.field, row.value);
        }
    }

    output
}
