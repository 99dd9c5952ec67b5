use std::collections::{BTreeMap, HashMap};

use chrono::Datelike;
use tracing::debug;

use crate::models::{
    CampaignEvent, GroupBy, GroupSummary, Kpis, MonthlyTotals, Totals, MAX_AMOUNT, MAX_COUNT,
};

pub const OVERALL_KEY: &str = "ALL";

/// Guarded division: a zero or non-finite result collapses to 0.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let value = numerator / denominator;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

pub fn derive_kpis(totals: &Totals) -> Kpis {
    let impressions = totals.impressions as f64;
    let clicks = totals.clicks as f64;
    let conversions = totals.conversions as f64;
    let cost = totals.cost();
    let revenue = totals.revenue();

    Kpis {
        ctr: ratio(clicks, impressions) * 100.0,
        cvr: ratio(conversions, clicks) * 100.0,
        cpc: ratio(cost, clicks),
        cpa: ratio(cost, conversions),
        roas: ratio(revenue, cost),
    }
}

/// Raw counters contributed by one event. Negative, non-finite or oversize
/// values contribute nothing.
pub fn event_totals(event: &CampaignEvent) -> Totals {
    Totals {
        impressions: sanitize_count(event, "impressions", event.impressions),
        clicks: sanitize_count(event, "clicks", event.clicks),
        conversions: sanitize_count(event, "conversions", event.conversions),
        cost_cents: to_cents(sanitize_amount(event, "cost", event.cost)),
        revenue_cents: to_cents(sanitize_amount(event, "revenue", event.revenue)),
    }
}

fn sanitize_count(event: &CampaignEvent, field: &str, value: u64) -> u64 {
    if value <= MAX_COUNT {
        value
    } else {
        debug!(
            campaign = %event.campaign,
            date = %event.date,
            field,
            value,
            "treating oversize count as zero"
        );
        0
    }
}

fn sanitize_amount(event: &CampaignEvent, field: &str, value: f64) -> f64 {
    if value.is_finite() && (0.0..=MAX_AMOUNT).contains(&value) {
        value
    } else {
        debug!(
            campaign = %event.campaign,
            date = %event.date,
            field,
            value,
            "treating invalid amount as zero"
        );
        0.0
    }
}

fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

impl CampaignEvent {
    pub fn kpis(&self) -> Kpis {
        derive_kpis(&event_totals(self))
    }
}

impl GroupSummary {
    pub fn from_totals(key: impl Into<String>, totals: Totals) -> Self {
        GroupSummary {
            key: key.into(),
            kpis: derive_kpis(&totals),
            totals,
        }
    }
}

/// Group-then-sum-then-divide rollup, sorted by ROAS descending with ties
/// broken by ascending key.
pub fn aggregate(events: &[CampaignEvent], group_by: GroupBy) -> Vec<GroupSummary> {
    let mut groups: HashMap<&str, Totals> = HashMap::new();

    for event in events {
        groups
            .entry(group_by.key(event))
            .or_default()
            .merge(&event_totals(event));
    }

    let mut summaries: Vec<GroupSummary> = groups
        .into_iter()
        .map(|(key, totals)| GroupSummary::from_totals(key, totals))
        .collect();

    summaries.sort_by(|a, b| {
        b.kpis
            .roas
            .total_cmp(&a.kpis.roas)
            .then_with(|| a.key.cmp(&b.key))
    });
    summaries
}

pub fn overall(events: &[CampaignEvent]) -> GroupSummary {
    let totals = events.iter().fold(Totals::default(), |mut acc, event| {
        acc.merge(&event_totals(event));
        acc
    });
    GroupSummary::from_totals(OVERALL_KEY, totals)
}

/// Cost and revenue per calendar month, oldest first.
pub fn monthly(events: &[CampaignEvent]) -> Vec<MonthlyTotals> {
    let mut months: BTreeMap<(i32, u32), Totals> = BTreeMap::new();

    for event in events {
        months
            .entry((event.date.year(), event.date.month()))
            .or_default()
            .merge(&event_totals(event));
    }

    months
        .into_iter()
        .map(|((year, month), totals)| MonthlyTotals {
            year,
            month,
            total_cost: totals.cost(),
            total_revenue: totals.revenue(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{generate, DateRange};
    use crate::models::Channel;
    use chrono::NaiveDate;

    fn event(
        campaign: &str,
        impressions: u64,
        clicks: u64,
        conversions: u64,
        cost: f64,
        revenue: f64,
    ) -> CampaignEvent {
        let channel = Channel::from_campaign(campaign);
        CampaignEvent {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            campaign: campaign.to_string(),
            impressions,
            clicks,
            conversions,
            cost,
            revenue,
            channel,
            platform: channel.platforms()[0].to_string(),
        }
    }

    fn close(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() < 0.005
    }

    #[test]
    fn group_metrics_use_summed_values() {
        let events = vec![
            event("A", 1_000, 100, 10, 100.0, 400.0),
            event("A", 2_000, 100, 5, 50.0, 100.0),
        ];

        let summaries = aggregate(&events, GroupBy::Campaign);
        assert_eq!(summaries.len(), 1);
        let group = &summaries[0];
        assert_eq!(group.key, "A");
        assert_eq!(group.totals.impressions, 3_000);
        assert_eq!(group.totals.clicks, 200);
        assert_eq!(group.totals.conversions, 15);
        assert_eq!(group.totals.cost(), 150.0);
        assert_eq!(group.totals.revenue(), 500.0);
        assert!(close(group.kpis.ctr, 6.67));
        assert!(close(group.kpis.cvr, 7.5));
        assert!(close(group.kpis.roas, 3.33));
        assert!(close(group.kpis.cpc, 0.75));
        assert!(close(group.kpis.cpa, 10.0));

        let mean_row_ctr = events.iter().map(|e| e.kpis().ctr).sum::<f64>() / 2.0;
        assert!(close(mean_row_ctr, 7.5));
        assert!(!close(group.kpis.ctr, mean_row_ctr));
    }

    #[test]
    fn zero_denominators_yield_zero() {
        let idle = event("Idle - Display", 0, 0, 0, 0.0, 0.0);
        assert_eq!(idle.kpis(), Kpis::default());

        let summaries = aggregate(&[idle], GroupBy::Campaign);
        assert_eq!(summaries[0].kpis.ctr, 0.0);
        assert_eq!(summaries[0].kpis.cvr, 0.0);
        assert_eq!(summaries[0].kpis.cpc, 0.0);
        assert_eq!(summaries[0].kpis.cpa, 0.0);
        assert_eq!(summaries[0].kpis.roas, 0.0);
    }

    #[test]
    fn ratio_guards_division() {
        assert_eq!(ratio(5.0, 0.0), 0.0);
        assert_eq!(ratio(0.0, 0.0), 0.0);
        assert_eq!(ratio(f64::NAN, 2.0), 0.0);
        assert_eq!(ratio(3.0, 2.0), 1.5);
    }

    #[test]
    fn partitions_preserve_overall_totals() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        );
        let events = generate(1_000, range, Some(42)).unwrap();
        let all = overall(&events);
        assert_eq!(all.key, OVERALL_KEY);

        for group_by in GroupBy::ALL {
            let merged = aggregate(&events, group_by)
                .iter()
                .fold(Totals::default(), |mut acc, summary| {
                    acc.merge(&summary.totals);
                    acc
                });
            assert_eq!(merged, all.totals, "partition by {group_by:?}");
        }
    }

    #[test]
    fn sorted_by_roas_then_key() {
        let events = vec![
            event("B", 100, 10, 1, 10.0, 20.0),
            event("A", 100, 10, 1, 10.0, 20.0),
            event("C", 100, 10, 1, 10.0, 50.0),
            event("D", 100, 10, 1, 10.0, 5.0),
        ];

        let keys: Vec<String> = aggregate(&events, GroupBy::Campaign)
            .into_iter()
            .map(|s| s.key)
            .collect();
        assert_eq!(keys, vec!["C", "A", "B", "D"]);
    }

    #[test]
    fn groups_by_channel_and_platform() {
        let events = vec![
            event("Sale - Search", 1_000, 50, 5, 10.0, 30.0),
            event("Launch - Search", 1_000, 50, 5, 10.0, 30.0),
            event("Brand - Social", 1_000, 50, 5, 10.0, 10.0),
        ];

        let channels = aggregate(&events, GroupBy::Channel);
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].key, "Search");
        assert_eq!(channels[0].totals.impressions, 2_000);
        assert_eq!(channels[1].key, "Social Media");

        let platforms = aggregate(&events, GroupBy::Platform);
        assert_eq!(platforms[0].key, "Google Ads");
        assert_eq!(platforms[1].key, "Facebook");
    }

    #[test]
    fn invalid_amounts_contribute_zero() {
        let events = vec![
            event("A", 1_000, 100, 10, f64::NAN, -40.0),
            event("A", 1_000, 100, 10, 50.0, f64::INFINITY),
        ];

        let summary = overall(&events);
        assert_eq!(summary.totals.cost(), 50.0);
        assert_eq!(summary.totals.revenue(), 0.0);
        assert_eq!(summary.totals.impressions, 2_000);
        assert_eq!(summary.kpis.roas, 0.0);
    }

    #[test]
    fn oversize_values_do_not_abort_rollups() {
        let events = vec![
            event("A", u64::MAX, 100, 10, 1e300, 400.0),
            event("A", 2_000, u64::MAX, 5, 50.0, f64::MAX),
            event("B", 1_000, 100, 10, 100.0, 200.0),
        ];

        let summary = overall(&events);
        assert_eq!(summary.totals.impressions, 3_000);
        assert_eq!(summary.totals.clicks, 200);
        assert_eq!(summary.totals.cost(), 150.0);
        assert_eq!(summary.totals.revenue(), 600.0);

        let merged = aggregate(&events, GroupBy::Campaign)
            .iter()
            .fold(Totals::default(), |mut acc, group| {
                acc.merge(&group.totals);
                acc
            });
        assert_eq!(merged, summary.totals);
        assert_eq!(monthly(&events)[0].total_cost, 150.0);
    }

    #[test]
    fn empty_input_is_not_an_error() {
        assert!(aggregate(&[], GroupBy::Platform).is_empty());
        assert!(monthly(&[]).is_empty());

        let summary = overall(&[]);
        assert_eq!(summary.key, "ALL");
        assert_eq!(summary.totals, Totals::default());
        assert_eq!(summary.kpis, Kpis::default());
    }

    #[test]
    fn monthly_totals_are_chronological() {
        let mut december = event("A", 10, 1, 0, 5.0, 7.5);
        december.date = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let mut late_january = event("B", 10, 1, 0, 2.25, 1.0);
        late_january.date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let early_january = event("A", 10, 1, 0, 1.0, 1.0);

        let months = monthly(&[late_january, december, early_january]);
        let labels: Vec<String> = months.iter().map(|m| m.label()).collect();
        assert_eq!(labels, vec!["2023-12", "2024-01"]);
        assert_eq!(months[0].total_cost, 5.0);
        assert_eq!(months[1].total_cost, 3.25);
        assert_eq!(months[1].total_revenue, 2.0);
    }
}
