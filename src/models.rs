use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

/// Broad marketing category a campaign runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Channel {
    #[serde(rename = "Search")]
    Search,
    #[serde(rename = "Social Media")]
    SocialMedia,
    #[serde(rename = "Display")]
    Display,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Search, Channel::SocialMedia, Channel::Display];

    /// Substring rule: "Search" wins over "Social", anything else is Display.
    pub fn from_campaign(campaign: &str) -> Self {
        if campaign.contains("Search") {
            Channel::Search
        } else if campaign.contains("Social") {
            Channel::SocialMedia
        } else {
            Channel::Display
        }
    }

    pub fn platforms(self) -> &'static [&'static str] {
        match self {
            Channel::Search => &["Google Ads", "Bing Ads"],
            Channel::SocialMedia => &["Facebook", "Instagram", "TikTok", "LinkedIn"],
            Channel::Display => &["Google Display Network", "Programmatic Display"],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Search => "Search",
            Channel::SocialMedia => "Social Media",
            Channel::Display => "Display",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Channel::ALL
            .into_iter()
            .find(|channel| channel.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("unknown channel: {trimmed}"))
    }
}

/// One synthetic campaign record. Field order is the persisted column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignEvent {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Campaign")]
    pub campaign: String,
    #[serde(rename = "Impressions")]
    pub impressions: u64,
    #[serde(rename = "Clicks")]
    pub clicks: u64,
    #[serde(rename = "Conversions")]
    pub conversions: u64,
    #[serde(rename = "Cost")]
    pub cost: f64,
    #[serde(rename = "Revenue")]
    pub revenue: f64,
    #[serde(rename = "Channel")]
    pub channel: Channel,
    #[serde(rename = "Platform")]
    pub platform: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum GroupBy {
    Campaign,
    Channel,
    Platform,
}

impl GroupBy {
    pub const ALL: [GroupBy; 3] = [GroupBy::Campaign, GroupBy::Channel, GroupBy::Platform];

    pub fn key<'a>(self, event: &'a CampaignEvent) -> &'a str {
        match self {
            GroupBy::Campaign => &event.campaign,
            GroupBy::Channel => event.channel.as_str(),
            GroupBy::Platform => &event.platform,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GroupBy::Campaign => "Campaign",
            GroupBy::Channel => "Channel",
            GroupBy::Platform => "Platform",
        }
    }
}

/// Largest count a single row may carry; anything above is out of range.
pub const MAX_COUNT: u64 = 1_000_000_000_000;

/// Largest amount a single row may carry, in currency units.
pub const MAX_AMOUNT: f64 = 1_000_000_000_000.0;

/// Summed raw counters. Money is held in whole cents so sums are exact.
/// Additions saturate instead of overflowing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub cost_cents: i64,
    pub revenue_cents: i64,
}

impl Totals {
    pub fn merge(&mut self, other: &Totals) {
        self.impressions = self.impressions.saturating_add(other.impressions);
        self.clicks = self.clicks.saturating_add(other.clicks);
        self.conversions = self.conversions.saturating_add(other.conversions);
        self.cost_cents = self.cost_cents.saturating_add(other.cost_cents);
        self.revenue_cents = self.revenue_cents.saturating_add(other.revenue_cents);
    }

    pub fn cost(&self) -> f64 {
        self.cost_cents as f64 / 100.0
    }

    pub fn revenue(&self) -> f64 {
        self.revenue_cents as f64 / 100.0
    }
}

/// Ratio metrics. CTR and CVR are percentages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Kpis {
    pub ctr: f64,
    pub cvr: f64,
    pub cpc: f64,
    pub cpa: f64,
    pub roas: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub key: String,
    pub totals: Totals,
    pub kpis: Kpis,
}

/// Flat record handed to the table and chart writers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub key: String,
    pub total_impressions: u64,
    pub total_clicks: u64,
    pub total_conversions: u64,
    pub total_cost: f64,
    pub total_revenue: f64,
    pub ctr: f64,
    pub cvr: f64,
    pub cpc: f64,
    pub cpa: f64,
    pub roas: f64,
}

impl From<&GroupSummary> for SummaryRow {
    fn from(summary: &GroupSummary) -> Self {
        SummaryRow {
            key: summary.key.clone(),
            total_impressions: summary.totals.impressions,
            total_clicks: summary.totals.clicks,
            total_conversions: summary.totals.conversions,
            total_cost: summary.totals.cost(),
            total_revenue: summary.totals.revenue(),
            ctr: summary.kpis.ctr,
            cvr: summary.kpis.cvr,
            cpc: summary.kpis.cpc,
            cpa: summary.kpis.cpa,
            roas: summary.kpis.roas,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotals {
    pub year: i32,
    pub month: u32,
    pub total_cost: f64,
    pub total_revenue: f64,
}

impl MonthlyTotals {
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}
