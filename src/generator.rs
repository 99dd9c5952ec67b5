use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::config::GeneratorConfig;
use crate::error::{KpiError, Result};
use crate::models::{CampaignEvent, Channel};

/// Inclusive calendar window that event dates are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}

pub fn generate(rows: usize, range: DateRange, seed: Option<u64>) -> Result<Vec<CampaignEvent>> {
    generate_with(&GeneratorConfig::default(), rows, range, seed)
}

/// Produce `rows` synthetic events. The same seed and config always yield
/// the same sequence; without a seed the stream is drawn from OS entropy.
pub fn generate_with(
    config: &GeneratorConfig,
    rows: usize,
    range: DateRange,
    seed: Option<u64>,
) -> Result<Vec<CampaignEvent>> {
    if rows == 0 {
        return Err(KpiError::InvalidArgument(
            "row count must be positive, got 0".to_string(),
        ));
    }
    if range.start > range.end {
        return Err(KpiError::InvalidArgument(format!(
            "date range start {} is after end {}",
            range.start, range.end
        )));
    }
    config.validate()?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    info!(
        rows,
        start = %range.start,
        end = %range.end,
        seed = ?seed,
        "generating synthetic campaign events"
    );

    let span_days = (range.end - range.start).num_days();
    let events = (0..rows)
        .map(|_| sample_event(config, &mut rng, range.start, span_days))
        .collect();
    Ok(events)
}

fn sample_event<R: Rng>(
    config: &GeneratorConfig,
    rng: &mut R,
    start: NaiveDate,
    span_days: i64,
) -> CampaignEvent {
    let date = start + Duration::days(rng.gen_range(0..=span_days));
    let campaign = config.campaigns[rng.gen_range(0..config.campaigns.len())].clone();
    let impressions = rng.gen_range(config.impressions.low..config.impressions.high);
    let clicks = rng.gen_range(config.clicks.low..config.clicks.high);
    let conversions = rng.gen_range(config.conversions.low..config.conversions.high);
    let cost = round_cents(rng.gen_range(config.cost.low..config.cost.high));
    let revenue = round_cents(rng.gen_range(config.revenue.low..config.revenue.high));

    let channel = Channel::from_campaign(&campaign);
    let platforms = channel.platforms();
    let platform = platforms[rng.gen_range(0..platforms.len())].to_string();

    let clicks = clamp_clicks(impressions, clicks);
    let conversions = clamp_conversions(clicks, conversions);

    CampaignEvent {
        date,
        campaign,
        impressions,
        clicks,
        conversions,
        cost,
        revenue,
        channel,
        platform,
    }
}

/// Clicks never exceed 10% of impressions (floored).
pub fn clamp_clicks(impressions: u64, clicks: u64) -> u64 {
    clicks.min(impressions / 10)
}

/// Conversions never exceed 20% of the already-clamped clicks (floored).
pub fn clamp_conversions(clicks: u64, conversions: u64) -> u64 {
    conversions.min(clicks / 5)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
