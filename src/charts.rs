use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::models::{MonthlyTotals, SummaryRow};

#[derive(Debug, Serialize)]
struct TrendPoint {
    #[serde(rename = "Month")]
    month: String,
    #[serde(rename = "TotalRevenue")]
    total_revenue: f64,
    #[serde(rename = "TotalCost")]
    total_cost: f64,
}

#[derive(Debug, Serialize)]
struct RoasBar<'a> {
    #[serde(rename = "Channel")]
    channel: &'a str,
    #[serde(rename = "ROAS")]
    roas: f64,
}

#[derive(Debug, Serialize)]
struct ConversionBar<'a> {
    #[serde(rename = "Platform")]
    platform: &'a str,
    #[serde(rename = "TotalConversions")]
    total_conversions: u64,
}

/// Platform rows ordered by total conversions, most first, ties by key.
pub fn rank_by_conversions(rows: &[SummaryRow]) -> Vec<&SummaryRow> {
    let mut ranked: Vec<&SummaryRow> = rows.iter().collect();
    ranked.sort_by(|a, b| {
        b.total_conversions
            .cmp(&a.total_conversions)
            .then_with(|| a.key.cmp(&b.key))
    });
    ranked
}

/// Write the three chart series (monthly trend, ROAS by channel,
/// conversions by platform) as CSV files under `dir`.
pub fn write_chart_data(
    dir: &Path,
    monthly: &[MonthlyTotals],
    channels: &[SummaryRow],
    platforms: &[SummaryRow],
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let trend_path = dir.join("monthly_trend.csv");
    let mut writer = csv::Writer::from_path(&trend_path)?;
    for month in monthly {
        writer.serialize(TrendPoint {
            month: month.label(),
            total_revenue: month.total_revenue,
            total_cost: month.total_cost,
        })?;
    }
    writer.flush()?;

    let roas_path = dir.join("roas_by_channel.csv");
    let mut writer = csv::Writer::from_path(&roas_path)?;
    for row in channels {
        writer.serialize(RoasBar {
            channel: &row.key,
            roas: row.roas,
        })?;
    }
    writer.flush()?;

    let conversions_path = dir.join("conversions_by_platform.csv");
    let mut writer = csv::Writer::from_path(&conversions_path)?;
    for row in rank_by_conversions(platforms) {
        writer.serialize(ConversionBar {
            platform: &row.key,
            total_conversions: row.total_conversions,
        })?;
    }
    writer.flush()?;

    info!(dir = %dir.display(), "wrote chart series");
    Ok(vec![trend_path, roas_path, conversions_path])
}
