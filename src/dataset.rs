use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{KpiError, Result};
use crate::models::{CampaignEvent, Channel, MAX_AMOUNT, MAX_COUNT};

pub const UNKNOWN_PLATFORM: &str = "Unknown";
pub const UNKNOWN_CAMPAIGN: &str = "Unknown";

/// A cell that could not be read as-is. Numeric cells are replaced by zero;
/// a bad `Date` or an undecodable record drops the row.
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedRow {
    pub line: u64,
    pub field: &'static str,
    pub value: String,
}

#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub events: Vec<CampaignEvent>,
    pub malformed: Vec<MalformedRow>,
}

pub fn write_events(path: &Path, events: &[CampaignEvent]) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)?;
    for event in events {
        writer.serialize(event)?;
    }
    writer.flush()?;
    info!(rows = events.len(), path = %path.display(), "wrote campaign dataset");
    Ok(events.len())
}

pub fn load_events(path: &Path) -> Result<LoadOutcome> {
    let file = File::open(path).map_err(|source| KpiError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let outcome = read_events(file)?;
    info!(
        rows = outcome.events.len(),
        malformed = outcome.malformed.len(),
        path = %path.display(),
        "loaded campaign dataset"
    );
    Ok(outcome)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CsvRow {
    #[serde(rename = "Date")]
    date: Option<String>,
    #[serde(rename = "Campaign")]
    campaign: Option<String>,
    #[serde(rename = "Impressions")]
    impressions: Option<String>,
    #[serde(rename = "Clicks")]
    clicks: Option<String>,
    #[serde(rename = "Conversions")]
    conversions: Option<String>,
    #[serde(rename = "Cost")]
    cost: Option<String>,
    #[serde(rename = "Revenue")]
    revenue: Option<String>,
    #[serde(rename = "Channel")]
    channel: Option<String>,
    #[serde(rename = "Platform")]
    platform: Option<String>,
}

pub fn read_events<R: Read>(source: R) -> Result<LoadOutcome> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);
    let headers = reader.headers()?.clone();
    let mut outcome = LoadOutcome::default();

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(err) if matches!(err.kind(), csv::ErrorKind::Io(_)) => return Err(err.into()),
            Err(err) => {
                let line = err.position().map(|p| p.line()).unwrap_or(0);
                warn!(line, error = %err, "skipping undecodable record");
                outcome.malformed.push(MalformedRow {
                    line,
                    field: "record",
                    value: err.to_string(),
                });
                continue;
            }
        };

        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let row: CsvRow = match record.deserialize(Some(&headers)) {
            Ok(row) => row,
            Err(err) => {
                warn!(line, error = %err, "skipping undecodable record");
                outcome.malformed.push(MalformedRow {
                    line,
                    field: "record",
                    value: err.to_string(),
                });
                continue;
            }
        };

        let mut cells = CellParser {
            line,
            malformed: &mut outcome.malformed,
        };
        if let Some(event) = cells.event(row) {
            outcome.events.push(event);
        }
    }

    Ok(outcome)
}

struct CellParser<'a> {
    line: u64,
    malformed: &'a mut Vec<MalformedRow>,
}

impl CellParser<'_> {
    fn event(&mut self, row: CsvRow) -> Option<CampaignEvent> {
        let date = self.date(row.date.as_deref())?;
        let campaign = match row.campaign {
            Some(campaign) => campaign,
            None => {
                self.flag("Campaign", "");
                UNKNOWN_CAMPAIGN.to_string()
            }
        };

        let channel = row
            .channel
            .as_deref()
            .and_then(|raw| raw.parse::<Channel>().ok())
            .unwrap_or_else(|| Channel::from_campaign(&campaign));
        let platform = row
            .platform
            .unwrap_or_else(|| UNKNOWN_PLATFORM.to_string());

        Some(CampaignEvent {
            impressions: self.count("Impressions", row.impressions.as_deref()),
            clicks: self.count("Clicks", row.clicks.as_deref()),
            conversions: self.count("Conversions", row.conversions.as_deref()),
            cost: self.amount("Cost", row.cost.as_deref()),
            revenue: self.amount("Revenue", row.revenue.as_deref()),
            date,
            campaign,
            channel,
            platform,
        })
    }

    fn date(&mut self, raw: Option<&str>) -> Option<NaiveDate> {
        let value = raw.unwrap_or_default();
        let parsed = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok().or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        });
        if parsed.is_none() {
            self.flag("Date", value);
            warn!(line = self.line, value, "skipping row with unreadable date");
        }
        parsed
    }

    /// Counts may be written as floats (`450.0`); they are floored.
    fn count(&mut self, field: &'static str, raw: Option<&str>) -> u64 {
        let value = raw.unwrap_or_default();
        if let Ok(count) = value.parse::<u64>() {
            if count <= MAX_COUNT {
                return count;
            }
        }
        match value.parse::<f64>() {
            Ok(count) if count.is_finite() && (0.0..=MAX_COUNT as f64).contains(&count) => {
                count.floor() as u64
            }
            _ => {
                self.flag(field, value);
                0
            }
        }
    }

    fn amount(&mut self, field: &'static str, raw: Option<&str>) -> f64 {
        let value = raw.unwrap_or_default();
        match value.parse::<f64>() {
            Ok(amount) if amount.is_finite() && (0.0..=MAX_AMOUNT).contains(&amount) => amount,
            _ => {
                self.flag(field, value);
                0.0
            }
        }
    }

    fn flag(&mut self, field: &'static str, value: &str) {
        warn!(line = self.line, field, value, "malformed cell treated as zero");
        self.malformed.push(MalformedRow {
            line: self.line,
            field,
            value: value.to_string(),
        });
    }
}
