use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{KpiError, Result};

pub const DEFAULT_CAMPAIGNS: [&str; 6] = [
    "Summer Sale 2024 - Search",
    "Summer Sale 2024 - Social",
    "New Product Launch - Search",
    "New Product Launch - Display",
    "Brand Awareness - Social",
    "Retargeting - Display",
];

/// Half-open integer range `[low, high)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub low: u64,
    pub high: u64,
}

/// Half-open uniform range `[low, high)` for monetary values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmountRange {
    pub low: f64,
    pub high: f64,
}

/// Sampling bounds and campaign list for the synthetic generator.
///
/// Any field omitted from a JSON config file keeps its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub campaigns: Vec<String>,
    pub impressions: CountRange,
    pub clicks: CountRange,
    pub conversions: CountRange,
    pub cost: AmountRange,
    pub revenue: AmountRange,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            campaigns: DEFAULT_CAMPAIGNS.iter().map(|c| c.to_string()).collect(),
            impressions: CountRange { low: 1_000, high: 100_000 },
            clicks: CountRange { low: 50, high: 5_000 },
            conversions: CountRange { low: 1, high: 500 },
            cost: AmountRange { low: 10.0, high: 1_000.0 },
            revenue: AmountRange { low: 50.0, high: 5_000.0 },
        }
    }
}

impl GeneratorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| KpiError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: GeneratorConfig = serde_json::from_str(&content)
            .map_err(|err| KpiError::Config(format!("{}: {err}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.campaigns.is_empty() {
            return Err(KpiError::InvalidArgument(
                "campaign list must not be empty".to_string(),
            ));
        }
        if let Some(blank) = self.campaigns.iter().find(|c| c.trim().is_empty()) {
            return Err(KpiError::InvalidArgument(format!(
                "campaign names must not be blank, got {blank:?}"
            )));
        }

        for (name, range) in [
            ("impressions", self.impressions),
            ("clicks", self.clicks),
            ("conversions", self.conversions),
        ] {
            if range.low >= range.high {
                return Err(KpiError::InvalidArgument(format!(
                    "{name} range [{}, {}) is empty",
                    range.low, range.high
                )));
            }
        }

        for (name, range) in [("cost", self.cost), ("revenue", self.revenue)] {
            if !range.low.is_finite() || !range.high.is_finite() || range.low < 0.0 {
                return Err(KpiError::InvalidArgument(format!(
                    "{name} range must be finite and non-negative"
                )));
            }
            if range.low >= range.high {
                return Err(KpiError::InvalidArgument(format!(
                    "{name} range [{}, {}) is empty",
                    range.low, range.high
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = GeneratorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.campaigns.len(), 6);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"campaigns": ["Spring - Search"], "cost": {{"low": 1.0, "high": 2.0}}}}"#
        )
        .unwrap();

        let config = GeneratorConfig::load(file.path()).unwrap();
        assert_eq!(config.campaigns, vec!["Spring - Search".to_string()]);
        assert_eq!(config.cost, AmountRange { low: 1.0, high: 2.0 });
        assert_eq!(config.impressions, GeneratorConfig::default().impressions);
    }

    #[test]
    fn rejects_empty_ranges_and_campaigns() {
        let mut config = GeneratorConfig::default();
        config.clicks = CountRange { low: 10, high: 10 };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("clicks"));

        let config = GeneratorConfig {
            campaigns: Vec::new(),
            ..GeneratorConfig::default()
        };
        assert!(matches!(config.validate(), Err(KpiError::InvalidArgument(_))));
    }

    #[test]
    fn unparseable_file_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "campaigns = [").unwrap();
        let err = GeneratorConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, KpiError::Config(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = GeneratorConfig::load(Path::new("/nonexistent/generator.json")).unwrap_err();
        assert!(matches!(err, KpiError::FileRead { .. }));
    }
}
