use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{PipelineError, Result};
use crate::geo::DEFAULT_SAMPLE_LIMIT;
use crate::regions::DEFAULT_REGISTRY_URL;

/// The four dashboard views the shell can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualizationMode {
    PaymentMethodDistribution,
    PeakShoppingTime,
    AverageDeliveryTime,
    GeospatialAnalysis,
}

impl VisualizationMode {
    pub fn title(&self) -> &'static str {
        match self {
            VisualizationMode::PaymentMethodDistribution => "Payment Method Distribution",
            VisualizationMode::PeakShoppingTime => "Peak Shopping Time",
            VisualizationMode::AverageDeliveryTime => "Average Delivery Time",
            VisualizationMode::GeospatialAnalysis => "Geospatial Analysis",
        }
    }
}

impl fmt::Display for VisualizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub region_registry_url: String,
    pub region_timeout_secs: u64,
    /// Abort the run when the region registry cannot be reached.
    pub strict_region_lookup: bool,
    pub sample_year: i32,
    pub sample_limit: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("datasets"),
            region_registry_url: DEFAULT_REGISTRY_URL.to_string(),
            region_timeout_secs: 10,
            strict_region_lookup: false,
            sample_year: 2018,
            sample_limit: DEFAULT_SAMPLE_LIMIT,
            start_date: NaiveDate::from_ymd_opt(2017, 6, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2018, 6, 30).unwrap_or_default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PipelineConfig =
            toml::from_str(content).map_err(|err| PipelineError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, overlaid with `path` when given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|err| {
                    PipelineError::Config(format!("{}: {err}", path.display()))
                })?;
                Self::from_toml_str(&content)
            }
            None => Ok(Self::default()),
        }
    }

    /// Applies `OLIST_*` overrides. `lookup` is usually `std::env::var(..).ok()`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("OLIST_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("OLIST_REGION_URL") {
            self.region_registry_url = url;
        }
        if let Some(secs) = lookup("OLIST_REGION_TIMEOUT_SECS") {
            self.region_timeout_secs = secs.trim().parse().map_err(|_| {
                PipelineError::Config(format!("OLIST_REGION_TIMEOUT_SECS is not a number: {secs}"))
            })?;
        }
        if let Some(flag) = lookup("OLIST_STRICT_REGIONS") {
            self.strict_region_lookup = parse_flag(&flag).ok_or_else(|| {
                PipelineError::Config(format!("OLIST_STRICT_REGIONS is not a boolean: {flag}"))
            })?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.region_timeout_secs == 0 {
            return Err(PipelineError::Config(
                "region_timeout_secs must be positive".to_string(),
            ));
        }
        if self.sample_limit == 0 {
            return Err(PipelineError::Config(
                "sample_limit must be positive".to_string(),
            ));
        }
        if self.start_date > self.end_date {
            return Err(PipelineError::Config(format!(
                "start_date {} is after end_date {}",
                self.start_date, self.end_date
            )));
        }
        Ok(())
    }

    pub fn region_timeout(&self) -> Duration {
        Duration::from_secs(self.region_timeout_secs)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
