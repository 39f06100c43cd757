use std::collections::HashSet;
use std::time::Duration;

use polars::prelude::*;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::error::{PipelineError, Result};

pub const DEFAULT_REGISTRY_URL: &str =
    "https://servicodados.ibge.gov.br/api/v1/localidades/mesorregioes";

pub const STATE_ABBREVIATION: &str = "state_abbreviation";
pub const STATE_NAME: &str = "state_name";
pub const REGION_NAME: &str = "region_name";

#[derive(Debug, Error)]
pub enum RegionLookupError {
    #[error("registry request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("registry payload could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("registry returned no divisions")]
    Empty,
    #[error("{0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionEntry {
    pub state_abbreviation: String,
    pub state_name: String,
    pub region_name: String,
}

impl RegionEntry {
    pub fn new(
        state_abbreviation: impl Into<String>,
        state_name: impl Into<String>,
        region_name: impl Into<String>,
    ) -> Self {
        Self {
            state_abbreviation: state_abbreviation.into(),
            state_name: state_name.into(),
            region_name: region_name.into(),
        }
    }
}

/// Source of the state -> region mapping.
pub trait RegionRegistry: Send + Sync {
    fn name(&self) -> &'static str;
    fn fetch(&self) -> std::result::Result<Vec<RegionEntry>, RegionLookupError>;
}

#[derive(Debug, Deserialize)]
struct Division {
    #[serde(rename = "UF")]
    state: FederativeUnit,
}

#[derive(Debug, Deserialize)]
struct FederativeUnit {
    sigla: String,
    nome: String,
    regiao: Region,
}

#[derive(Debug, Deserialize)]
struct Region {
    nome: String,
}

/// Single GET against the public registry with a bounded timeout.
#[derive(Debug, Clone)]
pub struct HttpRegionRegistry {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpRegionRegistry {
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
    ) -> std::result::Result<Self, RegionLookupError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl RegionRegistry for HttpRegionRegistry {
    fn name(&self) -> &'static str {
        "http"
    }

    fn fetch(&self) -> std::result::Result<Vec<RegionEntry>, RegionLookupError> {
        let body = self
            .client
            .get(&self.url)
            .send()?
            .error_for_status()?
            .text()?;
        parse_divisions(&body)
    }
}

/// Fixed entries, for offline runs and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticRegionRegistry {
    entries: Vec<RegionEntry>,
}

impl StaticRegionRegistry {
    pub fn new(entries: Vec<RegionEntry>) -> Self {
        Self { entries }
    }
}

impl RegionRegistry for StaticRegionRegistry {
    fn name(&self) -> &'static str {
        "static"
    }

    fn fetch(&self) -> std::result::Result<Vec<RegionEntry>, RegionLookupError> {
        Ok(dedup_by_abbreviation(self.entries.clone()))
    }
}

/// Parses the registry's division array into one entry per state abbreviation.
pub fn parse_divisions(payload: &str) -> std::result::Result<Vec<RegionEntry>, RegionLookupError> {
    let divisions: Vec<Division> = serde_json::from_str(payload)?;
    if divisions.is_empty() {
        return Err(RegionLookupError::Empty);
    }

    let entries = divisions
        .into_iter()
        .map(|division| RegionEntry {
            state_abbreviation: division.state.sigla,
            state_name: division.state.nome,
            region_name: division.state.regiao.nome,
        })
        .collect();
    Ok(dedup_by_abbreviation(entries))
}

fn dedup_by_abbreviation(entries: Vec<RegionEntry>) -> Vec<RegionEntry> {
    let mut seen: HashSet<String> = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| seen.insert(entry.state_abbreviation.clone()))
        .collect()
}

pub fn regions_to_frame(entries: &[RegionEntry]) -> Result<DataFrame> {
    let abbreviations: Vec<&str> = entries.iter().map(|e| e.state_abbreviation.as_str()).collect();
    let states: Vec<&str> = entries.iter().map(|e| e.state_name.as_str()).collect();
    let regions: Vec<&str> = entries.iter().map(|e| e.region_name.as_str()).collect();

    let df = DataFrame::new(vec![
        Series::new(STATE_ABBREVIATION.into(), abbreviations).into(),
        Series::new(STATE_NAME.into(), states).into(),
        Series::new(REGION_NAME.into(), regions).into(),
    ])?;
    Ok(df)
}

/// Makes the one lookup attempt for a pipeline run. Failures degrade to `None` unless
/// `strict` is set, in which case they abort the run.
pub fn resolve_regions(registry: &dyn RegionRegistry, strict: bool) -> Result<Option<DataFrame>> {
    match registry.fetch() {
        Ok(entries) => {
            info!(
                registry = registry.name(),
                states = entries.len(),
                "resolved region registry"
            );
            Ok(Some(regions_to_frame(&entries)?))
        }
        Err(err) if strict => Err(PipelineError::RegionLookupFailed(err)),
        Err(err) => {
            warn!(
                registry = registry.name(),
                error = %err,
                "region lookup failed; continuing without region data"
            );
            Ok(None)
        }
    }
}
