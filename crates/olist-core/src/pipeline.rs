use std::sync::Arc;

use olist_tables::{clean_tables, RawTables, TableDirectory};
use polars::prelude::DataFrame;
use tracing::info;

use crate::cache::PipelineCache;
use crate::config::PipelineConfig;
use crate::derive::{add_derived_fields, DeriveReport};
use crate::error::{PipelineError, Result};
use crate::geo::{attach_geo, filter_and_dedup, sample_locations, BoundingBox};
use crate::join::join_tables;
use crate::regions::{resolve_regions, HttpRegionRegistry, RegionRegistry};

/// Everything the rendering layer reads. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Unified records with derived, region and geo columns.
    pub records: DataFrame,
    pub payments: DataFrame,
    /// Cleaned raw geolocation samples.
    pub geolocation: DataFrame,
    /// One in-box point per zip prefix.
    pub geo_points: DataFrame,
    /// `None` when the region lookup degraded.
    pub regions: Option<DataFrame>,
    pub derive_report: DeriveReport,
}

impl Dataset {
    pub fn has_regions(&self) -> bool {
        self.regions.is_some()
    }

    pub fn sample_locations(&self, year: i32, limit: usize) -> Result<Vec<(f64, f64)>> {
        sample_locations(&self.records, year, limit)
    }
}

/// Clean -> join -> derive -> regions + geo, over tables that are already loaded.
pub fn build_dataset(
    tables: RawTables,
    registry: &dyn RegionRegistry,
    strict_regions: bool,
) -> Result<Dataset> {
    let cleaned = clean_tables(tables)?;
    info!(tables = ?cleaned.row_counts(), "cleaned source tables");

    let unified = join_tables(&cleaned)?;
    info!(rows = unified.height(), columns = unified.width(), "unified records");

    let (derived, derive_report) = add_derived_fields(&unified)?;

    let regions = resolve_regions(registry, strict_regions)?;
    let geo_points = filter_and_dedup(&cleaned.geolocation, &BoundingBox::BRAZIL)?;
    info!(
        samples = cleaned.geolocation.height(),
        prefixes = geo_points.height(),
        "resolved geo points"
    );

    let records = attach_geo(&derived, regions.as_ref(), &geo_points)?;

    let RawTables {
        payments,
        geolocation,
        ..
    } = cleaned;

    Ok(Dataset {
        records,
        payments,
        geolocation,
        geo_points,
        regions,
        derive_report,
    })
}

/// Entry point for the shell: owns the configuration, the region registry and the cache.
pub struct DatasetService {
    config: PipelineConfig,
    registry: Box<dyn RegionRegistry>,
    cache: PipelineCache,
}

impl DatasetService {
    pub fn new(config: PipelineConfig, registry: Box<dyn RegionRegistry>) -> Self {
        Self {
            config,
            registry,
            cache: PipelineCache::new(),
        }
    }

    pub fn with_http_registry(config: PipelineConfig) -> Result<Self> {
        let registry =
            HttpRegionRegistry::new(config.region_registry_url.clone(), config.region_timeout())
                .map_err(PipelineError::RegionLookupFailed)?;
        Ok(Self::new(config, Box::new(registry)))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn cache(&self) -> &PipelineCache {
        &self.cache
    }

    /// Runs the pipeline on first use and serves the cached result afterwards.
    pub fn dataset(&self) -> Result<Arc<Dataset>> {
        self.cache.get_or_load(|| {
            info!(data_dir = %self.config.data_dir.display(), "building dataset");
            let tables = TableDirectory::new(&self.config.data_dir).load_all()?;
            build_dataset(
                tables,
                self.registry.as_ref(),
                self.config.strict_region_lookup,
            )
        })
    }

    /// Map sample for `year`, capped at the configured limit.
    pub fn sample_locations(&self, year: i32) -> Result<Vec<(f64, f64)>> {
        self.dataset()?
            .sample_locations(year, self.config.sample_limit)
    }

    pub fn reset(&self) {
        self.cache.reset();
    }
}
