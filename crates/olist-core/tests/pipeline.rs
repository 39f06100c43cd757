use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use olist_core::config::PipelineConfig;
use olist_core::error::PipelineError;
use olist_core::geo::{LATITUDE, LONGITUDE};
use olist_core::pipeline::{build_dataset, DatasetService};
use olist_core::regions::{
    RegionEntry, RegionLookupError, RegionRegistry, StaticRegionRegistry, REGION_NAME,
};
use olist_tables::{TableDirectory, TableError};
use polars::prelude::*;

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../olist-tables/tests/data")
}

fn fixture_config() -> PipelineConfig {
    PipelineConfig {
        data_dir: fixture_dir(),
        ..PipelineConfig::default()
    }
}

fn fixture_registry() -> StaticRegionRegistry {
    StaticRegionRegistry::new(vec![
        RegionEntry::new("SP", "São Paulo", "Sudeste"),
        RegionEntry::new("RJ", "Rio de Janeiro", "Sudeste"),
        RegionEntry::new("AC", "Acre", "Norte"),
    ])
}

struct OfflineRegistry;

impl RegionRegistry for OfflineRegistry {
    fn name(&self) -> &'static str {
        "offline"
    }

    fn fetch(&self) -> Result<Vec<RegionEntry>, RegionLookupError> {
        Err(RegionLookupError::Unavailable("registry offline".to_string()))
    }
}

fn rows_for_order(records: &DataFrame, order_id: &str) -> Result<DataFrame> {
    let rows = records
        .clone()
        .lazy()
        .filter(col("order_id").eq(lit(order_id)))
        .collect()?;
    Ok(rows)
}

#[test]
fn fixture_tables_build_a_complete_dataset() -> Result<()> {
    let service = DatasetService::new(fixture_config(), Box::new(fixture_registry()));
    let dataset = service.dataset()?;

    assert_eq!(dataset.records.height(), 10);
    assert!(dataset.has_regions());
    assert_eq!(dataset.geo_points.height(), 4);
    assert_eq!(dataset.payments.height(), 6);
    assert_eq!(dataset.derive_report.rows, 10);

    for column in [
        "day_of_week_name",
        "hour",
        "year",
        "day_month_year",
        "delivery_time",
        REGION_NAME,
        LATITUDE,
        LONGITUDE,
        "product_category_name_english",
    ] {
        assert!(dataset.records.column(column).is_ok(), "missing {column}");
    }

    let first_order = rows_for_order(&dataset.records, "o1")?;
    assert_eq!(first_order.height(), 2);
    assert_eq!(first_order.column("delivery_time")?.i64()?.get(0), Some(7));
    assert_eq!(
        first_order.column("day_of_week_name")?.str()?.get(0),
        Some("Monday")
    );
    assert_eq!(first_order.column(REGION_NAME)?.str()?.get(0), Some("Sudeste"));
    assert_eq!(first_order.column(LATITUDE)?.f64()?.get(0), Some(-23.546081));
    assert_eq!(first_order.column(LONGITUDE)?.f64()?.get(0), Some(-46.644820));
    Ok(())
}

#[test]
fn repeated_requests_share_one_dataset() -> Result<()> {
    let service = DatasetService::new(fixture_config(), Box::new(fixture_registry()));
    let first = service.dataset()?;
    let second = service.dataset()?;

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(service.cache().load_count(), 1);

    service.reset();
    let third = service.dataset()?;
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(service.cache().load_count(), 2);
    Ok(())
}

#[test]
fn sample_follows_record_order() -> Result<()> {
    let service = DatasetService::new(fixture_config(), Box::new(fixture_registry()));

    let recent = service.sample_locations(2018)?;
    assert_eq!(recent.len(), 4);
    assert_eq!(recent[0], (-23.546081, -46.644820));
    assert!((recent[2].0 - -9.974).abs() < 1e-9);

    let older = service.sample_locations(2017)?;
    assert_eq!(older.len(), 2);

    let capped = service.dataset()?.sample_locations(2018, 3)?;
    assert_eq!(capped, recent[..3].to_vec());
    Ok(())
}

#[test]
fn region_failure_still_produces_records() -> Result<()> {
    let service = DatasetService::new(fixture_config(), Box::new(OfflineRegistry));
    let dataset = service.dataset()?;

    assert!(!dataset.has_regions());
    assert_eq!(dataset.records.height(), 10);
    assert_eq!(dataset.records.column(REGION_NAME)?.null_count(), 10);
    assert_eq!(dataset.records.column("state_name")?.null_count(), 10);

    let first_order = rows_for_order(&dataset.records, "o1")?;
    assert_eq!(first_order.column("delivery_time")?.i64()?.get(0), Some(7));
    assert_eq!(first_order.column(LATITUDE)?.f64()?.get(0), Some(-23.546081));
    Ok(())
}

#[test]
fn strict_region_lookup_aborts_and_caches_nothing() {
    let config = PipelineConfig {
        strict_region_lookup: true,
        ..fixture_config()
    };
    let service = DatasetService::new(config, Box::new(OfflineRegistry));

    let err = service.dataset().expect_err("strict lookup fails");
    assert!(matches!(err, PipelineError::RegionLookupFailed(_)));
    assert!(!service.cache().is_populated());
}

#[test]
fn missing_data_directory_is_source_unavailable() {
    let config = PipelineConfig {
        data_dir: fixture_dir().join("does-not-exist"),
        ..PipelineConfig::default()
    };
    let service = DatasetService::new(config, Box::new(fixture_registry()));

    let err = service.dataset().expect_err("no tables to load");
    assert!(matches!(
        err,
        PipelineError::Table(TableError::SourceUnavailable { .. })
    ));
    assert!(!service.cache().is_populated());
}

#[test]
fn build_dataset_works_on_preloaded_tables() -> Result<()> {
    let tables = TableDirectory::new(fixture_dir()).load_all()?;
    let dataset = build_dataset(tables, &fixture_registry(), true)?;

    let acre = rows_for_order(&dataset.records, "o3")?;
    assert_eq!(acre.height(), 1);
    assert_eq!(acre.column(REGION_NAME)?.str()?.get(0), Some("Norte"));
    assert_eq!(acre.column("delivery_time")?.i64()?.get(0), None);
    assert_eq!(acre.column("day_of_week_name")?.str()?.get(0), Some("Sunday"));
    Ok(())
}
