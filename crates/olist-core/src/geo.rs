use polars::prelude::*;

use crate::error::Result;
use crate::join::{ensure_key, sort_records};
use crate::regions::{REGION_NAME, STATE_ABBREVIATION, STATE_NAME};

pub const ZIP_PREFIX: &str = "geolocation_zip_code_prefix";
pub const LATITUDE: &str = "geolocation_lat";
pub const LONGITUDE: &str = "geolocation_lng";

pub const DEFAULT_SAMPLE_LIMIT: usize = 30_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lng_min: f64,
    pub lng_max: f64,
}

impl BoundingBox {
    pub const BRAZIL: BoundingBox = BoundingBox {
        lat_min: -33.75116944,
        lat_max: 5.27438888,
        lng_min: -73.98283055,
        lng_max: -34.79314722,
    };

    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.lat_min && lat <= self.lat_max && lng >= self.lng_min && lng <= self.lng_max
    }

    fn predicate(&self) -> Expr {
        col(LATITUDE)
            .lt_eq(lit(self.lat_max))
            .and(col(LONGITUDE).gt_eq(lit(self.lng_min)))
            .and(col(LATITUDE).gt_eq(lit(self.lat_min)))
            .and(col(LONGITUDE).lt_eq(lit(self.lng_max)))
    }
}

/// Keeps in-box samples and collapses them to one point per zip prefix.
///
/// The representative takes the minimum latitude and the minimum longitude of its group
/// independently, so it need not be a point that was observed.
pub fn filter_and_dedup(geolocation: &DataFrame, bounds: &BoundingBox) -> Result<DataFrame> {
    let points = geolocation
        .clone()
        .lazy()
        .filter(bounds.predicate())
        .group_by([col(ZIP_PREFIX)])
        .agg([col(LATITUDE).min(), col(LONGITUDE).min()])
        .sort([ZIP_PREFIX], SortMultipleOptions::default())
        .collect()?;
    Ok(points)
}

/// Left-joins region columns on customer state and geo points on customer zip prefix.
/// Without a region frame the region columns are still added, all null.
pub fn attach_geo(
    records: &DataFrame,
    regions: Option<&DataFrame>,
    geo_points: &DataFrame,
) -> Result<DataFrame> {
    ensure_key(records, "unified_records", "customer_state")?;
    ensure_key(records, "unified_records", "customer_zip_code_prefix")?;
    ensure_key(geo_points, "geo_points", ZIP_PREFIX)?;

    let mut lf = records.clone().lazy();
    lf = match regions {
        Some(regions) => {
            ensure_key(regions, "regions", STATE_ABBREVIATION)?;
            lf.join(
                regions.clone().lazy(),
                [col("customer_state")],
                [col(STATE_ABBREVIATION)],
                JoinArgs::new(JoinType::Left),
            )
        }
        None => lf.with_columns([
            lit(NULL).cast(DataType::String).alias(STATE_NAME),
            lit(NULL).cast(DataType::String).alias(REGION_NAME),
        ]),
    };

    let enriched = lf
        .join(
            geo_points.clone().lazy(),
            [col("customer_zip_code_prefix")],
            [col(ZIP_PREFIX)],
            JoinArgs::new(JoinType::Left),
        )
        .collect()?;

    sort_records(&enriched)
}

/// First `limit` (lat, lng) pairs of `year`, in record order, skipping incomplete pairs.
pub fn sample_locations(records: &DataFrame, year: i32, limit: usize) -> Result<Vec<(f64, f64)>> {
    let years = records.column("year")?.i32()?;
    let lats = records.column(LATITUDE)?.f64()?;
    let lngs = records.column(LONGITUDE)?.f64()?;

    let points = years
        .into_iter()
        .zip(lats.into_iter().zip(lngs.into_iter()))
        .filter(|(row_year, _)| *row_year == Some(year))
        .filter_map(|(_, (lat, lng))| Some((lat?, lng?)))
        .take(limit)
        .collect();
    Ok(points)
}
