use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};
use polars::prelude::*;
use tracing::warn;

use crate::error::Result;

pub const PURCHASE_COLUMN: &str = "order_purchase_timestamp";
pub const DELIVERED_COLUMN: &str = "order_delivered_customer_date";

const SECONDS_PER_DAY: i64 = 86_400;

/// Counters collected while deriving calendar fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeriveReport {
    pub rows: usize,
    pub missing_purchase_timestamps: usize,
    /// Rows delivered before they were purchased. Kept as-is, never clamped.
    pub negative_delivery_times: usize,
}

/// Adds `day_of_week_name`, `hour`, `year`, `day_month_year` and `delivery_time` to every row.
pub fn add_derived_fields(records: &DataFrame) -> Result<(DataFrame, DeriveReport)> {
    let height = records.height();
    let purchase = records.column(PURCHASE_COLUMN)?.datetime()?;
    let delivered = records.column(DELIVERED_COLUMN)?.datetime()?;
    let purchase_unit = purchase.time_unit();
    let delivered_unit = delivered.time_unit();

    let mut weekday_names: Vec<Option<String>> = Vec::with_capacity(height);
    let mut hours: Vec<Option<i32>> = Vec::with_capacity(height);
    let mut years: Vec<Option<i32>> = Vec::with_capacity(height);
    let mut dates: Vec<Option<String>> = Vec::with_capacity(height);
    let mut delivery_days: Vec<Option<i64>> = Vec::with_capacity(height);

    let mut report = DeriveReport {
        rows: height,
        ..DeriveReport::default()
    };

    for idx in 0..height {
        let purchased = purchase
            .get(idx)
            .and_then(|value| to_naive(value, purchase_unit));
        let Some(purchased) = purchased else {
            report.missing_purchase_timestamps += 1;
            weekday_names.push(None);
            hours.push(None);
            years.push(None);
            dates.push(None);
            delivery_days.push(None);
            continue;
        };

        weekday_names.push(Some(purchased.format("%A").to_string()));
        hours.push(Some(purchased.hour() as i32));
        years.push(Some(purchased.year()));
        dates.push(Some(purchased.format("%Y-%m-%d").to_string()));

        let days = delivered
            .get(idx)
            .and_then(|value| to_naive(value, delivered_unit))
            .map(|delivered_at| whole_days_between(purchased, delivered_at));
        if matches!(days, Some(d) if d < 0) {
            report.negative_delivery_times += 1;
        }
        delivery_days.push(days);
    }

    if report.negative_delivery_times > 0 {
        warn!(
            rows = report.negative_delivery_times,
            "delivery timestamp precedes purchase timestamp"
        );
    }

    let mut derived = records.clone();
    derived.with_column(Series::new("day_of_week_name".into(), weekday_names))?;
    derived.with_column(Series::new("hour".into(), hours))?;
    derived.with_column(Series::new("year".into(), years))?;
    derived.with_column(Series::new("day_month_year".into(), dates))?;
    derived.with_column(Series::new("delivery_time".into(), delivery_days))?;

    Ok((derived, report))
}

/// Floor of the elapsed days, matching the day component of a signed duration.
pub fn whole_days_between(start: NaiveDateTime, end: NaiveDateTime) -> i64 {
    (end - start).num_seconds().div_euclid(SECONDS_PER_DAY)
}

fn to_naive(value: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let dt = match unit {
        TimeUnit::Nanoseconds => DateTime::from_timestamp_nanos(value),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(value)?,
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(value)?,
    };
    Some(dt.naive_utc())
}
