// crates/olist-dashboard/src/views.rs

use std::collections::BTreeMap;

use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::{presets::UTF8_FULL, Table};
use olist_core::geo::{LATITUDE, LONGITUDE};
use olist_core::pipeline::Dataset;
use olist_core::regions::REGION_NAME;
use polars::prelude::*;

pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const GEO_PREVIEW_POINTS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentShare {
    pub payment_type: String,
    pub count: usize,
    pub percent: f64,
}

/// Share of each payment type over the payments table, largest first.
pub fn payment_shares(payments: &DataFrame) -> Result<Vec<PaymentShare>> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for payment_type in payments.column("payment_type")?.str()?.into_iter().flatten() {
        *counts.entry(payment_type).or_insert(0) += 1;
    }

    let total: usize = counts.values().sum();
    let mut shares: Vec<PaymentShare> = counts
        .into_iter()
        .map(|(payment_type, count)| PaymentShare {
            payment_type: payment_type.to_string(),
            count,
            percent: count as f64 / total as f64 * 100.0,
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(shares)
}

/// Record counts indexed by `[weekday][hour]`, Monday first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeakGrid {
    pub counts: [[usize; 24]; 7],
}

impl PeakGrid {
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }
}

pub fn peak_grid(records: &DataFrame) -> Result<PeakGrid> {
    let weekdays = records.column("day_of_week_name")?.str()?;
    let hours = records.column("hour")?.i32()?;

    let mut grid = PeakGrid {
        counts: [[0; 24]; 7],
    };
    for (weekday, hour) in weekdays.into_iter().zip(hours.into_iter()) {
        let (Some(weekday), Some(hour)) = (weekday, hour) else {
            continue;
        };
        let Some(day) = WEEKDAYS.iter().position(|name| *name == weekday) else {
            continue;
        };
        if let Ok(hour) = usize::try_from(hour) {
            if hour < 24 {
                grid.counts[day][hour] += 1;
            }
        }
    }
    Ok(grid)
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyDelivery {
    pub date: String,
    pub orders: i64,
    pub mean_delivery_days: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeliverySeries {
    pub days: Vec<DailyDelivery>,
    /// Mean of the daily means.
    pub overall_mean: Option<f64>,
}

/// Per purchase date within `[start, end]`: records with an order id and their mean delivery time.
pub fn delivery_series(
    records: &DataFrame,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<DeliverySeries> {
    let start = start.format("%Y-%m-%d").to_string();
    let end = end.format("%Y-%m-%d").to_string();

    let grouped = records
        .clone()
        .lazy()
        .filter(
            col("day_month_year")
                .gt_eq(lit(start))
                .and(col("day_month_year").lt_eq(lit(end))),
        )
        .group_by([col("day_month_year")])
        .agg([
            col("order_id").count().cast(DataType::Int64).alias("total_orders"),
            col("delivery_time")
                .cast(DataType::Float64)
                .mean()
                .alias("avg_delivery_time"),
        ])
        .sort(["day_month_year"], SortMultipleOptions::default())
        .collect()?;

    let dates = grouped.column("day_month_year")?.str()?;
    let orders = grouped.column("total_orders")?.i64()?;
    let means = grouped.column("avg_delivery_time")?.f64()?;

    let days: Vec<DailyDelivery> = (0..grouped.height())
        .filter_map(|idx| {
            Some(DailyDelivery {
                date: dates.get(idx)?.to_string(),
                orders: orders.get(idx).unwrap_or(0),
                mean_delivery_days: means.get(idx),
            })
        })
        .collect();

    let daily_means: Vec<f64> = days.iter().filter_map(|d| d.mean_delivery_days).collect();
    let overall_mean = if daily_means.is_empty() {
        None
    } else {
        Some(daily_means.iter().sum::<f64>() / daily_means.len() as f64)
    };

    Ok(DeliverySeries { days, overall_mean })
}

/// Records per region name; rows without a region are counted under `None`.
pub fn region_distribution(records: &DataFrame) -> Result<BTreeMap<Option<String>, usize>> {
    let mut distribution = BTreeMap::new();
    for region in records.column(REGION_NAME)?.str()?.into_iter() {
        *distribution.entry(region.map(str::to_string)).or_insert(0) += 1;
    }
    Ok(distribution)
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table
}

pub fn render_payments(payments: &DataFrame) -> Result<Table> {
    let mut table = new_table();
    table.set_header(vec!["Payment type", "Payments", "Share (%)"]);
    for share in payment_shares(payments)? {
        table.add_row(vec![
            share.payment_type,
            share.count.to_string(),
            format!("{:.2}", share.percent),
        ]);
    }
    Ok(table)
}

pub fn render_peak_times(records: &DataFrame) -> Result<Table> {
    let grid = peak_grid(records)?;
    let mut table = new_table();

    let mut header = vec!["Day".to_string()];
    header.extend((0..24).map(|hour| hour.to_string()));
    table.set_header(header);

    for (day, counts) in WEEKDAYS.iter().zip(grid.counts.iter()) {
        let mut row = vec![day.to_string()];
        row.extend(counts.iter().map(|count| count.to_string()));
        table.add_row(row);
    }
    Ok(table)
}

pub fn render_delivery_time(
    records: &DataFrame,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Table> {
    let series = delivery_series(records, start, end)?;
    let mut table = new_table();
    table.set_header(vec!["Date", "Orders", "Avg delivery (days)"]);
    for day in &series.days {
        table.add_row(vec![
            day.date.clone(),
            day.orders.to_string(),
            format_days(day.mean_delivery_days),
        ]);
    }
    table.add_row(vec![
        "Overall average".to_string(),
        String::new(),
        format_days(series.overall_mean),
    ]);
    Ok(table)
}

/// Sample size, the first sampled points and the region distribution, one table each.
pub fn render_geo(dataset: &Dataset, year: i32, limit: usize) -> Result<Vec<Table>> {
    let points = dataset.sample_locations(year, limit)?;

    let mut overview = new_table();
    overview.set_header(vec!["Year", "Limit", "Sampled points"]);
    overview.add_row(vec![
        year.to_string(),
        limit.to_string(),
        points.len().to_string(),
    ]);

    let mut preview = new_table();
    preview.set_header(vec![LATITUDE, LONGITUDE]);
    for (lat, lng) in points.iter().take(GEO_PREVIEW_POINTS) {
        preview.add_row(vec![format!("{lat:.6}"), format!("{lng:.6}")]);
    }

    let mut regions = new_table();
    regions.set_header(vec!["Region", "Records"]);
    for (region, count) in region_distribution(&dataset.records)? {
        regions.add_row(vec![
            region.unwrap_or_else(|| "(unknown)".to_string()),
            count.to_string(),
        ]);
    }

    Ok(vec![overview, preview, regions])
}

pub fn render_summary(dataset: &Dataset) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Frame", "Rows", "Columns"]);

    let mut frames: Vec<(&str, &DataFrame)> = vec![
        ("records", &dataset.records),
        ("payments", &dataset.payments),
        ("geolocation", &dataset.geolocation),
        ("geo_points", &dataset.geo_points),
    ];
    if let Some(regions) = &dataset.regions {
        frames.push(("regions", regions));
    }
    for (name, frame) in frames {
        table.add_row(vec![
            name.to_string(),
            frame.height().to_string(),
            frame.width().to_string(),
        ]);
    }
    if dataset.regions.is_none() {
        table.add_row(vec!["regions", "unavailable", ""]);
    }

    let report = &dataset.derive_report;
    table.add_row(vec![
        "missing purchase timestamps".to_string(),
        report.missing_purchase_timestamps.to_string(),
        String::new(),
    ]);
    table.add_row(vec![
        "negative delivery times".to_string(),
        report.negative_delivery_times.to_string(),
        String::new(),
    ]);
    table
}

fn format_days(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |days| format!("{days:.2}"))
}
