use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use tracing::debug;

use crate::errors::TableError;
use crate::model::{RawTables, TableKind};
use crate::schema::schema_for;

pub const NO_MESSAGE: &str = "No Message";
pub const NO_TITLE: &str = "No Title";

static TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Applies the per-table normalization. Tables without rules pass through untouched.
pub fn clean_tables(raw: RawTables) -> Result<RawTables, TableError> {
    let RawTables {
        customers,
        geolocation,
        mut order_items,
        payments,
        reviews,
        mut orders,
        products,
        sellers,
        category_translation,
    } = raw;

    let before = geolocation.height();
    let geolocation = drop_duplicate_rows(&geolocation)?;
    debug!(
        removed = before - geolocation.height(),
        "dropped duplicate geolocation rows"
    );

    let mut reviews = reviews
        .lazy()
        .with_columns([
            fill_missing_text("review_comment_message", NO_MESSAGE),
            fill_missing_text("review_comment_title", NO_TITLE),
        ])
        .collect()?;

    parse_table_timestamps(&mut orders, TableKind::Orders)?;
    parse_table_timestamps(&mut order_items, TableKind::OrderItems)?;
    parse_table_timestamps(&mut reviews, TableKind::Reviews)?;

    Ok(RawTables {
        customers,
        geolocation,
        order_items,
        payments,
        reviews,
        orders,
        products,
        sellers,
        category_translation,
    })
}

/// Removes exact-duplicate rows, keeping the first occurrence in input order.
pub fn drop_duplicate_rows(df: &DataFrame) -> Result<DataFrame, TableError> {
    Ok(df
        .clone()
        .lazy()
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()?)
}

/// Replaces null or empty text in `column` with `placeholder`. Whitespace-only text is kept.
pub fn fill_missing_text(column: &str, placeholder: &str) -> Expr {
    when(col(column).is_null().or(col(column).eq(lit(""))))
        .then(lit(placeholder.to_string()))
        .otherwise(col(column))
        .alias(column)
}

fn parse_table_timestamps(df: &mut DataFrame, kind: TableKind) -> Result<(), TableError> {
    for column in schema_for(kind).timestamp_columns() {
        parse_timestamp_column(df, kind, column)?;
    }
    Ok(())
}

/// Replaces a text column with `Datetime(µs)`. Blank cells become null; anything else that
/// does not parse aborts with [`TableError::MalformedTimestamp`].
pub fn parse_timestamp_column(
    df: &mut DataFrame,
    kind: TableKind,
    column: &str,
) -> Result<(), TableError> {
    let parsed = {
        let values = df.column(column)?.str()?;
        let mut parsed: Vec<Option<i64>> = Vec::with_capacity(values.len());
        for (row_index, value) in values.into_iter().enumerate() {
            match value.map(str::trim).filter(|v| !v.is_empty()) {
                Some(text) => parsed.push(Some(parse_timestamp(kind, column, text, row_index)?)),
                None => parsed.push(None),
            }
        }
        parsed
    };

    let series = Series::new(column.into(), parsed)
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?;
    df.with_column(series)?;
    Ok(())
}

fn parse_timestamp(
    kind: TableKind,
    column: &str,
    value: &str,
    row_index: usize,
) -> Result<i64, TableError> {
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(dt.and_utc().timestamp_micros());
        }
    }
    if let Some(midnight) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc().timestamp_micros());
    }
    Err(TableError::MalformedTimestamp {
        table: kind.as_str(),
        column: column.to_string(),
        row_index,
        value: value.to_string(),
    })
}
