use anyhow::Result;
use chrono::NaiveDate;
use olist_core::derive::{add_derived_fields, whole_days_between, DeriveReport};
use polars::prelude::*;

fn micros(y: i32, m: u32, d: u32, h: u32, min: u32) -> i64 {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(h, min, 0))
        .expect("valid fixture timestamp")
        .and_utc()
        .timestamp_micros()
}

fn timestamp_series(name: &str, values: Vec<Option<i64>>) -> Result<Column> {
    let series = Series::new(name.into(), values)
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?;
    Ok(series.into())
}

fn records() -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        Series::new("order_id".into(), ["o1", "o2", "o3", "o4", "o5"]).into(),
        timestamp_series(
            "order_purchase_timestamp",
            vec![
                Some(micros(2018, 3, 5, 10, 15)),
                Some(micros(2017, 11, 24, 21, 40)),
                Some(micros(2018, 7, 15, 8, 5)),
                None,
                Some(micros(2018, 5, 10, 12, 0)),
            ],
        )?,
        timestamp_series(
            "order_delivered_customer_date",
            vec![
                Some(micros(2018, 3, 12, 16, 0)),
                Some(micros(2017, 12, 1, 8, 30)),
                None,
                Some(micros(2018, 1, 9, 9, 0)),
                Some(micros(2018, 5, 8, 12, 0)),
            ],
        )?,
    ])?;
    Ok(df)
}

#[test]
fn calendar_fields_come_from_the_purchase_timestamp() -> Result<()> {
    let (derived, _) = add_derived_fields(&records()?)?;

    let weekdays = derived.column("day_of_week_name")?.str()?;
    assert_eq!(weekdays.get(0), Some("Monday"));
    assert_eq!(weekdays.get(1), Some("Friday"));
    assert_eq!(weekdays.get(2), Some("Sunday"));

    let hours = derived.column("hour")?.i32()?;
    assert_eq!(hours.get(0), Some(10));
    assert_eq!(hours.get(1), Some(21));
    assert_eq!(hours.get(2), Some(8));

    let years = derived.column("year")?.i32()?;
    assert_eq!(years.get(1), Some(2017));
    assert_eq!(years.get(2), Some(2018));

    let dates = derived.column("day_month_year")?.str()?;
    assert_eq!(dates.get(0), Some("2018-03-05"));
    assert_eq!(dates.get(1), Some("2017-11-24"));
    Ok(())
}

#[test]
fn delivery_time_counts_whole_days() -> Result<()> {
    let (derived, _) = add_derived_fields(&records()?)?;
    let delivery = derived.column("delivery_time")?.i64()?;

    assert_eq!(delivery.get(0), Some(7));
    // 6 days and 10h50m
    assert_eq!(delivery.get(1), Some(6));
    Ok(())
}

#[test]
fn missing_timestamps_leave_fields_null() -> Result<()> {
    let (derived, report) = add_derived_fields(&records()?)?;

    let delivery = derived.column("delivery_time")?.i64()?;
    assert_eq!(delivery.get(2), None);
    assert_eq!(delivery.get(3), None);

    assert_eq!(derived.column("day_of_week_name")?.str()?.get(3), None);
    assert_eq!(derived.column("hour")?.i32()?.get(3), None);
    assert_eq!(derived.column("year")?.i32()?.get(3), None);
    assert_eq!(report.missing_purchase_timestamps, 1);
    Ok(())
}

#[test]
fn negative_delivery_is_kept_and_counted() -> Result<()> {
    let (derived, report) = add_derived_fields(&records()?)?;

    let delivery = derived.column("delivery_time")?.i64()?;
    assert_eq!(delivery.get(4), Some(-2));
    assert_eq!(
        report,
        DeriveReport {
            rows: 5,
            missing_purchase_timestamps: 1,
            negative_delivery_times: 1,
        }
    );
    Ok(())
}

#[test]
fn existing_columns_are_untouched() -> Result<()> {
    let input = records()?;
    let (derived, _) = add_derived_fields(&input)?;

    assert_eq!(derived.height(), input.height());
    assert_eq!(derived.width(), input.width() + 5);
    assert!(derived.column("order_id")?.as_materialized_series().equals(
        input.column("order_id")?.as_materialized_series()
    ));
    Ok(())
}

#[test]
fn partial_days_round_down() {
    let start = NaiveDate::from_ymd_opt(2018, 1, 1)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .expect("valid date");
    let later = NaiveDate::from_ymd_opt(2018, 1, 2)
        .and_then(|d| d.and_hms_opt(11, 59, 59))
        .expect("valid date");
    let earlier = NaiveDate::from_ymd_opt(2018, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid date");

    assert_eq!(whole_days_between(start, later), 0);
    assert_eq!(whole_days_between(start, earlier), -1);
    assert_eq!(whole_days_between(start, start), 0);
}

#[test]
fn missing_timestamp_column_is_an_error() -> Result<()> {
    let df = df!["order_id" => ["o1"]]?;
    assert!(add_derived_fields(&df).is_err());
    Ok(())
}
