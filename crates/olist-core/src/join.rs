use std::collections::{HashMap, HashSet};

use olist_tables::{RawTables, TableKind};
use polars::prelude::*;
use tracing::info;

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Left,
    /// Full outer join with the key columns coalesced into one.
    Outer,
}

impl JoinKind {
    fn args(&self) -> JoinArgs {
        match self {
            JoinKind::Left => JoinArgs::new(JoinType::Left),
            JoinKind::Outer => {
                JoinArgs::new(JoinType::Full).with_coalesce(JoinCoalesce::CoalesceColumns)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct JoinStep {
    pub table: TableKind,
    pub key: &'static str,
    pub kind: JoinKind,
}

/// Applied in order starting from the orders table. Each step sees the already expanded
/// frame, so fan-out compounds; changing the order or a kind changes row counts.
pub const JOIN_SEQUENCE: [JoinStep; 6] = [
    JoinStep {
        table: TableKind::OrderItems,
        key: "order_id",
        kind: JoinKind::Left,
    },
    JoinStep {
        table: TableKind::Payments,
        key: "order_id",
        kind: JoinKind::Outer,
    },
    JoinStep {
        table: TableKind::Reviews,
        key: "order_id",
        kind: JoinKind::Outer,
    },
    JoinStep {
        table: TableKind::Products,
        key: "product_id",
        kind: JoinKind::Outer,
    },
    JoinStep {
        table: TableKind::Customers,
        key: "customer_id",
        kind: JoinKind::Outer,
    },
    JoinStep {
        table: TableKind::Sellers,
        key: "seller_id",
        kind: JoinKind::Outer,
    },
];

/// Sort keys defining record order, nulls last. The last outer join's key leads, then the
/// earlier join keys in reverse; item, payment and review ids break ties within an order.
pub const RECORD_ORDER: [&str; 7] = [
    "seller_id",
    "customer_id",
    "product_id",
    "order_id",
    "order_item_id",
    "payment_sequential",
    "review_id",
];

const CATEGORY_KEY: &str = "product_category_name";
const CATEGORY_ENGLISH: &str = "product_category_name_english";

/// Fuses the cleaned tables into the unified record frame.
pub fn join_tables(tables: &RawTables) -> Result<DataFrame> {
    let mut unified = tables.orders.clone();
    for step in &JOIN_SEQUENCE {
        unified = apply_join(&unified, step, tables.get(step.table))?;
        info!(
            table = step.table.as_str(),
            key = step.key,
            rows = unified.height(),
            "joined source table"
        );
    }

    let translated = attach_category_translation(&unified, &tables.category_translation)?;
    sort_records(&translated)
}

/// Runs one step of the sequence against an already joined frame.
pub fn apply_join(left: &DataFrame, step: &JoinStep, right: &DataFrame) -> Result<DataFrame> {
    ensure_key(left, "unified_records", step.key)?;
    ensure_key(right, step.table.as_str(), step.key)?;

    let joined = left
        .clone()
        .lazy()
        .join(
            right.clone().lazy(),
            [col(step.key)],
            [col(step.key)],
            step.kind.args(),
        )
        .collect()?;
    Ok(joined)
}

/// Stable sort on [`RECORD_ORDER`], skipping keys the frame does not carry.
pub fn sort_records(df: &DataFrame) -> Result<DataFrame> {
    let keys: Vec<&str> = RECORD_ORDER
        .iter()
        .copied()
        .filter(|key| df.schema().contains(key))
        .collect();
    if keys.is_empty() || df.is_empty() {
        return Ok(df.clone());
    }

    let sorted = df
        .clone()
        .lazy()
        .sort(
            keys,
            SortMultipleOptions::default()
                .with_nulls_last(true)
                .with_maintain_order(true),
        )
        .collect()?;
    Ok(sorted)
}

fn attach_category_translation(records: &DataFrame, translation: &DataFrame) -> Result<DataFrame> {
    ensure_key(records, "unified_records", CATEGORY_KEY)?;
    ensure_key(
        translation,
        TableKind::CategoryTranslation.as_str(),
        CATEGORY_KEY,
    )?;

    // One English name per category so the left join cannot fan out.
    let lookup = translation
        .clone()
        .lazy()
        .group_by_stable([col(CATEGORY_KEY)])
        .agg([col(CATEGORY_ENGLISH).first()]);

    let translated = records
        .clone()
        .lazy()
        .join(
            lookup,
            [col(CATEGORY_KEY)],
            [col(CATEGORY_KEY)],
            JoinArgs::new(JoinType::Left),
        )
        .collect()?;
    Ok(translated)
}

pub(crate) fn ensure_key(df: &DataFrame, table: &str, key: &'static str) -> Result<()> {
    if df.schema().contains(key) {
        Ok(())
    } else {
        Err(PipelineError::JoinKeyMismatch {
            table: table.to_string(),
            key,
        })
    }
}

/// Row count the orders -> items (left) -> payments (outer) chain must produce: per order row,
/// max(items, 1) x max(payments, 1), plus one row per payment whose order is unknown.
pub fn fan_out_row_count(
    orders: &DataFrame,
    items: &DataFrame,
    payments: &DataFrame,
) -> Result<usize> {
    let item_counts = key_counts(items, "order_id")?;
    let payment_counts = key_counts(payments, "order_id")?;

    let order_ids = orders.column("order_id")?.str()?;
    let mut known: HashSet<&str> = HashSet::new();
    let mut total = 0usize;

    for order_id in order_ids.into_iter() {
        let Some(order_id) = order_id else {
            total += 1;
            continue;
        };
        known.insert(order_id);
        let items_matched = item_counts.get(order_id).copied().unwrap_or(0).max(1);
        let payments_matched = payment_counts.get(order_id).copied().unwrap_or(0).max(1);
        total += items_matched * payments_matched;
    }

    let payment_ids = payments.column("order_id")?.str()?;
    total += payment_ids
        .into_iter()
        .filter(|id| id.map_or(true, |id| !known.contains(id)))
        .count();

    Ok(total)
}

fn key_counts<'a>(df: &'a DataFrame, key: &'static str) -> Result<HashMap<&'a str, usize>> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in df.column(key)?.str()?.into_iter().flatten() {
        *counts.entry(value).or_insert(0) += 1;
    }
    Ok(counts)
}
