use once_cell::sync::Lazy;
use polars::prelude::{DataType, Schema};

use crate::model::TableKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Float,
    /// Read as text, converted by the cleaner.
    Timestamp,
}

impl ColumnType {
    /// Type the CSV reader is told to produce for this column.
    pub fn read_type(&self) -> DataType {
        match self {
            ColumnType::Text | ColumnType::Timestamp => DataType::String,
            ColumnType::Integer => DataType::Int64,
            ColumnType::Float => DataType::Float64,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub column_type: ColumnType,
}

const fn column(name: &'static str, column_type: ColumnType) -> ColumnSpec {
    ColumnSpec { name, column_type }
}

#[derive(Debug, Clone)]
pub struct TableSchema {
    pub kind: TableKind,
    pub columns: Vec<ColumnSpec>,
}

impl TableSchema {
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    pub fn timestamp_columns(&self) -> Vec<&'static str> {
        self.columns
            .iter()
            .filter(|c| c.column_type == ColumnType::Timestamp)
            .map(|c| c.name)
            .collect()
    }

    /// Dtype overrides for the CSV reader so join keys compare like types across tables.
    pub fn read_overrides(&self) -> Schema {
        let mut schema = Schema::with_capacity(self.columns.len());
        for spec in &self.columns {
            schema.with_column(spec.name.into(), spec.column_type.read_type());
        }
        schema
    }
}

static TABLE_SCHEMAS: Lazy<Vec<TableSchema>> = Lazy::new(|| {
    use ColumnType::*;
    vec![
        TableSchema {
            kind: TableKind::Customers,
            columns: vec![
                column("customer_id", Text),
                column("customer_unique_id", Text),
                column("customer_zip_code_prefix", Integer),
                column("customer_city", Text),
                column("customer_state", Text),
            ],
        },
        TableSchema {
            kind: TableKind::Geolocation,
            columns: vec![
                column("geolocation_zip_code_prefix", Integer),
                column("geolocation_lat", Float),
                column("geolocation_lng", Float),
                column("geolocation_city", Text),
                column("geolocation_state", Text),
            ],
        },
        TableSchema {
            kind: TableKind::OrderItems,
            columns: vec![
                column("order_id", Text),
                column("order_item_id", Integer),
                column("product_id", Text),
                column("seller_id", Text),
                column("shipping_limit_date", Timestamp),
                column("price", Float),
                column("freight_value", Float),
            ],
        },
        TableSchema {
            kind: TableKind::Payments,
            columns: vec![
                column("order_id", Text),
                column("payment_sequential", Integer),
                column("payment_type", Text),
                column("payment_installments", Integer),
                column("payment_value", Float),
            ],
        },
        TableSchema {
            kind: TableKind::Reviews,
            columns: vec![
                column("review_id", Text),
                column("order_id", Text),
                column("review_score", Integer),
                column("review_comment_title", Text),
                column("review_comment_message", Text),
                column("review_creation_date", Timestamp),
                column("review_answer_timestamp", Timestamp),
            ],
        },
        TableSchema {
            kind: TableKind::Orders,
            columns: vec![
                column("order_id", Text),
                column("customer_id", Text),
                column("order_status", Text),
                column("order_purchase_timestamp", Timestamp),
                column("order_approved_at", Timestamp),
                column("order_delivered_carrier_date", Timestamp),
                column("order_delivered_customer_date", Timestamp),
                column("order_estimated_delivery_date", Timestamp),
            ],
        },
        TableSchema {
            kind: TableKind::Products,
            columns: vec![
                column("product_id", Text),
                column("product_category_name", Text),
                column("product_name_lenght", Float),
                column("product_description_lenght", Float),
                column("product_photos_qty", Float),
                column("product_weight_g", Float),
                column("product_length_cm", Float),
                column("product_height_cm", Float),
                column("product_width_cm", Float),
            ],
        },
        TableSchema {
            kind: TableKind::Sellers,
            columns: vec![
                column("seller_id", Text),
                column("seller_zip_code_prefix", Integer),
                column("seller_city", Text),
                column("seller_state", Text),
            ],
        },
        TableSchema {
            kind: TableKind::CategoryTranslation,
            columns: vec![
                column("product_category_name", Text),
                column("product_category_name_english", Text),
            ],
        },
    ]
});

pub fn all_table_schemas() -> &'static [TableSchema] {
    TABLE_SCHEMAS.as_slice()
}

pub fn schema_for(kind: TableKind) -> &'static TableSchema {
    TABLE_SCHEMAS
        .iter()
        .find(|schema| schema.kind == kind)
        .unwrap_or_else(|| unreachable!("every table kind has a registered schema"))
}
