use std::fmt;

use polars::prelude::DataFrame;

/// The nine source tables of the order dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Customers,
    Geolocation,
    OrderItems,
    Payments,
    Reviews,
    Orders,
    Products,
    Sellers,
    CategoryTranslation,
}

impl TableKind {
    pub const ALL: [TableKind; 9] = [
        TableKind::Customers,
        TableKind::Geolocation,
        TableKind::OrderItems,
        TableKind::Payments,
        TableKind::Reviews,
        TableKind::Orders,
        TableKind::Products,
        TableKind::Sellers,
        TableKind::CategoryTranslation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Customers => "customers",
            TableKind::Geolocation => "geolocation",
            TableKind::OrderItems => "order_items",
            TableKind::Payments => "order_payments",
            TableKind::Reviews => "order_reviews",
            TableKind::Orders => "orders",
            TableKind::Products => "products",
            TableKind::Sellers => "sellers",
            TableKind::CategoryTranslation => "category_name_translation",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            TableKind::Customers => "olist_customers_dataset.csv",
            TableKind::Geolocation => "olist_geolocation_dataset.csv",
            TableKind::OrderItems => "olist_order_items_dataset.csv",
            TableKind::Payments => "olist_order_payments_dataset.csv",
            TableKind::Reviews => "olist_order_reviews_dataset.csv",
            TableKind::Orders => "olist_orders_dataset.csv",
            TableKind::Products => "olist_products_dataset.csv",
            TableKind::Sellers => "olist_sellers_dataset.csv",
            TableKind::CategoryTranslation => "product_category_name_translation.csv",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One frame per source table. Only ever handed downstream fully populated.
#[derive(Debug, Clone)]
pub struct RawTables {
    pub customers: DataFrame,
    pub geolocation: DataFrame,
    pub order_items: DataFrame,
    pub payments: DataFrame,
    pub reviews: DataFrame,
    pub orders: DataFrame,
    pub products: DataFrame,
    pub sellers: DataFrame,
    pub category_translation: DataFrame,
}

impl RawTables {
    pub fn get(&self, kind: TableKind) -> &DataFrame {
        match kind {
            TableKind::Customers => &self.customers,
            TableKind::Geolocation => &self.geolocation,
            TableKind::OrderItems => &self.order_items,
            TableKind::Payments => &self.payments,
            TableKind::Reviews => &self.reviews,
            TableKind::Orders => &self.orders,
            TableKind::Products => &self.products,
            TableKind::Sellers => &self.sellers,
            TableKind::CategoryTranslation => &self.category_translation,
        }
    }

    pub fn row_counts(&self) -> Vec<(TableKind, usize)> {
        TableKind::ALL
            .iter()
            .map(|kind| (*kind, self.get(*kind).height()))
            .collect()
    }
}
