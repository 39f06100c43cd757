use std::collections::HashSet;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use polars::prelude::*;
use tracing::debug;

use crate::errors::TableError;
use crate::model::{RawTables, TableKind};
use crate::schema::{schema_for, TableSchema};

/// Directory holding the nine extracted CSV files.
#[derive(Debug, Clone)]
pub struct TableDirectory {
    root: PathBuf,
}

impl TableDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, kind: TableKind) -> PathBuf {
        self.root.join(kind.file_name())
    }

    pub fn load(&self, kind: TableKind) -> Result<DataFrame, TableError> {
        let path = self.path_for(kind);
        let content = std::fs::read(&path).map_err(|err| {
            TableError::unavailable(kind.as_str(), format!("{}: {err}", path.display()))
        })?;
        let df = read_table(kind, &content)?;
        debug!(table = kind.as_str(), rows = df.height(), "loaded source table");
        Ok(df)
    }

    /// Loads every table or none: the first failure aborts the whole load.
    pub fn load_all(&self) -> Result<RawTables, TableError> {
        Ok(RawTables {
            customers: self.load(TableKind::Customers)?,
            geolocation: self.load(TableKind::Geolocation)?,
            order_items: self.load(TableKind::OrderItems)?,
            payments: self.load(TableKind::Payments)?,
            reviews: self.load(TableKind::Reviews)?,
            orders: self.load(TableKind::Orders)?,
            products: self.load(TableKind::Products)?,
            sellers: self.load(TableKind::Sellers)?,
            category_translation: self.load(TableKind::CategoryTranslation)?,
        })
    }
}

/// Parses CSV bytes for `kind`, checking the header against the registered schema first.
pub fn read_table(kind: TableKind, content: &[u8]) -> Result<DataFrame, TableError> {
    let schema = schema_for(kind);
    validate_header(schema, content)?;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_schema_overwrite(Some(Arc::new(schema.read_overrides())))
        .into_reader_with_file_handle(Cursor::new(content))
        .finish()
        .map_err(|err| TableError::unavailable(kind.as_str(), format!("unreadable CSV: {err}")))?;

    Ok(df.select(schema.column_names())?)
}

fn validate_header(schema: &TableSchema, content: &[u8]) -> Result<(), TableError> {
    let table = schema.kind.as_str();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(content);

    let header = match reader.records().next() {
        Some(Ok(record)) => record,
        Some(Err(err)) => {
            return Err(TableError::unavailable(table, format!("header unreadable: {err}")))
        }
        None => return Err(TableError::unavailable(table, "file is empty")),
    };

    let present: HashSet<&str> = header
        .iter()
        .map(|field| field.trim().trim_start_matches('\u{feff}'))
        .collect();
    let missing: Vec<&str> = schema
        .columns
        .iter()
        .map(|spec| spec.name)
        .filter(|name| !present.contains(name))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(TableError::unavailable(
            table,
            format!("missing columns: {}", missing.join(", ")),
        ))
    }
}
