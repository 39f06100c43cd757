pub mod cleaner;
pub mod errors;
pub mod loader;
pub mod model;
pub mod schema;

pub use cleaner::{clean_tables, drop_duplicate_rows, fill_missing_text, parse_timestamp_column};
pub use errors::TableError;
pub use loader::{read_table, TableDirectory};
pub use model::{RawTables, TableKind};
pub use schema::{schema_for, ColumnSpec, ColumnType, TableSchema};
