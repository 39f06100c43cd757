use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("{table} source unavailable: {reason}")]
    SourceUnavailable { table: &'static str, reason: String },

    #[error("{table} column {column} row {row_index} has malformed timestamp '{value}'")]
    MalformedTimestamp {
        table: &'static str,
        column: String,
        row_index: usize,
        value: String,
    },

    #[error("polars operation failed: {0}")]
    Polars(#[from] PolarsError),
}

impl TableError {
    pub(crate) fn unavailable(table: &'static str, reason: impl Into<String>) -> Self {
        TableError::SourceUnavailable {
            table,
            reason: reason.into(),
        }
    }
}
