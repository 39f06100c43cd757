// crates/olist-core/src/error.rs

use olist_tables::TableError;
use thiserror::Error;

use crate::regions::RegionLookupError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error("join key {key} missing from {table}")]
    JoinKeyMismatch { table: String, key: &'static str },

    #[error("region lookup failed: {0}")]
    RegionLookupFailed(#[from] RegionLookupError),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
