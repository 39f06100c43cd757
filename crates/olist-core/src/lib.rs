pub mod cache;
pub mod config;
pub mod derive;
pub mod error;
pub mod geo;
pub mod join;
pub mod pipeline;
pub mod regions;
