//! Pipelines
//!
//! The two ways of building the star schema from the same raw JSON.
//!
//! # Overview
//!
//! - `LakePipeline` - object storage in, Hive-partitioned Parquet out
//! - `WarehousePipeline` - DuckDB staging tables and `INSERT ... SELECT`

mod lake;
mod warehouse;

pub use lake::{LakePipeline, LakeReport, Stage};
pub use warehouse::WarehousePipeline;
