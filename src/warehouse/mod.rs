//! SQL warehouse
//!
//! Bulk-loads the raw JSON into staging tables inside DuckDB, then fills
//! the star schema with `INSERT ... SELECT` statements.
//!
//! # Overview
//!
//! - `queries` - every statement, as data, plus the ordered plan
//! - `engine` - the DuckDB connection that executes a plan

mod engine;
mod queries;

pub use engine::{is_remote, Warehouse};
pub use queries::{
    copy_staging_events, copy_staging_songs, insert_songplays, insert_time, Statement,
    WarehousePlan, CREATE_TABLES, DROP_TABLES, INSERT_ARTISTS, INSERT_SONGS, INSERT_USERS,
};
