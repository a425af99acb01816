//! Output module
//!
//! Handles Arrow RecordBatch creation and the Parquet lake layout.
//!
//! # Overview
//!
//! This module provides utilities for:
//! - Fixed Arrow schemas for the five star schema tables
//! - Converting rows to and from Arrow RecordBatches
//! - Encoding Parquet files
//! - Writing and reading Hive-partitioned tables on any storage backend

mod partitioned;
mod reader;
mod schema;
mod writer;

pub use partitioned::{
    escape_partition_value, partition_batch, unescape_partition_value, PartitionedWriter,
    WriteSummary, DEFAULT_PARTITION, PART_FILE, SUCCESS_MARKER,
};
pub use reader::PartitionedReader;
pub use schema::{table_schema, FromArrow, ToArrow, TIMESTAMP_TZ};
pub use writer::{encode_parquet, ParquetWriterConfig, DEFAULT_ROW_GROUP_SIZE};
