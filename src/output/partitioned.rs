//! Hive-partitioned table layout
//!
//! Tables are written as `<table>/<col>=<value>/.../part-00000.parquet`
//! with a `_SUCCESS` marker once every partition is in place. Partition
//! columns live only in the directory names, not in the files.

use super::schema::ToArrow;
use super::writer::{encode_parquet, ParquetWriterConfig};
use crate::error::Result;
use crate::storage::{percent_decode, Storage};
use arrow::array::{Array, ArrayRef, UInt32Array};
use arrow::compute::take_record_batch;
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Directory value used for null partition values
pub const DEFAULT_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

/// Empty object written after a table is complete
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// File name of the single data file in each partition
pub const PART_FILE: &str = "part-00000.parquet";

/// Characters Hive escapes in partition directory names
const HIVE_ESCAPES: &AsciiSet = &CONTROLS
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'\'')
    .add(b'*')
    .add(b'/')
    .add(b':')
    .add(b'=')
    .add(b'?')
    .add(b'\\')
    .add(b'{')
    .add(b'[')
    .add(b']')
    .add(b'^');

/// Escape a partition value for use in a directory name
///
/// Non-ASCII characters are kept as they are.
pub fn escape_partition_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut buf = [0u8; 4];
    for c in value.chars() {
        if c.is_ascii() {
            out.extend(utf8_percent_encode(c.encode_utf8(&mut buf), HIVE_ESCAPES));
        } else {
            out.push(c);
        }
    }
    out
}

/// Reverse `escape_partition_value`
pub fn unescape_partition_value(value: &str) -> String {
    percent_decode(value)
}

fn partition_value(array: &ArrayRef, row: usize) -> Result<String> {
    if array.is_null(row) {
        return Ok(DEFAULT_PARTITION.to_string());
    }
    Ok(escape_partition_value(&array_value_to_string(array, row)?))
}

/// Split a batch by partition columns
///
/// Returns `(dir, batch)` pairs sorted by directory, where `dir` is the
/// relative `col=value/...` path and `batch` holds the remaining columns.
/// An unpartitioned batch is returned whole with an empty directory.
pub fn partition_batch(
    batch: &RecordBatch,
    partition_by: &[&str],
) -> Result<Vec<(String, RecordBatch)>> {
    if partition_by.is_empty() {
        return Ok(vec![(String::new(), batch.clone())]);
    }

    let schema = batch.schema();
    let partition_indices = partition_by
        .iter()
        .map(|name| schema.index_of(name))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut groups: BTreeMap<String, Vec<u32>> = BTreeMap::new();
    for row in 0..batch.num_rows() {
        let dir = partition_by
            .iter()
            .zip(&partition_indices)
            .map(|(name, &idx)| Ok(format!("{name}={}", partition_value(batch.column(idx), row)?)))
            .collect::<Result<Vec<_>>>()?
            .join("/");
        groups.entry(dir).or_default().push(row as u32);
    }

    let data_indices: Vec<usize> = (0..schema.fields().len())
        .filter(|i| !partition_indices.contains(i))
        .collect();
    let data = batch.project(&data_indices)?;

    groups
        .into_iter()
        .map(|(dir, rows)| {
            let part = take_record_batch(&data, &UInt32Array::from(rows))?;
            Ok((dir, part))
        })
        .collect()
}

/// Result of writing one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    pub table: String,
    pub rows: usize,
    pub files: usize,
}

/// Writes tables below an output root in overwrite mode
#[derive(Debug, Clone)]
pub struct PartitionedWriter {
    storage: Storage,
    config: ParquetWriterConfig,
}

impl PartitionedWriter {
    /// Create a writer rooted at `storage`
    pub fn new(storage: Storage, config: ParquetWriterConfig) -> Self {
        Self { storage, config }
    }

    /// Write typed rows to their table
    pub async fn write<T: ToArrow>(&self, rows: &[T]) -> Result<WriteSummary> {
        let batch = T::to_batch(rows)?;
        self.write_table(T::TABLE.name(), &batch, T::TABLE.partition_columns())
            .await
    }

    /// Replace `<name>/` with the partitions of `batch`
    pub async fn write_table(
        &self,
        name: &str,
        batch: &RecordBatch,
        partition_by: &[&str],
    ) -> Result<WriteSummary> {
        let partitions = partition_batch(batch, partition_by)?;

        let removed = self.storage.delete_prefix(name).await?;
        if removed > 0 {
            debug!("Removed {} existing objects under {}", removed, name);
        }

        let mut files = 0usize;
        for (dir, part) in &partitions {
            let key = if dir.is_empty() {
                format!("{name}/{PART_FILE}")
            } else {
                format!("{name}/{dir}/{PART_FILE}")
            };
            let data = encode_parquet(part, &self.config)?;
            let written = self.storage.put(&key, data).await?;
            debug!("Wrote {} rows to {}", part.num_rows(), written);
            files += 1;
        }

        self.storage
            .put(&format!("{name}/{SUCCESS_MARKER}"), Bytes::new())
            .await?;

        info!(
            "Wrote table {} ({} rows, {} files) to {}",
            name,
            batch.num_rows(),
            files,
            self.storage.display(name)
        );

        Ok(WriteSummary {
            table: name.to_string(),
            rows: batch.num_rows(),
            files,
        })
    }
}
