//! Reading partitioned tables back from the lake

use super::partitioned::{unescape_partition_value, DEFAULT_PARTITION};
use super::schema::{table_schema, FromArrow, ToArrow};
use crate::error::{Error, Result};
use crate::storage::Storage;
use arrow::array::{new_null_array, Array, ArrayRef, StringArray};
use arrow::compute::cast;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::sync::Arc;
use tracing::debug;

/// Reads tables written by `PartitionedWriter`
#[derive(Debug, Clone)]
pub struct PartitionedReader {
    storage: Storage,
}

impl PartitionedReader {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Read typed rows of a table
    pub async fn read<T: FromArrow + ToArrow>(&self) -> Result<Vec<T>> {
        let batches = self
            .read_table(T::TABLE.name(), table_schema(T::TABLE))
            .await?;
        let mut rows = Vec::new();
        for batch in &batches {
            rows.extend(T::from_batch(batch)?);
        }
        Ok(rows)
    }

    /// Read every data file of `<name>/`, restoring partition columns
    ///
    /// Batches come back in directory order and carry `schema` exactly.
    pub async fn read_table(&self, name: &str, schema: SchemaRef) -> Result<Vec<RecordBatch>> {
        let objects = self.storage.list(name).await?;
        if objects.is_empty() {
            return Err(Error::output(format!(
                "Table '{name}' not found at {}",
                self.storage.display(name)
            )));
        }

        let table_prefix = format!("{name}/");
        let mut batches = Vec::new();
        for meta in &objects {
            let key = self.storage.relative_key(&meta.location);
            if !key.ends_with(".parquet") {
                continue;
            }

            let inner = key.strip_prefix(&table_prefix).unwrap_or(&key);
            let partitions = parse_partition_dirs(inner);

            let data = self.storage.get(&meta.location).await?;
            let reader = ParquetRecordBatchReaderBuilder::try_new(data)?.build()?;
            for batch in reader {
                batches.push(restore_columns(&batch?, &partitions, &schema)?);
            }
            debug!("Read {}", self.storage.display(&key));
        }
        Ok(batches)
    }
}

/// `col=value` pairs of every directory above a file key
fn parse_partition_dirs(key: &str) -> Vec<(String, Option<String>)> {
    let mut segments: Vec<&str> = key.split('/').collect();
    segments.pop();
    segments
        .into_iter()
        .filter_map(|segment| segment.split_once('='))
        .map(|(col, value)| {
            let value = (value != DEFAULT_PARTITION).then(|| unescape_partition_value(value));
            (col.to_string(), value)
        })
        .collect()
}

fn restore_columns(
    batch: &RecordBatch,
    partitions: &[(String, Option<String>)],
    schema: &SchemaRef,
) -> Result<RecordBatch> {
    let rows = batch.num_rows();
    let columns = schema
        .fields()
        .iter()
        .map(|field| {
            let column: ArrayRef = if let Some(column) = batch.column_by_name(field.name()) {
                column.clone()
            } else if let Some((_, value)) = partitions.iter().find(|(c, _)| c == field.name()) {
                match value {
                    Some(v) => Arc::new(StringArray::from(vec![v.as_str(); rows])),
                    None => new_null_array(field.data_type(), rows),
                }
            } else {
                return Err(Error::output(format!(
                    "Column '{}' is neither stored nor a partition",
                    field.name()
                )));
            };

            if column.data_type() == field.data_type() {
                Ok(column)
            } else {
                Ok(cast(&column, field.data_type())?)
            }
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(RecordBatch::try_new(schema.clone(), columns)?)
}
