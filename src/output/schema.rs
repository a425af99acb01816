//! Arrow schemas for the star schema tables
//!
//! Each output row type converts to a `RecordBatch` with a fixed schema.
//! Song and artist batches also convert back, so a later run can rebuild the
//! catalog from the lake.

use crate::error::{Error, Result};
use crate::types::{Artist, Song, SongPlay, Table, TimeEntry, User};
use arrow::array::{
    Array, ArrayRef, ArrowPrimitiveType, Float64Array, Int32Array, Int64Array, PrimitiveArray,
    StringArray, TimestampMicrosecondArray,
};
use arrow::datatypes::{DataType, Field, Float64Type, Int32Type, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Timezone attached to every timestamp column
pub const TIMESTAMP_TZ: &str = "UTC";

fn timestamp_type() -> DataType {
    DataType::Timestamp(TimeUnit::Microsecond, Some(TIMESTAMP_TZ.into()))
}

/// Arrow schema of a table, partition columns included
pub fn table_schema(table: Table) -> SchemaRef {
    let fields = match table {
        Table::Songs => vec![
            Field::new("song_id", DataType::Utf8, false),
            Field::new("title", DataType::Utf8, true),
            Field::new("artist_id", DataType::Utf8, true),
            Field::new("year", DataType::Int32, true),
            Field::new("duration", DataType::Float64, true),
        ],
        Table::Artists => vec![
            Field::new("artist_id", DataType::Utf8, false),
            Field::new("name", DataType::Utf8, true),
            Field::new("location", DataType::Utf8, true),
            Field::new("latitude", DataType::Float64, true),
            Field::new("longitude", DataType::Float64, true),
        ],
        Table::Users => vec![
            Field::new("user_id", DataType::Int64, false),
            Field::new("first_name", DataType::Utf8, true),
            Field::new("last_name", DataType::Utf8, true),
            Field::new("gender", DataType::Utf8, true),
            Field::new("level", DataType::Utf8, true),
        ],
        Table::Time => vec![
            Field::new("start_time", timestamp_type(), false),
            Field::new("hour", DataType::Int32, false),
            Field::new("day", DataType::Int32, false),
            Field::new("week", DataType::Int32, false),
            Field::new("month", DataType::Int32, false),
            Field::new("year", DataType::Int32, false),
            Field::new("weekday", DataType::Int32, false),
        ],
        Table::SongPlays => vec![
            Field::new("songplay_id", DataType::Int64, false),
            Field::new("start_time", timestamp_type(), false),
            Field::new("user_id", DataType::Int64, true),
            Field::new("level", DataType::Utf8, true),
            Field::new("song_id", DataType::Utf8, false),
            Field::new("artist_id", DataType::Utf8, false),
            Field::new("session_id", DataType::Int64, true),
            Field::new("location", DataType::Utf8, true),
            Field::new("user_agent", DataType::Utf8, true),
            Field::new("year", DataType::Int32, false),
            Field::new("month", DataType::Int32, false),
        ],
    };
    Arc::new(Schema::new(fields))
}

// ============================================================================
// Rows -> Arrow
// ============================================================================

/// Row types that can be written as a table
pub trait ToArrow: Sized {
    /// The table these rows belong to
    const TABLE: Table;

    /// Build a batch with `table_schema(Self::TABLE)`
    fn to_batch(rows: &[Self]) -> Result<RecordBatch>;
}

fn strings<'a, T: 'a>(rows: &'a [T], f: impl Fn(&'a T) -> Option<&'a str>) -> ArrayRef {
    Arc::new(rows.iter().map(f).collect::<StringArray>())
}

fn micros(t: DateTime<Utc>) -> i64 {
    t.timestamp_micros()
}

fn timestamps<T>(rows: &[T], f: impl Fn(&T) -> DateTime<Utc>) -> ArrayRef {
    let values: Vec<i64> = rows.iter().map(|r| micros(f(r))).collect();
    Arc::new(TimestampMicrosecondArray::from(values).with_timezone(TIMESTAMP_TZ))
}

fn small<T>(rows: &[T], f: impl Fn(&T) -> u32) -> ArrayRef {
    Arc::new(rows.iter().map(|r| f(r) as i32).collect::<Int32Array>())
}

fn batch(table: Table, columns: Vec<ArrayRef>) -> Result<RecordBatch> {
    RecordBatch::try_new(table_schema(table), columns)
        .map_err(|e| Error::output(format!("Failed to build {table} batch: {e}")))
}

impl ToArrow for Song {
    const TABLE: Table = Table::Songs;

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        batch(
            Self::TABLE,
            vec![
                strings(rows, |r| Some(r.song_id.as_str())),
                strings(rows, |r| r.title.as_deref()),
                strings(rows, |r| r.artist_id.as_deref()),
                Arc::new(rows.iter().map(|r| r.year).collect::<Int32Array>()),
                Arc::new(rows.iter().map(|r| r.duration).collect::<Float64Array>()),
            ],
        )
    }
}

impl ToArrow for Artist {
    const TABLE: Table = Table::Artists;

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        batch(
            Self::TABLE,
            vec![
                strings(rows, |r| Some(r.artist_id.as_str())),
                strings(rows, |r| r.name.as_deref()),
                strings(rows, |r| r.location.as_deref()),
                Arc::new(rows.iter().map(|r| r.latitude).collect::<Float64Array>()),
                Arc::new(rows.iter().map(|r| r.longitude).collect::<Float64Array>()),
            ],
        )
    }
}

impl ToArrow for User {
    const TABLE: Table = Table::Users;

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        batch(
            Self::TABLE,
            vec![
                Arc::new(rows.iter().map(|r| r.user_id).collect::<Int64Array>()),
                strings(rows, |r| r.first_name.as_deref()),
                strings(rows, |r| r.last_name.as_deref()),
                strings(rows, |r| r.gender.as_deref()),
                strings(rows, |r| r.level.as_deref()),
            ],
        )
    }
}

impl ToArrow for TimeEntry {
    const TABLE: Table = Table::Time;

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        batch(
            Self::TABLE,
            vec![
                timestamps(rows, |r| r.start_time),
                small(rows, |r| r.hour),
                small(rows, |r| r.day),
                small(rows, |r| r.week),
                small(rows, |r| r.month),
                Arc::new(rows.iter().map(|r| r.year).collect::<Int32Array>()),
                small(rows, |r| r.weekday),
            ],
        )
    }
}

impl ToArrow for SongPlay {
    const TABLE: Table = Table::SongPlays;

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        batch(
            Self::TABLE,
            vec![
                Arc::new(rows.iter().map(|r| r.songplay_id).collect::<Int64Array>()),
                timestamps(rows, |r| r.start_time),
                Arc::new(rows.iter().map(|r| r.user_id).collect::<Int64Array>()),
                strings(rows, |r| r.level.as_deref()),
                strings(rows, |r| Some(r.song_id.as_str())),
                strings(rows, |r| Some(r.artist_id.as_str())),
                Arc::new(rows.iter().map(|r| r.session_id).collect::<Int64Array>()),
                strings(rows, |r| r.location.as_deref()),
                strings(rows, |r| r.user_agent.as_deref()),
                Arc::new(rows.iter().map(|r| r.year).collect::<Int32Array>()),
                small(rows, |r| r.month),
            ],
        )
    }
}

// ============================================================================
// Arrow -> Rows
// ============================================================================

/// Row types that can be rebuilt from a table batch
pub trait FromArrow: Sized {
    /// Decode every row of a batch carrying the table's full schema
    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>>;
}

fn column<'b>(batch: &'b RecordBatch, name: &str) -> Result<&'b ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| Error::output(format!("Missing column '{name}'")))
}

fn string_column<'b>(batch: &'b RecordBatch, name: &str) -> Result<&'b StringArray> {
    column(batch, name)?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| Error::output(format!("Column '{name}' is not Utf8")))
}

fn primitive_column<'b, T: ArrowPrimitiveType>(
    batch: &'b RecordBatch,
    name: &str,
) -> Result<&'b PrimitiveArray<T>> {
    column(batch, name)?
        .as_any()
        .downcast_ref::<PrimitiveArray<T>>()
        .ok_or_else(|| Error::output(format!("Column '{name}' has type {:?}", T::DATA_TYPE)))
}

fn opt_string(array: &StringArray, row: usize) -> Option<String> {
    array.is_valid(row).then(|| array.value(row).to_string())
}

fn opt_value<T: ArrowPrimitiveType>(array: &PrimitiveArray<T>, row: usize) -> Option<T::Native> {
    array.is_valid(row).then(|| array.value(row))
}

fn required_string(array: &StringArray, row: usize, name: &str) -> Result<String> {
    opt_string(array, row).ok_or_else(|| Error::output(format!("Null '{name}' at row {row}")))
}

impl FromArrow for Song {
    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        let song_id = string_column(batch, "song_id")?;
        let title = string_column(batch, "title")?;
        let artist_id = string_column(batch, "artist_id")?;
        let year = primitive_column::<Int32Type>(batch, "year")?;
        let duration = primitive_column::<Float64Type>(batch, "duration")?;

        (0..batch.num_rows())
            .map(|row| {
                Ok(Song {
                    song_id: required_string(song_id, row, "song_id")?,
                    title: opt_string(title, row),
                    artist_id: opt_string(artist_id, row),
                    year: opt_value(year, row),
                    duration: opt_value(duration, row),
                })
            })
            .collect()
    }
}

impl FromArrow for Artist {
    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        let artist_id = string_column(batch, "artist_id")?;
        let name = string_column(batch, "name")?;
        let location = string_column(batch, "location")?;
        let latitude = primitive_column::<Float64Type>(batch, "latitude")?;
        let longitude = primitive_column::<Float64Type>(batch, "longitude")?;

        (0..batch.num_rows())
            .map(|row| {
                Ok(Artist {
                    artist_id: required_string(artist_id, row, "artist_id")?,
                    name: opt_string(name, row),
                    location: opt_string(location, row),
                    latitude: opt_value(latitude, row),
                    longitude: opt_value(longitude, row),
                })
            })
            .collect()
    }
}
