//! Parquet encoding
//!
//! Encodes Arrow RecordBatches into in-memory Parquet files, ready to be
//! put into object storage.

use crate::config::CompressionCodec;
use crate::error::{Error, Result};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::{EnabledStatistics, WriterProperties};

/// Rows per row group unless overridden
pub const DEFAULT_ROW_GROUP_SIZE: usize = 1024 * 1024;

/// Settings applied to every Parquet file the lake writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParquetWriterConfig {
    pub codec: CompressionCodec,
    pub row_group_size: usize,
    pub dictionary: bool,
    pub statistics: bool,
}

impl Default for ParquetWriterConfig {
    fn default() -> Self {
        Self {
            codec: CompressionCodec::Snappy,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
            dictionary: true,
            statistics: true,
        }
    }
}

impl From<CompressionCodec> for ParquetWriterConfig {
    fn from(codec: CompressionCodec) -> Self {
        Self::default().with_codec(codec)
    }
}

impl CompressionCodec {
    /// The parquet codec, at the library's default level
    pub fn compression(self) -> Compression {
        match self {
            CompressionCodec::Snappy => Compression::SNAPPY,
            CompressionCodec::Zstd => Compression::ZSTD(ZstdLevel::default()),
            CompressionCodec::Gzip => Compression::GZIP(GzipLevel::default()),
            CompressionCodec::None => Compression::UNCOMPRESSED,
        }
    }
}

impl ParquetWriterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_codec(mut self, codec: CompressionCodec) -> Self {
        self.codec = codec;
        self
    }

    #[must_use]
    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size.max(1);
        self
    }

    #[must_use]
    pub fn with_dictionary(mut self, enabled: bool) -> Self {
        self.dictionary = enabled;
        self
    }

    #[must_use]
    pub fn with_statistics(mut self, enabled: bool) -> Self {
        self.statistics = enabled;
        self
    }

    /// Writer properties for these settings
    pub fn properties(&self) -> WriterProperties {
        let statistics = if self.statistics {
            EnabledStatistics::Page
        } else {
            EnabledStatistics::None
        };

        WriterProperties::builder()
            .set_compression(self.codec.compression())
            .set_max_row_group_size(self.row_group_size)
            .set_dictionary_enabled(self.dictionary)
            .set_statistics_enabled(statistics)
            .build()
    }
}

/// Encode a RecordBatch as a complete Parquet file
pub fn encode_parquet(batch: &RecordBatch, config: &ParquetWriterConfig) -> Result<Bytes> {
    let mut writer = ArrowWriter::try_new(Vec::new(), batch.schema(), Some(config.properties()))?;
    writer.write(batch)?;

    let buffer = writer
        .into_inner()
        .map_err(|e| Error::output(format!("Failed to finish Parquet file: {e}")))?;
    Ok(Bytes::from(buffer))
}
