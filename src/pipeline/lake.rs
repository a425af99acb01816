//! Parquet lake pipeline
//!
//! Reads song metadata and event logs from object storage, builds the star
//! schema in memory and writes each table as Hive-partitioned Parquet.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::output::{ParquetWriterConfig, PartitionedReader, PartitionedWriter};
use crate::source::JsonSource;
use crate::storage::Storage;
use crate::transform::{EventTables, MatchPolicy, SongCatalog};
use crate::types::{Artist, LogEvent, Song, SongRecord, Table, TableCounts};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};

/// Which part of the lake pipeline to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Stage {
    /// Songs and artists, then users, time and song plays
    #[default]
    All,
    /// Songs and artists only
    Songs,
    /// Users, time and song plays, joined against the songs and artists
    /// already in the output
    Logs,
}

/// Outcome of a lake run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LakeReport {
    /// Rows written per table; tables a stage skipped stay at zero
    pub counts: TableCounts,
    /// Parquet files written
    pub files: usize,
    /// Song plays that matched no catalog entry
    pub unmatched_events: usize,
    /// Events dropped because they were not song plays
    pub skipped_events: usize,
    pub duration_ms: u64,
}

/// The lake pipeline, bound to its inputs and output
#[derive(Debug, Clone)]
pub struct LakePipeline {
    songs: JsonSource,
    logs: JsonSource,
    output: Storage,
    parquet: ParquetWriterConfig,
    policy: MatchPolicy,
}

impl LakePipeline {
    /// Create a pipeline from explicit sources and output
    pub fn new(songs: JsonSource, logs: JsonSource, output: Storage) -> Self {
        Self {
            songs,
            logs,
            output,
            parquet: ParquetWriterConfig::default(),
            policy: MatchPolicy::default(),
        }
    }

    /// Open the locations named by the `lake` section
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let lake = config.lake()?;
        let credentials = config.storage.credentials.as_ref();

        let songs = JsonSource::new(Storage::open(&lake.song_location(), credentials)?)
            .with_glob(lake.song_glob.as_deref())?;
        let logs = JsonSource::new(Storage::open(&lake.log_location(), credentials)?)
            .with_glob(lake.log_glob.as_deref())?;
        let output = Storage::create(&lake.output, credentials)?;
        debug!(
            "Lake output {} on {} storage",
            output.display(""),
            output.scheme()
        );

        Ok(Self::new(songs, logs, output)
            .with_parquet(ParquetWriterConfig::from(lake.compression))
            .with_policy(config.matching))
    }

    /// Set Parquet writer settings
    #[must_use]
    pub fn with_parquet(mut self, parquet: ParquetWriterConfig) -> Self {
        self.parquet = parquet;
        self
    }

    /// Set the join-key matching policy
    #[must_use]
    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn writer(&self) -> PartitionedWriter {
        PartitionedWriter::new(self.output.clone(), self.parquet.clone())
    }

    /// Run one or both stages
    pub async fn run(&self, stage: Stage) -> Result<LakeReport> {
        let start = Instant::now();
        let mut report = LakeReport::default();

        match stage {
            Stage::All => {
                let catalog = self.process_song_data(&mut report).await?;
                self.process_log_data(&catalog, &mut report).await?;
            }
            Stage::Songs => {
                self.process_song_data(&mut report).await?;
            }
            Stage::Logs => {
                let catalog = self.load_catalog().await?;
                self.process_log_data(&catalog, &mut report).await?;
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Lake run finished in {}ms: {} files under {}",
            report.duration_ms,
            report.files,
            self.output.display("")
        );
        Ok(report)
    }

    /// Songs and artists
    pub async fn process_song_data(&self, report: &mut LakeReport) -> Result<SongCatalog> {
        info!("Processing song data");
        let records: Vec<SongRecord> = self.songs.read_records().await?;
        let catalog = SongCatalog::from_records(&records);
        debug!(
            "{} song records -> {} songs, {} artists",
            records.len(),
            catalog.songs.len(),
            catalog.artists.len()
        );

        let writer = self.writer();
        let songs = writer.write(&catalog.songs).await?;
        let artists = writer.write(&catalog.artists).await?;

        report.counts.set(Table::Songs, songs.rows);
        report.counts.set(Table::Artists, artists.rows);
        report.files += songs.files + artists.files;
        Ok(catalog)
    }

    /// Users, time and song plays
    pub async fn process_log_data(
        &self,
        catalog: &SongCatalog,
        report: &mut LakeReport,
    ) -> Result<()> {
        info!("Processing log data");
        let events: Vec<LogEvent> = self.logs.read_records().await?;
        let tables = EventTables::from_events(&events, catalog, self.policy)?;

        if tables.unmatched_events > 0 {
            debug!(
                "{} song plays matched no song in the catalog",
                tables.unmatched_events
            );
        }
        debug!("Skipped {} non-song-play events", tables.skipped_events);

        let writer = self.writer();
        let users = writer.write(&tables.users).await?;
        let time = writer.write(&tables.time).await?;
        let songplays = writer.write(&tables.songplays).await?;

        report.counts.set(Table::Users, users.rows);
        report.counts.set(Table::Time, time.rows);
        report.counts.set(Table::SongPlays, songplays.rows);
        report.files += users.files + time.files + songplays.files;
        report.unmatched_events = tables.unmatched_events;
        report.skipped_events = tables.skipped_events;
        Ok(())
    }

    /// Songs and artists written by an earlier songs stage
    pub async fn load_catalog(&self) -> Result<SongCatalog> {
        let reader = PartitionedReader::new(self.output.clone());
        let songs: Vec<Song> = reader.read().await?;
        let artists: Vec<Artist> = reader.read().await?;
        info!(
            "Loaded catalog of {} songs and {} artists from {}",
            songs.len(),
            artists.len(),
            self.output.display("")
        );
        Ok(SongCatalog { songs, artists })
    }
}
