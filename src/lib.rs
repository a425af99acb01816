//! # Sparkify ETL
//!
//! Two batch pipelines that turn song metadata and user-activity logs into
//! a star schema of songs, artists, users, time and song plays.
//!
//! ## Pipelines
//!
//! - **Lake**: JSON from object storage (S3, R2, GCS, Azure, local) is
//!   transformed in-process and written back as Hive-partitioned Parquet.
//! - **Warehouse**: DuckDB bulk-loads the same JSON into staging tables and
//!   fills the star schema with `INSERT ... SELECT`.
//!
//! Both share one join-key normalization policy, so they agree on which
//! events match which songs.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sparkify_etl::{LakePipeline, PipelineConfig, Stage, TemplateContext};
//!
//! #[tokio::main]
//! async fn main() -> sparkify_etl::Result<()> {
//!     let ctx = TemplateContext::with_env(std::env::vars());
//!     let config = PipelineConfig::from_file("sparkify.yaml", &ctx)?;
//!
//!     let report = LakePipeline::from_config(&config)?.run(Stage::All).await?;
//!     println!("{} song plays", report.counts.songplays);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │              config (YAML + {{ env.X }} templates)               │
//! └──────────────────────────────────────────────────────────────────┘
//!                                 │
//! ┌──────────┬───────────┬────────┴────────┬─────────────┬───────────┐
//! │ Storage  │  Source   │   Transform     │   Output    │ Warehouse │
//! ├──────────┼───────────┼─────────────────┼─────────────┼───────────┤
//! │ S3 / R2  │ List+Glob │ Song catalog    │ Arrow       │ DuckDB    │
//! │ GCS      │ JSON      │ Users / Time    │ Parquet     │ Staging   │
//! │ Azure    │ NDJSON    │ Song plays      │ Hive layout │ Inserts   │
//! │ Local    │           │ Normalize       │ _SUCCESS    │           │
//! └──────────┴───────────┴─────────────────┴─────────────┴───────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the pipelines
pub mod error;

/// Raw records, star schema rows and table catalog
pub mod types;

/// Pipeline configuration
pub mod config;

/// Template interpolation
pub mod template;

/// Object-storage access
pub mod storage;

/// JSON extraction from storage
pub mod source;

/// Dimensional transform
pub mod transform;

/// Arrow/Parquet output
pub mod output;

/// DuckDB warehouse
pub mod warehouse;

/// Lake and warehouse pipelines
pub mod pipeline;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use pipeline::{LakePipeline, LakeReport, Stage, WarehousePipeline};
pub use template::TemplateContext;
pub use transform::MatchPolicy;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
