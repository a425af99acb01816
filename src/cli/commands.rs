//! CLI commands and argument parsing

use crate::pipeline::Stage;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sparkify ETL pipelines
#[derive(Parser, Debug)]
#[command(name = "sparkify-etl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Pipeline configuration file (YAML)
    #[arg(short, long, global = true, default_value = "sparkify.yaml")]
    pub config: PathBuf,

    /// Report format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the Parquet lake from object storage
    Lake {
        /// Which stage to run
        #[arg(long, value_enum, default_value_t = Stage::All)]
        stage: Stage,
    },

    /// Build the star schema inside the DuckDB warehouse
    Warehouse {
        /// Only drop and recreate the tables
        #[arg(long)]
        reset_only: bool,
    },

    /// Validate the configuration file
    Validate,

    /// Print the warehouse statements in execution order
    Sql,
}

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per line
    Json,
    /// Indented JSON
    Pretty,
}
