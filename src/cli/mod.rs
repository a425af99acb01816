//! CLI module
//!
//! Command-line interface for running the pipelines.
//!
//! # Commands
//!
//! - `lake` - Build the Parquet lake (`--stage all|songs|logs`)
//! - `warehouse` - Build the DuckDB warehouse (`--reset-only`)
//! - `validate` - Check the configuration file
//! - `sql` - Print the warehouse statement plan

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
