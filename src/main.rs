//! Sparkify ETL CLI
//!
//! Command-line interface for running the lake and warehouse pipelines

use clap::Parser;
use sparkify_etl::cli::{Cli, Runner};
use sparkify_etl::template::TemplateContext;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over the default level
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Templates see a read-only snapshot of the environment
    let context = TemplateContext::with_env(std::env::vars());
    let runner = Runner::new(cli, context);

    if let Err(e) = runner.run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
