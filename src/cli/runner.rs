//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::pipeline::{LakePipeline, Stage, WarehousePipeline};
use crate::template::TemplateContext;
use crate::warehouse::WarehousePlan;
use serde_json::{json, Value};

/// CLI runner
pub struct Runner {
    cli: Cli,
    context: TemplateContext,
}

impl Runner {
    /// Create a new runner; `context` supplies `{{ env.X }}` values
    pub fn new(cli: Cli, context: TemplateContext) -> Self {
        Self { cli, context }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Lake { stage } => self.lake(*stage).await,
            Commands::Warehouse { reset_only } => self.warehouse(*reset_only),
            Commands::Validate => self.validate(),
            Commands::Sql => self.sql(),
        }
    }

    /// Load and validate the configuration file
    fn load_config(&self) -> Result<PipelineConfig> {
        PipelineConfig::from_file(&self.cli.config, &self.context)
    }

    async fn lake(&self, stage: Stage) -> Result<()> {
        let config = self.load_config()?;
        let pipeline = LakePipeline::from_config(&config)?;
        let report = pipeline.run(stage).await?;

        self.output_message(&json!({
            "type": "LAKE",
            "report": report,
        }));
        Ok(())
    }

    fn warehouse(&self, reset_only: bool) -> Result<()> {
        let config = self.load_config()?;
        let mut pipeline = WarehousePipeline::from_config(&config)?;
        if reset_only {
            pipeline = pipeline.reset_only();
        }
        let counts = pipeline.run()?;

        self.output_message(&json!({
            "type": "WAREHOUSE",
            "database": pipeline.warehouse().database(),
            "counts": counts,
        }));
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let config = self.load_config()?;

        let lake = config.lake.as_ref().map(|lake| {
            json!({
                "song_data": lake.song_location(),
                "log_data": lake.log_location(),
                "output": lake.output,
                "compression": lake.compression,
            })
        });
        let warehouse = config.warehouse.as_ref().map(|warehouse| {
            json!({
                "database": warehouse.database,
                "song_data": warehouse.song_data,
                "log_data": warehouse.log_data,
            })
        });

        self.output_message(&json!({
            "type": "CONFIG",
            "path": self.cli.config.display().to_string(),
            "credentials": config.storage.credentials.is_some(),
            "matching": config.matching,
            "lake": lake,
            "warehouse": warehouse,
        }));
        Ok(())
    }

    fn sql(&self) -> Result<()> {
        let config = self.load_config()?;
        let plan = WarehousePlan::new(config.warehouse()?, config.matching);

        for statement in plan.statements() {
            println!("-- {}\n{};\n", statement.label, statement.sql.trim());
        }
        Ok(())
    }

    /// Output a report message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}
