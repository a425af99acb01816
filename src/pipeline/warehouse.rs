//! SQL warehouse pipeline

use crate::config::{Credentials, PipelineConfig};
use crate::error::Result;
use crate::types::{Table, TableCounts};
use crate::warehouse::{is_remote, Warehouse, WarehousePlan};
use tracing::info;

/// The warehouse pipeline: one database and the plan to run against it
#[derive(Debug)]
pub struct WarehousePipeline {
    warehouse: Warehouse,
    plan: WarehousePlan,
    credentials: Option<Credentials>,
    /// Whether the staging copies read from object storage
    remote: bool,
}

impl WarehousePipeline {
    pub fn new(warehouse: Warehouse, plan: WarehousePlan) -> Self {
        Self {
            warehouse,
            plan,
            credentials: None,
            remote: false,
        }
    }

    /// Open the database named by the `warehouse` section
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let settings = config.warehouse()?;
        let warehouse = Warehouse::open(&settings.database)?;
        let plan = WarehousePlan::new(settings, config.matching);

        Ok(Self {
            warehouse,
            plan,
            credentials: config.storage.credentials.clone(),
            remote: is_remote(&settings.song_data) || is_remote(&settings.log_data),
        })
    }

    /// Stop after dropping and recreating the tables
    #[must_use]
    pub fn reset_only(mut self) -> Self {
        self.plan = self.plan.reset_only();
        self
    }

    pub fn plan(&self) -> &WarehousePlan {
        &self.plan
    }

    pub fn warehouse(&self) -> &Warehouse {
        &self.warehouse
    }

    /// Execute the plan and report table sizes
    pub fn run(&self) -> Result<TableCounts> {
        if self.remote && !self.plan.copies.is_empty() {
            self.warehouse
                .configure_cloud_storage(self.credentials.as_ref())?;
        }

        self.warehouse.run(&self.plan)?;

        let counts = self.warehouse.table_counts()?;
        for table in Table::ALL {
            info!("{}: {} rows", table, counts.get(table));
        }
        Ok(counts)
    }
}
