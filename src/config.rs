//! Pipeline configuration
//!
//! This module contains the structures loaded from the YAML configuration
//! file. Credentials and locations are read once at startup and passed
//! explicitly to the clients that need them.

use crate::error::{Error, Result, ResultExt};
use crate::template::{self, TemplateContext};
use crate::transform::MatchPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete pipeline configuration loaded from YAML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Object-storage access
    #[serde(default)]
    pub storage: StorageConfig,

    /// Dataframe/Parquet pipeline settings
    #[serde(default)]
    pub lake: Option<LakeConfig>,

    /// SQL warehouse pipeline settings
    #[serde(default)]
    pub warehouse: Option<WarehouseConfig>,

    /// Join-key matching policy shared by both pipelines
    #[serde(default)]
    pub matching: MatchPolicy,
}

impl PipelineConfig {
    /// Load, interpolate and validate a configuration file
    pub fn from_file(path: impl AsRef<Path>, ctx: &TemplateContext) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        Self::from_yaml(&content, ctx)
    }

    /// Parse, interpolate and validate a configuration string
    pub fn from_yaml(yaml: &str, ctx: &TemplateContext) -> Result<Self> {
        let mut config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.interpolate(ctx)?;
        config.validate()?;
        Ok(config)
    }

    /// Lake settings, required by the `lake` command
    pub fn lake(&self) -> Result<&LakeConfig> {
        self.lake.as_ref().ok_or_else(|| Error::missing_field("lake"))
    }

    /// Warehouse settings, required by the `warehouse` command
    pub fn warehouse(&self) -> Result<&WarehouseConfig> {
        self.warehouse
            .as_ref()
            .ok_or_else(|| Error::missing_field("warehouse"))
    }

    /// Resolve `{{ env.NAME }}` placeholders in every string setting
    fn interpolate(&mut self, ctx: &TemplateContext) -> Result<()> {
        if let Some(creds) = self.storage.credentials.as_mut() {
            for value in [
                &mut creds.access_key_id,
                &mut creds.secret_access_key,
                &mut creds.session_token,
                &mut creds.region,
                &mut creds.endpoint,
                &mut creds.service_account,
            ]
            .into_iter()
            .flatten()
            {
                *value = template::render(value, ctx)?;
            }
        }

        if let Some(lake) = self.lake.as_mut() {
            lake.input = template::render(&lake.input, ctx)?;
            lake.output = template::render(&lake.output, ctx)?;
            for glob in [&mut lake.song_glob, &mut lake.log_glob]
                .into_iter()
                .flatten()
            {
                *glob = template::render(glob, ctx)?;
            }
        }

        if let Some(warehouse) = self.warehouse.as_mut() {
            warehouse.database = template::render(&warehouse.database, ctx)?;
            warehouse.song_data = template::render(&warehouse.song_data, ctx)?;
            warehouse.log_data = template::render(&warehouse.log_data, ctx)?;
        }

        Ok(())
    }

    /// Reject settings that can only fail later
    fn validate(&self) -> Result<()> {
        if let Some(lake) = &self.lake {
            require_non_empty("lake.input", &lake.input)?;
            require_non_empty("lake.output", &lake.output)?;
            require_non_empty("lake.song_data", &lake.song_data)?;
            require_non_empty("lake.log_data", &lake.log_data)?;
        }

        if let Some(warehouse) = &self.warehouse {
            require_non_empty("warehouse.database", &warehouse.database)?;
            require_non_empty("warehouse.song_data", &warehouse.song_data)?;
            require_non_empty("warehouse.log_data", &warehouse.log_data)?;
            for (field, value) in [
                ("warehouse.song_data", &warehouse.song_data),
                ("warehouse.log_data", &warehouse.log_data),
            ] {
                if value.contains('\'') {
                    return Err(Error::invalid_value(field, "must not contain quotes"));
                }
            }
        }

        if self.lake.is_none() && self.warehouse.is_none() {
            return Err(Error::config(
                "Configuration must define at least one of 'lake' or 'warehouse'",
            ));
        }

        Ok(())
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(Error::invalid_value(field, "must not be empty"))
    } else {
        Ok(())
    }
}

// ============================================================================
// Storage
// ============================================================================

/// Object-storage access settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Explicit credentials; when absent, cloud clients fall back to their
    /// standard environment credential chain
    #[serde(default)]
    pub credentials: Option<Credentials>,
}

/// Cloud credentials
///
/// S3 and R2 use every field except `service_account`. Azure reads the
/// storage account name from `access_key_id` and the account key from
/// `secret_access_key`. GCS reads only `service_account`.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    #[serde(default)]
    pub session_token: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    /// Custom endpoint (R2, MinIO, ...)
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Path to a GCS service-account JSON key
    #[serde(default)]
    pub service_account: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "****");
        f.debug_struct("Credentials")
            .field("access_key_id", &mask(&self.access_key_id))
            .field("secret_access_key", &mask(&self.secret_access_key))
            .field("session_token", &mask(&self.session_token))
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("service_account", &self.service_account)
            .finish()
    }
}

// ============================================================================
// Lake
// ============================================================================

/// Settings for the Parquet lake pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LakeConfig {
    /// Input root (e.g. `s3a://udacity-dend/`)
    pub input: String,

    /// Song metadata prefix, relative to `input`
    #[serde(default = "default_song_data")]
    pub song_data: String,

    /// Optional glob narrowing the song listing
    #[serde(default)]
    pub song_glob: Option<String>,

    /// Event log prefix, relative to `input`
    #[serde(default = "default_log_data")]
    pub log_data: String,

    /// Optional glob narrowing the log listing
    #[serde(default)]
    pub log_glob: Option<String>,

    /// Output root for the partitioned tables
    pub output: String,

    /// Parquet compression codec
    #[serde(default)]
    pub compression: CompressionCodec,
}

fn default_song_data() -> String {
    "song_data".to_string()
}

fn default_log_data() -> String {
    "log_data".to_string()
}

impl LakeConfig {
    /// Full location of the song metadata
    pub fn song_location(&self) -> String {
        join_location(&self.input, &self.song_data)
    }

    /// Full location of the event logs
    pub fn log_location(&self) -> String {
        join_location(&self.input, &self.log_data)
    }
}

/// Join a root location and a relative prefix with exactly one slash
pub fn join_location(root: &str, relative: &str) -> String {
    let relative = relative.trim_matches('/');
    if relative.is_empty() {
        return root.to_string();
    }
    format!("{}/{relative}", root.trim_end_matches('/'))
}

/// Parquet compression codec
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionCodec {
    #[default]
    Snappy,
    Zstd,
    Gzip,
    None,
}

// ============================================================================
// Warehouse
// ============================================================================

/// Settings for the SQL warehouse pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WarehouseConfig {
    /// DuckDB database file, or `:memory:`
    #[serde(default = "default_database")]
    pub database: String,

    /// Path or glob of song metadata JSON to bulk-load
    pub song_data: String,

    /// Path or glob of event log JSON to bulk-load
    pub log_data: String,
}

fn default_database() -> String {
    ":memory:".to_string()
}
