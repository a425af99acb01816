//! DuckDB-based warehouse
//!
//! Runs the warehouse plan statement by statement on a single connection.
//! DuckDB reads the raw JSON itself, from local paths or object storage.

use super::queries::{Statement, WarehousePlan};
use crate::config::Credentials;
use crate::error::{Error, Result, ResultExt};
use crate::types::{Table, TableCounts};
use duckdb::Connection;
use tracing::{debug, info};

/// Location prefixes DuckDB reads through its httpfs extension
const REMOTE_PREFIXES: [&str; 5] = ["s3://", "s3a://", "r2://", "gs://", "https://"];

/// Whether a path needs the httpfs extension
pub fn is_remote(path: &str) -> bool {
    REMOTE_PREFIXES.iter().any(|p| path.starts_with(p))
}

/// Embedded SQL warehouse
pub struct Warehouse {
    /// DuckDB connection
    conn: Connection,
    /// Database path or `:memory:` (for logging)
    database: String,
}

impl std::fmt::Debug for Warehouse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Warehouse")
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

impl Warehouse {
    /// Open a database file, or an in-memory database for `:memory:`
    pub fn open(database: &str) -> Result<Self> {
        let conn = if database == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(database)
        }
        .with_context(|| format!("Failed to open DuckDB database {database}"))?;

        debug!("Opened warehouse {}", database);
        Ok(Self {
            conn,
            database: database.to_string(),
        })
    }

    /// In-memory warehouse
    pub fn in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    /// Database path or `:memory:`
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Underlying connection, for ad-hoc queries
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Load httpfs and hand it the configured S3 credentials
    pub fn configure_cloud_storage(&self, credentials: Option<&Credentials>) -> Result<()> {
        self.conn
            .execute_batch("INSTALL httpfs; LOAD httpfs;")
            .context("Failed to load httpfs extension")?;

        let Some(creds) = credentials else {
            return Ok(());
        };

        let mut settings = Vec::new();
        if let Some(key_id) = &creds.access_key_id {
            settings.push(("s3_access_key_id", key_id.as_str()));
        }
        if let Some(secret) = &creds.secret_access_key {
            settings.push(("s3_secret_access_key", secret.as_str()));
        }
        if let Some(token) = &creds.session_token {
            settings.push(("s3_session_token", token.as_str()));
        }
        if let Some(region) = &creds.region {
            settings.push(("s3_region", region.as_str()));
        }

        // R2, MinIO and friends
        if let Some(endpoint) = &creds.endpoint {
            let host = endpoint
                .trim_start_matches("https://")
                .trim_start_matches("http://");
            settings.push(("s3_endpoint", host));
            settings.push(("s3_url_style", "path"));
        }

        let mut sql: String = settings
            .iter()
            .map(|(name, value)| format!("SET {name} = '{}';", value.replace('\'', "''")))
            .collect();
        if let Some(endpoint) = &creds.endpoint {
            let use_ssl = !endpoint.starts_with("http://");
            sql.push_str(&format!("SET s3_use_ssl = {use_ssl};"));
        }

        self.conn
            .execute_batch(&sql)
            .context("Failed to configure S3")?;
        debug!("Configured S3 access ({} settings)", settings.len());
        Ok(())
    }

    /// Execute one statement
    pub fn execute(&self, statement: &Statement) -> Result<()> {
        info!("Running {}", statement.label);
        debug!("{}", statement.sql.trim());
        self.conn
            .execute_batch(&statement.sql)
            .map_err(|e| Error::statement(&statement.label, e))
    }

    /// Execute a plan in order, stopping at the first failure
    pub fn run(&self, plan: &WarehousePlan) -> Result<()> {
        info!(
            "Executing {} warehouse statements on {}",
            plan.len(),
            self.database
        );
        for statement in plan.statements() {
            self.execute(statement)?;
        }
        Ok(())
    }

    /// Row count of a single table
    pub fn count(&self, table: &str) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(&format!(r#"SELECT count(*) FROM "{table}""#), [], |row| {
                row.get(0)
            })?;
        Ok(count as usize)
    }

    /// Row counts of the five star schema tables
    pub fn table_counts(&self) -> Result<TableCounts> {
        let mut counts = TableCounts::default();
        for table in Table::ALL {
            counts.set(table, self.count(table.name())?);
        }
        Ok(counts)
    }
}
