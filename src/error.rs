//! Error types for the Sparkify ETL pipelines
//!
//! Every stage reports failures through [`Error`]. Nothing is retried: the
//! first error aborts the run and `main` exits non-zero.

use thiserror::Error;

/// Errors raised while configuring or running a pipeline
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Undefined variable in template: {variable}")]
    UndefinedVariable { variable: String },

    // ============================================================================
    // Extraction
    // ============================================================================
    #[error("Invalid storage URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Storage error on '{path}': {message}")]
    Storage { path: String, message: String },

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON document that did not match the expected record shape
    #[error("Failed to decode '{path}': {message}")]
    Decode { path: String, message: String },

    #[error("Timestamp out of range: {ts}")]
    TimestampRange { ts: i64 },

    // ============================================================================
    // Lake output
    // ============================================================================
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Output error: {message}")]
    Output { message: String },

    // ============================================================================
    // Warehouse
    // ============================================================================
    /// A plan statement failed; `statement` is its label, e.g. `copy staging_events`
    #[error("Warehouse statement '{statement}' failed: {source}")]
    Statement {
        statement: String,
        #[source]
        source: duckdb::Error,
    },

    #[error("Warehouse error: {0}")]
    Warehouse(#[from] duckdb::Error),

    // ============================================================================
    // Context
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn undefined_var(variable: impl Into<String>) -> Self {
        Self::UndefinedVariable {
            variable: variable.into(),
        }
    }

    /// Storage failure on a display path such as `s3://bucket/key`
    pub fn storage(path: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Storage {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn decode(path: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Wrap a DuckDB failure with the label of the statement that raised it
    pub fn statement(statement: impl Into<String>, source: duckdb::Error) -> Self {
        Self::Statement {
            statement: statement.into(),
            source,
        }
    }
}

/// Result type alias for the ETL pipelines
pub type Result<T> = std::result::Result<T, Error>;

/// Prefix an error with what was being attempted
pub trait ResultExt<T> {
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Like `context`, but only builds the message on failure
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Other(format!("{}: {}", message.into(), e.into())))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| Error::Other(format!("{}: {}", f(), e.into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("lake.output");
        assert_eq!(err.to_string(), "Missing required config field: lake.output");

        let err = Error::decode("log_data/a.json", "expected value");
        assert_eq!(
            err.to_string(),
            "Failed to decode 'log_data/a.json': expected value"
        );

        let err = Error::TimestampRange { ts: i64::MAX };
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_yaml_error_converts() {
        let yaml: std::result::Result<serde_yaml::Value, _> = serde_yaml::from_str("a: [");
        let err: Error = yaml.unwrap_err().into();
        assert!(matches!(err, Error::YamlParse(_)));
    }

    #[test]
    fn test_context_prefixes_message() {
        let io: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let err = io.context("Failed to create directory /lake").unwrap_err();

        assert!(matches!(err, Error::Other(_)));
        assert_eq!(
            err.to_string(),
            "Failed to create directory /lake: IO error: gone"
        );
    }

    #[test]
    fn test_with_context_is_lazy() {
        let ok: Result<u8> = Ok(1);
        let value = ok
            .with_context(|| panic!("message built on success"))
            .unwrap();
        assert_eq!(value, 1);
    }
}
