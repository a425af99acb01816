//! Storage location parsing
//!
//! Splits a location string into scheme, bucket/container and key prefix.

use crate::error::{Error, Result};
use percent_encoding::percent_decode_str;
use url::Url;

/// Backend selected by a location's scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// `s3://` or `s3a://`
    S3,
    /// `r2://` (S3-compatible, needs an endpoint)
    R2,
    /// `gs://`
    Gcs,
    /// `az://`
    Azure,
    /// `file://` or a plain path
    Local,
}

impl Scheme {
    /// Short scheme name used when displaying paths
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::S3 => "s3",
            Scheme::R2 => "r2",
            Scheme::Gcs => "gs",
            Scheme::Azure => "az",
            Scheme::Local => "file",
        }
    }
}

/// A parsed storage location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub scheme: Scheme,
    /// Bucket or container; empty for local paths
    pub bucket: String,
    /// Key prefix inside the bucket (no leading or trailing slash), or the
    /// filesystem directory for local paths
    pub prefix: String,
}

impl Location {
    /// Parse a location string
    ///
    /// Supported formats:
    /// - `s3://bucket/path/`, `s3a://bucket/path/` - AWS S3
    /// - `r2://bucket/path/` - Cloudflare R2
    /// - `gs://bucket/path/` - Google Cloud Storage
    /// - `az://container/path/` - Azure Blob Storage
    /// - `file:///path/`, `/path/` or `./path/` - Local filesystem
    pub fn parse(location: &str) -> Result<Self> {
        let location = location.trim();
        if location.is_empty() {
            return Err(Error::config("Storage location cannot be empty"));
        }

        if let Some(path) = location.strip_prefix("file://") {
            return Ok(Self::local(path));
        }
        if !location.contains("://") {
            return Ok(Self::local(location));
        }

        let url = Url::parse(location)?;
        let scheme = match url.scheme() {
            "s3" | "s3a" => Scheme::S3,
            "r2" => Scheme::R2,
            "gs" => Scheme::Gcs,
            "az" => Scheme::Azure,
            other => {
                return Err(Error::config(format!(
                    "Unsupported storage scheme '{other}' in {location}"
                )))
            }
        };

        let bucket = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::config(format!("Missing bucket in {location}")))?
            .to_string();

        Ok(Self {
            scheme,
            bucket,
            prefix: url.path().trim_matches('/').to_string(),
        })
    }

    fn local(path: &str) -> Self {
        let trimmed = path.trim_end_matches('/');
        Self {
            scheme: Scheme::Local,
            bucket: String::new(),
            prefix: if trimmed.is_empty() {
                "/".to_string()
            } else {
                trimmed.to_string()
            },
        }
    }

    /// Display form of a key inside this location
    pub fn display_key(&self, key: &str) -> String {
        match self.scheme {
            Scheme::Local if self.prefix.is_empty() => key.to_string(),
            Scheme::Local => format!("{}/{key}", self.prefix.trim_end_matches('/')),
            _ => format!("{}://{}/{key}", self.scheme.as_str(), self.bucket),
        }
    }
}

/// Decode `%XX` escapes; malformed escapes are kept verbatim
pub fn percent_decode(text: &str) -> String {
    percent_decode_str(text).decode_utf8_lossy().into_owned()
}
