//! Reading raw JSON records from storage

use super::decode::decode_records;
use super::glob::Glob;
use crate::error::Result;
use crate::storage::Storage;
use object_store::path::Path as ObjectPath;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

/// A set of JSON documents below a storage location
#[derive(Debug, Clone)]
pub struct JsonSource {
    storage: Storage,
    glob: Option<Glob>,
}

impl JsonSource {
    /// Read every `.json` object below the storage root
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            glob: None,
        }
    }

    /// Only read keys matching a glob relative to the root
    pub fn with_glob(mut self, pattern: Option<&str>) -> Result<Self> {
        self.glob = pattern.map(Glob::new).transpose()?;
        Ok(self)
    }

    /// Root-relative keys this source will read, in read order
    pub async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.objects().await?.into_iter().map(|(key, _)| key).collect())
    }

    /// Listed `.json` objects matching the glob, as `(key, path)` pairs
    async fn objects(&self) -> Result<Vec<(String, ObjectPath)>> {
        let objects = self.storage.list("").await?;
        Ok(objects
            .into_iter()
            .map(|meta| (self.storage.relative_key(&meta.location), meta.location))
            .filter(|(key, _)| self.wants(key))
            .collect())
    }

    fn wants(&self, key: &str) -> bool {
        key.ends_with(".json") && self.glob.as_ref().map_or(true, |g| g.matches(key))
    }

    /// Decode every record, in key order and then file order
    pub async fn read_records<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let objects = self.objects().await?;
        let mut records = Vec::new();

        for (key, path) in &objects {
            let body = self.storage.get(path).await?;
            let decoded: Vec<T> = decode_records(&self.storage.display(key), &body)?;
            debug!("Read {} records from {}", decoded.len(), key);
            records.extend(decoded);
        }

        info!(
            "Read {} records from {} files under {}",
            records.len(),
            objects.len(),
            self.storage.display("")
        );
        Ok(records)
    }
}
