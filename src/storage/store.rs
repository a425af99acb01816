//! Object-store access (S3, R2, GCS, Azure, local)

use super::location::{percent_decode, Location, Scheme};
use crate::config::Credentials;
use crate::error::{Error, Result, ResultExt};
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectMeta, ObjectStore};
use std::sync::Arc;

/// A rooted view of an object store
///
/// All keys passed to and returned from this type are relative to the root
/// of the location it was opened on.
#[derive(Debug, Clone)]
pub struct Storage {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Key prefix of the root inside the store
    root: String,
    /// Parsed location, for display
    location: Location,
}

impl Storage {
    /// Open an existing location for reading
    pub fn open(location: &str, credentials: Option<&Credentials>) -> Result<Self> {
        Self::build(Location::parse(location)?, credentials, false)
    }

    /// Open a location for writing, creating local directories as needed
    pub fn create(location: &str, credentials: Option<&Credentials>) -> Result<Self> {
        Self::build(Location::parse(location)?, credentials, true)
    }

    /// Wrap an already constructed store
    pub fn from_store(store: Arc<dyn ObjectStore>, root: &str) -> Self {
        let root = root.trim_matches('/').to_string();
        Self {
            store,
            location: Location {
                scheme: Scheme::Local,
                bucket: String::new(),
                prefix: String::new(),
            },
            root,
        }
    }

    fn build(location: Location, credentials: Option<&Credentials>, create: bool) -> Result<Self> {
        let (store, root): (Arc<dyn ObjectStore>, String) = match location.scheme {
            Scheme::S3 | Scheme::R2 => {
                let store = s3_builder(&location, credentials)?
                    .build()
                    .context("Failed to create S3 client")?;
                (Arc::new(store), location.prefix.clone())
            }
            Scheme::Gcs => {
                let store = gcs_builder(&location, credentials)
                    .build()
                    .context("Failed to create GCS client")?;
                (Arc::new(store), location.prefix.clone())
            }
            Scheme::Azure => {
                let store = azure_builder(&location, credentials)
                    .build()
                    .context("Failed to create Azure client")?;
                (Arc::new(store), location.prefix.clone())
            }
            Scheme::Local => {
                let dir = &location.prefix;
                if create {
                    std::fs::create_dir_all(dir)
                        .with_context(|| format!("Failed to create directory {dir}"))?;
                } else if !std::path::Path::new(dir).is_dir() {
                    return Err(Error::storage(dir.as_str(), "directory does not exist"));
                }
                let store = LocalFileSystem::new_with_prefix(dir)
                    .context("Failed to create local store")?;
                (Arc::new(store), String::new())
            }
        };

        Ok(Self {
            store,
            root,
            location,
        })
    }

    /// Get the scheme (s3, r2, gs, az, file)
    pub fn scheme(&self) -> &str {
        self.location.scheme.as_str()
    }

    /// Absolute store key for a root-relative key
    fn key(&self, relative: &str) -> ObjectPath {
        let relative = relative.trim_matches('/');
        match (self.root.is_empty(), relative.is_empty()) {
            (true, _) => ObjectPath::from(relative),
            (false, true) => ObjectPath::from(self.root.as_str()),
            (false, false) => ObjectPath::from(format!("{}/{relative}", self.root)),
        }
    }

    /// Root-relative form of a store key, with the store's own
    /// percent-encoding removed
    pub fn relative_key(&self, path: &ObjectPath) -> String {
        let full = path.as_ref();
        let relative = if self.root.is_empty() {
            full
        } else {
            full.strip_prefix(&format!("{}/", self.root))
                .unwrap_or(full)
        };
        relative
            .split('/')
            .map(percent_decode)
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Human-readable location of a root-relative key
    pub fn display(&self, relative: &str) -> String {
        self.location.display_key(self.key(relative).as_ref())
    }

    /// List every object below a root-relative prefix, sorted by key
    pub async fn list(&self, relative: &str) -> Result<Vec<ObjectMeta>> {
        let prefix = self.key(relative);
        let prefix = (!prefix.as_ref().is_empty()).then_some(prefix);

        let mut objects: Vec<ObjectMeta> = self
            .store
            .list(prefix.as_ref())
            .try_collect()
            .await
            .map_err(|e| Error::storage(self.display(relative), e))?;

        objects.sort_by(|a, b| a.location.cmp(&b.location));
        Ok(objects)
    }

    /// Read a whole object
    pub async fn get(&self, path: &ObjectPath) -> Result<Bytes> {
        let result = self
            .store
            .get(path)
            .await
            .map_err(|e| Error::storage(path.as_ref(), e))?;
        result
            .bytes()
            .await
            .map_err(|e| Error::storage(path.as_ref(), e))
    }

    /// Write bytes to a root-relative key, returning its display path
    pub async fn put(&self, relative: &str, data: Bytes) -> Result<String> {
        let path = self.key(relative);
        self.store
            .put(&path, data.into())
            .await
            .map_err(|e| Error::storage(path.as_ref(), format!("Failed to write: {e}")))?;
        Ok(self.display(relative))
    }

    /// Delete every object below a root-relative prefix
    pub async fn delete_prefix(&self, relative: &str) -> Result<usize> {
        let objects = self.list(relative).await?;
        for meta in &objects {
            self.store
                .delete(&meta.location)
                .await
                .map_err(|e| Error::storage(meta.location.as_ref(), e))?;
        }
        Ok(objects.len())
    }
}

/// S3 client configured from explicit credentials, or from the standard
/// AWS environment variables when none are configured.
fn s3_builder(location: &Location, credentials: Option<&Credentials>) -> Result<AmazonS3Builder> {
    let mut builder = match credentials {
        Some(_) => AmazonS3Builder::new(),
        None => AmazonS3Builder::from_env(),
    }
    .with_bucket_name(&location.bucket);

    if let Some(creds) = credentials {
        if let Some(key) = &creds.access_key_id {
            builder = builder.with_access_key_id(key);
        }
        if let Some(secret) = &creds.secret_access_key {
            builder = builder.with_secret_access_key(secret);
        }
        if let Some(token) = &creds.session_token {
            builder = builder.with_token(token);
        }
        if let Some(region) = &creds.region {
            builder = builder.with_region(region);
        }
        if let Some(endpoint) = &creds.endpoint {
            builder = builder
                .with_allow_http(endpoint.starts_with("http://"))
                .with_endpoint(endpoint);
        }
    }

    // R2 has no default endpoint
    if location.scheme == Scheme::R2 && credentials.and_then(|c| c.endpoint.as_ref()).is_none() {
        return Err(Error::config(
            "r2:// locations require storage.credentials.endpoint",
        ));
    }

    Ok(builder)
}

/// GCS reads only `service_account`; the S3 key fields do not apply
fn gcs_builder(
    location: &Location,
    credentials: Option<&Credentials>,
) -> GoogleCloudStorageBuilder {
    let service_account = credentials.and_then(|c| c.service_account.as_ref());
    let builder = match service_account {
        Some(path) => GoogleCloudStorageBuilder::new().with_service_account_path(path),
        None => GoogleCloudStorageBuilder::from_env(),
    };
    builder.with_bucket_name(&location.bucket)
}

/// Azure takes the storage account from `access_key_id` and the account key
/// from `secret_access_key`
fn azure_builder(
    location: &Location,
    credentials: Option<&Credentials>,
) -> MicrosoftAzureBuilder {
    let account = credentials
        .and_then(|c| c.access_key_id.as_ref().zip(c.secret_access_key.as_ref()));
    let builder = match account {
        Some((name, key)) => MicrosoftAzureBuilder::new()
            .with_account(name)
            .with_access_key(key),
        None => MicrosoftAzureBuilder::from_env(),
    };
    builder.with_container_name(&location.bucket)
}
