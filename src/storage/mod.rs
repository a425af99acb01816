//! Storage module
//!
//! Uniform access to object storage for both reading raw JSON and writing
//! the Parquet lake.
//!
//! Credentials are passed in from configuration; when none are configured
//! the cloud clients fall back to their usual credential chains.

mod location;
mod store;

pub use location::{percent_decode, Location, Scheme};
pub use store::Storage;
