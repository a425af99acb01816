//! JSON document decoding
//!
//! Source files come in three shapes: a single object (song metadata), one
//! object per line (event logs), or a top-level array. All three decode to a
//! flat list of records.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;

/// Decode every record in a JSON document
///
/// `path` only labels errors.
pub fn decode_records<T: DeserializeOwned>(path: &str, body: &[u8]) -> Result<Vec<T>> {
    let first = body.iter().find(|b| !b.is_ascii_whitespace());

    match first {
        None => Ok(Vec::new()),
        Some(b'[') => serde_json::from_slice(body).map_err(|e| Error::decode(path, e)),
        Some(_) => serde_json::Deserializer::from_slice(body)
            .into_iter::<T>()
            .enumerate()
            .map(|(index, record)| {
                record.map_err(|e| Error::decode(path, format!("record {}: {e}", index + 1)))
            })
            .collect(),
    }
}
