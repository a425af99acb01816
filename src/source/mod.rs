//! Source module
//!
//! Extract step shared by both raw inputs: list JSON objects under a
//! storage prefix, optionally narrowed by a glob, and decode them into
//! typed records.

mod decode;
mod glob;
mod reader;

pub use decode::decode_records;
pub use glob::Glob;
pub use reader::JsonSource;
