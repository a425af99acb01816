//! Glob patterns over object keys
//!
//! `*` and `?` stay within one path segment, `**` crosses segments.

use crate::error::{Error, Result};
use regex::Regex;

/// A compiled glob pattern
#[derive(Debug, Clone)]
pub struct Glob {
    pattern: String,
    regex: Regex,
}

impl Glob {
    /// Compile a glob pattern
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = pattern.trim_matches('/');
        let mut expr = String::from("^");
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '*' if chars.peek() == Some(&'*') => {
                    chars.next();
                    // `**/` also matches zero directories
                    if chars.peek() == Some(&'/') {
                        chars.next();
                        expr.push_str("(?:.*/)?");
                    } else {
                        expr.push_str(".*");
                    }
                }
                '*' => expr.push_str("[^/]*"),
                '?' => expr.push_str("[^/]"),
                other => expr.push_str(&regex::escape(&other.to_string())),
            }
        }
        expr.push('$');

        let regex = Regex::new(&expr)
            .map_err(|e| Error::invalid_value("glob", format!("'{pattern}': {e}")))?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// Whether a source-relative key matches
    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }

    /// The original pattern
    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}
