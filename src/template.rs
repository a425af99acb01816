//! Template interpolation for YAML configs
//!
//! Handles `{{ env.NAME }}` placeholders in pipeline configuration so that
//! secrets can stay out of the file. Variables come from an explicit
//! `TemplateContext`; nothing here reads or writes the process environment.

use crate::error::{Error, Result};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Regex for matching template variables: {{ scope.NAME }}
static TEMPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*)\.([a-zA-Z_][a-zA-Z0-9_]*)\s*\}\}").unwrap()
});

/// Variables available to configuration templates
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    /// Values addressed as `{{ env.NAME }}`
    env: HashMap<String, String>,
}

impl TemplateContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context from a snapshot of environment variables
    pub fn with_env<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            env: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Look up `scope.name`
    pub fn get(&self, scope: &str, name: &str) -> Option<&str> {
        match scope {
            "env" => self.env.get(name).map(String::as_str),
            _ => None,
        }
    }
}

/// Render a template string with the given context
///
/// All unresolved variables are reported together.
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    let mut missing = Vec::new();

    let rendered = TEMPLATE_REGEX.replace_all(template, |cap: &regex::Captures<'_>| {
        let scope = &cap[1];
        let name = &cap[2];
        match ctx.get(scope, name) {
            Some(value) => value.to_string(),
            None => {
                missing.push(format!("{scope}.{name}"));
                String::new()
            }
        }
    });

    if missing.is_empty() {
        Ok(rendered.into_owned())
    } else {
        Err(Error::undefined_var(missing.join(", ")))
    }
}
