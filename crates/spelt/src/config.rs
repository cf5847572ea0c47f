//! Engine configuration from JSON files and the environment.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use spelt_syntax::error::{Error, Result};

pub const STRICT_VAR: &str = "SPELT_STRICT";
pub const TEMPLATE_VAR: &str = "SPELT_TEMPLATE";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Absent names and properties are errors instead of `null`
    pub strict: bool,
    /// Import the template keyword extension
    pub template: bool,
}

impl EngineConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::new(format!("Invalid configuration: {}", e)))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::new(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    /// Applies `SPELT_STRICT` / `SPELT_TEMPLATE` from the process environment.
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`. Values `1 true yes on` enable a flag,
    /// `0 false no off` disable it, anything else is ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup(STRICT_VAR).as_deref().and_then(flag) {
            self.strict = v;
        }
        if let Some(v) = lookup(TEMPLATE_VAR).as_deref().and_then(flag) {
            self.template = v;
        }
        self
    }
}

fn flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
