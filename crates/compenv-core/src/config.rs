//! Compiler configuration bag
//!
//! The lifecycle core treats configuration as an opaque, ordered key/value
//! map. It only copies it, except for the few `compenv.*` keys it reads
//! itself.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{EnvError, Result};

/// Extension manifest files loaded when an application context is built
pub const EXTENSION_MANIFESTS: &str = "compenv.extension_manifests";

/// Environment variable that keeps the shared application alive forever
pub const KEEPALIVE_ENV: &str = "COMPENV_KEEPALIVE";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompilerConfiguration {
    entries: BTreeMap<String, Value>,
}

impl CompilerConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style `put`
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.put(key, value);
        self
    }

    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(Value::as_str)
    }

    /// Boolean value, accepting `true`/`false` and lenient string spellings
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.entries.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => parse_bool_lenient(s),
            _ => None,
        }
    }

    /// List of strings; a single string counts as a one-element list
    ///
    /// # Errors
    /// * `InvalidConfiguration` - the value is neither a string nor a list of strings
    pub fn get_string_list(&self, key: &str) -> Result<Vec<String>> {
        let invalid = || EnvError::InvalidConfiguration {
            reason: format!("'{}' must be a string or a list of strings", key),
        };
        match self.entries.get(key) {
            None => Ok(Vec::new()),
            Some(Value::String(s)) => Ok(vec![s.clone()]),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
                .collect(),
            Some(_) => Err(invalid()),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse TOML; nested tables become dotted keys
    ///
    /// ```
    /// use compenv_core::config::CompilerConfiguration;
    ///
    /// let config = CompilerConfiguration::from_toml_str(
    ///     "[compenv]\nextension_manifests = [\"a.toml\"]\n",
    /// ).unwrap();
    /// assert!(config.contains("compenv.extension_manifests"));
    /// ```
    ///
    /// # Errors
    /// * `InvalidConfiguration` - the text is not valid TOML
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(text)?;
        let mut config = Self::new();
        flatten_into(&mut config, None, table)?;
        Ok(config)
    }

    /// # Errors
    /// * `Io` - the file cannot be read
    /// * `InvalidConfiguration` - the file is not valid TOML
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| EnvError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }
}

fn flatten_into(config: &mut CompilerConfiguration, prefix: Option<&str>, table: toml::Table) -> Result<()> {
    for (key, value) in table {
        let full_key = match prefix {
            Some(prefix) => format!("{}.{}", prefix, key),
            None => key,
        };
        match value {
            toml::Value::Table(inner) => flatten_into(config, Some(&full_key), inner)?,
            other => {
                let json = serde_json::to_value(other).map_err(|e| EnvError::InvalidConfiguration {
                    reason: format!("'{}': {}", full_key, e),
                })?;
                config.put(full_key, json);
            }
        }
    }
    Ok(())
}

/// `true/yes/on/1` and `false/no/off/0`, case-insensitive
pub fn parse_bool_lenient(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Keepalive flag from [`KEEPALIVE_ENV`]; unset or unparsable means off
pub fn keepalive_from_env() -> bool {
    std::env::var(KEEPALIVE_ENV)
        .ok()
        .and_then(|v| parse_bool_lenient(&v))
        .unwrap_or(false)
}
