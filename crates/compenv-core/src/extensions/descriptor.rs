use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Data-only extension: what manifests and the stock points carry
///
/// The embedding compiler maps `implementation` to real code; the registry
/// only keeps the declaration in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionDescriptor {
    pub id: String,
    pub implementation: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl ExtensionDescriptor {
    pub fn new(id: impl Into<String>, implementation: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            implementation: implementation.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}
