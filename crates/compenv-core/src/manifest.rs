//! Extension manifests
//!
//! TOML files listing extra application points and data-only extensions:
//!
//! ```toml
//! [[points]]
//! name = "lint_rules"
//!
//! [[extensions]]
//! point = "lint_rules"
//! id = "no-wildcard-imports"
//! implementation = "lint.NoWildcardImports"
//! attributes = { severity = "warning" }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::{EnvError, Result};
use crate::extensions::{ExtensionArea, ExtensionDescriptor, ExtensionPointId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointDeclaration {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestExtension {
    pub point: String,
    pub id: String,
    pub implementation: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionManifest {
    /// Where the manifest came from, for error messages
    #[serde(skip)]
    pub origin: String,
    #[serde(default)]
    pub points: Vec<PointDeclaration>,
    #[serde(default)]
    pub extensions: Vec<ManifestExtension>,
}

/// Counts of what one manifest added
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManifestSummary {
    pub points: usize,
    pub extensions: usize,
}

impl ExtensionManifest {
    /// # Errors
    /// * `InvalidManifest` - the text is not valid TOML or a name is empty
    pub fn from_toml_str(origin: impl Into<String>, text: &str) -> Result<Self> {
        let origin = origin.into();
        let mut manifest: ExtensionManifest = toml::from_str(text).map_err(|e| EnvError::InvalidManifest {
            origin: origin.clone(),
            reason: e.to_string(),
        })?;
        manifest.origin = origin;
        manifest.validate()?;
        Ok(manifest)
    }

    /// # Errors
    /// * `Io` - the file cannot be read
    /// * `InvalidManifest` - the file is not a valid manifest
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| EnvError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(path.display().to_string(), &text)
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| EnvError::InvalidManifest {
            origin: self.origin.clone(),
            reason: reason.to_string(),
        };
        if self.points.iter().any(|p| p.name.trim().is_empty()) {
            return Err(invalid("point with empty name"));
        }
        for ext in &self.extensions {
            if ext.point.trim().is_empty() {
                return Err(invalid("extension with empty point"));
            }
            if ext.id.trim().is_empty() {
                return Err(invalid("extension with empty id"));
            }
        }
        Ok(())
    }

    /// Declare this manifest's points, then append its extensions, in file order
    ///
    /// # Errors
    /// * `DuplicateExtensionPoint` - a point is already declared in `area`
    /// * `UnknownExtensionPoint` - an extension targets a point nobody declared
    /// * `ExtensionTypeMismatch` - the target point does not take descriptors
    pub fn apply(&self, area: &ExtensionArea) -> Result<ManifestSummary> {
        let mut summary = ManifestSummary::default();

        for decl in &self.points {
            area.register_point(&ExtensionPointId::<ExtensionDescriptor>::named(decl.name.clone()))?;
            summary.points += 1;
        }

        for ext in &self.extensions {
            let point = ExtensionPointId::<ExtensionDescriptor>::named(ext.point.clone());
            let descriptor = ExtensionDescriptor {
                id: ext.id.clone(),
                implementation: ext.implementation.clone(),
                attributes: ext.attributes.clone(),
            };
            area.register_extension(&point, Arc::new(descriptor))?;
            summary.extensions += 1;
        }

        tracing::debug!(
            origin = %self.origin,
            points = summary.points,
            extensions = summary.extensions,
            "applied extension manifest"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions::ExtensionScope;

    const MANIFEST: &str = r#"
        [[points]]
        name = "lint_rules"

        [[extensions]]
        point = "lint_rules"
        id = "no-wildcard-imports"
        implementation = "lint.NoWildcardImports"
        attributes = { severity = "warning" }

        [[extensions]]
        point = "lint_rules"
        id = "max-line-length"
        implementation = "lint.MaxLineLength"
    "#;

    #[test]
    fn test_parse_and_apply() {
        let manifest = ExtensionManifest::from_toml_str("inline", MANIFEST).unwrap();
        assert_eq!(manifest.points.len(), 1);
        assert_eq!(manifest.extensions.len(), 2);

        let area = ExtensionArea::new(ExtensionScope::Application);
        let summary = manifest.apply(&area).unwrap();
        assert_eq!(summary, ManifestSummary { points: 1, extensions: 2 });

        let rules = area.lookup(&ExtensionPointId::<ExtensionDescriptor>::named("lint_rules"));
        let ids: Vec<_> = rules.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["no-wildcard-imports", "max-line-length"]);
        assert_eq!(rules[0].attribute("severity"), Some("warning"));
    }

    #[test]
    fn test_empty_manifest_is_valid() {
        let manifest = ExtensionManifest::from_toml_str("empty", "").unwrap();
        let area = ExtensionArea::new(ExtensionScope::Application);
        assert_eq!(manifest.apply(&area).unwrap(), ManifestSummary::default());
    }

    #[test]
    fn test_empty_names_are_rejected() {
        let result = ExtensionManifest::from_toml_str("bad", "[[points]]\nname = \"\"\n");
        assert!(matches!(result, Err(EnvError::InvalidManifest { .. })));

        let result = ExtensionManifest::from_toml_str(
            "bad",
            "[[extensions]]\npoint = \"p\"\nid = \" \"\nimplementation = \"x\"\n",
        );
        assert!(matches!(result, Err(EnvError::InvalidManifest { .. })));
    }

    #[test]
    fn test_malformed_toml_names_origin() {
        let err = ExtensionManifest::from_toml_str("plugins/broken.toml", "[[points]\n").unwrap_err();
        match err {
            EnvError::InvalidManifest { origin, .. } => assert_eq!(origin, "plugins/broken.toml"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_extension_for_undeclared_point_fails() {
        let manifest = ExtensionManifest::from_toml_str(
            "m",
            "[[extensions]]\npoint = \"nowhere\"\nid = \"a\"\nimplementation = \"x\"\n",
        )
        .unwrap();
        let area = ExtensionArea::new(ExtensionScope::Application);
        assert!(matches!(
            manifest.apply(&area),
            Err(EnvError::UnknownExtensionPoint { .. })
        ));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = ExtensionManifest::load(Path::new("/no/such/manifest.toml"));
        assert!(matches!(result, Err(EnvError::Io { .. })));
    }
}
