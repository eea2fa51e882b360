//! Built-in collaborators
//!
//! An [`ApplicationSetup`] decides what a fresh context starts with: the
//! file types it understands and the extension points it declares in each
//! scope. [`DefaultSetup`] is the stock compiler front-end set.

use std::path::Path;

use crate::config::CompilerConfiguration;
use crate::errors::Result;
use crate::extensions::{ExtensionArea, ExtensionDescriptor, ExtensionPointId};
use crate::project::ProjectContext;
use crate::services::ServiceRegistry;

/// A file type and the parser responsible for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTypeBinding {
    pub file_type: String,
    pub extension: String,
    pub parser: String,
}

impl FileTypeBinding {
    pub fn new(file_type: impl Into<String>, extension: impl Into<String>, parser: impl Into<String>) -> Self {
        Self {
            file_type: file_type.into(),
            extension: extension.into(),
            parser: parser.into(),
        }
    }
}

/// File-type bindings in registration order
///
/// The first binding for an extension wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTypeTable {
    bindings: Vec<FileTypeBinding>,
}

impl FileTypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, binding: FileTypeBinding) {
        self.bindings.push(binding);
    }

    /// Binding for `path`, matched case-insensitively on its extension
    pub fn resolve(&self, path: &str) -> Option<&FileTypeBinding> {
        let extension = Path::new(path).extension()?.to_str()?;
        self.bindings
            .iter()
            .find(|b| b.extension.eq_ignore_ascii_case(extension))
    }

    pub fn bindings(&self) -> &[FileTypeBinding] {
        &self.bindings
    }
}

/// What a new application or project context is populated with
pub trait ApplicationSetup: Send + Sync {
    fn file_types(&self) -> Vec<FileTypeBinding>;

    fn declare_application_points(&self, area: &ExtensionArea) -> Result<()>;

    fn register_application_services(
        &self,
        _services: &ServiceRegistry,
        _config: &CompilerConfiguration,
    ) -> Result<()> {
        Ok(())
    }

    fn declare_project_points(&self, area: &ExtensionArea) -> Result<()>;

    fn register_project_services(&self, _project: &ProjectContext) -> Result<()> {
        Ok(())
    }
}

pub const BINARY_STUB_BUILDERS: ExtensionPointId<ExtensionDescriptor> =
    ExtensionPointId::new("binary_stub_builders");
pub const FILE_CONTEXT_PROVIDERS: ExtensionPointId<ExtensionDescriptor> =
    ExtensionPointId::new("file_context_providers");
pub const METADATA_CONTRIBUTORS: ExtensionPointId<ExtensionDescriptor> =
    ExtensionPointId::new("metadata_contributors");
pub const AUGMENT_PROVIDERS: ExtensionPointId<ExtensionDescriptor> =
    ExtensionPointId::new("augment_providers");
pub const ENTRY_POINT_PROVIDERS: ExtensionPointId<ExtensionDescriptor> =
    ExtensionPointId::new("entry_point_providers");
pub const CONTAINER_PROVIDERS: ExtensionPointId<ExtensionDescriptor> =
    ExtensionPointId::new("container_providers");
pub const NAVIGATION_POLICIES: ExtensionPointId<ExtensionDescriptor> =
    ExtensionPointId::new("navigation_policies");
pub const CLASS_FILE_DECOMPILERS: ExtensionPointId<ExtensionDescriptor> =
    ExtensionPointId::new("class_file_decompilers");
pub const TYPE_ANNOTATION_MODIFIERS: ExtensionPointId<ExtensionDescriptor> =
    ExtensionPointId::new("type_annotation_modifiers");
pub const META_LANGUAGES: ExtensionPointId<ExtensionDescriptor> =
    ExtensionPointId::new("meta_languages");

pub const TREE_CHANGE_PREPROCESSORS: ExtensionPointId<ExtensionDescriptor> =
    ExtensionPointId::new("tree_change_preprocessors");
pub const ELEMENT_FINDERS: ExtensionPointId<ExtensionDescriptor> =
    ExtensionPointId::new("element_finders");
pub const SYNTHETIC_RESOLVE_EXTENSIONS: ExtensionPointId<ExtensionDescriptor> =
    ExtensionPointId::new("synthetic_resolve_extensions");
pub const STORAGE_CONTAINER_CONTRIBUTORS: ExtensionPointId<ExtensionDescriptor> =
    ExtensionPointId::new("storage_container_contributors");
pub const DECLARATION_ATTRIBUTE_ALTERERS: ExtensionPointId<ExtensionDescriptor> =
    ExtensionPointId::new("declaration_attribute_alterers");
pub const PREPROCESSED_FILE_FACTORIES: ExtensionPointId<ExtensionDescriptor> =
    ExtensionPointId::new("preprocessed_file_factories");

const APPLICATION_POINTS: [ExtensionPointId<ExtensionDescriptor>; 10] = [
    BINARY_STUB_BUILDERS,
    FILE_CONTEXT_PROVIDERS,
    METADATA_CONTRIBUTORS,
    AUGMENT_PROVIDERS,
    ENTRY_POINT_PROVIDERS,
    CONTAINER_PROVIDERS,
    NAVIGATION_POLICIES,
    CLASS_FILE_DECOMPILERS,
    TYPE_ANNOTATION_MODIFIERS,
    META_LANGUAGES,
];

const PROJECT_POINTS: [ExtensionPointId<ExtensionDescriptor>; 6] = [
    TREE_CHANGE_PREPROCESSORS,
    ELEMENT_FINDERS,
    SYNTHETIC_RESOLVE_EXTENSIONS,
    STORAGE_CONTAINER_CONTRIBUTORS,
    DECLARATION_ATTRIBUTE_ALTERERS,
    PREPROCESSED_FILE_FACTORIES,
];

/// Stock compiler front-end setup
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSetup;

impl ApplicationSetup for DefaultSetup {
    fn file_types(&self) -> Vec<FileTypeBinding> {
        vec![
            FileTypeBinding::new("source", "kt", "source-parser"),
            FileTypeBinding::new("script", "kts", "source-parser"),
            FileTypeBinding::new("java", "java", "java-parser"),
            FileTypeBinding::new("plain-text", "xml", "plain-text-parser"),
        ]
    }

    fn declare_application_points(&self, area: &ExtensionArea) -> Result<()> {
        for point in &APPLICATION_POINTS {
            area.register_point(point)?;
        }
        Ok(())
    }

    fn declare_project_points(&self, area: &ExtensionArea) -> Result<()> {
        for point in &PROJECT_POINTS {
            area.register_point(point)?;
        }
        Ok(())
    }
}
