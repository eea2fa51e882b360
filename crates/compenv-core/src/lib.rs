//! compenv core - lifecycle management for a compiler front-end environment
//!
//! This crate owns the shared execution context of a compiler:
//! - a disposal tree that releases resources children-first, exactly once
//! - typed extension registries and service registries per scope
//! - the reference-counted, process-wide application context
//! - per-compilation project contexts holding source units
//! - the [`Environment`] facade used by compiler drivers
//!
//! ```
//! use std::sync::Arc;
//! use compenv_core::{CompilerConfiguration, DefaultSetup, Environment, EnvironmentOptions, SourceUnit};
//!
//! let env = Environment::with_options(Arc::new(DefaultSetup), EnvironmentOptions::default());
//! let scope = env.new_scope("compile main");
//! let project = env.create_shared(&CompilerConfiguration::new(), scope).unwrap();
//! project.add_source_units([SourceUnit::new("Main.kt", "fun main() {}\n")]).unwrap();
//! assert_eq!(project.line_count().unwrap(), 1);
//! env.dispose_scope(scope);
//! ```

pub mod application;
pub mod builtins;
pub mod config;
pub mod disposer;
pub mod environment;
pub mod errors;
pub mod extensions;
pub mod logging_facility;
pub mod manifest;
pub mod project;
pub mod services;
pub mod source;

pub use compenv_core_types::schema;

// Re-export commonly used types
pub use application::{ApplicationContext, ApplicationLease, ApplicationSlot, ApplicationState, ReleaseOutcome};
pub use builtins::{ApplicationSetup, DefaultSetup, FileTypeBinding, FileTypeTable};
pub use config::CompilerConfiguration;
pub use disposer::{DisposalSummary, Disposer};
pub use environment::{Environment, EnvironmentMode, EnvironmentOptions, ProjectHandle};
pub use errors::{EnvError, ExError, ExErrorKind, Result};
pub use extensions::{ExtensionArea, ExtensionDescriptor, ExtensionPointId, ExtensionScope};
pub use manifest::ExtensionManifest;
pub use project::ProjectContext;
pub use services::ServiceRegistry;
pub use source::SourceUnit;
