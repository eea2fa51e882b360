use compenv_core_types::NodeId;
use thiserror::Error;

use crate::extensions::ExtensionScope;

/// Result type alias using EnvError
pub type Result<T> = std::result::Result<T, EnvError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every kind maps to a stable error code usable for programmatic handling
/// and in structured log events. All kinds describe contract violations in
/// the embedding host; none of them are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Disposal
    AlreadyDisposed,
    InvalidRegistration,

    // Registries
    DuplicateExtensionPoint,
    UnknownExtensionPoint,
    ExtensionTypeMismatch,
    DuplicateService,

    // Application lifecycle
    NotActive,
    ReleaseWithoutAcquire,

    // Configuration
    InvalidConfiguration,
    InvalidManifest,

    // Integration/IO
    Io,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::AlreadyDisposed => "ERR_ALREADY_DISPOSED",
            ExErrorKind::InvalidRegistration => "ERR_INVALID_REGISTRATION",
            ExErrorKind::DuplicateExtensionPoint => "ERR_DUPLICATE_EXTENSION_POINT",
            ExErrorKind::UnknownExtensionPoint => "ERR_UNKNOWN_EXTENSION_POINT",
            ExErrorKind::ExtensionTypeMismatch => "ERR_EXTENSION_TYPE_MISMATCH",
            ExErrorKind::DuplicateService => "ERR_DUPLICATE_SERVICE",
            ExErrorKind::NotActive => "ERR_NOT_ACTIVE",
            ExErrorKind::ReleaseWithoutAcquire => "ERR_RELEASE_WITHOUT_ACQUIRE",
            ExErrorKind::InvalidConfiguration => "ERR_INVALID_CONFIGURATION",
            ExErrorKind::InvalidManifest => "ERR_INVALID_MANIFEST",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries the classification used by log events plus free-form context
/// for whoever ends up reporting the failure.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    scope: Option<ExtensionScope>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            scope: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity context (node, point, service or context id)
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add extension scope context
    pub fn with_scope(mut self, scope: ExtensionScope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn scope(&self) -> Option<ExtensionScope> {
        self.scope
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity: {})", entity_id)?;
        }
        if let Some(scope) = self.scope {
            write!(f, " (scope: {})", scope)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Error taxonomy for environment lifecycle operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnvError {
    // ===== Disposal Errors =====
    /// Operation attempted on a node or context that is disposed or being disposed
    #[error("Already disposed: {entity}")]
    AlreadyDisposed { entity: String },

    /// Registration would break the tree shape
    #[error("Cannot register {child} under {parent}: {reason}")]
    InvalidRegistration {
        child: NodeId,
        parent: NodeId,
        reason: String,
    },

    // ===== Registry Errors =====
    /// Extension point declared twice in the same scope
    #[error("Extension point '{name}' is already declared in {scope} scope")]
    DuplicateExtensionPoint { scope: ExtensionScope, name: String },

    /// Extension registered against a point never declared in that scope
    #[error("Extension point '{name}' is not declared in {scope} scope")]
    UnknownExtensionPoint { scope: ExtensionScope, name: String },

    /// Extension point used with a capability type other than the declared one
    #[error("Extension point '{name}' accepts {declared}, not {requested}")]
    ExtensionTypeMismatch {
        name: String,
        declared: String,
        requested: String,
    },

    /// Service type registered twice in the same context
    #[error("Service {service} is already registered")]
    DuplicateService { service: String },

    // ===== Application Lifecycle Errors =====
    /// acquire() called while no shared application exists
    #[error("No active application context")]
    ApplicationNotActive,

    /// release() called with the active project counter already at zero
    #[error("Release without matching acquire on application {application_id}")]
    ReleaseWithoutAcquire { application_id: String },

    // ===== Configuration Errors =====
    /// Configuration content is malformed
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    /// Extension manifest is malformed or inconsistent
    #[error("Invalid extension manifest {origin}: {reason}")]
    InvalidManifest { origin: String, reason: String },

    /// File could not be read
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    // ===== Generic Errors =====
    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Conversion from EnvError to the canonical ExError
impl From<EnvError> for ExError {
    fn from(err: EnvError) -> Self {
        let message = err.to_string();
        match err {
            EnvError::AlreadyDisposed { entity } => ExError::new(ExErrorKind::AlreadyDisposed)
                .with_entity_id(entity)
                .with_message(message),

            EnvError::InvalidRegistration { child, .. } => {
                ExError::new(ExErrorKind::InvalidRegistration)
                    .with_op("register")
                    .with_entity_id(child.to_string())
                    .with_message(message)
            }

            EnvError::DuplicateExtensionPoint { scope, name } => {
                ExError::new(ExErrorKind::DuplicateExtensionPoint)
                    .with_op("register_point")
                    .with_scope(scope)
                    .with_entity_id(name)
                    .with_message(message)
            }

            EnvError::UnknownExtensionPoint { scope, name } => {
                ExError::new(ExErrorKind::UnknownExtensionPoint)
                    .with_op("register_extension")
                    .with_scope(scope)
                    .with_entity_id(name)
                    .with_message(message)
            }

            EnvError::ExtensionTypeMismatch { name, .. } => {
                ExError::new(ExErrorKind::ExtensionTypeMismatch)
                    .with_entity_id(name)
                    .with_message(message)
            }

            EnvError::DuplicateService { service } => ExError::new(ExErrorKind::DuplicateService)
                .with_op("register_service")
                .with_entity_id(service)
                .with_message(message),

            EnvError::ApplicationNotActive => ExError::new(ExErrorKind::NotActive)
                .with_op("acquire")
                .with_message(message),

            EnvError::ReleaseWithoutAcquire { application_id } => {
                ExError::new(ExErrorKind::ReleaseWithoutAcquire)
                    .with_op("release")
                    .with_entity_id(application_id)
                    .with_message(message)
            }

            EnvError::InvalidConfiguration { .. } => {
                ExError::new(ExErrorKind::InvalidConfiguration).with_message(message)
            }

            EnvError::InvalidManifest { origin, .. } => ExError::new(ExErrorKind::InvalidManifest)
                .with_op("load_manifest")
                .with_entity_id(origin)
                .with_message(message),

            EnvError::Io { path, .. } => ExError::new(ExErrorKind::Io)
                .with_entity_id(path)
                .with_message(message),

            EnvError::Internal { .. } => ExError::new(ExErrorKind::Internal).with_message(message),
        }
    }
}

/// Conversion from toml::de::Error to EnvError
impl From<toml::de::Error> for EnvError {
    fn from(err: toml::de::Error) -> Self {
        EnvError::InvalidConfiguration {
            reason: err.to_string(),
        }
    }
}
