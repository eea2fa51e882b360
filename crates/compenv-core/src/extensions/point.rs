use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Which registry an extension point lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionScope {
    /// Process-wide, owned by the application context
    Application,
    /// Per compilation, owned by a project context
    Project,
}

impl fmt::Display for ExtensionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtensionScope::Application => write!(f, "application"),
            ExtensionScope::Project => write!(f, "project"),
        }
    }
}

/// Typed name of an extension point
///
/// `E` is the capability every implementation registered at this point
/// provides, usually a `dyn Trait`. Points are keyed by name at runtime; the
/// type is checked when extensions are registered or looked up.
///
/// ```
/// use compenv_core::extensions::ExtensionPointId;
///
/// trait Decompiler: Send + Sync {
///     fn accepts(&self, path: &str) -> bool;
/// }
///
/// const DECOMPILERS: ExtensionPointId<dyn Decompiler> = ExtensionPointId::new("decompilers");
/// assert_eq!(DECOMPILERS.name(), "decompilers");
/// ```
pub struct ExtensionPointId<E: ?Sized> {
    name: Cow<'static, str>,
    _capability: PhantomData<fn() -> Arc<E>>,
}

impl<E: ?Sized + 'static> ExtensionPointId<E> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            _capability: PhantomData,
        }
    }

    /// Point whose name is only known at runtime (manifests)
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            _capability: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capability_name() -> &'static str {
        std::any::type_name::<E>()
    }
}

impl<E: ?Sized> Clone for ExtensionPointId<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            _capability: PhantomData,
        }
    }
}

impl<E: ?Sized> fmt::Debug for ExtensionPointId<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ExtensionPointId").field(&self.name).finish()
    }
}
