use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::point::{ExtensionPointId, ExtensionScope};
use crate::errors::{EnvError, Result};

struct PointSlot {
    capability: &'static str,
    type_id: TypeId,
    /// Each entry is an `Arc<E>` for the point's capability `E`
    extensions: Vec<Box<dyn Any + Send + Sync>>,
}

#[derive(Default)]
struct AreaState {
    points: BTreeMap<String, PointSlot>,
    cleared: bool,
}

/// Summary of one declared point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointInfo {
    pub name: String,
    pub capability: &'static str,
    pub extensions: usize,
}

/// Extension points of one scope
///
/// Lookups never fall through to another scope. Chaining project and
/// application lookups is up to the caller.
pub struct ExtensionArea {
    scope: ExtensionScope,
    state: RwLock<AreaState>,
}

impl ExtensionArea {
    pub fn new(scope: ExtensionScope) -> Self {
        Self {
            scope,
            state: RwLock::new(AreaState::default()),
        }
    }

    pub fn scope(&self) -> ExtensionScope {
        self.scope
    }

    /// Declare a point
    ///
    /// # Errors
    /// * `DuplicateExtensionPoint` - a point with this name already exists in this area
    /// * `AlreadyDisposed` - the owning context was disposed
    pub fn register_point<E: ?Sized + 'static>(&self, point: &ExtensionPointId<E>) -> Result<()> {
        let mut state = self.state.write();
        self.ensure_open(&state)?;

        if state.points.contains_key(point.name()) {
            return Err(EnvError::DuplicateExtensionPoint {
                scope: self.scope,
                name: point.name().to_string(),
            });
        }

        state.points.insert(
            point.name().to_string(),
            PointSlot {
                capability: ExtensionPointId::<E>::capability_name(),
                type_id: TypeId::of::<Arc<E>>(),
                extensions: Vec::new(),
            },
        );
        tracing::debug!(
            scope = %self.scope,
            extension_point = point.name(),
            "declared extension point"
        );
        Ok(())
    }

    /// Append an implementation to a declared point
    ///
    /// # Errors
    /// * `UnknownExtensionPoint` - the point was never declared in this area
    /// * `ExtensionTypeMismatch` - the point was declared with another capability type
    /// * `AlreadyDisposed` - the owning context was disposed
    pub fn register_extension<E>(&self, point: &ExtensionPointId<E>, extension: Arc<E>) -> Result<()>
    where
        E: ?Sized + Send + Sync + 'static,
    {
        let mut state = self.state.write();
        self.ensure_open(&state)?;

        let slot = state
            .points
            .get_mut(point.name())
            .ok_or_else(|| EnvError::UnknownExtensionPoint {
                scope: self.scope,
                name: point.name().to_string(),
            })?;

        if slot.type_id != TypeId::of::<Arc<E>>() {
            return Err(EnvError::ExtensionTypeMismatch {
                name: point.name().to_string(),
                declared: slot.capability.to_string(),
                requested: ExtensionPointId::<E>::capability_name().to_string(),
            });
        }

        slot.extensions.push(Box::new(extension));
        Ok(())
    }

    /// Implementations registered at `point`, in registration order
    ///
    /// Undeclared points and points of a different capability type yield an
    /// empty list.
    pub fn lookup<E>(&self, point: &ExtensionPointId<E>) -> Vec<Arc<E>>
    where
        E: ?Sized + Send + Sync + 'static,
    {
        let state = self.state.read();
        let Some(slot) = state.points.get(point.name()) else {
            return Vec::new();
        };
        if slot.type_id != TypeId::of::<Arc<E>>() {
            tracing::warn!(
                scope = %self.scope,
                extension_point = point.name(),
                declared = slot.capability,
                requested = ExtensionPointId::<E>::capability_name(),
                "lookup with mismatched capability type"
            );
            return Vec::new();
        }
        slot.extensions
            .iter()
            .filter_map(|e| e.downcast_ref::<Arc<E>>().cloned())
            .collect()
    }

    pub fn contains_point(&self, name: &str) -> bool {
        self.state.read().points.contains_key(name)
    }

    /// Declared points sorted by name
    pub fn points(&self) -> Vec<PointInfo> {
        self.state
            .read()
            .points
            .iter()
            .map(|(name, slot)| PointInfo {
                name: name.clone(),
                capability: slot.capability,
                extensions: slot.extensions.len(),
            })
            .collect()
    }

    /// Drop every point and refuse further registrations
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.points.clear();
        state.cleared = true;
    }

    pub fn is_cleared(&self) -> bool {
        self.state.read().cleared
    }

    fn ensure_open(&self, state: &AreaState) -> Result<()> {
        if state.cleared {
            return Err(EnvError::AlreadyDisposed {
                entity: format!("{} extension area", self.scope),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for ExtensionArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionArea")
            .field("scope", &self.scope)
            .field("points", &self.state.read().points.len())
            .finish()
    }
}
