//! Service registry
//!
//! One instance per type, looked up by type. Application and project
//! contexts each own a registry; neither falls back to the other.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::errors::{EnvError, Result};

struct ServiceEntry {
    name: &'static str,
    instance: Arc<dyn Any + Send + Sync>,
}

#[derive(Default)]
struct RegistryState {
    entries: HashMap<TypeId, ServiceEntry>,
    order: Vec<TypeId>,
    cleared: bool,
}

#[derive(Default)]
pub struct ServiceRegistry {
    state: RwLock<RegistryState>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the instance of service `T`
    ///
    /// # Errors
    /// * `DuplicateService` - an instance of `T` is already registered
    /// * `AlreadyDisposed` - the owning context was disposed
    pub fn register<T: Any + Send + Sync>(&self, service: Arc<T>) -> Result<()> {
        let name = std::any::type_name::<T>();
        let mut state = self.state.write();
        if state.cleared {
            return Err(EnvError::AlreadyDisposed {
                entity: "service registry".to_string(),
            });
        }

        let key = TypeId::of::<T>();
        if state.entries.contains_key(&key) {
            return Err(EnvError::DuplicateService {
                service: name.to_string(),
            });
        }

        state.entries.insert(
            key,
            ServiceEntry {
                name,
                instance: service,
            },
        );
        state.order.push(key);
        tracing::debug!(service = name, "registered service");
        Ok(())
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let instance = self
            .state
            .read()
            .entries
            .get(&TypeId::of::<T>())?
            .instance
            .clone();
        instance.downcast::<T>().ok()
    }

    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.state.read().entries.contains_key(&TypeId::of::<T>())
    }

    /// Type names of registered services, in registration order
    pub fn names(&self) -> Vec<&'static str> {
        let state = self.state.read();
        state
            .order
            .iter()
            .filter_map(|key| state.entries.get(key).map(|e| e.name))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every instance and refuse further registrations
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.entries.clear();
        state.order.clear();
        state.cleared = true;
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
