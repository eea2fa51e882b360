//! Application context and the shared application slot
//!
//! An [`ApplicationContext`] is the expensive, process-wide part of a
//! compiler environment. [`ApplicationSlot`] keeps at most one shared
//! instance alive and counts the projects using it: the first acquire
//! builds it, the last release tears it down.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use compenv_core_types::{ApplicationId, NodeId};
use parking_lot::Mutex;

use crate::builtins::{ApplicationSetup, FileTypeTable};
use crate::config::{CompilerConfiguration, EXTENSION_MANIFESTS};
use crate::disposer::{DisposalSummary, Disposer};
use crate::errors::{EnvError, ExError, Result};
use crate::extensions::{ExtensionArea, ExtensionScope};
use crate::manifest::ExtensionManifest;
use crate::services::ServiceRegistry;

pub struct ApplicationContext {
    id: ApplicationId,
    root: NodeId,
    disposer: Arc<Disposer>,
    configuration: CompilerConfiguration,
    file_types: FileTypeTable,
    extensions: Arc<ExtensionArea>,
    services: Arc<ServiceRegistry>,
    setup: Arc<dyn ApplicationSetup>,
    created_at: DateTime<Utc>,
    disposed: Arc<AtomicBool>,
}

impl ApplicationContext {
    /// Build a fully populated application context
    ///
    /// Points are declared first, then file types, then services, then the
    /// manifests named by `compenv.extension_manifests`. The root node is
    /// created last, under `parent` when given, so a failed build leaves
    /// nothing in the tree.
    ///
    /// # Errors
    /// * Any registry error raised by the setup or a manifest
    /// * `Io`/`InvalidManifest` - a listed manifest cannot be loaded
    /// * `AlreadyDisposed` - `parent` is already disposed
    pub fn build(
        disposer: &Arc<Disposer>,
        parent: Option<NodeId>,
        configuration: CompilerConfiguration,
        setup: Arc<dyn ApplicationSetup>,
    ) -> Result<Arc<Self>> {
        let id = ApplicationId::new();
        let extensions = Arc::new(ExtensionArea::new(ExtensionScope::Application));
        let services = Arc::new(ServiceRegistry::new());

        setup.declare_application_points(&extensions)?;

        let mut file_types = FileTypeTable::new();
        for binding in setup.file_types() {
            file_types.register(binding);
        }

        setup.register_application_services(&services, &configuration)?;

        for manifest_path in configuration.get_string_list(EXTENSION_MANIFESTS)? {
            ExtensionManifest::load(Path::new(&manifest_path))?.apply(&extensions)?;
        }

        let disposed = Arc::new(AtomicBool::new(false));
        let hook = {
            let extensions = extensions.clone();
            let services = services.clone();
            let disposed = disposed.clone();
            let id = id.clone();
            move || {
                disposed.store(true, Ordering::SeqCst);
                extensions.clear();
                services.clear();
                tracing::debug!(application_id = %id, "application context released");
                Ok(())
            }
        };
        let name = format!("application {}", id);
        let root = match parent {
            Some(parent) => disposer.new_child(parent, name, hook)?,
            None => disposer.new_node_with_hook(name, hook),
        };

        tracing::debug!(
            application_id = %id,
            node_id = root.get(),
            points = extensions.points().len(),
            "application context built"
        );

        Ok(Arc::new(Self {
            id,
            root,
            disposer: disposer.clone(),
            configuration,
            file_types,
            extensions,
            services,
            setup,
            created_at: Utc::now(),
            disposed,
        }))
    }

    pub fn id(&self) -> &ApplicationId {
        &self.id
    }

    /// Disposal node every project of this application hangs under
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn disposer(&self) -> &Arc<Disposer> {
        &self.disposer
    }

    /// Configuration of the caller that built this context
    pub fn configuration(&self) -> &CompilerConfiguration {
        &self.configuration
    }

    pub fn file_types(&self) -> &FileTypeTable {
        &self.file_types
    }

    pub fn extensions(&self) -> &Arc<ExtensionArea> {
        &self.extensions
    }

    pub fn services(&self) -> &Arc<ServiceRegistry> {
        &self.services
    }

    pub fn setup(&self) -> &Arc<dyn ApplicationSetup> {
        &self.setup
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Dispose the root node and every project under it
    pub fn dispose(&self) -> DisposalSummary {
        self.disposer.dispose(self.root)
    }
}

impl std::fmt::Debug for ApplicationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationContext")
            .field("id", &self.id)
            .field("root", &self.root)
            .field("created_at", &self.created_at)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Proof of one `acquire`, handed back on `release`
///
/// Not cloneable: every lease is released at most once.
#[must_use = "a lease that is never released keeps the application alive"]
#[derive(Debug, PartialEq, Eq)]
pub struct ApplicationLease {
    application_id: ApplicationId,
}

impl ApplicationLease {
    pub fn application_id(&self) -> &ApplicationId {
        &self.application_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationState {
    Uninitialized,
    Active {
        application_id: ApplicationId,
        active_projects: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Counter decremented, application still in use
    Released { remaining: usize },
    /// Last lease returned; the application was torn down
    Disposed(DisposalSummary),
    /// Lease belongs to an application that no longer exists
    Stale,
    /// Counter was already zero; nothing changed
    Unbalanced,
}

#[derive(Default)]
struct SlotState {
    current: Option<Arc<ApplicationContext>>,
    active_projects: usize,
}

/// Holder of the shared application
///
/// The pointer and the active project counter live behind one lock, so the
/// check-and-create, every counter update and the decision to dispose are
/// atomic. The disposal itself runs after the lock is released.
pub struct ApplicationSlot {
    disposer: Arc<Disposer>,
    setup: Arc<dyn ApplicationSetup>,
    state: Mutex<SlotState>,
    constructions: AtomicU64,
}

impl ApplicationSlot {
    pub fn new(disposer: Arc<Disposer>, setup: Arc<dyn ApplicationSetup>) -> Self {
        Self {
            disposer,
            setup,
            state: Mutex::new(SlotState::default()),
            constructions: AtomicU64::new(0),
        }
    }

    /// The shared application, building it from `configuration` if absent
    ///
    /// Once built, later configurations are ignored.
    ///
    /// # Errors
    /// * Whatever [`ApplicationContext::build`] reports; the slot stays empty
    pub fn get_or_create(&self, configuration: &CompilerConfiguration) -> Result<Arc<ApplicationContext>> {
        let mut state = self.state.lock();
        self.ensure_built(&mut state, configuration)
    }

    /// Count one more project against the current application
    ///
    /// # Errors
    /// * `ApplicationNotActive` - no shared application exists
    pub fn acquire(&self) -> Result<ApplicationLease> {
        let mut state = self.state.lock();
        let application_id = match &state.current {
            Some(app) => app.id().clone(),
            None => return Err(EnvError::ApplicationNotActive),
        };
        state.active_projects += 1;
        Ok(ApplicationLease { application_id })
    }

    /// `get_or_create` and `acquire` in one critical section
    ///
    /// # Errors
    /// * Whatever [`ApplicationContext::build`] reports; no lease is taken
    pub fn acquire_shared(
        &self,
        configuration: &CompilerConfiguration,
    ) -> Result<(Arc<ApplicationContext>, ApplicationLease)> {
        let mut state = self.state.lock();
        let app = self.ensure_built(&mut state, configuration)?;
        state.active_projects += 1;
        tracing::debug!(
            application_id = %app.id(),
            active_projects = state.active_projects,
            "application acquired"
        );
        let lease = ApplicationLease {
            application_id: app.id().clone(),
        };
        Ok((app, lease))
    }

    /// Return a lease; the last one disposes the application
    pub fn release(&self, lease: ApplicationLease) -> ReleaseOutcome {
        let mut state = self.state.lock();

        let is_current = state
            .current
            .as_ref()
            .is_some_and(|app| *app.id() == lease.application_id);
        if !is_current {
            tracing::debug!(application_id = %lease.application_id, "stale lease ignored");
            return ReleaseOutcome::Stale;
        }

        if state.active_projects == 0 {
            let err: ExError = EnvError::ReleaseWithoutAcquire {
                application_id: lease.application_id.to_string(),
            }
            .into();
            tracing::warn!(
                application_id = %lease.application_id,
                err.code = err.code(),
                "release without matching acquire ignored"
            );
            return ReleaseOutcome::Unbalanced;
        }

        state.active_projects -= 1;
        if state.active_projects > 0 {
            tracing::debug!(
                application_id = %lease.application_id,
                active_projects = state.active_projects,
                "application released"
            );
            return ReleaseOutcome::Released {
                remaining: state.active_projects,
            };
        }

        let Some(app) = state.current.take() else {
            return ReleaseOutcome::Stale;
        };
        drop(state);

        let summary = app.dispose();
        tracing::debug!(
            application_id = %app.id(),
            disposed = summary.disposed,
            "last lease returned, application disposed"
        );
        ReleaseOutcome::Disposed(summary)
    }

    /// Tear down the shared application regardless of outstanding leases
    ///
    /// Returns `None` when nothing was active. Leases handed out before
    /// this call become stale.
    pub fn force_dispose(&self) -> Option<DisposalSummary> {
        let app = {
            let mut state = self.state.lock();
            state.active_projects = 0;
            state.current.take()
        }?;
        let summary = app.dispose();
        tracing::debug!(
            application_id = %app.id(),
            disposed = summary.disposed,
            "application force-disposed"
        );
        Some(summary)
    }

    pub fn state(&self) -> ApplicationState {
        let state = self.state.lock();
        match &state.current {
            Some(app) => ApplicationState::Active {
                application_id: app.id().clone(),
                active_projects: state.active_projects,
            },
            None => ApplicationState::Uninitialized,
        }
    }

    pub fn current(&self) -> Option<Arc<ApplicationContext>> {
        self.state.lock().current.clone()
    }

    pub fn active_projects(&self) -> usize {
        self.state.lock().active_projects
    }

    /// How many shared applications this slot has built so far
    pub fn constructions(&self) -> u64 {
        self.constructions.load(Ordering::SeqCst)
    }

    pub fn disposer(&self) -> &Arc<Disposer> {
        &self.disposer
    }

    fn ensure_built(
        &self,
        state: &mut SlotState,
        configuration: &CompilerConfiguration,
    ) -> Result<Arc<ApplicationContext>> {
        if let Some(app) = &state.current {
            return Ok(app.clone());
        }
        let app = ApplicationContext::build(&self.disposer, None, configuration.clone(), self.setup.clone())?;
        self.constructions.fetch_add(1, Ordering::SeqCst);
        state.current = Some(app.clone());
        Ok(app)
    }
}

impl std::fmt::Debug for ApplicationSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationSlot")
            .field("state", &self.state())
            .field("constructions", &self.constructions())
            .finish()
    }
}
