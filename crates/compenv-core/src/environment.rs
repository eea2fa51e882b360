//! Environment facade
//!
//! The entry point compiler drivers use. An [`Environment`] hands out
//! projects in two modes:
//!
//! - **shared**: projects reuse one reference-counted application; the
//!   application goes away when the last project's scope is disposed
//! - **isolated**: every project gets its own application, torn down with
//!   the scope returned alongside it
//!
//! Every operation here emits `start`/`end`/`end_error` lifecycle events.

use std::sync::{Arc, OnceLock};
use std::time::Instant;

use compenv_core_types::NodeId;
use parking_lot::Mutex;

use crate::application::{ApplicationContext, ApplicationLease, ApplicationSlot, ApplicationState};
use crate::builtins::{ApplicationSetup, DefaultSetup};
use crate::config::{keepalive_from_env, CompilerConfiguration};
use crate::disposer::{DisposalSummary, Disposer};
use crate::errors::{EnvError, Result};
use crate::project::ProjectContext;
use crate::source::SourceUnit;
use crate::{log_op_end, log_op_error, log_op_start};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvironmentOptions {
    /// Never release shared leases: the application lives until the process exits
    pub keepalive: bool,
}

impl EnvironmentOptions {
    /// Options from `COMPENV_KEEPALIVE`
    pub fn from_env() -> Self {
        Self {
            keepalive: keepalive_from_env(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentMode {
    Shared,
    Isolated,
}

/// A project plus the node that owns it
#[derive(Debug, Clone)]
pub struct ProjectHandle {
    project: Arc<ProjectContext>,
    mode: EnvironmentMode,
    owner: NodeId,
}

impl ProjectHandle {
    pub fn project(&self) -> &Arc<ProjectContext> {
        &self.project
    }

    pub fn application(&self) -> &Arc<ApplicationContext> {
        self.project.application()
    }

    pub fn mode(&self) -> EnvironmentMode {
        self.mode
    }

    /// Node whose disposal releases this project: the lease node in shared
    /// mode, the scope root in isolated mode
    pub fn owner(&self) -> NodeId {
        self.owner
    }

    /// # Errors
    /// * `AlreadyDisposed` - the project has been disposed
    pub fn add_source_units<I>(&self, units: I) -> Result<usize>
    where
        I: IntoIterator<Item = SourceUnit>,
    {
        log_op_start!("add_source_units", project_id = %self.project.id());
        let start = Instant::now();

        let added = self.project.add_source_units(units).map_err(|e| {
            log_op_error!(
                "add_source_units",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                project_id = %self.project.id()
            );
            e
        })?;

        log_op_end!(
            "add_source_units",
            duration_ms = start.elapsed().as_millis() as u64,
            project_id = %self.project.id(),
            source_units = added
        );
        Ok(added)
    }

    /// # Errors
    /// * `AlreadyDisposed` - the project has been disposed
    pub fn line_count(&self) -> Result<usize> {
        log_op_start!("line_count", project_id = %self.project.id());
        let start = Instant::now();

        let total = self.project.line_count().map_err(|e| {
            log_op_error!(
                "line_count",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                project_id = %self.project.id()
            );
            e
        })?;

        log_op_end!(
            "line_count",
            duration_ms = start.elapsed().as_millis() as u64,
            project_id = %self.project.id(),
            line_count = total
        );
        Ok(total)
    }

    /// Dispose the owner node
    pub fn dispose(&self) -> DisposalSummary {
        self.project.application().disposer().dispose(self.owner)
    }
}

pub struct Environment {
    disposer: Arc<Disposer>,
    slot: Arc<ApplicationSlot>,
    setup: Arc<dyn ApplicationSetup>,
    options: EnvironmentOptions,
}

impl Environment {
    /// Environment with options read from the process environment
    pub fn new(setup: Arc<dyn ApplicationSetup>) -> Self {
        Self::with_options(setup, EnvironmentOptions::from_env())
    }

    pub fn with_options(setup: Arc<dyn ApplicationSetup>, options: EnvironmentOptions) -> Self {
        let disposer = Arc::new(Disposer::new());
        let slot = Arc::new(ApplicationSlot::new(disposer.clone(), setup.clone()));
        Self {
            disposer,
            slot,
            setup,
            options,
        }
    }

    /// Process-wide environment with the default setup
    pub fn global() -> &'static Environment {
        static GLOBAL: OnceLock<Environment> = OnceLock::new();
        GLOBAL.get_or_init(|| Environment::new(Arc::new(DefaultSetup)))
    }

    pub fn options(&self) -> EnvironmentOptions {
        self.options
    }

    pub fn disposer(&self) -> &Arc<Disposer> {
        &self.disposer
    }

    pub fn slot(&self) -> &Arc<ApplicationSlot> {
        &self.slot
    }

    /// New root node for callers to hang projects under
    pub fn new_scope(&self, name: impl Into<String>) -> NodeId {
        self.disposer.new_node(name)
    }

    /// Dispose a scope and everything registered under it
    pub fn dispose_scope(&self, scope: NodeId) -> DisposalSummary {
        log_op_start!("dispose_scope", node_id = scope.get());
        let start = Instant::now();

        let summary = self.disposer.dispose(scope);

        log_op_end!(
            "dispose_scope",
            duration_ms = start.elapsed().as_millis() as u64,
            node_id = scope.get(),
            disposed = summary.disposed,
            failed_hooks = summary.failed_hooks
        );
        summary
    }

    /// Project on the shared application, released with `scope`
    ///
    /// Builds the shared application on first use. Disposing `scope`
    /// disposes the project and returns its lease; the last returned lease
    /// disposes the application.
    ///
    /// # Errors
    /// * `AlreadyDisposed` - `scope` is disposed
    /// * Whatever building the application or project reports
    pub fn create_shared(&self, configuration: &CompilerConfiguration, scope: NodeId) -> Result<ProjectHandle> {
        log_op_start!("create_shared", node_id = scope.get());
        let start = Instant::now();

        let handle = self.create_shared_impl(configuration, scope).map_err(|e| {
            log_op_error!(
                "create_shared",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "create_shared",
            duration_ms = start.elapsed().as_millis() as u64,
            application_id = %handle.application().id(),
            project_id = %handle.project().id(),
            active_projects = self.slot.active_projects()
        );
        Ok(handle)
    }

    fn create_shared_impl(&self, configuration: &CompilerConfiguration, scope: NodeId) -> Result<ProjectHandle> {
        if self.disposer.is_disposed(scope) {
            return Err(EnvError::AlreadyDisposed {
                entity: scope.to_string(),
            });
        }

        let (application, lease) = self.slot.acquire_shared(configuration)?;
        let project = match ProjectContext::build(&application, configuration) {
            Ok(project) => project,
            Err(err) => {
                let _ = self.slot.release(lease);
                return Err(err);
            }
        };

        let lease = Arc::new(Mutex::new(Some(lease)));
        let hook = lease_hook(
            Arc::downgrade(&self.disposer),
            Arc::downgrade(&self.slot),
            project.node(),
            lease.clone(),
            self.options.keepalive,
        );
        let owner = match self
            .disposer
            .new_child(scope, format!("lease {}", project.id()), hook)
        {
            Ok(owner) => owner,
            Err(err) => {
                project.dispose();
                if let Some(lease) = lease.lock().take() {
                    let _ = self.slot.release(lease);
                }
                return Err(err);
            }
        };

        Ok(ProjectHandle {
            project,
            mode: EnvironmentMode::Shared,
            owner,
        })
    }

    /// Project on a private application, plus the scope that owns both
    ///
    /// # Errors
    /// * Whatever building the application or project reports; nothing is left behind
    pub fn create_isolated(&self, configuration: &CompilerConfiguration) -> Result<(ProjectHandle, NodeId)> {
        log_op_start!("create_isolated");
        let start = Instant::now();

        let (handle, scope) = self.create_isolated_impl(configuration).map_err(|e| {
            log_op_error!(
                "create_isolated",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "create_isolated",
            duration_ms = start.elapsed().as_millis() as u64,
            application_id = %handle.application().id(),
            project_id = %handle.project().id(),
            node_id = scope.get()
        );
        Ok((handle, scope))
    }

    fn create_isolated_impl(&self, configuration: &CompilerConfiguration) -> Result<(ProjectHandle, NodeId)> {
        let scope = self.disposer.new_node("isolated scope");
        let built = ApplicationContext::build(
            &self.disposer,
            Some(scope),
            configuration.clone(),
            self.setup.clone(),
        )
        .and_then(|application| ProjectContext::build(&application, configuration));

        match built {
            Ok(project) => Ok((
                ProjectHandle {
                    project,
                    mode: EnvironmentMode::Isolated,
                    owner: scope,
                },
                scope,
            )),
            Err(err) => {
                self.disposer.dispose(scope);
                Err(err)
            }
        }
    }

    pub fn application_state(&self) -> ApplicationState {
        self.slot.state()
    }

    /// Shared applications built so far
    pub fn constructions(&self) -> u64 {
        self.slot.constructions()
    }

    /// Tear down the shared application even if projects still hold it
    pub fn dispose_application(&self) -> Option<DisposalSummary> {
        log_op_start!("dispose_application");
        let start = Instant::now();

        let summary = self.slot.force_dispose();

        log_op_end!(
            "dispose_application",
            duration_ms = start.elapsed().as_millis() as u64,
            disposed = summary.map(|s| s.disposed).unwrap_or(0)
        );
        summary
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("slot", &self.slot)
            .field("options", &self.options)
            .finish()
    }
}

/// Release hook of a shared project's lease node
///
/// Disposes the project, then returns the lease unless `keepalive` is set.
/// The lease sits in a shared cell so a failed registration can still
/// return it.
fn lease_hook(
    disposer: std::sync::Weak<Disposer>,
    slot: std::sync::Weak<ApplicationSlot>,
    project: NodeId,
    lease: Arc<Mutex<Option<ApplicationLease>>>,
    keepalive: bool,
) -> impl FnOnce() -> Result<()> + Send + 'static {
    move || {
        if let Some(disposer) = disposer.upgrade() {
            disposer.dispose(project);
        }
        let Some(lease) = lease.lock().take() else {
            return Ok(());
        };
        if keepalive {
            tracing::debug!(application_id = %lease.application_id(), "keepalive: lease retained");
            return Ok(());
        }
        if let Some(slot) = slot.upgrade() {
            let _ = slot.release(lease);
        }
        Ok(())
    }
}
