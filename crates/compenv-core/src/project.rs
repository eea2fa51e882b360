//! Project context
//!
//! One per compilation. A project sits in the disposal tree under its
//! application's root node, so it is always released before the
//! application it was built from.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use compenv_core_types::{NodeId, ProjectId};
use parking_lot::Mutex;

use crate::application::ApplicationContext;
use crate::builtins::FileTypeBinding;
use crate::config::CompilerConfiguration;
use crate::disposer::DisposalSummary;
use crate::errors::{EnvError, Result};
use crate::extensions::{ExtensionArea, ExtensionPointId, ExtensionScope};
use crate::services::ServiceRegistry;
use crate::source::SourceUnit;

#[derive(Default)]
struct SourceSet {
    units: Vec<Arc<SourceUnit>>,
    /// Bumped on every mutation of `units`
    generation: u64,
    /// `(generation, total)` of the last computed line count
    cached_lines: Option<(u64, usize)>,
}

pub struct ProjectContext {
    id: ProjectId,
    node: NodeId,
    application: Arc<ApplicationContext>,
    configuration: CompilerConfiguration,
    extensions: Arc<ExtensionArea>,
    services: Arc<ServiceRegistry>,
    sources: Arc<Mutex<SourceSet>>,
    disposed: Arc<AtomicBool>,
}

impl ProjectContext {
    /// Build a project under `application`
    ///
    /// `configuration` is copied; later changes to the caller's value are
    /// not seen by the project.
    ///
    /// # Errors
    /// * `AlreadyDisposed` - the application has been disposed
    /// * Any registry error raised by the setup
    pub fn build(application: &Arc<ApplicationContext>, configuration: &CompilerConfiguration) -> Result<Arc<Self>> {
        let id = ProjectId::new();
        let extensions = Arc::new(ExtensionArea::new(ExtensionScope::Project));
        let services = Arc::new(ServiceRegistry::new());
        let sources = Arc::new(Mutex::new(SourceSet::default()));
        let disposed = Arc::new(AtomicBool::new(false));

        application.setup().declare_project_points(&extensions)?;

        let hook = {
            let extensions = extensions.clone();
            let services = services.clone();
            let sources = sources.clone();
            let disposed = disposed.clone();
            let id = id.clone();
            move || {
                {
                    let mut set = sources.lock();
                    disposed.store(true, Ordering::SeqCst);
                    set.units.clear();
                    set.generation += 1;
                    set.cached_lines = None;
                }
                extensions.clear();
                services.clear();
                tracing::debug!(project_id = %id, "project context released");
                Ok(())
            }
        };
        let node = application
            .disposer()
            .new_child(application.root(), format!("project {}", id), hook)?;

        let project = Arc::new(Self {
            id,
            node,
            application: application.clone(),
            configuration: configuration.clone(),
            extensions,
            services,
            sources,
            disposed,
        });

        if let Err(err) = application.setup().register_project_services(&project) {
            project.dispose();
            return Err(err);
        }

        tracing::debug!(
            project_id = %project.id,
            application_id = %application.id(),
            node_id = node.get(),
            "project context built"
        );
        Ok(project)
    }

    pub fn id(&self) -> &ProjectId {
        &self.id
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn application(&self) -> &Arc<ApplicationContext> {
        &self.application
    }

    pub fn configuration(&self) -> &CompilerConfiguration {
        &self.configuration
    }

    pub fn extensions(&self) -> &Arc<ExtensionArea> {
        &self.extensions
    }

    pub fn services(&self) -> &Arc<ServiceRegistry> {
        &self.services
    }

    /// Append source units; duplicates are kept
    ///
    /// Returns the number of units added.
    ///
    /// # Errors
    /// * `AlreadyDisposed` - the project has been disposed
    pub fn add_source_units<I>(&self, units: I) -> Result<usize>
    where
        I: IntoIterator<Item = SourceUnit>,
    {
        let mut set = self.sources.lock();
        self.ensure_live()?;

        let before = set.units.len();
        set.units.extend(units.into_iter().map(Arc::new));
        let added = set.units.len() - before;
        if added > 0 {
            set.generation += 1;
        }
        Ok(added)
    }

    /// Total lines over all source units
    ///
    /// Cached until the next mutation of the unit list.
    ///
    /// # Errors
    /// * `AlreadyDisposed` - the project has been disposed
    pub fn line_count(&self) -> Result<usize> {
        let mut set = self.sources.lock();
        self.ensure_live()?;

        if let Some((generation, total)) = set.cached_lines {
            if generation == set.generation {
                return Ok(total);
            }
        }
        let total = set.units.iter().map(|u| u.line_count()).sum();
        set.cached_lines = Some((set.generation, total));
        Ok(total)
    }

    /// Mutation counter of the unit list
    pub fn generation(&self) -> u64 {
        self.sources.lock().generation
    }

    /// Units in the order they were added
    pub fn source_units(&self) -> Vec<Arc<SourceUnit>> {
        self.sources.lock().units.clone()
    }

    pub fn file_type_of(&self, unit: &SourceUnit) -> Option<&FileTypeBinding> {
        self.application.file_types().resolve(&unit.path)
    }

    /// Project extensions at `point` followed by the application's
    pub fn lookup_chained<E>(&self, point: &ExtensionPointId<E>) -> Vec<Arc<E>>
    where
        E: ?Sized + Send + Sync + 'static,
    {
        let mut found = self.extensions.lookup(point);
        found.extend(self.application.extensions().lookup(point));
        found
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Dispose this project's node; the application is untouched
    pub fn dispose(&self) -> DisposalSummary {
        self.application.disposer().dispose(self.node)
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_disposed() {
            return Err(EnvError::AlreadyDisposed {
                entity: format!("project {}", self.id),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for ProjectContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectContext")
            .field("id", &self.id)
            .field("node", &self.node)
            .field("application", self.application.id())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
