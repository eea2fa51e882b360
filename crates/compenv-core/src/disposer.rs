//! Disposal tree
//!
//! An arena of cleanup nodes. A parent owns the ids of its children, a child
//! only keeps the id of its parent for detaching. Disposing a node disposes
//! its children first (in registration order), then runs the node's own
//! release hook, then detaches it from its parent and drops it from the
//! arena. Every node is released at most once.
//!
//! A cascade that reaches a node another thread is already disposing waits
//! until that node is gone, so a parent hook never runs ahead of a child's.
//! A hook that re-enters disposal on its own thread does not wait.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread::{self, ThreadId};

use compenv_core_types::NodeId;
use parking_lot::{Condvar, Mutex};

use crate::errors::{EnvError, Result};

/// Cleanup action attached to a node
pub type ReleaseHook = Box<dyn FnOnce() -> Result<()> + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
    Live,
    Disposing(ThreadId),
}

struct Node {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    hook: Option<ReleaseHook>,
    state: NodeState,
}

#[derive(Default)]
struct Arena {
    nodes: HashMap<NodeId, Node>,
    next_id: u64,
}

impl Arena {
    fn allocate(&mut self, name: String, hook: Option<ReleaseHook>) -> NodeId {
        self.next_id += 1;
        let id = NodeId::new(self.next_id);
        self.nodes.insert(
            id,
            Node {
                name,
                parent: None,
                children: Vec::new(),
                hook,
                state: NodeState::Live,
            },
        );
        id
    }

    fn live(&self, id: NodeId) -> Result<&Node> {
        match self.nodes.get(&id) {
            Some(node) if node.state == NodeState::Live => Ok(node),
            _ => Err(EnvError::AlreadyDisposed {
                entity: id.to_string(),
            }),
        }
    }

    /// True if `ancestor` is `id` or sits on the parent chain above it
    fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.nodes.get(&current).and_then(|n| n.parent);
        }
        false
    }

    fn detach(&mut self, id: NodeId, parent: NodeId) {
        if let Some(parent) = self.nodes.get_mut(&parent) {
            parent.children.retain(|c| *c != id);
        }
    }
}

/// What one `dispose` call released
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisposalSummary {
    /// Nodes released by this call, including the target
    pub disposed: usize,
    /// Hooks that returned an error or panicked
    pub failed_hooks: usize,
}

impl DisposalSummary {
    pub fn is_empty(&self) -> bool {
        self.disposed == 0
    }
}

/// Arena-backed disposal tree
///
/// Safe to share between threads. Hooks always run with the arena unlocked,
/// so a hook may create, register or dispose other nodes.
#[derive(Default)]
pub struct Disposer {
    arena: Mutex<Arena>,
    /// Signalled whenever a node leaves the arena
    released: Condvar,
}

impl Disposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a root node without a release hook
    pub fn new_node(&self, name: impl Into<String>) -> NodeId {
        self.arena.lock().allocate(name.into(), None)
    }

    /// Create a root node that runs `hook` when disposed
    pub fn new_node_with_hook<F>(&self, name: impl Into<String>, hook: F) -> NodeId
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.arena.lock().allocate(name.into(), Some(Box::new(hook)))
    }

    /// Attach `child` under `parent`
    ///
    /// A child that already has a parent is moved.
    ///
    /// # Errors
    /// * `AlreadyDisposed` - parent or child is disposed or being disposed
    /// * `InvalidRegistration` - parent is the child itself or one of its descendants
    pub fn register(&self, child: NodeId, parent: NodeId) -> Result<()> {
        let mut arena = self.arena.lock();
        arena.live(parent)?;
        let previous = arena.live(child)?.parent;

        if arena.is_ancestor(child, parent) {
            return Err(EnvError::InvalidRegistration {
                child,
                parent,
                reason: "parent is the node itself or one of its descendants".to_string(),
            });
        }

        if let Some(previous) = previous {
            if previous == parent {
                return Ok(());
            }
            arena.detach(child, previous);
        }

        if let Some(node) = arena.nodes.get_mut(&parent) {
            node.children.push(child);
        }
        if let Some(node) = arena.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }

        tracing::debug!(
            node_id = child.get(),
            parent_id = parent.get(),
            "registered disposable"
        );
        Ok(())
    }

    /// Create a node and attach it under `parent` in one step
    ///
    /// # Errors
    /// * `AlreadyDisposed` - parent is disposed or being disposed
    pub fn new_child<F>(&self, parent: NodeId, name: impl Into<String>, hook: F) -> Result<NodeId>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        let mut arena = self.arena.lock();
        arena.live(parent)?;
        let id = arena.allocate(name.into(), Some(Box::new(hook)));
        if let Some(node) = arena.nodes.get_mut(&id) {
            node.parent = Some(parent);
        }
        if let Some(node) = arena.nodes.get_mut(&parent) {
            node.children.push(id);
        }
        Ok(id)
    }

    /// Dispose `id` and everything registered under it
    ///
    /// Unknown or already disposed nodes are a no-op.
    pub fn dispose(&self, id: NodeId) -> DisposalSummary {
        let mut summary = DisposalSummary::default();
        self.dispose_into(id, &mut summary);
        summary
    }

    fn dispose_into(&self, id: NodeId, summary: &mut DisposalSummary) {
        let me = thread::current().id();
        let children = {
            let mut arena = self.arena.lock();
            loop {
                let Some(state) = arena.nodes.get(&id).map(|n| n.state) else {
                    return;
                };
                match state {
                    NodeState::Live => break,
                    NodeState::Disposing(owner) if owner == me => return,
                    NodeState::Disposing(_) => self.released.wait(&mut arena),
                }
            }
            match arena.nodes.get_mut(&id) {
                Some(node) => {
                    node.state = NodeState::Disposing(me);
                    node.children.clone()
                }
                None => return,
            }
        };

        for child in children {
            self.dispose_into(child, summary);
        }

        let (name, hook) = {
            let mut arena = self.arena.lock();
            match arena.nodes.get_mut(&id) {
                Some(node) => (node.name.clone(), node.hook.take()),
                None => return,
            }
        };

        if let Some(hook) = hook {
            let failure = match catch_unwind(AssertUnwindSafe(hook)) {
                Ok(Ok(())) => None,
                Ok(Err(err)) => Some(err.to_string()),
                Err(_) => Some("release hook panicked".to_string()),
            };
            if let Some(reason) = failure {
                summary.failed_hooks += 1;
                tracing::warn!(node_id = id.get(), node = %name, %reason, "release hook failed");
            }
        }

        {
            let mut arena = self.arena.lock();
            if let Some(node) = arena.nodes.remove(&id) {
                if let Some(parent) = node.parent {
                    arena.detach(id, parent);
                }
            }
        }
        self.released.notify_all();
        summary.disposed += 1;
        tracing::debug!(node_id = id.get(), node = %name, "disposed");
    }

    /// True once disposal of `id` has started (or `id` was never allocated here)
    pub fn is_disposed(&self, id: NodeId) -> bool {
        self.arena.lock().live(id).is_err()
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.arena.lock().nodes.get(&id).and_then(|n| n.parent)
    }

    /// Children of `id` in registration order
    pub fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        self.arena
            .lock()
            .nodes
            .get(&id)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn name_of(&self, id: NodeId) -> Option<String> {
        self.arena.lock().nodes.get(&id).map(|n| n.name.clone())
    }

    /// Number of nodes not yet released
    pub fn live_nodes(&self) -> usize {
        self.arena.lock().nodes.len()
    }
}

impl std::fmt::Debug for Disposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Disposer")
            .field("live_nodes", &self.live_nodes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{mpsc, Arc};
    use std::time::Duration;

    fn recording_hook(
        log: &Arc<Mutex<Vec<&'static str>>>,
        label: &'static str,
    ) -> impl FnOnce() -> Result<()> + Send + 'static {
        let log = log.clone();
        move || {
            log.lock().push(label);
            Ok(())
        }
    }

    #[test]
    fn test_children_released_before_parent_in_order() {
        let disposer = Disposer::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let root = disposer.new_node_with_hook("root", recording_hook(&log, "root"));
        let a = disposer.new_node_with_hook("a", recording_hook(&log, "a"));
        let b = disposer.new_node_with_hook("b", recording_hook(&log, "b"));
        let a1 = disposer.new_node_with_hook("a1", recording_hook(&log, "a1"));
        disposer.register(a, root).unwrap();
        disposer.register(b, root).unwrap();
        disposer.register(a1, a).unwrap();

        let summary = disposer.dispose(root);

        assert_eq!(summary.disposed, 4);
        assert_eq!(*log.lock(), vec!["a1", "a", "b", "root"]);
        assert_eq!(disposer.live_nodes(), 0);
    }

    #[test]
    fn test_double_dispose_is_noop() {
        let disposer = Disposer::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let node = disposer.new_node_with_hook("n", recording_hook(&log, "n"));

        assert_eq!(disposer.dispose(node).disposed, 1);
        assert!(disposer.dispose(node).is_empty());
        assert_eq!(log.lock().len(), 1);
        assert!(disposer.is_disposed(node));
    }

    #[test]
    fn test_register_under_disposed_parent_fails() {
        let disposer = Disposer::new();
        let parent = disposer.new_node("parent");
        let child = disposer.new_node("child");
        disposer.dispose(parent);

        let result = disposer.register(child, parent);
        assert!(matches!(result, Err(EnvError::AlreadyDisposed { .. })));
    }

    #[test]
    fn test_disposing_child_detaches_it() {
        let disposer = Disposer::new();
        let parent = disposer.new_node("parent");
        let child = disposer.new_child(parent, "child", || Ok(())).unwrap();

        assert_eq!(disposer.children_of(parent), vec![child]);
        disposer.dispose(child);
        assert!(disposer.children_of(parent).is_empty());
        assert!(!disposer.is_disposed(parent));
    }

    #[test]
    fn test_register_moves_child_between_parents() {
        let disposer = Disposer::new();
        let first = disposer.new_node("first");
        let second = disposer.new_node("second");
        let child = disposer.new_node("child");

        disposer.register(child, first).unwrap();
        disposer.register(child, second).unwrap();

        assert!(disposer.children_of(first).is_empty());
        assert_eq!(disposer.children_of(second), vec![child]);
        assert_eq!(disposer.parent_of(child), Some(second));
    }

    #[test]
    fn test_register_rejects_cycles() {
        let disposer = Disposer::new();
        let top = disposer.new_node("top");
        let below = disposer.new_child(top, "below", || Ok(())).unwrap();

        assert!(matches!(
            disposer.register(top, below),
            Err(EnvError::InvalidRegistration { .. })
        ));
        assert!(matches!(
            disposer.register(top, top),
            Err(EnvError::InvalidRegistration { .. })
        ));
    }

    #[test]
    fn test_failing_hooks_do_not_stop_disposal() {
        let disposer = Disposer::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let root = disposer.new_node_with_hook("root", recording_hook(&log, "root"));
        disposer
            .new_child(root, "err", || {
                Err(EnvError::Internal {
                    message: "nope".to_string(),
                })
            })
            .unwrap();
        disposer
            .new_child(root, "panics", || panic!("hook exploded"))
            .unwrap();

        let summary = disposer.dispose(root);

        assert_eq!(summary.disposed, 3);
        assert_eq!(summary.failed_hooks, 2);
        assert_eq!(*log.lock(), vec!["root"]);
        assert_eq!(disposer.live_nodes(), 0);
    }

    #[test]
    fn test_hook_may_dispose_other_nodes() {
        let disposer = Arc::new(Disposer::new());
        let other = disposer.new_node("other");
        let weak = Arc::downgrade(&disposer);
        let trigger = disposer.new_node_with_hook("trigger", move || {
            if let Some(d) = weak.upgrade() {
                d.dispose(other);
            }
            Ok(())
        });

        disposer.dispose(trigger);
        assert!(disposer.is_disposed(other));
    }

    #[test]
    fn test_cascade_waits_for_child_disposed_on_another_thread() {
        let disposer = Arc::new(Disposer::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let (entered_tx, entered_rx) = mpsc::channel();
        let (resume_tx, resume_rx) = mpsc::channel::<()>();

        let root = disposer.new_node_with_hook("root", recording_hook(&log, "root"));
        let child_log = log.clone();
        let child = disposer
            .new_child(root, "child", move || {
                entered_tx.send(()).ok();
                resume_rx.recv().ok();
                child_log.lock().push("child");
                Ok(())
            })
            .unwrap();

        // the child's hook is in flight on its own thread
        let explicit = {
            let disposer = disposer.clone();
            thread::spawn(move || disposer.dispose(child))
        };
        entered_rx.recv().unwrap();

        let cascade = {
            let disposer = disposer.clone();
            thread::spawn(move || disposer.dispose(root))
        };
        thread::sleep(Duration::from_millis(50));
        assert!(log.lock().is_empty(), "root hook ran while child was in flight");

        resume_tx.send(()).unwrap();
        let explicit = explicit.join().unwrap();
        let cascade = cascade.join().unwrap();

        assert_eq!(*log.lock(), vec!["child", "root"]);
        assert_eq!(explicit.disposed, 1);
        assert_eq!(cascade.disposed, 1);
        assert_eq!(disposer.live_nodes(), 0);
    }

    #[test]
    fn test_hook_disposing_its_own_ancestor_does_not_block() {
        let disposer = Arc::new(Disposer::new());
        let root = disposer.new_node("root");
        let weak = Arc::downgrade(&disposer);
        disposer
            .new_child(root, "child", move || {
                if let Some(d) = weak.upgrade() {
                    assert!(d.dispose(root).is_empty());
                }
                Ok(())
            })
            .unwrap();

        let summary = disposer.dispose(root);
        assert_eq!(summary.disposed, 2);
        assert_eq!(summary.failed_hooks, 0);
        assert_eq!(disposer.live_nodes(), 0);
    }

    #[test]
    fn test_unknown_node_reports_disposed() {
        let disposer = Disposer::new();
        assert!(disposer.is_disposed(NodeId::new(42)));
        assert!(disposer.dispose(NodeId::new(42)).is_empty());
    }
}
