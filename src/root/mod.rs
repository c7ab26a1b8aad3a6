//! Root - the context object of one mounted tree and its public entry points.
//!
//! A [`Root`] owns everything a render pass needs: the fiber arena, the
//! host adapter, the scheduler cursor and the committed tree. It is created
//! by [`create_root`], lives as long as the tree is mounted, and is torn
//! down by [`Root::unmount`].
//!
//! # Driving a root
//!
//! ```ignore
//! let host = MemoryHost::new();
//! let container = host.create_container();
//! let root = create_root(host.clone(), container);
//!
//! root.listen_to_all_events()?;
//! root.render(app())?;
//! root.flush_sync()?;                  // or call `work_loop` once per frame
//! ```
//!
//! State updates queued from handlers only mark lanes on the root. The next
//! `work_loop`/`flush_sync` call picks them up.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use spark_signals::{signal, Signal};

use crate::commit::CommitSummary;
use crate::component::ScheduleUpdate;
use crate::config::{EventSystem, RootConfig};
use crate::element::Element;
use crate::error::{FiberError, Result};
use crate::events::delegation::{collect_dispatch_path, dispatch_path};
use crate::events::{NativeEvent, SyntheticEvent};
use crate::fiber::lanes::merge_lanes;
use crate::fiber::{FiberId, FiberTree, Lanes};
use crate::host::{HostAdapter, NativeListener};
use crate::scheduler::{self, prepare_fresh_stack, Deadline, TimeSlice, Unbounded, WorkStatus};
use crate::types::Children;

// =============================================================================
// Root context
// =============================================================================

/// Render state of one root. Borrowed mutably for the duration of a slice.
pub(crate) struct FiberRoot<H: HostAdapter> {
    pub(crate) tree: FiberTree<H::Node>,
    pub(crate) host: H,
    pub(crate) container: H::Node,
    pub(crate) config: RootConfig,

    /// Committed root fiber.
    pub(crate) current: FiberId,
    /// Root fiber of the pass in flight.
    pub(crate) wip_root: Option<FiberId>,
    pub(crate) next_unit_of_work: Option<FiberId>,
    pub(crate) render_lanes: Lanes,
    /// Summary of the most recent commit.
    pub(crate) last_commit: Option<CommitSummary>,

    /// Children requested by `render` and not yet picked up by a pass.
    pub(crate) pending_children: Option<Children>,
    /// Shared with [`RootShared`] so updaters can mark work without a borrow.
    pub(crate) pending_lanes: Rc<Cell<Lanes>>,

    /// Host node → owning committed fiber.
    pub(crate) host_to_fiber: HashMap<H::Node, FiberId>,
    pub(crate) listening: bool,
    pub(crate) delegated: Vec<(String, NativeListener<H::Node>)>,
    pub(crate) direct_listeners: HashMap<(H::Node, String), NativeListener<H::Node>>,

    pub(crate) shared: Weak<RootShared<H>>,
}

impl<H: HostAdapter> FiberRoot<H> {
    fn new(
        host: H,
        container: H::Node,
        config: RootConfig,
        shared: Weak<RootShared<H>>,
        pending_lanes: Rc<Cell<Lanes>>,
    ) -> Self {
        let mut tree = FiberTree::new();
        let current = tree.create_host_root(container.clone());
        Self {
            tree,
            host,
            container,
            config,
            current,
            wip_root: None,
            next_unit_of_work: None,
            render_lanes: Lanes::NO_LANES,
            last_commit: None,
            pending_children: None,
            pending_lanes,
            host_to_fiber: HashMap::new(),
            listening: false,
            delegated: Vec::new(),
            direct_listeners: HashMap::new(),
            shared,
        }
    }

    /// Handle given to class component updaters.
    pub(crate) fn scheduler(&self) -> Weak<dyn ScheduleUpdate> {
        self.shared.clone()
    }

    fn has_pending_work(&self) -> bool {
        self.wip_root.is_some()
            || self.pending_children.is_some()
            || !self.pending_lanes.get().is_empty()
    }
}

/// State reachable from listeners and updaters without owning the root.
pub(crate) struct RootShared<H: HostAdapter> {
    state: RefCell<Option<FiberRoot<H>>>,
    pending_lanes: Rc<Cell<Lanes>>,
    commits: Cell<u64>,
    committed: Signal<u64>,
}

impl<H: HostAdapter> ScheduleUpdate for RootShared<H> {
    fn schedule_update(&self, lane: Lanes) {
        self.pending_lanes.set(merge_lanes(self.pending_lanes.get(), lane));
        tracing::trace!(?lane, "update scheduled");
    }
}

impl<H: HostAdapter> RootShared<H> {
    /// Committed fiber owning `node`, when the root is not busy.
    pub(crate) fn fiber_for_node(&self, node: &H::Node) -> Option<FiberId> {
        let state = self.state.try_borrow().ok()?;
        state.as_ref()?.host_to_fiber.get(node).copied()
    }

    fn dispatch_native(&self, native: &NativeEvent<H::Node>) -> Result<DispatchResult> {
        let (target, path) = {
            let state = self.state.try_borrow().map_err(|_| FiberError::Reentrant)?;
            let root = state.as_ref().ok_or(FiberError::Unmounted)?;
            collect_dispatch_path(root, native)
        };

        let event = SyntheticEvent::new(native.event_type.clone(), native.detail, target);
        let handled = dispatch_path(&event, &path);
        tracing::trace!(event = %native.event_type, handled, "dispatched");

        Ok(DispatchResult {
            target,
            handled,
            propagation_stopped: event.is_propagation_stopped(),
            default_prevented: event.is_default_prevented(),
        })
    }

    fn notify_commits(&self, count: u64) {
        if count == 0 {
            return;
        }
        let total = self.commits.get() + count;
        self.commits.set(total);
        self.committed.set(total);
    }
}

/// Outcome of dispatching one native event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchResult {
    /// Fiber owning the native target, if it belongs to this root.
    pub target: Option<FiberId>,
    /// Handlers invoked.
    pub handled: usize,
    pub propagation_stopped: bool,
    pub default_prevented: bool,
}

// =============================================================================
// Public handle
// =============================================================================

/// Handle to a mounted tree. Clones share the same root.
pub struct Root<H: HostAdapter> {
    shared: Rc<RootShared<H>>,
}

impl<H: HostAdapter> Clone for Root<H> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

/// Create a root rendering into `container` with the default config.
pub fn create_root<H: HostAdapter>(host: H, container: H::Node) -> Root<H> {
    create_root_with_config(host, container, RootConfig::default())
}

pub fn create_root_with_config<H: HostAdapter>(
    host: H,
    container: H::Node,
    config: RootConfig,
) -> Root<H> {
    let pending_lanes = Rc::new(Cell::new(Lanes::NO_LANES));
    let shared = Rc::new_cyclic(|weak: &Weak<RootShared<H>>| RootShared {
        state: RefCell::new(Some(FiberRoot::new(
            host,
            container,
            config,
            weak.clone(),
            pending_lanes.clone(),
        ))),
        pending_lanes,
        commits: Cell::new(0),
        committed: signal(0),
    });
    tracing::debug!("root created");
    Root { shared }
}

impl<H: HostAdapter> Root<H> {
    fn with_root<R>(&self, f: impl FnOnce(&mut FiberRoot<H>) -> R) -> Result<R> {
        let mut state = self
            .shared
            .state
            .try_borrow_mut()
            .map_err(|_| FiberError::Reentrant)?;
        let root = state.as_mut().ok_or(FiberError::Unmounted)?;
        Ok(f(root))
    }

    fn inspect<R>(&self, f: impl FnOnce(&FiberRoot<H>) -> R) -> Result<R> {
        let state = self
            .shared
            .state
            .try_borrow()
            .map_err(|_| FiberError::Reentrant)?;
        let root = state.as_ref().ok_or(FiberError::Unmounted)?;
        Ok(f(root))
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Request `element` as the new content of the container.
    ///
    /// Starts a pass right away when none is in flight; otherwise the element
    /// is picked up by the pass after the current one commits. Nothing is
    /// visible until the pass commits.
    pub fn render(&self, element: Element) -> Result<()> {
        self.render_children(Children::from(element))
    }

    /// Like [`render`](Self::render) for any children value (`Children::None`
    /// clears the container).
    pub fn render_children(&self, children: Children) -> Result<()> {
        self.with_root(|root| {
            root.pending_children = Some(children);
            if root.wip_root.is_none() {
                prepare_fresh_stack(root);
            }
        })
    }

    /// Run one slice of work against `deadline`.
    pub fn work_loop(&self, deadline: &dyn Deadline) -> Result<WorkStatus> {
        let status = self.with_root(|root| scheduler::work_loop(root, deadline))?;
        if status == WorkStatus::Committed {
            self.shared.notify_commits(1);
        }
        Ok(status)
    }

    /// Run one slice bounded by the configured time slice.
    pub fn work_slice(&self) -> Result<WorkStatus> {
        let budget = self.inspect(|root| root.config.time_slice)?;
        self.work_loop(&TimeSlice::new(budget))
    }

    /// Run every pending pass to completion. Returns the number of commits.
    pub fn flush_sync(&self) -> Result<usize> {
        let commits = self.with_root(|root| {
            let mut commits = 0;
            while scheduler::work_loop(root, &Unbounded) == WorkStatus::Committed {
                commits += 1;
            }
            commits
        })?;
        self.shared.notify_commits(commits as u64);
        Ok(commits)
    }

    /// Whether a pass is in flight or a render/update is waiting for one.
    pub fn has_pending_work(&self) -> Result<bool> {
        self.inspect(FiberRoot::has_pending_work)
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Install one delegated listener per tracked event type on the container.
    ///
    /// Idempotent. Does nothing under `EventSystem::Direct`, where handlers
    /// are attached to their own nodes.
    pub fn listen_to_all_events(&self) -> Result<()> {
        let weak = Rc::downgrade(&self.shared);
        self.with_root(|root| {
            if root.listening || root.config.event_system == EventSystem::Direct {
                return;
            }
            root.listening = true;

            let container = root.container.clone();
            for event_type in root.config.tracked_events.clone() {
                let shared = weak.clone();
                let listener: NativeListener<H::Node> =
                    Rc::new(move |native: &NativeEvent<H::Node>| {
                        let Some(shared) = shared.upgrade() else { return };
                        if let Err(err) = shared.dispatch_native(native) {
                            tracing::warn!(
                                event = %native.event_type,
                                %err,
                                "delegated dispatch failed"
                            );
                        }
                    });
                root.host.add_event_listener(&container, &event_type, listener.clone());
                root.delegated.push((event_type, listener));
            }
            tracing::debug!(events = root.delegated.len(), "delegated listeners installed");
        })
    }

    /// Dispatch a native event through the handler props, as the delegated
    /// listener would.
    pub fn dispatch_event(&self, native: &NativeEvent<H::Node>) -> Result<DispatchResult> {
        self.shared.dispatch_native(native)
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Remove everything from the container, uninstall the delegated
    /// listeners and drop the root's state. Later calls return
    /// [`FiberError::Unmounted`].
    pub fn unmount(&self) -> Result<()> {
        let commits = {
            let mut state = self
                .shared
                .state
                .try_borrow_mut()
                .map_err(|_| FiberError::Reentrant)?;
            let root = state.as_mut().ok_or(FiberError::Unmounted)?;

            root.pending_children = Some(Children::None);
            let mut commits = 0;
            while scheduler::work_loop(root, &Unbounded) == WorkStatus::Committed {
                commits += 1;
            }

            let container = root.container.clone();
            for (event_type, listener) in std::mem::take(&mut root.delegated) {
                root.host.remove_event_listener(&container, &event_type, &listener);
            }
            for ((node, event_type), listener) in std::mem::take(&mut root.direct_listeners) {
                root.host.remove_event_listener(&node, &event_type, &listener);
            }

            *state = None;
            commits
        };
        self.shared.notify_commits(commits);
        tracing::debug!("root unmounted");
        Ok(())
    }

    pub fn is_mounted(&self) -> bool {
        self.shared
            .state
            .try_borrow()
            .map(|state| state.is_some())
            .unwrap_or(true)
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Signal bumped after every commit. Effects reading it rerun per commit.
    pub fn commit_signal(&self) -> Signal<u64> {
        self.shared.committed.clone()
    }

    /// Number of commits so far.
    pub fn commit_count(&self) -> u64 {
        self.shared.commits.get()
    }

    pub fn container(&self) -> Result<H::Node> {
        self.inspect(|root| root.container.clone())
    }

    /// Committed root fiber.
    pub fn current(&self) -> Result<FiberId> {
        self.inspect(|root| root.current)
    }

    /// What the most recent commit did, `None` before the first one.
    pub fn last_commit(&self) -> Result<Option<CommitSummary>> {
        self.inspect(|root| root.last_commit)
    }

    /// Root fiber of the pass in flight.
    pub fn work_in_progress(&self) -> Result<Option<FiberId>> {
        self.inspect(|root| root.wip_root)
    }

    /// Host node owned by a fiber (e.g. the one a [`NodeRef`](crate::NodeRef) points at).
    pub fn host_node(&self, fiber: FiberId) -> Result<H::Node> {
        self.inspect(|root| root.tree.get(fiber).and_then(|f| f.host_node().cloned()))?
            .ok_or(FiberError::UnknownFiber(fiber))
    }

    /// Committed fiber owning a host node.
    pub fn fiber_for_node(&self, node: &H::Node) -> Result<Option<FiberId>> {
        self.inspect(|root| root.host_to_fiber.get(node).copied())
    }

    /// Read-only access to the fiber arena.
    pub fn with_tree<R>(&self, f: impl FnOnce(&FiberTree<H::Node>) -> R) -> Result<R> {
        self.inspect(|root| f(&root.tree))
    }
}

// =============================================================================
// Tests
// =============================================================================
