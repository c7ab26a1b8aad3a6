//! Components - function and class element types.
//!
//! A function component is a pure `props -> children` closure. A class
//! component is constructed once per mounted position and keeps local state
//! that evolves through queued updates.
//!
//! # Example
//!
//! ```ignore
//! struct Counter;
//!
//! impl Component for Counter {
//!     fn initial_state(&self, _props: &Props) -> StateMap {
//!         StateMap::new().with("count", 0)
//!     }
//!
//!     fn render(&self, cx: &RenderContext<'_>) -> Children {
//!         let count = cx.state().get_int("count").unwrap_or(0);
//!         let updater = cx.updater().clone();
//!         h("button", Props::new().on("onClick", move |_| {
//!             updater.set_state(StateMap::new().with("count", count + 1));
//!         }), vec![count.into()]).into()
//!     }
//! }
//!
//! let counter = ClassComponent::new("Counter", |_props| Counter);
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::fiber::lanes::Lanes;
use crate::fiber::update_queue::{SharedUpdateQueue, Update, UpdateQueue};
use crate::fiber::FiberId;
use crate::types::{Children, Props, StateMap};

// =============================================================================
// Function Components
// =============================================================================

/// A function component. Identity (not name) decides whether two elements
/// have the same type, so create each component once and clone it.
#[derive(Clone)]
pub struct FunctionComponent {
    name: &'static str,
    render: Rc<dyn Fn(&Props) -> Children>,
}

impl FunctionComponent {
    pub fn new<F>(name: &'static str, render: F) -> Self
    where
        F: Fn(&Props) -> Children + 'static,
    {
        Self {
            name,
            render: Rc::new(render),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn call(&self, props: &Props) -> Children {
        (self.render)(props)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.render, &other.render)
    }
}

impl fmt::Debug for FunctionComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionComponent({})", self.name)
    }
}

// =============================================================================
// Class Components
// =============================================================================

/// Behaviour of a class component instance.
pub trait Component {
    /// State the instance starts with.
    fn initial_state(&self, _props: &Props) -> StateMap {
        StateMap::new()
    }

    fn render(&self, cx: &RenderContext<'_>) -> Children;
}

/// A class component type: a constructor for [`Component`] instances.
#[derive(Clone)]
pub struct ClassComponent {
    name: &'static str,
    construct: Rc<dyn Fn(&Props) -> Box<dyn Component>>,
}

impl ClassComponent {
    pub fn new<C, F>(name: &'static str, construct: F) -> Self
    where
        C: Component + 'static,
        F: Fn(&Props) -> C + 'static,
    {
        Self {
            name,
            construct: Rc::new(move |props| Box::new(construct(props)) as Box<dyn Component>),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn construct(&self, props: &Props) -> Box<dyn Component> {
        (self.construct)(props)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.construct, &other.construct)
    }
}

impl fmt::Debug for ClassComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassComponent({})", self.name)
    }
}

/// What a class component sees while rendering.
pub struct RenderContext<'a> {
    props: &'a Props,
    state: &'a StateMap,
    updater: &'a Updater,
}

impl<'a> RenderContext<'a> {
    pub(crate) fn new(props: &'a Props, state: &'a StateMap, updater: &'a Updater) -> Self {
        Self {
            props,
            state,
            updater,
        }
    }

    pub fn props(&self) -> &Props {
        self.props
    }

    pub fn state(&self) -> &StateMap {
        self.state
    }

    /// Handle for queueing state updates, cloneable into event handlers.
    pub fn updater(&self) -> &Updater {
        self.updater
    }
}

/// A mounted class component instance, shared by both generations of its fiber.
pub struct ClassInstance {
    component: Box<dyn Component>,
    owner: Cell<FiberId>,
    updater: Updater,
}

impl ClassInstance {
    pub(crate) fn new(component: Box<dyn Component>, owner: FiberId, updater: Updater) -> Self {
        Self {
            component,
            owner: Cell::new(owner),
            updater,
        }
    }

    /// Fiber this instance was last rendered from.
    pub fn owner(&self) -> FiberId {
        self.owner.get()
    }

    pub(crate) fn bind(&self, owner: FiberId) {
        self.owner.set(owner);
    }

    pub fn updater(&self) -> &Updater {
        &self.updater
    }

    pub(crate) fn initial_state(&self, props: &Props) -> StateMap {
        self.component.initial_state(props)
    }

    pub(crate) fn render(&self, props: &Props, state: &StateMap) -> Children {
        let cx = RenderContext::new(props, state, &self.updater);
        self.component.render(&cx)
    }
}

impl fmt::Debug for ClassInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassInstance")
            .field("owner", &self.owner.get())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Updater
// =============================================================================

/// Receiver of "this root has pending work" notifications.
pub(crate) trait ScheduleUpdate {
    fn schedule_update(&self, lane: Lanes);
}

/// Queues state updates for one class component instance.
///
/// Updates are applied oldest-first the next time the instance renders.
/// Queueing never touches the fiber tree, so it is safe from event handlers
/// and from inside a render.
#[derive(Clone)]
pub struct Updater {
    queue: SharedUpdateQueue,
    scheduler: Weak<dyn ScheduleUpdate>,
}

impl Updater {
    pub(crate) fn new(scheduler: Weak<dyn ScheduleUpdate>) -> Self {
        Self {
            queue: Rc::new(RefCell::new(UpdateQueue::new())),
            scheduler,
        }
    }

    pub(crate) fn queue(&self) -> &SharedUpdateQueue {
        &self.queue
    }

    /// Shallow-merge `partial` into the state.
    pub fn set_state(&self, partial: StateMap) {
        self.enqueue(Update::Merge(partial));
    }

    /// Merge the result of `f(previous_state)` into the state.
    pub fn update_state<F>(&self, f: F)
    where
        F: Fn(&StateMap) -> StateMap + 'static,
    {
        self.enqueue(Update::Apply(Rc::new(f)));
    }

    fn enqueue(&self, update: Update) {
        let lane = Lanes::DEFAULT;
        self.queue.borrow_mut().push(update, lane);
        match self.scheduler.upgrade() {
            Some(scheduler) => scheduler.schedule_update(lane),
            None => tracing::debug!("state update queued on an unmounted root"),
        }
    }

    /// Number of updates not yet applied.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }
}

impl fmt::Debug for Updater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Updater")
            .field("pending", &self.pending())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder {
        lanes: Cell<Lanes>,
    }

    impl ScheduleUpdate for Recorder {
        fn schedule_update(&self, lane: Lanes) {
            self.lanes.set(self.lanes.get() | lane);
        }
    }

    #[test]
    fn test_function_component_identity() {
        let a = FunctionComponent::new("A", |_| Children::None);
        let b = FunctionComponent::new("A", |_| Children::None);
        assert!(a.ptr_eq(&a.clone()));
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn test_updater_schedules_root() {
        let recorder = Rc::new(Recorder {
            lanes: Cell::new(Lanes::NO_LANES),
        });
        let weak: Weak<dyn ScheduleUpdate> = Rc::downgrade(&recorder) as Weak<dyn ScheduleUpdate>;
        let updater = Updater::new(weak);

        updater.set_state(StateMap::new().with("count", 1));
        assert_eq!(updater.pending(), 1);
        assert_eq!(recorder.lanes.get(), Lanes::DEFAULT);
    }

    #[test]
    fn test_updater_without_root_still_queues() {
        let weak: Weak<dyn ScheduleUpdate> = Weak::<Recorder>::new();
        let updater = Updater::new(weak);
        updater.set_state(StateMap::new());
        assert_eq!(updater.pending(), 1);
    }
}
