//! Scheduler - the resumable, time-sliced driver of a render pass.
//!
//! One cursor, `next_unit_of_work`, lives on the root. Each call to
//! [`work_loop`] runs begin steps from the cursor and unwinds finished
//! subtrees through complete steps, checking the [`Deadline`] between units.
//! When the cursor runs out the finished tree is committed in the same call.
//!
//! A unit (one begin step, or one begin step followed by its unwinding
//! complete steps) is never split, so a later call resumes exactly where the
//! previous one stopped.
//!
//! # Example
//!
//! ```ignore
//! root.render(app)?;
//! loop {
//!     match root.work_loop(&TimeSlice::new(Duration::from_millis(5)))? {
//!         WorkStatus::Yielded => handle_input(),
//!         WorkStatus::Committed | WorkStatus::Idle => break,
//!     }
//! }
//! ```

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::commit::commit_root;
use crate::fiber::{FiberId, Lanes};
use crate::host::HostAdapter;
use crate::reconciler::{begin_work, complete_work};
use crate::root::FiberRoot;
use crate::types::Props;

// =============================================================================
// Deadlines
// =============================================================================

/// Decides when a slice of work should hand control back to the caller.
pub trait Deadline {
    /// Checked after every unit of work.
    fn should_yield(&self) -> bool;
}

/// Wall-clock budget measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct TimeSlice {
    start: Instant,
    budget: Duration,
}

impl TimeSlice {
    pub fn new(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.start.elapsed())
    }
}

impl Deadline for TimeSlice {
    fn should_yield(&self) -> bool {
        self.start.elapsed() >= self.budget
    }
}

/// Yields after a fixed number of units. Deterministic, for tests and
/// for hosts that meter work themselves.
#[derive(Debug)]
pub struct StepBudget {
    remaining: Cell<usize>,
}

impl StepBudget {
    pub fn new(units: usize) -> Self {
        Self {
            remaining: Cell::new(units),
        }
    }
}

impl Deadline for StepBudget {
    fn should_yield(&self) -> bool {
        let left = self.remaining.get().saturating_sub(1);
        self.remaining.set(left);
        left == 0
    }
}

/// Never yields.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl Deadline for Unbounded {
    fn should_yield(&self) -> bool {
        false
    }
}

/// Outcome of one [`work_loop`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkStatus {
    /// Nothing was scheduled.
    Idle,
    /// The deadline expired; more units remain.
    Yielded,
    /// The pass finished and its tree is now current.
    Committed,
}

// =============================================================================
// Work loop
// =============================================================================

/// Run units of work until the pass finishes or the deadline expires.
pub(crate) fn work_loop<H: HostAdapter>(
    root: &mut FiberRoot<H>,
    deadline: &dyn Deadline,
) -> WorkStatus {
    if root.next_unit_of_work.is_none() && root.wip_root.is_none() && !prepare_fresh_stack(root) {
        return WorkStatus::Idle;
    }

    while let Some(unit) = root.next_unit_of_work {
        root.next_unit_of_work = perform_unit_of_work(root, unit);
        if root.next_unit_of_work.is_some() && deadline.should_yield() {
            tracing::trace!(next = ?root.next_unit_of_work, "yielding");
            return WorkStatus::Yielded;
        }
    }

    if root.wip_root.is_some() {
        root.last_commit = Some(commit_root(root));
        return WorkStatus::Committed;
    }
    WorkStatus::Idle
}

/// Start a pass from the current root if a render or state update is pending.
pub(crate) fn prepare_fresh_stack<H: HostAdapter>(root: &mut FiberRoot<H>) -> bool {
    let lanes = root.pending_lanes.replace(Lanes::NO_LANES);
    let children = root.pending_children.take();
    if children.is_none() && lanes.is_empty() {
        return false;
    }

    let props = match children {
        Some(children) => Rc::new(Props::new().with_children(children)),
        None => root.tree[root.current]
            .memoized_props
            .clone()
            .unwrap_or_default(),
    };

    let wip = root.tree.create_work_in_progress(root.current, props);
    root.tree[wip].return_ = None;
    root.render_lanes = lanes | Lanes::DEFAULT;
    root.wip_root = Some(wip);
    root.next_unit_of_work = Some(wip);

    tracing::debug!(?wip, lanes = ?root.render_lanes, "render pass started");
    true
}

/// Begin one fiber; if it is a leaf, complete it and unwind.
fn perform_unit_of_work<H: HostAdapter>(root: &mut FiberRoot<H>, unit: FiberId) -> Option<FiberId> {
    let next = begin_work(root, unit);

    let fiber = &mut root.tree[unit];
    fiber.memoized_props = Some(fiber.pending_props.clone());

    match next {
        Some(child) => Some(child),
        None => complete_unit_of_work(root, unit),
    }
}

/// Complete `unit` and its ancestors until one has an unprocessed sibling.
fn complete_unit_of_work<H: HostAdapter>(
    root: &mut FiberRoot<H>,
    unit: FiberId,
) -> Option<FiberId> {
    let mut completed = unit;
    loop {
        complete_work(root, completed);
        if Some(completed) == root.wip_root {
            return None;
        }
        if let Some(sibling) = root.tree[completed].sibling {
            return Some(sibling);
        }
        completed = root.tree[completed].return_?;
    }
}

// =============================================================================
// Tests
// =============================================================================
