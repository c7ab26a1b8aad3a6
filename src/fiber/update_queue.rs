//! Update queue - pending state updates of a class component.
//!
//! Updates drain strictly in insertion order (oldest first). The queue is a
//! plain `VecDeque`, so draining always terminates.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use super::lanes::{merge_lanes, Lanes};
use crate::types::StateMap;

/// Queue shared by the instance's updater and both fiber generations.
pub type SharedUpdateQueue = Rc<RefCell<UpdateQueue>>;

/// A single state update.
#[derive(Clone)]
pub enum Update {
    /// Shallow-merge this partial state.
    Merge(StateMap),
    /// Merge the result of calling this with the state so far.
    Apply(Rc<dyn Fn(&StateMap) -> StateMap>),
}

impl fmt::Debug for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Update::Merge(partial) => f.debug_tuple("Merge").field(partial).finish(),
            Update::Apply(_) => f.write_str("Apply(..)"),
        }
    }
}

#[derive(Debug)]
struct QueuedUpdate {
    update: Update,
    lane: Lanes,
}

#[derive(Debug, Default)]
pub struct UpdateQueue {
    pending: VecDeque<QueuedUpdate>,
}

impl UpdateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, update: Update, lane: Lanes) {
        self.pending.push_back(QueuedUpdate { update, lane });
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Lanes of every queued update.
    pub fn pending_lanes(&self) -> Lanes {
        self.pending
            .iter()
            .fold(Lanes::NO_LANES, |acc, queued| merge_lanes(acc, queued.lane))
    }

    /// Drain every queued update into `base`, oldest first.
    pub fn process(&mut self, base: &StateMap) -> StateMap {
        let mut state = base.clone();
        while let Some(queued) = self.pending.pop_front() {
            match queued.update {
                Update::Merge(partial) => state.merge(partial),
                Update::Apply(f) => {
                    let partial = f(&state);
                    state.merge(partial);
                }
            }
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_in_insertion_order() {
        let mut queue = UpdateQueue::new();
        queue.push(Update::Merge(StateMap::new().with("n", 1)), Lanes::DEFAULT);
        queue.push(Update::Merge(StateMap::new().with("n", 2)), Lanes::DEFAULT);
        queue.push(
            Update::Apply(Rc::new(|s: &StateMap| {
                StateMap::new().with("n", s.get_int("n").unwrap_or(0) * 10)
            })),
            Lanes::DEFAULT,
        );

        let state = queue.process(&StateMap::new().with("n", 0).with("label", "x"));
        assert_eq!(state.get_int("n"), Some(20));
        assert!(state.get("label").is_some());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pending_lanes() {
        let mut queue = UpdateQueue::new();
        assert_eq!(queue.pending_lanes(), Lanes::NO_LANES);
        queue.push(Update::Merge(StateMap::new()), Lanes::DEFAULT);
        assert_eq!(queue.pending_lanes(), Lanes::DEFAULT);
    }
}
