//! Children diff - match new child descriptions against the current children.
//!
//! # Algorithm
//!
//! 1. Walk both lists in lockstep while keys agree. Same type reuses the old
//!    fiber's alternate; a different type replaces it.
//! 2. If the new list ran out, the remaining old children are deleted.
//! 3. If the old list ran out, the remaining new children are created.
//! 4. Otherwise the remaining old children are mapped by key (by index when
//!    unkeyed). Matches are reused, the rest created, leftovers deleted.
//!
//! A reused child whose old index sits before the last placed index moved
//! left and is tagged `PLACEMENT`; so is every new child. Effects are only
//! recorded when the parent already has a current twin.

use std::collections::HashMap;
use std::rc::Rc;

use crate::fiber::{FiberId, FiberTag, FiberTree, Flags};
use crate::host::HostAdapter;
use crate::root::FiberRoot;
use crate::types::{Child, Children, Key, Props};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum SlotKey {
    Key(Key),
    Index(usize),
}

fn child_key(child: &Child) -> Option<&Key> {
    match child {
        Child::Element(element) => element.key.as_ref(),
        Child::Text(_) => None,
    }
}

/// Whether the old fiber can be updated in place to `child`.
fn same_type<N: Clone>(tree: &FiberTree<N>, old: FiberId, child: &Child) -> bool {
    match child {
        Child::Element(element) => tree[old]
            .element_type
            .as_ref()
            .is_some_and(|ty| ty.same_type(&element.element_type)),
        Child::Text(_) => tree[old].tag == FiberTag::HostText,
    }
}

fn flatten(children: Children) -> Vec<Child> {
    match children {
        Children::None => Vec::new(),
        Children::Text(text) => vec![Child::Text(text)],
        Children::Nodes(list) => list,
    }
}

/// Diff `children` against the current children starting at `current_first`
/// and link the resulting fibers under `parent`. Returns the first child.
pub(crate) fn reconcile_children<H: HostAdapter>(
    root: &mut FiberRoot<H>,
    parent: FiberId,
    current_first: Option<FiberId>,
    children: Children,
    track_side_effects: bool,
) -> Option<FiberId> {
    let mut cx = ChildReconciler {
        root,
        parent,
        track: track_side_effects,
    };
    let new_children = flatten(children);

    let mut old = Vec::new();
    let mut next = current_first;
    while let Some(id) = next {
        old.push(id);
        next = cx.root.tree[id].sibling;
    }

    let mut result: Vec<FiberId> = Vec::with_capacity(new_children.len());
    let mut last_placed = 0;
    let mut old_idx = 0;
    let mut new_idx = 0;

    // Lockstep while keys agree
    while old_idx < old.len() && new_idx < new_children.len() {
        let old_fiber = old[old_idx];
        let child = &new_children[new_idx];
        if cx.root.tree[old_fiber].key.as_ref() != child_key(child) {
            break;
        }
        let fiber = if same_type(&cx.root.tree, old_fiber, child) {
            cx.use_fiber(old_fiber, child)
        } else {
            cx.delete_child(old_fiber);
            cx.create_child(child)
        };
        last_placed = cx.place_child(fiber, last_placed, new_idx);
        result.push(fiber);
        old_idx += 1;
        new_idx += 1;
    }

    if new_idx == new_children.len() {
        for &old_fiber in &old[old_idx..] {
            cx.delete_child(old_fiber);
        }
        return cx.link(result);
    }

    if old_idx == old.len() {
        for (i, child) in new_children.iter().enumerate().skip(new_idx) {
            let fiber = cx.create_child(child);
            last_placed = cx.place_child(fiber, last_placed, i);
            result.push(fiber);
        }
        return cx.link(result);
    }

    // Keyed lookup for the rest
    let mut existing: HashMap<SlotKey, FiberId> = HashMap::new();
    for &old_fiber in &old[old_idx..] {
        let fiber = &cx.root.tree[old_fiber];
        let slot = match &fiber.key {
            Some(key) => SlotKey::Key(key.clone()),
            None => SlotKey::Index(fiber.index),
        };
        // Duplicate key: the later sibling wins the slot, the earlier one goes
        if let Some(displaced) = existing.insert(slot, old_fiber) {
            cx.delete_child(displaced);
        }
    }

    for (i, child) in new_children.iter().enumerate().skip(new_idx) {
        let slot = match child_key(child) {
            Some(key) => SlotKey::Key(key.clone()),
            None => SlotKey::Index(i),
        };
        let fiber = match existing.get(&slot).copied() {
            Some(old_fiber) if same_type(&cx.root.tree, old_fiber, child) => {
                existing.remove(&slot);
                cx.use_fiber(old_fiber, child)
            }
            _ => cx.create_child(child),
        };
        last_placed = cx.place_child(fiber, last_placed, i);
        result.push(fiber);
    }

    // Keep deletion order stable: old sibling order
    let leftovers: Vec<FiberId> = old[old_idx..]
        .iter()
        .copied()
        .filter(|id| existing.values().any(|v| v == id))
        .collect();
    for old_fiber in leftovers {
        cx.delete_child(old_fiber);
    }

    cx.link(result)
}

struct ChildReconciler<'a, H: HostAdapter> {
    root: &'a mut FiberRoot<H>,
    parent: FiberId,
    track: bool,
}

impl<H: HostAdapter> ChildReconciler<'_, H> {
    fn child_props(child: &Child) -> Rc<Props> {
        match child {
            Child::Element(element) => element.props.clone(),
            Child::Text(text) => Rc::new(Props::text(text.as_str())),
        }
    }

    /// Work-in-progress twin of `old` updated to `child`.
    fn use_fiber(&mut self, old: FiberId, child: &Child) -> FiberId {
        let tree = &mut self.root.tree;
        let wip = tree.create_work_in_progress(old, Self::child_props(child));
        let fiber = &mut tree[wip];
        fiber.index = 0;
        fiber.sibling = None;
        if let Child::Element(element) = child {
            fiber.element_type = Some(element.element_type.clone());
            fiber.node_ref = element.node_ref.clone();
        }
        if fiber.tag.is_host() {
            fiber.flags |= Flags::UPDATE;
        }
        wip
    }

    fn create_child(&mut self, child: &Child) -> FiberId {
        let lanes = self.root.render_lanes;
        match child {
            Child::Element(element) => self.root.tree.create_from_element(element, lanes),
            Child::Text(text) => self.root.tree.create_from_text(text, lanes),
        }
    }

    fn delete_child(&mut self, old: FiberId) {
        if !self.track {
            return;
        }
        let tree = &mut self.root.tree;
        tree[old].flags |= Flags::DELETION;
        let parent = &mut tree[self.parent];
        parent.deletions.push(old);
        parent.flags |= Flags::CHILD_DELETION;
    }

    fn place_child(&mut self, fiber: FiberId, last_placed: usize, new_index: usize) -> usize {
        let tree = &mut self.root.tree;
        tree[fiber].index = new_index;
        if !self.track {
            return last_placed;
        }
        match tree[fiber].alternate {
            Some(current) => {
                let old_index = tree[current].index;
                if old_index < last_placed {
                    // Moved
                    tree[fiber].flags |= Flags::PLACEMENT;
                    last_placed
                } else {
                    old_index
                }
            }
            None => {
                tree[fiber].flags |= Flags::PLACEMENT;
                last_placed
            }
        }
    }

    /// Wire `return_`/`sibling` links in list order.
    fn link(self, fibers: Vec<FiberId>) -> Option<FiberId> {
        let tree = &mut self.root.tree;
        for (i, &fiber) in fibers.iter().enumerate() {
            tree[fiber].return_ = Some(self.parent);
            tree[fiber].sibling = fibers.get(i + 1).copied();
        }
        fibers.first().copied()
    }
}
