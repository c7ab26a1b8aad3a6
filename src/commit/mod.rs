//! Commit - apply a finished work tree to the host in one uninterruptible step.
//!
//! # Order
//!
//! 1. Deletions. For every deleted fiber the nearest host descendants are
//!    removed from the nearest host parent, then the subtree's fibers (both
//!    generations) leave the arena.
//! 2. Pre-order walk of the finished tree: placements (`insert_before` the
//!    next stable host sibling, else `append_child`), then property and text
//!    updates, then refs and host back-references.
//! 3. The finished tree becomes current.
//!
//! Nothing in here yields; either the whole pass is visible or none of it is.

use crate::config::EventSystem;
use crate::events::delegation::{apply_listener_changes, forget_listeners};
use crate::fiber::{FiberId, FiberTag, FiberTree, Flags};
use crate::host::HostAdapter;
use crate::root::FiberRoot;

/// What a commit did, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub deletions: usize,
    pub placements: usize,
    pub updates: usize,
}

/// Commit the work-in-progress tree, if there is one.
pub(crate) fn commit_root<H: HostAdapter>(root: &mut FiberRoot<H>) -> CommitSummary {
    let mut summary = CommitSummary::default();
    let Some(finished) = root.wip_root.take() else {
        return summary;
    };
    root.next_unit_of_work = None;

    let order = root.tree.subtree(finished);

    // Deletions
    for &fiber in &order {
        if !root.tree[fiber].flags.contains(Flags::CHILD_DELETION) {
            continue;
        }
        let deletions = std::mem::take(&mut root.tree[fiber].deletions);
        for deleted in deletions {
            commit_deletion(root, fiber, deleted);
            summary.deletions += 1;
        }
        root.tree[fiber].flags.remove(Flags::CHILD_DELETION);
    }

    // Placements, updates, refs
    for &fiber in &order {
        let flags = root.tree[fiber].flags;
        if flags.contains(Flags::PLACEMENT) {
            commit_placement(root, fiber);
            root.tree[fiber].flags.remove(Flags::PLACEMENT);
            summary.placements += 1;
        }
        if flags.contains(Flags::UPDATE) {
            commit_update(root, fiber);
            root.tree[fiber].flags.remove(Flags::UPDATE);
            summary.updates += 1;
        }
        if root.tree[fiber].tag.is_host() {
            commit_attach(root, fiber);
        }
    }

    root.current = finished;
    tracing::debug!(
        deletions = summary.deletions,
        placements = summary.placements,
        updates = summary.updates,
        "commit"
    );
    summary
}

// =============================================================================
// Deletion
// =============================================================================

fn commit_deletion<H: HostAdapter>(root: &mut FiberRoot<H>, parent: FiberId, deleted: FiberId) {
    let host_parent = if root.tree[parent].tag.is_host_parent() {
        Some(parent)
    } else {
        root.tree.host_parent(parent)
    };
    let parent_node = host_parent.and_then(|id| root.tree[id].host_node().cloned());

    match parent_node {
        Some(parent_node) => {
            for node in top_host_nodes(&root.tree, deleted) {
                root.host.remove_child(&parent_node, &node);
            }
        }
        None => tracing::warn!(?deleted, "deleted fiber has no host parent; skipping removal"),
    }

    release_subtree(root, deleted);
}

/// Nearest host nodes at or below `fiber`, never descending past a host fiber.
fn top_host_nodes<N: Clone>(tree: &FiberTree<N>, fiber: FiberId) -> Vec<N> {
    let mut out = Vec::new();
    let mut stack = vec![fiber];
    while let Some(id) = stack.pop() {
        let Some(f) = tree.get(id) else { continue };
        if f.tag.is_host() {
            if let Some(node) = f.host_node() {
                out.push(node.clone());
            }
            continue;
        }
        let mut children = tree.children(id);
        children.reverse();
        stack.extend(children);
    }
    out
}

/// Drop the fibers of a detached subtree and everything that points at them.
fn release_subtree<H: HostAdapter>(root: &mut FiberRoot<H>, deleted: FiberId) {
    for id in root.tree.subtree(deleted) {
        let Some(fiber) = root.tree.get(id) else { continue };
        let alternate = fiber.alternate;
        if let Some(node_ref) = &fiber.node_ref {
            if node_ref.get().is_some_and(|f| f == id || Some(f) == alternate) {
                node_ref.set(None);
            }
        }
        if let Some(node) = root.tree[id].host_node().cloned() {
            if root
                .host_to_fiber
                .get(&node)
                .is_some_and(|&f| f == id || Some(f) == alternate)
            {
                root.host_to_fiber.remove(&node);
            }
            forget_listeners(root, &node);
        }
        if let Some(alternate) = alternate {
            root.tree.remove(alternate);
        }
        root.tree.remove(id);
    }
}

// =============================================================================
// Placement
// =============================================================================

fn commit_placement<H: HostAdapter>(root: &mut FiberRoot<H>, fiber: FiberId) {
    let parent_node = root
        .tree
        .host_parent(fiber)
        .and_then(|id| root.tree[id].host_node().cloned());
    let Some(parent_node) = parent_node else {
        tracing::warn!(?fiber, "placed fiber has no host parent; skipping insertion");
        return;
    };

    let before = host_sibling(&root.tree, fiber);
    insert_or_append(root, fiber, before.as_ref(), &parent_node);
}

/// Host node the placed fiber must be inserted before: the first host node
/// after it in tree order under the same host parent that is not itself
/// about to be placed.
fn host_sibling<N: Clone>(tree: &FiberTree<N>, fiber: FiberId) -> Option<N> {
    let mut node = fiber;
    'siblings: loop {
        while tree[node].sibling.is_none() {
            match tree[node].return_ {
                Some(parent) if !tree[parent].tag.is_host_parent() => node = parent,
                _ => return None,
            }
        }
        node = tree[node].sibling?;

        while !tree[node].tag.is_host() {
            if tree[node].flags.contains(Flags::PLACEMENT) {
                continue 'siblings;
            }
            match tree[node].child {
                Some(child) => node = child,
                None => continue 'siblings,
            }
        }

        if !tree[node].flags.contains(Flags::PLACEMENT) {
            return tree[node].host_node().cloned();
        }
    }
}

fn insert_or_append<H: HostAdapter>(
    root: &mut FiberRoot<H>,
    fiber: FiberId,
    before: Option<&H::Node>,
    parent: &H::Node,
) {
    if root.tree[fiber].tag.is_host() {
        let Some(node) = root.tree[fiber].host_node().cloned() else {
            return;
        };
        match before {
            Some(before) => root.host.insert_before(parent, &node, before),
            None => root.host.append_child(parent, &node),
        }
        return;
    }

    for child in root.tree.children(fiber) {
        insert_or_append(root, child, before, parent);
    }
}

// =============================================================================
// Update
// =============================================================================

fn commit_update<H: HostAdapter>(root: &mut FiberRoot<H>, fiber: FiberId) {
    let Some(node) = root.tree[fiber].host_node().cloned() else {
        tracing::warn!(?fiber, "update on a fiber without a host node");
        return;
    };

    match root.tree[fiber].tag {
        FiberTag::HostComponent => {
            let Some(payload) = root.tree[fiber].update_payload.take() else {
                return;
            };
            if !payload.properties.is_empty() {
                root.host.set_properties(&node, &payload.properties);
            }
            if root.config.event_system == EventSystem::Direct {
                apply_listener_changes(root, &node, &payload.listeners);
            }
        }
        FiberTag::HostText => {
            let text = root.tree[fiber]
                .memoized_props
                .as_ref()
                .and_then(|props| props.text_content().map(str::to_string))
                .unwrap_or_default();
            root.host.set_text(&node, &text);
        }
        _ => {}
    }
}

// =============================================================================
// Refs and back-references
// =============================================================================

fn commit_attach<H: HostAdapter>(root: &mut FiberRoot<H>, fiber: FiberId) {
    if let Some(node) = root.tree[fiber].host_node().cloned() {
        root.host_to_fiber.insert(node, fiber);
    }

    // A ref that was swapped out or dropped no longer points anywhere.
    let new_ref = root.tree[fiber].node_ref.clone();
    let old_ref = root.tree[fiber]
        .alternate
        .and_then(|a| root.tree.get(a))
        .and_then(|a| a.node_ref.clone());
    if let Some(old_ref) = old_ref {
        if !new_ref.as_ref().is_some_and(|r| r.ptr_eq(&old_ref)) {
            old_ref.set(None);
        }
    }

    if root.tree[fiber].flags.contains(Flags::REF) {
        if let Some(node_ref) = new_ref {
            node_ref.set(Some(fiber));
        }
        root.tree[fiber].flags.remove(Flags::REF);
    }
}
