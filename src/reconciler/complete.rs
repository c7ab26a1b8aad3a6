//! Complete phase - build detached host nodes and bubble effects upward.

use super::props_diff::diff_properties;
use crate::config::EventSystem;
use crate::events::delegation::apply_listener_changes;
use crate::fiber::{FiberId, FiberTag, Flags, Lanes, StateNode};
use crate::host::HostAdapter;
use crate::root::FiberRoot;
use crate::types::Props;

/// Run the complete step for `wip`. Every child has already completed.
pub(crate) fn complete_work<H: HostAdapter>(root: &mut FiberRoot<H>, wip: FiberId) {
    let tag = root.tree[wip].tag;
    tracing::trace!(?wip, ?tag, "complete_work");

    match tag {
        FiberTag::HostComponent => complete_host_component(root, wip),
        FiberTag::HostText => complete_host_text(root, wip),
        FiberTag::HostRoot
        | FiberTag::FunctionComponent
        | FiberTag::ClassComponent
        | FiberTag::Fragment => {}
    }

    if root.tree[wip].node_ref.is_some() && tag.is_host() {
        root.tree[wip].flags |= Flags::REF;
    }

    bubble_properties(root, wip);
}

fn complete_host_component<H: HostAdapter>(root: &mut FiberRoot<H>, wip: FiberId) {
    let props = root.tree[wip].pending_props.clone();
    let current = root.tree[wip].alternate;

    let mounted = root.tree[wip].host_node().is_some();

    if let (Some(current), true) = (current, mounted) {
        // Update: prepare the delta, commit applies it
        let old = root.tree[current].memoized_props.clone().unwrap_or_default();
        let mut payload = diff_properties(&old, &props);
        if root.config.event_system == EventSystem::Delegated {
            payload.listeners.clear();
        }

        let fiber = &mut root.tree[wip];
        if payload.is_empty() {
            fiber.flags.remove(Flags::UPDATE);
            fiber.update_payload = None;
        } else {
            fiber.flags |= Flags::UPDATE;
            fiber.update_payload = Some(payload);
        }
        return;
    }

    // Mount
    let node_type = root.tree[wip]
        .element_type
        .as_ref()
        .and_then(|ty| ty.host_tag())
        .unwrap_or_default()
        .to_string();
    let node = root.host.create_node(&node_type);
    append_all_children(root, &node, wip);

    let initial = diff_properties(&Props::new(), &props);
    if !initial.properties.is_empty() {
        root.host.set_properties(&node, &initial.properties);
    }
    if root.config.event_system == EventSystem::Direct {
        apply_listener_changes(root, &node, &initial.listeners);
    }

    root.host_to_fiber.insert(node.clone(), wip);
    let fiber = &mut root.tree[wip];
    fiber.state_node = StateNode::Host(node);
    fiber.flags.remove(Flags::UPDATE);
}

fn complete_host_text<H: HostAdapter>(root: &mut FiberRoot<H>, wip: FiberId) {
    let text = root.tree[wip]
        .pending_props
        .text_content()
        .unwrap_or_default()
        .to_string();
    let current = root.tree[wip].alternate;

    let mounted = root.tree[wip].host_node().is_some();

    if let (Some(current), true) = (current, mounted) {
        let old_text = root.tree[current]
            .memoized_props
            .as_ref()
            .and_then(|p| p.text_content().map(str::to_string));
        let fiber = &mut root.tree[wip];
        if old_text.as_deref() == Some(text.as_str()) {
            fiber.flags.remove(Flags::UPDATE);
        } else {
            fiber.flags |= Flags::UPDATE;
        }
        return;
    }

    let node = root.host.create_text_node(&text);
    root.host_to_fiber.insert(node.clone(), wip);
    let fiber = &mut root.tree[wip];
    fiber.state_node = StateNode::Host(node);
    fiber.flags.remove(Flags::UPDATE);
}

/// Append the nearest host descendants of `wip` to its freshly created node.
///
/// Component and fragment fibers own no host node, so the walk descends
/// through them; it never descends below a host fiber.
fn append_all_children<H: HostAdapter>(root: &mut FiberRoot<H>, parent: &H::Node, wip: FiberId) {
    let mut node = root.tree[wip].child;
    while let Some(id) = node {
        let fiber = &root.tree[id];
        if fiber.tag.is_host() {
            if let Some(child) = fiber.host_node().cloned() {
                root.host.append_child(parent, &child);
            }
        } else if let Some(child) = fiber.child {
            node = Some(child);
            continue;
        }

        // Climb until a sibling exists, stopping at `wip`
        let mut cursor = id;
        node = loop {
            if let Some(sibling) = root.tree[cursor].sibling {
                break Some(sibling);
            }
            match root.tree[cursor].return_ {
                Some(parent_fiber) if parent_fiber != wip => cursor = parent_fiber,
                _ => break None,
            }
        };
    }
}

/// Fold the children's flags and lanes into `subtree_flags`/`child_lanes`.
fn bubble_properties<H: HostAdapter>(root: &mut FiberRoot<H>, wip: FiberId) {
    let mut subtree_flags = Flags::NONE;
    let mut child_lanes = Lanes::NO_LANES;

    let mut next = root.tree[wip].child;
    while let Some(id) = next {
        let child = &root.tree[id];
        subtree_flags |= child.flags | child.subtree_flags;
        child_lanes |= child.lanes | child.child_lanes;
        next = child.sibling;
    }

    let fiber = &mut root.tree[wip];
    fiber.subtree_flags = subtree_flags;
    fiber.child_lanes = child_lanes;
}
