//! Begin phase - compute a fiber's children and diff them.

use std::rc::Rc;

use super::child::reconcile_children;
use crate::component::{ClassInstance, Updater};
use crate::element::ElementType;
use crate::fiber::{FiberId, FiberTag, Lanes, StateNode};
use crate::host::HostAdapter;
use crate::root::FiberRoot;
use crate::types::{Children, StateMap};

/// Run the begin step for `wip` and return its first child, the next unit of
/// work. `None` means the fiber is a leaf and should be completed.
///
/// The current twin is `wip.alternate`; a fiber without one is mounting.
pub(crate) fn begin_work<H: HostAdapter>(root: &mut FiberRoot<H>, wip: FiberId) -> Option<FiberId> {
    let current = root.tree[wip].alternate;
    let tag = root.tree[wip].tag;
    let props = root.tree[wip].pending_props.clone();

    tracing::trace!(?wip, ?tag, "begin_work");

    let children = match tag {
        FiberTag::HostRoot => props.children().clone(),
        // A lone text payload is applied as host text content instead.
        FiberTag::HostComponent => match props.children() {
            Children::Text(_) => Children::None,
            other => other.clone(),
        },
        FiberTag::HostText => return None,
        FiberTag::FunctionComponent => match &root.tree[wip].element_type {
            Some(ElementType::Function(component)) => component.clone().call(&props),
            _ => Children::None,
        },
        FiberTag::ClassComponent => render_class_component(root, wip),
        FiberTag::Fragment => props.children().clone(),
    };

    root.tree[wip].lanes = Lanes::NO_LANES;

    let current_child = current.and_then(|c| root.tree[c].child);
    let first = reconcile_children(root, wip, current_child, children, current.is_some());
    root.tree[wip].child = first;
    first
}

/// Construct or update the instance, fold pending state updates, render.
fn render_class_component<H: HostAdapter>(root: &mut FiberRoot<H>, wip: FiberId) -> Children {
    let props = root.tree[wip].pending_props.clone();

    let instance = match root.tree[wip].state_node.instance() {
        Some(instance) => {
            instance.bind(wip);
            instance.clone()
        }
        None => {
            let Some(ElementType::Class(class)) = root.tree[wip].element_type.clone() else {
                return Children::None;
            };
            let updater = Updater::new(root.scheduler());
            let instance = Rc::new(ClassInstance::new(class.construct(&props), wip, updater));
            let state = instance.initial_state(&props);

            let fiber = &mut root.tree[wip];
            fiber.update_queue = Some(instance.updater().queue().clone());
            fiber.memoized_state = Some(state);
            fiber.state_node = StateNode::Instance(instance.clone());
            tracing::debug!(component = class.name(), ?wip, "class component mounted");
            instance
        }
    };

    let base = root.tree[wip].memoized_state.clone().unwrap_or_default();
    let state: StateMap = match &root.tree[wip].update_queue {
        Some(queue) => queue.borrow_mut().process(&base),
        None => base,
    };
    root.tree[wip].memoized_state = Some(state.clone());

    instance.render(&props, &state)
}
