//! Delegation - resolve a native event to handler props and run them.
//!
//! Collection and invocation are separate steps. The dispatch path is read
//! while the root is borrowed; handlers run after the borrow is released,
//! so they are free to queue state updates or call back into the root.

use std::rc::{Rc, Weak};

use super::{logical_event_name, NativeEvent, SyntheticEvent};
use crate::fiber::{FiberId, FiberTag};
use crate::host::{HostAdapter, NativeListener};
use crate::reconciler::ListenerChange;
use crate::root::{FiberRoot, RootShared};
use crate::types::EventHandler;

/// Handlers to invoke for one event, innermost first.
pub(crate) type DispatchPath = Vec<(FiberId, EventHandler)>;

/// Walk from the target's fiber through `return` links to the root,
/// collecting the handler prop matching the event on every host fiber.
pub(crate) fn collect_dispatch_path<H: HostAdapter>(
    root: &FiberRoot<H>,
    native: &NativeEvent<H::Node>,
) -> (Option<FiberId>, DispatchPath) {
    let name = logical_event_name(&native.event_type);
    let Some(&target) = root.host_to_fiber.get(&native.target) else {
        tracing::trace!(event = %native.event_type, "event target not owned by this root");
        return (None, Vec::new());
    };

    let mut path = Vec::new();
    let mut cursor = Some(target);
    while let Some(id) = cursor {
        let Some(fiber) = root.tree.get(id) else { break };
        if fiber.tag == FiberTag::HostComponent {
            let handler = fiber
                .memoized_props
                .as_ref()
                .and_then(|props| props.get(&name))
                .and_then(|value| value.as_handler());
            if let Some(handler) = handler {
                path.push((id, handler.clone()));
            }
        }
        cursor = fiber.return_;
    }
    (Some(target), path)
}

/// Invoke every handler on the path, target first, until one stops
/// propagation. Returns the number of handlers run.
pub(crate) fn dispatch_path(event: &SyntheticEvent, path: &[(FiberId, EventHandler)]) -> usize {
    let mut invoked = 0;
    for (fiber, handler) in path {
        if event.is_propagation_stopped() {
            break;
        }
        event.set_current_target(*fiber);
        handler.call(event);
        invoked += 1;
    }
    invoked
}

// =============================================================================
// Direct listeners
// =============================================================================

/// Apply handler prop changes as per-node native listeners.
///
/// Only used with `EventSystem::Direct`; the delegated system ignores
/// handler changes entirely.
pub(crate) fn apply_listener_changes<H: HostAdapter>(
    root: &mut FiberRoot<H>,
    node: &H::Node,
    changes: &[ListenerChange],
) {
    for change in changes {
        match change {
            ListenerChange::Remove { event, .. } => {
                let slot = (node.clone(), event.clone());
                if let Some(listener) = root.direct_listeners.remove(&slot) {
                    root.host.remove_event_listener(node, event, &listener);
                }
            }
            ListenerChange::Add { event, handler } => {
                let listener = direct_listener(root.shared.clone(), handler.clone());
                root.host.add_event_listener(node, event, listener.clone());
                root.direct_listeners.insert((node.clone(), event.clone()), listener);
            }
        }
    }
}

/// Forget the direct listeners of a node that left the tree.
pub(crate) fn forget_listeners<H: HostAdapter>(root: &mut FiberRoot<H>, node: &H::Node) {
    root.direct_listeners.retain(|(owner, _), _| owner != node);
}

fn direct_listener<H: HostAdapter>(
    shared: Weak<RootShared<H>>,
    handler: EventHandler,
) -> NativeListener<H::Node> {
    Rc::new(move |native: &NativeEvent<H::Node>| {
        let target = shared
            .upgrade()
            .and_then(|shared| shared.fiber_for_node(&native.target));
        let event = SyntheticEvent::new(native.event_type.clone(), native.detail, target);
        handler.call(&event);
    })
}
