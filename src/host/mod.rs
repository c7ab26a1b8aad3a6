//! Host adapter - the capability set the engine drives.
//!
//! The reconciler never touches visual nodes directly. Everything goes
//! through a [`HostAdapter`]: node creation in the complete phase, and
//! insertion, removal and property updates in the commit phase.
//!
//! - [`memory`] - in-memory host tree with a mutation log and native event
//!   bubbling, used by tests and by the layout/input bridge.

pub mod memory;

use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use crate::events::NativeEvent;
use crate::types::PropValue;

pub use memory::{HostNodeId, HostOp, MemoryHost};

/// Native listener installed on a host node.
pub type NativeListener<N> = Rc<dyn Fn(&NativeEvent<N>)>;

/// Operations the engine needs from a host environment.
///
/// `Node` is a cheap handle (an id, an `Rc`, ...). It is hashed to map host
/// nodes back to the fibers that own them.
pub trait HostAdapter: 'static {
    type Node: Clone + Eq + Hash + fmt::Debug + 'static;

    fn create_node(&mut self, node_type: &str) -> Self::Node;

    fn create_text_node(&mut self, text: &str) -> Self::Node;

    /// Apply a flat name/value update list. `PropValue::Null` clears a
    /// property; a `children` entry sets or clears the text content.
    fn set_properties(&mut self, node: &Self::Node, props: &[(String, PropValue)]);

    /// Replace the content of a text node.
    fn set_text(&mut self, node: &Self::Node, text: &str);

    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node);

    /// Insert `child` before `before`, which must already be a child of `parent`.
    fn insert_before(&mut self, parent: &Self::Node, child: &Self::Node, before: &Self::Node);

    fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node);

    fn add_event_listener(
        &mut self,
        node: &Self::Node,
        event_type: &str,
        listener: NativeListener<Self::Node>,
    );

    /// Remove a listener previously added with the same `Rc`.
    fn remove_event_listener(
        &mut self,
        node: &Self::Node,
        event_type: &str,
        listener: &NativeListener<Self::Node>,
    );
}
