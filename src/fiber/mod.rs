//! Fiber - the retained work node and the arena that owns it.
//!
//! Every logical position in the rendered tree is backed by at most two
//! fibers: the *current* one (what is committed) and the *work-in-progress*
//! one (what the running pass is building). The two point at each other
//! through `alternate`, and a pass reuses the alternate slot instead of
//! allocating a new node.
//!
//! # Architecture
//!
//! Fibers are not linked by references. They live in a [`FiberTree`] arena
//! and link to each other with [`FiberId`] keys:
//!
//! ```text
//! return  ← parent
//! child   → first child
//! sibling → next sibling
//! alternate ↔ the other generation at the same position
//! ```
//!
//! Stepping down or sideways is O(1) and never allocates.

pub mod flags;
pub mod lanes;
pub mod update_queue;

use std::ops::{Index, IndexMut};
use std::rc::Rc;

use slotmap::SlotMap;

use crate::component::ClassInstance;
use crate::element::{Element, ElementType};
use crate::reconciler::props_diff::UpdatePayload;
use crate::types::{Key, NodeRef, Props, StateMap};

pub use flags::Flags;
pub use lanes::Lanes;
pub use update_queue::{SharedUpdateQueue, Update, UpdateQueue};

slotmap::new_key_type! {
    /// Arena key of a fiber.
    pub struct FiberId;
}

// =============================================================================
// Tags and State Nodes
// =============================================================================

/// Closed set of fiber kinds. Begin and complete match on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FiberTag {
    HostRoot,
    HostComponent,
    HostText,
    FunctionComponent,
    ClassComponent,
    Fragment,
}

impl FiberTag {
    pub fn from_element_type(element_type: &ElementType) -> Self {
        match element_type {
            ElementType::Host(_) => FiberTag::HostComponent,
            ElementType::Function(_) => FiberTag::FunctionComponent,
            ElementType::Class(_) => FiberTag::ClassComponent,
            ElementType::Fragment => FiberTag::Fragment,
        }
    }

    /// Fibers that own a host node.
    #[inline]
    pub fn is_host(self) -> bool {
        matches!(self, FiberTag::HostComponent | FiberTag::HostText)
    }

    /// Fibers whose host node can hold children.
    #[inline]
    pub fn is_host_parent(self) -> bool {
        matches!(self, FiberTag::HostComponent | FiberTag::HostRoot)
    }
}

/// What a fiber owns outside the tree.
#[derive(Debug, Clone, Default)]
pub enum StateNode<N> {
    #[default]
    None,
    /// Host node (host component, host text, or the root container).
    Host(N),
    /// Class component instance, shared by both generations.
    Instance(Rc<ClassInstance>),
}

impl<N> StateNode<N> {
    pub fn host(&self) -> Option<&N> {
        match self {
            StateNode::Host(node) => Some(node),
            _ => None,
        }
    }

    pub fn instance(&self) -> Option<&Rc<ClassInstance>> {
        match self {
            StateNode::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, StateNode::None)
    }
}

// =============================================================================
// Fiber
// =============================================================================

/// A retained work node.
#[derive(Debug)]
pub struct Fiber<N> {
    // Identity
    pub tag: FiberTag,
    pub element_type: Option<ElementType>,
    pub key: Option<Key>,
    pub node_ref: Option<NodeRef>,

    // Props
    pub pending_props: Rc<Props>,
    pub memoized_props: Option<Rc<Props>>,

    // Topology
    pub return_: Option<FiberId>,
    pub child: Option<FiberId>,
    pub sibling: Option<FiberId>,
    /// Position among siblings in the last reconciled list.
    pub index: usize,

    // State
    pub memoized_state: Option<StateMap>,
    pub update_queue: Option<SharedUpdateQueue>,
    /// Host property delta prepared by the complete phase.
    pub update_payload: Option<UpdatePayload>,

    // Effects
    pub flags: Flags,
    pub subtree_flags: Flags,

    // Priority
    pub lanes: Lanes,
    pub child_lanes: Lanes,

    // Linkage
    pub alternate: Option<FiberId>,
    pub state_node: StateNode<N>,
    pub deletions: Vec<FiberId>,
}

impl<N> Fiber<N> {
    pub fn new(tag: FiberTag, key: Option<Key>, pending_props: Rc<Props>) -> Self {
        Self {
            tag,
            element_type: None,
            key,
            node_ref: None,
            pending_props,
            memoized_props: None,
            return_: None,
            child: None,
            sibling: None,
            index: 0,
            memoized_state: None,
            update_queue: None,
            update_payload: None,
            flags: Flags::NONE,
            subtree_flags: Flags::NONE,
            lanes: Lanes::NO_LANES,
            child_lanes: Lanes::NO_LANES,
            alternate: None,
            state_node: StateNode::None,
            deletions: Vec::new(),
        }
    }

    /// Host node owned by this fiber, if any.
    pub fn host_node(&self) -> Option<&N> {
        self.state_node.host()
    }
}

// =============================================================================
// Fiber Tree (arena)
// =============================================================================

/// Arena owning every live fiber of one root.
#[derive(Debug)]
pub struct FiberTree<N> {
    fibers: SlotMap<FiberId, Fiber<N>>,
}

impl<N> Default for FiberTree<N> {
    fn default() -> Self {
        Self {
            fibers: SlotMap::with_key(),
        }
    }
}

impl<N: Clone> FiberTree<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: FiberId) -> Option<&Fiber<N>> {
        self.fibers.get(id)
    }

    pub fn get_mut(&mut self, id: FiberId) -> Option<&mut Fiber<N>> {
        self.fibers.get_mut(id)
    }

    pub fn contains(&self, id: FiberId) -> bool {
        self.fibers.contains_key(id)
    }

    /// Number of live fibers (both generations).
    pub fn len(&self) -> usize {
        self.fibers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fibers.is_empty()
    }

    /// Insert a detached fiber.
    pub fn insert(&mut self, fiber: Fiber<N>) -> FiberId {
        self.fibers.insert(fiber)
    }

    pub fn remove(&mut self, id: FiberId) -> Option<Fiber<N>> {
        self.fibers.remove(id)
    }

    /// The uninitialised current root for a container.
    pub fn create_host_root(&mut self, container: N) -> FiberId {
        let mut fiber = Fiber::new(FiberTag::HostRoot, None, Rc::new(Props::new()));
        fiber.state_node = StateNode::Host(container);
        fiber.memoized_props = Some(fiber.pending_props.clone());
        self.insert(fiber)
    }

    /// A fresh fiber for an element seen for the first time at a position.
    pub fn create_from_element(&mut self, element: &Element, lanes: Lanes) -> FiberId {
        let tag = FiberTag::from_element_type(&element.element_type);
        let mut fiber = Fiber::new(tag, element.key.clone(), element.props.clone());
        fiber.element_type = Some(element.element_type.clone());
        fiber.node_ref = element.node_ref.clone();
        fiber.lanes = lanes;
        self.insert(fiber)
    }

    /// A fresh host text fiber.
    pub fn create_from_text(&mut self, text: &str, lanes: Lanes) -> FiberId {
        let mut fiber = Fiber::new(FiberTag::HostText, None, Rc::new(Props::text(text)));
        fiber.lanes = lanes;
        self.insert(fiber)
    }

    /// Work-in-progress twin of `current` carrying `pending_props`.
    ///
    /// Reuses the alternate slot when one exists; otherwise allocates it and
    /// links the pair symmetrically.
    pub fn create_work_in_progress(
        &mut self,
        current: FiberId,
        pending_props: Rc<Props>,
    ) -> FiberId {
        let alternate = self[current].alternate;
        let wip = match alternate {
            Some(alternate) => {
                let fiber = &mut self[alternate];
                fiber.pending_props = pending_props;
                fiber.flags = Flags::NONE;
                fiber.subtree_flags = Flags::NONE;
                fiber.deletions.clear();
                fiber.update_payload = None;
                alternate
            }
            None => {
                let source = &self[current];
                let mut fiber = Fiber::new(source.tag, source.key.clone(), pending_props);
                fiber.element_type = source.element_type.clone();
                fiber.state_node = source.state_node.clone();
                fiber.alternate = Some(current);
                let wip = self.insert(fiber);
                self[current].alternate = Some(wip);
                wip
            }
        };

        let source = &self[current];
        let child = source.child;
        let sibling = source.sibling;
        let index = source.index;
        let lanes = source.lanes;
        let child_lanes = source.child_lanes;
        let node_ref = source.node_ref.clone();
        let memoized_props = source.memoized_props.clone();
        let memoized_state = source.memoized_state.clone();
        let update_queue = source.update_queue.clone();

        let fiber = &mut self[wip];
        fiber.child = child;
        fiber.sibling = sibling;
        fiber.index = index;
        fiber.lanes = lanes;
        fiber.child_lanes = child_lanes;
        fiber.node_ref = node_ref;
        fiber.memoized_props = memoized_props;
        fiber.memoized_state = memoized_state;
        fiber.update_queue = update_queue;
        wip
    }

    /// Direct children of `parent`, in sibling order.
    pub fn children(&self, parent: FiberId) -> Vec<FiberId> {
        let mut out = Vec::new();
        let mut next = self.get(parent).and_then(|f| f.child);
        while let Some(id) = next {
            out.push(id);
            next = self[id].sibling;
        }
        out
    }

    /// Every fiber of the subtree rooted at `root` (pre-order, root included).
    ///
    /// Does not follow `root`'s own sibling link.
    pub fn subtree(&self, root: FiberId) -> Vec<FiberId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !self.contains(id) {
                continue;
            }
            out.push(id);
            let mut children = self.children(id);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Nearest ancestor (exclusive) that can hold host children.
    pub fn host_parent(&self, fiber: FiberId) -> Option<FiberId> {
        let mut parent = self.get(fiber).and_then(|f| f.return_);
        while let Some(id) = parent {
            if self[id].tag.is_host_parent() {
                return Some(id);
            }
            parent = self[id].return_;
        }
        None
    }
}

impl<N> Index<FiberId> for FiberTree<N> {
    type Output = Fiber<N>;

    fn index(&self, id: FiberId) -> &Self::Output {
        &self.fibers[id]
    }
}

impl<N> IndexMut<FiberId> for FiberTree<N> {
    fn index_mut(&mut self, id: FiberId) -> &mut Self::Output {
        &mut self.fibers[id]
    }
}

// =============================================================================
// Tests
// =============================================================================
