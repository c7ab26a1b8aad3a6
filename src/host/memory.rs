//! Memory host - an in-memory host tree.
//!
//! Behaves like a tiny DOM: element and text nodes, properties, a per-sub-key
//! style map, text content, and native listeners that bubble from the target
//! up to the top-most ancestor. Every mutation is appended to a log so tests
//! can assert on exactly what a commit did.
//!
//! `MemoryHost` is a cheap handle; clones share the same tree.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::rc::Rc;

use slotmap::SlotMap;

use super::{HostAdapter, NativeListener};
use crate::events::{EventDetail, NativeEvent};
use crate::types::{PropValue, Style, CHILDREN_PROP, STYLE_PROP};

slotmap::new_key_type! {
    /// Handle of a node in a [`MemoryHost`].
    pub struct HostNodeId;
}

/// One recorded host call.
#[derive(Debug, Clone, PartialEq)]
pub enum HostOp {
    CreateNode { node: HostNodeId, node_type: String },
    CreateText { node: HostNodeId, text: String },
    SetProperties { node: HostNodeId, props: Vec<(String, PropValue)> },
    SetText { node: HostNodeId, text: String },
    AppendChild { parent: HostNodeId, child: HostNodeId },
    InsertBefore { parent: HostNodeId, child: HostNodeId, before: HostNodeId },
    RemoveChild { parent: HostNodeId, child: HostNodeId },
    AddListener { node: HostNodeId, event_type: String },
    RemoveListener { node: HostNodeId, event_type: String },
}

impl HostOp {
    /// Whether the op changes an existing, possibly attached, node.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, HostOp::CreateNode { .. } | HostOp::CreateText { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeKind {
    Element(String),
    Text(String),
}

struct NodeData {
    kind: NodeKind,
    parent: Option<HostNodeId>,
    children: Vec<HostNodeId>,
    properties: BTreeMap<String, PropValue>,
    style: Style,
    text_content: Option<String>,
    listeners: Vec<(String, NativeListener<HostNodeId>)>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            properties: BTreeMap::new(),
            style: Style::new(),
            text_content: None,
            listeners: Vec::new(),
        }
    }
}

#[derive(Default)]
struct MemoryDom {
    nodes: SlotMap<HostNodeId, NodeData>,
    ops: Vec<HostOp>,
}

impl MemoryDom {
    fn detach(&mut self, child: HostNodeId) {
        let Some(parent) = self.nodes.get(child).and_then(|n| n.parent) else {
            return;
        };
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.retain(|&c| c != child);
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = None;
        }
    }
}

/// Shared handle to an in-memory host tree.
#[derive(Clone, Default)]
pub struct MemoryHost {
    dom: Rc<RefCell<MemoryDom>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A detached root container. Not recorded in the op log.
    pub fn create_container(&self) -> HostNodeId {
        self.dom
            .borrow_mut()
            .nodes
            .insert(NodeData::new(NodeKind::Element("root".to_string())))
    }

    // =========================================================================
    // Op log
    // =========================================================================

    pub fn ops(&self) -> Vec<HostOp> {
        self.dom.borrow().ops.clone()
    }

    pub fn take_ops(&self) -> Vec<HostOp> {
        std::mem::take(&mut self.dom.borrow_mut().ops)
    }

    pub fn clear_ops(&self) {
        self.dom.borrow_mut().ops.clear();
    }

    /// Number of logged ops that touched an existing node.
    pub fn mutation_count(&self) -> usize {
        self.dom.borrow().ops.iter().filter(|op| op.is_mutation()).count()
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub fn contains(&self, node: HostNodeId) -> bool {
        self.dom.borrow().nodes.contains_key(node)
    }

    /// Tag of an element node (`None` for text nodes).
    pub fn node_type(&self, node: HostNodeId) -> Option<String> {
        match &self.dom.borrow().nodes.get(node)?.kind {
            NodeKind::Element(tag) => Some(tag.clone()),
            NodeKind::Text(_) => None,
        }
    }

    pub fn is_text(&self, node: HostNodeId) -> bool {
        matches!(
            self.dom.borrow().nodes.get(node).map(|n| &n.kind),
            Some(NodeKind::Text(_))
        )
    }

    pub fn parent(&self, node: HostNodeId) -> Option<HostNodeId> {
        self.dom.borrow().nodes.get(node)?.parent
    }

    pub fn children(&self, node: HostNodeId) -> Vec<HostNodeId> {
        self.dom
            .borrow()
            .nodes
            .get(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn property(&self, node: HostNodeId, name: &str) -> Option<PropValue> {
        self.dom.borrow().nodes.get(node)?.properties.get(name).cloned()
    }

    pub fn style(&self, node: HostNodeId) -> Style {
        self.dom
            .borrow()
            .nodes
            .get(node)
            .map(|n| n.style.clone())
            .unwrap_or_default()
    }

    /// Concatenated text of the node and its descendants.
    pub fn text_content(&self, node: HostNodeId) -> String {
        let dom = self.dom.borrow();
        let mut out = String::new();
        collect_text(&dom, node, &mut out);
        out
    }

    pub fn listener_count(&self, node: HostNodeId, event_type: &str) -> usize {
        self.dom
            .borrow()
            .nodes
            .get(node)
            .map(|n| n.listeners.iter().filter(|(t, _)| t == event_type).count())
            .unwrap_or(0)
    }

    /// Compact markup of the subtree under `node`, for assertions.
    ///
    /// `<div id="a"><span>hi</span>tail</div>`
    pub fn markup(&self, node: HostNodeId) -> String {
        let dom = self.dom.borrow();
        let mut out = String::new();
        write_markup(&dom, node, &mut out);
        out
    }

    /// Markup of the children of `node` (the container itself is omitted).
    pub fn inner_markup(&self, node: HostNodeId) -> String {
        self.children(node)
            .into_iter()
            .map(|child| self.markup(child))
            .collect()
    }

    // =========================================================================
    // Native dispatch
    // =========================================================================

    /// Fire a native event at `target` and bubble it to the top-most ancestor.
    ///
    /// Returns the number of native listeners invoked.
    pub fn dispatch_event(
        &self,
        target: HostNodeId,
        event_type: &str,
        detail: EventDetail,
    ) -> usize {
        let listeners: Vec<NativeListener<HostNodeId>> = {
            let dom = self.dom.borrow();
            let mut out = Vec::new();
            let mut current = Some(target);
            while let Some(id) = current {
                let Some(node) = dom.nodes.get(id) else { break };
                out.extend(
                    node.listeners
                        .iter()
                        .filter(|(t, _)| t == event_type)
                        .map(|(_, l)| l.clone()),
                );
                current = node.parent;
            }
            out
        };

        let event = NativeEvent::new(event_type, target, detail);
        for listener in &listeners {
            listener(&event);
        }
        listeners.len()
    }
}

fn collect_text(dom: &MemoryDom, node: HostNodeId, out: &mut String) {
    let Some(data) = dom.nodes.get(node) else { return };
    match &data.kind {
        NodeKind::Text(text) => out.push_str(text),
        NodeKind::Element(_) => {
            if let Some(text) = &data.text_content {
                out.push_str(text);
            }
            for &child in &data.children {
                collect_text(dom, child, out);
            }
        }
    }
}

fn write_markup(dom: &MemoryDom, node: HostNodeId, out: &mut String) {
    let Some(data) = dom.nodes.get(node) else { return };
    match &data.kind {
        NodeKind::Text(text) => out.push_str(text),
        NodeKind::Element(tag) => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in &data.properties {
                if let Some(text) = value.to_text() {
                    let _ = write!(out, " {}=\"{}\"", name, text);
                }
            }
            if !data.style.is_empty() {
                let style: Vec<String> = data
                    .style
                    .iter()
                    .map(|(k, v)| format!("{}:{}", k, v))
                    .collect();
                let _ = write!(out, " style=\"{}\"", style.join(";"));
            }
            out.push('>');
            if let Some(text) = &data.text_content {
                out.push_str(text);
            }
            for &child in &data.children {
                write_markup(dom, child, out);
            }
            let _ = write!(out, "</{}>", tag);
        }
    }
}

// =============================================================================
// HostAdapter
// =============================================================================

impl HostAdapter for MemoryHost {
    type Node = HostNodeId;

    fn create_node(&mut self, node_type: &str) -> HostNodeId {
        let mut dom = self.dom.borrow_mut();
        let node = dom
            .nodes
            .insert(NodeData::new(NodeKind::Element(node_type.to_string())));
        dom.ops.push(HostOp::CreateNode {
            node,
            node_type: node_type.to_string(),
        });
        node
    }

    fn create_text_node(&mut self, text: &str) -> HostNodeId {
        let mut dom = self.dom.borrow_mut();
        let node = dom.nodes.insert(NodeData::new(NodeKind::Text(text.to_string())));
        dom.ops.push(HostOp::CreateText {
            node,
            text: text.to_string(),
        });
        node
    }

    fn set_properties(&mut self, node: &HostNodeId, props: &[(String, PropValue)]) {
        let mut dom = self.dom.borrow_mut();
        dom.ops.push(HostOp::SetProperties {
            node: *node,
            props: props.to_vec(),
        });
        let Some(data) = dom.nodes.get_mut(*node) else { return };

        for (name, value) in props {
            match (name.as_str(), value) {
                (CHILDREN_PROP, PropValue::Null) => data.text_content = None,
                (CHILDREN_PROP, value) => data.text_content = value.to_text(),
                (STYLE_PROP, PropValue::Style(delta)) => {
                    for (key, sub) in delta.iter() {
                        if sub.is_empty() {
                            data.style.remove(key);
                        } else {
                            data.style.set(key, sub);
                        }
                    }
                }
                (STYLE_PROP, _) => data.style = Style::new(),
                (_, PropValue::Null) => {
                    data.properties.remove(name);
                }
                (_, value) => {
                    data.properties.insert(name.clone(), value.clone());
                }
            }
        }
    }

    fn set_text(&mut self, node: &HostNodeId, text: &str) {
        let mut dom = self.dom.borrow_mut();
        dom.ops.push(HostOp::SetText {
            node: *node,
            text: text.to_string(),
        });
        if let Some(data) = dom.nodes.get_mut(*node) {
            data.kind = NodeKind::Text(text.to_string());
        }
    }

    fn append_child(&mut self, parent: &HostNodeId, child: &HostNodeId) {
        let mut dom = self.dom.borrow_mut();
        dom.ops.push(HostOp::AppendChild {
            parent: *parent,
            child: *child,
        });
        dom.detach(*child);
        if let Some(data) = dom.nodes.get_mut(*parent) {
            data.children.push(*child);
        }
        if let Some(data) = dom.nodes.get_mut(*child) {
            data.parent = Some(*parent);
        }
    }

    fn insert_before(&mut self, parent: &HostNodeId, child: &HostNodeId, before: &HostNodeId) {
        let mut dom = self.dom.borrow_mut();
        dom.ops.push(HostOp::InsertBefore {
            parent: *parent,
            child: *child,
            before: *before,
        });
        dom.detach(*child);
        if let Some(data) = dom.nodes.get_mut(*parent) {
            let at = data
                .children
                .iter()
                .position(|c| c == before)
                .unwrap_or(data.children.len());
            data.children.insert(at, *child);
        }
        if let Some(data) = dom.nodes.get_mut(*child) {
            data.parent = Some(*parent);
        }
    }

    fn remove_child(&mut self, parent: &HostNodeId, child: &HostNodeId) {
        let mut dom = self.dom.borrow_mut();
        dom.ops.push(HostOp::RemoveChild {
            parent: *parent,
            child: *child,
        });
        if dom.nodes.get(*child).and_then(|n| n.parent) == Some(*parent) {
            dom.detach(*child);
        }
    }

    fn add_event_listener(
        &mut self,
        node: &HostNodeId,
        event_type: &str,
        listener: NativeListener<HostNodeId>,
    ) {
        let mut dom = self.dom.borrow_mut();
        dom.ops.push(HostOp::AddListener {
            node: *node,
            event_type: event_type.to_string(),
        });
        if let Some(data) = dom.nodes.get_mut(*node) {
            data.listeners.push((event_type.to_string(), listener));
        }
    }

    fn remove_event_listener(
        &mut self,
        node: &HostNodeId,
        event_type: &str,
        listener: &NativeListener<HostNodeId>,
    ) {
        let mut dom = self.dom.borrow_mut();
        dom.ops.push(HostOp::RemoveListener {
            node: *node,
            event_type: event_type.to_string(),
        });
        if let Some(data) = dom.nodes.get_mut(*node) {
            data.listeners
                .retain(|(t, l)| !(t == event_type && Rc::ptr_eq(l, listener)));
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_build_and_markup() {
        let mut host = MemoryHost::new();
        let root = host.create_container();
        let div = host.create_node("div");
        let text = host.create_text_node("hi");
        host.set_properties(&div, &[("id".to_string(), PropValue::from("a"))]);
        host.append_child(&div, &text);
        host.append_child(&root, &div);

        assert_eq!(host.inner_markup(root), "<div id=\"a\">hi</div>");
        assert_eq!(host.text_content(root), "hi");
        assert_eq!(host.parent(div), Some(root));
    }

    #[test]
    fn test_insert_before_moves_node() {
        let mut host = MemoryHost::new();
        let root = host.create_container();
        let a = host.create_node("a");
        let b = host.create_node("b");
        host.append_child(&root, &a);
        host.append_child(&root, &b);
        host.insert_before(&root, &b, &a);

        assert_eq!(host.children(root), vec![b, a]);
    }

    #[test]
    fn test_style_and_text_content_props() {
        let mut host = MemoryHost::new();
        let div = host.create_node("div");
        host.set_properties(
            &div,
            &[
                ("style".to_string(), PropValue::Style(Style::new().with("color", "red"))),
                ("children".to_string(), PropValue::from("hello")),
            ],
        );
        assert_eq!(host.style(div).get("color"), Some("red"));
        assert_eq!(host.text_content(div), "hello");

        host.set_properties(
            &div,
            &[("style".to_string(), PropValue::Style(Style::new().with("color", "")))],
        );
        assert!(host.style(div).is_empty());
    }

    #[test]
    fn test_native_events_bubble_to_ancestors() {
        let mut host = MemoryHost::new();
        let root = host.create_container();
        let div = host.create_node("div");
        host.append_child(&root, &div);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_root = seen.clone();
        let listener: NativeListener<HostNodeId> = Rc::new(move |event: &NativeEvent<HostNodeId>| {
            seen_root.borrow_mut().push(event.target);
        });
        host.add_event_listener(&root, "click", listener.clone());

        assert_eq!(host.dispatch_event(div, "click", EventDetail::default()), 1);
        assert_eq!(*seen.borrow(), vec![div]);
        assert_eq!(host.dispatch_event(div, "mouseup", EventDetail::default()), 0);

        host.remove_event_listener(&root, "click", &listener);
        assert_eq!(host.listener_count(root, "click"), 0);
    }

    #[test]
    fn test_op_log() {
        let mut host = MemoryHost::new();
        let root = host.create_container();
        assert!(host.ops().is_empty());

        let div = host.create_node("div");
        assert_eq!(host.mutation_count(), 0);
        host.append_child(&root, &div);
        assert_eq!(host.mutation_count(), 1);
        assert_eq!(host.take_ops().len(), 2);
        assert!(host.ops().is_empty());
    }
}
