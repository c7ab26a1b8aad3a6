//! Core types for spark-fiber.
//!
//! These are the values that flow from element descriptions through the
//! reconciler and into the host adapter: keys, prop values, style maps,
//! event handlers, refs and the children of an element.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::element::Element;
use crate::events::SyntheticEvent;
use crate::fiber::FiberId;

/// Prop name prefix that marks an event handler (`onClick`, `onMousedown`, ...).
pub const EVENT_PROP_PREFIX: &str = "on";

/// Reserved prop name for an element's children.
pub const CHILDREN_PROP: &str = "children";

/// Reserved prop name for the per-sub-key style map.
pub const STYLE_PROP: &str = "style";

// =============================================================================
// Key
// =============================================================================

/// Stable identity of an element among its siblings.
///
/// Keys only decide which retained node is *reused*; ordering always follows
/// the order of the children list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(Rc<str>);

impl Key {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self(Rc::from(value))
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self(Rc::from(value))
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        Self(Rc::from(value.to_string()))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Event Handler
// =============================================================================

/// A logical event handler stored in an element's props.
///
/// Two handlers are equal only when they share the same closure, so an
/// unchanged `Rc` across renders produces no listener churn.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&SyntheticEvent)>);

impl EventHandler {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&SyntheticEvent) + 'static,
    {
        Self(Rc::new(handler))
    }

    /// Invoke the handler.
    pub fn call(&self, event: &SyntheticEvent) {
        (self.0)(event)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({:p})", Rc::as_ptr(&self.0))
    }
}

// =============================================================================
// Node Ref
// =============================================================================

/// Output slot filled with the committed fiber of a host element.
///
/// Attached during commit, cleared when the element is deleted. Use
/// [`crate::Root::host_node`] to reach the host node behind it.
#[derive(Clone, Default)]
pub struct NodeRef(Rc<Cell<Option<FiberId>>>);

impl NodeRef {
    pub fn new() -> Self {
        Self::default()
    }

    /// The committed fiber currently attached, if any.
    pub fn get(&self) -> Option<FiberId> {
        self.0.get()
    }

    pub(crate) fn set(&self, fiber: Option<FiberId>) {
        self.0.set(fiber);
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeRef").field(&self.0.get()).finish()
    }
}

// =============================================================================
// Style
// =============================================================================

/// Style map diffed per sub-key instead of being replaced wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Style(BTreeMap<String, String>);

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

// =============================================================================
// Prop Value
// =============================================================================

/// A single prop value.
///
/// `Null` doubles as the "clear this property" marker inside update payloads.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PropValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Style(Style),
    Handler(EventHandler),
    Ref(NodeRef),
}

impl PropValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_style(&self) -> Option<&Style> {
        match self {
            PropValue::Style(style) => Some(style),
            _ => None,
        }
    }

    pub fn as_handler(&self) -> Option<&EventHandler> {
        match self {
            PropValue::Handler(handler) => Some(handler),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropValue::Null)
    }

    /// Text form used when a value is rendered as host text.
    pub fn to_text(&self) -> Option<String> {
        match self {
            PropValue::Str(s) => Some(s.clone()),
            PropValue::Int(n) => Some(n.to_string()),
            PropValue::Float(n) => Some(n.to_string()),
            PropValue::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Int(value as i64)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}

impl From<Style> for PropValue {
    fn from(value: Style) -> Self {
        PropValue::Style(value)
    }
}

impl From<EventHandler> for PropValue {
    fn from(value: EventHandler) -> Self {
        PropValue::Handler(value)
    }
}

impl From<NodeRef> for PropValue {
    fn from(value: NodeRef) -> Self {
        PropValue::Ref(value)
    }
}

/// True for prop names that follow the handler naming convention (`onX`).
pub fn is_event_prop(name: &str) -> bool {
    name.len() > EVENT_PROP_PREFIX.len()
        && name.starts_with(EVENT_PROP_PREFIX)
        && name[EVENT_PROP_PREFIX.len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_uppercase())
}

// =============================================================================
// Children
// =============================================================================

/// One entry of a children list.
#[derive(Debug, Clone)]
pub enum Child {
    Element(Element),
    Text(String),
}

impl From<Element> for Child {
    fn from(value: Element) -> Self {
        Child::Element(value)
    }
}

impl From<&str> for Child {
    fn from(value: &str) -> Self {
        Child::Text(value.to_string())
    }
}

impl From<String> for Child {
    fn from(value: String) -> Self {
        Child::Text(value)
    }
}

impl From<i64> for Child {
    fn from(value: i64) -> Self {
        Child::Text(value.to_string())
    }
}

/// The children of an element, or the output of a component.
///
/// A lone primitive is kept as `Text` so host elements can take it as direct
/// text content instead of allocating a text node for it.
#[derive(Debug, Clone, Default)]
pub enum Children {
    #[default]
    None,
    Text(String),
    Nodes(Vec<Child>),
}

impl Children {
    /// Collapse a list the way element factories do: no entries → `None`,
    /// a single primitive → `Text`, anything else → `Nodes`.
    pub fn from_list(mut list: Vec<Child>) -> Self {
        match list.len() {
            0 => Children::None,
            1 if matches!(list[0], Child::Text(_)) => match list.pop() {
                Some(Child::Text(text)) => Children::Text(text),
                _ => Children::None,
            },
            _ => Children::Nodes(list),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Children::None)
    }

    /// The primitive text payload, if that is all these children are.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Children::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<Element> for Children {
    fn from(value: Element) -> Self {
        Children::Nodes(vec![Child::Element(value)])
    }
}

impl From<Option<Element>> for Children {
    fn from(value: Option<Element>) -> Self {
        value.map(Children::from).unwrap_or_default()
    }
}

impl From<&str> for Children {
    fn from(value: &str) -> Self {
        Children::Text(value.to_string())
    }
}

impl From<String> for Children {
    fn from(value: String) -> Self {
        Children::Text(value)
    }
}

impl From<Vec<Element>> for Children {
    fn from(value: Vec<Element>) -> Self {
        Children::Nodes(value.into_iter().map(Child::Element).collect())
    }
}

impl From<Vec<Child>> for Children {
    fn from(value: Vec<Child>) -> Self {
        Children::Nodes(value)
    }
}

// =============================================================================
// Props
// =============================================================================

/// Element props: a name → value map plus the children.
///
/// Stored in a `BTreeMap` so diffs and host calls come out in a stable order.
#[derive(Debug, Clone, Default)]
pub struct Props {
    values: BTreeMap<String, PropValue>,
    children: Children,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Props of a host text node: just the text payload.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            values: BTreeMap::new(),
            children: Children::Text(content.into()),
        }
    }

    /// Builder-style setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Builder-style handler setter.
    pub fn on<F>(self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&SyntheticEvent) + 'static,
    {
        self.with(name, EventHandler::new(handler))
    }

    pub fn with_style(self, style: Style) -> Self {
        self.with(STYLE_PROP, style)
    }

    pub fn with_children(mut self, children: impl Into<Children>) -> Self {
        self.children = children.into();
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<PropValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<PropValue> {
        self.values.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Iterate non-children props in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn children(&self) -> &Children {
        &self.children
    }

    pub fn set_children(&mut self, children: Children) {
        self.children = children;
    }

    /// Text payload of a host text fiber (or a host element's text content).
    pub fn text_content(&self) -> Option<&str> {
        self.children.as_text()
    }

    pub fn style(&self) -> Option<&Style> {
        self.get(STYLE_PROP).and_then(PropValue::as_style)
    }
}

// =============================================================================
// Component State
// =============================================================================

/// Class component state: a map shallow-merged by each queued update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateMap(BTreeMap<String, PropValue>);

impl StateMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.0.get(name)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        match self.0.get(name) {
            Some(PropValue::Int(n)) => Some(*n),
            _ => None,
        }
    }

    /// Shallow merge: every entry of `partial` overwrites the same key here.
    pub fn merge(&mut self, partial: StateMap) {
        self.0.extend(partial.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
