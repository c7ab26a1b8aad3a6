//! Element descriptions - the immutable input of a render pass.
//!
//! An [`Element`] says *what* should be on screen: a type, an optional key
//! and ref, and props (which carry the children). Elements are cheap to
//! clone; props sit behind an `Rc` and are shared with the fibers built
//! from them.
//!
//! # Example
//!
//! ```ignore
//! use spark_fiber::{create_element, ElementType, Props, Child};
//!
//! let list = create_element(
//!     ElementType::host("ul"),
//!     Props::new().with("key", "menu"),
//!     vec![
//!         Child::from(create_element(ElementType::host("li"), Props::new(), vec!["One".into()])),
//!         Child::from(create_element(ElementType::host("li"), Props::new(), vec!["Two".into()])),
//!     ],
//! );
//! ```

use std::fmt;
use std::rc::Rc;

use crate::component::{ClassComponent, FunctionComponent};
use crate::types::{Child, Children, Key, NodeRef, PropValue, Props};

// =============================================================================
// Element Type
// =============================================================================

/// What an element renders as.
#[derive(Clone)]
pub enum ElementType {
    /// A primitive host node (`"div"`, `"box"`, ...).
    Host(Rc<str>),
    Function(FunctionComponent),
    Class(ClassComponent),
    /// Groups children without a node of its own.
    Fragment,
}

impl ElementType {
    pub fn host(tag: &str) -> Self {
        ElementType::Host(Rc::from(tag))
    }

    /// Whether a retained node of type `self` can be updated in place to `other`.
    ///
    /// Host tags compare by name; components compare by identity.
    pub fn same_type(&self, other: &ElementType) -> bool {
        match (self, other) {
            (ElementType::Host(a), ElementType::Host(b)) => a == b,
            (ElementType::Function(a), ElementType::Function(b)) => a.ptr_eq(b),
            (ElementType::Class(a), ElementType::Class(b)) => a.ptr_eq(b),
            (ElementType::Fragment, ElementType::Fragment) => true,
            _ => false,
        }
    }

    /// Host tag name, if this is a host type.
    pub fn host_tag(&self) -> Option<&str> {
        match self {
            ElementType::Host(tag) => Some(tag),
            _ => None,
        }
    }
}

impl fmt::Debug for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Host(tag) => write!(f, "Host({})", tag),
            ElementType::Function(c) => write!(f, "Function({})", c.name()),
            ElementType::Class(c) => write!(f, "Class({})", c.name()),
            ElementType::Fragment => f.write_str("Fragment"),
        }
    }
}

// =============================================================================
// Element
// =============================================================================

/// An immutable element description.
#[derive(Debug, Clone)]
pub struct Element {
    pub element_type: ElementType,
    pub key: Option<Key>,
    pub node_ref: Option<NodeRef>,
    pub props: Rc<Props>,
}

impl Element {
    pub fn new(element_type: ElementType, props: Props) -> Self {
        Self {
            element_type,
            key: None,
            node_ref: None,
            props: Rc::new(props),
        }
    }

    /// Host element shorthand.
    pub fn host(tag: &str, props: Props) -> Self {
        Self::new(ElementType::host(tag), props)
    }

    /// Fragment shorthand.
    pub fn fragment(children: impl Into<Children>) -> Self {
        Self::new(ElementType::Fragment, Props::new().with_children(children))
    }

    pub fn with_key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_ref(mut self, node_ref: NodeRef) -> Self {
        self.node_ref = Some(node_ref);
        self
    }
}

// =============================================================================
// Factory
// =============================================================================

/// Build an element from a type, a config map and a children list.
///
/// `key` and `ref` are pulled out of `config`; everything else becomes props.
/// A single primitive child becomes a text payload, anything else a list.
pub fn create_element(element_type: ElementType, config: Props, children: Vec<Child>) -> Element {
    let mut props = config;

    let key = match props.remove("key") {
        Some(PropValue::Str(s)) => Some(Key::from(s)),
        Some(PropValue::Int(n)) => Some(Key::from(n.to_string())),
        _ => None,
    };

    let node_ref = match props.remove("ref") {
        Some(PropValue::Ref(r)) => Some(r),
        _ => None,
    };

    if !children.is_empty() {
        props.set_children(Children::from_list(children));
    }

    Element {
        element_type,
        key,
        node_ref,
        props: Rc::new(props),
    }
}

/// Shorthand for a host element with children.
pub fn h(tag: &str, props: Props, children: Vec<Child>) -> Element {
    create_element(ElementType::host(tag), props, children)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_element_extracts_key_and_ref() {
        let node_ref = NodeRef::new();
        let el = create_element(
            ElementType::host("div"),
            Props::new()
                .with("key", "row-1")
                .with("ref", node_ref.clone())
                .with("id", "main"),
            vec![],
        );

        assert_eq!(el.key.as_ref().map(Key::as_str), Some("row-1"));
        assert!(el.node_ref.as_ref().is_some_and(|r| r.ptr_eq(&node_ref)));
        assert!(!el.props.contains("key"));
        assert!(!el.props.contains("ref"));
        assert_eq!(el.props.get("id"), Some(&PropValue::from("main")));
    }

    #[test]
    fn test_single_text_child_collapses() {
        let el = h("span", Props::new(), vec!["hello".into()]);
        assert_eq!(el.props.text_content(), Some("hello"));
    }

    #[test]
    fn test_multiple_children_stay_a_list() {
        let el = h(
            "ul",
            Props::new(),
            vec![
                h("li", Props::new(), vec![]).into(),
                h("li", Props::new(), vec![]).into(),
            ],
        );
        match el.props.children() {
            Children::Nodes(list) => assert_eq!(list.len(), 2),
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_int_key() {
        let el = create_element(ElementType::host("li"), Props::new().with("key", 7), vec![]);
        assert_eq!(el.key, Some(Key::from("7")));
    }

    #[test]
    fn test_same_type() {
        assert!(ElementType::host("div").same_type(&ElementType::host("div")));
        assert!(!ElementType::host("div").same_type(&ElementType::host("span")));
        assert!(!ElementType::host("div").same_type(&ElementType::Fragment));
    }
}
