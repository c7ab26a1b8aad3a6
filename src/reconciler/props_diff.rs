//! Property diff - the host delta between two props generations.
//!
//! # Policy
//!
//! - Props present before but gone now are cleared (`PropValue::Null`).
//! - `style` is diffed per sub-key: removed sub-keys map to `""`, changed and
//!   added sub-keys carry their new value.
//! - `children` only appears when it is a primitive text payload (and is
//!   cleared when a text payload gives way to element children).
//! - Handler props (`onX`) never reach the generic property list. They are
//!   reported as listener changes instead: the old handler is removed when it
//!   changed or disappeared, the new one added when it changed or appeared.

use crate::events::native_event_name;
use crate::types::{
    is_event_prop, EventHandler, PropValue, Props, Style, CHILDREN_PROP, STYLE_PROP,
};

/// One listener (de)registration implied by a handler prop change.
#[derive(Debug, Clone, PartialEq)]
pub enum ListenerChange {
    Remove { event: String, handler: EventHandler },
    Add { event: String, handler: EventHandler },
}

/// Host delta for one node.
///
/// `properties` is the flat name/value update list in application order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdatePayload {
    pub properties: Vec<(String, PropValue)>,
    pub listeners: Vec<ListenerChange>,
}

impl UpdatePayload {
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.listeners.is_empty()
    }

    /// Value scheduled for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

/// Compute the update list that turns `old` into `new`.
pub fn diff_properties(old: &Props, new: &Props) -> UpdatePayload {
    let mut payload = UpdatePayload::default();

    // Removed props
    for (name, old_value) in old.iter() {
        if new.contains(name) {
            continue;
        }
        if is_event_prop(name) {
            if let PropValue::Handler(handler) = old_value {
                payload.listeners.push(ListenerChange::Remove {
                    event: native_event_name(name),
                    handler: handler.clone(),
                });
            }
        } else if name == STYLE_PROP {
            if let Some(style) = old_value.as_style() {
                let cleared = diff_style(Some(style), &Style::new());
                if !cleared.is_empty() {
                    payload.properties.push((name.to_string(), PropValue::Style(cleared)));
                }
            }
        } else {
            payload.properties.push((name.to_string(), PropValue::Null));
        }
    }

    // Added or changed props
    for (name, new_value) in new.iter() {
        let old_value = old.get(name);
        if old_value == Some(new_value) {
            continue;
        }

        if is_event_prop(name) {
            if let Some(PropValue::Handler(handler)) = old_value {
                payload.listeners.push(ListenerChange::Remove {
                    event: native_event_name(name),
                    handler: handler.clone(),
                });
            }
            if let PropValue::Handler(handler) = new_value {
                payload.listeners.push(ListenerChange::Add {
                    event: native_event_name(name),
                    handler: handler.clone(),
                });
            }
        } else if name == STYLE_PROP {
            let old_style = old_value.and_then(PropValue::as_style);
            let new_style = new_value.as_style().cloned().unwrap_or_default();
            let delta = diff_style(old_style, &new_style);
            if !delta.is_empty() {
                payload.properties.push((name.to_string(), PropValue::Style(delta)));
            }
        } else {
            payload.properties.push((name.to_string(), new_value.clone()));
        }
    }

    // Primitive children become host text content
    match (old.text_content(), new.text_content()) {
        (old_text, Some(new_text)) if old_text != Some(new_text) => {
            payload
                .properties
                .push((CHILDREN_PROP.to_string(), PropValue::Str(new_text.to_string())));
        }
        (Some(_), None) => {
            payload.properties.push((CHILDREN_PROP.to_string(), PropValue::Null));
        }
        _ => {}
    }

    payload
}

/// Per-sub-key style delta. Cleared sub-keys map to the empty string.
fn diff_style(old: Option<&Style>, new: &Style) -> Style {
    let mut delta = Style::new();
    if let Some(old) = old {
        for (key, _) in old.iter() {
            if new.get(key).is_none() {
                delta.set(key, "");
            }
        }
    }
    for (key, value) in new.iter() {
        if old.and_then(|o| o.get(key)) != Some(value) {
            delta.set(key, value);
        }
    }
    delta
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_props_empty_delta() {
        let handler = EventHandler::new(|_| {});
        let props = Props::new()
            .with("id", "a")
            .with("onClick", handler)
            .with_style(Style::new().with("color", "red"))
            .with_children("hi");
        assert!(diff_properties(&props, &props.clone()).is_empty());
    }

    #[test]
    fn test_removed_prop_is_cleared() {
        let old = Props::new().with("color", "red").with("size", 2);
        let new = Props::new().with("size", 2);

        let payload = diff_properties(&old, &new);
        assert_eq!(
            payload.properties,
            vec![("color".to_string(), PropValue::Null)]
        );
        assert!(payload.get("size").is_none());
    }

    #[test]
    fn test_style_diffed_per_sub_key() {
        let old = Props::new().with_style(Style::new().with("color", "red").with("width", "10"));
        let new = Props::new().with_style(Style::new().with("width", "12").with("height", "3"));

        let payload = diff_properties(&old, &new);
        let style = payload.get("style").and_then(PropValue::as_style).cloned();
        let style = style.unwrap_or_default();
        assert_eq!(style.get("color"), Some(""));
        assert_eq!(style.get("width"), Some("12"));
        assert_eq!(style.get("height"), Some("3"));
        assert_eq!(style.len(), 3);
    }

    #[test]
    fn test_removed_style_clears_every_sub_key() {
        let old = Props::new().with_style(Style::new().with("color", "red"));
        let payload = diff_properties(&old, &Props::new());
        let style = payload.get("style").and_then(PropValue::as_style).cloned();
        assert_eq!(style, Some(Style::new().with("color", "")));
    }

    #[test]
    fn test_text_children_only() {
        let old = Props::new().with_children("a");
        let new = Props::new().with_children("b");
        assert_eq!(
            diff_properties(&old, &new).get("children"),
            Some(&PropValue::from("b"))
        );

        let nodes = Props::new().with_children(vec![crate::element::Element::host(
            "span",
            Props::new(),
        )]);
        assert!(diff_properties(&Props::new(), &nodes).is_empty());
        assert_eq!(
            diff_properties(&old, &nodes).get("children"),
            Some(&PropValue::Null)
        );
    }

    #[test]
    fn test_handlers_become_listener_changes() {
        let first = EventHandler::new(|_| {});
        let second = EventHandler::new(|_| {});
        let old = Props::new().with("onClick", first.clone()).with("onMouseup", first.clone());
        let new = Props::new().with("onClick", second.clone());

        let payload = diff_properties(&old, &new);
        assert!(payload.properties.is_empty());
        assert_eq!(
            payload.listeners,
            vec![
                ListenerChange::Remove {
                    event: "mouseup".to_string(),
                    handler: first.clone(),
                },
                ListenerChange::Remove {
                    event: "click".to_string(),
                    handler: first,
                },
                ListenerChange::Add {
                    event: "click".to_string(),
                    handler: second,
                },
            ]
        );
    }

    #[test]
    fn test_initial_properties_from_empty() {
        let props = Props::new().with("id", "x").with_children("hello");
        let payload = diff_properties(&Props::new(), &props);
        assert_eq!(
            payload.properties,
            vec![
                ("id".to_string(), PropValue::from("x")),
                ("children".to_string(), PropValue::from("hello")),
            ]
        );
    }
}
