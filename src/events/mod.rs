//! Events - native events, synthetic events and delegation.
//!
//! The host only ever sees one listener per tracked event type, installed on
//! the root container. When one fires, [`delegation`] maps the native target
//! back to its fiber and walks `return` links to the root, invoking every
//! matching handler prop on the way (target first, root last).
//!
//! # Naming
//!
//! A native type maps to its handler prop by capitalising it and adding the
//! `on` prefix: `click` → `onClick`, `mousedown` → `onMousedown`.

pub mod delegation;

use std::cell::Cell;

use crate::fiber::FiberId;
use crate::types::EVENT_PROP_PREFIX;

/// Native event types the root listens to by default.
pub const TRACKED_EVENTS: [&str; 4] = ["click", "mousedown", "mouseup", "dblclick"];

// =============================================================================
// Event Detail
// =============================================================================

/// Mouse button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    #[default]
    None,
}

/// Modifier keys held during the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

/// Fields a native event carries besides its type and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventDetail {
    /// X coordinate (0-indexed)
    pub x: u16,
    /// Y coordinate (0-indexed)
    pub y: u16,
    pub button: MouseButton,
    pub modifiers: Modifiers,
    /// 1 for click, 2 for dblclick, 0 otherwise.
    pub click_count: u8,
}

impl EventDetail {
    pub fn at(x: u16, y: u16) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }
}

// =============================================================================
// Native Event
// =============================================================================

/// An event as delivered by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeEvent<N> {
    pub event_type: String,
    pub target: N,
    pub detail: EventDetail,
}

impl<N> NativeEvent<N> {
    pub fn new(event_type: impl Into<String>, target: N, detail: EventDetail) -> Self {
        Self {
            event_type: event_type.into(),
            target,
            detail,
        }
    }
}

// =============================================================================
// Synthetic Event
// =============================================================================

/// What a logical handler receives.
///
/// One synthetic event is shared by every handler of a dispatch, so
/// `stop_propagation` in an inner handler keeps outer handlers from running.
#[derive(Debug)]
pub struct SyntheticEvent {
    event_type: String,
    detail: EventDetail,
    target: Option<FiberId>,
    current_target: Cell<Option<FiberId>>,
    propagation_stopped: Cell<bool>,
    default_prevented: Cell<bool>,
}

impl SyntheticEvent {
    pub fn new(
        event_type: impl Into<String>,
        detail: EventDetail,
        target: Option<FiberId>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            detail,
            target,
            current_target: Cell::new(target),
            propagation_stopped: Cell::new(false),
            default_prevented: Cell::new(false),
        }
    }

    /// Native event type (`"click"`, ...).
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn detail(&self) -> &EventDetail {
        &self.detail
    }

    pub fn x(&self) -> u16 {
        self.detail.x
    }

    pub fn y(&self) -> u16 {
        self.detail.y
    }

    /// Fiber the event originated from.
    pub fn target(&self) -> Option<FiberId> {
        self.target
    }

    /// Fiber whose handler is running.
    pub fn current_target(&self) -> Option<FiberId> {
        self.current_target.get()
    }

    pub(crate) fn set_current_target(&self, fiber: FiberId) {
        self.current_target.set(Some(fiber));
    }

    /// Ends the delegated walk: ancestors past the current handler are skipped.
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    /// Recorded only; the host decides what a default action is.
    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

// =============================================================================
// Names
// =============================================================================

/// Handler prop name for a native event type: `click` → `onClick`.
pub fn logical_event_name(native_type: &str) -> String {
    let mut chars = native_type.chars();
    match chars.next() {
        Some(first) => format!(
            "{}{}{}",
            EVENT_PROP_PREFIX,
            first.to_ascii_uppercase(),
            chars.as_str()
        ),
        None => EVENT_PROP_PREFIX.to_string(),
    }
}

/// Native event type for a handler prop name: `onClick` → `click`.
pub fn native_event_name(prop_name: &str) -> String {
    prop_name
        .strip_prefix(EVENT_PROP_PREFIX)
        .unwrap_or(prop_name)
        .to_ascii_lowercase()
}
