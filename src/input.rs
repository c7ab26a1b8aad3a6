//! Input - terminal pointer events as native host events.
//!
//! Bridges crossterm's mouse events to the memory host: each event is
//! hit-tested against a [`ComputedLayout`], turned into `mousedown`/`mouseup`
//! native events on the node under the cursor, and a press/release pair on
//! the same node and button additionally yields `click` (and `dblclick` when
//! it follows another click quickly).
//!
//! # Example
//!
//! ```ignore
//! use spark_fiber::input::{enable_mouse, poll_event, InputEvent, PointerTracker};
//!
//! enable_mouse()?;
//! let mut pointer = PointerTracker::new();
//! loop {
//!     if let Some(InputEvent::Mouse(mouse)) = poll_event(Duration::from_millis(16))? {
//!         let layout = compute_layout(&host, container, width, height);
//!         for native in pointer.translate(mouse, &layout, Instant::now()) {
//!             host.dispatch_event(native.target, &native.event_type, native.detail);
//!         }
//!         root.work_slice()?;
//!     }
//! }
//! ```

use std::io::stdout;
use std::time::{Duration, Instant};

use crossterm::event::{
    poll, read, DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent, KeyModifiers,
    MouseButton as CrosstermMouseButton, MouseEvent as CrosstermMouseEvent, MouseEventKind,
};
use crossterm::execute;

use crate::events::{EventDetail, Modifiers, MouseButton, NativeEvent};
use crate::host::{HostNodeId, MemoryHost};
use crate::layout::ComputedLayout;

/// Two clicks on the same node within this window make a double click.
pub const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(400);

// =============================================================================
// INPUT EVENT ENUM
// =============================================================================

/// Terminal events the bridge cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Mouse(CrosstermMouseEvent),
    /// Terminal resize (new width, height)
    Resize(u16, u16),
    /// Anything else
    None,
}

// =============================================================================
// CONVERSION
// =============================================================================

fn convert_mouse_button(btn: CrosstermMouseButton) -> MouseButton {
    match btn {
        CrosstermMouseButton::Left => MouseButton::Left,
        CrosstermMouseButton::Right => MouseButton::Right,
        CrosstermMouseButton::Middle => MouseButton::Middle,
    }
}

fn convert_modifiers(mods: KeyModifiers) -> Modifiers {
    Modifiers {
        ctrl: mods.contains(KeyModifiers::CONTROL),
        alt: mods.contains(KeyModifiers::ALT),
        shift: mods.contains(KeyModifiers::SHIFT),
        meta: mods.contains(KeyModifiers::META) || mods.contains(KeyModifiers::SUPER),
    }
}

/// Native event detail for a crossterm mouse event.
pub fn convert_mouse_event(event: &CrosstermMouseEvent) -> EventDetail {
    let button = match event.kind {
        MouseEventKind::Down(btn) | MouseEventKind::Up(btn) | MouseEventKind::Drag(btn) => {
            convert_mouse_button(btn)
        }
        _ => MouseButton::None,
    };
    EventDetail {
        x: event.column,
        y: event.row,
        button,
        modifiers: convert_modifiers(event.modifiers),
        click_count: 0,
    }
}

// =============================================================================
// POINTER TRACKING
// =============================================================================

/// Press/release state needed to synthesise clicks.
#[derive(Debug, Default)]
pub struct PointerTracker {
    pressed: Option<(HostNodeId, MouseButton)>,
    last_click: Option<(HostNodeId, Instant)>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Native events produced by one crossterm mouse event, in dispatch order.
    ///
    /// Events over no laid-out node produce nothing; moves, drags and
    /// scrolls are ignored.
    pub fn translate(
        &mut self,
        event: CrosstermMouseEvent,
        layout: &ComputedLayout,
        now: Instant,
    ) -> Vec<NativeEvent<HostNodeId>> {
        let detail = convert_mouse_event(&event);
        let target = layout.hit_test(event.column, event.row);

        match event.kind {
            MouseEventKind::Down(_) => {
                self.pressed = target.map(|node| (node, detail.button));
                target
                    .map(|node| vec![NativeEvent::new("mousedown", node, detail)])
                    .unwrap_or_default()
            }
            MouseEventKind::Up(_) => {
                let pressed = self.pressed.take();
                let Some(node) = target else {
                    return Vec::new();
                };

                let mut out = vec![NativeEvent::new("mouseup", node, detail)];
                if pressed != Some((node, detail.button)) {
                    return out;
                }

                out.push(NativeEvent::new(
                    "click",
                    node,
                    EventDetail {
                        click_count: 1,
                        ..detail
                    },
                ));

                let double = self
                    .last_click
                    .is_some_and(|(last, at)| {
                        last == node && now.duration_since(at) <= DOUBLE_CLICK_WINDOW
                    });
                if double {
                    out.push(NativeEvent::new(
                        "dblclick",
                        node,
                        EventDetail {
                            click_count: 2,
                            ..detail
                        },
                    ));
                    self.last_click = None;
                } else {
                    self.last_click = Some((node, now));
                }
                out
            }
            _ => Vec::new(),
        }
    }
}

/// Fire translated events on the host. Returns the native listeners invoked.
pub fn dispatch_to_host(host: &MemoryHost, events: &[NativeEvent<HostNodeId>]) -> usize {
    events
        .iter()
        .map(|event| host.dispatch_event(event.target, &event.event_type, event.detail))
        .sum()
}

// =============================================================================
// EVENT POLLING
// =============================================================================

/// Poll for an event with timeout. `None` if nothing arrived.
pub fn poll_event(timeout: Duration) -> std::io::Result<Option<InputEvent>> {
    if poll(timeout)? {
        Ok(Some(read_event()?))
    } else {
        Ok(None)
    }
}

/// Read the next event (blocking).
pub fn read_event() -> std::io::Result<InputEvent> {
    match read()? {
        CrosstermEvent::Mouse(mouse) => Ok(InputEvent::Mouse(mouse)),
        CrosstermEvent::Resize(w, h) => Ok(InputEvent::Resize(w, h)),
        _ => Ok(InputEvent::None),
    }
}

// =============================================================================
// MOUSE CAPTURE
// =============================================================================

pub fn enable_mouse() -> std::io::Result<()> {
    execute!(stdout(), EnableMouseCapture)
}

pub fn disable_mouse() -> std::io::Result<()> {
    execute!(stdout(), DisableMouseCapture)
}

// =============================================================================
// TESTS
// =============================================================================
