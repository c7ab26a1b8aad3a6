//! Event delegation, direct listeners and state updates from handlers.
//!
//! Run with: cargo test --test events

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use spark_fiber::{
    create_root, create_root_with_config, h, Children, ClassComponent, Component, Element,
    ElementType, EventDetail, EventSystem, FiberError, FunctionComponent, HostNodeId, MemoryHost,
    NativeEvent, PropValue, Props, RenderContext, Root, RootConfig, StateMap,
};

// =============================================================================
// HELPERS
// =============================================================================

fn setup() -> (MemoryHost, HostNodeId, Root<MemoryHost>) {
    let host = MemoryHost::new();
    let container = host.create_container();
    let root = create_root(host.clone(), container);
    root.listen_to_all_events().unwrap();
    (host, container, root)
}

fn render(root: &Root<MemoryHost>, element: Element) {
    root.render(element).unwrap();
    root.flush_sync().unwrap();
}

type Log = Rc<RefCell<Vec<&'static str>>>;

fn logger(log: &Log, entry: &'static str) -> impl Fn(&spark_fiber::SyntheticEvent) + 'static {
    let log = log.clone();
    move |_| log.borrow_mut().push(entry)
}

/// `<div onClick><button onClick>go</button></div>`; returns the button node.
fn nested_buttons(
    host: &MemoryHost,
    container: HostNodeId,
    root: &Root<MemoryHost>,
    log: &Log,
) -> HostNodeId {
    let button = h(
        "button",
        Props::new().on("onClick", logger(log, "inner")),
        vec!["go".into()],
    );
    render(
        root,
        h(
            "div",
            Props::new().on("onClick", logger(log, "outer")),
            vec![button.into()],
        ),
    );
    let div = host.children(container)[0];
    host.children(div)[0]
}

// =============================================================================
// DELEGATION
// =============================================================================

#[test]
fn test_handlers_bubble_innermost_first() {
    let (host, container, root) = setup();
    let log: Log = Rc::default();
    let button = nested_buttons(&host, container, &root, &log);

    let fired = host.dispatch_event(button, "click", EventDetail::at(1, 1));

    assert_eq!(fired, 1, "only the delegated container listener is native");
    assert_eq!(*log.borrow(), vec!["inner", "outer"]);
}

#[test]
fn test_handler_props_never_reach_host() {
    let (host, container, root) = setup();
    let log: Log = Rc::default();
    let button = nested_buttons(&host, container, &root, &log);

    assert_eq!(host.property(button, "onClick"), None);
    assert_eq!(host.listener_count(button, "click"), 0);
    assert_eq!(host.listener_count(container, "click"), 1);
}

#[test]
fn test_stop_propagation() {
    let (host, container, root) = setup();
    let log: Log = Rc::default();
    let inner_log = log.clone();

    render(
        &root,
        h(
            "div",
            Props::new().on("onClick", logger(&log, "outer")),
            vec![h(
                "button",
                Props::new().on("onClick", move |event| {
                    inner_log.borrow_mut().push("inner");
                    event.stop_propagation();
                }),
                vec![],
            )
            .into()],
        ),
    );
    let button = host.children(host.children(container)[0])[0];

    let result = root
        .dispatch_event(&NativeEvent::new("click", button, EventDetail::default()))
        .unwrap();

    assert_eq!(*log.borrow(), vec!["inner"]);
    assert_eq!(result.handled, 1);
    assert!(result.propagation_stopped);
    assert_eq!(result.target, root.fiber_for_node(&button).unwrap());
}

#[test]
fn test_event_carries_target_and_current_target() {
    let (host, container, root) = setup();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen_outer = seen.clone();

    render(
        &root,
        h(
            "div",
            Props::new().on("onMousedown", move |event| {
                seen_outer
                    .borrow_mut()
                    .push((event.target(), event.current_target(), event.x()));
            }),
            vec![h("span", Props::new(), vec![]).into()],
        ),
    );
    let div = host.children(container)[0];
    let span = host.children(div)[0];

    host.dispatch_event(span, "mousedown", EventDetail::at(7, 2));

    let span_fiber = root.fiber_for_node(&span).unwrap();
    let div_fiber = root.fiber_for_node(&div).unwrap();
    assert_eq!(*seen.borrow(), vec![(span_fiber, div_fiber, 7)]);
}

#[test]
fn test_replaced_handler_is_used_after_commit() {
    let (host, container, root) = setup();
    let log: Log = Rc::default();

    render(&root, h("button", Props::new().on("onClick", logger(&log, "first")), vec![]));
    let button = host.children(container)[0];
    host.clear_ops();

    render(&root, h("button", Props::new().on("onClick", logger(&log, "second")), vec![]));
    assert_eq!(host.mutation_count(), 0);

    host.dispatch_event(button, "click", EventDetail::default());
    assert_eq!(*log.borrow(), vec!["second"]);
}

#[test]
fn test_untracked_target_is_ignored() {
    let (_host, container, root) = setup();
    let result = root
        .dispatch_event(&NativeEvent::new("click", container, EventDetail::default()))
        .unwrap();
    assert_eq!(result.target, None);
    assert_eq!(result.handled, 0);
}

#[test]
fn test_dispatch_after_unmount_fails() {
    let (host, container, root) = setup();
    root.unmount().unwrap();

    assert_eq!(host.dispatch_event(container, "click", EventDetail::default()), 0);
    assert_eq!(
        root.dispatch_event(&NativeEvent::new("click", container, EventDetail::default())),
        Err(FiberError::Unmounted)
    );
}

// =============================================================================
// DIRECT LISTENERS
// =============================================================================

#[test]
fn test_direct_mode_attaches_per_node_listeners() {
    let host = MemoryHost::new();
    let container = host.create_container();
    let root = create_root_with_config(
        host.clone(),
        container,
        RootConfig::new().event_system(EventSystem::Direct),
    );
    root.listen_to_all_events().unwrap();
    assert_eq!(host.listener_count(container, "click"), 0);

    let log: Log = Rc::default();
    render(&root, h("button", Props::new().on("onClick", logger(&log, "a")), vec![]));
    let button = host.children(container)[0];
    assert_eq!(host.listener_count(button, "click"), 1);

    host.dispatch_event(button, "click", EventDetail::default());
    assert_eq!(*log.borrow(), vec!["a"]);

    // New handler replaces the old listener
    render(&root, h("button", Props::new().on("onClick", logger(&log, "b")), vec![]));
    assert_eq!(host.listener_count(button, "click"), 1);
    host.dispatch_event(button, "click", EventDetail::default());
    assert_eq!(*log.borrow(), vec!["a", "b"]);

    // Removing the prop removes the listener
    render(&root, h("button", Props::new(), vec![]));
    assert_eq!(host.listener_count(button, "click"), 0);
}

// =============================================================================
// STATE UPDATES
// =============================================================================

struct Counter;

impl Component for Counter {
    fn initial_state(&self, props: &Props) -> StateMap {
        let start = props.get("start").and_then(PropValue::as_str).unwrap_or("0");
        StateMap::new().with("count", start.parse::<i64>().unwrap_or(0))
    }

    fn render(&self, cx: &RenderContext<'_>) -> Children {
        let count = cx.state().get_int("count").unwrap_or(0);
        let updater = cx.updater().clone();
        let bump = move |_: &spark_fiber::SyntheticEvent| {
            for _ in 0..2 {
                updater.update_state(|state| {
                    StateMap::new().with("count", state.get_int("count").unwrap_or(0) + 1)
                });
            }
        };
        Children::from(h("button", Props::new().on("onClick", bump), vec![count.into()]))
    }
}

#[test]
fn test_class_updates_apply_in_order() {
    let (host, container, root) = setup();
    let counter = ClassComponent::new("Counter", |_: &Props| Counter);

    render(&root, Element::new(ElementType::Class(counter.clone()), Props::new()));
    assert_eq!(host.inner_markup(container), "<button>0</button>");
    let button = host.children(container)[0];

    host.dispatch_event(button, "click", EventDetail::default());
    assert!(root.has_pending_work().unwrap());
    assert_eq!(host.inner_markup(container), "<button>0</button>");

    assert_eq!(root.flush_sync().unwrap(), 1);
    assert_eq!(host.inner_markup(container), "<button>2</button>");
    assert_eq!(host.children(container)[0], button);

    host.dispatch_event(button, "click", EventDetail::default());
    root.flush_sync().unwrap();
    assert_eq!(host.inner_markup(container), "<button>4</button>");
}

#[test]
fn test_set_state_merges_shallowly() {
    struct Pair;

    impl Component for Pair {
        fn initial_state(&self, _props: &Props) -> StateMap {
            StateMap::new().with("a", 1i64).with("b", 1i64)
        }

        fn render(&self, cx: &RenderContext<'_>) -> Children {
            let a = cx.state().get_int("a").unwrap_or(-1);
            let b = cx.state().get_int("b").unwrap_or(-1);
            let updater = cx.updater().clone();
            Children::from(h(
                "p",
                Props::new().on("onClick", move |_| {
                    updater.set_state(StateMap::new().with("a", 5i64));
                    updater.set_state(StateMap::new().with("a", 7i64));
                }),
                vec![format!("{a}-{b}").into()],
            ))
        }
    }

    let (host, container, root) = setup();
    let pair = ClassComponent::new("Pair", |_: &Props| Pair);
    render(&root, Element::new(ElementType::Class(pair), Props::new()));

    let p = host.children(container)[0];
    host.dispatch_event(p, "click", EventDetail::default());
    root.flush_sync().unwrap();
    assert_eq!(host.text_content(p), "7-1");
}

#[test]
fn test_initial_state_reads_props() {
    let (host, container, root) = setup();
    let counter = ClassComponent::new("Counter", |_: &Props| Counter);
    render(
        &root,
        Element::new(ElementType::Class(counter), Props::new().with("start", "40")),
    );
    assert_eq!(host.text_content(container), "40");
}

// =============================================================================
// RE-ENTRANCY
// =============================================================================

#[test]
fn test_render_from_inside_a_pass_is_rejected() {
    let (_host, _container, root) = setup();
    let slot: Rc<RefCell<Option<Root<MemoryHost>>>> = Rc::default();
    let outcome: Rc<Cell<Option<bool>>> = Rc::default();

    let nested = {
        let slot = slot.clone();
        let outcome = outcome.clone();
        FunctionComponent::new("Nested", move |_: &Props| {
            if let Some(root) = slot.borrow().as_ref() {
                let result = root.render(h("x", Props::new(), vec![]));
                outcome.set(Some(result == Err(FiberError::Reentrant)));
            }
            Children::None
        })
    };
    *slot.borrow_mut() = Some(root.clone());

    render(&root, Element::new(ElementType::Function(nested), Props::new()));
    assert_eq!(outcome.get(), Some(true));

    // Break the cycle through the component closure
    slot.borrow_mut().take();
}

#[test]
fn test_handler_may_flush_the_root() {
    let (host, container, root) = setup();
    let inner = root.clone();
    render(
        &root,
        h(
            "button",
            Props::new().on("onClick", move |_| {
                inner.render(h("done", Props::new(), vec![])).unwrap();
                inner.flush_sync().unwrap();
            }),
            vec![],
        ),
    );

    let button = host.children(container)[0];
    host.dispatch_event(button, "click", EventDetail::default());
    assert_eq!(host.inner_markup(container), "<done></done>");
}
