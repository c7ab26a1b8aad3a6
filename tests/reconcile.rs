//! End-to-end reconciliation against the in-memory host.
//!
//! Run with: cargo test --test reconcile

use spark_fiber::{
    create_root, h, Child, Children, Element, ElementType, FunctionComponent, HostNodeId, HostOp,
    MemoryHost, NodeRef, PropValue, Props, Root, Style,
};

// =============================================================================
// HELPERS
// =============================================================================

fn setup() -> (MemoryHost, HostNodeId, Root<MemoryHost>) {
    let host = MemoryHost::new();
    let container = host.create_container();
    let root = create_root(host.clone(), container);
    (host, container, root)
}

fn render(root: &Root<MemoryHost>, element: Element) {
    root.render(element).unwrap();
    root.flush_sync().unwrap();
}

fn keyed_list(keys: &[&str]) -> Element {
    h(
        "ul",
        Props::new(),
        keys.iter()
            .map(|key| Child::from(h("li", Props::new(), vec![(*key).into()]).with_key(*key)))
            .collect(),
    )
}

// =============================================================================
// MOUNT AND UPDATE
// =============================================================================

#[test]
fn test_initial_mount() {
    let (host, container, root) = setup();
    render(
        &root,
        h(
            "div",
            Props::new().with("id", "app"),
            vec![h("span", Props::new(), vec!["hi".into()]).into(), "tail".into()],
        ),
    );

    assert_eq!(
        host.inner_markup(container),
        "<div id=\"app\"><span>hi</span>tail</div>"
    );
}

#[test]
fn test_identical_rerender_touches_nothing() {
    let (host, _container, root) = setup();
    let app = || {
        h(
            "div",
            Props::new()
                .with("id", "app")
                .with_style(Style::new().with("width", "10"))
                .on("onClick", |_| {}),
            vec![h("span", Props::new(), vec!["hi".into()]).into(), "tail".into()],
        )
    };

    render(&root, app());
    host.clear_ops();

    render(&root, app());
    assert_eq!(host.mutation_count(), 0, "ops: {:?}", host.ops());
}

#[test]
fn test_text_only_children_become_text_content() {
    let (host, container, root) = setup();
    render(&root, h("p", Props::new(), vec!["hello".into()]));

    let p = host.children(container)[0];
    assert!(host.children(p).is_empty());
    assert_eq!(host.text_content(p), "hello");

    let fiber = root.fiber_for_node(&p).unwrap().unwrap();
    assert!(root.with_tree(|tree| tree[fiber].child.is_none()).unwrap());

    // Switching to element children clears the text content
    render(
        &root,
        h("p", Props::new(), vec!["a".into(), h("b", Props::new(), vec![]).into()]),
    );
    assert_eq!(host.children(container)[0], p);
    assert_eq!(host.inner_markup(container), "<p>a<b></b></p>");
}

#[test]
fn test_removed_props_are_cleared() {
    let (host, container, root) = setup();
    render(
        &root,
        h(
            "div",
            Props::new()
                .with("id", "a")
                .with("title", "t")
                .with_style(Style::new().with("width", "10")),
            vec![],
        ),
    );
    let div = host.children(container)[0];

    render(&root, h("div", Props::new().with("id", "b"), vec![]));

    assert_eq!(host.children(container)[0], div);
    assert_eq!(host.property(div, "id"), Some(PropValue::from("b")));
    assert_eq!(host.property(div, "title"), None);
    assert!(host.style(div).is_empty());
    assert_eq!(host.inner_markup(container), "<div id=\"b\"></div>");
}

#[test]
fn test_changed_text_node_updates_in_place() {
    let (host, container, root) = setup();
    render(&root, h("p", Props::new(), vec!["a".into(), "b".into()]));
    let before = host.children(host.children(container)[0]);

    render(&root, h("p", Props::new(), vec!["a".into(), "c".into()]));
    let after = host.children(host.children(container)[0]);

    assert_eq!(before, after);
    assert_eq!(host.inner_markup(container), "<p>ac</p>");
}

#[test]
fn test_type_change_replaces_node() {
    let (host, container, root) = setup();
    render(&root, h("div", Props::new(), vec![]));
    let div = host.children(container)[0];

    render(&root, h("section", Props::new(), vec![]));
    assert_eq!(host.inner_markup(container), "<section></section>");
    assert!(!host.children(container).contains(&div));
}

// =============================================================================
// DOUBLE BUFFERING
// =============================================================================

#[test]
fn test_generations_alternate() {
    let (_host, _container, root) = setup();

    render(&root, h("div", Props::new(), vec![]));
    let first = root.current().unwrap();

    render(&root, h("div", Props::new(), vec![]));
    let second = root.current().unwrap();

    assert_ne!(first, second);
    assert!(root.work_in_progress().unwrap().is_none());
    root.with_tree(|tree| {
        assert_eq!(tree[second].alternate, Some(first));
        assert_eq!(tree[first].alternate, Some(second));
    })
    .unwrap();

    // A third pass reuses the first slot
    render(&root, h("div", Props::new(), vec![]));
    assert_eq!(root.current().unwrap(), first);
}

// =============================================================================
// KEYED CHILDREN
// =============================================================================

#[test]
fn test_keyed_reorder_moves_nodes() {
    let (host, container, root) = setup();
    render(&root, keyed_list(&["a", "b", "c"]));
    let ul = host.children(container)[0];
    let before = host.children(ul);

    render(&root, keyed_list(&["c", "a", "b"]));

    assert_eq!(host.children(ul), vec![before[2], before[0], before[1]]);
    assert_eq!(
        host.inner_markup(container),
        "<ul><li>c</li><li>a</li><li>b</li></ul>"
    );
}

#[test]
fn test_keyed_insert_and_remove() {
    let (host, container, root) = setup();
    render(&root, keyed_list(&["a", "b", "c"]));
    let ul = host.children(container)[0];
    let before = host.children(ul);

    render(&root, keyed_list(&["a", "x", "c"]));

    let after = host.children(ul);
    assert_eq!(after.len(), 3);
    assert_eq!(after[0], before[0]);
    assert_eq!(after[2], before[2]);
    assert!(!host.contains(before[1]) || host.parent(before[1]).is_none());
    assert_eq!(
        host.inner_markup(container),
        "<ul><li>a</li><li>x</li><li>c</li></ul>"
    );
}

#[test]
fn test_insert_at_front_uses_insert_before() {
    let (host, container, root) = setup();
    render(&root, keyed_list(&["b", "c"]));
    let ul = host.children(container)[0];

    render(&root, keyed_list(&["a", "b", "c"]));
    assert_eq!(host.children(ul).len(), 3);
    assert_eq!(
        host.inner_markup(container),
        "<ul><li>a</li><li>b</li><li>c</li></ul>"
    );
}

#[test]
fn test_duplicate_keys_leave_no_stale_node() {
    let (host, container, root) = setup();
    let item = |text: &str, key: &str| {
        Child::from(h("li", Props::new(), vec![text.into()]).with_key(key))
    };

    render(&root, h("ul", Props::new(), vec![item("a", "k"), item("b", "k")]));
    let ul = host.children(container)[0];
    let before = host.children(ul);

    render(&root, h("ul", Props::new(), vec![item("c", "j"), item("d", "k")]));

    assert_eq!(host.inner_markup(container), "<ul><li>c</li><li>d</li></ul>");
    assert_eq!(host.children(ul)[1], before[1]);
    assert_eq!(host.parent(before[0]), None);
    assert_eq!(root.fiber_for_node(&before[0]).unwrap(), None);
    assert_eq!(root.last_commit().unwrap().unwrap().deletions, 1);
}

// =============================================================================
// COMMIT SUMMARY
// =============================================================================

/// (removals, insertions or moves, creations) in the host op log.
fn structural_ops(host: &MemoryHost) -> (usize, usize, usize) {
    let ops = host.take_ops();
    let count = |f: fn(&HostOp) -> bool| ops.iter().filter(|op| f(op)).count();
    (
        count(|op| matches!(op, HostOp::RemoveChild { .. })),
        count(|op| matches!(op, HostOp::AppendChild { .. } | HostOp::InsertBefore { .. })),
        count(|op| matches!(op, HostOp::CreateNode { .. })),
    )
}

#[test]
fn test_summary_matches_structural_change() {
    let (host, _container, root) = setup();
    assert_eq!(root.last_commit().unwrap(), None);

    render(&root, keyed_list(&["a", "b"]));
    host.clear_ops();

    // Remove one, add one
    render(&root, keyed_list(&["b", "c"]));
    let summary = root.last_commit().unwrap().unwrap();
    assert_eq!((summary.deletions, summary.placements, summary.updates), (1, 1, 0));
    assert_eq!(structural_ops(&host), (1, 1, 1));

    // Pure move
    render(&root, keyed_list(&["a", "b", "c"]));
    host.clear_ops();
    render(&root, keyed_list(&["c", "a", "b"]));
    let summary = root.last_commit().unwrap().unwrap();
    assert_eq!((summary.deletions, summary.placements, summary.updates), (0, 2, 0));
    assert_eq!(structural_ops(&host), (0, 2, 0));

    // Replace the middle
    render(&root, keyed_list(&["c", "x", "b"]));
    let summary = root.last_commit().unwrap().unwrap();
    assert_eq!((summary.deletions, summary.placements, summary.updates), (1, 1, 0));
    assert_eq!(structural_ops(&host), (1, 1, 1));

    // Identical list
    render(&root, keyed_list(&["c", "x", "b"]));
    assert_eq!(root.last_commit().unwrap(), Some(Default::default()));
    assert_eq!(structural_ops(&host), (0, 0, 0));
}

// =============================================================================
// COMPONENTS
// =============================================================================

#[test]
fn test_function_component_renders_host_children() {
    let (host, container, root) = setup();
    let greeting = FunctionComponent::new("Greeting", |props: &Props| {
        let name = props.get("name").and_then(PropValue::as_str).unwrap_or("nobody").to_string();
        Children::from(h("b", Props::new(), vec![name.into()]))
    });

    render(
        &root,
        h(
            "div",
            Props::new(),
            vec![Element::new(
                ElementType::Function(greeting.clone()),
                Props::new().with("name", "ada"),
            )
            .into()],
        ),
    );
    assert_eq!(host.inner_markup(container), "<div><b>ada</b></div>");
}

#[test]
fn test_deleting_component_removes_its_host_nodes() {
    let (host, container, root) = setup();
    let pair = FunctionComponent::new("Pair", |_: &Props| {
        Children::from(vec![
            h("a", Props::new(), vec![]),
            h("b", Props::new(), vec![]),
        ])
    });
    let with_pair = |show: bool| {
        let mut children: Vec<Child> = Vec::new();
        if show {
            children.push(
                Element::new(ElementType::Function(pair.clone()), Props::new())
                    .with_key("pair")
                    .into(),
            );
        }
        children.push(h("c", Props::new(), vec![]).with_key("c").into());
        h("div", Props::new(), children)
    };

    render(&root, with_pair(true));
    let div = host.children(container)[0];
    let nodes = host.children(div);
    assert_eq!(host.inner_markup(container), "<div><a></a><b></b><c></c></div>");

    render(&root, with_pair(false));
    assert_eq!(host.inner_markup(container), "<div><c></c></div>");
    assert_eq!(host.children(div), vec![nodes[2]]);
    assert_eq!(root.fiber_for_node(&nodes[0]).unwrap(), None);
    assert_eq!(root.fiber_for_node(&nodes[1]).unwrap(), None);
}

#[test]
fn test_fragment_children_are_placed_in_order() {
    let (host, container, root) = setup();
    render(
        &root,
        h(
            "div",
            Props::new(),
            vec![
                h("x", Props::new(), vec![]).with_key("x").into(),
                h("z", Props::new(), vec![]).with_key("z").into(),
            ],
        ),
    );

    render(
        &root,
        h(
            "div",
            Props::new(),
            vec![
                h("x", Props::new(), vec![]).with_key("x").into(),
                Element::fragment(vec![
                    h("y1", Props::new(), vec![]),
                    h("y2", Props::new(), vec![]),
                ])
                .with_key("y")
                .into(),
                h("z", Props::new(), vec![]).with_key("z").into(),
            ],
        ),
    );
    assert_eq!(
        host.inner_markup(container),
        "<div><x></x><y1></y1><y2></y2><z></z></div>"
    );
}

// =============================================================================
// REFS
// =============================================================================

#[test]
fn test_ref_follows_the_committed_node() {
    let (host, container, root) = setup();
    let input_ref = NodeRef::new();

    render(&root, h("input", Props::new(), vec![]).with_ref(input_ref.clone()));
    let fiber = input_ref.get().unwrap();
    assert_eq!(root.host_node(fiber).unwrap(), host.children(container)[0]);

    // Dropping the ref prop detaches it
    render(&root, h("input", Props::new(), vec![]));
    assert_eq!(input_ref.get(), None);
}

#[test]
fn test_ref_cleared_on_removal() {
    let (_host, _container, root) = setup();
    let node_ref = NodeRef::new();

    render(&root, h("div", Props::new(), vec![]).with_ref(node_ref.clone()));
    assert!(node_ref.get().is_some());

    root.render_children(Children::None).unwrap();
    root.flush_sync().unwrap();
    assert_eq!(node_ref.get(), None);
}
