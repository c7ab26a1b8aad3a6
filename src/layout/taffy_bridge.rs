//! Taffy Bridge - flexbox layout over a memory host tree.
//!
//! Converts each element's style map to a Taffy style, measures text leaves,
//! runs the layout and flattens the result into absolute cell boxes.
//!
//! # Style keys
//!
//! | key               | values                                  |
//! |-------------------|-----------------------------------------|
//! | `display`         | `none` hides the subtree                |
//! | `width`, `height` | `auto`, cells (`"12"`), percent (`"50%"`) |
//! | `min-width`, ...  | same                                    |
//! | `flex-direction`  | `column` (default), `row`, `*-reverse`  |
//! | `flex-grow`, `flex-shrink` | numbers                        |
//! | `padding`, `margin`, `gap` | cells                          |

use taffy::{
    AvailableSpace, Dimension as TaffyDimension, Display, FlexDirection as TaffyFlexDirection,
    LengthPercentage, LengthPercentageAuto, NodeId, Rect, Size, Style, TaffyTree,
};

use super::text_measure::{measure_text_height, string_width};
use super::types::{ComputedLayout, Dimension, FlexDirection, LayoutRect};
use crate::host::{HostNodeId, MemoryHost};

// =============================================================================
// CONVERSION
// =============================================================================

fn to_taffy_dimension(dim: Dimension) -> TaffyDimension {
    match dim {
        Dimension::Auto => TaffyDimension::Auto,
        Dimension::Cells(n) => TaffyDimension::Length(n as f32),
        Dimension::Percent(p) => TaffyDimension::Percent(p / 100.0),
    }
}

fn to_taffy_flex_direction(dir: FlexDirection) -> TaffyFlexDirection {
    match dir {
        FlexDirection::Column => TaffyFlexDirection::Column,
        FlexDirection::Row => TaffyFlexDirection::Row,
        FlexDirection::ColumnReverse => TaffyFlexDirection::ColumnReverse,
        FlexDirection::RowReverse => TaffyFlexDirection::RowReverse,
    }
}

fn cells(value: Option<&str>) -> f32 {
    value.and_then(|v| v.trim().parse::<u16>().ok()).unwrap_or(0) as f32
}

fn number(value: Option<&str>, default: f32) -> f32 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn dimension(value: Option<&str>) -> TaffyDimension {
    to_taffy_dimension(value.map(Dimension::parse).unwrap_or_default())
}

/// Build a Taffy style from a node's style map.
fn build_style(host: &MemoryHost, node: HostNodeId) -> Style {
    let style = host.style(node);
    let padding = LengthPercentage::Length(cells(style.get("padding")));
    let margin = LengthPercentageAuto::Length(cells(style.get("margin")));
    let gap = LengthPercentage::Length(cells(style.get("gap")));

    Style {
        display: Display::Flex,
        flex_direction: to_taffy_flex_direction(
            style.get("flex-direction").map(FlexDirection::parse).unwrap_or_default(),
        ),
        flex_grow: number(style.get("flex-grow"), 0.0),
        flex_shrink: number(style.get("flex-shrink"), 1.0),
        size: Size {
            width: dimension(style.get("width")),
            height: dimension(style.get("height")),
        },
        min_size: Size {
            width: dimension(style.get("min-width")),
            height: dimension(style.get("min-height")),
        },
        max_size: Size {
            width: dimension(style.get("max-width")),
            height: dimension(style.get("max-height")),
        },
        padding: Rect {
            top: padding,
            right: padding,
            bottom: padding,
            left: padding,
        },
        margin: Rect {
            top: margin,
            right: margin,
            bottom: margin,
            left: margin,
        },
        gap: Size {
            width: gap,
            height: gap,
        },
        ..Default::default()
    }
}

// =============================================================================
// TEXT MEASUREMENT
// =============================================================================

fn measure_text(
    content: &str,
    known_dimensions: Size<Option<f32>>,
    available_space: Size<AvailableSpace>,
) -> Size<f32> {
    if content.is_empty() {
        return Size::ZERO;
    }

    let text_width = string_width(content);
    let avail_width = match available_space.width {
        AvailableSpace::Definite(w) => w as u16,
        AvailableSpace::MinContent => text_width,
        AvailableSpace::MaxContent => u16::MAX,
    };
    let width = known_dimensions
        .width
        .unwrap_or(text_width.min(avail_width.max(1)) as f32);

    Size {
        width,
        height: known_dimensions
            .height
            .unwrap_or(measure_text_height(content, (width as u16).max(1)) as f32),
    }
}

// =============================================================================
// TREE BUILDING
// =============================================================================

/// Text a leaf measures itself by: a text node's content, or the text
/// content of an element without children.
fn leaf_text(host: &MemoryHost, node: HostNodeId) -> Option<String> {
    if host.is_text(node) || host.children(node).is_empty() {
        let text = host.text_content(node);
        return (!text.is_empty()).then_some(text);
    }
    None
}

fn build_node(
    tree: &mut TaffyTree<String>,
    host: &MemoryHost,
    node: HostNodeId,
    built: &mut Vec<(HostNodeId, NodeId)>,
) -> Option<NodeId> {
    let is_text = host.is_text(node);
    if !is_text && host.style(node).get("display") == Some("none") {
        return None;
    }

    let style = if is_text { Style::default() } else { build_style(host, node) };
    let taffy_node = match leaf_text(host, node) {
        Some(text) => tree.new_leaf_with_context(style, text).ok()?,
        None => tree.new_leaf(style).ok()?,
    };
    built.push((node, taffy_node));

    for child in host.children(node) {
        if let Some(child_node) = build_node(tree, host, child, built) {
            let _ = tree.add_child(taffy_node, child_node);
        }
    }
    Some(taffy_node)
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Lay out the subtree under `root` in a `width` × `height` cell viewport.
///
/// The root itself fills the viewport.
pub fn compute_layout(
    host: &MemoryHost,
    root: HostNodeId,
    width: u16,
    height: u16,
) -> ComputedLayout {
    let mut result = ComputedLayout::new();
    let mut tree: TaffyTree<String> = TaffyTree::new();
    let mut built = Vec::new();

    let Some(root_node) = build_node(&mut tree, host, root, &mut built) else {
        return result;
    };
    let mut root_style = tree.style(root_node).cloned().unwrap_or_default();
    root_style.size = Size {
        width: TaffyDimension::Length(width as f32),
        height: TaffyDimension::Length(height as f32),
    };
    let _ = tree.set_style(root_node, root_style);

    let available = Size {
        width: AvailableSpace::Definite(width as f32),
        height: AvailableSpace::Definite(height as f32),
    };
    let measure = |known_dimensions: Size<Option<f32>>,
                   available_space: Size<AvailableSpace>,
                   _node_id: NodeId,
                   context: Option<&mut String>,
                   _style: &Style| match context {
        Some(text) => measure_text(text, known_dimensions, available_space),
        None => Size::ZERO,
    };
    if let Err(err) = tree.compute_layout_with_measure(root_node, available, measure) {
        tracing::warn!(?err, "layout failed");
        return result;
    }

    // Taffy locations are parent-relative; accumulate in build (pre-)order.
    let mut origins: Vec<(HostNodeId, (f32, f32))> = Vec::with_capacity(built.len());
    for (node, taffy_node) in built {
        let Ok(layout) = tree.layout(taffy_node) else { continue };
        let parent_origin = host
            .parent(node)
            .and_then(|parent| origins.iter().find(|(n, _)| *n == parent))
            .map(|(_, origin)| *origin)
            .unwrap_or((0.0, 0.0));
        let origin = if node == root {
            (0.0, 0.0)
        } else {
            (
                parent_origin.0 + layout.location.x,
                parent_origin.1 + layout.location.y,
            )
        };
        origins.push((node, origin));
        result.push(
            node,
            LayoutRect {
                x: origin.0.round() as u16,
                y: origin.1.round() as u16,
                width: layout.size.width.round() as u16,
                height: layout.size.height.round() as u16,
            },
        );
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostAdapter;
    use crate::types::{PropValue, Style as StyleMap};

    fn styled(host: &mut MemoryHost, tag: &str, style: StyleMap) -> HostNodeId {
        let node = host.create_node(tag);
        host.set_properties(&node, &[("style".to_string(), PropValue::Style(style))]);
        node
    }

    #[test]
    fn test_row_layout() {
        let mut host = MemoryHost::new();
        let root = host.create_container();
        let row_style = StyleMap::new().with("flex-direction", "row").with("height", "3");
        let row = styled(&mut host, "row", row_style);
        let a = styled(&mut host, "a", StyleMap::new().with("width", "10"));
        let b = styled(&mut host, "b", StyleMap::new().with("width", "5"));
        host.append_child(&row, &a);
        host.append_child(&row, &b);
        host.append_child(&root, &row);

        let layout = compute_layout(&host, root, 40, 10);
        assert_eq!(layout.get(root), Some(LayoutRect { x: 0, y: 0, width: 40, height: 10 }));
        assert_eq!(layout.get(a).map(|r| (r.x, r.width)), Some((0, 10)));
        assert_eq!(layout.get(b).map(|r| (r.x, r.width)), Some((10, 5)));
        assert_eq!(layout.hit_test(12, 1), Some(b));
        assert_eq!(layout.hit_test(2, 1), Some(a));
    }

    #[test]
    fn test_text_is_measured() {
        let mut host = MemoryHost::new();
        let root = host.create_container();
        let label = host.create_node("label");
        host.set_properties(&label, &[("children".to_string(), PropValue::from("hello"))]);
        host.append_child(&root, &label);

        let layout = compute_layout(&host, root, 20, 5);
        let rect = layout.get(label).unwrap_or_default();
        assert_eq!(rect.height, 1);
        assert!(rect.width >= 5);
    }

    #[test]
    fn test_display_none_is_skipped() {
        let mut host = MemoryHost::new();
        let root = host.create_container();
        let hidden = styled(&mut host, "box", StyleMap::new().with("display", "none"));
        host.append_child(&root, &hidden);

        let layout = compute_layout(&host, root, 10, 10);
        assert!(layout.get(hidden).is_none());
        assert_eq!(layout.len(), 1);
    }
}
