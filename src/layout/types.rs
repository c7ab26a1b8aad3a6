//! Layout types - style values parsed from host styles, and computed boxes.

use std::collections::HashMap;

use crate::host::HostNodeId;

// =============================================================================
// Style values
// =============================================================================

/// A size along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Dimension {
    #[default]
    Auto,
    /// Fixed number of terminal cells.
    Cells(u16),
    /// Percentage of the parent (0-100).
    Percent(f32),
}

impl Dimension {
    /// Parse `"auto"`, `"12"` or `"50%"`. Anything else is `Auto`.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if let Some(percent) = value.strip_suffix('%') {
            return percent
                .trim()
                .parse()
                .map(Dimension::Percent)
                .unwrap_or_default();
        }
        value.parse().map(Dimension::Cells).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlexDirection {
    #[default]
    Column,
    Row,
    ColumnReverse,
    RowReverse,
}

impl FlexDirection {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "row" => FlexDirection::Row,
            "column-reverse" => FlexDirection::ColumnReverse,
            "row-reverse" => FlexDirection::RowReverse,
            _ => FlexDirection::Column,
        }
    }
}

// =============================================================================
// Computed layout
// =============================================================================

/// Absolute box of a node in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutRect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl LayoutRect {
    pub fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x
            && y >= self.y
            && (x as u32) < self.x as u32 + self.width as u32
            && (y as u32) < self.y as u32 + self.height as u32
    }
}

/// Result of a layout pass over a host tree.
#[derive(Debug, Clone, Default)]
pub struct ComputedLayout {
    rects: HashMap<HostNodeId, LayoutRect>,
    /// Paint order: parents before children, siblings in order.
    order: Vec<HostNodeId>,
}

impl ComputedLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, node: HostNodeId, rect: LayoutRect) {
        self.rects.insert(node, rect);
        self.order.push(node);
    }

    pub fn get(&self, node: HostNodeId) -> Option<LayoutRect> {
        self.rects.get(&node).copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Nodes in paint order.
    pub fn nodes(&self) -> &[HostNodeId] {
        &self.order
    }

    /// Rasterise into a hit grid of the given size. Later (inner) nodes win.
    pub fn hit_grid(&self, width: u16, height: u16) -> HitGrid {
        let mut grid = HitGrid::new(width, height);
        for &node in &self.order {
            if let Some(rect) = self.rects.get(&node) {
                grid.fill_rect(rect.x, rect.y, rect.width, rect.height, node);
            }
        }
        grid
    }

    /// Topmost node containing the cell, without building a grid.
    pub fn hit_test(&self, x: u16, y: u16) -> Option<HostNodeId> {
        self.order
            .iter()
            .rev()
            .copied()
            .find(|node| self.rects.get(node).is_some_and(|r| r.contains(x, y)))
    }
}

// =============================================================================
// Hit grid
// =============================================================================

/// Cell → host node lookup for pointer events.
#[derive(Debug, Clone)]
pub struct HitGrid {
    width: u16,
    height: u16,
    cells: Vec<Option<HostNodeId>>,
}

impl HitGrid {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Resize, clearing all contents.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.cells.clear();
        self.cells.resize(width as usize * height as usize, None);
    }

    pub fn clear(&mut self) {
        self.cells.fill(None);
    }

    pub fn set(&mut self, x: u16, y: u16, node: HostNodeId) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = y as usize * self.width as usize + x as usize;
        self.cells[idx] = Some(node);
    }

    pub fn get(&self, x: u16, y: u16) -> Option<HostNodeId> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells[y as usize * self.width as usize + x as usize]
    }

    /// Fill a rectangle, clipped to the grid.
    pub fn fill_rect(&mut self, x: u16, y: u16, width: u16, height: u16, node: HostNodeId) {
        let x_end = x.saturating_add(width).min(self.width);
        let y_end = y.saturating_add(height).min(self.height);
        for row in y..y_end {
            for col in x..x_end {
                self.set(col, row, node);
            }
        }
    }
}
