//! Squarified treemap layout.
//!
//! Bruls, Huizing and van Wijk's algorithm: siblings are placed in rows
//! along the shorter side of the remaining space, and a row is closed as soon
//! as adding the next node would make its worst aspect ratio worse.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::tree::WeightedTree;

/// Relative tolerance used when snapping the last row to the container edge.
const SNAP_EPSILON: f64 = 1e-9;

/// An axis-aligned rectangle.
///
/// # Examples
///
/// ```
/// use strata_treemap::squarify::Rect;
///
/// let r = Rect::new(0.0, 0.0, 4.0, 2.5);
/// assert_eq!(r.area(), 10.0);
/// assert!(!r.is_empty());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// True when the rectangle has no usable area.
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0 && self.area().is_finite())
            || !(self.x.is_finite() && self.y.is_finite())
    }
}

/// A sibling to lay out: an identifier and a positive weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedNode {
    pub id: String,
    pub weight: f64,
}

impl WeightedNode {
    pub fn new(id: impl Into<String>, weight: f64) -> Self {
        Self {
            id: id.into(),
            weight,
        }
    }
}

/// A laid-out node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreemapRect {
    /// Id of the node this rectangle represents.
    pub node_id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Nesting level, 0 for the top level.
    pub depth: usize,
}

impl TreemapRect {
    /// The rectangle's geometry.
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Lay out `nodes` inside `bounds`.
///
/// Each node gets `weight / total_weight` of the area of `bounds`. When
/// `total_weight` equals the sum of the node weights the rectangles tile
/// `bounds` exactly. Rectangles come back heaviest first; ties keep their
/// input order.
///
/// Nodes with a non-positive or non-finite weight are left out. An empty node
/// list, a non-positive `total_weight` or empty bounds give an empty result.
///
/// # Examples
///
/// ```
/// use strata_treemap::squarify::{squarify, Rect, WeightedNode};
///
/// let nodes = vec![
///     WeightedNode::new("a", 6.0),
///     WeightedNode::new("b", 3.0),
///     WeightedNode::new("c", 3.0),
/// ];
/// let rects = squarify(&nodes, Rect::new(0.0, 0.0, 4.0, 3.0), 12.0);
///
/// assert_eq!(rects.len(), 3);
/// assert_eq!(rects[0].node_id, "a");
/// assert!((rects[0].area() - 6.0).abs() < 1e-9);
/// let total: f64 = rects.iter().map(|r| r.area()).sum();
/// assert!((total - 12.0).abs() < 1e-9);
/// ```
pub fn squarify(nodes: &[WeightedNode], bounds: Rect, total_weight: f64) -> Vec<TreemapRect> {
    layout(nodes, bounds, total_weight, 0)
}

/// Lay out a tree, descending into children down to `max_depth` levels.
///
/// The children of `tree` form depth 0. Each child's own children are laid
/// out inside the child's rectangle at the next depth. A parent's rectangle
/// is emitted before those of its children.
///
/// # Examples
///
/// ```
/// use strata_treemap::squarify::{squarify_tree, Rect};
/// use strata_treemap::tree::WeightedTree;
///
/// let tree = WeightedTree::from_paths(
///     "repo",
///     [("src/lib.rs", 30.0), ("src/main.rs", 10.0), ("README.md", 10.0)],
/// );
/// let rects = squarify_tree(&tree, Rect::new(0.0, 0.0, 10.0, 5.0), 2);
///
/// let ids: Vec<_> = rects.iter().map(|r| (r.node_id.as_str(), r.depth)).collect();
/// assert_eq!(
///     ids,
///     vec![("src", 0), ("src/lib.rs", 1), ("src/main.rs", 1), ("README.md", 0)]
/// );
/// ```
pub fn squarify_tree(tree: &WeightedTree, bounds: Rect, max_depth: usize) -> Vec<TreemapRect> {
    let mut out = Vec::new();
    descend(tree, bounds, 0, max_depth, &mut out);
    out
}

fn descend(
    tree: &WeightedTree,
    bounds: Rect,
    depth: usize,
    max_depth: usize,
    out: &mut Vec<TreemapRect>,
) {
    if depth >= max_depth || tree.children.is_empty() {
        return;
    }

    let by_id: HashMap<&str, &WeightedTree> = tree
        .children
        .iter()
        .rev()
        .map(|c| (c.id.as_str(), c))
        .collect();

    for rect in layout(&tree.child_nodes(), bounds, tree.weight, depth) {
        let child = by_id.get(rect.node_id.as_str()).copied();
        let area = rect.rect();
        out.push(rect);
        if let Some(child) = child {
            descend(child, area, depth + 1, max_depth, out);
        }
    }
}

fn layout(nodes: &[WeightedNode], bounds: Rect, total_weight: f64, depth: usize) -> Vec<TreemapRect> {
    if nodes.is_empty() || bounds.is_empty() || !(total_weight > 0.0 && total_weight.is_finite()) {
        return Vec::new();
    }

    let mut sorted: Vec<&WeightedNode> = nodes
        .iter()
        .filter(|n| n.weight > 0.0 && n.weight.is_finite())
        .collect();
    sorted.sort_by(|a, b| b.weight.total_cmp(&a.weight));

    let scale = bounds.area() / total_weight;
    let items: Vec<(&str, f64)> = sorted
        .iter()
        .map(|n| (n.id.as_str(), n.weight * scale))
        .collect();

    let mut out = Vec::with_capacity(items.len());
    let mut free = bounds;
    let mut start = 0;

    while start < items.len() {
        // Only reachable when the weights add up to more than `total_weight`.
        if free.is_empty() {
            break;
        }
        let side = free.width.min(free.height);
        let mut end = start + 1;
        let mut row_sum = items[start].1;
        let mut current = worst_ratio(&items[start..end], row_sum, side);

        while end < items.len() {
            let next_sum = row_sum + items[end].1;
            let next = worst_ratio(&items[start..=end], next_sum, side);
            if next > current {
                break;
            }
            current = next;
            row_sum = next_sum;
            end += 1;
        }

        let is_last = end == items.len();
        free = place_row(&items[start..end], row_sum, free, is_last, depth, &mut out);
        start = end;
    }

    out
}

/// Worst aspect ratio of a row with total area `sum` along `side`.
fn worst_ratio(row: &[(&str, f64)], sum: f64, side: f64) -> f64 {
    let side_sq = side * side;
    let sum_sq = sum * sum;
    row.iter()
        .map(|&(_, area)| (side_sq * area / sum_sq).max(sum_sq / (side_sq * area)))
        .fold(0.0, f64::max)
}

/// Place one row against the shorter side of `free` and return the space left.
fn place_row(
    row: &[(&str, f64)],
    row_sum: f64,
    free: Rect,
    is_last: bool,
    depth: usize,
    out: &mut Vec<TreemapRect>,
) -> Rect {
    // Column on the left when the space is wide, strip on top when tall.
    let vertical = free.width >= free.height;
    let (length, depth_avail) = if vertical {
        (free.height, free.width)
    } else {
        (free.width, free.height)
    };

    let mut thickness = (row_sum / length).min(depth_avail);
    if is_last && (depth_avail - thickness).abs() <= SNAP_EPSILON * depth_avail.max(1.0) {
        thickness = depth_avail;
    }

    let mut offset = 0.0;
    for (i, &(id, area)) in row.iter().enumerate() {
        let extent = if i + 1 == row.len() {
            length - offset
        } else {
            area / thickness
        };
        let (x, y, width, height) = if vertical {
            (free.x, free.y + offset, thickness, extent)
        } else {
            (free.x + offset, free.y, extent, thickness)
        };
        out.push(TreemapRect {
            node_id: id.to_string(),
            x,
            y,
            width,
            height,
            depth,
        });
        offset += extent;
    }

    if vertical {
        Rect::new(free.x + thickness, free.y, free.width - thickness, free.height)
    } else {
        Rect::new(free.x, free.y + thickness, free.width, free.height - thickness)
    }
}
