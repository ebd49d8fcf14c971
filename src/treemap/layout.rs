//! Squarified treemap layout.
//!
//! Children are placed largest first. A row (or column) along the shorter
//! side of the free space keeps growing while adding the next child does not
//! worsen the row's worst aspect ratio; then the row is fixed and the free
//! space shrinks. Only leaves are emitted, so no two rectangles overlap.

use serde::Serialize;

use super::geometry::Rect;
use crate::fs::DirectoryNode;

/// One placed leaf of the tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRect<'a> {
    pub item: &'a DirectoryNode,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Nesting level below the layout root.
    pub depth: usize,
}

impl LayoutRect<'_> {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// Lay out `root` inside `bounds`.
///
/// Zero-size nodes are skipped. Rectangles (and whole subtrees) whose area is
/// below `min_area` are dropped without changing the size of any other
/// rectangle. A root without children fills `bounds` when its size is positive.
pub fn layout(root: &DirectoryNode, bounds: Rect, min_area: f64) -> Vec<LayoutRect<'_>> {
    let min_area = if min_area.is_finite() { min_area.max(0.0) } else { 0.0 };
    let mut placed = Vec::new();
    if root.size_bytes > 0 && !bounds.is_empty() {
        place_node(root, bounds, min_area, 0, &mut placed);
    }
    placed
}

fn place_node<'a>(node: &'a DirectoryNode, bounds: Rect, min_area: f64, depth: usize, out: &mut Vec<LayoutRect<'a>>) {
    if bounds.area() < min_area {
        return;
    }

    let mut children: Vec<&DirectoryNode> = node.children().iter().filter(|c| c.size_bytes > 0).collect();

    if children.is_empty() {
        out.push(LayoutRect {
            item: node,
            x: bounds.x,
            y: bounds.y,
            width: bounds.width,
            height: bounds.height,
            depth,
        });
        return;
    }

    children.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes));
    let weights: Vec<f64> = children.iter().map(|c| c.size_bytes as f64).collect();

    for (child, rect) in children.into_iter().zip(squarify(&weights, bounds)) {
        place_node(child, rect, min_area, depth + 1, out);
    }
}

/// Split `bounds` into one rectangle per weight, in input order.
///
/// Weights must be positive and sorted in descending order. The returned
/// rectangles tile `bounds` exactly.
pub fn squarify(weights: &[f64], bounds: Rect) -> Vec<Rect> {
    let total: f64 = weights.iter().sum();
    if weights.is_empty() || total <= 0.0 || bounds.is_empty() {
        return vec![Rect::new(bounds.x, bounds.y, 0.0, 0.0); weights.len()];
    }

    let scale = bounds.area() / total;
    let areas: Vec<f64> = weights.iter().map(|w| w * scale).collect();

    let mut rects = Vec::with_capacity(areas.len());
    let mut free = bounds;
    let mut start = 0;

    while start < areas.len() {
        let side = free.width.min(free.height);
        let mut end = start + 1;
        let mut row_sum = areas[start];
        let mut current = worst_ratio(&areas[start..end], row_sum, side);

        while end < areas.len() {
            let candidate_sum = row_sum + areas[end];
            let candidate = worst_ratio(&areas[start..=end], candidate_sum, side);
            if candidate > current {
                break;
            }
            current = candidate;
            row_sum = candidate_sum;
            end += 1;
        }

        let is_last = end == areas.len();
        place_row(&areas[start..end], row_sum, &mut free, is_last, &mut rects);
        start = end;
    }

    rects
}

/// Worst aspect ratio of a row of `areas` laid against a side of length `side`.
fn worst_ratio(areas: &[f64], sum: f64, side: f64) -> f64 {
    if side <= 0.0 || sum <= 0.0 {
        return f64::INFINITY;
    }
    let side_sq = side * side;
    let sum_sq = sum * sum;
    areas
        .iter()
        .map(|&a| (side_sq * a / sum_sq).max(sum_sq / (side_sq * a)))
        .fold(0.0, f64::max)
}

/// Fix one row against the shorter side of `free` and shrink `free`.
/// The final row, and the final item of each row, absorb rounding so the
/// tiling is exact.
fn place_row(areas: &[f64], row_sum: f64, free: &mut Rect, is_last: bool, out: &mut Vec<Rect>) {
    let count = areas.len();

    if free.width >= free.height {
        // Column on the left edge
        let thickness = if is_last || free.height <= 0.0 {
            free.width
        } else {
            (row_sum / free.height).min(free.width)
        };
        let mut y = free.y;
        for (i, &area) in areas.iter().enumerate() {
            let height = if i + 1 == count || thickness <= 0.0 {
                free.bottom() - y
            } else {
                area / thickness
            };
            out.push(Rect::new(free.x, y, thickness, height));
            y += height;
        }
        free.x += thickness;
        free.width = (free.width - thickness).max(0.0);
    } else {
        // Row along the top edge
        let thickness = if is_last || free.width <= 0.0 {
            free.height
        } else {
            (row_sum / free.width).min(free.height)
        };
        let mut x = free.x;
        for (i, &area) in areas.iter().enumerate() {
            let width = if i + 1 == count || thickness <= 0.0 {
                free.right() - x
            } else {
                area / thickness
            };
            out.push(Rect::new(x, free.y, width, thickness));
            x += width;
        }
        free.y += thickness;
        free.height = (free.height - thickness).max(0.0);
    }
}
