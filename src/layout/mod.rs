//! The layout engine: slot grid generation, assignment-based placement,
//! orthogonal routing, and label placement, in that order. Each stage
//! consumes the previous stage's output read-only; the whole pipeline is
//! a pure function of its inputs.

pub mod label_placement;
pub mod placement;
pub mod routing;
pub mod types;

pub use label_placement::{LabelAlign, LabelRequest, place_labels};
pub use types::{LabelLayout, Layout, NodeBox, Rect, WireLayout};

use crate::config::LayoutStyle;
use crate::ir::{Diagram, Node};

/// Column count for the slot grid, sized to the node count.
fn grid_columns(node_count: usize) -> usize {
    if node_count <= 4 {
        2
    } else if node_count <= 6 {
        3
    } else {
        4
    }
}

/// Partitions the region into a row-major grid of uniform candidate cells,
/// at least one per node. The region is assumed non-degenerate: wide and
/// tall enough that every cell has positive extent after margins and gaps.
pub(crate) fn slot_grid(region: &Rect, style: &LayoutStyle, node_count: usize) -> Vec<Rect> {
    let count = node_count.max(1);
    let cols = grid_columns(count);
    let rows = count.div_ceil(cols);
    let inner_w = region.w - 2.0 * style.margin;
    let inner_h = region.h - 2.0 * style.margin;
    let cell_w = (inner_w - style.slot_gap * (cols as f32 - 1.0)) / cols as f32;
    let cell_h = (inner_h - style.slot_gap * (rows as f32 - 1.0)) / rows as f32;

    let mut slots = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            slots.push(Rect::new(
                region.x + style.margin + col as f32 * (cell_w + style.slot_gap),
                region.y + style.margin + row as f32 * (cell_h + style.slot_gap),
                cell_w,
                cell_h,
            ));
        }
    }
    slots
}

/// Runs the full pipeline: grid, placement, routing, labels. The node
/// size estimator is supplied by the caller (it depends on font metrics
/// this crate does not own). Output depends only on the arguments.
pub fn compute_layout(
    diagram: &Diagram,
    region: Rect,
    style: &LayoutStyle,
    size_of: &dyn Fn(&Node) -> (f32, f32),
) -> Layout {
    let slots = slot_grid(&region, style, diagram.nodes.len());
    let boxes = placement::place(diagram, &slots, region, style, size_of);
    let (wires, warnings) = routing::route(diagram, &boxes, region, style);
    let labels = label_placement::place_wire_labels(&wires, &boxes, &region, &style.labels);
    Layout {
        region,
        boxes,
        wires,
        labels,
        warnings,
    }
}
