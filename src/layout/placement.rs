use std::collections::BTreeMap;

use crate::config::LayoutStyle;
use crate::ir::Diagram;

use super::types::{Rect, manhattan, path_crossings, segment_intersects_rect};
use super::NodeBox;

/// A swap must beat the incumbent by at least this much to be kept.
const IMPROVEMENT_EPSILON: f64 = 1e-6;

/// Everything the cost function needs that does not change across swaps.
pub(super) struct CostContext<'a> {
    pub(super) slots: &'a [Rect],
    pub(super) region: Rect,
    pub(super) style: &'a LayoutStyle,
    /// Resolved (from, to, weight) triples; edges with unknown endpoints
    /// are dropped here and never contribute to the cost.
    edges: Vec<(usize, usize, f64)>,
    sizes: Vec<(f32, f32)>,
    targets: Vec<(f32, f32)>,
}

impl<'a> CostContext<'a> {
    pub(super) fn new(
        diagram: &Diagram,
        slots: &'a [Rect],
        region: Rect,
        style: &'a LayoutStyle,
        sizes: Vec<(f32, f32)>,
    ) -> Self {
        let index: BTreeMap<&str, usize> = diagram
            .nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (node.id.as_str(), idx))
            .collect();
        let edges = diagram
            .edges
            .iter()
            .filter_map(|edge| {
                let from = *index.get(edge.from.as_str())?;
                let to = *index.get(edge.to.as_str())?;
                Some((from, to, f64::from(edge.weight)))
            })
            .collect();
        let targets = diagram
            .nodes
            .iter()
            .map(|node| style.role_target(node.role))
            .collect();
        Self {
            slots,
            region,
            style,
            edges,
            sizes,
            targets,
        }
    }

    fn center(&self, assignment: &[usize], node: usize) -> (f32, f32) {
        self.slots[assignment[node]].center()
    }

    fn node_rect(&self, assignment: &[usize], node: usize) -> Rect {
        let (cx, cy) = self.center(assignment, node);
        let (w, h) = self.sizes[node];
        Rect::new(cx - w / 2.0, cy - h / 2.0, w, h)
    }
}

/// Cheap stand-in for a routed path: node center to node center, horizontal
/// leg first. Good enough to expose blocked corridors and crossings without
/// running the router inside the placement loop.
fn preview_path(a: (f32, f32), b: (f32, f32)) -> [(f32, f32); 3] {
    [a, (b.0, a.1), b]
}

/// Full cost of one slot assignment: weighted wirelength, preview paths
/// cutting through third-party boxes, preview-path crossings, and the pull
/// of each node toward its role's target zone.
pub(super) fn assignment_cost(ctx: &CostContext<'_>, assignment: &[usize]) -> f64 {
    let node_count = assignment.len();
    let mut cost = 0.0;

    let previews: Vec<[(f32, f32); 3]> = ctx
        .edges
        .iter()
        .map(|&(from, to, _)| preview_path(ctx.center(assignment, from), ctx.center(assignment, to)))
        .collect();

    for (edge_idx, &(from, to, weight)) in ctx.edges.iter().enumerate() {
        let path = &previews[edge_idx];
        cost += f64::from(manhattan(path[0], path[2])) * weight;

        for third in 0..node_count {
            if third == from || third == to {
                continue;
            }
            let rect = ctx.node_rect(assignment, third);
            if segment_intersects_rect(path[0], path[1], &rect)
                || segment_intersects_rect(path[1], path[2], &rect)
            {
                cost += ctx.style.placement.obstacle_penalty;
            }
        }
    }

    for i in 0..previews.len() {
        for j in (i + 1)..previews.len() {
            let crossings = path_crossings(&previews[i], &previews[j]);
            cost += ctx.style.placement.crossing_penalty * crossings as f64;
        }
    }

    for node in 0..node_count {
        let (cx, cy) = ctx.center(assignment, node);
        let nx = (cx - ctx.region.x) / ctx.region.w;
        let ny = (cy - ctx.region.y) / ctx.region.h;
        let (tx, ty) = ctx.targets[node];
        cost += f64::from((nx - tx).abs() + (ny - ty).abs()) * ctx.style.placement.affinity_weight;
    }

    cost
}

/// Greedy seed: walk nodes in input order, giving each the nearest unused
/// slot to its role target. Every node gets a distinct slot.
pub(super) fn initial_assignment(diagram: &Diagram, ctx: &CostContext<'_>) -> Vec<usize> {
    let mut used = vec![false; ctx.slots.len()];
    let mut assignment = Vec::with_capacity(diagram.nodes.len());
    for node in &diagram.nodes {
        let (tx, ty) = ctx.style.role_target(node.role);
        let target = (ctx.region.x + tx * ctx.region.w, ctx.region.y + ty * ctx.region.h);
        let mut best = 0;
        let mut best_dist = f32::MAX;
        for (idx, slot) in ctx.slots.iter().enumerate() {
            if used[idx] {
                continue;
            }
            let dist = manhattan(slot.center(), target);
            if dist < best_dist {
                best_dist = dist;
                best = idx;
            }
        }
        used[best] = true;
        assignment.push(best);
    }
    assignment
}

/// Exhaustive pairwise-swap hill climbing: sweep every unordered pair,
/// keep a swap only when it strictly improves the full cost, and stop on
/// the first sweep with no improvement or at the sweep cap. Converges to a
/// local optimum, which is intentional at this problem size.
pub(super) fn climb(ctx: &CostContext<'_>, assignment: &mut [usize]) -> f64 {
    let node_count = assignment.len();
    let mut best = assignment_cost(ctx, assignment);
    for _ in 0..ctx.style.placement.max_sweeps {
        let mut improved = false;
        for i in 0..node_count {
            for j in (i + 1)..node_count {
                assignment.swap(i, j);
                let cost = assignment_cost(ctx, assignment);
                if cost + IMPROVEMENT_EPSILON < best {
                    best = cost;
                    improved = true;
                } else {
                    assignment.swap(i, j);
                }
            }
        }
        if !improved {
            break;
        }
    }
    best
}

/// Center `size` inside `slot`, then clamp back into the region where the
/// box fits at all. An oversized box may overhang its slot but is pinned to
/// the region's near edge.
fn box_rect(slot: &Rect, size: (f32, f32), region: &Rect) -> Rect {
    let (cx, cy) = slot.center();
    let (w, h) = size;
    let mut x = cx - w / 2.0;
    let mut y = cy - h / 2.0;
    if w <= region.w {
        x = x.clamp(region.x, region.right() - w);
    } else {
        x = region.x;
    }
    if h <= region.h {
        y = y.clamp(region.y, region.bottom() - h);
    } else {
        y = region.y;
    }
    Rect::new(x, y, w, h)
}

/// Assigns every node a slot, minimizing the placement cost by local
/// search, and returns the finished boxes keyed by node id.
pub(super) fn place(
    diagram: &Diagram,
    slots: &[Rect],
    region: Rect,
    style: &LayoutStyle,
    size_of: &dyn Fn(&crate::ir::Node) -> (f32, f32),
) -> BTreeMap<String, NodeBox> {
    if diagram.nodes.is_empty() {
        return BTreeMap::new();
    }
    let sizes: Vec<(f32, f32)> = diagram.nodes.iter().map(|node| size_of(node)).collect();
    let ctx = CostContext::new(diagram, slots, region, style, sizes.clone());
    let mut assignment = initial_assignment(diagram, &ctx);
    climb(&ctx, &mut assignment);

    diagram
        .nodes
        .iter()
        .enumerate()
        .map(|(idx, node)| {
            let rect = box_rect(&slots[assignment[idx]], sizes[idx], &region);
            (
                node.id.clone(),
                NodeBox {
                    id: node.id.clone(),
                    role: node.role,
                    title: node.title.clone(),
                    detail: node.detail.clone(),
                    rect,
                },
            )
        })
        .collect()
}
