use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashMap};

use crate::config::RoutingStyle;
use crate::ir::Diagram;

use super::types::{Rect, WireLayout, path_crossings, segment_intersects_rect};
use super::NodeBox;

/// Integer cost multiplier so A* can use u32 costs with fractional cells.
const ASTAR_COST_SCALE: f32 = 1000.0;
/// Score increment separating adjacent candidates in preference order, so
/// an uncongested earlier candidate always beats a later one.
const CANDIDATE_RANK_COST: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum EdgeSide {
    Left,
    Right,
    Top,
    Bottom,
}

/// Exit and entry sides follow whichever axis has the greater
/// center-to-center displacement.
pub(super) fn edge_sides(from: &Rect, to: &Rect) -> (EdgeSide, EdgeSide) {
    let (fx, fy) = from.center();
    let (tx, ty) = to.center();
    let dx = tx - fx;
    let dy = ty - fy;
    if dx.abs() >= dy.abs() {
        if dx >= 0.0 {
            (EdgeSide::Right, EdgeSide::Left)
        } else {
            (EdgeSide::Left, EdgeSide::Right)
        }
    } else if dy >= 0.0 {
        (EdgeSide::Bottom, EdgeSide::Top)
    } else {
        (EdgeSide::Top, EdgeSide::Bottom)
    }
}

pub(super) fn side_anchor(rect: &Rect, side: EdgeSide) -> (f32, f32) {
    let (cx, cy) = rect.center();
    match side {
        EdgeSide::Left => (rect.x, cy),
        EdgeSide::Right => (rect.right(), cy),
        EdgeSide::Top => (cx, rect.y),
        EdgeSide::Bottom => (cx, rect.bottom()),
    }
}

pub(super) fn stub_point(point: (f32, f32), side: EdgeSide, length: f32) -> (f32, f32) {
    match side {
        EdgeSide::Left => (point.0 - length, point.1),
        EdgeSide::Right => (point.0 + length, point.1),
        EdgeSide::Top => (point.0, point.1 - length),
        EdgeSide::Bottom => (point.0, point.1 + length),
    }
}

#[derive(Debug, Clone)]
struct Obstacle {
    id: String,
    rect: Rect,
}

/// Usage counts per grid cell from a prior routing pass, fed back as a
/// cost penalty so later passes negotiate away from crowded corridors.
pub(super) struct CongestionMap {
    cell: f32,
    usage: HashMap<(i32, i32), u32>,
}

impl CongestionMap {
    pub(super) fn new(cell: f32) -> Self {
        Self {
            cell: cell.max(4.0),
            usage: HashMap::new(),
        }
    }

    fn cell_index(&self, x: f32, y: f32) -> (i32, i32) {
        ((x / self.cell).floor() as i32, (y / self.cell).floor() as i32)
    }

    pub(super) fn add_path(&mut self, points: &[(f32, f32)]) {
        for pair in points.windows(2) {
            let (x1, y1) = pair[0];
            let (x2, y2) = pair[1];
            let dx = x2 - x1;
            let dy = y2 - y1;
            let len = dx.abs().max(dy.abs());
            let steps = ((len / self.cell).ceil() as usize).max(1);
            let mut last = None;
            for i in 0..=steps {
                let t = i as f32 / steps as f32;
                let idx = self.cell_index(x1 + dx * t, y1 + dy * t);
                if last == Some(idx) {
                    continue;
                }
                last = Some(idx);
                *self.usage.entry(idx).or_insert(0) += 1;
            }
        }
    }

    pub(super) fn score_path(&self, points: &[(f32, f32)]) -> f32 {
        let mut score = 0u32;
        for pair in points.windows(2) {
            let (x1, y1) = pair[0];
            let (x2, y2) = pair[1];
            let dx = x2 - x1;
            let dy = y2 - y1;
            let len = dx.abs().max(dy.abs());
            let steps = ((len / self.cell).ceil() as usize).max(1);
            let mut last = None;
            for i in 0..=steps {
                let t = i as f32 / steps as f32;
                let idx = self.cell_index(x1 + dx * t, y1 + dy * t);
                if last == Some(idx) {
                    continue;
                }
                last = Some(idx);
                score += self.usage.get(&idx).copied().unwrap_or(0);
            }
        }
        score as f32
    }

    fn usage_at(&self, x: f32, y: f32) -> u32 {
        self.usage.get(&self.cell_index(x, y)).copied().unwrap_or(0)
    }
}

/// Drops duplicate and collinear interior points; the result still starts
/// and ends exactly where the input did.
pub(super) fn compress_path(points: &[(f32, f32)]) -> Vec<(f32, f32)> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let mut out: Vec<(f32, f32)> = Vec::with_capacity(points.len());
    out.push(points[0]);
    for idx in 1..points.len() - 1 {
        let prev = out[out.len() - 1];
        let curr = points[idx];
        if (curr.0 - prev.0).abs() <= 1e-4 && (curr.1 - prev.1).abs() <= 1e-4 {
            continue;
        }
        let next = points[idx + 1];
        let dx1 = curr.0 - prev.0;
        let dy1 = curr.1 - prev.1;
        let dx2 = next.0 - curr.0;
        let dy2 = next.1 - curr.1;
        if (dx1.abs() <= 1e-4 && dx2.abs() <= 1e-4) || (dy1.abs() <= 1e-4 && dy2.abs() <= 1e-4) {
            continue;
        }
        out.push(curr);
    }
    let last = points[points.len() - 1];
    let tail = out[out.len() - 1];
    if (last.0 - tail.0).abs() > 1e-4 || (last.1 - tail.1).abs() > 1e-4 {
        out.push(last);
    } else if out.len() == 1 {
        out.push(last);
    }
    out
}

pub(super) fn path_length(points: &[(f32, f32)]) -> f32 {
    points
        .windows(2)
        .map(|pair| (pair[1].0 - pair[0].0).abs() + (pair[1].1 - pair[0].1).abs())
        .sum()
}

fn path_blocked(
    points: &[(f32, f32)],
    obstacles: &[Obstacle],
    from_id: &str,
    to_id: &str,
    pad: f32,
) -> bool {
    for obstacle in obstacles {
        if obstacle.id == from_id || obstacle.id == to_id {
            continue;
        }
        let inflated = obstacle.rect.inflate(pad);
        for pair in points.windows(2) {
            if segment_intersects_rect(pair[0], pair[1], &inflated) {
                return true;
            }
        }
    }
    false
}

/// Direct candidates between two stub points, in preference order: the two
/// L-shapes, then the two staggered-midpoint Z-shapes.
fn direct_candidates(s: (f32, f32), e: (f32, f32)) -> [Vec<(f32, f32)>; 4] {
    let mid_x = (s.0 + e.0) / 2.0;
    let mid_y = (s.1 + e.1) / 2.0;
    [
        vec![s, (e.0, s.1), e],
        vec![s, (s.0, e.1), e],
        vec![s, (mid_x, s.1), (mid_x, e.1), e],
        vec![s, (s.0, mid_y), (e.0, mid_y), e],
    ]
}

struct RouteContext<'a> {
    from_id: &'a str,
    to_id: &'a str,
    from_rect: Rect,
    to_rect: Rect,
    obstacles: &'a [Obstacle],
    region: Rect,
    style: &'a RoutingStyle,
}

/// Pulls an out-of-region stub point back inside. Only the coordinate
/// along the stub axis may move; touching the other one would tilt the
/// anchor-to-stub segment off-axis.
fn clamp_stub(region: &Rect, point: (f32, f32), side: EdgeSide) -> (f32, f32) {
    match side {
        EdgeSide::Left | EdgeSide::Right => {
            (point.0.clamp(region.x + 1.0, region.right() - 1.0), point.1)
        }
        EdgeSide::Top | EdgeSide::Bottom => {
            (point.0, point.1.clamp(region.y + 1.0, region.bottom() - 1.0))
        }
    }
}

/// Routes one edge: stub the ports outward, try the direct candidates in
/// preference order (cheapest under congestion wins), fall back to grid
/// A*, and as a last resort emit the staggered zig-zag unconditionally.
fn route_one(ctx: &RouteContext<'_>, congestion: &CongestionMap) -> Vec<(f32, f32)> {
    let (start_side, end_side) = edge_sides(&ctx.from_rect, &ctx.to_rect);
    let start = side_anchor(&ctx.from_rect, start_side);
    let end = side_anchor(&ctx.to_rect, end_side);
    let s = clamp_stub(&ctx.region, stub_point(start, start_side, ctx.style.stub_len), start_side);
    let e = clamp_stub(&ctx.region, stub_point(end, end_side, ctx.style.stub_len), end_side);

    let mut best: Option<Vec<(f32, f32)>> = None;
    let mut best_score = f32::MAX;
    for (rank, candidate) in direct_candidates(s, e).into_iter().enumerate() {
        let mut points = Vec::with_capacity(candidate.len() + 2);
        points.push(start);
        points.extend(candidate);
        points.push(end);
        if path_blocked(&points, ctx.obstacles, ctx.from_id, ctx.to_id, ctx.style.obstacle_pad) {
            continue;
        }
        let score = rank as f32 * CANDIDATE_RANK_COST
            + congestion.score_path(&points) * ctx.style.congestion_weight;
        if score < best_score {
            best_score = score;
            best = Some(points);
        }
    }
    if let Some(points) = best {
        return compress_path(&points);
    }

    if let Some(points) = grid_route(
        ctx,
        congestion,
        (start, start_side, s),
        (end, end_side, e),
        ctx.style.obstacle_pad,
    ) {
        return points;
    }

    // Last resort: the staggered zig-zag, obstacles or not.
    let mid_x = (s.0 + e.0) / 2.0;
    compress_path(&[start, s, (mid_x, s.1), (mid_x, e.1), e, end])
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct GridState {
    x: i32,
    y: i32,
    dir: u8,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct GridEntry {
    est: u32,
    cost: u32,
    state: GridState,
}

impl Ord for GridEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .est
            .cmp(&self.est)
            .then_with(|| other.cost.cmp(&self.cost))
            .then_with(|| self.state.y.cmp(&other.state.y))
            .then_with(|| self.state.x.cmp(&other.state.x))
            .then_with(|| self.state.dir.cmp(&other.state.dir))
    }
}

impl PartialOrd for GridEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Obstacle-aware A* on a coarse grid over the region. States carry the
/// incoming direction so a turn penalty can bias the search toward paths
/// with few bends. Returns `None` when the expansion cap is hit or no
/// path exists.
fn grid_route(
    ctx: &RouteContext<'_>,
    congestion: &CongestionMap,
    (start, start_side, s): ((f32, f32), EdgeSide, (f32, f32)),
    (end, end_side, e): ((f32, f32), EdgeSide, (f32, f32)),
    pad: f32,
) -> Option<Vec<(f32, f32)>> {
    let cell = ctx.style.grid_cell.max(4.0);
    let cols = (ctx.region.w / cell).ceil() as i32;
    let rows = (ctx.region.h / cell).ceil() as i32;
    if cols < 2 || rows < 2 {
        return None;
    }

    // The last row/column's nominal center can stick out past the region
    // when its extent is not a cell multiple, so centers are clamped.
    let cell_center = |ix: i32, iy: i32| -> (f32, f32) {
        (
            (ctx.region.x + (ix as f32 + 0.5) * cell).min(ctx.region.right() - 1.0),
            (ctx.region.y + (iy as f32 + 0.5) * cell).min(ctx.region.bottom() - 1.0),
        )
    };
    let cell_for = |point: (f32, f32)| -> (i32, i32) {
        (
            (((point.0 - ctx.region.x) / cell).floor() as i32).clamp(0, cols - 1),
            (((point.1 - ctx.region.y) / cell).floor() as i32).clamp(0, rows - 1),
        )
    };

    let mut blocked = vec![false; (cols * rows) as usize];
    for obstacle in ctx.obstacles {
        if obstacle.id == ctx.from_id || obstacle.id == ctx.to_id {
            continue;
        }
        let inflated = obstacle.rect.inflate(pad);
        let (x0, y0) = cell_for((inflated.x, inflated.y));
        let (x1, y1) = cell_for((inflated.right(), inflated.bottom()));
        for iy in y0..=y1 {
            for ix in x0..=x1 {
                let (cx, cy) = cell_center(ix, iy);
                if inflated.contains_point((cx, cy)) {
                    blocked[(iy * cols + ix) as usize] = true;
                }
            }
        }
    }

    let (start_ix, start_iy) = cell_for(s);
    let (end_ix, end_iy) = cell_for(e);
    if start_ix == end_ix && start_iy == end_iy {
        return Some(compress_path(&[start, s, (e.0, s.1), e, end]));
    }

    let dirs: [(i32, i32); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];
    let step_cost = (cell * ASTAR_COST_SCALE).round() as u32;
    let turn_penalty = (ctx.style.turn_penalty * cell * ASTAR_COST_SCALE).round() as u32;
    let congestion_cost =
        (ctx.style.congestion_weight * cell * ASTAR_COST_SCALE).round() as u32;

    let states = (cols * rows * 4) as usize;
    let mut best_cost = vec![u32::MAX; states];
    let mut prev: Vec<Option<GridState>> = vec![None; states];
    let mut heap = BinaryHeap::new();

    for dir in 0..4u8 {
        let idx = ((start_iy * cols + start_ix) as usize) * 4 + dir as usize;
        best_cost[idx] = 0;
        heap.push(GridEntry {
            est: 0,
            cost: 0,
            state: GridState {
                x: start_ix,
                y: start_iy,
                dir,
            },
        });
    }

    let mut end_state: Option<GridState> = None;
    let mut expansions = 0usize;

    while let Some(entry) = heap.pop() {
        expansions += 1;
        if expansions > ctx.style.max_expansions {
            break;
        }
        let GridEntry { cost, state, .. } = entry;
        let state_idx = ((state.y * cols + state.x) as usize) * 4 + state.dir as usize;
        if cost != best_cost[state_idx] {
            continue;
        }
        if state.x == end_ix && state.y == end_iy {
            end_state = Some(state);
            break;
        }
        for (dir_idx, (dx, dy)) in dirs.iter().enumerate() {
            let nx = state.x + dx;
            let ny = state.y + dy;
            if nx < 0 || ny < 0 || nx >= cols || ny >= rows {
                continue;
            }
            if (nx != end_ix || ny != end_iy)
                && (nx != start_ix || ny != start_iy)
                && blocked[(ny * cols + nx) as usize]
            {
                continue;
            }
            let mut next_cost = cost.saturating_add(step_cost);
            if state.dir != dir_idx as u8 {
                next_cost = next_cost.saturating_add(turn_penalty);
            }
            let (cx, cy) = cell_center(nx, ny);
            let usage = congestion.usage_at(cx, cy);
            if usage > 0 {
                next_cost = next_cost.saturating_add(usage.saturating_mul(congestion_cost));
            }
            let next_idx = ((ny * cols + nx) as usize) * 4 + dir_idx;
            if next_cost >= best_cost[next_idx] {
                continue;
            }
            best_cost[next_idx] = next_cost;
            prev[next_idx] = Some(state);
            let remaining = (nx - end_ix).unsigned_abs() + (ny - end_iy).unsigned_abs();
            heap.push(GridEntry {
                est: next_cost.saturating_add(remaining.saturating_mul(step_cost)),
                cost: next_cost,
                state: GridState {
                    x: nx,
                    y: ny,
                    dir: dir_idx as u8,
                },
            });
        }
    }

    let end_state = end_state?;
    let mut cells: Vec<(i32, i32)> = Vec::new();
    let mut cursor = end_state;
    loop {
        cells.push((cursor.x, cursor.y));
        let idx = ((cursor.y * cols + cursor.x) as usize) * 4 + cursor.dir as usize;
        match prev[idx] {
            Some(previous) => cursor = previous,
            None => break,
        }
    }
    cells.reverse();

    let mut points: Vec<(f32, f32)> = Vec::with_capacity(cells.len() + 6);
    points.push(start);
    points.push(s);
    if let Some(&(ix, iy)) = cells.first() {
        let (cx, cy) = cell_center(ix, iy);
        match start_side {
            EdgeSide::Left | EdgeSide::Right => points.push((cx, s.1)),
            EdgeSide::Top | EdgeSide::Bottom => points.push((s.0, cy)),
        }
        points.push((cx, cy));
    }
    for &(ix, iy) in cells.iter().skip(1) {
        points.push(cell_center(ix, iy));
    }
    if let Some(&(ix, iy)) = cells.last() {
        let (cx, cy) = cell_center(ix, iy);
        match end_side {
            EdgeSide::Left | EdgeSide::Right => points.push((cx, e.1)),
            EdgeSide::Top | EdgeSide::Bottom => points.push((e.0, cy)),
        }
    }
    points.push(e);
    points.push(end);
    Some(compress_path(&points))
}

/// Anchor for the wire's label: the midpoint of its longest segment.
fn label_anchor(points: &[(f32, f32)]) -> (f32, f32) {
    let mut best = (points[0], points[points.len() - 1]);
    let mut best_len = -1.0f32;
    for pair in points.windows(2) {
        let len = (pair[1].0 - pair[0].0).abs() + (pair[1].1 - pair[0].1).abs();
        if len > best_len {
            best_len = len;
            best = (pair[0], pair[1]);
        }
    }
    (
        (best.0.0 + best.1.0) / 2.0,
        (best.0.1 + best.1.1) / 2.0,
    )
}

fn wire_overlap_count(points: &[(f32, f32)], obstacles: &[Obstacle], from: &str, to: &str) -> usize {
    obstacles
        .iter()
        .filter(|obstacle| {
            if obstacle.id == from || obstacle.id == to {
                return false;
            }
            points
                .windows(2)
                .any(|pair| segment_intersects_rect(pair[0], pair[1], &obstacle.rect))
        })
        .count()
}

/// Quality of one routing pass. Passes compare lexicographically:
/// crossing count first, then box-overlap count, then total length.
/// A pass never replaces one with fewer crossings, whatever it saves
/// elsewhere.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PassScore {
    crossings: usize,
    overlaps: usize,
    length: f32,
}

impl PassScore {
    fn better_than(&self, other: &PassScore) -> bool {
        self.crossings
            .cmp(&other.crossings)
            .then(self.overlaps.cmp(&other.overlaps))
            .then(
                self.length
                    .partial_cmp(&other.length)
                    .unwrap_or(Ordering::Equal),
            )
            == Ordering::Less
    }
}

fn pass_score(wires: &[WireLayout], obstacles: &[Obstacle]) -> PassScore {
    let mut crossings = 0;
    for i in 0..wires.len() {
        for j in (i + 1)..wires.len() {
            crossings += path_crossings(&wires[i].points, &wires[j].points);
        }
    }
    let mut overlaps = 0;
    let mut length = 0.0;
    for wire in wires {
        overlaps += wire_overlap_count(&wire.points, obstacles, &wire.from, &wire.to);
        length += path_length(&wire.points);
    }
    PassScore {
        crossings,
        overlaps,
        length,
    }
}

/// Routes every edge, in descending weight order, through a fixed number
/// of congestion-negotiation passes, keeping the best pass under the
/// lexicographic `PassScore` order. A final
/// repair sweep re-routes wires that still cut through a node box. Edges
/// with unknown endpoints are skipped silently.
pub(super) fn route(
    diagram: &Diagram,
    boxes: &BTreeMap<String, NodeBox>,
    region: Rect,
    style: &crate::config::LayoutStyle,
) -> (Vec<WireLayout>, Vec<String>) {
    let routing = &style.routing;
    let mut order: Vec<usize> = (0..diagram.edges.len())
        .filter(|&idx| {
            let edge = &diagram.edges[idx];
            edge.from != edge.to
                && boxes.contains_key(&edge.from)
                && boxes.contains_key(&edge.to)
        })
        .collect();
    order.sort_by(|&a, &b| {
        diagram.edges[b]
            .weight
            .cmp(&diagram.edges[a].weight)
            .then(a.cmp(&b))
    });

    let obstacles: Vec<Obstacle> = boxes
        .values()
        .map(|node_box| Obstacle {
            id: node_box.id.clone(),
            rect: node_box.rect,
        })
        .collect();

    let mut best_wires: Vec<WireLayout> = Vec::new();
    let mut best_score: Option<PassScore> = None;
    let mut previous_paths: Vec<Vec<(f32, f32)>> = Vec::new();

    for _pass in 0..routing.passes.max(1) {
        let mut congestion = CongestionMap::new(routing.grid_cell);
        for path in &previous_paths {
            congestion.add_path(path);
        }

        let mut wires = Vec::with_capacity(order.len());
        for &edge_idx in &order {
            let edge = &diagram.edges[edge_idx];
            let ctx = RouteContext {
                from_id: &edge.from,
                to_id: &edge.to,
                from_rect: boxes[&edge.from].rect,
                to_rect: boxes[&edge.to].rect,
                obstacles: &obstacles,
                region,
                style: routing,
            };
            let points = route_one(&ctx, &congestion);
            let label_at = label_anchor(&points);
            wires.push(WireLayout {
                from: edge.from.clone(),
                to: edge.to.clone(),
                label: edge.label.clone(),
                weight: edge.weight,
                points,
                label_at,
            });
        }

        let score = pass_score(&wires, &obstacles);
        previous_paths = wires.iter().map(|wire| wire.points.clone()).collect();
        if best_score.is_none_or(|best| score.better_than(&best)) {
            best_score = Some(score);
            best_wires = wires;
        }
    }

    let warnings = repair(&mut best_wires, &obstacles, region, routing);
    (best_wires, warnings)
}

/// Best-effort patch: re-route any wire that still crosses a node box,
/// using a wider obstacle inflation and a longer stub, in isolation. A
/// wire that cannot be pulled clear is left in place and reported.
fn repair(
    wires: &mut [WireLayout],
    obstacles: &[Obstacle],
    region: Rect,
    style: &RoutingStyle,
) -> Vec<String> {
    let mut warnings = Vec::new();
    let empty = CongestionMap::new(style.grid_cell);
    for wire in wires.iter_mut() {
        if wire_overlap_count(&wire.points, obstacles, &wire.from, &wire.to) == 0 {
            continue;
        }
        let from_rect = obstacles
            .iter()
            .find(|obstacle| obstacle.id == wire.from)
            .map(|obstacle| obstacle.rect);
        let to_rect = obstacles
            .iter()
            .find(|obstacle| obstacle.id == wire.to)
            .map(|obstacle| obstacle.rect);
        let (Some(from_rect), Some(to_rect)) = (from_rect, to_rect) else {
            continue;
        };
        let ctx = RouteContext {
            from_id: &wire.from,
            to_id: &wire.to,
            from_rect,
            to_rect,
            obstacles,
            region,
            style,
        };
        let (start_side, end_side) = edge_sides(&from_rect, &to_rect);
        let start = side_anchor(&from_rect, start_side);
        let end = side_anchor(&to_rect, end_side);
        let s = clamp_stub(&region, stub_point(start, start_side, style.repair_stub), start_side);
        let e = clamp_stub(&region, stub_point(end, end_side, style.repair_stub), end_side);
        if let Some(points) = grid_route(
            &ctx,
            &empty,
            (start, start_side, s),
            (end, end_side, e),
            style.repair_pad,
        ) {
            wire.label_at = label_anchor(&points);
            wire.points = points;
        }
        if wire_overlap_count(&wire.points, obstacles, &wire.from, &wire.to) > 0 {
            warnings.push(format!(
                "wire {} -> {} still overlaps a node box after repair",
                wire.from, wire.to
            ));
        }
    }
    warnings
}
