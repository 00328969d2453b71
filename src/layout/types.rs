use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ir::Role;

/// Axis-aligned rectangle in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn inflate(&self, pad: f32) -> Rect {
        Rect::new(self.x - pad, self.y - pad, self.w + 2.0 * pad, self.h + 2.0 * pad)
    }

    pub fn contains_point(&self, point: (f32, f32)) -> bool {
        point.0 >= self.x && point.0 <= self.right() && point.1 >= self.y && point.1 <= self.bottom()
    }

    pub fn contains_rect(&self, other: &Rect, tolerance: f32) -> bool {
        other.x >= self.x - tolerance
            && other.y >= self.y - tolerance
            && other.right() <= self.right() + tolerance
            && other.bottom() <= self.bottom() + tolerance
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

pub(crate) fn manhattan(a: (f32, f32), b: (f32, f32)) -> f32 {
    (a.0 - b.0).abs() + (a.1 - b.1).abs()
}

/// Whether an axis-aligned segment passes through a rectangle's interior.
/// For orthogonal segments the bounding-box overlap test is exact; strict
/// inequalities mean boundary contact does not count.
pub(crate) fn segment_intersects_rect(a: (f32, f32), b: (f32, f32), rect: &Rect) -> bool {
    let min_x = a.0.min(b.0);
    let max_x = a.0.max(b.0);
    let min_y = a.1.min(b.1);
    let max_y = a.1.max(b.1);
    min_x < rect.right() && max_x > rect.x && min_y < rect.bottom() && max_y > rect.y
}

fn is_horizontal(a: (f32, f32), b: (f32, f32)) -> bool {
    (a.1 - b.1).abs() <= 1e-4
}

fn is_vertical(a: (f32, f32), b: (f32, f32)) -> bool {
    (a.0 - b.0).abs() <= 1e-4
}

/// Strict interior crossing between a horizontal and a vertical segment.
fn orthogonal_cross(h_a: (f32, f32), h_b: (f32, f32), v_a: (f32, f32), v_b: (f32, f32)) -> bool {
    let (hx1, hx2) = (h_a.0.min(h_b.0), h_a.0.max(h_b.0));
    let hy = h_a.1;
    let vx = v_a.0;
    let (vy1, vy2) = (v_a.1.min(v_b.1), v_a.1.max(v_b.1));
    vx > hx1 && vx < hx2 && hy > vy1 && hy < vy2
}

/// Count of perpendicular crossings between two orthogonal polylines.
pub(crate) fn path_crossings(a: &[(f32, f32)], b: &[(f32, f32)]) -> usize {
    let mut count = 0;
    for sa in a.windows(2) {
        for sb in b.windows(2) {
            if is_horizontal(sa[0], sa[1]) && is_vertical(sb[0], sb[1]) {
                if orthogonal_cross(sa[0], sa[1], sb[0], sb[1]) {
                    count += 1;
                }
            } else if is_vertical(sa[0], sa[1]) && is_horizontal(sb[0], sb[1])
                && orthogonal_cross(sb[0], sb[1], sa[0], sa[1])
            {
                count += 1;
            }
        }
    }
    count
}

/// Distance from a point to a line segment.
pub(crate) fn point_segment_distance(p: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    let len_sq = dx * dx + dy * dy;
    if len_sq <= 1e-8 {
        return ((p.0 - a.0).powi(2) + (p.1 - a.1).powi(2)).sqrt();
    }
    let t = (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_sq).clamp(0.0, 1.0);
    let cx = a.0 + t * dx;
    let cy = a.1 + t * dy;
    ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}

/// Placed box for one node, with the text the renderer needs alongside it.
#[derive(Debug, Clone)]
pub struct NodeBox {
    pub id: String,
    pub role: Role,
    pub title: String,
    pub detail: Vec<String>,
    pub rect: Rect,
}

/// A routed edge: orthogonal polyline plus the anchor the label placer
/// starts from.
#[derive(Debug, Clone)]
pub struct WireLayout {
    pub from: String,
    pub to: String,
    pub label: String,
    pub weight: u32,
    pub points: Vec<(f32, f32)>,
    pub label_at: (f32, f32),
}

impl WireLayout {
    pub fn segments(&self) -> impl Iterator<Item = ((f32, f32), (f32, f32))> + '_ {
        self.points.windows(2).map(|pair| (pair[0], pair[1]))
    }
}

/// Final position of one text label.
#[derive(Debug, Clone)]
pub struct LabelLayout {
    pub text: String,
    pub rect: Rect,
    pub anchor: (f32, f32),
}

/// The complete geometry handed to the renderer.
#[derive(Debug, Clone)]
pub struct Layout {
    pub region: Rect,
    pub boxes: BTreeMap<String, NodeBox>,
    pub wires: Vec<WireLayout>,
    pub labels: Vec<LabelLayout>,
    /// Non-fatal degradations encountered while routing, e.g. a wire the
    /// repair pass could not fully pull off a node box.
    pub warnings: Vec<String>,
}
