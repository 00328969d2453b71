use std::collections::BTreeMap;

use crate::config::LabelStyle;

use super::types::{LabelLayout, Rect, WireLayout, point_segment_distance};
use super::NodeBox;

/// Candidate offsets from the anchor, nearest-preferred first.
const CANDIDATE_OFFSETS: [(f32, f32); 6] = [
    (0.0, -8.0),
    (0.0, 14.0),
    (10.0, -8.0),
    (-90.0, -8.0),
    (10.0, 14.0),
    (-90.0, 14.0),
];

/// Weight of the vertical offset component in the candidate score; labels
/// prefer to slide sideways rather than away from their wire.
const VERTICAL_SCORE_WEIGHT: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelAlign {
    Left,
    Center,
    Right,
}

/// One label to place: where it wants to sit, how important it is, and an
/// optional lane y-coordinate for bus-style diagrams.
#[derive(Debug, Clone)]
pub struct LabelRequest {
    pub text: String,
    pub anchor: (f32, f32),
    pub align: LabelAlign,
    pub priority: u32,
    pub lane: Option<f32>,
}

fn label_rect(pos: (f32, f32), text: &str, align: LabelAlign, style: &LabelStyle) -> Rect {
    let w = text.chars().count().max(1) as f32 * style.char_width;
    let h = style.line_height;
    let x = match align {
        LabelAlign::Left => pos.0,
        LabelAlign::Center => pos.0 - w / 2.0,
        LabelAlign::Right => pos.0 - w,
    };
    Rect::new(x, pos.1 - h / 2.0, w, h)
}

fn candidate_offsets(request: &LabelRequest) -> Vec<(f32, f32)> {
    match request.lane {
        Some(lane) => {
            let dy = lane - request.anchor.1;
            vec![
                (0.0, dy - 8.0),
                (0.0, dy + 6.0),
                (12.0, dy - 8.0),
                (-60.0, dy - 8.0),
                (0.0, -8.0),
                (0.0, 14.0),
            ]
        }
        None => CANDIDATE_OFFSETS.to_vec(),
    }
}

fn candidate_score(
    request: &LabelRequest,
    offset: (f32, f32),
    center: (f32, f32),
    segments: &[((f32, f32), (f32, f32))],
    style: &LabelStyle,
) -> f32 {
    let mut score = offset.0.abs() + VERTICAL_SCORE_WEIGHT * offset.1.abs();
    if segments
        .iter()
        .any(|&(a, b)| point_segment_distance(center, a, b) < style.wire_clearance)
    {
        score += style.clearance_penalty;
    }
    if let Some(lane) = request.lane {
        score += style.lane_weight * (center.1 - lane).abs();
    }
    score
}

/// Places labels in descending priority order under hard non-overlap
/// constraints: a candidate is rejected when it leaves the bounds, covers
/// a node box, or covers a label already placed. When nothing fits, low
/// priority labels are dropped; labels at or above the fallback priority
/// get one unconstrained try near the anchor that still must not collide
/// with boxes or placed labels.
///
/// Public so callers with label sources other than wires (port names,
/// region captions) can place them against the same collision set.
pub fn place_labels(
    requests: &[LabelRequest],
    avoid: &[Rect],
    segments: &[((f32, f32), (f32, f32))],
    bounds: &Rect,
    style: &LabelStyle,
) -> Vec<LabelLayout> {
    let mut order: Vec<usize> = (0..requests.len()).collect();
    order.sort_by(|&a, &b| {
        requests[b]
            .priority
            .cmp(&requests[a].priority)
            .then(a.cmp(&b))
    });

    let mut placed: Vec<LabelLayout> = Vec::new();
    for idx in order {
        let request = &requests[idx];
        let offsets = candidate_offsets(request);

        let mut best: Option<Rect> = None;
        let mut best_score = f32::MAX;
        for offset in &offsets {
            let center = (request.anchor.0 + offset.0, request.anchor.1 + offset.1);
            let rect = label_rect(center, &request.text, request.align, style);
            if !bounds.contains_rect(&rect, 0.0) {
                continue;
            }
            if avoid.iter().any(|blocker| blocker.overlaps(&rect)) {
                continue;
            }
            if placed.iter().any(|label| label.rect.overlaps(&rect)) {
                continue;
            }
            let score = candidate_score(request, *offset, center, segments, style);
            if score < best_score {
                best_score = score;
                best = Some(rect);
            }
        }

        if best.is_none() && request.priority >= style.fallback_min_priority {
            // Bounds and wire-clearance checks are waived, hard collisions
            // are not.
            let offset = offsets[0];
            let center = (request.anchor.0 + offset.0, request.anchor.1 + offset.1);
            let rect = label_rect(center, &request.text, request.align, style);
            if !avoid.iter().any(|blocker| blocker.overlaps(&rect))
                && !placed.iter().any(|label| label.rect.overlaps(&rect))
            {
                best = Some(rect);
            }
        }

        if let Some(rect) = best {
            placed.push(LabelLayout {
                text: request.text.clone(),
                rect,
                anchor: request.anchor,
            });
        }
    }
    placed
}

/// Builds one label request per labeled wire (priority = edge weight,
/// anchor = the router's label anchor) and places them against the node
/// boxes and the full set of wire segments.
pub(super) fn place_wire_labels(
    wires: &[WireLayout],
    boxes: &BTreeMap<String, NodeBox>,
    bounds: &Rect,
    style: &LabelStyle,
) -> Vec<LabelLayout> {
    let requests: Vec<LabelRequest> = wires
        .iter()
        .filter(|wire| !wire.label.is_empty())
        .map(|wire| LabelRequest {
            text: wire.label.clone(),
            anchor: wire.label_at,
            align: LabelAlign::Center,
            priority: wire.weight,
            lane: style.lane,
        })
        .collect();
    let avoid: Vec<Rect> = boxes.values().map(|node_box| node_box.rect).collect();
    let segments: Vec<((f32, f32), (f32, f32))> = wires
        .iter()
        .flat_map(|wire| wire.segments())
        .collect();
    place_labels(&requests, &avoid, &segments, bounds, style)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style() -> LabelStyle {
        LabelStyle::default()
    }

    fn request(text: &str, anchor: (f32, f32), priority: u32) -> LabelRequest {
        LabelRequest {
            text: text.to_string(),
            anchor,
            align: LabelAlign::Center,
            priority,
            lane: None,
        }
    }

    #[test]
    fn placed_labels_never_overlap() {
        let bounds = Rect::new(0.0, 0.0, 400.0, 200.0);
        let requests: Vec<LabelRequest> = (0..6)
            .map(|i| request("crowded", (200.0, 100.0), 6 - i))
            .collect();
        let placed = place_labels(&requests, &[], &[], &bounds, &style());
        for (i, a) in placed.iter().enumerate() {
            for b in placed.iter().skip(i + 1) {
                assert!(!a.rect.overlaps(&b.rect), "{:?} overlaps {:?}", a.rect, b.rect);
            }
        }
    }

    #[test]
    fn low_priority_label_is_dropped_when_nothing_fits() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 30.0);
        let blocker = Rect::new(0.0, 0.0, 100.0, 30.0);
        let requests = vec![request("victim", (50.0, 15.0), 1)];
        let placed = place_labels(&requests, &[blocker], &[], &bounds, &style());
        assert!(placed.is_empty());
    }

    #[test]
    fn high_priority_label_gets_the_unconstrained_fallback() {
        // Bounds too tight for any candidate, but no hard collision.
        let bounds = Rect::new(0.0, 0.0, 20.0, 10.0);
        let requests = vec![request("important", (10.0, 5.0), 5)];
        let placed = place_labels(&requests, &[], &[], &bounds, &style());
        assert_eq!(placed.len(), 1);
    }

    #[test]
    fn lane_request_pulls_the_label_toward_the_lane() {
        let bounds = Rect::new(0.0, 0.0, 600.0, 400.0);
        let mut with_lane = request("bus", (300.0, 100.0), 2);
        with_lane.lane = Some(300.0);
        let placed = place_labels(&[with_lane], &[], &[], &bounds, &style());
        assert_eq!(placed.len(), 1);
        let (_, cy) = placed[0].rect.center();
        assert!(
            (cy - 300.0).abs() < 20.0,
            "label stayed at y {cy} instead of near the lane"
        );
    }

    #[test]
    fn proximity_to_a_wire_is_penalized() {
        let req = request("x", (100.0, 100.0), 1);
        let segments = vec![((0.0, 100.0), (200.0, 100.0))];
        let near = candidate_score(&req, (0.0, 2.0), (100.0, 102.0), &segments, &style());
        let clear = candidate_score(&req, (0.0, 14.0), (100.0, 114.0), &segments, &style());
        assert!(near > clear);
    }
}
