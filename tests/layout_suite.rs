use blockplan::layout_dump::LayoutDump;
use blockplan::{
    Diagram, Edge, LayoutStyle, Node, Rect, Role, compute_layout, role_flow_label,
};

fn size_of(node: &Node) -> (f32, f32) {
    let w = (node.title.chars().count() as f32 * 7.5 + 28.0).max(100.0);
    let h = 42.0 + node.detail.len() as f32 * 12.0;
    (w, h)
}

fn fixed_size(_node: &Node) -> (f32, f32) {
    (120.0, 60.0)
}

fn region() -> Rect {
    Rect::new(0.0, 0.0, 1000.0, 600.0)
}

fn soc_diagram() -> Diagram {
    let mut detail_node = Node::new("l2", Role::Memory, "L2 Cache");
    detail_node.detail = vec!["512 KiB".to_string(), "8-way".to_string()];
    Diagram::new(
        vec![
            Node::new("seq", Role::Control, "Sequencer"),
            Node::new("fetch", Role::Frontend, "Fetch Unit"),
            Node::new("xbar", Role::Interconnect, "Crossbar"),
            Node::new("alu", Role::Compute, "Vector ALU"),
            detail_node,
            Node::new("wb", Role::Output, "Writeback"),
            Node::new("dma", Role::Io, "DMA Engine"),
            Node::new("sp", Role::Memory, "Scratchpad"),
        ],
        vec![
            Edge::new("seq", "fetch", "ctrl", 2),
            Edge::new("fetch", "xbar", "req", 3),
            Edge::new("xbar", "alu", "instr", 3),
            Edge::new("alu", "l2", "data", 4),
            Edge::new("alu", "wb", "result", 2),
            Edge::new("dma", "sp", "data", 2),
            Edge::new("xbar", "sp", "bus", 1),
            Edge::new("seq", "dma", "ctrl", 1),
        ],
    )
    .unwrap()
}

fn assert_orthogonal(points: &[(f32, f32)]) {
    for pair in points.windows(2) {
        let same_x = (pair[0].0 - pair[1].0).abs() <= 1e-3;
        let same_y = (pair[0].1 - pair[1].1).abs() <= 1e-3;
        assert!(
            same_x || same_y,
            "diagonal segment {:?} -> {:?}",
            pair[0],
            pair[1]
        );
    }
}

fn crossing_count(wires: &[blockplan::WireLayout]) -> usize {
    fn crosses(h: ((f32, f32), (f32, f32)), v: ((f32, f32), (f32, f32))) -> bool {
        let (hx1, hx2) = (h.0.0.min(h.1.0), h.0.0.max(h.1.0));
        let hy = h.0.1;
        let vx = v.0.0;
        let (vy1, vy2) = (v.0.1.min(v.1.1), v.0.1.max(v.1.1));
        vx > hx1 && vx < hx2 && hy > vy1 && hy < vy2
    }
    let mut count = 0;
    for i in 0..wires.len() {
        for j in (i + 1)..wires.len() {
            for a in wires[i].segments() {
                for b in wires[j].segments() {
                    let a_horizontal = (a.0.1 - a.1.1).abs() <= 1e-4;
                    let b_horizontal = (b.0.1 - b.1.1).abs() <= 1e-4;
                    if a_horizontal && !b_horizontal && crosses(a, b) {
                        count += 1;
                    } else if !a_horizontal && b_horizontal && crosses(b, a) {
                        count += 1;
                    }
                }
            }
        }
    }
    count
}

fn on_boundary(point: (f32, f32), rect: &Rect) -> bool {
    let eps = 1e-3;
    let on_vertical = ((point.0 - rect.x).abs() <= eps || (point.0 - rect.right()).abs() <= eps)
        && point.1 >= rect.y - eps
        && point.1 <= rect.bottom() + eps;
    let on_horizontal = ((point.1 - rect.y).abs() <= eps
        || (point.1 - rect.bottom()).abs() <= eps)
        && point.0 >= rect.x - eps
        && point.0 <= rect.right() + eps;
    on_vertical || on_horizontal
}

#[test]
fn layout_is_deterministic() {
    let diagram = soc_diagram();
    let style = LayoutStyle::default();
    let first = compute_layout(&diagram, region(), &style, &size_of);
    let second = compute_layout(&diagram, region(), &style, &size_of);
    let a = serde_json::to_string(&LayoutDump::from_layout(&first)).unwrap();
    let b = serde_json::to_string(&LayoutDump::from_layout(&second)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn boxes_stay_inside_the_region() {
    let diagram = soc_diagram();
    let layout = compute_layout(&diagram, region(), &LayoutStyle::default(), &size_of);
    for node_box in layout.boxes.values() {
        assert!(
            region().contains_rect(&node_box.rect, 0.5),
            "box {} escapes the region: {:?}",
            node_box.id,
            node_box.rect
        );
    }
}

#[test]
fn all_wires_are_orthogonal() {
    let diagram = soc_diagram();
    let layout = compute_layout(&diagram, region(), &LayoutStyle::default(), &size_of);
    assert!(!layout.wires.is_empty());
    for wire in &layout.wires {
        assert!(wire.points.len() >= 2);
        assert_orthogonal(&wire.points);
    }
}

#[test]
fn self_loops_never_reach_the_output() {
    // Bypass Diagram::new's filtering to prove the router also skips them.
    let diagram = Diagram {
        nodes: vec![
            Node::new("a", Role::Compute, "A"),
            Node::new("b", Role::Memory, "B"),
        ],
        edges: vec![
            Edge::new("a", "a", "loop", 5),
            Edge::new("a", "b", "data", 1),
        ],
    };
    let layout = compute_layout(&diagram, region(), &LayoutStyle::default(), &fixed_size);
    assert_eq!(layout.wires.len(), 1);
    assert!(layout.wires.iter().all(|wire| wire.from != wire.to));
}

#[test]
fn dangling_edges_are_skipped_silently() {
    let diagram = Diagram::new(
        vec![Node::new("a", Role::Compute, "A")],
        vec![Edge::new("a", "ghost", "x", 3)],
    )
    .unwrap();
    let layout = compute_layout(&diagram, region(), &LayoutStyle::default(), &fixed_size);
    assert!(layout.wires.is_empty());
}

#[test]
fn placed_labels_are_pairwise_disjoint() {
    let diagram = soc_diagram();
    let layout = compute_layout(&diagram, region(), &LayoutStyle::default(), &size_of);
    for (i, a) in layout.labels.iter().enumerate() {
        for b in layout.labels.iter().skip(i + 1) {
            assert!(
                !a.rect.overlaps(&b.rect),
                "label `{}` overlaps `{}`",
                a.text,
                b.text
            );
        }
    }
}

#[test]
fn two_nodes_one_edge_routes_a_single_wire() {
    let diagram = Diagram::new(
        vec![
            Node::new("src", Role::Frontend, "Source"),
            Node::new("dst", Role::Output, "Sink"),
        ],
        vec![Edge::new("src", "dst", "flow", 1)],
    )
    .unwrap();
    let layout = compute_layout(&diagram, region(), &LayoutStyle::default(), &fixed_size);
    assert_eq!(layout.wires.len(), 1);
    let wire = &layout.wires[0];
    assert!(wire.points.len() >= 2);
    assert_orthogonal(&wire.points);
    let src = &layout.boxes["src"].rect;
    let dst = &layout.boxes["dst"].rect;
    assert!(on_boundary(wire.points[0], src), "wire does not start on the source box");
    assert!(
        on_boundary(wire.points[wire.points.len() - 1], dst),
        "wire does not end on the sink box"
    );
}

#[test]
fn nodes_settle_into_their_role_zones() {
    // A six-node chain whose edges follow role_flow_label adjacency and
    // snake through neighboring grid cells, so wirelength and affinity
    // agree on the same assignment.
    let roles = [
        ("ctl", Role::Control, "Control"),
        ("xbar", Role::Interconnect, "Fabric"),
        ("alu", Role::Compute, "Engine"),
        ("wb", Role::Output, "Drain"),
        ("mem", Role::Memory, "Store"),
        ("fe", Role::Frontend, "Front"),
    ];
    let nodes: Vec<Node> = roles
        .iter()
        .map(|(id, role, title)| Node::new(id, *role, title))
        .collect();
    let edges: Vec<Edge> = roles
        .windows(2)
        .map(|pair| {
            Edge::new(
                pair[0].0,
                pair[1].0,
                role_flow_label(pair[0].1, pair[1].1),
                1,
            )
        })
        .collect();
    let diagram = Diagram::new(nodes, edges).unwrap();
    let style = LayoutStyle::default();
    let bounds = region();
    let layout = compute_layout(&diagram, bounds, &style, &fixed_size);

    for (id, role, _) in roles {
        let (cx, cy) = layout.boxes[id].rect.center();
        let normalized = ((cx - bounds.x) / bounds.w, (cy - bounds.y) / bounds.h);
        let own = style.role_target(role);
        let own_dist = (normalized.0 - own.0).abs() + (normalized.1 - own.1).abs();
        for other in Role::ALL {
            if other == role {
                continue;
            }
            let target = style.role_target(other);
            let dist = (normalized.0 - target.0).abs() + (normalized.1 - target.1).abs();
            assert!(
                own_dist < dist,
                "{id} ({role:?}) sits closer to {other:?}'s zone ({dist}) than its own ({own_dist})"
            );
        }
    }
}

#[test]
fn routing_order_is_weight_then_input_order() {
    let diagram = Diagram::new(
        vec![
            Node::new("a", Role::Compute, "A"),
            Node::new("b", Role::Memory, "B"),
        ],
        vec![
            Edge::new("a", "b", "slow", 1),
            Edge::new("a", "b", "fast", 5),
            Edge::new("a", "b", "slow2", 1),
        ],
    )
    .unwrap();
    let layout = compute_layout(&diagram, region(), &LayoutStyle::default(), &fixed_size);
    let order: Vec<&str> = layout.wires.iter().map(|wire| wire.label.as_str()).collect();
    assert_eq!(order, vec!["fast", "slow", "slow2"]);
}

#[test]
fn congestion_refinement_does_not_add_crossings() {
    // Three equal-weight edges between opposite zones, wired to cross in
    // a naive pass.
    let diagram = Diagram::new(
        vec![
            Node::new("f", Role::Frontend, "Front"),
            Node::new("c", Role::Control, "Ctl"),
            Node::new("d", Role::Io, "Dma"),
            Node::new("alu", Role::Compute, "Alu"),
            Node::new("wb", Role::Output, "Wb"),
            Node::new("mem", Role::Memory, "Mem"),
        ],
        vec![
            Edge::new("f", "wb", "a", 4),
            Edge::new("c", "mem", "b", 4),
            Edge::new("d", "alu", "c", 4),
        ],
    )
    .unwrap();

    let mut single_pass = LayoutStyle::default();
    single_pass.routing.passes = 1;
    let baseline = compute_layout(&diagram, region(), &single_pass, &fixed_size);
    let refined = compute_layout(&diagram, region(), &LayoutStyle::default(), &fixed_size);

    assert!(
        crossing_count(&refined.wires) <= crossing_count(&baseline.wires),
        "refinement added crossings: {} -> {}",
        crossing_count(&baseline.wires),
        crossing_count(&refined.wires)
    );
}

#[test]
fn wire_points_stay_inside_the_region() {
    // A tight region whose height is not a multiple of the router's grid
    // cell, so the A* fallback's outermost cells are in play.
    let diagram = soc_diagram();
    let bounds = Rect::new(0.0, 0.0, 700.0, 420.0);
    let layout = compute_layout(&diagram, bounds, &LayoutStyle::default(), &size_of);
    assert!(!layout.wires.is_empty());
    for wire in &layout.wires {
        for &point in &wire.points {
            assert!(
                bounds.contains_point(point),
                "wire {} -> {} leaves the region at {:?}",
                wire.from,
                wire.to,
                point
            );
        }
    }
}

#[test]
fn label_requests_can_be_placed_through_the_public_api() {
    use blockplan::LabelStyle;
    use blockplan::layout::label_placement::{LabelAlign, LabelRequest, place_labels};

    let bounds = Rect::new(0.0, 0.0, 400.0, 200.0);
    let style = LabelStyle::default();
    let requests = vec![
        LabelRequest {
            text: "left".to_string(),
            anchor: (60.0, 100.0),
            align: LabelAlign::Left,
            priority: 2,
            lane: None,
        },
        LabelRequest {
            text: "right".to_string(),
            anchor: (340.0, 100.0),
            align: LabelAlign::Right,
            priority: 1,
            lane: None,
        },
    ];
    let placed = place_labels(&requests, &[], &[], &bounds, &style);
    assert_eq!(placed.len(), 2);
    let left = placed.iter().find(|label| label.text == "left").unwrap();
    let right = placed.iter().find(|label| label.text == "right").unwrap();
    // Left-aligned text grows rightward from the anchor, right-aligned
    // leftward.
    assert!((left.rect.x - 60.0).abs() < 1e-3);
    assert!((right.rect.right() - 340.0).abs() < 1e-3);
}

#[test]
fn layout_dump_round_trips_through_json() {
    let diagram = soc_diagram();
    let layout = compute_layout(&diagram, region(), &LayoutStyle::default(), &size_of);
    let dump = LayoutDump::from_layout(&layout);
    let json = serde_json::to_string_pretty(&dump).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["nodes"].as_array().unwrap().len(), layout.boxes.len());
    assert_eq!(value["edges"].as_array().unwrap().len(), layout.wires.len());
}
