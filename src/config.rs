use serde::{Deserialize, Serialize};

use crate::ir::Role;

/// One archetype's worth of layout tuning: role target zones, slot grid
/// spacing, cost weights, routing caps and label rules. Diagram archetypes
/// (an accelerator floorplan, a cache hierarchy, a bus-style view) differ
/// only by the `LayoutStyle` they pass in; the engine itself is shared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutStyle {
    /// Inset from the region border before the slot grid is carved out.
    pub margin: f32,
    /// Gap between adjacent slot cells.
    pub slot_gap: f32,
    pub role_targets: Vec<RoleTarget>,
    pub placement: PlacementStyle,
    pub routing: RoutingStyle,
    pub labels: LabelStyle,
}

/// Normalized canvas position a role's nodes gravitate toward.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RoleTarget {
    pub role: Role,
    pub x: f32,
    pub y: f32,
}

impl Default for LayoutStyle {
    fn default() -> Self {
        Self {
            margin: 28.0,
            slot_gap: 36.0,
            role_targets: default_role_targets(),
            placement: PlacementStyle::default(),
            routing: RoutingStyle::default(),
            labels: LabelStyle::default(),
        }
    }
}

impl LayoutStyle {
    /// Normalized target point for a role. Roles missing from the table
    /// fall back to the canvas center.
    pub fn role_target(&self, role: Role) -> (f32, f32) {
        self.role_targets
            .iter()
            .find(|target| target.role == role)
            .map(|target| (target.x, target.y))
            .unwrap_or((0.5, 0.5))
    }

    /// Preset for bus-style diagrams: wire labels prefer a horizontal lane
    /// at `y` instead of hugging their own wire.
    pub fn bus_lane(y: f32) -> Self {
        let mut style = Self::default();
        style.labels.lane = Some(y);
        style
    }
}

fn default_role_targets() -> Vec<RoleTarget> {
    let table = [
        (Role::Control, 0.15, 0.18),
        (Role::Frontend, 0.15, 0.62),
        (Role::Interconnect, 0.5, 0.5),
        (Role::Memory, 0.5, 0.85),
        (Role::Compute, 0.85, 0.4),
        (Role::Output, 0.85, 0.82),
        (Role::Io, 0.08, 0.95),
    ];
    table
        .into_iter()
        .map(|(role, x, y)| RoleTarget { role, x, y })
        .collect()
}

/// Cost weights and the sweep cap for pairwise-swap hill climbing. The
/// relative ordering matters more than the literal values: an obstacle
/// collision must outweigh a wire crossing, a crossing must outweigh the
/// role-affinity pull, and affinity must outweigh plain wirelength.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementStyle {
    /// Penalty when a preview path would cut through a third node's box.
    pub obstacle_penalty: f64,
    /// Penalty per perpendicular crossing between two preview paths.
    pub crossing_penalty: f64,
    /// Weight on normalized Manhattan distance from a node to its role target.
    pub affinity_weight: f64,
    /// Full pairwise sweeps before the climb gives up.
    pub max_sweeps: usize,
}

impl Default for PlacementStyle {
    fn default() -> Self {
        Self {
            obstacle_penalty: 1600.0,
            crossing_penalty: 800.0,
            affinity_weight: 260.0,
            max_sweeps: 48,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingStyle {
    /// How far a wire projects straight out of a node before turning.
    pub stub_len: f32,
    /// Inflation applied to node boxes when testing candidate clearance.
    pub obstacle_pad: f32,
    /// Cell size of the A* fallback grid.
    pub grid_cell: f32,
    /// Extra cost for changing direction at an A* cell, as a fraction of
    /// the per-cell step cost.
    pub turn_penalty: f32,
    /// A* expansion cap; beyond it the router emits a zig-zag fallback.
    pub max_expansions: usize,
    /// Congestion-negotiation rounds over the whole edge set.
    pub passes: usize,
    /// Cost added per unit of prior-pass corridor usage under a candidate.
    pub congestion_weight: f32,
    /// Obstacle inflation used by the post-routing repair pass.
    pub repair_pad: f32,
    /// Stub length used by the repair pass.
    pub repair_stub: f32,
}

impl Default for RoutingStyle {
    fn default() -> Self {
        Self {
            stub_len: 12.0,
            obstacle_pad: 8.0,
            grid_cell: 16.0,
            turn_penalty: 0.7,
            max_expansions: 25_000,
            passes: 4,
            congestion_weight: 6.0,
            repair_pad: 14.0,
            repair_stub: 20.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelStyle {
    /// Estimated advance width per character, for label bounding boxes.
    pub char_width: f32,
    /// Label box height.
    pub line_height: f32,
    /// A label center closer than this to any wire segment is penalized.
    pub wire_clearance: f32,
    pub clearance_penalty: f32,
    /// Weight on vertical distance from the requested lane, if any.
    pub lane_weight: f32,
    /// Minimum priority for the bounded unconstrained fallback; lower
    /// priority labels are dropped when no candidate fits.
    pub fallback_min_priority: u32,
    /// Preferred lane y-coordinate for bus-style diagrams.
    pub lane: Option<f32>,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            char_width: 6.5,
            line_height: 12.0,
            wire_clearance: 8.0,
            clearance_penalty: 25.0,
            lane_weight: 0.8,
            fallback_min_priority: 3,
            lane: None,
        }
    }
}
