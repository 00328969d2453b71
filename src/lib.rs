pub mod config;
pub mod ir;
pub mod layout;
pub mod layout_dump;

pub use config::{LabelStyle, LayoutStyle, PlacementStyle, RoleTarget, RoutingStyle};
pub use ir::{Diagram, Edge, ModelError, Node, Role, role_flow_label};
pub use layout::{LabelLayout, Layout, NodeBox, Rect, WireLayout, compute_layout};
