use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Semantic category of a hardware block, used to bias placement toward a
/// canonical zone of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Control,
    Memory,
    Compute,
    Interconnect,
    Frontend,
    Output,
    Io,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Control,
        Role::Memory,
        Role::Compute,
        Role::Interconnect,
        Role::Frontend,
        Role::Output,
        Role::Io,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Control => "control",
            Role::Memory => "memory",
            Role::Compute => "compute",
            Role::Interconnect => "interconnect",
            Role::Frontend => "frontend",
            Role::Output => "output",
            Role::Io => "io",
        }
    }
}

/// Canonical short label for a dataflow edge between two roles. Used by
/// callers that synthesize edges from hierarchy structure and want a
/// consistent vocabulary on the wires.
pub fn role_flow_label(from: Role, to: Role) -> &'static str {
    match (from, to) {
        (Role::Control, _) => "ctrl",
        (_, Role::Control) => "status",
        (Role::Memory, _) | (_, Role::Memory) => "data",
        (Role::Frontend, Role::Compute) => "instr",
        (Role::Compute, Role::Output) => "result",
        (Role::Interconnect, _) | (_, Role::Interconnect) => "bus",
        (Role::Io, _) | (_, Role::Io) => "io",
        _ => "link",
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub role: Role,
    pub title: String,
    /// Extra text lines rendered under the title. May be empty.
    pub detail: Vec<String>,
}

impl Node {
    pub fn new(id: &str, role: Role, title: &str) -> Self {
        Self {
            id: id.to_string(),
            role,
            title: title.to_string(),
            detail: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub label: String,
    /// Priority and thickness proxy; higher-weight edges are routed first.
    pub weight: u32,
}

impl Edge {
    pub fn new(from: &str, to: &str, label: &str, weight: u32) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            label: label.to_string(),
            weight: weight.max(1),
        }
    }
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("duplicate node id `{0}`")]
    DuplicateNode(String),
    #[error("empty node id")]
    EmptyNodeId,
}

/// The input graph: immutable once constructed. Node and edge order is
/// preserved and meaningful — the placer iterates nodes in order and the
/// router breaks weight ties by edge input order.
#[derive(Debug, Clone)]
pub struct Diagram {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Diagram {
    /// Builds a diagram, rejecting duplicate node ids and dropping
    /// self-loop edges. Edges whose endpoints reference unknown ids are
    /// kept here and silently ignored downstream.
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, ModelError> {
        let mut seen = BTreeSet::new();
        for node in &nodes {
            if node.id.is_empty() {
                return Err(ModelError::EmptyNodeId);
            }
            if !seen.insert(node.id.as_str()) {
                return Err(ModelError::DuplicateNode(node.id.clone()));
            }
        }
        let edges = edges
            .into_iter()
            .filter(|edge| edge.from != edge.to)
            .collect();
        Ok(Self { nodes, edges })
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|node| node.id == id)
    }
}
