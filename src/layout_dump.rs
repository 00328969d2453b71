use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;

use crate::layout::Layout;

/// Serializable snapshot of a finished layout, for downstream tooling
/// that consumes the geometry as JSON instead of rendered markup.
#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
    pub labels: Vec<LabelDump>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub role: String,
    pub title: String,
    pub detail: Vec<String>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: String,
    pub to: String,
    pub label: String,
    pub weight: u32,
    pub points: Vec<[f32; 2]>,
    pub label_at: [f32; 2],
}

#[derive(Debug, Serialize)]
pub struct LabelDump {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout) -> Self {
        let nodes = layout
            .boxes
            .values()
            .map(|node_box| NodeDump {
                id: node_box.id.clone(),
                role: node_box.role.as_str().to_string(),
                title: node_box.title.clone(),
                detail: node_box.detail.clone(),
                x: node_box.rect.x,
                y: node_box.rect.y,
                width: node_box.rect.w,
                height: node_box.rect.h,
            })
            .collect();

        let edges = layout
            .wires
            .iter()
            .map(|wire| EdgeDump {
                from: wire.from.clone(),
                to: wire.to.clone(),
                label: wire.label.clone(),
                weight: wire.weight,
                points: wire.points.iter().map(|(x, y)| [*x, *y]).collect(),
                label_at: [wire.label_at.0, wire.label_at.1],
            })
            .collect();

        let labels = layout
            .labels
            .iter()
            .map(|label| LabelDump {
                text: label.text.clone(),
                x: label.rect.x,
                y: label.rect.y,
                width: label.rect.w,
                height: label.rect.h,
            })
            .collect();

        LayoutDump {
            width: layout.region.w,
            height: layout.region.h,
            nodes,
            edges,
            labels,
            warnings: layout.warnings.clone(),
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &Layout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
