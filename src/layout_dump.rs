use crate::layout::{BoundingBox, Diagram, ViewTransform};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub viewport: [f32; 2],
    pub bounds: BoundingBox,
    pub transform: ViewTransform,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub label: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub placeholder: bool,
    pub units: Vec<UnitDump>,
}

#[derive(Debug, Serialize)]
pub struct UnitDump {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub occupancy: f32,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub id: String,
    pub from: String,
    pub to: String,
    pub value: f32,
    pub stroke_width: f32,
    pub points: Vec<[f32; 2]>,
    pub path: String,
    pub arrowhead: Option<[[f32; 2]; 3]>,
}

impl LayoutDump {
    pub fn from_diagram(diagram: &Diagram) -> Self {
        let nodes = diagram
            .nodes
            .iter()
            .map(|node| NodeDump {
                id: node.id.clone(),
                label: node.label.clone(),
                x: node.x,
                y: node.y,
                width: node.width,
                height: node.height,
                placeholder: node.placeholder,
                units: node
                    .unit_rects()
                    .into_iter()
                    .map(|unit| UnitDump {
                        x: unit.x,
                        y: unit.y,
                        width: unit.width,
                        height: unit.height,
                        occupancy: unit.occupancy,
                    })
                    .collect(),
            })
            .collect();

        let edges = diagram
            .edges
            .iter()
            .map(|edge| EdgeDump {
                id: edge.id.clone(),
                from: edge.source.clone(),
                to: edge.target.clone(),
                value: edge.value,
                stroke_width: edge.stroke_width,
                points: edge
                    .sections
                    .iter()
                    .flatten()
                    .map(|(x, y)| [*x, *y])
                    .collect(),
                path: edge.path.to_svg_d(),
                arrowhead: edge
                    .arrowhead
                    .map(|head| head.points().map(|(x, y)| [x, y])),
            })
            .collect();

        LayoutDump {
            viewport: [diagram.viewport.0, diagram.viewport.1],
            bounds: diagram.bounds,
            transform: diagram.transform,
            nodes,
            edges,
        }
    }
}

pub fn write_layout_dump(path: &Path, diagram: &Diagram) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_diagram(diagram);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
