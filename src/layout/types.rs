use crate::config::BoxStyle;

use super::arrow::Arrowhead;
use super::fit::{BoundingBox, ViewTransform};
use super::grid::UnitCell;
use super::path::RoundedPath;

#[derive(Debug, Clone, PartialEq)]
pub struct NodeGeometry {
    pub id: String,
    pub label: String,
    pub color: String,
    pub unit_count: Option<f32>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Offset of the unit grid inside the box.
    pub margin_x: f32,
    pub placeholder: bool,
    pub cells: Vec<UnitCell>,
}

/// A unit cell in diagram coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Width of the filled part, proportional to occupancy.
    pub fill_width: f32,
    pub occupancy: f32,
}

impl UnitRect {
    pub fn is_partial(&self) -> bool {
        self.occupancy < 1.0
    }
}

impl NodeGeometry {
    pub fn rect(&self) -> BoundingBox {
        BoundingBox::new(self.x, self.y, self.width, self.height)
    }

    pub fn unit_rects(&self) -> Vec<UnitRect> {
        self.cells
            .iter()
            .map(|cell| UnitRect {
                x: self.x + self.margin_x + cell.x,
                y: self.y + cell.y,
                width: cell.width,
                height: cell.height,
                fill_width: cell.width * cell.occupancy,
                occupancy: cell.occupancy,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeGeometry {
    pub id: String,
    pub source: String,
    pub target: String,
    pub color: Option<String>,
    pub value: f32,
    /// Route sections as returned by the layout engine.
    pub sections: Vec<Vec<(f32, f32)>>,
    pub path: RoundedPath,
    /// `None` when the final segment is degenerate or arrowheads are off.
    pub arrowhead: Option<Arrowhead>,
    pub stroke_width: f32,
    pub outline_width: f32,
}

/// Final geometry of one render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagram {
    pub nodes: Vec<NodeGeometry>,
    pub edges: Vec<EdgeGeometry>,
    pub bounds: BoundingBox,
    pub transform: ViewTransform,
    pub viewport: (f32, f32),
    pub style: BoxStyle,
}

impl Diagram {
    pub fn node(&self, id: &str) -> Option<&NodeGeometry> {
        self.nodes.iter().find(|node| node.id == id)
    }
}
