use crate::config::LayoutConfig;
use crate::ir::FlowNode;

use super::grid::{GridPacking, GridSpec, UnitCell, pack_units};

/// Declared size of a node plus the unit cells drawn inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeBox {
    pub width: f32,
    pub height: f32,
    /// Horizontal margin on each side; also the x-offset of the inner grid.
    pub margin_x: f32,
    pub columns: usize,
    pub cells: Vec<UnitCell>,
    /// No units: drawn as a placeholder shape instead of a grid.
    pub placeholder: bool,
}

pub fn grid_spec_for(node: &FlowNode, config: &LayoutConfig) -> GridSpec {
    let unit = config.unit_size(node.unit_kind.as_deref());
    GridSpec {
        unit_width: unit.width,
        unit_height: unit.height,
        unit_padding: config.grid.unit_padding,
        row_padding: config.grid.row_padding,
        outer_padding: config.grid.outer_padding,
        top_padding: config.grid.top_padding,
    }
}

pub fn size_node(node: &FlowNode, config: &LayoutConfig) -> NodeBox {
    let count = node.unit_count.unwrap_or(0.0);
    if count <= 0.0 || !count.is_finite() {
        return placeholder_box(config);
    }
    let packing = pack_units(count, &grid_spec_for(node, config));
    wrap_packing(packing, config)
}

fn wrap_packing(packing: GridPacking, config: &LayoutConfig) -> NodeBox {
    let margin_x = if config.style.margins {
        config.margin_x.max(0.0)
    } else {
        0.0
    };
    NodeBox {
        width: packing.width + margin_x * 2.0,
        height: packing.height,
        margin_x,
        columns: packing.columns,
        cells: packing.cells,
        placeholder: false,
    }
}

fn placeholder_box(config: &LayoutConfig) -> NodeBox {
    NodeBox {
        width: config.placeholder_width,
        height: config.placeholder_height,
        margin_x: 0.0,
        columns: 0,
        cells: Vec::new(),
        placeholder: true,
    }
}
