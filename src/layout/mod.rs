mod arrow;
mod assemble;
mod engine;
mod fit;
mod grid;
mod path;
mod routing;
mod sizing;
pub(crate) mod types;

pub use arrow::{Arrowhead, arrow_width, arrowhead, arrowhead_for_route, outline_width, stroke_width};
pub use assemble::{
    PreparedLayout, RenderOutcome, RenderSession, assemble_diagram, edge_id, layout_flow,
    prepare_layout,
};
pub use engine::{
    DagreEngine, EdgeSection, LayoutEdgeRequest, LayoutEngine, LayoutNodeRequest, LayoutPoint,
    LayoutRequest, LayoutResponse, PlacedNode, ReplayEngine, RoutedEdge,
};
pub use fit::{BoundingBox, BoundsBuilder, ViewTransform, fit_scale, fit_view};
pub use grid::{GridPacking, GridSpec, UnitCell, grid_columns, pack_units};
pub use path::{PathCommand, RoundedPath, round_polyline};
pub use routing::{RouteAxis, compress_path, route_orthogonal};
pub use sizing::{NodeBox, grid_spec_for, size_node};
pub use types::*;

use crate::config::Config;
use crate::error::LayoutError;
use crate::ir::FlowGraph;

/// Lays out `graph` with the built-in dagre engine, fitted to the configured
/// render size.
pub fn compute_layout(graph: &FlowGraph, config: &Config) -> Result<Diagram, LayoutError> {
    let viewport = (config.render.width, config.render.height);
    futures::executor::block_on(layout_flow(
        graph,
        &DagreEngine::new(),
        &config.layout,
        viewport,
    ))
}
