#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod render;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::{Args, run};
pub use config::{BoxStyle, Config, FlowDiagramStyle, LayoutConfig, RenderConfig};
pub use error::{FlowError, LayoutError};
pub use ir::{FlowEdge, FlowGraph, FlowNode};
pub use layout::{Diagram, LayoutEngine, RenderOutcome, RenderSession, compute_layout};
pub use parser::parse_flow;
pub use render::render_svg;
pub use theme::Theme;

/// Parses a flow document, lays it out with the built-in engine and renders SVG.
pub fn render_flow_svg(input: &str, config: &Config) -> anyhow::Result<String> {
    let parsed = parse_flow(input)?;
    let diagram = compute_layout(&parsed.graph, config)?;
    Ok(render_svg(&diagram, &parsed.graph, &config.theme, &config.render))
}
