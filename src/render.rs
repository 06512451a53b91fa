use crate::config::RenderConfig;
use crate::ir::{FlowGraph, format_count};
use crate::layout::{Diagram, EdgeGeometry, NodeGeometry, UnitRect};
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

const NODE_CORNER_RADIUS: f32 = 5.0;
const LABEL_OFFSET: (f32, f32) = (10.0, 20.0);
const EDGE_OVERLAY_OPACITY: f32 = 0.6;
const UNIT_FILL_OPACITY: f32 = 0.1;
const UNIT_OUTLINE_OPACITY: f32 = 0.3;
const UNIT_LABEL_OPACITY: f32 = 0.6;

/// Serializes a laid-out diagram as a standalone SVG document.
///
/// `graph` is only consulted for hover metadata (`<title>` tooltips).
pub fn render_svg(diagram: &Diagram, graph: &FlowGraph, theme: &Theme, config: &RenderConfig) -> String {
    let mut svg = String::new();
    let width = config.width;
    let height = config.height;

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        escape_xml(&config.background)
    ));
    svg.push_str(&format!(
        "<g class=\"viewport\" transform=\"{}\">",
        diagram.transform.to_svg_attr()
    ));

    // Strokes under nodes, arrowheads over them: tips reach past the box edge.
    for edge in &diagram.edges {
        svg.push_str(&edge_svg(edge, theme));
    }
    for node in &diagram.nodes {
        svg.push_str(&node_svg(node, graph, theme, diagram.style.placeholder_diamond));
    }
    if diagram.edges.iter().any(|edge| edge.arrowhead.is_some()) {
        svg.push_str("<g class=\"arrowheads\">");
        for edge in &diagram.edges {
            svg.push_str(&arrowhead_svg(edge, theme));
        }
        svg.push_str("</g>");
    }

    svg.push_str("</g></svg>");
    svg
}

fn node_svg(node: &NodeGeometry, graph: &FlowGraph, theme: &Theme, diamond: bool) -> String {
    let mut out = String::new();
    let mut attrs = format!("class=\"node\" data-id=\"{}\"", escape_xml(&node.id));
    let info = graph.node_info(&node.id);
    if let Some(icon) = info.as_ref().and_then(|info| info.icon.as_deref()) {
        attrs.push_str(&format!(" data-icon=\"{}\"", escape_xml(icon)));
    }
    out.push_str(&format!("<g {attrs}>"));

    if let Some(info) = &info {
        let mut tooltip = format!("{}\nProducer: {}", info.name, info.kind);
        if let Some(count) = info.unit_count {
            tooltip.push_str(&format!("\nMachines: {}", format_count(count)));
        }
        out.push_str(&format!("<title>{}</title>", escape_xml(&tooltip)));
    }

    let fill = escape_xml(&node.color);
    if node.placeholder && diamond {
        let cx = node.x + node.width / 2.0;
        let cy = node.y + node.height / 2.0;
        out.push_str(&format!(
            "<polygon points=\"{cx:.2},{:.2} {:.2},{cy:.2} {cx:.2},{:.2} {:.2},{cy:.2}\" fill=\"{fill}\"/>",
            node.y,
            node.x + node.width,
            node.y + node.height,
            node.x,
        ));
    } else {
        out.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"{NODE_CORNER_RADIUS}\" ry=\"{NODE_CORNER_RADIUS}\" fill=\"{fill}\" stroke=\"{fill}\" stroke-width=\"{}\"/>",
            node.x, node.y, node.width, node.height, theme.node_stroke_width
        ));
    }

    let fore = escape_xml(theme.fore_color(&node.color));
    out.push_str(&format!(
        "<text x=\"{:.2}\" y=\"{:.2}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
        node.x + LABEL_OFFSET.0,
        node.y + LABEL_OFFSET.1,
        escape_xml(&theme.font_family),
        theme.font_size,
        fore,
        escape_xml(&node.label)
    ));

    for unit in node.unit_rects() {
        out.push_str(&unit_svg(&unit, &fore));
    }

    out.push_str("</g>");
    out
}

fn unit_svg(unit: &UnitRect, fore: &str) -> String {
    let mut out = format!(
        "<rect class=\"unit\" x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"{NODE_CORNER_RADIUS}\" ry=\"{NODE_CORNER_RADIUS}\" fill=\"{fore}\" fill-opacity=\"{UNIT_FILL_OPACITY}\"/>",
        unit.x, unit.y, unit.fill_width, unit.height
    );
    if unit.is_partial() {
        out.push_str(&format!(
            "<rect class=\"unit-outline\" x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"{NODE_CORNER_RADIUS}\" ry=\"{NODE_CORNER_RADIUS}\" fill=\"none\" stroke=\"{fore}\" stroke-opacity=\"{UNIT_OUTLINE_OPACITY}\" stroke-dasharray=\"5,5\"/>",
            unit.x, unit.y, unit.width, unit.height
        ));
        out.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" dominant-baseline=\"central\" opacity=\"{UNIT_LABEL_OPACITY}\" font-size=\"{:.2}\" fill=\"{fore}\">{}</text>",
            unit.x + unit.width / 2.0,
            unit.y + unit.height / 2.0,
            unit.height / 4.0,
            format_count(unit.occupancy)
        ));
    }
    out
}

fn edge_svg(edge: &EdgeGeometry, theme: &Theme) -> String {
    let d = edge.path.to_svg_d();
    let color = edge_color(edge, theme);
    let mut out = format!(
        "<g class=\"edge\" data-id=\"{}\" data-source=\"{}\" data-target=\"{}\">",
        escape_xml(&edge.id),
        escape_xml(&edge.source),
        escape_xml(&edge.target)
    );
    out.push_str(&format!(
        "<path d=\"{d}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{:.2}\" stroke-linejoin=\"round\" stroke-linecap=\"round\"/>",
        escape_xml(&theme.edge_outline_color),
        edge.outline_width
    ));
    out.push_str(&format!(
        "<path d=\"{d}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"{:.2}\" stroke-opacity=\"{EDGE_OVERLAY_OPACITY}\" stroke-linejoin=\"round\" stroke-linecap=\"round\"/>",
        edge.stroke_width
    ));
    out.push_str("</g>");
    out
}

fn arrowhead_svg(edge: &EdgeGeometry, theme: &Theme) -> String {
    let Some(head) = &edge.arrowhead else {
        return String::new();
    };
    format!(
        "<path data-id=\"{}\" d=\"{}\" fill=\"{}\"/>",
        escape_xml(&edge.id),
        head.to_svg_d(),
        edge_color(edge, theme)
    )
}

fn edge_color(edge: &EdgeGeometry, theme: &Theme) -> String {
    escape_xml(edge.color.as_deref().unwrap_or(&theme.default_edge_color))
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = "Inter".to_string();
    if let Some(size) = usvg::Size::from_wh(render_cfg.width, render_cfg.height) {
        opt.default_size = size;
    }

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BoxStyle, Config};
    use crate::ir::FlowNode;
    use crate::layout::compute_layout;

    fn sample_graph() -> FlowGraph {
        let mut graph = FlowGraph::new();
        graph.add_node(
            FlowNode::new("ore", "Iron <Ore>")
                .with_units(2.5, "miner-mk1")
                .with_color("#ffffff"),
        );
        graph.add_node(FlowNode::new("sink", "Sink"));
        graph.add_edge("ore", "sink", 30.0);
        graph
    }

    #[test]
    fn render_svg_basic() {
        let config = Config::default();
        let graph = sample_graph();
        let diagram = compute_layout(&graph, &config).expect("layout");
        let svg = render_svg(&diagram, &graph, &config.theme, &config.render);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("Iron &lt;Ore&gt; (2.5)"));
        assert!(svg.contains(&diagram.transform.to_svg_attr()));
        assert!(svg.contains("<polygon"));
        assert!(svg.contains("stroke-dasharray=\"5,5\""));
        assert!(svg.contains(">0.5</text>"));
        assert!(svg.contains("Producer: miner-mk1"));
        assert_eq!(svg.matches("class=\"unit\"").count(), 3);
        // Two strokes for the edge, one dashed outline for the partial unit.
        assert_eq!(svg.matches("fill=\"none\" stroke=").count(), 2 + 1);
    }

    #[test]
    fn label_contrasts_with_fill() {
        let config = Config::default();
        let graph = sample_graph();
        let diagram = compute_layout(&graph, &config).expect("layout");
        let svg = render_svg(&diagram, &graph, &config.theme, &config.render);
        assert!(svg.contains(&format!("fill=\"{}\">Iron", config.theme.text_color)));
    }

    #[test]
    fn box_line_style_uses_rect_placeholder() {
        let mut config = Config::default();
        config.layout.style = BoxStyle::box_line();
        let graph = sample_graph();
        let diagram = compute_layout(&graph, &config).expect("layout");
        let svg = render_svg(&diagram, &graph, &config.theme, &config.render);
        assert!(!svg.contains("<polygon"));
        assert_eq!(svg.matches("<path d=").count(), 2);
    }

    #[test]
    fn quoted_theme_values_stay_inside_attributes() {
        let config = crate::config::parse_config(
            r#"{ themeVariables: { fontFamily: "\"Trebuchet MS\", sans-serif", edgeOutlineColor: "rgb(30 30 30) \"x\"" } }"#,
        )
        .expect("config parses");
        let graph = sample_graph();
        let diagram = compute_layout(&graph, &config).expect("layout");
        let svg = render_svg(&diagram, &graph, &config.theme, &config.render);
        assert!(svg.contains("font-family=\"&quot;Trebuchet MS&quot;, sans-serif\""));
        assert!(svg.contains("stroke=\"rgb(30 30 30) &quot;x&quot;\""));
        assert!(!svg.contains("\"\"Trebuchet"));
    }

    #[test]
    fn edge_strokes_under_nodes_and_arrowheads_over() {
        let config = Config::default();
        let graph = sample_graph();
        let diagram = compute_layout(&graph, &config).expect("layout");
        let svg = render_svg(&diagram, &graph, &config.theme, &config.render);
        let first_edge = svg.find("class=\"edge\"").expect("edge group");
        let first_node = svg.find("class=\"node\"").expect("node group");
        let last_node = svg.rfind("class=\"node\"").expect("node group");
        let heads = svg.find("class=\"arrowheads\"").expect("arrowhead group");
        assert!(first_edge < first_node);
        assert!(last_node < heads);
        assert!(svg[heads..].contains("data-id=\"e0\""));
    }

    #[test]
    fn escape_xml_handles_markup() {
        assert_eq!(escape_xml("a & <b>"), "a &amp; &lt;b&gt;");
    }
}
