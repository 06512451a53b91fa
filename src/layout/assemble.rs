//! Turns a flow graph into final diagram geometry.
//!
//! Nodes are sized locally, placed by a [`LayoutEngine`], then decorated with
//! unit grids, rounded routes, arrowheads and a viewport fit.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::config::LayoutConfig;
use crate::error::LayoutError;
use crate::ir::FlowGraph;

use super::arrow::{arrowhead_for_route, outline_width, stroke_width};
use super::engine::{
    LayoutEdgeRequest, LayoutEngine, LayoutNodeRequest, LayoutRequest, LayoutResponse, PlacedNode,
};
use super::fit::{BoundsBuilder, fit_view};
use super::path::RoundedPath;
use super::sizing::{NodeBox, size_node};
use super::types::{Diagram, EdgeGeometry, NodeGeometry};

const ROOT_ID: &str = "root";

/// A layout request together with the local sizing it was built from.
#[derive(Debug, Clone)]
pub struct PreparedLayout {
    pub request: LayoutRequest,
    pub boxes: HashMap<String, NodeBox>,
    /// Request edge id to index in `FlowGraph::links`.
    pub edge_links: HashMap<String, usize>,
}

pub fn edge_id(index: usize) -> String {
    format!("e{index}")
}

/// Sizes every node and builds the engine request.
///
/// Links whose endpoints are not nodes of the graph are left out. A node whose
/// machine count exceeds `config.max_unit_count` fails the whole request.
pub fn prepare_layout(
    graph: &FlowGraph,
    config: &LayoutConfig,
) -> Result<PreparedLayout, LayoutError> {
    let mut boxes = HashMap::with_capacity(graph.nodes.len());
    let mut children = Vec::with_capacity(graph.nodes.len());
    for node in &graph.nodes {
        if let Some(count) = node.unit_count
            && count > config.max_unit_count
        {
            return Err(LayoutError::TooManyUnits {
                id: node.id.clone(),
                count,
                max: config.max_unit_count,
            });
        }
        let node_box = size_node(node, config);
        children.push(LayoutNodeRequest {
            id: node.id.clone(),
            width: node_box.width,
            height: node_box.height,
        });
        boxes.insert(node.id.clone(), node_box);
    }

    let mut edges = Vec::with_capacity(graph.links.len());
    let mut edge_links = HashMap::with_capacity(graph.links.len());
    for (idx, link) in graph.links.iter().enumerate() {
        if !boxes.contains_key(&link.source) || !boxes.contains_key(&link.target) {
            log::warn!(
                source_id = link.source.as_str(),
                target_id = link.target.as_str();
                "Dropping link with unknown endpoint"
            );
            continue;
        }
        let id = edge_id(idx);
        edges.push(LayoutEdgeRequest {
            id: id.clone(),
            sources: vec![link.source.clone()],
            targets: vec![link.target.clone()],
        });
        edge_links.insert(id, idx);
    }

    Ok(PreparedLayout {
        request: LayoutRequest {
            id: ROOT_ID.to_string(),
            children,
            edges,
            layout_options: config.layout_options.clone(),
        },
        boxes,
        edge_links,
    })
}

/// Combines the engine's answer with the local sizing into a [`Diagram`].
///
/// Nodes the engine did not place and edges without usable sections are
/// skipped. The view transform fits nodes, routes and arrowheads into
/// `viewport`.
pub fn assemble_diagram(
    graph: &FlowGraph,
    prepared: &PreparedLayout,
    response: &LayoutResponse,
    config: &LayoutConfig,
    viewport: (f32, f32),
) -> Diagram {
    let placed: HashMap<&str, &PlacedNode> = response
        .children
        .iter()
        .map(|child| (child.id.as_str(), child))
        .collect();

    let mut bounds = BoundsBuilder::default();
    let mut nodes = Vec::with_capacity(graph.nodes.len());
    for node in &graph.nodes {
        let Some(node_box) = prepared.boxes.get(&node.id) else {
            continue;
        };
        let Some(position) = placed.get(node.id.as_str()) else {
            log::debug!(node_id = node.id.as_str(); "Layout engine did not place node");
            continue;
        };
        let geometry = NodeGeometry {
            id: node.id.clone(),
            label: node.display_label(),
            color: node.color.clone(),
            unit_count: node.unit_count,
            x: position.x,
            y: position.y,
            width: node_box.width,
            height: node_box.height,
            margin_x: node_box.margin_x,
            placeholder: node_box.placeholder,
            cells: node_box.cells.clone(),
        };
        bounds.add_rect(geometry.rect());
        nodes.push(geometry);
    }

    let mut edges = Vec::with_capacity(response.edges.len());
    for routed in &response.edges {
        let Some(link) = prepared
            .edge_links
            .get(&routed.id)
            .and_then(|idx| graph.links.get(*idx))
        else {
            log::debug!(edge_id = routed.id.as_str(); "Ignoring routed edge with unknown id");
            continue;
        };
        let sections: Vec<Vec<(f32, f32)>> = routed
            .sections
            .iter()
            .map(|section| section.points())
            .collect();
        if sections.is_empty() {
            log::debug!(edge_id = routed.id.as_str(); "Routed edge has no sections");
            continue;
        }

        let mut path = RoundedPath::default();
        for points in &sections {
            path.push_section(points, config.corner_radius);
            for point in points {
                bounds.add_point(*point);
            }
        }

        let arrowhead = if config.style.arrowheads {
            let head = sections
                .last()
                .and_then(|points| arrowhead_for_route(points, link.value, config.arrow_length));
            if head.is_none() {
                log::debug!(edge_id = routed.id.as_str(); "Degenerate final segment, no arrowhead");
            }
            head
        } else {
            None
        };
        if let Some(head) = &arrowhead {
            for point in head.points() {
                bounds.add_point(point);
            }
        }

        edges.push(EdgeGeometry {
            id: routed.id.clone(),
            source: link.source.clone(),
            target: link.target.clone(),
            color: link.color.clone(),
            value: link.value,
            sections,
            path,
            arrowhead,
            stroke_width: stroke_width(link.value),
            outline_width: outline_width(link.value),
        });
    }

    let bounds = bounds.finish();
    let transform = fit_view(&bounds, viewport.0, viewport.1);
    Diagram {
        nodes,
        edges,
        bounds,
        transform,
        viewport,
        style: config.style,
    }
}

/// One-shot layout without supersession tracking.
pub async fn layout_flow<E: LayoutEngine>(
    graph: &FlowGraph,
    engine: &E,
    config: &LayoutConfig,
    viewport: (f32, f32),
) -> Result<Diagram, LayoutError> {
    let prepared = prepare_layout(graph, config)?;
    let response = engine.layout(&prepared.request).await?;
    Ok(assemble_diagram(graph, &prepared, &response, config, viewport))
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    Ready(Diagram),
    /// A newer render started before this one finished; its result was dropped.
    Superseded,
}

impl RenderOutcome {
    pub fn into_diagram(self) -> Option<Diagram> {
        match self {
            Self::Ready(diagram) => Some(diagram),
            Self::Superseded => None,
        }
    }
}

/// Tracks overlapping renders so only the latest one is applied.
///
/// Each call to [`RenderSession::render`] takes a ticket when it is called,
/// not when it is first polled. A render whose ticket is no longer current
/// when the engine answers resolves to [`RenderOutcome::Superseded`].
#[derive(Debug)]
pub struct RenderSession {
    config: LayoutConfig,
    viewport: (f32, f32),
    generation: AtomicU64,
    loading: AtomicBool,
}

impl RenderSession {
    pub fn new(config: LayoutConfig, viewport: (f32, f32)) -> Self {
        Self {
            config,
            viewport,
            generation: AtomicU64::new(0),
            loading: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// True from the start of a render until the latest one completes.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.current_generation() == ticket
    }

    pub fn render<'a, E: LayoutEngine>(
        &'a self,
        graph: &'a FlowGraph,
        engine: &'a E,
    ) -> impl Future<Output = Result<RenderOutcome, LayoutError>> + 'a {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.loading.store(true, Ordering::SeqCst);
        let prepared = prepare_layout(graph, &self.config);
        if let Ok(prepared) = &prepared {
            log::debug!(
                generation = ticket,
                nodes = prepared.request.children.len(),
                edges = prepared.request.edges.len();
                "Starting layout"
            );
        }

        async move {
            let answered = match prepared {
                Ok(prepared) => engine
                    .layout(&prepared.request)
                    .await
                    .map(|response| (prepared, response)),
                Err(err) => Err(err),
            };
            if !self.is_current(ticket) {
                log::debug!(generation = ticket; "Discarding superseded layout");
                return Ok(RenderOutcome::Superseded);
            }
            let (prepared, response) = match answered {
                Ok(answered) => answered,
                Err(err) => {
                    self.loading.store(false, Ordering::SeqCst);
                    return Err(err);
                }
            };
            let diagram =
                assemble_diagram(graph, &prepared, &response, &self.config, self.viewport);
            self.loading.store(false, Ordering::SeqCst);
            Ok(RenderOutcome::Ready(diagram))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoxStyle;
    use crate::ir::FlowNode;
    use crate::layout::engine::{EdgeSection, ReplayEngine, RoutedEdge};
    use futures::channel::oneshot;
    use futures::executor::block_on;
    use std::sync::Mutex;

    fn two_station_graph() -> FlowGraph {
        let mut graph = FlowGraph::new();
        graph.add_node(FlowNode::new("ore", "Iron Ore").with_units(2.5, "miner-mk1"));
        graph.add_node(FlowNode::new("ingot", "Iron Ingot").with_units(1.0, "smelter"));
        graph.add_edge("ore", "ingot", 30.0);
        graph
    }

    fn placed(id: &str, x: f32, y: f32) -> PlacedNode {
        PlacedNode {
            id: id.to_string(),
            x,
            y,
            width: None,
            height: None,
        }
    }

    fn routed(id: &str, points: &[(f32, f32)]) -> RoutedEdge {
        RoutedEdge {
            id: id.to_string(),
            sources: Vec::new(),
            targets: Vec::new(),
            sections: EdgeSection::from_points(points).into_iter().collect(),
        }
    }

    fn canned_response() -> LayoutResponse {
        LayoutResponse {
            children: vec![placed("ore", 12.0, 12.0), placed("ingot", 500.0, 12.0)],
            edges: vec![routed("e0", &[(400.0, 60.0), (450.0, 60.0), (450.0, 80.0), (500.0, 80.0)])],
            width: None,
            height: None,
        }
    }

    #[test]
    fn request_carries_sizes_and_edges() {
        let config = LayoutConfig::default();
        let prepared = prepare_layout(&two_station_graph(), &config).expect("prepared");
        assert_eq!(prepared.request.id, "root");
        assert_eq!(prepared.request.children.len(), 2);
        assert_eq!(prepared.request.edges[0].id, "e0");
        assert_eq!(prepared.request.edges[0].sources, vec!["ore".to_string()]);
        let ore = &prepared.boxes["ore"];
        assert_eq!(prepared.request.children[0].width, ore.width);
        assert_eq!(prepared.request.layout_options, config.layout_options);
    }

    #[test]
    fn links_to_unknown_nodes_are_dropped() {
        let mut graph = two_station_graph();
        graph.add_edge("ingot", "plate", 15.0);
        let prepared = prepare_layout(&graph, &LayoutConfig::default()).expect("prepared");
        assert_eq!(prepared.request.edges.len(), 1);
        assert!(!prepared.edge_links.contains_key("e1"));
    }

    #[test]
    fn fractional_units_become_partial_cell() {
        let config = LayoutConfig::default();
        let graph = two_station_graph();
        let engine = ReplayEngine::new(canned_response());
        let diagram =
            block_on(layout_flow(&graph, &engine, &config, (500.0, 300.0))).expect("layout");
        let ore = diagram.node("ore").expect("ore placed");
        let occupancy: Vec<f32> = ore.cells.iter().map(|cell| cell.occupancy).collect();
        assert_eq!(occupancy, vec![1.0, 1.0, 0.5]);
        assert_eq!(ore.label, "Iron Ore (2.5)");
        let rects = ore.unit_rects();
        assert_eq!(rects[2].fill_width, rects[2].width * 0.5);
        assert_eq!(rects[0].x, ore.x + ore.margin_x + ore.cells[0].x);
        assert!(rects[2].is_partial());
    }

    #[test]
    fn edges_get_rounded_path_arrowhead_and_widths() {
        let config = LayoutConfig::default();
        let graph = two_station_graph();
        let engine = ReplayEngine::new(canned_response());
        let diagram =
            block_on(layout_flow(&graph, &engine, &config, (500.0, 300.0))).expect("layout");
        let edge = &diagram.edges[0];
        assert_eq!(edge.source, "ore");
        assert!(!edge.path.is_empty());
        let head = edge.arrowhead.expect("arrowhead");
        assert_eq!(head.direction, (1.0, 0.0));
        assert_eq!(head.tip, (510.0, 80.0));
        assert_eq!(edge.stroke_width, stroke_width(30.0));
        assert_eq!(edge.outline_width, edge.stroke_width + 3.0);
        assert!(diagram.bounds.x + diagram.bounds.width >= head.tip.0);
    }

    #[test]
    fn box_line_style_draws_no_arrowheads() {
        let config = LayoutConfig {
            style: BoxStyle::box_line(),
            ..LayoutConfig::default()
        };
        let engine = ReplayEngine::new(canned_response());
        let diagram = block_on(layout_flow(&two_station_graph(), &engine, &config, (500.0, 300.0)))
            .expect("layout");
        assert!(diagram.edges[0].arrowhead.is_none());
        assert_eq!(diagram.node("ore").map(|n| n.margin_x), Some(0.0));
    }

    #[test]
    fn degenerate_final_segment_keeps_edge_without_arrowhead() {
        let mut response = canned_response();
        response.edges = vec![routed("e0", &[(400.0, 60.0), (500.0, 60.0), (500.0, 60.0)])];
        let engine = ReplayEngine::new(response);
        let diagram = block_on(layout_flow(
            &two_station_graph(),
            &engine,
            &LayoutConfig::default(),
            (500.0, 300.0),
        ))
        .expect("layout");
        assert_eq!(diagram.edges.len(), 1);
        assert!(diagram.edges[0].arrowhead.is_none());
    }

    #[test]
    fn graph_without_links_still_fits() {
        let mut graph = FlowGraph::new();
        graph.add_node(FlowNode::new("solo", "Solo").with_units(3.0, "assembler"));
        let response = LayoutResponse {
            children: vec![placed("solo", 0.0, 0.0)],
            ..LayoutResponse::default()
        };
        let engine = ReplayEngine::new(response);
        let diagram = block_on(layout_flow(
            &graph,
            &engine,
            &LayoutConfig::default(),
            (500.0, 300.0),
        ))
        .expect("layout");
        assert!(diagram.edges.is_empty());
        let node = &diagram.nodes[0];
        assert_eq!(diagram.bounds, node.rect());
        let center = diagram.transform.apply(diagram.bounds.center());
        assert!((center.0 - 250.0).abs() < 1e-3);
        assert!((center.1 - 150.0).abs() < 1e-3);
    }

    #[test]
    fn unplaced_nodes_and_unknown_edges_are_skipped() {
        let response = LayoutResponse {
            children: vec![placed("ore", 0.0, 0.0)],
            edges: vec![routed("e7", &[(0.0, 0.0), (10.0, 0.0)])],
            ..LayoutResponse::default()
        };
        let engine = ReplayEngine::new(response);
        let diagram = block_on(layout_flow(
            &two_station_graph(),
            &engine,
            &LayoutConfig::default(),
            (500.0, 300.0),
        ))
        .expect("layout");
        assert_eq!(diagram.nodes.len(), 1);
        assert!(diagram.edges.is_empty());
    }

    #[test]
    fn repeated_layout_is_identical() {
        let config = LayoutConfig::default();
        let graph = two_station_graph();
        let engine = ReplayEngine::new(canned_response());
        let first = block_on(layout_flow(&graph, &engine, &config, (500.0, 300.0))).expect("first");
        let second =
            block_on(layout_flow(&graph, &engine, &config, (500.0, 300.0))).expect("second");
        assert_eq!(first, second);
    }

    /// Engine whose answers are released by the test, in any order.
    struct GatedEngine {
        gates: Mutex<Vec<oneshot::Receiver<LayoutResponse>>>,
    }

    impl LayoutEngine for GatedEngine {
        fn layout(
            &self,
            _request: &LayoutRequest,
        ) -> impl Future<Output = Result<LayoutResponse, LayoutError>> {
            let gate = self.gates.lock().expect("gate lock").remove(0);
            async move { gate.await.map_err(|_| LayoutError::Cancelled) }
        }
    }

    #[test]
    fn only_latest_render_is_applied() {
        let (first_tx, first_rx) = oneshot::channel();
        let (second_tx, second_rx) = oneshot::channel();
        let engine = GatedEngine {
            gates: Mutex::new(vec![first_rx, second_rx]),
        };
        let session = RenderSession::new(LayoutConfig::default(), (500.0, 300.0));
        let graph = two_station_graph();

        let first = session.render(&graph, &engine);
        let second = session.render(&graph, &engine);
        assert!(session.is_loading());
        assert_eq!(session.current_generation(), 2);

        second_tx.send(canned_response()).expect("second gate open");
        first_tx.send(canned_response()).expect("first gate open");
        let (first, second) = block_on(futures::future::join(first, second));

        assert_eq!(first.expect("first resolves"), RenderOutcome::Superseded);
        let diagram = second
            .expect("second resolves")
            .into_diagram()
            .expect("latest render applies");
        assert_eq!(diagram.nodes.len(), 2);
        assert!(!session.is_loading());
    }

    #[test]
    fn superseded_render_leaves_loading_to_latest() {
        let (first_tx, first_rx) = oneshot::channel();
        let (second_tx, second_rx) = oneshot::channel();
        let engine = GatedEngine {
            gates: Mutex::new(vec![first_rx, second_rx]),
        };
        let session = RenderSession::new(LayoutConfig::default(), (500.0, 300.0));
        let graph = two_station_graph();

        let first = session.render(&graph, &engine);
        let second = session.render(&graph, &engine);

        first_tx.send(canned_response()).expect("first gate open");
        let outcome = block_on(first).expect("first resolves");
        assert_eq!(outcome, RenderOutcome::Superseded);
        assert!(session.is_loading());

        second_tx.send(canned_response()).expect("second gate open");
        let outcome = block_on(second).expect("second resolves");
        assert!(matches!(outcome, RenderOutcome::Ready(_)));
        assert!(!session.is_loading());
    }

    #[test]
    fn failed_render_clears_loading() {
        let (tx, rx) = oneshot::channel::<LayoutResponse>();
        drop(tx);
        let engine = GatedEngine {
            gates: Mutex::new(vec![rx]),
        };
        let session = RenderSession::new(LayoutConfig::default(), (500.0, 300.0));
        let result = block_on(session.render(&two_station_graph(), &engine));
        assert!(matches!(result, Err(LayoutError::Cancelled)));
        assert!(!session.is_loading());
    }

    #[test]
    fn oversized_machine_count_is_rejected_before_packing() {
        let mut graph = two_station_graph();
        graph.add_node(FlowNode::new("huge", "Huge").with_units(1.0e9, "smelter"));
        let config = LayoutConfig::default();
        let engine = ReplayEngine::new(canned_response());

        let result = block_on(layout_flow(&graph, &engine, &config, (500.0, 300.0)));
        assert!(matches!(
            result,
            Err(LayoutError::TooManyUnits { id, max, .. }) if id == "huge" && max == config.max_unit_count
        ));

        let session = RenderSession::new(config, (500.0, 300.0));
        let result = block_on(session.render(&graph, &engine));
        assert!(matches!(result, Err(LayoutError::TooManyUnits { .. })));
        assert!(!session.is_loading());
    }

    #[test]
    fn machine_count_at_the_limit_is_packed() {
        let config = LayoutConfig {
            max_unit_count: 4.0,
            ..LayoutConfig::default()
        };
        let mut graph = FlowGraph::new();
        graph.add_node(FlowNode::new("ore", "Iron Ore").with_units(4.0, "miner-mk1"));
        let prepared = prepare_layout(&graph, &config).expect("count at the limit");
        assert_eq!(prepared.boxes["ore"].cells.len(), 4);
    }
}
