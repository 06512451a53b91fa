use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::path::Path;

use dagre_rust::{
    GraphConfig as DagreConfig, GraphEdge as DagreEdge, GraphNode as DagreNode,
    layout as dagre_layout,
};
use graphlib_rust::{Graph as DagreGraph, GraphOption};
use serde::{Deserialize, Serialize};

use crate::config::{ELK_DIRECTION, ELK_SPACING_BASE, ELK_SPACING_EDGE_NODE};
use crate::error::LayoutError;

use super::routing::{RouteAxis, compress_path, route_orthogonal};

const DEFAULT_SPACING: f32 = 80.0;
const DEFAULT_EDGE_NODE_SPACING: f32 = 120.0;
const DAGRE_MARGIN: f32 = 8.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutNodeRequest {
    pub id: String,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutEdgeRequest {
    pub id: String,
    pub sources: Vec<String>,
    pub targets: Vec<String>,
}

/// Graph handed to a layout engine, in ELK's JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRequest {
    pub id: String,
    pub children: Vec<LayoutNodeRequest>,
    pub edges: Vec<LayoutEdgeRequest>,
    pub layout_options: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutPoint {
    pub x: f32,
    pub y: f32,
}

impl From<LayoutPoint> for (f32, f32) {
    fn from(point: LayoutPoint) -> Self {
        (point.x, point.y)
    }
}

impl From<(f32, f32)> for LayoutPoint {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedNode {
    pub id: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub height: Option<f32>,
}

/// One contiguous polyline of a routed edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeSection {
    pub start_point: LayoutPoint,
    #[serde(default)]
    pub bend_points: Vec<LayoutPoint>,
    pub end_point: LayoutPoint,
}

impl EdgeSection {
    pub fn from_points(points: &[(f32, f32)]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let (last, bends) = rest.split_last()?;
        Some(Self {
            start_point: (*first).into(),
            bend_points: bends.iter().map(|p| (*p).into()).collect(),
            end_point: (*last).into(),
        })
    }

    /// Start, bends and end as one polyline.
    pub fn points(&self) -> Vec<(f32, f32)> {
        let mut points = Vec::with_capacity(self.bend_points.len() + 2);
        points.push(self.start_point.into());
        points.extend(self.bend_points.iter().map(|&p| <(f32, f32)>::from(p)));
        points.push(self.end_point.into());
        points
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutedEdge {
    pub id: String,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default)]
    pub sections: Vec<EdgeSection>,
}

/// Engine answer: absolute node positions and edge routes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutResponse {
    #[serde(default)]
    pub children: Vec<PlacedNode>,
    #[serde(default)]
    pub edges: Vec<RoutedEdge>,
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub height: Option<f32>,
}

/// Turns a sized graph into positions and routes.
///
/// The returned future resolves exactly once per request.
pub trait LayoutEngine {
    fn layout(
        &self,
        request: &LayoutRequest,
    ) -> impl Future<Output = Result<LayoutResponse, LayoutError>>;
}

/// Answers every request with a recorded response.
#[derive(Debug, Clone)]
pub struct ReplayEngine {
    response: LayoutResponse,
}

impl ReplayEngine {
    pub fn new(response: LayoutResponse) -> Self {
        Self { response }
    }

    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn from_path(path: &Path) -> Result<Self, LayoutError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}

impl LayoutEngine for ReplayEngine {
    fn layout(
        &self,
        _request: &LayoutRequest,
    ) -> impl Future<Output = Result<LayoutResponse, LayoutError>> {
        std::future::ready(Ok(self.response.clone()))
    }
}

/// Layered placement through dagre with orthogonal routes between node sides.
///
/// Reads `elk.direction` (`RIGHT`, `LEFT`, `DOWN`, `UP`; default `RIGHT`),
/// the layered spacing base value and the edge/node spacing from the
/// request's layout options.
#[derive(Debug, Clone, Default)]
pub struct DagreEngine;

impl DagreEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn layout_sync(&self, request: &LayoutRequest) -> LayoutResponse {
        if request.children.is_empty() {
            return LayoutResponse::default();
        }
        let options = DagreOptions::from_request(request);

        let mut dagre_graph: DagreGraph<DagreConfig, DagreNode, DagreEdge> =
            DagreGraph::new(Some(GraphOption {
                directed: Some(true),
                multigraph: Some(false),
                compound: Some(false),
            }));

        let mut graph_config = DagreConfig::default();
        graph_config.rankdir = Some(options.rankdir.to_string());
        graph_config.nodesep = Some(options.spacing);
        graph_config.ranksep = Some(options.spacing);
        graph_config.marginx = Some(DAGRE_MARGIN);
        graph_config.marginy = Some(DAGRE_MARGIN);
        dagre_graph.set_graph(graph_config);

        for child in &request.children {
            let mut node = DagreNode::default();
            node.width = child.width;
            node.height = child.height;
            dagre_graph.set_node(child.id.clone(), Some(node));
        }

        let node_set: HashSet<&str> = request.children.iter().map(|c| c.id.as_str()).collect();
        let mut edge_set: HashSet<(String, String)> = HashSet::new();
        for edge in &request.edges {
            for (from, to) in edge_endpoints(edge) {
                if from == to || !node_set.contains(from.as_str()) || !node_set.contains(to.as_str())
                {
                    continue;
                }
                if !edge_set.insert((from.clone(), to.clone())) {
                    continue;
                }
                let edge_label = DagreEdge::default();
                let _ = dagre_graph.set_edge(&from, &to, Some(edge_label), None);
            }
        }

        dagre_layout::run_layout(&mut dagre_graph);

        let mut placed: HashMap<String, PlacedNode> = HashMap::new();
        for child in &request.children {
            let Some(dagre_node) = dagre_graph.node(&child.id) else {
                log::warn!(node_id = child.id.as_str(); "dagre returned no position for node");
                continue;
            };
            placed.insert(
                child.id.clone(),
                PlacedNode {
                    id: child.id.clone(),
                    x: dagre_node.x - child.width / 2.0,
                    y: dagre_node.y - child.height / 2.0,
                    width: Some(child.width),
                    height: Some(child.height),
                },
            );
        }

        let mut edges = Vec::with_capacity(request.edges.len());
        for edge in &request.edges {
            let mut sections = Vec::new();
            for (from, to) in edge_endpoints(edge) {
                let (Some(from_node), Some(to_node)) = (placed.get(&from), placed.get(&to)) else {
                    continue;
                };
                let route = route_orthogonal(
                    node_rect(from_node),
                    node_rect(to_node),
                    options.axis,
                    options.edge_node_spacing,
                );
                if let Some(section) = EdgeSection::from_points(&compress_path(&route)) {
                    sections.push(section);
                }
            }
            edges.push(RoutedEdge {
                id: edge.id.clone(),
                sources: edge.sources.clone(),
                targets: edge.targets.clone(),
                sections,
            });
        }

        let children: Vec<PlacedNode> = request
            .children
            .iter()
            .filter_map(|child| placed.remove(&child.id))
            .collect();
        let width = children
            .iter()
            .map(|n| n.x + n.width.unwrap_or(0.0))
            .fold(0.0f32, f32::max);
        let height = children
            .iter()
            .map(|n| n.y + n.height.unwrap_or(0.0))
            .fold(0.0f32, f32::max);

        LayoutResponse {
            children,
            edges,
            width: Some(width + DAGRE_MARGIN),
            height: Some(height + DAGRE_MARGIN),
        }
    }
}

impl LayoutEngine for DagreEngine {
    fn layout(
        &self,
        request: &LayoutRequest,
    ) -> impl Future<Output = Result<LayoutResponse, LayoutError>> {
        std::future::ready(Ok(self.layout_sync(request)))
    }
}

#[derive(Debug, Clone, Copy)]
struct DagreOptions {
    rankdir: &'static str,
    axis: RouteAxis,
    spacing: f32,
    edge_node_spacing: f32,
}

impl DagreOptions {
    fn from_request(request: &LayoutRequest) -> Self {
        let direction = request
            .layout_options
            .get(ELK_DIRECTION)
            .map(|v| v.trim().to_ascii_uppercase())
            .unwrap_or_else(|| "RIGHT".to_string());
        let (rankdir, axis) = match direction.as_str() {
            "DOWN" => ("tb", RouteAxis::Vertical),
            "UP" => ("bt", RouteAxis::Vertical),
            "LEFT" => ("rl", RouteAxis::Horizontal),
            _ => ("lr", RouteAxis::Horizontal),
        };
        Self {
            rankdir,
            axis,
            spacing: numeric_option(request, ELK_SPACING_BASE, DEFAULT_SPACING),
            edge_node_spacing: numeric_option(
                request,
                ELK_SPACING_EDGE_NODE,
                DEFAULT_EDGE_NODE_SPACING,
            ),
        }
    }
}

fn numeric_option(request: &LayoutRequest, key: &str, default: f32) -> f32 {
    let Some(raw) = request.layout_options.get(key) else {
        return default;
    };
    match raw.trim().parse::<f32>() {
        Ok(value) if value.is_finite() && value >= 0.0 => value,
        _ => {
            log::warn!(option = key, value = raw.as_str(); "Ignoring non-numeric layout option");
            default
        }
    }
}

fn edge_endpoints(edge: &LayoutEdgeRequest) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(edge.sources.len() * edge.targets.len());
    for source in &edge.sources {
        for target in &edge.targets {
            pairs.push((source.clone(), target.clone()));
        }
    }
    pairs
}

fn node_rect(node: &PlacedNode) -> (f32, f32, f32, f32) {
    (
        node.x,
        node.y,
        node.width.unwrap_or(0.0),
        node.height.unwrap_or(0.0),
    )
}
