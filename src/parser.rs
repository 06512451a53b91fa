use crate::error::FlowError;
use crate::ir::{FlowEdge, FlowGraph, FlowNode};
use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub graph: FlowGraph,
    /// Optional `config` object embedded in the flow document.
    pub init_config: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct FlowDocument {
    #[serde(default)]
    nodes: Vec<FlowNode>,
    #[serde(default, alias = "edges")]
    links: Vec<FlowEdge>,
    #[serde(default)]
    config: Option<serde_json::Value>,
}

/// Parses a planner flow document (`{ "nodes": [...], "links": [...] }`).
pub fn parse_flow(input: &str) -> Result<ParseOutput, FlowError> {
    let document: FlowDocument = serde_json::from_str(input)?;
    let graph = FlowGraph {
        nodes: document.nodes,
        links: document.links,
    };
    validate_graph(&graph)?;
    Ok(ParseOutput {
        graph,
        init_config: document.config,
    })
}

/// Rejects input the geometry core is not defined for.
///
/// Links with unknown endpoints are not rejected here; the assembler drops them.
pub fn validate_graph(graph: &FlowGraph) -> Result<(), FlowError> {
    let mut seen: HashSet<&str> = HashSet::new();
    for node in &graph.nodes {
        if !seen.insert(node.id.as_str()) {
            return Err(FlowError::DuplicateNode(node.id.clone()));
        }
        if let Some(count) = node.unit_count
            && (!count.is_finite() || count < 0.0)
        {
            return Err(FlowError::InvalidUnitCount {
                id: node.id.clone(),
                count,
            });
        }
    }
    for link in &graph.links {
        if !link.value.is_finite() || link.value < 0.0 {
            return Err(FlowError::InvalidThroughput {
                source_id: link.source.clone(),
                target_id: link.target.clone(),
                value: link.value,
            });
        }
    }
    Ok(())
}
